use std::{collections::HashMap, fs::File, io::Read, sync::Arc};

use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};

use crate::cards::{
    card_definition::{CardDefinition, CardType, Colour},
    card_name::CardName,
    price::Price,
};
use crate::services::ServiceResult;

const COLUMN_COUNT: usize = 7;

/// Read-only card catalog, loaded once from the bulk tab-separated export.
///
/// Columns: `name, primaryType, manaValue, color, isDoubleSided, price, imageId`.
#[derive(Debug, Default)]
pub struct CardCatalog {
    cards: Vec<Arc<CardDefinition>>,
    dictionary: HashMap<String, Arc<CardDefinition>>,
    sorted_names: Vec<(String, Arc<CardDefinition>)>,
}

impl CardCatalog {
    pub fn new(definitions: Vec<CardDefinition>) -> Self {
        let cards: Vec<Arc<CardDefinition>> = definitions.into_iter().map(Arc::new).collect();

        let mut dictionary = HashMap::new();
        for card in &cards {
            dictionary.insert(card.name.cleaned.clone(), Arc::clone(card));
        }

        let mut sorted_names: Vec<(String, Arc<CardDefinition>)> = dictionary
            .iter()
            .map(|(key, card)| (key.clone(), Arc::clone(card)))
            .collect();
        sorted_names.sort_by(|a, b| a.0.cmp(&b.0));

        CardCatalog {
            cards,
            dictionary,
            sorted_names,
        }
    }

    pub fn load_from_file(path: &str) -> ServiceResult<Self> {
        let file = File::open(path)?;
        let catalog = Self::from_reader(file)?;
        info!("Loaded {} card definitions from {}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R) -> ServiceResult<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut definitions = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            match Self::parse_record(&record) {
                Ok(definition) => definitions.push(definition),
                Err(e) => warn!("Skipping catalog row {}: {}", row + 1, e),
            }
        }

        Ok(Self::new(definitions))
    }

    fn parse_record(record: &StringRecord) -> Result<CardDefinition, String> {
        if record.len() < COLUMN_COUNT {
            return Err(format!(
                "expected {} columns, found {}",
                COLUMN_COUNT,
                record.len()
            ));
        }

        let name = CardName::new(record[0].to_string())?;
        let primary_type: CardType = record[1].parse()?;
        let mana_value = record[2]
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| format!("invalid mana value '{}' for {}", &record[2], name))?;
        let colour: Colour = record[3].parse()?;

        Ok(CardDefinition {
            name,
            primary_type,
            colour,
            mana_value: mana_value as u32,
            is_double_sided: record[4].trim() == "1",
            price: Price::parse(&record[5]),
            image_id: record[6].trim().to_string(),
        })
    }

    /// Lowercase name to definition.
    pub fn get_card_dictionary(&self) -> &HashMap<String, Arc<CardDefinition>> {
        &self.dictionary
    }

    /// Definitions in catalog order.
    pub fn get_card_array(&self) -> &[Arc<CardDefinition>] {
        &self.cards
    }

    pub fn get(&self, name: &str) -> Option<Arc<CardDefinition>> {
        self.dictionary.get(&CardName::lookup_key(name)).cloned()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub(crate) fn sorted_names(&self) -> &[(String, Arc<CardDefinition>)] {
        &self.sorted_names
    }
}
