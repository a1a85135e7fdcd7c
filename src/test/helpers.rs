use crate::card_blob::card_blob_service::CardBlobService;
use crate::cards::{
    card::Card,
    card_definition::{CardDefinition, CardType, Colour},
    card_name::CardName,
    price::Price,
};
use crate::catalog::card_catalog::CardCatalog;
use std::sync::Arc;

fn definition(
    name: &str,
    primary_type: CardType,
    colour: Colour,
    mana_value: u32,
    price: Option<f64>,
) -> CardDefinition {
    CardDefinition {
        name: CardName::new(name.to_string()).unwrap(),
        primary_type,
        colour,
        mana_value,
        price: price.map(Price::new),
        image_id: format!("img-{}", name.to_lowercase().replace(' ', "-")),
        is_double_sided: name.contains("//"),
    }
}

pub fn test_definitions() -> Vec<CardDefinition> {
    vec![
        definition("Forest", CardType::Land, Colour::Colorless, 0, Some(0.10)),
        definition("Lightning Bolt", CardType::Instant, Colour::Red, 1, Some(1.05)),
        definition("Llanowar Elves", CardType::Creature, Colour::Green, 1, Some(0.25)),
        definition("Sol Ring", CardType::Artifact, Colour::Colorless, 1, Some(2.50)),
        definition("Counterspell", CardType::Instant, Colour::Blue, 2, Some(1.00)),
        definition("Wrath of God", CardType::Sorcery, Colour::White, 4, Some(6.00)),
        definition("Grizzly Bears", CardType::Creature, Colour::Green, 2, None),
        definition(
            "Nissa, Who Shakes the World",
            CardType::Planeswalker,
            Colour::Green,
            5,
            Some(20.0),
        ),
        definition("Fire // Ice", CardType::Instant, Colour::Multicolored, 4, Some(0.50)),
        definition("Draco", CardType::Creature, Colour::Multicolored, 16, Some(3.00)),
        definition(
            "Dungeon Map",
            CardType::Other("dungeon".to_string()),
            Colour::Other("purple".to_string()),
            17,
            Some(0.01),
        ),
    ]
}

pub fn test_catalog() -> Arc<CardCatalog> {
    Arc::new(CardCatalog::new(test_definitions()))
}

pub fn test_blob_service() -> CardBlobService {
    CardBlobService::new(test_catalog())
}

/// A card from the test catalog. Panics on unknown names.
pub fn card(name: &str, quantity: u32) -> Card {
    let catalog = test_catalog();
    Card::new(catalog.get(name).unwrap(), quantity)
}

pub fn names(cards: &[Card]) -> Vec<&str> {
    cards.iter().map(|card| card.name()).collect()
}
