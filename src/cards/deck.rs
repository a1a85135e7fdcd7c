use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::card::{Card, CardGroup};
use crate::utilities::constants::{
    DEFAULT_CARD_GROUP_NAMES, FALLBACK_CARD_GROUP_NAME, NEW_DECK_NAME,
};

/// Stable key of a card group inside its deck.
pub type CardGroupId = u32;

/// Aggregate root. Card groups live in an id-keyed arena; `card_group_order`
/// is the only source of display order.
#[derive(Debug, PartialEq, Clone)]
pub struct Deck {
    pub id: Option<String>,
    pub name: String,
    pub owners: Vec<String>,
    pub notes: String,
    pub tags: Vec<String>,
    pub card_groups: HashMap<CardGroupId, CardGroup>,
    pub card_group_order: Vec<CardGroupId>,
}

impl Deck {
    /// The unsaved deck offered when a user starts a new one.
    pub fn new_default(tags: Vec<String>) -> Self {
        let mut card_groups = HashMap::new();
        card_groups.insert(0, CardGroup::new(DEFAULT_CARD_GROUP_NAMES[0]));

        Deck {
            id: None,
            name: NEW_DECK_NAME.to_string(),
            owners: Vec::new(),
            notes: String::new(),
            tags,
            card_groups,
            card_group_order: vec![0],
        }
    }

    /// Builds a deck from groups in display order, numbering them from zero.
    pub fn from_ordered_groups(
        id: Option<String>,
        name: String,
        owners: Vec<String>,
        notes: String,
        tags: Vec<String>,
        groups: Vec<CardGroup>,
    ) -> Self {
        let card_group_order: Vec<CardGroupId> = (0..groups.len() as CardGroupId).collect();
        let card_groups = card_group_order.iter().copied().zip(groups).collect();

        Deck {
            id,
            name,
            owners,
            notes,
            tags,
            card_groups,
            card_group_order,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owners.iter().any(|owner| owner == user_id)
    }

    pub fn card_group(&self, id: CardGroupId) -> Option<&CardGroup> {
        self.card_groups.get(&id)
    }

    /// Card groups in display order. Ids in the order list without a group are skipped.
    pub fn ordered_card_groups(&self) -> impl Iterator<Item = (CardGroupId, &CardGroup)> {
        self.card_group_order
            .iter()
            .filter_map(|id| self.card_groups.get(id).map(|group| (*id, group)))
    }

    /// The first group in display order, which the stats view reports on.
    pub fn main_card_group(&self) -> Option<&CardGroup> {
        self.ordered_card_groups().next().map(|(_, group)| group)
    }

    pub fn next_card_group_id(&self) -> CardGroupId {
        self.card_group_order
            .iter()
            .chain(self.card_groups.keys())
            .copied()
            .max()
            .map_or(0, |max| max + 1)
    }

    pub fn default_card_group_name(&self) -> &'static str {
        DEFAULT_CARD_GROUP_NAMES
            .get(self.card_group_order.len())
            .copied()
            .unwrap_or(FALLBACK_CARD_GROUP_NAME)
    }
}

/// Partial replacement of the top-level deck fields.
#[derive(Debug, Clone, Default)]
pub struct DeckPatch {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub owners: Option<Vec<String>>,
}

impl DeckPatch {
    pub fn apply(self, deck: &Deck) -> Deck {
        Deck {
            name: self.name.unwrap_or_else(|| deck.name.clone()),
            notes: self.notes.unwrap_or_else(|| deck.notes.clone()),
            tags: self.tags.unwrap_or_else(|| deck.tags.clone()),
            owners: self.owners.unwrap_or_else(|| deck.owners.clone()),
            ..deck.clone()
        }
    }
}

/// Partial replacement of one card group.
#[derive(Debug, Clone, Default)]
pub struct CardGroupPatch {
    pub name: Option<String>,
    pub cards: Option<Vec<Card>>,
    pub invalid_cards: Option<Vec<String>>,
}

impl CardGroupPatch {
    pub fn apply(self, group: &CardGroup) -> CardGroup {
        CardGroup {
            name: self.name.unwrap_or_else(|| group.name.clone()),
            cards: self.cards.unwrap_or_else(|| group.cards.clone()),
            invalid_cards: self
                .invalid_cards
                .unwrap_or_else(|| group.invalid_cards.clone()),
        }
    }
}

/// Summary row returned by deck queries.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueriedDeck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_default_deck_has_one_mainboard() {
        let deck = Deck::new_default(vec!["edh".to_string()]);

        assert!(deck.is_new());
        assert_eq!(deck.name, "New Deck");
        assert_eq!(deck.card_group_order, vec![0]);
        assert_eq!(deck.card_group(0).unwrap().name, "Mainboard");
        assert_eq!(deck.tags, vec!["edh".to_string()]);
        assert!(deck.owners.is_empty());
    }

    #[test]
    fn ordered_groups_follow_order_list_not_map() {
        let mut deck = Deck::from_ordered_groups(
            Some("1".to_string()),
            "Deck".to_string(),
            vec![],
            String::new(),
            vec![],
            vec![CardGroup::new("Mainboard"), CardGroup::new("Sideboard")],
        );
        deck.card_group_order = vec![1, 0];

        let names: Vec<&str> = deck
            .ordered_card_groups()
            .map(|(_, group)| group.name.as_str())
            .collect();
        assert_eq!(names, vec!["Sideboard", "Mainboard"]);
        assert_eq!(deck.main_card_group().unwrap().name, "Sideboard");
    }

    #[test]
    fn next_group_id_and_default_name() {
        let deck = Deck::new_default(vec![]);
        assert_eq!(deck.next_card_group_id(), 1);
        assert_eq!(deck.default_card_group_name(), "Sideboard");

        let mut crowded = deck.clone();
        crowded.card_group_order = vec![0, 4, 2];
        assert_eq!(crowded.next_card_group_id(), 5);
        assert_eq!(crowded.default_card_group_name(), "Group");
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let deck = Deck::new_default(vec!["a".to_string()]);
        let patched = DeckPatch {
            name: Some("Burn".to_string()),
            ..Default::default()
        }
        .apply(&deck);

        assert_eq!(patched.name, "Burn");
        assert_eq!(patched.tags, deck.tags);
        assert_eq!(deck.name, "New Deck");
    }
}
