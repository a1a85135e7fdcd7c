use std::sync::Arc;

use super::{card_definition::CardDefinition, price::Price};

/// A quantity of one catalog card inside a card group.
#[derive(Debug, PartialEq, Clone)]
pub struct Card {
    pub definition: Arc<CardDefinition>,
    pub quantity: u32,
}

impl Card {
    pub fn new(definition: Arc<CardDefinition>, quantity: u32) -> Self {
        Card {
            definition,
            quantity,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name.raw
    }

    /// Unit price, absent prices count as zero.
    pub fn unit_price(&self) -> Price {
        Price::or_zero(self.definition.price)
    }

    pub fn total_price(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// A named sub-list of a deck. `cards` holds at most one entry per card name.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CardGroup {
    pub name: String,
    pub cards: Vec<Card>,
    pub invalid_cards: Vec<String>,
}

impl CardGroup {
    pub fn new(name: &str) -> Self {
        CardGroup {
            name: name.to_string(),
            cards: Vec::new(),
            invalid_cards: Vec::new(),
        }
    }

    pub fn count(&self) -> u32 {
        self.cards.iter().map(|card| card.quantity).sum()
    }

    pub fn price(&self) -> Price {
        self.cards.iter().map(Card::total_price).sum()
    }
}

/// Transient display bucket produced by the card grouper.
#[derive(Debug, PartialEq, Clone)]
pub struct CardView {
    pub name: Option<String>,
    pub number_of_cards: Option<u32>,
    pub cards: Vec<Card>,
}

impl CardView {
    pub fn unlabeled(cards: Vec<Card>) -> Self {
        CardView {
            name: None,
            number_of_cards: None,
            cards,
        }
    }
}
