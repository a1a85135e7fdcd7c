use std::{fmt, hash::Hash, str::FromStr};

use itertools::Itertools;

use super::group_evenly::group_evenly;
use crate::cards::{
    card::{Card, CardView},
    card_definition::{CardType, Colour},
};
use crate::utilities::constants::MAX_MANA_VALUE;

/// The grouping strategies offered for a card group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    Type,
    Color,
    ManaValue,
    Name,
    Price,
}

impl GroupBy {
    pub fn all() -> [GroupBy; 5] {
        [
            GroupBy::Type,
            GroupBy::Color,
            GroupBy::ManaValue,
            GroupBy::Name,
            GroupBy::Price,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupBy::Type => "Card Type",
            GroupBy::Color => "Color",
            GroupBy::ManaValue => "Mana Value",
            GroupBy::Name => "Name",
            GroupBy::Price => "Price",
        }
    }

    pub fn group(&self, cards: &[Card]) -> Vec<CardView> {
        match self {
            GroupBy::Type => group_by_type(cards),
            GroupBy::Color => group_by_color(cards),
            GroupBy::ManaValue => group_by_mana_value(cards),
            GroupBy::Name => group_by_name(cards),
            GroupBy::Price => group_by_price(cards),
        }
    }

    /// Older multi-column layout. Keyed groupings are balanced across the
    /// columns by weight, the single-bucket ones are cut into equal slices.
    pub fn group_in_columns(&self, cards: &[Card], columns: usize) -> Vec<Vec<CardView>> {
        let views = self.group(cards);
        match self {
            GroupBy::Name | GroupBy::Price => {
                let sorted = views.into_iter().flat_map(|view| view.cards).collect_vec();
                split_into_columns(&sorted, columns)
            }
            _ => group_evenly(&views, columns, |view| view.cards.len() + 3),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "type" | "card type" => Ok(GroupBy::Type),
            "color" | "colour" => Ok(GroupBy::Color),
            "mana" | "mana value" | "cmc" => Ok(GroupBy::ManaValue),
            "name" => Ok(GroupBy::Name),
            "price" => Ok(GroupBy::Price),
            other => Err(format!("Unknown grouping '{}'", other)),
        }
    }
}

pub fn group_by_type(cards: &[Card]) -> Vec<CardView> {
    group_by(
        &CardType::GROUPING_ORDER,
        |card_type| card_type.to_string(),
        |card| card.definition.primary_type.clone(),
        cards,
    )
}

pub fn group_by_mana_value(cards: &[Card]) -> Vec<CardView> {
    let keys = (0..=MAX_MANA_VALUE).collect_vec();
    group_by(
        &keys,
        |mana_value| format!("{} drop", mana_value),
        |card| card.definition.mana_value,
        cards,
    )
}

pub fn group_by_color(cards: &[Card]) -> Vec<CardView> {
    group_by(
        &Colour::GROUPING_ORDER,
        |colour| colour.to_string(),
        |card| card.definition.colour.clone(),
        cards,
    )
}

pub fn group_by_name(cards: &[Card]) -> Vec<CardView> {
    vec![CardView::unlabeled(sorted_by_name(cards.to_vec()))]
}

pub fn group_by_price(cards: &[Card]) -> Vec<CardView> {
    let mut cards = cards.to_vec();
    cards.sort_by_key(Card::unit_price);
    vec![CardView::unlabeled(cards)]
}

/// One view per key in `keys` order. Keys without cards are left out and
/// cards whose key is not listed are dropped.
fn group_by<K, H, F>(keys: &[K], header: H, key_of: F, cards: &[Card]) -> Vec<CardView>
where
    K: Eq + Hash,
    H: Fn(&K) -> String,
    F: Fn(&Card) -> K,
{
    let mut buckets = cards.iter().cloned().into_group_map_by(|card| key_of(card));

    keys.iter()
        .filter_map(|key| {
            let cards = buckets.remove(key).filter(|cards| !cards.is_empty())?;
            let cards = sorted_by_name(cards);
            Some(CardView {
                name: Some(header(key)),
                number_of_cards: Some(cards.iter().map(|card| card.quantity).sum()),
                cards,
            })
        })
        .collect()
}

fn sorted_by_name(mut cards: Vec<Card>) -> Vec<Card> {
    cards.sort_by(|a, b| a.name().cmp(b.name()));
    cards
}

fn split_into_columns(cards: &[Card], columns: usize) -> Vec<Vec<CardView>> {
    let column_length = cards.len().div_ceil(columns.max(1));
    (0..columns)
        .map(|column| {
            let start = (column * column_length).min(cards.len());
            let end = (start + column_length).min(cards.len());
            vec![CardView::unlabeled(cards[start..end].to_vec())]
        })
        .collect()
}
