use itertools::Itertools;

use crate::cards::deck::QueriedDeck;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeckQuery {
    pub owner: Option<String>,
}

impl DeckQuery {
    pub fn by_owner(owner: &str) -> Self {
        DeckQuery {
            owner: Some(owner.to_string()),
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        self.owner
            .iter()
            .map(|owner| ("owner", owner.clone()))
            .collect()
    }
}

/// Which decks the deck list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    All,
    Untagged,
    Tag(String),
}

impl TagFilter {
    pub fn from_current(current: Option<&str>) -> Self {
        match current {
            Some(tag) => TagFilter::Tag(tag.to_string()),
            None => TagFilter::All,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TagFilter::All => "All",
            TagFilter::Untagged => "Untagged",
            TagFilter::Tag(tag) => tag,
        }
    }
}

pub fn filter_by_tag(decks: &[QueriedDeck], filter: &TagFilter) -> Vec<QueriedDeck> {
    decks
        .iter()
        .filter(|deck| match filter {
            TagFilter::All => true,
            TagFilter::Untagged => deck.tags.is_empty(),
            TagFilter::Tag(tag) => deck.tags.contains(tag),
        })
        .cloned()
        .collect()
}

/// Every tag used by any deck, sorted and without duplicates.
pub fn distinct_tags(decks: &[QueriedDeck]) -> Vec<String> {
    decks
        .iter()
        .flat_map(|deck| deck.tags.iter().cloned())
        .sorted()
        .dedup()
        .collect()
}

pub fn order_by_name(mut decks: Vec<QueriedDeck>) -> Vec<QueriedDeck> {
    decks.sort_by(|a, b| a.name.cmp(&b.name));
    decks
}
