use std::sync::Arc;

use super::card_catalog::CardCatalog;
use crate::cards::card_definition::CardDefinition;

impl CardCatalog {
    /// Up to `max` definitions whose lowercase name starts with `query`,
    /// in ordinal name order.
    pub fn autocomplete(&self, query: &str, max: usize) -> Vec<Arc<CardDefinition>> {
        let query = query.to_lowercase();
        let names = self.sorted_names();
        let start = names.partition_point(|(name, _)| name.as_str() < query.as_str());

        names[start..]
            .iter()
            .take(max)
            .take_while(|(name, _)| name.starts_with(&query))
            .map(|(_, card)| Arc::clone(card))
            .collect()
    }
}

/// Length in characters of the prefix shared by every name.
pub fn find_common_prefix_length(names: &[&str], ignore_case: bool) -> usize {
    let Some((reference, rest)) = names.split_last() else {
        return 0;
    };

    let normalise = |c: char| {
        if ignore_case {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    };

    let others: Vec<Vec<char>> = rest.iter().map(|name| name.chars().collect()).collect();
    reference
        .chars()
        .enumerate()
        .take_while(|(i, c)| {
            others.iter().all(|other| {
                other
                    .get(*i)
                    .is_some_and(|o| normalise(*o) == normalise(*c))
            })
        })
        .count()
}
