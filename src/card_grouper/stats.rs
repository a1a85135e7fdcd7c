use crate::cards::{card::Card, card_definition::CardType};
use crate::utilities::constants::MAX_MANA_VALUE;

/// Number of non-land cards per mana value, with trailing empty buckets removed.
pub fn mana_curve(cards: &[Card]) -> Vec<u32> {
    let mut curve = vec![0u32; MAX_MANA_VALUE as usize + 1];

    for card in cards {
        if !CardType::CURVE_TYPES.contains(&card.definition.primary_type) {
            continue;
        }
        if let Some(bucket) = curve.get_mut(card.definition.mana_value as usize) {
            *bucket += card.quantity;
        }
    }

    while curve.last() == Some(&0) {
        curve.pop();
    }

    curve
}

/// The curve drawn as rows of `X`, one row per mana value.
pub fn mana_curve_bars(cards: &[Card]) -> Vec<String> {
    mana_curve(cards)
        .into_iter()
        .map(|count| "X".repeat(count as usize))
        .collect()
}
