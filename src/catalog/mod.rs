pub mod autocomplete;
pub mod card_catalog;
