pub mod card;
pub mod card_definition;
pub mod card_name;
pub mod deck;
pub mod price;
