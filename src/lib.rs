pub mod card_blob;
pub mod card_grouper;
pub mod cards;
pub mod catalog;
pub mod deck_manager;
pub mod services;
pub mod utilities;

mod test;
