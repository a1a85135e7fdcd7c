pub mod card_group_editor;
pub mod deck_manager;
pub mod state;
