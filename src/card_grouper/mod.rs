pub mod card_grouper;
pub mod group_evenly;
pub mod stats;
