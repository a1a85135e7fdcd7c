pub mod card_price_service;
pub mod deck_query;
pub mod deck_service;
pub mod identity;
pub mod local_storage;

pub type ServiceResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
