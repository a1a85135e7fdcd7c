pub mod card_blob_service;
pub mod line_parser;
