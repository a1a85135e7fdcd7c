use std::env;

use log::error;

use super::constants::{CARDS_URL, CATALOG_PATH, DECKS_URL, PREFERENCES_PATH};

#[derive(Debug, Clone)]
pub struct Config {
    pub decks_url: String,
    pub cards_url: String,
    pub catalog_path: String,
    pub preferences_path: String,
    pub skip_comment_lines: bool,
    pub card_cache_limit: usize,
    pub card_expiration_ms: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decks_url: DECKS_URL.to_string(),
            cards_url: CARDS_URL.to_string(),
            catalog_path: CATALOG_PATH.to_string(),
            preferences_path: PREFERENCES_PATH.to_string(),
            skip_comment_lines: true,
            card_cache_limit: 1000,
            card_expiration_ms: 86_400_000,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.update_from_env();
        config
    }

    fn update_from_env(&mut self) {
        if let Ok(decks_url) = env::var("DECKS_URL") {
            self.decks_url = decks_url.trim_end_matches('/').to_string();
        }
        if let Ok(cards_url) = env::var("CARDS_URL") {
            self.cards_url = cards_url;
        }
        if let Ok(catalog_path) = env::var("CATALOG_PATH") {
            if std::path::Path::new(&catalog_path).is_file() {
                self.catalog_path = catalog_path;
            } else {
                error!("Supplied catalog path '{}' is not a file", catalog_path);
            }
        }
        if let Ok(preferences_path) = env::var("PREFERENCES_PATH") {
            self.preferences_path = preferences_path;
        }
        if let Ok(skip_comment_lines) = env::var("SKIP_COMMENT_LINES") {
            self.skip_comment_lines = skip_comment_lines == "1";
        }
        if let Ok(card_cache_limit) = env::var("CARD_CACHE_LIMIT") {
            self.card_cache_limit = card_cache_limit.parse().unwrap_or(0);
        }
        if let Ok(card_expiration_ms) = env::var("CARD_EXPIRATION_MS") {
            self.card_expiration_ms = card_expiration_ms.parse().unwrap_or(0);
        }
    }
}

lazy_static::lazy_static! {
    pub static ref CONFIG: Config = Config::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_comment_lines_and_price_cache() {
        let config = Config::default();
        assert!(config.skip_comment_lines);
        assert_eq!(config.card_cache_limit, 1000);
        assert_eq!(config.card_expiration_ms, 86_400_000);
        assert_eq!(config.decks_url, DECKS_URL);
    }
}
