pub const DECKS_URL: &str = "https://mtgdecks-api.herokuapp.com/api/decks";
pub const CARDS_URL: &str = "https://mtgdecks-api.herokuapp.com/api/cards";

pub const CATALOG_PATH: &str = "cards.tsv";
pub const PREFERENCES_PATH: &str = "preferences.json";

pub const LOCAL_STORAGE_PREFIX: &str = "mtgdecks2-";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const IDENTITY_KEY: &str = "identity";
pub const TAGS_KEY: &str = "tags";

pub const NEW_DECK_ID: &str = "new";
pub const NEW_DECK_NAME: &str = "New Deck";
pub const DEFAULT_CARD_GROUP_NAMES: [&str; 3] = ["Mainboard", "Sideboard", "Maybeboard"];
pub const FALLBACK_CARD_GROUP_NAME: &str = "Group";

pub const MAX_MANA_VALUE: u32 = 16;
