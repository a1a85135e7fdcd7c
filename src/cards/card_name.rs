use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Canonical card name as written in the catalog, plus the lowercase key
/// used for case-insensitive lookups.
#[derive(Debug, Clone)]
pub struct CardName {
    pub raw: String,
    pub cleaned: String,
}

impl CardName {
    pub fn new(raw: String) -> Result<Self, String> {
        let raw = raw.trim().to_string();
        let cleaned = Self::clean_name(&raw);

        if raw.is_empty() || cleaned.is_empty() {
            return Err("Raw and cleaned names cannot be empty".to_string());
        }

        Ok(CardName { raw, cleaned })
    }

    /// Lookup key for a name typed by a user.
    pub fn lookup_key(name: &str) -> String {
        Self::clean_name(name)
    }

    pub fn is_double_faced(&self) -> bool {
        self.raw.contains("//")
    }

    fn clean_name(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

impl PartialEq for CardName {
    fn eq(&self, other: &Self) -> bool {
        self.cleaned == other.cleaned
    }
}

impl Eq for CardName {}

// Ordinal comparison on the name as written, matching how decks are sorted.
impl PartialOrd for CardName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CardName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Hash for CardName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cleaned.hash(state);
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for CardName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CardName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CardName::new(s).map_err(de::Error::custom)
    }
}
