use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{card_name::CardName, price::Price};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Artifact,
    Enchantment,
    Battle,
    Planeswalker,
    Land,
    Instant,
    Sorcery,
    Conspiracy,
    /// A type outside the known vocabulary, kept verbatim.
    Other(String),
}

impl CardType {
    /// Header order used when grouping by type.
    pub const GROUPING_ORDER: [CardType; 9] = [
        CardType::Creature,
        CardType::Artifact,
        CardType::Enchantment,
        CardType::Battle,
        CardType::Planeswalker,
        CardType::Land,
        CardType::Instant,
        CardType::Sorcery,
        CardType::Conspiracy,
    ];

    /// Types that count towards the mana curve.
    pub const CURVE_TYPES: [CardType; 7] = [
        CardType::Creature,
        CardType::Artifact,
        CardType::Enchantment,
        CardType::Battle,
        CardType::Planeswalker,
        CardType::Instant,
        CardType::Sorcery,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CardType::Creature => "creature",
            CardType::Artifact => "artifact",
            CardType::Enchantment => "enchantment",
            CardType::Battle => "battle",
            CardType::Planeswalker => "planeswalker",
            CardType::Land => "land",
            CardType::Instant => "instant",
            CardType::Sorcery => "sorcery",
            CardType::Conspiracy => "conspiracy",
            CardType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Err("Card type cannot be empty".to_string());
        }
        Ok(match s.as_str() {
            "creature" => CardType::Creature,
            "artifact" => CardType::Artifact,
            "enchantment" => CardType::Enchantment,
            "battle" => CardType::Battle,
            "planeswalker" => CardType::Planeswalker,
            "land" => CardType::Land,
            "instant" => CardType::Instant,
            "sorcery" => CardType::Sorcery,
            "conspiracy" => CardType::Conspiracy,
            _ => CardType::Other(s),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub enum Colour {
    White,
    Blue,
    Black,
    Red,
    Green,
    Multicolored,
    Colorless,
    Other(String),
}

impl Colour {
    pub const GROUPING_ORDER: [Colour; 7] = [
        Colour::White,
        Colour::Blue,
        Colour::Black,
        Colour::Red,
        Colour::Green,
        Colour::Multicolored,
        Colour::Colorless,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Colour::White => "white",
            Colour::Blue => "blue",
            Colour::Black => "black",
            Colour::Red => "red",
            Colour::Green => "green",
            Colour::Multicolored => "multicolored",
            Colour::Colorless => "colorless",
            Colour::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Colour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Err("Colour cannot be empty".to_string());
        }
        Ok(match s.as_str() {
            "white" => Colour::White,
            "blue" => Colour::Blue,
            "black" => Colour::Black,
            "red" => Colour::Red,
            "green" => Colour::Green,
            "multicolored" => Colour::Multicolored,
            "colorless" => Colour::Colorless,
            _ => Colour::Other(s),
        })
    }
}

/// Immutable catalog entry, shared between every deck that references it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CardDefinition {
    pub name: CardName,
    pub primary_type: CardType,
    pub colour: Colour,
    pub mana_value: u32,
    pub price: Option<Price>,
    pub image_id: String,
    pub is_double_sided: bool,
}
