use std::sync::Arc;

use regex::Regex;

use crate::cards::card_definition::CardDefinition;

lazy_static::lazy_static! {
    // Optional quantity (with an optional x) followed by a name without digits.
    static ref CARD_LINE: Regex = Regex::new(r"^(?:([0-9]+)[Xx]?\s)?\s*([^0-9]+)$").unwrap();
}

const COMMENT_PREFIX: &str = "//";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip lines starting with `//` instead of reporting them as invalid.
    pub skip_comment_lines: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            skip_comment_lines: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Card {
        quantity: u32,
        definition: Arc<CardDefinition>,
    },
    Comment,
    Invalid,
}

/// Parses one line of a card list, e.g. `4x Lightning Bolt` or `Forest`.
pub fn parse_line<F>(line: &str, lookup: F, options: ParseOptions) -> ParsedLine
where
    F: Fn(&str) -> Option<Arc<CardDefinition>>,
{
    let line = line.trim();

    if options.skip_comment_lines && line.starts_with(COMMENT_PREFIX) {
        return ParsedLine::Comment;
    }

    let Some(captures) = CARD_LINE.captures(line) else {
        return ParsedLine::Invalid;
    };

    let Some(definition) = captures.get(2).and_then(|name| lookup(name.as_str())) else {
        return ParsedLine::Invalid;
    };

    let quantity = captures
        .get(1)
        .and_then(|quantity| quantity.as_str().parse::<u32>().ok())
        .filter(|quantity| *quantity > 0)
        .unwrap_or(1);

    ParsedLine::Card {
        quantity,
        definition,
    }
}
