use std::{collections::HashMap, sync::Arc};

use log::debug;
use regex::Regex;

use super::line_parser::{parse_line, ParseOptions, ParsedLine};
use crate::cards::card::{Card, CardView};
use crate::catalog::card_catalog::CardCatalog;
use crate::utilities::config::CONFIG;

lazy_static::lazy_static! {
    // A newline plus any whitespace or blank lines that follow it.
    static ref LINE_SEPARATOR: Regex = Regex::new(r"\n[\s\n]*").unwrap();
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseCardBlobResult {
    pub cards: Vec<Card>,
    pub invalid_cards: Vec<String>,
}

/// Converts free-text card lists to cards and back.
#[derive(Debug, Clone)]
pub struct CardBlobService {
    catalog: Arc<CardCatalog>,
    options: ParseOptions,
}

impl CardBlobService {
    pub fn new(catalog: Arc<CardCatalog>) -> Self {
        Self::with_options(
            catalog,
            ParseOptions {
                skip_comment_lines: CONFIG.skip_comment_lines,
            },
        )
    }

    pub fn with_options(catalog: Arc<CardCatalog>, options: ParseOptions) -> Self {
        CardBlobService { catalog, options }
    }

    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.catalog
    }

    pub fn skips_comment_lines(&self) -> bool {
        self.options.skip_comment_lines
    }

    pub fn parse(&self, card_blob: &str) -> ParseCardBlobResult {
        self.parse_with(card_blob, self.options)
    }

    /// Never fails: lines that are not cards end up in `invalid_cards`.
    pub fn parse_with(&self, card_blob: &str, options: ParseOptions) -> ParseCardBlobResult {
        let card_blob = card_blob.trim();
        if card_blob.is_empty() {
            return ParseCardBlobResult::default();
        }

        let mut cards: Vec<Card> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut invalid_cards = Vec::new();

        for line in LINE_SEPARATOR.split(card_blob) {
            match parse_line(line, |name| self.catalog.get(name), options) {
                ParsedLine::Card {
                    quantity,
                    definition,
                } => match positions.get(&definition.name.cleaned) {
                    Some(&index) => {
                        let card = &mut cards[index];
                        card.quantity = card.quantity.saturating_add(quantity);
                    }
                    None => {
                        positions.insert(definition.name.cleaned.clone(), cards.len());
                        cards.push(Card::new(definition, quantity));
                    }
                },
                ParsedLine::Comment => {}
                ParsedLine::Invalid => {
                    debug!("Invalid card line: '{}'", line.trim());
                    invalid_cards.push(line.trim().to_string());
                }
            }
        }

        ParseCardBlobResult {
            cards,
            invalid_cards,
        }
    }

    /// Canonical text form: invalid lines first, then `<quantity>x <name>` per card.
    pub fn stringify(cards: &[Card], invalid_cards: &[String]) -> String {
        invalid_cards
            .iter()
            .cloned()
            .chain(cards.iter().map(Self::card_line))
            .collect::<Vec<String>>()
            .join("\n")
    }

    /// Text form that keeps the current grouping as `// <header>` sections.
    pub fn stringify_grouped(card_views: &[CardView], invalid_cards: &[String]) -> String {
        let mut blocks = Vec::new();
        if !invalid_cards.is_empty() {
            blocks.push(invalid_cards.join("\n"));
        }

        for view in card_views {
            let lines: Vec<String> = view
                .name
                .iter()
                .map(|name| format!("// {}", name))
                .chain(view.cards.iter().map(Self::card_line))
                .collect();

            if !lines.is_empty() {
                blocks.push(lines.join("\n"));
            }
        }

        blocks.join("\n\n")
    }

    fn card_line(card: &Card) -> String {
        format!("{}x {}", card.quantity, card.name())
    }
}
