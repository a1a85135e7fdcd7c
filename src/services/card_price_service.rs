use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use csv::ReaderBuilder;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::ServiceResult;
use crate::cards::price::Price;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPrice {
    pub name: String,
    pub usd: Option<Price>,
    /// Milliseconds since the unix epoch.
    pub modified_on: i64,
}

/// Recently fetched prices. A limit or expiration of zero disables caching.
#[derive(Debug, Clone)]
pub struct PriceCache {
    limit: usize,
    expiration_ms: i64,
    entries: HashMap<String, CardPrice>,
}

impl PriceCache {
    pub fn new(limit: usize, expiration_ms: i64) -> Self {
        PriceCache {
            limit,
            expiration_ms,
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limit > 0 && self.expiration_ms > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached prices for `names` that are newer than the staleness cutoff.
    pub fn known(&self, names: &[String], now: i64) -> Vec<CardPrice> {
        if names.is_empty() || !self.is_enabled() {
            return Vec::new();
        }

        let cutoff = now - self.expiration_ms;
        names
            .iter()
            .filter_map(|name| self.entries.get(name))
            .filter(|card| card.modified_on > cutoff)
            .cloned()
            .collect()
    }

    /// Drops stale entries, stores `new_cards` and keeps the newest `limit` entries.
    pub fn save(&mut self, new_cards: &[CardPrice], now: i64) {
        if new_cards.is_empty() || !self.is_enabled() {
            return;
        }

        let cutoff = now - self.expiration_ms;
        self.entries.retain(|_, card| card.modified_on > cutoff);
        for card in new_cards {
            self.entries.insert(card.name.clone(), card.clone());
        }

        if self.entries.len() > self.limit {
            let mut cards: Vec<CardPrice> = self.entries.drain().map(|(_, card)| card).collect();
            cards.sort_by(|a, b| b.modified_on.cmp(&a.modified_on));
            cards.truncate(self.limit);
            self.entries = cards
                .into_iter()
                .map(|card| (card.name.clone(), card))
                .collect();
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    name: String,
    #[serde(default)]
    usd: Option<String>,
}

#[derive(Clone)]
pub struct CardPriceService {
    client: Client,
    url: String,
    cache: Arc<Mutex<PriceCache>>,
}

impl CardPriceService {
    pub fn new(client: Client, url: String, cache: PriceCache) -> Self {
        CardPriceService {
            client,
            url,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Prices keyed by lowercase name. Names the price server does not know map to `None`.
    pub async fn get_card_prices(
        &self,
        card_names: &[String],
    ) -> ServiceResult<HashMap<String, Option<Price>>> {
        let card_names: Vec<String> = card_names.iter().map(|name| name.to_lowercase()).collect();
        let now = Utc::now().timestamp_millis();

        let known_cards = self.cache.lock().await.known(&card_names, now);
        let unknown_names: Vec<String> = card_names
            .iter()
            .filter(|name| !known_cards.iter().any(|card| &card.name == *name))
            .cloned()
            .collect();
        debug!(
            "{} cached prices, fetching {}",
            known_cards.len(),
            unknown_names.len()
        );

        let unknown_cards: Vec<CardPrice> = self
            .fetch_prices(&unknown_names)
            .await?
            .into_iter()
            .map(|(name, usd)| CardPrice {
                name,
                usd,
                modified_on: now,
            })
            .collect();
        self.cache.lock().await.save(&unknown_cards, now);

        let mut prices: HashMap<String, Option<Price>> = unknown_names
            .into_iter()
            .map(|name| (name, None))
            .collect();
        for card in known_cards.into_iter().chain(unknown_cards) {
            prices.insert(card.name, card.usd);
        }

        Ok(prices)
    }

    async fn fetch_prices(&self, card_names: &[String]) -> ServiceResult<Vec<(String, Option<Price>)>> {
        if card_names.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/text")
            .body(card_names.join("\n"))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let prices = Self::parse_price_table(&response)?;
        info!("Fetched {} of {} card prices", prices.len(), card_names.len());
        Ok(prices)
    }

    /// Parses the tab-separated `name\tusd` table returned by the price server.
    fn parse_price_table(table: &str) -> ServiceResult<Vec<(String, Option<Price>)>> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(table.as_bytes());

        let mut prices = Vec::new();
        for row in rdr.deserialize() {
            let row: PriceRow = row?;
            if row.name.trim().is_empty() {
                continue;
            }
            let usd = row.usd.as_deref().and_then(Price::parse);
            prices.push((row.name.trim().to_lowercase(), usd));
        }
        Ok(prices)
    }
}
