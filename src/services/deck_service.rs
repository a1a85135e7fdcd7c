use async_trait::async_trait;
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{deck_query::DeckQuery, ServiceResult};
use crate::card_blob::{card_blob_service::CardBlobService, line_parser::ParseOptions};
use crate::cards::{
    card::CardGroup,
    deck::{Deck, QueriedDeck},
};

/// Remote deck store used by the deck manager.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DeckRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> ServiceResult<Deck>;

    async fn get_by_query(&self, query: &DeckQuery) -> ServiceResult<Vec<QueriedDeck>>;

    /// Returns the id assigned by the store.
    async fn create_deck(&self, deck: &Deck) -> ServiceResult<String>;

    async fn update_deck(&self, deck: &Deck) -> ServiceResult<()>;

    async fn delete_deck(&self, id: &str) -> ServiceResult<()>;
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCardGroup {
    pub name: String,
    pub card_blob: String,
}

/// Wire format of a deck, card groups travel as text blobs.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub card_groups: Vec<ApiCardGroup>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<QueriedDeck>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

pub struct HttpDeckService {
    client: Client,
    base_url: String,
    blob_service: CardBlobService,
    access_token: Option<String>,
}

impl HttpDeckService {
    pub fn new(
        client: Client,
        base_url: &str,
        blob_service: CardBlobService,
        access_token: Option<String>,
    ) -> Self {
        HttpDeckService {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            blob_service,
            access_token,
        }
    }

    fn setup_http_headers(&self) -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        header_map.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = &self.access_token {
            match reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    header_map.insert(reqwest::header::AUTHORIZATION, value);
                }
                Err(e) => log::warn!("Ignoring malformed access token: {}", e),
            }
        }
        header_map
    }

    fn deck_url(&self, id: &str) -> String {
        let id = form_urlencoded::byte_serialize(id.as_bytes()).collect::<String>();
        format!("{}/{}", self.base_url, id)
    }

    pub fn map_api_deck_to_deck(&self, api_deck: ApiDeck) -> Deck {
        let groups = api_deck
            .card_groups
            .into_iter()
            .map(|group| {
                // Stored blobs predate comment lines, `//` lines stay as invalid cards.
                let parsed = self.blob_service.parse_with(
                    &group.card_blob,
                    ParseOptions {
                        skip_comment_lines: false,
                    },
                );
                CardGroup {
                    name: group.name,
                    cards: parsed.cards,
                    invalid_cards: parsed.invalid_cards,
                }
            })
            .collect();

        Deck::from_ordered_groups(
            api_deck.id,
            api_deck.name,
            api_deck.owners,
            api_deck.notes,
            api_deck.tags,
            groups,
        )
    }

    pub fn map_deck_to_api_deck(deck: &Deck) -> ApiDeck {
        let card_groups = deck
            .ordered_card_groups()
            .map(|(_, group)| ApiCardGroup {
                name: group.name.clone(),
                card_blob: CardBlobService::stringify(&group.cards, &group.invalid_cards),
            })
            .collect();

        ApiDeck {
            id: deck.id.clone(),
            name: deck.name.clone(),
            owners: deck.owners.clone(),
            notes: deck.notes.clone(),
            tags: deck.tags.clone(),
            card_groups,
        }
    }
}

#[async_trait]
impl DeckRepository for HttpDeckService {
    async fn get_by_id(&self, id: &str) -> ServiceResult<Deck> {
        debug!("Fetching deck {}", id);
        let api_deck = self
            .client
            .get(self.deck_url(id))
            .headers(self.setup_http_headers())
            .send()
            .await?
            .error_for_status()?
            .json::<ApiDeck>()
            .await?;

        Ok(self.map_api_deck_to_deck(api_deck))
    }

    async fn get_by_query(&self, query: &DeckQuery) -> ServiceResult<Vec<QueriedDeck>> {
        let response = self
            .client
            .get(&self.base_url)
            .headers(self.setup_http_headers())
            .query(&query.to_params())
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse>()
            .await?;

        debug!("Query {:?} returned {} decks", query, response.results.len());
        Ok(response.results)
    }

    async fn create_deck(&self, deck: &Deck) -> ServiceResult<String> {
        let response = self
            .client
            .post(&self.base_url)
            .headers(self.setup_http_headers())
            .json(&Self::map_deck_to_api_deck(deck))
            .send()
            .await?
            .error_for_status()?
            .json::<CreateResponse>()
            .await?;

        info!("Created deck {} with id {}", deck.name, response.id);
        Ok(response.id)
    }

    async fn update_deck(&self, deck: &Deck) -> ServiceResult<()> {
        let id = deck.id.as_deref().ok_or("Cannot update a deck without an id")?;
        self.client
            .put(self.deck_url(id))
            .headers(self.setup_http_headers())
            .json(&Self::map_deck_to_api_deck(deck))
            .send()
            .await?
            .error_for_status()?;

        info!("Updated deck {}", id);
        Ok(())
    }

    async fn delete_deck(&self, id: &str) -> ServiceResult<()> {
        self.client
            .delete(self.deck_url(id))
            .headers(self.setup_http_headers())
            .send()
            .await?
            .error_for_status()?;

        info!("Deleted deck {}", id);
        Ok(())
    }
}
