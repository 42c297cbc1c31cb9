//! Client for the upstream tarot card API
//!
//! Thin reqwest wrapper over `tarotapi.dev/api/v1`. The gateway never
//! calls this directly from a hot path without going through the cards
//! cache; see the fetch helpers in the gateway module.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::{Error, Result};

/// One card in the upstream wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Full card name, in English
    pub name: String,
    /// Short identifier, e.g. `ar01`
    #[serde(default)]
    pub name_short: String,
    /// `major` or `minor`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Card value as printed, e.g. `ace` or `4`
    #[serde(default)]
    pub value: String,
    /// Numeric card value
    #[serde(default)]
    pub value_int: i64,
    /// Upright meaning
    #[serde(default)]
    pub meaning_up: String,
    /// Reversed meaning
    #[serde(default)]
    pub meaning_rev: String,
    /// Card description
    #[serde(default)]
    pub desc: String,
    /// Suit, minor arcana only
    #[serde(default)]
    pub suit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardsResponse {
    cards: Vec<Card>,
}

/// Client for the upstream tarot card API
#[derive(Debug, Clone)]
pub struct TarotClient {
    client: Client,
    base_url: String,
    probe_timeout: Duration,
}

impl TarotClient {
    /// Create a client from the upstream configuration
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            probe_timeout: config.probe_timeout,
        })
    }

    /// Fetch the full deck
    pub async fn all_cards(&self) -> Result<Vec<Card>> {
        let url = format!("{}/cards", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Card fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Card API returned {}",
                response.status()
            )));
        }

        let body: CardsResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid card payload: {e}")))?;

        debug!(count = body.cards.len(), "Fetched cards from upstream");
        Ok(body.cards)
    }

    /// Fetch `n` random cards from the upstream draw endpoint
    pub async fn random_cards(&self, n: usize) -> Result<Vec<Card>> {
        let url = format!("{}/cards/random", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("n", n.to_string())])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Random draw failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Card API returned {}",
                response.status()
            )));
        }

        let body: CardsResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid card payload: {e}")))?;

        Ok(body.cards)
    }

    /// Probe the upstream API. Used by the status endpoint only; failures
    /// are a status, not an error.
    pub async fn ping(&self) -> bool {
        let url = format!("{}/cards/random", self.base_url);
        self.client
            .get(&url)
            .query(&[("n", "1")])
            .timeout(self.probe_timeout)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }
}
