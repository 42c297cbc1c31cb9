//! Card text translation with caching
//!
//! Translates upstream card text (English) to the configured target
//! language through a gtx-compatible HTTP endpoint. Every translation is
//! cached under a digest of the source text; translation is best-effort
//! and falls back to the original text on any failure, so a translation
//! outage never fails a request.

use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::cache::SimpleCache;
use crate::config::TranslationConfig;
use crate::{Error, Result};

/// Translation client backed by the translations cache
#[derive(Debug, Clone)]
pub struct Translator {
    client: Client,
    config: TranslationConfig,
    cache: Arc<SimpleCache<String>>,
}

impl Translator {
    /// Create a translator from configuration and the shared translations cache
    pub fn new(config: TranslationConfig, cache: Arc<SimpleCache<String>>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            cache,
        })
    }

    /// Translate `text`, consulting the cache first.
    ///
    /// Returns the original text untouched when translation is disabled,
    /// the text is empty, or the endpoint call fails. Failed translations
    /// are never cached.
    pub async fn translate(&self, text: &str) -> String {
        if text.is_empty() || !self.config.enabled {
            return text.to_string();
        }

        let key = translation_key(text);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        match self.fetch_translation(text).await {
            Ok(translated) => {
                self.cache.set(&key, translated.clone());
                translated
            }
            Err(e) => {
                warn!(error = %e, "Translation failed, serving original text");
                text.to_string()
            }
        }
    }

    /// Call the translation endpoint for one piece of text
    async fn fetch_translation(&self, text: &str) -> Result<String> {
        // Long descriptions blow the endpoint's limits; cap the request.
        let trimmed: String = if text.chars().count() > self.config.max_chars {
            text.chars().take(self.config.max_chars).collect()
        } else {
            text.to_string()
        };

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.config.source.as_str()),
                ("tl", self.config.target.as_str()),
                ("dt", "t"),
                ("q", trimmed.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Translation request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Translation endpoint returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid translation payload: {e}")))?;

        extract_translation(&body)
            .ok_or_else(|| Error::Upstream("Empty translation payload".to_string()))
    }
}

/// Cache key for a piece of source text: `translation:` plus the SHA-256
/// hex digest, so arbitrarily long text keys stay fixed-width.
#[must_use]
pub fn translation_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("translation:{hex}")
}

/// Pull the translated string out of a gtx payload.
///
/// The payload nests segments as `[[["translated", "original", ...], ...], ...]`;
/// the segments concatenate to the full translation.
fn extract_translation(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;

    let mut out = String::new();
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(Value::as_str) {
            out.push_str(part);
        }
    }

    if out.is_empty() { None } else { Some(out) }
}
