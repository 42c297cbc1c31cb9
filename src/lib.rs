//! Tarot Gateway Library
//!
//! Web backend for an online tarot reading service. Proxies the
//! tarotapi.dev card API, translates card text to pt-BR, composes
//! spreads with positional meanings and serves the single-page frontend.
//!
//! # Features
//!
//! - **Bounded TTL caches**: one for raw card data, one for translated
//!   strings, with remove-oldest eviction and lazy expiry
//! - **Read-through fetching**: upstream failures are never cached, so
//!   the next request retries
//! - **Best-effort translation**: a translation outage degrades to the
//!   original English text instead of failing the request
//! - **Spread composition**: three-card, Celtic Cross and love layouts
//!   with generated reading summaries

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod cards;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod spread;
pub mod translate;
pub mod upstream;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
