//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, warn};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::{Error, Result};

/// Sweep interval floor; sub-second config values would busy-loop the task.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Tarot gateway server
pub struct Gateway {
    /// Shared state: configuration, caches and clients
    state: Arc<AppState>,
}

impl Gateway {
    /// Create a new gateway: builds both caches, the upstream client and
    /// the translator from the configuration.
    pub fn new(config: Config) -> Result<Self> {
        let state = Arc::new(AppState::new(config)?);
        Ok(Self { state })
    }

    /// Run the gateway until a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        let state = self.state;
        let addr = SocketAddr::new(
            state
                .config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            state.config.server.port,
        );
        let sweep = state.config.sweep.clone();

        // Create shutdown channel
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

        // Create router
        let app = create_router(Arc::clone(&state));

        // Bind listener
        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("TAROT GATEWAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(
            host = %state.config.server.host,
            port = %state.config.server.port,
            "Listening"
        );
        info!(upstream = %state.config.upstream.base_url, "Proxying card API");
        info!(
            cards_capacity = state.config.cache.cards.max_entries,
            translations_capacity = state.config.cache.translations.max_entries,
            "Caches ready"
        );
        info!("============================================================");

        // Warm-load the deck so the first request is served from cache
        let warm_state = Arc::clone(&state);
        tokio::spawn(async move {
            match warm_state.deck(false).await {
                Some(cards) => {
                    info!(cards = cards.len(), "Deck warm-loaded");
                }
                None => {
                    warn!("Deck warm-load failed; the first request will retry");
                }
            }
        });

        // Periodic cache sweep
        if sweep.enabled {
            let sweep_state = Arc::clone(&state);
            let interval = sweep.interval.max(MIN_SWEEP_INTERVAL);
            let mut shutdown_rx = shutdown_tx.subscribe();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick fires immediately; skip it so the sweep
                // starts one full interval after boot.
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let cards = sweep_state.cards_cache.cleanup_expired();
                            let translations = sweep_state.translation_cache.cleanup_expired();
                            if cards + translations > 0 {
                                debug!(cards, translations, "Swept expired cache entries");
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_tx))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
