//! HTTP router and handlers

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{Method, Uri, header},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::cache::{SimpleCache, get_cached};
use crate::cards::{AdaptedCard, Orientation, adapt_card, sample_cards};
use crate::config::Config;
use crate::spread::{DailyCard, Interpretation, Spread, SpreadKind, compose_spread, daily_card, interpret_question};
use crate::translate::Translator;
use crate::upstream::{Card, TarotClient};
use crate::{Error, Result};

/// Cache key for the full deck
const DECK_CACHE_KEY: &str = "all_cards";

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration
    pub config: Config,
    /// Cache for raw upstream card data
    pub cards_cache: Arc<SimpleCache<Vec<Card>>>,
    /// Cache for translated strings
    pub translation_cache: Arc<SimpleCache<String>>,
    /// Upstream tarot API client
    pub upstream: TarotClient,
    /// Translation client
    pub translator: Translator,
}

impl AppState {
    /// Build the state: both process caches, the upstream client and the
    /// translator. The caches live for the whole process.
    pub fn new(config: Config) -> Result<Self> {
        if config.cache.cards.max_entries == 0 || config.cache.translations.max_entries == 0 {
            return Err(Error::Config(
                "cache max_entries must be positive".to_string(),
            ));
        }

        let cards_cache = Arc::new(SimpleCache::new(
            config.cache.cards.max_entries,
            config.cache.cards.ttl,
        ));
        let translation_cache = Arc::new(SimpleCache::new(
            config.cache.translations.max_entries,
            config.cache.translations.ttl,
        ));

        let upstream = TarotClient::new(&config.upstream)?;
        let translator = Translator::new(
            config.translation.clone(),
            Arc::clone(&translation_cache),
        )?;

        Ok(Self {
            config,
            cards_cache,
            translation_cache,
            upstream,
            translator,
        })
    }

    /// The full deck, read through the cards cache.
    ///
    /// A failed upstream fetch is logged and surfaces as `None`; it is
    /// never cached, so the next call retries.
    pub async fn deck(&self, force_refresh: bool) -> Option<Vec<Card>> {
        if force_refresh {
            self.cards_cache.delete(DECK_CACHE_KEY);
        }

        get_cached(&self.cards_cache, DECK_CACHE_KEY, || async {
            match self.upstream.all_cards().await {
                Ok(cards) => {
                    info!(count = cards.len(), "Loaded deck from upstream");
                    Some(cards)
                }
                Err(e) => {
                    error!(error = %e, "Failed to load deck from upstream");
                    None
                }
            }
        })
        .await
    }

    /// The deck, or `DeckUnavailable` when neither upstream nor cache has cards
    async fn require_deck(&self) -> Result<Vec<Card>> {
        match self.deck(false).await {
            Some(cards) if !cards.is_empty() => Ok(cards),
            _ => Err(Error::DeckUnavailable),
        }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/", get(api_home))
        .route("/status", get(api_status))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/cleanup", post(cache_cleanup))
        .route("/tarot/cards", get(list_cards))
        .route("/tarot/random", get(random_cards))
        .route("/tarot/spread/{kind}", get(spread))
        .route("/tarot/card/{name_short}", get(card_by_id))
        .route("/tarot/search", get(search_cards))
        .route("/tarot/daily", get(daily))
        .route("/tarot/interpret", post(interpret))
        .route("/admin/refresh-cache", post(refresh_cache))
        .fallback(api_not_found);

    // Single-page frontend: real files win, everything else falls back
    // to index.html so client-side routes resolve.
    let static_dir = PathBuf::from(&state.config.frontend.static_dir);
    let frontend = ServeDir::new(&static_dir)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .nest("/api", api)
        .fallback_service(frontend)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api - service banner
async fn api_home(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": "API de Tarot Online",
        "version": env!("CARGO_PKG_VERSION"),
        "cache_stats": {
            "cards": state.cards_cache.stats(),
            "translations": state.translation_cache.stats(),
        },
        "endpoints": {
            "GET /api/status": "Status da API e cache",
            "GET /api/tarot/cards": "Listar todas as cartas",
            "GET /api/tarot/random?count=3": "Tirar cartas aleatórias",
            "GET /api/tarot/spread/three": "Tirada de 3 cartas",
            "GET /api/tarot/spread/celtic": "Tirada Cruz Celta",
            "GET /api/tarot/spread/love": "Tirada do Amor",
            "GET /api/tarot/card/<name_short>": "Detalhes de uma carta",
            "GET /api/tarot/search?q=amor": "Buscar cartas",
            "GET /api/tarot/daily": "Carta do dia",
            "POST /api/tarot/interpret": "Interpretar pergunta",
            "GET /api/cache/stats": "Estatísticas do cache",
            "POST /api/cache/cleanup": "Limpar itens expirados",
        },
    }))
}

/// GET /api/status - upstream probe and cache health
async fn api_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let api_status = if state.upstream.ping().await {
        "online"
    } else {
        "offline"
    };

    let cards_in_cache = state.deck(false).await.map_or(0, |cards| cards.len());

    Json(json!({
        "api_status": api_status,
        "cache_stats": state.cards_cache.stats(),
        "translation_cache_stats": state.translation_cache.stats(),
        "cards_in_cache": cards_in_cache,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/cache/stats - detailed cache statistics
async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut cards_keys = state.cards_cache.all_keys();
    cards_keys.truncate(10);
    let mut translation_keys = state.translation_cache.all_keys();
    translation_keys.truncate(10);

    Json(json!({
        "cards_cache": state.cards_cache.stats(),
        "translation_cache": state.translation_cache.stats(),
        "cards_keys": cards_keys,
        "translation_keys": translation_keys,
    }))
}

/// POST /api/cache/cleanup - sweep expired entries on demand
async fn cache_cleanup(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cards_removed = state.cards_cache.cleanup_expired();
    let translations_removed = state.translation_cache.cleanup_expired();

    Json(json!({
        "success": true,
        "cards_removed": cards_removed,
        "translations_removed": translations_removed,
        "message": format!(
            "Removidos {cards_removed} itens do cache de cartas e {translations_removed} do cache de traduções"
        ),
    }))
}

#[derive(Debug, Deserialize)]
struct CardsQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    suit: Option<String>,
}

/// GET /api/tarot/cards - full deck with optional type/suit filters
async fn list_cards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CardsQuery>,
) -> Result<Json<Value>> {
    let deck = state.require_deck().await?;

    let filtered: Vec<&Card> = deck
        .iter()
        .filter(|card| {
            query.kind.as_ref().is_none_or(|kind| &card.kind == kind)
                && query.suit.as_ref().is_none_or(|suit| {
                    card.suit
                        .as_deref()
                        .is_some_and(|s| s.eq_ignore_ascii_case(suit))
                })
        })
        .collect();

    let mut cards = Vec::with_capacity(filtered.len());
    for card in filtered {
        cards.push(adapt_card(card, None, &state.translator).await);
    }

    Ok(Json(json!({
        "total": cards.len(),
        "cards": cards,
    })))
}

#[derive(Debug, Deserialize)]
struct RandomQuery {
    count: Option<String>,
}

/// GET /api/tarot/random - draw random cards, falling back to the cached
/// deck when the upstream draw endpoint is down
async fn random_cards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RandomQuery>,
) -> Result<Json<Vec<AdaptedCard>>> {
    let n = clamp_count(query.count.as_deref());

    let drawn = match state.upstream.random_cards(n).await {
        Ok(cards) => cards,
        Err(e) => {
            warn!(error = %e, "Upstream draw failed, sampling cached deck");
            let deck = state.require_deck().await?;
            let mut rng = rand::rng();
            sample_cards(&deck, n, &mut rng)
        }
    };

    let mut result = Vec::with_capacity(drawn.len());
    for card in &drawn {
        let orientation = {
            let mut rng = rand::rng();
            Orientation::draw(&mut rng)
        };
        result.push(adapt_card(card, Some(orientation), &state.translator).await);
    }

    Ok(Json(result))
}

/// GET /api/tarot/spread/{kind} - compose a spread
async fn spread(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<Spread>> {
    let kind = SpreadKind::from_path(&kind)
        .ok_or_else(|| Error::NotFound(format!("Unknown spread: {kind}")))?;

    let deck = state.require_deck().await?;
    Ok(Json(compose_spread(kind, &deck, &state.translator).await))
}

/// GET /api/tarot/card/{name_short} - single card lookup
async fn card_by_id(
    State(state): State<Arc<AppState>>,
    Path(name_short): Path<String>,
) -> Result<Json<AdaptedCard>> {
    let deck = state.require_deck().await?;

    let card = deck
        .iter()
        .find(|card| card.name_short == name_short)
        .ok_or_else(|| Error::NotFound(format!("Card not found: {name_short}")))?;

    Ok(Json(adapt_card(card, None, &state.translator).await))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// GET /api/tarot/search - keyword search across original and translated text
async fn search_cards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let term = query.q.unwrap_or_default().trim().to_lowercase();
    if term.is_empty() {
        return Err(Error::BadRequest("Missing search term".to_string()));
    }

    let deck = state.require_deck().await?;

    let mut results = Vec::new();
    for card in &deck {
        let adapted = adapt_card(card, None, &state.translator).await;
        if matches_term(card, &adapted, &term) {
            results.push(adapted);
        }
    }

    let total = results.len();
    results.truncate(20);

    Ok(Json(json!({
        "query": term,
        "total": total,
        "results": results,
    })))
}

/// GET /api/tarot/daily - date-seeded card of the day
async fn daily(State(state): State<Arc<AppState>>) -> Result<Json<DailyCard>> {
    let deck = state.require_deck().await?;
    let today = chrono::Local::now().date_naive();

    daily_card(today, &deck, &state.translator)
        .await
        .map(Json)
        .ok_or(Error::DeckUnavailable)
}

#[derive(Debug, Deserialize)]
struct InterpretRequest {
    question: Option<String>,
}

/// POST /api/tarot/interpret - three-card reading for a question
async fn interpret(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InterpretRequest>,
) -> Result<Json<Interpretation>> {
    let question = request.question.unwrap_or_default();
    if question.trim().is_empty() {
        return Err(Error::BadRequest("Missing question".to_string()));
    }

    let deck = state.require_deck().await?;
    Ok(Json(
        interpret_question(&question, &deck, &state.translator).await,
    ))
}

/// POST /api/admin/refresh-cache - force a deck refetch
async fn refresh_cache(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let cards = state.deck(true).await.ok_or(Error::DeckUnavailable)?;

    Ok(Json(json!({
        "success": true,
        "cards_count": cards.len(),
        "cache_stats": state.cards_cache.stats(),
        "message": "Cache atualizado com sucesso",
    })))
}

/// Fallback for unknown /api paths - JSON 404 instead of the SPA page
async fn api_not_found(uri: Uri) -> Error {
    Error::NotFound(format!("Endpoint not found: {}", uri.path()))
}

/// Parse and clamp the random-draw count. Garbage and out-of-range input
/// degrade to sane values rather than erroring, as the frontend sends
/// whatever its slider holds.
fn clamp_count(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map_or(1, |n| usize::try_from(n.clamp(1, 10)).unwrap_or(1))
}

/// Match a search term against a card's original and translated text
fn matches_term(card: &Card, adapted: &AdaptedCard, term: &str) -> bool {
    let haystacks = [
        &card.name,
        &card.meaning_up,
        &card.meaning_rev,
        &card.desc,
        &adapted.name,
        &adapted.meaning_upright,
        &adapted.meaning_reversed,
        &adapted.description,
    ];
    haystacks
        .iter()
        .any(|text| text.to_lowercase().contains(term))
}
