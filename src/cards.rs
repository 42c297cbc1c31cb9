//! Card adaptation for the frontend
//!
//! The upstream wire format keeps English text and API-centric field
//! names; the frontend wants translated text, a drawn orientation and a
//! ready-to-display interpretation.

use rand::seq::IndexedRandom;
use rand::{Rng, RngExt};
use serde::Serialize;

use crate::translate::Translator;
use crate::upstream::Card;

/// How a drawn card lies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Card drawn upright
    Upright,
    /// Card drawn reversed
    Reversed,
}

impl Orientation {
    /// Draw an orientation at random
    pub fn draw(rng: &mut impl Rng) -> Self {
        if rng.random_bool(0.5) {
            Self::Upright
        } else {
            Self::Reversed
        }
    }
}

/// A card in the frontend format
#[derive(Debug, Clone, Serialize)]
pub struct AdaptedCard {
    /// Numeric card value
    pub id: i64,
    /// Translated card name
    pub name: String,
    /// Short identifier, e.g. `ar01`
    pub name_short: String,
    /// `major` or `minor`
    #[serde(rename = "type")]
    pub kind: String,
    /// Card value as printed
    pub value: String,
    /// Translated upright meaning
    pub meaning_upright: String,
    /// Translated reversed meaning
    pub meaning_reversed: String,
    /// Translated description
    pub description: String,
    /// Translated suit, minor arcana only
    pub suit: Option<String>,
    /// Untranslated card name
    pub original_name: String,
    /// Orientation, present when the card was drawn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Orientation>,
    /// Meaning matching the orientation, present when the card was drawn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

/// Adapt one upstream card, translating its text and attaching the
/// orientation when the card was drawn.
pub async fn adapt_card(
    card: &Card,
    position: Option<Orientation>,
    translator: &Translator,
) -> AdaptedCard {
    let meaning_upright = translator.translate(&card.meaning_up).await;
    let meaning_reversed = translator.translate(&card.meaning_rev).await;

    let suit = if card.kind == "minor" {
        match &card.suit {
            Some(suit) => Some(translator.translate(suit).await),
            None => None,
        }
    } else {
        None
    };

    let interpretation = position.map(|p| match p {
        Orientation::Upright => meaning_upright.clone(),
        Orientation::Reversed => meaning_reversed.clone(),
    });

    AdaptedCard {
        id: card.value_int,
        name: translator.translate(&card.name).await,
        name_short: card.name_short.clone(),
        kind: card.kind.clone(),
        value: card.value.clone(),
        meaning_upright,
        meaning_reversed,
        description: translator.translate(&card.desc).await,
        suit,
        original_name: card.name.clone(),
        position,
        interpretation,
    }
}

/// Sample up to `n` distinct cards from the deck
pub fn sample_cards(deck: &[Card], n: usize, rng: &mut impl Rng) -> Vec<Card> {
    deck.choose_multiple(rng, n.min(deck.len()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cache::SimpleCache;
    use crate::config::TranslationConfig;

    fn passthrough_translator() -> Translator {
        let config = TranslationConfig {
            enabled: false,
            ..TranslationConfig::default()
        };
        let cache = Arc::new(SimpleCache::new(10, Duration::from_secs(60)));
        Translator::new(config, cache).unwrap()
    }

    fn major_card() -> Card {
        serde_json::from_value(serde_json::json!({
            "type": "major",
            "name_short": "ar16",
            "name": "The Tower",
            "value": "16",
            "value_int": 16,
            "meaning_up": "Ruin, disruption",
            "meaning_rev": "Oppression, imprisonment",
            "desc": "Occult explanations attached to this card"
        }))
        .unwrap()
    }

    fn minor_card() -> Card {
        serde_json::from_value(serde_json::json!({
            "type": "minor",
            "name_short": "cu02",
            "name": "Two of Cups",
            "value": "2",
            "value_int": 2,
            "meaning_up": "Love, passion",
            "meaning_rev": "Imprudence",
            "desc": "Two cups exchanged",
            "suit": "cups"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn upright_card_interprets_from_upright_meaning() {
        let translator = passthrough_translator();
        let adapted = adapt_card(&major_card(), Some(Orientation::Upright), &translator).await;

        assert_eq!(adapted.position, Some(Orientation::Upright));
        assert_eq!(adapted.interpretation.as_deref(), Some("Ruin, disruption"));
        assert_eq!(adapted.id, 16);
        assert_eq!(adapted.original_name, "The Tower");
    }

    #[tokio::test]
    async fn reversed_card_interprets_from_reversed_meaning() {
        let translator = passthrough_translator();
        let adapted = adapt_card(&major_card(), Some(Orientation::Reversed), &translator).await;

        assert_eq!(
            adapted.interpretation.as_deref(),
            Some("Oppression, imprisonment")
        );
    }

    #[tokio::test]
    async fn undrawn_card_has_no_position_or_interpretation() {
        let translator = passthrough_translator();
        let adapted = adapt_card(&major_card(), None, &translator).await;

        assert_eq!(adapted.position, None);
        assert_eq!(adapted.interpretation, None);

        let json = serde_json::to_value(&adapted).unwrap();
        assert!(json.get("position").is_none());
        assert!(json.get("interpretation").is_none());
    }

    #[tokio::test]
    async fn only_minor_cards_carry_a_suit() {
        let translator = passthrough_translator();

        let major = adapt_card(&major_card(), None, &translator).await;
        assert_eq!(major.suit, None);

        let minor = adapt_card(&minor_card(), None, &translator).await;
        assert_eq!(minor.suit.as_deref(), Some("cups"));
    }

    #[test]
    fn orientation_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Orientation::Upright).unwrap(),
            serde_json::json!("upright")
        );
        assert_eq!(
            serde_json::to_value(Orientation::Reversed).unwrap(),
            serde_json::json!("reversed")
        );
    }

    #[test]
    fn sample_returns_distinct_cards() {
        let deck = vec![major_card(), minor_card()];
        let mut rng = rand::rng();

        let drawn = sample_cards(&deck, 2, &mut rng);
        assert_eq!(drawn.len(), 2);
        assert_ne!(drawn[0].name_short, drawn[1].name_short);
    }

    #[test]
    fn sample_caps_at_deck_size() {
        let deck = vec![major_card()];
        let mut rng = rand::rng();
        assert_eq!(sample_cards(&deck, 10, &mut rng).len(), 1);
    }
}
