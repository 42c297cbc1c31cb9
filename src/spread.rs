//! Spread composition and interpretation
//!
//! A spread is a set of drawn cards bound to positional meanings, plus a
//! generated textual summary. Position tables and summary texts are the
//! service's pt-BR reading copy.

use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::Serialize;

use crate::cards::{AdaptedCard, Orientation, adapt_card, sample_cards};
use crate::translate::Translator;
use crate::upstream::Card;

/// One positional meaning in a spread layout
#[derive(Debug, Clone, Copy)]
pub struct Position {
    /// Position name shown to the reader
    pub name: &'static str,
    /// What the position stands for
    pub meaning: &'static str,
}

const THREE_POSITIONS: [Position; 3] = [
    Position {
        name: "Passado",
        meaning: "Influências que já passaram",
    },
    Position {
        name: "Presente",
        meaning: "Situação atual",
    },
    Position {
        name: "Futuro",
        meaning: "Tendências futuras",
    },
];

const CELTIC_POSITIONS: [Position; 10] = [
    Position {
        name: "Presente",
        meaning: "A situação atual",
    },
    Position {
        name: "Desafio",
        meaning: "O que está cruzando/desafiando",
    },
    Position {
        name: "Passado",
        meaning: "Fundamentos do passado",
    },
    Position {
        name: "Futuro",
        meaning: "O que se aproxima",
    },
    Position {
        name: "Acima",
        meaning: "Objetivos ou melhor resultado",
    },
    Position {
        name: "Abaixo",
        meaning: "Influências inconscientes",
    },
    Position {
        name: "Conselho",
        meaning: "Como proceder",
    },
    Position {
        name: "Influências Externas",
        meaning: "Pessoas/eventos ao redor",
    },
    Position {
        name: "Esperanças/Medos",
        meaning: "Sentimentos internos",
    },
    Position {
        name: "Resultado",
        meaning: "Resultado final potencial",
    },
];

const LOVE_POSITIONS: [Position; 5] = [
    Position {
        name: "Você",
        meaning: "Seus sentimentos atuais",
    },
    Position {
        name: "O Outro",
        meaning: "Sentimentos da outra pessoa",
    },
    Position {
        name: "A Relação",
        meaning: "Dinâmica do relacionamento",
    },
    Position {
        name: "Desafios",
        meaning: "O que precisa ser trabalhado",
    },
    Position {
        name: "Potencial",
        meaning: "Futuro do relacionamento",
    },
];

/// The spread layouts the gateway offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadKind {
    /// Past / present / future, 3 cards
    Three,
    /// Celtic Cross, 10 cards
    Celtic,
    /// Relationship reading, 5 cards
    Love,
}

impl SpreadKind {
    /// Parse a spread kind from its URL path segment
    #[must_use]
    pub fn from_path(value: &str) -> Option<Self> {
        match value {
            "three" => Some(Self::Three),
            "celtic" => Some(Self::Celtic),
            "love" => Some(Self::Love),
            _ => None,
        }
    }

    /// Path segment / wire name for this kind
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Three => "three",
            Self::Celtic => "celtic",
            Self::Love => "love",
        }
    }

    /// The position table for this layout
    #[must_use]
    pub fn positions(self) -> &'static [Position] {
        match self {
            Self::Three => &THREE_POSITIONS,
            Self::Celtic => &CELTIC_POSITIONS,
            Self::Love => &LOVE_POSITIONS,
        }
    }
}

/// A drawn card bound to its position in the spread
#[derive(Debug, Clone, Serialize)]
pub struct SpreadCard {
    /// The adapted card
    #[serde(flatten)]
    pub card: AdaptedCard,
    /// Position name
    pub position_name: &'static str,
    /// Position meaning
    pub position_meaning: &'static str,
}

/// A composed spread
#[derive(Debug, Clone, Serialize)]
pub struct Spread {
    /// Drawn cards in position order
    pub cards: Vec<SpreadCard>,
    /// Generated reading summary
    pub summary: String,
    /// Spread kind
    pub spread_type: &'static str,
}

/// A card drawn for a question, with its role in the answer
#[derive(Debug, Clone, Serialize)]
pub struct RoleCard {
    /// The adapted card
    #[serde(flatten)]
    pub card: AdaptedCard,
    /// The card's role in the interpretation
    pub role: &'static str,
}

/// A three-card interpretation of a free-form question
#[derive(Debug, Clone, Serialize)]
pub struct Interpretation {
    /// The question asked
    pub question: String,
    /// Drawn cards with their roles
    pub cards: Vec<RoleCard>,
    /// Overall reading
    pub summary: String,
}

/// The card of the day
#[derive(Debug, Clone, Serialize)]
pub struct DailyCard {
    /// The adapted card
    #[serde(flatten)]
    pub card: AdaptedCard,
    /// ISO date the draw is bound to
    pub date: String,
}

/// Compose a spread of the given kind from the deck
pub async fn compose_spread(kind: SpreadKind, deck: &[Card], translator: &Translator) -> Spread {
    let positions = kind.positions();
    let drawn = {
        let mut rng = rand::rng();
        sample_cards(deck, positions.len(), &mut rng)
    };

    let mut cards = Vec::with_capacity(drawn.len());
    for (card, position) in drawn.iter().zip(positions) {
        let orientation = {
            let mut rng = rand::rng();
            Orientation::draw(&mut rng)
        };
        let adapted = adapt_card(card, Some(orientation), translator).await;
        cards.push(SpreadCard {
            card: adapted,
            position_name: position.name,
            position_meaning: position.meaning,
        });
    }

    let summary = generate_summary(&cards, &drawn, kind);

    Spread {
        cards,
        summary,
        spread_type: kind.as_str(),
    }
}

/// Interpret a free-form question with three drawn cards
pub async fn interpret_question(
    question: &str,
    deck: &[Card],
    translator: &Translator,
) -> Interpretation {
    const ROLES: [&str; 3] = [
        "Fatores que influenciam a situação",
        "O caminho a seguir",
        "Resultado potencial",
    ];

    let drawn = {
        let mut rng = rand::rng();
        sample_cards(deck, ROLES.len(), &mut rng)
    };

    let mut cards = Vec::with_capacity(drawn.len());
    for (card, role) in drawn.iter().zip(ROLES) {
        let orientation = {
            let mut rng = rand::rng();
            Orientation::draw(&mut rng)
        };
        let adapted = adapt_card(card, Some(orientation), translator).await;
        cards.push(RoleCard {
            card: adapted,
            role,
        });
    }

    let upright = cards
        .iter()
        .filter(|c| c.card.position == Some(Orientation::Upright))
        .count();

    let summary = match upright {
        2.. => "As cartas indicam um caminho favorável para sua questão. Confie no processo.",
        1 => "Há aspectos positivos e desafiadores em sua questão. Busque equilíbrio.",
        _ => "Momento de introspecção. Reavalie sua abordagem antes de agir.",
    }
    .to_string();

    Interpretation {
        question: question.to_string(),
        cards,
        summary,
    }
}

/// Draw the card of the day. The draw is seeded from the date, so every
/// request on the same day sees the same card and orientation.
pub async fn daily_card(
    date: NaiveDate,
    deck: &[Card],
    translator: &Translator,
) -> Option<DailyCard> {
    if deck.is_empty() {
        return None;
    }

    let mut hasher = DefaultHasher::new();
    date.to_string().hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());

    let index = rng.random_range(0..deck.len());
    let orientation = Orientation::draw(&mut rng);
    let adapted = adapt_card(&deck[index], Some(orientation), translator).await;

    Some(DailyCard {
        card: adapted,
        date: date.to_string(),
    })
}

/// Generate the reading summary from the drawn cards.
///
/// Suit frequencies are counted from the untranslated cards, since the
/// adapted suit already carries the localized name.
fn generate_summary(cards: &[SpreadCard], originals: &[Card], kind: SpreadKind) -> String {
    if cards.is_empty() {
        return "Não foi possível gerar um resumo.".to_string();
    }

    let upright = cards
        .iter()
        .filter(|c| c.card.position == Some(Orientation::Upright))
        .count();
    let reversed = cards.len() - upright;

    let major = cards.iter().filter(|c| c.card.kind == "major").count();
    let minor = cards.len() - major;

    let mut parts: Vec<String> = Vec::new();

    if upright > reversed {
        parts.push(
            "✨ A maioria das cartas está na posição reta, indicando que as energias estão \
             fluindo de forma favorável e direta."
                .to_string(),
        );
    } else if reversed > upright {
        parts.push(
            "🌙 Há várias cartas invertidas, sugerindo a necessidade de introspecção e cuidado \
             com energias bloqueadas."
                .to_string(),
        );
    } else {
        parts.push(
            "⚖️ Há um equilíbrio entre cartas retas e invertidas, indicando um momento de \
             integração entre luz e sombra."
                .to_string(),
        );
    }

    if major > minor {
        parts.push(
            "🃏 A presença forte de Arcanos Maiores indica que lições importantes do destino \
             estão se manifestando."
                .to_string(),
        );
    } else if major == 0 {
        parts.push(
            "📜 Apenas Arcanos Menores surgiram, sugerindo que o foco está em situações práticas \
             do dia a dia."
                .to_string(),
        );
    }

    let suit_count = |suit: &str| {
        originals
            .iter()
            .filter(|c| c.suit.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(suit)))
            .count()
    };

    let mut suit_meanings: Vec<&str> = Vec::new();
    if suit_count("wands") >= 2 {
        suit_meanings.push("⚡ energia criativa e ação (Paus)");
    }
    if suit_count("cups") >= 2 {
        suit_meanings.push("💧 emoções e relacionamentos (Copas)");
    }
    if suit_count("swords") >= 2 {
        suit_meanings.push("🌪️ conflitos e pensamentos (Espadas)");
    }
    if suit_count("pentacles") >= 2 {
        suit_meanings.push("🌱 questões materiais e trabalho (Ouros)");
    }
    if !suit_meanings.is_empty() {
        parts.push(format!(
            "Os naipes em destaque são: {}.",
            suit_meanings.join(", ")
        ));
    }

    match kind {
        SpreadKind::Three => parts.push(
            "\n🔮 Nesta tirada de Passado/Presente/Futuro, observe como as energias evoluem \
             através do tempo."
                .to_string(),
        ),
        SpreadKind::Love => parts.push(
            "\n💕 Esta tirada do amor revela a dinâmica entre você, o outro e a relação."
                .to_string(),
        ),
        SpreadKind::Celtic => parts.push(
            "\n🌀 A Cruz Celta é uma tirada profunda que mostra desde as influências \
             inconscientes até o resultado potencial."
                .to_string(),
        ),
    }

    let first = &cards[0];
    let meaning = match first.card.position {
        Some(Orientation::Reversed) => &first.card.meaning_reversed,
        _ => &first.card.meaning_upright,
    };
    if !meaning.is_empty() {
        let short: String = if meaning.chars().count() > 100 {
            let head: String = meaning.chars().take(100).collect();
            format!("{head}...")
        } else {
            meaning.clone()
        };
        parts.push(format!("\n🎴 Destaque para {}: {short}", first.card.name));
    }

    parts.join(" ")
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
        let cache = Arc::new(SimpleCache::new(50, Duration::from_secs(60)));
        Translator::new(config, cache).unwrap()
    }

    fn card(name: &str, short: &str, kind: &str, suit: Option<&str>) -> Card {
        let mut raw = serde_json::json!({
            "type": kind,
            "name_short": short,
            "name": name,
            "value": "1",
            "value_int": 1,
            "meaning_up": format!("{name} upright meaning"),
            "meaning_rev": format!("{name} reversed meaning"),
            "desc": format!("{name} description"),
        });
        if let Some(suit) = suit {
            raw["suit"] = serde_json::json!(suit);
        }
        serde_json::from_value(raw).unwrap()
    }

    fn test_deck() -> Vec<Card> {
        vec![
            card("The Fool", "ar00", "major", None),
            card("The Magician", "ar01", "major", None),
            card("The Tower", "ar16", "major", None),
            card("Two of Cups", "cu02", "minor", Some("cups")),
            card("Ace of Wands", "wa01", "minor", Some("wands")),
            card("Four of Swords", "sw04", "minor", Some("swords")),
            card("Ten of Pentacles", "pe10", "minor", Some("pentacles")),
            card("Queen of Cups", "cuqu", "minor", Some("cups")),
            card("Knight of Wands", "wakn", "minor", Some("wands")),
            card("Seven of Swords", "sw07", "minor", Some("swords")),
            card("Two of Pentacles", "pe02", "minor", Some("pentacles")),
        ]
    }

    #[test]
    fn spread_kind_parses_path_segments() {
        assert_eq!(SpreadKind::from_path("three"), Some(SpreadKind::Three));
        assert_eq!(SpreadKind::from_path("celtic"), Some(SpreadKind::Celtic));
        assert_eq!(SpreadKind::from_path("love"), Some(SpreadKind::Love));
        assert_eq!(SpreadKind::from_path("tower"), None);
        assert_eq!(SpreadKind::from_path(""), None);
    }

    #[test]
    fn position_tables_match_layouts() {
        assert_eq!(SpreadKind::Three.positions().len(), 3);
        assert_eq!(SpreadKind::Celtic.positions().len(), 10);
        assert_eq!(SpreadKind::Love.positions().len(), 5);

        assert_eq!(SpreadKind::Three.positions()[0].name, "Passado");
        assert_eq!(SpreadKind::Celtic.positions()[9].name, "Resultado");
        assert_eq!(SpreadKind::Love.positions()[0].name, "Você");
    }

    #[tokio::test]
    async fn composed_spread_binds_cards_to_positions_in_order() {
        let translator = passthrough_translator();
        let spread = compose_spread(SpreadKind::Love, &test_deck(), &translator).await;

        assert_eq!(spread.spread_type, "love");
        assert_eq!(spread.cards.len(), 5);
        for (card, position) in spread.cards.iter().zip(SpreadKind::Love.positions()) {
            assert_eq!(card.position_name, position.name);
            assert_eq!(card.position_meaning, position.meaning);
            assert!(card.card.position.is_some());
            assert!(card.card.interpretation.is_some());
        }
        assert!(!spread.summary.is_empty());
    }

    #[tokio::test]
    async fn composed_spread_draws_distinct_cards() {
        let translator = passthrough_translator();
        let spread = compose_spread(SpreadKind::Celtic, &test_deck(), &translator).await;

        let mut shorts: Vec<&str> = spread
            .cards
            .iter()
            .map(|c| c.card.name_short.as_str())
            .collect();
        shorts.sort_unstable();
        shorts.dedup();
        assert_eq!(shorts.len(), spread.cards.len());
    }

    #[tokio::test]
    async fn small_deck_caps_the_spread() {
        let translator = passthrough_translator();
        let deck = test_deck()[..4].to_vec();
        let spread = compose_spread(SpreadKind::Celtic, &deck, &translator).await;
        assert_eq!(spread.cards.len(), 4);
    }

    #[tokio::test]
    async fn interpretation_assigns_roles_and_summary() {
        let translator = passthrough_translator();
        let reading =
            interpret_question("Devo mudar de emprego?", &test_deck(), &translator).await;

        assert_eq!(reading.question, "Devo mudar de emprego?");
        assert_eq!(reading.cards.len(), 3);
        assert_eq!(reading.cards[0].role, "Fatores que influenciam a situação");
        assert_eq!(reading.cards[1].role, "O caminho a seguir");
        assert_eq!(reading.cards[2].role, "Resultado potencial");

        let upright = reading
            .cards
            .iter()
            .filter(|c| c.card.position == Some(Orientation::Upright))
            .count();
        let expected = match upright {
            2.. => "As cartas indicam um caminho favorável para sua questão. Confie no processo.",
            1 => "Há aspectos positivos e desafiadores em sua questão. Busque equilíbrio.",
            _ => "Momento de introspecção. Reavalie sua abordagem antes de agir.",
        };
        assert_eq!(reading.summary, expected);
    }

    #[tokio::test]
    async fn daily_card_is_deterministic_per_date() {
        let translator = passthrough_translator();
        let deck = test_deck();
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();

        let first = daily_card(date, &deck, &translator).await.unwrap();
        let second = daily_card(date, &deck, &translator).await.unwrap();

        assert_eq!(first.card.name_short, second.card.name_short);
        assert_eq!(first.card.position, second.card.position);
        assert_eq!(first.date, "2026-08-06");
    }

    #[tokio::test]
    async fn daily_card_on_empty_deck_is_none() {
        let translator = passthrough_translator();
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert!(daily_card(date, &[], &translator).await.is_none());
    }

    #[tokio::test]
    async fn summary_reads_energy_from_orientations() {
        let translator = passthrough_translator();
        let original = card("The Fool", "ar00", "major", None);
        let adapted = adapt_card(&original, Some(Orientation::Upright), &translator).await;

        let cards = vec![
            SpreadCard {
                card: adapted.clone(),
                position_name: "Passado",
                position_meaning: "Influências que já passaram",
            },
            SpreadCard {
                card: adapted,
                position_name: "Presente",
                position_meaning: "Situação atual",
            },
        ];
        let originals = vec![original.clone(), original];

        let summary = generate_summary(&cards, &originals, SpreadKind::Three);
        assert!(summary.contains("posição reta"));
        assert!(summary.contains("Arcanos Maiores"));
        assert!(summary.contains("Passado/Presente/Futuro"));
        assert!(summary.contains("Destaque para The Fool"));
    }

    #[tokio::test]
    async fn summary_highlights_repeated_suits() {
        let translator = passthrough_translator();
        let originals = vec![
            card("Two of Cups", "cu02", "minor", Some("cups")),
            card("Queen of Cups", "cuqu", "minor", Some("cups")),
        ];

        let mut cards = Vec::new();
        for original in &originals {
            let adapted = adapt_card(original, Some(Orientation::Reversed), &translator).await;
            cards.push(SpreadCard {
                card: adapted,
                position_name: "Você",
                position_meaning: "Seus sentimentos atuais",
            });
        }

        let summary = generate_summary(&cards, &originals, SpreadKind::Love);
        assert!(summary.contains("Copas"));
        assert!(summary.contains("cartas invertidas"));
        assert!(summary.contains("Arcanos Menores"));
    }

    #[test]
    fn empty_spread_summary_is_the_fallback() {
        assert_eq!(
            generate_summary(&[], &[], SpreadKind::Three),
            "Não foi possível gerar um resumo."
        );
    }
}
