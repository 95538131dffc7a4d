//! Signal Detector - classifies the figures of a draw
//!
//! Pure function over the Jack/King/Ace multiset of the first card group.
//! Precedence is fixed and the first matching case wins, so overlapping
//! combinations always land on the same signal.

use serde::Serialize;

use super::card::{Card, Rank};

/// Figure pattern found in a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    JackAlone,
    KingJack,
    DoubleJack,
    KingAlone,
    AceKing,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::JackAlone => "JACK_ALONE",
            Signal::KingJack => "KING_JACK",
            Signal::DoubleJack => "DOUBLE_JACK",
            Signal::KingAlone => "KING_ALONE",
            Signal::AceKing => "ACE_KING",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a draw's cards; `None` is the NONE signal
pub fn classify(cards: &[Card]) -> Option<Signal> {
    if !cards.iter().any(|c| c.rank.is_figure()) {
        return None;
    }

    let jacks = cards.iter().filter(|c| c.rank == Rank::Jack).count();
    let king = cards.iter().any(|c| c.rank == Rank::King);
    let ace = cards.iter().any(|c| c.rank == Rank::Ace);
    let jack = jacks > 0;

    if jacks >= 2 {
        Some(Signal::DoubleJack)
    } else if king && jack {
        Some(Signal::KingJack)
    } else if jack && !king && !ace {
        Some(Signal::JackAlone)
    } else if ace && king && !jack {
        Some(Signal::AceKing)
    } else if king && !jack && !ace {
        Some(Signal::KingAlone)
    } else {
        None
    }
}
