//! Card tokens and raw draw parsing
//!
//! The source channel announces each draw as a line like
//! `#N744. 5(J♠️K♥️) - 8(Q♦️9♣️) ✅ #T13`. Only the game number and the
//! first parenthesised group matter to the predictor.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ParseError;

static GAME_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#N(\d+)\.?|🔵(\d+)🔵").expect("valid game number regex")
});

static GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]*)\)").expect("valid group regex"));

static CARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(10|[2-9]|[AKQJ])\s*(♠|♥|❤|♦|♣)\x{FE0F}?").expect("valid card regex")
});

/// Markers the source puts on a draw that is still being played
const IN_PROGRESS_MARKERS: &[&str] = &["⏰", "🕐"];

/// Markers the source adds once a draw is final
const COMPLETION_MARKERS: &[&str] = &["✅", "🔰"];

/// Largest game number that still leaves room for every rule's target offset
pub const MAX_GAME_NUMBER: u64 = u64::MAX - 3;

/// Face value of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    King,
    Queen,
    Jack,
    Number(u8),
}

impl Rank {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "A" => Some(Rank::Ace),
            "K" => Some(Rank::King),
            "Q" => Some(Rank::Queen),
            "J" => Some(Rank::Jack),
            n => n.parse::<u8>().ok().filter(|v| (2..=10).contains(v)).map(Rank::Number),
        }
    }

    /// Jack, King and Ace trigger signals; the Queen is what gets predicted
    pub fn is_figure(&self) -> bool {
        matches!(self, Rank::Jack | Rank::King | Rank::Ace)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Ace => write!(f, "A"),
            Rank::King => write!(f, "K"),
            Rank::Queen => write!(f, "Q"),
            Rank::Jack => write!(f, "J"),
            Rank::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Card suit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    fn from_glyph(glyph: &str) -> Option<Self> {
        match glyph {
            "♠" => Some(Suit::Spades),
            "♥" | "❤" => Some(Suit::Hearts),
            "♦" => Some(Suit::Diamonds),
            "♣" => Some(Suit::Clubs),
            _ => None,
        }
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suit::Spades => write!(f, "♠️"),
            Suit::Hearts => write!(f, "♥️"),
            Suit::Diamonds => write!(f, "♦️"),
            Suit::Clubs => write!(f, "♣️"),
        }
    }
}

/// A single card token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Extract every card token from a group's text, in order
pub fn parse_cards(group: &str) -> Vec<Card> {
    CARD_RE
        .captures_iter(group)
        .filter_map(|caps| {
            let rank = Rank::from_token(caps.get(1)?.as_str())?;
            let suit = Suit::from_glyph(caps.get(2)?.as_str())?;
            Some(Card::new(rank, suit))
        })
        .collect()
}

/// A draw announcement after parsing, before it is validated by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDraw {
    pub game_number: u64,
    /// Cards of the first group
    pub cards: Vec<Card>,
    /// True once a completion marker is present and no in-progress marker is
    pub finished: bool,
}

impl ParsedDraw {
    /// Parse a raw announcement
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let caps = GAME_NUMBER_RE
            .captures(text)
            .ok_or(ParseError::MissingGameNumber)?;
        let digits = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .ok_or(ParseError::MissingGameNumber)?;
        let game_number = digits
            .parse::<u64>()
            .ok()
            .filter(|n| *n <= MAX_GAME_NUMBER)
            .ok_or_else(|| ParseError::InvalidGameNumber(digits.to_string()))?;

        let first_group = GROUP_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .ok_or(ParseError::MissingFirstGroup(game_number))?;

        let cards = parse_cards(first_group.as_str());
        if cards.is_empty() {
            return Err(ParseError::EmptyFirstGroup(game_number));
        }

        let finished = !IN_PROGRESS_MARKERS.iter().any(|m| text.contains(m))
            && COMPLETION_MARKERS.iter().any(|m| text.contains(m));

        Ok(Self { game_number, cards, finished })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_announcement() {
        let draw = ParsedDraw::parse("#N744. 5(J♠️K♥️) - 8(Q♦️9♣️) ✅ #T13").unwrap();
        assert_eq!(draw.game_number, 744);
        assert_eq!(
            draw.cards,
            vec![Card::new(Rank::Jack, Suit::Spades), Card::new(Rank::King, Suit::Hearts)]
        );
        assert!(draw.finished);
    }

    #[test]
    fn test_parse_blue_marker_and_ten() {
        let draw = ParsedDraw::parse("🔵12🔵 (10♦️A❤️3♣️)").unwrap();
        assert_eq!(draw.game_number, 12);
        assert_eq!(draw.cards.len(), 3);
        assert_eq!(draw.cards[0].rank, Rank::Number(10));
        assert_eq!(draw.cards[1], Card::new(Rank::Ace, Suit::Hearts));
    }

    #[test]
    fn test_parse_lowercase_and_plain_glyphs() {
        let draw = ParsedDraw::parse("#n5 (j♠ q♥)").unwrap();
        assert_eq!(draw.game_number, 5);
        assert_eq!(draw.cards[0].rank, Rank::Jack);
        assert_eq!(draw.cards[1].rank, Rank::Queen);
    }

    #[test]
    fn test_in_progress_marker() {
        let draw = ParsedDraw::parse("⏰#N20. 3(7♠️8♥️)").unwrap();
        assert!(!draw.finished);

        let draw = ParsedDraw::parse("⏰#N20. 3(7♠️8♥️) ✅").unwrap();
        assert!(!draw.finished);
    }

    #[test]
    fn test_completion_marker_required() {
        assert!(!ParsedDraw::parse("#N20. 3(7♠️8♥️)").unwrap().finished);
        assert!(ParsedDraw::parse("#N20. 3(7♠️8♥️) ✅").unwrap().finished);
        assert!(ParsedDraw::parse("#N20. 3(7♠️8♥️) 🔰").unwrap().finished);
    }

    #[test]
    fn test_game_number_leaves_room_for_targets() {
        let max = format!("#N{}. (J♠️) ✅", MAX_GAME_NUMBER);
        assert_eq!(ParsedDraw::parse(&max).unwrap().game_number, MAX_GAME_NUMBER);

        assert_eq!(
            ParsedDraw::parse("#N18446744073709551615. (5♠️) ✅"),
            Err(ParseError::InvalidGameNumber("18446744073709551615".to_string()))
        );
        assert!(ParsedDraw::parse("#N18446744073709551613. (5♠️) ✅").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ParsedDraw::parse("hello (J♠️)"), Err(ParseError::MissingGameNumber));
        assert_eq!(ParsedDraw::parse("#N33. no cards"), Err(ParseError::MissingFirstGroup(33)));
        assert_eq!(ParsedDraw::parse("#N33. (nothing)"), Err(ParseError::EmptyFirstGroup(33)));
        assert!(matches!(
            ParsedDraw::parse("#N99999999999999999999999. (J♠️)"),
            Err(ParseError::InvalidGameNumber(_))
        ));
    }

    #[test]
    fn test_only_first_group_is_read() {
        let draw = ParsedDraw::parse("#N8. (7♠️8♥️) - (Q♦️J♣️)").unwrap();
        assert!(draw.cards.iter().all(|c| !c.rank.is_figure()));
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::new(Rank::Queen, Suit::Hearts).to_string(), "Q♥️");
        assert_eq!(Card::new(Rank::Number(10), Suit::Clubs).to_string(), "10♣️");
    }
}
