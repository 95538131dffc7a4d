//! Draw History Store - append-only log of accepted draws
//!
//! Game numbers strictly increase. Retention is bounded; the last accepted
//! game number is tracked on its own so eviction never weakens ordering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

use super::card::{Card, ParsedDraw, Rank};
use super::error::{PredictorError, Result};

/// An accepted draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    pub game_number: u64,
    pub cards: Vec<Card>,
    pub recorded_at: DateTime<Utc>,
}

impl DrawRecord {
    /// Whether a Queen is among the draw's cards
    pub fn has_queen(&self) -> bool {
        self.cards.iter().any(|c| c.rank == Rank::Queen)
    }

    /// First two cards as text, used as the trigger label in reports
    pub fn leading_cards(&self) -> String {
        self.cards.iter().take(2).map(|c| c.to_string()).collect()
    }
}

/// Append-only, bounded draw log
#[derive(Debug)]
pub struct DrawHistory {
    records: VecDeque<DrawRecord>,
    limit: usize,
    last_game_number: Option<u64>,
}

impl DrawHistory {
    /// Create a store keeping at most `limit` records (0 means unbounded)
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit,
            last_game_number: None,
        }
    }

    /// Parse and append a raw draw, ignoring completion markers
    #[cfg(test)]
    pub(crate) fn append_raw(&mut self, text: &str) -> Result<&DrawRecord> {
        let parsed = ParsedDraw::parse(text)?;
        self.append(parsed)
    }

    /// Validate ordering and append a parsed draw
    pub fn append(&mut self, draw: ParsedDraw) -> Result<&DrawRecord> {
        if let Some(last) = self.last_game_number {
            if draw.game_number <= last {
                return Err(PredictorError::Validation {
                    game_number: draw.game_number,
                    last,
                });
            }
        }

        self.last_game_number = Some(draw.game_number);
        self.records.push_back(DrawRecord {
            game_number: draw.game_number,
            cards: draw.cards,
            recorded_at: Utc::now(),
        });

        if self.limit > 0 && self.records.len() > self.limit {
            if let Some(evicted) = self.records.pop_front() {
                debug!("Evicted draw #{} from history", evicted.game_number);
            }
        }

        self.records.back().ok_or(PredictorError::NotFound(draw.game_number))
    }

    /// Look up a stored draw
    pub fn get(&self, game_number: u64) -> Result<&DrawRecord> {
        self.records
            .binary_search_by_key(&game_number, |r| r.game_number)
            .map(|idx| &self.records[idx])
            .map_err(|_| PredictorError::NotFound(game_number))
    }

    /// The `n` most recent draws, oldest first
    pub fn last_n(&self, n: usize) -> Vec<&DrawRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawRecord> {
        self.records.iter()
    }

    pub fn last_game_number(&self) -> Option<u64> {
        self.last_game_number
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut history = DrawHistory::new(0);
        history.append_raw("#N10. (J♠️7♥️)").unwrap();
        history.append_raw("#N11. (Q♠️7♥️)").unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.get(11).unwrap().has_queen());
        assert!(!history.get(10).unwrap().has_queen());
        assert_eq!(history.get(12), Err(PredictorError::NotFound(12)));
    }

    #[test]
    fn test_rejects_non_increasing_without_mutation() {
        let mut history = DrawHistory::new(0);
        history.append_raw("#N10. (J♠️7♥️)").unwrap();

        let dup = history.append_raw("#N10. (Q♠️)");
        assert_eq!(dup, Err(PredictorError::Validation { game_number: 10, last: 10 }));
        let older = history.append_raw("#N9. (Q♠️)");
        assert_eq!(older, Err(PredictorError::Validation { game_number: 9, last: 10 }));

        assert_eq!(history.len(), 1);
        assert_eq!(history.last_game_number(), Some(10));
        assert!(!history.get(10).unwrap().has_queen());
    }

    #[test]
    fn test_parse_error_does_not_mutate() {
        let mut history = DrawHistory::new(0);
        assert!(history.append_raw("garbage").is_err());
        assert!(history.is_empty());
        assert_eq!(history.last_game_number(), None);
    }

    #[test]
    fn test_eviction_keeps_ordering() {
        let mut history = DrawHistory::new(2);
        for n in 1..=4 {
            history.append_raw(&format!("#N{}. (5♠️)", n)).unwrap();
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(1), Err(PredictorError::NotFound(1)));
        assert!(history.append_raw("#N2. (5♠️)").is_err());
        assert_eq!(history.last_game_number(), Some(4));
    }

    #[test]
    fn test_last_n() {
        let mut history = DrawHistory::new(0);
        for n in [3, 5, 8] {
            history.append_raw(&format!("#N{}. (5♠️)", n)).unwrap();
        }
        let numbers: Vec<u64> = history.last_n(2).iter().map(|r| r.game_number).collect();
        assert_eq!(numbers, vec![5, 8]);
        assert_eq!(history.last_n(10).len(), 3);
    }
}
