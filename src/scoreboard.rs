//! Session scoreboard
//!
//! Tallies round results for one play session. Nothing is persisted.

use serde::{Deserialize, Serialize};

use crate::sim::state::{PlayerId, RoundOutcome};

/// A single finished round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number (1-based)
    pub round: u32,
    pub outcome: RoundOutcome,
    /// Simulated seconds the round lasted
    pub duration: f32,
}

/// Wins per player plus draws, with the round history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    wins: [u32; 2],
    draws: u32,
    pub rounds: Vec<RoundRecord>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished round
    pub fn record(&mut self, round: u32, outcome: RoundOutcome, duration: f32) {
        match outcome {
            RoundOutcome::Winner(id) => self.wins[id.index()] += 1,
            RoundOutcome::Draw => self.draws += 1,
        }
        self.rounds.push(RoundRecord {
            round,
            outcome,
            duration,
        });
        log::info!(
            "Score after round {}: player1 {} - player2 {} ({} draws)",
            round,
            self.wins[0],
            self.wins[1],
            self.draws
        );
    }

    pub fn wins(&self, id: PlayerId) -> u32 {
        self.wins[id.index()]
    }

    pub fn draws(&self) -> u32 {
        self.draws
    }

    pub fn rounds_played(&self) -> usize {
        self.rounds.len()
    }

    /// Player with strictly more wins, if any
    pub fn leader(&self) -> Option<PlayerId> {
        match self.wins[0].cmp(&self.wins[1]) {
            std::cmp::Ordering::Greater => Some(PlayerId::One),
            std::cmp::Ordering::Less => Some(PlayerId::Two),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Get the shortest decisive round (if any)
    pub fn fastest_win(&self) -> Option<&RoundRecord> {
        self.rounds
            .iter()
            .filter(|r| matches!(r.outcome, RoundOutcome::Winner(_)))
            .min_by(|a, b| a.duration.total_cmp(&b.duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let board = Scoreboard::new();
        assert_eq!(board.rounds_played(), 0);
        assert_eq!(board.leader(), None);
        assert!(board.fastest_win().is_none());
    }

    #[test]
    fn test_tally() {
        let mut board = Scoreboard::new();
        board.record(1, RoundOutcome::Winner(PlayerId::Two), 42.0);
        board.record(2, RoundOutcome::Draw, 10.0);
        board.record(3, RoundOutcome::Winner(PlayerId::Two), 17.5);
        board.record(4, RoundOutcome::Winner(PlayerId::One), 30.0);

        assert_eq!(board.wins(PlayerId::One), 1);
        assert_eq!(board.wins(PlayerId::Two), 2);
        assert_eq!(board.draws(), 1);
        assert_eq!(board.rounds_played(), 4);
        assert_eq!(board.leader(), Some(PlayerId::Two));
        assert_eq!(board.fastest_win().map(|r| r.round), Some(3));
    }

    #[test]
    fn test_serializes() {
        let mut board = Scoreboard::new();
        board.record(1, RoundOutcome::Winner(PlayerId::One), 5.0);
        let json = serde_json::to_string(&board).unwrap();
        let parsed: Scoreboard = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.wins(PlayerId::One), 1);
        assert_eq!(parsed.rounds[0].outcome, RoundOutcome::Winner(PlayerId::One));
    }
}
