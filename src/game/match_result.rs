//! Match result detection
//!
//! A match is a race to the win score across rounds.

use crate::game::constants::round::WIN_SCORE;
use crate::game::state::{GameState, Side};

/// Final match result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub winner: Side,
    pub scores: [u32; 2],
}

impl MatchResult {
    pub fn loser(&self) -> Side {
        self.winner.opponent()
    }

    /// Points between winner and loser
    pub fn margin(&self) -> u32 {
        let [one, two] = self.scores;
        one.abs_diff(two)
    }
}

/// Side that has reached the win score, if any
///
/// Only one side can score per tick, so both reaching it is not expected;
/// the higher score wins and side one breaks an exact tie.
pub fn match_winner(scores: [u32; 2]) -> Option<Side> {
    let [one, two] = scores;
    match (one >= WIN_SCORE, two >= WIN_SCORE) {
        (false, false) => None,
        (true, false) => Some(Side::One),
        (false, true) => Some(Side::Two),
        (true, true) if two > one => Some(Side::Two),
        (true, true) => Some(Side::One),
    }
}

/// Determine the match result from game state, if the match is decided
pub fn determine_result(state: &GameState) -> Option<MatchResult> {
    let scores = state.scores();
    match_winner(scores).map(|winner| MatchResult { winner, scores })
}
