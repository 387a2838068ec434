//! Round and match state machine
//!
//! Countdown -> Active -> RoundEnding -> Reset -> Countdown, until a side
//! reaches the win score and the match parks in MatchOver. Reset never
//! survives a tick: the arena is regenerated as soon as it is entered.

use smallvec::SmallVec;
use tracing::info;

use crate::game::constants::{round, sim};
use crate::game::match_result::match_winner;
use crate::game::state::{GameState, RoundPhase, Side};
use crate::game::systems::arena;

/// Round transitions reported to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// Countdown finished; vehicles are live
    Started,
    /// A vehicle was destroyed
    Ended { destroyed: Side },
    /// Fresh arena generated
    ArenaReset,
    /// Win score reached
    MatchOver { winner: Side },
    /// Scores zeroed by an explicit restart
    MatchRestarted,
}

pub type RoundEvents = SmallVec<[RoundEvent; 2]>;

/// Advance the round state by one tick
///
/// Runs after hits have been resolved, so a vehicle destroyed this tick
/// ends the round on the same tick.
pub fn advance_round(state: &mut GameState) -> RoundEvents {
    let mut events = RoundEvents::new();

    match state.round.phase {
        RoundPhase::Countdown => {
            state.round.countdown_ticks = state.round.countdown_ticks.saturating_sub(1);
            if state.round.countdown_ticks == 0 {
                state.round.phase = RoundPhase::Active;
                events.push(RoundEvent::Started);
            }
        }
        RoundPhase::Active => {
            if let Some(destroyed) = Side::BOTH.into_iter().find(|s| !state.vehicle(*s).alive) {
                state.round.phase = RoundPhase::RoundEnding;
                state.round.round_end_ticks = round::ROUND_END_TICKS;
                events.push(RoundEvent::Ended { destroyed });
            }
        }
        RoundPhase::RoundEnding => {
            state.round.round_end_ticks = state.round.round_end_ticks.saturating_sub(1);
            if state.round.round_end_ticks == 0 {
                match match_winner(state.scores()) {
                    Some(winner) => {
                        let [one, two] = state.scores();
                        info!("Match over: side {} wins {}-{}", winner.tag(), one, two);
                        state.round.phase = RoundPhase::MatchOver { winner };
                        events.push(RoundEvent::MatchOver { winner });
                    }
                    None => state.round.phase = RoundPhase::Reset,
                }
            }
        }
        RoundPhase::Reset | RoundPhase::MatchOver { .. } => {}
    }

    if state.round.phase == RoundPhase::Reset {
        arena::reset_round(state);
        events.push(RoundEvent::ArenaReset);
    }

    events
}

/// Zero both scores and start over from a fresh arena
pub fn restart_match(state: &mut GameState) -> RoundEvent {
    for v in state.vehicles.iter_mut() {
        v.score = 0;
        v.buffs.clear();
    }
    arena::reset_round(state);
    info!("Match restarted");
    RoundEvent::MatchRestarted
}

/// Whole seconds left on the countdown, rounded up (for display)
pub fn countdown_seconds(state: &GameState) -> u32 {
    match state.round.phase {
        RoundPhase::Countdown => state.round.countdown_ticks.div_ceil(sim::TICK_RATE),
        _ => 0,
    }
}
