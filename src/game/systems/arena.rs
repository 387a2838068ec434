//! Arena layout and round resets
//!
//! Walls are rejection-sampled: each candidate keeps a minimum gap to every
//! placed wall and stays out of both spawn zones. Generation gives up after a
//! bounded number of attempts, so a crowded roll yields fewer walls rather
//! than looping.

use rand::Rng;
use tracing::debug;

use crate::game::constants::{arena, powerup, walls};
use crate::game::state::{GameState, RoundState, Wall};
use crate::util::rect::Rect;

/// Areas around both spawn points that never contain walls
pub fn spawn_zones() -> [Rect; 2] {
    let y = arena::HEIGHT / 2 - walls::SPAWN_ZONE_HEIGHT / 2;
    [
        Rect::new(
            walls::SPAWN_ZONE_INSET,
            y,
            walls::SPAWN_ZONE_WIDTH,
            walls::SPAWN_ZONE_HEIGHT,
        ),
        Rect::new(
            arena::WIDTH - walls::SPAWN_ZONE_INSET - walls::SPAWN_ZONE_WIDTH,
            y,
            walls::SPAWN_ZONE_WIDTH,
            walls::SPAWN_ZONE_HEIGHT,
        ),
    ]
}

/// Roll a fresh wall layout
pub fn generate_walls<R: Rng + ?Sized>(rng: &mut R) -> Vec<Wall> {
    let count = rng.gen_range(walls::MIN_COUNT..=walls::MAX_COUNT);
    let zones = spawn_zones();
    let max_attempts = count * walls::ATTEMPTS_PER_WALL;
    let margin = walls::EDGE_MARGIN;

    let mut placed: Vec<Wall> = Vec::with_capacity(count);
    let mut attempts = 0;
    while placed.len() < count && attempts < max_attempts {
        attempts += 1;

        let w = rng.gen_range(walls::MIN_WIDTH..=walls::MAX_WIDTH);
        let h = rng.gen_range(walls::MIN_HEIGHT..=walls::MAX_HEIGHT);
        let x = rng.gen_range(margin..=arena::WIDTH - margin - w);
        let y = rng.gen_range(margin..=arena::HEIGHT - margin - h);
        let rect = Rect::new(x, y, w, h);

        let padded = rect.inflate(walls::SPACING * 2, walls::SPACING * 2);
        if zones.iter().any(|z| padded.intersects(z)) {
            continue;
        }
        if placed.iter().any(|wall| padded.intersects(&wall.rect)) {
            continue;
        }
        placed.push(Wall::new(rect));
    }

    debug!(
        "Generated {} of {} walls in {} attempts",
        placed.len(),
        count,
        attempts
    );
    placed
}

/// Start a new round: fresh walls, vehicles home, field cleared
///
/// Scores and buff timers carry over. The round re-enters its countdown.
pub fn reset_round(state: &mut GameState) {
    state.walls = generate_walls(&mut state.rng);
    for v in state.vehicles.iter_mut() {
        v.reset_for_round();
    }
    state.bullets.clear();
    state.powerups.clear();
    state.powerup_cooldown = powerup::ROUND_START_DELAY_TICKS;
    state.round = RoundState::default();
}
