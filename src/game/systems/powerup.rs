//! Power-up spawning, lifetimes and pickups

use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;

use crate::game::constants::{arena, powerup, sim};
use crate::game::state::{BuffKind, GameState, PowerUp, Side, Vehicle, Wall};
use crate::util::rect::Rect;

/// A vehicle collected a power-up this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub side: Side,
    pub kind: BuffKind,
}

/// Ticks until the next spawn, drawn uniformly from the delay window
pub fn roll_spawn_delay<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    let secs = rng.gen_range(powerup::SPAWN_DELAY_MIN_SECS..powerup::SPAWN_DELAY_MAX_SECS);
    (sim::TICK_RATE as f32 * secs) as u32
}

/// Find a free spot for a power-up, giving up after a bounded number of tries
pub fn find_placement<R: Rng + ?Sized>(
    rng: &mut R,
    walls: &[Wall],
    vehicles: &[Vehicle; 2],
) -> Option<Rect> {
    let size = powerup::SIZE;
    let margin = powerup::EDGE_MARGIN;
    let clearance = powerup::VEHICLE_CLEARANCE;

    for _ in 0..powerup::PLACEMENT_ATTEMPTS {
        let x = rng.gen_range(margin..=arena::WIDTH - margin - size);
        let y = rng.gen_range(margin..=arena::HEIGHT - margin - size);
        let rect = Rect::new(x, y, size, size);

        if vehicles
            .iter()
            .any(|v| rect.intersects(&v.rect.inflate(clearance, clearance)))
        {
            continue;
        }
        let wall_gap = powerup::WALL_CLEARANCE;
        if walls
            .iter()
            .any(|w| rect.intersects(&w.rect.inflate(wall_gap, wall_gap)))
        {
            continue;
        }
        return Some(rect);
    }
    None
}

/// Count down the spawn timer and place a power-up when it runs out
///
/// A failed placement leaves the timer at zero so the next tick retries.
pub fn maybe_spawn(state: &mut GameState) -> Option<BuffKind> {
    if state.powerup_cooldown > 0 {
        state.powerup_cooldown -= 1;
        return None;
    }

    let rect = find_placement(&mut state.rng, &state.walls, &state.vehicles)?;
    let kind = *BuffKind::ALL.choose(&mut state.rng)?;
    state.powerups.push(PowerUp::new(rect, kind));
    state.powerup_cooldown = roll_spawn_delay(&mut state.rng);
    Some(kind)
}

/// Age power-ups, hand out pickups and drop expired ones
///
/// Destroyed vehicles cannot collect. Vehicle one is checked first.
pub fn update_powerups(state: &mut GameState) -> SmallVec<[Pickup; 2]> {
    let now_ms = state.now_ms();
    let mut pickups = SmallVec::new();
    let vehicles = &mut state.vehicles;

    state.powerups.retain_mut(|pu| {
        pu.tick();
        for v in vehicles.iter_mut() {
            if v.alive && pu.rect.intersects(&v.rect) {
                v.buffs.grant(pu.kind, now_ms);
                pickups.push(Pickup {
                    side: v.side,
                    kind: pu.kind,
                });
                return false;
            }
        }
        !pu.is_expired()
    });

    pickups
}

/// Forget buffs whose expiry has passed
pub fn prune_buffs(state: &mut GameState) {
    let now_ms = state.now_ms();
    for v in state.vehicles.iter_mut() {
        v.buffs.prune(now_ms);
    }
}
