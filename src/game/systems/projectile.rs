//! Bullets: firing, flight, wall damage and vehicle hits

use crate::game::constants::{buff, bullet, vehicle};
use crate::game::state::{Bullet, BuffKind, Heading, Side, Vehicle, Wall};
use crate::util::vec2::Vec2;

/// Outcome of a bullet striking a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitEvent {
    /// The target's shield absorbed the hit
    Shielded { target: Side, shooter: Side },
    /// The target was destroyed and the shooter scored
    Destroyed { target: Side, shooter: Side },
}

/// What happened to a bullet during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletStep {
    Flying,
    /// Left the arena or outlived its lifetime
    Expired,
    /// Struck a wall; `destroyed` when that hit removed it
    HitWall { destroyed: bool },
}

/// Cooldown applied after a shot, never below one tick
pub fn shot_cooldown(vehicle: &Vehicle, now_ms: u64) -> u32 {
    let base = vehicle::FIRE_COOLDOWN_TICKS;
    let ticks = if vehicle.has_buff(BuffKind::Rapid, now_ms) {
        (base as f32 * buff::RAPID_COOLDOWN_FACTOR) as u32
    } else {
        base
    };
    ticks.max(1)
}

/// Try to fire; `None` while the cooldown is running
///
/// The bullet starts at the hull edge facing the last movement direction.
pub fn fire_bullet(vehicle: &mut Vehicle, now_ms: u64) -> Option<Bullet> {
    if !vehicle.can_fire() {
        return None;
    }

    let heading = Heading::from_direction(vehicle.last_direction);
    let (dx, dy) = heading.delta();
    let origin = Vec2::new(
        (vehicle.rect.center_x() + dx * (vehicle.rect.w / 2)) as f32,
        (vehicle.rect.center_y() + dy * (vehicle.rect.h / 2)) as f32,
    );

    vehicle.cooldown = shot_cooldown(vehicle, now_ms);
    Some(Bullet::new(origin, heading, vehicle.side))
}

/// Move one bullet a single step and apply wall damage
///
/// A wall whose hp reaches zero is removed from `walls` in the same step.
pub fn advance_bullet(b: &mut Bullet, walls: &mut Vec<Wall>) -> BulletStep {
    if !b.active {
        return BulletStep::Expired;
    }

    b.position += b.heading.to_vec2() * bullet::SPEED;
    b.frames_alive += 1;

    if b.frames_alive > bullet::MAX_ALIVE_TICKS || b.is_out_of_bounds() {
        b.active = false;
        return BulletStep::Expired;
    }

    let hit_box = b.hit_box();
    if let Some(idx) = walls.iter().position(|w| hit_box.intersects(&w.rect)) {
        b.active = false;
        let destroyed = walls[idx].take_hit();
        if destroyed {
            walls.remove(idx);
        }
        return BulletStep::HitWall { destroyed };
    }

    BulletStep::Flying
}

/// Step every bullet and drop the ones that stopped; returns walls destroyed
pub fn advance_bullets(bullets: &mut Vec<Bullet>, walls: &mut Vec<Wall>) -> usize {
    let mut destroyed = 0;
    for b in bullets.iter_mut() {
        if let BulletStep::HitWall { destroyed: true } = advance_bullet(b, walls) {
            destroyed += 1;
        }
    }
    bullets.retain(|b| b.active);
    destroyed
}

/// Check bullets against the opposing vehicles
///
/// At most one hit is resolved per call so a single tick can never score
/// twice. Vehicle one is tested before vehicle two for each bullet.
pub fn resolve_vehicle_hits(
    bullets: &mut [Bullet],
    vehicles: &mut [Vehicle; 2],
    now_ms: u64,
) -> Option<HitEvent> {
    for b in bullets.iter_mut().filter(|b| b.active) {
        let hit_box = b.hit_box();
        for target in Side::BOTH {
            if b.owner == target {
                continue;
            }
            let victim = &vehicles[target.index()];
            if !victim.alive || !hit_box.intersects(&victim.rect) {
                continue;
            }

            b.active = false;
            let shooter = b.owner;
            let victim = &mut vehicles[target.index()];
            if victim.has_buff(BuffKind::Shield, now_ms) {
                victim.buffs.consume(BuffKind::Shield);
                return Some(HitEvent::Shielded { target, shooter });
            }

            victim.alive = false;
            vehicles[shooter.index()].award_point();
            return Some(HitEvent::Destroyed { target, shooter });
        }
    }
    None
}
