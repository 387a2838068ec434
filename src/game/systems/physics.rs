//! Vehicle movement and wall collision
//!
//! Movement is resolved one axis at a time: apply the horizontal step and
//! push out of any wall, then the vertical step. Resolving both axes at once
//! lets a diagonal move slip through wall corners.

use crate::game::constants::{arena, buff, vehicle};
use crate::game::input::{Action, ControlState};
use crate::game::state::{BuffKind, Vehicle, Wall};
use crate::util::vec2::Vec2;

/// Raw direction from the four movement buttons, each component in -1..=1
pub fn movement_direction(controls: &dyn ControlState) -> Vec2 {
    let axis = |neg: Action, pos: Action| -> f32 {
        let mut v = 0.0;
        if controls.is_held(neg) {
            v -= 1.0;
        }
        if controls.is_held(pos) {
            v += 1.0;
        }
        v
    };
    Vec2::new(
        axis(Action::Left, Action::Right),
        axis(Action::Up, Action::Down),
    )
}

/// Units per tick for this vehicle right now
pub fn movement_speed(vehicle: &Vehicle, now_ms: u64) -> f32 {
    if vehicle.has_buff(BuffKind::Speed, now_ms) {
        vehicle::SPEED * buff::SPEED_FACTOR
    } else {
        vehicle::SPEED
    }
}

/// Move a vehicle for one tick from its controls
///
/// Returns true when any movement button was held.
pub fn move_vehicle(
    vehicle: &mut Vehicle,
    controls: &dyn ControlState,
    walls: &[Wall],
    now_ms: u64,
) -> bool {
    let raw = movement_direction(controls);
    if raw.is_zero() {
        // Still clamp: a snapshot or reset may have left it out of bounds
        vehicle.rect.clamp_within(arena::WIDTH, arena::HEIGHT);
        return false;
    }

    let movement = raw.normalize() * movement_speed(vehicle, now_ms);
    vehicle.last_direction = raw.signum();
    move_and_collide(vehicle, movement, walls);
    true
}

/// Apply a displacement with per-axis wall resolution, then clamp to the arena
pub fn move_and_collide(vehicle: &mut Vehicle, movement: Vec2, walls: &[Wall]) {
    let rect = &mut vehicle.rect;

    rect.x += movement.x as i32;
    for wall in walls {
        if rect.intersects(&wall.rect) {
            if movement.x > 0.0 {
                rect.set_right(wall.rect.left());
            } else if movement.x < 0.0 {
                rect.x = wall.rect.right();
            }
        }
    }

    rect.y += movement.y as i32;
    for wall in walls {
        if rect.intersects(&wall.rect) {
            if movement.y > 0.0 {
                rect.set_bottom(wall.rect.top());
            } else if movement.y < 0.0 {
                rect.y = wall.rect.bottom();
            }
        }
    }

    rect.clamp_within(arena::WIDTH, arena::HEIGHT);
}
