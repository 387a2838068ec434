//! Wire protocol between host and client
//!
//! One UDP datagram carries one JSON object tagged by `"type"`:
//! `"input"` flows client to host, `"state"` flows host to client. There are
//! no sequence numbers; the receiver keeps whichever arrived last.

use serde::{Deserialize, Serialize};

use crate::game::constants::{net::MAX_DATAGRAM_SIZE, round::WIN_SCORE};
use crate::game::input::HeldControls;
use crate::game::state::{Bullet, BuffKind, GameState, Heading, PowerUp, Side, Wall};
use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

/// Errors raised while encoding or decoding datagrams
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("datagram too large: {0} bytes (max {1})")]
    TooLarge(usize, usize),
}

/// Any message that can appear on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NetMessage {
    Input(InputMessage),
    State(StateMessage),
}

/// Client controller state for one tick (also the heartbeat)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputMessage {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    /// Sender's clock in ms; informational only
    pub time: u64,
}

impl InputMessage {
    pub fn from_controls(held: HeldControls, time: u64) -> Self {
        Self {
            up: held.up,
            down: held.down,
            left: held.left,
            right: held.right,
            fire: held.fire,
            time,
        }
    }
}

/// Tank position and liveness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankSnapshot {
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_alive")]
    pub alive: bool,
}

fn default_alive() -> bool {
    true
}

/// Bullet as `{x, y, dx, dy, c}` where `c` is the owner's side tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletSnapshot {
    pub x: f32,
    pub y: f32,
    pub dx: i32,
    pub dy: i32,
    pub c: u8,
}

impl BulletSnapshot {
    pub fn from_bullet(bullet: &Bullet) -> Self {
        let (dx, dy) = bullet.heading.delta();
        Self {
            x: bullet.position.x,
            y: bullet.position.y,
            dx,
            dy,
            c: bullet.owner.tag(),
        }
    }

    /// Rebuild a display-only bullet; unknown headings or tags are rejected
    pub fn to_bullet(&self) -> Option<Bullet> {
        let heading = Heading::from_delta(self.dx, self.dy)?;
        let owner = Side::from_tag(self.c)?;
        Some(Bullet::new(Vec2::new(self.x, self.y), heading, owner))
    }
}

/// Wall as `[x, y, w, h, hp]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSnapshot(pub i32, pub i32, pub i32, pub i32, pub u8);

impl WallSnapshot {
    pub fn from_wall(wall: &Wall) -> Self {
        let r = wall.rect;
        Self(r.x, r.y, r.w, r.h, wall.hp)
    }

    pub fn to_wall(&self) -> Wall {
        Wall::with_hp(Rect::new(self.0, self.1, self.2, self.3), self.4)
    }
}

/// Power-up as `[x, y, w, h, kind]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpSnapshot(pub i32, pub i32, pub i32, pub i32, pub BuffKind);

impl PowerUpSnapshot {
    pub fn from_powerup(powerup: &PowerUp) -> Self {
        let r = powerup.rect;
        Self(r.x, r.y, r.w, r.h, powerup.kind)
    }

    pub fn to_powerup(&self) -> PowerUp {
        PowerUp::new(Rect::new(self.0, self.1, self.2, self.3), self.4)
    }
}

/// Full world snapshot sent by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateMessage {
    /// Host simulation time in ms
    pub t: u64,
    pub scores: [u32; 2],
    /// Missing tanks leave the client's vehicles where they are
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tanks: Option<[TankSnapshot; 2]>,
    pub bullets: Vec<BulletSnapshot>,
    pub walls: Vec<WallSnapshot>,
    pub powerups: Vec<PowerUpSnapshot>,
}

impl StateMessage {
    pub fn from_game_state(state: &GameState) -> Self {
        let tank = |side: Side| {
            let v = state.vehicle(side);
            TankSnapshot {
                x: v.rect.x,
                y: v.rect.y,
                alive: v.alive,
            }
        };
        Self {
            t: state.now_ms(),
            scores: state.scores(),
            tanks: Some([tank(Side::One), tank(Side::Two)]),
            bullets: state.active_bullets().map(BulletSnapshot::from_bullet).collect(),
            walls: state.walls.iter().map(WallSnapshot::from_wall).collect(),
            powerups: state.powerups.iter().map(PowerUpSnapshot::from_powerup).collect(),
        }
    }

    /// Overwrite the client's world with this snapshot, verbatim
    pub fn apply_to(&self, state: &mut GameState) {
        for side in Side::BOTH {
            let vehicle = state.vehicle_mut(side);
            vehicle.score = self.scores[side.index()].min(WIN_SCORE);
            if let Some(tanks) = &self.tanks {
                let tank = tanks[side.index()];
                vehicle.rect.x = tank.x;
                vehicle.rect.y = tank.y;
                vehicle.alive = tank.alive;
            }
        }
        state.walls = self.walls.iter().map(WallSnapshot::to_wall).collect();
        state.powerups = self.powerups.iter().map(PowerUpSnapshot::to_powerup).collect();
        state.bullets = self.bullets.iter().filter_map(BulletSnapshot::to_bullet).collect();
    }
}

/// Encode a message as a JSON datagram
pub fn encode(message: &NetMessage) -> Result<Vec<u8>, ProtocolError> {
    let bytes = serde_json::to_vec(message).map_err(ProtocolError::Encode)?;
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::TooLarge(bytes.len(), MAX_DATAGRAM_SIZE));
    }
    Ok(bytes)
}

/// Decode a JSON datagram
pub fn decode(data: &[u8]) -> Result<NetMessage, ProtocolError> {
    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}
