//! Game state definitions and structures
//!
//! Contains all entities (vehicles, bullets, walls, power-ups), the round
//! state and the world container that the simulation driver owns.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::constants::{arena, bullet, buff, powerup, round, sim, vehicle, walls};
use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

/// Which of the two combatants an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    /// Numeric tag used on the wire (1 or 2)
    pub fn tag(self) -> u8 {
        match self {
            Side::One => 1,
            Side::Two => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Side> {
        match tag {
            1 => Some(Side::One),
            2 => Some(Side::Two),
            _ => None,
        }
    }
}

/// Timed modifier kinds; also the kind carried by a power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuffKind {
    /// Absorbs exactly one hit
    Shield,
    /// Shorter fire cooldown
    Rapid,
    /// Faster movement
    Speed,
}

impl BuffKind {
    pub const ALL: [BuffKind; 3] = [BuffKind::Shield, BuffKind::Rapid, BuffKind::Speed];

    #[inline]
    fn slot(self) -> usize {
        match self {
            BuffKind::Shield => 0,
            BuffKind::Rapid => 1,
            BuffKind::Speed => 2,
        }
    }
}

/// Fixed map from buff kind to expiry timestamp (simulation ms)
///
/// A missing entry and an expiry in the past both read as inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buffs {
    expires_at: [Option<u64>; 3],
}

impl Buffs {
    pub fn is_active(&self, kind: BuffKind, now_ms: u64) -> bool {
        matches!(self.expires_at[kind.slot()], Some(until) if until > now_ms)
    }

    /// Start (or restart) a buff for the full duration; durations never stack
    pub fn grant(&mut self, kind: BuffKind, now_ms: u64) {
        self.expires_at[kind.slot()] = Some(now_ms + buff::DURATION_MS);
    }

    /// End a buff immediately (shield absorbing a hit)
    pub fn consume(&mut self, kind: BuffKind) {
        self.expires_at[kind.slot()] = None;
    }

    pub fn remaining_ms(&self, kind: BuffKind, now_ms: u64) -> u64 {
        self.expires_at[kind.slot()]
            .map(|until| until.saturating_sub(now_ms))
            .unwrap_or(0)
    }

    /// Drop entries whose expiry has passed
    pub fn prune(&mut self, now_ms: u64) {
        for slot in self.expires_at.iter_mut() {
            if matches!(slot, Some(until) if *until <= now_ms) {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.expires_at = [None; 3];
    }
}

/// Cardinal bullet heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    /// Snap an arbitrary direction to a cardinal; ties go horizontal and the
    /// zero vector fires to the right
    pub fn from_direction(direction: Vec2) -> Heading {
        if direction.x.abs() >= direction.y.abs() {
            if direction.x >= 0.0 {
                Heading::Right
            } else {
                Heading::Left
            }
        } else if direction.y >= 0.0 {
            Heading::Down
        } else {
            Heading::Up
        }
    }

    /// Unit step as integers (dx, dy)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Heading> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Heading::Up),
            (0, 1) => Some(Heading::Down),
            (-1, 0) => Some(Heading::Left),
            (1, 0) => Some(Heading::Right),
            _ => None,
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }
}

/// Player-controlled tank
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub rect: Rect,
    pub side: Side,
    /// Ticks until the next shot is allowed
    pub cooldown: u32,
    /// Sign of the last non-zero movement, used to aim
    pub last_direction: Vec2,
    pub score: u32,
    /// False once destroyed, until the next round
    pub alive: bool,
    pub buffs: Buffs,
}

impl Vehicle {
    pub fn new(side: Side) -> Self {
        let (x, y) = Self::spawn_point(side);
        Self {
            rect: Rect::new(x, y, vehicle::SIZE, vehicle::SIZE),
            side,
            cooldown: 0,
            last_direction: Vec2::RIGHT,
            score: 0,
            alive: true,
            buffs: Buffs::default(),
        }
    }

    /// Top-left corner of the spawn position for a side
    pub fn spawn_point(side: Side) -> (i32, i32) {
        let y = arena::HEIGHT / 2 - vehicle::SIZE / 2;
        match side {
            Side::One => (vehicle::SPAWN_INSET, y),
            Side::Two => (arena::WIDTH - vehicle::SPAWN_INSET - vehicle::SIZE, y),
        }
    }

    /// Back to the spawn point for a new round; score and buffs carry over
    pub fn reset_for_round(&mut self) {
        let (x, y) = Self::spawn_point(self.side);
        self.rect.x = x;
        self.rect.y = y;
        self.last_direction = Vec2::RIGHT;
        self.cooldown = 0;
        self.alive = true;
    }

    #[inline]
    pub fn can_fire(&self) -> bool {
        self.cooldown == 0
    }

    #[inline]
    pub fn tick_cooldown(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    #[inline]
    pub fn has_buff(&self, kind: BuffKind, now_ms: u64) -> bool {
        self.buffs.is_active(kind, now_ms)
    }

    /// Add one point, saturating at the win threshold
    pub fn award_point(&mut self) {
        self.score = (self.score + 1).min(round::WIN_SCORE);
    }
}

/// Projectile
#[derive(Debug, Clone)]
pub struct Bullet {
    pub position: Vec2,
    pub heading: Heading,
    pub owner: Side,
    pub frames_alive: u32,
    pub active: bool,
}

impl Bullet {
    pub fn new(position: Vec2, heading: Heading, owner: Side) -> Self {
        Self {
            position,
            heading,
            owner,
            frames_alive: 0,
            active: true,
        }
    }

    /// Square hit box centred on the bullet
    pub fn hit_box(&self) -> Rect {
        Rect::new(
            (self.position.x - bullet::RADIUS as f32) as i32,
            (self.position.y - bullet::RADIUS as f32) as i32,
            bullet::RADIUS * 2,
            bullet::RADIUS * 2,
        )
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.position.x < 0.0
            || self.position.x > arena::WIDTH as f32
            || self.position.y < 0.0
            || self.position.y > arena::HEIGHT as f32
    }
}

/// Destructible cover block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wall {
    pub rect: Rect,
    pub hp: u8,
    pub max_hp: u8,
}

impl Wall {
    pub fn new(rect: Rect) -> Self {
        Self::with_hp(rect, walls::HP)
    }

    pub fn with_hp(rect: Rect, hp: u8) -> Self {
        Self {
            rect,
            hp,
            max_hp: hp.max(walls::HP),
        }
    }

    /// Apply one bullet impact; returns true when the wall is destroyed
    pub fn take_hit(&mut self) -> bool {
        self.hp = self.hp.saturating_sub(1);
        self.is_destroyed()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.hp == 0
    }
}

/// Collectible that grants a timed buff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerUp {
    pub rect: Rect,
    pub kind: BuffKind,
    /// Ticks until it disappears
    pub life: u32,
}

impl PowerUp {
    pub fn new(rect: Rect, kind: BuffKind) -> Self {
        Self {
            rect,
            kind,
            life: powerup::LIFETIME_TICKS,
        }
    }

    pub fn tick(&mut self) {
        self.life = self.life.saturating_sub(1);
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.life == 0
    }
}

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Pre-round countdown; nothing moves
    Countdown,
    /// Round in progress
    Active,
    /// A vehicle was destroyed; short frozen hold
    RoundEnding,
    /// Arena regeneration pending (transient, resolved within the tick)
    Reset,
    /// A side reached the win score; waits for an explicit restart
    MatchOver { winner: Side },
}

/// Round state with its two phase timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState {
    pub phase: RoundPhase,
    pub countdown_ticks: u32,
    pub round_end_ticks: u32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            phase: RoundPhase::Countdown,
            countdown_ticks: round::COUNTDOWN_TICKS,
            round_end_ticks: 0,
        }
    }
}

impl RoundState {
    /// Vehicles move, fire and bullets fly only while active
    #[inline]
    pub fn is_simulating(&self) -> bool {
        self.phase == RoundPhase::Active
    }
}

/// Complete world state owned by the simulation driver
#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u64,
    pub vehicles: [Vehicle; 2],
    pub walls: Vec<Wall>,
    pub bullets: Vec<Bullet>,
    pub powerups: Vec<PowerUp>,
    /// Ticks until the next power-up spawn attempt
    pub powerup_cooldown: u32,
    pub round: RoundState,
    pub rng: StdRng,
}

impl GameState {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic world for tests and reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tick: 0,
            vehicles: [Vehicle::new(Side::One), Vehicle::new(Side::Two)],
            walls: Vec::new(),
            bullets: Vec::new(),
            powerups: Vec::new(),
            powerup_cooldown: powerup::INITIAL_DELAY_TICKS,
            round: RoundState::default(),
            rng,
        }
    }

    /// Current simulation time in milliseconds
    #[inline]
    pub fn now_ms(&self) -> u64 {
        sim::ticks_to_ms(self.tick)
    }

    #[inline]
    pub fn vehicle(&self, side: Side) -> &Vehicle {
        &self.vehicles[side.index()]
    }

    #[inline]
    pub fn vehicle_mut(&mut self, side: Side) -> &mut Vehicle {
        &mut self.vehicles[side.index()]
    }

    pub fn scores(&self) -> [u32; 2] {
        [self.vehicles[0].score, self.vehicles[1].score]
    }

    pub fn active_bullets(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.iter().filter(|b| b.active)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
