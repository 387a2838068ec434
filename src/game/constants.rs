/// Simulation timing
pub mod sim {
    /// Fixed tick rate in Hz (matches display refresh)
    pub const TICK_RATE: u32 = 60;

    /// Convert a tick count into simulation milliseconds
    #[inline]
    pub const fn ticks_to_ms(ticks: u64) -> u64 {
        ticks * 1000 / TICK_RATE as u64
    }

    /// Convert whole seconds into ticks
    #[inline]
    pub const fn secs_to_ticks(secs: u32) -> u32 {
        secs * TICK_RATE
    }
}

/// Arena bounds
pub mod arena {
    pub const WIDTH: i32 = 900;
    pub const HEIGHT: i32 = 600;
}

/// Vehicle (tank) constants
pub mod vehicle {
    /// Square hull size
    pub const SIZE: i32 = 38;
    /// Base movement speed in units per tick
    pub const SPEED: f32 = 3.0;
    /// Ticks between shots without rapid fire
    pub const FIRE_COOLDOWN_TICKS: u32 = 18;
    /// Horizontal distance of each spawn point from its arena edge
    pub const SPAWN_INSET: i32 = 60;
}

/// Bullet constants
pub mod bullet {
    /// Travel per tick
    pub const SPEED: f32 = 8.0;
    /// Half-size of the square hit box
    pub const RADIUS: i32 = 4;
    /// A bullet older than this is removed
    pub const MAX_ALIVE_TICKS: u32 = super::sim::TICK_RATE * 3;
}

/// Destructible cover generation
pub mod walls {
    pub const MIN_COUNT: usize = 6;
    pub const MAX_COUNT: usize = 10;
    /// Minimum gap between two walls
    pub const SPACING: i32 = 10;
    /// Hits a fresh wall can take
    pub const HP: u8 = 3;
    /// Walls never touch the outer border closer than this
    pub const EDGE_MARGIN: i32 = 40;
    pub const MIN_WIDTH: i32 = 80;
    pub const MAX_WIDTH: i32 = 160;
    pub const MIN_HEIGHT: i32 = 20;
    pub const MAX_HEIGHT: i32 = 120;
    /// Placement attempts per requested wall
    pub const ATTEMPTS_PER_WALL: usize = 60;
    /// Spawn zones kept clear of walls, as (inset, width, height)
    pub const SPAWN_ZONE_INSET: i32 = 20;
    pub const SPAWN_ZONE_WIDTH: i32 = 140;
    pub const SPAWN_ZONE_HEIGHT: i32 = 160;
}

/// Timed buffs granted by power-ups
pub mod buff {
    /// Every pickup sets the buff to expire this long after "now"
    pub const DURATION_MS: u64 = 5000;
    /// Rapid fire cooldown multiplier
    pub const RAPID_COOLDOWN_FACTOR: f32 = 0.55;
    /// Speed buff movement multiplier
    pub const SPEED_FACTOR: f32 = 1.35;
}

/// Power-up spawning
pub mod powerup {
    use super::sim::secs_to_ticks;

    pub const SIZE: i32 = 26;
    /// Ticks an uncollected power-up stays on the field
    pub const LIFETIME_TICKS: u32 = secs_to_ticks(12);
    pub const EDGE_MARGIN: i32 = 40;
    /// Extra clearance around walls when placing
    pub const WALL_CLEARANCE: i32 = 12;
    /// Clearance around each vehicle when placing
    pub const VEHICLE_CLEARANCE: i32 = 80;
    pub const PLACEMENT_ATTEMPTS: usize = 30;
    /// Randomized delay between spawns, in seconds
    pub const SPAWN_DELAY_MIN_SECS: f32 = 5.0;
    pub const SPAWN_DELAY_MAX_SECS: f32 = 10.0;
    /// Delay before the first spawn after process start
    pub const INITIAL_DELAY_TICKS: u32 = secs_to_ticks(4);
    /// Delay before the first spawn of each round
    pub const ROUND_START_DELAY_TICKS: u32 = secs_to_ticks(2);
}

/// Round and match flow
pub mod round {
    use super::sim::secs_to_ticks;

    pub const COUNTDOWN_TICKS: u32 = secs_to_ticks(2);
    pub const ROUND_END_TICKS: u32 = secs_to_ticks(1);
    /// First side to reach this score wins the match
    pub const WIN_SCORE: u32 = 5;
}

/// Networking constants
pub mod net {
    pub const DEFAULT_PORT: u16 = 50555;
    /// Largest datagram the receiver will read
    pub const MAX_DATAGRAM_SIZE: usize = 65535;
    /// Minimum spacing between state broadcasts (20 Hz)
    pub const SNAPSHOT_INTERVAL_MS: u64 = 50;
    /// Host drops remote input older than this
    pub const INPUT_STALE_MS: u64 = 500;
    /// Receiver back-off when the socket has nothing to read
    pub const RECV_IDLE_SLEEP_MS: u64 = 5;
}
