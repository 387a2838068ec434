//! Fixed-tick simulation driver
//!
//! Owns the world and, when networked, the synchronizer. Each tick:
//! local/host simulate and (host) broadcast a throttled snapshot; the client
//! sends its controls as a heartbeat and mirrors the latest snapshot.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::game::constants::{net, powerup};
use crate::game::input::{Action, ControlState, FireTrigger, HeldControls, RemoteControls};
use crate::game::match_result::match_winner;
use crate::game::state::{Bullet, BuffKind, GameState, PowerUp, RoundPhase, Side, Vehicle, Wall};
use crate::game::systems::powerup::Pickup;
use crate::game::systems::projectile::{self, HitEvent};
use crate::game::systems::round::{self, RoundEvent};
use crate::game::systems::{arena, physics, powerup as powerups};
use crate::metrics::NetMetrics;
use crate::net::protocol::{InputMessage, StateMessage};
use crate::net::transport::{NetSync, Role};

/// Game loop configuration
#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    /// Fixed RNG seed; entropy when `None`
    pub seed: Option<u64>,
    /// Minimum spacing between host snapshots
    pub snapshot_interval_ms: u64,
    /// Host ignores remote input older than this
    pub input_stale_ms: u64,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            seed: None,
            snapshot_interval_ms: net::SNAPSHOT_INTERVAL_MS,
            input_stale_ms: net::INPUT_STALE_MS,
        }
    }
}

/// How this process takes part in the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Both vehicles driven locally
    Local,
    /// Authoritative; vehicle two follows the remote client
    Host,
    /// Mirrors the host; local controls are forwarded
    Client,
}

/// Events emitted by a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameLoopEvent {
    Fired { side: Side },
    Hit(HitEvent),
    WallDestroyed,
    PowerUpSpawned { kind: BuffKind },
    PowerUpCollected(Pickup),
    Round(RoundEvent),
    SnapshotApplied,
    /// The synchronizer failed; play continues locally
    NetworkLost,
}

/// Read-only view for the renderer
pub struct RenderView<'a> {
    pub walls: &'a [Wall],
    pub bullets: &'a [Bullet],
    pub powerups: &'a [PowerUp],
    pub vehicles: &'a [Vehicle; 2],
    pub scores: [u32; 2],
    pub phase: RoundPhase,
    /// Whole seconds left on the pre-round countdown, 0 outside it
    pub countdown_secs: u32,
    pub now_ms: u64,
    pub paused: bool,
}

impl RenderView<'_> {
    /// Active buffs on a vehicle with their remaining time in ms
    pub fn active_buffs(&self, side: Side) -> SmallVec<[(BuffKind, u64); 3]> {
        let vehicle = &self.vehicles[side.index()];
        BuffKind::ALL
            .into_iter()
            .filter(|kind| vehicle.has_buff(*kind, self.now_ms))
            .map(|kind| (kind, vehicle.buffs.remaining_ms(kind, self.now_ms)))
            .collect()
    }
}

/// Main game loop
pub struct GameLoop {
    state: GameState,
    config: GameLoopConfig,
    mode: LoopMode,
    net: Option<NetSync>,
    remote: RemoteControls,
    triggers: [FireTrigger; 2],
    paused: bool,
    last_broadcast_ms: Option<u64>,
}

impl GameLoop {
    /// Local two-controller game
    pub fn new(config: GameLoopConfig) -> Self {
        let mut state = match config.seed {
            Some(seed) => GameState::with_seed(seed),
            None => GameState::new(),
        };
        arena::reset_round(&mut state);
        state.powerup_cooldown = powerup::INITIAL_DELAY_TICKS;

        Self {
            remote: RemoteControls::new(config.input_stale_ms),
            state,
            config,
            mode: LoopMode::Local,
            net: None,
            triggers: [FireTrigger::default(); 2],
            paused: false,
            last_broadcast_ms: None,
        }
    }

    /// Networked game; the synchronizer's role picks host or client
    pub fn with_network(config: GameLoopConfig, net: NetSync) -> Self {
        let mut game = Self::new(config);
        game.mode = match net.role() {
            Role::Host => LoopMode::Host,
            Role::Client => LoopMode::Client,
        };
        game.net = Some(net);
        game
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn net_metrics(&self) -> Option<Arc<NetMetrics>> {
        self.net.as_ref().map(NetSync::metrics)
    }

    /// Freeze or resume the simulation (ignored on a client)
    pub fn set_paused(&mut self, paused: bool) {
        if self.mode == LoopMode::Client {
            debug!("Pause ignored on client");
            return;
        }
        if self.paused != paused {
            info!("Game {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    /// Zero scores and start over (ignored on a client)
    pub fn restart_match(&mut self) -> Vec<GameLoopEvent> {
        if self.mode == LoopMode::Client {
            debug!("Restart ignored on client");
            return Vec::new();
        }
        let event = round::restart_match(&mut self.state);
        for trigger in self.triggers.iter_mut() {
            trigger.release();
        }
        self.broadcast(true);
        vec![GameLoopEvent::Round(event)]
    }

    pub fn view(&self) -> RenderView<'_> {
        RenderView {
            walls: &self.state.walls,
            bullets: &self.state.bullets,
            powerups: &self.state.powerups,
            vehicles: &self.state.vehicles,
            scores: self.state.scores(),
            phase: self.state.round.phase,
            countdown_secs: round::countdown_seconds(&self.state),
            now_ms: self.state.now_ms(),
            paused: self.paused,
        }
    }

    /// Advance one tick
    ///
    /// `primary` drives vehicle one locally and is forwarded by a client.
    /// `secondary` drives vehicle two in local play only.
    pub fn tick(
        &mut self,
        primary: &dyn ControlState,
        secondary: &dyn ControlState,
    ) -> Vec<GameLoopEvent> {
        let mut events = Vec::new();
        self.check_network(&mut events);

        if self.mode == LoopMode::Client {
            self.client_tick(primary, &mut events);
            return events;
        }
        if self.paused {
            return events;
        }

        let now_ms = self.state.now_ms();
        if self.mode == LoopMode::Host {
            let latest = self.net.as_ref().and_then(NetSync::take_input);
            self.remote.observe(latest, now_ms);
        }

        let second: &dyn ControlState = match self.mode {
            LoopMode::Host => &self.remote,
            _ => secondary,
        };
        let controls = [primary, second];

        if self.state.round.is_simulating() {
            simulate_active(&mut self.state, &mut self.triggers, controls, now_ms, &mut events);
        } else {
            // A press outside the active phase is used up, not queued
            for (trigger, c) in self.triggers.iter_mut().zip(controls) {
                trigger.pressed(c.is_held(Action::Fire));
            }
        }

        if matches!(self.state.round.phase, RoundPhase::Countdown | RoundPhase::Active) {
            if let Some(kind) = powerups::maybe_spawn(&mut self.state) {
                events.push(GameLoopEvent::PowerUpSpawned { kind });
            }
            for pickup in powerups::update_powerups(&mut self.state) {
                events.push(GameLoopEvent::PowerUpCollected(pickup));
            }
        }
        powerups::prune_buffs(&mut self.state);

        let round_events = round::advance_round(&mut self.state);
        let reset = round_events.contains(&RoundEvent::ArenaReset);
        events.extend(round_events.into_iter().map(GameLoopEvent::Round));

        self.state.tick += 1;
        self.broadcast(reset);
        events
    }

    /// Drop a failed synchronizer and continue locally
    fn check_network(&mut self, events: &mut Vec<GameLoopEvent>) {
        if self.net.as_ref().map_or(true, NetSync::is_enabled) {
            return;
        }
        warn!("Network unavailable; switching to local play");
        self.net = None;
        self.mode = LoopMode::Local;
        self.remote.reset();
        events.push(GameLoopEvent::NetworkLost);
    }

    /// Host snapshot, throttled unless `force`
    fn broadcast(&mut self, force: bool) {
        if self.mode != LoopMode::Host {
            return;
        }
        let Some(net) = self.net.as_ref() else {
            return;
        };
        let now_ms = self.state.now_ms();
        let due = self
            .last_broadcast_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.config.snapshot_interval_ms);
        if !force && !due {
            return;
        }

        match net.broadcast_state(&StateMessage::from_game_state(&self.state)) {
            Ok(true) => self.last_broadcast_ms = Some(now_ms),
            Ok(false) => {}
            Err(e) => debug!("Snapshot not sent: {}", e),
        }
    }

    fn client_tick(&mut self, primary: &dyn ControlState, events: &mut Vec<GameLoopEvent>) {
        let Some(net) = self.net.as_ref() else {
            return;
        };
        let now_ms = self.state.now_ms();
        let input = InputMessage::from_controls(HeldControls::sample(primary), now_ms);
        if let Err(e) = net.send_input(input) {
            debug!("Input not sent: {}", e);
        }

        if let Some(snapshot) = net.take_state() {
            snapshot.apply_to(&mut self.state);
            self.state.round.phase = displayed_phase(&self.state);
            self.state.round.countdown_ticks = 0;
            self.state.round.round_end_ticks = 0;
            events.push(GameLoopEvent::SnapshotApplied);
        }
        self.state.tick += 1;
    }
}

/// Phase shown by a client, which only sees scores and liveness
fn displayed_phase(state: &GameState) -> RoundPhase {
    if let Some(winner) = match_winner(state.scores()) {
        return RoundPhase::MatchOver { winner };
    }
    if state.vehicles.iter().any(|v| !v.alive) {
        return RoundPhase::RoundEnding;
    }
    RoundPhase::Active
}

/// Movement, firing, bullets and hits for one active tick
fn simulate_active(
    state: &mut GameState,
    triggers: &mut [FireTrigger; 2],
    controls: [&dyn ControlState; 2],
    now_ms: u64,
    events: &mut Vec<GameLoopEvent>,
) {
    for side in Side::BOTH {
        let idx = side.index();
        let c = controls[idx];
        let fire = triggers[idx].pressed(c.is_held(Action::Fire));

        let vehicle = &mut state.vehicles[idx];
        if !vehicle.alive {
            continue;
        }
        if fire {
            if let Some(bullet) = projectile::fire_bullet(vehicle, now_ms) {
                state.bullets.push(bullet);
                events.push(GameLoopEvent::Fired { side });
            }
        }
        physics::move_vehicle(vehicle, c, &state.walls, now_ms);
        vehicle.tick_cooldown();
    }

    let destroyed = projectile::advance_bullets(&mut state.bullets, &mut state.walls);
    events.extend(std::iter::repeat(GameLoopEvent::WallDestroyed).take(destroyed));

    if let Some(hit) = projectile::resolve_vehicle_hits(&mut state.bullets, &mut state.vehicles, now_ms) {
        events.push(GameLoopEvent::Hit(hit));
    }
    state.bullets.retain(|b| b.active);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::round::{COUNTDOWN_TICKS, ROUND_END_TICKS};
    use crate::game::state::{Heading, RoundState};
    use crate::util::rect::Rect;
    use crate::util::vec2::Vec2;
    use std::thread;
    use std::time::{Duration, Instant};

    const IDLE: HeldControls = HeldControls {
        up: false,
        down: false,
        left: false,
        right: false,
        fire: false,
    };
    const FIRE: HeldControls = HeldControls {
        up: false,
        down: false,
        left: false,
        right: false,
        fire: true,
    };

    /// Seeded local game already past the countdown, on an empty field
    fn active_game() -> GameLoop {
        let mut game = GameLoop::new(GameLoopConfig {
            seed: Some(17),
            ..Default::default()
        });
        let state = game.state_mut();
        state.walls.clear();
        state.powerup_cooldown = u32::MAX;
        state.round = RoundState {
            phase: RoundPhase::Active,
            countdown_ticks: 0,
            round_end_ticks: 0,
        };
        game
    }

    fn has_event(events: &[GameLoopEvent], wanted: &GameLoopEvent) -> bool {
        events.iter().any(|e| e == wanted)
    }

    #[test]
    fn test_countdown_freezes_vehicles() {
        let mut game = GameLoop::new(GameLoopConfig {
            seed: Some(1),
            ..Default::default()
        });
        let start = game.state().vehicle(Side::One).rect;
        let right = HeldControls { right: true, fire: true, ..IDLE };

        for _ in 0..COUNTDOWN_TICKS - 1 {
            game.tick(&right, &IDLE);
        }
        assert_eq!(game.state().vehicle(Side::One).rect, start);
        assert!(game.state().bullets.is_empty());

        let events = game.tick(&right, &IDLE);
        assert!(has_event(&events, &GameLoopEvent::Round(RoundEvent::Started)));

        // Fire was held through the countdown, so no shot on the first active tick
        game.tick(&right, &IDLE);
        assert!(game.state().bullets.is_empty());
        assert!(game.state().vehicle(Side::One).rect.x > start.x);
    }

    #[test]
    fn test_fire_is_edge_triggered() {
        let mut game = active_game();
        let events = game.tick(&FIRE, &IDLE);
        assert!(has_event(&events, &GameLoopEvent::Fired { side: Side::One }));

        // Holding does not refire even after the cooldown
        for _ in 0..30 {
            let events = game.tick(&FIRE, &IDLE);
            assert!(!has_event(&events, &GameLoopEvent::Fired { side: Side::One }));
        }
        game.tick(&IDLE, &IDLE);
        let events = game.tick(&FIRE, &IDLE);
        assert!(has_event(&events, &GameLoopEvent::Fired { side: Side::One }));
    }

    fn fire_until_hit(game: &mut GameLoop) -> HitEvent {
        for i in 0..400 {
            let controls = if i % 2 == 0 { FIRE } else { IDLE };
            for event in game.tick(&controls, &IDLE) {
                if let GameLoopEvent::Hit(hit) = event {
                    return hit;
                }
            }
        }
        panic!("no hit");
    }

    #[test]
    fn test_kill_scores_and_resets_round() {
        let mut game = active_game();
        let hit = fire_until_hit(&mut game);
        assert_eq!(
            hit,
            HitEvent::Destroyed {
                target: Side::Two,
                shooter: Side::One
            }
        );
        assert_eq!(game.state().scores(), [1, 0]);
        assert_eq!(game.view().phase, RoundPhase::RoundEnding);

        // Frozen while the round ends
        let in_flight: Vec<Vec2> = game.state().bullets.iter().map(|b| b.position).collect();
        game.tick(&IDLE, &IDLE);
        let after: Vec<Vec2> = game.state().bullets.iter().map(|b| b.position).collect();
        assert_eq!(in_flight, after);

        let mut reset = false;
        for _ in 1..ROUND_END_TICKS {
            let events = game.tick(&FIRE, &IDLE);
            reset |= has_event(&events, &GameLoopEvent::Round(RoundEvent::ArenaReset));
        }
        assert!(reset);
        assert!(game.state().bullets.is_empty());
        assert_eq!(game.view().phase, RoundPhase::Countdown);
        assert!(game.state().vehicle(Side::Two).alive);
        assert!(!game.state().walls.is_empty());
        assert_eq!(game.state().scores(), [1, 0]);
    }

    #[test]
    fn test_shield_blocks_first_hit() {
        let mut game = active_game();
        let now = game.state().now_ms();
        game.state_mut().vehicle_mut(Side::Two).buffs.grant(BuffKind::Shield, now);

        assert!(matches!(
            fire_until_hit(&mut game),
            HitEvent::Shielded { target: Side::Two, .. }
        ));
        assert_eq!(game.state().scores(), [0, 0]);
        assert!(game.state().vehicle(Side::Two).alive);
        assert_eq!(game.view().phase, RoundPhase::Active);

        assert!(matches!(
            fire_until_hit(&mut game),
            HitEvent::Destroyed { target: Side::Two, .. }
        ));
        assert_eq!(game.state().scores(), [1, 0]);
    }

    #[test]
    fn test_bullet_removes_wall() {
        let mut game = active_game();
        let v = game.state().vehicle(Side::One).rect;
        game.state_mut().walls = vec![Wall::with_hp(Rect::new(v.right() + 20, v.y, 30, v.h), 1)];

        let mut destroyed = false;
        for _ in 0..10 {
            destroyed |= has_event(&game.tick(&FIRE, &IDLE), &GameLoopEvent::WallDestroyed);
        }
        assert!(destroyed);
        assert!(game.state().walls.is_empty());
        assert!(game.state().bullets.is_empty());
    }

    #[test]
    fn test_match_over_freezes_scores() {
        let mut game = active_game();
        let state = game.state_mut();
        state.vehicle_mut(Side::One).score = 4;
        state.vehicle_mut(Side::Two).score = 5;
        state.vehicle_mut(Side::One).alive = false;

        for _ in 0..ROUND_END_TICKS + 1 {
            game.tick(&IDLE, &IDLE);
        }
        assert_eq!(game.view().phase, RoundPhase::MatchOver { winner: Side::Two });

        for i in 0..300 {
            let c = if i % 2 == 0 { FIRE } else { IDLE };
            game.tick(&c, &c);
        }
        assert_eq!(game.state().scores(), [4, 5]);
        assert!(game.state().bullets.is_empty());
        assert_eq!(game.view().phase, RoundPhase::MatchOver { winner: Side::Two });

        let events = game.restart_match();
        assert_eq!(events, vec![GameLoopEvent::Round(RoundEvent::MatchRestarted)]);
        assert_eq!(game.state().scores(), [0, 0]);
        assert_eq!(game.view().phase, RoundPhase::Countdown);
        assert_eq!(game.view().countdown_secs, 2);
    }

    #[test]
    fn test_pause_freezes_tick() {
        let mut game = active_game();
        game.set_paused(true);
        let tick = game.state().tick;
        let right = HeldControls { right: true, ..IDLE };
        assert!(game.tick(&right, &right).is_empty());
        assert_eq!(game.state().tick, tick);
        assert!(game.view().paused);

        game.set_paused(false);
        game.tick(&right, &right);
        assert_eq!(game.state().tick, tick + 1);
    }

    #[test]
    fn test_view_reports_buffs() {
        let mut game = active_game();
        game.state_mut().vehicle_mut(Side::One).buffs.grant(BuffKind::Speed, 0);
        let view = game.view();
        assert_eq!(view.active_buffs(Side::One).as_slice(), &[(BuffKind::Speed, 5000)]);
        assert!(view.active_buffs(Side::Two).is_empty());
    }

    fn host_game() -> GameLoop {
        let net = NetSync::host("127.0.0.1:0".parse().unwrap()).unwrap();
        let mut game = GameLoop::with_network(
            GameLoopConfig {
                seed: Some(4),
                ..Default::default()
            },
            net,
        );
        let state = game.state_mut();
        state.walls.clear();
        state.powerup_cooldown = u32::MAX;
        state.round.phase = RoundPhase::Active;
        game
    }

    #[test]
    fn test_host_drives_vehicle_two_from_remote() {
        let mut game = host_game();
        assert_eq!(game.mode(), LoopMode::Host);
        let start_x = game.state().vehicle(Side::Two).rect.x;

        let now = game.state().now_ms();
        game.remote.observe(
            Some(InputMessage {
                left: true,
                fire: true,
                ..Default::default()
            }),
            now,
        );
        // Local secondary controls are ignored on the host
        let events = game.tick(&IDLE, &HeldControls { right: true, ..IDLE });
        assert!(has_event(&events, &GameLoopEvent::Fired { side: Side::Two }));
        assert_eq!(game.state().vehicle(Side::Two).rect.x, start_x - 3);
    }

    #[test]
    fn test_stale_remote_input_is_ignored() {
        let mut game = host_game();
        let x = game.state().vehicle(Side::Two).rect.x;

        let now = game.state().now_ms();
        game.remote.observe(
            Some(InputMessage {
                left: true,
                fire: true,
                ..Default::default()
            }),
            now,
        );
        // The input arrived, then nothing for well over the staleness window
        game.state_mut().tick += 40;
        let events = game.tick(&IDLE, &IDLE);

        assert!(!has_event(&events, &GameLoopEvent::Fired { side: Side::Two }));
        assert_eq!(game.state().vehicle(Side::Two).rect.x, x);
        assert!(game.state().bullets.is_empty());
    }

    #[test]
    fn test_network_failure_falls_back_to_local() {
        let mut game = host_game();
        if let Some(net) = game.net.as_ref() {
            net.force_disable();
        }
        let events = game.tick(&IDLE, &HeldControls { left: true, ..IDLE });
        assert!(has_event(&events, &GameLoopEvent::NetworkLost));
        assert_eq!(game.mode(), LoopMode::Local);
        assert!(game.net_metrics().is_none());

        // Secondary controls now drive vehicle two
        let x = game.state().vehicle(Side::Two).rect.x;
        game.tick(&IDLE, &HeldControls { left: true, ..IDLE });
        assert_eq!(game.state().vehicle(Side::Two).rect.x, x - 3);
    }

    #[test]
    fn test_client_send_failure_falls_back_to_local() {
        // Port 0 is not a valid destination, so the first heartbeat fails
        let net = NetSync::client("127.0.0.1:0".parse().unwrap()).unwrap();
        let mut game = GameLoop::with_network(GameLoopConfig::default(), net);
        assert_eq!(game.mode(), LoopMode::Client);

        let events = game.tick(&IDLE, &IDLE);
        assert!(!has_event(&events, &GameLoopEvent::NetworkLost));
        assert!(!game.net.as_ref().unwrap().is_enabled());
        assert_eq!(game.net_metrics().unwrap().snapshot().send_failures, 1);

        let events = game.tick(&IDLE, &IDLE);
        assert!(has_event(&events, &GameLoopEvent::NetworkLost));
        assert_eq!(game.mode(), LoopMode::Local);
        assert!(game.net_metrics().is_none());
    }

    #[test]
    fn test_client_mirrors_host_over_loopback() {
        let mut host = host_game();
        host.state_mut().walls = vec![Wall::with_hp(Rect::new(300, 100, 120, 60), 2)];
        host.state_mut().vehicle_mut(Side::One).score = 3;
        let host_addr = host.net.as_ref().unwrap().local_addr().unwrap();

        let client_net = NetSync::client(host_addr).unwrap();
        let mut client = GameLoop::with_network(GameLoopConfig::default(), client_net);
        assert_eq!(client.mode(), LoopMode::Client);

        let deadline = Instant::now() + Duration::from_secs(3);
        let mut mirrored = false;
        while Instant::now() < deadline && !mirrored {
            // The receiver thread may deliver between any two ticks
            mirrored |= has_event(&client.tick(&IDLE, &IDLE), &GameLoopEvent::SnapshotApplied);
            host.tick(&IDLE, &IDLE);
            thread::sleep(Duration::from_millis(5));
            mirrored |= has_event(&client.tick(&IDLE, &IDLE), &GameLoopEvent::SnapshotApplied);
        }
        assert!(mirrored, "client never received a snapshot");

        let view = client.view();
        assert_eq!(view.walls, host.state().walls.as_slice());
        assert_eq!(view.scores, [3, 0]);
        assert_eq!(view.phase, RoundPhase::Active);

        // Clients cannot pause or restart the host's match
        client.set_paused(true);
        assert!(!client.is_paused());
        assert!(client.restart_match().is_empty());
    }

    #[test]
    fn test_displayed_phase() {
        let mut state = GameState::with_seed(1);
        assert_eq!(displayed_phase(&state), RoundPhase::Active);
        state.vehicle_mut(Side::Two).alive = false;
        assert_eq!(displayed_phase(&state), RoundPhase::RoundEnding);
        state.vehicle_mut(Side::One).score = 5;
        assert_eq!(displayed_phase(&state), RoundPhase::MatchOver { winner: Side::One });
    }

    #[test]
    fn test_bullet_heading_follows_movement() {
        let mut game = active_game();
        game.tick(&HeldControls { up: true, ..IDLE }, &IDLE);
        game.tick(&HeldControls { fire: true, ..IDLE }, &IDLE);
        let bullet = &game.state().bullets[0];
        assert_eq!(bullet.heading, Heading::Up);
        assert_eq!(bullet.owner, Side::One);
        assert!(bullet.position.y < game.state().vehicle(Side::One).rect.y as f32);
    }
}
