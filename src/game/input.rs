//! Control capability shared by local and remote players
//!
//! The simulation never polls devices. Whoever samples the keyboard or
//! gamepad fills a [`HeldControls`] per tick; the host wraps the network
//! input mailbox in [`RemoteControls`]. Both answer the same question:
//! is this action held right now?

use serde::{Deserialize, Serialize};

use crate::net::protocol::InputMessage;

/// A recognised control action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

/// "Is this action held this tick" view of one controller
pub trait ControlState {
    fn is_held(&self, action: Action) -> bool;

    fn any_movement(&self) -> bool {
        [Action::Up, Action::Down, Action::Left, Action::Right]
            .into_iter()
            .any(|a| self.is_held(a))
    }
}

/// Plain sampled button state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldControls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

impl HeldControls {
    /// Copy any control view into owned booleans
    pub fn sample(controls: &dyn ControlState) -> Self {
        Self {
            up: controls.is_held(Action::Up),
            down: controls.is_held(Action::Down),
            left: controls.is_held(Action::Left),
            right: controls.is_held(Action::Right),
            fire: controls.is_held(Action::Fire),
        }
    }
}

impl ControlState for HeldControls {
    fn is_held(&self, action: Action) -> bool {
        match action {
            Action::Up => self.up,
            Action::Down => self.down,
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Fire => self.fire,
        }
    }
}

impl From<&InputMessage> for HeldControls {
    fn from(msg: &InputMessage) -> Self {
        Self {
            up: msg.up,
            down: msg.down,
            left: msg.left,
            right: msg.right,
            fire: msg.fire,
        }
    }
}

/// Host-side view of the peer's controller, fed from the input mailbox
///
/// Reads as "nothing held" until the first input arrives and again once the
/// last input is older than the staleness window.
#[derive(Debug, Clone)]
pub struct RemoteControls {
    held: HeldControls,
    last_seen_ms: Option<u64>,
    stale_after_ms: u64,
}

impl RemoteControls {
    pub fn new(stale_after_ms: u64) -> Self {
        Self {
            held: HeldControls::default(),
            last_seen_ms: None,
            stale_after_ms,
        }
    }

    /// Fold in whatever the mailbox held this tick, then apply the
    /// staleness guard
    pub fn observe(&mut self, latest: Option<InputMessage>, now_ms: u64) {
        if let Some(msg) = latest {
            self.held = HeldControls::from(&msg);
            self.last_seen_ms = Some(now_ms);
        }
        if self.is_stale(now_ms) {
            self.held = HeldControls::default();
        }
    }

    pub fn is_stale(&self, now_ms: u64) -> bool {
        match self.last_seen_ms {
            Some(seen) => now_ms.saturating_sub(seen) > self.stale_after_ms,
            None => true,
        }
    }

    /// Forget everything (used when the network drops)
    pub fn reset(&mut self) {
        self.held = HeldControls::default();
        self.last_seen_ms = None;
    }
}

impl ControlState for RemoteControls {
    fn is_held(&self, action: Action) -> bool {
        self.held.is_held(action)
    }
}

/// Rising-edge detector for the fire button
///
/// A shot is attempted on the tick the button goes down, not while it is
/// held.
#[derive(Debug, Clone, Copy, Default)]
pub struct FireTrigger {
    was_held: bool,
}

impl FireTrigger {
    pub fn pressed(&mut self, held: bool) -> bool {
        let edge = held && !self.was_held;
        self.was_held = held;
        edge
    }

    pub fn release(&mut self) {
        self.was_held = false;
    }
}
