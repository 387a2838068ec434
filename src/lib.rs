//! Tank Duel
//!
//! Two-tank arena duel: a deterministic fixed-tick simulation plus a UDP
//! host/client synchronizer. Rendering and input devices live outside this
//! crate; they talk to it through [`game::input::ControlState`] and
//! [`game::game_loop::RenderView`].

pub mod config;
pub mod game;
pub mod metrics;
pub mod net;
pub mod util;
