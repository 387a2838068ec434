pub mod arena;
pub mod physics;
pub mod powerup;
pub mod projectile;
pub mod round;
