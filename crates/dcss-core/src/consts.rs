//! Core constants for the movement simulation
//!
//! Map bounds, sight radius and the energy model the projectile code assumes.

/// Default map dimensions
pub const GXM: usize = 80;
pub const GYM: usize = 70;

/// Default line-of-sight radius
pub const LOS_RADIUS: i32 = 7;

/// Energy spent by one normal action; also the reference speed
pub const BASELINE_DELAY: i32 = 10;

/// Movement speed constants
pub const NORMAL_SPEED: i32 = 10;
pub const ORB_SPEED: i32 = 10;
pub const BOULDER_BEETLE_SPEED: i32 = 10;

/// Off-screen orbs with more catch-up moves than this dissipate
pub const CATCHUP_CAP: i32 = 50;

/// Base to-hit of a projectile against a shield
pub const PROJECTILE_BASE_TO_HIT: i32 = 15;

/// Player boulder velocity limit per axis
pub const MAX_ROLL_SPEED: f64 = 5.0;

/// Maximum number of actors on a level
pub const MAX_ACTORS: usize = 700;

/// Messages kept in the log before the oldest are dropped
pub const MESSAGE_HISTORY: usize = 100;
