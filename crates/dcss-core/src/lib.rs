//! dcss-core: projectile and rolling-boulder movement for a Crawl-style roguelike
//!
//! This crate contains the sub-tile movement simulation used by orbs of
//! destruction, rolling boulder beetles and a player rolling in boulder form,
//! together with the minimal world context it runs against. It does no I/O
//! beyond loading option files.

pub mod magic;
pub mod math;
pub mod movement;
pub mod world;

mod consts;
mod rng;

pub use consts::*;
pub use math::Coord;
pub use movement::{MoveOutcome, MovementHandler, handler_for};
pub use rng::GameRng;
pub use world::World;
