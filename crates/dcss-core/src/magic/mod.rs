//! Spells that launch propelled actors

mod iood;

use thiserror::Error;

pub use iood::{Aim, IoodCast, cast_iood, cast_iood_burst, fuzz_direction, player_tracer};

/// Why a cast or a roll did not happen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    /// Called off before anything happened
    #[error("cancelled")]
    Aborted,

    /// The spell fizzled
    #[error("the spell fails")]
    Failed,

    #[error("no room for another actor")]
    NoRoom,

    #[error("caster is not on the level")]
    NoCaster,

    #[error("{0} cannot roll")]
    CannotRoll(String),
}
