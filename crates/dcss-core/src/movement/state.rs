//! Persistent projectile state
//!
//! Everything the stepper needs to carry between turns (and across
//! save/restore) lives in one struct owned by the actor.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::math::{Coord, round_to_cell};
use crate::world::{ActorId, KillCategory};

/// Sub-tile movement state of a propelled actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Sub-tile position; rounds to the occupied cell
    pub pos: DVec2,
    /// Velocity, normally unit length between steps
    pub vel: DVec2,
    /// Steps travelled so far; only ever increases
    pub dist: u32,
    /// Damage budget
    pub pow: i32,
    pub kc: KillCategory,
    pub caster: Option<ActorId>,
    /// Name the detonation is attributed to
    pub caster_name: String,
    /// Cast by someone who cannot keep track of it; dissipates out of sight
    pub flawed: bool,
    /// Where the homing target stood last step
    pub target_pos: Option<Coord>,
    /// Last actor to reflect this projectile
    pub reflector: Option<ActorId>,
}

impl ProjectileState {
    /// State for an actor sitting still at the centre of `cell`
    pub fn at(cell: Coord) -> Self {
        Self {
            pos: cell.as_vec(),
            vel: DVec2::ZERO,
            dist: 0,
            pow: 0,
            kc: KillCategory::Other,
            caster: None,
            caster_name: String::new(),
            flawed: false,
            target_pos: None,
            reflector: None,
        }
    }

    pub fn with_velocity(mut self, vel: DVec2) -> Self {
        self.vel = vel;
        self
    }

    /// The cell the sub-tile position rounds to
    pub fn cell(&self) -> Coord {
        round_to_cell(self.pos)
    }
}
