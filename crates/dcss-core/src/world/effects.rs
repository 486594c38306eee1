//! Level effects left behind by moving projectiles
//!
//! Trail clouds, noise and explosions. Clouds persist for a few turns;
//! noises and explosions are recorded as events for the caller to consume.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::actor::ActorId;
use crate::math::Coord;
use crate::rng::GameRng;

/// Cloud types placed by the movement code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum CloudType {
    /// Glittering wake of an orb of destruction
    MagicTrail,
    /// Dust kicked up by a rolling boulder
    DustTrail,
}

impl CloudType {
    pub const fn name(&self) -> &'static str {
        match self {
            CloudType::MagicTrail => "magical condensation",
            CloudType::DustTrail => "dust",
        }
    }

    pub const fn glyph(&self) -> char {
        match self {
            CloudType::MagicTrail => '~',
            CloudType::DustTrail => ':',
        }
    }
}

/// A timed cloud on one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloud {
    pub kind: CloudType,
    pub pos: Coord,
    /// Turns remaining before the cloud dissipates
    pub turns_remaining: u32,
    pub source: Option<ActorId>,
}

impl Cloud {
    pub fn new(kind: CloudType, pos: Coord, duration: u32, source: Option<ActorId>) -> Self {
        Self {
            kind,
            pos,
            turns_remaining: duration,
            source,
        }
    }

    /// Tick the cloud. Returns true if still present.
    pub fn tick(&mut self) -> bool {
        self.turns_remaining = self.turns_remaining.saturating_sub(1);
        self.turns_remaining > 0
    }
}

/// A noise raised at a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noise {
    pub pos: Coord,
    pub loudness: i32,
    /// Heard by the player when out of sight but within earshot
    pub message: Option<String>,
}

/// `num`d`sides`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    pub num: u32,
    pub sides: u32,
}

impl Dice {
    pub const fn new(num: u32, sides: u32) -> Self {
        Self { num, sides }
    }

    pub fn roll(&self, rng: &mut GameRng) -> i32 {
        rng.dice(self.num, self.sides) as i32
    }

    pub const fn max(&self) -> u32 {
        self.num * self.sides
    }
}

impl core::fmt::Display for Dice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}d{}", self.num, self.sides)
    }
}

/// A detonation resolved at a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Coord,
    /// What exploded, e.g. "wavering orb of destruction"
    pub name: String,
    pub hit_verb: String,
    pub damage: Dice,
    pub radius: i32,
    pub loudness: i32,
    /// Drawn as a larger blast; the damage area is unchanged
    pub big: bool,
    /// Who gets credit for the damage
    pub agent: Option<ActorId>,
    pub source_name: String,
}
