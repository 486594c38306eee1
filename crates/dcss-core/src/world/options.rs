//! Simulation options
//!
//! Tunable constants for the movement code, loadable from a JSON file.
//! Fields missing from the file keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{CATCHUP_CAP, LOS_RADIUS, MAX_ACTORS};

/// Options loading errors
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid options file: {0}")]
    Json(#[from] serde_json::Error),
}

/// User-configurable simulation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Sight radius used for visibility-gated messages and flawed orbs
    pub los_radius: i32,
    /// Orbs with more catch-up moves than this dissipate outright
    pub catchup_cap: i32,
    /// Trail clouds last `trail_min + rn2(trail_spread)` turns
    pub trail_min: u32,
    pub trail_spread: u32,
    /// Loudness of a boulder smashing into something
    pub boulder_noise: i32,
    /// Loudness of two boulders colliding
    pub collision_noise: i32,
    /// Loudness of two orbs colliding out of sight
    pub orb_collision_noise: i32,
    /// Loudness of an orb detonation
    pub orb_loudness: i32,
    pub max_actors: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            los_radius: LOS_RADIUS,
            catchup_cap: CATCHUP_CAP,
            trail_min: 2,
            trail_spread: 3,
            boulder_noise: 5,
            collision_noise: 20,
            orb_collision_noise: 40,
            orb_loudness: 7,
            max_actors: MAX_ACTORS,
        }
    }
}

impl SimOptions {
    /// Load options from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Squared sight radius; the +1 rounds the circle out
    pub fn los_radius_sq(&self) -> i32 {
        self.los_radius * self.los_radius + 1
    }
}
