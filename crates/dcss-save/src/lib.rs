//! dcss-save: Save/restore for simulation worlds
//!
//! A world is written as JSON with a small header in front. In-flight
//! projectiles keep their sub-tile position, velocity and travelled
//! distance, so a restored world carries on exactly where it stopped
//! (apart from the RNG, which restarts from its seed).

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dcss_core::World;
use dcss_core::world::WorldError;

/// Current save file format version
pub const SAVE_VERSION: u32 = 1;

/// Save/restore errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Save file not found")]
    NotFound,

    #[error("Incompatible save version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("Invalid save file header")]
    InvalidHeader,

    #[error("Corrupt save: {0}")]
    Corrupt(#[from] WorldError),
}

/// Save file header for versioning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: String,
    pub version: u32,
    /// Player name, empty if there is no player on the level
    pub player_name: String,
    pub turns: u64,
    /// Number of projectiles still in flight
    pub projectiles: usize,
    /// Seconds since the epoch
    pub timestamp: u64,
}

impl SaveHeader {
    const MAGIC: &'static str = "DCSM";

    pub fn new(world: &World) -> Self {
        Self {
            magic: Self::MAGIC.to_string(),
            version: SAVE_VERSION,
            player_name: world
                .player_actor()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            turns: world.turn,
            projectiles: world.actors().filter(|a| a.is_projectile()).count(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.magic != Self::MAGIC {
            return Err(SaveError::InvalidHeader);
        }
        if self.version != SAVE_VERSION {
            return Err(SaveError::IncompatibleVersion {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SaveFileRef<'a> {
    header: SaveHeader,
    world: &'a World,
}

/// Complete save file structure
#[derive(Deserialize)]
pub struct SaveFile {
    pub header: SaveHeader,
    pub world: World,
}

#[derive(Deserialize)]
struct HeaderOnly {
    header: SaveHeader,
}

fn write(world: &World, path: &Path, pretty: bool) -> Result<(), SaveError> {
    let save_file = SaveFileRef {
        header: SaveHeader::new(world),
        world,
    };
    let writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(writer, &save_file)?;
    } else {
        serde_json::to_writer(writer, &save_file)?;
    }
    log::info!(
        "saved turn {} ({} projectiles) to {}",
        save_file.header.turns,
        save_file.header.projectiles,
        path.display()
    );
    Ok(())
}

/// Save a world to a file
pub fn save_world(world: &World, path: impl AsRef<Path>) -> Result<(), SaveError> {
    write(world, path.as_ref(), true)
}

/// Save a world to a compact file (no pretty printing)
pub fn save_world_compact(world: &World, path: impl AsRef<Path>) -> Result<(), SaveError> {
    write(world, path.as_ref(), false)
}

/// Load a world from a file
pub fn load_world(path: impl AsRef<Path>) -> Result<World, SaveError> {
    let file = File::open(path).map_err(|_| SaveError::NotFound)?;
    let save_file: SaveFile = serde_json::from_reader(BufReader::new(file))?;
    save_file.header.validate()?;
    save_file.world.validate()?;
    Ok(save_file.world)
}

/// Load only the header from a save file
pub fn load_header(path: impl AsRef<Path>) -> Result<SaveHeader, SaveError> {
    let file = File::open(path).map_err(|_| SaveError::NotFound)?;
    let save_file: HeaderOnly = serde_json::from_reader(BufReader::new(file))?;
    save_file.header.validate()?;
    Ok(save_file.header)
}

pub fn save_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

pub fn delete_save(path: impl AsRef<Path>) -> Result<(), SaveError> {
    std::fs::remove_file(path)?;
    Ok(())
}

/// Default save path for a named world
pub fn default_save_path(name: &str) -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dcss-sim");
    path.push("saves");
    if let Err(e) = std::fs::create_dir_all(&path) {
        log::warn!("cannot create {}: {e}", path.display());
    }
    path.push(format!("{name}.json"));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcss_core::Coord;
    use dcss_core::movement::{MovementHandler, OrbMovement, ProjectileState};
    use dcss_core::world::{Actor, Grid, Species};
    use glam::DVec2;

    fn world_with_orb() -> World {
        let mut world = World::new(Grid::open(20, 20), 99);
        world.add_player(Actor::player("Tester", Coord::new(2, 2))).unwrap();
        let mut orb = Actor::monster(Species::OrbOfDestruction, Coord::new(5, 5));
        orb.projectile = Some(ProjectileState::at(Coord::new(5, 5)).with_velocity(DVec2::new(0.6, 0.8)));
        world.place_actor(orb).unwrap();
        world
    }

    #[test]
    fn test_save_and_load_keeps_projectile_state() {
        let path = std::env::temp_dir().join("dcss_test_save.json");
        let mut world = world_with_orb();
        let orb = world.actors().find(|a| a.is_projectile()).unwrap().id;
        OrbMovement::new(orb).move_step(&mut world);

        save_world(&world, &path).unwrap();
        assert!(save_exists(&path));
        let loaded = load_world(&path).unwrap();

        let before = world.actor(orb).unwrap();
        let after = loaded.actor(orb).unwrap();
        assert_eq!(after.pos, before.pos);
        let (a, b) = (
            after.projectile.as_ref().unwrap(),
            before.projectile.as_ref().unwrap(),
        );
        assert!((a.pos - b.pos).length() < 1e-12);
        assert!((a.vel - b.vel).length() < 1e-12);
        assert_eq!(a.dist, b.dist);
        assert_eq!(loaded.actor_at(after.pos), Some(orb));
        assert_eq!(loaded.rng.seed(), 99);

        delete_save(&path).unwrap();
        assert!(!save_exists(&path));
    }

    #[test]
    fn test_compact_header() {
        let path = std::env::temp_dir().join("dcss_test_save_compact.json");
        save_world_compact(&world_with_orb(), &path).unwrap();
        let header = load_header(&path).unwrap();
        assert_eq!(header.player_name, "Tester");
        assert_eq!(header.projectiles, 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_header_validation() {
        let header = SaveHeader::new(&world_with_orb());
        assert!(header.validate().is_ok());

        let mut bad_header = header.clone();
        bad_header.magic = "XXXX".to_string();
        assert!(matches!(
            bad_header.validate(),
            Err(SaveError::InvalidHeader)
        ));

        let mut old_header = header;
        old_header.version = 999;
        assert!(matches!(
            old_header.validate(),
            Err(SaveError::IncompatibleVersion { .. })
        ));
    }

    fn write_edited(name: &str, edit: impl FnOnce(&mut serde_json::Value)) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut value = serde_json::to_value(SaveFileRef {
            header: SaveHeader::new(&world_with_orb()),
            world: &world_with_orb(),
        })
        .unwrap();
        edit(&mut value);
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_truncated_occupancy_is_corrupt() {
        let path = write_edited("dcss_test_save_occupancy.json", |v| {
            v["world"]["occupancy"] = serde_json::json!([]);
        });
        let result = load_world(&path);
        assert!(matches!(
            result,
            Err(SaveError::Corrupt(WorldError::Occupancy { expected: 400, found: 0 }))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_actor_off_map_is_corrupt() {
        let path = write_edited("dcss_test_save_off_map.json", |v| {
            v["world"]["actors"][0]["pos"] = serde_json::json!({ "x": 50, "y": 2 });
        });
        let result = load_world(&path);
        assert!(matches!(
            result,
            Err(SaveError::Corrupt(WorldError::OffMap { .. }))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load_world("/nonexistent/path/save.json");
        assert!(matches!(result, Err(SaveError::NotFound)));
    }
}
