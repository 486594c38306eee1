//! Scenario setup and frame rendering

use clap::ValueEnum;
use strum::Display;
use thiserror::Error;

use dcss_core::magic::{CastError, IoodCast, cast_iood, cast_iood_burst};
use dcss_core::movement::start_rolling;
use dcss_core::world::{Actor, ActorId, AsciiMap, Form, Grid, MapError, SimOptions, Species};
use dcss_core::{Coord, World};

/// Map used when no `--map` is given
pub const ARENA: &str = "\
########################################
#......................................#
#..@...............X...................#
#......................................#
#...........................B..........#
#......................................#
#.........XX...........................#
#.........XX..............O............#
#......................................#
#.............WWWW.....................#
#.............WWWW.......g.............#
#......................................#
########################################
";

/// What to set in motion before stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Scenario {
    /// The player casts one orb
    Orb,
    /// The player launches a ring of orbs
    Burst,
    /// A boulder beetle rolls at the player
    Boulder,
    /// The player rolls in boulder form
    PlayerBoulder,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad map: {0}")]
    Map(#[from] MapError),

    #[error("bad options: {0}")]
    Options(#[from] dcss_core::world::OptionsError),

    #[error("save error: {0}")]
    Save(#[from] dcss_save::SaveError),

    #[error("cast failed: {0}")]
    Cast(#[from] CastError),

    #[error("scenario needs {0} on the map")]
    MissingActor(&'static str),

    #[error("nothing to aim at")]
    NoTarget,
}

/// Build a world from an ASCII map, placing the actors it marks
pub fn build_world(map: &str, seed: u64, options: SimOptions) -> Result<World, SimError> {
    let AsciiMap { grid, markers } = Grid::from_ascii(map)?;
    let mut world = World::with_options(grid, seed, options);
    for (glyph, pos) in markers {
        let placed = if glyph == '@' {
            world.add_player(Actor::player("You", pos))
        } else if let Some(species) = Species::from_glyph(glyph) {
            world.place_actor(Actor::monster(species, pos))
        } else {
            log::warn!("ignoring unknown actor '{glyph}' at {pos}");
            continue;
        };
        if placed.is_none() {
            log::warn!("could not place '{glyph}' at {pos}");
        }
    }
    Ok(world)
}

/// Closest actor to `from` that could be hit, projectiles excluded
fn nearest_other(world: &World, from: ActorId) -> Option<Coord> {
    let origin = world.actor(from)?.pos;
    world
        .actors()
        .filter(|a| a.id != from && !a.is_projectile())
        .min_by_key(|a| a.pos.distance_sq(origin))
        .map(|a| a.pos)
}

fn find_species(world: &World, species: Species) -> Option<ActorId> {
    world
        .actors()
        .find(|a| a.species() == Some(species))
        .map(|a| a.id)
}

/// Set the scenario in motion. `target` overrides the automatic aim.
pub fn launch(
    world: &mut World,
    scenario: Scenario,
    power: i32,
    target: Option<Coord>,
) -> Result<(), SimError> {
    match scenario {
        Scenario::Orb => {
            let you = world.player().ok_or(SimError::MissingActor("a player"))?;
            let aim = target
                .or_else(|| nearest_other(world, you))
                .ok_or(SimError::NoTarget)?;
            let orb = cast_iood(world, you, &IoodCast::at(power, aim))?;
            log::info!("cast orb {orb:?} at {aim} with power {power}");
        }
        Scenario::Burst => {
            let you = world.player().ok_or(SimError::MissingActor("a player"))?;
            let aim = target
                .or_else(|| nearest_other(world, you))
                .ok_or(SimError::NoTarget)?;
            let orbs = cast_iood_burst(world, power, aim)?;
            log::info!("launched {} orbs with power {power}", orbs.len());
        }
        Scenario::Boulder => {
            let beetle = find_species(world, Species::BoulderBeetle)
                .ok_or(SimError::MissingActor("a boulder beetle"))?;
            let aim = target
                .or_else(|| world.player_actor().map(|p| p.pos))
                .or_else(|| nearest_other(world, beetle))
                .ok_or(SimError::NoTarget)?;
            let outcome = start_rolling(world, beetle, aim)?;
            log::info!("beetle rolling toward {aim}: {outcome:?}");
        }
        Scenario::PlayerBoulder => {
            let you = world.player().ok_or(SimError::MissingActor("a player"))?;
            if let Some(actor) = world.actor_mut(you) {
                actor.set_form(Form::Boulder);
            }
            let aim = target
                .or_else(|| nearest_other(world, you))
                .ok_or(SimError::NoTarget)?;
            let outcome = start_rolling(world, you, aim)?;
            log::info!("rolling toward {aim}: {outcome:?}");
        }
    }
    Ok(())
}

/// Anything still flying or rolling
pub fn in_motion(world: &World) -> bool {
    world.actors().any(|a| a.is_projectile() || a.is_rolling())
}

/// Draw the level: actors over clouds over terrain
pub fn render(world: &World) -> String {
    let (width, height) = (world.grid.width(), world.grid.height());
    let mut out = String::with_capacity((width + 1) * height);
    for y in 0..height {
        for x in 0..width {
            let c = Coord::new(x as i32, y as i32);
            let glyph = if let Some(actor) = world.actor_at(c).and_then(|id| world.actor(id)) {
                actor.glyph()
            } else if let Some(cloud) = world.cloud_at(c) {
                cloud.kind.glyph()
            } else {
                world.grid.feature(c).glyph()
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> World {
        build_world(ARENA, 5, SimOptions::default()).unwrap()
    }

    #[test]
    fn test_arena_renders_as_drawn() {
        let world = arena();
        assert_eq!(render(&world), ARENA);
        assert_eq!(world.actors().count(), 4);
        assert_eq!(world.player_actor().unwrap().pos, Coord::new(3, 2));
    }

    #[test]
    fn test_unknown_markers_are_skipped() {
        let world = build_world("#####\n#@.z#\n#####\n", 1, SimOptions::default()).unwrap();
        assert_eq!(world.actors().count(), 1);
    }

    #[test]
    fn test_bad_map() {
        assert!(matches!(
            build_world("###\n#.\n", 1, SimOptions::default()),
            Err(SimError::Map(MapError::Ragged { .. }))
        ));
    }

    #[test]
    fn test_orb_scenario_launches_orb() {
        let mut world = arena();
        launch(&mut world, Scenario::Orb, 100, None).unwrap();
        assert!(world.actors().any(|a| a.is_projectile()));
        assert!(in_motion(&world));
        assert!(render(&world).contains('*'));
    }

    #[test]
    fn test_boulder_scenario_rolls_beetle() {
        let mut world = arena();
        launch(&mut world, Scenario::Boulder, 0, None).unwrap();
        assert!(world.actors().any(|a| a.is_rolling()));
        assert!(render(&world).contains('0'));
    }

    #[test]
    fn test_player_boulder_scenario() {
        let mut world = arena();
        launch(&mut world, Scenario::PlayerBoulder, 0, Some(Coord::new(3, 8))).unwrap();
        let you = world.player_actor().unwrap();
        assert_eq!(you.form, Form::Boulder);
        assert!(you.is_rolling());
        assert_eq!(you.pos, Coord::new(3, 3));
    }

    #[test]
    fn test_scenario_without_player() {
        let mut world = build_world("#####\n#.B.#\n#####\n", 1, SimOptions::default()).unwrap();
        assert!(matches!(
            launch(&mut world, Scenario::Orb, 50, None),
            Err(SimError::MissingActor(_))
        ));
    }
}
