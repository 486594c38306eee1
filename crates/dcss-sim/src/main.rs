//! dcss-sim: step orbs of destruction and rolling boulders on a text map
//!
//! Loads a map and options, sets a scenario in motion and prints the level
//! after every turn together with the messages that turn produced.

mod logging;
mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use dcss_core::movement::impulse;
use dcss_core::world::SimOptions;
use dcss_core::{Coord, MoveOutcome, World, handler_for};
use dcss_save::{load_world, save_world};

use scenario::{ARENA, Scenario, SimError, build_world, in_motion, launch, render};

/// Orb of destruction and rolling boulder simulator
#[derive(Parser, Debug)]
#[command(name = "dcss-sim")]
#[command(author, version, about = "Watch orbs and boulders fly", long_about = None)]
struct Args {
    /// ASCII map file (built-in arena when absent)
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// JSON options file
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Resume a saved world instead of building one
    #[arg(long, conflicts_with = "map")]
    load: Option<PathBuf>,

    /// RNG seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Turns to simulate
    #[arg(short = 'n', long, default_value_t = 20)]
    steps: u32,

    /// What to set in motion
    #[arg(short, long, value_enum, default_value_t = Scenario::Orb)]
    scenario: Scenario,

    /// Spell power for orb scenarios
    #[arg(short, long, default_value_t = 100)]
    power: i32,

    /// Aim point as x,y (nearest actor when absent)
    #[arg(short, long, value_parser = parse_coord)]
    target: Option<Coord>,

    /// Push applied to a rolling player every turn, as x,y
    #[arg(long, value_parser = parse_push)]
    push: Option<(f64, f64)>,

    /// Replay this many turns of absence before stepping
    #[arg(short, long, default_value_t = 0)]
    catchup: i32,

    /// Save the final world here
    #[arg(long)]
    save: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pair<T: std::str::FromStr>(s: &str) -> Result<(T, T), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<T>()
            .map_err(|_| format!("bad number '{v}'"))
    };
    Ok((parse(x)?, parse(y)?))
}

fn parse_coord(s: &str) -> Result<Coord, String> {
    parse_pair::<i32>(s).map(|(x, y)| Coord::new(x, y))
}

fn parse_push(s: &str) -> Result<(f64, f64), String> {
    parse_pair(s)
}

fn setup(args: &Args) -> Result<World, SimError> {
    if let Some(path) = &args.load {
        let world = load_world(path)?;
        log::info!("resumed turn {} from {}", world.turn, path.display());
        return Ok(world);
    }

    let options = match &args.options {
        Some(path) => SimOptions::load(path)?,
        None => SimOptions::default(),
    };
    let map = match &args.map {
        Some(path) => std::fs::read_to_string(path)?,
        None => ARENA.to_string(),
    };
    let mut world = build_world(&map, args.seed, options)?;
    launch(&mut world, args.scenario, args.power, args.target)?;
    Ok(world)
}

fn catch_up(world: &mut World, turns: i32) {
    for id in world.actor_ids() {
        if !world.is_alive(id) {
            continue;
        }
        let outcome = handler_for(world, id).catchup(world, turns);
        if outcome != MoveOutcome::NotHandled {
            log::info!("{id:?} caught up {turns} turns: {outcome:?}");
        }
    }
}

/// One turn: every actor gets a move, then timed effects tick
fn step_world(world: &mut World, push: Option<(f64, f64)>) {
    if let (Some((x, y)), Some(you)) = (push, world.player()) {
        impulse(world, you, x, y);
    }
    for id in world.actor_ids() {
        if !world.is_alive(id) {
            continue;
        }
        let outcome = handler_for(world, id).move_step(world);
        log::trace!("{id:?}: {outcome:?}");
    }
    world.end_turn();
}

fn print_messages(world: &mut World) {
    for msg in world.messages.drain() {
        println!("  {msg}");
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let mut world = setup(args)?;

    if args.catchup > 0 {
        catch_up(&mut world, args.catchup);
    }

    println!("Turn {}:", world.turn);
    print!("{}", render(&world));
    print_messages(&mut world);

    for _ in 0..args.steps {
        if !in_motion(&world) {
            log::info!("nothing left in motion");
            break;
        }
        step_world(&mut world, args.push);
        println!("Turn {}:", world.turn);
        print!("{}", render(&world));
        print_messages(&mut world);
    }

    if let Some(path) = &args.save {
        save_world(&world, path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("dcss-sim: {e}");
            ExitCode::FAILURE
        }
    }
}
