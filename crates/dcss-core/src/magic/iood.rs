//! Orb of destruction casting
//!
//! Spawns an orb in the caster's cell, nudges its launch point and heading
//! a little, and takes the first step out of the caster's square.

use core::f64::consts::PI;

use glam::DVec2;

use super::CastError;
use crate::math::{Coord, NORMALISE_EPSILON, normalise, round_to_cell};
use crate::movement::{MovementHandler, OrbMovement, ProjectileState};
use crate::rng::GameRng;
use crate::world::{Actor, ActorId, Attitude, KillCategory, Species, World};

/// Where to send an orb
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aim {
    /// Toward a cell
    Target(Coord),
    /// Along a direction
    Direction(DVec2),
}

/// Parameters of one orb cast
#[derive(Debug, Clone, PartialEq)]
pub struct IoodCast {
    pub power: i32,
    pub aim: Aim,
    /// Homing target; defaults to whoever stands on a targeted cell
    pub foe: Option<ActorId>,
    /// Check the path for allies first (player casts only)
    pub needs_tracer: bool,
    /// The spell fails after the tracer
    pub fail: bool,
}

impl IoodCast {
    pub fn at(power: i32, target: Coord) -> Self {
        Self {
            power,
            aim: Aim::Target(target),
            foe: None,
            needs_tracer: false,
            fail: false,
        }
    }

    pub fn toward(power: i32, dir: DVec2) -> Self {
        Self {
            aim: Aim::Direction(dir),
            ..Self::at(power, Coord::new(0, 0))
        }
    }

    pub fn with_tracer(mut self) -> Self {
        self.needs_tracer = true;
        self
    }
}

/// Offset the launch point by a quarter cell to either side and skew the
/// heading. Weak or inaccurate casters skew more.
pub fn fuzz_direction(state: &mut ProjectileState, power: i32, inaccurate: bool, rng: &mut GameRng) {
    let v = normalise(state.vel);
    let power = power.max(10);
    let off = if rng.coinflip() { -0.25 } else { 0.25 };
    let mut tan = (rng.rn2(31) as f64 - 15.0) * 0.019;
    tan *= 75.0 / power as f64;
    if inaccurate {
        tan *= 2.0;
    }
    // which hand it left
    state.pos += DVec2::new(v.y * off, -v.x * off);
    state.vel = DVec2::new(v.x + v.y * tan, v.y - v.x * tan);
}

/// Walk the path out to sight range. False if the first actor on it is not
/// hostile to the player.
pub fn player_tracer(world: &World, caster: ActorId, dir: DVec2) -> bool {
    let Some(origin) = world.actor(caster).map(|c| c.pos) else {
        return false;
    };
    let step = normalise(dir);
    let mut p = origin.as_vec();
    for _ in 0..world.options.los_radius {
        p += step;
        let cell = round_to_cell(p);
        if cell == origin {
            continue;
        }
        if !world.in_bounds(cell) || world.is_solid(cell) {
            return true;
        }
        if let Some(actor) = world.actor_at(cell).and_then(|id| world.actor(id)) {
            if actor.attitude != Attitude::Hostile {
                log::debug!("tracer: {} is in the way", actor.the_name());
                return false;
            }
            return true;
        }
    }
    true
}

/// Launch an orb of destruction. Returns the new orb, which may already
/// have detonated if something stood right next to the caster.
pub fn cast_iood(world: &mut World, caster: ActorId, cast: &IoodCast) -> Result<ActorId, CastError> {
    let c = world.actor(caster).ok_or(CastError::NoCaster)?;
    let origin = c.pos;
    let is_player = c.is_player();
    let attitude = c.attitude;
    let inaccurate = c.inaccurate();
    let caster_name = c.the_name();

    let dir = match cast.aim {
        Aim::Target(t) => (t - origin).as_vec(),
        Aim::Direction(v) => v,
    };
    if dir.length_squared() < NORMALISE_EPSILON {
        return Err(CastError::Aborted);
    }
    if is_player && cast.needs_tracer && !player_tracer(world, caster, dir) {
        return Err(CastError::Aborted);
    }
    if cast.fail {
        return Err(CastError::Failed);
    }

    let foe = cast.foe.or_else(|| match cast.aim {
        Aim::Target(t) => world.actor_at(t).filter(|&f| f != caster),
        Aim::Direction(_) => None,
    });
    let kc = if is_player {
        KillCategory::You
    } else if attitude == Attitude::Friendly {
        KillCategory::Friendly
    } else {
        KillCategory::Other
    };

    let mut state = ProjectileState::at(origin).with_velocity(dir);
    state.pow = cast.power;
    state.kc = kc;
    state.caster = Some(caster);
    state.caster_name = caster_name;
    state.flawed = is_player;
    fuzz_direction(&mut state, cast.power, inaccurate, &mut world.rng);

    let mut orb = Actor::monster(Species::OrbOfDestruction, origin);
    orb.attitude = if is_player { Attitude::Friendly } else { attitude };
    orb.summoner = Some(caster);
    orb.foe = foe;
    orb.projectile = Some(state);

    let Some(id) = world.spawn_unplaced(orb) else {
        world.mpr("Failed to spawn projectile.");
        return Err(CastError::NoRoom);
    };
    log::debug!("{caster:?} cast an orb {id:?} at power {}", cast.power);

    OrbMovement::new(id).without_trail().move_step(world);
    if let Some(orb) = world.actor_mut(id) {
        orb.lose_move_energy();
    }
    Ok(id)
}

/// The player launches a ring of three to seven orbs at random headings
pub fn cast_iood_burst(world: &mut World, power: i32, target: Coord) -> Result<Vec<ActorId>, CastError> {
    let caster = world.player().ok_or(CastError::NoCaster)?;
    let foe = world.actor_at(target).filter(|&f| f != caster);

    let n = world.rng.range(3, 7);
    let angle0 = world.rng.rn2(2_097_152) as f64 * PI / 1_048_576.0;
    log::debug!("burst of {n} orbs starting at {angle0:.3} rad");

    let mut orbs = Vec::with_capacity(n as usize);
    for i in 0..n {
        let angle = angle0 + i as f64 * 2.0 * PI / n as f64;
        let cast = IoodCast {
            foe,
            ..IoodCast::toward(power, DVec2::new(angle.sin(), angle.cos()))
        };
        match cast_iood(world, caster, &cast) {
            Ok(id) => orbs.push(id),
            Err(CastError::NoRoom) if !orbs.is_empty() => break,
            Err(e) => return Err(e),
        }
    }
    Ok(orbs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzz_keeps_heading_close() {
        let mut rng = GameRng::new(11);
        for _ in 0..50 {
            let mut state = ProjectileState::at(Coord::new(10, 10)).with_velocity(DVec2::new(1.0, 0.0));
            fuzz_direction(&mut state, 100, false, &mut rng);
            // a quarter cell to one side, never along the heading
            assert_eq!(state.pos.x, 10.0);
            assert!((state.pos.y - 10.0).abs() == 0.25);
            // |tan| <= 15 * 0.019 * 0.75
            assert_eq!(state.vel.x, 1.0);
            assert!(state.vel.y.abs() <= 0.22);
        }
    }

    #[test]
    fn test_inaccurate_doubles_skew() {
        let mut a = ProjectileState::at(Coord::new(5, 5)).with_velocity(DVec2::new(0.0, 1.0));
        let mut b = a.clone();
        fuzz_direction(&mut a, 30, false, &mut GameRng::new(4));
        fuzz_direction(&mut b, 30, true, &mut GameRng::new(4));
        assert_eq!(a.pos, b.pos);
        assert!((b.vel.x - 2.0 * a.vel.x).abs() < 1e-12);
    }
}
