//! Orb of destruction movement
//!
//! Orbs home in on their foe, leave a magical trail and detonate on the
//! first wall or actor they meet.

use glam::DVec2;

use super::projectile::{Projectile, ProjectileBehaviour};
use super::{HandlerKind, ProjectileState};
use crate::math::{
    Coord, NORMALISE_EPSILON, STICKY_CHORD, VEER_CHORD, VEER_RATE, in_front, normalise,
    stepdown_value,
};
use crate::world::{ActorId, CloudType, Dice, Explosion, KillCategory, KillMethod, World};

#[derive(Debug, Clone)]
pub struct OrbMovement {
    core: Projectile,
}

impl OrbMovement {
    pub fn new(subject: ActorId) -> Self {
        Self {
            core: Projectile::new(subject),
        }
    }

    /// Leave no trail this call; used for the step out of the caster's cell
    pub fn without_trail(mut self) -> Self {
        self.core.no_trail = true;
        self
    }

    /// Detonate at `pos`. The orb is always destroyed.
    fn strike(&mut self, world: &mut World, pos: Coord, big_boom: bool) {
        let id = self.core.subject;
        let state = &self.core.state;
        let dist = state.dist as i32;

        let mut pow = stepdown_value(state.pow, 30, 30, 200, -1);
        if dist < 4 {
            pow = pow * (dist * 2 + 3) / 10;
        }
        let name = if dist < 3 {
            "wavering orb of destruction"
        } else {
            "orb of destruction"
        };
        let hit_verb = if dist < 2 { "weakly hits" } else { "hits" };
        let agent = state.caster.filter(|&c| world.is_alive(c)).or(Some(id));

        let explosion = Explosion {
            pos,
            name: name.to_string(),
            hit_verb: hit_verb.to_string(),
            damage: Dice::new(9, (pow / 4).max(0) as u32),
            radius: 1,
            loudness: world.options.orb_loudness,
            big: big_boom,
            agent,
            source_name: state.caster_name.clone(),
        };
        world.remove_actor(id, KillMethod::Dismissed);
        self.core.mark_stopped();
        world.detonate(explosion);
    }
}

/// Whether the caster of a flawed orb still keeps track of it at `pos`
fn caster_tracks(world: &World, state: &ProjectileState, pos: Coord) -> bool {
    let Some(caster) = state.caster.and_then(|c| world.actor(c)) else {
        return false;
    };
    if caster.is_player() && !world.player_on_level {
        return false;
    }
    caster.pos.distance_sq(pos) <= world.options.los_radius_sq()
}

impl ProjectileBehaviour for OrbMovement {
    fn core(&self) -> &Projectile {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Projectile {
        &mut self.core
    }

    fn family(&self) -> HandlerKind {
        HandlerKind::Orb
    }

    fn aim(&mut self, world: &mut World) {
        let id = self.core.subject;
        let Some(foe) = world
            .actor(id)
            .and_then(|orb| orb.foe)
            .and_then(|foe| world.actor(foe))
        else {
            return;
        };
        if foe.submerged() {
            return;
        }
        let target = foe.pos;

        let state = &mut self.core.state;
        let d = target.as_vec() - state.pos;
        if d.length_squared() < NORMALISE_EPSILON {
            return;
        }
        let d = normalise(d);
        let here = state.cell();
        let dodged = state
            .target_pos
            .is_some_and(|old| old != target && here.grid_distance(old) <= 1);

        if dodged && in_front(state.vel, d, STICKY_CHORD) {
            log::debug!("{id:?} following through a dodge");
            state.vel = d;
        } else if !in_front(state.vel, d, VEER_CHORD) {
            let v = state.vel;
            let turn = if d.y * v.x < d.x * v.y {
                log::debug!("{id:?} veering left");
                DVec2::new(v.y, -v.x)
            } else {
                log::debug!("{id:?} veering right");
                DVec2::new(-v.y, v.x)
            };
            state.vel = normalise(v + turn * VEER_RATE);
        }
        state.target_pos = Some(target);
    }

    fn to_hit_bonus(&self, _world: &World) -> i32 {
        self.core.state.pow / 12
    }

    fn trail_type(&self) -> CloudType {
        CloudType::MagicTrail
    }

    fn check_pos(&mut self, world: &mut World, pos: Coord) -> bool {
        if !world.in_bounds(pos) {
            self.stop(world, true);
            return false;
        }
        if self.core.state.flawed && !caster_tracks(world, &self.core.state, pos) {
            log::debug!("{:?} lost by its caster", self.core.subject);
            self.stop(world, false);
            return false;
        }
        true
    }

    fn on_catchup(&mut self, world: &mut World, moves: i32) -> bool {
        if moves > world.options.catchup_cap || self.core.state.kc == KillCategory::You {
            self.stop(world, false);
            return true;
        }
        false
    }

    fn hit_solid(&mut self, world: &mut World, pos: Coord) -> bool {
        if let Some(orb) = world.actor(self.core.subject) {
            let msg = format!("{} hits {}.", orb.cap_the_name(), world.grid.describe(pos));
            let here = orb.pos;
            if world.player_sees(pos) || world.player_sees(here) {
                world.mpr(msg);
            }
        }
        self.strike(world, pos, false);
        false
    }

    fn strike_actor(&mut self, world: &mut World, pos: Coord, _victim: ActorId) -> bool {
        self.strike(world, pos, false);
        false
    }

    fn hit_own_kind(&mut self, world: &mut World, pos: Coord, victim: ActorId) -> Option<bool> {
        let other = world.actor(victim)?;
        if !other.is_projectile() {
            return None;
        }
        let other_dist = other.projectile.as_ref().map_or(0, |s| s.dist);
        let id = self.core.subject;

        if self.core.state.dist < 2 || other_dist < 2 {
            world.simple_monster_message(victim, " fizzles.");
            world.simple_monster_message(id, " fizzles.");
            world.remove_actor(victim, KillMethod::Dismissed);
            world.remove_actor(id, KillMethod::Dismissed);
            self.core.mark_stopped();
            return Some(false);
        }

        if world.player_sees(pos) {
            world.mpr("The orbs collide in a blinding explosion!");
        } else {
            let loudness = world.options.orb_collision_noise;
            world.noisy(loudness, pos, Some("You hear a loud magical explosion!"));
        }
        world.remove_actor(victim, KillMethod::Dismissed);
        self.strike(world, pos, true);
        Some(false)
    }

    fn stop(&mut self, world: &mut World, msg: bool) {
        let id = self.core.subject;
        if msg {
            world.simple_monster_message(id, " dissipates.");
        }
        log::debug!("{id:?} dissipating");
        world.remove_actor(id, KillMethod::Dismissed);
        self.core.mark_stopped();
    }
}
