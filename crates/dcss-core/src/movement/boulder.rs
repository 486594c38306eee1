//! Rolling boulders
//!
//! A boulder beetle curled up and rolling, or the player rolling in boulder
//! form. Boulders smash into whatever they meet, halt at water or a missing
//! floor and leave a dust trail.

use glam::DVec2;

use super::projectile::{Projectile, ProjectileBehaviour};
use super::{HandlerKind, MoveOutcome, MovementHandler, ProjectileState};
use crate::consts::MAX_ROLL_SPEED;
use crate::magic::CastError;
use crate::math::{Coord, normalise};
use crate::world::{ActorId, Attitude, CloudType, Enchantment, KillCategory, KillMethod, World};

#[derive(Debug, Clone)]
pub struct MonsterBoulderMovement {
    core: Projectile,
}

impl MonsterBoulderMovement {
    pub fn new(subject: ActorId) -> Self {
        Self {
            core: Projectile::new(subject),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerBoulderMovement {
    core: Projectile,
}

impl PlayerBoulderMovement {
    pub fn new(subject: ActorId) -> Self {
        Self {
            core: Projectile::new(subject),
        }
    }

    /// Add an impulse to the velocity, clamping each axis
    pub fn impulse(&mut self, world: &mut World, ix: f64, iy: f64) {
        self.core.setup(world);
        let limit = DVec2::splat(MAX_ROLL_SPEED);
        let vel = (self.core.state.vel + DVec2::new(ix, iy)).clamp(-limit, limit);
        if vel == DVec2::ZERO {
            self.stop(world, true);
            return;
        }
        self.core.state.vel = vel;
        self.core.save(world);
    }
}

/// Halt a rolling actor in place
fn halt_rolling(world: &mut World, id: ActorId, msg: bool) {
    let Some(actor) = world.actor_mut(id) else {
        return;
    };
    actor.del_ench(Enchantment::Rolling);
    actor.lose_move_energy();
    if let Some(state) = actor.projectile.as_mut() {
        state.pos = actor.pos.as_vec();
    }
    if !msg {
        return;
    }
    let msg = if actor.is_player() {
        "You stop rolling.".to_string()
    } else {
        format!("{} stops rolling.", actor.cap_the_name())
    };
    let pos = actor.pos;
    world.mpr_if_seen(pos, msg);
}

/// Water or a missing floor ahead brings a boulder to a halt
fn check_floor<B: ProjectileBehaviour>(b: &mut B, world: &mut World, pos: Coord) -> bool {
    if !world.in_bounds(pos) {
        b.stop(world, true);
        return false;
    }
    // walls are dealt with by `hit_solid`
    if world.is_solid(pos) || (world.has_floor(pos) && !world.is_water(pos)) {
        return true;
    }
    let id = b.core().subject;
    if !b.core().catching_up {
        if let Some(actor) = world.actor(id) {
            let msg = format!("{} {} to a halt.", actor.cap_the_name(), actor.conj("screech", "screeches"));
            let here = actor.pos;
            world.mpr_if_seen(here, msg);
        }
    }
    b.stop(world, false);
    false
}

fn hit_solid<B: ProjectileBehaviour>(b: &mut B, world: &mut World, pos: Coord) -> bool {
    let id = b.core().subject;
    if let Some(actor) = world.actor(id) {
        let msg = format!(
            "{} {} {}.",
            actor.cap_the_name(),
            actor.conj("hit", "hits"),
            world.grid.describe(pos)
        );
        world.mpr_if_seen(pos, msg);
    }
    b.stop(world, true);
    false
}

/// Smash into an actor. Carries on into the cell only if the victim died.
fn smash<B: ProjectileBehaviour>(b: &mut B, world: &mut World, pos: Coord, victim: ActorId) -> bool {
    let id = b.core().subject;
    let (Some(me), Some(them)) = (world.actor(id), world.actor(victim)) else {
        return false;
    };
    let msg = format!(
        "{} {} into {}!",
        me.cap_the_name(),
        me.conj("smash", "smashes"),
        them.the_name()
    );
    let target = them.clone();
    world.mpr_if_seen(pos, msg);

    let raw = world.rng.dice(3, 20) as i32;
    let damage = target.apply_ac(raw, &mut world.rng);
    log::debug!("{id:?} smashes {victim:?} for {damage} ({raw} before armour)");
    let loudness = world.options.boulder_noise;
    world.noisy(loudness, pos, None);
    if world.hurt(victim, damage, KillMethod::Rolling) {
        return true;
    }
    b.stop(world, true);
    false
}

/// Two rolling boulders meet. Both stop and both are dazed.
fn collide<B: ProjectileBehaviour>(
    b: &mut B,
    world: &mut World,
    pos: Coord,
    victim: ActorId,
) -> Option<bool> {
    let other = world.actor(victim)?;
    if !other.is_rolling() {
        return None;
    }
    let id = b.core().subject;
    let me = world.actor(id)?;
    let msg = format!(
        "{} violently {} with {}!",
        me.cap_the_name(),
        me.conj("collide", "collides"),
        other.the_name()
    );

    let loudness = world.options.collision_noise;
    if world.player_sees(pos) {
        world.mpr(msg);
        world.noisy(loudness, pos, None);
    } else {
        world.noisy(loudness, pos, Some("You hear a loud crashing sound!"));
    }

    b.stop(world, true);
    halt_rolling(world, victim, true);
    for who in [id, victim] {
        let duration = 5 + world.rng.rn2(3) as i32;
        if world.confuse(who, duration) {
            world.simple_monster_message(who, " looks dazed.");
        }
    }
    Some(false)
}

impl ProjectileBehaviour for MonsterBoulderMovement {
    fn core(&self) -> &Projectile {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Projectile {
        &mut self.core
    }

    fn family(&self) -> HandlerKind {
        HandlerKind::MonsterBoulder
    }

    fn to_hit_bonus(&self, world: &World) -> i32 {
        world.actor(self.core.subject).map_or(0, |a| a.hit_dice / 2)
    }

    fn trail_type(&self) -> CloudType {
        CloudType::DustTrail
    }

    fn check_pos(&mut self, world: &mut World, pos: Coord) -> bool {
        check_floor(self, world, pos)
    }

    fn hit_solid(&mut self, world: &mut World, pos: Coord) -> bool {
        hit_solid(self, world, pos)
    }

    fn strike_actor(&mut self, world: &mut World, pos: Coord, victim: ActorId) -> bool {
        smash(self, world, pos, victim)
    }

    fn hit_own_kind(&mut self, world: &mut World, pos: Coord, victim: ActorId) -> Option<bool> {
        collide(self, world, pos, victim)
    }

    fn stop(&mut self, world: &mut World, msg: bool) {
        halt_rolling(world, self.core.subject, msg);
        self.core.mark_stopped();
    }
}

impl ProjectileBehaviour for PlayerBoulderMovement {
    fn core(&self) -> &Projectile {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Projectile {
        &mut self.core
    }

    fn family(&self) -> HandlerKind {
        HandlerKind::PlayerBoulder
    }

    /// Speed is kept; fast rolls are split into sub-steps instead
    fn normalise(&self, v: DVec2) -> DVec2 {
        v
    }

    fn to_hit_bonus(&self, world: &World) -> i32 {
        world.actor(self.core.subject).map_or(0, |a| a.hit_dice / 2)
    }

    fn trail_type(&self) -> CloudType {
        CloudType::DustTrail
    }

    fn check_pos(&mut self, world: &mut World, pos: Coord) -> bool {
        check_floor(self, world, pos)
    }

    fn hit_solid(&mut self, world: &mut World, pos: Coord) -> bool {
        hit_solid(self, world, pos)
    }

    fn strike_actor(&mut self, world: &mut World, pos: Coord, victim: ActorId) -> bool {
        smash(self, world, pos, victim)
    }

    fn hit_own_kind(&mut self, world: &mut World, pos: Coord, victim: ActorId) -> Option<bool> {
        collide(self, world, pos, victim)
    }

    fn stop(&mut self, world: &mut World, msg: bool) {
        halt_rolling(world, self.core.subject, msg);
        self.core.mark_stopped();
    }
}

/// Start an actor rolling toward `aim` and take the first step.
///
/// Monsters set off at unit speed. The player gets a small random push and
/// spends a move doing it.
pub fn start_rolling(world: &mut World, id: ActorId, aim: Coord) -> Result<MoveOutcome, CastError> {
    let actor = world.actor(id).ok_or(CastError::NoCaster)?;
    if !actor.is_boulder() || actor.is_rolling() {
        return Err(CastError::CannotRoll(actor.the_name()));
    }
    let dir = normalise((aim - actor.pos).as_vec());
    if dir == DVec2::ZERO {
        return Err(CastError::Aborted);
    }

    let is_player = actor.is_player();
    let kc = match (is_player, actor.attitude) {
        (true, _) => KillCategory::You,
        (false, Attitude::Friendly) => KillCategory::Friendly,
        _ => KillCategory::Other,
    };
    let mut state = ProjectileState::at(actor.pos);
    state.kc = kc;
    state.caster = Some(id);
    state.caster_name = actor.the_name();
    state.pow = actor.hit_dice;
    let speed = if is_player {
        0.6 + world.rng.real() * 0.4
    } else {
        1.0
    };
    state.vel = dir * speed;

    let Some(actor) = world.actor_mut(id) else {
        return Err(CastError::NoCaster);
    };
    actor.add_ench(Enchantment::Rolling, 0);
    actor.projectile = Some(state);
    if is_player {
        actor.lose_move_energy();
        world.mpr("You start rolling.");
    } else {
        world.simple_monster_message(id, " curls into a ball and starts rolling!");
    }
    log::debug!("{id:?} rolling toward {aim}");

    let outcome = if is_player {
        PlayerBoulderMovement::new(id).move_step(world)
    } else {
        MonsterBoulderMovement::new(id).move_step(world)
    };
    Ok(outcome)
}

/// Push a rolling player. Returns false if `id` is not a rolling player.
pub fn impulse(world: &mut World, id: ActorId, ix: f64, iy: f64) -> bool {
    let rolling = world
        .actor(id)
        .is_some_and(|a| a.is_player() && a.is_rolling());
    if !rolling {
        return false;
    }
    PlayerBoulderMovement::new(id).impulse(world, ix, iy);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Actor, Form, Grid, Species};

    fn rolling_player(world: &mut World, pos: Coord, vel: DVec2) -> ActorId {
        let mut you = Actor::player("You", pos);
        you.set_form(Form::Boulder);
        you.add_ench(Enchantment::Rolling, 0);
        you.projectile = Some(ProjectileState::at(pos).with_velocity(vel));
        world.add_player(you).unwrap()
    }

    #[test]
    fn test_impulse_clamps_each_axis() {
        let mut world = World::new(Grid::open(20, 20), 9);
        let you = rolling_player(&mut world, Coord::new(5, 5), DVec2::new(4.0, 0.0));
        assert!(impulse(&mut world, you, 3.0, -7.0));
        let vel = world.actor(you).unwrap().projectile.as_ref().unwrap().vel;
        assert_eq!(vel, DVec2::new(MAX_ROLL_SPEED, -MAX_ROLL_SPEED));
    }

    #[test]
    fn test_impulse_to_rest_stops() {
        let mut world = World::new(Grid::open(20, 20), 9);
        let you = rolling_player(&mut world, Coord::new(5, 5), DVec2::new(1.0, 0.0));
        assert!(impulse(&mut world, you, -1.0, 0.0));
        assert!(!world.actor(you).unwrap().is_rolling());
        assert_eq!(world.messages.last(), Some("You stop rolling."));
    }

    #[test]
    fn test_impulse_needs_rolling_player() {
        let mut world = World::new(Grid::open(20, 20), 9);
        let beetle = world
            .place_actor(Actor::monster(Species::BoulderBeetle, Coord::new(3, 3)))
            .unwrap();
        assert!(!impulse(&mut world, beetle, 1.0, 0.0));
    }

    #[test]
    fn test_player_boulder_keeps_speed() {
        let mut world = World::new(Grid::open(20, 20), 9);
        let you = rolling_player(&mut world, Coord::new(5, 5), DVec2::new(2.0, 0.0));
        let outcome = PlayerBoulderMovement::new(you).move_step(&mut world);
        assert_eq!(outcome, MoveOutcome::Moving);
        let actor = world.actor(you).unwrap();
        assert_eq!(actor.pos, Coord::new(7, 5));
        let state = actor.projectile.as_ref().unwrap();
        assert_eq!(state.vel, DVec2::new(2.0, 0.0));
        assert_eq!(state.dist, 2);
    }

    #[test]
    fn test_start_rolling_rejects_non_boulder() {
        let mut world = World::new(Grid::open(20, 20), 9);
        let orc = world
            .place_actor(Actor::monster(Species::Orc, Coord::new(3, 3)))
            .unwrap();
        assert_eq!(
            start_rolling(&mut world, orc, Coord::new(8, 3)),
            Err(CastError::CannotRoll("the orc".to_string()))
        );
    }
}
