//! Shared sub-tile stepper
//!
//! Every propelled actor advances the same way: normalise and aim the
//! velocity, advance the sub-tile position, round it to a cell and resolve
//! whatever is in that cell. The per-kind differences are the hooks of
//! [`ProjectileBehaviour`]; any type implementing it is a
//! [`MovementHandler`].

use glam::DVec2;

use super::{HandlerKind, MoveOutcome, MovementHandler, ProjectileState};
use crate::consts::{BASELINE_DELAY, PROJECTILE_BASE_TO_HIT};
use crate::math::{self, Coord, round_to_cell};
use crate::world::{ActorId, CloudType, World};

/// Stepper state for one handler call
#[derive(Debug, Clone)]
pub struct Projectile {
    pub subject: ActorId,
    pub state: ProjectileState,
    /// Replaying off-screen turns: no aiming, no trails, collisions dissipate
    pub catching_up: bool,
    /// Leave no trail during this call
    pub no_trail: bool,
    moving: bool,
    /// The subject was reported dead; the handler no longer touches it
    dead: bool,
    stopped: bool,
    repeat: bool,
    /// Continue after a collision without re-normalising or re-aiming
    resume: bool,
    substeps_left: u32,
    step: DVec2,
}

impl Projectile {
    pub fn new(subject: ActorId) -> Self {
        Self {
            subject,
            state: ProjectileState::at(Coord::new(0, 0)),
            catching_up: false,
            no_trail: false,
            moving: false,
            dead: false,
            stopped: false,
            repeat: false,
            resume: false,
            substeps_left: 0,
            step: DVec2::ZERO,
        }
    }

    /// Load the subject's persistent state
    pub(crate) fn setup(&mut self, world: &World) {
        let Some(actor) = world.actor(self.subject) else {
            return;
        };
        self.state = actor
            .projectile
            .clone()
            .unwrap_or_else(|| ProjectileState::at(actor.pos));
        self.stopped = false;
        self.repeat = false;
        self.resume = false;
        self.substeps_left = 0;
    }

    /// Write the state back to the subject. A stopped subject is re-centred
    /// on its cell.
    pub(crate) fn save(&mut self, world: &mut World) {
        let Some(actor) = world.actor_mut(self.subject) else {
            return;
        };
        if self.stopped {
            self.state.pos = actor.pos.as_vec();
        }
        actor.projectile = Some(self.state.clone());
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.stopped = true;
    }

    /// Take another sub-step this call on the current heading. With
    /// `redirect` the remaining sub-steps are recomputed from the velocity.
    pub(crate) fn resume_after_collision(&mut self, redirect: bool) {
        self.repeat = true;
        self.resume = true;
        if redirect {
            self.substeps_left = 0;
        }
    }
}

/// Per-kind hooks of the stepper
pub trait ProjectileBehaviour {
    fn core(&self) -> &Projectile;

    fn core_mut(&mut self) -> &mut Projectile;

    fn family(&self) -> HandlerKind;

    /// Adjust the heading before a step
    fn aim(&mut self, _world: &mut World) {}

    fn normalise(&self, v: DVec2) -> DVec2 {
        math::normalise(v)
    }

    /// Added to the base to-hit roll against shields
    fn to_hit_bonus(&self, world: &World) -> i32;

    fn trail_type(&self) -> CloudType;

    /// Validate a destination. Returning false means the hook already
    /// stopped the subject.
    fn check_pos(&mut self, world: &mut World, pos: Coord) -> bool {
        if world.in_bounds(pos) {
            return true;
        }
        self.stop(world, true);
        false
    }

    /// Called once before a catch-up replays `moves` steps. Returning true
    /// means the subject was dealt with and nothing is replayed.
    fn on_catchup(&mut self, _world: &mut World, _moves: i32) -> bool {
        false
    }

    /// The destination is solid. Returns true to enter it anyway.
    fn hit_solid(&mut self, world: &mut World, pos: Coord) -> bool;

    /// Unblocked hit on an actor. Returns true to carry on into the cell.
    fn strike_actor(&mut self, world: &mut World, pos: Coord, victim: ActorId) -> bool;

    /// Collision with another of the same family, or `None` if `victim`
    /// is not one.
    fn hit_own_kind(&mut self, world: &mut World, pos: Coord, victim: ActorId) -> Option<bool>;

    fn stop(&mut self, world: &mut World, msg: bool);
}

impl<B: ProjectileBehaviour> MovementHandler for B {
    fn subject(&self) -> ActorId {
        self.core().subject
    }

    fn kind(&self) -> HandlerKind {
        self.family()
    }

    fn move_step(&mut self, world: &mut World) -> MoveOutcome {
        run_move(self, world)
    }

    fn catchup(&mut self, world: &mut World, turns: i32) -> MoveOutcome {
        run_catchup(self, world, turns)
    }

    fn killed(&mut self) {
        self.core_mut().dead = true;
    }
}

fn outcome(world: &World, core: &Projectile) -> MoveOutcome {
    if core.dead || !world.is_alive(core.subject) {
        MoveOutcome::Destroyed
    } else if core.stopped {
        MoveOutcome::Stopped
    } else {
        MoveOutcome::Moving
    }
}

pub(crate) fn run_move<B: ProjectileBehaviour + ?Sized>(b: &mut B, world: &mut World) -> MoveOutcome {
    let id = b.core().subject;
    if b.core().dead || !world.is_alive(id) {
        return MoveOutcome::Destroyed;
    }
    b.core_mut().setup(world);
    b.core_mut().moving = true;
    world.begin_move(id);

    loop {
        b.core_mut().repeat = false;
        let Some(pos) = get_move_pos(b, world) else {
            break;
        };
        if b.core().substeps_left > 0 {
            b.core_mut().repeat = true;
        }
        if !b.check_pos(world, pos) {
            break;
        }
        let Some(old) = world.actor(id).map(|a| a.pos) else {
            break;
        };
        if pos != old && on_moving(b, world, pos) {
            if world.move_actor_to(id, pos) {
                on_moved(b, world, old);
            } else {
                b.stop(world, true);
            }
        }

        let core = b.core();
        if !core.repeat || core.stopped || core.dead || !world.is_alive(id) {
            break;
        }
    }

    if !b.core().dead && world.is_alive(id) {
        b.core_mut().save(world);
    }
    b.core_mut().moving = false;
    world.finish_move(id);
    outcome(world, b.core())
}

fn substeps_for(vel: DVec2) -> u32 {
    let fastest = vel.x.abs().max(vel.y.abs());
    if fastest <= 1.0 { 1 } else { fastest.ceil() as u32 }
}

/// Advance the sub-tile position by one sub-step and return the cell it
/// rounds to, or `None` if the subject was stopped instead.
fn get_move_pos<B: ProjectileBehaviour + ?Sized>(b: &mut B, world: &mut World) -> Option<Coord> {
    if b.core().substeps_left == 0 {
        if b.core().state.vel == DVec2::ZERO {
            log::warn!("{:?} has no velocity; stopping it", b.core().subject);
            b.stop(world, true);
            return None;
        }
        let core = b.core();
        if !core.catching_up && !core.resume {
            let v = b.normalise(core.state.vel);
            b.core_mut().state.vel = v;
            b.aim(world);
            let v = b.normalise(b.core().state.vel);
            b.core_mut().state.vel = v;
        }
        let core = b.core_mut();
        core.resume = false;
        let n = substeps_for(core.state.vel);
        core.substeps_left = n;
        core.step = core.state.vel / n as f64;
    }

    let core = b.core_mut();
    core.substeps_left -= 1;
    core.state.dist += 1;
    core.state.pos += core.step;
    Some(round_to_cell(core.state.pos))
}

/// Resolve whatever occupies the destination. Returns true if the subject
/// should move into it.
fn on_moving<B: ProjectileBehaviour + ?Sized>(b: &mut B, world: &mut World, pos: Coord) -> bool {
    let id = b.core().subject;
    let victim = world.actor_at(pos).filter(|&v| v != id);

    if b.core().catching_up {
        if world.is_solid(pos) || victim.is_some() {
            b.stop(world, false);
            return false;
        }
        return true;
    }

    if world.is_solid(pos) {
        return b.hit_solid(world, pos);
    }
    let Some(victim) = victim else {
        return true;
    };
    if let Some(proceed) = b.hit_own_kind(world, pos, victim) {
        return proceed;
    }
    if world.actor(victim).is_some_and(|v| v.submerged()) {
        return pass_submerged(b, world, victim);
    }
    hit_actor(b, world, pos, victim)
}

/// Something hidden under the water is in the way: trade places with it if
/// it can live where we are, otherwise hop over it.
fn pass_submerged<B: ProjectileBehaviour + ?Sized>(b: &mut B, world: &mut World, victim: ActorId) -> bool {
    let id = b.core().subject;
    let Some(here) = world.actor(id).map(|a| a.pos) else {
        return false;
    };
    if world.actor_at(here) == Some(id) && world.can_inhabit(victim, here) {
        log::debug!("{id:?} swapping places with submerged {victim:?}");
        world.swap_actors(id, victim);
        return false;
    }
    log::debug!("{id:?} boosting over submerged {victim:?}");
    if let Some(actor) = world.actor_mut(id) {
        actor.lose_move_energy();
    }
    b.core_mut().resume_after_collision(false);
    false
}

/// Roll the victim's shield against the projectile
fn shield_blocks<B: ProjectileBehaviour + ?Sized>(b: &B, world: &mut World, victim: ActorId) -> bool {
    let to_hit = PROJECTILE_BASE_TO_HIT + b.to_hit_bonus(world);
    let Some(actor) = world.actor(victim) else {
        return false;
    };
    let Some(shield) = &actor.shield else {
        return false;
    };
    if actor.incapacitated() {
        return false;
    }
    let pro = shield.bonus;
    let penalty = actor.shield_block_penalty();
    let con = world.rng.rn2((to_hit + penalty).max(0) as u32) as i32;
    log::debug!("shield check: pro {pro} vs con {con} (to-hit {to_hit}, penalty {penalty})");
    pro >= con
}

fn hit_actor<B: ProjectileBehaviour + ?Sized>(
    b: &mut B,
    world: &mut World,
    pos: Coord,
    victim: ActorId,
) -> bool {
    if !shield_blocks(b, world, victim) {
        return b.strike_actor(world, pos, victim);
    }

    let id = b.core().subject;
    let (Some(me), Some(them)) = (world.actor(id), world.actor(victim)) else {
        return false;
    };
    let Some(shield) = them.shield.clone() else {
        return false;
    };
    let my_name = me.the_name();
    let msg = match (them.is_player(), shield.reflects) {
        (true, false) => format!("You block {my_name}."),
        (false, false) => format!("{} blocks {my_name}.", them.cap_the_name()),
        (true, true) => format!("Your {} reflects {my_name}!", shield.name),
        (false, true) => format!(
            "{} reflects {my_name} with its {}!",
            them.cap_the_name(),
            shield.name
        ),
    };
    world.mpr_if_seen(pos, msg);
    if let Some(them) = world.actor_mut(victim) {
        them.shield_block_succeeded();
    }

    if !shield.reflects {
        b.stop(world, true);
        return false;
    }

    let core = b.core_mut();
    core.state.reflector = Some(victim);
    core.state.vel = -core.state.vel;
    core.resume_after_collision(true);
    if let Some(me) = world.actor_mut(id) {
        me.lose_energy(BASELINE_DELAY);
    }
    false
}

/// Leave a trail behind in the cell just vacated
fn on_moved<B: ProjectileBehaviour + ?Sized>(b: &mut B, world: &mut World, old: Coord) {
    let core = b.core();
    if core.catching_up || core.no_trail {
        return;
    }
    let spread = world.options.trail_spread;
    let duration = world.options.trail_min + world.rng.rn2(spread);
    world.place_cloud(b.trail_type(), old, duration, Some(core.subject));
}

pub(crate) fn run_catchup<B: ProjectileBehaviour + ?Sized>(
    b: &mut B,
    world: &mut World,
    turns: i32,
) -> MoveOutcome {
    let id = b.core().subject;
    if b.core().dead {
        return MoveOutcome::Destroyed;
    }
    let Some(speed) = world.actor(id).map(|a| a.speed) else {
        return MoveOutcome::Destroyed;
    };
    let moves = turns.saturating_mul(speed) / BASELINE_DELAY;
    log::debug!("{id:?} catching up {moves} moves over {turns} turns");

    b.core_mut().setup(world);
    b.core_mut().catching_up = true;
    let mut result = outcome(world, b.core());
    if b.on_catchup(world, moves) {
        result = outcome(world, b.core());
    } else {
        for _ in 0..moves {
            result = run_move(b, world);
            if result != MoveOutcome::Moving {
                break;
            }
        }
    }
    b.core_mut().catching_up = false;
    result
}
