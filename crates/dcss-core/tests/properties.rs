use dcss_core::math::normalise;
use dcss_core::movement::{MoveOutcome, MovementHandler, OrbMovement, ProjectileState};
use dcss_core::world::{Actor, ActorId, Grid, KillCategory, Species};
use dcss_core::{Coord, World};
use glam::DVec2;
use proptest::prelude::*;

fn orb_world(angle: f64) -> (World, ActorId) {
    let mut world = World::new(Grid::open(61, 61), 17);
    let cell = Coord::new(30, 30);
    let mut orb = Actor::monster(Species::OrbOfDestruction, cell);
    let mut state = ProjectileState::at(cell).with_velocity(DVec2::new(angle.cos(), angle.sin()));
    state.pow = 80;
    state.kc = KillCategory::Other;
    orb.projectile = Some(state);
    let id = world.place_actor(orb).unwrap();
    (world, id)
}

proptest! {
    #[test]
    fn normalise_is_unit_and_idempotent(x in -100.0f64..100.0, y in -100.0f64..100.0) {
        let v = DVec2::new(x, y);
        prop_assume!(v.length() > 1e-3);
        let n = normalise(v);
        prop_assert!((n.length() - 1.0).abs() < 1e-12);
        prop_assert!((normalise(n) - n).length() < 1e-12);
    }

    #[test]
    fn distance_only_grows(angle in 0.0f64..std::f64::consts::TAU, steps in 1usize..25) {
        let (mut world, orb) = orb_world(angle);
        let mut last = 0;
        for _ in 0..steps {
            prop_assert_eq!(OrbMovement::new(orb).move_step(&mut world), MoveOutcome::Moving);
            let state = world.actor(orb).unwrap().projectile.clone().unwrap();
            prop_assert!(state.dist > last);
            prop_assert!((state.vel.length() - 1.0).abs() < 1e-9);
            prop_assert_eq!(world.actor(orb).unwrap().pos, state.cell());
            last = state.dist;
        }
    }

    #[test]
    fn catchup_lands_where_stepping_does(angle in 0.0f64..std::f64::consts::TAU, turns in 1i32..25) {
        let (mut stepped, orb) = orb_world(angle);
        let mut caught_up = stepped.clone();
        for _ in 0..turns {
            OrbMovement::new(orb).move_step(&mut stepped);
        }
        prop_assert_eq!(OrbMovement::new(orb).catchup(&mut caught_up, turns), MoveOutcome::Moving);
        let a = caught_up.actor(orb).unwrap().projectile.clone().unwrap();
        let b = stepped.actor(orb).unwrap().projectile.clone().unwrap();
        prop_assert!((a.pos - b.pos).length() < 1e-9);
        prop_assert_eq!(a.dist, b.dist);
    }
}
