use serde::{Deserialize, Serialize};
use sphere_common::Vec3;
use sphere_engine::{Brick, Interactor, NoopInteractor, Sphere, World, WorldError};

/// Counts how often each interaction overload is invoked.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CountingInteractor {
    pairs: Vec<(Vec3, Vec3)>,
    fixed_calls: usize,
}

impl Interactor for CountingInteractor {
    fn interact_pair(&mut self, a: &mut Sphere, b: &mut Sphere) {
        self.pairs.push((a.x0, b.x0));
    }

    fn interact_fixed(&mut self, _brick: &Brick, _s: &mut Sphere) {
        self.fixed_calls += 1;
    }
}

#[test]
fn resting_pair_with_noop_law_stays_put_and_clock_advances() {
    let mut world = World::new(Vec3::splat(0.25), NoopInteractor, 0.001);
    world.add_sphere(Sphere::new(Vec3::new(0.4, 0.5, 0.5), 0.02));
    world.add_sphere(Sphere::new(Vec3::new(0.5, 0.5, 0.5), 0.02));

    world.step_n(10);

    assert_eq!(world.num_spheres(), 2);
    assert_eq!(world.get_sphere(0).unwrap().x, Vec3::new(0.4, 0.5, 0.5));
    assert_eq!(world.get_sphere(1).unwrap().x, Vec3::new(0.5, 0.5, 0.5));
    assert!((world.time() - 0.01).abs() < 1e-12);
}

#[test]
fn sphere_outside_domain_is_removed_on_first_step() {
    let mut world = World::new(Vec3::splat(0.5), NoopInteractor, 0.001);
    world.add_sphere(Sphere::new(Vec3::new(0.2, 0.2, 0.2), 0.01));
    world.add_sphere(Sphere::new(Vec3::new(1.5, 0.2, 0.2), 0.01));
    world.add_sphere(Sphere::new(Vec3::new(0.7, 0.7, 0.7), 0.01));
    assert_eq!(world.num_spheres(), 3);

    let removed = world.step();

    assert_eq!(removed, 1);
    assert_eq!(world.num_spheres(), 2);
    for i in 0..world.num_spheres() {
        assert!(world.get_sphere(i).is_ok());
    }
    assert_eq!(world.get_sphere(1).unwrap().x, Vec3::new(0.7, 0.7, 0.7));
    assert!(world.grid().matches(world.spheres()));
}

#[test]
fn one_past_the_end_is_out_of_range() {
    let mut world = World::new(Vec3::splat(0.5), NoopInteractor, 0.001);
    world.add_sphere(Sphere::new(Vec3::splat(0.5), 0.01));
    let err = world.get_sphere(world.num_spheres()).unwrap_err();
    assert!(matches!(err, WorldError::OutOfRange { kind: "sphere", index: 1, len: 1 }));
    assert!(world.get_brick(0).is_err());
}

#[test]
fn each_neighbor_pair_interacts_once_per_step() {
    // one cell per axis: every sphere neighbors every other, in both directions
    let mut world = World::new(Vec3::splat(1.0), CountingInteractor::default(), 0.001);
    for k in 0..4 {
        world.add_sphere(Sphere::new(Vec3::splat(0.2 + 0.1 * k as f64), 0.01));
    }
    let grid = world.grid();
    assert!(grid.get_neighbors(0).contains(&1));
    assert!(grid.get_neighbors(1).contains(&0));

    world.step();

    let pairs = &world.interactor().pairs;
    assert_eq!(pairs.len(), 6);
    for p in pairs {
        assert_eq!(pairs.iter().filter(|q| *q == p).count(), 1);
    }
    // lower index always comes first
    assert!(pairs.iter().all(|(a, b)| a.x < b.x));
}

#[test]
fn every_brick_meets_every_sphere() {
    let mut world = World::new(Vec3::splat(0.2), CountingInteractor::default(), 0.001);
    for k in 0..5 {
        world.add_sphere(Sphere::new(Vec3::splat(0.1 + 0.2 * k as f64), 0.01));
    }
    world.add_brick(Brick::new(Vec3::zero(), Vec3::splat(0.1)));
    world.add_brick(Brick::new(Vec3::splat(0.9), Vec3::splat(1.0)));
    world.step_n(3);
    assert_eq!(world.interactor().fixed_calls, 2 * 5 * 3);
}

#[test]
fn distant_spheres_never_interact() {
    let mut world = World::new(Vec3::splat(0.1), CountingInteractor::default(), 0.001);
    world.add_sphere(Sphere::new(Vec3::splat(0.05), 0.01));
    world.add_sphere(Sphere::new(Vec3::splat(0.95), 0.01));
    world.step();
    assert!(world.interactor().pairs.is_empty());
}

#[test]
fn spheres_drifting_out_are_culled_and_survivors_stay_inside() {
    let mut world = World::new(Vec3::splat(0.1), NoopInteractor, 0.01);
    for k in 0..10 {
        let x = 0.05 + 0.09 * k as f64;
        world.add_sphere(Sphere::new(Vec3::new(x, 0.5, 0.5), 0.01).with_velocity(Vec3::new(1.0, 0.0, 0.0)));
    }
    let (min, max) = world.bounds();
    let mut removed = 0;
    for _ in 0..30 {
        removed += world.step();
        world.update_flags();
        removed += world.clean();
        assert!(world.grid().matches(world.spheres()));
        for s in world.spheres() {
            for axis in 0..3 {
                assert!(min[axis] <= s.x[axis] && s.x[axis] <= max[axis]);
            }
        }
    }
    // 0.3 of travel carries only the two rightmost spheres past x = 1
    assert_eq!(removed, 2);
    assert_eq!(world.num_spheres(), 8);
}

#[test]
fn out_of_domain_sphere_never_reaches_the_interactor() {
    let mut world = World::new(Vec3::splat(1.0), CountingInteractor::default(), 0.001);
    world.add_sphere(Sphere::new(Vec3::new(0.95, 0.5, 0.5), 0.01));
    world.add_sphere(Sphere::new(Vec3::new(1.05, 0.5, 0.5), 0.01));
    world.add_brick(Brick::new(Vec3::zero(), Vec3::splat(0.1)));

    assert_eq!(world.step(), 1);

    assert!(world.interactor().pairs.is_empty());
    assert_eq!(world.interactor().fixed_calls, 1);
}

/// Kills the second sphere of every pair it sees and records who it met.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct KillOnContact {
    pair_calls: usize,
    met: Vec<Vec3>,
    dead_seen: usize,
}

impl Interactor for KillOnContact {
    fn interact_pair(&mut self, a: &mut Sphere, b: &mut Sphere) {
        self.pair_calls += 1;
        self.dead_seen += usize::from(!a.is_alive()) + usize::from(!b.is_alive());
        self.met.push(a.x0);
        self.met.push(b.x0);
        b.kill();
    }

    fn interact_fixed(&mut self, _brick: &Brick, s: &mut Sphere) {
        self.met.push(s.x0);
    }
}

#[test]
fn sphere_killed_by_interactor_is_gone_after_next_cleanup() {
    let keep = Vec3::new(0.3, 0.5, 0.5);
    let doomed = Vec3::new(0.6, 0.5, 0.5);
    let mut world = World::new(Vec3::splat(1.0), KillOnContact::default(), 0.001);
    world.add_sphere(Sphere::new(keep, 0.01));
    world.add_sphere(Sphere::new(doomed, 0.01));
    world.add_brick(Brick::new(Vec3::zero(), Vec3::splat(0.1)));

    assert_eq!(world.step(), 0);
    assert_eq!(world.interactor().pair_calls, 1);
    assert!(!world.get_sphere(1).unwrap().is_alive());
    let met_before = world.interactor().met.len();

    assert_eq!(world.step(), 1);
    world.step_n(3);

    assert_eq!(world.num_spheres(), 1);
    assert_eq!(world.get_sphere(0).unwrap().x0, keep);
    assert!(world.grid().matches(world.spheres()));
    let interactor = world.interactor();
    assert_eq!(interactor.pair_calls, 1);
    assert_eq!(interactor.dead_seen, 0);
    assert!(interactor.met[met_before..].iter().all(|x0| *x0 == keep));
    assert_eq!(interactor.met.len(), met_before + 4);
}

#[test]
fn grid_follows_moving_sphere() {
    let mut world = World::new(Vec3::splat(0.1), NoopInteractor, 0.1);
    world.add_sphere(Sphere::new(Vec3::new(0.05, 0.05, 0.05), 0.01).with_velocity(Vec3::new(1.0, 0.0, 0.0)));
    world.add_sphere(Sphere::new(Vec3::new(0.35, 0.05, 0.05), 0.01));
    assert!(!world.grid().get_neighbors(0).contains(&1));

    // x = 0.25 after two steps: one cell away from its neighbor
    world.step_n(2);

    assert!(world.grid().matches(world.spheres()));
    assert!(world.grid().get_neighbors(0).contains(&1));
}

#[test]
fn reference_position_survives_motion() {
    let mut world = World::new(Vec3::splat(0.25), NoopInteractor, 0.01);
    let start = Vec3::new(0.3, 0.3, 0.3);
    world.add_sphere(Sphere::new(start, 0.01).with_velocity(Vec3::new(0.5, 0.0, 0.0)));
    world.step_n(5);
    let s = world.get_sphere(0).unwrap();
    assert_eq!(s.x0, start);
    assert!(s.x.x > start.x);
}
