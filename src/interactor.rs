//! Interaction laws applied by the world to nearby sphere pairs and to
//! (brick, sphere) pairs.

use serde::{Deserialize, Serialize};
use sphere_common::{InteractionConfig, Vec3};

use crate::brick::Brick;
use crate::sphere::Sphere;

/// A force law between two bodies. Implementations mutate the dynamic state
/// (velocity, angular velocity) of the spheres they are handed.
pub trait Interactor {
    /// Sphere-sphere interaction; called once per unordered neighbor pair per step.
    fn interact_pair(&mut self, a: &mut Sphere, b: &mut Sphere);

    /// Brick-sphere interaction; the brick is stationary.
    fn interact_fixed(&mut self, brick: &Brick, s: &mut Sphere);
}

/// Law that leaves every body untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoopInteractor;

impl Interactor for NoopInteractor {
    fn interact_pair(&mut self, _a: &mut Sphere, _b: &mut Sphere) {}

    fn interact_fixed(&mut self, _brick: &Brick, _s: &mut Sphere) {}
}

/// Bonded elastic network: every pair within `cutoff` is joined by a
/// spring-dashpot whose rest length is the pair's separation at insertion
/// (`|x0_a - x0_b|`). Bricks act as clamped regions: a sphere whose centre is
/// inside a brick has its velocities zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestSpring {
    pub stiffness: f64,
    pub damping: f64,
    pub cutoff: f64,
    pub mass: f64,
    pub dt: f64,
}

impl Default for RestSpring {
    fn default() -> Self {
        Self { stiffness: 0.0, damping: 0.0, cutoff: 0.0, mass: 1.0, dt: 0.0 }
    }
}

impl RestSpring {
    pub fn from_config(config: &InteractionConfig, dt: f64) -> Self {
        Self {
            stiffness: config.stiffness,
            damping: config.damping,
            cutoff: config.cutoff,
            mass: config.mass,
            dt,
        }
    }
}

impl Interactor for RestSpring {
    fn interact_pair(&mut self, a: &mut Sphere, b: &mut Sphere) {
        let d = b.x - a.x;
        let dist = d.length();
        if dist > self.cutoff || dist <= 1e-12 {
            return;
        }
        let n = d / dist;
        let rest = a.x0.distance(b.x0);
        let stretch = dist - rest;
        let separating_speed = (b.v - a.v).dot(n);
        // Positive force pulls the pair together.
        let force = self.stiffness * stretch + self.damping * separating_speed;
        let dv: Vec3 = n * (force * self.dt / self.mass);
        a.v += dv;
        b.v += -dv;
    }

    fn interact_fixed(&mut self, brick: &Brick, s: &mut Sphere) {
        if brick.contains(s.x) {
            s.v = Vec3::zero();
            s.w = Vec3::zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spring() -> RestSpring {
        RestSpring { stiffness: 10.0, damping: 0.0, cutoff: 0.5, mass: 1.0, dt: 0.01 }
    }

    #[test]
    fn stretched_pair_is_pulled_together_with_equal_and_opposite_impulses() {
        let mut a = Sphere::new(Vec3::new(0.0, 0.0, 0.0), 0.01);
        let mut b = Sphere::new(Vec3::new(0.1, 0.0, 0.0), 0.01);
        // stretch both apart after the rest positions were stamped
        b.x = Vec3::new(0.2, 0.0, 0.0);
        spring().interact_pair(&mut a, &mut b);
        assert!(a.v.x > 0.0);
        assert!(b.v.x < 0.0);
        assert!((a.v.x + b.v.x).abs() < 1e-12);
        assert!((a.v.x - 10.0 * 0.1 * 0.01).abs() < 1e-12);
    }

    #[test]
    fn pair_at_rest_length_feels_nothing() {
        let mut a = Sphere::new(Vec3::new(0.1, 0.1, 0.1), 0.01);
        let mut b = Sphere::new(Vec3::new(0.3, 0.1, 0.1), 0.01);
        spring().interact_pair(&mut a, &mut b);
        assert_eq!(a.v, Vec3::zero());
        assert_eq!(b.v, Vec3::zero());
    }

    #[test]
    fn pair_beyond_cutoff_is_ignored() {
        let mut a = Sphere::new(Vec3::zero(), 0.01);
        let mut b = Sphere::new(Vec3::new(0.1, 0.0, 0.0), 0.01);
        b.x = Vec3::new(0.9, 0.0, 0.0);
        spring().interact_pair(&mut a, &mut b);
        assert_eq!(a.v, Vec3::zero());
    }

    #[test]
    fn brick_clamps_spheres_inside_it() {
        let brick = Brick::new(Vec3::zero(), Vec3::splat(0.2));
        let mut inside = Sphere::new(Vec3::splat(0.1), 0.01)
            .with_velocity(Vec3::splat(1.0))
            .with_angular_velocity(Vec3::splat(2.0));
        let mut outside = Sphere::new(Vec3::splat(0.5), 0.01).with_velocity(Vec3::splat(1.0));
        let mut law = spring();
        law.interact_fixed(&brick, &mut inside);
        law.interact_fixed(&brick, &mut outside);
        assert_eq!(inside.v, Vec3::zero());
        assert_eq!(inside.w, Vec3::zero());
        assert_eq!(outside.v, Vec3::splat(1.0));
    }
}
