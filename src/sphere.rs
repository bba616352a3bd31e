use serde::{Deserialize, Serialize};
use sphere_common::{Quat, Vec3};

/// Lifecycle flag of a sphere. `Kill` spheres are erased on the next cleanup pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SphereState {
    #[default]
    Alive,
    Kill,
}

/// A mobile spherical particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Current position.
    pub x: Vec3,
    /// Current orientation (not kept at unit norm).
    pub q: Quat,
    /// Linear velocity.
    pub v: Vec3,
    /// Angular velocity.
    pub w: Vec3,
    /// Reference position, stamped by `World::add_sphere`.
    pub x0: Vec3,
    pub radius: f64,
    pub flag: SphereState,
}

impl Sphere {
    /// A sphere at rest at `x` with identity orientation.
    pub fn new(x: Vec3, radius: f64) -> Self {
        Self {
            x,
            q: Quat::identity(),
            v: Vec3::zero(),
            w: Vec3::zero(),
            x0: x,
            radius,
            flag: SphereState::Alive,
        }
    }

    pub fn with_velocity(mut self, v: Vec3) -> Self {
        self.v = v;
        self
    }

    pub fn with_angular_velocity(mut self, w: Vec3) -> Self {
        self.w = w;
        self
    }

    pub fn with_orientation(mut self, q: Quat) -> Self {
        self.q = q;
        self
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.flag == SphereState::Alive
    }

    #[inline]
    pub fn kill(&mut self) {
        self.flag = SphereState::Kill;
    }

    /// Translational kinetic energy for a sphere of the given mass.
    #[inline]
    pub fn kinetic_energy(&self, mass: f64) -> f64 {
        0.5 * mass * self.v.length_squared()
    }
}
