use serde::{Deserialize, Serialize};
use sphere_common::Vec3;

/// An immobile axis-aligned box. Only ever the stationary side of an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub min: Vec3,
    pub max: Vec3,
}

impl Brick {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// True when `p` lies inside the box or on its surface.
    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|k| p[k] >= self.min[k] && p[k] <= self.max[k])
    }

    /// Point of the box nearest to `p`.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }
}
