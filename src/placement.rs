use anyhow::Result;
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Normal;
use sphere_common::{EngineConfig, Vec3};

use crate::sphere::Sphere;

/// Places the configured number of spheres inside the domain (kept one radius
/// away from every face) using jittered sampling: the placement box is split
/// into bins, the bins are shuffled, and one sphere is drawn uniformly in each
/// of the first `num_spheres` bins. Velocities are drawn per component from
/// `N(0, velocity_std)`.
pub fn place_initial_spheres(config: &EngineConfig, rng: &mut StdRng) -> Result<Vec<Sphere>> {
    let ic = &config.initial_conditions;
    let count = ic.num_spheres as usize;
    if count == 0 {
        return Ok(Vec::new());
    }
    let r = ic.radius;
    let lo = Vec3::from(config.domain.min) + Vec3::splat(r);
    let hi = Vec3::from(config.domain.max) - Vec3::splat(r);
    for axis in 0..3 {
        if lo[axis] >= hi[axis] {
            anyhow::bail!("Domain is too small on axis {} for spheres of radius {}", axis, r);
        }
    }

    // Bins per axis so that there is at least one bin per sphere
    let per_axis = ((count as f64).cbrt().ceil() as usize).max(1);
    let mut bins: Vec<[usize; 3]> = (0..per_axis)
        .flat_map(|ix| (0..per_axis).flat_map(move |iy| (0..per_axis).map(move |iz| [ix, iy, iz])))
        .collect();
    bins.shuffle(rng);
    bins.truncate(count);

    let bin_size = (hi - lo) / per_axis as f64;
    let velocity_dist = if ic.velocity_std > 0.0 {
        Some(Normal::new(0.0, ic.velocity_std)?)
    } else {
        None
    };

    let mut spheres = Vec::with_capacity(count);
    for bin in bins {
        let mut pos = [0.0f64; 3];
        for axis in 0..3 {
            let start = lo[axis] + bin[axis] as f64 * bin_size[axis];
            let dist = Uniform::new(start, start + bin_size[axis])?;
            pos[axis] = rng.sample(dist);
        }
        let v = match &velocity_dist {
            Some(d) => Vec3::new(rng.sample(d), rng.sample(d), rng.sample(d)),
            None => Vec3::zero(),
        };
        spheres.push(Sphere::new(Vec3::from(pos), r).with_velocity(v));
    }
    Ok(spheres)
}
