use serde::{Serialize, Deserialize};

/// A snapshot of the world state and metrics at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The simulation clock at which the snapshot was taken.
    pub time: f64,
    /// Number of completed steps.
    pub step: u32,
    /// Spheres alive in the world.
    pub sphere_count: u32,
    /// Spheres removed for leaving the domain since the run started.
    pub removed_total: u32,
    /// Translational kinetic energy per unit mass, summed over all spheres.
    pub kinetic_energy: f64,
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "positions": null
    pub positions: Option<Vec<[f64; 3]>>,
}
