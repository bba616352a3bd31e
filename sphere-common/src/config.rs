use serde::{Deserialize, Serialize};
use anyhow::Result;
use std::path::Path;

// Configuration for the simulated domain and grid resolution
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DomainConfig {
    #[serde(default = "default_min_box")]
    pub min: [f64; 3],
    #[serde(default = "default_max_box")]
    pub max: [f64; 3],
    /// Requested grid cell edge length per axis. Cell counts are derived from this
    /// and the domain extent, rounded to the nearest integer.
    pub cell_size: [f64; 3],
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub dt: f64,
    pub total_steps: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval_steps: u32,
}

// Initial conditions for the run, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    pub num_spheres: u32,
    pub radius: f64,
    /// Standard deviation of each initial velocity component.
    #[serde(default)]
    pub velocity_std: f64,
    pub placement_seed: u64,
}

// Parameters of the bundled rest-spring interaction law
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InteractionConfig {
    pub stiffness: f64,
    #[serde(default)]
    pub damping: f64,
    pub cutoff: f64,
    #[serde(default = "default_mass")]
    pub mass: f64,
}

// An immobile axis-aligned box
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BrickConfig {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_snapshots: bool,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
    /// World checkpoint written at the end of the run.
    #[serde(default)]
    pub checkpoint: Option<String>,
    /// World checkpoint to resume from instead of placing fresh spheres.
    #[serde(default)]
    pub resume_from: Option<String>,
}

// Main run configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EngineConfig {
    pub domain: DomainConfig,
    pub timing: TimingConfig,
    pub initial_conditions: InitialConditions,
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub bricks: Vec<BrickConfig>,
    pub output: OutputConfig,
}

impl EngineConfig {
    /// Loads the run configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timing.dt <= 0.0 {
            anyhow::bail!("dt must be positive.");
        }
        if self.domain.cell_size.iter().any(|&c| c <= 0.0) {
            anyhow::bail!("cell_size components must be positive.");
        }
        for axis in 0..3 {
            if self.domain.min[axis] >= self.domain.max[axis] {
                anyhow::bail!(
                    "domain min ({}) must be below max ({}) on axis {}.",
                    self.domain.min[axis], self.domain.max[axis], axis
                );
            }
        }
        if self.initial_conditions.radius <= 0.0 {
            anyhow::bail!("radius must be positive.");
        }
        if self.interaction.mass <= 0.0 {
            anyhow::bail!("interaction mass must be positive.");
        }
        Ok(())
    }
}

fn default_min_box() -> [f64; 3] {
    [0.0; 3]
}

fn default_max_box() -> [f64; 3] {
    [1.0; 3]
}

fn default_record_interval() -> u32 {
    100
}

fn default_mass() -> f64 {
    1.0
}
