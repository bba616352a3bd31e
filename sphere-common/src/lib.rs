pub mod config;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{EngineConfig, DomainConfig, TimingConfig, InitialConditions, InteractionConfig, BrickConfig, OutputConfig};
pub use snapshot::Snapshot;
pub use vecmath::{Vec3, Quat, clamp};
