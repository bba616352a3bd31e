//! Stepping core of a discrete sphere/brick simulation: a world of mobile
//! spheres and immobile bricks, kept in sync with a uniform spatial grid so
//! pair interactions only run between nearby spheres.

pub mod brick;
pub mod error;
pub mod grid;
pub mod interactor;
pub mod placement;
pub mod sphere;
pub mod world;

pub use brick::Brick;
pub use error::{Result, WorldError};
pub use grid::Grid;
pub use interactor::{Interactor, NoopInteractor, RestSpring};
pub use sphere::{Sphere, SphereState};
pub use world::World;
