//! Docker Engine API consumption
//!
//! netfixture does not implement container runtime mechanics; it is a pure
//! consumer of the Docker Engine API behind the [`DockerEngine`] seam.

pub mod engine;

pub use engine::{BollardEngine, DockerEngine};
