//! netfixture - container network fixtures for integration tests
//!
//! netfixture provisions an isolated Docker network of service doubles
//! (mock HTTP endpoint, message queue, pub/sub broker, key-value table)
//! together with the function under test, so a single test run can invoke
//! the function once and assert on its side effects across every
//! downstream service. It provides:
//!
//! - An orchestrator that starts a fixed set of containers in registration
//!   order and tears them down deterministically
//! - A uniform container contract implemented by per-service adapters
//! - Mapped-port and log access for driving assertions
//! - Fixed-delay and probe-based readiness pacing between starts

pub mod clock;
pub mod container;
pub mod docker;
pub mod error;
pub mod network;
pub mod orchestrator;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use container::{ContainerHandle, ContainerSpec, ServiceContainer, StagedFile};
pub use docker::{BollardEngine, DockerEngine};
pub use error::{FixtureError, Result};
pub use network::ContainerNetwork;
pub use orchestrator::{NetworkOrchestrator, OrchestratorState, ReadinessProbe};
