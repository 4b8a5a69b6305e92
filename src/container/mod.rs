//! Container abstraction
//!
//! The uniform contract the orchestrator drives, plus the shared runtime
//! bookkeeping every service adapter embeds.

pub mod handle;
pub mod service;
pub mod spec;

pub use handle::ContainerHandle;
pub use service::ServiceContainer;
pub use spec::{ContainerSpec, StagedFile};
