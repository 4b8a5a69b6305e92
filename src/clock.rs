//! Clock abstraction for time-dependent orchestration
//!
//! The orchestrator paces container startups with fixed delays or probe
//! intervals. Injecting the clock keeps those code paths deterministic
//! under test.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Trait for abstracting time operations
#[async_trait]
pub trait Clock: Send + Sync {
    /// Get the current instant
    fn now(&self) -> Instant;

    /// Suspend the current task for the given duration
    async fn sleep(&self, duration: Duration);
}

/// System clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
