//! Shared container runtime bookkeeping
//!
//! Every service adapter embeds a [`ContainerHandle`]. The handle owns the
//! opaque container ID, tracks the internal and mapped ports, and enforces
//! the lifecycle preconditions of the container contract: constructed
//! empty, populated by `start`, queried during the test, destroyed by
//! `stop`.

use crate::container::ContainerSpec;
use crate::docker::DockerEngine;
use crate::error::{FixtureError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Runtime state for one container instance
#[derive(Default)]
pub struct ContainerHandle {
    engine: Option<Arc<dyn DockerEngine>>,
    container_id: Option<String>,
    hostname: String,
    mapped_port: Option<u16>,
    started_at: Option<DateTime<Utc>>,
}

impl ContainerHandle {
    /// Create an empty handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the container from the spec, stage its files, start it and
    /// resolve the mapped port.
    ///
    /// Must be called at most once; a second call is a usage error. If any
    /// step fails after the container was created, the handle keeps the
    /// container ID so [`stop`](Self::stop) can still clean it up.
    pub async fn start(
        &mut self,
        engine: Arc<dyn DockerEngine>,
        spec: ContainerSpec,
        network: &str,
    ) -> Result<()> {
        if self.container_id.is_some() || self.started_at.is_some() {
            return Err(FixtureError::AlreadyStarted(spec.hostname));
        }

        self.hostname = spec.hostname.clone();

        let id = engine.create_container(&spec, network).await?;
        // Recorded before staging/start so a partial failure stays cleanable
        self.container_id = Some(id.clone());
        self.engine = Some(Arc::clone(&engine));

        for file in &spec.staged_files {
            engine.copy_to_container(&id, file).await?;
        }

        engine
            .start_container(&id)
            .await
            .map_err(|err| FixtureError::ContainerStart {
                container: spec.hostname.clone(),
                message: err.to_string(),
            })?;

        let port = engine.mapped_port(&id, spec.internal_port).await?;
        self.mapped_port = Some(port);
        self.started_at = Some(Utc::now());

        tracing::info!(
            "Container {} running, port {} mapped to host port {}",
            spec.hostname,
            spec.internal_port,
            port
        );
        Ok(())
    }

    /// Host-visible port mapped to the internal service port
    pub fn mapped_port(&self) -> Result<u16> {
        self.mapped_port
            .ok_or_else(|| FixtureError::NotStarted(self.hostname.clone()))
    }

    /// Snapshot of the container's stdout/stderr at the time of the call
    pub async fn log(&self) -> Result<String> {
        let id = self
            .container_id
            .as_ref()
            .ok_or_else(|| FixtureError::NotStarted(self.hostname.clone()))?;
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| FixtureError::NotStarted(self.hostname.clone()))?;
        engine.container_logs(id).await
    }

    /// Stop and remove the container
    ///
    /// Safe to call if `start` never completed: with no container created
    /// this is a no-op, and with a partially-created container it still
    /// stops and removes it. Idempotent.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(id) = self.container_id.clone() else {
            return Ok(());
        };
        let Some(engine) = self.engine.clone() else {
            return Ok(());
        };

        // Attempt the removal even when stop fails; the handle gives up the
        // container id only once both succeeded, so a retry still reaches
        // the engine instead of silently succeeding.
        let stopped = engine.stop_container(&id).await;
        let removed = engine.remove_container(&id).await;
        stopped.and(removed)?;

        self.container_id = None;
        self.engine = None;
        self.mapped_port = None;

        tracing::info!("Container {} stopped and removed", self.hostname);
        Ok(())
    }

    /// When the container reached its running state
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Whether the container is currently running
    pub fn is_running(&self) -> bool {
        self.container_id.is_some() && self.started_at.is_some()
    }
}
