//! Network handle
//!
//! A named, ephemeral bridge network grouping the fixture's containers so
//! they can resolve each other by hostname alias. Created once per
//! orchestrator run and removed only after every container has been given a
//! stop attempt.

use crate::docker::DockerEngine;
use crate::error::Result;
use std::sync::Arc;

/// Handle to the shared virtual network
#[derive(Clone)]
pub struct ContainerNetwork {
    engine: Arc<dyn DockerEngine>,
    name: String,
}

impl ContainerNetwork {
    /// Create a network with a generated unique name
    pub async fn create(engine: Arc<dyn DockerEngine>) -> Result<Self> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("netfixture-{}", &suffix[..8]);
        Self::create_named(engine, &name).await
    }

    /// Create a network with an explicit name
    pub async fn create_named(engine: Arc<dyn DockerEngine>, name: &str) -> Result<Self> {
        engine.create_network(name).await?;
        tracing::info!("Created container network {}", name);
        Ok(Self {
            engine,
            name: name.to_string(),
        })
    }

    /// The network name containers attach to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The engine this network was created on
    pub fn engine(&self) -> Arc<dyn DockerEngine> {
        Arc::clone(&self.engine)
    }

    /// Remove the network
    pub async fn remove(&self) -> Result<()> {
        self.engine.remove_network(&self.name).await?;
        tracing::info!("Removed container network {}", self.name);
        Ok(())
    }
}
