//! Pub/sub broker double (SNS-compatible)

use crate::container::{ContainerHandle, ContainerSpec, ServiceContainer};
use crate::error::Result;
use crate::network::ContainerNetwork;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const IMAGE: &str = "s12v/sns";
const DEFAULT_PORT: u16 = 9911;
const DB_TARGET: &str = "/etc/sns/db.json";

/// Pub/sub container configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubConfig {
    /// Hostname on the shared network
    pub hostname: String,
    /// Internal service port
    pub port: u16,
    /// Broker database file declaring topics and subscriptions
    pub db_file: Option<PathBuf>,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            hostname: "pubsub".to_string(),
            port: DEFAULT_PORT,
            db_file: None,
        }
    }
}

/// Pub/sub broker service double
pub struct PubSubContainer {
    config: PubSubConfig,
    handle: ContainerHandle,
}

impl PubSubContainer {
    /// Create a pub/sub adapter from its configuration
    pub fn new(config: PubSubConfig) -> Self {
        Self {
            config,
            handle: ContainerHandle::new(),
        }
    }

    /// Address other containers on the network use to reach the broker
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.config.hostname, self.config.port)
    }
}

#[async_trait]
impl ServiceContainer for PubSubContainer {
    fn hostname(&self) -> &str {
        &self.config.hostname
    }

    async fn start_using(&mut self, network: &ContainerNetwork) -> Result<()> {
        let mut spec = ContainerSpec::new(IMAGE, &self.config.hostname, self.config.port);
        if let Some(db_file) = &self.config.db_file {
            spec = spec.staged_file(db_file, DB_TARGET);
        }
        self.handle.start(network.engine(), spec, network.name()).await
    }

    fn mapped_port(&self) -> Result<u16> {
        self.handle.mapped_port()
    }

    async fn log(&self) -> Result<String> {
        self.handle.log().await
    }

    async fn stop(&mut self) -> Result<()> {
        self.handle.stop().await
    }
}
