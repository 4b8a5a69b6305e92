//! Message queue double (ElasticMQ)

use crate::container::{ContainerHandle, ContainerSpec, ServiceContainer};
use crate::error::Result;
use crate::network::ContainerNetwork;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const IMAGE: &str = "softwaremill/elasticmq";
const DEFAULT_PORT: u16 = 9324;
const CONFIG_TARGET: &str = "/opt/elasticmq.conf";

/// Queue container configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Hostname on the shared network
    pub hostname: String,
    /// Internal service port
    pub port: u16,
    /// ElasticMQ configuration file declaring the queues
    pub config_file: Option<PathBuf>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            hostname: "queue".to_string(),
            port: DEFAULT_PORT,
            config_file: None,
        }
    }
}

/// Message queue service double
pub struct QueueContainer {
    config: QueueConfig,
    handle: ContainerHandle,
}

impl QueueContainer {
    /// Create a queue adapter from its configuration
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            handle: ContainerHandle::new(),
        }
    }

    /// Address other containers on the network use to reach the queue
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.config.hostname, self.config.port)
    }
}

#[async_trait]
impl ServiceContainer for QueueContainer {
    fn hostname(&self) -> &str {
        &self.config.hostname
    }

    async fn start_using(&mut self, network: &ContainerNetwork) -> Result<()> {
        let mut spec = ContainerSpec::new(IMAGE, &self.config.hostname, self.config.port);
        if let Some(config_file) = &self.config.config_file {
            spec = spec.staged_file(config_file, CONFIG_TARGET);
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
