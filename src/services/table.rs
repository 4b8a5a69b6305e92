//! Key-value table double (DynamoDB-local)

use crate::container::{ContainerHandle, ContainerSpec, ServiceContainer};
use crate::error::Result;
use crate::network::ContainerNetwork;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const IMAGE: &str = "amazon/dynamodb-local";
const DEFAULT_PORT: u16 = 8000;

/// Table container configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Hostname on the shared network
    pub hostname: String,
    /// Internal service port
    pub port: u16,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            hostname: "table".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Key-value table service double
pub struct TableContainer {
    config: TableConfig,
    handle: ContainerHandle,
}

impl TableContainer {
    /// Create a table adapter from its configuration
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            handle: ContainerHandle::new(),
        }
    }

    /// Address other containers on the network use to reach the table store
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.config.hostname, self.config.port)
    }
}

#[async_trait]
impl ServiceContainer for TableContainer {
    fn hostname(&self) -> &str {
        &self.config.hostname
    }

    async fn start_using(&mut self, network: &ContainerNetwork) -> Result<()> {
        let spec = ContainerSpec::new(IMAGE, &self.config.hostname, self.config.port);
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
