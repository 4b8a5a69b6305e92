//! Mock HTTP endpoint (WireMock)

use crate::container::{ContainerHandle, ContainerSpec, ServiceContainer};
use crate::error::{FixtureError, Result};
use crate::network::ContainerNetwork;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const IMAGE: &str = "wiremock/wiremock";
const DEFAULT_PORT: u16 = 8080;
const MAPPINGS_DIR: &str = "/home/wiremock/mappings";

/// Mock endpoint container configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockEndpointConfig {
    /// Hostname on the shared network
    pub hostname: String,
    /// Internal service port
    pub port: u16,
    /// WireMock JSON stub mapping files, staged into the mappings directory
    pub mapping_files: Vec<PathBuf>,
}

impl Default for MockEndpointConfig {
    fn default() -> Self {
        Self {
            hostname: "mock-endpoint".to_string(),
            port: DEFAULT_PORT,
            mapping_files: Vec::new(),
        }
    }
}

/// Mock HTTP endpoint service double
pub struct MockEndpointContainer {
    config: MockEndpointConfig,
    handle: ContainerHandle,
}

impl MockEndpointContainer {
    /// Create a mock endpoint adapter from its configuration
    pub fn new(config: MockEndpointConfig) -> Self {
        Self {
            config,
            handle: ContainerHandle::new(),
        }
    }

    /// Address other containers on the network use to reach the endpoint
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.config.hostname, self.config.port)
    }

    /// Host-visible URL of the admin request journal, for asserting which
    /// requests the endpoint received. Valid only after start.
    pub fn admin_requests_url(&self) -> Result<String> {
        let port = self.handle.mapped_port()?;
        Ok(format!("http://localhost:{}/__admin/requests", port))
    }
}

#[async_trait]
impl ServiceContainer for MockEndpointContainer {
    fn hostname(&self) -> &str {
        &self.config.hostname
    }

    async fn start_using(&mut self, network: &ContainerNetwork) -> Result<()> {
        let mut spec = ContainerSpec::new(IMAGE, &self.config.hostname, self.config.port);
        for mapping in &self.config.mapping_files {
            let file_name = mapping
                .file_name()
                .ok_or_else(|| {
                    FixtureError::FileStaging(format!(
                        "mapping path has no file name: {}",
                        mapping.display()
                    ))
                })?
                .to_string_lossy();
            let target = format!("{}/{}", MAPPINGS_DIR, file_name);
            spec = spec.staged_file(mapping, &target);
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
