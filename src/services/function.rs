//! Function under test (Lambda runtime interface emulator)
//!
//! Unlike the service doubles, this adapter needs the resolved addresses of
//! every other service as environment input. Hostnames on the shared
//! network are static, so the caller can compose those addresses at
//! configuration time without any container running yet.

use crate::container::{ContainerHandle, ContainerSpec, ServiceContainer};
use crate::error::Result;
use crate::network::ContainerNetwork;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const IMAGE: &str = "public.ecr.aws/lambda/provided:al2023";
const DEFAULT_PORT: u16 = 8080;
const BOOTSTRAP_TARGET: &str = "/var/runtime/bootstrap";

/// Runtime-agnostic invocation path of the runtime interface emulator
pub const INVOCATION_PATH: &str = "/2015-03-31/functions/function/invocations";

/// Function container configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Hostname on the shared network
    pub hostname: String,
    /// Internal invocation port
    pub port: u16,
    /// Compiled function executable, staged as the runtime bootstrap
    pub executable: PathBuf,
    /// Environment handed to the function, typically the other services'
    /// on-network addresses. Opaque to the orchestrator.
    pub environment: HashMap<String, String>,
}

impl FunctionConfig {
    /// Configuration for an executable with default hostname and port
    pub fn new(executable: PathBuf) -> Self {
        Self {
            hostname: "function".to_string(),
            port: DEFAULT_PORT,
            executable,
            environment: HashMap::new(),
        }
    }
}

/// The function under test
pub struct FunctionContainer {
    config: FunctionConfig,
    handle: ContainerHandle,
}

impl FunctionContainer {
    /// Create a function adapter from its configuration
    pub fn new(config: FunctionConfig) -> Self {
        Self {
            config,
            handle: ContainerHandle::new(),
        }
    }

    /// Host-visible URL the test posts trigger events to. Valid only after
    /// start.
    pub fn invocation_url(&self) -> Result<String> {
        let port = self.handle.mapped_port()?;
        Ok(format!("http://localhost:{}{}", port, INVOCATION_PATH))
    }
}

#[async_trait]
impl ServiceContainer for FunctionContainer {
    fn hostname(&self) -> &str {
        &self.config.hostname
    }

    async fn start_using(&mut self, network: &ContainerNetwork) -> Result<()> {
        let spec = ContainerSpec::new(IMAGE, &self.config.hostname, self.config.port)
            .env_map(&self.config.environment)
            .staged_file(&self.config.executable, BOOTSTRAP_TARGET)
            .cmd(vec![BOOTSTRAP_TARGET.to_string()]);
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
