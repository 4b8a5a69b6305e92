//! Docker Engine API seam
//!
//! [`DockerEngine`] narrows the Docker Engine API down to the operations the
//! fixture actually needs: network create/remove, container lifecycle, file
//! staging, log snapshots and mapped-port resolution. [`BollardEngine`] is
//! the production implementation; tests substitute an in-memory fake.

use crate::container::{ContainerSpec, StagedFile};
use crate::error::{FixtureError, Result};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, NetworkingConfig,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
    UploadToContainerOptions,
};
use bollard::models::{EndpointSettings, HostConfig, PortBinding};
use bollard::network::CreateNetworkOptions;
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;

/// Subset of the Docker Engine API consumed by the fixture
#[async_trait]
pub trait DockerEngine: Send + Sync {
    /// Create a named bridge network
    async fn create_network(&self, name: &str) -> Result<()>;

    /// Remove a network by name
    async fn remove_network(&self, name: &str) -> Result<()>;

    /// Create a container from a spec, attached to the given network with
    /// its hostname as alias. Returns the container ID.
    async fn create_container(&self, spec: &ContainerSpec, network: &str) -> Result<String>;

    /// Start a created container
    async fn start_container(&self, id: &str) -> Result<()>;

    /// Stop a container; already-stopped and missing containers are no-ops
    async fn stop_container(&self, id: &str) -> Result<()>;

    /// Remove a container; missing containers are no-ops
    async fn remove_container(&self, id: &str) -> Result<()>;

    /// Stage a file from the host into the container filesystem
    async fn copy_to_container(&self, id: &str, file: &StagedFile) -> Result<()>;

    /// Snapshot of the container's accumulated stdout/stderr
    async fn container_logs(&self, id: &str) -> Result<String>;

    /// Resolve the host port mapped to an internal tcp port
    async fn mapped_port(&self, id: &str, internal_port: u16) -> Result<u16>;
}

/// Production engine backed by bollard
pub struct BollardEngine {
    docker: Docker,
}

impl BollardEngine {
    /// Connect to the local Docker daemon
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

/// Stops and removals tolerate already-gone resources
fn is_gone(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 304 | 404,
            ..
        }
    )
}

/// Build an in-memory tar archive holding a single file at `target`
fn tar_single_file(target: &str, contents: &[u8]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o555);
    header.set_cksum();
    builder.append_data(&mut header, target.trim_start_matches('/'), contents)?;
    Ok(builder.into_inner()?)
}

#[async_trait]
impl DockerEngine for BollardEngine {
    async fn create_network(&self, name: &str) -> Result<()> {
        let options = CreateNetworkOptions {
            name: name.to_string(),
            driver: "bridge".to_string(),
            check_duplicate: true,
            ..Default::default()
        };
        self.docker.create_network(options).await?;
        tracing::debug!("Created network {}", name);
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> Result<()> {
        match self.docker.remove_network(name).await {
            Ok(()) => Ok(()),
            Err(err) if is_gone(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn create_container(&self, spec: &ContainerSpec, network: &str) -> Result<String> {
        let port_key = format!("{}/tcp", spec.internal_port);

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key.clone(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                // Dynamic host port
                host_port: Some("0".to_string()),
            }]),
        );

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(port_key, HashMap::new());

        let mut endpoints_config = HashMap::new();
        endpoints_config.insert(
            network.to_string(),
            EndpointSettings {
                aliases: Some(vec![spec.hostname.clone()]),
                ..Default::default()
            },
        );

        let env: Vec<String> = spec
            .env
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();

        let config = Config {
            image: Some(spec.image.clone()),
            hostname: Some(spec.hostname.clone()),
            env: Some(env),
            cmd: spec.cmd.clone(),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                network_mode: Some(network.to_string()),
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            networking_config: Some(NetworkingConfig { endpoints_config }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.hostname.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|err| FixtureError::ContainerCreate {
                container: spec.hostname.clone(),
                message: err.to_string(),
            })?;

        tracing::debug!("Created container {} ({})", spec.hostname, response.id);
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        let options = StopContainerOptions { t: 10 };
        match self.docker.stop_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(err) if is_gone(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(err) if is_gone(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn copy_to_container(&self, id: &str, file: &StagedFile) -> Result<()> {
        let contents = std::fs::read(&file.source).map_err(|err| {
            FixtureError::FileStaging(format!(
                "reading {}: {}",
                file.source.display(),
                err
            ))
        })?;
        let archive = tar_single_file(&file.target, &contents)?;

        let options = UploadToContainerOptions {
            path: "/".to_string(),
            ..Default::default()
        };
        self.docker
            .upload_to_container(id, Some(options), archive.into())
            .await
            .map_err(|err| {
                FixtureError::FileStaging(format!(
                    "uploading {} to {}: {}",
                    file.source.display(),
                    file.target,
                    err
                ))
            })?;

        tracing::debug!("Staged {} into container {}", file.target, id);
        Ok(())
    }

    async fn container_logs(&self, id: &str) -> Result<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut output = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk? {
                LogOutput::StdOut { message }
                | LogOutput::StdErr { message }
                | LogOutput::Console { message } => {
                    output.push_str(&String::from_utf8_lossy(&message));
                }
                LogOutput::StdIn { .. } => {}
            }
        }
        Ok(output)
    }

    async fn mapped_port(&self, id: &str, internal_port: u16) -> Result<u16> {
        let inspect = self.docker.inspect_container(id, None).await?;
        let key = format!("{}/tcp", internal_port);

        inspect
            .network_settings
            .and_then(|settings| settings.ports)
            .and_then(|ports| ports.get(&key).cloned())
            .flatten()
            .and_then(|bindings| bindings.into_iter().find_map(|binding| binding.host_port))
            .and_then(|port| port.parse().ok())
            .ok_or_else(|| FixtureError::PortResolution {
                container: id.to_string(),
                port: internal_port,
            })
    }
}
