//! Container specification

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A host file staged into the container filesystem before start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedFile {
    /// Path on the host
    pub source: PathBuf,
    /// Absolute path inside the container
    pub target: String,
}

/// Container specification built by a service adapter
///
/// Immutable once the adapter starts: the builder methods consume and
/// return the spec, and adapters hand it to the engine by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image reference
    pub image: String,
    /// Hostname, also used as the network alias
    pub hostname: String,
    /// Internal tcp port the service listens on
    pub internal_port: u16,
    /// Environment variables
    pub env: HashMap<String, String>,
    /// Files staged into the container before start
    pub staged_files: Vec<StagedFile>,
    /// Command override
    pub cmd: Option<Vec<String>>,
}

impl ContainerSpec {
    /// Create a new container specification
    pub fn new(image: &str, hostname: &str, internal_port: u16) -> Self {
        Self {
            image: image.to_string(),
            hostname: hostname.to_string(),
            internal_port,
            env: HashMap::new(),
            staged_files: Vec::new(),
            cmd: None,
        }
    }

    /// Add an environment variable
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a whole environment variable map
    pub fn env_map(mut self, env: &HashMap<String, String>) -> Self {
        for (key, value) in env {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Stage a host file into the container at the given absolute path
    pub fn staged_file(mut self, source: &Path, target: &str) -> Self {
        self.staged_files.push(StagedFile {
            source: source.to_path_buf(),
            target: target.to_string(),
        });
        self
    }

    /// Set the command override
    pub fn cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = Some(cmd);
        self
    }
}
