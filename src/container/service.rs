//! Service container contract
//!
//! The capability set the orchestrator drives. Five structurally different
//! services (HTTP mock, queue, pub/sub broker, table store, function under
//! test) implement it independently; the orchestrator treats them
//! identically for lifecycle purposes while each adapter encapsulates its
//! own wiring.

use crate::error::Result;
use crate::network::ContainerNetwork;
use async_trait::async_trait;

/// Contract implemented by every service adapter
#[async_trait]
pub trait ServiceContainer: Send + Sync {
    /// Hostname the container is reachable under on the shared network
    fn hostname(&self) -> &str;

    /// Build the container specification, attach it to `network` and start
    /// it. At most once per adapter instance; a second call is a usage
    /// error.
    async fn start_using(&mut self, network: &ContainerNetwork) -> Result<()>;

    /// Host-visible port mapped to the internal service port. Valid only
    /// after `start_using` succeeded.
    fn mapped_port(&self) -> Result<u16>;

    /// Snapshot of the container's stdout/stderr at the time of the call
    async fn log(&self) -> Result<String>;

    /// Stop and remove the underlying container. Safe to call even if
    /// `start_using` never completed.
    async fn stop(&mut self) -> Result<()>;

    /// Whether the service is ready to accept traffic. The default probes
    /// the mapped port with a TCP connect.
    async fn ready(&self) -> bool {
        match self.mapped_port() {
            Ok(port) => tcp_port_open(port).await,
            Err(_) => false,
        }
    }
}

/// TCP connect probe against a host-mapped port
pub(crate) async fn tcp_port_open(port: u16) -> bool {
    tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .is_ok()
}
