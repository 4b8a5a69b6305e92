//! Container network orchestrator
//!
//! Holds an ordered collection of service containers, owns the shared
//! network, and drives the aggregate start/stop lifecycle: create the
//! network, start each container in registration order (fail-fast, with
//! optional readiness pacing), and tear everything down best-effort.
//!
//! Single-shot lifecycle: a caller needing a fresh network constructs a new
//! orchestrator. Operations must not be invoked concurrently; scheduling is
//! strictly sequential by design so test ordering stays reproducible.

use crate::clock::{Clock, SystemClock};
use crate::container::ServiceContainer;
use crate::docker::{BollardEngine, DockerEngine};
use crate::error::{FixtureError, Result};
use crate::network::ContainerNetwork;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Orchestrator lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorState {
    /// No start attempted yet
    Unstarted,
    /// Network created, containers starting
    Starting,
    /// Every container started
    Running,
    /// Teardown in progress
    Stopping,
    /// Teardown finished
    Stopped,
    /// A container failed to start; only teardown is possible
    Failed,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorState::Unstarted => write!(f, "unstarted"),
            OrchestratorState::Starting => write!(f, "starting"),
            OrchestratorState::Running => write!(f, "running"),
            OrchestratorState::Stopping => write!(f, "stopping"),
            OrchestratorState::Stopped => write!(f, "stopped"),
            OrchestratorState::Failed => write!(f, "failed"),
        }
    }
}

/// Bounded readiness polling between container starts
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReadinessProbe {
    /// Pause between probe attempts
    pub interval: Duration,
    /// Attempts before the start is treated as a composition failure
    pub max_attempts: u32,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 20,
        }
    }
}

/// Pacing applied between consecutive container starts
enum Pacing {
    /// Start the next container immediately
    None,
    /// Fixed sleep between starts; compatibility mode, trades robustness
    /// under slow infrastructure for deterministic test timing
    FixedDelay(Duration),
    /// Poll each container's readiness signal before starting the next
    Probe(ReadinessProbe),
}

/// Orchestrates a fixed set of service containers on one shared network
pub struct NetworkOrchestrator {
    engine: Arc<dyn DockerEngine>,
    clock: Arc<dyn Clock>,
    containers: Vec<Box<dyn ServiceContainer>>,
    network: Option<ContainerNetwork>,
    state: OrchestratorState,
}

impl NetworkOrchestrator {
    /// Create an orchestrator against the local Docker daemon
    pub fn new() -> Result<Self> {
        let engine = BollardEngine::connect()?;
        Ok(Self::with_engine(Arc::new(engine)))
    }

    /// Create an orchestrator against an explicit engine
    pub fn with_engine(engine: Arc<dyn DockerEngine>) -> Self {
        Self {
            engine,
            clock: Arc::new(SystemClock),
            containers: Vec::new(),
            network: None,
            state: OrchestratorState::Unstarted,
        }
    }

    /// Replace the clock used for startup pacing
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a container. Insertion order is startup order.
    pub fn register(&mut self, container: impl ServiceContainer + 'static) -> &mut Self {
        self.containers.push(Box::new(container));
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Look up a registered container by its network hostname, for reading
    /// mapped ports and logs after startup.
    pub fn container(&self, hostname: &str) -> Option<&dyn ServiceContainer> {
        self.containers
            .iter()
            .find(|container| container.hostname() == hostname)
            .map(|container| container.as_ref())
    }

    /// Create the network and start every registered container in
    /// registration order, back to back.
    pub async fn start(&mut self) -> Result<()> {
        self.start_paced(Pacing::None).await
    }

    /// As [`start`](Self::start), sleeping `delay` between consecutive
    /// container starts so slower services can reach a serving state before
    /// a dependent container uses them. N containers incur N-1 pauses.
    pub async fn start_with_delay(&mut self, delay: Duration) -> Result<()> {
        self.start_paced(Pacing::FixedDelay(delay)).await
    }

    /// As [`start`](Self::start), polling each container's readiness signal
    /// with bounded retries before starting the next.
    pub async fn start_with_readiness(&mut self, probe: ReadinessProbe) -> Result<()> {
        self.start_paced(Pacing::Probe(probe)).await
    }

    async fn start_paced(&mut self, pacing: Pacing) -> Result<()> {
        if self.state != OrchestratorState::Unstarted {
            return Err(FixtureError::InvalidState(format!(
                "start called in state {}; the lifecycle is single-shot",
                self.state
            )));
        }
        self.state = OrchestratorState::Starting;

        // The network must exist before any container starts, and must be
        // held even if a later start fails so teardown can remove it.
        let network = match ContainerNetwork::create(Arc::clone(&self.engine)).await {
            Ok(network) => network,
            Err(err) => {
                self.state = OrchestratorState::Failed;
                return Err(err);
            }
        };
        self.network = Some(network.clone());

        let total = self.containers.len();
        for index in 0..total {
            if index > 0 {
                if let Pacing::FixedDelay(delay) = pacing {
                    self.clock.sleep(delay).await;
                }
            }

            let container = &mut self.containers[index];
            tracing::info!(
                "Starting container {} ({}/{})",
                container.hostname(),
                index + 1,
                total
            );
            if let Err(err) = container.start_using(&network).await {
                // Fail fast: a half-formed network cannot safely host the
                // dependent containers, so none of the rest are started.
                tracing::error!(
                    "Container {} failed to start: {}",
                    container.hostname(),
                    err
                );
                self.state = OrchestratorState::Failed;
                return Err(err);
            }

            if let Pacing::Probe(probe) = &pacing {
                if let Err(err) = wait_ready(self.containers[index].as_ref(), probe, &self.clock).await
                {
                    self.state = OrchestratorState::Failed;
                    return Err(err);
                }
            }
        }

        self.state = OrchestratorState::Running;
        tracing::info!("Container network running with {} containers", total);
        Ok(())
    }

    /// Stop every registered container and remove the network.
    ///
    /// Best-effort, non-short-circuiting: every container gets a stop
    /// attempt regardless of earlier failures, and the network is removed
    /// only after all attempts. Failures are collected into a single
    /// aggregate error. A second call after a completed teardown is a
    /// no-op; calling before any start is a usage error.
    pub async fn stop(&mut self) -> Result<()> {
        match self.state {
            OrchestratorState::Unstarted => {
                return Err(FixtureError::NotRunning(
                    "stop called before start".to_string(),
                ));
            }
            OrchestratorState::Stopped => return Ok(()),
            _ => {}
        }
        self.state = OrchestratorState::Stopping;

        let mut failures = Vec::new();
        for container in &mut self.containers {
            if let Err(err) = container.stop().await {
                tracing::warn!("Failed to stop container {}: {}", container.hostname(), err);
                failures.push(format!("{}: {}", container.hostname(), err));
            }
        }

        if let Some(network) = self.network.take() {
            if let Err(err) = network.remove().await {
                tracing::warn!("Failed to remove network {}: {}", network.name(), err);
                failures.push(format!("network {}: {}", network.name(), err));
            }
        }

        self.state = OrchestratorState::Stopped;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(FixtureError::Teardown { failures })
        }
    }
}

/// Poll a container's readiness signal with bounded attempts
async fn wait_ready(
    container: &dyn ServiceContainer,
    probe: &ReadinessProbe,
    clock: &Arc<dyn Clock>,
) -> Result<()> {
    for attempt in 1..=probe.max_attempts {
        if container.ready().await {
            tracing::debug!(
                "Container {} ready after {} probe attempt(s)",
                container.hostname(),
                attempt
            );
            return Ok(());
        }
        if attempt < probe.max_attempts {
            clock.sleep(probe.interval).await;
        }
    }
    Err(FixtureError::ReadinessTimeout {
        container: container.hostname().to_string(),
        attempts: probe.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FakeClock;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    type EventLog = Arc<Mutex<Vec<String>>>;

    fn push(log: &EventLog, event: String) {
        log.lock().unwrap().push(event);
    }

    /// Engine fake recording only network lifecycle; the orchestrator never
    /// touches containers directly.
    struct NetworkOnlyEngine {
        log: EventLog,
        fail_network_create: bool,
    }

    impl NetworkOnlyEngine {
        fn new(log: EventLog) -> Self {
            Self {
                log,
                fail_network_create: false,
            }
        }
    }

    #[async_trait]
    impl DockerEngine for NetworkOnlyEngine {
        async fn create_network(&self, _name: &str) -> Result<()> {
            if self.fail_network_create {
                return Err(FixtureError::Network("injected network failure".into()));
            }
            push(&self.log, "network.create".to_string());
            Ok(())
        }

        async fn remove_network(&self, _name: &str) -> Result<()> {
            push(&self.log, "network.remove".to_string());
            Ok(())
        }

        async fn create_container(
            &self,
            _spec: &crate::container::ContainerSpec,
            _network: &str,
        ) -> Result<String> {
            unreachable!("orchestrator drives containers through the contract")
        }

        async fn start_container(&self, _id: &str) -> Result<()> {
            unreachable!()
        }

        async fn stop_container(&self, _id: &str) -> Result<()> {
            unreachable!()
        }

        async fn remove_container(&self, _id: &str) -> Result<()> {
            unreachable!()
        }

        async fn copy_to_container(
            &self,
            _id: &str,
            _file: &crate::container::StagedFile,
        ) -> Result<()> {
            unreachable!()
        }

        async fn container_logs(&self, _id: &str) -> Result<String> {
            unreachable!()
        }

        async fn mapped_port(&self, _id: &str, _internal_port: u16) -> Result<u16> {
            unreachable!()
        }
    }

    struct FakeContainer {
        name: String,
        log: EventLog,
        fail_start: bool,
        fail_stop: bool,
        started: bool,
        ready_after: u32,
        ready_polls: AtomicU32,
    }

    impl FakeContainer {
        fn new(name: &str, log: EventLog) -> Self {
            Self {
                name: name.to_string(),
                log,
                fail_start: false,
                fail_stop: false,
                started: false,
                ready_after: 0,
                ready_polls: AtomicU32::new(0),
            }
        }

        fn failing_start(mut self) -> Self {
            self.fail_start = true;
            self
        }

        fn failing_stop(mut self) -> Self {
            self.fail_stop = true;
            self
        }

        fn ready_after(mut self, polls: u32) -> Self {
            self.ready_after = polls;
            self
        }
    }

    #[async_trait]
    impl ServiceContainer for FakeContainer {
        fn hostname(&self) -> &str {
            &self.name
        }

        async fn start_using(&mut self, _network: &ContainerNetwork) -> Result<()> {
            push(&self.log, format!("start:{}", self.name));
            if self.fail_start {
                return Err(FixtureError::ContainerStart {
                    container: self.name.clone(),
                    message: "injected".to_string(),
                });
            }
            self.started = true;
            Ok(())
        }

        fn mapped_port(&self) -> Result<u16> {
            if self.started {
                Ok(4242)
            } else {
                Err(FixtureError::NotStarted(self.name.clone()))
            }
        }

        async fn log(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn stop(&mut self) -> Result<()> {
            push(&self.log, format!("stop:{}", self.name));
            if self.fail_stop {
                return Err(FixtureError::Network("injected stop failure".into()));
            }
            Ok(())
        }

        async fn ready(&self) -> bool {
            let polls = self.ready_polls.fetch_add(1, Ordering::SeqCst) + 1;
            polls > self.ready_after
        }
    }

    fn orchestrator_with_log(log: &EventLog) -> NetworkOrchestrator {
        NetworkOrchestrator::with_engine(Arc::new(NetworkOnlyEngine::new(log.clone())))
    }

    #[tokio::test]
    async fn test_start_runs_containers_in_registration_order() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator
            .register(FakeContainer::new("a", log.clone()))
            .register(FakeContainer::new("b", log.clone()))
            .register(FakeContainer::new("c", log.clone()));

        orchestrator.start().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["network.create", "start:a", "start:b", "start:c"]
        );
        assert_eq!(orchestrator.state(), OrchestratorState::Running);
    }

    #[tokio::test]
    async fn test_stop_covers_every_container_then_removes_network() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator
            .register(FakeContainer::new("a", log.clone()))
            .register(FakeContainer::new("b", log.clone()));

        orchestrator.start().await.unwrap();
        orchestrator.stop().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "network.create",
                "start:a",
                "start:b",
                "stop:a",
                "stop:b",
                "network.remove"
            ]
        );
        assert_eq!(orchestrator.state(), OrchestratorState::Stopped);
    }

    #[tokio::test]
    async fn test_start_with_delay_pauses_between_containers() {
        let log: EventLog = Default::default();
        let clock = FakeClock::new();
        let mut orchestrator = orchestrator_with_log(&log).with_clock(Arc::new(clock.clone()));
        orchestrator
            .register(FakeContainer::new("a", log.clone()))
            .register(FakeContainer::new("b", log.clone()))
            .register(FakeContainer::new("c", log.clone()));

        let delay = Duration::from_secs(2);
        orchestrator.start_with_delay(delay).await.unwrap();

        // N containers, N-1 pauses
        assert_eq!(clock.sleeps(), vec![delay, delay]);
        assert_eq!(clock.total_slept(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_failed_start_aborts_remaining_containers() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator
            .register(FakeContainer::new("a", log.clone()))
            .register(FakeContainer::new("b", log.clone()).failing_start())
            .register(FakeContainer::new("c", log.clone()));

        let result = orchestrator.start().await;

        assert!(matches!(
            result,
            Err(FixtureError::ContainerStart { ref container, .. }) if container == "b"
        ));
        assert_eq!(orchestrator.state(), OrchestratorState::Failed);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["network.create", "start:a", "start:b"]
        );

        // Cleanup still covers the started prefix and removes the network
        let teardown = orchestrator.stop().await;
        assert!(teardown.is_ok());
        let events = log.lock().unwrap().clone();
        assert!(events.contains(&"stop:a".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("network.remove"));
    }

    #[tokio::test]
    async fn test_stop_aggregates_failures_without_short_circuiting() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator
            .register(FakeContainer::new("a", log.clone()))
            .register(FakeContainer::new("b", log.clone()).failing_stop())
            .register(FakeContainer::new("c", log.clone()));

        orchestrator.start().await.unwrap();
        let result = orchestrator.stop().await;

        let Err(FixtureError::Teardown { failures }) = result else {
            panic!("expected aggregate teardown error");
        };
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("b:"));

        // Every container was attempted and the network was still removed
        let events = log.lock().unwrap().clone();
        assert!(events.contains(&"stop:a".to_string()));
        assert!(events.contains(&"stop:b".to_string()));
        assert!(events.contains(&"stop:c".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("network.remove"));
    }

    #[tokio::test]
    async fn test_stop_before_start_is_usage_error() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator.register(FakeContainer::new("a", log.clone()));

        assert!(matches!(
            orchestrator.stop().await,
            Err(FixtureError::NotRunning(_))
        ));
    }

    #[tokio::test]
    async fn test_second_stop_is_noop() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator.register(FakeContainer::new("a", log.clone()));

        orchestrator.start().await.unwrap();
        orchestrator.stop().await.unwrap();
        let before = log.lock().unwrap().len();

        orchestrator.stop().await.unwrap();
        assert_eq!(log.lock().unwrap().len(), before);
        assert_eq!(orchestrator.state(), OrchestratorState::Stopped);
    }

    #[tokio::test]
    async fn test_container_lookup_by_hostname() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator
            .register(FakeContainer::new("a", log.clone()))
            .register(FakeContainer::new("b", log.clone()));

        orchestrator.start().await.unwrap();

        let found = orchestrator.container("b").unwrap();
        assert_eq!(found.mapped_port().unwrap(), 4242);
        assert!(orchestrator.container("missing").is_none());
    }

    #[tokio::test]
    async fn test_second_start_is_usage_error() {
        let log: EventLog = Default::default();
        let mut orchestrator = orchestrator_with_log(&log);
        orchestrator.register(FakeContainer::new("a", log.clone()));

        orchestrator.start().await.unwrap();
        assert!(matches!(
            orchestrator.start().await,
            Err(FixtureError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_readiness_probe_polls_until_ready() {
        let log: EventLog = Default::default();
        let clock = FakeClock::new();
        let mut orchestrator = orchestrator_with_log(&log).with_clock(Arc::new(clock.clone()));
        orchestrator
            .register(FakeContainer::new("a", log.clone()).ready_after(3))
            .register(FakeContainer::new("b", log.clone()));

        let probe = ReadinessProbe {
            interval: Duration::from_millis(100),
            max_attempts: 5,
        };
        orchestrator.start_with_readiness(probe).await.unwrap();

        // Three failed polls before ready, each followed by one interval
        assert_eq!(clock.sleeps().len(), 3);
        assert_eq!(orchestrator.state(), OrchestratorState::Running);
    }

    #[tokio::test]
    async fn test_readiness_probe_exhaustion_fails_startup() {
        let log: EventLog = Default::default();
        let clock = FakeClock::new();
        let mut orchestrator = orchestrator_with_log(&log).with_clock(Arc::new(clock.clone()));
        orchestrator
            .register(FakeContainer::new("a", log.clone()).ready_after(10))
            .register(FakeContainer::new("b", log.clone()));

        let probe = ReadinessProbe {
            interval: Duration::from_millis(100),
            max_attempts: 3,
        };
        let result = orchestrator.start_with_readiness(probe).await;

        assert!(matches!(
            result,
            Err(FixtureError::ReadinessTimeout { ref container, attempts: 3 }) if container == "a"
        ));
        assert_eq!(orchestrator.state(), OrchestratorState::Failed);
        // The dependent container was never started
        assert!(!log.lock().unwrap().contains(&"start:b".to_string()));
    }

    #[tokio::test]
    async fn test_staging_failure_aborts_subsequent_adapters() {
        use crate::docker::engine::test_support::RecordingEngine;
        use crate::services::{QueueConfig, QueueContainer, TableConfig, TableContainer};
        use std::path::Path;

        let engine = Arc::new(RecordingEngine::new());
        engine.fail_copy_for("/opt/elasticmq.conf");

        let mut orchestrator = NetworkOrchestrator::with_engine(engine.clone());
        orchestrator
            .register(QueueContainer::new(QueueConfig {
                config_file: Some(Path::new("/nonexistent/elasticmq.conf").to_path_buf()),
                ..Default::default()
            }))
            .register(TableContainer::new(TableConfig::default()));

        let result = orchestrator.start().await;

        assert!(matches!(result, Err(FixtureError::FileStaging(_))));
        assert_eq!(orchestrator.state(), OrchestratorState::Failed);
        assert!(!engine
            .events()
            .iter()
            .any(|event| event.starts_with("container.create:table")));
    }

    #[tokio::test]
    async fn test_network_failure_fails_startup_before_any_container() {
        let log: EventLog = Default::default();
        let engine = NetworkOnlyEngine {
            log: log.clone(),
            fail_network_create: true,
        };
        let mut orchestrator = NetworkOrchestrator::with_engine(Arc::new(engine));
        orchestrator.register(FakeContainer::new("a", log.clone()));

        assert!(orchestrator.start().await.is_err());
        assert_eq!(orchestrator.state(), OrchestratorState::Failed);
        assert!(log.lock().unwrap().is_empty());
    }
}
