//! Per-service adapters
//!
//! Each adapter pairs a configuration struct with a
//! [`ServiceContainer`](crate::container::ServiceContainer) implementation.
//! Adapters differ only in image, default internal port, staged
//! configuration files, and (for the function under test) the environment
//! map that tells it where the other services live.

pub mod function;
pub mod mock_endpoint;
pub mod pubsub;
pub mod queue;
pub mod table;

pub use function::{FunctionConfig, FunctionContainer};
pub use mock_endpoint::{MockEndpointConfig, MockEndpointContainer};
pub use pubsub::{PubSubConfig, PubSubContainer};
pub use queue::{QueueConfig, QueueContainer};
pub use table::{TableConfig, TableContainer};
