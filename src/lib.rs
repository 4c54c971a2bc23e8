//! Client-side HTTP load balancing: pluggable server discovery, health
//! probing and selection rules in front of a retrying HTTP dispatcher.
//!
//! The three collaborators an embedder plugs together are a
//! [`discovery::Discovery`] source, a [`probe::Prober`], and a
//! [`rule::SelectionRule`]; a [`pool::PoolManager`] owns the live set
//! they produce, and a [`service::Service`] dispatches requests against
//! it.

pub mod backend;
pub mod discovery;
pub mod error;
pub mod http_transport;
pub mod pool;
pub mod probe;
pub mod probe_strategy;
pub mod rule;
pub mod service;
pub mod url_builder;

pub use backend::Backend;
pub use error::{ConfigurationError, DiscoveryError, NoReachableServers, ServiceError, TransportError};
pub use pool::PoolManager;
pub use service::{Service, ServiceConfig, Source};
