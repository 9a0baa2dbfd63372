//! Deadline-scoped gRPC client for the hub.
//!
//! Two facades share one calling convention: [`GrpcInteractor`] talks to the
//! `Hub` service and controls task execution, [`HubInteractor`] talks to
//! `HubManagement` and administers workers and ask plans. Both implement
//! [`HubApi`], so code that only needs the common capabilities can take an
//! `Arc<dyn HubApi>` built by [`connect`].

use std::sync::Arc;

pub mod proto {
    tonic::include_proto!("hub.v1");
}

mod api;
pub use api::{CliInteractor, HubApi, NodeHubInteractor};

mod config;
pub use config::{ClientConfig, ConfigError, DEFAULT_MANAGEMENT_TIMEOUT};

pub mod connection;

mod context;
pub use context::{CallContext, CallGuard, CallLedger, CallStats};

mod convert;

mod direct;
pub use direct::GrpcInteractor;

mod error;
pub use error::ClientError;

mod logs;
pub use logs::TaskLogStream;

mod management;
pub use management::HubInteractor;

pub use hub_model;
pub use tonic;
pub use tokio_util::sync::CancellationToken;

/// Which hub service a facade should talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Direct,
    Management,
}

/// Build the facade for `backend` behind the shared capability interface.
pub fn connect(backend: Backend, cfg: &ClientConfig) -> Result<Arc<dyn HubApi>, ClientError> {
    let api: Arc<dyn HubApi> = match backend {
        Backend::Direct => Arc::new(GrpcInteractor::from_config(cfg)?),
        Backend::Management => Arc::new(HubInteractor::connect(cfg)?),
    };
    Ok(api)
}
