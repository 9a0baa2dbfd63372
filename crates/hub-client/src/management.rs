use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::Channel;
use tracing::debug;

use hub_model::{PropertySet, Slot, TaskId, WorkerId};

use crate::api::{HubApi, NodeHubInteractor};
use crate::config::{ClientConfig, DEFAULT_MANAGEMENT_TIMEOUT};
use crate::connection;
use crate::context::{CallContext, CallScope, CallStats};
use crate::error::ClientError;
use crate::proto::{self, hub_management_client::HubManagementClient};

/// Facade over a `HubManagement` stub built elsewhere.
#[derive(Debug, Clone)]
pub struct HubInteractor {
    hub: HubManagementClient<Channel>,
    scope: CallScope,
}

impl HubInteractor {
    pub fn new(hub: HubManagementClient<Channel>, timeout: Duration) -> Self {
        Self {
            hub,
            scope: CallScope::new(timeout),
        }
    }

    /// Wrap `hub` with [`DEFAULT_MANAGEMENT_TIMEOUT`].
    pub fn with_default_timeout(hub: HubManagementClient<Channel>) -> Self {
        Self::new(hub, DEFAULT_MANAGEMENT_TIMEOUT)
    }

    /// Dial the configured endpoint and build the compressed stub.
    pub fn connect(cfg: &ClientConfig) -> Result<Self, ClientError> {
        cfg.validate()?;
        let channel = connection::dial(&cfg.endpoint, cfg.connect_timeout())?;
        Ok(Self::new(
            connection::management_client(channel),
            cfg.timeout(),
        ))
    }

    pub fn timeout(&self) -> Duration {
        self.scope.timeout()
    }
}

#[async_trait]
impl HubApi for HubInteractor {
    async fn status(&self, ctx: &CallContext) -> Result<proto::HubStatusReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("status", ctx, proto::Empty {}, move |req| async move {
                hub.status(req).await
            })
            .await
    }

    async fn worker_list(&self, ctx: &CallContext) -> Result<proto::ListReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("workers_list", ctx, proto::Empty {}, move |req| async move {
                hub.workers_list(req).await
            })
            .await
    }

    async fn worker_info(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::InfoReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("worker_status", ctx, proto::Id::from(worker), move |req| async move {
                hub.worker_status(req).await
            })
            .await
    }

    async fn worker_properties(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::GetWorkerPropertiesReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary(
                "get_worker_properties",
                ctx,
                proto::Id::from(worker),
                move |req| async move { hub.get_worker_properties(req).await },
            )
            .await
    }

    async fn set_worker_properties(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
        properties: PropertySet,
    ) -> Result<proto::Empty, ClientError> {
        let request = proto::SetWorkerPropertiesRequest {
            id: worker.to_string(),
            properties: properties.into_map(),
        };
        let mut hub = self.hub.clone();
        self.scope
            .unary("set_worker_properties", ctx, request, move |req| async move {
                hub.set_worker_properties(req).await
            })
            .await
    }

    async fn ask_plans(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::GetSlotsReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("get_ask_plan", ctx, proto::Id::from(worker), move |req| async move {
                hub.get_ask_plan(req).await
            })
            .await
    }

    async fn create_ask_plan(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
        slot: &Slot,
    ) -> Result<proto::Empty, ClientError> {
        debug!(%worker, price = %slot.price, "creating ask plan");
        let request = proto::AddSlotRequest {
            id: worker.to_string(),
            slot: Some(proto::Slot::from(slot)),
        };
        let mut hub = self.hub.clone();
        self.scope
            .unary("create_ask_plan", ctx, request, move |req| async move {
                hub.create_ask_plan(req).await
            })
            .await
    }

    async fn task_status(
        &self,
        ctx: &CallContext,
        task: &TaskId,
    ) -> Result<proto::TaskStatusReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("task_status", ctx, proto::Id::from(task), move |req| async move {
                hub.task_status(req).await
            })
            .await
    }

    fn call_stats(&self) -> CallStats {
        self.scope.stats()
    }
}

#[async_trait]
impl NodeHubInteractor for HubInteractor {
    async fn registered_workers(
        &self,
        ctx: &CallContext,
    ) -> Result<proto::GetRegisteredWorkersReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary(
                "get_registered_workers",
                ctx,
                proto::Empty {},
                move |req| async move { hub.get_registered_workers(req).await },
            )
            .await
    }

    async fn register_worker(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::Empty, ClientError> {
        debug!(%worker, "registering worker");
        let mut hub = self.hub.clone();
        self.scope
            .unary(
                "register_worker",
                ctx,
                proto::Id::from(worker),
                move |req| async move { hub.register_worker(req).await },
            )
            .await
    }

    async fn unregister_worker(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::Empty, ClientError> {
        debug!(%worker, "unregistering worker");
        let mut hub = self.hub.clone();
        self.scope
            .unary(
                "unregister_worker",
                ctx,
                proto::Id::from(worker),
                move |req| async move { hub.unregister_worker(req).await },
            )
            .await
    }

    async fn remove_ask_plan(
        &self,
        ctx: &CallContext,
        plan: &str,
    ) -> Result<proto::Empty, ClientError> {
        debug!(plan, "removing ask plan");
        let mut hub = self.hub.clone();
        self.scope
            .unary("remove_ask_plan", ctx, proto::Id::from(plan), move |req| async move {
                hub.remove_ask_plan(req).await
            })
            .await
    }

    async fn task_list(&self, ctx: &CallContext) -> Result<proto::TaskListReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("task_list", ctx, proto::Empty {}, move |req| async move {
                hub.task_list(req).await
            })
            .await
    }
}
