use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::Channel;
use tracing::debug;

use hub_model::{PropertySet, Slot, TaskId, WorkerId};

use crate::api::{CliInteractor, HubApi};
use crate::config::{ClientConfig, ConfigError};
use crate::connection;
use crate::context::{CallContext, CallScope, CallStats};
use crate::error::ClientError;
use crate::logs::TaskLogStream;
use crate::proto::{self, hub_client::HubClient};

/// Facade over the `Hub` service on a connection it dials itself.
///
/// Cloning shares the connection and the call ledger.
#[derive(Debug, Clone)]
pub struct GrpcInteractor {
    hub: HubClient<Channel>,
    scope: CallScope,
}

impl GrpcInteractor {
    /// Dial `addr` and bound every unary call by `timeout`.
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self, ClientError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout.into());
        }
        let channel = connection::dial(addr, None)?;
        Ok(Self::with_channel(channel, timeout))
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ClientError> {
        cfg.validate()?;
        let channel = connection::dial(&cfg.endpoint, cfg.connect_timeout())?;
        Ok(Self::with_channel(channel, cfg.timeout()))
    }

    /// Use an existing channel, e.g. one shared with other stubs.
    pub fn with_channel(channel: Channel, timeout: Duration) -> Self {
        Self {
            hub: connection::hub_client(channel),
            scope: CallScope::new(timeout),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.scope.timeout()
    }
}

#[async_trait]
impl HubApi for GrpcInteractor {
    async fn status(&self, ctx: &CallContext) -> Result<proto::HubStatusReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("hub_status", ctx, proto::Empty {}, move |req| async move {
                hub.status(req).await
            })
            .await
    }

    async fn worker_list(&self, ctx: &CallContext) -> Result<proto::ListReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("worker_list", ctx, proto::Empty {}, move |req| async move {
                hub.list(req).await
            })
            .await
    }

    async fn worker_info(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::InfoReply, ClientError> {
        debug!(%worker, "requesting worker info");
        let mut hub = self.hub.clone();
        self.scope
            .unary("worker_info", ctx, proto::Id::from(worker), move |req| async move {
                hub.info(req).await
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
                "worker_properties",
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
        debug!(%worker, count = properties.len(), "replacing worker properties");
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
            .unary("worker_slots", ctx, proto::Id::from(worker), move |req| async move {
                hub.get_slots(req).await
            })
            .await
    }

    async fn create_ask_plan(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
        slot: &Slot,
    ) -> Result<proto::Empty, ClientError> {
        let request = proto::AddSlotRequest {
            id: worker.to_string(),
            slot: Some(proto::Slot::from(slot)),
        };
        let mut hub = self.hub.clone();
        self.scope
            .unary("add_worker_slot", ctx, request, move |req| async move {
                hub.add_slot(req).await
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
impl CliInteractor for GrpcInteractor {
    async fn ping(&self, ctx: &CallContext) -> Result<proto::PingReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("hub_ping", ctx, proto::Empty {}, move |req| async move {
                hub.ping(req).await
            })
            .await
    }

    async fn worker_tasks(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::StatusMapReply, ClientError> {
        let mut hub = self.hub.clone();
        self.scope
            .unary("task_list", ctx, proto::Id::from(worker), move |req| async move {
                hub.worker_status(req).await
            })
            .await
    }

    async fn task_start(
        &self,
        ctx: &CallContext,
        request: proto::HubStartTaskRequest,
    ) -> Result<proto::HubStartTaskReply, ClientError> {
        debug!(worker = %request.worker, "starting task");
        let mut hub = self.hub.clone();
        self.scope
            .unary("task_start", ctx, request, move |req| async move {
                hub.start_task(req).await
            })
            .await
    }

    async fn task_stop(
        &self,
        ctx: &CallContext,
        task: &TaskId,
    ) -> Result<proto::Empty, ClientError> {
        debug!(%task, "stopping task");
        let mut hub = self.hub.clone();
        self.scope
            .unary("task_stop", ctx, proto::Id::from(task), move |req| async move {
                hub.stop_task(req).await
            })
            .await
    }

    async fn task_logs(
        &self,
        ctx: &CallContext,
        request: proto::TaskLogsRequest,
    ) -> Result<TaskLogStream, ClientError> {
        let task = request.id.clone();
        debug!(%task, follow = request.follow, "opening task log stream");

        let mut hub = self.hub.clone();
        let request = ctx.request(request);
        let streaming = ctx
            .run("task_logs", async move { hub.task_logs(request).await })
            .await?
            .into_inner();

        Ok(TaskLogStream::new(task, streaming, ctx.clone()))
    }
}
