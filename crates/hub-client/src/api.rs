use async_trait::async_trait;

use hub_model::{PropertySet, Slot, TaskId, WorkerId};

use crate::context::{CallContext, CallStats};
use crate::error::ClientError;
use crate::logs::TaskLogStream;
use crate::proto;

/// Capabilities both hub facades provide.
///
/// Every method derives a bounded context from `ctx`, issues exactly one
/// remote call and returns the hub's reply or status untouched.
#[async_trait]
pub trait HubApi: Send + Sync {
    async fn status(&self, ctx: &CallContext) -> Result<proto::HubStatusReply, ClientError>;

    /// Workers known to the hub, with the tasks each one runs.
    async fn worker_list(&self, ctx: &CallContext) -> Result<proto::ListReply, ClientError>;

    async fn worker_info(
        &self,
        ctx: &CallContext,
        id: &WorkerId,
    ) -> Result<proto::InfoReply, ClientError>;

    async fn worker_properties(
        &self,
        ctx: &CallContext,
        id: &WorkerId,
    ) -> Result<proto::GetWorkerPropertiesReply, ClientError>;

    /// Replace the worker's properties with `properties`.
    async fn set_worker_properties(
        &self,
        ctx: &CallContext,
        id: &WorkerId,
        properties: PropertySet,
    ) -> Result<proto::Empty, ClientError>;

    /// Slots (ask plans) the worker currently offers.
    async fn ask_plans(
        &self,
        ctx: &CallContext,
        id: &WorkerId,
    ) -> Result<proto::GetSlotsReply, ClientError>;

    async fn create_ask_plan(
        &self,
        ctx: &CallContext,
        id: &WorkerId,
        slot: &Slot,
    ) -> Result<proto::Empty, ClientError>;

    async fn task_status(
        &self,
        ctx: &CallContext,
        id: &TaskId,
    ) -> Result<proto::TaskStatusReply, ClientError>;

    /// Bounded contexts acquired and released so far by this facade.
    fn call_stats(&self) -> CallStats;
}

/// Direct `Hub` service operations, including task execution control.
#[async_trait]
pub trait CliInteractor: HubApi {
    async fn ping(&self, ctx: &CallContext) -> Result<proto::PingReply, ClientError>;

    /// Status of every task running on `worker`.
    async fn worker_tasks(
        &self,
        ctx: &CallContext,
        worker: &WorkerId,
    ) -> Result<proto::StatusMapReply, ClientError>;

    async fn task_start(
        &self,
        ctx: &CallContext,
        request: proto::HubStartTaskRequest,
    ) -> Result<proto::HubStartTaskReply, ClientError>;

    async fn task_stop(&self, ctx: &CallContext, id: &TaskId)
    -> Result<proto::Empty, ClientError>;

    /// Open a log stream. Only `ctx` bounds it, not the facade timeout.
    async fn task_logs(
        &self,
        ctx: &CallContext,
        request: proto::TaskLogsRequest,
    ) -> Result<TaskLogStream, ClientError>;
}

/// `HubManagement` operations: worker registration and plan administration.
///
/// Tasks cannot be started or stopped from here; that stays on [`CliInteractor`].
#[async_trait]
pub trait NodeHubInteractor: HubApi {
    async fn registered_workers(
        &self,
        ctx: &CallContext,
    ) -> Result<proto::GetRegisteredWorkersReply, ClientError>;

    async fn register_worker(
        &self,
        ctx: &CallContext,
        id: &WorkerId,
    ) -> Result<proto::Empty, ClientError>;

    async fn unregister_worker(
        &self,
        ctx: &CallContext,
        id: &WorkerId,
    ) -> Result<proto::Empty, ClientError>;

    /// Remove the ask plan with the given plan id.
    async fn remove_ask_plan(&self, ctx: &CallContext, id: &str)
    -> Result<proto::Empty, ClientError>;

    /// All tasks on the hub, grouped by worker.
    async fn task_list(&self, ctx: &CallContext) -> Result<proto::TaskListReply, ClientError>;
}
