#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::codec::CompressionEncoding;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use hub_client::proto::{
    self,
    hub_management_server::{HubManagement, HubManagementServer},
    hub_server::{Hub, HubServer},
};

/// Counters and storage shared by both fakes.
#[derive(Default)]
pub struct FakeState {
    /// Remote calls that reached a handler.
    pub calls: AtomicUsize,
    /// Extra latency for every handler except ping.
    pub delay: Mutex<Duration>,
    pub properties: Mutex<HashMap<String, HashMap<String, String>>>,
    pub slots: Mutex<HashMap<String, proto::Slot>>,
    pub plan_owner: Mutex<HashMap<String, String>>,
    pub next_id: AtomicUsize,
    pub tasks: Mutex<HashMap<String, String>>,
    pub registered: Mutex<BTreeSet<String>>,
    /// Chunks a log stream sends before finishing (or idling when following).
    pub log_chunks: AtomicUsize,
    pub log_stream_dropped: AtomicBool,
}

impl FakeState {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn properties_of(&self, id: &str) -> HashMap<String, String> {
        self.properties
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    fn replace_properties(&self, id: String, properties: HashMap<String, String>) {
        self.properties.lock().unwrap().insert(id, properties);
    }

    fn add_plan(&self, worker: String, slot: Option<proto::Slot>) -> Result<String, Status> {
        let slot = slot.ok_or_else(|| Status::invalid_argument("missing slot"))?;
        let plan = self.next_id("plan");
        self.slots.lock().unwrap().insert(plan.clone(), slot);
        self.plan_owner.lock().unwrap().insert(plan.clone(), worker);
        Ok(plan)
    }

    fn plans_of(&self, worker: &str) -> proto::GetSlotsReply {
        let owners = self.plan_owner.lock().unwrap();
        let slots = self.slots.lock().unwrap();
        let slots = owners
            .iter()
            .filter(|(_, owner)| owner.as_str() == worker)
            .filter_map(|(plan, _)| slots.get(plan).map(|s| (plan.clone(), s.clone())))
            .collect();
        proto::GetSlotsReply { slots }
    }

    fn task_status_of(&self, id: &str) -> Result<proto::TaskStatusReply, Status> {
        let tasks = self.tasks.lock().unwrap();
        let image = tasks
            .get(id)
            .ok_or_else(|| Status::not_found(format!("task {id} not found")))?;
        Ok(proto::TaskStatusReply {
            status: proto::TaskState::Running as i32,
            image_name: image.clone(),
            uptime: 42,
            ..Default::default()
        })
    }

    fn hub_status(&self) -> proto::HubStatusReply {
        proto::HubStatusReply {
            worker_count: self.registered.lock().unwrap().len() as u64,
            uptime: 3600,
            version: "0.3.0".to_string(),
            platform: "linux".to_string(),
            eth_addr: "0x0".to_string(),
        }
    }

    fn list_reply(&self) -> proto::ListReply {
        let workers = self
            .registered
            .lock()
            .unwrap()
            .iter()
            .map(|w| (w.clone(), proto::TaskIdList { ids: vec![] }))
            .collect();
        proto::ListReply { workers }
    }
}

#[derive(Clone, Default)]
pub struct FakeHub {
    pub state: Arc<FakeState>,
}

#[tonic::async_trait]
impl Hub for FakeHub {
    async fn ping(&self, _: Request<proto::Empty>) -> Result<Response<proto::PingReply>, Status> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Response::new(proto::PingReply {
            status: "ok".to_string(),
        }))
    }

    async fn status(
        &self,
        _: Request<proto::Empty>,
    ) -> Result<Response<proto::HubStatusReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(self.state.hub_status()))
    }

    async fn list(&self, _: Request<proto::Empty>) -> Result<Response<proto::ListReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(self.state.list_reply()))
    }

    async fn info(&self, req: Request<proto::Id>) -> Result<Response<proto::InfoReply>, Status> {
        self.state.enter().await;
        let id = req.into_inner().id;
        if id.is_empty() {
            return Err(Status::invalid_argument("empty worker id"));
        }
        Ok(Response::new(proto::InfoReply {
            usage: HashMap::new(),
            capabilities: Some(proto::Capabilities {
                cpu_cores: 8,
                memory_bytes: 1 << 34,
                gpus: vec!["rtx".to_string()],
            }),
        }))
    }

    async fn get_worker_properties(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::GetWorkerPropertiesReply>, Status> {
        self.state.enter().await;
        let properties = self.state.properties_of(&req.into_inner().id);
        Ok(Response::new(proto::GetWorkerPropertiesReply { properties }))
    }

    async fn set_worker_properties(
        &self,
        req: Request<proto::SetWorkerPropertiesRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        let req = req.into_inner();
        self.state.replace_properties(req.id, req.properties);
        Ok(Response::new(proto::Empty {}))
    }

    async fn get_slots(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::GetSlotsReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(self.state.plans_of(&req.into_inner().id)))
    }

    async fn add_slot(
        &self,
        req: Request<proto::AddSlotRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        let req = req.into_inner();
        self.state.add_plan(req.id, req.slot)?;
        Ok(Response::new(proto::Empty {}))
    }

    async fn worker_status(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::StatusMapReply>, Status> {
        self.state.enter().await;
        let worker = req.into_inner().id;
        let ids: Vec<String> = self
            .state
            .tasks
            .lock()
            .unwrap()
            .keys()
            .filter(|id| id.starts_with(&worker))
            .cloned()
            .collect();
        let mut statuses = HashMap::new();
        for id in ids {
            statuses.insert(id.clone(), self.state.task_status_of(&id)?);
        }
        Ok(Response::new(proto::StatusMapReply { statuses }))
    }

    async fn start_task(
        &self,
        req: Request<proto::HubStartTaskRequest>,
    ) -> Result<Response<proto::HubStartTaskReply>, Status> {
        self.state.enter().await;
        let req = req.into_inner();
        let spec = req
            .spec
            .ok_or_else(|| Status::invalid_argument("missing task spec"))?;
        let id = self.state.next_id(&req.worker);
        self.state.tasks.lock().unwrap().insert(id.clone(), spec.image);
        Ok(Response::new(proto::HubStartTaskReply {
            id,
            endpoints: vec!["127.0.0.1:8080".to_string()],
        }))
    }

    async fn task_status(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::TaskStatusReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(
            self.state.task_status_of(&req.into_inner().id)?,
        ))
    }

    async fn stop_task(&self, req: Request<proto::Id>) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        let id = req.into_inner().id;
        match self.state.tasks.lock().unwrap().remove(&id) {
            Some(_) => Ok(Response::new(proto::Empty {})),
            None => Err(Status::not_found(format!("task {id} not found"))),
        }
    }

    type TaskLogsStream = ReceiverStream<Result<proto::TaskLogsChunk, Status>>;

    async fn task_logs(
        &self,
        req: Request<proto::TaskLogsRequest>,
    ) -> Result<Response<Self::TaskLogsStream>, Status> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let req = req.into_inner();
        if !self.state.tasks.lock().unwrap().contains_key(&req.id) {
            return Err(Status::not_found(format!("task {} not found", req.id)));
        }

        let chunks = self.state.log_chunks.load(Ordering::SeqCst);
        let state = Arc::clone(&self.state);
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for n in 0..chunks {
                let chunk = proto::TaskLogsChunk {
                    data: format!("line {n}\n").into_bytes(),
                };
                if tx.send(Ok(chunk)).await.is_err() {
                    state.log_stream_dropped.store(true, Ordering::SeqCst);
                    return;
                }
            }
            if req.follow {
                tx.closed().await;
                state.log_stream_dropped.store(true, Ordering::SeqCst);
            }
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[derive(Clone, Default)]
pub struct FakeManagement {
    pub state: Arc<FakeState>,
}

#[tonic::async_trait]
impl HubManagement for FakeManagement {
    async fn status(
        &self,
        _: Request<proto::Empty>,
    ) -> Result<Response<proto::HubStatusReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(self.state.hub_status()))
    }

    async fn workers_list(
        &self,
        _: Request<proto::Empty>,
    ) -> Result<Response<proto::ListReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(self.state.list_reply()))
    }

    async fn worker_status(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::InfoReply>, Status> {
        self.state.enter().await;
        let id = req.into_inner().id;
        if !self.state.registered.lock().unwrap().contains(&id) {
            return Err(Status::not_found(format!("worker {id} is not registered")));
        }
        Ok(Response::new(proto::InfoReply::default()))
    }

    async fn get_registered_workers(
        &self,
        _: Request<proto::Empty>,
    ) -> Result<Response<proto::GetRegisteredWorkersReply>, Status> {
        self.state.enter().await;
        let ids = self
            .state
            .registered
            .lock()
            .unwrap()
            .iter()
            .map(|id| proto::Id { id: id.clone() })
            .collect();
        Ok(Response::new(proto::GetRegisteredWorkersReply { ids }))
    }

    async fn register_worker(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        self.state
            .registered
            .lock()
            .unwrap()
            .insert(req.into_inner().id);
        Ok(Response::new(proto::Empty {}))
    }

    async fn unregister_worker(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        let id = req.into_inner().id;
        if !self.state.registered.lock().unwrap().remove(&id) {
            return Err(Status::not_found(format!("worker {id} is not registered")));
        }
        Ok(Response::new(proto::Empty {}))
    }

    async fn get_worker_properties(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::GetWorkerPropertiesReply>, Status> {
        self.state.enter().await;
        let properties = self.state.properties_of(&req.into_inner().id);
        Ok(Response::new(proto::GetWorkerPropertiesReply { properties }))
    }

    async fn set_worker_properties(
        &self,
        req: Request<proto::SetWorkerPropertiesRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        let req = req.into_inner();
        self.state.replace_properties(req.id, req.properties);
        Ok(Response::new(proto::Empty {}))
    }

    async fn get_ask_plan(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::GetSlotsReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(self.state.plans_of(&req.into_inner().id)))
    }

    async fn create_ask_plan(
        &self,
        req: Request<proto::AddSlotRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        let req = req.into_inner();
        self.state.add_plan(req.id, req.slot)?;
        Ok(Response::new(proto::Empty {}))
    }

    async fn remove_ask_plan(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.state.enter().await;
        let plan = req.into_inner().id;
        self.state.plan_owner.lock().unwrap().remove(&plan);
        match self.state.slots.lock().unwrap().remove(&plan) {
            Some(_) => Ok(Response::new(proto::Empty {})),
            None => Err(Status::not_found(format!("plan {plan} not found"))),
        }
    }

    async fn task_list(
        &self,
        _: Request<proto::Empty>,
    ) -> Result<Response<proto::TaskListReply>, Status> {
        self.state.enter().await;
        let mut info: HashMap<String, proto::TaskIdList> = HashMap::new();
        for id in self.state.tasks.lock().unwrap().keys() {
            let worker = id.rsplit_once('-').map(|(w, _)| w).unwrap_or(id);
            info.entry(worker.to_string())
                .or_default()
                .ids
                .push(id.clone());
        }
        Ok(Response::new(proto::TaskListReply { info }))
    }

    async fn task_status(
        &self,
        req: Request<proto::Id>,
    ) -> Result<Response<proto::TaskStatusReply>, Status> {
        self.state.enter().await;
        Ok(Response::new(
            self.state.task_status_of(&req.into_inner().id)?,
        ))
    }
}

async fn listen() -> (SocketAddr, TcpListenerStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, TcpListenerStream::new(listener))
}

/// Serve `fake` on a loopback port and return its `host:port`.
pub async fn spawn_hub(fake: FakeHub) -> String {
    let (addr, incoming) = listen().await;
    let service = HubServer::new(fake)
        .accept_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Gzip);
    tokio::spawn(async move {
        Server::builder()
            .add_service(service)
            .serve_with_incoming(incoming)
            .await
            .unwrap();
    });
    addr.to_string()
}

pub async fn spawn_management(fake: FakeManagement) -> String {
    let (addr, incoming) = listen().await;
    let service = HubManagementServer::new(fake)
        .accept_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Gzip);
    tokio::spawn(async move {
        Server::builder()
            .add_service(service)
            .serve_with_incoming(incoming)
            .await
            .unwrap();
    });
    addr.to_string()
}
