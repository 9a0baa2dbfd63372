use std::io::Write;

use tracing::{info, warn};

use hub_client::hub_model::{TaskId, WorkerId};
use hub_client::{
    CallContext, CancellationToken, CliInteractor, ClientConfig, GrpcInteractor, HubApi, proto,
};
use hub_observe::{LoggerConfig, LoggerLevel, init_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) Logger
    let cfg = LoggerConfig {
        level: LoggerLevel::new("info,hub_client=debug")?,
        ..Default::default()
    };
    init_logger(&cfg)?;

    // 2) Hub connection
    let endpoint =
        std::env::var("HUB_ENDPOINT").unwrap_or_else(|_| "localhost:10001".to_string());
    let hub = GrpcInteractor::from_config(&ClientConfig::new(endpoint.as_str()))?;
    info!(%endpoint, timeout_ms = hub.timeout().as_millis() as u64, "hub facade ready");

    // 3) Ctrl+C cancels whatever is in flight
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });
    let ctx = CallContext::from_token(shutdown);

    // 4) Overview
    let ping = hub.ping(&ctx).await?;
    let status = hub.status(&ctx).await?;
    info!(
        ping = %ping.status,
        version = %status.version,
        workers = status.worker_count,
        uptime = status.uptime,
        "hub is up"
    );
    for (worker, tasks) in hub.worker_list(&ctx).await?.workers {
        info!(%worker, tasks = tasks.ids.len(), "worker");
        match hub.worker_properties(&ctx, &WorkerId::from(worker.as_str())).await {
            Ok(reply) => info!(%worker, properties = ?reply.properties, "worker properties"),
            Err(e) => warn!(%worker, error = %e, "failed to read worker properties"),
        }
    }

    // 5) Optionally follow one task's logs until it ends or Ctrl+C
    let Some(task) = std::env::args().nth(1).map(TaskId::from) else {
        return Ok(());
    };
    let state = hub.task_status(&ctx, &task).await?;
    info!(%task, state = ?state.status(), image = %state.image_name, "following task logs");

    let mut logs = hub
        .task_logs(
            &ctx,
            proto::TaskLogsRequest {
                id: task.to_string(),
                r#type: proto::TaskLogType::All as i32,
                follow: true,
                tail: "50".to_string(),
                ..Default::default()
            },
        )
        .await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = logs.next_chunk().await {
        match chunk {
            Ok(chunk) => stdout.write_all(&chunk.data)?,
            Err(e) if e.is_cancelled() => break,
            Err(e) => return Err(e.into()),
        }
    }
    logs.close();
    info!(chunks = logs.received(), "shutting down...");

    Ok(())
}
