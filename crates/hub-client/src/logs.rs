use tonic::Streaming;
use tracing::debug;

use crate::context::{CallContext, expired};
use crate::error::ClientError;
use crate::proto::TaskLogsChunk;

const OP: &str = "task_logs";

/// Open server stream of task log chunks.
///
/// Bounded only by the caller's context: the facade timeout does not apply
/// since the stream lives as long as the task writes logs. The stream closes
/// at end of data, on the first error, on caller cancellation, on
/// [`TaskLogStream::close`] or when dropped.
#[derive(Debug)]
pub struct TaskLogStream {
    task: String,
    inner: Option<Streaming<TaskLogsChunk>>,
    ctx: CallContext,
    received: u64,
}

impl TaskLogStream {
    pub(crate) fn new(task: String, inner: Streaming<TaskLogsChunk>, ctx: CallContext) -> Self {
        Self {
            task,
            inner: Some(inner),
            ctx,
            received: 0,
        }
    }

    /// Wait for the next chunk. `None` once the stream is closed or exhausted.
    pub async fn next_chunk(&mut self) -> Option<Result<TaskLogsChunk, ClientError>> {
        let inner = self.inner.as_mut()?;

        let outcome = tokio::select! {
            biased;
            _ = self.ctx.token().cancelled() => Some(Err(ClientError::Cancelled { op: OP })),
            _ = expired(self.ctx.deadline()) => Some(Err(ClientError::DeadlineExceeded { op: OP })),
            msg = inner.message() => match msg {
                Ok(Some(chunk)) => Some(Ok(chunk)),
                Ok(None) => None,
                Err(status) => Some(Err(ClientError::remote(OP, status))),
            },
        };

        match outcome {
            Some(Ok(_)) => self.received += 1,
            _ => self.close(),
        }
        outcome
    }

    /// Drain the remaining chunks into one buffer.
    pub async fn collect_to_end(mut self) -> Result<Vec<u8>, ClientError> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            out.extend_from_slice(&chunk?.data);
        }
        Ok(out)
    }

    /// Stop reading and reset the underlying stream. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!(task = %self.task, chunks = self.received, "task log stream closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Chunks delivered so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn task(&self) -> &str {
        &self.task
    }
}
