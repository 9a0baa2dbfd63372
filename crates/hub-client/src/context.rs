//! Per-call deadlines derived from a caller-supplied context.
//!
//! A [`CallContext`] is what callers hand to every facade method: a
//! cancellation token plus an optional deadline. Each unary call narrows it
//! with [`CallContext::bounded`] to the facade's fixed timeout and gets back a
//! [`CallGuard`] that must be released once the call is over. Dropping the
//! guard releases it, so early returns and panics are covered too.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::ClientError;

/// Cancellation scope a call runs under.
///
/// Cloning is cheap and clones share the same token.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one cancelled on Ctrl+C.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Tighten the deadline. A later deadline than the current one is ignored.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(earliest(self.deadline, deadline));
        self
    }

    /// Tighten the deadline to `timeout` from now. A timeout too large to
    /// represent as an instant leaves the context unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel this context and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Derive a child bounded by `timeout` or the parent, whichever ends first.
    ///
    /// The child is cancelled when the parent is; cancelling the child never
    /// touches the parent.
    pub fn bounded(&self, timeout: Duration) -> (CallContext, CallGuard) {
        self.bounded_inner(timeout, None)
    }

    pub(crate) fn bounded_tracked(
        &self,
        timeout: Duration,
        ledger: &Arc<CallLedger>,
    ) -> (CallContext, CallGuard) {
        ledger.acquired.fetch_add(1, Ordering::Relaxed);
        self.bounded_inner(timeout, Some(Arc::clone(ledger)))
    }

    fn bounded_inner(
        &self,
        timeout: Duration,
        ledger: Option<Arc<CallLedger>>,
    ) -> (CallContext, CallGuard) {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(own) => Some(earliest(self.deadline, own)),
            None => self.deadline,
        };
        let child = CallContext {
            token: self.token.child_token(),
            deadline,
        };
        let guard = CallGuard {
            token: child.token.clone(),
            ledger,
            released: false,
        };
        (child, guard)
    }

    /// Wrap `message` in a request whose `grpc-timeout` matches this context.
    pub(crate) fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        if let Some(remaining) = self.remaining() {
            request.set_timeout(remaining);
        }
        request
    }

    /// Drive one remote call to completion under this context.
    ///
    /// The future is never polled when the context is already cancelled or
    /// expired, so no request leaves the process in that case.
    pub(crate) async fn run<T, F>(&self, op: &'static str, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, tonic::Status>>,
    {
        if self.token.is_cancelled() {
            return Err(ClientError::Cancelled { op });
        }
        if self.remaining() == Some(Duration::ZERO) {
            return Err(ClientError::DeadlineExceeded { op });
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ClientError::Cancelled { op }),
            _ = expired(self.deadline) => Err(ClientError::DeadlineExceeded { op }),
            res = call => res.map_err(|status| {
                // The transport enforces the same grpc-timeout; report its
                // expiry the same way as ours.
                if status.code() == tonic::Code::DeadlineExceeded {
                    ClientError::DeadlineExceeded { op }
                } else {
                    ClientError::remote(op, status)
                }
            }),
        }
    }
}

/// Resolves when `deadline` passes, never without one.
pub(crate) async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn earliest(current: Option<Instant>, candidate: Instant) -> Instant {
    match current {
        Some(current) if current < candidate => current,
        _ => candidate,
    }
}

/// Release handle of a bounded context.
///
/// Releasing cancels the derived token so nothing keeps waiting on it.
/// It happens exactly once: on [`CallGuard::release`] or on drop.
#[derive(Debug)]
#[must_use = "dropping the guard releases the bounded context immediately"]
pub struct CallGuard {
    token: CancellationToken,
    ledger: Option<Arc<CallLedger>>,
    released: bool,
}

impl CallGuard {
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.token.cancel();
        if let Some(ledger) = &self.ledger {
            ledger.released.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}

/// Counts bounded contexts a facade has acquired and released.
#[derive(Debug, Default)]
pub struct CallLedger {
    acquired: AtomicU64,
    released: AtomicU64,
}

impl CallLedger {
    pub fn snapshot(&self) -> CallStats {
        CallStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub acquired: u64,
    pub released: u64,
}

impl CallStats {
    pub fn in_flight(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

/// Fixed timeout plus ledger shared by all unary methods of a facade.
#[derive(Debug, Clone)]
pub(crate) struct CallScope {
    timeout: Duration,
    ledger: Arc<CallLedger>,
}

impl CallScope {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ledger: Arc::new(CallLedger::default()),
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn stats(&self) -> CallStats {
        self.ledger.snapshot()
    }

    /// Issue one unary call bounded by the facade timeout.
    pub(crate) async fn unary<Req, Resp, F, Fut>(
        &self,
        op: &'static str,
        ctx: &CallContext,
        message: Req,
        call: F,
    ) -> Result<Resp, ClientError>
    where
        F: FnOnce(tonic::Request<Req>) -> Fut,
        Fut: Future<Output = Result<tonic::Response<Resp>, tonic::Status>>,
    {
        let (bounded, guard) = ctx.bounded_tracked(self.timeout, &self.ledger);
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        trace!(op, timeout_ms, "hub call started");

        let result = bounded
            .run(op, call(bounded.request(message)))
            .await
            .map(tonic::Response::into_inner);
        guard.release();

        match &result {
            Ok(_) => trace!(op, "hub call finished"),
            Err(ClientError::DeadlineExceeded { .. }) => {
                warn!(op, timeout_ms, "hub call timed out")
            }
            Err(e) => debug!(op, error = %e, "hub call failed"),
        }
        result
    }
}
