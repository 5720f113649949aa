//! Single-flight refresh coordination.
//!
//! When many in-flight calls fail on the same expired access token,
//! only the first becomes the refresher; the rest park on a queue and
//! are woken in arrival order once the one refresh settles. On refresh
//! failure every parked caller sees the failure (nobody hangs) and the
//! logout hook fires once.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};

use crate::error::ClientError;

/// The one network capability the coordinator needs.
pub trait RefreshTransport: Send + Sync {
    /// Call the refresh endpoint. Success means new session cookies are
    /// in place and queued calls can be replayed.
    async fn refresh(&self) -> Result<(), ClientError>;
}

struct Flight {
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<Result<(), ClientError>>>,
}

pub struct RefreshCoordinator<T: RefreshTransport> {
    transport: T,
    flight: Mutex<Flight>,
    /// Fired once per failed refresh so the app can drop local session
    /// state and route to the login screen.
    on_session_lost: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl<T: RefreshTransport> RefreshCoordinator<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            flight: Mutex::new(Flight {
                refreshing: false,
                waiters: VecDeque::new(),
            }),
            on_session_lost: None,
        }
    }

    pub fn with_logout_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_lost = Some(Arc::new(hook));
        self
    }

    /// Run `op`, refreshing the session and retrying once if it failed
    /// on an expired access token. Fatal auth failures (bad refresh
    /// token, invalidated token, disabled account) pass straight
    /// through; retrying them would loop.
    pub async fn execute<R, F, Fut>(&self, op: F) -> Result<R, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
    {
        match op().await {
            Err(e) if e.is_refreshable() => {
                self.join_refresh().await?;
                op().await
            }
            other => other,
        }
    }

    /// Become the refresher or park behind the in-flight one. Returns
    /// once the single refresh has settled.
    async fn join_refresh(&self) -> Result<(), ClientError> {
        let rx = {
            let mut flight = self.flight.lock().await;
            if flight.refreshing {
                let (tx, rx) = oneshot::channel();
                flight.waiters.push_back(tx);
                Some(rx)
            } else {
                flight.refreshing = true;
                None
            }
        };

        // Parked: resolve with whatever the refresher broadcast. A
        // dropped sender means the refresher panicked; treat it as a
        // lost session rather than hanging.
        if let Some(rx) = rx {
            return rx.await.unwrap_or(Err(ClientError::SessionExpired));
        }

        let outcome = self.transport.refresh().await;
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "session refresh failed");
        }

        let waiters = {
            let mut flight = self.flight.lock().await;
            flight.refreshing = false;
            std::mem::take(&mut flight.waiters)
        };
        // FIFO wake-up: callers retry in the order they queued.
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }

        if outcome.is_err() {
            if let Some(hook) = &self.on_session_lost {
                hook();
            }
        }
        outcome
    }
}
