//! Switch-to-latest subscription slot.
//!
//! Holds at most one live upstream subscription per channel session. Each
//! switch cancels the previous subscription's token and waits for its task
//! to exit before the next one is spawned, so two subscriptions are never
//! live at once.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

struct Subscription {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub(crate) struct SwitchLatest {
    session: CancellationToken,
    current: Option<Subscription>,
    switches: u64,
}

impl SwitchLatest {
    /// New subscriptions get child tokens of `session`, so cancelling the
    /// session cancels whatever is live.
    pub(crate) const fn new(session: CancellationToken) -> Self {
        Self {
            session,
            current: None,
            switches: 0,
        }
    }

    /// Number of subscriptions started so far.
    pub(crate) const fn switches(&self) -> u64 {
        self.switches
    }

    /// Cancel the live subscription, if any, and wait for its task to exit.
    pub(crate) async fn cancel_current(&mut self) {
        if let Some(sub) = self.current.take() {
            sub.token.cancel();
            await_subscription(sub.handle).await;
        }
    }

    /// Wait for the live subscription to finish on its own.
    pub(crate) async fn join_current(&mut self) {
        if let Some(sub) = self.current.take() {
            await_subscription(sub.handle).await;
        }
    }

    /// Replace the live subscription with the task built by `start`.
    ///
    /// `start` receives the new subscription's cancellation token.
    pub(crate) async fn switch<F, Fut>(&mut self, start: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel_current().await;
        let token = self.session.child_token();
        let handle = tokio::spawn(start(token.clone()));
        self.switches += 1;
        self.current = Some(Subscription { token, handle });
    }
}

impl Drop for SwitchLatest {
    fn drop(&mut self) {
        if let Some(sub) = &self.current {
            sub.token.cancel();
        }
    }
}

async fn await_subscription(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        if e.is_panic() {
            warn!(error = %e, "Upstream subscription task panicked");
        }
    }
}
