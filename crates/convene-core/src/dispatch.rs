//! Supervised update-dispatch loop.
//!
//! Pulls inbound events off a channel and hands each one to the router in its
//! own task, so a slow dialog step never blocks votes from other users and a
//! panicking handler takes down only its own event. Shutdown is cooperative:
//! on cancellation the loop stops receiving, then waits a bounded grace
//! period for in-flight handlers before returning.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use convene_types::event::UpdateEvent;

use crate::repository::{MeetingRepository, UserRepository, VoteRepository};
use crate::router::UpdateRouter;
use crate::transport::ChatTransport;

/// How long shutdown waits for in-flight handlers.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(10);

/// Consume updates until the channel closes or `shutdown` is cancelled.
pub async fn run_update_loop<M, U, V, T>(
    router: Arc<UpdateRouter<M, U, V, T>>,
    mut updates: mpsc::Receiver<UpdateEvent>,
    shutdown: CancellationToken,
    drain_grace: Duration,
) where
    M: MeetingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    V: VoteRepository + Send + Sync + 'static,
    T: ChatTransport + Send + Sync + 'static,
{
    let tracker = TaskTracker::new();

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested, draining update handlers");
                break;
            }
            event = updates.recv() => match event {
                Some(event) => event,
                None => {
                    info!("update channel closed");
                    break;
                }
            },
        };

        let router = Arc::clone(&router);
        tracker.spawn(async move {
            // Inner spawn isolates a panicking handler from the tracker task.
            let handle = tokio::spawn(async move { router.handle_update(event).await });
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "update handler failed"),
                Err(e) if e.is_panic() => error!("update handler panicked"),
                Err(_) => {}
            }
        });
    }

    tracker.close();
    if tokio::time::timeout(drain_grace, tracker.wait()).await.is_err() {
        warn!(
            remaining = tracker.len(),
            "drain grace elapsed with handlers still running"
        );
    }
}
