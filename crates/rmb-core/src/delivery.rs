use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use tokio::{
    sync::{mpsc, Semaphore},
    task::{JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    cooldown::{CooldownPolicy, Recovery},
    messaging::types::Update,
    router::UpdateRouter,
    Result,
};

/// Inbound half of the transport collaborator.
#[async_trait]
pub trait UpdateSource: Send {
    /// Next batch of updates in arrival order. `Ok(None)` means the source is closed.
    async fn next_batch(&mut self) -> Result<Option<Vec<Update>>>;
}

#[async_trait]
impl UpdateSource for mpsc::Receiver<Update> {
    async fn next_batch(&mut self) -> Result<Option<Vec<Update>>> {
        Ok(self.recv().await.map(|u| vec![u]))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub dispatched: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicUsize,
    failed: AtomicUsize,
}

/// Pulls updates from a source and dispatches each exactly once.
///
/// Each dispatch runs as its own task so a panicking handler cannot take the
/// loop down. With `concurrency == 1` the next update is not started until the
/// previous one, including any cooldown, has finished. With more permits,
/// updates start in arrival order but may finish out of order.
pub struct DeliveryLoop {
    router: Arc<UpdateRouter>,
    policy: CooldownPolicy,
    concurrency: usize,
}

impl DeliveryLoop {
    pub fn new(router: Arc<UpdateRouter>, policy: CooldownPolicy, concurrency: usize) -> Self {
        Self {
            router,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Run until the source closes or `cancel` fires, then wait for in-flight
    /// dispatches.
    pub async fn run<S: UpdateSource>(&self, mut source: S, cancel: CancellationToken) -> DeliveryStats {
        let counters = Arc::new(Counters::default());
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<()> = JoinSet::new();

        'outer: loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = source.next_batch() => batch,
            };

            let updates = match batch {
                Ok(Some(updates)) => updates,
                Ok(None) => {
                    tracing::info!("update source closed");
                    break;
                }
                Err(e) => {
                    if self.policy.on_dispatch_failure(&e, &cancel).await == Recovery::Aborted {
                        break;
                    }
                    continue;
                }
            };

            for update in updates {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'outer,
                    permit = permits.clone().acquire_owned() => match permit {
                        Ok(p) => p,
                        Err(_) => break 'outer,
                    },
                };

                let router = self.router.clone();
                let policy = self.policy;
                let cancel = cancel.clone();
                let task_counters = counters.clone();
                let span = tracing::info_span!("update", id = update.id);
                tasks.spawn(
                    async move {
                        let _permit = permit;
                        task_counters.dispatched.fetch_add(1, Ordering::SeqCst);
                        if let Err(err) = router.dispatch(update, &cancel).await {
                            task_counters.failed.fetch_add(1, Ordering::SeqCst);
                            policy.on_dispatch_failure(&err, &cancel).await;
                        }
                    }
                    .instrument(span),
                );

                while let Some(res) = tasks.try_join_next() {
                    reap(res, &counters);
                }
            }
        }

        while let Some(res) = tasks.join_next().await {
            reap(res, &counters);
        }

        DeliveryStats {
            dispatched: counters.dispatched.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
        }
    }
}

fn reap(res: std::result::Result<(), JoinError>, counters: &Counters) {
    if let Err(e) = res {
        counters.failed.fetch_add(1, Ordering::SeqCst);
        tracing::error!(error = %e, "dispatch task panicked");
    }
}
