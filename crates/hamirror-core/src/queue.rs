// ── Per-logical-node reconcile queue ──
//
// One worker task per HA parent, fed by a bounded channel. Jobs for the
// same parent run strictly in submission order; different parents run in
// parallel. Results come back through a oneshot per job. A worker that
// sits idle closes its channel and leaves the map.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::NodeId;

/// A queued reconciliation: a synchronous closure that reports its own
/// result.
type Job = Box<dyn FnOnce() + Send>;

struct Worker {
    tx: mpsc::Sender<Job>,
    handle: JoinHandle<()>,
}

/// Serializes reconciliation per logical node.
pub struct ReconcileQueue {
    workers: Arc<DashMap<NodeId, Worker>>,
    capacity: usize,
    idle: Duration,
    cancel: CancellationToken,
}

impl ReconcileQueue {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            workers: Arc::new(DashMap::new()),
            capacity: config.queue_capacity.max(1),
            idle: config.worker_idle,
            cancel: CancellationToken::new(),
        }
    }

    /// Run `job` on the worker of `node`'s logical node and wait for its
    /// result. Must be called from within a tokio runtime.
    pub async fn submit<F, T>(&self, node: &NodeId, job: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Result<T, CoreError> + Send + 'static,
        T: Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let logical = node.global();
        let (result_tx, result_rx) = oneshot::channel();
        let mut envelope: Job = Box::new(move || {
            let _ = result_tx.send(job());
        });

        // Clone the sender out so no map guard is held across the await.
        // A worker that went idle in between hands the job back; retry on
        // a fresh one.
        loop {
            let tx = self.sender(&logical);
            match tx.send(envelope).await {
                Ok(()) => break,
                Err(SendError(job)) => {
                    if self.cancel.is_cancelled() {
                        return Err(CoreError::Cancelled);
                    }
                    debug!(node = %logical, "reconcile worker retired, restarting");
                    envelope = job;
                }
            }
        }

        result_rx.await.map_err(|_| CoreError::Cancelled)?
    }

    /// Number of logical nodes with a live worker.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop every worker and wait for them to exit. Jobs still queued are
    /// dropped and their submitters receive `Cancelled`.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let ids: Vec<NodeId> = self.workers.iter().map(|w| w.key().clone()).collect();
        for id in ids {
            if let Some((_, worker)) = self.workers.remove(&id) {
                drop(worker.tx);
                if let Err(e) = worker.handle.await {
                    warn!(node = %id, error = %e, "reconcile worker panicked");
                }
            }
        }
        debug!("reconcile queue shut down");
    }

    fn sender(&self, logical: &NodeId) -> mpsc::Sender<Job> {
        self.workers.remove_if(logical, |_, w| w.tx.is_closed());
        self.workers
            .entry(logical.clone())
            .or_insert_with(|| {
                let (tx, rx) = mpsc::channel(self.capacity);
                let handle = tokio::spawn(worker_task(
                    logical.clone(),
                    rx,
                    WorkerExit {
                        idle: self.idle,
                        cancel: self.cancel.child_token(),
                        workers: Arc::clone(&self.workers),
                    },
                ));
                debug!(node = %logical, "reconcile worker started");
                Worker { tx, handle }
            })
            .tx
            .clone()
    }
}

impl Default for ReconcileQueue {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Drop for ReconcileQueue {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct WorkerExit {
    idle: Duration,
    cancel: CancellationToken,
    workers: Arc<DashMap<NodeId, Worker>>,
}

async fn worker_task(node: NodeId, mut rx: mpsc::Receiver<Job>, exit: WorkerExit) {
    loop {
        tokio::select! {
            biased;
            () = exit.cancel.cancelled() => break,
            job = rx.recv() => {
                let Some(job) = job else { break };
                job();
            }
            () = tokio::time::sleep(exit.idle) => {
                // Refuse new jobs, finish the ones already queued.
                rx.close();
                while let Some(job) = rx.recv().await {
                    job();
                }
                exit.workers.remove_if(&node, |_, w| w.tx.is_closed());
                debug!(node = %node, "reconcile worker idle, retired");
                return;
            }
        }
    }
    debug!(node = %node, "reconcile worker stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn returns_job_result() {
        let queue = ReconcileQueue::default();
        let out = queue.submit(&NodeId::from("ha1"), || Ok(42)).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn job_error_is_propagated() {
        let queue = ReconcileQueue::default();
        let err = queue
            .submit(&NodeId::from("ha1"), || -> Result<(), CoreError> {
                Err(CoreError::Internal("boom".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[tokio::test]
    async fn physical_switches_share_their_parent_worker() {
        let queue = ReconcileQueue::default();
        queue.submit(&NodeId::from("ha1"), || Ok(())).await.unwrap();
        queue
            .submit(&NodeId::from("ha1/physicalswitch/sw1"), || Ok(()))
            .await
            .unwrap();
        queue.submit(&NodeId::from("ha2"), || Ok(())).await.unwrap();
        assert_eq!(queue.worker_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_node_jobs_never_overlap() {
        let queue = Arc::new(ReconcileQueue::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let queue = Arc::clone(&queue);
            let log = Arc::clone(&log);
            tasks.push(tokio::spawn(async move {
                queue
                    .submit(&NodeId::from("ha1"), move || {
                        log.lock().unwrap().push(("start", i));
                        std::thread::sleep(Duration::from_millis(5));
                        log.lock().unwrap().push(("end", i));
                        Ok(())
                    })
                    .await
            }));
        }
        for t in tasks {
            t.await.unwrap().unwrap();
        }

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 16);
        for pair in log.chunks(2) {
            assert_eq!(pair[0].0, "start");
            assert_eq!(pair[1], ("end", pair[0].1));
        }
    }

    #[tokio::test]
    async fn idle_worker_is_retired_and_restarted() {
        let queue = ReconcileQueue::new(&EngineConfig {
            worker_idle: Duration::from_millis(20),
            ..EngineConfig::default()
        });
        queue.submit(&NodeId::from("ha1"), || Ok(())).await.unwrap();
        assert_eq!(queue.worker_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(queue.worker_count(), 0);

        let out = queue.submit(&NodeId::from("ha1"), || Ok(7)).await.unwrap();
        assert_eq!(out, 7);
        assert_eq!(queue.worker_count(), 1);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_cancelled() {
        let queue = ReconcileQueue::default();
        queue.submit(&NodeId::from("ha1"), || Ok(())).await.unwrap();
        queue.shutdown().await;

        assert!(queue.is_shut_down());
        assert_eq!(queue.worker_count(), 0);
        let err = queue
            .submit(&NodeId::from("ha1"), || Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
    }
}
