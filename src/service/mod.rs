//! The notification service actor.
//!
//! A single task owns [`ServiceState`]. Callers hand it jobs through a bounded
//! queue and receive the result on a oneshot channel, so every operation runs
//! in arrival order against state no other task can touch.

pub mod state;

use crate::error::{NotificationError, Result};
use crate::task_manager::TaskManager;
use state::{ServiceSettings, ServiceState};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

type Job = Box<dyn FnOnce(&mut ServiceState) + Send>;

/// A cloneable handle for submitting work to the service actor.
#[derive(Clone)]
pub struct ServiceHandle {
    job_tx: mpsc::Sender<Job>,
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("closed", &self.job_tx.is_closed())
            .finish()
    }
}

impl ServiceHandle {
    /// Runs `f` on the actor and returns its result. Fails with
    /// `ServiceUnavailable` once the actor has stopped.
    pub async fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ServiceState) -> Result<T> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |state| {
            // The caller may have given up waiting; the work is done either way.
            let _ = reply_tx.send(f(state));
        });
        self.job_tx
            .send(job)
            .await
            .map_err(|_| NotificationError::ServiceUnavailable)?;
        reply_rx
            .await
            .map_err(|_| NotificationError::ServiceUnavailable)?
    }

    pub fn is_running(&self) -> bool {
        !self.job_tx.is_closed()
    }
}

pub struct NotificationService {
    state: ServiceState,
    job_rx: mpsc::Receiver<Job>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NotificationService {
    /// Starts the actor on `task_manager` and returns a handle to it.
    pub fn spawn(
        settings: ServiceSettings,
        job_queue_capacity: usize,
        task_manager: &TaskManager,
    ) -> ServiceHandle {
        let (job_tx, job_rx) = mpsc::channel(job_queue_capacity.max(1));
        let service = Self {
            state: ServiceState::new(settings, task_manager.clone()),
            job_rx,
            shutdown_rx: task_manager.get_shutdown_rx(),
        };
        task_manager.spawn("NotificationService", service.run());
        ServiceHandle { job_tx }
    }

    async fn run(mut self) {
        info!("Notification service started.");
        loop {
            tokio::select! {
                biased;
                Ok(_) = self.shutdown_rx.wait_for(|stop| *stop) => {
                    info!("Notification service received shutdown signal.");
                    break;
                }
                job = self.job_rx.recv() => match job {
                    Some(job) => job(&mut self.state),
                    None => {
                        debug!("All service handles dropped.");
                        break;
                    }
                }
            }
        }
        // Jobs still queued are dropped, which fails their callers with
        // ServiceUnavailable.
        self.job_rx.close();
        self.state.shutdown();
    }
}
