//! Manages the lifecycle of all spawned tasks in the service.
use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

/// Tracks every long-lived task (the service actor, subscriber dispatchers,
/// the control loop) so shutdown can await them all.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskManager {
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
        }
    }

    /// Spawns a task inside the caller's span and keeps its handle.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future.in_current_span());
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        // Dispatchers of unsubscribed subscribers finish on their own.
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((name, handle));
    }

    pub fn get_shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Waits for all managed tasks to complete.
    pub async fn shutdown(self) {
        let handles = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect::<Vec<_>>();
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );

        let (task_names, handles): (Vec<&'static str>, Vec<_>) = handles.into_iter().unzip();
        debug!(tasks = ?task_names, "Awaiting all tasks.");

        let results = join_all(handles).await;

        let mut panicked = Vec::new();
        for (task_name, result) in task_names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name, error = %e, "Task panicked during shutdown.");
                    panicked.push(task_name);
                }
            }
        }

        if panicked.is_empty() {
            info!("All tasks shut down gracefully.");
        } else {
            error!(tasks = ?panicked, "{} tasks panicked during shutdown", panicked.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_shutdown_awaits_every_task() {
        let (tx, rx) = watch::channel(false);
        let manager = TaskManager::new(rx);
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let mut shutdown_rx = manager.get_shutdown_rx();
            let finished = finished.clone();
            manager.spawn("Waiter", async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert!(!manager.is_shutting_down());
        tx.send(true).unwrap();
        manager.shutdown().await;

        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert!(logs_contain("All tasks shut down gracefully."));
    }
}
