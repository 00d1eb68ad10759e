// SPDX-License-Identifier: GPL-3.0-only

//! Single-worker background executor for camera work
//!
//! Provider acquisition, permission requests and still captures run here,
//! never on the UI-owning thread. Results travel back to the UI over a
//! channel; nothing spawned here touches UI state directly.

use std::future::Future;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// Name of the worker thread
const WORKER_THREAD_NAME: &str = "camera-executor";

pub struct CameraExecutor {
    runtime: Option<Runtime>,
}

impl CameraExecutor {
    /// Start the executor with exactly one worker thread
    pub fn new() -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()?;
        info!("Camera executor started");
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    /// Queue a task; returns false once the executor is shut down
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(task);
                true
            }
            None => {
                debug!("Task dropped, camera executor is shut down");
                false
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.runtime.is_none()
    }

    /// Stop the worker without waiting for queued or in-flight tasks
    pub fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            info!("Camera executor shut down");
        }
    }
}

impl Drop for CameraExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_tasks_run_off_the_calling_thread() {
        let executor = CameraExecutor::new().unwrap();
        let (tx, rx) = mpsc::channel();
        assert!(executor.spawn(async move {
            let name = std::thread::current().name().map(str::to_string);
            let _ = tx.send(name);
        }));

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some(WORKER_THREAD_NAME));
    }

    #[test]
    fn test_spawn_after_shutdown_is_rejected() {
        let mut executor = CameraExecutor::new().unwrap();
        executor.shutdown();
        assert!(executor.is_shutdown());
        assert!(!executor.spawn(async {}));
    }
}
