//! Tokio runtime ownership for the blocking entry points.
//!
//! The search flow is `async` end to end. [`SearchRuntime`] lets synchronous
//! callers (the one-shot CLI, the terminal UI's main thread) drive it, and
//! [`SearchHandle`] hands out tasks that observe one shared shutdown token so
//! in-flight searches can stop and close their browsers before the runtime
//! goes away.
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct SearchRuntime {
    runtime: Runtime,
    shutdown: CancellationToken,
}

/// Cloneable access to a [`SearchRuntime`] from inside async code.
#[derive(Clone)]
pub struct SearchHandle {
    inner: Handle,
    shutdown: CancellationToken,
}

impl SearchRuntime {
    /// Build a multi-threaded runtime. `worker_threads` of `None` keeps
    /// Tokio's default (one per core).
    ///
    /// ```
    /// use newslinks_runtime::SearchRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SearchRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// assert_eq!(runtime.block_on(async { 2 + 2 }), 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);
        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }
        Ok(Self {
            runtime: builder.build()?,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> SearchHandle {
        SearchHandle {
            inner: self.runtime.handle().clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Run a future to completion. Must not be called from inside another
    /// Tokio runtime.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Signal shutdown to every task spawned through a [`SearchHandle`], then
    /// give blocking work `graceful` to finish before the runtime is dropped.
    pub fn shutdown(self, graceful: Duration) {
        self.shutdown.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl SearchHandle {
    /// Spawn the future built by `task`, handing it a token that fires when
    /// [`cancel_all`](Self::cancel_all) or [`SearchRuntime::shutdown`] runs.
    pub fn spawn_cancellable<F, Fut>(&self, task: F) -> JoinHandle<Fut::Output>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        self.inner.spawn(task(self.shutdown.child_token()))
    }

    /// Ask every task spawned through this runtime to stop.
    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// A token tied to the shared shutdown signal, for long-lived helpers
    /// that stop with everything else.
    pub fn child_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_task_sees_cancel_all() {
        let runtime = SearchRuntime::build("cancel-test", Some(1)).unwrap();
        let handle = runtime.handle();
        let task = handle.spawn_cancellable(|cancel| async move {
            cancel.cancelled().await;
            "stopped"
        });
        assert!(!handle.is_shutting_down());
        handle.cancel_all();
        let out = runtime.block_on(async move { task.await.unwrap() });
        assert_eq!(out, "stopped");
        assert!(handle.is_shutting_down());
        runtime.shutdown(Duration::from_millis(10));
    }

    #[test]
    fn shutdown_fires_child_tokens() {
        let runtime = SearchRuntime::build("shutdown-test", Some(1)).unwrap();
        let token = runtime.handle().child_token();
        runtime.shutdown(Duration::from_millis(10));
        assert!(token.is_cancelled());
    }

    #[test]
    fn finished_task_returns_its_value() {
        let runtime = SearchRuntime::build("value-test", Some(1)).unwrap();
        let task = runtime
            .handle()
            .spawn_cancellable(|_cancel| async { 21 * 2 });
        assert_eq!(runtime.block_on(async { task.await.unwrap() }), 42);
        runtime.shutdown(Duration::from_millis(10));
    }
}
