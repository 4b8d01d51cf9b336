//! Runs the application's long-lived processes concurrently and shuts
//! them down in order.
//!
//! Processes receive a [`CancellationToken`] and run until it fires or
//! they fail; when any process fails, every other process is cancelled.
//! Closers run afterwards in registration order, regardless of how the
//! processes ended, which is how callers express shutdown ordering (for
//! example stop-the-feed-processor before close-the-client).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send,
>;

pub type Closer = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

pub struct Runner {
    app_processes: Vec<AppProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            app_processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds a long-lived process. Processes run concurrently; the first
    /// failure cancels the rest.
    pub fn with_app_process<F, Fut>(mut self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.app_processes
            .push(Box::new(|token| Box::pin(process(token))));
        self
    }

    /// Adds a closer. Closers run sequentially, in registration order,
    /// after every process has stopped.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Injects an external cancellation token, mainly for tests.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs until a shutdown signal arrives or a process fails, then runs
    /// the closers and exits the process.
    pub async fn run(self) {
        let result = self.run_inner().await;
        if let Err(err) = result {
            error!("application exiting with error: {:#}", err);
            std::process::exit(1);
        }
        info!("application exiting");
        std::process::exit(0);
    }

    /// Same as [`run`](Self::run) but returns instead of exiting, so the
    /// outcome can be asserted on.
    pub async fn run_inner(self) -> anyhow::Result<()> {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();
        for process in self.app_processes {
            let process_token = token.clone();
            join_set.spawn(async move { process(process_token).await });
        }

        spawn_signal_listeners(token.clone());

        let mut first_error: Option<anyhow::Error> = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Ok(())) => debug!("app process completed"),
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        error!("app process error: {:#}", err);
                        first_error = Some(err);
                    }
                    token.cancel();
                }
                Err(err) => {
                    error!("app process panicked: {}", err);
                    if first_error.is_none() {
                        first_error = Some(anyhow::anyhow!("process panicked: {err}"));
                    }
                    token.cancel();
                }
            }
        }

        if !self.closers.is_empty() {
            info!(timeout = ?self.closer_timeout, "running closers");
            let run_all = async {
                for closer in self.closers {
                    if let Err(err) = closer().await {
                        error!("closer failed: {:#}", err);
                    }
                }
            };
            if tokio::time::timeout(self.closer_timeout, run_all).await.is_err() {
                error!("closers timed out");
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn spawn_signal_listeners(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            ctrl_c_token.cancel();
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received SIGTERM");
                token.cancel();
            }
            Err(err) => error!("failed to install SIGTERM handler: {}", err),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn closers_run_in_registration_order_after_processes_stop() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let token = CancellationToken::new();

        let first = order.clone();
        let second = order.clone();
        let runner = Runner::new()
            .with_cancellation_token(token.clone())
            .with_app_process(|ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || async move {
                first.lock().unwrap().push("stop-processor");
                Ok(())
            })
            .with_closer(move || async move {
                second.lock().unwrap().push("close-client");
                Ok(())
            });

        token.cancel();
        runner.run_inner().await.unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["stop-processor", "close-client"]
        );
    }

    #[tokio::test]
    async fn failing_process_cancels_the_others_and_reports_error() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let observed = cancelled.clone();
        let runner = Runner::new()
            .with_app_process(|_ctx| async move { anyhow::bail!("boom") })
            .with_app_process(move |ctx| async move {
                ctx.cancelled().await;
                observed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let err = runner.run_inner().await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }
}
