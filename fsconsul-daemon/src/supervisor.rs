use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinSet;

use fsconsul_core::{Mapping, WatchConfig};
use fsconsul_store::{ConsulStore, KvStore};
use fsconsul_sync::{MappingWatcher, RetryPolicy, WatcherExit};

use crate::error::{io_err, DaemonError};
use crate::logging::{init_tracing, LogFormat};

/// How the watchers of one [`Supervisor::run`] ended.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stopped: usize,
    /// `"<mapping>: <reason>"` for every watcher that ended in `Failed`.
    pub failed: Vec<String>,
}

/// Owns the watcher tasks for one configuration.
pub struct Supervisor {
    config: WatchConfig,
    store: Arc<dyn KvStore>,
    retry: RetryPolicy,
}

impl Supervisor {
    pub fn new(config: WatchConfig, store: Arc<dyn KvStore>) -> Self {
        Self {
            config,
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run every mapping until `shutdown` fires.
    ///
    /// A failed watcher is logged and leaves its siblings running. If every
    /// watcher fails before a stop is requested the run ends with
    /// [`DaemonError::AllWatchersFailed`].
    pub async fn run(self, shutdown: broadcast::Sender<()>) -> Result<RunReport, DaemonError> {
        let mut watchers = JoinSet::new();
        for mapping in &self.config.mappings {
            let watcher = MappingWatcher::new(mapping.clone(), self.store.clone())
                .with_retry_policy(self.retry);
            let rx = shutdown.subscribe();
            let label = watcher.mapping().to_string();
            watchers.spawn(async move { (label, watcher.run(rx).await) });
        }

        let total = watchers.len();
        tracing::info!(
            watchers = total,
            store = %self.store.connection().address,
            "supervisor started",
        );

        let mut report = RunReport::default();
        while let Some(joined) = watchers.join_next().await {
            match joined {
                Ok((_, WatcherExit::Stopped)) => report.stopped += 1,
                Ok((label, WatcherExit::Failed(err))) => {
                    tracing::error!(mapping = %label, error = %err, "mapping watcher gave up");
                    report.failed.push(format!("{label}: {err}"));
                }
                Err(err) => {
                    tracing::error!(error = %err, "watcher task join failure");
                    report.failed.push(format!("watcher task: {err}"));
                }
            }
        }

        if total > 0 && report.stopped == 0 {
            return Err(DaemonError::AllWatchersFailed { count: total });
        }
        tracing::info!(
            stopped = report.stopped,
            failed = report.failed.len(),
            "supervisor finished",
        );
        Ok(report)
    }
}

/// Start the sync engine against the configured Consul agent and block the
/// current thread until ctrl-c (or SIGTERM) or until every watcher fails.
pub fn start_blocking(config: WatchConfig, log_format: LogFormat) -> Result<RunReport, DaemonError> {
    init_tracing(log_format);
    let store: Arc<dyn KvStore> = Arc::new(ConsulStore::new(config.connection.clone())?);
    for mapping in &config.mappings {
        log_mapping(mapping);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;

    runtime.block_on(run_until_signal(
        Supervisor::new(config, store),
        wait_for_signal(),
    ))
}

/// Run `supervisor` until `signal` resolves or every watcher has ended.
async fn run_until_signal<S>(supervisor: Supervisor, signal: S) -> Result<RunReport, DaemonError>
where
    S: Future<Output = Result<(), DaemonError>> + Send + 'static,
{
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok::<(), DaemonError>(()),
                signal = signal => {
                    signal?;
                    tracing::info!("received stop signal, shutting down");
                    let _ = shutdown.send(());
                    Ok(())
                }
            }
        })
    };

    let result = supervisor.run(shutdown_tx.clone()).await;

    // Release the signal task if the watchers ended on their own.
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;
    result
}

fn log_mapping(mapping: &Mapping) {
    tracing::info!(
        prefix = %mapping.source_prefix(),
        path = %mapping.target_directory().display(),
        onchange = mapping.on_change_command().unwrap_or(""),
        "mapping configured",
    );
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<(), DaemonError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate =
        signal(SignalKind::terminate()).map_err(|e| DaemonError::Signal(e.to_string()))?;
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.map_err(|e| DaemonError::Signal(e.to_string())),
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<(), DaemonError> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| DaemonError::Signal(e.to_string()))
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Signal(format!("{task} task join failure: {err}"))),
    }
}
