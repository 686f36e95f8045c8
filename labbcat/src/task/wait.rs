use super::TaskStatus;
use crate::errors::LabbcatError;
use crate::types::TaskId;
use async_trait::async_trait;
use futures::future::BoxFuture;
use log::debug;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Polling interval when the server does not advise one.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(2);

/// Something which reports the status of server-side tasks.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn task_status(&self, task: &TaskId) -> Result<TaskStatus, LabbcatError>;
}

/// Waits for a task to finish by polling its status.
///
/// Resolves to the last status seen, which is still `running` if the wait
/// timed out or was cancelled. Neither stops the task on the server.
#[must_use = "a wait does nothing unless awaited"]
pub struct TaskWait<'a, S: TaskStatusSource + ?Sized> {
    source: &'a S,
    task: &'a TaskId,
    max_wait: Option<Duration>,
    default_refresh: Duration,
    cancel: CancellationToken,
}

impl<'a, S: TaskStatusSource + ?Sized> TaskWait<'a, S> {
    pub fn new(source: &'a S, task: &'a TaskId) -> Self {
        Self {
            source,
            task,
            max_wait: None,
            default_refresh: DEFAULT_REFRESH,
            cancel: CancellationToken::new(),
        }
    }

    /// Give up after this many seconds. Zero means no limit.
    pub fn max_seconds(self, seconds: u32) -> Self {
        let max_wait = (seconds > 0).then(|| Duration::from_secs(seconds.into()));
        Self { max_wait, ..self }
    }

    pub fn max_wait(self, max_wait: Duration) -> Self {
        Self {
            max_wait: Some(max_wait),
            ..self
        }
    }

    /// Polling interval when the server does not advise one.
    pub fn default_refresh(self, default_refresh: Duration) -> Self {
        Self {
            default_refresh,
            ..self
        }
    }

    /// Stop waiting when `cancel` is triggered.
    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    /// A token which stops this wait when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn wait(self) -> Result<TaskStatus, LabbcatError> {
        let deadline = self.max_wait.map(|d| Instant::now() + d);
        let mut status = self.source.task_status(self.task).await?;
        while status.running {
            let interval = status.refresh_interval().unwrap_or(self.default_refresh);
            let mut wake = Instant::now() + interval;
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    debug!("gave up waiting for {}", status);
                    break;
                }
                wake = wake.min(deadline);
            }
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("stopped waiting for {}", status);
                    break;
                }
                _ = tokio::time::sleep_until(wake) => {}
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!("gave up waiting for {}", status);
                break;
            }
            status = self.source.task_status(self.task).await?;
            debug!("{}", status);
        }
        Ok(status)
    }
}

impl<'a, S: TaskStatusSource + ?Sized> IntoFuture for TaskWait<'a, S> {
    type Output = Result<TaskStatus, LabbcatError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
