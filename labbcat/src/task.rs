//! Server-side tasks, which LaBB-CAT calls "threads".
//!
//! Searches, layer generation and transcript uploads run in the background on the
//! server. They are identified by a [TaskId] and must be released when their results
//! are no longer needed.

mod status;
mod wait;

pub use status::TaskStatus;
pub use wait::{TaskStatusSource, TaskWait, DEFAULT_REFRESH};

use crate::client::access::Access;
use crate::errors::LabbcatError;
use crate::requests::Params;
use crate::types::TaskId;
use crate::LabbcatClient;
use async_trait::async_trait;
use std::collections::HashMap;

impl<A: Access> LabbcatClient<A> {
    /// Get the status of a task.
    pub async fn task_status(&self, task: &TaskId) -> Result<TaskStatus, LabbcatError> {
        self.session
            .get("thread", &Params::new().add("threadId", task))
            .await?
            .model()
    }

    /// Wait for a task to finish.
    ///
    /// ```no_run
    /// # use labbcat::{errors::LabbcatError, types::TaskId, LabbcatView};
    /// # async fn f(client: LabbcatView, task: TaskId) -> Result<(), LabbcatError> {
    /// let status = client.wait_for_task(&task).max_seconds(30).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn wait_for_task<'a>(&'a self, task: &'a TaskId) -> TaskWait<'a, Self> {
        TaskWait::new(self, task).default_refresh(self.session.default_refresh)
    }

    /// Stop a running task.
    pub async fn cancel_task(&self, task: &TaskId) -> Result<(), LabbcatError> {
        self.task_command(task, "cancel").await
    }

    /// Release the resources of a finished task. The task can no longer be used.
    pub async fn release_task(&self, task: &TaskId) -> Result<(), LabbcatError> {
        self.task_command(task, "release").await
    }

    async fn task_command(&self, task: &TaskId, command: &str) -> Result<(), LabbcatError> {
        let params = Params::new()
            .add("threadId", task)
            .add("command", command);
        self.session.get("threads", &params).await?;
        Ok(())
    }

    /// Get the status of all tasks on the server.
    pub async fn get_tasks(&self) -> Result<HashMap<TaskId, TaskStatus>, LabbcatError> {
        let tasks: Option<HashMap<TaskId, TaskStatus>> =
            self.session.get("threads", &Params::new()).await?.model()?;
        Ok(tasks.unwrap_or_default())
    }
}

#[async_trait]
impl<A: Access> TaskStatusSource for LabbcatClient<A> {
    async fn task_status(&self, task: &TaskId) -> Result<TaskStatus, LabbcatError> {
        LabbcatClient::task_status(self, task).await
    }
}
