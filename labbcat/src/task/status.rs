use crate::types::{task_id_from_string_or_number, TaskId};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;

/// Progress of a long-running server-side task, e.g. a search or layer generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatus {
    #[serde(rename = "threadId", deserialize_with = "task_id_from_string_or_number")]
    pub task_id: TaskId,
    #[serde(rename = "threadName", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub running: bool,
    #[serde(rename = "duration", default, deserialize_with = "whole_number")]
    pub duration_seconds: u64,
    #[serde(rename = "percentComplete", default, deserialize_with = "whole_number")]
    pub percent_complete: u64,
    #[serde(rename = "status", default)]
    pub last_status_message: Option<String>,
    /// How often the server advises polling. Zero means no advice.
    #[serde(rename = "refreshSeconds", default, deserialize_with = "whole_number")]
    pub refresh_seconds: u64,
    #[serde(rename = "resultUrl", default)]
    pub result_url: Option<String>,
    #[serde(rename = "resultText", default)]
    pub result_label: Option<String>,
}

impl TaskStatus {
    /// The polling interval advised by the server, if any.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_seconds > 0).then(|| Duration::from_secs(self.refresh_seconds))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}% {}",
            self.name.as_deref().unwrap_or("task"),
            self.task_id,
            self.percent_complete,
            self.last_status_message.as_deref().unwrap_or("")
        )?;
        if self.running {
            write!(f, " (running)")?;
        }
        Ok(())
    }
}

/// Numbers may be sent as decimals or nulls. Fractions are truncated, nulls are zero.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let n: Option<f64> = Option::deserialize(deserializer)?;
    Ok(n.map(|n| n.max(0.0) as u64).unwrap_or_default())
}
