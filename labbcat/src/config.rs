//! Client settings.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::time::Duration;

/// The oldest LaBB-CAT version which supports every API this client uses.
pub const MIN_LABBCAT_VERSION: &str = "20210210.2032";

/// Settings for connecting to LaBB-CAT.
///
/// Deserializable from any serde format, with missing fields taking their default values.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Servers reporting an older version are refused. Versions are compared as strings.
    pub min_version: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,
    /// Deadline of each API request. Uploads and fragment downloads are only
    /// limited by `connect_timeout` and cancellation.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    /// Time between task status polls, when the server does not advise one.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub default_refresh: Duration,
    /// Sent as `Accept-Language`, for localized server messages.
    pub language: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_version: MIN_LABBCAT_VERSION.to_string(),
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
            default_refresh: Duration::from_secs(2),
            language: None,
        }
    }
}

pub(crate) fn user_agent() -> String {
    format!("labbcat-rs/{}", env!("CARGO_PKG_VERSION"))
}
