//! The JSON envelope which LaBB-CAT wraps around every API response.

use crate::errors::LabbcatError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull};

/// A decoded LaBB-CAT response, e.g.
///
/// ```json
/// {"title":"LaBB-CAT","version":"20230818.1400","code":0,"errors":[],"messages":[],"model":{}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub http_status: StatusCode,
    pub title: Option<String>,
    pub version: Option<String>,
    /// Zero when the server did not send one.
    pub code: i64,
    pub errors: Vec<String>,
    pub messages: Vec<String>,
    pub model: Value,
    pub raw: String,
}

#[serde_as]
#[derive(Deserialize)]
struct Fields {
    title: Option<String>,
    version: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    code: i64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    errors: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default)]
    model: Value,
}

impl Envelope {
    /// Decode a response body.
    pub fn parse(http_status: StatusCode, body: &str) -> Result<Self, LabbcatError> {
        if body.trim().is_empty() {
            return Err(LabbcatError::Protocol {
                status: http_status,
                detail: "Empty response from server.".to_string(),
            });
        }
        let fields: Fields =
            serde_json::from_str(body).map_err(|e| LabbcatError::Protocol {
                status: http_status,
                detail: format!("Response not JSON: {}", e),
            })?;
        Ok(Self {
            http_status,
            title: fields.title,
            version: fields.version,
            code: fields.code,
            errors: fields.errors,
            messages: fields.messages,
            model: fields.model,
            raw: body.to_string(),
        })
    }

    /// Read and decode the body of a response.
    ///
    /// An error status whose body is not an envelope (e.g. a servlet container's
    /// HTML error page) is reported as [LabbcatError::Http].
    pub(crate) async fn from_response(res: reqwest::Response) -> Result<Self, LabbcatError> {
        let status = res.status();
        let body = res.text().await?;
        match Self::parse(status, &body) {
            Err(LabbcatError::Protocol { .. }) if !status.is_success() => Err(LabbcatError::Http {
                status,
                reason: status.canonical_reason().unwrap_or("unknown reason"),
                text: body,
            }),
            result => result,
        }
    }

    /// Fail if the server reported errors, a non-zero code, or a status other than 200.
    pub fn check_for_errors(self) -> Result<Self, LabbcatError> {
        if self.errors.is_empty() && self.code == 0 && self.http_status == StatusCode::OK {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> LabbcatError {
        let message = if !self.errors.is_empty() {
            self.errors.join("\n")
        } else if self.code != 0 {
            format!("Error code {}", self.code)
        } else {
            format!("HTTP {}", self.http_status)
        };
        LabbcatError::Response {
            status: self.http_status,
            code: self.code,
            title: self.title,
            message,
        }
    }

    pub fn is_model_null(&self) -> bool {
        self.model.is_null()
    }

    /// Deserialize the model.
    pub fn model<T: DeserializeOwned>(self) -> Result<T, LabbcatError> {
        let status = self.http_status;
        serde_json::from_value(self.model).map_err(|e| LabbcatError::Protocol {
            status,
            detail: format!("Unexpected model: {}", e),
        })
    }
}
