//! Errors for this crate.
//! About anyhow: see https://github.com/TrueLayer/reqwest-middleware/issues/119

use reqwest::StatusCode;

pub use crate::search::InvalidMatchId;

#[derive(thiserror::Error, Debug)]
pub enum InvalidLabbcatUrl {
    #[error("Given URL does not end with \"/\": {0}")]
    TrailingSlash(String),

    #[error("Given URL does not start with \"http://\" or \"https://\": {0}")]
    Protocol(String),
}

aliri_braid::from_infallible!(InvalidLabbcatUrl);

/// Reasons why a session could not be authorized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The server requires credentials but none could be obtained.
    #[error("Username/password required")]
    CredentialsRequired,

    /// The server rejected the given credentials.
    #[error("Username/password invalid")]
    CredentialsInvalid,

    #[error(
        "Server version {} is older than the minimum required version {required}",
        .server.as_deref().unwrap_or("(unknown)")
    )]
    ServerTooOld {
        server: Option<String>,
        required: String,
    },

    /// The user dismissed the credentials prompt.
    #[error("Cancelled")]
    Cancelled,
}

/// Errors representing failed interactions with LaBB-CAT.
#[derive(thiserror::Error, Debug)]
pub enum LabbcatError {
    /// The server could not be reached, or the exchange broke off.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Error from reqwest middleware function.
    #[error(transparent)]
    Middleware(anyhow::Error),

    /// The response body is not a LaBB-CAT response envelope.
    #[error("({status}) {detail}")]
    Protocol { status: StatusCode, detail: String },

    /// Error response which is not a LaBB-CAT response envelope, e.g. an HTML error page.
    #[error("({status:?} {reason:?}): {text}")]
    Http {
        status: StatusCode,
        reason: &'static str,
        text: String,
    },

    /// Error reported by LaBB-CAT inside its response envelope.
    #[error("{message}")]
    Response {
        status: StatusCode,
        code: i64,
        title: Option<String>,
        message: String,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl LabbcatError {
    /// HTTP status of the response which caused this error, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            Self::Http { status, .. } => Some(*status),
            Self::Response { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

impl From<reqwest_middleware::Error> for LabbcatError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Middleware(e) => LabbcatError::Middleware(e),
            reqwest_middleware::Error::Reqwest(e) => LabbcatError::Transport(e),
        }
    }
}
