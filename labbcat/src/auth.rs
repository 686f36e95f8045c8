//! Discovery of the authorization LaBB-CAT requires, and the cache of the result.
//!
//! LaBB-CAT is either open, protected by HTTP Basic authentication, or protected by a
//! servlet container login form with a session cookie. Which one is found out by
//! requesting the store root without credentials and looking at the challenge of a
//! `401` response.

mod credentials;

pub use credentials::*;

use crate::errors::{AuthError, LabbcatError};
use crate::response::Envelope;
use crate::types::LabbcatUrl;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info, warn};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, COOKIE, SET_COOKIE,
    WWW_AUTHENTICATE,
};
use reqwest::StatusCode;
use std::fmt;
use tokio::sync::Mutex;

pub(crate) const STORE_RESOURCE: &str = "api/store/";
const LOGIN_RESOURCE: &str = "j_security_check";

/// How the server wants to be authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Form,
}

impl AuthScheme {
    /// Interpret the `WWW-Authenticate` header of a `401` response. A missing challenge
    /// means the server expects a login form.
    pub fn from_challenge(challenge: Option<&str>) -> Result<Self, LabbcatError> {
        match challenge.and_then(|c| c.split_whitespace().next()) {
            None => Ok(Self::Form),
            Some(scheme) if scheme.eq_ignore_ascii_case("basic") => Ok(Self::Basic),
            Some(scheme) if scheme.eq_ignore_ascii_case("form") => Ok(Self::Form),
            Some(_) => Err(LabbcatError::NotImplemented(
                "authentication schemes other than Basic and Form",
            )),
        }
    }
}

/// A negotiated authorization which is attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Authorization {
    name: HeaderName,
    value: HeaderValue,
}

impl Authorization {
    fn basic(credentials: &Credentials) -> Result<Self, LabbcatError> {
        let encoded = STANDARD.encode(format!(
            "{}:{}",
            credentials.username, credentials.password
        ));
        Ok(Self {
            name: AUTHORIZATION,
            value: sensitive(format!("Basic {}", encoded))?,
        })
    }

    /// `cookie` is `name=value`.
    fn cookie(cookie: String) -> Result<Self, LabbcatError> {
        Ok(Self {
            name: COOKIE,
            value: sensitive(cookie)?,
        })
    }

    pub fn scheme(&self) -> AuthScheme {
        if self.name == AUTHORIZATION {
            AuthScheme::Basic
        } else {
            AuthScheme::Form
        }
    }

    /// The cached token: `Basic <base64>` or `Cookie: <name>=<value>`.
    pub fn token(&self) -> String {
        let value = String::from_utf8_lossy(self.value.as_bytes());
        match self.scheme() {
            AuthScheme::Basic => value.to_string(),
            AuthScheme::Form => format!("Cookie: {}", value),
        }
    }

    pub(crate) fn header(&self) -> (HeaderName, HeaderValue) {
        (self.name.clone(), self.value.clone())
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorization")
            .field("scheme", &self.scheme())
            .finish_non_exhaustive()
    }
}

fn sensitive(value: String) -> Result<HeaderValue, LabbcatError> {
    let mut value = HeaderValue::try_from(value).map_err(|_| {
        LabbcatError::InvalidArgument(
            "credentials contain characters which cannot be sent in an HTTP header"
                .to_string(),
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// `name=value` of the first `Set-Cookie` header.
fn first_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .find(|c| c.contains('='))
        .map(str::to_string)
}

/// Progress of authorization.
#[derive(Debug, Clone)]
pub enum AuthPhase {
    Unauthenticated,
    Negotiating,
    /// `None` if the server does not require authorization.
    Authenticated(Option<Authorization>),
}

struct AuthState {
    phase: AuthPhase,
    credentials: Option<Credentials>,
}

/// Negotiates authorization once and caches the result for all requests of a client.
///
/// Negotiation happens under a lock, so concurrent requests wait for a single negotiation.
pub(crate) struct Negotiator {
    client: reqwest::Client,
    store_url: String,
    login_url: String,
    min_version: String,
    provider: Box<dyn CredentialProvider>,
    state: Mutex<AuthState>,
}

impl Negotiator {
    /// `client` must not follow redirects, so that login cookies are seen.
    pub fn new(
        client: reqwest::Client,
        url: &LabbcatUrl,
        min_version: String,
        credentials: Option<Credentials>,
        provider: Box<dyn CredentialProvider>,
    ) -> Self {
        Self {
            client,
            store_url: url.join(STORE_RESOURCE),
            login_url: url.join(LOGIN_RESOURCE),
            min_version,
            provider,
            state: Mutex::new(AuthState {
                phase: AuthPhase::Unauthenticated,
                credentials,
            }),
        }
    }

    pub async fn phase(&self) -> AuthPhase {
        self.state.lock().await.phase.clone()
    }

    /// Get the cached authorization, negotiating it first if necessary.
    pub async fn authorization(&self) -> Result<Option<Authorization>, LabbcatError> {
        let mut state = self.state.lock().await;
        if let AuthPhase::Authenticated(authorization) = &state.phase {
            return Ok(authorization.clone());
        }
        state.phase = AuthPhase::Negotiating;
        match self.negotiate(&mut state.credentials).await {
            Ok(authorization) => {
                state.phase = AuthPhase::Authenticated(authorization.clone());
                Ok(authorization)
            }
            Err(e) => {
                state.phase = AuthPhase::Unauthenticated;
                Err(e)
            }
        }
    }

    /// Forget a cached authorization which the server no longer accepts.
    /// Does nothing if another request already replaced it.
    pub async fn invalidate(&self, rejected: &Option<Authorization>) {
        let mut state = self.state.lock().await;
        if matches!(&state.phase, AuthPhase::Authenticated(a) if a == rejected) {
            state.phase = AuthPhase::Unauthenticated;
        }
    }

    async fn negotiate(
        &self,
        credentials: &mut Option<Credentials>,
    ) -> Result<Option<Authorization>, LabbcatError> {
        let res = self.request_store(None).await?;
        if res.status() != StatusCode::UNAUTHORIZED {
            let envelope = Envelope::from_response(res).await?.check_for_errors()?;
            self.check_version(&envelope)?;
            debug!("{} does not require authorization", self.store_url);
            return Ok(None);
        }
        let challenge = res
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok());
        let scheme = AuthScheme::from_challenge(challenge)?;
        let session_cookie = first_cookie(res.headers());
        info!("{} requires {:?} authorization", self.store_url, scheme);

        let mut rejected = false;
        loop {
            // known credentials are kept until the server rejects them
            let attempt = match credentials.clone() {
                Some(known) => known,
                None => self.prompt(rejected).await?,
            };
            let authorization = match scheme {
                AuthScheme::Basic => Authorization::basic(&attempt)?,
                AuthScheme::Form => self.form_login(&attempt, session_cookie.as_deref()).await?,
            };
            let res = self.request_store(Some(&authorization)).await?;
            if res.status() == StatusCode::UNAUTHORIZED {
                warn!("credentials for {} were rejected", attempt.username);
                *credentials = None;
                rejected = true;
                continue;
            }
            let envelope = Envelope::from_response(res).await?.check_for_errors()?;
            self.check_version(&envelope)?;
            *credentials = Some(attempt);
            return Ok(Some(authorization));
        }
    }

    async fn prompt(&self, rejected: bool) -> Result<Credentials, AuthError> {
        let prompted = async {
            let username = self.provider.prompt_username().await?;
            let password = self.provider.prompt_password(&username).await?;
            Ok::<_, AuthError>(Credentials::new(username, password))
        }
        .await;
        match prompted {
            Err(AuthError::CredentialsRequired) if rejected => Err(AuthError::CredentialsInvalid),
            other => other,
        }
    }

    async fn request_store(
        &self,
        authorization: Option<&Authorization>,
    ) -> Result<reqwest::Response, LabbcatError> {
        let mut req = self
            .client
            .get(&self.store_url)
            .header(ACCEPT, "application/json");
        if let Some(authorization) = authorization {
            let (name, value) = authorization.header();
            req = req.header(name, value);
        }
        Ok(req.send().await?)
    }

    /// Submit the login form. The session cookie is whichever the login response sets,
    /// otherwise the one set when the session began.
    async fn form_login(
        &self,
        credentials: &Credentials,
        session_cookie: Option<&str>,
    ) -> Result<Authorization, LabbcatError> {
        let mut req = self.client.post(&self.login_url).form(&[
            ("j_username", credentials.username.as_str()),
            ("j_password", credentials.password.as_str()),
        ]);
        if let Some(cookie) = session_cookie {
            req = req.header(COOKIE, cookie);
        }
        let res = req.send().await?;
        let status = res.status();
        let cookie = first_cookie(res.headers())
            .or_else(|| session_cookie.map(str::to_string))
            .ok_or_else(|| LabbcatError::Protocol {
                status,
                detail: "Login did not start a session: no cookie was set".to_string(),
            })?;
        Authorization::cookie(cookie)
    }

    fn check_version(&self, envelope: &Envelope) -> Result<(), AuthError> {
        match envelope.version.as_deref() {
            Some(version) if version >= self.min_version.as_str() => Ok(()),
            server => Err(AuthError::ServerTooOld {
                server: server.map(str::to_string),
                required: self.min_version.clone(),
            }),
        }
    }
}
