use super::access::Access;
use super::session::Session;
use super::LabbcatClient;
use crate::auth::{BatchMode, CredentialProvider, Credentials, Negotiator};
use crate::config::{user_agent, ClientConfig};
use crate::errors::LabbcatError;
use crate::types::{LabbcatUrl, Username};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub struct LabbcatClientBuilder<A: Access> {
    url: LabbcatUrl,
    builder: reqwest_middleware::ClientBuilder,
    auth_client: reqwest::Client,
    credentials: Option<Credentials>,
    provider: Box<dyn CredentialProvider>,
    min_version: String,
    timeout: Duration,
    default_refresh: Duration,
    phantom: PhantomData<A>,
}

impl<A: Access> LabbcatClientBuilder<A> {
    pub(crate) fn new(url: LabbcatUrl, config: &ClientConfig) -> Result<Self, LabbcatError> {
        let client = http_client(config)?.build()?;
        let auth_client = http_client(config)?
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            url,
            builder: reqwest_middleware::ClientBuilder::new(client),
            auth_client,
            credentials: None,
            provider: Box::new(BatchMode),
            min_version: config.min_version.clone(),
            timeout: config.timeout,
            default_refresh: config.default_refresh,
            phantom: Default::default(),
        })
    }

    /// Credentials to try first, if the server asks for authorization.
    pub fn credentials(self, username: Username, password: String) -> Self {
        Self {
            credentials: Some(Credentials::new(username, password)),
            ..self
        }
    }

    /// Where to get credentials when they are needed but unknown or rejected.
    /// The default is [BatchMode], which fails instead.
    pub fn credential_provider<P: CredentialProvider + 'static>(self, provider: P) -> Self {
        Self {
            provider: Box::new(provider),
            ..self
        }
    }

    /// Add middleware to the HTTP client.
    pub fn with<M: reqwest_middleware::Middleware>(self, middleware: M) -> Self {
        Self {
            builder: self.builder.with(middleware),
            ..self
        }
    }

    /// Connect to LaBB-CAT, negotiating authorization and checking the server version.
    pub async fn connect(self) -> Result<LabbcatClient<A>, LabbcatError> {
        let negotiator = Negotiator::new(
            self.auth_client,
            &self.url,
            self.min_version,
            self.credentials,
            self.provider,
        );
        let session = Session::new(
            self.builder.build(),
            self.url,
            negotiator,
            self.timeout,
            self.default_refresh,
        );
        session.authorization().await?;
        Ok(LabbcatClient::new(Arc::new(session)))
    }
}

impl<A: Access> LabbcatClient<A> {
    /// Create a client builder.
    pub fn build(
        url: LabbcatUrl,
        config: &ClientConfig,
    ) -> Result<LabbcatClientBuilder<A>, LabbcatError> {
        LabbcatClientBuilder::new(url, config)
    }
}

fn http_client(config: &ClientConfig) -> Result<reqwest::ClientBuilder, LabbcatError> {
    let mut headers = HeaderMap::new();
    if let Some(language) = &config.language {
        let language = HeaderValue::from_str(language).map_err(|_| {
            LabbcatError::InvalidArgument(format!("Invalid language: {}", language))
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);
    }
    Ok(reqwest::ClientBuilder::new()
        .default_headers(headers)
        .user_agent(user_agent())
        .connect_timeout(config.connect_timeout))
}
