//! The connection which every capability of a client sends its requests through.

use crate::auth::{AuthPhase, Authorization, Negotiator};
use crate::errors::LabbcatError;
use crate::requests::Params;
use crate::response::Envelope;
use crate::types::LabbcatUrl;
use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const APPLICATION_JSON: &str = "application/json";

pub(crate) struct Session {
    client: ClientWithMiddleware,
    url: LabbcatUrl,
    auth: Negotiator,
    /// Deadline of requests for response envelopes. Uploads and downloads have none.
    timeout: Duration,
    pub default_refresh: Duration,
}

impl Session {
    pub fn new(
        client: ClientWithMiddleware,
        url: LabbcatUrl,
        auth: Negotiator,
        timeout: Duration,
        default_refresh: Duration,
    ) -> Self {
        Self {
            client,
            url,
            auth,
            timeout,
            default_refresh,
        }
    }

    pub fn url(&self) -> &LabbcatUrl {
        &self.url
    }

    pub async fn authorization(&self) -> Result<Option<Authorization>, LabbcatError> {
        self.auth.authorization().await
    }

    pub async fn auth_phase(&self) -> AuthPhase {
        self.auth.phase().await
    }

    fn authorize(req: RequestBuilder, authorization: &Option<Authorization>) -> RequestBuilder {
        match authorization {
            Some(authorization) => {
                let (name, value) = authorization.header();
                req.header(name, value)
            }
            None => req,
        }
    }

    /// Send a request with the cached authorization.
    ///
    /// If the server rejects an authorization which it accepted before (e.g. the
    /// session expired), authorization is negotiated again and the request is sent
    /// one more time, so `build` may be called twice.
    pub async fn send<F>(&self, build: F) -> Result<reqwest::Response, LabbcatError>
    where
        F: Fn(&ClientWithMiddleware) -> RequestBuilder + Send + Sync,
    {
        let authorization = self.auth.authorization().await?;
        let res = Self::authorize(build(&self.client), &authorization)
            .send()
            .await?;
        if res.status() != StatusCode::UNAUTHORIZED {
            return Ok(res);
        }
        warn!("authorization for {} is no longer accepted", self.url);
        self.auth.invalidate(&authorization).await;
        let authorization = self.auth.authorization().await?;
        let res = Self::authorize(build(&self.client), &authorization)
            .send()
            .await?;
        Ok(res)
    }

    /// `GET` a resource, with parameters in the query string.
    pub async fn get(&self, resource: &str, params: &Params) -> Result<Envelope, LabbcatError> {
        let url = self.url.join(resource);
        debug!("GET {} {:?}", url, params);
        let res = self
            .send(|c| {
                c.get(&url)
                    .query(params)
                    .header(ACCEPT, APPLICATION_JSON)
                    .timeout(self.timeout)
            })
            .await?;
        Envelope::from_response(res).await?.check_for_errors()
    }

    /// `POST` a form to a resource.
    pub async fn post(&self, resource: &str, params: &Params) -> Result<Envelope, LabbcatError> {
        let url = self.url.join(resource);
        debug!("POST {} {:?}", url, params);
        let res = self
            .send(|c| {
                c.post(&url)
                    .form(params)
                    .header(ACCEPT, APPLICATION_JSON)
                    .timeout(self.timeout)
            })
            .await?;
        Envelope::from_response(res).await?.check_for_errors()
    }

    /// Send a JSON body to a resource.
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        resource: &str,
        body: &T,
    ) -> Result<Envelope, LabbcatError> {
        let url = self.url.join(resource);
        let body = serde_json::to_string(body)
            .map_err(|e| LabbcatError::InvalidArgument(e.to_string()))?;
        debug!("{} {} {}", method, url, body);
        let res = self
            .send(|c| {
                c.request(method.clone(), &url)
                    .header(ACCEPT, APPLICATION_JSON)
                    .header(CONTENT_TYPE, APPLICATION_JSON)
                    .body(body.clone())
                    .timeout(self.timeout)
            })
            .await?;
        Envelope::from_response(res).await?.check_for_errors()
    }

    pub async fn delete(&self, resource: &str) -> Result<Envelope, LabbcatError> {
        let url = self.url.join(resource);
        debug!("DELETE {}", url);
        let res = self
            .send(|c| {
                c.delete(&url)
                    .header(ACCEPT, APPLICATION_JSON)
                    .timeout(self.timeout)
            })
            .await?;
        Envelope::from_response(res).await?.check_for_errors()
    }

    /// `GET` a resource which is not a response envelope, e.g. a media file.
    /// The response status is not checked.
    pub async fn download(
        &self,
        resource: &str,
        params: &Params,
        accept: &str,
    ) -> Result<reqwest::Response, LabbcatError> {
        let url = self.url.join(resource);
        debug!("GET {} {:?} ({})", url, params, accept);
        self.send(|c| c.get(&url).query(params).header(ACCEPT, accept))
            .await
    }

    /// `POST` a multipart form, which may stream the contents of files.
    ///
    /// A form can only be sent once, so it is not resent after a rejected authorization.
    /// Returns `None` if `cancel` was triggered before or during the upload.
    pub async fn post_multipart(
        &self,
        resource: &str,
        form: Form,
        cancel: &CancellationToken,
    ) -> Result<Option<Envelope>, LabbcatError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let url = self.url.join(resource);
        let authorization = self.auth.authorization().await?;
        debug!("POST {} (multipart)", url);
        let req = Self::authorize(
            self.client
                .post(&url)
                .header(ACCEPT, APPLICATION_JSON)
                .multipart(form),
            &authorization,
        );
        match req.send().await {
            Ok(res) if res.status() == StatusCode::UNAUTHORIZED => {
                self.auth.invalidate(&authorization).await;
                Envelope::from_response(res).await?.check_for_errors().map(Some)
            }
            Ok(res) => Envelope::from_response(res).await?.check_for_errors().map(Some),
            Err(_) if cancel.is_cancelled() => {
                debug!("upload to {} was cancelled", url);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
