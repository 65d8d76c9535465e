//! vRealize Automation REST client.
//!
//! [`VraClient`] owns the session for one run: the HTTP client, the base URL
//! and the bearer token obtained at startup. There is no token renewal; a
//! run is expected to finish well inside the token lifetime.

mod auth;
mod catalog;
mod error;
mod inventory;
mod request;
mod types;

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::backend::{Backend, BackendFuture, GuestRecord, PowerState, RequestStatus};
use crate::config::VraConfig;
use crate::types::{CatalogId, DestroyId, RequestId};

pub use error::VraError;
pub(crate) use error::CallError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const APPLICATION_JSON: &str = "application/json";
const CONSUMER_API: &str = "/catalog-service/api/consumer";

/// Authenticated session against a vRA appliance.
#[derive(Clone, Debug)]
pub struct VraClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    tenant: String,
    token: Option<String>,
}

impl VraClient {
    /// Builds an unauthenticated client from configuration.
    ///
    /// Certificate validation stays on unless
    /// [`VraConfig::insecure_skip_tls_verify`] is set, in which case a warning
    /// is logged.
    ///
    /// # Errors
    ///
    /// Returns [`VraError::Config`] when validation fails and
    /// [`VraError::Client`] when the HTTP client cannot be built.
    pub fn new(config: &VraConfig) -> Result<Self, VraError> {
        config.validate()?;
        let base_url = config.base_url();
        if config.insecure_skip_tls_verify {
            warn!(
                base_url = %base_url,
                "TLS certificate validation is disabled for the vRA endpoint"
            );
        }
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()
            .map_err(|err| VraError::Client {
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            base_url,
            username: config.username.trim().to_owned(),
            password: config.password.clone(),
            tenant: config.tenant.trim().to_owned(),
            token: None,
        })
    }

    /// Builds a client and exchanges the configured credentials for a bearer
    /// token.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::new`] or [`Self::authenticate`].
    pub async fn connect(config: &VraConfig) -> Result<Self, VraError> {
        let mut client = Self::new(config)?;
        client.authenticate().await?;
        Ok(client)
    }

    /// Base URL every API path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns `true` once a bearer token has been obtained.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let builder = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON))
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, CallError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(CallError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CallError> {
        Self::send(self.request(Method::GET, path).query(query)).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, CallError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // `json` keeps the content-type already set by `request`.
        Self::send(self.request(Method::POST, path).json(body)).await
    }
}

fn consumer_path(suffix: &str) -> String {
    format!("{CONSUMER_API}{suffix}")
}

impl Backend for VraClient {
    type Error = VraError;

    fn find_guest<'a>(
        &'a self,
        hostname: &'a str,
    ) -> BackendFuture<'a, Option<GuestRecord>, Self::Error> {
        Box::pin(async move { self.lookup_guest(hostname).await })
    }

    fn machine_status<'a>(
        &'a self,
        destroy_id: &'a DestroyId,
    ) -> BackendFuture<'a, PowerState, Self::Error> {
        Box::pin(async move { self.fetch_machine_status(destroy_id).await })
    }

    fn resolve_catalog_id<'a>(
        &'a self,
        blueprint_name: &'a str,
    ) -> BackendFuture<'a, CatalogId, Self::Error> {
        Box::pin(async move { self.catalog_id(blueprint_name).await })
    }

    fn request_template<'a>(
        &'a self,
        catalog_id: &'a CatalogId,
    ) -> BackendFuture<'a, Value, Self::Error> {
        Box::pin(async move { self.fetch_template(catalog_id).await })
    }

    fn submit_request<'a>(
        &'a self,
        catalog_id: &'a CatalogId,
        template: &'a Value,
    ) -> BackendFuture<'a, RequestId, Self::Error> {
        Box::pin(async move { self.create_request(catalog_id, template).await })
    }

    fn request_status<'a>(
        &'a self,
        request_id: &'a RequestId,
    ) -> BackendFuture<'a, RequestStatus, Self::Error> {
        Box::pin(async move { self.fetch_request_status(request_id).await })
    }
}
