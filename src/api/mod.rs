pub(crate) mod auth;
pub(crate) mod matches;
pub(crate) mod players;
pub(crate) mod registrations;

use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{BackendError, KrewbiError, Result};

const REST_PREFIX: &str = "rest/v1/";
const RPC_PREFIX: &str = "rest/v1/rpc/";
const AUTH_PREFIX: &str = "auth/v1/";

/// HTTP plumbing shared by every backend call.
#[derive(Debug, Clone)]
pub(crate) struct Backend {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Backend {
    pub(crate) fn new(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of a table under the REST surface.
    pub(crate) fn table_url(&self, table: &str) -> Result<Url> {
        Ok(self.config.api_url.join(&format!("{REST_PREFIX}{table}"))?)
    }

    /// URL of a remote procedure.
    pub(crate) fn rpc_url(&self, function: &str) -> Result<Url> {
        Ok(self.config.api_url.join(&format!("{RPC_PREFIX}{function}"))?)
    }

    /// URL of an auth endpoint.
    pub(crate) fn auth_url(&self, path: &str) -> Result<Url> {
        Ok(self.config.api_url.join(&format!("{AUTH_PREFIX}{path}"))?)
    }

    /// Start a request with the project key and the caller's bearer token.
    /// Anonymous calls authenticate with the project key itself.
    pub(crate) fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.config.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }
}

/// Send a request and turn non-success statuses into [`KrewbiError::Backend`].
pub(crate) async fn send(builder: RequestBuilder, url: &Url) -> Result<Response> {
    debug!(url = %url, "calling backend");

    let response = builder.send().await.map_err(|e| KrewbiError::Http {
        url: url.to_string(),
        source: e,
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(KrewbiError::Backend {
        url: url.to_string(),
        status,
        error: BackendError::from_body(&body),
    })
}

/// Send a request and decode the JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(builder: RequestBuilder, url: &Url) -> Result<T> {
    send(builder, url)
        .await?
        .json()
        .await
        .map_err(|e| KrewbiError::ResponseBody {
            url: url.to_string(),
            source: e,
        })
}

/// PostgREST equality filter value.
pub(crate) fn eq(value: &str) -> String {
    format!("eq.{value}")
}
