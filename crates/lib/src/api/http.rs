//! Blocking HTTP implementation of the repository client.
//!
//! Requests block with short, fixed timeouts and fail fast with a typed
//! error; there is no retrying. Identifier and token are percent-encoded
//! into the path and query.

use std::time::Duration;

use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::{ConfigData, ConfigPayload};

use super::{ApiError, ConfigApi};

/// Connect and total-response timeout for every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct ConfigResponse {
  config: ConfigPayload,
}

#[derive(Deserialize)]
struct IdentifiersResponse {
  identifiers: Vec<String>,
}

#[derive(Deserialize)]
struct RevisionResponse {
  revision: String,
}

/// Repository client over HTTP.
pub struct HttpApi {
  client: Client,
}

impl HttpApi {
  pub fn new() -> Result<Self, ApiError> {
    let client = Client::builder()
      .connect_timeout(REQUEST_TIMEOUT)
      .timeout(REQUEST_TIMEOUT)
      .build()?;

    Ok(HttpApi { client })
  }

  /// Build `{repo}/api/v1/config/{segment}?token={token}`.
  fn endpoint(&self, repo: &str, segment: &str, token: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(repo).map_err(|_| ApiError::BadUrl(repo.to_string()))?;

    url
      .path_segments_mut()
      .map_err(|_| ApiError::BadUrl(repo.to_string()))?
      .extend(["api", "v1", "config", segment]);
    url.query_pairs_mut().append_pair("token", token);

    Ok(url)
  }

  fn send(&self, method: Method, url: Url, payload: Option<String>) -> Result<serde_json::Value, ApiError> {
    debug!(%method, %url, "sending repository request");

    let mut request = self.client.request(method, url);
    if let Some(payload) = payload {
      request = request
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(payload);
    }

    let response = request.send()?;
    let status = response.status().as_u16();
    let body = response.text()?;

    if status == 404 {
      return Err(ApiError::not_found(&body));
    }
    if (400..500).contains(&status) {
      return Err(ApiError::authentication(&body));
    }
    if status >= 500 {
      return Err(ApiError::unexpected(&body));
    }

    if !body.starts_with('{') {
      return Err(ApiError::Malformed);
    }

    serde_json::from_str(&body).map_err(|_| ApiError::Malformed)
  }
}

impl ConfigApi for HttpApi {
  fn fetch_config(&self, repo: &str, token: &str, identifier: &str) -> Result<ConfigPayload, ApiError> {
    let url = self.endpoint(repo, identifier, token)?;
    let value = self.send(Method::GET, url, None)?;

    let response: ConfigResponse = serde_json::from_value(value).map_err(|_| ApiError::Malformed)?;
    Ok(response.config)
  }

  fn fetch_identifiers(&self, repo: &str, token: &str) -> Result<Vec<String>, ApiError> {
    let url = self.endpoint(repo, "identifiers", token)?;
    let value = self.send(Method::GET, url, None)?;

    let response: IdentifiersResponse = serde_json::from_value(value).map_err(|_| ApiError::Malformed)?;
    Ok(response.identifiers)
  }

  fn publish_config(
    &self,
    repo: &str,
    token: &str,
    identifier: &str,
    parent_revision: &str,
    data: &ConfigData,
  ) -> Result<String, ApiError> {
    let url = self.endpoint(repo, identifier, token)?;
    let payload = json!({
      "parent_revision": parent_revision,
      "data": data,
    });

    let value = self.send(Method::PUT, url, Some(payload.to_string()))?;

    let response: RevisionResponse = serde_json::from_value(value).map_err(|_| ApiError::Malformed)?;
    Ok(response.revision)
  }

  fn init_config(&self, repo: &str, token: &str, identifier: &str) -> Result<String, ApiError> {
    let url = self.endpoint(repo, identifier, token)?;
    let value = self.send(Method::POST, url, None)?;

    let response: RevisionResponse = serde_json::from_value(value).map_err(|_| ApiError::Malformed)?;
    Ok(response.revision)
  }
}
