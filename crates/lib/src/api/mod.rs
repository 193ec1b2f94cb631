//! Remote config repository client.
//!
//! The wire contract is small: four JSON-over-HTTP operations against a
//! repository URL, authenticated by an opaque per-repository token passed as
//! a query parameter. HTTP status codes are normalized into [`ApiError`]
//! variants; error bodies may carry `error_message` / `error_code`.
//!
//! # Modules
//!
//! - [`http`] - the blocking reqwest implementation

pub mod http;

use thiserror::Error;

use crate::config::{ConfigData, ConfigPayload};

pub use http::HttpApi;

/// Errors reported by a config repository, by cause.
#[derive(Debug, Error)]
pub enum ApiError {
  /// 404: the identifier (or endpoint) does not exist on the repository.
  #[error("not found error: {message}")]
  NotFound { message: String, code: i64 },

  /// Any other 4xx: the token was rejected or the request was invalid.
  #[error("authentication error: {message}")]
  Authentication { message: String, code: i64 },

  /// 5xx: the repository failed.
  #[error("unexpected error: {message}")]
  Unexpected { message: String, code: i64 },

  /// The response body was empty or not a JSON object.
  #[error("malformed or missing data")]
  Malformed,

  /// The request never produced a response (DNS, connect, timeout, ...).
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The repository URL cannot be used as a request base.
  #[error("bad repository url: {0}")]
  BadUrl(String),
}

impl ApiError {
  pub fn not_found(body: &str) -> Self {
    let (message, code) = decode_error_body(body);
    ApiError::NotFound { message, code }
  }

  pub fn authentication(body: &str) -> Self {
    let (message, code) = decode_error_body(body);
    ApiError::Authentication { message, code }
  }

  pub fn unexpected(body: &str) -> Self {
    let (message, code) = decode_error_body(body);
    ApiError::Unexpected { message, code }
  }
}

/// Extract `error_message` / `error_code` from an error body, defaulting to
/// `"Unknown Error"` / 0 when the body is not a JSON object or lacks them.
fn decode_error_body(body: &str) -> (String, i64) {
  if !body.starts_with('{') {
    return ("Unknown Error".to_string(), 0);
  }

  match serde_json::from_str::<serde_json::Value>(body) {
    Ok(value) => (
      value
        .get("error_message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown Error")
        .to_string(),
      value.get("error_code").and_then(|c| c.as_i64()).unwrap_or(0),
    ),
    Err(_) => ("Unknown Error".to_string(), 0),
  }
}

/// The operations a config repository supports.
///
/// Object-safe so stores can be driven by a test double.
pub trait ConfigApi {
  /// Fetch the full config payload for an identifier.
  fn fetch_config(&self, repo: &str, token: &str, identifier: &str) -> Result<ConfigPayload, ApiError>;

  /// List the identifiers the repository serves.
  fn fetch_identifiers(&self, repo: &str, token: &str) -> Result<Vec<String>, ApiError>;

  /// Publish edited data based on `parent_revision`.
  ///
  /// The repository is the sole arbiter of conflicts between
  /// `parent_revision` and its stored revision; a detected conflict surfaces
  /// as an [`ApiError`], not a local check. Returns the new revision.
  fn publish_config(
    &self,
    repo: &str,
    token: &str,
    identifier: &str,
    parent_revision: &str,
    data: &ConfigData,
  ) -> Result<String, ApiError>;

  /// Create a new, empty config on the repository. Returns its revision.
  fn init_config(&self, repo: &str, token: &str, identifier: &str) -> Result<String, ApiError>;
}
