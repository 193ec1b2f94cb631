//! Test utilities for beacon-lib.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::api::{ApiError, ConfigApi};
use crate::config::{ConfigData, ConfigPayload, FactCache};

/// In-memory fact cache for resolver tests.
///
/// Mirrors the store-backed scoped cache: a value is valid only while the
/// recorded directive hash matches.
#[derive(Debug, Default)]
pub struct MemoryFactCache {
  entries: RefCell<BTreeMap<String, (String, String)>>,
}

impl MemoryFactCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of cached entries, for asserting cache behavior.
  pub fn len(&self) -> usize {
    self.entries.borrow().len()
  }
}

impl FactCache for MemoryFactCache {
  fn lookup(&self, key: &str, hash: &str) -> Option<String> {
    let entries = self.entries.borrow();
    let (cached_hash, value) = entries.get(key)?;
    (cached_hash == hash).then(|| value.clone())
  }

  fn store(&self, key: &str, hash: &str, value: &str) {
    self
      .entries
      .borrow_mut()
      .insert(key.to_string(), (hash.to_string(), value.to_string()));
  }
}

/// A recorded `publish_config` call.
#[derive(Debug, Clone)]
pub struct PublishCall {
  pub repo: String,
  pub identifier: String,
  pub parent_revision: String,
  pub data: ConfigData,
}

#[derive(Default)]
struct MockState {
  identifiers: Vec<(String, Vec<String>)>,
  payloads: BTreeMap<String, ConfigPayload>,
  publish_revision: Option<String>,
  published: Vec<PublishCall>,
  fail_identifiers: bool,
}

/// Programmable in-memory repository for store tests.
///
/// Clones share state, so a test can keep a handle and mutate responses
/// after the store has taken ownership of its copy.
#[derive(Clone, Default)]
pub struct MockApi {
  inner: Rc<RefCell<MockState>>,
}

impl MockApi {
  /// Set the identifier list served by a repository URL.
  pub fn with_identifiers(self, url: &str, identifiers: &[&str]) -> Self {
    self
      .inner
      .borrow_mut()
      .identifiers
      .push((url.to_string(), identifiers.iter().map(|s| s.to_string()).collect()));
    self
  }

  /// Set the payload served for an identifier (data given as JSON).
  pub fn with_payload(self, identifier: &str, data_json: &str, revision: &str) -> Self {
    self.set_payload(identifier, data_json, revision);
    self
  }

  /// Replace the payload served for an identifier mid-test.
  pub fn set_payload(&self, identifier: &str, data_json: &str, revision: &str) {
    let data: ConfigData = serde_json::from_str(data_json).unwrap();
    self.inner.borrow_mut().payloads.insert(
      identifier.to_string(),
      ConfigPayload {
        data,
        revision: revision.to_string(),
        parent_revision: None,
      },
    );
  }

  /// Make every `fetch_identifiers` call fail with an authentication error.
  pub fn failing_identifiers(self) -> Self {
    self.inner.borrow_mut().fail_identifiers = true;
    self
  }

  /// Set the revision returned by `publish_config` (default `"r2"`).
  pub fn with_publish_revision(self, revision: &str) -> Self {
    self.inner.borrow_mut().publish_revision = Some(revision.to_string());
    self
  }

  /// The `publish_config` calls seen so far.
  pub fn published(&self) -> Vec<PublishCall> {
    self.inner.borrow().published.clone()
  }
}

impl ConfigApi for MockApi {
  fn fetch_config(&self, _repo: &str, _token: &str, identifier: &str) -> Result<ConfigPayload, ApiError> {
    self
      .inner
      .borrow()
      .payloads
      .get(identifier)
      .cloned()
      .ok_or(ApiError::NotFound {
        message: "Unknown Error".to_string(),
        code: 0,
      })
  }

  fn fetch_identifiers(&self, repo: &str, _token: &str) -> Result<Vec<String>, ApiError> {
    let state = self.inner.borrow();
    if state.fail_identifiers {
      return Err(ApiError::Authentication {
        message: "Unknown Error".to_string(),
        code: 0,
      });
    }

    state
      .identifiers
      .iter()
      .find(|(url, _)| url == repo)
      .map(|(_, identifiers)| identifiers.clone())
      .ok_or(ApiError::NotFound {
        message: "Unknown Error".to_string(),
        code: 0,
      })
  }

  fn publish_config(
    &self,
    repo: &str,
    _token: &str,
    identifier: &str,
    parent_revision: &str,
    data: &ConfigData,
  ) -> Result<String, ApiError> {
    let mut state = self.inner.borrow_mut();
    state.published.push(PublishCall {
      repo: repo.to_string(),
      identifier: identifier.to_string(),
      parent_revision: parent_revision.to_string(),
      data: data.clone(),
    });

    Ok(state.publish_revision.clone().unwrap_or_else(|| "r2".to_string()))
  }

  fn init_config(&self, _repo: &str, _token: &str, identifier: &str) -> Result<String, ApiError> {
    self.inner.borrow_mut().payloads.insert(
      identifier.to_string(),
      ConfigPayload {
        data: ConfigData::default(),
        revision: "r0".to_string(),
        parent_revision: None,
      },
    );

    Ok("r0".to_string())
  }
}
