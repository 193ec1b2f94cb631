//! Persisted store state.
//!
//! The whole store is one JSON document, a 4-tuple saved and loaded
//! atomically together:
//!
//! ```json
//! [
//!   [{"url": "https://config.example.test", "token": "..."}],
//!   {"svc": {"db.password": {"hash": "...", "value": "..."}}},
//!   {"svc": {"repository": "https://config.example.test", "config": {...}}},
//!   {"/path/svc.json": "rev-2"}
//! ]
//! ```
//!
//! Repositories are a list so registration order survives serialization; the
//! order decides how repositories are offered when an identifier exists in
//! more than one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigPayload;

/// A registered repository: normalized URL plus its access token.
///
/// Never mutated after registration; removal only happens by not being
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryEntry {
  pub url: String,
  pub token: String,
}

/// An added identifier with its cached payload and source repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
  /// URL of the repository this config was pulled from.
  pub repository: String,
  /// The last payload fetched or published.
  pub config: ConfigPayload,
}

/// A cached fact value, valid while `hash` matches the directive's current
/// content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactEntry {
  pub hash: String,
  pub value: String,
}

/// Fact cache: identifier -> directive key -> cached entry.
pub type FactCacheMap = BTreeMap<String, BTreeMap<String, FactEntry>>;

/// Checkouts: checkout file path -> revision it was materialized from.
pub type CheckoutMap = BTreeMap<String, String>;

/// The persisted document: `[repositories, fact_cache, config_entries,
/// checkouts]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document(
  pub Vec<RepositoryEntry>,
  pub FactCacheMap,
  pub BTreeMap<String, ConfigEntry>,
  pub CheckoutMap,
);
