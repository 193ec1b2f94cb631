//! The synchronization store.
//!
//! A [`DataStore`] owns the registered repositories, the added identifiers
//! with their cached payloads, the per-identifier fact cache, and the
//! checkout bookkeeping. The whole state is one in-memory snapshot for the
//! process's lifetime: loaded once, mutated through the capability objects
//! ([`RepositoryLoader`], [`ConfigLoader`], [`Publisher`]), and written back
//! with [`DataStore::save`].
//!
//! # Modules
//!
//! - [`types`] - persisted document shape
//! - [`loader`] - repository/config registration workflows
//! - [`publisher`] - the checkout/update/publish workflow
//! - [`lock`] - multi-process file lock around load/mutate/save

pub mod loader;
pub mod lock;
pub mod publisher;
pub mod types;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::api::{ApiError, ConfigApi};
use crate::config::{Config, ConfigError, FactCache};

pub use loader::{ConfigLoader, RepositoryLoader};
pub use publisher::Publisher;
pub use types::{CheckoutMap, ConfigEntry, Document, FactCacheMap, FactEntry, RepositoryEntry};

/// File name of the persisted store document, kept in the store root.
pub const STORE_FILENAME: &str = "beacon.lock";

/// Errors that can occur while operating the store.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The URL is not `http(s)://host` with a plain lowercase host.
  #[error("invalid repository url \"{0}\"")]
  InvalidUrl(String),

  /// The URL is already registered.
  #[error("repository \"{0}\" already registered")]
  AlreadyRegistered(String),

  /// The repository could not be reached or refused the token.
  #[error("cannot access repository \"{url}\": {source}")]
  BadRepository {
    url: String,
    #[source]
    source: ApiError,
  },

  /// The identifier already exists in the store.
  #[error("config \"{0}\" already added")]
  AlreadyAdded(String),

  /// The identifier is not known to the store.
  #[error("config \"{0}\" not found")]
  ConfigNotFound(String),

  /// An operation referenced a repository URL that was never registered.
  #[error("repository \"{0}\" is not registered")]
  UnknownRepository(String),

  /// The checkout file was edited locally; updating would clobber it.
  #[error("checkout file \"{0}\" has local changes")]
  FileChanged(PathBuf),

  /// The remote revision matches the cached one; nothing to update.
  #[error("already up to date")]
  AlreadyUpToDate,

  /// No checkout exists to publish from.
  #[error("unknown checkout file \"{0}\"")]
  UnknownFile(PathBuf),

  #[error(transparent)]
  Api(#[from] ApiError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("failed to read \"{path}\": {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write \"{path}\": {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse \"{path}\": {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize store document: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// The synchronization store.
pub struct DataStore {
  root: PathBuf,
  api: Box<dyn ConfigApi>,
  pub(crate) repositories: Vec<RepositoryEntry>,
  pub(crate) facts: Rc<RefCell<FactCacheMap>>,
  pub(crate) entries: BTreeMap<String, ConfigEntry>,
  pub(crate) checkouts: CheckoutMap,
}

impl DataStore {
  /// Open the store rooted at `root`, loading `beacon.lock` if present.
  ///
  /// The root directory holds the persisted document, checkout files, and
  /// include files.
  pub fn open(root: &Path, api: Box<dyn ConfigApi>) -> Result<Self, StoreError> {
    let path = root.join(STORE_FILENAME);

    let document = match fs::read_to_string(&path) {
      Ok(content) => serde_json::from_str(&content).map_err(|e| StoreError::Parse { path, source: e })?,
      Err(e) if e.kind() == io::ErrorKind::NotFound => Document::default(),
      Err(e) => return Err(StoreError::Read { path, source: e }),
    };

    let Document(repositories, facts, entries, checkouts) = document;
    debug!(
      root = %root.display(),
      repositories = repositories.len(),
      configs = entries.len(),
      "opened store"
    );

    Ok(DataStore {
      root: root.to_path_buf(),
      api,
      repositories,
      facts: Rc::new(RefCell::new(facts)),
      entries,
      checkouts,
    })
  }

  /// Persist the whole state as one snapshot.
  ///
  /// Writes to a temporary file in the root and renames into place so a
  /// crash mid-write never truncates the document.
  pub fn save(&self) -> Result<(), StoreError> {
    let path = self.document_path();
    let document = Document(
      self.repositories.clone(),
      self.facts.borrow().clone(),
      self.entries.clone(),
      self.checkouts.clone(),
    );

    let content = serde_json::to_string_pretty(&document).map_err(StoreError::Serialize)?;

    let temp = tempfile::NamedTempFile::new_in(&self.root).map_err(|e| StoreError::Write {
      path: path.clone(),
      source: e,
    })?;
    fs::write(temp.path(), content).map_err(|e| StoreError::Write {
      path: path.clone(),
      source: e,
    })?;
    temp.persist(&path).map_err(|e| StoreError::Write {
      path,
      source: e.error,
    })?;

    Ok(())
  }

  /// Directory holding the document, checkout files and include files.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path of the persisted document.
  pub fn document_path(&self) -> PathBuf {
    self.root.join(STORE_FILENAME)
  }

  /// URLs of all registered repositories, in registration order.
  pub fn repositories(&self) -> Vec<&str> {
    self.repositories.iter().map(|r| r.url.as_str()).collect()
  }

  /// All added identifiers.
  pub fn identifiers(&self) -> Vec<&str> {
    self.entries.keys().map(String::as_str).collect()
  }

  /// The cached entry for an identifier.
  pub fn entry(&self, identifier: &str) -> Option<&ConfigEntry> {
    self.entries.get(identifier)
  }

  /// Begin registering a repository.
  ///
  /// The URL is normalized (trailing slashes stripped) and validated; no
  /// state is written until the returned loader is initialized with a token.
  pub fn register(&mut self, url: &str) -> Result<RepositoryLoader<'_>, StoreError> {
    let url = url.trim_end_matches('/').to_string();

    if !is_valid_repository_url(&url) {
      return Err(StoreError::InvalidUrl(url));
    }

    if self.repositories.iter().any(|r| r.url == url) {
      return Err(StoreError::AlreadyRegistered(url));
    }

    Ok(RepositoryLoader::new(self, url))
  }

  /// Begin adding an identifier.
  ///
  /// No state is written until the returned loader pulls the config from a
  /// repository.
  pub fn add(&mut self, identifier: &str) -> Result<ConfigLoader<'_>, StoreError> {
    if self.entries.contains_key(identifier) {
      return Err(StoreError::AlreadyAdded(identifier.to_string()));
    }

    Ok(ConfigLoader::new(self, identifier.to_string()))
  }

  /// The checkout/update/publish workflow for one identifier.
  pub fn publisher(&mut self, identifier: &str) -> Result<Publisher<'_>, StoreError> {
    if !self.entries.contains_key(identifier) {
      return Err(StoreError::ConfigNotFound(identifier.to_string()));
    }

    Ok(Publisher::new(self, identifier.to_string()))
  }

  /// Materialize the fact resolver for one identifier.
  pub fn config(&self, identifier: &str) -> Result<Config, StoreError> {
    let entry = self
      .entries
      .get(identifier)
      .ok_or_else(|| StoreError::ConfigNotFound(identifier.to_string()))?;

    let config = Config::resolve(
      identifier,
      &entry.config.data,
      &self.root,
      Box::new(self.scoped(identifier)),
    )?;
    Ok(config)
  }

  /// Materialize fact resolvers for every added identifier.
  pub fn configs(&self) -> Result<Vec<Config>, StoreError> {
    self.entries.keys().map(|identifier| self.config(identifier)).collect()
  }

  pub(crate) fn api(&self) -> &dyn ConfigApi {
    &*self.api
  }

  pub(crate) fn token_for(&self, url: &str) -> Result<&str, StoreError> {
    self
      .repositories
      .iter()
      .find(|r| r.url == url)
      .map(|r| r.token.as_str())
      .ok_or_else(|| StoreError::UnknownRepository(url.to_string()))
  }

  fn scoped(&self, identifier: &str) -> ScopedFactCache {
    ScopedFactCache {
      identifier: identifier.to_string(),
      facts: Rc::clone(&self.facts),
    }
  }
}

/// Fact cache handle bound to one identifier, sharing the store's map.
pub struct ScopedFactCache {
  identifier: String,
  facts: Rc<RefCell<FactCacheMap>>,
}

impl FactCache for ScopedFactCache {
  fn lookup(&self, key: &str, hash: &str) -> Option<String> {
    let facts = self.facts.borrow();
    let entry = facts.get(&self.identifier)?.get(key)?;
    (entry.hash == hash).then(|| entry.value.clone())
  }

  fn store(&self, key: &str, hash: &str, value: &str) {
    self.facts.borrow_mut().entry(self.identifier.clone()).or_default().insert(
      key.to_string(),
      FactEntry {
        hash: hash.to_string(),
        value: value.to_string(),
      },
    );
  }
}

/// Repository URLs are `http(s)://host` where the host is lowercase
/// alphanumerics, `_`, `.` or `-`. No path, query or port segment.
fn is_valid_repository_url(url: &str) -> bool {
  let host = match url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) {
    Some(host) => host,
    None => return false,
  };

  !host.is_empty()
    && host
      .bytes()
      .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'.' || b == b'-')
}
