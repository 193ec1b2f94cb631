//! Two-phase registration workflows.
//!
//! `register()` and `add()` hand out loader objects instead of writing state
//! immediately: validation or the network round-trip can still fail, and
//! nothing may be recorded in that case. Each loader holds a mutable handle
//! to the store plus the URL or identifier it was created for, and consumes
//! itself on the state-writing step.

use tracing::{debug, info};

use super::{ConfigEntry, DataStore, RepositoryEntry, StoreError};

/// Pending repository registration.
///
/// Created by [`DataStore::register`]; the repository is recorded only after
/// [`init`](RepositoryLoader::init) validated it with a token.
pub struct RepositoryLoader<'a> {
  store: &'a mut DataStore,
  url: String,
}

impl<'a> RepositoryLoader<'a> {
  pub(crate) fn new(store: &'a mut DataStore, url: String) -> Self {
    RepositoryLoader { store, url }
  }

  /// The normalized URL being registered.
  pub fn url(&self) -> &str {
    &self.url
  }

  /// Whether a token must be supplied. Always true; repositories have no
  /// anonymous access.
  pub fn needs_token(&self) -> bool {
    true
  }

  /// Validate reachability and auth, then record the repository.
  ///
  /// The identifier list is fetched purely as a probe; any client error is
  /// wrapped as [`StoreError::BadRepository`] and nothing is stored.
  pub fn init(self, token: &str) -> Result<(), StoreError> {
    self
      .store
      .api()
      .fetch_identifiers(&self.url, token)
      .map_err(|e| StoreError::BadRepository {
        url: self.url.clone(),
        source: e,
      })?;

    info!(url = %self.url, "registered repository");
    self.store.repositories.push(RepositoryEntry {
      url: self.url,
      token: token.to_string(),
    });

    Ok(())
  }
}

/// Pending identifier addition.
///
/// Created by [`DataStore::add`]; the entry is recorded only after a pull
/// from a chosen repository succeeded.
pub struct ConfigLoader<'a> {
  store: &'a mut DataStore,
  identifier: String,
}

impl<'a> ConfigLoader<'a> {
  pub(crate) fn new(store: &'a mut DataStore, identifier: String) -> Self {
    ConfigLoader { store, identifier }
  }

  /// The identifier being added.
  pub fn identifier(&self) -> &str {
    &self.identifier
  }

  /// URLs of registered repositories that serve this identifier, in
  /// registration order. Used to disambiguate when several repositories are
  /// registered.
  pub fn repositories(&self) -> Result<Vec<String>, StoreError> {
    let mut matches = Vec::new();

    for repository in &self.store.repositories {
      let identifiers = self.store.api().fetch_identifiers(&repository.url, &repository.token)?;
      if identifiers.iter().any(|i| *i == self.identifier) {
        matches.push(repository.url.clone());
      }
    }

    Ok(matches)
  }

  /// Fetch the config from `url` and create the entry. Pure creation; no
  /// merge with any pre-existing state.
  pub fn init_from(self, url: &str) -> Result<(), StoreError> {
    let token = self.store.token_for(url)?.to_string();
    let payload = self.store.api().fetch_config(url, &token, &self.identifier)?;

    debug!(identifier = %self.identifier, url, revision = %payload.revision, "added config");
    self.store.entries.insert(
      self.identifier,
      ConfigEntry {
        repository: url.to_string(),
        config: payload,
      },
    );

    Ok(())
  }

  /// Create the config on the repository first, then pull it.
  pub fn init_new(self, url: &str) -> Result<(), StoreError> {
    let token = self.store.token_for(url)?.to_string();
    self.store.api().init_config(url, &token, &self.identifier)?;

    self.init_from(url)
  }
}
