//! The checkout/update/publish workflow.
//!
//! A [`Publisher`] is bound to one identifier. `dump()` materializes the
//! cached data as an editable checkout file; `update()` pulls remote changes
//! without ever clobbering a local edit; `publish()` pushes the file back
//! with the checkout's recorded revision as `parent_revision`, leaving
//! conflict detection to the server.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use super::{ConfigEntry, DataStore, StoreError};
use crate::config::ConfigData;

/// Per-identifier checkout workflow, obtained via [`DataStore::publisher`].
pub struct Publisher<'a> {
  store: &'a mut DataStore,
  identifier: String,
}

impl<'a> Publisher<'a> {
  pub(crate) fn new(store: &'a mut DataStore, identifier: String) -> Self {
    Publisher { store, identifier }
  }

  /// The well-known checkout file path: `<root>/<identifier>.json`.
  pub fn checkout_path(&self) -> PathBuf {
    self.store.root().join(format!("{}.json", self.identifier))
  }

  /// Whether a checkout file currently exists on disk.
  pub fn exists(&self) -> bool {
    self.checkout_path().exists()
  }

  fn entry(&self) -> Result<&ConfigEntry, StoreError> {
    self
      .store
      .entries
      .get(&self.identifier)
      .ok_or_else(|| StoreError::ConfigNotFound(self.identifier.clone()))
  }

  fn checkout_key(&self) -> String {
    self.checkout_path().to_string_lossy().into_owned()
  }

  /// Write the cached data to the checkout file and record its revision.
  ///
  /// Idempotent; a prior checkout of the same file is overwritten.
  pub fn dump(&mut self) -> Result<PathBuf, StoreError> {
    let entry = self.entry()?;
    let path = self.checkout_path();

    let content = serde_json::to_string_pretty(&entry.config.data).map_err(StoreError::Serialize)?;
    fs::write(&path, content).map_err(|e| StoreError::Write {
      path: path.clone(),
      source: e,
    })?;

    let revision = entry.config.revision.clone();
    debug!(identifier = %self.identifier, path = %path.display(), %revision, "checked out config");
    self.store.checkouts.insert(self.checkout_key(), revision);

    Ok(path)
  }

  /// Pull the latest payload from the config's repository.
  ///
  /// Fails with [`StoreError::FileChanged`] when the checkout file no longer
  /// matches the cached data (a local edit must never be silently
  /// overwritten) and with [`StoreError::AlreadyUpToDate`] when the remote
  /// revision is unchanged; in both cases no state is touched. On success
  /// the cached payload, the checkout file (if present) and the checkout's
  /// recorded revision all move to the fetched revision.
  pub fn update(&mut self) -> Result<String, StoreError> {
    let entry = self.entry()?;
    let path = self.checkout_path();

    if path.exists() {
      let content = fs::read_to_string(&path).map_err(|e| StoreError::Read {
        path: path.clone(),
        source: e,
      })?;

      // An unparseable file counts as changed; it cannot equal the cache.
      let on_disk = serde_json::from_str::<ConfigData>(&content).ok();
      if on_disk.as_ref() != Some(&entry.config.data) {
        return Err(StoreError::FileChanged(path));
      }
    }

    let repository = entry.repository.clone();
    let cached_revision = entry.config.revision.clone();
    let token = self.store.token_for(&repository)?.to_string();

    let payload = self.store.api().fetch_config(&repository, &token, &self.identifier)?;
    if payload.revision == cached_revision {
      return Err(StoreError::AlreadyUpToDate);
    }

    let revision = payload.revision.clone();
    info!(
      identifier = %self.identifier,
      from = %cached_revision,
      to = %revision,
      "updated config"
    );

    if path.exists() {
      let content = serde_json::to_string_pretty(&payload.data).map_err(StoreError::Serialize)?;
      fs::write(&path, content).map_err(|e| StoreError::Write {
        path: path.clone(),
        source: e,
      })?;
    }

    let key = self.checkout_key();
    if self.store.checkouts.contains_key(&key) {
      self.store.checkouts.insert(key, revision.clone());
    }

    if let Some(entry) = self.store.entries.get_mut(&self.identifier) {
      entry.config = payload;
    }

    Ok(revision)
  }

  /// Push the checkout file's contents back to the repository.
  ///
  /// Requires a prior `dump()`; absence of the file or its checkout record
  /// fails with [`StoreError::UnknownFile`]. The server alone arbitrates
  /// conflicts between the sent `parent_revision` and its stored revision.
  pub fn publish(&mut self) -> Result<String, StoreError> {
    let path = self.checkout_path();
    if !path.exists() {
      return Err(StoreError::UnknownFile(path));
    }

    let key = self.checkout_key();
    let parent_revision = self
      .store
      .checkouts
      .get(&key)
      .cloned()
      .ok_or_else(|| StoreError::UnknownFile(path.clone()))?;

    let content = fs::read_to_string(&path).map_err(|e| StoreError::Read {
      path: path.clone(),
      source: e,
    })?;
    let data: ConfigData = serde_json::from_str(&content).map_err(|e| StoreError::Parse { path, source: e })?;

    let entry = self.entry()?;
    let repository = entry.repository.clone();
    let token = self.store.token_for(&repository)?.to_string();

    let revision = self
      .store
      .api()
      .publish_config(&repository, &token, &self.identifier, &parent_revision, &data)?;

    info!(
      identifier = %self.identifier,
      parent = %parent_revision,
      %revision,
      "published config"
    );

    self.store.checkouts.insert(key, revision.clone());
    if let Some(entry) = self.store.entries.get_mut(&self.identifier) {
      entry.config.data = data;
      entry.config.parent_revision = Some(parent_revision);
      entry.config.revision = revision.clone();
    }

    Ok(revision)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::STORE_FILENAME;
  use crate::util::testutil::MockApi;
  use tempfile::TempDir;

  /// Store with repository `http://x.test` (token `t`) and identifier `svc`
  /// added at revision `r1` with directives `{"k": "v"}`.
  fn store_with_checkout_setup(temp: &TempDir) -> (DataStore, MockApi) {
    let api = MockApi::default()
      .with_identifiers("http://x.test", &["svc"])
      .with_payload("svc", r#"{"directives": {"k": "v"}}"#, "r1");

    let mut store = DataStore::open(temp.path(), Box::new(api.clone())).unwrap();
    store.register("http://x.test").unwrap().init("t").unwrap();
    store.add("svc").unwrap().init_from("http://x.test").unwrap();

    (store, api)
  }

  mod dump {
    use super::*;

    #[test]
    fn writes_file_and_records_revision() {
      let temp = TempDir::new().unwrap();
      let (mut store, _api) = store_with_checkout_setup(&temp);

      let path = store.publisher("svc").unwrap().dump().unwrap();

      assert!(path.exists());
      let data: ConfigData = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
      assert_eq!(data.directives.get("k").map(String::as_str), Some("v"));

      let key = path.to_string_lossy().into_owned();
      assert_eq!(store.checkouts.get(&key).map(String::as_str), Some("r1"));
    }

    #[test]
    fn redump_overwrites_prior_checkout() {
      let temp = TempDir::new().unwrap();
      let (mut store, _api) = store_with_checkout_setup(&temp);

      let mut publisher = store.publisher("svc").unwrap();
      let path = publisher.dump().unwrap();
      fs::write(&path, "scribbles").unwrap();
      publisher.dump().unwrap();

      let data: ConfigData = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
      assert_eq!(data.directives.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn exists_tracks_the_file() {
      let temp = TempDir::new().unwrap();
      let (mut store, _api) = store_with_checkout_setup(&temp);

      let mut publisher = store.publisher("svc").unwrap();
      assert!(!publisher.exists());
      publisher.dump().unwrap();
      assert!(publisher.exists());
    }
  }

  mod update {
    use super::*;

    #[test]
    fn locally_edited_file_is_never_overwritten() {
      let temp = TempDir::new().unwrap();
      let (mut store, api) = store_with_checkout_setup(&temp);

      let path = store.publisher("svc").unwrap().dump().unwrap();
      fs::write(&path, r#"{"directives": {"k": "edited"}}"#).unwrap();
      api.set_payload("svc", r#"{"directives": {"k": "remote"}}"#, "r2");

      let err = store.publisher("svc").unwrap().update().unwrap_err();
      assert!(matches!(err, StoreError::FileChanged(_)));

      // Entry and checkout are untouched.
      assert_eq!(store.entry("svc").unwrap().config.revision, "r1");
      let key = path.to_string_lossy().into_owned();
      assert_eq!(store.checkouts.get(&key).map(String::as_str), Some("r1"));
    }

    #[test]
    fn same_remote_revision_short_circuits() {
      let temp = TempDir::new().unwrap();
      let (mut store, _api) = store_with_checkout_setup(&temp);

      store.publisher("svc").unwrap().dump().unwrap();

      let err = store.publisher("svc").unwrap().update().unwrap_err();
      assert!(matches!(err, StoreError::AlreadyUpToDate));
      assert_eq!(store.entry("svc").unwrap().config.revision, "r1");
    }

    #[test]
    fn fetches_and_rewrites_checkout() {
      let temp = TempDir::new().unwrap();
      let (mut store, api) = store_with_checkout_setup(&temp);

      let path = store.publisher("svc").unwrap().dump().unwrap();
      api.set_payload("svc", r#"{"directives": {"k": "v2"}}"#, "r2");

      let revision = store.publisher("svc").unwrap().update().unwrap();
      assert_eq!(revision, "r2");

      let on_disk: ConfigData = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
      assert_eq!(on_disk.directives.get("k").map(String::as_str), Some("v2"));
      assert_eq!(store.entry("svc").unwrap().config.revision, "r2");
    }

    #[test]
    fn refreshes_checkout_revision() {
      // A publish right after an update must send the just-fetched revision
      // as parent, not the one recorded at dump time.
      let temp = TempDir::new().unwrap();
      let (mut store, api) = store_with_checkout_setup(&temp);

      let path = store.publisher("svc").unwrap().dump().unwrap();
      api.set_payload("svc", r#"{"directives": {"k": "v2"}}"#, "r2");
      store.publisher("svc").unwrap().update().unwrap();

      let key = path.to_string_lossy().into_owned();
      assert_eq!(store.checkouts.get(&key).map(String::as_str), Some("r2"));
    }

    #[test]
    fn works_without_a_checkout() {
      let temp = TempDir::new().unwrap();
      let (mut store, api) = store_with_checkout_setup(&temp);

      api.set_payload("svc", r#"{"directives": {"k": "v2"}}"#, "r2");

      let revision = store.publisher("svc").unwrap().update().unwrap();
      assert_eq!(revision, "r2");
      assert!(store.checkouts.is_empty());
    }
  }

  mod publish {
    use super::*;

    #[test]
    fn requires_a_prior_dump() {
      let temp = TempDir::new().unwrap();
      let (mut store, api) = store_with_checkout_setup(&temp);
      store.save().unwrap();
      let before = fs::read_to_string(temp.path().join(STORE_FILENAME)).unwrap();

      let err = store.publisher("svc").unwrap().publish().unwrap_err();
      assert!(matches!(err, StoreError::UnknownFile(_)));
      assert!(api.published().is_empty());

      // State is unchanged after the failure.
      store.save().unwrap();
      let after = fs::read_to_string(temp.path().join(STORE_FILENAME)).unwrap();
      assert_eq!(before, after);
    }

    #[test]
    fn sends_file_data_with_recorded_parent_revision() {
      let temp = TempDir::new().unwrap();
      let (mut store, api) = store_with_checkout_setup(&temp);

      let path = store.publisher("svc").unwrap().dump().unwrap();
      fs::write(&path, r#"{"directives": {"k": "v2"}}"#).unwrap();

      let revision = store.publisher("svc").unwrap().publish().unwrap();
      assert_eq!(revision, "r2");

      let calls = api.published();
      assert_eq!(calls.len(), 1);
      assert_eq!(calls[0].identifier, "svc");
      assert_eq!(calls[0].parent_revision, "r1");
      assert_eq!(calls[0].data.directives.get("k").map(String::as_str), Some("v2"));
    }

    #[test]
    fn advances_revision_bookkeeping() {
      let temp = TempDir::new().unwrap();
      let (mut store, _api) = store_with_checkout_setup(&temp);

      let path = store.publisher("svc").unwrap().dump().unwrap();
      fs::write(&path, r#"{"directives": {"k": "v2"}}"#).unwrap();
      store.publisher("svc").unwrap().publish().unwrap();

      let entry = store.entry("svc").unwrap();
      assert_eq!(entry.config.revision, "r2");
      assert_eq!(entry.config.parent_revision.as_deref(), Some("r1"));
      assert_eq!(entry.config.data.directives.get("k").map(String::as_str), Some("v2"));

      let key = path.to_string_lossy().into_owned();
      assert_eq!(store.checkouts.get(&key).map(String::as_str), Some("r2"));
    }
  }
}
