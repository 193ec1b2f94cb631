//! Add command implementation.
//!
//! Pulls an identifier's config from a registered repository and caches it in
//! the store.

use std::path::Path;

use anyhow::{bail, Result};
use owo_colors::OwoColorize;

use beacon_lib::store::lock::LockMode;

use crate::cmd::open_store;
use crate::output::print_success;

pub fn cmd_add(root: &Path, identifier: &str, repository: Option<&str>) -> Result<()> {
  let (_lock, mut store) = open_store(root, LockMode::Exclusive, "add")?;

  let loader = store.add(identifier)?;
  let repository = match repository {
    Some(url) => url.trim_end_matches('/').to_string(),
    None => {
      let candidates = loader.repositories()?;
      match candidates.as_slice() {
        [] => bail!("no registered repository serves \"{identifier}\""),
        [only] => only.clone(),
        multiple => bail!(
          "\"{identifier}\" exists in multiple repositories, pass --repository:\n  {}",
          multiple.join("\n  ")
        ),
      }
    }
  };

  loader.init_from(&repository)?;
  store.save()?;
  print_success(&format!("Added {} from {}", identifier.cyan(), repository.cyan()));
  Ok(())
}
