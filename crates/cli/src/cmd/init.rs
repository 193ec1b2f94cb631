//! Init command implementation.
//!
//! Creates a brand-new, empty config on a repository and adds it to the
//! store.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use beacon_lib::store::lock::LockMode;

use crate::cmd::open_store;
use crate::output::print_success;

pub fn cmd_init(root: &Path, identifier: &str, repository: &str) -> Result<()> {
  let (_lock, mut store) = open_store(root, LockMode::Exclusive, "init")?;

  let loader = store.add(identifier)?;
  let repository = repository.trim_end_matches('/');
  loader.init_new(repository)?;

  store.save()?;
  print_success(&format!("Created {} on {}", identifier.cyan(), repository.cyan()));
  Ok(())
}
