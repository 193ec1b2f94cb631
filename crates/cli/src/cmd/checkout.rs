//! Checkout command implementation.
//!
//! Writes an identifier's cached config data to `<identifier>.json` in the
//! store root so it can be edited and later published.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use beacon_lib::store::lock::LockMode;

use crate::cmd::open_store;
use crate::output::print_success;

pub fn cmd_checkout(root: &Path, identifier: &str) -> Result<()> {
  let (_lock, mut store) = open_store(root, LockMode::Exclusive, "checkout")?;

  let path = store.publisher(identifier)?.dump()?;

  store.save()?;
  print_success(&format!(
    "Checked out {} to {}",
    identifier.cyan(),
    path.display().to_string().cyan()
  ));
  Ok(())
}
