//! Publish command implementation.
//!
//! Pushes the edits in an identifier's checkout file back to its repository,
//! using the revision recorded at checkout time as the publish parent.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use beacon_lib::store::lock::LockMode;

use crate::cmd::open_store;
use crate::output::print_success;

pub fn cmd_publish(root: &Path, identifier: &str) -> Result<()> {
  let (_lock, mut store) = open_store(root, LockMode::Exclusive, "publish")?;

  let revision = store.publisher(identifier)?.publish()?;

  store.save()?;
  print_success(&format!(
    "Published {} as revision {}",
    identifier.cyan(),
    revision.green()
  ));
  Ok(())
}
