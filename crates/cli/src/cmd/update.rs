//! Update command implementation.
//!
//! Pulls the latest revision for one identifier, or for every added
//! identifier when none is given. Identifiers that are already at the latest
//! revision are skipped, not treated as failures.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use beacon_lib::store::StoreError;
use beacon_lib::store::lock::LockMode;

use crate::cmd::open_store;
use crate::output::symbols;

pub fn cmd_update(root: &Path, identifier: Option<&str>) -> Result<()> {
  let (_lock, mut store) = open_store(root, LockMode::Exclusive, "update")?;

  let identifiers: Vec<String> = match identifier {
    Some(identifier) => vec![identifier.to_string()],
    None => store.identifiers().iter().map(|s| s.to_string()).collect(),
  };

  for identifier in &identifiers {
    match store.publisher(identifier)?.update() {
      Ok(revision) => println!(
        "  {} {} {} {}",
        symbols::MODIFY.yellow(),
        identifier.cyan(),
        symbols::ARROW,
        revision.green()
      ),
      Err(StoreError::AlreadyUpToDate) => {
        println!("  {} {} already up to date", symbols::INFO, identifier.cyan());
      }
      Err(e) => {
        // Persist what already succeeded before surfacing the failure.
        store.save()?;
        return Err(e.into());
      }
    }
  }

  store.save()?;
  Ok(())
}
