//! Status command implementation.
//!
//! Displays the registered repositories and every added identifier with its
//! cached revision and checkout state.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use beacon_lib::store::lock::LockMode;

use crate::cmd::open_store;
use crate::output::{print_info, symbols};

pub fn cmd_status(root: &Path) -> Result<()> {
  let (_lock, mut store) = open_store(root, LockMode::Shared, "status")?;

  let repositories: Vec<String> = store.repositories().iter().map(|s| s.to_string()).collect();
  if repositories.is_empty() {
    print_info("No repositories registered. Run 'beacon register <url>' first.");
    return Ok(());
  }

  println!("Repositories:");
  for url in &repositories {
    println!("  {} {}", symbols::INFO, url.cyan());
  }

  let identifiers: Vec<String> = store.identifiers().iter().map(|s| s.to_string()).collect();
  if identifiers.is_empty() {
    println!();
    print_info("No configs added.");
    return Ok(());
  }

  println!();
  println!("Configs:");
  for identifier in &identifiers {
    let revision = store
      .entry(identifier)
      .map(|entry| entry.config.revision.clone())
      .unwrap_or_default();
    let checked_out = store.publisher(identifier)?.exists();

    if checked_out {
      println!(
        "  {} {} {} (checked out)",
        symbols::MODIFY.yellow(),
        identifier.cyan(),
        revision.green()
      );
    } else {
      println!("  {} {} {}", symbols::INFO, identifier.cyan(), revision.green());
    }
  }

  Ok(())
}
