//! Run command implementation.
//!
//! Resolves an identifier's config and executes its declared tasks, printing
//! the artifact each task produced.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use beacon_lib::config::ConfigRead;
use beacon_lib::store::lock::LockMode;
use beacon_lib::tasks;

use crate::cmd::open_store;
use crate::output::{print_info, symbols};

pub fn cmd_run(root: &Path, identifier: &str) -> Result<()> {
  let (_lock, store) = open_store(root, LockMode::Exclusive, "run")?;

  let config = store.config(identifier)?;
  let tasks = tasks::load(config.tasks())?;

  if tasks.is_empty() {
    print_info(&format!("{} declares no tasks", identifier.cyan()));
    return Ok(());
  }

  for task in &tasks {
    let path = task.run(&config)?;
    println!(
      "  {} {} {} {}",
      symbols::SUCCESS.green(),
      task.identifier().cyan(),
      symbols::ARROW,
      path.display()
    );
  }

  // Resolving facts may have generated and cached new secrets.
  store.save()?;
  Ok(())
}
