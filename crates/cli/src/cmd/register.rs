//! Register command implementation.
//!
//! Validates a repository URL, probes it with the given token, and records it
//! in the store.

use std::path::Path;

use anyhow::{bail, Result};
use owo_colors::OwoColorize;

use beacon_lib::store::lock::LockMode;

use crate::cmd::open_store;
use crate::output::print_success;

pub fn cmd_register(root: &Path, url: &str, token: Option<&str>) -> Result<()> {
  let (_lock, mut store) = open_store(root, LockMode::Exclusive, "register")?;

  let loader = store.register(url)?;
  let url = loader.url().to_string();

  let token = match token {
    Some(token) => token,
    None if loader.needs_token() => {
      bail!("repository \"{url}\" requires an access token (pass --token)")
    }
    None => "",
  };
  loader.init(token)?;

  store.save()?;
  print_success(&format!("Registered {}", url.cyan()));
  Ok(())
}
