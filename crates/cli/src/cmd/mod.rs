mod add;
mod checkout;
mod init;
mod publish;
mod register;
mod run;
mod status;
mod update;

use std::path::Path;

use anyhow::{Context, Result};

use beacon_lib::api::HttpApi;
use beacon_lib::store::lock::{LockMode, StoreLock};
use beacon_lib::store::DataStore;

pub use add::cmd_add;
pub use checkout::cmd_checkout;
pub use init::cmd_init;
pub use publish::cmd_publish;
pub use register::cmd_register;
pub use run::cmd_run;
pub use status::cmd_status;
pub use update::cmd_update;

/// Acquire the store lock and open the store under `root`.
///
/// The lock guard must be kept alive for as long as the store is used; every
/// command holds it until it returns. Commands that only read take
/// [`LockMode::Shared`]; anything that may `save()` holds
/// [`LockMode::Exclusive`] for the whole load/mutate/save sequence, since a
/// lock cannot be upgraded without a race.
fn open_store(root: &Path, mode: LockMode, command: &str) -> Result<(StoreLock, DataStore)> {
  let lock = StoreLock::acquire(root, mode, command)?;
  let api = HttpApi::new().context("Failed to build HTTP client")?;
  let store = DataStore::open(root, Box::new(api))?;
  Ok((lock, store))
}
