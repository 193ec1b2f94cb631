//! Artifact generators.
//!
//! Tasks consume a resolved config strictly through the read-only
//! [`ConfigRead`] surface and render files from it. Which tasks run for a
//! bundle is itself configuration: the bundle's task identifier list is
//! resolved against the registry here.
//!
//! # Modules
//!
//! - [`env_script`] - shell script exporting all environment variables
//! - [`vhost`] - Apache vhost file for a host

pub mod env_script;
pub mod vhost;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{ConfigError, ConfigRead};

pub use env_script::EnvScript;
pub use vhost::Vhost;

/// Errors that can occur while loading or running tasks.
#[derive(Debug, Error)]
pub enum TaskError {
  /// No task is registered under this identifier.
  #[error("unknown task \"{0}\"")]
  Unknown(String),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("failed to write \"{path}\": {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A runnable artifact generator.
pub trait Task {
  /// The identifier under which bundles request this task.
  fn identifier(&self) -> &'static str;

  /// Render the task's artifact from `config`. Returns the written path.
  fn run(&self, config: &dyn ConfigRead) -> Result<PathBuf, TaskError>;
}

/// All available tasks.
///
/// Please add any in alphabetical order.
pub fn all() -> Vec<Box<dyn Task>> {
  vec![Box::new(EnvScript), Box::new(Vhost)]
}

/// Resolve task identifiers to implementations, preserving order.
pub fn load(identifiers: &[String]) -> Result<Vec<Box<dyn Task>>, TaskError> {
  identifiers
    .iter()
    .map(|identifier| {
      all()
        .into_iter()
        .find(|task| task.identifier() == identifier)
        .ok_or_else(|| TaskError::Unknown(identifier.clone()))
    })
    .collect()
}

pub(crate) fn write_artifact(path: &Path, content: &str) -> Result<(), TaskError> {
  std::fs::write(path, content).map_err(|e| TaskError::Write {
    path: path.to_path_buf(),
    source: e,
  })
}
