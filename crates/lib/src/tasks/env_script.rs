//! Generates a script which exports all environment variables.

use std::path::{Path, PathBuf};

use super::{Task, TaskError, write_artifact};
use crate::config::ConfigRead;

/// Renders `export KEY=value` lines to
/// `<etc.env.vars_location>/<host.name>.sh`.
pub struct EnvScript;

impl Task for EnvScript {
  fn identifier(&self) -> &'static str {
    "generate:env-script"
  }

  fn run(&self, config: &dyn ConfigRead) -> Result<PathBuf, TaskError> {
    let mut lines = Vec::new();

    for key in config.environment_variable_keys() {
      let value = config.environment_variable(&key)?;
      lines.push(format!("export {}={}", key, escape(&value)));
    }

    lines.push(String::new());

    let dir = config.fact("etc.env.vars_location")?;
    let path = Path::new(&dir).join(format!("{}.sh", config.fact("host.name")?));

    write_artifact(&path, &lines.join("\n"))?;
    Ok(path)
  }
}

/// Escape `$` and `\` so values survive shell sourcing verbatim.
fn escape(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());

  for c in value.chars() {
    if c == '$' || c == '\\' {
      escaped.push('\\');
    }
    escaped.push(c);
  }

  escaped
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Config, ConfigData};
  use crate::util::testutil::MemoryFactCache;
  use tempfile::TempDir;

  fn config_for(temp: &TempDir, env: &[(&str, &str)]) -> Config {
    let mut data = ConfigData::default();
    data
      .directives
      .insert("etc.env.vars_location".to_string(), temp.path().display().to_string());
    data.directives.insert("host.name".to_string(), "app.test".to_string());
    data.directives.insert("db.pass".to_string(), "hun$ter".to_string());
    for (key, value) in env {
      data.env_variables.insert(key.to_string(), value.to_string());
    }

    Config::resolve("app.test", &data, temp.path(), Box::new(MemoryFactCache::new())).unwrap()
  }

  #[test]
  fn writes_exports_to_host_script() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp, &[("APP_ENV", "prod")]);

    let path = EnvScript.run(&config).unwrap();

    assert_eq!(path, temp.path().join("app.test.sh"));
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("export APP_ENV=prod\n"));
  }

  #[test]
  fn expanded_values_are_escaped() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp, &[("DB_PASS", "%db.pass%")]);

    let path = EnvScript.run(&config).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains(r"export DB_PASS=hun\$ter"));
  }

  #[test]
  fn escape_handles_dollar_and_backslash() {
    assert_eq!(escape("a$b"), r"a\$b");
    assert_eq!(escape(r"a\b"), r"a\\b");
    assert_eq!(escape("plain"), "plain");
  }
}
