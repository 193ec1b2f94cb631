use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// beacon - distribute, resolve and publish configuration bundles
#[derive(Parser)]
#[command(name = "beacon")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Store directory (holds the state document and checkout files)
  #[arg(short = 'C', long, global = true, default_value = ".")]
  root: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Register a config repository
  Register {
    /// Repository URL (http(s)://host)
    url: String,

    /// Access token for the repository
    #[arg(short, long)]
    token: Option<String>,
  },

  /// Add an identifier from a registered repository
  Add {
    /// The identifier to add
    identifier: String,

    /// Repository URL to pull from (required when ambiguous)
    #[arg(short, long)]
    repository: Option<String>,
  },

  /// Create a new config on a repository and add it
  Init {
    /// The identifier to create
    identifier: String,

    /// Repository URL to create it on
    #[arg(short, long)]
    repository: String,
  },

  /// Write a config's data to its checkout file for editing
  Checkout {
    /// The identifier to check out
    identifier: String,
  },

  /// Pull the latest revision for one or all identifiers
  Update {
    /// The identifier to update (all when omitted)
    identifier: Option<String>,
  },

  /// Push a checked-out file's edits back to its repository
  Publish {
    /// The identifier to publish
    identifier: String,
  },

  /// Show registered repositories and added identifiers
  Status,

  /// Run a config's tasks
  Run {
    /// The identifier whose tasks to run
    identifier: String,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Register { url, token } => cmd::cmd_register(&cli.root, &url, token.as_deref()),
    Commands::Add { identifier, repository } => cmd::cmd_add(&cli.root, &identifier, repository.as_deref()),
    Commands::Init { identifier, repository } => cmd::cmd_init(&cli.root, &identifier, &repository),
    Commands::Checkout { identifier } => cmd::cmd_checkout(&cli.root, &identifier),
    Commands::Update { identifier } => cmd::cmd_update(&cli.root, identifier.as_deref()),
    Commands::Publish { identifier } => cmd::cmd_publish(&cli.root, &identifier),
    Commands::Status => cmd::cmd_status(&cli.root),
    Commands::Run { identifier } => cmd::cmd_run(&cli.root, &identifier),
  }
}
