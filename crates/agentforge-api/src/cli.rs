//! CLI definitions for the `agentforge` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use agentforge_infra::config::StorageBackend;

/// Build, chat with, and deploy LLM agents.
#[derive(Parser)]
#[command(name = "agentforge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory holding `config.toml` and the SQLite database.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log verbosity: negative when quiet, otherwise the `-v` count.
    pub fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            i8::try_from(self.verbose).unwrap_or(i8::MAX)
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Storage backend: sqlite, memory or kv.
        #[arg(long)]
        backend: Option<StorageBackend>,
    },

    /// Print the resolved configuration with secrets redacted.
    Config {
        /// Storage backend to resolve against.
        #[arg(long)]
        backend: Option<StorageBackend>,
    },
}

impl Commands {
    pub fn backend(&self) -> Option<StorageBackend> {
        match self {
            Commands::Serve { backend, .. } | Commands::Config { backend } => *backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["agentforge", "serve"]).unwrap();
        assert_eq!(cli.verbosity(), 0);
        match cli.command {
            Commands::Serve { port, host, backend } => {
                assert_eq!(port, 3000);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(backend, None);
            }
            Commands::Config { .. } => panic!("expected serve"),
        }
    }

    #[test]
    fn test_backend_and_verbosity_flags() {
        let cli =
            Cli::try_parse_from(["agentforge", "-vv", "serve", "--backend", "memory"]).unwrap();
        assert_eq!(cli.verbosity(), 2);
        assert_eq!(cli.command.backend(), Some(StorageBackend::Memory));

        let cli = Cli::try_parse_from(["agentforge", "config", "-q"]).unwrap();
        assert_eq!(cli.verbosity(), -1);

        assert!(Cli::try_parse_from(["agentforge", "serve", "--backend", "postgres"]).is_err());
    }
}
