//! CLI argument definitions for Synapse.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Synapse -- plain-language commands for GitHub, Notion, Jira and Slack.
#[derive(Parser)]
#[command(
    name = "synapse",
    version,
    about = "Synapse -- plain-language commands for GitHub, Notion, Jira and Slack",
    long_about = "Turns a sentence such as \"list my repositories\" into a call against the \
                  matching service and prints the result."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read commands from stdin, one per line, until EOF or `exit`.
    Run,

    /// Run a single command and print the result.
    Ask {
        /// The command text, e.g. `list my repositories`.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the raw outcome as JSON instead of formatted text.
        #[arg(long)]
        json: bool,
    },

    /// Show how a command would be understood, without contacting any service.
    Parse {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print the health report for every service as JSON.
    Status,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_joins_words() {
        let cli = Cli::parse_from(["synapse", "ask", "list", "my", "repositories", "--json"]);
        match cli.command {
            Commands::Ask { text, json } => {
                assert_eq!(text.join(" "), "list my repositories");
                assert!(json);
            }
            _ => panic!("expected ask"),
        }
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from([
            "synapse",
            "status",
            "--config",
            "/tmp/x.toml",
            "--log-level",
            "debug",
        ]);
        assert!(matches!(cli.command, Commands::Status));
        assert_eq!(cli.config, PathBuf::from("/tmp/x.toml"));
        assert_eq!(cli.log_level, "debug");
    }
}
