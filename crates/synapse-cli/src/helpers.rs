//! Shared helpers for the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use synapse_agent::AgentConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.  `RUST_LOG` wins over
/// `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Log the result of loading `.env`.  Loading happens before tracing is
/// initialized so that `RUST_LOG` may come from the file.
pub fn report_dotenv(loaded: dotenvy::Result<PathBuf>) {
    match loaded {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to read .env"),
    }
}

/// Load the configuration file, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    AgentConfig::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Join the words of a command-line argument list into one request.
pub fn join_text(words: &[String]) -> String {
    words.join(" ").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = std::env::temp_dir().join("synapse-cli-no-such-dir");
        let config = load_config(&dir.join("absent.toml")).unwrap();
        assert_eq!(config.services.http_timeout_secs, 30);
    }

    #[test]
    fn join_text_trims() {
        let words = vec![" list".to_owned(), "repos ".to_owned()];
        assert_eq!(join_text(&words), "list repos");
    }

    #[test]
    fn broken_config_reports_path() {
        let mut file = std::env::temp_dir();
        file.push(format!("synapse-cli-broken-{}.toml", std::process::id()));
        let mut handle = std::fs::File::create(&file).unwrap();
        writeln!(handle, "[services\nenabled = 3").unwrap();
        let err = load_config(&file).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load configuration"));
        std::fs::remove_file(&file).ok();
    }
}
