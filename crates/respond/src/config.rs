// respond/src/config.rs — responder settings, loaded from `respond.toml`
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for how responses are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondConfig {
    /// Chunk size used when relaying raw streams into the response body.
    #[serde(default = "default_copy_buffer_size")]
    pub copy_buffer_size: usize,

    /// Write a short HTML anchor body on redirects answering GET requests.
    #[serde(default = "default_true")]
    pub redirect_body: bool,

    /// Pretty-print JSON bodies.
    #[serde(default)]
    pub pretty_json: bool,
}

fn default_copy_buffer_size() -> usize {
    8 * 1024
}

fn default_true() -> bool {
    true
}

impl Default for RespondConfig {
    fn default() -> Self {
        Self {
            copy_buffer_size: default_copy_buffer_size(),
            redirect_body: true,
            pretty_json: false,
        }
    }
}

impl RespondConfig {
    /// Load from a toml file. A missing or blank file yields the defaults.
    ///
    /// Settings are read from a `[respond]` table when the file has one, so
    /// the file can be shared with the host application's own settings.
    /// Otherwise the top-level keys are used.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn from_toml(content: &str) -> Result<Self> {
        let mut table: toml::Table = content.parse()?;
        let section = match table.remove("respond") {
            Some(toml::Value::Table(section)) => section,
            Some(other) => anyhow::bail!("[respond] must be a table, found {}", other.type_str()),
            None => table,
        };
        Ok(toml::Value::Table(section).try_into()?)
    }

    /// Load from `./respond.toml`.
    pub fn load_default() -> Result<Self> {
        Self::load("respond.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RespondConfig::default();
        assert_eq!(config.copy_buffer_size, 8192);
        assert!(config.redirect_body);
        assert!(!config.pretty_json);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: RespondConfig = toml::from_str("pretty_json = true").unwrap();
        assert!(config.pretty_json);
        assert_eq!(config.copy_buffer_size, 8192);
        assert!(config.redirect_body);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = RespondConfig::load(dir.path().join("respond.toml")).unwrap();
        assert_eq!(config, RespondConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "copy_buffer_size = 512\nredirect_body = false").unwrap();

        let config = RespondConfig::load(file.path()).unwrap();
        assert_eq!(config.copy_buffer_size, 512);
        assert!(!config.redirect_body);
    }

    #[test]
    fn test_load_from_respond_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8080\n\n[respond]\npretty_json = true").unwrap();

        let config = RespondConfig::load(file.path()).unwrap();
        assert!(config.pretty_json);
        assert_eq!(config.copy_buffer_size, 8192);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "copy_buffer_size = \"lots\"").unwrap();

        let err = RespondConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
