//! Cinder Configuration
//!
//! Builder, prover and logging settings shared by the Cinder crates.
//!
//! The first file found wins:
//! 1. the path in `CINDER_CONFIG`
//! 2. `config.toml` in the working directory
//! 3. `~/.cinder/config.toml`
//!
//! `CINDER_*` variables are applied on top of whatever the file says.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Process-wide config, see [`CinderConfig::global`]
pub static GLOBAL_CONFIG: OnceLock<CinderConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".cinder";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_TX_VERSION: u32 = 1;
const DEFAULT_SHARD_COUNT: u8 = 16;
const DEFAULT_QUEUE_DEPTH: usize = 32;
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// Config Structs
// ============================================================================

/// One section per TOML table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CinderConfig {
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transaction builder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_tx_version")]
    pub tx_version: u32,
    #[serde(default = "default_shard_count")]
    pub shard_count: u8,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            tx_version: DEFAULT_TX_VERSION,
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}

fn default_tx_version() -> u32 {
    DEFAULT_TX_VERSION
}
fn default_shard_count() -> u8 {
    DEFAULT_SHARD_COUNT
}

/// Which join-split prover backs the builder and validator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProverMode {
    /// In-process mock, no background thread
    #[default]
    Mock,
    /// Mock behind the background request/reply service
    Service,
}

impl std::str::FromStr for ProverMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "service" => Ok(Self::Service),
            other => anyhow::bail!("unknown prover mode '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    #[serde(default)]
    pub mode: ProverMode,
    /// Bounded request queue of the prover service
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            mode: ProverMode::Mock,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

fn default_queue_depth() -> usize {
    DEFAULT_QUEUE_DEPTH
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `env_logger` filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Unparseable values are logged and ignored
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        if let Ok(parsed) = v.parse() {
            *field = parsed;
        } else {
            log::warn!("Ignoring unparseable {}={}", key, v);
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl CinderConfig {
    /// Search the usual locations, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                log::info!("No config file, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`load`](Self::load) but with an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid TOML in {}", path.display()))
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("CINDER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        // Builder
        env_parse("CINDER_TX_VERSION", &mut self.builder.tx_version);
        env_parse("CINDER_SHARD_COUNT", &mut self.builder.shard_count);

        // Prover
        env_parse("CINDER_PROVER_MODE", &mut self.prover.mode);
        env_parse("CINDER_PROVER_QUEUE", &mut self.prover.queue_depth);

        // Logging
        env_string("CINDER_LOG", &mut self.logging.filter);
    }

    /// `~/.cinder/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// TOML with every field spelled out, for `config.toml` templates
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.logging.filter = "cinder_core=debug,info".into();
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Loaded on first use; a config that fails to load is replaced by
    /// defaults.
    pub fn global() -> &'static CinderConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Config load failed ({:#}), falling back to defaults", e);
                Self::default()
            })
        })
    }

    pub fn try_global() -> Option<&'static CinderConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Install `config` unless something already did; the rejected value
    /// comes back in `Err`.
    pub fn set_global(config: CinderConfig) -> Result<(), CinderConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `CinderConfig::global()`.
#[inline]
pub fn global_config() -> &'static CinderConfig {
    CinderConfig::global()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CinderConfig::default();
        assert_eq!(config.builder.tx_version, DEFAULT_TX_VERSION);
        assert_eq!(config.builder.shard_count, DEFAULT_SHARD_COUNT);
        assert_eq!(config.prover.mode, ProverMode::Mock);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_generate_sample() {
        let sample = CinderConfig::generate_sample();
        assert!(sample.contains("[builder]"));
        assert!(sample.contains("[prover]"));
        assert!(sample.contains("[logging]"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = CinderConfig::generate_sample();
        let parsed: CinderConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.builder.shard_count, DEFAULT_SHARD_COUNT);
        assert_eq!(parsed.logging.filter, "cinder_core=debug,info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[prover]\nmode = \"service\"\nqueue_depth = 4").unwrap();

        let config = CinderConfig::read_file(file.path()).unwrap();
        assert_eq!(config.prover.mode, ProverMode::Service);
        assert_eq!(config.prover.queue_depth, 4);
        assert_eq!(config.builder, BuilderConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[builder]\nshard_count = \"many\"").unwrap();
        assert!(CinderConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[builder]\nshard_count = 8\n").unwrap();

        // SAFETY: no other test in this crate reads these variables
        unsafe {
            env::set_var("CINDER_SHARD_COUNT", "4");
            env::set_var("CINDER_PROVER_MODE", "SERVICE");
            env::set_var("CINDER_LOG", "debug");
        }
        let config = CinderConfig::load_from(&path).unwrap();
        unsafe {
            env::remove_var("CINDER_SHARD_COUNT");
            env::remove_var("CINDER_PROVER_MODE");
            env::remove_var("CINDER_LOG");
        }

        assert_eq!(config.builder.shard_count, 4);
        assert_eq!(config.prover.mode, ProverMode::Service);
        assert_eq!(config.logging.filter, "debug");

        // a misspelt mode keeps the file's value
        fs::write(&path, "[prover]\nmode = \"service\"\n").unwrap();
        unsafe {
            env::set_var("CINDER_PROVER_MODE", "servce");
        }
        let config = CinderConfig::load_from(&path).unwrap();
        unsafe {
            env::remove_var("CINDER_PROVER_MODE");
        }
        assert_eq!(config.prover.mode, ProverMode::Service);
    }

    #[test]
    fn test_prover_mode_from_str() {
        assert_eq!("Mock".parse::<ProverMode>().unwrap(), ProverMode::Mock);
        assert_eq!("SERVICE".parse::<ProverMode>().unwrap(), ProverMode::Service);
        assert!("servce".parse::<ProverMode>().is_err());
    }
}
