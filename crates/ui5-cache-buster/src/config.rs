//! Command-line and file configuration.
//!
//! Options are resolved from, in order of precedence:
//! - CLI arguments (`--algorithm`, `--length`, etc.)
//! - Environment variables (`UI5_CACHE_BUSTER_ALGORITHM`, etc.)
//! - An optional TOML configuration file (`--config`)
//! - Default values
//!
//! # Configuration file
//!
//! ```toml
//! bundle_files = ["Component-preload.js", "style/style.css"]
//! root_values = "hash"
//!
//! [hash]
//! algorithm = "sha512"
//! encoding = "base62"
//! length = 8
//! ```

use crate::buster::BustOptions;
use crate::error::ConfigError;
use crate::hasher::{DigestEncoding, HashAlgorithm, HashOptions};
use crate::rewriter::RootValueStyle;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Output format for the run summary
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// JSON object
    Json,
}

/// Command-line arguments of the `ui5-cache-buster` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ui5-cache-buster",
    about = "Rename UI5 application directories to content hashes and rewrite their resource roots",
    version
)]
pub struct CliArgs {
    /// HTML entry file declaring `data-sap-ui-resourceroots`
    pub html: PathBuf,

    /// Working directory relative paths are resolved against
    #[arg(long, env = "UI5_CACHE_BUSTER_CWD")]
    pub cwd: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "UI5_CACHE_BUSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// File inside each application directory to hash (repeatable)
    #[arg(long = "bundle-file", value_name = "NAME")]
    pub bundle_files: Vec<PathBuf>,

    /// Digest algorithm
    #[arg(long, value_enum, env = "UI5_CACHE_BUSTER_ALGORITHM")]
    pub algorithm: Option<HashAlgorithm>,

    /// Digest encoding
    #[arg(long, value_enum, env = "UI5_CACHE_BUSTER_ENCODING")]
    pub encoding: Option<DigestEncoding>,

    /// Number of hash characters kept
    #[arg(long, env = "UI5_CACHE_BUSTER_LENGTH")]
    pub length: Option<usize>,

    /// Write bare hashes or hashed paths into the resource roots
    #[arg(long, value_enum)]
    pub root_values: Option<RootValueStyle>,

    /// Write the rewritten document here instead of over the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compute and print the renames without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Summary output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl CliArgs {
    /// Parse arguments from the process command line
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Load the configuration file (if any) and merge it with the arguments.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration file cannot be read or
    /// parsed, or the merged options are invalid.
    pub fn bust_options(&self) -> Result<BustOptions, ConfigError> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let options = self.merge(file);
        options.validate()?;
        Ok(options)
    }

    fn merge(&self, file: FileConfig) -> BustOptions {
        let defaults = BustOptions::default();
        let file_hash = file.hash.unwrap_or_default();

        BustOptions {
            hash: HashOptions {
                algorithm: self
                    .algorithm
                    .or(file_hash.algorithm)
                    .unwrap_or(defaults.hash.algorithm),
                encoding: self
                    .encoding
                    .or(file_hash.encoding)
                    .unwrap_or(defaults.hash.encoding),
                length: self
                    .length
                    .or(file_hash.length)
                    .unwrap_or(defaults.hash.length),
            },
            bundle_files: if self.bundle_files.is_empty() {
                file.bundle_files.unwrap_or(defaults.bundle_files)
            } else {
                self.bundle_files.clone()
            },
            root_values: self
                .root_values
                .or(file.root_values)
                .unwrap_or(defaults.root_values),
        }
    }
}

/// Contents of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Files to hash inside each application directory
    pub bundle_files: Option<Vec<PathBuf>>,
    /// Resource root value style
    pub root_values: Option<RootValueStyle>,
    /// Hash settings
    pub hash: Option<FileHashConfig>,
}

/// `[hash]` table of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileHashConfig {
    /// Digest algorithm
    pub algorithm: Option<HashAlgorithm>,
    /// Digest encoding
    pub encoding: Option<DigestEncoding>,
    /// Token length
    pub length: Option<usize>,
}

impl FileConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
