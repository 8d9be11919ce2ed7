//! Error types for the cache buster.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cache busting operations
pub type Result<T> = std::result::Result<T, BustError>;

/// Errors raised while hashing, renaming or rewriting resource roots.
#[derive(Debug, Error)]
pub enum BustError {
    /// The document has no `data-sap-ui-resourceroots` attribute
    #[error("No {attribute} attribute found in document")]
    ResourceRootsNotFound {
        /// Attribute name that was searched for
        attribute: &'static str,
    },

    /// The attribute value is not valid JSON
    #[error("Invalid resource roots JSON: {0}")]
    InvalidResourceRoots(#[source] serde_json::Error),

    /// The attribute value is valid JSON but not an object
    #[error("Resource roots must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was found instead
        found: &'static str,
    },

    /// A resource root maps to something other than a string
    #[error("Resource root '{app}' must map to a path string")]
    NonStringPath {
        /// Application name
        app: String,
    },

    /// The resolved application path has no directory name to replace
    #[error("Resource root '{app}' resolves to {path}, which has no directory name")]
    InvalidAppPath {
        /// Application name
        app: String,
        /// Resolved path
        path: PathBuf,
    },

    /// The application directory is, or contains, the document's directory
    #[error("Resource root '{app}' resolves to {path}, which contains the document")]
    ContainsDocument {
        /// Application name
        app: String,
        /// Resolved path
        path: PathBuf,
    },

    /// A content-bundle file could not be read
    #[error("Failed to read content bundle {path}: {source}")]
    BundleRead {
        /// Path of the bundle file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The hashed destination directory already exists
    #[error("Cannot rename '{app}': destination {path} already exists")]
    DestinationExists {
        /// Application name
        app: String,
        /// Existing destination path
        path: PathBuf,
    },

    /// Two different application directories would be renamed to the same path
    #[error("Resource roots '{first}' and '{second}' both hash to {destination}")]
    HashCollision {
        /// First application name
        first: String,
        /// Second application name
        second: String,
        /// Shared destination path
        destination: PathBuf,
    },

    /// One application directory lives inside another
    #[error("Resource root '{inner}' is nested inside resource root '{outer}'")]
    NestedRoots {
        /// Application whose directory contains the other
        outer: String,
        /// Application whose directory is contained
        inner: String,
    },

    /// Renaming an application directory failed
    #[error("Failed to rename {from} to {to}: {source}")]
    RenameFailed {
        /// Source directory
        from: PathBuf,
        /// Destination directory
        to: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The HTML document could not be read
    #[error("Failed to read document {path}: {source}")]
    DocumentRead {
        /// Document path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The HTML document could not be written
    #[error("Failed to write document {path}: {source}")]
    DocumentWrite {
        /// Document path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The rewritten resource roots could not be serialized
    #[error("Failed to serialize resource roots: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        /// Configuration file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML in the configuration file
    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        /// Configuration file path
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Hash length outside the supported range
    #[error("Hash length must be between 1 and {max}, got {length}")]
    InvalidHashLength {
        /// Requested length
        length: usize,
        /// Largest supported length
        max: usize,
    },

    /// No content-bundle files configured
    #[error("At least one content bundle file must be configured")]
    NoBundleFiles,
}
