//! Content-hash cache busting for UI5 applications.
//!
//! A UI5 entry page declares where each application's modules are served
//! from through the `data-sap-ui-resourceroots` attribute of its bootstrap
//! tag. This crate renames every declared application directory to a hash of
//! its content bundle and rewrites the attribute to match, so browsers and
//! CDNs fetch fresh assets whenever an application changes:
//!
//! ```text
//! ./webapps/my-app  -->  ./webapps/XDBq1b7n
//! data-sap-ui-resourceroots='{"my.app":"./webapps/my-app"}'
//!                   -->  data-sap-ui-resourceroots='{"my.app":"XDBq1b7n"}'
//! ```
//!
//! # Architecture
//!
//! - `markup`: start-tag attribute scanner
//! - `resource_roots`: extraction of the declared roots
//! - `hasher`: content-bundle digests and token encodings
//! - `paths`: resolution of application directories
//! - `rewriter`: substitution of the new roots into the document
//! - `buster`: two-phase plan/apply orchestration
//! - `config`: CLI arguments and TOML configuration
//!
//! # Example
//!
//! ```no_run
//! use ui5_cache_buster::{BustOptions, CacheBuster, HtmlDocument};
//!
//! let document = HtmlDocument::load("dist/index.html", std::env::current_dir()?)?;
//! let buster = CacheBuster::new(BustOptions::default())?;
//!
//! let outcome = buster.bust(document)?;
//! outcome.document.write()?;
//!
//! for rename in &outcome.renames {
//!     println!("{} -> {}", rename.name, rename.hash);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod buster;
pub mod config;
pub mod document;
pub mod error;
pub mod hasher;
pub mod markup;
pub mod paths;
pub mod resource_roots;
pub mod rewriter;

// Re-exports for public API
pub use buster::{AppRename, BustOptions, BustOutcome, BustPlan, CacheBuster};
pub use config::{CliArgs, FileConfig, OutputFormat};
pub use document::HtmlDocument;
pub use error::{BustError, ConfigError, Result};
pub use hasher::{
    CONTENT_BUNDLE_FILE, ContentHasher, DigestEncoding, HashAlgorithm, HashOptions,
};
pub use resource_roots::{RESOURCE_ROOTS_ATTRIBUTE, ResourceRoot, ResourceRoots};
pub use rewriter::RootValueStyle;
