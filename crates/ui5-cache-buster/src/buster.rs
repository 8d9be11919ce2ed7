//! Cache busting orchestration
//!
//! Busting runs in two phases:
//!
//! 1. **Plan** (read-only): extract the resource roots, resolve and hash
//!    every application directory, then validate that the renames are
//!    possible (no two directories share a destination, no destination
//!    already exists, no application root contains another or the document).
//! 2. **Apply**: rename the directories in declaration order and rewrite the
//!    document. If a rename fails, the directories renamed so far are moved
//!    back before the error is returned.

use crate::document::HtmlDocument;
use crate::error::{BustError, ConfigError, Result};
use crate::hasher::{CONTENT_BUNDLE_FILE, ContentHasher, HashOptions};
use crate::paths;
use crate::resource_roots::ResourceRoots;
use crate::rewriter::{self, RootValueStyle};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Options controlling a cache busting run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BustOptions {
    /// How hash tokens are computed
    pub hash: HashOptions,
    /// Files inside each application directory whose bytes are hashed
    pub bundle_files: Vec<PathBuf>,
    /// What the rewritten resource roots map to
    pub root_values: RootValueStyle,
}

impl Default for BustOptions {
    fn default() -> Self {
        Self {
            hash: HashOptions::default(),
            bundle_files: vec![PathBuf::from(CONTENT_BUNDLE_FILE)],
            root_values: RootValueStyle::default(),
        }
    }
}

impl BustOptions {
    /// Validate the options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the hash length is out of range or no bundle
    /// file is configured.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.hash.validate()?;
        if self.bundle_files.is_empty() {
            return Err(ConfigError::NoBundleFiles);
        }
        Ok(())
    }
}

/// A planned (or performed) directory rename for one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppRename {
    /// Application name from the resource roots
    pub name: String,
    /// Path as declared in the document
    pub declared_path: String,
    /// Resolved application directory
    pub source: PathBuf,
    /// Directory the application is moved to
    pub destination: PathBuf,
    /// Content hash token
    pub hash: String,
}

impl AppRename {
    /// Whether the directory is already named after its hash
    pub fn is_noop(&self) -> bool {
        self.source == self.destination
    }

    fn root_value(&self, style: RootValueStyle) -> String {
        match style {
            RootValueStyle::Hash => self.hash.clone(),
            RootValueStyle::Path => paths::hashed_relative_path(&self.declared_path, &self.hash),
        }
    }
}

/// Validated renames for one document, computed without touching the disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BustPlan {
    renames: Vec<AppRename>,
    root_values: RootValueStyle,
}

impl BustPlan {
    /// Planned renames in declaration order
    pub fn renames(&self) -> &[AppRename] {
        &self.renames
    }

    /// The resource roots the document will declare after busting
    pub fn resource_roots(&self) -> Map<String, Value> {
        self.renames
            .iter()
            .map(|rename| {
                (
                    rename.name.clone(),
                    Value::String(rename.root_value(self.root_values)),
                )
            })
            .collect()
    }
}

/// Result of a completed busting run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BustOutcome {
    /// Document with rewritten resource roots
    pub document: HtmlDocument,
    /// Renames that were performed
    pub renames: Vec<AppRename>,
    /// Resource roots written into the document
    pub resource_roots: Map<String, Value>,
}

/// Hashes, renames and rewrites the resource roots of an HTML document
#[derive(Debug, Clone)]
pub struct CacheBuster {
    hasher: ContentHasher,
    root_values: RootValueStyle,
}

impl CacheBuster {
    /// Create a cache buster.
    ///
    /// # Errors
    ///
    /// Returns `BustError::Config` if the options are invalid.
    pub fn new(options: BustOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            hasher: ContentHasher::new(options.hash, options.bundle_files),
            root_values: options.root_values,
        })
    }

    /// Hash every application of `document` and validate the renames.
    ///
    /// Nothing on disk is modified.
    pub fn plan(&self, document: &HtmlDocument) -> Result<BustPlan> {
        let roots = ResourceRoots::extract(document.contents())?;
        let base_dir = document.base_dir();
        let document_dir = paths::normalize(&base_dir);
        info!(
            "Hashing {} resource roots declared in {}",
            roots.len(),
            document.path().display()
        );

        let mut renames = Vec::with_capacity(roots.len());
        for root in &roots {
            let source = paths::resolve_app_dir(&base_dir, &root.path);
            if document_dir.starts_with(&source) {
                return Err(BustError::ContainsDocument {
                    app: root.name.clone(),
                    path: source,
                });
            }
            let hash = self.hasher.hash_app(&source)?;
            let destination =
                paths::hashed_destination(&source, &hash).ok_or_else(|| {
                    BustError::InvalidAppPath {
                        app: root.name.clone(),
                        path: source.clone(),
                    }
                })?;

            debug!("{} ({}) hashes to {}", root.name, source.display(), hash);
            renames.push(AppRename {
                name: root.name.clone(),
                declared_path: root.path.clone(),
                source,
                destination,
                hash,
            });
        }

        validate_renames(&renames)?;

        Ok(BustPlan {
            renames,
            root_values: self.root_values,
        })
    }

    /// Perform the renames of `plan` and rewrite `document`.
    ///
    /// `plan` must have been produced from the same `document`.
    pub fn apply(&self, plan: BustPlan, document: HtmlDocument) -> Result<BustOutcome> {
        let resource_roots = plan.resource_roots();
        // Rendered before the first rename; only renames can fail past this point
        let contents = rewriter::rewrite_resource_roots(document.contents(), &resource_roots)?;

        let mut completed: Vec<&AppRename> = Vec::new();
        for (index, rename) in plan.renames.iter().enumerate() {
            if rename.is_noop() {
                warn!(
                    "{} is already named after its hash, leaving it in place",
                    rename.source.display()
                );
                continue;
            }
            // Same directory declared under several names
            if plan.renames[..index]
                .iter()
                .any(|earlier| earlier.source == rename.source)
            {
                continue;
            }

            if let Err(source) = fs::rename(&rename.source, &rename.destination) {
                roll_back(&completed);
                return Err(BustError::RenameFailed {
                    from: rename.source.clone(),
                    to: rename.destination.clone(),
                    source,
                });
            }

            info!(
                "Renamed {} -> {}",
                rename.source.display(),
                rename.destination.display()
            );
            completed.push(rename);
        }

        Ok(BustOutcome {
            document: document.with_contents(contents),
            renames: plan.renames,
            resource_roots,
        })
    }

    /// Plan and apply in one step
    pub fn bust(&self, document: HtmlDocument) -> Result<BustOutcome> {
        let plan = self.plan(&document)?;
        self.apply(plan, document)
    }
}

fn validate_renames(renames: &[AppRename]) -> Result<()> {
    for (index, rename) in renames.iter().enumerate() {
        for earlier in &renames[..index] {
            if earlier.source == rename.source {
                continue;
            }

            if earlier.destination == rename.destination {
                return Err(BustError::HashCollision {
                    first: earlier.name.clone(),
                    second: rename.name.clone(),
                    destination: rename.destination.clone(),
                });
            }

            if rename.source.starts_with(&earlier.source) {
                return Err(BustError::NestedRoots {
                    outer: earlier.name.clone(),
                    inner: rename.name.clone(),
                });
            }

            if earlier.source.starts_with(&rename.source) {
                return Err(BustError::NestedRoots {
                    outer: rename.name.clone(),
                    inner: earlier.name.clone(),
                });
            }
        }

        if !rename.is_noop() && fs::symlink_metadata(&rename.destination).is_ok() {
            return Err(BustError::DestinationExists {
                app: rename.name.clone(),
                path: rename.destination.clone(),
            });
        }
    }

    Ok(())
}

fn roll_back(completed: &[&AppRename]) {
    for rename in completed.iter().rev() {
        match fs::rename(&rename.destination, &rename.source) {
            Ok(()) => warn!(
                "Rolled back {} -> {}",
                rename.destination.display(),
                rename.source.display()
            ),
            Err(err) => error!(
                "Failed to roll back {} -> {}: {err}",
                rename.destination.display(),
                rename.source.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn write_app(root: &Path, relative: &str, bundle: &str) {
        let dir = root.join(relative);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONTENT_BUNDLE_FILE), bundle).unwrap();
    }

    fn document(root: &Path, roots_json: &str) -> HtmlDocument {
        HtmlDocument::new(
            "index.html",
            root,
            format!("<script data-sap-ui-resourceroots='{roots_json}'></script>"),
        )
    }

    #[test]
    fn test_plan_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "webapps/my-app", "Hello, World!");

        let buster = CacheBuster::new(BustOptions::default()).unwrap();
        let plan = buster
            .plan(&document(dir.path(), r#"{"app1": "./webapps/my-app"}"#))
            .unwrap();

        assert_eq!(plan.renames().len(), 1);
        assert_eq!(plan.renames()[0].hash, "vlyxXm9P");
        assert_eq!(
            plan.renames()[0].destination,
            dir.path().join("webapps/vlyxXm9P")
        );
        assert!(dir.path().join("webapps/my-app").is_dir());
        assert!(!dir.path().join("webapps/vlyxXm9P").exists());
    }

    #[test]
    fn test_path_style_root_values() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "webapps/my-app", "Hello, World!");

        let buster = CacheBuster::new(BustOptions {
            root_values: RootValueStyle::Path,
            ..BustOptions::default()
        })
        .unwrap();
        let outcome = buster
            .bust(document(dir.path(), r#"{"app1": "./webapps/my-app"}"#))
            .unwrap();

        assert_eq!(
            outcome.resource_roots.get("app1"),
            Some(&Value::from("./webapps/vlyxXm9P"))
        );
    }

    #[test]
    fn test_path_style_follows_the_moved_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "webapps/my-app", "Hello, World!");

        let buster = CacheBuster::new(BustOptions {
            root_values: RootValueStyle::Path,
            ..BustOptions::default()
        })
        .unwrap();
        let outcome = buster
            .bust(document(dir.path(), r#"{"app1": "./webapps/my-app/."}"#))
            .unwrap();

        assert_eq!(
            outcome.resource_roots.get("app1"),
            Some(&Value::from("./webapps/vlyxXm9P"))
        );
        assert!(dir.path().join("webapps/vlyxXm9P").is_dir());
    }

    #[test]
    fn test_same_directory_under_two_names() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "webapps/my-app", "Hello, World!");

        let buster = CacheBuster::new(BustOptions::default()).unwrap();
        let outcome = buster
            .bust(document(
                dir.path(),
                r#"{"a": "./webapps/my-app", "b": "webapps/my-app/"}"#,
            ))
            .unwrap();

        assert_eq!(outcome.resource_roots.get("a"), Some(&Value::from("vlyxXm9P")));
        assert_eq!(outcome.resource_roots.get("b"), Some(&Value::from("vlyxXm9P")));
        assert!(dir.path().join("webapps/vlyxXm9P").is_dir());
    }

    #[test]
    fn test_already_hashed_directory_is_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "webapps/vlyxXm9P", "Hello, World!");

        let buster = CacheBuster::new(BustOptions::default()).unwrap();
        let outcome = buster
            .bust(document(dir.path(), r#"{"app1": "./webapps/vlyxXm9P"}"#))
            .unwrap();

        assert!(outcome.renames[0].is_noop());
        assert!(dir.path().join("webapps/vlyxXm9P").is_dir());
    }

    #[test]
    fn test_nested_roots_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "webapps/outer", "outer");
        write_app(dir.path(), "webapps/outer/inner", "inner");

        let buster = CacheBuster::new(BustOptions::default()).unwrap();
        let err = buster
            .plan(&document(
                dir.path(),
                r#"{"outer": "./webapps/outer", "inner": "./webapps/outer/inner"}"#,
            ))
            .unwrap_err();

        assert!(matches!(
            err,
            BustError::NestedRoots { outer, inner } if outer == "outer" && inner == "inner"
        ));
    }

    #[test]
    fn test_rename_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        write_app(dir.path(), "webapps/first", "first");
        write_app(dir.path(), "webapps/second", "second");

        let buster = CacheBuster::new(BustOptions::default()).unwrap();
        let doc = document(
            dir.path(),
            r#"{"first": "./webapps/first", "second": "./webapps/second"}"#,
        );
        let plan = buster.plan(&doc).unwrap();

        // Remove the second source between planning and applying
        fs::remove_dir_all(dir.path().join("webapps/second")).unwrap();

        let err = buster.apply(plan, doc).unwrap_err();
        assert!(matches!(err, BustError::RenameFailed { .. }));
        assert!(dir.path().join("webapps/first").is_dir());

        let entries: Vec<_> = fs::read_dir(dir.path().join("webapps"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("first")]);
    }

    #[test]
    fn test_invalid_options() {
        let err = CacheBuster::new(BustOptions {
            bundle_files: Vec::new(),
            ..BustOptions::default()
        })
        .unwrap_err();

        assert!(matches!(err, BustError::Config(ConfigError::NoBundleFiles)));
    }
}
