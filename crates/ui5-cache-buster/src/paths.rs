//! Path resolution for application directories

use std::path::{Component, Path, PathBuf};

/// Resolve `relative` against `base_dir` and normalize the result lexically.
///
/// Mirrors how a browser or `path.resolve` treats `./` and `../` segments:
/// no symlinks are followed and the path does not need to exist. An absolute
/// `relative` replaces `base_dir`.
pub fn resolve_app_dir(base_dir: &Path, relative: &str) -> PathBuf {
    normalize(&base_dir.join(relative))
}

/// Lexically remove `.` segments and fold `..` into the preceding segment
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root; a leading `..` of a
                // relative path is kept
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Replace the final segment of `source` with `hash`, keeping the parent.
///
/// Returns `None` when `source` has no final normal segment.
pub fn hashed_destination(source: &Path, hash: &str) -> Option<PathBuf> {
    match source.components().next_back()? {
        Component::Normal(_) => Some(source.with_file_name(hash)),
        _ => None,
    }
}

/// Point a declared relative path at the hashed sibling of the directory it
/// names.
///
/// Used when the rewritten resource roots keep their directory prefix, e.g.
/// `./webapps/my-app` becomes `./webapps/XDBq1b7n`. The path is normalized
/// the same way as [`resolve_app_dir`], so it always names the directory the
/// application was moved to. A leading `./` is kept.
pub fn hashed_relative_path(relative: &str, hash: &str) -> String {
    let hashed = normalize(&Path::new(relative).join("..").join(hash));
    let hashed = hashed.to_string_lossy();

    if relative.starts_with("./") && !hashed.starts_with("..") && !hashed.starts_with('/') {
        format!("./{hashed}")
    } else {
        hashed.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_app_dir() {
        let base = Path::new("/srv/site");
        assert_eq!(
            resolve_app_dir(base, "./webapps/my-app"),
            PathBuf::from("/srv/site/webapps/my-app")
        );
        assert_eq!(
            resolve_app_dir(base, "../shared/./lib/"),
            PathBuf::from("/srv/shared/lib")
        );
        assert_eq!(
            resolve_app_dir(base, "/opt/apps/one"),
            PathBuf::from("/opt/apps/one")
        );
    }

    #[test]
    fn test_normalize_edges() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("a/b/../../..")), PathBuf::from(".."));
    }

    #[test]
    fn test_hashed_destination() {
        assert_eq!(
            hashed_destination(Path::new("/srv/site/webapps/my-app"), "XDBq1b7n"),
            Some(PathBuf::from("/srv/site/webapps/XDBq1b7n"))
        );
        assert_eq!(hashed_destination(Path::new("/"), "XDBq1b7n"), None);
    }

    #[test]
    fn test_hashed_relative_path() {
        assert_eq!(hashed_relative_path("./webapps/my-app", "abc"), "./webapps/abc");
        assert_eq!(hashed_relative_path("./webapps/my-app/", "abc"), "./webapps/abc");
        assert_eq!(hashed_relative_path("my-app", "abc"), "abc");
        assert_eq!(hashed_relative_path("../shared/lib", "abc"), "../shared/abc");
        assert_eq!(hashed_relative_path("/opt/apps/one", "abc"), "/opt/apps/abc");
    }

    #[test]
    fn test_hashed_relative_path_is_normalized() {
        assert_eq!(hashed_relative_path("./webapps/my-app/.", "abc"), "./webapps/abc");
        assert_eq!(hashed_relative_path("./webapps/my-app/x/..", "abc"), "./webapps/abc");
        assert_eq!(hashed_relative_path("webapps/./my-app", "abc"), "webapps/abc");
        assert_eq!(hashed_relative_path("./my-app/..", "abc"), "../abc");

        // Agrees with where the directory is actually moved
        let base = Path::new("/srv/site");
        for declared in ["./webapps/my-app/.", "./webapps/my-app/x/..", "../shared/./lib/"] {
            let source = resolve_app_dir(base, declared);
            assert_eq!(
                resolve_app_dir(base, &hashed_relative_path(declared, "abc")),
                hashed_destination(&source, "abc").unwrap()
            );
        }
    }
}
