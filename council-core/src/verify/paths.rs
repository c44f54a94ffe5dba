//! Working-directory path confinement
//!
//! Reviewers are untrusted: a finding may name `../../etc/passwd` or an
//! absolute path outside the project. Every claimed path is resolved against
//! the working root here before anything touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem
///
/// `..` at the filesystem root stays at the root, so an absolute path can
/// never climb above `/`.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let at_top = matches!(
                    out.components().next_back(),
                    None | Some(Component::ParentDir)
                );
                if at_top && !out.has_root() {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Resolve a claimed path against `root`, or `None` if it escapes it
///
/// `root` must already be normalized. Absolute claims are accepted only when
/// they point inside `root`.
pub fn resolve_within(root: &Path, claimed: &str) -> Option<PathBuf> {
    let claimed = Path::new(claimed.trim());
    let joined = if claimed.is_absolute() {
        claimed.to_path_buf()
    } else {
        root.join(claimed)
    };
    let resolved = normalize_lexically(&joined);
    resolved.starts_with(root).then_some(resolved)
}

/// Strip a trailing `:line`, `:line:col`, or `:start-end` suffix from a location string
pub fn location_file(location: &str) -> &str {
    let mut file = location.trim();
    while let Some((head, tail)) = file.rsplit_once(':') {
        let is_line_suffix =
            !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit() || c == '-');
        if !is_line_suffix {
            break;
        }
        file = head;
    }
    file.trim_start_matches("./")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/work/./src/../lib/a.rs")),
            PathBuf::from("/work/lib/a.rs")
        );
        assert_eq!(
            normalize_lexically(Path::new("/work/../../..")),
            PathBuf::from("/")
        );
        assert_eq!(
            normalize_lexically(Path::new("../a/../b")),
            PathBuf::from("../b")
        );
    }

    #[test]
    fn test_resolve_within_accepts_descendants() {
        let root = Path::new("/work/project");
        assert_eq!(
            resolve_within(root, "src/main.rs"),
            Some(PathBuf::from("/work/project/src/main.rs"))
        );
        assert_eq!(
            resolve_within(root, "./src/../README.md"),
            Some(PathBuf::from("/work/project/README.md"))
        );
        assert_eq!(
            resolve_within(root, "/work/project/src/lib.rs"),
            Some(PathBuf::from("/work/project/src/lib.rs"))
        );
        assert_eq!(resolve_within(root, "."), Some(PathBuf::from("/work/project")));
    }

    #[test]
    fn test_resolve_within_blocks_escapes() {
        let root = Path::new("/work/project");
        assert_eq!(resolve_within(root, "../../../etc/passwd"), None);
        assert_eq!(resolve_within(root, "src/../../other/file.rs"), None);
        assert_eq!(resolve_within(root, "/etc/passwd"), None);
        // sibling directory sharing a name prefix
        assert_eq!(resolve_within(root, "/work/project-evil/a.rs"), None);
    }

    #[test]
    fn test_location_file() {
        assert_eq!(location_file("src/auth.ts:42"), "src/auth.ts");
        assert_eq!(location_file("src/auth.ts:42:7"), "src/auth.ts");
        assert_eq!(location_file("./src/auth.ts:10-20"), "src/auth.ts");
        assert_eq!(location_file("src/auth.ts"), "src/auth.ts");
        assert_eq!(location_file("  docs/notes:intro "), "docs/notes:intro");
    }
}
