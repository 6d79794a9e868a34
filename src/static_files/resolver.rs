//! Mapping request paths onto the document root.
//!
//! Everything here is lexical: no function in this module touches the
//! filesystem. Containment is checked per path component, so a root of
//! `/srv/www` never admits `/srv/www-private`.

use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("outside root")]
    OutsideRoot,

    #[error("path contains a NUL byte")]
    NulByte,

    /// The lexical path is inside the root but a symlink along it leads out.
    #[error("symlink leads outside root")]
    SymlinkEscape,
}

/// Resolves a decoded request path against `root`.
///
/// The request path is split on `/` (and `\`), `.` and empty segments are
/// dropped, `..` removes the previous component. The result must still lie
/// under the normalized `root`.
///
/// ```
/// # use std::path::Path;
/// # use warden::static_files::resolver::{resolve, Rejection};
/// let root = Path::new("/srv/www");
/// assert_eq!(resolve(root, "/a/./b/../c.txt").unwrap(), Path::new("/srv/www/a/c.txt"));
/// assert_eq!(resolve(root, "/../../etc/passwd"), Err(Rejection::OutsideRoot));
/// ```
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, Rejection> {
    if requested.contains('\0') {
        return Err(Rejection::NulByte);
    }

    let root = normalize(root);
    let mut resolved = root.clone();

    for segment in requested.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if !resolved.pop() {
                    return Err(Rejection::OutsideRoot);
                }
            }
            name => resolved.push(name),
        }
    }

    if is_within(&root, &resolved) {
        Ok(resolved)
    } else {
        Err(Rejection::OutsideRoot)
    }
}

/// Whether `path` equals `root` or descends from it, compared by component.
pub fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

/// Lexically cleans a path: drops `.`, folds `..` into its parent.
///
/// A `..` at the top of an absolute path is dropped, as the filesystem
/// would; on a relative path it is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// The normalized absolute form of a document root. Relative roots are
/// taken relative to the current working directory.
pub fn absolute_root(root: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(root).map(|p| normalize(&p))
}
