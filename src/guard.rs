//! Containment checks that keep every served path inside the root directory.
//!
//! [`is_contained`] is purely lexical and runs before anything touches the
//! filesystem. [`verify_canonical`] runs once a path is known to exist and
//! follows symlinks, so a link inside the root cannot expose a target outside it.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::ServerError;

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Redundant separators are collapsed by [`Path::components`]. A `..` at the
/// filesystem root stays at the root; a leading `..` on a relative path is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::ParentDir) | None => normalized.push(".."),
                _ => {}
            },
            Component::Normal(name) => normalized.push(name),
        }
    }

    normalized
}

/// Whether `candidate` is `root` or lies underneath it.
///
/// Both paths are normalized lexically first. The relative path from root to
/// candidate must be empty or must neither climb out with `..` nor be absolute
/// (drive letters and UNC prefixes fail `strip_prefix` and land here too).
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    if candidate.to_string_lossy().contains('\0') {
        return false;
    }

    let root = normalize_lexically(root);
    let candidate = normalize_lexically(candidate);

    match candidate.strip_prefix(&root) {
        Ok(relative) => {
            relative.as_os_str().is_empty()
                || !(relative.is_absolute()
                    || matches!(relative.components().next(), Some(Component::ParentDir)))
        }
        Err(_) => false,
    }
}

/// Join a decoded URL path onto the root. The result still has to pass
/// [`is_contained`] before it is used.
pub fn resolve_request_path(root: &Path, decoded: &str) -> PathBuf {
    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() {
        return root.to_path_buf();
    }
    root.join(relative)
}

/// Canonicalize an existing path and re-check containment against the
/// canonical root, rejecting symlinks that escape.
pub fn verify_canonical(root: &Path, path: &Path) -> Result<PathBuf, ServerError> {
    let canonical_root = root.canonicalize()?;
    let canonical_path = path.canonicalize()?;

    if !is_contained(&canonical_root, &canonical_path) {
        warn!(
            "Symlink escape attempt: {:?} resolved to {:?} which is outside {:?}",
            path, canonical_path, canonical_root
        );
        return Err(ServerError::PathTraversal);
    }

    Ok(canonical_path)
}
