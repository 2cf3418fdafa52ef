//! Gitignore-style filtering of browsable paths.
//!
//! Rules are collected from the root directory and every ancestor above it,
//! compiled once per root and cached in an [`IgnoreCache`]. The cache never
//! notices edits to an ignore file; call [`IgnoreCache::invalidate`] or
//! [`IgnoreCache::clear`] to pick them up.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

use crate::guard::normalize_lexically;

/// Directory name hidden whatever the ignore files say.
const IMPLICIT_RULE: &str = ".git";

/// Compiled ignore patterns for one root directory.
#[derive(Debug)]
pub struct IgnoreRuleSet {
    matcher: Gitignore,
    sources: Vec<PathBuf>,
}

impl IgnoreRuleSet {
    /// Walk from `root` up through its ancestors and merge every `file_name`
    /// found on the way, root first.
    pub fn load(root: &Path, file_name: &str) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        let mut sources = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(root.to_path_buf());

        while let Some(dir) = current {
            if !visited.insert(dir.clone()) {
                break;
            }

            let ignore_path = dir.join(file_name);
            if ignore_path.is_file() {
                match std::fs::read_to_string(&ignore_path) {
                    Ok(content) => {
                        if add_ignore_file(&mut builder, root, &ignore_path, &content) {
                            sources.push(ignore_path);
                        }
                    }
                    Err(err) => {
                        warn!("Failed to read ignore file {}: {}", ignore_path.display(), err);
                    }
                }
            }

            current = dir
                .parent()
                .filter(|parent| *parent != dir.as_path())
                .map(Path::to_path_buf);
        }

        // Added last so no negation in an ignore file can re-include it
        if let Err(err) = builder.add_line(None, IMPLICIT_RULE) {
            warn!("Failed to add implicit ignore rule: {}", err);
        }

        let matcher = builder.build().unwrap_or_else(|err| {
            warn!("Failed to compile ignore rules for {}: {}", root.display(), err);
            Gitignore::empty()
        });

        debug!(
            "Loaded {} ignore rules for {} from {} file(s)",
            matcher.num_ignores() + matcher.num_whitelists(),
            root.display(),
            sources.len()
        );

        Self { matcher, sources }
    }

    /// Test a root-relative path using `/` separators.
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        if relative.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    /// Ignore files that contributed rules, in load order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// Validate a whole ignore file before merging it. A file with any bad pattern
/// is skipped entirely so a typo cannot leave half of its rules active.
fn add_ignore_file(builder: &mut GitignoreBuilder, root: &Path, path: &Path, content: &str) -> bool {
    let mut scratch = GitignoreBuilder::new(root);
    for line in content.lines() {
        if let Err(err) = scratch.add_line(Some(path.to_path_buf()), line) {
            warn!("Skipping ignore file {}: {}", path.display(), err);
            return false;
        }
    }
    if let Err(err) = scratch.build() {
        warn!("Skipping ignore file {}: {}", path.display(), err);
        return false;
    }

    for line in content.lines() {
        // Already validated above
        let _ = builder.add_line(Some(path.to_path_buf()), line);
    }
    true
}

/// Root-relative form of `path` with `/` separators, or `None` when the path
/// is outside `root`.
fn relative_pattern_path(path: &Path, root: &Path) -> Option<String> {
    let root = normalize_lexically(root);
    let path = normalize_lexically(path);
    let relative = path.strip_prefix(&root).ok()?;

    Some(
        relative
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/"),
    )
}

/// Rule sets keyed by root directory, built lazily on first use.
///
/// Two requests that miss the cache for the same root at the same time both
/// build the rule set and the later insert wins. Building is idempotent, so the
/// race only costs the duplicate work.
#[derive(Debug)]
pub struct IgnoreCache {
    ignore_file: String,
    rules: DashMap<PathBuf, Arc<IgnoreRuleSet>>,
}

impl IgnoreCache {
    pub fn new(ignore_file: impl Into<String>) -> Self {
        Self {
            ignore_file: ignore_file.into(),
            rules: DashMap::new(),
        }
    }

    /// Cached rules for `root`, building them on a miss.
    pub fn rules_for(&self, root: &Path) -> Arc<IgnoreRuleSet> {
        let cached = self.rules.get(root).map(|entry| Arc::clone(entry.value()));
        if let Some(rules) = cached {
            return rules;
        }

        let rules = Arc::new(IgnoreRuleSet::load(root, &self.ignore_file));
        self.rules.insert(root.to_path_buf(), Arc::clone(&rules));
        rules
    }

    /// Seed the cache with a prebuilt rule set.
    pub fn insert(&self, root: &Path, rules: IgnoreRuleSet) {
        self.rules.insert(root.to_path_buf(), Arc::new(rules));
    }

    pub fn invalidate(&self, root: &Path) {
        self.rules.remove(root);
    }

    pub fn clear(&self) {
        self.rules.clear();
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `path` is hidden from browsing under `root`. Stats the path to
    /// decide whether directory-only patterns apply.
    pub fn should_ignore(&self, path: &Path, root: &Path) -> bool {
        self.should_ignore_entry(path, root, path.is_dir())
    }

    /// Same as [`should_ignore`](Self::should_ignore) when the caller already
    /// knows whether the path is a directory.
    ///
    /// Paths outside `root` are never reported ignored; keeping them out is
    /// the containment check's job. The root itself is never ignored.
    pub fn should_ignore_entry(&self, path: &Path, root: &Path, is_dir: bool) -> bool {
        let Some(relative) = relative_pattern_path(path, root) else {
            return false;
        };
        if relative.is_empty() {
            return false;
        }

        self.rules_for(root).is_ignored(&relative, is_dir)
    }
}

impl Default for IgnoreCache {
    fn default() -> Self {
        Self::new(".gitignore")
    }
}
