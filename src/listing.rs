use std::cmp::Ordering;
use std::path::Path;
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::classify::{self, Language};
use crate::error::ServerError;
use crate::ignore_rules::IgnoreCache;

/// Display category of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Markdown,
    Html,
    Mermaid,
    Source(Language),
    Image,
    Text,
    Other,
}

impl EntryKind {
    /// Category of a regular file, from its name alone.
    pub fn for_file(path: &Path) -> Self {
        if classify::is_markdown_extension(path) {
            return EntryKind::Markdown;
        }
        if classify::is_html_extension(path) {
            return EntryKind::Html;
        }
        if classify::is_mermaid_extension(path) {
            return EntryKind::Mermaid;
        }

        let Some(ext) = classify::extension_of(path) else {
            return EntryKind::Other;
        };
        if let Some(language) = Language::from_extension(&ext) {
            return EntryKind::Source(language);
        }

        match mime_guess::from_ext(&ext).first() {
            Some(mime) if mime.type_().as_str() == "image" => EntryKind::Image,
            Some(mime) if mime.type_().as_str() == "text" => EntryKind::Text,
            _ => EntryKind::Other,
        }
    }
}

/// One row of a directory listing
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
    /// `None` for directories
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
    pub extension: Option<String>,
    pub kind: EntryKind,
}

/// Directories first, then case-insensitive name order. The raw name breaks
/// ties so the order is total.
pub fn compare_entries(a: &FileEntry, b: &FileEntry) -> Ordering {
    match (a.is_dir, b.is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}

/// Filtered, sorted entries directly inside `dir`.
///
/// Dotfiles are always skipped, as is anything the ignore rules for `root`
/// hide. Entries that cannot be stat'ed (dangling symlinks) are left out.
pub fn list_directory(dir: &Path, root: &Path, ignore: &IgnoreCache) -> Result<Vec<FileEntry>, ServerError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| ServerError::Io(err.into()))?;
        let name = entry.file_name().to_string_lossy().to_string();

        if name.starts_with('.') {
            continue;
        }

        let entry_path = entry.path();
        let metadata = match std::fs::metadata(entry_path) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("Skipping unreadable entry {}: {}", entry_path.display(), err);
                continue;
            }
        };
        let is_dir = metadata.is_dir();

        if ignore.should_ignore_entry(entry_path, root, is_dir) {
            debug!("Hiding ignored entry: {}", entry_path.display());
            continue;
        }

        entries.push(FileEntry {
            kind: if is_dir {
                EntryKind::Directory
            } else {
                EntryKind::for_file(entry_path)
            },
            extension: if is_dir {
                None
            } else {
                classify::extension_of(entry_path)
            },
            size: if is_dir { None } else { Some(metadata.len()) },
            modified: metadata.modified().ok(),
            is_dir,
            name,
        });
    }

    entries.sort_by(compare_entries);

    Ok(entries)
}
