//! Request pipeline: decode, guard, ignore check, existence check, stat, then
//! list a directory or render a file.

use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::classify;
use crate::error::ServerError;
use crate::guard;
use crate::listing::list_directory;
use crate::AppState;

/// Bytes inspected to decide whether an extensionless file is text.
const SNIFF_BYTES: u64 = 8 * 1024;

/// Strict percent-decoding of a request path.
///
/// Every `%` must start a two-digit hex escape and the decoded bytes must be
/// UTF-8; anything else is a bad request rather than a guess.
pub fn decode_path(raw: &str) -> Result<String, ServerError> {
    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let well_formed = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(ServerError::InvalidPath(format!("malformed escape at byte {}", i)));
        }
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ServerError::InvalidPath("path is not valid UTF-8".to_string()))
}

/// Ignore and existence checks, then the symlink-aware containment check.
/// Ignored and missing paths both come back as [`ServerError::NotFound`].
///
/// The ignore rules are applied to the requested path and again to the path
/// it resolves to, so a link cannot expose an ignored file.
fn admit(state: &AppState, candidate: &Path) -> Result<(), ServerError> {
    if state.ignore.should_ignore(candidate, &state.root_dir) {
        debug!("Ignored path requested: {}", candidate.display());
        return Err(ServerError::NotFound);
    }

    if !candidate.exists() {
        debug!("Path not found: {}", candidate.display());
        return Err(ServerError::NotFound);
    }

    let canonical = guard::verify_canonical(&state.root_dir, candidate)?;
    let canonical_root = state.root_dir.canonicalize()?;
    if state.ignore.should_ignore(&canonical, &canonical_root) {
        debug!(
            "Path resolves to ignored target: {} -> {}",
            candidate.display(),
            canonical.display()
        );
        return Err(ServerError::NotFound);
    }

    Ok(())
}

/// GET /{path} - Directory listing or rendered file
pub async fn serve_path(State(state): State<AppState>, uri: Uri) -> Result<Response, ServerError> {
    let decoded = decode_path(uri.path())?;
    let candidate = guard::resolve_request_path(&state.root_dir, &decoded);

    if !guard::is_contained(&state.root_dir, &candidate) {
        warn!("Path traversal attempt detected: {}", uri.path());
        return Err(ServerError::PathTraversal);
    }
    let candidate = guard::normalize_lexically(&candidate);

    {
        let state = state.clone();
        let candidate = candidate.clone();
        tokio::task::spawn_blocking(move || admit(&state, &candidate)).await??;
    }

    let metadata = fs::metadata(&candidate).await?;

    if metadata.is_dir() {
        serve_directory(state, candidate).await
    } else {
        serve_file(state, candidate, metadata.len()).await
    }
}

async fn serve_directory(state: AppState, dir: PathBuf) -> Result<Response, ServerError> {
    debug!("Listing directory: {}", dir.display());

    let body = tokio::task::spawn_blocking(move || {
        let entries = list_directory(&dir, &state.root_dir, &state.ignore)?;
        Ok::<_, ServerError>(state.renderer.render_directory(&entries, &dir, &state.root_dir))
    })
    .await??;

    Ok(Html(body).into_response())
}

async fn serve_file(state: AppState, path: PathBuf, size: u64) -> Result<Response, ServerError> {
    let head = if classify::extension_of(&path).is_none() {
        read_head(&path).await?
    } else {
        Vec::new()
    };

    if !classify::is_text_renderable(&path, &head) {
        return stream_raw(&path, size).await;
    }

    if size > state.settings.max_render_bytes {
        debug!(
            "File too large to render ({} bytes), streaming raw: {}",
            size,
            path.display()
        );
        return stream_raw(&path, size).await;
    }

    debug!("Rendering file: {}", path.display());

    let bytes = fs::read(&path).await?;
    let body = tokio::task::spawn_blocking(move || {
        let content = String::from_utf8_lossy(&bytes);
        let kind = classify::classify_content(&path, &content);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        state
            .renderer
            .render_file(&name, &content, &path, &state.root_dir, kind)
    })
    .await?;

    Ok(Html(body).into_response())
}

async fn read_head(path: &Path) -> Result<Vec<u8>, ServerError> {
    let file = fs::File::open(path).await?;
    let mut head = Vec::new();
    file.take(SNIFF_BYTES).read_to_end(&mut head).await?;
    Ok(head)
}

/// Stream a file as-is with a guessed content type.
///
/// Uses streaming to handle large files efficiently without loading them entirely into memory.
async fn stream_raw(path: &Path, size: u64) -> Result<Response, ServerError> {
    debug!("Streaming file: {}", path.display());

    let file = fs::File::open(path).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let safe_filename = sanitize_filename(&file_name);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", safe_filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// Make a file name safe for a quoted `Content-Disposition` parameter.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '\'',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decode_path_plain() {
        assert_eq!(decode_path("/docs/readme.md").unwrap(), "/docs/readme.md");
    }

    #[test]
    fn test_decode_path_escapes() {
        assert_eq!(decode_path("/my%20notes.md").unwrap(), "/my notes.md");
        assert_eq!(decode_path("/%2e%2e/%2E%2E/etc").unwrap(), "/../../etc");
        assert_eq!(decode_path("/caf%C3%A9").unwrap(), "/café");
        // Decoded once only
        assert_eq!(decode_path("/100%25").unwrap(), "/100%");
    }

    #[test]
    fn test_decode_path_rejects_malformed_escape() {
        assert!(matches!(decode_path("/bad%zz"), Err(ServerError::InvalidPath(_))));
        assert!(matches!(decode_path("/trailing%"), Err(ServerError::InvalidPath(_))));
        assert!(matches!(decode_path("/short%4"), Err(ServerError::InvalidPath(_))));
    }

    #[test]
    fn test_decode_path_rejects_invalid_utf8() {
        assert!(matches!(decode_path("/%ff%fe"), Err(ServerError::InvalidPath(_))));
    }

    #[test]
    fn test_admit_treats_ignored_and_missing_alike() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::write(root.join(".gitignore"), "secret.md\n").unwrap();
        std::fs::write(root.join("secret.md"), "hidden").unwrap();
        std::fs::write(root.join("public.md"), "shown").unwrap();
        let state = AppState::new(root.clone());

        assert!(matches!(admit(&state, &root.join("secret.md")), Err(ServerError::NotFound)));
        assert!(matches!(admit(&state, &root.join("absent.md")), Err(ServerError::NotFound)));
        assert!(admit(&state, &root.join("public.md")).is_ok());
        assert!(admit(&state, &root).is_ok());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("logo.png"), "logo.png");
        assert_eq!(sanitize_filename("a\u{1}b.png"), "a_b.png");
        assert_eq!(sanitize_filename("a\r\nb\t.png"), "a__b_.png");
        assert_eq!(sanitize_filename("say \"hi\".png"), "say 'hi'.png");
        assert_eq!(sanitize_filename("a\u{7f}.png"), "a_.png");
    }

    #[cfg(unix)]
    #[test]
    fn test_admit_rejects_links_to_ignored_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::write(root.join(".gitignore"), "/secret.md\n").unwrap();
        std::fs::write(root.join("secret.md"), "hidden").unwrap();
        std::os::unix::fs::symlink(root.join("secret.md"), root.join("link.md")).unwrap();
        std::os::unix::fs::symlink(&root, root.join("alias")).unwrap();
        let state = AppState::new(root.clone());

        assert!(matches!(admit(&state, &root.join("link.md")), Err(ServerError::NotFound)));
        assert!(matches!(
            admit(&state, &root.join("alias/secret.md")),
            Err(ServerError::NotFound)
        ));
    }
}
