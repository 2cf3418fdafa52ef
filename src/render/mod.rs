//! HTML documents for directory listings and rendered files.

pub mod highlight;
pub mod markdown;

use std::path::{Component, Path};

use chrono::{DateTime, Local};

use crate::classify::ContentKind;
use crate::config::Settings;
use crate::listing::{EntryKind, FileEntry};

pub use highlight::Highlighter;
pub use markdown::{render_markdown, CodeBlockHandler, DiagramAwareBlocks};

/// Turns listings and classified file content into complete HTML documents.
///
/// Implementations must not have side effects visible to the caller.
pub trait Renderer: Send + Sync {
    fn render_directory(&self, entries: &[FileEntry], current: &Path, root: &Path) -> String;

    fn render_file(&self, name: &str, content: &str, path: &Path, root: &Path, kind: ContentKind) -> String;
}

/// Default renderer: Markdown via pulldown-cmark, source via syntect, Mermaid
/// diagrams drawn client-side.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    highlighter: Highlighter,
    mermaid_script: String,
}

impl HtmlRenderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            highlighter: Highlighter::new(settings.theme.clone()),
            mermaid_script: settings.mermaid_script.clone(),
        }
    }

    fn page(&self, title: &str, nav: &str, body: &str) -> String {
        let mermaid = if body.contains("class=\"mermaid\"") {
            format!(
                "<script src=\"{}\"></script>\n<script>mermaid.initialize({{ startOnLoad: true }});</script>\n",
                escape_html(&self.mermaid_script)
            )
        } else {
            String::new()
        };

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n<main>\n{}\n</main>\n{}</body>\n</html>\n",
            escape_html(title),
            STYLE,
            nav,
            body,
            mermaid
        )
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Renderer for HtmlRenderer {
    fn render_directory(&self, entries: &[FileEntry], current: &Path, root: &Path) -> String {
        let base = url_path(root, current, true);
        let mut rows = String::new();

        if let Some(parent) = current.parent().filter(|_| current != root) {
            rows.push_str(&format!(
                "<tr><td class=\"icon\">&#x2934;</td><td><a href=\"{}\">..</a></td><td></td><td></td></tr>\n",
                url_path(root, parent, true)
            ));
        }

        for entry in entries {
            let mut href = format!("{}{}", base, urlencoding::encode(&entry.name));
            let mut label = escape_html(&entry.name);
            if entry.is_dir {
                href.push('/');
                label.push('/');
            }

            let size = entry
                .size
                .map(|size| humansize::format_size(size, humansize::DECIMAL))
                .unwrap_or_else(|| "-".to_string());
            let modified = entry
                .modified
                .map(|time| DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();

            rows.push_str(&format!(
                "<tr><td class=\"icon\">{}</td><td><a href=\"{}\">{}</a></td><td class=\"size\">{}</td><td>{}</td></tr>\n",
                icon(entry.kind),
                href,
                label,
                size,
                modified
            ));
        }

        let body = format!(
            "<table class=\"listing\">\n<thead><tr><th></th><th>Name</th><th>Size</th><th>Modified</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>",
            rows
        );

        self.page(&base, &nav_header(root, current, true), &body)
    }

    fn render_file(&self, name: &str, content: &str, path: &Path, root: &Path, kind: ContentKind) -> String {
        let nav = nav_header(root, path, false);

        match kind {
            ContentKind::Html => inject_header(content, &nav),
            ContentKind::Markdown => {
                let handler = DiagramAwareBlocks::new(&self.highlighter);
                let body = format!(
                    "<article class=\"markdown-body\">\n{}</article>",
                    render_markdown(content, &handler)
                );
                self.page(name, &nav, &body)
            }
            ContentKind::Mermaid => self.page(name, &nav, &markdown::mermaid_placeholder(content)),
            ContentKind::Source(language) => {
                self.page(name, &nav, &self.highlighter.highlight_file(content, Some(language)))
            }
            ContentKind::PlainText => {
                self.page(name, &nav, &format!("<pre class=\"plain\">{}</pre>", escape_html(content)))
            }
        }
    }
}

/// Escape HTML entities
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// URL path of `path` relative to `root`, with a leading slash and, when
/// `is_dir` is set, a trailing one. Segments are percent-encoded.
pub fn url_path(root: &Path, path: &Path, is_dir: bool) -> String {
    let mut url = String::from("/");
    for segment in relative_segments(root, path) {
        url.push_str(&urlencoding::encode(&segment));
        url.push('/');
    }
    if !is_dir && url.len() > 1 {
        url.pop();
    }
    url
}

fn relative_segments(root: &Path, path: &Path) -> Vec<String> {
    path.strip_prefix(root)
        .map(|relative| {
            relative
                .components()
                .filter_map(|component| match component {
                    Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Breadcrumb navigation from the root down to `path`.
pub fn nav_header(root: &Path, path: &Path, is_dir: bool) -> String {
    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "/".to_string());

    let mut crumbs = format!("<a href=\"/\">{}</a>", escape_html(&root_name));
    let mut href = String::from("/");

    let segments = relative_segments(root, path);
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        href.push_str(&urlencoding::encode(segment));
        if i < last || is_dir {
            href.push('/');
        }
        crumbs.push_str(&format!(
            " <span class=\"sep\">/</span> <a href=\"{}\">{}</a>",
            href,
            escape_html(segment)
        ));
    }

    format!("<nav class=\"docserve-nav\">{}</nav>", crumbs)
}

/// Insert the navigation header right after the opening `<body>` tag, or at the
/// top when the document has none.
pub fn inject_header(document: &str, header: &str) -> String {
    let lower = document.to_ascii_lowercase();
    let insert_at = lower
        .find("<body")
        .and_then(|start| lower[start..].find('>').map(|end| start + end + 1));

    let styled = format!("<style>{}</style>\n{}\n", NAV_STYLE, header);
    match insert_at {
        Some(index) => {
            let mut output = String::with_capacity(document.len() + styled.len());
            output.push_str(&document[..index]);
            output.push('\n');
            output.push_str(&styled);
            output.push_str(&document[index..]);
            output
        }
        None => format!("{}{}", styled, document),
    }
}

fn icon(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Directory => "&#x1F4C1;",
        EntryKind::Markdown => "&#x1F4DD;",
        EntryKind::Html => "&#x1F310;",
        EntryKind::Mermaid => "&#x1F4CA;",
        EntryKind::Source(_) => "&#x1F4DC;",
        EntryKind::Image => "&#x1F5BC;",
        EntryKind::Text => "&#x1F4C4;",
        EntryKind::Other => "&#x1F4E6;",
    }
}

const NAV_STYLE: &str = ".docserve-nav{font:14px system-ui,sans-serif;padding:8px 16px;border-bottom:1px solid #d0d7de;background:#f6f8fa}\
.docserve-nav a{color:#0969da;text-decoration:none}.docserve-nav .sep{color:#8c959f}";

const STYLE: &str = "body{margin:0;font:16px/1.5 system-ui,sans-serif;color:#1f2328}\
main{max-width:980px;margin:0 auto;padding:16px 32px}\
.docserve-nav{font-size:14px;padding:8px 16px;border-bottom:1px solid #d0d7de;background:#f6f8fa}\
.docserve-nav a{color:#0969da;text-decoration:none}.docserve-nav .sep{color:#8c959f}\
table.listing{border-collapse:collapse;width:100%}table.listing td,table.listing th{padding:4px 8px;text-align:left}\
table.listing tr:nth-child(even){background:#f6f8fa}td.size{text-align:right;white-space:nowrap}td.icon{width:1.5em}\
pre{overflow-x:auto}pre.code-block,pre.plain{background:#f6f8fa;padding:12px;border-radius:6px}\
table.highlighted-code{font:12px/1.5 ui-monospace,SFMono-Regular,Menlo,monospace;border-collapse:collapse;width:100%}\
td.line-number{text-align:right;padding-right:.5em;min-width:2.5em;color:#6b7280;user-select:none;vertical-align:top}\
td.line-code{white-space:pre;vertical-align:top}pre.mermaid{background:none}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Language;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn entry(name: &str, is_dir: bool) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            is_dir,
            size: if is_dir { None } else { Some(1500) },
            modified: Some(SystemTime::now()),
            extension: None,
            kind: if is_dir { EntryKind::Directory } else { EntryKind::Text },
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_directory_listing_links() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir(root.join("docs")).unwrap();

        let renderer = HtmlRenderer::default();
        let html = renderer.render_directory(
            &[entry("guides", true), entry("my notes.txt", false)],
            &root.join("docs"),
            root,
        );

        assert!(html.contains("<a href=\"/docs/guides/\">guides/</a>"));
        assert!(html.contains("<a href=\"/docs/my%20notes.txt\">my notes.txt</a>"));
        assert!(html.contains("kB"));
        assert!(html.contains("<a href=\"/\">..</a>"));
    }

    #[test]
    fn test_root_listing_has_no_parent_link() {
        let temp_dir = TempDir::new().unwrap();
        let renderer = HtmlRenderer::default();
        let html = renderer.render_directory(&[], temp_dir.path(), temp_dir.path());

        assert!(!html.contains(">..</a>"));
        assert!(html.contains("<title>/</title>"));
    }

    #[test]
    fn test_markdown_with_mermaid_loads_script() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let renderer = HtmlRenderer::default();

        let html = renderer.render_file(
            "flow.md",
            "# Flow\n\n```mermaid\ngraph LR\n```\n",
            &root.join("flow.md"),
            root,
            ContentKind::Markdown,
        );

        assert!(html.contains("<h1>Flow</h1>"));
        assert!(html.contains("<pre class=\"mermaid\">"));
        assert!(html.contains("mermaid.initialize"));
    }

    #[test]
    fn test_plain_markdown_skips_mermaid_script() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let renderer = HtmlRenderer::default();

        let html = renderer.render_file("a.md", "hello", &root.join("a.md"), root, ContentKind::Markdown);
        assert!(!html.contains("mermaid.initialize"));
    }

    #[test]
    fn test_source_file_is_wrapped_in_document() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let renderer = HtmlRenderer::default();

        let html = renderer.render_file(
            "main.rs",
            "fn main() {}\n",
            &root.join("main.rs"),
            root,
            ContentKind::Source(Language::Rust),
        );

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("highlighted-code"));
        assert!(html.contains("<title>main.rs</title>"));
    }

    #[test]
    fn test_plain_text_is_escaped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let renderer = HtmlRenderer::default();

        let html = renderer.render_file("a.txt", "<b>", &root.join("a.txt"), root, ContentKind::PlainText);
        assert!(html.contains("<pre class=\"plain\">&lt;b&gt;</pre>"));
    }

    #[test]
    fn test_inject_header_after_body_tag() {
        let doc = "<html><BODY class=\"x\"><p>hi</p></BODY></html>";
        let output = inject_header(doc, "<nav>crumbs</nav>");

        let body_end = output.find("<BODY class=\"x\">").unwrap() + "<BODY class=\"x\">".len();
        let nav = output.find("<nav>crumbs</nav>").unwrap();
        assert!(nav > body_end);
        assert!(nav < output.find("<p>hi</p>").unwrap());
    }

    #[test]
    fn test_inject_header_without_body() {
        let output = inject_header("<p>fragment</p>", "<nav>crumbs</nav>");
        assert!(output.find("<nav>crumbs</nav>").unwrap() < output.find("<p>fragment</p>").unwrap());
    }

    #[test]
    fn test_nav_header_breadcrumbs() {
        let root = Path::new("/srv/docs");

        let nav = nav_header(root, &root.join("a b/c/d.md"), false);
        assert!(nav.contains("<a href=\"/\">docs</a>"));
        assert!(nav.contains("<a href=\"/a%20b/\">a b</a>"));
        assert!(nav.contains("<a href=\"/a%20b/c/\">c</a>"));
        assert!(nav.contains("<a href=\"/a%20b/c/d.md\">d.md</a>"));

        let nav = nav_header(root, &root.join("a b/c"), true);
        assert!(nav.contains("<a href=\"/a%20b/c/\">c</a>"));
    }

    #[test]
    fn test_url_path() {
        let root = Path::new("/srv/docs");

        assert_eq!(url_path(root, root, true), "/");
        assert_eq!(url_path(root, &root.join("docs"), true), "/docs/");
        assert_eq!(url_path(root, &root.join("docs/readme.md"), false), "/docs/readme.md");
    }

    #[test]
    fn test_rendering_does_not_touch_the_filesystem() {
        // Nothing under this root exists; links come from the flags alone.
        let root = Path::new("/nonexistent/docserve-root");
        let renderer = HtmlRenderer::default();

        let html = renderer.render_directory(&[entry("guide", true)], &root.join("docs"), root);
        assert!(html.contains("<a href=\"/docs/guide/\">guide/</a>"));
        assert!(html.contains("<a href=\"/docs/\">docs</a>"));

        let html = renderer.render_file(
            "a.md",
            "# A",
            &root.join("docs/a.md"),
            root,
            ContentKind::Markdown,
        );
        assert!(html.contains("<a href=\"/docs/a.md\">a.md</a>"));
    }
}
