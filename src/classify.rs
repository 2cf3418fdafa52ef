//! Content classification: which rendering strategy a file gets.

use std::fmt;
use std::path::Path;

/// Languages with dedicated syntax highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    Cpp,
    C,
    Css,
    Html,
    Xml,
    Json,
    Yaml,
    Bash,
    Php,
    Ruby,
    Go,
    Rust,
    Sql,
}

impl Language {
    pub const ALL: [Language; 17] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::Css,
        Language::Html,
        Language::Xml,
        Language::Json,
        Language::Yaml,
        Language::Bash,
        Language::Php,
        Language::Ruby,
        Language::Go,
        Language::Rust,
        Language::Sql,
    ];

    /// Look up a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let language = match ext.to_ascii_lowercase().as_str() {
            "js" => Language::JavaScript,
            "ts" => Language::TypeScript,
            "py" => Language::Python,
            "java" => Language::Java,
            "cpp" => Language::Cpp,
            "c" => Language::C,
            "css" => Language::Css,
            "html" => Language::Html,
            "xml" => Language::Xml,
            "json" => Language::Json,
            "yml" | "yaml" => Language::Yaml,
            "sh" => Language::Bash,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "sql" => Language::Sql,
            _ => return None,
        };
        Some(language)
    }

    /// Language tag as used in `language-*` CSS classes and fenced code info strings.
    pub fn tag(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Css => "css",
            Language::Html => "html",
            Language::Xml => "xml",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Bash => "bash",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Sql => "sql",
        }
    }

    /// Extension syntect knows this language by. TypeScript has no bundled
    /// syntax and falls back to JavaScript.
    pub fn syntax_extension(self) -> &'static str {
        match self {
            Language::JavaScript | Language::TypeScript => "js",
            Language::Python => "py",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Css => "css",
            Language::Html => "html",
            Language::Xml => "xml",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Bash => "sh",
            Language::Php => "php",
            Language::Ruby => "rb",
            Language::Go => "go",
            Language::Rust => "rs",
            Language::Sql => "sql",
        }
    }

    /// Inverse of [`tag`](Self::tag), used for Markdown fence info strings.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| language.tag() == tag)
            .or_else(|| Self::from_extension(&tag))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How a text file is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Markdown,
    Html,
    Mermaid,
    Source(Language),
    PlainText,
}

const SHEBANGS: &[(&str, Language)] = &[
    ("#!/usr/bin/env node", Language::JavaScript),
    ("#!/usr/bin/node", Language::JavaScript),
    ("#!/usr/bin/env python", Language::Python),
    ("#!/usr/bin/python", Language::Python),
    ("#!/bin/bash", Language::Bash),
    ("#!/bin/sh", Language::Bash),
];

const JAVASCRIPT_KEYWORDS: &[&str] = &["function ", "const ", "let ", "var ", "class ", "console.log"];
const PYTHON_KEYWORDS: &[&str] = &["def ", "import ", "from ", "print("];

/// Lowercased extension of `path`, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn is_markdown_extension(path: &Path) -> bool {
    matches!(extension_of(path).as_deref(), Some("md" | "markdown"))
}

pub fn is_html_extension(path: &Path) -> bool {
    matches!(extension_of(path).as_deref(), Some("html" | "htm"))
}

pub fn is_mermaid_extension(path: &Path) -> bool {
    matches!(extension_of(path).as_deref(), Some("mmd" | "mermaid"))
}

/// Highlighting language for a file: by extension, or by sniffing the content
/// when there is no extension. `None` means plain text.
pub fn classify(path: &Path, content: &str) -> Option<Language> {
    match extension_of(path) {
        Some(ext) => Language::from_extension(&ext),
        None => sniff_language(content),
    }
}

/// Shebang first, then keyword heuristics. JavaScript keywords win over Python.
pub fn sniff_language(content: &str) -> Option<Language> {
    if let Some((_, language)) = SHEBANGS.iter().find(|(shebang, _)| content.contains(shebang)) {
        return Some(*language);
    }

    if JAVASCRIPT_KEYWORDS.iter().any(|keyword| content.contains(keyword)) {
        return Some(Language::JavaScript);
    }

    if PYTHON_KEYWORDS.iter().any(|keyword| content.contains(keyword)) {
        return Some(Language::Python);
    }

    None
}

/// Rendering strategy for a text file.
pub fn classify_content(path: &Path, content: &str) -> ContentKind {
    if is_markdown_extension(path) {
        ContentKind::Markdown
    } else if is_html_extension(path) {
        ContentKind::Html
    } else if is_mermaid_extension(path) {
        ContentKind::Mermaid
    } else {
        classify(path, content).map_or(ContentKind::PlainText, ContentKind::Source)
    }
}

/// Whether a file is read as text and rendered, rather than streamed raw.
///
/// Decided by MIME type (`text/*`, JavaScript, JSON). Extensions this module
/// classifies itself always qualify, since the MIME database maps some of them
/// elsewhere (`.ts` is MPEG transport stream). Files without an extension
/// qualify when `head` has no NUL byte.
pub fn is_text_renderable(path: &Path, head: &[u8]) -> bool {
    let Some(ext) = extension_of(path) else {
        return !head.contains(&0);
    };

    if Language::from_extension(&ext).is_some()
        || is_markdown_extension(path)
        || is_mermaid_extension(path)
    {
        return true;
    }

    mime_guess::from_ext(&ext)
        .first()
        .is_some_and(|mime| is_text_mime(mime.essence_str()))
}

fn is_text_mime(essence: &str) -> bool {
    essence.starts_with("text/")
        || matches!(
            essence,
            "application/javascript" | "application/x-javascript" | "application/json"
        )
}
