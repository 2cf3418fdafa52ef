use std::sync::LazyLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::escape_html;
use crate::classify::Language;

// Lazy-loaded syntax highlighting assets
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const FALLBACK_THEME: &str = "InspiredGitHub";

/// Syntect-backed highlighter producing inline-styled HTML.
#[derive(Debug, Clone)]
pub struct Highlighter {
    theme_name: String,
}

impl Highlighter {
    pub fn new(theme_name: impl Into<String>) -> Self {
        Self {
            theme_name: theme_name.into(),
        }
    }

    fn theme(&self) -> Option<&'static Theme> {
        THEME_SET
            .themes
            .get(&self.theme_name)
            .or_else(|| THEME_SET.themes.get(FALLBACK_THEME))
    }

    fn syntax_for(language: Option<Language>, content: &str) -> &'static SyntaxReference {
        language
            .and_then(|language| SYNTAX_SET.find_syntax_by_extension(language.syntax_extension()))
            .or_else(|| SYNTAX_SET.find_syntax_by_first_line(content))
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
    }

    fn highlight_to_lines(&self, content: &str, language: Option<Language>) -> Option<Vec<String>> {
        let theme = self.theme()?;
        let syntax = Self::syntax_for(language, content);
        let mut highlighter = HighlightLines::new(syntax, theme);

        let mut lines = Vec::new();
        for line in LinesWithEndings::from(content) {
            let regions = highlighter.highlight_line(line, &SYNTAX_SET).ok()?;
            let html = styled_line_to_highlighted_html(&regions[..], IncludeBackground::No).ok()?;
            lines.push(html.trim_end_matches('\n').to_string());
        }
        Some(lines)
    }

    /// Whole-file view: a table with a line-number column.
    pub fn highlight_file(&self, content: &str, language: Option<Language>) -> String {
        let Some(lines) = self.highlight_to_lines(content, language) else {
            return plain_block(content, language);
        };

        let mut html_output = String::with_capacity(content.len() * 2);
        html_output.push_str("<table class=\"highlighted-code\"><tbody>");

        for (i, line) in lines.iter().enumerate() {
            html_output.push_str("<tr>");
            html_output.push_str(&format!("<td class=\"line-number\">{}</td>", i + 1));
            html_output.push_str("<td class=\"line-code\">");
            if line.trim().is_empty() {
                html_output.push(' ');
            } else {
                html_output.push_str(line);
            }
            html_output.push_str("</td></tr>");
        }

        html_output.push_str("</tbody></table>");
        html_output
    }

    /// Fenced code block inside a Markdown document.
    pub fn highlight_block(&self, code: &str, language: Option<Language>) -> String {
        let Some(lines) = self.highlight_to_lines(code, language) else {
            return plain_block(code, language);
        };

        let class = language.map_or("plain", Language::tag);
        format!(
            "<pre class=\"code-block\"><code class=\"language-{}\">{}</code></pre>",
            class,
            lines.join("\n")
        )
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(FALLBACK_THEME)
    }
}

/// Unhighlighted, escaped code block.
pub fn plain_block(code: &str, language: Option<Language>) -> String {
    let class = language.map_or("plain", Language::tag);
    format!(
        "<pre class=\"code-block\"><code class=\"language-{}\">{}</code></pre>",
        class,
        escape_html(code)
    )
}
