//! Markdown to HTML with pluggable handling of fenced code blocks.

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::escape_html;
use super::highlight::Highlighter;
use crate::classify::Language;

/// Renders one code block. Called with the raw code and the fence info string
/// (empty for indented blocks); the returned HTML replaces the block.
pub trait CodeBlockHandler {
    fn render_code_block(&self, code: &str, info: &str) -> String;
}

/// Mermaid fences become diagram placeholders for the client-side renderer;
/// everything else is syntax highlighted.
pub struct DiagramAwareBlocks<'a> {
    highlighter: &'a Highlighter,
}

impl<'a> DiagramAwareBlocks<'a> {
    pub fn new(highlighter: &'a Highlighter) -> Self {
        Self { highlighter }
    }
}

impl CodeBlockHandler for DiagramAwareBlocks<'_> {
    fn render_code_block(&self, code: &str, info: &str) -> String {
        let lang = info.split_whitespace().next().unwrap_or("");

        if lang.eq_ignore_ascii_case("mermaid") {
            return mermaid_placeholder(code);
        }

        match Language::from_tag(lang) {
            Some(language) => self.highlighter.highlight_block(code, Some(language)),
            None => super::highlight::plain_block(code, None),
        }
    }
}

/// Container the Mermaid script picks up and replaces with a diagram.
pub fn mermaid_placeholder(code: &str) -> String {
    format!("<pre class=\"mermaid\">{}</pre>", escape_html(code))
}

/// Render CommonMark plus tables, strikethrough, task lists and footnotes.
pub fn render_markdown(content: &str, handler: &dyn CodeBlockHandler) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut events = Vec::new();
    let mut code_block: Option<(String, String)> = None;

    for event in Parser::new_ext(content, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code_block = Some((info, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((info, code)) = code_block.take() {
                    events.push(Event::Html(handler.render_code_block(&code, &info).into()));
                }
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }
            other => events.push(other),
        }
    }

    let mut html_output = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut html_output, events.into_iter());
    html_output
}
