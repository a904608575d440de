//! Markdown rendering with syntax highlighting and sanitization

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::toc::{in_toc, IdAllocator};
use crate::config::HighlightConfig;

/// Converts a markdown body into HTML that is safe to embed in a page
pub trait Render: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String>;
}

/// URL schemes that execute code when followed
const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Parser options shared by rendering and heading extraction.
/// YAML metadata blocks stay off: front-matter is handled in FrontMatter::parse().
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Markdown renderer backed by pulldown-cmark and syntect
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
    allow_raw_html: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default(), false)
    }

    /// Create with custom settings
    pub fn with_options(highlight: &HighlightConfig, allow_raw_html: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: highlight.theme.clone(),
            highlight: highlight.enable,
            line_numbers: highlight.line_number,
            allow_raw_html,
        }
    }

    /// Custom `{key=value}` heading attributes are written verbatim, so only trusted stores keep them
    fn heading_attrs<'a>(
        &self,
        attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    ) -> Vec<(CowStr<'a>, Option<CowStr<'a>>)> {
        if self.allow_raw_html {
            attrs
        } else {
            Vec::new()
        }
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        let plain = || {
            format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                html_escape(lang),
                html_escape(code)
            )
        };

        if !self.highlight {
            return plain();
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
        else {
            return plain();
        };

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) if self.line_numbers => self.add_line_numbers(&highlighted, lang),
            Ok(highlighted) => format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                html_escape(lang),
                highlighted
            ),
            Err(e) => {
                tracing::debug!("Highlighting failed for {}: {}", lang, e);
                plain()
            }
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
            html_escape(lang),
            gutter,
            lines.join("\n")
        )
    }

    /// Rewrite the event stream: escape raw HTML, neutralize unsafe links,
    /// highlight code blocks and give h2-h4 headings anchor ids
    fn transform<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events: Vec<Event<'a>> = Vec::new();
        let mut ids = IdAllocator::default();
        let mut code_block: Option<(Option<String>, String)> = None;
        // Index of the open heading's start event and its text so far
        let mut heading: Option<(usize, String)> = None;

        for event in parser {
            if let Some((lang, content)) = code_block.as_mut() {
                match event {
                    Event::Text(text) => content.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let highlighted = self.highlight_code(content, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                        code_block = None;
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .filter(|l| !l.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::Start(Tag::Heading { level, .. }) if in_toc(level) => {
                    heading = Some((events.len(), String::new()));
                    events.push(event);
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => events.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs: self.heading_attrs(attrs),
                })),
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((start, text)) = heading.take() {
                        if let Event::Start(Tag::Heading {
                            level,
                            id,
                            classes,
                            attrs,
                        }) = &events[start]
                        {
                            let id = match id {
                                Some(id) => id.clone(),
                                None => CowStr::from(ids.allocate(text.trim())),
                            };
                            let with_id = Event::Start(Tag::Heading {
                                level: *level,
                                id: Some(id),
                                classes: classes.clone(),
                                attrs: self.heading_attrs(attrs.clone()),
                            });
                            events[start] = with_id;
                        }
                    }
                    events.push(event);
                }
                Event::Text(ref text) | Event::Code(ref text) => {
                    if let Some((_, buf)) = heading.as_mut() {
                        buf.push_str(text);
                    }
                    events.push(event);
                }
                Event::Html(raw) | Event::InlineHtml(raw) if !self.allow_raw_html => {
                    events.push(Event::Text(raw));
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Link {
                    link_type,
                    dest_url: neutralize_url(dest_url),
                    title,
                    id,
                })),
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Image {
                    link_type,
                    dest_url: neutralize_url(dest_url),
                    title,
                    id,
                })),
                _ => events.push(event),
            }
        }

        events
    }
}

impl Render for MarkdownRenderer {
    /// Render markdown to HTML
    fn render(&self, markdown: &str) -> Result<String> {
        let parser = Parser::new_ext(markdown, parser_options());
        let events = self.transform(parser);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace script-bearing link targets with `#`
fn neutralize_url(url: CowStr<'_>) -> CowStr<'_> {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if UNSAFE_SCHEMES.iter().any(|s| normalized.starts_with(s)) {
        tracing::debug!("Neutralized unsafe link target {}", url);
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Text content of a markdown document with all markup removed
pub fn plain_text(markdown: &str) -> String {
    let mut out = String::new();
    for event in Parser::new_ext(markdown, parser_options()) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::TableCell,
            ) => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Take at most `limit` characters of plain text from a markdown body
pub fn excerpt(markdown: &str, limit: usize) -> String {
    plain_text(markdown).chars().take(limit).collect::<String>().trim_end().to_string()
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
