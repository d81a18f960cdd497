//! Markdown → Discourse topic extraction.
//!
//! The document is rendered to HTML first. The first `<h1>`..`<h6>` element in
//! that HTML (written in Markdown or as raw HTML) becomes the topic title and is
//! cut out of the body. Everything else is left as rendered.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pulldown_cmark::{Options, Parser, html};
use scraper::{Html, Selector};

pub const NO_TITLE_PLACEHOLDER: &str = "No Title Found";

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTopic {
    pub title: String,
    /// HTML fragment with the title heading removed, trimmed.
    pub content: String,
}

impl ExtractedTopic {
    pub fn has_title(&self) -> bool {
        self.title != NO_TITLE_PLACEHOLDER
    }
}

/// Render `markdown` and split it into a title and an HTML body.
pub fn extract_topic(markdown: &str) -> ExtractedTopic {
    let rendered = render_html(markdown);
    match split_first_heading(&rendered) {
        Some((title, content)) => ExtractedTopic {
            title,
            content: content.trim().to_string(),
        },
        None => ExtractedTopic {
            title: NO_TITLE_PLACEHOLDER.to_string(),
            content: rendered.trim().to_string(),
        },
    }
}

pub fn render_html(markdown: &str) -> String {
    let mut rendered = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(&mut rendered, Parser::new_ext(markdown, markdown_options()));
    rendered
}

/// Title text of the first heading element and the HTML left after removing it.
/// The whitespace text node right after the heading goes with it.
fn split_first_heading(rendered: &str) -> Option<(String, String)> {
    let selector = Selector::parse(HEADING_SELECTOR).ok()?;
    let mut fragment = Html::parse_fragment(rendered);

    let heading = fragment.select(&selector).next()?;
    let title = heading.text().collect::<String>().trim().to_string();
    let heading_id = heading.id();
    let trailing_whitespace = heading
        .next_sibling()
        .filter(|node| {
            node.value()
                .as_text()
                .is_some_and(|text| text.trim().is_empty())
        })
        .map(|node| node.id());

    for id in [Some(heading_id), trailing_whitespace].into_iter().flatten() {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    Some((title, fragment.root_element().inner_html()))
}

/// Read a Markdown file and extract its topic without touching the network.
pub fn preview_file(path: &Path) -> Result<ExtractedTopic> {
    let markdown = read_markdown(path)?;
    Ok(extract_topic(&markdown))
}

pub fn read_markdown(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}
