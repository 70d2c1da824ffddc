//! Content Loader for docviewer.
//!
//! Fetches one document from the document service, picks its display title
//! and renders its markdown into sanitized HTML for the tab's pane.
//!
//! Document content is untrusted. Raw HTML in the markdown is emitted as
//! escaped text rather than markup, and link or image targets using
//! script-capable schemes are replaced with `#`.

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use tracing::{debug, warn};

use crate::services::document_service::DocumentService;
use crate::types::document::Document;
use crate::types::errors::DocumentError;

/// URL schemes that are never allowed in rendered links or images.
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// A document ready to be placed in its pane.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub title: String,
    pub html: String,
}

/// Loads and renders document content on demand.
pub struct ContentLoader<'a, D: DocumentService> {
    service: &'a D,
}

impl<'a, D: DocumentService> ContentLoader<'a, D> {
    pub fn new(service: &'a D) -> Self {
        Self { service }
    }

    /// Fetches `id` and renders it. `current_title` is kept when no better
    /// title can be extracted from the document.
    pub async fn load(&self, id: &str, current_title: &str) -> Result<RenderedDocument, DocumentError> {
        let doc = self.service.get(id).await.map_err(|e| {
            warn!(doc_id = %id, error = %e, "document fetch failed");
            e
        })?;
        let rendered = render_document(&doc, current_title);
        debug!(doc_id = %id, bytes = rendered.html.len(), "document rendered");
        Ok(rendered)
    }
}

/// Renders an already fetched document.
pub fn render_document(doc: &Document, current_title: &str) -> RenderedDocument {
    RenderedDocument {
        title: extract_title(doc, current_title),
        html: render_markdown(&doc.content),
    }
}

/// Chooses the display title: the service title when it has text, else the
/// first level-one heading of the content, else `fallback`.
pub fn extract_title(doc: &Document, fallback: &str) -> String {
    let title = doc.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    first_heading(&doc.content).unwrap_or_else(|| fallback.to_string())
}

/// Returns the plain text of the first `#` heading, if any.
pub fn first_heading(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_heading => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_heading = false;
                text.clear();
            }
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            _ => {}
        }
    }
    None
}

/// Renders markdown to sanitized HTML.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(markdown, options).map(sanitize_event);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        // Text events are escaped by the HTML writer.
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| normalized.starts_with(scheme)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}
