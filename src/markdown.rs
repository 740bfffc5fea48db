//! Converts post content from Markdown into sanitized HTML, both in full and
//! as a short preview for listing pages.

use pulldown_cmark::{html, Options, Parser};

/// The number of code points of Markdown source kept for a preview.
pub const PREVIEW_LENGTH: usize = 750;

/// The full and preview HTML for one post's content.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub output: String,
    pub preview_output: String,
}

/// Renders `content` into sanitized HTML. The preview is rendered from the
/// first [`PREVIEW_LENGTH`] code points of the Markdown source rather than by
/// cutting the full HTML, so a cut landing mid-element still yields balanced
/// markup.
pub fn render(content: &str) -> Rendered {
    Rendered {
        output: sanitize(&to_html(content)),
        preview_output: sanitize(&to_html(preview_source(content))),
    }
}

/// Converts Markdown to (unsanitized) HTML.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Reduces untrusted HTML to a safe subset: scripts, event handler attributes
/// and `javascript:` URLs are removed.
pub fn sanitize(html: &str) -> String {
    ammonia::clean(html)
}

/// Returns the first [`PREVIEW_LENGTH`] code points of `content`, or all of it
/// if it's shorter.
pub fn preview_source(content: &str) -> &str {
    match content.char_indices().nth(PREVIEW_LENGTH) {
        Some((i, _)) => &content[..i],
        None => content,
    }
}
