//! Defines the [`Post`] and [`PostMeta`] types. See [`crate::parser`] for how
//! posts are built from source files and `value.rs` for how they are exposed
//! to templates.

use chrono::{DateTime, Utc};

pub const MARKDOWN_EXTENSION: &str = ".md";
pub const HTML_EXTENSION: &str = ".html";

/// The metadata of a post: the decoded metadata block plus the fields derived
/// from it during a build.
#[derive(Clone, Debug, PartialEq)]
pub struct PostMeta {
    /// The `unixdate` as written in the metadata block. `None` if the post
    /// was stamped during this build.
    pub unixdate: Option<String>,

    /// The resolved creation date. Always set, even for posts which arrived
    /// without a `unixdate`.
    pub date: DateTime<Utc>,

    /// `date` in long form, e.g. `April 16, 2021`.
    pub date_string: String,

    pub title: String,

    /// Tags in authored order, duplicates included.
    pub tags: Vec<String>,

    /// The output file name of the post page, relative to the posts output
    /// directory. See [`build_url`].
    pub url: String,
}

/// A post, built once per source file per build and never modified
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The source file name, e.g. `my-post.md`.
    pub name: String,

    /// The raw source text, including the `unixdate` stamp if one was
    /// written during this build.
    pub source: String,

    /// The sanitized HTML of the full content.
    pub output: String,

    /// The sanitized HTML of the content preview.
    pub preview_output: String,

    pub data: PostMeta,
}

/// Derives a post's output file name from its source file name by removing one
/// trailing `.md` (if present) and appending `.html`.
pub fn build_url(name: &str) -> String {
    let stem = name.strip_suffix(MARKDOWN_EXTENSION).unwrap_or(name);
    format!("{}{}", stem, HTML_EXTENSION)
}
