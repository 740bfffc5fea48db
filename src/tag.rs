//! Defines the [`TagBucket`] type and [`index_tags`], which groups posts by
//! tag, and the mapping from a tag name to its page.

use crate::post::{Post, HTML_EXTENSION};
use std::collections::HashMap;
use std::fmt;

/// The posts sharing one tag.
#[derive(Debug)]
pub struct TagBucket<'a> {
    /// The tag exactly as authored.
    pub name: String,

    /// The tag page's file name inside `tags/`, from [`file_name`].
    pub file_name: String,

    /// The posts carrying the tag, in the order they were indexed (file name
    /// order, not date order). A post appears at most once.
    pub posts: Vec<&'a Post>,
}

/// The file name of the page for `tag`: the tag as authored plus `.html`,
/// with characters that can't appear in a file name percent-escaped (`/`
/// becomes `%2F`). `%` itself is escaped, so distinct tags get distinct
/// names. A leading `.` is escaped so the page isn't hidden.
pub fn file_name(tag: &str) -> String {
    let mut name = String::with_capacity(tag.len() + HTML_EXTENSION.len());
    for (i, c) in tag.chars().enumerate() {
        if is_unsafe(c) || (i == 0 && c == '.') {
            let mut buf = [0; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                name.push_str(&format!("%{:02X}", b));
            }
        } else {
            name.push(c);
        }
    }
    name.push_str(HTML_EXTENSION);
    name
}

/// The link to the page for `tag`, relative to the tags output directory.
/// This is [`file_name`] percent-encoded for use in an `href`.
pub fn url(tag: &str) -> String {
    urlencoding::encode(&file_name(tag)).into_owned()
}

fn is_unsafe(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '/' | '\\' | '%' | ':' | '*' | '?' | '"' | '<' | '>' | '|'
        )
}

/// Groups `posts` by tag. Buckets come back in the order their tags were first
/// seen and tag names are matched exactly (`Rust` and `rust lang` are
/// different buckets). A post listing the same tag twice is added to that
/// bucket once.
///
/// A blank tag is an error. So are two distinct tags whose file names differ
/// only in case (`Rust` and `rust`), which would overwrite each other on a
/// case-insensitive file system.
pub fn index_tags(posts: &[Post]) -> Result<Vec<TagBucket>> {
    let mut buckets: Vec<TagBucket> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    let mut by_file: HashMap<String, usize> = HashMap::new();

    for post in posts {
        for tag in post.data.tags.iter() {
            match by_name.get(tag.as_str()) {
                Some(&i) => {
                    let bucket = &mut buckets[i];
                    let already_added = bucket
                        .posts
                        .last()
                        .map_or(false, |last| std::ptr::eq(*last, post));
                    if !already_added {
                        bucket.posts.push(post);
                    }
                }
                None => {
                    if tag.trim().is_empty() {
                        return Err(Error::InvalidTag(tag.clone()));
                    }
                    let file_name = file_name(tag);
                    let folded = file_name.to_lowercase();
                    if let Some(&i) = by_file.get(&folded) {
                        return Err(Error::Collision {
                            file_name,
                            first: buckets[i].name.clone(),
                            second: tag.clone(),
                        });
                    }
                    by_name.insert(tag.as_str(), buckets.len());
                    by_file.insert(folded, buckets.len());
                    buckets.push(TagBucket {
                        name: tag.clone(),
                        file_name,
                        posts: vec![post],
                    });
                }
            }
        }
    }

    Ok(buckets)
}

/// The result of indexing tags.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error indexing tags.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned for a blank tag, which has no usable file name.
    InvalidTag(String),

    /// Returned when two distinct tags would be written to the same file.
    Collision {
        file_name: String,
        first: String,
        second: String,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidTag(tag) => {
                write!(f, "Tag `{}` can't be used as a file name", tag)
            }
            Error::Collision {
                file_name,
                first,
                second,
            } => write!(
                f,
                "Tags `{}` and `{}` both map to 'tags/{}'",
                first, second, file_name
            ),
        }
    }
}

impl std::error::Error for Error {}
