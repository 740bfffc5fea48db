//! Splits a post source file into its metadata block and its Markdown content
//! and decodes the metadata block into a [`Frontmatter`].
//!
//! A post looks like this:
//!
//! ```md
//! unixdate: 1618531200
//! title: Hello, world!
//! tags: [greet]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Everything before the first `---` is YAML; everything after it is Markdown
//! and is passed through verbatim. Unlike front matter in many generators there
//! is no opening fence.

use serde::Deserialize;
use serde_yaml::Value;
use std::fmt;
use std::ops::Range;

/// The marker separating the metadata block from the content block.
pub const DELIMITER: &str = "---";

/// The metadata key holding a post's creation date.
pub const UNIXDATE: &str = "unixdate";

/// The decoded metadata block of a post.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frontmatter {
    /// The post's creation date exactly as written, e.g. `1618531200`. `None`
    /// when the key is missing or blank (see [`is_blank`]), which means the
    /// post hasn't been stamped yet. Validating the text is left to
    /// [`crate::date::parse_unixdate`].
    pub unixdate: Option<String>,

    pub title: String,

    /// Tags in authored order. Duplicates are kept here; the tag index
    /// decides what to do with them.
    pub tags: Vec<String>,
}

// The shape serde sees. `unixdate` stays a raw YAML value so a number is
// taken from its source text rather than from YAML's reading of it (which
// accepts `0x64`, `1e2` and `100.0`).
#[derive(Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    unixdate: Option<Value>,

    #[serde(default)]
    title: String,

    #[serde(default)]
    tags: Vec<String>,
}

/// Splits `input` on the first [`DELIMITER`] into the metadata block and the
/// content block.
pub fn split(input: &str) -> Result<(&str, &str)> {
    match input.find(DELIMITER) {
        None => Err(Error::MissingDelimiter),
        Some(i) => Ok((&input[..i], &input[i + DELIMITER.len()..])),
    }
}

/// Decodes a metadata block. A blank block decodes to the default
/// [`Frontmatter`].
pub fn decode(metadata: &str) -> Result<Frontmatter> {
    if metadata.trim().is_empty() {
        return Ok(Frontmatter::default());
    }
    let raw: RawFrontmatter = serde_yaml::from_str(metadata)?;
    let unixdate = match raw.unixdate {
        None => None,
        Some(value) if is_blank_value(&value) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(match find_unixdate(metadata) {
            Some((_, text)) => strip_comment(text).to_owned(),
            None => scalar_text(&other),
        }),
    };
    Ok(Frontmatter {
        unixdate,
        title: raw.title,
        tags: raw.tags,
    })
}

/// Splits `input` and decodes its metadata block, returning the frontmatter
/// and the untouched content block.
pub fn parse(input: &str) -> Result<(Frontmatter, &str)> {
    let (metadata, content) = split(input)?;
    Ok((decode(metadata)?, content))
}

/// Finds the first top-level `unixdate:` line in a metadata block. Returns the
/// byte range of the line (without its line ending) and the text after the
/// colon.
pub fn find_unixdate(metadata: &str) -> Option<(Range<usize>, &str)> {
    let mut offset = 0;
    for raw in metadata.split_inclusive('\n') {
        let line = raw.trim_end();
        if let Some(value) = line
            .strip_prefix(UNIXDATE)
            .and_then(|rest| rest.strip_prefix(':'))
        {
            return Some((offset..offset + line.len(), value));
        }
        offset += raw.len();
    }
    None
}

/// Reports whether the text after `unixdate:` leaves the post undated: nothing
/// at all, a comment, YAML null (`~`, `null`) or an empty string (`""`,
/// `''`). [`decode`] reads exactly these as `None`.
pub fn is_blank(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return true;
    }
    serde_yaml::from_str::<Value>(text).map_or(false, |value| is_blank_value(&value))
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

fn strip_comment(text: &str) -> &str {
    match text.find(" #") {
        Some(i) => text[..i].trim(),
        None => text.trim(),
    }
}

// Only reached for flow-style blocks like `{unixdate: 100}`, where there's no
// line to read the source text from.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

/// Represents the result of a frontmatter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error splitting or decoding a post's metadata block.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file has no `---` delimiter.
    MissingDelimiter,

    /// Returned when the metadata block isn't valid YAML or has the wrong
    /// shape.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingDelimiter => {
                write!(f, "Malformed post: missing `{}` delimiter", DELIMITER)
            }
            Error::DeserializeYaml(err) => write!(f, "Decoding post metadata: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingDelimiter => None,
            Error::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
