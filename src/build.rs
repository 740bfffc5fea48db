//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts and writing
//! their pages ([`crate::parser`], [`crate::write`]), writing the index page,
//! and indexing posts by tag ([`crate::tag`]) to write the tag pages.
//!
//! Any error aborts the build. Pages written before the error stay on disk and
//! nothing is rolled back.

use crate::config::{self, Config};
use crate::date::DateResolver;
use crate::parser::{Error as ParseError, Parser as PostParser};
use crate::tag::{index_tags, Error as TagError};
use crate::write::{Error as WriteError, Templates, Writer};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

/// Counts describing a finished build.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    pub posts: usize,

    /// The number of posts which arrived without a `unixdate` and were
    /// stamped by this build.
    pub stamped: usize,

    pub tags: usize,
    pub pages: usize,
}

/// Loads the configuration for the project at `root` and builds it. Posts
/// without a date are dated with the current time.
pub fn build_project(root: &Path, output_directory: Option<&Path>) -> Result<Summary> {
    let config = Config::from_directory(root, output_directory)?;
    build_site(&config, Utc::now())
}

/// Builds the site from a [`Config`] object. `now` is the time assigned to
/// posts which don't have a `unixdate` yet. Steps run strictly in order: each
/// post is parsed and its page written before the next post is read, then the
/// index page is written, then the tag pages.
pub fn build_site(config: &Config, now: DateTime<Utc>) -> Result<Summary> {
    let templates = Templates::load(&config.templates_directory)?;
    let mut writer = Writer::new(&templates, config);

    let post_parser = PostParser::new(DateResolver::new(now));
    let posts = post_parser.parse_posts(&config.posts_source_directory, |post| {
        writer.write_post(post).map_err(Error::from)
    })?;
    tracing::info!(posts = posts.len(), "wrote post pages");

    writer.write_index(&posts)?;

    let buckets = index_tags(&posts)?;
    writer.write_tags(&buckets)?;
    tracing::info!(tags = buckets.len(), "wrote tag pages");

    Ok(Summary {
        posts: posts.len(),
        stamped: posts.iter().filter(|p| p.data.unixdate.is_none()).count(),
        tags: buckets.len(),
        pages: writer.pages_written(),
    })
}

/// The result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading the
/// configuration, parsing posts, indexing tags, or templating and writing
/// pages.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading the configuration.
    Config(config::Error),

    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for tags which can't be written as pages.
    Tag(TagError),

    /// Returned for errors loading templates or writing pages to disk.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Tag(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Tag(err) => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<config::Error> for Error {
    /// Converts [`config::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: config::Error) -> Error {
        Error::Config(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<TagError> for Error {
    /// Converts [`TagError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: TagError) -> Error {
        Error::Tag(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
