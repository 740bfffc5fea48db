//! Defines the [`Parser`] and [`Error`] types and the logic for building
//! [`Post`]s from the source files in the posts directory.

use crate::date::{self, DateResolver};
use crate::frontmatter;
use crate::markdown;
use crate::post::{build_url, Post, PostMeta, MARKDOWN_EXTENSION};
use std::fmt;
use std::path::{Path, PathBuf};

/// Builds [`Post`] objects from source files.
pub struct Parser {
    /// Dates posts which don't have a `unixdate` yet.
    resolver: DateResolver,
}

impl Parser {
    /// Constructs a new parser which dates unstamped posts with `resolver`.
    pub fn new(resolver: DateResolver) -> Parser {
        Parser { resolver }
    }

    /// Lists the post source files in `source_directory`, sorted by file name.
    /// Only regular files ending in `.md` are posts; everything else is
    /// skipped.
    pub fn source_files(&self, source_directory: &Path) -> Result<Vec<PathBuf>> {
        let list_error = |err: std::io::Error| Error::ListDirectory {
            path: source_directory.to_owned(),
            err,
        };

        let mut files = Vec::new();
        for result in std::fs::read_dir(source_directory).map_err(list_error)? {
            let entry = result.map_err(list_error)?;
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            if entry.file_type().map_err(list_error)?.is_file()
                && !file_name.starts_with('.')
                && file_name.ends_with(MARKDOWN_EXTENSION)
            {
                files.push(entry.path());
            } else {
                tracing::debug!(path = %entry.path().display(), "skipping non-post entry");
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Builds a single [`Post`] from the file at `path`: splits off and
    /// decodes the metadata block, resolves the date (stamping the file if
    /// necessary), and renders the content.
    pub fn parse_post(&self, path: &Path) -> Result<Post> {
        match self._parse_post(path) {
            Ok(post) => Ok(post),
            Err(e) => Err(Error::Annotated(
                format!("parsing post '{}'", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(&self, path: &Path) -> Result<Post> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?
            .to_owned();

        let source = std::fs::read_to_string(path).map_err(|err| Error::ReadPost {
            path: path.to_owned(),
            err,
        })?;

        let (frontmatter, content) = frontmatter::parse(&source)?;
        let resolved =
            self.resolver
                .resolve(path, source.clone(), frontmatter.unixdate.as_deref())?;
        let rendered = markdown::render(content);

        Ok(Post {
            source: resolved.source,
            output: rendered.output,
            preview_output: rendered.preview_output,
            data: PostMeta {
                unixdate: frontmatter.unixdate,
                date: resolved.date,
                date_string: resolved.date_string,
                title: frontmatter.title,
                tags: frontmatter.tags,
                url: build_url(&name),
            },
            name,
        })
    }

    /// Builds every post in `source_directory` in file name order. `on_post`
    /// is called with each post as soon as it's built, before the next file
    /// is read; the first error from either side aborts the walk. Returns the
    /// posts in file name order (not date order).
    pub fn parse_posts<F, E>(
        &self,
        source_directory: &Path,
        mut on_post: F,
    ) -> std::result::Result<Vec<Post>, E>
    where
        F: FnMut(&Post) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        let files = self.source_files(source_directory)?;
        let mut posts = Vec::with_capacity(files.len());
        for path in files {
            let post = self.parse_post(&path)?;
            tracing::debug!(post = %post.name, date = %post.data.date, "parsed post");
            on_post(&post)?;
            posts.push(post);
        }
        Ok(posts)
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when the posts directory can't be listed.
    ListDirectory { path: PathBuf, err: std::io::Error },

    /// Returned when a post source file can't be read (including when it
    /// isn't valid UTF-8).
    ReadPost { path: PathBuf, err: std::io::Error },

    /// Returned when a post's file name isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned when the metadata block is missing or can't be decoded.
    Frontmatter(frontmatter::Error),

    /// Returned when the date can't be parsed or persisted.
    Date(date::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl Error {
    /// Strips any [`Error::Annotated`] layers and returns the underlying
    /// error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Annotated(_, err) => err.root(),
            _ => self,
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ListDirectory { path, err } => {
                write!(f, "Listing posts directory '{}': {}", path.display(), err)
            }
            Error::ReadPost { path, err } => {
                write!(f, "Reading post '{}': {}", path.display(), err)
            }
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
            Error::Frontmatter(err) => err.fmt(f),
            Error::Date(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ListDirectory { path: _, err } => Some(err),
            Error::ReadPost { path: _, err } => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Frontmatter(err) => Some(err),
            Error::Date(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<frontmatter::Error> for Error {
    /// Converts a [`frontmatter::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for splitting and decoding.
    fn from(err: frontmatter::Error) -> Error {
        Error::Frontmatter(err)
    }
}

impl From<date::Error> for Error {
    /// Converts a [`date::Error`] into an [`Error`]. It allows us to use the
    /// `?` operator for date resolution.
    fn from(err: date::Error) -> Error {
        Error::Date(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;

    const NOW: i64 = 1_618_531_200;

    fn parser() -> Parser {
        Parser::new(DateResolver::new(Utc.timestamp_opt(NOW, 0).unwrap()))
    }

    #[test]
    fn test_parse_post() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.md");
        fs::write(&path, "unixdate: 100\ntitle: Hello\ntags: [go, blog]\n---\nHi *there*").unwrap();

        let post = parser().parse_post(&path)?;
        assert_eq!("hello.md", post.name);
        assert_eq!("hello.html", post.data.url);
        assert_eq!("Hello", post.data.title);
        assert_eq!(vec!["go", "blog"], post.data.tags);
        assert_eq!(Some(String::from("100")), post.data.unixdate);
        assert_eq!(Utc.timestamp_opt(100, 0).unwrap(), post.data.date);
        assert_eq!("January 1, 1970", post.data.date_string);
        assert!(post.output.contains("<p>Hi <em>there</em></p>"));
        assert_eq!(post.output, post.preview_output);
        Ok(())
    }

    #[test]
    fn test_parse_post_stamps_missing_date() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "title: Hello\n---\nHi").unwrap();

        let post = parser().parse_post(&path)?;
        assert_eq!(None, post.data.unixdate);
        assert_eq!(Utc.timestamp_opt(NOW, 0).unwrap(), post.data.date);
        assert_eq!(fs::read_to_string(&path).unwrap(), post.source);
        assert!(post.source.starts_with("unixdate: 1618531200\n"));
        Ok(())
    }

    #[test]
    fn test_parse_post_missing_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "title: Hello\nHi").unwrap();

        let err = parser().parse_post(&path).unwrap_err();
        assert!(matches!(
            err.root(),
            Error::Frontmatter(frontmatter::Error::MissingDelimiter)
        ));
        assert!(err.to_string().contains("a.md"));

        // a malformed post is never stamped
        assert_eq!("title: Hello\nHi", fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn test_parse_post_invalid_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "unixdate: soon\n---\n").unwrap();

        let err = parser().parse_post(&path).unwrap_err();
        assert!(matches!(
            err.root(),
            Error::Date(date::Error::InvalidTimestamp(v)) if v == "soon"
        ));
    }

    #[test]
    fn test_parse_post_float_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "unixdate: 100.0\n---\n").unwrap();

        let err = parser().parse_post(&path).unwrap_err();
        assert!(matches!(
            err.root(),
            Error::Date(date::Error::InvalidTimestamp(v)) if v == "100.0"
        ));
    }

    #[test]
    fn test_source_files_sorted_and_filtered() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        for name in &["c.md", "a.md", "b.md", "notes.txt", ".hidden.md"] {
            fs::write(dir.path().join(name), "---\n").unwrap();
        }
        fs::create_dir(dir.path().join("drafts.md")).unwrap();

        let files = parser().source_files(dir.path())?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(vec!["a.md", "b.md", "c.md"], names);
        Ok(())
    }

    #[test]
    fn test_source_files_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parser().source_files(&dir.path().join("nope")),
            Err(Error::ListDirectory { .. })
        ));
    }

    #[test]
    fn test_parse_posts_calls_back_in_order() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "unixdate: 1\n---\n").unwrap();
        fs::write(dir.path().join("a.md"), "unixdate: 2\n---\n").unwrap();

        let mut seen = Vec::new();
        let posts = parser().parse_posts(dir.path(), |post| -> Result<()> {
            seen.push(post.name.clone());
            Ok(())
        })?;
        assert_eq!(vec!["a.md", "b.md"], seen);
        assert_eq!(
            vec!["a.md", "b.md"],
            posts.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
        );
        Ok(())
    }

    #[test]
    fn test_parse_posts_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "unixdate: 1\n---\n").unwrap();
        fs::write(dir.path().join("b.md"), "no delimiter").unwrap();
        fs::write(dir.path().join("c.md"), "title: c\n---\n").unwrap();

        let mut seen = Vec::new();
        let result = parser().parse_posts(dir.path(), |post| -> Result<()> {
            seen.push(post.name.clone());
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(vec!["a.md"], seen);

        // the build aborted before reaching `c.md`, so it wasn't stamped
        assert_eq!(
            "title: c\n---\n",
            fs::read_to_string(dir.path().join("c.md")).unwrap()
        );
    }
}
