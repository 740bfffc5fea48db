//! Resolves a post's creation date. A post carrying a `unixdate` in its
//! metadata block uses that; a post without one is dated with the build's
//! start time and the date is written back into the source file so that every
//! later build resolves the same date.

use crate::frontmatter::{self, DELIMITER};
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// The metadata key holding the creation date.
pub const KEY: &str = frontmatter::UNIXDATE;

/// The long-form date format for [`ResolvedDate::date_string`], e.g.
/// `January 2, 2006`.
pub const DATE_FORMAT: &str = "%B %-d, %Y";

/// The outcome of resolving a post's date.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedDate {
    pub date: DateTime<Utc>,

    /// `date` rendered with [`DATE_FORMAT`].
    pub date_string: String,

    /// The post source as it is on disk after resolution. This differs from
    /// the input only when the post was stamped.
    pub source: String,

    /// Whether the source file was rewritten to carry the date.
    pub stamped: bool,
}

/// Resolves post dates relative to a fixed "now", the start time of the build.
#[derive(Clone, Copy, Debug)]
pub struct DateResolver {
    now: DateTime<Utc>,
}

impl DateResolver {
    /// Constructs a resolver which dates unstamped posts at `now`. Sub-second
    /// precision is dropped so the stamped value reads back identically.
    pub fn new(now: DateTime<Utc>) -> DateResolver {
        DateResolver {
            now: now.trunc_subsecs(0),
        }
    }

    /// The time assigned to unstamped posts.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Resolves the date for the post at `path` whose current contents are
    /// `source` and whose decoded `unixdate` is `unixdate`. When `unixdate` is
    /// `None` the post is stamped and `path` is rewritten atomically.
    pub fn resolve(
        &self,
        path: &Path,
        source: String,
        unixdate: Option<&str>,
    ) -> Result<ResolvedDate> {
        let (date, source, stamped) = match unixdate {
            Some(value) => (parse_unixdate(value)?, source, false),
            None => {
                let stamped = stamp(&source, self.now.timestamp());
                crate::util::write_atomic(path, stamped.as_bytes()).map_err(|err| {
                    Error::PersistDate {
                        path: path.to_owned(),
                        err,
                    }
                })?;
                tracing::info!(
                    path = %path.display(),
                    unixdate = self.now.timestamp(),
                    "stamped post with creation date"
                );
                (self.now, stamped, true)
            }
        };

        Ok(ResolvedDate {
            date_string: format_date(&date),
            date,
            source,
            stamped,
        })
    }
}

/// Parses a base-10 count of seconds since the epoch: ASCII digits with an
/// optional leading sign and nothing else.
pub fn parse_unixdate(value: &str) -> Result<DateTime<Utc>> {
    let invalid = || Error::InvalidTimestamp(value.to_owned());
    let digits = value.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let seconds: i64 = value.parse().map_err(|_| invalid())?;
    Utc.timestamp_opt(seconds, 0).single().ok_or_else(invalid)
}

/// Renders `date` with [`DATE_FORMAT`].
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Returns `source` with a `unixdate: {seconds}` line in its metadata block.
/// The line is prepended, unless the metadata block already has a top-level
/// `unixdate:` line that [`frontmatter::is_blank`] accepts, in which case that
/// line is filled in instead (prepending would leave a duplicate key).
pub fn stamp(source: &str, seconds: i64) -> String {
    let line = format!("{}: {}", KEY, seconds);
    let metadata_end = source.find(DELIMITER).unwrap_or_else(|| source.len());

    match frontmatter::find_unixdate(&source[..metadata_end]) {
        Some((range, value)) if frontmatter::is_blank(value) => {
            format!("{}{}{}", &source[..range.start], line, &source[range.end..])
        }
        _ => format!("{}\n{}", line, source),
    }
}

/// Represents the result of a date operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error resolving a post's date.
#[derive(Debug)]
pub enum Error {
    /// Returned when a `unixdate` isn't an integer number of seconds or is
    /// out of range.
    InvalidTimestamp(String),

    /// Returned when the stamped post can't be written back to disk.
    PersistDate { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidTimestamp(value) => {
                write!(f, "Invalid {} `{}`: wanted integer seconds", KEY, value)
            }
            Error::PersistDate { path, err } => {
                write!(f, "Writing {} to '{}': {}", KEY, path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidTimestamp(_) => None,
            Error::PersistDate { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frontmatter;

    const NOW: i64 = 1_618_531_200; // 2021-04-16T00:00:00Z

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    fn resolver() -> DateResolver {
        DateResolver::new(at(NOW))
    }

    #[test]
    fn test_parse_unixdate() {
        assert_eq!(at(NOW), parse_unixdate("1618531200").unwrap());
        assert_eq!(at(0), parse_unixdate("0").unwrap());
    }

    #[test]
    fn test_parse_unixdate_invalid() {
        for value in &[
            "yesterday",
            "1.5",
            "",
            "  ",
            " 100",
            "-",
            "100.0",
            "0x64",
            "1e2",
            "16185e3",
            "99999999999999999999",
        ] {
            match parse_unixdate(value) {
                Err(Error::InvalidTimestamp(v)) => assert_eq!(*value, v),
                other => panic!("wanted InvalidTimestamp for {:?}; found {:?}", value, other),
            }
        }
    }

    #[test]
    fn test_format_date() {
        assert_eq!("April 16, 2021", format_date(&at(NOW)));
        assert_eq!("January 2, 2006", format_date(&at(1_136_214_245)));
    }

    #[test]
    fn test_new_drops_subseconds() {
        let resolver = DateResolver::new(Utc.timestamp_opt(NOW, 999_000_000).unwrap());
        assert_eq!(at(NOW), resolver.now());
    }

    #[test]
    fn test_stamp_prepends() {
        assert_eq!(
            "unixdate: 1618531200\ntitle: a\n---\nbody",
            stamp("title: a\n---\nbody", NOW)
        );
    }

    #[test]
    fn test_stamp_fills_blank_key() {
        assert_eq!(
            "title: a\nunixdate: 1618531200\n---\nbody",
            stamp("title: a\nunixdate: \"\"\n---\nbody", NOW)
        );
        assert_eq!(
            "unixdate: 1618531200\r\ntitle: a\n---\n",
            stamp("unixdate:\r\ntitle: a\n---\n", NOW)
        );
    }

    #[test]
    fn test_stamp_round_trips_every_blank_form() {
        for blank in &["", " \"\"", " ''", " ~", " null", " # later"] {
            let source = format!("title: a\nunixdate:{}\n---\nbody", blank);
            assert_eq!(None, frontmatter::parse(&source).unwrap().0.unixdate);

            let stamped = stamp(&source, NOW);
            assert_eq!("title: a\nunixdate: 1618531200\n---\nbody", stamped);
            let (meta, _) = frontmatter::parse(&stamped).unwrap();
            assert_eq!(Some(NOW.to_string()), meta.unixdate);
        }
    }

    #[test]
    fn test_whitespace_unixdate_is_invalid_not_restamped() {
        let source = "title: a\nunixdate: \"  \"\n---\nbody";
        let (meta, _) = frontmatter::parse(source).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        match resolver().resolve(&path, source.to_owned(), meta.unixdate.as_deref()) {
            Err(Error::InvalidTimestamp(v)) => assert_eq!("  ", v),
            other => panic!("wanted InvalidTimestamp; found {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_stamp_ignores_content_block() {
        assert_eq!(
            "unixdate: 1618531200\ntitle: a\n---\nunixdate:\n",
            stamp("title: a\n---\nunixdate:\n", NOW)
        );
    }

    #[test]
    fn test_stamped_source_decodes() {
        let stamped = stamp("title: a\nunixdate: ''\ntags: [x]\n---\nbody", NOW);
        let (meta, content) = frontmatter::parse(&stamped).unwrap();
        assert_eq!(Some(NOW.to_string()), meta.unixdate);
        assert_eq!("\nbody", content);
    }

    #[test]
    fn test_resolve_existing_unixdate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        let source = String::from("unixdate: 100\n---\n");
        let resolved = resolver().resolve(&path, source.clone(), Some("100")).unwrap();
        assert_eq!(at(100), resolved.date);
        assert_eq!("January 1, 1970", resolved.date_string);
        assert_eq!(source, resolved.source);
        assert!(!resolved.stamped);

        // nothing was written
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_stamps_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        let original = "title: a\n---\nHi there";
        std::fs::write(&path, original).unwrap();

        let first = resolver()
            .resolve(&path, original.to_owned(), None)
            .unwrap();
        assert!(first.stamped);
        assert_eq!(at(NOW), first.date);
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first.source, on_disk);
        assert_eq!(format!("unixdate: {}\n{}", NOW, original), on_disk);

        // a later build must see the same date and leave the file alone
        let later = DateResolver::new(at(NOW + 3600));
        let (meta, _) = frontmatter::parse(&on_disk).unwrap();
        let second = later
            .resolve(&path, on_disk.clone(), meta.unixdate.as_deref())
            .unwrap();
        assert!(!second.stamped);
        assert_eq!(first.date, second.date);
        assert_eq!(on_disk, std::fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn test_resolve_persist_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("a.md");
        match resolver().resolve(&path, String::from("---\n"), None) {
            Err(Error::PersistDate { path: p, .. }) => assert_eq!(path, p),
            other => panic!("wanted PersistDate; found {:?}", other),
        }
    }
}
