//! Defines the [`Config`] and [`BlogMeta`] types and the logic for loading
//! them from a project directory.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The name of the site configuration file inside the project root.
pub const CONFIG_FILE: &str = "config.yml";

/// Site-wide identity. Loaded once at the start of a build and handed to every
/// page unchanged.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BlogMeta {
    /// The name of the blog. Used as the index page title and as the suffix
    /// of every other page title.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub tagline: String,

    #[serde(default)]
    pub author: String,
}

impl BlogMeta {
    /// Decodes a [`BlogMeta`] from YAML text. A blank document is treated as
    /// an empty configuration rather than an error.
    pub fn from_str(input: &str) -> std::result::Result<BlogMeta, serde_yaml::Error> {
        if input.trim().is_empty() {
            return Ok(BlogMeta::default());
        }
        serde_yaml::from_str(input)
    }
}

/// The locations of everything a build reads and writes, plus the decoded
/// [`BlogMeta`].
#[derive(Clone, Debug)]
pub struct Config {
    pub blog: BlogMeta,

    /// The directory containing the post source files.
    pub posts_source_directory: PathBuf,

    /// The directory containing `layout.html`, `index.html`, `post.html` and
    /// `tag.html`.
    pub templates_directory: PathBuf,

    /// The root output directory. `index.html` lands here, post pages in
    /// `{output}/posts/` and tag pages in `{output}/tags/`.
    pub root_output_directory: PathBuf,
}

impl Config {
    /// Loads the configuration for the project rooted at `root`. The output
    /// directory defaults to `{root}/output` unless `output_directory` is
    /// provided.
    pub fn from_directory(root: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = root.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&path).map_err(|err| Error::Read {
            path: path.clone(),
            err,
        })?;
        let blog = BlogMeta::from_str(&contents).map_err(|err| Error::Decode {
            path: path.clone(),
            err,
        })?;

        Ok(Config {
            blog,
            posts_source_directory: root.join("posts"),
            templates_directory: root.join("templates"),
            root_output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => root.join("output"),
            },
        })
    }

    /// The directory in which post pages are written.
    pub fn posts_output_directory(&self) -> PathBuf {
        self.root_output_directory.join("posts")
    }

    /// The directory in which tag pages are written.
    pub fn tags_output_directory(&self) -> PathBuf {
        self.root_output_directory.join("tags")
    }
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the configuration file can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when the configuration file isn't valid YAML or doesn't have
    /// the expected shape.
    Decode {
        path: PathBuf,
        err: serde_yaml::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "Reading config file '{}': {}", path.display(), err)
            }
            Error::Decode { path, err } => {
                write!(f, "Decoding config file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { path: _, err } => Some(err),
            Error::Decode { path: _, err } => Some(err),
        }
    }
}
