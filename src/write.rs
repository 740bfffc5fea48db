//! Assembles index, post and tag pages, renders them through the templates and
//! writes them to disk.

use crate::config::{BlogMeta, Config};
use crate::post::Post;
use crate::tag::TagBucket;
use crate::value;
use gtmpl::{Template, Value};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// The file holding the page skeleton shared by every page.
pub const LAYOUT_TEMPLATE: &str = "layout.html";
pub const INDEX_TEMPLATE: &str = "index.html";
pub const POST_TEMPLATE: &str = "post.html";
pub const TAG_TEMPLATE: &str = "tag.html";

/// The three template sets. Each is [`LAYOUT_TEMPLATE`] followed by one
/// content template, parsed together so the layout can invoke
/// `{{template "content" .}}`.
pub struct Templates {
    pub index: Template,
    pub post: Template,
    pub tag: Template,
}

impl Templates {
    /// Loads and parses the template sets from `dir`.
    pub fn load(dir: &Path) -> Result<Templates> {
        let layout = dir.join(LAYOUT_TEMPLATE);
        let set = |content: &str| parse_template(vec![layout.clone(), dir.join(content)]);
        Ok(Templates {
            index: set(INDEX_TEMPLATE)?,
            post: set(POST_TEMPLATE)?,
            tag: set(TAG_TEMPLATE)?,
        })
    }
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: Vec<P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(|e| Error::LoadTemplate {
                path: template_file.to_owned(),
                err: e,
            })?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|e| Error::ParseTemplate(e.to_string()))?;
    Ok(template)
}

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    templates: &'a Templates,

    /// Site identity, handed to every page as `.Data`.
    blog: &'a BlogMeta,

    /// `index.html` is written here.
    root_output_directory: &'a Path,

    /// Post pages are written here as `{url}`.
    posts_output_directory: PathBuf,

    /// Tag pages are written here as [`TagBucket::file_name`].
    tags_output_directory: PathBuf,

    /// Every file written so far in this build.
    written: HashSet<PathBuf>,

    /// Directories already created in this build.
    seen_dirs: HashSet<PathBuf>,
}

impl<'a> Writer<'a> {
    /// Constructs a writer which renders with `templates` into the output
    /// directories named by `config`.
    pub fn new(templates: &'a Templates, config: &'a Config) -> Writer<'a> {
        Writer {
            templates,
            blog: &config.blog,
            root_output_directory: &config.root_output_directory,
            posts_output_directory: config.posts_output_directory(),
            tags_output_directory: config.tags_output_directory(),
            written: HashSet::new(),
            seen_dirs: HashSet::new(),
        }
    }

    /// The number of pages written so far.
    pub fn pages_written(&self) -> usize {
        self.written.len()
    }

    /// Writes the page for a single post to `posts/{url}`.
    pub fn write_post(&mut self, post: &Post) -> Result<()> {
        let page = Page {
            posts: Vec::new(),
            post: Some(post),
            blog: self.blog,
            title: format!("{} | {}", post.data.title, self.blog.name),
            tag: None,
        };
        let path = self.posts_output_directory.join(&post.data.url);
        let templates = self.templates;
        self.write_page(&templates.post, &page, path)
    }

    /// Writes `index.html`, listing every post, most recent first.
    pub fn write_index(&mut self, posts: &[Post]) -> Result<()> {
        let page = Page {
            posts: sorted(posts),
            post: None,
            blog: self.blog,
            title: self.blog.name.clone(),
            tag: None,
        };
        let path = self.root_output_directory.join("index.html");
        let templates = self.templates;
        self.write_page(&templates.index, &page, path)
    }

    /// Writes one `tags/{file_name}` page per bucket, each listing the
    /// bucket's posts most recent first.
    pub fn write_tags(&mut self, buckets: &[TagBucket]) -> Result<()> {
        for bucket in buckets {
            let page = Page {
                posts: sorted(bucket.posts.iter().copied()),
                post: None,
                blog: self.blog,
                title: format!("{} | {}", bucket.name, self.blog.name),
                tag: Some(bucket.name.as_str()),
            };
            let path = self.tags_output_directory.join(&bucket.file_name);
            let templates = self.templates;
            self.write_page(&templates.tag, &page, path)?;
        }
        Ok(())
    }

    /// Takes a single [`Page`], templates it, and writes it to `path`.
    fn write_page(&mut self, template: &Template, page: &Page, path: PathBuf) -> Result<()> {
        if self.written.contains(&path) {
            return Err(Error::OutputCollision(path));
        }

        let context = gtmpl::Context::from(page.to_value())
            .map_err(|e| Error::Render {
                path: path.clone(),
                err: e.to_string(),
            })?;
        let mut out: Vec<u8> = Vec::new();
        template
            .execute(&mut out, &context)
            .map_err(|e| Error::Render {
                path: path.clone(),
                err: e.to_string(),
            })?;

        if let Some(dir) = path.parent() {
            if self.seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir).map_err(|err| Error::WriteFile {
                    path: dir.to_owned(),
                    err,
                })?;
            }
        }
        std::fs::write(&path, &out).map_err(|err| Error::WriteFile {
            path: path.clone(),
            err,
        })?;

        tracing::debug!(path = %path.display(), "wrote page");
        self.written.insert(path);
        Ok(())
    }
}

/// Returns the posts ordered by date, most recent first. Posts with the same
/// date are ordered by file name so the result doesn't depend on input order.
pub fn sorted<'p, I: IntoIterator<Item = &'p Post>>(posts: I) -> Vec<&'p Post> {
    let mut sorted: Vec<&Post> = posts.into_iter().collect();
    sorted.sort_by(|a, b| {
        b.data
            .date
            .cmp(&a.data.date)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

/// The data handed to a template for one render. Fields not relevant to a
/// page kind are left empty.
struct Page<'a> {
    posts: Vec<&'a Post>,
    post: Option<&'a Post>,
    blog: &'a BlogMeta,
    title: String,
    tag: Option<&'a str>,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value::Object`] with fields `Posts`,
    /// `Post`, `Data`, `Title` and `Tag`.
    fn to_value(&self) -> Value {
        use std::collections::HashMap;

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("Posts".to_owned(), value::posts(self.posts.iter().copied()));
        m.insert(
            "Post".to_owned(),
            match self.post {
                Some(post) => post.into(),
                None => Value::Nil,
            },
        );
        m.insert("Data".to_owned(), self.blog.into());
        m.insert("Title".to_owned(), Value::String(self.title.clone()));
        m.insert(
            "Tag".to_owned(),
            Value::String(self.tag.unwrap_or_default().to_owned()),
        );
        Value::Object(m)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when a template file can't be read.
    LoadTemplate { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// An error during templating.
    Render { path: PathBuf, err: String },

    /// An error writing the output files.
    WriteFile { path: PathBuf, err: io::Error },

    /// Returned when two pages would be written to the same file.
    OutputCollision(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LoadTemplate { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing templates: {}", err),
            Error::Render { path, err } => {
                write!(f, "Rendering '{}': {}", path.display(), err)
            }
            Error::WriteFile { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
            Error::OutputCollision(path) => {
                write!(f, "More than one page maps to '{}'", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LoadTemplate { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Render { .. } => None,
            Error::WriteFile { path: _, err } => Some(err),
            Error::OutputCollision(_) => None,
        }
    }
}
