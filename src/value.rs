//! Conversions from the crate's types into template values. Keys follow the
//! capitalised field names templates are written against (`.Data.Title`,
//! `.PreviewOutput`, ...).
//!
//! A post's `Tags` are objects with `Name` and `URL`, where `URL` is the tag
//! page's link relative to the tags directory:
//!
//! ```html
//! {{range .Data.Tags}}<a href="/tags/{{.URL}}">{{.Name}}</a>{{end}}
//! ```

use crate::config::BlogMeta;
use crate::post::{Post, PostMeta};
use crate::tag;
use gtmpl::Value;
use std::collections::HashMap;

fn string(s: &str) -> Value {
    Value::String(s.to_owned())
}

fn object<I: IntoIterator<Item = (&'static str, Value)>>(fields: I) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect::<HashMap<String, Value>>(),
    )
}

impl From<&BlogMeta> for Value {
    fn from(blog: &BlogMeta) -> Value {
        object(vec![
            ("Name", string(&blog.name)),
            ("Tagline", string(&blog.tagline)),
            ("Author", string(&blog.author)),
        ])
    }
}

impl From<&PostMeta> for Value {
    fn from(meta: &PostMeta) -> Value {
        object(vec![
            (
                "UnixDate",
                match &meta.unixdate {
                    Some(unixdate) => string(unixdate),
                    None => Value::String(meta.date.timestamp().to_string()),
                },
            ),
            ("Date", Value::String(meta.date.to_rfc3339())),
            ("DateString", string(&meta.date_string)),
            ("Title", string(&meta.title)),
            (
                "Tags",
                Value::Array(meta.tags.iter().map(|t| tag_link(t)).collect()),
            ),
            ("URL", string(&meta.url)),
        ])
    }
}

fn tag_link(name: &str) -> Value {
    object(vec![("Name", string(name)), ("URL", Value::String(tag::url(name)))])
}

impl From<&Post> for Value {
    fn from(post: &Post) -> Value {
        object(vec![
            ("Name", string(&post.name)),
            ("Source", string(&post.source)),
            ("Output", string(&post.output)),
            ("PreviewOutput", string(&post.preview_output)),
            ("Data", Value::from(&post.data)),
        ])
    }
}

/// Converts a list of posts into a [`Value::Array`].
pub fn posts<'a, I: IntoIterator<Item = &'a Post>>(posts: I) -> Value {
    Value::Array(posts.into_iter().map(Value::from).collect())
}
