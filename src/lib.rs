//! The library code for the `crisp` static blog generator. A build is a single
//! sequential pass which can be broken down into the following steps:
//!
//! 1. Loading the site-wide [`config::BlogMeta`] ([`crate::config`])
//! 2. Parsing each post source file into a [`post::Post`] ([`crate::parser`])
//!    and writing its page immediately ([`crate::write`])
//! 3. Writing the index page, a date-sorted view of every post
//! 4. Grouping posts by tag ([`crate::tag`]) and writing one page per tag
//!
//! Parsing a post is itself composed of three sub-steps: splitting the source
//! into its metadata block and its Markdown content ([`crate::frontmatter`]),
//! resolving the post's creation date ([`crate::date`]), and rendering the
//! content into sanitized HTML ([`crate::markdown`]).
//!
//! The date step is the only one that writes to the source tree: a post with
//! no `unixdate` gets the build's start time stamped into its metadata block so
//! that every later build sees the same date.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod date;
pub mod frontmatter;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod serve;
pub mod tag;
pub mod write;

mod util;
mod value;
