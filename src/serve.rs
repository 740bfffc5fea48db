//! Serves the rendered output directory as static files over HTTP. There is no
//! watching or rebuilding; run `crisp build` and refresh.

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// The port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 3000;

/// Serves the files under `root` on `addr` until the process is stopped.
pub fn serve(root: &Path, addr: SocketAddr) -> Result<()> {
    let server = Server::http(addr).map_err(|e| Error::Bind {
        addr,
        err: e.to_string(),
    })?;
    tracing::info!(root = %root.display(), "serving on http://{}", addr);

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            tracing::warn!("request error: {}", e);
        }
    }
    Ok(())
}

/// The outcome of mapping a request URL onto the output directory.
#[derive(Debug, PartialEq)]
pub enum Resolved {
    File(PathBuf),
    NotFound,
    Forbidden,
}

/// Maps a request URL onto a file under `root`. The query string is ignored,
/// percent-escapes are decoded, directories resolve to their `index.html`,
/// and any `..` component is refused.
pub fn resolve(root: &Path, url: &str) -> Resolved {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or("");
    let decoded = match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => return Resolved::NotFound,
    };
    let relative = Path::new(decoded.trim_start_matches('/'));

    let mut local = root.to_owned();
    for component in relative.components() {
        match component {
            Component::Normal(part) => local.push(part),
            Component::CurDir => {}
            _ => return Resolved::Forbidden,
        }
    }

    if local.is_dir() {
        local.push("index.html");
    }
    if local.is_file() {
        Resolved::File(local)
    } else {
        Resolved::NotFound
    }
}

fn handle_request(request: Request, root: &Path) -> std::io::Result<()> {
    tracing::debug!(method = %request.method(), url = %request.url(), "request");
    match resolve(root, request.url()) {
        Resolved::File(path) => {
            let content = fs::read(&path)?;
            let response = Response::from_data(content).with_header(header(content_type(&path)));
            request.respond(response)
        }
        Resolved::NotFound => request.respond(status(404, "404 Not Found")),
        Resolved::Forbidden => request.respond(status(403, "403 Forbidden")),
    }
}

fn header(content_type: &str) -> Header {
    // the name and value are ASCII, so this can't fail
    Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap()
}

fn status(code: u16, body: &'static str) -> Response<Cursor<&'static [u8]>> {
    Response::new(
        StatusCode(code),
        vec![header("text/plain; charset=utf-8")],
        Cursor::new(body.as_bytes()),
        Some(body.len()),
        None,
    )
}

/// Guesses a MIME type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// The result of serving.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error starting the server.
#[derive(Debug)]
pub enum Error {
    /// Returned when the listening socket can't be bound.
    Bind { addr: SocketAddr, err: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bind { addr, err } => write!(f, "Listening on {}: {}", addr, err),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("posts")).unwrap();
        fs::write(dir.path().join("index.html"), "index").unwrap();
        fs::write(dir.path().join("posts/my post.html"), "post").unwrap();
        dir
    }

    #[test]
    fn test_resolve_root_to_index() {
        let dir = site();
        assert_eq!(Resolved::File(dir.path().join("index.html")), resolve(dir.path(), "/"));
        assert_eq!(
            Resolved::File(dir.path().join("index.html")),
            resolve(dir.path(), "/?t=1")
        );
    }

    #[test]
    fn test_resolve_percent_encoded() {
        let dir = site();
        assert_eq!(
            Resolved::File(dir.path().join("posts/my post.html")),
            resolve(dir.path(), "/posts/my%20post.html")
        );
    }

    #[test]
    fn test_resolve_missing() {
        let dir = site();
        assert_eq!(Resolved::NotFound, resolve(dir.path(), "/posts/nope.html"));
        // a directory without an index
        assert_eq!(Resolved::NotFound, resolve(dir.path(), "/posts/"));
    }

    #[test]
    fn test_resolve_refuses_traversal() {
        let dir = site();
        assert_eq!(Resolved::Forbidden, resolve(dir.path(), "/../etc/passwd"));
        assert_eq!(Resolved::Forbidden, resolve(dir.path(), "/posts/%2e%2e/%2e%2e/x"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!("text/html; charset=utf-8", content_type(Path::new("a.html")));
        assert_eq!("image/png", content_type(Path::new("a.png")));
        assert_eq!("application/octet-stream", content_type(Path::new("a")));
    }
}
