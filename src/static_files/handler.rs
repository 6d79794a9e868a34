use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::http::mime::content_type_for;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::static_files::listing;
use crate::static_files::resolver::{self, Rejection};

/// Name of the file served in place of a directory listing.
pub const INDEX_FILE: &str = "index.html";

/// Where a request path leads once resolved and looked up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    File(PathBuf),
    Directory(PathBuf),
    Rejected(Rejection),
}

/// The response for one request plus, when something went wrong on our
/// side, a description of the failure for the error log.
#[derive(Debug)]
pub struct Served {
    pub response: Response,
    pub error: Option<String>,
}

impl Served {
    /// A response with nothing to log, whatever its status.
    fn plain(response: Response) -> Self {
        Self {
            response,
            error: None,
        }
    }

    fn failed(response: Response, error: String) -> Self {
        Self {
            response,
            error: Some(error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }
}

/// Serves files below a document root.
#[derive(Debug, Clone)]
pub struct StaticSite {
    root: PathBuf,
}

impl StaticSite {
    /// `document_root` may be relative; it is made absolute once here.
    pub fn new(document_root: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            root: resolver::absolute_root(document_root.as_ref())?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `decoded_path` and checks what exists there.
    ///
    /// A missing entry surfaces as an `ErrorKind::NotFound` error. Symlinks
    /// are followed, but the real path must stay under the real root.
    pub async fn locate(&self, decoded_path: &str) -> std::io::Result<ResolvedTarget> {
        let path = match resolver::resolve(&self.root, decoded_path) {
            Ok(path) => path,
            Err(rejection) => return Ok(ResolvedTarget::Rejected(rejection)),
        };

        let metadata = tokio::fs::metadata(&path).await?;

        let real_root = tokio::fs::canonicalize(&self.root).await?;
        let real_path = tokio::fs::canonicalize(&path).await?;
        if !resolver::is_within(&real_root, &real_path) {
            return Ok(ResolvedTarget::Rejected(Rejection::SymlinkEscape));
        }

        if metadata.is_dir() {
            Ok(ResolvedTarget::Directory(path))
        } else {
            Ok(ResolvedTarget::File(path))
        }
    }

    /// Produces the response for `request`. Never fails: every problem maps
    /// to an error status.
    pub async fn serve(&self, request: &Request) -> Served {
        let Some(decoded) = request.decoded_path() else {
            return Served::plain(Response::bad_request());
        };

        let target = match self.locate(&decoded).await {
            Ok(target) => target,
            Err(e) if is_not_found(&e) => return Served::plain(Response::not_found()),
            Err(e) => {
                return Served::failed(
                    Response::internal_error(),
                    format!("Error stating {}: {}", decoded, e),
                );
            }
        };

        match target {
            ResolvedTarget::Rejected(reason) => {
                tracing::warn!(
                    path = %request.path,
                    reason = %reason,
                    "Rejected path outside document root"
                );
                Served::plain(Response::forbidden())
            }
            ResolvedTarget::Directory(dir) => self.serve_directory(request, &dir).await,
            ResolvedTarget::File(file) => self.serve_file(request, &file).await,
        }
    }

    async fn serve_directory(&self, request: &Request, dir: &Path) -> Served {
        let index = dir.join(INDEX_FILE);

        match tokio::fs::metadata(&index).await {
            Ok(meta) if meta.is_file() => return self.serve_file(request, &index).await,
            Ok(_) => {}
            Err(e) if is_not_found(&e) => {}
            Err(e) => {
                return Served::failed(
                    Response::internal_error(),
                    format!("Error stating {}: {}", index.display(), e),
                );
            }
        }

        match listing::read_entries(dir).await {
            Ok(entries) => {
                let html = listing::render(request.path_only(), &entries);
                Served::plain(for_method(request, Response::ok("text/html", html.into_bytes())))
            }
            Err(e) => Served::failed(
                Response::internal_error(),
                format!("Error reading directory {}: {}", dir.display(), e),
            ),
        }
    }

    async fn serve_file(&self, request: &Request, file: &Path) -> Served {
        if !request.method.is_read() {
            return Served::plain(Response::method_not_allowed());
        }

        let data = match tokio::fs::read(file).await {
            Ok(data) => data,
            Err(e) => {
                return Served::failed(
                    Response::internal_error(),
                    format!("Error reading file {}: {}", file.display(), e),
                );
            }
        };

        Served::plain(for_method(request, Response::ok(&content_type_for(file), data)))
    }
}

/// HEAD gets the same headers as GET and no body.
fn for_method(request: &Request, response: Response) -> Response {
    if request.method == Method::Head {
        response.strip_body()
    } else {
        response
    }
}

fn is_not_found(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}
