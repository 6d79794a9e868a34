//! Static content: path resolution, directory listings and the
//! file-vs-directory-vs-error decision for each request.

pub mod handler;
pub mod listing;
pub mod resolver;

pub use handler::{ResolvedTarget, Served, StaticSite};
pub use resolver::{Rejection, resolve};
