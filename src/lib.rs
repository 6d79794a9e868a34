//! Warden - static content HTTP server
//!
//! Serves files and directory listings from a document root over a small
//! HTTP/1.1 subset, records request statistics, and exposes them on a
//! separately authenticated admin page.

pub mod admin;
pub mod config;
pub mod http;
pub mod server;
pub mod static_files;
pub mod stats;
