//! The content server's accept loop.

pub mod listener;
