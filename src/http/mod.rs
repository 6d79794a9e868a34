//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 subset: one request per connection, no
//! request bodies, every response sent with `Connection: close`.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection state machine
//! - **`parser`**: Reads a request head off a byte stream
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────────┐
//!        │ AwaitingRequestLine  │ ← read "METHOD path version"
//!        └──────────┬───────────┘
//!                   │ request line parsed
//!                   ▼
//!        ┌──────────────────────┐
//!        │   AwaitingHeaders    │ ← read header lines up to the blank line
//!        └──────────┬───────────┘
//!                   │ head complete
//!                   ▼
//!        ┌──────────────────────┐
//!        │      Resolving       │ ← map path onto the document root
//!        └──────────┬───────────┘
//!                   │ response ready
//!                   ▼
//!        ┌──────────────────────┐
//!        │      Responding      │ ← write response, record stats
//!        └──────────┬───────────┘
//!                   ▼
//!                 Closed
//! ```
//!
//! A malformed request line or oversized head skips straight to
//! `Responding` with a 400; a read failure or timeout goes to `Closed`.

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
