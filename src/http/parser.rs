use crate::http::request::{Method, Request};
use bytes::BytesMut;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Longest single line (request line or header) accepted.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Longest request head (request line plus all headers) accepted.
pub const MAX_HEAD_LEN: usize = 64 * 1024;

const READ_CHUNK: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line {0:?}")]
    BadRequestLine(String),

    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    #[error("timed out waiting for request")]
    Timeout,

    /// The peer closed the connection before sending anything.
    #[error("connection closed before a request was sent")]
    Closed,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Whether the client should get a 400 for this error. I/O failures and
    /// timeouts just close the connection.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, ParseError::BadRequestLine(_) | ParseError::HeadTooLarge(_))
    }
}

/// The three tokens of a request line plus the line itself.
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: String,
    pub raw: String,
}

/// Reads a request head off a byte stream.
///
/// Bytes are pulled in chunks into an internal buffer and handed out one
/// line at a time. The reader never consumes anything past the blank line
/// that terminates the headers, other than what a single read returned.
pub struct RequestReader<R> {
    inner: R,
    buffer: BytesMut,
    head_len: usize,
}

impl<R: AsyncRead + Unpin> RequestReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(READ_CHUNK * 4),
            head_len: 0,
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads and splits the request line.
    ///
    /// Fails with [`ParseError::Closed`] if the stream ends before any byte
    /// arrives, and with [`ParseError::BadRequestLine`] if the line has fewer
    /// than three whitespace-separated tokens.
    pub async fn read_request_line(&mut self) -> Result<RequestLine, ParseError> {
        let line = self.read_line().await?.ok_or(ParseError::Closed)?;
        parse_request_line(&line)
    }

    /// Reads header lines up to and including the terminating empty line.
    ///
    /// Lines without a colon are skipped. When a name repeats, the last
    /// value wins.
    pub async fn read_headers(&mut self) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        loop {
            let line = self
                .read_line()
                .await?
                .ok_or_else(|| eof("connection closed while reading headers"))?;

            if line.is_empty() {
                return Ok(headers);
            }

            if let Some((name, value)) = parse_header_line(&line) {
                headers.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Reads a complete request head.
    pub async fn read_request(&mut self) -> Result<Request, ParseError> {
        let line = self.read_request_line().await?;
        let headers = self.read_headers().await?;

        Ok(Request {
            method: line.method,
            path: line.target,
            version: line.version,
            headers,
            request_line: line.raw,
        })
    }

    /// Returns the next line with its terminator and surrounding whitespace
    /// removed, or `None` on a clean end of stream.
    async fn read_line(&mut self) -> Result<Option<String>, ParseError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                if pos + 1 > MAX_LINE_LEN {
                    return Err(ParseError::HeadTooLarge(MAX_LINE_LEN));
                }
                self.head_len += pos + 1;
                if self.head_len > MAX_HEAD_LEN {
                    return Err(ParseError::HeadTooLarge(MAX_HEAD_LEN));
                }

                let line = self.buffer.split_to(pos + 1);
                return Ok(Some(String::from_utf8_lossy(&line).trim().to_string()));
            }

            if self.buffer.len() > MAX_LINE_LEN {
                return Err(ParseError::HeadTooLarge(MAX_LINE_LEN));
            }

            self.buffer.reserve(READ_CHUNK);
            let n = self.inner.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(eof("connection closed mid-line"));
            }
        }
    }
}

fn eof(msg: &'static str) -> ParseError {
    ParseError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, msg))
}

/// Splits a request line into method, target and version.
pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    let mut parts = line.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) => Ok(RequestLine {
            method: Method::parse(method),
            target: target.to_string(),
            version: version.to_string(),
            raw: line.to_string(),
        }),
        _ => Err(ParseError::BadRequestLine(line.to_string())),
    }
}

/// Splits a header line on its first colon. Name and value are trimmed.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}
