use std::collections::BTreeMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response to its wire form: status line, one line per header
/// in name order, blank line, body.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + resp.body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&resp.body);

    buf
}

/// Parses a serialized response back into a [`Response`].
///
/// The body is taken as exactly `Content-Length` bytes when the header is
/// present, otherwise everything after the blank line.
pub fn parse_response(raw: &[u8]) -> anyhow::Result<Response> {
    let head_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| anyhow::anyhow!("response head not terminated"))?;

    let head = std::str::from_utf8(&raw[..head_end])?;
    let mut lines = head.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("empty response"))?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if version != HTTP_VERSION {
        anyhow::bail!("unexpected protocol version {:?}", version);
    }
    let code: u16 = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("status line missing code"))?
        .parse()?;
    let status = StatusCode::from_u16(code)
        .ok_or_else(|| anyhow::anyhow!("unsupported status {}", code))?;

    let mut headers = BTreeMap::new();
    for line in lines {
        let (k, v) = line
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("malformed header line {:?}", line))?;
        headers.insert(k.trim().to_string(), v.trim().to_string());
    }

    let rest = &raw[head_end + 4..];
    let body = match headers.get("Content-Length") {
        Some(len) => {
            let len: usize = len.parse()?;
            if rest.len() < len {
                anyhow::bail!("body shorter than Content-Length");
            }
            rest[..len].to_vec()
        }
        None => rest.to_vec(),
    };

    Ok(Response {
        status,
        headers,
        body,
    })
}

/// Writes one serialized response onto a connection.
///
/// Once the peer has gone away, or the whole response has been written,
/// further calls fail instead of touching the stream again.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
    closed: bool,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
            closed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if self.closed {
            anyhow::bail!("response already written or connection closed");
        }

        while self.written < self.buffer.len() {
            let n = match stream.write(&self.buffer[self.written..]).await {
                Ok(n) => n,
                Err(e) => {
                    self.closed = true;
                    return Err(e.into());
                }
            };

            if n == 0 {
                self.closed = true;
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        self.closed = true;
        stream.flush().await?;
        Ok(())
    }
}
