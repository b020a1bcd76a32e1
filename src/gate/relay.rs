//! Response relay
//!
//! Copies the upstream response back to the client. Non-streaming bodies are
//! relayed whole; streaming bodies are re-chunked into newline-terminated
//! frames, each yielded to hyper as its own body frame so the client sees a
//! line as soon as it is read from the upstream.

use crate::gate::error::ProxyError;
use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use tracing::{trace, warn};

/// Initial line buffer capacity.
const LINE_BUFFER_INITIAL: usize = 64 * 1024;

/// Hard ceiling for a single streamed line. Large single-line tool-call
/// payloads are expected; anything past this aborts the relay.
const LINE_BUFFER_MAX: usize = 10 * 1024 * 1024;

/// Accumulates upstream bytes and yields complete lines.
///
/// Each yielded frame carries the line content plus exactly one trailing
/// `\n`; a `\r\n` terminator is normalized to `\n`.
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer {
            buf: Vec::with_capacity(LINE_BUFFER_INITIAL),
        }
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes currently buffered without a terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next complete line, or `None` when no terminator has
    /// arrived yet.
    pub fn next_line(&mut self) -> Option<Bytes> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        line.push(b'\n');
        Some(Bytes::from(line))
    }

    /// Drain whatever remains after upstream EOF, terminated like a full
    /// line. `None` when the buffer is empty.
    pub fn take_remainder(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buf);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        line.push(b'\n');
        Some(Bytes::from(line))
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Relay the upstream response to the client.
///
/// Status and headers are copied first; a streaming relay suppresses
/// `Content-Length` and `Transfer-Encoding` because it re-chunks the body
/// itself. Upstream HTTP error statuses pass through untouched.
pub async fn relay(upstream: reqwest::Response, is_stream: bool) -> Result<Response, ProxyError> {
    let status = upstream.status();
    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        copy_headers(upstream.headers(), headers, is_stream);
    }

    let body = if is_stream {
        Body::from_stream(line_stream(upstream))
    } else {
        let bytes = upstream.bytes().await.map_err(ProxyError::Upstream)?;
        Body::from(bytes)
    };

    Ok(builder.body(body).unwrap_or_else(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "Error building response").into_response()
    }))
}

/// Copy upstream headers into the client response.
fn copy_headers(upstream: &HeaderMap, out: &mut HeaderMap, is_stream: bool) {
    for (name, value) in upstream {
        if is_stream && (name == &header::CONTENT_LENGTH || name == &header::TRANSFER_ENCODING) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
}

/// Turn the upstream body into a stream of newline-terminated frames.
///
/// The stream ends on upstream EOF, on an upstream read error (whatever was
/// already yielded stays delivered), or on a line exceeding the buffer
/// ceiling. A client disconnect drops the stream, which stops the loop.
fn line_stream(
    upstream: reqwest::Response,
) -> impl futures::Stream<Item = Result<Bytes, Infallible>> + Send {
    async_stream::stream! {
        let mut chunks = upstream.bytes_stream();
        let mut lines = LineBuffer::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    warn!("error reading upstream stream: {}", e);
                    return;
                }
            };

            lines.extend(&chunk);
            while let Some(line) = lines.next_line() {
                trace!("streaming line of {} bytes", line.len());
                yield Ok(line);
            }

            if lines.pending() > LINE_BUFFER_MAX {
                warn!(
                    "streamed line exceeds {} bytes, terminating relay",
                    LINE_BUFFER_MAX
                );
                return;
            }
        }

        if let Some(rest) = lines.take_remainder() {
            yield Ok(rest);
        }
    }
}
