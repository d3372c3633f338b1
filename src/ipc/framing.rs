//! Content-Length message framing over Unix sockets.
//!
//! This module implements HTTP-style Content-Length framing, the same protocol
//! used by the Language Server Protocol (LSP). This gives reliable message
//! boundaries over stream-oriented sockets.
//!
//! # Wire Format
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <message-body>
//! ```
//!
//! The header parsing is case-insensitive and handles both CRLF and LF line endings.
//!
//! The server reads and writes frames with the async helpers. The client never
//! blocks, so it feeds whatever bytes are available into a [`FrameDecoder`] and
//! takes complete frames out of it.

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum message size (100MB) to prevent OOM from a misbehaving peer.
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Parse one header line, returning the Content-Length if that is what it is.
///
/// Other headers (e.g., Content-Type) are ignored.
fn parse_header_line(line: &str) -> Result<Option<usize>> {
    let Some(colon_pos) = line.find(':') else {
        return Ok(None);
    };
    let key = line[..colon_pos].trim();
    let value = line[colon_pos + 1..].trim();

    if !key.eq_ignore_ascii_case("Content-Length") {
        return Ok(None);
    }
    let size: usize = value
        .parse()
        .with_context(|| format!("Invalid Content-Length value: {}", value))?;
    if size > MAX_MESSAGE_SIZE {
        return Err(anyhow!(
            "Message size {} exceeds maximum {} bytes",
            size,
            MAX_MESSAGE_SIZE
        ));
    }
    Ok(Some(size))
}

/// Read a Content-Length framed message from the stream.
///
/// Returns `Ok(None)` when the peer closed the stream between messages.
///
/// # Errors
///
/// Returns an error if:
/// - The stream closes in the middle of a message
/// - No Content-Length header is found
/// - Content-Length exceeds MAX_MESSAGE_SIZE (100MB)
/// - The body is not valid UTF-8
pub async fn read_message<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut first_line = true;

    loop {
        let mut line = String::new();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .context("Failed to read header line")?;

        if bytes_read == 0 {
            if first_line {
                return Ok(None);
            }
            return Err(anyhow!("Connection closed in the middle of a message header"));
        }
        first_line = false;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some(size) = parse_header_line(trimmed)? {
            content_length = Some(size);
        }
    }

    let size = content_length.ok_or_else(|| anyhow!("Missing Content-Length header"))?;

    let mut body = vec![0u8; size];
    reader
        .read_exact(&mut body)
        .await
        .context("Failed to read message body")?;

    String::from_utf8(body)
        .map(Some)
        .context("Message body is not valid UTF-8")
}

/// Write a Content-Length framed message to the stream.
pub async fn write_message<W>(writer: &mut W, body: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&encode_frame(body))
        .await
        .context("Failed to write message")?;
    writer.flush().await.context("Failed to flush message")?;
    Ok(())
}

/// Frame `body` for sending.
pub fn encode_frame(body: &str) -> Vec<u8> {
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    let mut frame = Vec::with_capacity(header.len() + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(body.as_bytes());
    frame
}

/// Incremental decoder for a non-blocking reader.
///
/// Bytes are pushed as they arrive; [`FrameDecoder::next_frame`] yields a
/// body once the header and all of its bytes are buffered.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Result<Option<String>> {
        let mut content_length: Option<usize> = None;
        let mut pos = 0;

        // Walk header lines until the blank separator line.
        let body_start = loop {
            let Some(newline) = self.buffer[pos..].iter().position(|&b| b == b'\n') else {
                return Ok(None);
            };
            let line = std::str::from_utf8(&self.buffer[pos..pos + newline])
                .context("Header is not valid UTF-8")?
                .trim();
            pos += newline + 1;

            if line.is_empty() {
                break pos;
            }
            if let Some(size) = parse_header_line(line)? {
                content_length = Some(size);
            }
        };

        let size = content_length.ok_or_else(|| anyhow!("Missing Content-Length header"))?;
        if self.buffer.len() < body_start + size {
            return Ok(None);
        }

        let body = self.buffer[body_start..body_start + size].to_vec();
        self.buffer.drain(..body_start + size);
        String::from_utf8(body)
            .map(Some)
            .context("Message body is not valid UTF-8")
    }
}
