use std::io::{BufRead, Write};

use serde::Serialize;
use thiserror::Error;

use crate::protocol::IncomingMessage;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("missing Content-Length")]
    MissingContentLength,
    #[error("invalid Content-Length: {0}")]
    InvalidContentLength(String),
    #[error("end of stream")]
    Eof,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON-RPC body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads and writes `Content-Length`-framed JSON-RPC 2.0 messages on top of
/// a buffered reader and a writer. Generic so tests can drive it over an
/// in-memory or piped stream instead of real stdio.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Transport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read one framed message. Returns `Err(TransportError::Eof)` when the
    /// stream closes before any header bytes arrive; any other error is a
    /// genuine framing or parse failure.
    pub fn read_message(&mut self) -> Result<IncomingMessage, TransportError> {
        let mut content_length: Option<usize> = None;
        let mut saw_any_header_line = false;

        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Err(if saw_any_header_line {
                    TransportError::MissingContentLength
                } else {
                    TransportError::Eof
                });
            }

            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                // Blank line terminates the header block.
                break;
            }
            saw_any_header_line = true;

            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-length") {
                    let value = value.trim();
                    content_length = Some(
                        value
                            .parse()
                            .map_err(|_| TransportError::InvalidContentLength(value.to_owned()))?,
                    );
                }
                // Any other header (e.g. Content-Type) is ignored.
            }
        }

        let content_length = content_length.ok_or(TransportError::MissingContentLength)?;

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body)?;

        let message: IncomingMessage = serde_json::from_slice(&body)?;
        Ok(message)
    }

    /// Write one framed message, forcing `jsonrpc = "2.0"`.
    pub fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), TransportError> {
        let body = serde_json::to_vec(message)?;
        write!(self.writer, "Content-Length: {}\r\n\r\n", body.len())?;
        self.writer.write_all(&body)?;
        self.writer.flush()?;
        Ok(())
    }
}
