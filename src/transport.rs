//! Transport layer for the Language Server Protocol.
//!
//! This module implements the base protocol framing: a header block of
//! `Name: value` fields terminated by an empty line, followed by exactly
//! `Content-Length` bytes of body. Reading and writing live in separate
//! halves so a session can read inbound frames while other tasks write.

use crate::codec;
use crate::error::{LspError, Result};
use crate::types::RpcMessage;
use std::collections::HashMap;
use std::io;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

/// The default content type for LSP messages.
pub const DEFAULT_CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf-8";

/// Frames announcing a larger body are rejected before any allocation.
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// Header fields of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeaders {
    /// The length of the body in bytes.
    pub content_length: usize,
    /// The MIME type of the body.
    pub content_type: String,
    /// Any other header fields, preserved as received.
    pub additional: HashMap<String, String>,
}

impl FrameHeaders {
    /// Create new headers with the given content length.
    pub fn new(content_length: usize) -> Self {
        Self {
            content_length,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            additional: HashMap::new(),
        }
    }

    /// Get the character encoding from the content type.
    /// Returns "utf-8" by default, and also accepts "utf8" for backwards compatibility.
    pub fn charset(&self) -> &str {
        let charset = self
            .content_type
            .split(';')
            .filter_map(|part| part.trim().strip_prefix("charset="))
            .next()
            .map(|charset| charset.trim().trim_matches('"'));

        match charset {
            None | Some("utf8") => "utf-8",
            Some(charset) => charset,
        }
    }

    /// Render the header block, including the terminating empty line.
    fn to_bytes(&self) -> Vec<u8> {
        let mut header = format!("Content-Length: {}\r\n", self.content_length);
        if self.content_type != DEFAULT_CONTENT_TYPE {
            header.push_str(&format!("Content-Type: {}\r\n", self.content_type));
        }
        for (name, value) in &self.additional {
            header.push_str(&format!("{}: {}\r\n", name, value));
        }
        header.push_str("\r\n");
        header.into_bytes()
    }
}

/// One complete frame: headers plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub headers: FrameHeaders,
    pub body: Vec<u8>,
}

impl Frame {
    /// Create a frame for the given body with default headers.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            headers: FrameHeaders::new(body.len()),
            body,
        }
    }

    /// Serialize this frame to bytes for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.headers.to_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// The read half: turns a byte stream into complete frames.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::with_capacity(64),
        }
    }

    /// Read the next complete frame.
    ///
    /// Suspends until the whole header block and the whole body have
    /// arrived. A stream that ends, even between frames, yields an
    /// `UnexpectedEof` I/O error.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        let headers = self.read_headers().await?;
        let mut body = vec![0; headers.content_length];
        self.reader.read_exact(&mut body).await?;
        log::trace!("<- frame of {} bytes", body.len());
        Ok(Frame { headers, body })
    }

    /// Read the next frame and decode its body.
    pub async fn read_message(&mut self) -> Result<RpcMessage> {
        let frame = self.read_frame().await?;
        codec::decode(&frame.body)
    }

    async fn read_headers(&mut self) -> Result<FrameHeaders> {
        let mut additional = HashMap::new();
        let mut content_length = None;
        let mut content_type = DEFAULT_CONTENT_TYPE.to_string();
        let mut fields = 0usize;

        loop {
            let line = self.read_line().await?;

            // Empty line indicates end of headers
            if line.is_empty() {
                if fields == 0 {
                    // Stray separator between frames.
                    continue;
                }
                break;
            }

            fields += 1;
            let (name, value) = parse_header_field(&line)?;
            if name.eq_ignore_ascii_case("content-length") {
                let length = value.parse::<usize>().map_err(|_| {
                    LspError::Framing(format!("Invalid Content-Length: {}", value))
                })?;
                if length > MAX_CONTENT_LENGTH {
                    return Err(LspError::Framing(format!(
                        "Content-Length {} exceeds the limit of {} bytes",
                        length, MAX_CONTENT_LENGTH
                    )));
                }
                content_length = Some(length);
            } else if name.eq_ignore_ascii_case("content-type") {
                content_type = value;
            } else {
                additional.insert(name, value);
            }
        }

        let content_length = content_length
            .ok_or_else(|| LspError::Framing("Missing Content-Length header".to_string()))?;

        let headers = FrameHeaders {
            content_length,
            content_type,
            additional,
        };

        let charset = headers.charset();
        if !charset.eq_ignore_ascii_case("utf-8") {
            return Err(LspError::Framing(format!("Unsupported encoding: {}", charset)));
        }

        Ok(headers)
    }

    /// Read a single header line, without its `\r\n` (or bare `\n`).
    async fn read_line(&mut self) -> Result<String> {
        self.line.clear();
        let read = self.reader.read_until(b'\n', &mut self.line).await?;
        if read == 0 || self.line.last() != Some(&b'\n') {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed").into());
        }

        self.line.pop();
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }

        String::from_utf8(self.line.clone())
            .map_err(|e| LspError::Framing(format!("Invalid UTF-8 in header: {}", e)))
    }
}

/// The write half: emits whole frames.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write `body` as one frame and flush it.
    pub async fn write_frame(&mut self, body: &[u8]) -> Result<()> {
        let mut bytes = FrameHeaders::new(body.len()).to_bytes();
        bytes.extend_from_slice(body);
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        log::trace!("-> frame of {} bytes", body.len());
        Ok(())
    }

    /// Encode and write an RPC message.
    pub async fn write_message(&mut self, message: &RpcMessage) -> Result<()> {
        let body = codec::encode(message)?;
        self.write_frame(&body).await
    }

    /// Close the write side of the stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Transport for reading and writing LSP messages over a duplex stream.
pub struct Transport<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Transport<R, W> {
    /// Create a new transport with the given reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    pub async fn read_frame(&mut self) -> Result<Frame> {
        self.reader.read_frame().await
    }

    pub async fn read_message(&mut self) -> Result<RpcMessage> {
        self.reader.read_message().await
    }

    pub async fn write_frame(&mut self, body: &[u8]) -> Result<()> {
        self.writer.write_frame(body).await
    }

    pub async fn write_message(&mut self, message: &RpcMessage) -> Result<()> {
        self.writer.write_message(message).await
    }

    /// Separate the halves so reading and writing can proceed concurrently.
    pub fn into_split(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }
}

/// Parse a header field line into name and value.
fn parse_header_field(line: &str) -> Result<(String, String)> {
    match line.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(LspError::Framing(format!("Invalid header field: {}", line))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::jsonrpc::RequestMessage;
    use std::io::Cursor;

    #[test]
    fn test_charset_detection() {
        let mut headers = FrameHeaders::new(10);
        assert_eq!(headers.charset(), "utf-8");

        headers.content_type = "application/json; charset=utf8".to_string();
        assert_eq!(headers.charset(), "utf-8"); // backwards compatibility

        headers.content_type = "application/json; charset=latin1".to_string();
        assert_eq!(headers.charset(), "latin1");
    }

    #[test]
    fn test_frame_serialization() {
        let content = r#"{"jsonrpc":"2.0","id":1,"method":"test"}"#;
        let frame = Frame::new(content);
        let expected = format!("Content-Length: {}\r\n\r\n{}", content.len(), content);
        assert_eq!(String::from_utf8(frame.to_bytes()).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_transport_write_read() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        let request = RpcMessage::from(RequestMessage::new(42, "initialize"));
        writer.write_message(&request).await.unwrap();

        let written = writer.into_inner().into_inner();
        let mut transport = Transport::new(Cursor::new(written), Cursor::new(Vec::new()));
        let parsed = transport.read_message().await.unwrap();
        assert_eq!(parsed, request);
    }

    #[tokio::test]
    async fn test_back_to_back_frames() {
        let mut bytes = Frame::new("{\"a\":1}").to_bytes();
        bytes.extend(Frame::new("{\"b\":2}").to_bytes());

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().await.unwrap().body, b"{\"a\":1}");
        assert_eq!(reader.read_frame().await.unwrap().body, b"{\"b\":2}");

        let err = reader.read_frame().await.unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_headers_are_case_insensitive_and_preserved() {
        let bytes = b"content-length: 2\r\nX-Trace: abc\r\nContent-Type: application/json; charset=utf8\r\n\r\n{}";
        let mut reader = FrameReader::new(&bytes[..]);
        let frame = reader.read_frame().await.unwrap();

        assert_eq!(frame.headers.content_length, 2);
        assert_eq!(frame.headers.additional.get("X-Trace"), Some(&"abc".to_string()));
        assert_eq!(frame.body, b"{}");
    }

    #[tokio::test]
    async fn test_bare_newlines_tolerated() {
        let bytes = b"Content-Length:2\n\n{}";
        let mut reader = FrameReader::new(&bytes[..]);
        assert_eq!(reader.read_frame().await.unwrap().body, b"{}");
    }

    #[tokio::test]
    async fn test_framing_errors() {
        let cases: [&[u8]; 4] = [
            b"Content-Type: text/plain\r\n\r\n{}",
            b"Content-Length: two\r\n\r\n{}",
            b"NoColonHere\r\n\r\n",
            b"Content-Length: 2\r\nContent-Type: text/plain; charset=latin1\r\n\r\n{}",
        ];

        for bytes in cases {
            let mut reader = FrameReader::new(bytes);
            let err = reader.read_frame().await.unwrap_err();
            assert!(matches!(err, LspError::Framing(_)), "got {:?}", err);
        }
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let header = format!("Content-Length: {}\r\n\r\n", MAX_CONTENT_LENGTH + 1);
        let mut reader = FrameReader::new(header.as_bytes());
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, LspError::Framing(ref m) if m.contains("exceeds")));
    }

    #[tokio::test]
    async fn test_truncated_body_is_eof() {
        let bytes = b"Content-Length: 10\r\n\r\n{}";
        let mut reader = FrameReader::new(&bytes[..]);
        let err = reader.read_frame().await.unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_chunked_delivery() {
        let stream = tokio_test::io::Builder::new()
            .read(b"Content-Le")
            .read(b"ngth: 7\r")
            .read(b"\n\r\n{\"a\"")
            .read(b":1}")
            .build();

        let mut reader = FrameReader::new(stream);
        assert_eq!(reader.read_frame().await.unwrap().body, b"{\"a\":1}");
    }

    #[test]
    fn test_header_parsing() {
        assert_eq!(
            parse_header_field("Content-Length: 123").unwrap(),
            ("Content-Length".to_string(), "123".to_string())
        );

        assert_eq!(
            parse_header_field("Custom-Header: value with: colons").unwrap(),
            ("Custom-Header".to_string(), "value with: colons".to_string())
        );

        assert!(parse_header_field("InvalidHeader").is_err());
        assert!(parse_header_field(": value").is_err());
    }
}
