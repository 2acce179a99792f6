//! Error types for the LSP session.
//!
//! This module defines every failure a session can report, from transport
//! and framing faults on the byte stream to misuse of the session API.

use crate::lifecycle::SessionState;
use crate::types::{DocumentUri, Id};
use std::fmt;
use thiserror::Error;

/// A specialized Result type for LSP operations.
pub type Result<T> = std::result::Result<T, LspError>;

/// The main error type for LSP operations.
#[derive(Error, Debug)]
pub enum LspError {
    /// IO errors from the byte stream, including a closed stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed frame headers or an unacceptable content length
    #[error("Framing error: {0}")]
    Framing(String),

    /// A frame body that is not a well-formed JSON-RPC message
    #[error("Decode error: {0}")]
    Decode(String),

    /// JSON serialization errors on the outbound side or while converting
    /// typed params and results
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The peer violated the protocol (e.g. a response carrying both a
    /// result and an error)
    #[error("Protocol error: {message}")]
    Protocol {
        /// The request id the offending message referred to, if any.
        id: Option<Id>,
        message: String,
    },

    /// The server answered a request with an error response
    #[error("Server returned an error: {0}")]
    Response(#[from] ResponseError),

    /// The operation is only legal while the session is ready
    #[error("Session is not ready (state: {0})")]
    NotReady(SessionState),

    /// Initialize was called more than once
    #[error("Session has already been initialized")]
    AlreadyInitialized,

    /// didOpen for a document that is already open
    #[error("Document is already open: {0}")]
    AlreadyOpen(DocumentUri),

    /// Synchronization notification for a document that is not open
    #[error("Document is not open: {0}")]
    NotOpen(DocumentUri),

    /// A reopened document was given a version that does not move forward
    #[error("Version {version} for {uri} is not greater than the last version {current}")]
    StaleVersion {
        uri: DocumentUri,
        version: i32,
        current: i32,
    },

    /// The pending request was cancelled by the caller
    #[error("Request {0} was cancelled")]
    Cancelled(Id),

    /// The session terminated before the request was answered
    #[error("Connection closed")]
    ConnectionClosed,

    /// A handler is already registered for the method
    #[error("A conflicting handler is already registered for '{0}'")]
    DuplicateHandler(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Server initialization failed
    #[error("Server initialization failed: {0}")]
    InitializationFailed(String),

    /// Spawning or wiring up the server process failed
    #[error("Server process error: {0}")]
    Process(String),
}

impl LspError {
    /// Returns true when the error means the peer closed the stream.
    pub fn is_disconnect(&self) -> bool {
        match self {
            LspError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
            ),
            LspError::ConnectionClosed => true,
            _ => false,
        }
    }

    /// Returns true for errors that leave the byte stream in an unknown
    /// position, which ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LspError::Io(_) | LspError::Framing(_) | LspError::Decode(_)
        )
    }

    pub(crate) fn protocol(id: Option<Id>, message: impl Into<String>) -> Self {
        LspError::Protocol {
            id,
            message: message.into(),
        }
    }
}

/// LSP ResponseError as sent on the wire.
/// This corresponds to the error object in LSP response messages.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseError {
    /// A number indicating the error type that occurred.
    pub code: i32,
    /// A string providing a short description of the error.
    pub message: String,
    /// A primitive or structured value that contains additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ResponseError {}

/// Error codes from JSON-RPC and LSP.
pub mod error_codes {
    // JSON RPC error codes
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // JSON RPC reserved error range
    pub const JSONRPC_RESERVED_ERROR_RANGE_START: i32 = -32099;
    pub const SERVER_NOT_INITIALIZED: i32 = -32002;
    pub const UNKNOWN_ERROR_CODE: i32 = -32001;
    pub const JSONRPC_RESERVED_ERROR_RANGE_END: i32 = -32000;

    // LSP reserved error range
    pub const LSP_RESERVED_ERROR_RANGE_START: i32 = -32899;
    pub const REQUEST_FAILED: i32 = -32803;
    pub const SERVER_CANCELLED: i32 = -32802;
    pub const CONTENT_MODIFIED: i32 = -32801;
    pub const REQUEST_CANCELLED: i32 = -32800;
    pub const LSP_RESERVED_ERROR_RANGE_END: i32 = -32800;
}

impl ResponseError {
    /// Create a new ResponseError with the given code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new ResponseError with additional data.
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(error_codes::PARSE_ERROR, message)
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_REQUEST, message)
    }

    /// Create a method not found error.
    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(error_codes::METHOD_NOT_FOUND, message)
    }

    /// Create an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, message)
    }

    /// Create an internal error.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, message)
    }

    /// Create a request cancelled error.
    pub fn request_cancelled(message: impl Into<String>) -> Self {
        Self::new(error_codes::REQUEST_CANCELLED, message)
    }

    /// Create a content modified error.
    pub fn content_modified(message: impl Into<String>) -> Self {
        Self::new(error_codes::CONTENT_MODIFIED, message)
    }
}
