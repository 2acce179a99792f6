//! Core types for the Language Server Protocol.
//!
//! This module contains all the basic types used in LSP communication,
//! including JSON-RPC message types, the typed method markers and the
//! params/result structures of the requests the session issues.

use crate::error::{LspError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod initialization;
pub mod jsonrpc;
pub mod language;
pub mod lsp;
pub mod methods;
pub mod sync;
pub mod window;

pub use initialization::*;
pub use jsonrpc::*;
pub use language::*;
pub use lsp::*;
pub use sync::*;
pub use window::*;

/// Type alias for request/notification IDs.
/// Either a number or a string, as JSON-RPC allows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Number(value)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::String(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::String(value.to_string())
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::String(s) => write!(f, "{}", s),
        }
    }
}

/// Progress token as defined by LSP.
pub type ProgressToken = Id;

/// URI type as defined by LSP.
/// Over the wire, it's transferred as a string but represents a valid URI.
pub type Uri = String;

/// Document URI type as defined by LSP.
/// Guaranteed to be a valid document URI.
pub type DocumentUri = Uri;

/// Build the canonical `file://` URI of a file on disk.
///
/// Relative paths are resolved against the current directory first, since
/// URIs can only describe absolute locations.
pub fn uri_from_path(path: impl AsRef<Path>) -> Result<DocumentUri> {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    url::Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| LspError::Decode(format!("Cannot express {} as a URI", path.display())))
}

/// Build the canonical `file://` URI of a directory, with a trailing slash.
pub fn directory_uri(path: impl AsRef<Path>) -> Result<DocumentUri> {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    url::Url::from_directory_path(&absolute)
        .map(String::from)
        .map_err(|()| LspError::Decode(format!("Cannot express {} as a URI", path.display())))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_uri_from_path_escapes_and_prefixes() {
        let uri = uri_from_path("/work/lua project/main.lua").unwrap();
        assert_eq!(uri, "file:///work/lua%20project/main.lua");
    }

    #[test]
    fn test_directory_uri_has_trailing_slash() {
        let uri = directory_uri("/work/testLua").unwrap();
        assert_eq!(uri, "file:///work/testLua/");
    }

    #[test]
    fn test_relative_path_is_made_absolute() {
        let uri = uri_from_path("a.lua").unwrap();
        assert!(uri.starts_with("file:///"));
        assert!(uri.ends_with("/a.lua"));
    }
}
