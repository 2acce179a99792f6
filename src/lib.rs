//! # lsp-session
//!
//! The client side of a Language Server Protocol session.
//!
//! This crate drives a language server over any duplex byte stream: it frames
//! and decodes JSON-RPC messages, correlates responses with requests, answers
//! server-initiated requests through a handler registry, keeps document
//! versions in sync and enforces the initialize/shutdown lifecycle.
//!
//! ## Features
//!
//! - Async/await interface using tokio
//! - Typed requests and notifications, with a raw JSON fallback
//! - Cancellation and per-request timeouts
//! - Document synchronization with client-owned versions
//! - Optional child process management for stdio servers
//!
//! ## Example
//!
//! ```rust,no_run
//! use lsp_session::prelude::*;
//! use tokio::process::Command;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let mut server = ServerProcess::spawn(Command::new("lua-language-server"))?;
//!     let session = server.start_session(SessionOptions::new().with_root_path("/work/project"))?;
//!
//!     session.initialize().await?;
//!     session
//!         .open_document("file:///work/project/main.lua", "lua", "local x = 1")
//!         .await?;
//!     let hover = session
//!         .hover("file:///work/project/main.lua", Position::new(0, 6))
//!         .await?;
//!     println!("{:?}", hover);
//!
//!     session.shutdown().await?;
//!     server.wait_with_grace(std::time::Duration::from_secs(2)).await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod dispatcher;
pub mod documents;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod options;
pub mod pending;
pub mod process;
mod requests;
pub mod session;
pub mod transport;
pub mod types;

pub use error::{LspError, ResponseError, Result};
pub use handlers::HandlerRegistry;
pub use lifecycle::SessionState;
pub use options::SessionOptions;
pub use pending::PendingRequest;
pub use process::ServerProcess;
pub use session::Session;
pub use transport::Transport;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{LspError, ResponseError, Result};
    pub use crate::handlers::HandlerRegistry;
    pub use crate::lifecycle::SessionState;
    pub use crate::options::SessionOptions;
    pub use crate::process::ServerProcess;
    pub use crate::session::Session;
    pub use crate::types::methods::{self, Notification, Request};
    pub use crate::types::*;
}
