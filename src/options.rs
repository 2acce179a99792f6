//! Session configuration.
//!
//! [`SessionOptions`] carries everything the client announces in the
//! `initialize` request plus the handlers for server-initiated traffic.

use crate::error::Result;
use crate::handlers::HandlerRegistry;
use crate::types::{
    directory_uri, ClientCapabilities, ClientInfo, InitializeParams, TraceValue, WorkspaceFolder,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a [`crate::Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Sent as `clientInfo`.
    pub client_info: Option<ClientInfo>,
    /// Sent as `processId`; the server may exit when this process dies.
    pub process_id: Option<u32>,
    /// The workspace root, sent as `rootPath` and `rootUri`.
    pub root_path: Option<PathBuf>,
    /// Workspace folders. When empty and a root is set, the root is the
    /// only folder.
    pub workspace_folders: Vec<WorkspaceFolder>,
    pub trace: TraceValue,
    pub locale: Option<String>,
    pub capabilities: ClientCapabilities,
    /// Server-specific settings, passed through verbatim.
    pub initialization_options: Option<Value>,
    /// Give up on the `initialize` round trip after this long.
    pub initialize_timeout: Option<Duration>,
    pub handlers: HandlerRegistry,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            client_info: Some(ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            process_id: Some(std::process::id()),
            root_path: None,
            workspace_folders: Vec::new(),
            trace: TraceValue::Off,
            locale: None,
            capabilities: ClientCapabilities::default(),
            initialization_options: None,
            initialize_timeout: None,
            handlers: HandlerRegistry::with_defaults(),
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_info(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.client_info = Some(ClientInfo {
            name: name.into(),
            version,
        });
        self
    }

    pub fn with_process_id(mut self, process_id: Option<u32>) -> Self {
        self.process_id = process_id;
        self
    }

    pub fn with_root_path(mut self, root: impl AsRef<Path>) -> Self {
        self.root_path = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn with_workspace_folder(mut self, uri: impl Into<String>, name: impl Into<String>) -> Self {
        self.workspace_folders.push(WorkspaceFolder {
            uri: uri.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_trace(mut self, trace: TraceValue) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_initialization_options(mut self, options: Value) -> Self {
        self.initialization_options = Some(options);
        self
    }

    pub fn with_initialize_timeout(mut self, timeout: Duration) -> Self {
        self.initialize_timeout = Some(timeout);
        self
    }

    /// Replace the handler registry, including the defaults.
    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Add handlers on top of the current registry.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Build the params of the `initialize` request.
    pub fn initialize_params(&self) -> Result<InitializeParams> {
        let root_uri = self.root_path.as_deref().map(directory_uri).transpose()?;

        let workspace_folders = match (&root_uri, self.workspace_folders.is_empty()) {
            (_, false) => Some(self.workspace_folders.clone()),
            (Some(uri), true) => Some(vec![WorkspaceFolder {
                uri: uri.clone(),
                name: self
                    .root_path
                    .as_deref()
                    .and_then(Path::file_name)
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| uri.clone()),
            }]),
            (None, true) => None,
        };

        Ok(InitializeParams {
            process_id: self.process_id,
            client_info: self.client_info.clone(),
            locale: self.locale.clone(),
            root_path: self
                .root_path
                .as_deref()
                .map(|path| path.to_string_lossy().into_owned()),
            root_uri,
            initialization_options: self.initialization_options.clone(),
            capabilities: self.capabilities.clone(),
            trace: Some(self.trace),
            workspace_folders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::new();
        assert_eq!(options.process_id, Some(std::process::id()));
        assert_eq!(
            options.client_info.as_ref().map(|i| i.name.as_str()),
            Some("lsp-session")
        );
        assert!(options.handlers.contains("workspace/configuration"));

        let params = options.initialize_params().unwrap();
        assert_eq!(params.root_uri, None);
        assert_eq!(params.workspace_folders, None);
        assert_eq!(params.trace, Some(TraceValue::Off));
    }

    #[cfg(unix)]
    #[test]
    fn test_root_path_becomes_uri_and_folder() {
        let params = SessionOptions::new()
            .with_root_path("/work/testLua")
            .with_trace(TraceValue::Verbose)
            .with_initialization_options(json!({"diagnostics": {"enable": true}}))
            .initialize_params()
            .unwrap();

        assert_eq!(params.root_path.as_deref(), Some("/work/testLua"));
        assert_eq!(params.root_uri.as_deref(), Some("file:///work/testLua/"));
        let folders = params.workspace_folders.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "testLua");
        assert_eq!(
            params.initialization_options,
            Some(json!({"diagnostics": {"enable": true}}))
        );
    }

    #[test]
    fn test_explicit_folders_win() {
        let params = SessionOptions::new()
            .with_root_path(std::env::temp_dir())
            .with_workspace_folder("file:///a/", "a")
            .with_workspace_folder("file:///b/", "b")
            .initialize_params()
            .unwrap();

        let names: Vec<_> = params
            .workspace_folders
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
