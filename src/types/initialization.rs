//! LSP initialization types and structures.
//!
//! This module contains types related to the initialization handshake
//! between client and server.

use crate::types::{DocumentUri, MarkupKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capabilities that the client supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    /// Workspace-specific client capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceClientCapabilities>,

    /// Text document-specific client capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_document: Option<TextDocumentClientCapabilities>,

    /// Window-specific client capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowClientCapabilities>,

    /// General client capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralClientCapabilities>,

    /// Experimental client capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<serde_json::Value>,
}

impl Default for ClientCapabilities {
    fn default() -> Self {
        Self {
            workspace: Some(WorkspaceClientCapabilities::default()),
            text_document: Some(TextDocumentClientCapabilities::default()),
            window: Some(WindowClientCapabilities::default()),
            general: Some(GeneralClientCapabilities::default()),
            experimental: None,
        }
    }
}

/// Workspace-specific client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceClientCapabilities {
    /// The client supports applying batch edits to the workspace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_edit: Option<bool>,

    /// Capabilities specific to `WorkspaceEdit`s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_edit: Option<WorkspaceEditClientCapabilities>,

    /// Capabilities specific to the `workspace/didChangeConfiguration` notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_change_configuration: Option<DynamicRegistrationCapability>,

    /// Capabilities specific to the `workspace/symbol` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<DynamicRegistrationCapability>,

    /// The client has support for workspace folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_folders: Option<bool>,

    /// The client supports `workspace/configuration` requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<bool>,
}

impl Default for WorkspaceClientCapabilities {
    fn default() -> Self {
        Self {
            apply_edit: Some(false),
            workspace_edit: Some(WorkspaceEditClientCapabilities::default()),
            did_change_configuration: Some(DynamicRegistrationCapability::default()),
            symbol: None,
            workspace_folders: Some(true),
            configuration: Some(true),
        }
    }
}

/// Client capabilities for workspace edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceEditClientCapabilities {
    /// The client supports versioned document changes in `WorkspaceEdit`s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_changes: Option<bool>,

    /// The resource operations the client supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_operations: Option<Vec<ResourceOperationKind>>,

    /// The failure handling strategy of a client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_handling: Option<FailureHandlingKind>,
}

impl Default for WorkspaceEditClientCapabilities {
    fn default() -> Self {
        Self {
            document_changes: Some(true),
            resource_operations: Some(vec![
                ResourceOperationKind::Create,
                ResourceOperationKind::Rename,
                ResourceOperationKind::Delete,
            ]),
            failure_handling: Some(FailureHandlingKind::Transactional),
        }
    }
}

/// The kind of resource operations supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceOperationKind {
    /// Supports creating new files and folders.
    Create,
    /// Supports renaming existing files and folders.
    Rename,
    /// Supports deleting existing files and folders.
    Delete,
}

/// The failure handling strategy for workspace edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureHandlingKind {
    Abort,
    Transactional,
    TextOnlyTransactional,
    Undo,
}

/// Client capability that only declares dynamic registration support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRegistrationCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,
}

impl Default for DynamicRegistrationCapability {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
        }
    }
}

/// Text document-specific client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentClientCapabilities {
    /// Defines which synchronization capabilities the client supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synchronization: Option<TextDocumentSyncClientCapabilities>,

    /// Capabilities specific to the `textDocument/completion` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionClientCapabilities>,

    /// Capabilities specific to the `textDocument/hover` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<HoverClientCapabilities>,

    /// Capabilities specific to the `textDocument/signatureHelp` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_help: Option<DynamicRegistrationCapability>,

    /// Capabilities specific to the `textDocument/declaration` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<GotoClientCapabilities>,

    /// Capabilities specific to the `textDocument/definition` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<GotoClientCapabilities>,

    /// Capabilities specific to the `textDocument/references` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<DynamicRegistrationCapability>,

    /// Capabilities specific to the `textDocument/documentSymbol` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_symbol: Option<DocumentSymbolClientCapabilities>,

    /// Capabilities specific to the `textDocument/formatting` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatting: Option<DynamicRegistrationCapability>,

    /// Capabilities specific to the `textDocument/rename` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<RenameClientCapabilities>,

    /// Capabilities specific to the `textDocument/documentColor` and
    /// `textDocument/colorPresentation` requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_provider: Option<DynamicRegistrationCapability>,

    /// Capabilities specific to the `textDocument/semanticTokens/*` requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_tokens: Option<SemanticTokensClientCapabilities>,

    /// Capabilities specific to the `textDocument/diagnostic` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<DiagnosticClientCapabilities>,

    /// Capabilities specific to the `textDocument/publishDiagnostics` notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_diagnostics: Option<PublishDiagnosticsClientCapabilities>,
}

impl Default for TextDocumentClientCapabilities {
    fn default() -> Self {
        Self {
            synchronization: Some(TextDocumentSyncClientCapabilities::default()),
            completion: Some(CompletionClientCapabilities::default()),
            hover: Some(HoverClientCapabilities::default()),
            signature_help: Some(DynamicRegistrationCapability::default()),
            declaration: Some(GotoClientCapabilities::default()),
            definition: Some(GotoClientCapabilities::default()),
            references: Some(DynamicRegistrationCapability::default()),
            document_symbol: Some(DocumentSymbolClientCapabilities::default()),
            formatting: Some(DynamicRegistrationCapability::default()),
            rename: Some(RenameClientCapabilities::default()),
            color_provider: Some(DynamicRegistrationCapability::default()),
            semantic_tokens: Some(SemanticTokensClientCapabilities::default()),
            diagnostic: Some(DiagnosticClientCapabilities::default()),
            publish_diagnostics: Some(PublishDiagnosticsClientCapabilities::default()),
        }
    }
}

/// Text document synchronization client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentSyncClientCapabilities {
    /// Whether text document synchronization supports dynamic registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// The client supports sending will save notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub will_save: Option<bool>,

    /// The client supports sending a will save request and waits for a response
    /// providing text edits which will be applied to the document before it is saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub will_save_wait_until: Option<bool>,

    /// The client supports did save notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_save: Option<bool>,
}

impl Default for TextDocumentSyncClientCapabilities {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
            will_save: Some(false),
            will_save_wait_until: Some(false),
            did_save: Some(true),
        }
    }
}

/// Completion client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionClientCapabilities {
    /// Whether completion supports dynamic registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// The client supports the following `CompletionItem` specific capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_item: Option<CompletionItemClientCapabilities>,

    /// The client supports sending additional context information for a
    /// `textDocument/completion` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_support: Option<bool>,
}

impl Default for CompletionClientCapabilities {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
            completion_item: Some(CompletionItemClientCapabilities::default()),
            context_support: Some(true),
        }
    }
}

/// Completion item client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItemClientCapabilities {
    /// Client supports snippets as insert text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet_support: Option<bool>,

    /// Client supports commit characters on a completion item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_characters_support: Option<bool>,

    /// Client supports the following content formats for the documentation
    /// property. The order describes the preferred format of the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_format: Option<Vec<MarkupKind>>,
}

impl Default for CompletionItemClientCapabilities {
    fn default() -> Self {
        Self {
            snippet_support: Some(false),
            commit_characters_support: Some(true),
            documentation_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
        }
    }
}

/// Hover client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverClientCapabilities {
    /// Whether hover supports dynamic registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// Client supports the following content formats for the content
    /// property. The order describes the preferred format of the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_format: Option<Vec<MarkupKind>>,
}

impl Default for HoverClientCapabilities {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
            content_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
        }
    }
}

/// Capabilities of the goto-style requests (definition, declaration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// The client supports additional metadata in the form of definition links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_support: Option<bool>,
}

impl Default for GotoClientCapabilities {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
            link_support: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSymbolClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// The client supports hierarchical document symbols.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchical_document_symbol_support: Option<bool>,
}

impl Default for DocumentSymbolClientCapabilities {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
            hierarchical_document_symbol_support: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// Client supports testing for validity of rename operations before execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepare_support: Option<bool>,
}

impl Default for RenameClientCapabilities {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
            prepare_support: Some(false),
        }
    }
}

/// Semantic token client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// Which requests the client supports and might send to the server.
    pub requests: SemanticTokensClientRequests,

    /// The token types that the client supports.
    pub token_types: Vec<String>,

    /// The token modifiers that the client supports.
    pub token_modifiers: Vec<String>,

    /// The formats the client supports. Only `relative` exists today.
    pub formats: Vec<String>,
}

impl Default for SemanticTokensClientCapabilities {
    fn default() -> Self {
        const TOKEN_TYPES: &[&str] = &[
            "namespace",
            "type",
            "class",
            "enum",
            "interface",
            "struct",
            "typeParameter",
            "parameter",
            "variable",
            "property",
            "enumMember",
            "event",
            "function",
            "method",
            "macro",
            "keyword",
            "modifier",
            "comment",
            "string",
            "number",
            "regexp",
            "operator",
        ];
        const TOKEN_MODIFIERS: &[&str] = &[
            "declaration",
            "definition",
            "readonly",
            "static",
            "deprecated",
            "abstract",
            "async",
            "modification",
            "documentation",
            "defaultLibrary",
        ];

        Self {
            dynamic_registration: Some(false),
            requests: SemanticTokensClientRequests {
                range: Some(false),
                full: Some(true),
            },
            token_types: TOKEN_TYPES.iter().map(|t| t.to_string()).collect(),
            token_modifiers: TOKEN_MODIFIERS.iter().map(|m| m.to_string()).collect(),
            formats: vec!["relative".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticTokensClientRequests {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full: Option<bool>,
}

/// Pull diagnostic client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,

    /// Whether the client supports related documents for document diagnostic pulls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_document_support: Option<bool>,
}

impl Default for DiagnosticClientCapabilities {
    fn default() -> Self {
        Self {
            dynamic_registration: Some(false),
            related_document_support: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDiagnosticsClientCapabilities {
    /// Whether the clients accepts diagnostics with related information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_information: Option<bool>,

    /// Whether the client interprets the version property of the notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_support: Option<bool>,
}

impl Default for PublishDiagnosticsClientCapabilities {
    fn default() -> Self {
        Self {
            related_information: Some(true),
            version_support: Some(true),
        }
    }
}

/// Window specific client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowClientCapabilities {
    /// Whether the client supports server initiated progress using the
    /// `window/workDoneProgress/create` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_done_progress: Option<bool>,
}

impl Default for WindowClientCapabilities {
    fn default() -> Self {
        Self {
            work_done_progress: Some(true),
        }
    }
}

/// General client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralClientCapabilities {
    /// The position encodings supported by the client, in order of preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_encodings: Option<Vec<String>>,
}

impl Default for GeneralClientCapabilities {
    fn default() -> Self {
        Self {
            position_encodings: Some(vec!["utf-16".to_string()]),
        }
    }
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// The process id of the parent process that started the server.
    pub process_id: Option<u32>,

    /// Information about the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,

    /// The locale the client is currently showing the user interface in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// The rootPath of the workspace. Is null if no folder is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_path: Option<String>,

    /// The rootUri of the workspace. Is null if no folder is open.
    pub root_uri: Option<DocumentUri>,

    /// User provided initialization options, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialization_options: Option<serde_json::Value>,

    /// The capabilities provided by the client (editor or tool).
    pub capabilities: ClientCapabilities,

    /// The initial trace setting. If omitted trace is disabled ('off').
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceValue>,

    /// The workspace folders configured in the client when the server starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_folders: Option<Vec<WorkspaceFolder>>,
}

/// Information about the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// The name of the client as defined by the client.
    pub name: String,

    /// The client's version as defined by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The trace setting for the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceValue {
    /// Turn off tracing.
    #[default]
    Off,
    /// Trace messages only.
    Messages,
    /// Verbose message tracing.
    Verbose,
}

/// A workspace folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    /// The associated URI for this workspace folder.
    pub uri: DocumentUri,

    /// The name of the workspace folder.
    pub name: String,
}

/// Parameters of the `initialized` notification; always an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedParams {}

/// The initialize result returned from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// The capabilities the language server provides.
    pub capabilities: ServerCapabilities,

    /// Information about the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<ServerInfo>,
}

/// Information about the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// The name of the server as defined by the server.
    pub name: String,

    /// The server's version as defined by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The capabilities the language server provides.
///
/// Providers the session issues requests for are typed; every other field
/// the server announces is kept verbatim in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Defines how text documents are synced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_document_sync: Option<TextDocumentSyncCapability>,

    /// The server provides completion support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_provider: Option<CompletionOptions>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_help_provider: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub references_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_symbol_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_formatting_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_provider: Option<ProviderCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_tokens_provider: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_provider: Option<serde_json::Value>,

    /// Everything else the server announced, untouched.
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

/// A provider announced either as a plain boolean or as an options object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderCapability {
    Simple(bool),
    Options(serde_json::Value),
}

impl ProviderCapability {
    /// An options object counts as enabled; `false` does not.
    pub fn is_enabled(&self) -> bool {
        match self {
            ProviderCapability::Simple(enabled) => *enabled,
            ProviderCapability::Options(_) => true,
        }
    }
}

fn enabled(provider: &Option<ProviderCapability>) -> bool {
    provider.as_ref().is_some_and(ProviderCapability::is_enabled)
}

impl ServerCapabilities {
    pub fn supports_hover(&self) -> bool {
        enabled(&self.hover_provider)
    }

    pub fn supports_completion(&self) -> bool {
        self.completion_provider.is_some()
    }

    pub fn supports_definition(&self) -> bool {
        enabled(&self.definition_provider)
    }

    pub fn supports_references(&self) -> bool {
        enabled(&self.references_provider)
    }

    pub fn supports_rename(&self) -> bool {
        enabled(&self.rename_provider)
    }

    pub fn supports_formatting(&self) -> bool {
        enabled(&self.document_formatting_provider)
    }

    /// The change sync kind the server expects for `didChange`.
    pub fn sync_kind(&self) -> TextDocumentSyncKind {
        match &self.text_document_sync {
            Some(TextDocumentSyncCapability::Kind(kind)) => *kind,
            Some(TextDocumentSyncCapability::Options(options)) => {
                options.change.unwrap_or(TextDocumentSyncKind::None)
            }
            None => TextDocumentSyncKind::None,
        }
    }
}

/// Text document sync capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextDocumentSyncCapability {
    Kind(TextDocumentSyncKind),
    Options(TextDocumentSyncOptions),
}

/// Text document sync kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TextDocumentSyncKind {
    /// Documents should not be synced at all.
    None = 0,
    /// Documents are synced by always sending the full content of the document.
    Full = 1,
    /// Documents are synced by sending the full content on open, then only
    /// incremental updates.
    Incremental = 2,
}

impl Serialize for TextDocumentSyncKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for TextDocumentSyncKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        match value {
            0 => Ok(TextDocumentSyncKind::None),
            1 => Ok(TextDocumentSyncKind::Full),
            2 => Ok(TextDocumentSyncKind::Incremental),
            _ => Err(serde::de::Error::custom(format!(
                "Invalid text document sync kind: {}",
                value
            ))),
        }
    }
}

/// Text document sync options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentSyncOptions {
    /// Open and close notifications are sent to the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_close: Option<bool>,

    /// Change notifications are sent to the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<TextDocumentSyncKind>,

    /// If present save notifications are sent to the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<serde_json::Value>,
}

/// Completion options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    /// The server provides support to resolve additional information for a completion item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_provider: Option<bool>,

    /// Characters that trigger completion automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_characters: Option<Vec<String>>,

    /// The list of all possible characters that commit a completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_commit_characters: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_params_wire_names() {
        let params = InitializeParams {
            process_id: Some(42),
            client_info: None,
            locale: None,
            root_path: Some("/work/testLua".to_string()),
            root_uri: Some("file:///work/testLua/".to_string()),
            initialization_options: Some(json!({"runtime": {"version": "Lua 5.4"}})),
            capabilities: ClientCapabilities::default(),
            trace: Some(TraceValue::Verbose),
            workspace_folders: None,
        };

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["processId"], 42);
        assert_eq!(value["rootPath"], "/work/testLua");
        assert_eq!(value["rootUri"], "file:///work/testLua/");
        assert_eq!(value["trace"], "verbose");
        assert_eq!(value["initializationOptions"]["runtime"]["version"], "Lua 5.4");
        assert_eq!(
            value["capabilities"]["textDocument"]["documentSymbol"]
                ["hierarchicalDocumentSymbolSupport"],
            true
        );
        assert_eq!(
            value["capabilities"]["textDocument"]["semanticTokens"]["formats"],
            json!(["relative"])
        );
    }

    #[test]
    fn test_server_capabilities_keep_unknown_fields() {
        let value = json!({
            "textDocumentSync": {"openClose": true, "change": 2},
            "hoverProvider": true,
            "renameProvider": {"prepareProvider": true},
            "referencesProvider": false,
            "completionProvider": {"triggerCharacters": ["."]},
            "inlayHintProvider": {"resolveProvider": true}
        });

        let capabilities: ServerCapabilities = serde_json::from_value(value).unwrap();
        assert!(capabilities.supports_hover());
        assert!(capabilities.supports_rename());
        assert!(!capabilities.supports_references());
        assert!(capabilities.supports_completion());
        assert!(!capabilities.supports_definition());
        assert_eq!(capabilities.sync_kind(), TextDocumentSyncKind::Incremental);
        assert_eq!(
            capabilities.other.get("inlayHintProvider"),
            Some(&json!({"resolveProvider": true}))
        );
    }

    #[test]
    fn test_sync_kind_is_numeric() {
        let capabilities: ServerCapabilities =
            serde_json::from_value(json!({"textDocumentSync": 1})).unwrap();
        assert_eq!(capabilities.sync_kind(), TextDocumentSyncKind::Full);
        assert_eq!(
            serde_json::to_value(TextDocumentSyncKind::Incremental).unwrap(),
            json!(2)
        );
    }
}
