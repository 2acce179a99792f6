//! Typed method markers.
//!
//! Each marker ties a method name to its params and result types so the
//! session can offer `request::<R>()` and `notify::<N>()`, and handlers can be
//! registered with typed params. Methods without a marker stay reachable
//! through the raw `serde_json::Value` calls.

use crate::types::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A request: a method that expects a response.
pub trait Request {
    type Params: DeserializeOwned + Serialize + Send + 'static;
    type Result: DeserializeOwned + Serialize + Send + 'static;
    const METHOD: &'static str;
}

/// A notification: a method that never gets a response.
pub trait Notification {
    type Params: DeserializeOwned + Serialize + Send + 'static;
    const METHOD: &'static str;
}

macro_rules! request {
    ($(#[$meta:meta])* $name:ident, $method:literal, $params:ty, $result:ty) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $name {}

        impl Request for $name {
            type Params = $params;
            type Result = $result;
            const METHOD: &'static str = $method;
        }
    };
}

macro_rules! notification {
    ($(#[$meta:meta])* $name:ident, $method:literal, $params:ty) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $name {}

        impl Notification for $name {
            type Params = $params;
            const METHOD: &'static str = $method;
        }
    };
}

// Lifecycle
request!(Initialize, "initialize", InitializeParams, InitializeResult);
request!(
    /// Params and result are both `null` on the wire.
    Shutdown,
    "shutdown",
    (),
    ()
);
notification!(Initialized, "initialized", InitializedParams);
notification!(Exit, "exit", ());

// Client to server requests
request!(
    Completion,
    "textDocument/completion",
    CompletionParams,
    Option<CompletionResponse>
);
request!(
    SignatureHelpRequest,
    "textDocument/signatureHelp",
    SignatureHelpParams,
    Option<SignatureHelp>
);
request!(HoverRequest, "textDocument/hover", HoverParams, Option<Hover>);
request!(
    GotoDefinition,
    "textDocument/definition",
    DefinitionParams,
    Option<GotoResponse>
);
request!(
    GotoDeclaration,
    "textDocument/declaration",
    DeclarationParams,
    Option<GotoResponse>
);
request!(
    References,
    "textDocument/references",
    ReferenceParams,
    Option<Vec<Location>>
);
request!(
    DocumentSymbolRequest,
    "textDocument/documentSymbol",
    DocumentSymbolParams,
    Option<DocumentSymbolResponse>
);
request!(
    Formatting,
    "textDocument/formatting",
    DocumentFormattingParams,
    Option<Vec<TextEdit>>
);
request!(
    Rename,
    "textDocument/rename",
    RenameParams,
    Option<WorkspaceEdit>
);
request!(
    ColorPresentationRequest,
    "textDocument/colorPresentation",
    ColorPresentationParams,
    Vec<ColorPresentation>
);
request!(
    DocumentColor,
    "textDocument/documentColor",
    DocumentColorParams,
    Vec<ColorInformation>
);
request!(
    SemanticTokensFull,
    "textDocument/semanticTokens/full",
    SemanticTokensParams,
    Option<SemanticTokens>
);
request!(
    DocumentDiagnostic,
    "textDocument/diagnostic",
    DocumentDiagnosticParams,
    DocumentDiagnosticReport
);

// Client to server notifications
notification!(
    DidOpenTextDocument,
    "textDocument/didOpen",
    DidOpenTextDocumentParams
);
notification!(
    DidChangeTextDocument,
    "textDocument/didChange",
    DidChangeTextDocumentParams
);
notification!(
    DidSaveTextDocument,
    "textDocument/didSave",
    DidSaveTextDocumentParams
);
notification!(
    DidCloseTextDocument,
    "textDocument/didClose",
    DidCloseTextDocumentParams
);
notification!(Cancel, "$/cancelRequest", CancelParams);
notification!(SetTrace, "$/setTrace", SetTraceParams);

// Server to client requests
request!(
    WorkDoneProgressCreate,
    "window/workDoneProgress/create",
    WorkDoneProgressCreateParams,
    ()
);
request!(
    RegisterCapability,
    "client/registerCapability",
    RegistrationParams,
    ()
);
request!(
    UnregisterCapability,
    "client/unregisterCapability",
    UnregistrationParams,
    ()
);
request!(
    /// One result per requested item, in order; `null` when unknown.
    WorkspaceConfiguration,
    "workspace/configuration",
    ConfigurationParams,
    Vec<serde_json::Value>
);
request!(
    ShowMessageRequest,
    "window/showMessageRequest",
    ShowMessageRequestParams,
    Option<MessageActionItem>
);

// Server to client notifications
notification!(LogMessage, "window/logMessage", LogMessageParams);
notification!(ShowMessage, "window/showMessage", ShowMessageParams);
notification!(LogTrace, "$/logTrace", LogTraceParams);
notification!(
    PublishDiagnostics,
    "textDocument/publishDiagnostics",
    PublishDiagnosticsParams
);
notification!(Progress, "$/progress", ProgressParams<serde_json::Value>);
