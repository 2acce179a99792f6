//! Common test utilities and infrastructure for lsp-session tests
//!
//! This module provides a scripted fake language server connected to a
//! session over in-memory pipes, plus sample data shared by the tests.
#![allow(dead_code)]
use lsp_session::transport::{FrameReader, FrameWriter};
use lsp_session::{types::*, Session, SessionOptions};
use serde_json::{json, Value};
use tokio::io::{duplex, DuplexStream};
use tokio::time::{timeout, Duration};

/// How long the fake server waits for the client before failing the test.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

pub type TestSession = Session<DuplexStream>;

/// The server end of a session under test.
pub struct FakeServer {
    reader: FrameReader<DuplexStream>,
    writer: FrameWriter<DuplexStream>,
}

impl FakeServer {
    /// Read the next message the client sent.
    pub async fn receive(&mut self) -> Value {
        let frame = timeout(STEP_TIMEOUT, self.reader.read_frame())
            .await
            .expect("client did not send anything in time")
            .expect("client stream failed");
        serde_json::from_slice(&frame.body).expect("client sent invalid JSON")
    }

    /// Read the next message and check it is a request for `method`.
    /// Returns its id and params.
    pub async fn expect_request(&mut self, method: &str) -> (Value, Value) {
        let message = self.receive().await;
        assert_eq!(message["method"], method, "unexpected message {}", message);
        assert!(message.get("id").is_some(), "{} is not a request", message);
        (message["id"].clone(), message["params"].clone())
    }

    /// Read the next message and check it is a notification for `method`.
    /// Returns its params.
    pub async fn expect_notification(&mut self, method: &str) -> Value {
        let message = self.receive().await;
        assert_eq!(message["method"], method, "unexpected message {}", message);
        assert!(message.get("id").is_none(), "{} is not a notification", message);
        message["params"].clone()
    }

    /// Write a raw JSON value as one frame.
    pub async fn send(&mut self, message: Value) {
        let body = serde_json::to_vec(&message).unwrap();
        self.writer.write_frame(&body).await.unwrap();
    }

    pub async fn respond(&mut self, id: Value, result: Value) {
        self.send(json!({"jsonrpc": "2.0", "id": id, "result": result}))
            .await;
    }

    pub async fn respond_error(&mut self, id: Value, code: i32, message: &str) {
        self.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
        .await;
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.send(json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await;
    }

    pub async fn request(&mut self, id: Value, method: &str, params: Value) {
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
    }

    /// Answer the initialize handshake with `capabilities`.
    pub async fn accept_initialize(&mut self, capabilities: Value) -> Value {
        let (id, params) = self.expect_request("initialize").await;
        self.respond(
            id,
            json!({
                "capabilities": capabilities,
                "serverInfo": {"name": "fake-server", "version": "0.1"}
            }),
        )
        .await;
        self.expect_notification("initialized").await;
        params
    }

    /// Answer the shutdown request and wait for exit.
    pub async fn accept_shutdown(&mut self) {
        let (id, _) = self.expect_request("shutdown").await;
        self.respond(id, Value::Null).await;
        self.expect_notification("exit").await;
    }
}

/// Connect a fresh, uninitialized session to a fake server.
pub fn connect(options: SessionOptions) -> (TestSession, FakeServer) {
    let (client_read, server_write) = duplex(64 * 1024);
    let (server_read, client_write) = duplex(64 * 1024);

    let session = Session::new(client_read, client_write, options);
    let server = FakeServer {
        reader: FrameReader::new(server_read),
        writer: FrameWriter::new(server_write),
    };
    (session, server)
}

/// Connect and run the initialize handshake.
pub async fn ready_session(options: SessionOptions) -> (TestSession, FakeServer) {
    let (session, mut server) = connect(options);
    let (result, _) = tokio::join!(
        session.initialize(),
        server.accept_initialize(sample_capabilities())
    );
    result.expect("initialize failed");
    (session, server)
}

/// Capabilities of a typical server with incremental sync.
pub fn sample_capabilities() -> Value {
    json!({
        "textDocumentSync": 2,
        "hoverProvider": true,
        "completionProvider": {"triggerCharacters": [".", ":"]},
        "definitionProvider": true,
        "documentSymbolProvider": true,
        "semanticTokensProvider": {
            "legend": {"tokenTypes": ["variable"], "tokenModifiers": []},
            "full": true
        },
        "experimental": {"fancy": true}
    })
}

pub const MAIN_URI: &str = "file:///work/project/main.lua";

/// Create a range for testing
pub fn test_range() -> Range {
    Range::new(Position::new(0, 0), Position::new(0, 5))
}

/// Create a diagnostic for testing
pub fn test_diagnostic() -> Diagnostic {
    Diagnostic {
        range: test_range(),
        severity: Some(DiagnosticSeverity::Error),
        code: Some(DiagnosticCode::String("E001".to_string())),
        code_description: None,
        source: Some("test".to_string()),
        message: "Test diagnostic message".to_string(),
        tags: None,
        related_information: None,
        data: None,
    }
}

/// Assert that two JSON values are equivalent, ignoring field order
pub fn assert_json_eq(expected: &str, actual: &str) {
    let expected: Value = serde_json::from_str(expected).expect("Expected JSON should be valid");
    let actual: Value = serde_json::from_str(actual).expect("Actual JSON should be valid");
    assert_eq!(expected, actual, "JSON values should be equal");
}
