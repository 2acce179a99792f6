//! Integration tests for the session
//!
//! These tests drive a session against a scripted fake server: the
//! initialize/shutdown lifecycle, request correlation, cancellation,
//! server-initiated traffic and document synchronization.

mod common;

use common::*;
use lsp_session::types::methods;
use lsp_session::{types::*, LspError, SessionOptions, SessionState};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

#[tokio::test]
async fn test_happy_path_lifecycle() {
    let (session, mut server) = connect(SessionOptions::new().with_root_path("/work/project"));
    assert_eq!(session.state(), SessionState::Uninitialized);

    let (result, init_params) = tokio::join!(
        session.initialize(),
        server.accept_initialize(sample_capabilities())
    );
    let result = result.unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(result.server_info.map(|info| info.name).as_deref(), Some("fake-server"));

    assert_eq!(init_params["processId"], std::process::id());
    assert_eq!(init_params["clientInfo"]["name"], "lsp-session");
    assert_eq!(init_params["trace"], "off");
    assert!(init_params["capabilities"]["textDocument"].is_object());
    #[cfg(unix)]
    assert_eq!(init_params["rootUri"], "file:///work/project/");

    let capabilities = session.server_capabilities().unwrap();
    assert!(capabilities.supports_hover());
    assert!(capabilities.supports_completion());
    assert!(!capabilities.supports_rename());
    assert_eq!(capabilities.sync_kind(), TextDocumentSyncKind::Incremental);
    assert_eq!(capabilities.other["experimental"], json!({"fancy": true}));

    let (version, opened) = tokio::join!(
        session.open_document(MAIN_URI, "lua", "local x = 1"),
        server.expect_notification("textDocument/didOpen")
    );
    assert_eq!(version.unwrap(), 1);
    assert_eq!(opened["textDocument"]["version"], 1);
    assert_eq!(opened["textDocument"]["languageId"], "lua");
    assert_eq!(opened["textDocument"]["text"], "local x = 1");

    let completion = async {
        let (id, params) = server.expect_request("textDocument/completion").await;
        assert_eq!(params["position"], json!({"line": 0, "character": 6}));
        server
            .respond(id, json!([{"label": "x"}, {"label": "xpcall", "kind": 3}]))
            .await;
    };
    let (items, _) = tokio::join!(session.completion(MAIN_URI, Position::new(0, 6)), completion);
    let labels: Vec<String> = items.unwrap().into_iter().map(|item| item.label).collect();
    assert_eq!(labels, vec!["x", "xpcall"]);

    let (shutdown, _) = tokio::join!(session.shutdown(), server.accept_shutdown());
    shutdown.unwrap();
    assert_eq!(session.state(), SessionState::Terminated);

    assert!(matches!(
        session.completion(MAIN_URI, Position::new(0, 6)).await,
        Err(LspError::NotReady(SessionState::Terminated))
    ));
    // A second shutdown is a no-op.
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_abrupt_close_fails_all_pending() {
    let (session, server) = ready_session(SessionOptions::new()).await;

    let first = session
        .start_request("textDocument/completion", Some(json!({})))
        .await
        .unwrap();
    let second = session
        .start_request("textDocument/hover", Some(json!({})))
        .await
        .unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(session.pending_request_count(), 2);

    drop(server);

    assert!(matches!(first.await, Err(LspError::ConnectionClosed)));
    assert!(matches!(second.await, Err(LspError::ConnectionClosed)));
    timeout(STEP_TIMEOUT, session.closed()).await.unwrap();
    assert_eq!(session.state(), SessionState::Terminated);
    assert_eq!(session.pending_request_count(), 0);
}

#[tokio::test]
async fn test_unknown_response_id_is_ignored() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let script = async {
        let (id, _) = server.expect_request("custom/echo").await;
        server.respond(json!(999), json!("stray")).await;
        server.respond(id, json!({"echo": true})).await;
    };
    let (result, _) = tokio::join!(
        session.send_request("custom/echo", Some(json!({"x": 1}))),
        script
    );

    assert_eq!(result.unwrap(), json!({"echo": true}));
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_unknown_notification_is_dropped() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    server.notify("custom/somethingHappened", json!({"a": 1})).await;
    server
        .notify("window/logMessage", json!({"type": 3, "message": "indexing"}))
        .await;

    let script = async {
        let (id, _) = server.expect_request("custom/ping").await;
        server.respond(id, Value::Null).await;
    };
    let (result, _) = tokio::join!(session.send_request("custom/ping", None), script);

    assert_eq!(result.unwrap(), Value::Null);
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_error_response_surfaces_code() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let script = async {
        let (id, _) = server.expect_request("textDocument/rename").await;
        server.respond_error(id, -32803, "cannot rename here").await;
    };
    let (result, _) = tokio::join!(
        session.rename(MAIN_URI, Position::new(1, 1), "y"),
        script
    );

    match result {
        Err(LspError::Response(error)) => {
            assert_eq!(error.code, -32803);
            assert_eq!(error.message, "cannot rename here");
        }
        other => panic!("expected an error response, got {:?}", other),
    }
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_cancel_sends_cancel_request_and_drops_late_response() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let pending = session
        .start_request("textDocument/semanticTokens/full", Some(json!({})))
        .await
        .unwrap();
    let id = pending.id().clone();
    let (request_id, _) = server
        .expect_request("textDocument/semanticTokens/full")
        .await;

    session.cancel(&id).await.unwrap();
    assert!(matches!(pending.await, Err(LspError::Cancelled(cancelled)) if cancelled == id));

    let cancel = server.expect_notification("$/cancelRequest").await;
    assert_eq!(cancel["id"], request_id);

    // The late answer must not disturb anything.
    server.respond(request_id, json!({"data": []})).await;
    let script = async {
        let (id, _) = server.expect_request("custom/after").await;
        server.respond(id, json!(1)).await;
    };
    let (result, _) = tokio::join!(session.send_request("custom/after", None), script);
    assert_eq!(result.unwrap(), json!(1));

    // Cancelling something already finished does nothing.
    session.cancel(&id).await.unwrap();
}

#[tokio::test]
async fn test_request_with_timeout_cancels() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let params = HoverParams {
        text_document_position: TextDocumentPositionParams::new(MAIN_URI, Position::new(0, 0)),
        work_done_progress_params: WorkDoneProgressParams::default(),
    };
    let script = async {
        let (id, _) = server.expect_request("textDocument/hover").await;
        let cancel = server.expect_notification("$/cancelRequest").await;
        assert_eq!(cancel["id"], id);
    };
    let (result, _) = tokio::join!(
        session.request_with_timeout::<methods::HoverRequest>(params, Duration::from_millis(50)),
        script
    );

    assert!(matches!(result, Err(LspError::Timeout)));
    assert_eq!(session.pending_request_count(), 0);
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_abandoned_requests_leave_no_waiters() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (abandoned, (id, _)) = tokio::join!(
            timeout(
                Duration::from_millis(20),
                session.send_request("custom/slow", None)
            ),
            server.expect_request("custom/slow")
        );
        assert!(abandoned.is_err());
        ids.push(id);
    }
    assert_eq!(session.pending_request_count(), 0);

    // An answer to an abandoned id is dropped and later traffic still flows.
    server.respond(ids[0].clone(), json!("late")).await;
    let script = async {
        let (id, _) = server.expect_request("custom/ping").await;
        server.respond(id, json!("pong")).await;
    };
    let (result, _) = tokio::join!(session.send_request("custom/ping", None), script);
    assert_eq!(result.unwrap(), json!("pong"));
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_dropped_start_request_is_forgotten() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let (pending, _) = tokio::join!(
        session.start_request("custom/slow", None),
        server.expect_request("custom/slow")
    );
    let pending = pending.unwrap();
    assert_eq!(session.pending_request_count(), 1);

    drop(pending);
    assert_eq!(session.pending_request_count(), 0);
}

#[tokio::test]
async fn test_not_ready_before_initialize() {
    let (session, _server) = connect(SessionOptions::new());

    assert!(matches!(
        session.send_notification("custom/note", None).await,
        Err(LspError::NotReady(SessionState::Uninitialized))
    ));
    assert!(matches!(
        session.completion(MAIN_URI, Position::new(0, 0)).await,
        Err(LspError::NotReady(SessionState::Uninitialized))
    ));
    assert!(session.initialize_result().is_none());
}

#[tokio::test]
async fn test_initialize_twice_is_rejected() {
    let (session, _server) = ready_session(SessionOptions::new()).await;
    assert!(matches!(
        session.initialize().await,
        Err(LspError::AlreadyInitialized)
    ));
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_initialize_error_terminates() {
    let (session, mut server) = connect(SessionOptions::new());

    let script = async {
        let (id, _) = server.expect_request("initialize").await;
        server.respond_error(id, -32603, "no workspace").await;
    };
    let (result, _) = tokio::join!(session.initialize(), script);

    assert!(matches!(result, Err(LspError::InitializationFailed(_))));
    assert_eq!(session.state(), SessionState::Terminated);
}

#[tokio::test]
async fn test_initialize_timeout() {
    let options = SessionOptions::new().with_initialize_timeout(Duration::from_millis(50));
    let (session, mut server) = connect(options);

    let (result, _) = tokio::join!(session.initialize(), server.expect_request("initialize"));

    assert!(matches!(result, Err(LspError::InitializationFailed(_))));
    assert_eq!(session.state(), SessionState::Terminated);
}

#[tokio::test]
async fn test_abandoned_initialize_terminates() {
    let (session, mut server) = connect(SessionOptions::new());

    let (abandoned, _) = tokio::join!(
        timeout(Duration::from_millis(30), session.initialize()),
        server.expect_request("initialize")
    );
    assert!(abandoned.is_err());
    assert_eq!(session.state(), SessionState::Terminated);
    assert_eq!(session.pending_request_count(), 0);

    // Shutdown on a terminated session is a no-op rather than NotReady.
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_before_initialize_only_exits() {
    let (session, mut server) = connect(SessionOptions::new());

    let (result, exit) = tokio::join!(session.shutdown(), server.receive());
    result.unwrap();
    assert_eq!(exit["method"], "exit");
    assert_eq!(session.state(), SessionState::Terminated);
}

#[tokio::test]
async fn test_default_handlers_answer_server_requests() {
    let (_session, mut server) = ready_session(SessionOptions::new()).await;

    server
        .request(
            json!("cfg-1"),
            "workspace/configuration",
            json!({"items": [{"section": "Lua"}, {"section": "files.associations"}]}),
        )
        .await;
    let answer = server.receive().await;
    assert_eq!(answer["id"], "cfg-1");
    assert_eq!(answer["result"], json!([null, null]));

    server
        .request(
            json!(7),
            "client/registerCapability",
            json!({"registrations": [{"id": "r1", "method": "workspace/didChangeWatchedFiles"}]}),
        )
        .await;
    let answer = server.receive().await;
    assert_eq!(answer["id"], 7);
    assert_eq!(answer["result"], Value::Null);

    server.request(json!(8), "custom/unknown", json!({})).await;
    let answer = server.receive().await;
    assert_eq!(answer["error"]["code"], -32601);
}

#[tokio::test]
async fn test_custom_handlers() {
    let (diagnostics_tx, mut diagnostics_rx) = mpsc::unbounded_channel();

    let mut options = SessionOptions::new();
    let handlers = options.handlers_mut();
    handlers.remove("workspace/configuration");
    handlers
        .on_request_typed::<methods::WorkspaceConfiguration, _, _>(
            |params: ConfigurationParams| async move {
                Ok(params
                    .items
                    .iter()
                    .map(|_| json!({"enable": true}))
                    .collect())
            },
        )
        .unwrap();
    handlers
        .on_notification_typed::<methods::PublishDiagnostics, _>(
            move |params: PublishDiagnosticsParams| {
                let _ = diagnostics_tx.send(params);
            },
        )
        .unwrap();

    let (_session, mut server) = ready_session(options).await;

    server
        .notify(
            "textDocument/publishDiagnostics",
            json!({"uri": MAIN_URI, "diagnostics": [test_diagnostic()]}),
        )
        .await;
    let published = timeout(STEP_TIMEOUT, diagnostics_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(published.uri, MAIN_URI);
    assert_eq!(published.diagnostics, vec![test_diagnostic()]);

    server
        .request(json!(1), "workspace/configuration", json!({"items": [{}]}))
        .await;
    let answer = server.receive().await;
    assert_eq!(answer["result"], json!([{"enable": true}]));
}

#[tokio::test]
async fn test_document_versions() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let (version, _) = tokio::join!(
        session.open_document(MAIN_URI, "lua", "local x"),
        server.expect_notification("textDocument/didOpen")
    );
    assert_eq!(version.unwrap(), 1);

    assert!(matches!(
        session.open_document(MAIN_URI, "lua", "").await,
        Err(LspError::AlreadyOpen(_))
    ));

    let change = TextDocumentContentChangeEvent::incremental(Range::from_coords(0, 6, 0, 7), "y");
    let (version, changed) = tokio::join!(
        session.change_document(MAIN_URI, vec![change]),
        server.expect_notification("textDocument/didChange")
    );
    assert_eq!(version.unwrap(), 2);
    assert_eq!(changed["textDocument"], json!({"uri": MAIN_URI, "version": 2}));
    assert_eq!(changed["contentChanges"][0]["text"], "y");

    let (saved, save) = tokio::join!(
        session.save_document(MAIN_URI, Some("local y".to_string())),
        server.expect_notification("textDocument/didSave")
    );
    saved.unwrap();
    assert_eq!(save["text"], "local y");

    let (closed, _) = tokio::join!(
        session.close_document(MAIN_URI),
        server.expect_notification("textDocument/didClose")
    );
    closed.unwrap();

    assert!(matches!(
        session.change_document(MAIN_URI, vec![]).await,
        Err(LspError::NotOpen(_))
    ));
    assert!(matches!(
        session.close_document(MAIN_URI).await,
        Err(LspError::NotOpen(_))
    ));
    assert!(matches!(
        session
            .open_document_with_version(MAIN_URI, "lua", 2, "")
            .await,
        Err(LspError::StaleVersion { version: 2, current: 2, .. })
    ));

    let (version, reopened) = tokio::join!(
        session.open_document(MAIN_URI, "lua", "local z"),
        server.expect_notification("textDocument/didOpen")
    );
    assert_eq!(version.unwrap(), 3);
    assert_eq!(reopened["textDocument"]["version"], 3);

    let state = session.document(MAIN_URI).await.unwrap();
    assert!(state.is_open);
    assert_eq!(state.version, 3);
}

#[tokio::test]
async fn test_typed_feature_requests() {
    let (session, mut server) = ready_session(SessionOptions::new()).await;

    let script = async {
        let (id, params) = server.expect_request("textDocument/completion").await;
        assert_eq!(params["textDocument"]["uri"], MAIN_URI);
        server
            .respond(
                id,
                json!({"isIncomplete": false, "items": [{"label": "print", "kind": 3}]}),
            )
            .await;
    };
    let (items, _) = tokio::join!(session.completion(MAIN_URI, Position::new(2, 3)), script);
    let items = items.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "print");
    assert_eq!(items[0].kind, Some(CompletionItemKind::FUNCTION));

    let script = async {
        let (id, params) = server.expect_request("textDocument/hover").await;
        assert_eq!(params["position"], json!({"line": 0, "character": 6}));
        server
            .respond(id, json!({"contents": {"kind": "markdown", "value": "**x**: integer"}}))
            .await;
    };
    let (hover, _) = tokio::join!(session.hover(MAIN_URI, Position::new(0, 6)), script);
    match hover.unwrap().map(|hover| hover.contents) {
        Some(HoverContents::Markup(markup)) => assert_eq!(markup.value, "**x**: integer"),
        other => panic!("unexpected hover: {:?}", other),
    }

    let script = async {
        let (id, _) = server.expect_request("textDocument/definition").await;
        server
            .respond(
                id,
                json!([{
                    "targetUri": "file:///work/project/lib.lua",
                    "targetRange": {"start": {"line": 3, "character": 0}, "end": {"line": 9, "character": 3}},
                    "targetSelectionRange": {"start": {"line": 3, "character": 9}, "end": {"line": 3, "character": 12}}
                }]),
            )
            .await;
    };
    let (locations, _) = tokio::join!(session.definition(MAIN_URI, Position::new(2, 3)), script);
    assert_eq!(
        locations.unwrap(),
        vec![Location::new(
            "file:///work/project/lib.lua",
            Range::from_coords(3, 9, 3, 12)
        )]
    );

    let script = async {
        let (id, params) = server.expect_request("textDocument/references").await;
        assert_eq!(params["context"]["includeDeclaration"], true);
        server.respond(id, Value::Null).await;
    };
    let (references, _) = tokio::join!(
        session.references(MAIN_URI, Position::new(0, 6), true),
        script
    );
    assert!(references.unwrap().is_empty());

    let script = async {
        let (id, params) = server.expect_request("textDocument/diagnostic").await;
        assert_eq!(params["previousResultId"], "r1");
        server
            .respond(id, json!({"kind": "unchanged", "resultId": "r1"}))
            .await;
    };
    let (report, _) = tokio::join!(
        session.document_diagnostic(MAIN_URI, Some("r1".to_string())),
        script
    );
    assert!(matches!(
        report.unwrap(),
        DocumentDiagnosticReport::Unchanged(ref unchanged) if unchanged.result_id == "r1"
    ));
}
