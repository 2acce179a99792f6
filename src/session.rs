//! The LSP session: one negotiated connection to a language server.
//!
//! A [`Session`] owns both halves of the byte stream. Creating it spawns the
//! inbound loop; [`Session::initialize`] performs the handshake, after which
//! requests, notifications and document synchronization are available until
//! [`Session::shutdown`] or a transport failure ends the session.

use crate::dispatcher::{Connection, Dispatcher};
use crate::documents::{DocumentState, DocumentStore};
use crate::error::{LspError, Result};
use crate::lifecycle::SessionState;
use crate::options::SessionOptions;
use crate::pending::PendingRequest;
use crate::transport::{FrameReader, FrameWriter, Transport};
use crate::types::methods::{self, Notification, Request};
use crate::types::{
    CancelParams, DocumentUri, Id, InitializeResult, InitializedParams, NotificationMessage,
    RequestMessage, RpcMessage, ServerCapabilities, TextDocumentContentChangeEvent,
    JSONRPC_VERSION,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Terminates the session if dropped while still armed.
struct AbandonGuard<'a, W> {
    connection: Option<&'a Connection<W>>,
}

impl<'a, W> AbandonGuard<'a, W> {
    fn new(connection: &'a Connection<W>) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    fn disarm(mut self) {
        self.connection = None;
    }
}

impl<W> Drop for AbandonGuard<'_, W> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            log::warn!("Initialize abandoned before the server answered");
            connection.fail();
        }
    }
}

/// A client session with one language server.
pub struct Session<W> {
    connection: Arc<Connection<W>>,
    documents: Mutex<DocumentStore>,
    options: SessionOptions,
    reader_task: JoinHandle<()>,
}

impl<W> Session<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Start a session over `reader` (the server's stdout) and `writer` (its
    /// stdin). Must be called from within a tokio runtime.
    pub fn new<R>(reader: R, writer: W, options: SessionOptions) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::from_transport(Transport::new(reader, writer), options)
    }

    pub fn from_transport<R>(transport: Transport<R, W>, options: SessionOptions) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (reader, writer) = transport.into_split();
        Self::from_parts(reader, writer, options)
    }

    fn from_parts<R>(reader: FrameReader<R>, writer: FrameWriter<W>, options: SessionOptions) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let connection = Arc::new(Connection::new(writer));
        let handlers = Arc::new(options.handlers.clone());
        let reader_task = Dispatcher::new(reader, Arc::clone(&connection), handlers).spawn();

        Self {
            connection,
            documents: Mutex::new(DocumentStore::new()),
            options,
            reader_task,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.connection.lifecycle().state()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.connection.lifecycle().subscribe()
    }

    /// Resolves once the session has terminated.
    pub async fn closed(&self) {
        let mut state = self.subscribe_state();
        // The sender lives as long as `self`, so this only returns on Terminated.
        let _ = state
            .wait_for(|state| *state == SessionState::Terminated)
            .await;
    }

    /// What the server answered to `initialize`, once it has.
    pub fn initialize_result(&self) -> Option<&InitializeResult> {
        self.connection.lifecycle().initialize_result()
    }

    pub fn server_capabilities(&self) -> Option<&ServerCapabilities> {
        self.initialize_result().map(|result| &result.capabilities)
    }

    /// Number of requests still waiting for a response.
    pub fn pending_request_count(&self) -> usize {
        self.connection.pending().len()
    }

    /// Perform the initialize handshake.
    ///
    /// Sends `initialize` built from the session options, records the
    /// result, sends `initialized` and moves the session to `Ready`. Any
    /// failure terminates the session.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let lifecycle = self.connection.lifecycle();
        lifecycle.begin_initialize()?;

        let guard = AbandonGuard::new(&*self.connection);
        let outcome = self.handshake().await;
        guard.disarm();

        match outcome {
            Ok(result) => {
                lifecycle.finish_initialize(result.clone())?;
                Ok(result)
            }
            Err(e) => {
                log::error!("Initialize failed: {}", e);
                self.connection.fail();
                Err(match e {
                    LspError::InitializationFailed(_) => e,
                    other => LspError::InitializationFailed(other.to_string()),
                })
            }
        }
    }

    async fn handshake(&self) -> Result<InitializeResult> {
        let params = to_params(self.options.initialize_params()?)?;
        let pending = self.start(methods::Initialize::METHOD, params).await?;

        let value = match self.options.initialize_timeout {
            Some(limit) => self.await_with_timeout(pending, limit).await?,
            None => pending.await?,
        };

        let result: InitializeResult = serde_json::from_value(value).map_err(|e| {
            LspError::InitializationFailed(format!("Invalid initialize result: {}", e))
        })?;

        self.emit(methods::Initialized::METHOD, to_params(InitializedParams {})?)
            .await?;
        Ok(result)
    }

    /// Shut the server down: `shutdown`, then `exit`, then close the stream.
    ///
    /// Calling it again, or after the session terminated, does nothing.
    /// Before initialize it only sends `exit`.
    pub async fn shutdown(&self) -> Result<()> {
        let lifecycle = self.connection.lifecycle();

        if lifecycle.state() == SessionState::Uninitialized {
            self.exit().await;
            return Ok(());
        }

        if !lifecycle.begin_shutdown()? {
            return Ok(());
        }

        let acknowledged = match self.call(methods::Shutdown::METHOD, None).await {
            Ok(_) | Err(LspError::ConnectionClosed) => Ok(()),
            Err(e) => {
                log::warn!("LSP shutdown request failed: {}", e);
                Err(e)
            }
        };

        self.exit().await;
        acknowledged
    }

    /// Send `exit`, close the write half and terminate.
    async fn exit(&self) {
        if let Err(e) = self.emit(methods::Exit::METHOD, None).await {
            log::debug!("Could not send exit: {}", e);
        }
        if let Err(e) = self.connection.close_writer().await {
            log::debug!("Could not close the server's input: {}", e);
        }
        self.connection.fail();
    }

    /// Send a request and wait for its result.
    pub async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.connection.lifecycle().ensure_ready()?;
        self.call(method, params).await
    }

    /// Send a notification.
    pub async fn send_notification(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.connection.lifecycle().ensure_ready()?;
        self.emit(method, params).await
    }

    /// Send a typed request.
    pub async fn request<R: Request>(&self, params: R::Params) -> Result<R::Result> {
        let value = self.send_request(R::METHOD, to_params(params)?).await?;
        from_result(value)
    }

    /// Send a typed notification.
    pub async fn notify<N: Notification>(&self, params: N::Params) -> Result<()> {
        self.send_notification(N::METHOD, to_params(params)?).await
    }

    /// Send a request without waiting; the returned future yields its result
    /// and exposes the id for [`Session::cancel`]. Dropping it forgets the
    /// request locally without notifying the server.
    pub async fn start_request(&self, method: &str, params: Option<Value>) -> Result<PendingRequest> {
        self.connection.lifecycle().ensure_ready()?;
        self.start(method, params).await
    }

    /// Cancel an outstanding request.
    ///
    /// Its future completes with [`LspError::Cancelled`] right away and the
    /// server is sent `$/cancelRequest`. A late response is dropped.
    pub async fn cancel(&self, id: &Id) -> Result<()> {
        if !self.connection.pending().cancel(id) {
            log::debug!("Request {} is no longer pending", id);
            return Ok(());
        }

        if self.state() == SessionState::Ready {
            let params = to_params(CancelParams { id: id.clone() })?;
            if let Err(e) = self.emit(methods::Cancel::METHOD, params).await {
                log::warn!("Failed to send cancellation for {}: {}", id, e);
            }
        }
        Ok(())
    }

    /// Send a typed request, cancelling it if no answer arrives in time.
    pub async fn request_with_timeout<R: Request>(
        &self,
        params: R::Params,
        limit: Duration,
    ) -> Result<R::Result> {
        let pending = self.start_request(R::METHOD, to_params(params)?).await?;
        let value = self.await_with_timeout(pending, limit).await?;
        from_result(value)
    }

    async fn await_with_timeout(&self, mut pending: PendingRequest, limit: Duration) -> Result<Value> {
        match tokio::time::timeout(limit, &mut pending).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!("Request {} timed out after {:?}", pending.id(), limit);
                self.cancel(pending.id()).await?;
                Err(LspError::Timeout)
            }
        }
    }

    /// Open a document at version 1, or after its last version when it was
    /// open before.
    pub async fn open_document(
        &self,
        uri: impl Into<DocumentUri>,
        language_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<i32> {
        self.open(uri.into(), language_id.into(), None, text.into())
            .await
    }

    /// Open a document at an explicit version.
    pub async fn open_document_with_version(
        &self,
        uri: impl Into<DocumentUri>,
        language_id: impl Into<String>,
        version: i32,
        text: impl Into<String>,
    ) -> Result<i32> {
        self.open(uri.into(), language_id.into(), Some(version), text.into())
            .await
    }

    async fn open(
        &self,
        uri: DocumentUri,
        language_id: String,
        version: Option<i32>,
        text: String,
    ) -> Result<i32> {
        self.connection.lifecycle().ensure_ready()?;
        let mut documents = self.documents.lock().await;
        let params = documents.open(uri, language_id, version, text)?;
        let version = params.text_document.version;
        self.emit_typed::<methods::DidOpenTextDocument>(params).await?;
        Ok(version)
    }

    /// Send content changes; returns the new version.
    pub async fn change_document(
        &self,
        uri: &str,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> Result<i32> {
        self.connection.lifecycle().ensure_ready()?;
        let mut documents = self.documents.lock().await;
        let params = documents.change(uri, changes)?;
        let version = params.text_document.version;
        self.emit_typed::<methods::DidChangeTextDocument>(params).await?;
        Ok(version)
    }

    pub async fn save_document(&self, uri: &str, text: Option<String>) -> Result<()> {
        self.connection.lifecycle().ensure_ready()?;
        let mut documents = self.documents.lock().await;
        let params = documents.save(uri, text)?;
        self.emit_typed::<methods::DidSaveTextDocument>(params).await
    }

    pub async fn close_document(&self, uri: &str) -> Result<()> {
        self.connection.lifecycle().ensure_ready()?;
        let mut documents = self.documents.lock().await;
        let params = documents.close(uri)?;
        self.emit_typed::<methods::DidCloseTextDocument>(params).await
    }

    /// What the session knows about a document, open or closed.
    pub async fn document(&self, uri: &str) -> Option<DocumentState> {
        self.documents.lock().await.get(uri).cloned()
    }

    /// Register a waiter and write the request. Not gated on state.
    async fn start(&self, method: &str, params: Option<Value>) -> Result<PendingRequest> {
        let pending = self.connection.pending();
        let id = pending.next_id();
        let waiter = pending.register(id.clone(), method)?;

        let request = RequestMessage {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.clone(),
            method: method.to_string(),
            params,
        };
        if let Err(e) = self.connection.send(&RpcMessage::Request(request)).await {
            pending.reject(&id, LspError::ConnectionClosed);
            return Err(e);
        }
        Ok(waiter)
    }

    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.start(method, params).await?.await
    }

    async fn emit(&self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = NotificationMessage {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        };
        self.connection
            .send(&RpcMessage::Notification(notification))
            .await
    }

    async fn emit_typed<N: Notification>(&self, params: N::Params) -> Result<()> {
        self.emit(N::METHOD, to_params(params)?).await
    }
}

impl<W> Drop for Session<W> {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Serialize params; `null` means the message carries none.
fn to_params<P: Serialize>(params: P) -> Result<Option<Value>> {
    match serde_json::to_value(params)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

fn from_result<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}
