//! Inbound message loop and the shared outbound gate.
//!
//! A session runs one [`Dispatcher`] task. It reads frames until the stream
//! fails, resolving responses through the correlation table and routing
//! server requests and notifications to the handler registry. Everything the
//! client writes, from any task, goes through the [`Connection`].

use crate::codec;
use crate::error::{LspError, ResponseError, Result};
use crate::handlers::{HandlerEntry, HandlerRegistry};
use crate::lifecycle::{Lifecycle, SessionState};
use crate::pending::PendingCalls;
use crate::transport::{FrameReader, FrameWriter};
use crate::types::{NotificationMessage, RequestMessage, ResponseMessage, RpcMessage};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// State shared between the session facade and the inbound loop.
pub struct Connection<W> {
    writer: Mutex<FrameWriter<W>>,
    pending: PendingCalls,
    lifecycle: Lifecycle,
}

impl<W> Connection<W> {
    pub fn pending(&self) -> &PendingCalls {
        &self.pending
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Terminate the session and fail everything still waiting.
    pub fn fail(&self) {
        self.lifecycle.terminate();
        self.pending.close();
    }
}

impl<W> Connection<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(writer: FrameWriter<W>) -> Self {
        Self {
            writer: Mutex::new(writer),
            pending: PendingCalls::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Write one message as a whole frame.
    ///
    /// The write runs in its own task, so dropping the returned future never
    /// leaves half a frame on the wire. A failed write ends the session.
    pub async fn send(self: &Arc<Self>, message: &RpcMessage) -> Result<()> {
        let body = codec::encode(message)?;
        log::debug!("-> {}", describe(message));

        let connection = Arc::clone(self);
        let write = tokio::spawn(async move {
            let outcome = connection.writer.lock().await.write_frame(&body).await;
            if let Err(e) = &outcome {
                log::warn!("LSP write error: {}", e);
                connection.fail();
            }
            outcome
        });

        write.await.map_err(|_| LspError::ConnectionClosed)?
    }

    /// Close the write half of the stream.
    pub async fn close_writer(&self) -> Result<()> {
        self.writer.lock().await.shutdown().await
    }
}

/// The inbound half of a session.
pub struct Dispatcher<R, W> {
    reader: FrameReader<R>,
    connection: Arc<Connection<W>>,
    handlers: Arc<HandlerRegistry>,
}

impl<R, W> Dispatcher<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(
        reader: FrameReader<R>,
        connection: Arc<Connection<W>>,
        handlers: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            reader,
            connection,
            handlers,
        }
    }

    /// Run the loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Read and dispatch frames until the stream fails or closes.
    pub async fn run(mut self) {
        let error = loop {
            match self.reader.read_message().await {
                Ok(message) => self.dispatch(message),
                Err(LspError::Protocol { id: Some(id), message }) => {
                    log::warn!("Invalid response for request {}: {}", id, message);
                    let error = LspError::Protocol {
                        id: Some(id.clone()),
                        message,
                    };
                    self.connection.pending.reject(&id, error);
                }
                Err(LspError::Protocol { id: None, message }) => {
                    log::warn!("Dropping invalid response without an id: {}", message);
                }
                Err(e) => break e,
            }
        };

        let state = self.connection.lifecycle.state();
        if error.is_disconnect()
            && matches!(state, SessionState::ShuttingDown | SessionState::Terminated)
        {
            log::info!("LSP server closed the connection");
        } else {
            log::error!("LSP reader stopped in state {}: {}", state, error);
        }

        self.connection.fail();
        log::debug!("LSP reader task terminated");
    }

    fn dispatch(&self, message: RpcMessage) {
        log::debug!("<- {}", describe(&message));
        match message {
            RpcMessage::Response(response) => {
                self.connection.pending.resolve(response);
            }
            RpcMessage::Request(request) => self.handle_request(request),
            RpcMessage::Notification(notification) => self.handle_notification(notification),
        }
    }

    /// Answer a server request from a task of its own, so a slow handler
    /// never stalls the loop.
    fn handle_request(&self, request: RequestMessage) {
        let RequestMessage {
            id, method, params, ..
        } = request;

        let handler = match self.handlers.lookup(&method) {
            Some(HandlerEntry::Request(handler)) => Some(Arc::clone(handler)),
            _ => None,
        };
        let connection = Arc::clone(&self.connection);

        tokio::spawn(async move {
            let response = match handler {
                Some(handler) => {
                    let outcome = AssertUnwindSafe(async move { handler.handle(params).await })
                        .catch_unwind()
                        .await;
                    match outcome {
                        Ok(Ok(result)) => ResponseMessage::success(id, result),
                        Ok(Err(error)) => ResponseMessage::error(Some(id), error),
                        Err(_) => {
                            log::error!("Handler for {} panicked", method);
                            ResponseMessage::error(
                                Some(id),
                                ResponseError::internal_error(format!(
                                    "Handler for {} panicked",
                                    method
                                )),
                            )
                        }
                    }
                }
                None => {
                    log::debug!("No handler for server request {}", method);
                    ResponseMessage::error(
                        Some(id),
                        ResponseError::method_not_found(format!("Unhandled method {}", method)),
                    )
                }
            };

            if let Err(e) = connection.send(&RpcMessage::Response(response)).await {
                log::warn!("Failed to answer {}: {}", method, e);
            }
        });
    }

    /// Run every notification handler inline, in registration order.
    fn handle_notification(&self, notification: NotificationMessage) {
        let Some(HandlerEntry::Notifications(handlers)) = self.handlers.lookup(&notification.method)
        else {
            log::debug!("Dropping unhandled notification {}", notification.method);
            return;
        };

        for handler in handlers {
            let params = notification.params.clone();
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(params)));
            if outcome.is_err() {
                log::error!("Handler for {} panicked", notification.method);
            }
        }
    }
}

/// One-line summary of a message for logs.
fn describe(message: &RpcMessage) -> String {
    match message {
        RpcMessage::Request(request) => format!("request {} {}", request.id, request.method),
        RpcMessage::Notification(notification) => format!("notification {}", notification.method),
        RpcMessage::Response(response) => match (&response.id, &response.error) {
            (Some(id), None) => format!("response {}", id),
            (Some(id), Some(error)) => format!("error response {} ({})", id, error.code),
            (None, _) => "response without id".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerResult;
    use crate::types::Id;
    use serde_json::{json, Value};
    use tokio::io::{duplex, DuplexStream};

    struct Peer {
        reader: FrameReader<DuplexStream>,
        writer: FrameWriter<DuplexStream>,
    }

    impl Peer {
        async fn send(&mut self, value: Value) {
            self.writer
                .write_frame(&serde_json::to_vec(&value).unwrap())
                .await
                .unwrap();
        }

        async fn receive(&mut self) -> Value {
            let frame = self.reader.read_frame().await.unwrap();
            serde_json::from_slice(&frame.body).unwrap()
        }
    }

    fn start(handlers: HandlerRegistry) -> (Arc<Connection<DuplexStream>>, Peer, JoinHandle<()>) {
        let (client_read, server_write) = duplex(4096);
        let (server_read, client_write) = duplex(4096);

        let connection = Arc::new(Connection::new(FrameWriter::new(client_write)));
        let task = Dispatcher::new(
            FrameReader::new(client_read),
            Arc::clone(&connection),
            Arc::new(handlers),
        )
        .spawn();

        let peer = Peer {
            reader: FrameReader::new(server_read),
            writer: FrameWriter::new(server_write),
        };
        (connection, peer, task)
    }

    #[tokio::test]
    async fn test_response_resolves_waiter() {
        let (connection, mut peer, _task) = start(HandlerRegistry::new());
        let waiter = connection.pending().register(Id::Number(1), "x").unwrap();

        peer.send(json!({"jsonrpc": "2.0", "id": 1, "result": {"v": 1}}))
            .await;
        assert_eq!(waiter.await.unwrap(), json!({"v": 1}));
    }

    #[tokio::test]
    async fn test_unhandled_request_gets_method_not_found() {
        let (_connection, mut peer, _task) = start(HandlerRegistry::new());

        peer.send(json!({"jsonrpc": "2.0", "id": "s1", "method": "custom/unknown"}))
            .await;
        let answer = peer.receive().await;
        assert_eq!(answer["id"], "s1");
        assert_eq!(answer["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_notification_only_method_answers_method_not_found() {
        let mut handlers = HandlerRegistry::new();
        handlers.on_notification("$/hello", |_| {}).unwrap();
        let (_connection, mut peer, _task) = start(handlers);

        peer.send(json!({"jsonrpc": "2.0", "id": 4, "method": "$/hello"}))
            .await;
        assert_eq!(peer.receive().await["error"]["code"], -32601);
    }

    fn explode(_: Option<Value>) -> futures::future::Ready<HandlerResult> {
        panic!("handler bug")
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_internal_error() {
        let mut handlers = HandlerRegistry::new();
        handlers.on_request("custom/panic", explode).unwrap();
        handlers
            .on_notification("custom/note", |_| panic!("notification bug"))
            .unwrap();
        let (connection, mut peer, _task) = start(handlers);

        peer.send(json!({"jsonrpc": "2.0", "method": "custom/note"}))
            .await;
        peer.send(json!({"jsonrpc": "2.0", "id": 8, "method": "custom/panic"}))
            .await;

        let answer = peer.receive().await;
        assert_eq!(answer["id"], 8);
        assert_eq!(answer["error"]["code"], -32603);
        assert_eq!(connection.lifecycle().state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_bad_response_fails_only_its_waiter() {
        let (connection, mut peer, _task) = start(HandlerRegistry::new());
        let bad = connection.pending().register(Id::Number(1), "a").unwrap();
        let good = connection.pending().register(Id::Number(2), "b").unwrap();

        peer.send(json!({"jsonrpc": "2.0", "id": 1})).await;
        peer.send(json!({"jsonrpc": "2.0", "id": 2, "result": null}))
            .await;

        assert!(matches!(bad.await, Err(LspError::Protocol { .. })));
        assert_eq!(good.await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_stream_close_terminates_and_fails_pending() {
        let (connection, peer, task) = start(HandlerRegistry::new());
        let waiter = connection.pending().register(Id::Number(1), "a").unwrap();

        drop(peer);
        task.await.unwrap();

        assert!(matches!(waiter.await, Err(LspError::ConnectionClosed)));
        assert_eq!(connection.lifecycle().state(), SessionState::Terminated);
        assert!(connection.pending().is_closed());
    }

    #[tokio::test]
    async fn test_garbage_frame_is_fatal() {
        let (connection, mut peer, task) = start(HandlerRegistry::new());
        peer.writer.write_frame(b"not json").await.unwrap();
        task.await.unwrap();
        assert_eq!(connection.lifecycle().state(), SessionState::Terminated);
    }

    #[test]
    fn test_describe() {
        let message = RpcMessage::from(RequestMessage::new(3, "textDocument/hover"));
        assert_eq!(describe(&message), "request 3 textDocument/hover");
    }
}
