//! Handlers for server-initiated traffic.
//!
//! A method is bound either to one request handler, whose result is sent back
//! as the response, or to any number of notification handlers, which all run
//! in registration order. The registry is filled before the session starts
//! and is read-only afterwards.

use crate::error::{LspError, ResponseError, Result};
use crate::types::methods::{self, Notification, Request};
use crate::types::{
    ConfigurationParams, LogMessageParams, LogTraceParams, RegistrationParams,
    ShowMessageParams, ShowMessageRequestParams, UnregistrationParams,
    WorkDoneProgressCreateParams,
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Log target for messages the server asks the client to log or show.
pub const SERVER_LOG_TARGET: &str = "lsp_session::server";

/// What a request handler answers: a result, or an error response.
pub type HandlerResult = std::result::Result<Value, ResponseError>;

/// Answers one server-to-client request.
#[cfg_attr(test, mockall::automock)]
pub trait RequestHandler: Send + Sync {
    fn handle(&self, params: Option<Value>) -> BoxFuture<'static, HandlerResult>;
}

/// Consumes one server-to-client notification.
///
/// Runs on the inbound loop, so it must not block; spawn a task for any
/// longer work.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationHandler: Send + Sync {
    fn handle(&self, params: Option<Value>);
}

/// A handler of either kind, as passed to [`HandlerRegistry::register`].
#[derive(Clone)]
pub enum Handler {
    Request(Arc<dyn RequestHandler>),
    Notification(Arc<dyn NotificationHandler>),
}

/// What is registered for one method.
#[derive(Clone)]
pub enum HandlerEntry {
    Request(Arc<dyn RequestHandler>),
    Notifications(Vec<Arc<dyn NotificationHandler>>),
}

struct FnRequestHandler<F>(F);

impl<F, Fut> RequestHandler for FnRequestHandler<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, params: Option<Value>) -> BoxFuture<'static, HandlerResult> {
        (self.0)(params).boxed()
    }
}

struct FnNotificationHandler<F>(F);

impl<F> NotificationHandler for FnNotificationHandler<F>
where
    F: Fn(Option<Value>) + Send + Sync,
{
    fn handle(&self, params: Option<Value>) {
        (self.0)(params)
    }
}

impl From<Handler> for HandlerEntry {
    fn from(handler: Handler) -> Self {
        match handler {
            Handler::Request(handler) => HandlerEntry::Request(handler),
            Handler::Notification(handler) => HandlerEntry::Notifications(vec![handler]),
        }
    }
}

fn typed_request<R, F, Fut>(handler: F) -> (&'static str, Handler)
where
    R: Request + 'static,
    F: Fn(R::Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<R::Result, ResponseError>> + Send + 'static,
{
    let handler = FnRequestHandler(move |params: Option<Value>| {
        let parsed = serde_json::from_value::<R::Params>(params.unwrap_or(Value::Null));
        let call = parsed.map(&handler);
        async move {
            let result = call
                .map_err(|e| ResponseError::invalid_params(format!("{}: {}", R::METHOD, e)))?
                .await?;
            serde_json::to_value(result).map_err(|e| ResponseError::internal_error(e.to_string()))
        }
    });
    (R::METHOD, Handler::Request(Arc::new(handler)))
}

fn typed_notification<N, F>(handler: F) -> (&'static str, Handler)
where
    N: Notification + 'static,
    F: Fn(N::Params) + Send + Sync + 'static,
{
    let handler = FnNotificationHandler(move |params: Option<Value>| {
        match serde_json::from_value::<N::Params>(params.unwrap_or(Value::Null)) {
            Ok(params) => handler(params),
            Err(e) => log::warn!("Dropping {} with invalid params: {}", N::METHOD, e),
        }
    });
    (N::METHOD, Handler::Notification(Arc::new(handler)))
}

/// Method name to handler mapping.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, HandlerEntry>,
}

impl HandlerRegistry {
    /// An empty registry. Unanswered server requests get `MethodNotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry answering the server requests every client is expected to
    /// handle, and logging the server's messages through `log`.
    ///
    /// * `window/workDoneProgress/create`, `client/registerCapability` and
    ///   `client/unregisterCapability` are acknowledged with `null`.
    /// * `workspace/configuration` answers `null` for every requested item.
    /// * `window/showMessageRequest` is logged and answered with `null`.
    /// * `window/logMessage`, `window/showMessage` and `$/logTrace` are
    ///   logged under [`SERVER_LOG_TARGET`].
    pub fn with_defaults() -> Self {
        let defaults = [
            typed_request::<methods::WorkDoneProgressCreate, _, _>(
                |params: WorkDoneProgressCreateParams| async move {
                    log::debug!("Server created progress token {}", params.token);
                    Ok(())
                },
            ),
            typed_request::<methods::RegisterCapability, _, _>(
                |params: RegistrationParams| async move {
                    for registration in &params.registrations {
                        log::debug!(
                            "Server registered {} ({})",
                            registration.method,
                            registration.id
                        );
                    }
                    Ok(())
                },
            ),
            typed_request::<methods::UnregisterCapability, _, _>(
                |params: UnregistrationParams| async move {
                    for unregistration in &params.unregisterations {
                        log::debug!(
                            "Server unregistered {} ({})",
                            unregistration.method,
                            unregistration.id
                        );
                    }
                    Ok(())
                },
            ),
            typed_request::<methods::WorkspaceConfiguration, _, _>(
                |params: ConfigurationParams| async move {
                    Ok(vec![Value::Null; params.items.len()])
                },
            ),
            typed_request::<methods::ShowMessageRequest, _, _>(
                |params: ShowMessageRequestParams| async move {
                    log::log!(
                        target: SERVER_LOG_TARGET,
                        params.typ.log_level(),
                        "{}",
                        params.message
                    );
                    Ok(None)
                },
            ),
            typed_notification::<methods::LogMessage, _>(|params: LogMessageParams| {
                log::log!(
                    target: SERVER_LOG_TARGET,
                    params.typ.log_level(),
                    "{}",
                    params.message
                );
            }),
            typed_notification::<methods::ShowMessage, _>(|params: ShowMessageParams| {
                log::log!(
                    target: SERVER_LOG_TARGET,
                    params.typ.log_level(),
                    "{}",
                    params.message
                );
            }),
            typed_notification::<methods::LogTrace, _>(|params: LogTraceParams| {
                match params.verbose {
                    Some(verbose) => {
                        log::trace!(target: SERVER_LOG_TARGET, "{}\n{}", params.message, verbose)
                    }
                    None => log::trace!(target: SERVER_LOG_TARGET, "{}", params.message),
                }
            }),
        ];

        Self {
            entries: defaults
                .into_iter()
                .map(|(method, handler)| (method.to_string(), HandlerEntry::from(handler)))
                .collect(),
        }
    }

    /// Bind `handler` to `method`.
    ///
    /// A request handler conflicts with anything already registered for the
    /// method, and a notification handler conflicts with a request handler.
    /// Further notification handlers for the same method are appended.
    pub fn register(&mut self, method: impl Into<String>, handler: Handler) -> Result<()> {
        let method = method.into();
        match handler {
            Handler::Request(handler) => {
                if self.entries.contains_key(&method) {
                    return Err(LspError::DuplicateHandler(method));
                }
                self.entries.insert(method, HandlerEntry::Request(handler));
            }
            Handler::Notification(handler) => match self.entries.entry(method) {
                Entry::Vacant(slot) => {
                    slot.insert(HandlerEntry::Notifications(vec![handler]));
                }
                Entry::Occupied(mut slot) => {
                    if let HandlerEntry::Notifications(handlers) = slot.get_mut() {
                        handlers.push(handler);
                    } else {
                        return Err(LspError::DuplicateHandler(slot.key().clone()));
                    }
                }
            },
        }
        Ok(())
    }

    /// Register a closure answering a request with raw JSON.
    pub fn on_request<F, Fut>(&mut self, method: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(method, Handler::Request(Arc::new(FnRequestHandler(handler))))
    }

    /// Register a closure consuming a notification with raw JSON.
    pub fn on_notification<F>(&mut self, method: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        self.register(
            method,
            Handler::Notification(Arc::new(FnNotificationHandler(handler))),
        )
    }

    /// Register a typed request handler. Params that do not deserialize are
    /// answered with `InvalidParams` without calling `handler`.
    pub fn on_request_typed<R, F, Fut>(&mut self, handler: F) -> Result<()>
    where
        R: Request + 'static,
        F: Fn(R::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R::Result, ResponseError>> + Send + 'static,
    {
        let (method, handler) = typed_request::<R, _, _>(handler);
        self.register(method, handler)
    }

    /// Register a typed notification handler. Params that do not deserialize
    /// are logged and dropped.
    pub fn on_notification_typed<N, F>(&mut self, handler: F) -> Result<()>
    where
        N: Notification + 'static,
        F: Fn(N::Params) + Send + Sync + 'static,
    {
        let (method, handler) = typed_notification::<N, _>(handler);
        self.register(method, handler)
    }

    /// Drop whatever is registered for `method`, e.g. to replace a default.
    pub fn remove(&mut self, method: &str) -> Option<HandlerEntry> {
        self.entries.remove(method)
    }

    pub fn lookup(&self, method: &str) -> Option<&HandlerEntry> {
        self.entries.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.entries.keys().collect();
        methods.sort();
        f.debug_struct("HandlerRegistry")
            .field("methods", &methods)
            .finish()
    }
}
