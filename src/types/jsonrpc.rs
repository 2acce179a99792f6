//! JSON-RPC 2.0 message types.
//!
//! This module implements the base protocol message types that LSP builds upon.
//! Serialization produces the exact wire shape; decoding goes through
//! [`crate::codec::decode`], which classifies messages by key presence and
//! validates responses before building these values.

use crate::error::ResponseError;
use crate::types::Id;
use serde::{Deserialize, Serialize};

/// The only protocol version spoken on the wire.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request message to describe a request between client and server.
/// Every processed request must send a response back to the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// The request ID
    pub id: Id,
    /// The method to be invoked
    pub method: String,
    /// The method's parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl RequestMessage {
    /// Create a new request message.
    pub fn new(id: impl Into<Id>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    /// Create a new request message with parameters.
    pub fn with_params(
        id: impl Into<Id>,
        method: impl Into<String>,
        params: serde_json::Value,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// Response message sent as a result of a request.
///
/// Exactly one of `result` and `error` is set. A successful response whose
/// result is JSON `null` carries `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMessage {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// The request ID (same as the request, or null for parse errors)
    pub id: Option<Id>,
    /// The result of a successful request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error object in case of failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl ResponseMessage {
    /// Create a successful response.
    pub fn success(id: impl Into<Id>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Id>, error: ResponseError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Check if this response represents an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Get the error if present.
    pub fn get_error(&self) -> Option<&ResponseError> {
        self.error.as_ref()
    }

    /// Split the response into its outcome.
    pub fn into_result(self) -> Result<serde_json::Value, ResponseError> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(serde_json::Value::Null),
        }
    }
}

/// Notification message.
/// A processed notification message must not send a response back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// The method to be invoked
    pub method: String,
    /// The notification's parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl NotificationMessage {
    /// Create a new notification message.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: None,
        }
    }

    /// Create a new notification message with parameters.
    pub fn with_params(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// Enum representing any type of JSON-RPC message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RpcMessage {
    Request(RequestMessage),
    Response(ResponseMessage),
    Notification(NotificationMessage),
}

impl RpcMessage {
    /// Check if this is a request message.
    pub fn is_request(&self) -> bool {
        matches!(self, RpcMessage::Request(_))
    }

    /// Check if this is a response message.
    pub fn is_response(&self) -> bool {
        matches!(self, RpcMessage::Response(_))
    }

    /// Check if this is a notification message.
    pub fn is_notification(&self) -> bool {
        matches!(self, RpcMessage::Notification(_))
    }

    /// Get the method name if this is a request or notification.
    pub fn method(&self) -> Option<&str> {
        match self {
            RpcMessage::Request(req) => Some(&req.method),
            RpcMessage::Notification(notif) => Some(&notif.method),
            RpcMessage::Response(_) => None,
        }
    }

    /// Get the ID if this is a request or response.
    pub fn id(&self) -> Option<&Id> {
        match self {
            RpcMessage::Request(req) => Some(&req.id),
            RpcMessage::Response(resp) => resp.id.as_ref(),
            RpcMessage::Notification(_) => None,
        }
    }
}

impl From<RequestMessage> for RpcMessage {
    fn from(request: RequestMessage) -> Self {
        RpcMessage::Request(request)
    }
}

impl From<ResponseMessage> for RpcMessage {
    fn from(response: ResponseMessage) -> Self {
        RpcMessage::Response(response)
    }
}

impl From<NotificationMessage> for RpcMessage {
    fn from(notification: NotificationMessage) -> Self {
        RpcMessage::Notification(notification)
    }
}

/// Parameters for the $/cancelRequest notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelParams {
    /// The request ID to cancel.
    pub id: Id,
}

/// Parameters for the $/progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressParams<T> {
    /// The progress token provided by the client or server.
    pub token: crate::types::ProgressToken,
    /// The progress data.
    pub value: T,
}
