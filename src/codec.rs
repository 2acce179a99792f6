//! JSON-RPC message codec.
//!
//! Encoding is plain serde serialization of [`RpcMessage`]. Decoding works on
//! the parsed JSON object and classifies the message by which keys are
//! present, since the three message shapes overlap too much for an untagged
//! derive: `id` + `method` is a request, `method` alone a notification and
//! `id` alone a response.

use crate::error::{LspError, ResponseError, Result};
use crate::types::{Id, NotificationMessage, RequestMessage, ResponseMessage, RpcMessage};
use crate::types::JSONRPC_VERSION;
use serde_json::{Map, Value};

/// Serialize a message to its wire body.
pub fn encode(message: &RpcMessage) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// Parse a frame body into a message.
///
/// Malformed bodies fail with [`LspError::Decode`]. A response that carries
/// both `result` and `error`, or neither, fails with [`LspError::Protocol`]
/// holding the response id so the matching waiter can be failed.
pub fn decode(bytes: &[u8]) -> Result<RpcMessage> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| LspError::Decode(format!("Invalid JSON: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(LspError::Decode("Message is not a JSON object".to_string()));
    };

    match object.get("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(other) => {
            return Err(LspError::Decode(format!(
                "Unsupported jsonrpc version: {}",
                other
            )))
        }
        None => return Err(LspError::Decode("Missing jsonrpc field".to_string())),
    }

    let id = object.remove("id");
    let method = object.remove("method");

    match (id, method) {
        (Some(id), Some(method)) => {
            let id = parse_id(id)?
                .ok_or_else(|| LspError::Decode("Request id must not be null".to_string()))?;
            Ok(RpcMessage::Request(RequestMessage {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id,
                method: parse_method(method)?,
                params: object.remove("params"),
            }))
        }
        (None, Some(method)) => Ok(RpcMessage::Notification(NotificationMessage {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: parse_method(method)?,
            params: object.remove("params"),
        })),
        (Some(id), None) => decode_response(parse_id(id)?, object),
        (None, None) => Err(LspError::Decode(
            "Message has neither an id nor a method".to_string(),
        )),
    }
}

fn decode_response(id: Option<Id>, mut object: Map<String, Value>) -> Result<RpcMessage> {
    let result = object.remove("result");
    let error = match object.remove("error") {
        // Some servers spell out a null error next to the result.
        None | Some(Value::Null) => None,
        Some(error) => Some(
            serde_json::from_value::<ResponseError>(error)
                .map_err(|e| LspError::Decode(format!("Malformed error object: {}", e)))?,
        ),
    };

    match (&result, &error) {
        (Some(_), Some(_)) => Err(LspError::protocol(
            id,
            "Response carries both a result and an error",
        )),
        (None, None) => Err(LspError::protocol(
            id,
            "Response carries neither a result nor an error",
        )),
        _ => Ok(RpcMessage::Response(ResponseMessage {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
            error,
        })),
    }
}

/// `null` is only meaningful on responses to unparseable requests.
fn parse_id(value: Value) -> Result<Option<Id>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(Id::String(s))),
        Value::Number(n) => n
            .as_i64()
            .map(|n| Some(Id::Number(n)))
            .ok_or_else(|| LspError::Decode(format!("Invalid id: {}", n))),
        other => Err(LspError::Decode(format!("Invalid id: {}", other))),
    }
}

fn parse_method(value: Value) -> Result<String> {
    match value {
        Value::String(method) => Ok(method),
        other => Err(LspError::Decode(format!(
            "Method must be a string, got {}",
            other
        ))),
    }
}
