//! Correlation of outbound requests with their responses.
//!
//! Every outstanding request owns a one-shot slot keyed by its id. The slot is
//! fulfilled exactly once: by the matching response, by cancellation, or by
//! the sweep that runs when the connection closes. Dropping a
//! [`PendingRequest`] before then removes its slot.

use crate::error::{LspError, Result};
use crate::types::{Id, ResponseMessage};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Tracks a request waiting for a response.
#[derive(Debug)]
struct PendingCall {
    method: String,
    serial: u64,
    sender: oneshot::Sender<Result<Value>>,
}

#[derive(Debug, Default)]
struct Table {
    calls: HashMap<Id, PendingCall>,
    next_serial: u64,
    closed: bool,
}

fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    // The table holds no invariants a panicking holder could break.
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The table of outstanding requests.
#[derive(Debug)]
pub struct PendingCalls {
    next_id: AtomicI64,
    table: Arc<Mutex<Table>>,
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            table: Arc::new(Mutex::new(Table::default())),
        }
    }

    /// Allocate the next request id. Ids start at 1 and only grow.
    pub fn next_id(&self) -> Id {
        Id::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        lock(&self.table)
    }

    /// Register a waiter for `id`.
    pub fn register(&self, id: Id, method: impl Into<String>) -> Result<PendingRequest> {
        let mut table = self.table();
        if table.closed {
            return Err(LspError::ConnectionClosed);
        }
        if table.calls.contains_key(&id) {
            return Err(LspError::protocol(
                Some(id.clone()),
                format!("Request id {} is already outstanding", id),
            ));
        }

        let serial = table.next_serial;
        table.next_serial += 1;
        let (sender, receiver) = oneshot::channel();
        table.calls.insert(
            id.clone(),
            PendingCall {
                method: method.into(),
                serial,
                sender,
            },
        );

        Ok(PendingRequest {
            id,
            serial,
            receiver,
            table: Arc::downgrade(&self.table),
        })
    }

    /// Fulfil the waiter matching the response id.
    ///
    /// Returns false, after logging, when no waiter matches.
    pub fn resolve(&self, response: ResponseMessage) -> bool {
        let Some(id) = response.id.clone() else {
            log::warn!(
                "Dropping response without an id: {:?}",
                response.get_error()
            );
            return false;
        };

        let Some(call) = self.table().calls.remove(&id) else {
            log::warn!("Received response for unknown request id {}", id);
            return false;
        };

        log::trace!("Resolving request {} ({})", id, call.method);
        let outcome = response.into_result().map_err(LspError::Response);
        // The caller may have dropped its future; nothing left to do then.
        let _ = call.sender.send(outcome);
        true
    }

    /// Fail the waiter for `id` with `error`. Returns false if none matched.
    pub fn reject(&self, id: &Id, error: LspError) -> bool {
        match self.table().calls.remove(id) {
            Some(call) => {
                let _ = call.sender.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Cancel the waiter for `id`, which then completes with `Cancelled`.
    pub fn cancel(&self, id: &Id) -> bool {
        self.reject(id, LspError::Cancelled(id.clone()))
    }

    /// Fail every outstanding waiter with `ConnectionClosed` and refuse new
    /// registrations.
    pub fn close(&self) {
        let calls = {
            let mut table = self.table();
            table.closed = true;
            std::mem::take(&mut table.calls)
        };

        if !calls.is_empty() {
            log::debug!("Failing {} pending request(s) on close", calls.len());
        }
        for (_, call) in calls {
            let _ = call.sender.send(Err(LspError::ConnectionClosed));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.table().closed
    }

    pub fn len(&self) -> usize {
        self.table().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The method of the outstanding request `id`, if any.
    pub fn method_of(&self, id: &Id) -> Option<String> {
        self.table().calls.get(id).map(|call| call.method.clone())
    }
}

/// A future completing with the outcome of one request.
#[derive(Debug)]
pub struct PendingRequest {
    id: Id,
    serial: u64,
    receiver: oneshot::Receiver<Result<Value>>,
    table: Weak<Mutex<Table>>,
}

impl PendingRequest {
    /// The id the request was sent with; pass it to cancel.
    pub fn id(&self) -> &Id {
        &self.id
    }
}

impl Future for PendingRequest {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(Err(LspError::ConnectionClosed)))
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        let mut table = lock(&table);
        // A later registration may reuse the id; only remove our own slot.
        if table
            .calls
            .get(&self.id)
            .is_some_and(|call| call.serial == self.serial)
        {
            table.calls.remove(&self.id);
            log::trace!("Abandoned request {}", self.id);
        }
    }
}
