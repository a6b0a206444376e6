//! Outstanding command table.
//!
//! Owned by the engine task only. Every entry leaves the table exactly once
//! and its completion sender is consumed on the way out, so a reply, a
//! deadline and a teardown can never both resolve the same request.

use crate::config::BridgeConfig;
use crate::BridgeError;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::debug;

pub(crate) type Completion = oneshot::Sender<Result<Value, BridgeError>>;

pub(crate) struct PendingRequest {
    pub command: String,
    pub completion: Completion,
    pub deadline: AbortHandle,
}

#[derive(Default)]
pub(crate) struct PendingTable {
    entries: HashMap<String, PendingRequest>,
    sequence: u64,
}

impl PendingTable {
    /// Allocate the next correlation id (`req_1`, `req_2`, ...).
    pub fn next_id(&mut self) -> String {
        self.sequence += 1;
        format!("{}{}", BridgeConfig::REQUEST_ID_PREFIX, self.sequence)
    }

    pub fn insert(&mut self, request_id: String, request: PendingRequest) {
        self.entries.insert(request_id, request);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Settle a request with the outcome carried by its reply.
    ///
    /// Returns false for unknown ids (late or stale replies).
    pub fn resolve(&mut self, request_id: &str, outcome: Result<Value, BridgeError>) -> bool {
        match self.entries.remove(request_id) {
            Some(request) => {
                request.deadline.abort();
                complete(request_id, request.completion, outcome);
                true
            }
            None => false,
        }
    }

    /// Fail a request whose deadline elapsed, if it is still outstanding.
    pub fn expire(&mut self, request_id: &str, timeout: Duration) -> bool {
        match self.entries.remove(request_id) {
            Some(request) => {
                let err = BridgeError::Timeout {
                    command: request.command,
                    timeout,
                };
                complete(request_id, request.completion, Err(err));
                true
            }
            None => false,
        }
    }

    /// Fail every outstanding request with `CONNECTION_CLOSED` and empty the table.
    pub fn reject_all(&mut self) -> usize {
        let count = self.entries.len();
        for (request_id, request) in self.entries.drain() {
            request.deadline.abort();
            complete(&request_id, request.completion, Err(BridgeError::ConnectionClosed));
        }
        count
    }
}

fn complete(request_id: &str, completion: Completion, outcome: Result<Value, BridgeError>) {
    if completion.send(outcome).is_err() {
        debug!("Caller for {} went away before completion", request_id);
    }
}
