// This file is part of bracketeer.
//
// bracketeer is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// bracketeer is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The boundary to the shared record store.
//!
//! Keys are `collection/id` paths. A collection's value is the map of its
//! children, delivered to subscribers as a [`Snapshot`] every time it changes.

use std::{
    collections::BTreeMap,
    sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError},
    time::Duration,
};

use rand::Rng;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::clock::Millis;

pub const TOURNAMENTS: &str = "tournaments";

/// Placeholder the store swaps for its own clock when a write commits.
const SERVER_VALUE: &str = ".sv";
const TIMESTAMP: &str = "timestamp";

/// The children of a collection, keyed by id.
pub type Snapshot = BTreeMap<String, Value>;

#[must_use]
pub fn child_key(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

/// Splits `collection/id` into its parts.
#[must_use]
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let (collection, id) = key.split_once('/')?;
    (!collection.is_empty() && !id.is_empty() && !id.contains('/')).then_some((collection, id))
}

#[must_use]
pub fn server_timestamp() -> Value {
    json!({ SERVER_VALUE: TIMESTAMP })
}

#[must_use]
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.len() == 1 && object.get(SERVER_VALUE) == Some(&json!(TIMESTAMP)))
}

/// Replaces every server timestamp placeholder inside `value` with `now`.
pub fn resolve_server_timestamps(value: &mut Value, now: Millis) {
    if is_server_timestamp(value) {
        *value = json!(now);
        return;
    }

    match value {
        Value::Object(object) => {
            for child in object.values_mut() {
                resolve_server_timestamps(child, now);
            }
        }
        Value::Array(array) => {
            for child in array {
                resolve_server_timestamps(child, now);
            }
        }
        _ => {}
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("{key}: gave up after {attempts} conflicting writes")]
    Contention { key: String, attempts: u32 },
}

impl StoreError {
    /// What to tell the person at the keyboard.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied(_) => {
                "Permission denied. Check the access rules of the tournament store.".to_string()
            }
            Self::Unavailable(_) => {
                "The tournament store is unreachable. Check your connection and try again."
                    .to_string()
            }
            Self::Malformed(detail) => {
                format!("The tournament store sent an unexpected response ({detail}).")
            }
            Self::Contention { .. } => {
                "Too many changes are landing at once. Please try again.".to_string()
            }
        }
    }
}

/// What an update function wants done with the value it was shown.
#[derive(Clone, Debug, PartialEq)]
pub enum Update<R> {
    Commit(Value),
    Abort(R),
}

/// How an atomic update ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Transaction<R> {
    Committed(Value),
    Aborted(R),
}

impl<R> Transaction<R> {
    #[must_use]
    pub fn committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    Changed(Snapshot),
    Failed(StoreError),
}

/// A live listener on one collection. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    events: Receiver<StoreEvent>,
}

impl Subscription {
    #[must_use]
    pub fn new(collection: &str, events: Receiver<StoreEvent>) -> Self {
        Self {
            collection: collection.to_string(),
            events,
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Blocks until the next event. `None` once the store hangs up.
    #[must_use]
    pub fn recv(&self) -> Option<StoreEvent> {
        self.events.recv().ok()
    }

    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<StoreEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    #[must_use]
    pub fn try_recv(&self) -> Option<StoreEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Bounds the compare-and-swap loop of [`RecordStore::atomic_update`].
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Random jitter as a fraction of the delay.
    pub jitter_percent: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 32,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
            jitter_percent: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-indexed).
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(31) as i32;
        let base = self.initial_delay.as_secs_f64() * self.backoff_factor.max(1.0).powi(exponent);
        let base = base.min(self.max_delay.as_secs_f64());

        let jitter = self.jitter_percent.clamp(0.0, 1.0);
        let factor = if jitter > 0.0 {
            rand::rng().random_range(1.0 - jitter..=1.0 + jitter)
        } else {
            1.0
        };

        Duration::from_secs_f64((base * factor).max(0.0))
    }
}

/// A shared document store.
///
/// Plain point operations are not conflict safe. Writes that must not lose a
/// concurrent change go through [`RecordStore::atomic_update`].
pub trait RecordStore: Send + Sync {
    /// # Errors
    ///
    /// If the store refuses or cannot be reached.
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the value at `key`. Writing `null` deletes it.
    ///
    /// # Errors
    ///
    /// If the store refuses or cannot be reached.
    fn write(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Sets only the given fields, leaving the rest of the record alone.
    ///
    /// # Errors
    ///
    /// If the store refuses or cannot be reached.
    fn update(&self, key: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Adds a child with a store-assigned id and returns the id.
    ///
    /// # Errors
    ///
    /// If the store refuses or cannot be reached.
    fn push(&self, collection: &str, value: Value) -> Result<String, StoreError>;

    /// Reads the value at `key`, asks `update` what to do with it and writes
    /// the result back if nothing changed in between. On a conflict the whole
    /// cycle runs again on the fresh value, so `update` may run many times
    /// and must have no side effects. Returning [`Update::Abort`] ends the
    /// cycle without writing.
    ///
    /// # Errors
    ///
    /// If the store refuses, cannot be reached, or conflicts persist past the
    /// store's retry policy.
    fn atomic_update<R, F>(&self, key: &str, update: F) -> Result<Transaction<R>, StoreError>
    where
        F: FnMut(Option<&Value>) -> Update<R>;

    /// Delivers the current value of `collection` right away and again after
    /// every change.
    ///
    /// # Errors
    ///
    /// If the store refuses or cannot be reached.
    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError>;
}
