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

//! An in-process [`RecordStore`].
//!
//! Every committed write bumps a store-wide revision. An atomic update
//! remembers the revision it read and only writes if the key still carries
//! it, otherwise it backs off and starts over.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Mutex, MutexGuard,
        mpsc::{self, Sender},
    },
    thread,
};

use log::{debug, trace};
use serde_json::{Map, Value};

use crate::{
    clock::{Clock, SystemClock},
    store::{
        RecordStore, RetryPolicy, Snapshot, StoreError, StoreEvent, Subscription, Transaction,
        Update, child_key, resolve_server_timestamps, split_key,
    },
};

#[derive(Clone, Debug)]
struct Entry {
    revision: u64,
    value: Value,
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, Entry>,
    revision: u64,
    pushed: u64,
    denied: HashSet<String>,
    offline: bool,
    listeners: Vec<(String, Sender<StoreEvent>)>,
}

impl Inner {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("the store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        self.check_online()?;

        let Some((collection, _)) = split_key(key) else {
            return Err(StoreError::Malformed(format!("invalid key: {key}")));
        };

        if self.denied.contains(key) || self.denied.contains(collection) {
            return Err(StoreError::PermissionDenied(key.to_string()));
        }

        Ok(())
    }

    fn revision_of(&self, key: &str) -> u64 {
        self.entries.get(key).map_or(0, |entry| entry.revision)
    }

    fn snapshot(&self, collection: &str) -> Snapshot {
        self.entries
            .iter()
            .filter_map(|(key, entry)| {
                let (parent, id) = split_key(key)?;
                (parent == collection).then(|| (id.to_string(), entry.value.clone()))
            })
            .collect()
    }

    fn commit(&mut self, key: &str, mut value: Value, now: i64) -> Value {
        resolve_server_timestamps(&mut value, now);
        self.revision += 1;

        if value.is_null() {
            self.entries.remove(key);
        } else {
            self.entries.insert(
                key.to_string(),
                Entry {
                    revision: self.revision,
                    value: value.clone(),
                },
            );
        }

        trace!("{key}: committed revision {}", self.revision);
        self.notify(key);
        value
    }

    fn notify(&mut self, key: &str) {
        let Some((collection, _)) = split_key(key) else {
            return;
        };

        let snapshot = self.snapshot(collection);
        self.listeners.retain(|(listening_to, tx)| {
            listening_to != collection || tx.send(StoreEvent::Changed(snapshot.clone())).is_ok()
        });
    }
}

#[derive(Debug)]
pub struct MemoryStore<C = SystemClock> {
    inner: Mutex<Inner>,
    clock: C,
    policy: RetryPolicy,
}

impl MemoryStore<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seeds `collection` with `records` without notifying anybody.
    #[must_use]
    pub fn with_records(mut self, collection: &str, records: Snapshot) -> Self {
        if let Ok(inner) = self.inner.get_mut() {
            for (id, value) in records {
                inner.revision += 1;
                let revision = inner.revision;
                inner
                    .entries
                    .insert(child_key(collection, &id), Entry { revision, value });
            }
        }

        self
    }

    /// # Errors
    ///
    /// If the store is offline.
    pub fn collection(&self, collection: &str) -> Result<Snapshot, StoreError> {
        let inner = self.lock()?;
        inner.check_online()?;
        Ok(inner.snapshot(collection))
    }

    /// The number of writes committed so far.
    ///
    /// # Errors
    ///
    /// If the store's lock is poisoned.
    pub fn revision(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.revision)
    }

    /// Refuses writes to a key, or to every key of a collection.
    ///
    /// # Errors
    ///
    /// If the store's lock is poisoned.
    pub fn deny(&self, key_or_collection: &str) -> Result<(), StoreError> {
        self.lock()?.denied.insert(key_or_collection.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// If the store's lock is poisoned.
    pub fn allow(&self, key_or_collection: &str) -> Result<(), StoreError> {
        self.lock()?.denied.remove(key_or_collection);
        Ok(())
    }

    /// # Errors
    ///
    /// If the store's lock is poisoned.
    pub fn set_offline(&self, offline: bool) -> Result<(), StoreError> {
        self.lock()?.offline = offline;
        Ok(())
    }

    /// Sends `error` to every listener.
    ///
    /// # Errors
    ///
    /// If the store's lock is poisoned.
    pub fn fail_listeners(&self, error: &StoreError) -> Result<(), StoreError> {
        self.lock()?
            .listeners
            .retain(|(_, tx)| tx.send(StoreEvent::Failed(error.clone())).is_ok());
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|error| StoreError::Unavailable(format!("lock poisoned: {error}")))
    }
}

impl<C: Clock> RecordStore for MemoryStore<C> {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.lock()?;
        inner.check_online()?;
        Ok(inner.entries.get(key).map(|entry| entry.value.clone()))
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.check_writable(key)?;
        inner.commit(key, value, self.clock.now_millis());
        Ok(())
    }

    fn update(&self, key: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.check_writable(key)?;

        let mut record = match inner.entries.get(key).map(|entry| &entry.value) {
            Some(Value::Object(record)) => record.clone(),
            _ => Map::new(),
        };

        for (field, value) in fields {
            if value.is_null() {
                record.remove(&field);
            } else {
                record.insert(field, value);
            }
        }

        inner.commit(key, Value::Object(record), self.clock.now_millis());
        Ok(())
    }

    fn push(&self, collection: &str, value: Value) -> Result<String, StoreError> {
        let now = self.clock.now_millis();
        let mut inner = self.lock()?;

        inner.pushed += 1;
        let id = format!("{now:012x}{:04x}", inner.pushed);
        let key = child_key(collection, &id);

        inner.check_writable(&key)?;
        inner.commit(&key, value, now);
        Ok(id)
    }

    fn atomic_update<R, F>(&self, key: &str, mut update: F) -> Result<Transaction<R>, StoreError>
    where
        F: FnMut(Option<&Value>) -> Update<R>,
    {
        let mut attempt = 0;

        loop {
            let (revision, current) = {
                let inner = self.lock()?;
                inner.check_writable(key)?;
                (
                    inner.revision_of(key),
                    inner.entries.get(key).map(|entry| entry.value.clone()),
                )
            };

            let proposed = match update(current.as_ref()) {
                Update::Commit(proposed) => proposed,
                Update::Abort(reason) => return Ok(Transaction::Aborted(reason)),
            };

            {
                let mut inner = self.lock()?;
                inner.check_writable(key)?;

                if inner.revision_of(key) == revision {
                    let value = inner.commit(key, proposed, self.clock.now_millis());
                    return Ok(Transaction::Committed(value));
                }
            }

            attempt += 1;
            if attempt >= self.policy.max_attempts {
                return Err(StoreError::Contention {
                    key: key.to_string(),
                    attempts: attempt,
                });
            }

            debug!("{key}: conflicting write, retry {attempt}");
            thread::sleep(self.policy.delay_for_attempt(attempt - 1));
        }
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let mut inner = self.lock()?;
        inner.check_online()?;

        if inner.denied.contains(collection) {
            return Err(StoreError::PermissionDenied(collection.to_string()));
        }

        let (tx, rx) = mpsc::channel();
        let _ok = tx.send(StoreEvent::Changed(inner.snapshot(collection)));
        inner.listeners.push((collection.to_string(), tx));

        Ok(Subscription::new(collection, rx))
    }
}
