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

//! Enrolling a player into a tournament's roster.
//!
//! The roster is capacity bounded and several players may race for the last
//! seat. No lock is taken: [`propose_join`] computes the next record from
//! whatever the store currently holds and the store's atomic update reruns it
//! whenever another write got there first. Every rerun sees the fresh
//! participant count, so the capacity check can never be overtaken.

use log::{error, info, warn};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::{
    clock::{Clock, Millis},
    identity::Identity,
    normalize::{
        MAX_PARTICIPANTS, is_blank, is_missing, is_valid_record, millis, number, sanitize_name,
    },
    store::{RecordStore, StoreError, TOURNAMENTS, Transaction, Update, child_key},
    tournament::Participant,
};

/// Why a join was turned down.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum BlockReason {
    #[error("Tournament no longer exists.")]
    Missing,
    #[error("Join window is closed for this tournament.")]
    Closed,
    #[error("You already joined this tournament.")]
    AlreadyJoined,
    #[error("Tournament is full.")]
    Full,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum JoinError {
    #[error(transparent)]
    Blocked(#[from] BlockReason),
    #[error("{}", .0.user_message())]
    Store(#[from] StoreError),
}

/// The seat limit as stored. Join enforces this raw value, not the clamped
/// one listings show.
fn capacity(record: &Map<String, Value>) -> f64 {
    record
        .get("maxParticipants")
        .filter(|value| !is_blank(value))
        .and_then(number)
        .map_or(f64::from(MAX_PARTICIPANTS.default), f64::round)
}

/// Computes the record that enrolls `uid`, or why it cannot be enrolled.
///
/// This runs inside the store's atomic update and may run many times for one
/// join. It must stay pure.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn propose_join(
    current: Option<&Value>,
    uid: &str,
    display_name: &str,
    now: Millis,
) -> Update<BlockReason> {
    let Some(Value::Object(record)) = current.filter(|current| is_valid_record(current)) else {
        return Update::Abort(BlockReason::Missing);
    };

    let mut record = record.clone();
    if is_missing(record.get("createdAt")) {
        record.insert("createdAt".to_string(), json!(now));
    }
    let mut participants = match record.remove("participants") {
        Some(Value::Object(participants)) => participants,
        _ => Map::new(),
    };

    if record
        .get("joinDeadline")
        .and_then(millis)
        .is_some_and(|deadline| now > deadline)
    {
        return Update::Abort(BlockReason::Closed);
    }

    if participants.get(uid).is_some_and(|entry| !is_blank(entry)) {
        return Update::Abort(BlockReason::AlreadyJoined);
    }

    let count = participants.values().filter(|entry| !is_blank(entry)).count();
    if count as f64 >= capacity(&record) {
        return Update::Abort(BlockReason::Full);
    }

    participants.insert(
        uid.to_string(),
        json!({
            "uid": uid,
            "displayName": sanitize_name(display_name),
            "joinedAt": now,
        }),
    );
    record.insert("participants".to_string(), Value::Object(participants));

    Update::Commit(Value::Object(record))
}

pub struct JoinCoordinator<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S: RecordStore, C: Clock> JoinCoordinator<'a, S, C> {
    #[must_use]
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Enrolls `identity` into the tournament and returns the new entry.
    ///
    /// # Errors
    ///
    /// [`JoinError::Blocked`] if the tournament turned the player away, in
    /// which case nothing was written. [`JoinError::Store`] if the store
    /// refused or could not be reached.
    pub fn join(&self, tournament_id: &str, identity: &Identity) -> Result<Participant, JoinError> {
        let key = child_key(TOURNAMENTS, tournament_id);
        let display_name = identity.display_name();

        let transaction = self.store.atomic_update(&key, |current| {
            propose_join(current, &identity.uid, &display_name, self.clock.now_millis())
        });

        match transaction {
            Ok(Transaction::Committed(record)) => {
                info!("{key}: {} joined as {display_name}", identity.uid);

                let participant = record
                    .get("participants")
                    .and_then(|participants| participants.get(&identity.uid))
                    .map_or_else(
                        || Participant {
                            uid: identity.uid.clone(),
                            display_name: sanitize_name(&display_name),
                            joined_at: None,
                        },
                        |entry| Participant::from_value(&identity.uid, entry),
                    );

                Ok(participant)
            }
            Ok(Transaction::Aborted(reason)) => {
                warn!("{key}: {} was not let in: {reason}", identity.uid);
                Err(reason.into())
            }
            Err(error) => {
                error!("{key}: join by {} failed: {error}", identity.uid);
                Err(error.into())
            }
        }
    }
}
