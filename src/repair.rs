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

use log::{debug, info, warn};
use rayon::prelude::*;
use serde_json::{Map, Value, json};

use crate::{
    normalize::{is_missing, is_valid_record},
    store::{RecordStore, Snapshot, StoreError, Transaction, Update, child_key, server_timestamp},
};

/// The core fields `raw` lacks, with the values to fill them with.
#[must_use]
pub fn missing_core_fields(raw: &Value) -> Map<String, Value> {
    let mut fields = Map::new();

    if is_missing(raw.get("createdAt")) {
        fields.insert("createdAt".to_string(), server_timestamp());
    }
    if !raw.get("participants").is_some_and(Value::is_object) {
        fields.insert("participants".to_string(), json!({}));
    }

    fields
}

/// Fills the core fields `current` lacks and keeps every field it has.
///
/// Aborts when the record is gone, invalid or already complete, so a repair
/// computed from an old snapshot never undoes a newer write.
#[must_use]
pub fn propose_repair(current: Option<&Value>) -> Update<()> {
    let Some(raw) = current.filter(|raw| is_valid_record(raw)) else {
        return Update::Abort(());
    };
    let Value::Object(record) = raw else {
        return Update::Abort(());
    };

    let fields = missing_core_fields(raw);
    if fields.is_empty() {
        return Update::Abort(());
    }

    let mut next = record.clone();
    next.extend(fields);
    Update::Commit(Value::Object(next))
}

#[must_use]
pub fn needs_repair(raw: &Value) -> bool {
    is_valid_record(raw) && !missing_core_fields(raw).is_empty()
}

/// Nobody can tell who created a record without an owner, so such records are
/// reported and left alone.
#[must_use]
pub fn lacks_owner(raw: &Value) -> bool {
    is_valid_record(raw) && is_missing(raw.get("ownerUid"))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RepairReport {
    pub repaired: Vec<String>,
    pub failed: Vec<(String, StoreError)>,
    pub pending_owner: Vec<String>,
}

impl RepairReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repaired.is_empty() && self.failed.is_empty()
    }
}

pub struct RepairService<'a, S> {
    store: &'a S,
}

impl<'a, S: RecordStore> RepairService<'a, S> {
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Backfills missing core fields on every valid record of `snapshot`.
    ///
    /// The snapshot only picks the candidates. Each one is repaired by an
    /// atomic update against its current value, filling nothing but the
    /// fields still missing. The updates run in parallel and a failed one
    /// does not stop the rest.
    #[must_use]
    pub fn repair(&self, collection: &str, snapshot: &Snapshot) -> RepairReport {
        let outcomes: Vec<(String, Result<Transaction<()>, StoreError>)> = snapshot
            .par_iter()
            .filter(|(_, raw)| needs_repair(raw))
            .map(|(id, _)| {
                let result = self
                    .store
                    .atomic_update(&child_key(collection, id), propose_repair);
                (id.clone(), result)
            })
            .collect();

        let mut report = RepairReport {
            pending_owner: snapshot
                .iter()
                .filter(|(_, raw)| lacks_owner(raw))
                .map(|(id, _)| id.clone())
                .collect(),
            ..RepairReport::default()
        };

        for (id, result) in outcomes {
            match result {
                Ok(Transaction::Committed(_)) => report.repaired.push(id),
                Ok(Transaction::Aborted(())) => debug!("{collection}/{id}: nothing left to repair"),
                Err(error) => report.failed.push((id, error)),
            }
        }

        if !report.repaired.is_empty() {
            info!(
                "{collection}: repaired {} legacy records",
                report.repaired.len()
            );
        }
        for (id, error) in &report.failed {
            warn!("{collection}/{id}: repair failed: {error}");
        }
        if !report.pending_owner.is_empty() {
            debug!(
                "{collection}: {} records have no owner",
                report.pending_owner.len()
            );
        }

        report
    }
}
