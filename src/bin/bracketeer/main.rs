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

#![deny(clippy::expect_used)]
#![deny(clippy::indexing_slicing)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

mod command_line;

use std::{fs, io::ErrorKind, path::Path, sync::Arc, thread};

use bracketeer::{
    identity::Identity,
    init::{Backends, initialization},
    memory_store::MemoryStore,
    session::Session,
    store::{Snapshot, TOURNAMENTS},
    utils,
};
use clap::Parser;
use futures::executor::block_on;
use log::{debug, error, info};
use serde_json::Value;

use crate::command_line::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.debug, args.systemd);

    if args.man {
        return Args::generate_man_page();
    }

    let records = match &args.data {
        Some(path) => load(path)?,
        None => Snapshot::new(),
    };
    let identity = args
        .uid
        .as_deref()
        .map(|uid| Identity::new(uid, args.email.as_deref()));

    let (initializer, pending) = initialization();
    let backends = thread::spawn(move || {
        let store = MemoryStore::new().with_records(TOURNAMENTS, records);
        initializer.resolve(Backends {
            store: Arc::new(store),
            identity,
        });
    });

    let mut session = block_on(Session::connect(pending))?;
    if backends.join().is_err() {
        error!("the store thread panicked");
    }

    session.listen()?;
    session.drain_updates()?;

    if let Some(name) = &args.create {
        match session.create_tournament(&args.draft(name)) {
            Ok(id) => {
                println!("Tournament created. ({id})");
                session.drain_updates()?;
                session.select(&id)?;
            }
            Err(error) => println!("{error}"),
        }
    }

    if let Some(id) = &args.join {
        match session.join(id) {
            Ok(_) => {
                session.drain_updates()?;
                let name = session
                    .snapshot()
                    .get(id)
                    .and_then(|raw| raw.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or(id.as_str());
                println!("Joined {name}.");
            }
            Err(error) => println!("{error}"),
        }
    }

    if let Some(id) = &args.tournament
        && let Err(error) = session.select(id)
    {
        println!("{error}");
    }

    session.drain_updates()?;
    println!("{}", session.dashboard());

    if let Some(path) = &args.data {
        save(path, &session.store().collection(TOURNAMENTS)?)?;
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Snapshot> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let records: Snapshot = serde_json::from_str(&text)?;
            debug!("loaded {} records from {}", records.len(), path.display());
            Ok(records)
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            info!("{} does not exist yet, starting empty", path.display());
            Ok(Snapshot::new())
        }
        Err(error) => Err(error.into()),
    }
}

fn save(path: &Path, records: &Snapshot) -> anyhow::Result<()> {
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    debug!("saved {} records to {}", records.len(), path.display());
    Ok(())
}
