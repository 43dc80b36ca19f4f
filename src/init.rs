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

//! The one-time handshake between whoever brings the store and identity
//! provider up and the session that needs them.
//!
//! [`initialization`] hands out a pair: the [`Initializer`] is resolved
//! exactly once, the [`Initialization`] is a future completing with what it
//! was resolved with.

use std::{
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{FutureExt, channel::oneshot, executor::block_on};
use log::debug;
use thiserror::Error;

use crate::identity::Identity;

/// The collaborators a session runs against.
pub struct Backends<S> {
    pub store: Arc<S>,
    pub identity: Option<Identity>,
}

impl<S> fmt::Debug for Backends<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum InitError {
    #[error("initialization failed: {0}")]
    Failed(String),
    #[error("initialization was abandoned")]
    Abandoned,
}

type Outcome<S> = Result<Backends<S>, InitError>;

pub struct Initializer<S> {
    tx: oneshot::Sender<Outcome<S>>,
}

impl<S> Initializer<S> {
    pub fn resolve(self, backends: Backends<S>) {
        debug!("backends are ready");
        // Nobody waiting is not an error.
        let _ok = self.tx.send(Ok(backends));
    }

    pub fn fail(self, reason: &str) {
        debug!("backends failed to start: {reason}");
        let _ok = self.tx.send(Err(InitError::Failed(reason.to_string())));
    }
}

pub struct Initialization<S> {
    rx: oneshot::Receiver<Outcome<S>>,
}

impl<S> Initialization<S> {
    /// Blocks the current thread until the initializer answers.
    ///
    /// # Errors
    ///
    /// If initialization failed or the initializer was dropped unresolved.
    pub fn wait(self) -> Outcome<S> {
        block_on(self)
    }
}

impl<S> Future for Initialization<S> {
    type Output = Outcome<S>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx
            .poll_unpin(cx)
            .map(|received| received.unwrap_or(Err(InitError::Abandoned)))
    }
}

#[must_use]
pub fn initialization<S>() -> (Initializer<S>, Initialization<S>) {
    let (tx, rx) = oneshot::channel();
    (Initializer { tx }, Initialization { rx })
}
