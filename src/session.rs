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

//! One signed in user's view of the tournaments collection.
//!
//! A [`Session`] owns everything a client keeps between store notifications:
//! the signed in identity, the live subscription, the last snapshot, the
//! selected tournament and the derived [`Dashboard`]. Each notification
//! replaces the snapshot, rebuilds the dashboard and runs one repair pass.

use std::{fmt, sync::Arc, time::Duration};

use log::{debug, error, info};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    clock::{Clock, Millis, SystemClock},
    fixture::{Fixture, build_fixtures},
    format::Format,
    identity::Identity,
    init::{Backends, InitError, Initialization},
    join::{JoinCoordinator, JoinError},
    normalize::{
        BREAK_MINUTES, DEFAULT_GAME_TYPE, MATCH_DURATION_MINUTES, MAX_PARTICIPANTS, NAME_MIN_LEN,
        is_valid_record, sanitize_name,
    },
    repair::{RepairReport, RepairService},
    schedule::format_kickoff,
    store::{
        RecordStore, Snapshot, StoreError, StoreEvent, Subscription, TOURNAMENTS, server_timestamp,
    },
    tournament::{JoinState, Participant, Tournament},
};

pub const NO_TOURNAMENTS: &str = "No tournaments yet. Create one to get started.";
pub const NEED_MORE_TEAMS: &str = "Need at least 2 participants/teams for fixtures.";

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SessionError {
    #[error("You must be logged in.")]
    NotSignedIn,
    #[error(
        "Tournament name must be at least 3 valid characters (letters, numbers, spaces, - or _)."
    )]
    InvalidName,
    #[error("No tournament with id {0}.")]
    NoTournament(String),
    #[error("Not listening to the tournament store.")]
    NotListening,
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error("{}", .0.user_message())]
    Store(#[from] StoreError),
    #[error(transparent)]
    Init(#[from] InitError),
}

/// A tournament as the list of tournaments shows it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub game_type: String,
    pub format: Format,
    pub participants: usize,
    pub capacity: u32,
    pub join_deadline: Option<Millis>,
    pub state: JoinState,
}

impl Listing {
    fn new(tournament: &Tournament, uid: Option<&str>, now: Millis) -> Self {
        Self {
            id: tournament.id.clone(),
            name: tournament.name.clone(),
            game_type: tournament.game_type.clone(),
            format: tournament.format,
            participants: tournament.participant_count(),
            capacity: tournament.max_participants,
            join_deadline: tournament.join_deadline,
            state: tournament.join_state(uid, now),
        }
    }

    #[must_use]
    pub fn can_join(&self) -> bool {
        self.state == JoinState::Open
    }

    #[must_use]
    pub fn deadline_label(&self) -> String {
        match self.join_deadline {
            Some(deadline) => format!("Join by: {}", format_kickoff(Some(deadline))),
            None => "Join anytime".to_string(),
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        write!(
            f,
            "  ID: {} | {} | {} | Players: {}/{} | {} | Status: {}",
            self.id,
            self.game_type,
            self.format,
            self.participants,
            self.capacity,
            self.deadline_label(),
            self.state
        )
    }
}

/// The scheduled fixtures of one tournament.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Preview {
    pub tournament: Tournament,
    pub fixtures: Vec<Fixture>,
}

impl Preview {
    #[must_use]
    pub fn new(tournament: Tournament) -> Self {
        let fixtures = build_fixtures(&tournament);
        Self {
            tournament,
            fixtures,
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        self.fixtures.is_empty().then_some(NEED_MORE_TEAMS)
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fixtures for {} ({})",
            self.tournament.name, self.tournament.format
        )?;

        if let Some(message) = self.message() {
            return write!(f, "\n  {message}");
        }
        for fixture in &self.fixtures {
            write!(f, "\n  {fixture}")?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Dashboard {
    pub listings: Vec<Listing>,
    pub preview: Option<Preview>,
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.listings.is_empty() {
            return write!(f, "{NO_TOURNAMENTS}");
        }

        for listing in &self.listings {
            writeln!(f, "{listing}")?;
        }
        if let Some(preview) = &self.preview {
            write!(f, "\n{preview}")?;
        }

        Ok(())
    }
}

/// What an organizer fills in to create a tournament. Unset settings take
/// their defaults.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TournamentDraft {
    pub name: String,
    pub game_type: Option<String>,
    pub format: Option<Format>,
    pub join_deadline: Option<Millis>,
    pub start_at: Option<Millis>,
    pub match_duration_minutes: Option<u32>,
    pub break_minutes: Option<u32>,
    pub max_participants: Option<u32>,
    pub seed_teams: Vec<String>,
}

impl TournamentDraft {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// The document to store for this draft, owned by and already joined by
    /// `owner`.
    ///
    /// # Errors
    ///
    /// If the sanitized name is too short.
    pub fn to_record(&self, owner: &Identity) -> Result<Value, SessionError> {
        let name = sanitize_name(&self.name);
        if name.chars().count() < NAME_MIN_LEN {
            return Err(SessionError::InvalidName);
        }

        let game_type = self
            .game_type
            .as_deref()
            .filter(|game_type| !game_type.is_empty())
            .unwrap_or(DEFAULT_GAME_TYPE);
        let format = self
            .format
            .unwrap_or_else(|| Format::recommended_for(game_type));

        let mut record = json!({
            "name": name,
            "ownerUid": owner.uid,
            "createdAt": server_timestamp(),
            "gameType": game_type,
            "format": format,
            "matchDurationMinutes": MATCH_DURATION_MINUTES.apply(self.match_duration_minutes.map(f64::from)),
            "breakMinutes": BREAK_MINUTES.apply(self.break_minutes.map(f64::from)),
            "maxParticipants": MAX_PARTICIPANTS.apply(self.max_participants.map(f64::from)),
            "participants": {
                owner.uid.as_str(): {
                    "uid": owner.uid,
                    "displayName": owner.display_name(),
                    "joinedAt": server_timestamp(),
                },
            },
        });

        if let Some(fields) = record.as_object_mut() {
            if let Some(join_deadline) = self.join_deadline.filter(|millis| *millis != 0) {
                fields.insert("joinDeadline".to_string(), json!(join_deadline));
            }
            if let Some(start_at) = self.start_at.filter(|millis| *millis != 0) {
                fields.insert("startAt".to_string(), json!(start_at));
            }
            if !self.seed_teams.is_empty() {
                fields.insert("seedTeams".to_string(), json!(self.seed_teams));
            }
        }

        Ok(record)
    }
}

pub struct Session<S, C = SystemClock> {
    store: Arc<S>,
    clock: C,
    identity: Option<Identity>,
    subscription: Option<Subscription>,
    snapshot: Snapshot,
    selected: Option<String>,
    dashboard: Dashboard,
}

impl<S: RecordStore> Session<S, SystemClock> {
    /// Waits for the backends to come up and opens a session on them.
    ///
    /// # Errors
    ///
    /// If initialization failed or was abandoned.
    pub async fn connect(initialization: Initialization<S>) -> Result<Self, SessionError> {
        let backends = initialization.await?;
        Ok(Self::new(backends, SystemClock))
    }
}

impl<S: RecordStore, C: Clock> Session<S, C> {
    #[must_use]
    pub fn new(backends: Backends<S>, clock: C) -> Self {
        Self {
            store: backends.store,
            clock,
            identity: backends.identity,
            subscription: None,
            snapshot: Snapshot::new(),
            selected: None,
            dashboard: Dashboard::default(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn sign_in(&mut self, identity: Identity) {
        info!("signed in as {}", identity.uid);
        self.identity = Some(identity);
        self.refresh();
    }

    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!("{} signed out", identity.uid);
        }
        self.stop_listening();
        self.refresh();
    }

    /// Subscribes to the tournaments collection, dropping any earlier
    /// subscription first.
    ///
    /// # Errors
    ///
    /// If the store refuses the subscription.
    pub fn listen(&mut self) -> Result<(), SessionError> {
        self.stop_listening();
        self.subscription = Some(self.store.subscribe(TOURNAMENTS)?);
        debug!("listening to {TOURNAMENTS}");
        Ok(())
    }

    pub fn stop_listening(&mut self) {
        if self.subscription.take().is_some() {
            debug!("stopped listening to {TOURNAMENTS}");
        }
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    /// Handles the next notification if one is already waiting. Returns
    /// whether one was handled.
    ///
    /// # Errors
    ///
    /// If not listening, or if the store reported a failure. A failure leaves
    /// the cached snapshot as it was.
    pub fn try_next_update(&mut self) -> Result<bool, SessionError> {
        let event = self
            .subscription
            .as_ref()
            .ok_or(SessionError::NotListening)?
            .try_recv();
        self.handle(event)
    }

    /// Like [`Session::try_next_update`], waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// If not listening, or if the store reported a failure.
    pub fn next_update(&mut self, timeout: Duration) -> Result<bool, SessionError> {
        let event = self
            .subscription
            .as_ref()
            .ok_or(SessionError::NotListening)?
            .recv_timeout(timeout);
        self.handle(event)
    }

    /// Handles every waiting notification and returns how many there were.
    ///
    /// # Errors
    ///
    /// On the first failure reported by the store.
    pub fn drain_updates(&mut self) -> Result<usize, SessionError> {
        let mut handled = 0;
        while self.try_next_update()? {
            handled += 1;
        }
        Ok(handled)
    }

    fn handle(&mut self, event: Option<StoreEvent>) -> Result<bool, SessionError> {
        match event {
            None => Ok(false),
            Some(StoreEvent::Changed(snapshot)) => {
                let _report = self.apply_snapshot(snapshot);
                Ok(true)
            }
            Some(StoreEvent::Failed(error)) => {
                error!("{TOURNAMENTS}: {error}");
                Err(error.into())
            }
        }
    }

    /// Caches `snapshot`, rebuilds the dashboard and, when signed in, runs one
    /// repair pass over it.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Option<RepairReport> {
        let valid = snapshot.values().filter(|raw| is_valid_record(raw)).count();
        debug!(
            "{TOURNAMENTS}: {valid} valid of {} records",
            snapshot.len()
        );

        self.snapshot = snapshot;
        self.refresh();

        self.identity
            .is_some()
            .then(|| RepairService::new(self.store.as_ref()).repair(TOURNAMENTS, &self.snapshot))
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn tournaments(&self) -> impl Iterator<Item = Tournament> + '_ {
        self.snapshot
            .iter()
            .filter_map(|(id, raw)| Tournament::normalize(id, raw))
    }

    #[must_use]
    pub fn listings(&self) -> Vec<Listing> {
        let uid = self.identity.as_ref().map(|identity| identity.uid.as_str());
        let now = self.clock.now_millis();

        self.tournaments()
            .map(|tournament| Listing::new(&tournament, uid, now))
            .collect()
    }

    /// # Errors
    ///
    /// If the cached snapshot holds no valid tournament with that id.
    pub fn select(&mut self, tournament_id: &str) -> Result<(), SessionError> {
        if !self.snapshot.get(tournament_id).is_some_and(is_valid_record) {
            return Err(SessionError::NoTournament(tournament_id.to_string()));
        }

        self.selected = Some(tournament_id.to_string());
        self.refresh();
        Ok(())
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The fixtures of the selected tournament, or of the first valid one when
    /// the selection is gone.
    #[must_use]
    pub fn preview(&self) -> Option<Preview> {
        let selected = self.selected.as_deref().and_then(|id| {
            self.snapshot
                .get(id)
                .and_then(|raw| Tournament::normalize(id, raw))
        });

        selected
            .or_else(|| self.tournaments().next())
            .map(Preview::new)
    }

    #[must_use]
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    fn refresh(&mut self) {
        self.dashboard = Dashboard {
            listings: self.listings(),
            preview: self.preview(),
        };
    }

    /// Stores a new tournament and returns its id.
    ///
    /// # Errors
    ///
    /// If nobody is signed in, the name is too short or the store refuses.
    pub fn create_tournament(&self, draft: &TournamentDraft) -> Result<String, SessionError> {
        let identity = self.identity.as_ref().ok_or(SessionError::NotSignedIn)?;
        let record = draft.to_record(identity)?;
        let id = self.store.push(TOURNAMENTS, record)?;

        info!("{TOURNAMENTS}/{id}: created by {}", identity.uid);
        Ok(id)
    }

    /// # Errors
    ///
    /// If nobody is signed in, the tournament turned the player away or the
    /// store failed.
    pub fn join(&self, tournament_id: &str) -> Result<Participant, SessionError> {
        let identity = self.identity.as_ref().ok_or(SessionError::NotSignedIn)?;
        let participant =
            JoinCoordinator::new(self.store.as_ref(), &self.clock).join(tournament_id, identity)?;
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use crate::{
        clock::{FixedClock, HOUR},
        init::initialization,
        join::BlockReason,
        memory_store::MemoryStore,
    };

    use super::*;

    const NOW: Millis = 1_800_000_000_000;

    fn alice() -> Identity {
        Identity::new("alice", Some("alice@example.com"))
    }

    type TestSession = Session<MemoryStore<FixedClock>, FixedClock>;

    fn session(records: Snapshot, identity: Option<Identity>) -> TestSession {
        let store =
            MemoryStore::with_clock(FixedClock::new(NOW)).with_records(TOURNAMENTS, records);
        Session::new(
            Backends {
                store: Arc::new(store),
                identity,
            },
            FixedClock::new(NOW),
        )
    }

    fn records(entries: &[(&str, Value)]) -> Snapshot {
        entries
            .iter()
            .map(|(id, raw)| ((*id).to_string(), raw.clone()))
            .collect()
    }

    #[test]
    fn signed_out_users_cannot_create_or_join() {
        let session = session(Snapshot::new(), None);

        let created = session.create_tournament(&TournamentDraft::new("Spring Cup"));
        assert_eq!(created, Err(SessionError::NotSignedIn));
        assert_eq!(
            session.join("anything").map_err(|error| error.to_string()),
            Err("You must be logged in.".to_string())
        );
    }

    #[test]
    fn short_names_are_rejected() {
        let session = session(Snapshot::new(), Some(alice()));
        let created = session.create_tournament(&TournamentDraft::new(" <a!> "));

        assert_eq!(created, Err(SessionError::InvalidName));
        assert!(
            session
                .store()
                .collection(TOURNAMENTS)
                .is_ok_and(|tournaments| tournaments.is_empty())
        );
    }

    #[test]
    fn created_tournaments_are_complete() -> anyhow::Result<()> {
        let session = session(Snapshot::new(), Some(alice()));
        let draft = TournamentDraft {
            game_type: Some("cricket_t20".to_string()),
            match_duration_minutes: Some(500),
            break_minutes: Some(0),
            start_at: Some(NOW + HOUR),
            seed_teams: vec!["Falcons".to_string()],
            ..TournamentDraft::new("  T20 <Bash>  ")
        };

        let id = session.create_tournament(&draft)?;
        let record = session
            .store()
            .read(&format!("{TOURNAMENTS}/{id}"))?
            .ok_or_else(|| anyhow::Error::msg("the tournament should be stored"))?;

        assert_eq!(
            record,
            json!({
                "name": "T20 Bash",
                "ownerUid": "alice",
                "createdAt": NOW,
                "gameType": "cricket_t20",
                "format": "league_knockout",
                "matchDurationMinutes": 240,
                "breakMinutes": 0,
                "maxParticipants": 8,
                "startAt": NOW + HOUR,
                "seedTeams": ["Falcons"],
                "participants": {
                    "alice": { "uid": "alice", "displayName": "alice", "joinedAt": NOW },
                },
            })
        );

        Ok(())
    }

    #[test]
    fn listings_show_join_states() -> anyhow::Result<()> {
        let mut session = session(
            records(&[
                ("a_open", json!({ "name": "Open Cup", "createdAt": 1, "participants": {} })),
                (
                    "b_closed",
                    json!({
                        "name": "Closed Cup",
                        "createdAt": 1,
                        "joinDeadline": NOW - 1,
                        "participants": {},
                    }),
                ),
                (
                    "c_full",
                    json!({
                        "name": "Full Cup",
                        "createdAt": 1,
                        "maxParticipants": 2,
                        "participants": { "x": { "uid": "x" }, "y": { "uid": "y" } },
                    }),
                ),
                (
                    "d_joined",
                    json!({
                        "name": "Mine Cup",
                        "createdAt": 1,
                        "maxParticipants": 2,
                        "participants": { "alice": { "uid": "alice" }, "y": { "uid": "y" } },
                    }),
                ),
                ("e_invalid", json!({ "name": "No" })),
            ]),
            Some(alice()),
        );
        session.listen()?;
        assert_eq!(session.drain_updates()?, 1);

        let states: Vec<(&str, JoinState)> = session
            .dashboard()
            .listings
            .iter()
            .map(|listing| (listing.id.as_str(), listing.state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("a_open", JoinState::Open),
                ("b_closed", JoinState::Closed),
                ("c_full", JoinState::Full),
                ("d_joined", JoinState::Joined),
            ]
        );

        let listing = &session.dashboard().listings[0];
        assert!(listing.can_join());
        assert_eq!(listing.deadline_label(), "Join anytime");
        assert!(listing.to_string().contains("Players: 0/8"));
        assert!(
            session.dashboard().listings[1]
                .deadline_label()
                .starts_with("Join by: ")
        );

        Ok(())
    }

    #[test]
    fn empty_dashboard_says_so() {
        let session = session(Snapshot::new(), None);
        assert_eq!(session.dashboard().to_string(), NO_TOURNAMENTS);
    }

    #[test]
    fn updates_repair_legacy_records_when_signed_in() -> anyhow::Result<()> {
        let mut session = session(
            records(&[("legacy", json!({ "name": "Legacy Cup", "ownerUid": "bob" }))]),
            Some(alice()),
        );
        session.listen()?;

        // The initial snapshot, then the one the repair wrote.
        assert_eq!(session.drain_updates()?, 2);
        assert_eq!(
            session.snapshot().get("legacy"),
            Some(&json!({
                "name": "Legacy Cup",
                "ownerUid": "bob",
                "createdAt": NOW,
                "participants": {},
            }))
        );

        Ok(())
    }

    #[test]
    fn signed_out_sessions_do_not_repair() -> anyhow::Result<()> {
        let legacy = records(&[("legacy", json!({ "name": "Legacy Cup" }))]);
        let mut session = session(legacy.clone(), None);
        let revision = session.store().revision()?;

        assert_eq!(session.apply_snapshot(legacy), None);
        assert_eq!(session.store().revision()?, revision);
        assert_eq!(
            session.store().read("tournaments/legacy")?,
            Some(json!({ "name": "Legacy Cup" }))
        );

        Ok(())
    }

    #[test]
    fn listen_replaces_the_old_subscription() -> anyhow::Result<()> {
        let mut session = session(
            records(&[(
                "t1",
                json!({ "name": "Only Cup", "createdAt": 1, "participants": {} }),
            )]),
            None,
        );

        session.listen()?;
        session.listen()?;
        assert_eq!(session.drain_updates()?, 1);

        session.stop_listening();
        assert_eq!(session.try_next_update(), Err(SessionError::NotListening));

        Ok(())
    }

    #[test]
    fn store_failures_leave_the_cache_alone() -> anyhow::Result<()> {
        let mut session = session(records(&[("t1", json!({ "name": "Kept Cup" }))]), None);
        session.listen()?;
        session.drain_updates()?;

        let error = StoreError::PermissionDenied(TOURNAMENTS.to_string());
        session.store().fail_listeners(&error)?;

        let failure = session.try_next_update();
        assert_eq!(failure, Err(SessionError::Store(error)));
        assert!(
            failure
                .map_err(|error| error.to_string())
                .is_err_and(|message| message.starts_with("Permission denied."))
        );
        assert_eq!(session.snapshot().len(), 1);
        assert_eq!(session.dashboard().listings.len(), 1);

        Ok(())
    }

    #[test]
    fn preview_falls_back_to_the_first_valid_tournament() -> anyhow::Result<()> {
        let mut session = session(
            records(&[
                ("a", json!({ "name": "No" })),
                ("b", json!({ "name": "Bravo Cup", "seedTeams": ["Ant", "Bee", "Cat"] })),
                (
                    "c",
                    json!({ "name": "Charlie Cup", "format": "round_robin", "seedTeams": ["Owl"] }),
                ),
            ]),
            None,
        );
        let _report = session.apply_snapshot(session.store().collection(TOURNAMENTS)?);

        let preview = session
            .preview()
            .ok_or_else(|| anyhow::Error::msg("expected a preview"))?;
        assert_eq!(preview.tournament.id, "b");
        assert_eq!(preview.fixtures.len(), 2);
        assert_eq!(preview.message(), None);

        assert_eq!(
            session.select("a"),
            Err(SessionError::NoTournament("a".to_string()))
        );
        session.select("c")?;
        let preview = session
            .preview()
            .ok_or_else(|| anyhow::Error::msg("expected a preview"))?;
        assert_eq!(preview.tournament.id, "c");
        assert_eq!(preview.message(), Some(NEED_MORE_TEAMS));
        assert!(preview.to_string().ends_with(NEED_MORE_TEAMS));
        assert_eq!(session.dashboard().preview, Some(preview));

        Ok(())
    }

    #[test]
    fn joining_through_the_session() -> anyhow::Result<()> {
        let mut session = session(
            records(&[("t1", json!({ "name": "Solo Cup", "maxParticipants": 1 }))]),
            Some(alice()),
        );

        let participant = session.join("t1")?;
        assert_eq!(participant.display_name, "alice");
        assert_eq!(
            session.join("t1"),
            Err(SessionError::Join(JoinError::Blocked(BlockReason::AlreadyJoined)))
        );

        session.sign_in(Identity::new("bob", Some("bob@example.com")));
        assert_eq!(
            session.join("t1").map_err(|error| error.to_string()),
            Err("Tournament is full.".to_string())
        );
        assert_eq!(
            session.join("gone").map_err(|error| error.to_string()),
            Err("Tournament no longer exists.".to_string())
        );

        Ok(())
    }

    #[test]
    fn sign_out_drops_the_listener() -> anyhow::Result<()> {
        let mut session = session(Snapshot::new(), Some(alice()));
        session.listen()?;
        session.sign_out();

        assert!(session.identity().is_none());
        assert!(!session.is_listening());

        Ok(())
    }

    #[test]
    fn connect_waits_for_the_backends() -> anyhow::Result<()> {
        let (resolver, pending) = initialization::<MemoryStore>();
        resolver.resolve(Backends {
            store: Arc::new(MemoryStore::new()),
            identity: Some(alice()),
        });

        let session = block_on(Session::connect(pending))?;
        assert_eq!(session.identity(), Some(&alice()));

        let (resolver, pending) = initialization::<MemoryStore>();
        drop(resolver);
        assert!(matches!(
            block_on(Session::connect(pending)),
            Err(SessionError::Init(InitError::Abandoned))
        ));

        Ok(())
    }
}
