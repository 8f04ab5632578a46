//! Session lifecycle controller
//!
//! [`Controller`] is the only component that moves a session through its
//! lifecycle:
//!
//! ```text
//! waiting --start--> in progress --advance past last item--> completed
//! waiting | in progress --end--> completed
//! ```
//!
//! Every operation on a session runs under that session's lock. The lock
//! is held while the record is re-read, mutated, written back and the
//! resulting events are broadcast, so events reach clients in the order
//! their triggers happened and a submission never races an advance.
//! Unrelated sessions never contend.
//!
//! Live state (the item snapshot, the tally and the countdown) lives in
//! memory only. After a restart an in-progress session gets its item
//! snapshot back from the stored references, but tallies collected before
//! the restart are gone.

use std::sync::Arc;

use dashmap::DashMap;
use garde::Validate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::{
    TruncatedVec,
    config::Settings,
    constants,
    content::{Authoring, ContentId, ContentStatus, ItemId},
    countdown::Countdown,
    error::Error,
    join_code::JoinCode,
    message::{IncomingMessage, SyncMessage, UpdateMessage},
    names,
    participant::{self, Participant, Role},
    room::Rooms,
    sequencer::{Next, Position, Sequencer},
    session::{Action, Session, SessionId, Status},
    store::{SessionStore, StoreError},
    summary::{Results, SessionSummary},
    tally::{AnswerValue, Aggregator, Tally},
    tunnel::Tunnel,
};

/// Result of advancing a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Another item is now current
    Item(Position),
    /// The last item was passed and the session completed
    Ended(SessionSummary),
}

/// In-memory state of one session, guarded by the session lock
#[derive(Default)]
struct Live {
    sequencer: Option<Sequencer>,
    aggregator: Aggregator,
    countdown: Option<Countdown>,
    results: Results,
    summary: Option<SessionSummary>,
}

/// Runs live sessions against an authoring subsystem and a session store
pub struct Controller<A, S, T> {
    authoring: Arc<A>,
    store: Arc<S>,
    rooms: Arc<Rooms<T>>,
    live: DashMap<SessionId, Arc<Mutex<Live>>>,
    settings: Settings,
}

impl<A, S, T> Controller<A, S, T>
where
    A: Authoring,
    S: SessionStore,
    T: Tunnel + Clone + 'static,
{
    /// Creates a controller with default settings
    pub fn new(authoring: Arc<A>, store: Arc<S>) -> Self {
        Self {
            authoring,
            store,
            rooms: Arc::new(Rooms::default()),
            live: DashMap::new(),
            settings: Settings::default(),
        }
    }

    /// Creates a controller with custom settings
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSettings` if the settings fail validation.
    pub fn with_settings(
        authoring: Arc<A>,
        store: Arc<S>,
        settings: Settings,
    ) -> Result<Self, Error> {
        settings
            .validate()
            .map_err(|report| Error::InvalidSettings(report.to_string()))?;
        Ok(Self {
            settings,
            ..Self::new(authoring, store)
        })
    }

    async fn load(&self, session: SessionId) -> Result<Session, Error> {
        self.store.get(session).await.map_err(|e| match e {
            StoreError::NotFound => Error::SessionNotFound,
            e => Error::Store(e),
        })
    }

    /// Takes the session lock and reads the record under it
    ///
    /// Unknown sessions are refused before a lock is allocated for them.
    async fn locked(&self, session: SessionId) -> Result<(OwnedMutexGuard<Live>, Session), Error> {
        self.load(session).await?;
        let lock = self.live.entry(session).or_default().clone();
        let guard = lock.lock_owned().await;
        let record = self.load(session).await?;
        Ok((guard, record))
    }

    fn roster(&self, session: &Session) -> TruncatedVec<String> {
        TruncatedVec::new(
            session.participants().iter().map(|p| p.name.clone()),
            self.settings.roster_display_limit,
            session.participants().len(),
        )
    }

    fn authorize_host(&self, session: &Session, caller: participant::Id, action: Action) -> Result<(), Error> {
        if session.is_host(caller) {
            Ok(())
        } else {
            warn!(session = %session.id(), caller = %caller, %action, "host-only action refused");
            Err(Error::Unauthorized)
        }
    }

    fn role(session: &Session, caller: participant::Id) -> Result<Role, Error> {
        if session.is_host(caller) {
            Ok(Role::Host)
        } else if session.is_participant(caller) {
            Ok(Role::Participant)
        } else {
            Err(Error::Unauthorized)
        }
    }

    /// Creates a waiting session for active content
    ///
    /// # Errors
    ///
    /// * `Error::ContentNotHostable` - the content is not active or has no items
    /// * `Error::JoinCodeExhausted` - no free join code was found
    /// * `Error::Authoring` / `Error::Store` - a collaborator failed
    pub async fn create_session(
        &self,
        content: &ContentId,
        host: participant::Id,
    ) -> Result<Session, Error> {
        let status = self.authoring.content_status(content).await?;
        if status != ContentStatus::Active {
            warn!(content = %content, ?status, "content is not hostable");
            return Err(Error::ContentNotHostable);
        }
        let items = self.authoring.items_in_order(content).await?;
        if items.is_empty() || items.len() > constants::session::MAX_ITEM_COUNT {
            warn!(content = %content, items = items.len(), "content has no items or too many");
            return Err(Error::ContentNotHostable);
        }

        for _ in 0..self.settings.join_code_attempts {
            let code = JoinCode::new();
            if self.store.join_code_in_flight(code).await? {
                continue;
            }
            let session = Session::new(content.clone(), host, code, items.clone());
            match self.store.insert(session.clone()).await {
                Ok(()) => {
                    self.rooms.open(session.id());
                    info!(
                        session = %session.id(),
                        join_code = %code,
                        content = %content,
                        "session created"
                    );
                    return Ok(session);
                }
                // lost a race for the code
                Err(StoreError::Conflict) => {}
                Err(e) => return Err(e.into()),
            }
        }
        warn!(content = %content, "ran out of join code attempts");
        Err(Error::JoinCodeExhausted)
    }

    async fn resolve_code(&self, code: JoinCode) -> Result<Session, Error> {
        let session = self
            .store
            .find_by_join_code(code)
            .await?
            .ok_or(Error::InvalidJoinCode)?;
        if session.status() == Status::Completed {
            return Err(Error::SessionAlreadyEnded);
        }
        Ok(session)
    }

    async fn join(
        &self,
        session: SessionId,
        participant: participant::Id,
        name: &str,
    ) -> Result<Session, Error> {
        let (_guard, mut record) = self.locked(session).await?;
        if record.is_host(participant) {
            warn!(session = %session, "host tried to join as a participant");
            return Err(Error::Unauthorized);
        }
        let joined = Participant::new(participant, names::clean(name)?);
        if record.add_participant(joined.clone(), self.settings.max_participants)? {
            self.store.save(&record).await?;
            info!(
                session = %session,
                participant = %participant,
                count = record.participants().len(),
                "participant joined"
            );
            self.rooms.announce(
                session,
                &UpdateMessage::ParticipantJoined {
                    participant: joined,
                    roster: self.roster(&record),
                },
            );
        }
        Ok(record)
    }

    /// Adds a participant to the session using `code`
    ///
    /// Joining again with the same identity changes nothing and broadcasts
    /// nothing.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidJoinCode` - no session uses the code
    /// * `Error::SessionAlreadyEnded` - the session is completed
    /// * `Error::SessionFull` - the roster is at its limit
    /// * `Error::Unauthorized` - the caller is the session's host
    /// * `Error::Name` - the display name was refused
    pub async fn join_session(
        &self,
        code: JoinCode,
        participant: participant::Id,
        name: &str,
    ) -> Result<Session, Error> {
        let session = self.resolve_code(code).await?;
        self.join(session.id(), participant, name).await
    }

    /// Makes `position` current: resets the tally, restarts the countdown
    /// and broadcasts the change
    fn present(&self, live: &mut Live, session: &Session, position: &Position, count: usize) {
        let id = session.id();
        live.countdown = None;
        live.aggregator.reset(&position.item);

        let time_limit = position.item.time_limit();
        self.rooms.announce(
            id,
            &UpdateMessage::ItemChanged {
                item: position.item.view(),
                index: position.index,
                count,
                is_last: position.is_last,
                countdown: time_limit,
            },
        );

        if let Some(limit) = time_limit {
            let rooms = Arc::clone(&self.rooms);
            live.countdown = Some(Countdown::start(
                position.item.id().clone(),
                limit,
                self.settings.tick_interval,
                move |item, remaining| {
                    debug!(session = %id, item = %item, remaining = remaining.as_secs(), "countdown tick");
                    rooms.announce(
                        id,
                        &UpdateMessage::CountdownTick {
                            item: item.clone(),
                            remaining,
                        },
                    );
                },
            ));
        }
    }

    /// Rebuilds the item snapshot of an in-progress session whose live
    /// state was lost
    async fn recover(&self, live: &mut Live, session: &Session) -> Result<(), Error> {
        if session.status() != Status::InProgress || live.sequencer.is_some() {
            return Ok(());
        }
        let sequencer = Sequencer::resolve(&*self.authoring, session.items().to_vec()).await?;
        if let Some(position) = session.current_index().and_then(|i| sequencer.position(i)) {
            live.aggregator.reset(&position.item);
        }
        live.results.start();
        live.sequencer = Some(sequencer);
        self.rooms.open(session.id());
        warn!(
            session = %session.id(),
            index = ?session.current_index(),
            "rebuilt live state; earlier tallies are lost"
        );
        Ok(())
    }

    /// Starts a waiting session and presents its first item
    ///
    /// The item order and bodies are captured here; later edits to the
    /// content do not affect the session.
    ///
    /// # Errors
    ///
    /// * `Error::Unauthorized` - the caller is not the host
    /// * `Error::SessionAlreadyEnded` - the session is completed
    /// * `Error::InvalidStateTransition` - not waiting, or nobody has joined
    /// * `Error::ContentNotHostable` / `Error::InvalidItem` - the content
    ///   cannot be presented
    pub async fn start_session(
        &self,
        session: SessionId,
        caller: participant::Id,
    ) -> Result<Position, Error> {
        let (mut guard, mut record) = self.locked(session).await?;
        let live = &mut *guard;
        self.authorize_host(&record, caller, Action::Start)?;
        record.check(Action::Start)?;

        let sequencer = Sequencer::snapshot(&*self.authoring, record.content_id()).await?;
        let position = sequencer.position(0).ok_or(Error::ContentNotHostable)?;
        record.begin(sequencer.refs().to_vec())?;
        self.store.save(&record).await?;

        let count = sequencer.len();
        live.results.start();
        live.sequencer = Some(sequencer);
        info!(session = %session, items = count, participants = record.participants().len(), "session started");
        self.present(live, &record, &position, count);
        Ok(position)
    }

    /// Moves to the next item, completing the session after the last one
    ///
    /// # Errors
    ///
    /// * `Error::Unauthorized` - the caller is not the host
    /// * `Error::SessionAlreadyEnded` - the session is completed
    /// * `Error::InvalidStateTransition` - the session has not started
    pub async fn advance_item(
        &self,
        session: SessionId,
        caller: participant::Id,
    ) -> Result<Advance, Error> {
        let (mut guard, mut record) = self.locked(session).await?;
        let live = &mut *guard;
        self.authorize_host(&record, caller, Action::Advance)?;
        record.check(Action::Advance)?;
        self.recover(live, &record).await?;

        let Some(sequencer) = live.sequencer.as_ref() else {
            return Err(Error::SessionNotFound);
        };
        let count = sequencer.len();
        match sequencer.next(record.current_index()) {
            Next::Item(position) => {
                record.advance_to(position.index)?;
                self.store.save(&record).await?;
                if let Some(done) = live.aggregator.take() {
                    live.results.record(done);
                }
                info!(session = %session, index = position.index, item = %position.item.id(), "item changed");
                self.present(live, &record, &position, count);
                Ok(Advance::Item(position))
            }
            Next::Exhausted => self.finish(live, &mut record).await.map(Advance::Ended),
        }
    }

    async fn finish(&self, live: &mut Live, record: &mut Session) -> Result<SessionSummary, Error> {
        record.complete()?;
        self.store.save(record).await?;

        live.countdown = None;
        live.sequencer = None;
        if let Some(done) = live.aggregator.take() {
            live.results.record(done);
        }
        // only the summary outlives completion
        let summary = std::mem::take(&mut live.results).finish(record);
        live.summary = Some(summary.clone());

        let id = record.id();
        self.rooms
            .announce(id, &UpdateMessage::SessionEnded(summary.clone()));
        self.rooms.close(id);
        info!(
            session = %id,
            questions = summary.questions.len(),
            participants = summary.participants.len(),
            "session ended"
        );
        Ok(summary)
    }

    /// Completes the session and returns its summary
    ///
    /// Ending an already completed session returns the same summary.
    ///
    /// # Errors
    ///
    /// * `Error::Unauthorized` - the caller is not the host
    pub async fn end_session(
        &self,
        session: SessionId,
        caller: participant::Id,
    ) -> Result<SessionSummary, Error> {
        let (mut guard, mut record) = self.locked(session).await?;
        let live = &mut *guard;
        self.authorize_host(&record, caller, Action::End)?;
        if record.status() == Status::Completed {
            return Ok(live
                .summary
                .get_or_insert_with(|| live.results.finish(&record))
                .clone());
        }
        self.finish(live, &mut record).await
    }

    /// Counts a participant's answer to the current question and
    /// broadcasts the new tally
    ///
    /// # Errors
    ///
    /// * `Error::SessionAlreadyEnded` - the session is completed
    /// * `Error::Unauthorized` - the caller is not on the roster
    /// * `Error::StaleSubmission` - `item` is not the current question
    /// * `Error::DuplicateSubmission` - the caller already answered it
    /// * `Error::InvalidAnswer` - the answer does not fit the question
    pub async fn submit_answer(
        &self,
        session: SessionId,
        participant: participant::Id,
        item: &ItemId,
        value: AnswerValue,
    ) -> Result<Tally, Error> {
        let (mut guard, record) = self.locked(session).await?;
        let live = &mut *guard;
        match record.status() {
            Status::Completed => return Err(Error::SessionAlreadyEnded),
            _ if !record.is_participant(participant) => return Err(Error::Unauthorized),
            Status::Waiting => return Err(Error::StaleSubmission),
            Status::InProgress => {}
        }
        self.recover(live, &record).await?;

        let tally = live
            .aggregator
            .submit(participant, item, value)
            .inspect_err(|error| {
                debug!(session = %session, participant = %participant, item = %item, %error, "submission refused");
            })?;
        debug!(session = %session, participant = %participant, item = %item, total = tally.total, "answer counted");
        self.rooms.announce(session, &UpdateMessage::tally(tally.clone()));
        Ok(tally)
    }

    fn sync_state(live: &mut Live, record: &Session, caller: participant::Id, role: Role, roster: TruncatedVec<String>) -> SyncMessage {
        match record.status() {
            Status::Completed => SyncMessage::SessionEnded(
                live.summary
                    .get_or_insert_with(|| live.results.finish(record))
                    .clone(),
            ),
            Status::Waiting if role == Role::Host => SyncMessage::SessionCreated {
                session: record.id(),
                join_code: record.join_code(),
                roster,
            },
            Status::Waiting => SyncMessage::Waiting { roster },
            Status::InProgress => {
                let position = live
                    .sequencer
                    .as_ref()
                    .zip(record.current_index())
                    .and_then(|(sequencer, index)| {
                        sequencer.position(index).map(|p| (p, sequencer.len()))
                    });
                let Some((position, count)) = position else {
                    return SyncMessage::Waiting { roster };
                };
                let remaining = live
                    .countdown
                    .as_ref()
                    .filter(|c| c.item() == position.item.id())
                    .map(Countdown::remaining);
                SyncMessage::Item {
                    item: position.item.view(),
                    index: position.index,
                    count,
                    is_last: position.is_last,
                    remaining,
                    tally: live.aggregator.current().cloned(),
                    answered: live.aggregator.has_answered(caller),
                }
            }
        }
    }

    /// The full current state as `caller` should see it
    ///
    /// # Errors
    ///
    /// * `Error::Unauthorized` - the caller is neither host nor participant
    pub async fn snapshot(
        &self,
        session: SessionId,
        caller: participant::Id,
    ) -> Result<SyncMessage, Error> {
        let (mut guard, record) = self.locked(session).await?;
        let live = &mut *guard;
        let role = Self::role(&record, caller)?;
        self.recover(live, &record).await?;
        Ok(Self::sync_state(live, &record, caller, role, self.roster(&record)))
    }

    /// Subscribes a connection to the session's broadcasts and sends it the
    /// current state
    ///
    /// Attaching again replaces the previous connection. A connection to a
    /// completed session receives the summary and is closed.
    ///
    /// # Errors
    ///
    /// * `Error::Unauthorized` - the caller is neither host nor participant
    pub async fn attach(
        &self,
        session: SessionId,
        caller: participant::Id,
        tunnel: T,
    ) -> Result<(), Error> {
        let (mut guard, record) = self.locked(session).await?;
        let live = &mut *guard;
        let role = Self::role(&record, caller)?;
        self.recover(live, &record).await?;
        let state = Self::sync_state(live, &record, caller, role, self.roster(&record));

        if record.status() != Status::Completed {
            self.rooms.open(session);
        }
        match self.rooms.attach(session, caller, role, tunnel) {
            Ok(()) => {
                self.rooms.send_state(session, caller, &state);
                debug!(session = %session, caller = %caller, ?role, "connection attached");
            }
            Err(tunnel) => {
                tunnel.send_state(&state);
                tunnel.close();
            }
        }
        Ok(())
    }

    /// Drops the caller's connection
    ///
    /// Participants stay on the roster and may attach again.
    pub fn detach(&self, session: SessionId, caller: participant::Id) {
        let Some(role) = self.rooms.detach(session, caller) else {
            return;
        };
        debug!(session = %session, caller = %caller, ?role, "connection detached");
        if role == Role::Participant {
            self.rooms.announce_role(
                session,
                Role::Host,
                &UpdateMessage::ParticipantLeft {
                    participant: caller,
                },
            );
        }
    }

    /// Drops the in-memory state of a completed session and returns its
    /// summary
    ///
    /// Returns `None`, keeping everything, if the session has not completed
    /// in this process. Afterwards the session is still readable from the
    /// store, but a summary rebuilt for it has no per-question results.
    pub async fn forget(&self, session: SessionId) -> Option<SessionSummary> {
        let lock = self.live.get(&session)?.clone();
        let live = lock.lock().await;
        let summary = live.summary.clone()?;
        self.live.remove(&session);
        debug!(session = %session, "live state released");
        Some(summary)
    }

    async fn receive_join(
        &self,
        session: SessionId,
        caller: participant::Id,
        code: &str,
        name: &str,
        origin: &T,
    ) -> Result<(), Error> {
        let code = code.parse::<JoinCode>().map_err(|_| Error::InvalidJoinCode)?;
        let found = self.resolve_code(code).await?;
        if found.id() != session {
            return Err(Error::InvalidJoinCode);
        }
        self.join(session, caller, name).await?;
        self.attach(session, caller, origin.clone()).await
    }

    /// Handles a message from `caller`'s connection to `session`
    ///
    /// A successful join also attaches `origin` to the session. Failures
    /// are reported to `origin` only, as [`UpdateMessage::Rejected`].
    pub async fn receive_message(
        &self,
        session: SessionId,
        caller: participant::Id,
        message: IncomingMessage,
        origin: &T,
    ) {
        let result = match message {
            IncomingMessage::Join { code, name } => {
                self.receive_join(session, caller, &code, &name, origin).await
            }
            IncomingMessage::Submit { item, value } => self
                .submit_answer(session, caller, &item, value)
                .await
                .map(|_| ()),
            IncomingMessage::Advance => self.advance_item(session, caller).await.map(|_| ()),
            IncomingMessage::End => self.end_session(session, caller).await.map(|_| ()),
        };

        if let Err(error) = result {
            if error.is_user_facing() {
                debug!(session = %session, caller = %caller, %error, "request rejected");
            } else {
                warn!(session = %session, caller = %caller, %error, "request failed");
            }
            origin.send_message(&UpdateMessage::Rejected { error });
        }
    }
}
