//! Swipe engine - single owner of a user's swipe session.
//!
//! ```text
//! ProfileSource -> ProfileQueue -> current candidate -> decision
//!                        ^                                 |
//!                        |                 scorer -> ledger -> MatchCreator
//!                        +---- low-water prefetch <---- advance
//! ```
//!
//! Commands (`like`, `dislike`, `super_like`, `undo`, `refresh`,
//! `update_filters`, `acknowledge_match`) are serialized on a command lock.
//! Session state sits behind its own mutex which is never held across an
//! await, so prefetch results can be merged while a command is waiting on a
//! collaborator.
//!
//! Every reset bumps the session generation. A prefetch remembers the
//! generation it was started under and its result is dropped if the
//! generation has moved on.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::core::matcher::MatchCreator;
use crate::core::ports::{LocationProvider, MatchRepository, ProfileSource, SwipeLedger};
use crate::core::queue::ProfileQueue;
use crate::core::scoring::CompatibilityScorer;
use crate::core::state::{DecisionPhase, EngineState, MatchDetail};
use crate::core::undo::UndoBuffer;
use crate::error::EngineError;
use crate::models::{Coordinates, FilterState, Profile, SwipeDecision, SwipeDirection, SwipeTelemetry};

/// External collaborators a session talks to
#[derive(Clone)]
pub struct EngineDeps {
    pub source: Arc<dyn ProfileSource>,
    pub locator: Arc<dyn LocationProvider>,
    pub ledger: Arc<dyn SwipeLedger>,
    pub matches: Arc<dyn MatchRepository>,
}

/// Per-candidate engagement counters
#[derive(Debug)]
struct TelemetryTracker {
    view_started: Instant,
    photos_viewed: u32,
    scroll_depth: u32,
}

impl TelemetryTracker {
    fn new() -> Self {
        Self {
            view_started: Instant::now(),
            photos_viewed: 0,
            scroll_depth: 0,
        }
    }

    fn snapshot(&self) -> SwipeTelemetry {
        SwipeTelemetry {
            view_duration_ms: self.view_started.elapsed().as_millis() as u64,
            photos_viewed: self.photos_viewed,
            scroll_depth: self.scroll_depth,
        }
    }
}

struct Session {
    filter: FilterState,
    queue: ProfileQueue,
    undo: UndoBuffer,
    current: Option<Profile>,
    phase: DecisionPhase,
    telemetry: TelemetryTracker,
    generation: u64,
    /// Generation of the fetch currently running, if any
    in_flight: Option<u64>,
    prefetch: Option<JoinHandle<()>>,
    follower: Option<JoinHandle<()>>,
    last_refresh: Option<Instant>,
    shut_down: bool,
}

impl Session {
    fn fetch_in_flight(&self) -> bool {
        self.in_flight == Some(self.generation)
    }

    fn abort_tasks(&mut self) {
        if let Some(handle) = self.prefetch.take() {
            handle.abort();
        }
        if let Some(handle) = self.follower.take() {
            handle.abort();
        }
    }
}

struct EngineInner {
    swiper: Profile,
    settings: EngineSettings,
    scorer: CompatibilityScorer,
    match_creator: MatchCreator,
    source: Arc<dyn ProfileSource>,
    locator: Arc<dyn LocationProvider>,
    ledger: Arc<dyn SwipeLedger>,
    commands: tokio::sync::Mutex<()>,
    session: Mutex<Session>,
    state_tx: watch::Sender<EngineState>,
    candidate_tx: watch::Sender<Option<Profile>>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        let session = self.session.get_mut().unwrap_or_else(|e| e.into_inner());
        session.abort_tasks();
    }
}

/// Cloneable handle to one user's swipe session
#[derive(Clone)]
pub struct SwipeEngine {
    inner: Arc<EngineInner>,
}

impl SwipeEngine {
    /// Create an idle engine for `swiper`; call [`SwipeEngine::start`] to load.
    pub fn new(
        swiper: Profile,
        filter: FilterState,
        deps: EngineDeps,
        settings: EngineSettings,
        scorer: CompatibilityScorer,
    ) -> Self {
        let match_creator = MatchCreator::new(
            deps.matches,
            *scorer.thresholds(),
            settings.match_expiry(),
        );

        let mut queue = ProfileQueue::with_capacity(settings.batch_size + settings.low_water_mark);
        queue.mark_seen(swiper.id.clone());

        let session = Session {
            filter,
            queue,
            undo: UndoBuffer::new(settings.undo_capacity),
            current: None,
            phase: DecisionPhase::Idle,
            telemetry: TelemetryTracker::new(),
            generation: 0,
            in_flight: None,
            prefetch: None,
            follower: None,
            last_refresh: None,
            shut_down: false,
        };

        let (state_tx, _) = watch::channel(EngineState::Initial);
        let (candidate_tx, _) = watch::channel(None);

        Self {
            inner: Arc::new(EngineInner {
                swiper,
                settings,
                scorer,
                match_creator,
                source: deps.source,
                locator: deps.locator,
                ledger: deps.ledger,
                commands: tokio::sync::Mutex::new(()),
                session: Mutex::new(session),
                state_tx,
                candidate_tx,
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------------

    /// Subscribe to engine state changes
    pub fn state(&self) -> watch::Receiver<EngineState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribe to the displayed candidate
    pub fn candidate(&self) -> watch::Receiver<Option<Profile>> {
        self.inner.candidate_tx.subscribe()
    }

    pub fn current_state(&self) -> EngineState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn current_candidate(&self) -> Option<Profile> {
        self.inner.session().current.clone()
    }

    pub fn swiper(&self) -> &Profile {
        &self.inner.swiper
    }

    pub fn filters(&self) -> FilterState {
        self.inner.session().filter.clone()
    }

    pub fn phase(&self) -> DecisionPhase {
        self.inner.session().phase
    }

    pub fn generation(&self) -> u64 {
        self.inner.session().generation
    }

    pub fn queue_len(&self) -> usize {
        self.inner.session().queue.len()
    }

    pub fn undo_len(&self) -> usize {
        self.inner.session().undo.len()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.session().fetch_in_flight()
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Run the initial load
    pub async fn start(&self) {
        let _command = self.inner.commands.lock().await;
        let mut guard = self.inner.session();
        info!("Starting swipe session for profile {}", self.inner.swiper.id);
        self.inner.reset(&mut guard);
    }

    pub async fn like(&self) {
        self.decide(SwipeDirection::Like).await;
    }

    pub async fn super_like(&self) {
        self.decide(SwipeDirection::SuperLike).await;
    }

    pub async fn dislike(&self) {
        self.decide(SwipeDirection::Dislike).await;
    }

    /// Take back the most recent decision, if any
    pub async fn undo(&self) {
        let _command = self.inner.commands.lock().await;
        let inner = &self.inner;

        let entry = inner.session().undo.pop();
        let Some(entry) = entry else {
            debug!("Undo requested with empty buffer");
            return;
        };

        let failure = match inner.ledger.retract(&inner.swiper.id, &entry.profile.id).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to retract swipe on {}: {}", entry.profile.id, e);
                Some(e)
            }
        };

        let mut guard = inner.session();
        let session = &mut *guard;
        if let Some(current) = session.current.take() {
            session.queue.push_front(current);
        }
        debug!("Undoing {:?} on {}", entry.direction, entry.profile.id);
        session.queue.push_front(entry.profile);
        inner.advance(session);

        let state = match failure {
            Some(e) => EngineState::from_error(&e),
            None => EngineState::Success,
        };
        inner.emit(state);
    }

    /// Reset and reload, at most once per cooldown window
    pub async fn refresh(&self) {
        let _command = self.inner.commands.lock().await;
        let mut guard = self.inner.session();

        let now = Instant::now();
        if let Some(last) = guard.last_refresh {
            if now.duration_since(last) < self.inner.settings.refresh_cooldown() {
                debug!("Refresh ignored, cooldown active");
                return;
            }
        }
        guard.last_refresh = Some(now);

        info!("Refreshing swipe session for profile {}", self.inner.swiper.id);
        self.inner.reset(&mut guard);
    }

    /// Replace the filters and reset the session immediately
    pub async fn update_filters(&self, filter: FilterState) -> Result<(), EngineError> {
        let _command = self.inner.commands.lock().await;
        let filter = match filter.checked() {
            Ok(filter) => filter,
            Err(e) => {
                self.inner.emit(EngineState::from_error(&e));
                return Err(e);
            }
        };

        let mut guard = self.inner.session();
        info!("Filters updated for profile {}", self.inner.swiper.id);
        guard.filter = filter;
        self.inner.reset(&mut guard);
        Ok(())
    }

    /// Apply every filter emitted by `stream` for the lifetime of the engine
    pub fn follow_filters<S>(&self, stream: S)
    where
        S: Stream<Item = FilterState> + Send + 'static,
    {
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let mut stream = Box::pin(stream);
            while let Some(filter) = stream.next().await {
                let Some(inner) = weak.upgrade() else { break };
                let engine = SwipeEngine { inner };
                if let Err(e) = engine.update_filters(filter).await {
                    warn!("Ignoring invalid filter emission: {}", e);
                }
            }
        });

        let mut guard = self.inner.session();
        if guard.shut_down {
            handle.abort();
            return;
        }
        if let Some(previous) = guard.follower.replace(handle) {
            previous.abort();
        }
    }

    /// Leave the match screen
    pub async fn acknowledge_match(&self) {
        let _command = self.inner.commands.lock().await;
        let in_match = matches!(*self.inner.state_tx.borrow(), EngineState::Match { .. });
        if !in_match {
            return;
        }
        let has_candidate = self.inner.session().current.is_some();
        self.inner.emit(if has_candidate {
            EngineState::Success
        } else {
            EngineState::NoMoreProfiles
        });
    }

    pub fn record_photo_viewed(&self) {
        let mut guard = self.inner.session();
        if guard.current.is_some() {
            guard.telemetry.photos_viewed += 1;
        }
    }

    /// Track the deepest scroll position on the current candidate
    pub fn record_scroll(&self, depth: u32) {
        let mut guard = self.inner.session();
        if guard.current.is_some() {
            guard.telemetry.scroll_depth = guard.telemetry.scroll_depth.max(depth);
        }
    }

    /// Cancel background work; later results are ignored
    pub fn shutdown(&self) {
        let mut guard = self.inner.session();
        if guard.shut_down {
            return;
        }
        guard.shut_down = true;
        guard.generation += 1;
        guard.in_flight = None;
        guard.abort_tasks();
        info!("Swipe session for profile {} shut down", self.inner.swiper.id);
    }

    async fn decide(&self, direction: SwipeDirection) {
        let _command = self.inner.commands.lock().await;
        let inner = &self.inner;

        let (profile, telemetry) = {
            let mut guard = inner.session();
            let session = &mut *guard;
            match session.current.clone() {
                Some(profile) => {
                    session.phase = DecisionPhase::Deciding;
                    (profile, session.telemetry.snapshot())
                }
                None => {
                    // Nothing on screen: just try to move on
                    let state = if inner.advance(session) {
                        EngineState::Success
                    } else {
                        EngineState::NoMoreProfiles
                    };
                    inner.emit(state);
                    return;
                }
            }
        };

        let result = direction
            .is_like()
            .then(|| inner.scorer.score(&inner.swiper, &profile));

        let decision = SwipeDecision {
            swiper_id: inner.swiper.id.clone(),
            swiped_id: profile.id.clone(),
            is_like: direction.is_like(),
            is_super_like: direction == SwipeDirection::SuperLike,
            compatibility_score: result.as_ref().map(|r| r.score).unwrap_or(0.0),
            telemetry,
            created_at: Utc::now(),
        };

        let mut failure = None;
        if let Err(e) = inner.ledger.append(&decision).await {
            warn!("Failed to record swipe on {}: {}", profile.id, e);
            failure = Some(e);
        }
        inner.set_phase(DecisionPhase::Recorded);

        let mut matched = None;
        match result.filter(|r| r.is_match) {
            Some(result) => {
                inner.set_phase(DecisionPhase::MatchPending);
                match inner.match_creator.create_match(&result, &inner.swiper, &profile).await {
                    Ok(record) => {
                        matched = Some(MatchDetail {
                            record,
                            profile: profile.clone(),
                        });
                    }
                    Err(e) => {
                        warn!("Failed to persist match with {}: {}", profile.id, e);
                        failure.get_or_insert(e);
                    }
                }
            }
            None => inner.set_phase(DecisionPhase::NoMatch),
        }

        let mut guard = inner.session();
        let session = &mut *guard;
        session.undo.push(profile, direction);
        let shown = inner.advance(session);

        let state = match (failure, matched) {
            (Some(e), _) => EngineState::from_error(&e),
            (None, Some(detail)) => EngineState::Match {
                detail: Box::new(detail),
                is_super: direction == SwipeDirection::SuperLike,
            },
            (None, None) if shown => EngineState::Success,
            (None, None) => EngineState::NoMoreProfiles,
        };
        inner.emit(state);
    }
}

impl EngineInner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, state: EngineState) {
        debug!("Engine state -> {:?}", state);
        self.state_tx.send_replace(state);
    }

    fn set_phase(&self, phase: DecisionPhase) {
        self.session().phase = phase;
    }

    fn show(&self, session: &mut Session, profile: Option<Profile>) {
        session.phase = if profile.is_some() {
            DecisionPhase::Displayed
        } else {
            DecisionPhase::Idle
        };
        session.telemetry = TelemetryTracker::new();
        session.current = profile.clone();
        self.candidate_tx.send_replace(profile);
    }

    /// Display the next queued candidate and top up the queue.
    /// Returns whether a candidate is now on screen.
    fn advance(self: &Arc<Self>, session: &mut Session) -> bool {
        let next = session.queue.dequeue_next();
        let shown = next.is_some();
        self.show(session, next);
        self.maybe_prefetch(session);
        shown
    }

    /// Full reset: new generation, empty queue and dedup cache, reload
    fn reset(self: &Arc<Self>, session: &mut Session) {
        session.generation += 1;
        session.in_flight = None;
        if let Some(handle) = session.prefetch.take() {
            handle.abort();
        }
        session.queue.clear();
        session.queue.mark_seen(self.swiper.id.clone());
        session.undo.clear();
        self.show(session, None);
        self.emit(EngineState::Loading);
        self.maybe_prefetch(session);
    }

    fn maybe_prefetch(self: &Arc<Self>, session: &mut Session) {
        if session.shut_down
            || session.fetch_in_flight()
            || session.queue.len() >= self.settings.low_water_mark
        {
            return;
        }

        let generation = session.generation;
        session.in_flight = Some(generation);

        let weak: Weak<EngineInner> = Arc::downgrade(self);
        let source = self.source.clone();
        let locator = self.locator.clone();
        let size = self.settings.batch_size;

        debug!("Prefetching {} profiles (generation {})", size, generation);

        let handle = tokio::spawn(async move {
            let batch = source.get_batch(size).await;
            let origin = match batch {
                Ok(_) => Some(locator.last_known_location().await),
                Err(_) => None,
            };
            if let Some(inner) = weak.upgrade() {
                inner.merge_batch(generation, batch, origin);
            }
        });

        if let Some(previous) = session.prefetch.replace(handle) {
            // Only a finished or stale task can be left behind here
            previous.abort();
        }
    }

    fn merge_batch(
        &self,
        generation: u64,
        batch: Result<Vec<Profile>, EngineError>,
        origin: Option<Result<Option<Coordinates>, EngineError>>,
    ) {
        let mut guard = self.session();
        let session = &mut *guard;

        if session.shut_down || session.generation != generation {
            debug!(
                "Discarding stale batch from generation {} (now {})",
                generation, session.generation
            );
            return;
        }
        session.in_flight = None;
        session.prefetch = None;

        let profiles = match batch {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!("Profile prefetch failed: {}", e);
                self.emit(EngineState::from_error(&e));
                return;
            }
        };

        let (origin, location_error) = match origin {
            Some(Ok(origin)) => (origin, None),
            Some(Err(e)) => (None, Some(e)),
            None => (None, None),
        };

        let fetched = profiles.len();
        let added = session
            .queue
            .enqueue(profiles, &session.filter, origin, self.locator.as_ref());
        debug!(
            "Merged {} of {} fetched profiles (generation {}, queued {})",
            added,
            fetched,
            generation,
            session.queue.len()
        );

        // Errors are reported once; anything but the match screen gives way
        // to the outcome of this merge.
        if session.current.is_none() {
            let in_match = matches!(*self.state_tx.borrow(), EngineState::Match { .. });
            match session.queue.dequeue_next() {
                Some(next) => {
                    self.show(session, Some(next));
                    if !in_match {
                        self.emit(EngineState::Success);
                    }
                }
                None => {
                    if !in_match {
                        self.emit(EngineState::NoMoreProfiles);
                    }
                }
            }
        }

        if let Some(e) = location_error {
            warn!("Location unavailable, distance filter skipped: {}", e);
            self.emit(EngineState::from_error(&e));
        }
    }
}
