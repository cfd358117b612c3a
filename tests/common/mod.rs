// Shared fakes for engine tests
#![allow(dead_code)]

use async_trait::async_trait;
use pawmatch_algo::config::EngineSettings;
use pawmatch_algo::core::{
    CompatibilityScorer, EngineDeps, LocationProvider, MatchRepository, ProfileSource,
    SwipeEngine, SwipeLedger,
};
use pawmatch_algo::error::EngineError;
use pawmatch_algo::models::{Coordinates, FilterState, Match, Profile, SwipeDecision};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const BERLIN: Coordinates = Coordinates { latitude: 52.52, longitude: 13.405 };
/// Roughly 5 km east of Berlin
pub const BERLIN_EAST: Coordinates = Coordinates { latitude: 52.52, longitude: 13.4788 };
pub const MUNICH: Coordinates = Coordinates { latitude: 48.1351, longitude: 11.582 };

pub fn dog(id: &str, age: u8, size: &str, energy: &str, location: Option<Coordinates>) -> Profile {
    Profile {
        id: id.to_string(),
        owner_id: format!("owner-{}", id),
        name: format!("Dog {}", id),
        age,
        size: size.to_string(),
        energy_level: energy.to_string(),
        breed: "Beagle".to_string(),
        location,
        photo_urls: vec![],
        bio: None,
    }
}

/// The swiping user's own dog
pub fn swiper() -> Profile {
    dog("me", 3, "MEDIUM", "HIGH", Some(BERLIN))
}

/// A candidate that scores 1.0 against [`swiper`]
pub fn perfect_candidate(id: &str) -> Profile {
    dog(id, 4, "MEDIUM", "HIGH", Some(BERLIN_EAST))
}

/// A candidate that only matches on age and distance (score 0.5)
pub fn weak_candidate(id: &str) -> Profile {
    dog(id, 3, "LARGE", "LOW", Some(BERLIN_EAST))
}

pub fn batch(ids: &[&str]) -> Vec<Profile> {
    ids.iter().map(|id| weak_candidate(id)).collect()
}

/// Profile source replaying a fixed script of batches
///
/// Once the script runs dry every call returns an empty batch. With a gate
/// installed each call waits for one permit after taking its script entry.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Profile>, EngineError>>>,
    requested: Mutex<Vec<usize>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Profile>, EngineError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub fn gated(script: Vec<Result<Vec<Profile>, EngineError>>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(script)
        }
    }

    pub fn requested(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl ProfileSource for ScriptedSource {
    async fn get_batch(&self, size: usize) -> Result<Vec<Profile>, EngineError> {
        self.requested.lock().unwrap().push(size);
        let next = self.script.lock().unwrap().pop_front();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        next.unwrap_or_else(|| Ok(vec![]))
    }
}

pub struct StaticLocator {
    pub location: Result<Option<Coordinates>, EngineError>,
}

impl StaticLocator {
    pub fn at(location: Coordinates) -> Self {
        Self { location: Ok(Some(location)) }
    }

    pub fn failing(error: EngineError) -> Self {
        Self { location: Err(error) }
    }
}

#[async_trait]
impl LocationProvider for StaticLocator {
    async fn last_known_location(&self) -> Result<Option<Coordinates>, EngineError> {
        self.location.clone()
    }
}

/// Swipe ledger keeping every call; an installed gate holds each append
/// until a permit is added.
#[derive(Default)]
pub struct RecordingLedger {
    pub appended: Mutex<Vec<SwipeDecision>>,
    pub retracted: Mutex<Vec<(String, String)>>,
    pub append_error: Option<EngineError>,
    pub retract_error: Option<EngineError>,
    pub gate: Option<Arc<Semaphore>>,
}

impl RecordingLedger {
    pub fn decisions(&self) -> Vec<SwipeDecision> {
        self.appended.lock().unwrap().clone()
    }

    pub fn retractions(&self) -> Vec<(String, String)> {
        self.retracted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwipeLedger for RecordingLedger {
    async fn append(&self, decision: &SwipeDecision) -> Result<(), EngineError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.appended.lock().unwrap().push(decision.clone());
        match &self.append_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn retract(&self, swiper_id: &str, swiped_id: &str) -> Result<(), EngineError> {
        self.retracted
            .lock()
            .unwrap()
            .push((swiper_id.to_string(), swiped_id.to_string()));
        match &self.retract_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingMatches {
    pub created: Mutex<Vec<Match>>,
    pub error: Option<EngineError>,
}

impl RecordingMatches {
    pub fn matches(&self) -> Vec<Match> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl MatchRepository for RecordingMatches {
    async fn create(&self, m: &Match) -> Result<(), EngineError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        self.created.lock().unwrap().push(m.clone());
        Ok(())
    }
}

/// Engine wired to fakes, with handles kept for assertions
pub struct Harness {
    pub engine: SwipeEngine,
    pub source: Arc<ScriptedSource>,
    pub ledger: Arc<RecordingLedger>,
    pub matches: Arc<RecordingMatches>,
}

pub struct HarnessBuilder {
    source: ScriptedSource,
    locator: Arc<dyn LocationProvider>,
    ledger: RecordingLedger,
    matches: RecordingMatches,
    filter: FilterState,
}

impl HarnessBuilder {
    pub fn new(source: ScriptedSource) -> Self {
        Self {
            source,
            locator: Arc::new(StaticLocator::at(BERLIN)),
            ledger: RecordingLedger::default(),
            matches: RecordingMatches::default(),
            filter: FilterState::permissive(),
        }
    }

    pub fn locator(mut self, locator: impl LocationProvider + 'static) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    pub fn ledger(mut self, ledger: RecordingLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn matches(mut self, matches: RecordingMatches) -> Self {
        self.matches = matches;
        self
    }

    pub fn filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self
    }

    pub fn build(self) -> Harness {
        let source = Arc::new(self.source);
        let ledger = Arc::new(self.ledger);
        let matches = Arc::new(self.matches);

        let deps = EngineDeps {
            source: source.clone(),
            locator: self.locator,
            ledger: ledger.clone(),
            matches: matches.clone(),
        };

        let engine = SwipeEngine::new(
            swiper(),
            self.filter,
            deps,
            EngineSettings::default(),
            CompatibilityScorer::default(),
        );

        Harness { engine, source, ledger, matches }
    }
}

/// Let spawned prefetch tasks run to completion
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
