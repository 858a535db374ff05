//! One facade handle over the whole engine.
//!
//! [`Promotion`] wires the registry, director, simulator, ledger, and
//! booker together, optionally backed by the snapshot store and its
//! background writer. `open` restores whatever state the store holds and
//! keeps saving as the promotion runs; `ephemeral` skips persistence
//! entirely for tests and demos.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::booker::{BookerState, EventReport, PpvBooker};
use crate::config::KayfabeConfig;
use crate::director::{DirectorState, ResponderCue, StorylineDirector};
use crate::error::Result;
use crate::ledger::{ChampionshipLedger, LedgerState};
use crate::persistence::StateStore;
use crate::registry::CharacterRegistry;
use crate::simulator::MatchSimulator;
use crate::types::{CharacterId, TemplateId};
use crate::writer::{SnapshotHandle, SnapshotWriter, WriterStats};

// Component keys for the ledger and booker snapshots; the director names
// its own via `StorylineDirector::COMPONENT`.
const LEDGER_COMPONENT: &str = "ledger";
const BOOKER_COMPONENT: &str = "booker";

/// A running promotion: every engine plus optional persistence.
pub struct Promotion {
    registry: Arc<CharacterRegistry>,
    director: StorylineDirector,
    simulator: MatchSimulator,
    ledger: ChampionshipLedger,
    booker: PpvBooker,
    writer: Option<(SnapshotWriter, SnapshotHandle)>,
}

impl Promotion {
    /// Open a persistent promotion over the builtin roster.
    ///
    /// Builds the state store at the configured path, restores any
    /// component snapshots it holds (a missing or unreadable snapshot
    /// logs a warning and falls back to defaults), and spawns the
    /// background writer.
    ///
    /// # Errors
    /// Returns a database or I/O error if the store cannot be opened or
    /// the writer thread refuses to start.
    pub fn open(config: &KayfabeConfig) -> Result<Self> {
        Self::open_with_registry(config, Arc::new(CharacterRegistry::builtin()))
    }

    /// Open a persistent promotion over a caller-supplied roster.
    ///
    /// # Errors
    /// The errors of [`Self::open`].
    pub fn open_with_registry(
        config: &KayfabeConfig,
        registry: Arc<CharacterRegistry>,
    ) -> Result<Self> {
        let store = StateStore::open(&config.persistence.db_path, &config.persistence)?;
        let mut promotion = Self::assemble(config, registry);
        promotion.restore_from(&store);
        let (writer, handle) = SnapshotWriter::spawn(store)?;
        promotion.director.set_snapshot_sink(handle.clone());
        promotion.writer = Some((writer, handle));
        info!(
            db = %config.persistence.db_path,
            roster = promotion.registry.len(),
            "promotion opened"
        );
        Ok(promotion)
    }

    /// A promotion with no persistence at all, for tests and demos.
    #[must_use]
    pub fn ephemeral(config: &KayfabeConfig) -> Self {
        Self::assemble(config, Arc::new(CharacterRegistry::builtin()))
    }

    /// An ephemeral promotion with seeded RNGs for reproducible runs.
    #[must_use]
    pub fn ephemeral_with_seed(config: &KayfabeConfig, seed: u64) -> Self {
        let registry = Arc::new(CharacterRegistry::builtin());
        Self {
            director: StorylineDirector::with_seed(
                Arc::clone(&registry),
                config.director.clone(),
                seed,
            ),
            simulator: MatchSimulator::with_seed(
                Arc::clone(&registry),
                config.simulator.clone(),
                seed.wrapping_add(1),
            ),
            ledger: ChampionshipLedger::new(config.ledger.clone()),
            booker: PpvBooker::new(config.booker.clone()),
            registry,
            writer: None,
        }
    }

    fn assemble(config: &KayfabeConfig, registry: Arc<CharacterRegistry>) -> Self {
        Self {
            director: StorylineDirector::new(Arc::clone(&registry), config.director.clone()),
            simulator: MatchSimulator::new(Arc::clone(&registry), config.simulator.clone()),
            ledger: ChampionshipLedger::new(config.ledger.clone()),
            booker: PpvBooker::new(config.booker.clone()),
            registry,
            writer: None,
        }
    }

    fn restore_from(&mut self, store: &StateStore) {
        if let Some(state) = load_component::<DirectorState>(store, StorylineDirector::COMPONENT) {
            self.director.restore(state);
        }
        if let Some(state) = load_component::<LedgerState>(store, LEDGER_COMPONENT) {
            self.ledger.restore(state);
        }
        if let Some(state) = load_component::<BookerState>(store, BOOKER_COMPONENT) {
            self.booker.restore(state);
        }
    }

    // -- operating surface --------------------------------------------------

    /// Route one in-character message through the director.
    pub fn handle_message(&mut self, message: &str, author: &CharacterId) -> Vec<ResponderCue> {
        self.director.decide_responders(message, author)
    }

    /// Cut a scheduled promo with a random active character.
    pub fn cut_promo(&mut self) -> Option<ResponderCue> {
        self.director.cut_promo()
    }

    /// Schedule, auto-book, and run a full pay-per-view from a template.
    ///
    /// The card comes from the current feud table, hottest first, padded
    /// with idle active characters; titles are settled as results land,
    /// and every component snapshot is queued afterwards.
    ///
    /// # Errors
    /// `UnknownTemplate`, `EmptyCard` when there is nothing to book, or
    /// `EventInProgress` when an event is already running.
    pub fn run_ppv(&mut self, template: &TemplateId) -> Result<EventReport> {
        let event = self.booker.schedule_event(template, Vec::new(), Utc::now())?;
        let feuds = self.director.feuds().by_intensity_desc();
        let active = self.director.active().to_vec();
        self.booker.auto_book_card(event, &feuds, &active, &self.ledger)?;
        let report = self.booker.run_event(event, &mut self.simulator, &mut self.ledger)?;
        self.save_now();
        Ok(report)
    }

    /// Queue a snapshot of every component through the writer.
    ///
    /// Does nothing for an ephemeral promotion.
    pub fn save_now(&self) {
        let Some((_, handle)) = &self.writer else {
            return;
        };
        submit_snapshot(handle, StorylineDirector::COMPONENT, &self.director.snapshot());
        submit_snapshot(handle, LEDGER_COMPONENT, &self.ledger.snapshot());
        submit_snapshot(handle, BOOKER_COMPONENT, &self.booker.snapshot());
    }

    /// Save everything, flush the writer, and take a rotating backup.
    pub fn shutdown(mut self) {
        self.save_now();
        if let Some((writer, handle)) = self.writer.take() {
            writer.shutdown(&handle);
            info!("promotion shut down");
        }
    }

    // -- accessors ----------------------------------------------------------

    /// The persona catalog.
    #[must_use]
    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    /// The storyline director.
    #[must_use]
    pub fn director(&self) -> &StorylineDirector {
        &self.director
    }

    /// Mutable storyline director, for roster and feud management.
    pub fn director_mut(&mut self) -> &mut StorylineDirector {
        &mut self.director
    }

    /// The match simulator.
    #[must_use]
    pub fn simulator(&self) -> &MatchSimulator {
        &self.simulator
    }

    /// Mutable match simulator, for running one-off matches.
    pub fn simulator_mut(&mut self) -> &mut MatchSimulator {
        &mut self.simulator
    }

    /// The championship ledger.
    #[must_use]
    pub fn ledger(&self) -> &ChampionshipLedger {
        &self.ledger
    }

    /// Mutable championship ledger, for awards and vacates outside a match.
    pub fn ledger_mut(&mut self) -> &mut ChampionshipLedger {
        &mut self.ledger
    }

    /// The event booker.
    #[must_use]
    pub fn booker(&self) -> &PpvBooker {
        &self.booker
    }

    /// Mutable event booker, for hand-built cards.
    pub fn booker_mut(&mut self) -> &mut PpvBooker {
        &mut self.booker
    }

    /// Background writer counters, if persistence is on.
    #[must_use]
    pub fn writer_stats(&self) -> Option<WriterStats> {
        self.writer.as_ref().map(|(_, handle)| handle.stats())
    }
}

fn load_component<T: DeserializeOwned>(store: &StateStore, component: &str) -> Option<T> {
    match store.load_snapshot(component) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(state) => {
                info!(component, "component state restored");
                Some(state)
            }
            Err(e) => {
                warn!(component, error = %e, "snapshot decode failed; starting from defaults");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(component, error = %e, "snapshot load failed; starting from defaults");
            None
        }
    }
}

fn submit_snapshot<T: Serialize>(handle: &SnapshotHandle, component: &str, state: &T) {
    match serde_json::to_string(state) {
        Ok(json) => handle.snapshot(component, json),
        Err(e) => warn!(component, error = %e, "failed to encode component state"),
    }
}
