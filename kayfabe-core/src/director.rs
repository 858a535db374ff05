//! The narrative decision core.
//!
//! The director watches the conversation and decides, message by message,
//! which personas speak up, how feuds escalate, and when somebody walks out
//! of the wings unannounced. It owns every piece of mutable narrative state:
//! the roster partition, the feud book, heat records, alignment overrides,
//! and the rolling beat history. Its outputs are [`ResponderCue`] values,
//! compact directives an external text generator turns into in-character
//! lines; the director itself never produces prose.
//!
//! Persistence is fire-and-forget: when a snapshot sink is attached, state
//! is serialized on a fixed message cadence and every beat is appended to
//! the audit log, all through the background writer channel.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::DirectorConfig;
use crate::error::{KayfabeError, Result};
use crate::feud::{Feud, FeudBook};
use crate::heat::{dampening_factor, HeatTracker};
use crate::registry::CharacterRegistry;
use crate::story::{
    feud_directive, general_directive, pick_feud_beat, pick_promo_topic, pick_surprise_kind,
    promo_directive, surprise_directive, StoryBeatRecord,
};
use crate::types::{Alignment, CharacterId};
use crate::writer::SnapshotHandle;

// ---------------------------------------------------------------------------
// Responder cues
// ---------------------------------------------------------------------------

/// Why a cue was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CueKind {
    /// The author is a listed rival; the feud machinery produced context.
    FeudResponse,
    /// An ordinary reaction with no feud attached.
    GeneralResponse,
    /// An unannounced appearance from the wings.
    Surprise,
    /// A scheduled promo segment.
    Promo,
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeudResponse => write!(f, "feud-response"),
            Self::GeneralResponse => write!(f, "general-response"),
            Self::Surprise => write!(f, "surprise"),
            Self::Promo => write!(f, "promo"),
        }
    }
}

/// One character's cue to speak, with a directive for the text generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderCue {
    /// Who should speak.
    pub character: CharacterId,
    /// Why they are speaking.
    pub kind: CueKind,
    /// What the line should accomplish.
    pub directive: String,
}

impl ResponderCue {
    /// Whether this cue came from the surprise-entrance trigger.
    #[must_use]
    pub fn is_surprise(&self) -> bool {
        matches!(self.kind, CueKind::Surprise)
    }
}

// ---------------------------------------------------------------------------
// Mention matching
// ---------------------------------------------------------------------------

/// Name tokens shorter than this never count as a mention, so the article
/// in a ring name like "The Mortician" cannot match ordinary prose.
const MENTION_TOKEN_MIN: usize = 4;

fn message_tokens(message: &str) -> HashSet<String> {
    message
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MENTION_TOKEN_MIN)
        .map(str::to_string)
        .collect()
}

fn name_mentioned(name: &str, tokens: &HashSet<String>) -> bool {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MENTION_TOKEN_MIN)
        .any(|t| tokens.contains(t))
}

// ---------------------------------------------------------------------------
// Surprise trigger
// ---------------------------------------------------------------------------

/// Probability that a surprise entrance fires at a given beat count.
///
/// Zero below the minimum, then a linear ramp to the ceiling: with default
/// tuning, 0 at beat 8 up to the 0.35 plateau at beat 22.
#[must_use]
pub fn surprise_chance(beats_since_surprise: u32, config: &DirectorConfig) -> f32 {
    if beats_since_surprise < config.surprise_min_beats {
        return 0.0;
    }
    let over = (beats_since_surprise - config.surprise_min_beats) as f32;
    (over * config.surprise_ramp).min(config.surprise_ceiling)
}

// ---------------------------------------------------------------------------
// Director
// ---------------------------------------------------------------------------

/// The narrative decision engine.
///
/// Holds the mutable storyline state and an owned RNG; everything the
/// director decides flows through that RNG, so [`Self::with_seed`] gives
/// fully reproducible runs.
#[derive(Debug)]
pub struct StorylineDirector {
    registry: Arc<CharacterRegistry>,
    config: DirectorConfig,
    rng: StdRng,
    active: Vec<CharacterId>,
    wings: Vec<CharacterId>,
    feuds: FeudBook,
    heat: HeatTracker,
    alignment_overrides: HashMap<CharacterId, Alignment>,
    message_count: u64,
    beats_since_surprise: u32,
    history: Vec<StoryBeatRecord>,
    snapshot_sink: Option<SnapshotHandle>,
}

impl StorylineDirector {
    /// Component name under which director state is snapshotted.
    pub const COMPONENT: &'static str = "director";

    /// Create a director with an entropy-seeded RNG.
    ///
    /// Every registered persona starts active; the wings start empty and
    /// are populated through [`Self::send_to_wings`].
    #[must_use]
    pub fn new(registry: Arc<CharacterRegistry>, config: DirectorConfig) -> Self {
        Self::with_rng(registry, config, StdRng::from_entropy())
    }

    /// Create a director with a fixed seed for reproducible runs.
    #[must_use]
    pub fn with_seed(registry: Arc<CharacterRegistry>, config: DirectorConfig, seed: u64) -> Self {
        Self::with_rng(registry, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(registry: Arc<CharacterRegistry>, config: DirectorConfig, rng: StdRng) -> Self {
        let active = registry.ids().cloned().collect();
        let heat = HeatTracker::new(config.heat_window_minutes);
        Self {
            registry,
            config,
            rng,
            active,
            wings: Vec::new(),
            feuds: FeudBook::new(),
            heat,
            alignment_overrides: HashMap::new(),
            message_count: 0,
            beats_since_surprise: 0,
            history: Vec::new(),
            snapshot_sink: None,
        }
    }

    /// Attach the background writer so state and beats persist.
    pub fn set_snapshot_sink(&mut self, sink: SnapshotHandle) {
        self.snapshot_sink = Some(sink);
    }

    // -- message pipeline ---------------------------------------------------

    /// Decide who reacts to `message` from `author`, stamped with the
    /// current time.
    pub fn decide_responders(&mut self, message: &str, author: &CharacterId) -> Vec<ResponderCue> {
        self.decide_responders_at(message, author, Utc::now())
    }

    /// Decide who reacts to `message` from `author` as of `now`.
    ///
    /// Scans every active character except the author: base chance is
    /// `p_feud` when the author is a listed rival, else `p_base`, plus the
    /// mention bonus (capped at 1.0), then dampened by the responder's
    /// trailing heat. Each success records heat; rival responses also bump
    /// the feud and land in the beat history. The surprise trigger is
    /// evaluated once after the scan and its cue, if any, comes last.
    pub fn decide_responders_at(
        &mut self,
        message: &str,
        author: &CharacterId,
        now: DateTime<Utc>,
    ) -> Vec<ResponderCue> {
        self.message_count += 1;
        self.beats_since_surprise += 1;

        let registry = Arc::clone(&self.registry);
        let roster = self.active.clone();
        let tokens = message_tokens(message);
        let mut cues = Vec::new();

        for id in &roster {
            if id == author {
                continue;
            }
            let Some(character) = registry.get(id) else {
                continue;
            };
            let is_rival = character.is_rival_of(author);
            let base = if is_rival { character.p_feud } else { character.p_base };
            let mut chance = base;
            if name_mentioned(&character.name, &tokens) {
                chance += self.config.mention_bonus;
            }
            // The cap applies before dampening, never after.
            chance = chance.min(1.0);
            chance *= dampening_factor(self.heat.count(id, now), &self.config);

            if self.rng.gen_range(0.0_f32..1.0) >= chance {
                continue;
            }

            self.heat.record(id, now);
            let cue = if is_rival {
                self.feud_response(id.clone(), author.clone(), now)
            } else {
                ResponderCue {
                    character: id.clone(),
                    kind: CueKind::GeneralResponse,
                    directive: general_directive(registry.display_name(author)),
                }
            };
            cues.push(cue);
        }

        if let Some(cue) = self.roll_surprise(now) {
            cues.push(cue);
        }

        if self.config.snapshot_every > 0 && self.message_count % self.config.snapshot_every == 0 {
            self.persist_state();
        }

        debug!(
            author = %author,
            responders = cues.len(),
            message_count = self.message_count,
            "message scanned"
        );
        cues
    }

    fn feud_response(
        &mut self,
        responder: CharacterId,
        author: CharacterId,
        now: DateTime<Utc>,
    ) -> ResponderCue {
        let beat = pick_feud_beat(&mut self.rng);
        // Directive and history use the intensity as it stood when the
        // response happened; the bump lands afterwards.
        let intensity = self
            .feuds
            .intensity(&responder, &author)
            .unwrap_or(self.config.default_feud_intensity);
        let directive = feud_directive(beat, self.registry.display_name(&author), intensity);
        self.feuds.bump(
            &responder,
            &author,
            self.config.feud_bump,
            self.config.default_feud_intensity,
            now,
        );
        self.push_beat(StoryBeatRecord::feud(beat, responder.clone(), author, intensity, now));
        ResponderCue {
            character: responder,
            kind: CueKind::FeudResponse,
            directive,
        }
    }

    fn roll_surprise(&mut self, now: DateTime<Utc>) -> Option<ResponderCue> {
        if self.wings.is_empty() {
            return None;
        }
        let chance = surprise_chance(self.beats_since_surprise, &self.config);
        if self.rng.gen_range(0.0_f32..1.0) >= chance {
            return None;
        }

        let idx = self.rng.gen_range(0..self.wings.len());
        let entrant = self.wings.remove(idx);
        self.active.push(entrant.clone());
        self.beats_since_surprise = 0;

        let kind = pick_surprise_kind(&mut self.rng);
        self.heat.record(&entrant, now);
        self.push_beat(StoryBeatRecord::surprise(kind, entrant.clone(), now));
        info!(entrant = %entrant, kind = %kind, "surprise appearance from the wings");
        Some(ResponderCue {
            character: entrant,
            kind: CueKind::Surprise,
            directive: surprise_directive(kind).to_string(),
        })
    }

    // -- scheduled promos ---------------------------------------------------

    /// Cut a promo with a uniformly random active character, stamped with
    /// the current time.
    pub fn cut_promo(&mut self) -> Option<ResponderCue> {
        self.cut_promo_at(Utc::now())
    }

    /// Cut a promo as of `now`. Returns `None` when nobody is active.
    ///
    /// A speaker with a live feud works their hottest rival; anyone else
    /// gets a weighted promo topic. Promos never bump intensity.
    pub fn cut_promo_at(&mut self, now: DateTime<Utc>) -> Option<ResponderCue> {
        if self.active.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..self.active.len());
        let speaker = self.active[idx].clone();

        if let Some(rival) = self.feuds.hottest_rival_of(&speaker).cloned() {
            let beat = pick_feud_beat(&mut self.rng);
            let intensity = self
                .feuds
                .intensity(&speaker, &rival)
                .unwrap_or(self.config.default_feud_intensity);
            let directive = feud_directive(beat, self.registry.display_name(&rival), intensity);
            self.push_beat(StoryBeatRecord::feud(beat, speaker.clone(), rival, intensity, now));
            return Some(ResponderCue {
                character: speaker,
                kind: CueKind::Promo,
                directive,
            });
        }

        let topic = pick_promo_topic(&mut self.rng);
        self.push_beat(StoryBeatRecord::promo(topic, speaker.clone(), now));
        Some(ResponderCue {
            character: speaker,
            kind: CueKind::Promo,
            directive: promo_directive(topic).to_string(),
        })
    }

    // -- roster management --------------------------------------------------

    /// Move a character to the active list.
    ///
    /// # Errors
    /// Returns `KayfabeError::UnknownCharacter` for a slug outside the
    /// registry.
    pub fn activate(&mut self, id: &CharacterId) -> Result<()> {
        self.known(id)?;
        self.wings.retain(|c| c != id);
        if !self.active.contains(id) {
            self.active.push(id.clone());
        }
        Ok(())
    }

    /// Move a character to the wings, making them surprise-eligible.
    ///
    /// # Errors
    /// Returns `KayfabeError::UnknownCharacter` for a slug outside the
    /// registry.
    pub fn send_to_wings(&mut self, id: &CharacterId) -> Result<()> {
        self.known(id)?;
        self.active.retain(|c| c != id);
        if !self.wings.contains(id) {
            self.wings.push(id.clone());
        }
        Ok(())
    }

    /// Remove a character from both the active list and the wings.
    ///
    /// # Errors
    /// Returns `KayfabeError::UnknownCharacter` for a slug outside the
    /// registry.
    pub fn retire(&mut self, id: &CharacterId) -> Result<()> {
        self.known(id)?;
        self.active.retain(|c| c != id);
        self.wings.retain(|c| c != id);
        Ok(())
    }

    /// Record an alignment override for a character turn.
    ///
    /// # Errors
    /// Returns `KayfabeError::UnknownCharacter` for a slug outside the
    /// registry.
    pub fn set_alignment(&mut self, id: &CharacterId, alignment: Alignment) -> Result<()> {
        self.known(id)?;
        self.alignment_overrides.insert(id.clone(), alignment);
        Ok(())
    }

    /// Current alignment: the override if one was recorded, else the
    /// registry's debut alignment. `None` for an unknown slug.
    #[must_use]
    pub fn effective_alignment(&self, id: &CharacterId) -> Option<Alignment> {
        self.alignment_overrides
            .get(id)
            .copied()
            .or_else(|| self.registry.get(id).map(|c| c.alignment))
    }

    // -- feud management ----------------------------------------------------

    /// Start or re-seed a feud at `intensity` (clamped to [0, 10]).
    ///
    /// # Errors
    /// Returns `KayfabeError::UnknownCharacter` for a slug outside the
    /// registry and `KayfabeError::DuplicateParticipant` when both sides
    /// are the same character.
    pub fn start_feud(
        &mut self,
        a: &CharacterId,
        b: &CharacterId,
        intensity: f32,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.known(a)?;
        self.known(b)?;
        if a == b {
            return Err(KayfabeError::DuplicateParticipant(a.clone()));
        }
        self.feuds.start(a.clone(), b.clone(), intensity, at);
        info!(%a, %b, intensity, "feud started");
        Ok(())
    }

    /// Drop the feud between `a` and `b`, returning it if it existed.
    /// This is the only way a feud's intensity ever goes down.
    pub fn reset_feud(&mut self, a: &CharacterId, b: &CharacterId) -> Option<Feud> {
        self.feuds.reset(a, b)
    }

    /// Mark the feud between `a` and `b` as cooling, leaving its intensity
    /// untouched. Returns whether such a feud existed.
    pub fn mark_feud_cooling(&mut self, a: &CharacterId, b: &CharacterId) -> bool {
        self.feuds.mark_cooling(a, b)
    }

    // -- persistence --------------------------------------------------------

    /// Serialize the full mutable state.
    #[must_use]
    pub fn snapshot(&self) -> DirectorState {
        DirectorState {
            active: self.active.clone(),
            wings: self.wings.clone(),
            feuds: self.feuds.snapshot(),
            heat: self.heat.snapshot(),
            alignment_overrides: self.alignment_overrides.clone(),
            message_count: self.message_count,
            beats_since_surprise: self.beats_since_surprise,
            history: self.history.clone(),
        }
    }

    /// Replace the full mutable state from a snapshot.
    ///
    /// Slugs that no longer exist in the registry are kept but inert: the
    /// responder scan skips anything it cannot look up.
    pub fn restore(&mut self, state: DirectorState) {
        self.active = state.active;
        self.wings = state.wings;
        self.feuds.restore(state.feuds);
        self.heat.restore(state.heat);
        self.alignment_overrides = state.alignment_overrides;
        self.message_count = state.message_count;
        self.beats_since_surprise = state.beats_since_surprise;
        self.history = state.history;
    }

    fn persist_state(&self) {
        let Some(sink) = &self.snapshot_sink else {
            return;
        };
        match serde_json::to_string(&self.snapshot()) {
            Ok(json) => sink.snapshot(Self::COMPONENT, json),
            Err(e) => warn!(error = %e, "failed to encode director state"),
        }
    }

    fn push_beat(&mut self, record: StoryBeatRecord) {
        if let Some(sink) = &self.snapshot_sink {
            match serde_json::to_string(&record) {
                Ok(json) => sink.beat(json),
                Err(e) => warn!(error = %e, "failed to encode story beat"),
            }
        }
        self.history.push(record);
        if self.history.len() > self.config.history_cap {
            let excess = self.history.len() - self.config.history_cap;
            self.history.drain(..excess);
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Characters currently reacting to messages, in insertion order.
    #[must_use]
    pub fn active(&self) -> &[CharacterId] {
        &self.active
    }

    /// Characters waiting in the wings, in insertion order.
    #[must_use]
    pub fn wings(&self) -> &[CharacterId] {
        &self.wings
    }

    /// The live feud book.
    #[must_use]
    pub fn feuds(&self) -> &FeudBook {
        &self.feuds
    }

    /// The rolling beat history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StoryBeatRecord] {
        &self.history
    }

    /// Messages processed since the director was created or restored.
    #[must_use]
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Beats since the last surprise entrance.
    #[must_use]
    pub fn beats_since_surprise(&self) -> u32 {
        self.beats_since_surprise
    }

    /// Reactions recorded for `id` inside the trailing window.
    pub fn heat_count(&mut self, id: &CharacterId, now: DateTime<Utc>) -> usize {
        self.heat.count(id, now)
    }

    fn known(&self, id: &CharacterId) -> Result<()> {
        if self.registry.contains(id) {
            Ok(())
        } else {
            Err(KayfabeError::UnknownCharacter(id.clone()))
        }
    }
}

// ---------------------------------------------------------------------------
// State snapshot
// ---------------------------------------------------------------------------

/// Serialized form of the director's full mutable state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorState {
    /// Active roster, in insertion order.
    pub active: Vec<CharacterId>,
    /// Wings roster, in insertion order.
    pub wings: Vec<CharacterId>,
    /// Live feuds, in key order.
    pub feuds: Vec<Feud>,
    /// Raw heat timestamps per character.
    pub heat: HashMap<CharacterId, Vec<DateTime<Utc>>>,
    /// Recorded alignment turns.
    pub alignment_overrides: HashMap<CharacterId, Alignment>,
    /// Monotonic message counter.
    pub message_count: u64,
    /// Beats since the last surprise entrance.
    pub beats_since_surprise: u32,
    /// Rolling beat history, oldest first.
    pub history: Vec<StoryBeatRecord>,
}
