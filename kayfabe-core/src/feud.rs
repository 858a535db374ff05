//! Rivalries between two characters, carried as a numeric intensity.
//!
//! A feud is keyed by the *unordered* pair of its characters: looking up
//! (a, b) and (b, a) hits the same entry. Intensity lives in [0, 10] and
//! only ever rises during normal play; an explicit reset is the one way
//! down. Phase is derived from intensity bands and stays advisory.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::CharacterId;

/// Intensity ceiling for any feud.
pub const MAX_INTENSITY: f32 = 10.0;

const SIMMERING_AT: f32 = 4.0;
const BOILING_AT: f32 = 7.0;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Unordered pair of character slugs, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeudKey(CharacterId, CharacterId);

impl FeudKey {
    /// Build a key from either ordering of the pair.
    #[must_use]
    pub fn new(a: CharacterId, b: CharacterId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// The two sides in stored order.
    #[must_use]
    pub fn sides(&self) -> (&CharacterId, &CharacterId) {
        (&self.0, &self.1)
    }

    /// Whether `id` is one of the two sides.
    #[must_use]
    pub fn involves(&self, id: &CharacterId) -> bool {
        &self.0 == id || &self.1 == id
    }

    /// The side opposite `id`, if `id` is involved.
    #[must_use]
    pub fn opponent_of(&self, id: &CharacterId) -> Option<&CharacterId> {
        if &self.0 == id {
            Some(&self.1)
        } else if &self.1 == id {
            Some(&self.0)
        } else {
            None
        }
    }
}

impl fmt::Display for FeudKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.0, self.1)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Narrative temperature of a feud. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeudPhase {
    /// Fresh rivalry still taking shape.
    Building,
    /// Established, trading words more than blows.
    Simmering,
    /// Peak hostility.
    Boiling,
    /// Winding down after a blow-off; set only by explicit request.
    Cooling,
}

impl FeudPhase {
    /// Phase band for an intensity value.
    #[must_use]
    pub fn for_intensity(intensity: f32) -> Self {
        if intensity < SIMMERING_AT {
            Self::Building
        } else if intensity < BOILING_AT {
            Self::Simmering
        } else {
            Self::Boiling
        }
    }
}

impl fmt::Display for FeudPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Simmering => write!(f, "simmering"),
            Self::Boiling => write!(f, "boiling"),
            Self::Cooling => write!(f, "cooling"),
        }
    }
}

// ---------------------------------------------------------------------------
// Feud
// ---------------------------------------------------------------------------

/// A tracked rivalry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feud {
    /// The unordered pair.
    pub between: FeudKey,
    /// Current intensity in [0, 10].
    pub intensity: f32,
    /// Advisory phase.
    pub phase: FeudPhase,
    /// When the feud was first recorded.
    pub started_at: DateTime<Utc>,
}

impl Feud {
    /// Create a feud at a clamped starting intensity.
    #[must_use]
    pub fn new(a: CharacterId, b: CharacterId, intensity: f32, at: DateTime<Utc>) -> Self {
        let intensity = intensity.clamp(0.0, MAX_INTENSITY);
        Self {
            between: FeudKey::new(a, b),
            intensity,
            phase: FeudPhase::for_intensity(intensity),
            started_at: at,
        }
    }

    /// Raise intensity by `amount`, re-deriving the phase.
    ///
    /// A cooling feud that takes a bump heats back up into whatever band
    /// its new intensity lands in.
    pub fn bump(&mut self, amount: f32) -> f32 {
        self.intensity = (self.intensity + amount).clamp(0.0, MAX_INTENSITY);
        self.phase = FeudPhase::for_intensity(self.intensity);
        self.intensity
    }
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

/// All live feuds, with symmetric pair lookup.
#[derive(Debug, Clone, Default)]
pub struct FeudBook {
    feuds: HashMap<FeudKey, Feud>,
}

impl FeudBook {
    /// Empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the feud between `a` and `b`, either ordering.
    #[must_use]
    pub fn get(&self, a: &CharacterId, b: &CharacterId) -> Option<&Feud> {
        self.feuds.get(&FeudKey::new(a.clone(), b.clone()))
    }

    /// Intensity between `a` and `b`, if a feud exists.
    #[must_use]
    pub fn intensity(&self, a: &CharacterId, b: &CharacterId) -> Option<f32> {
        self.get(a, b).map(|f| f.intensity)
    }

    /// Create a feud or re-seed an existing one at `intensity` (clamped).
    pub fn start(&mut self, a: CharacterId, b: CharacterId, intensity: f32, at: DateTime<Utc>) {
        let key = FeudKey::new(a, b);
        match self.feuds.get_mut(&key) {
            Some(feud) => {
                feud.intensity = intensity.clamp(0.0, MAX_INTENSITY);
                feud.phase = FeudPhase::for_intensity(feud.intensity);
            }
            None => {
                let (a, b) = key.sides();
                let feud = Feud::new(a.clone(), b.clone(), intensity, at);
                self.feuds.insert(key, feud);
            }
        }
    }

    /// Bump the feud between `a` and `b`, creating it at `default_intensity`
    /// first if missing. Returns the post-bump intensity.
    pub fn bump(
        &mut self,
        a: &CharacterId,
        b: &CharacterId,
        amount: f32,
        default_intensity: f32,
        at: DateTime<Utc>,
    ) -> f32 {
        let key = FeudKey::new(a.clone(), b.clone());
        let feud = self
            .feuds
            .entry(key)
            .or_insert_with(|| Feud::new(a.clone(), b.clone(), default_intensity, at));
        feud.bump(amount)
    }

    /// Remove the feud between `a` and `b`, returning it if it existed.
    pub fn reset(&mut self, a: &CharacterId, b: &CharacterId) -> Option<Feud> {
        self.feuds.remove(&FeudKey::new(a.clone(), b.clone()))
    }

    /// Mark a feud as cooling without touching its intensity.
    pub fn mark_cooling(&mut self, a: &CharacterId, b: &CharacterId) -> bool {
        match self.feuds.get_mut(&FeudKey::new(a.clone(), b.clone())) {
            Some(feud) => {
                feud.phase = FeudPhase::Cooling;
                true
            }
            None => false,
        }
    }

    /// Feuds involving `id`.
    pub fn involving<'a>(&'a self, id: &'a CharacterId) -> impl Iterator<Item = &'a Feud> {
        self.feuds.values().filter(move |f| f.between.involves(id))
    }

    /// The opponent in `id`'s highest-intensity feud, ties broken by key
    /// order so the answer is stable.
    #[must_use]
    pub fn hottest_rival_of<'a>(&'a self, id: &'a CharacterId) -> Option<&'a CharacterId> {
        self.involving(id)
            .max_by_key(|f| (OrderedFloat(f.intensity), std::cmp::Reverse(f.between.clone())))
            .and_then(|f| f.between.opponent_of(id))
    }

    /// All feuds sorted by descending intensity, ties by key order.
    #[must_use]
    pub fn by_intensity_desc(&self) -> Vec<&Feud> {
        let mut feuds: Vec<&Feud> = self.feuds.values().collect();
        feuds.sort_by_key(|f| (std::cmp::Reverse(OrderedFloat(f.intensity)), f.between.clone()));
        feuds
    }

    /// Number of live feuds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.feuds.len()
    }

    /// Whether any feud is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feuds.is_empty()
    }

    /// Owned feud list in key order, for state snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Feud> {
        let mut feuds: Vec<Feud> = self.feuds.values().cloned().collect();
        feuds.sort_by(|x, y| x.between.cmp(&y.between));
        feuds
    }

    /// Rebuild the book from a snapshot list.
    pub fn restore(&mut self, feuds: Vec<Feud>) {
        self.feuds = feuds.into_iter().map(|f| (f.between.clone(), f)).collect();
    }
}
