//! Core type definitions for the kayfabe engine.
//!
//! Catalog entries (characters, titles, match types, event templates) are
//! keyed by human-readable string slugs; runtime objects (matches, events)
//! get random UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types: catalog slugs
// ---------------------------------------------------------------------------

/// Identifier of a persona in the character registry (e.g. `"atlas-crane"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    /// Create a character ID from a slug.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// The slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CharacterId {
    fn from(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a championship title (e.g. `"world"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleId(pub String);

impl TitleId {
    /// Create a title ID from a slug.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// The slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TitleId {
    fn from(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a match type in the fixed catalog (e.g. `"hell-in-a-cell"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchTypeId(pub String);

impl MatchTypeId {
    /// Create a match-type ID from a slug.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// The slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchTypeId {
    fn from(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

impl fmt::Display for MatchTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a pay-per-view event template (e.g. `"grand-collision"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    /// Create a template ID from a slug.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// The slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TemplateId {
    fn from(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identity types: runtime objects
// ---------------------------------------------------------------------------

/// Unique identifier for a single simulated match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

impl MatchId {
    /// Create a new random match ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a scheduled or completed pay-per-view event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new random event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Crowd alignment of a persona.
///
/// Alignment colors directives and booking flavor; it has no mechanical
/// effect on match outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Crowd favorite.
    Face,
    /// Villain.
    Heel,
    /// Deliberately ambiguous.
    Tweener,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Face => write!(f, "face"),
            Self::Heel => write!(f, "heel"),
            Self::Tweener => write!(f, "tweener"),
        }
    }
}

// ---------------------------------------------------------------------------
// Win methods
// ---------------------------------------------------------------------------

/// How a match was legally won.
///
/// Each match type carries its own list of legal methods; the first entry
/// of that list is the type's *primary* method, used when the safety
/// ceiling forces a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinMethod {
    /// Three count on the mat.
    Pinfall,
    /// Opponent tapped or passed out.
    Submission,
    /// Opponent failed to answer the ten count.
    CountOut,
    /// Opponent disqualified.
    Disqualification,
    /// Thrown over the top rope, both feet touching the floor.
    OverTheTopRope,
}

impl fmt::Display for WinMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pinfall => write!(f, "pinfall"),
            Self::Submission => write!(f, "submission"),
            Self::CountOut => write!(f, "count-out"),
            Self::Disqualification => write!(f, "dq"),
            Self::OverTheTopRope => write!(f, "over-the-top-rope"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_ids_round_trip_transparently() {
        let id = CharacterId::from("atlas-crane");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"atlas-crane\"");
        let back: CharacterId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(MatchId::new(), MatchId::new());
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn win_method_serializes_kebab_case() {
        let json = serde_json::to_string(&WinMethod::CountOut).expect("serialize");
        assert_eq!(json, "\"count-out\"");
        assert_eq!(WinMethod::OverTheTopRope.to_string(), "over-the-top-rope");
    }
}
