//! The static persona catalog.
//!
//! Personas are immutable at runtime: the engine reads response
//! probabilities and rival lists from here but never writes back. Runtime
//! mutable state (alignment turns, roster partition) lives in the
//! storyline director instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{KayfabeError, Result};
use crate::types::{Alignment, CharacterId};

// ---------------------------------------------------------------------------
// Persona record
// ---------------------------------------------------------------------------

/// One persona in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Registry slug, unique within the roster.
    pub id: CharacterId,
    /// Ring name shown to the audience.
    pub name: String,
    /// Crowd alignment the persona debuted with.
    pub alignment: Alignment,
    /// Chance of reacting to an arbitrary message, in [0,1].
    pub p_base: f32,
    /// Chance of reacting when the author is a listed rival, in [0,1].
    pub p_feud: f32,
    /// Rival slugs, in kayfabe order of importance.
    #[serde(default)]
    pub rivals: Vec<CharacterId>,
    /// Signature finishing move.
    #[serde(default)]
    pub finisher: Option<String>,
    /// Production cue for the persona's entrance.
    #[serde(default)]
    pub entrance_cue: Option<String>,
}

impl Character {
    /// Whether `other` appears on this persona's rival list.
    #[must_use]
    pub fn is_rival_of(&self, other: &CharacterId) -> bool {
        self.rivals.iter().any(|r| r == other)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Slug-keyed persona catalog preserving declaration order.
#[derive(Debug, Clone)]
pub struct CharacterRegistry {
    characters: Vec<Character>,
    index: HashMap<CharacterId, usize>,
}

/// Shape of a roster TOML document: a `[[characters]]` array.
#[derive(Debug, Deserialize)]
struct RosterDocument {
    characters: Vec<Character>,
}

impl CharacterRegistry {
    /// Build a registry from explicit persona records.
    ///
    /// # Errors
    /// Returns `KayfabeError::Config` on an empty or duplicate slug, a
    /// probability outside [0,1], or a rival slug that names no persona.
    pub fn from_characters(characters: Vec<Character>) -> Result<Self> {
        let mut index = HashMap::with_capacity(characters.len());
        for (i, c) in characters.iter().enumerate() {
            if c.id.as_str().is_empty() {
                return Err(KayfabeError::Config(format!(
                    "character #{i} has an empty slug"
                )));
            }
            if !(0.0..=1.0).contains(&c.p_base) || !(0.0..=1.0).contains(&c.p_feud) {
                return Err(KayfabeError::Config(format!(
                    "character {} has probabilities outside [0,1] (p_base={}, p_feud={})",
                    c.id, c.p_base, c.p_feud
                )));
            }
            if index.insert(c.id.clone(), i).is_some() {
                return Err(KayfabeError::Config(format!("duplicate character slug: {}", c.id)));
            }
        }
        for c in &characters {
            for rival in &c.rivals {
                if !index.contains_key(rival) {
                    return Err(KayfabeError::Config(format!(
                        "rival {rival} of {} is not in the roster",
                        c.id
                    )));
                }
            }
        }
        Ok(Self { characters, index })
    }

    /// Parse a roster from a TOML document with a `[[characters]]` array.
    ///
    /// # Errors
    /// Returns a parse error or the validation errors of [`Self::from_characters`].
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let doc: RosterDocument = toml::from_str(toml_str)?;
        Self::from_characters(doc.characters)
    }

    /// Load a roster TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Look up a persona by slug.
    #[must_use]
    pub fn get(&self, id: &CharacterId) -> Option<&Character> {
        self.index.get(id).map(|&i| &self.characters[i])
    }

    /// Whether the slug names a persona.
    #[must_use]
    pub fn contains(&self, id: &CharacterId) -> bool {
        self.index.contains_key(id)
    }

    /// Ring name for a slug, falling back to the slug itself.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a CharacterId) -> &'a str {
        self.get(id).map_or(id.as_str(), |c| c.name.as_str())
    }

    /// Personas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    /// Slugs in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &CharacterId> {
        self.characters.iter().map(|c| &c.id)
    }

    /// Number of personas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// The built-in twelve-persona roster.
    ///
    /// Rival links are symmetric and every probability is pre-validated,
    /// so this constructor cannot fail.
    #[must_use]
    pub fn builtin() -> Self {
        let characters = builtin_roster();
        let index = characters
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self { characters, index }
    }
}

fn persona(
    id: &str,
    name: &str,
    alignment: Alignment,
    p_base: f32,
    p_feud: f32,
    rivals: &[&str],
    finisher: &str,
    entrance_cue: &str,
) -> Character {
    Character {
        id: CharacterId::from(id),
        name: name.to_string(),
        alignment,
        p_base,
        p_feud,
        rivals: rivals.iter().map(|r| CharacterId::from(*r)).collect(),
        finisher: Some(finisher.to_string()),
        entrance_cue: Some(entrance_cue.to_string()),
    }
}

fn builtin_roster() -> Vec<Character> {
    vec![
        persona(
            "atlas-crane",
            "Atlas Crane",
            Alignment::Face,
            0.40,
            0.80,
            &["the-mortician"],
            "Crane Collapse",
            "arena lights climb from gold to white as a crane silhouette unfolds",
        ),
        persona(
            "the-mortician",
            "The Mortician",
            Alignment::Heel,
            0.30,
            0.85,
            &["atlas-crane", "neon-tempest"],
            "Last Rites",
            "bells toll while fog swallows the ramp",
        ),
        persona(
            "neon-tempest",
            "Neon Tempest",
            Alignment::Face,
            0.45,
            0.75,
            &["the-mortician"],
            "Voltage Spiral",
            "magenta strobes cut through a blacked-out arena",
        ),
        persona(
            "velvet-viper",
            "Velvet Viper",
            Alignment::Heel,
            0.35,
            0.80,
            &["midnight-queen", "sierra-havoc"],
            "Viper Coil",
            "a single spotlight slides down the aisle ahead of her",
        ),
        persona(
            "midnight-queen",
            "Midnight Queen",
            Alignment::Tweener,
            0.30,
            0.70,
            &["velvet-viper"],
            "Crown Fall",
            "royal fanfare under a violet wash",
        ),
        persona(
            "captain-granite",
            "Captain Granite",
            Alignment::Face,
            0.25,
            0.65,
            &["baron-blackwood"],
            "Granite Slam",
            "pyro columns over a marching drum line",
        ),
        persona(
            "baron-blackwood",
            "Baron Blackwood",
            Alignment::Heel,
            0.28,
            0.78,
            &["captain-granite"],
            "Blackwood Lariat",
            "candelabras flicker along the entrance arch",
        ),
        persona(
            "jester-wilde",
            "Jester Wilde",
            Alignment::Tweener,
            0.50,
            0.60,
            &[],
            "Punchline Piledriver",
            "a circus organ warped into a minor key",
        ),
        persona(
            "sierra-havoc",
            "Sierra Havoc",
            Alignment::Face,
            0.38,
            0.72,
            &["velvet-viper", "grim-halloway"],
            "Avalanche Kick",
            "white noise building into an air-raid siren",
        ),
        persona(
            "the-pharaoh",
            "The Pharaoh",
            Alignment::Heel,
            0.26,
            0.82,
            &["neon-tempest"],
            "Sarcophagus Slam",
            "torches ignite up the ramp one by one",
        ),
        persona(
            "turbo-comet",
            "Turbo Comet",
            Alignment::Face,
            0.48,
            0.68,
            &[],
            "Comet Crash",
            "a streak of blue pyro races the stage edge",
        ),
        persona(
            "grim-halloway",
            "Grim Halloway",
            Alignment::Heel,
            0.22,
            0.75,
            &["sierra-havoc"],
            "Halloway Hammer",
            "the house lights die one bank at a time",
        ),
    ]
}
