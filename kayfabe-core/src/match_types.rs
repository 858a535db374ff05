//! The fixed catalog of bookable match formats.
//!
//! Every definition carries its participant range, its round-count range,
//! and its legal win conditions with the *primary* condition listed first.
//! The battle royal's round range deliberately reaches past the simulator's
//! safety ceiling so the forced-resolution path sees real use.

use std::collections::HashMap;

use crate::types::{MatchTypeId, WinMethod};

/// One bookable match format.
#[derive(Debug, Clone)]
pub struct MatchTypeDef {
    /// Catalog slug.
    pub id: MatchTypeId,
    /// Display name for announcements.
    pub name: String,
    /// Minimum participants, inclusive.
    pub min_participants: usize,
    /// Maximum participants, inclusive.
    pub max_participants: usize,
    /// Minimum total rounds, inclusive.
    pub min_rounds: u32,
    /// Maximum total rounds, inclusive.
    pub max_rounds: u32,
    /// Whether weapon beats are legal.
    pub weapons_allowed: bool,
    /// Whether combatants are eliminated at the damage cap.
    pub elimination_style: bool,
    /// Legal win conditions, primary first. Never empty.
    pub win_methods: Vec<WinMethod>,
}

impl MatchTypeDef {
    /// The type's primary win condition, used for forced finishes.
    #[must_use]
    pub fn primary_win_method(&self) -> WinMethod {
        self.win_methods.first().copied().unwrap_or(WinMethod::Pinfall)
    }

    /// Whether `count` participants can be booked into this format.
    #[must_use]
    pub fn accepts_count(&self, count: usize) -> bool {
        (self.min_participants..=self.max_participants).contains(&count)
    }
}

/// Slug-keyed catalog of match formats.
#[derive(Debug, Clone)]
pub struct MatchCatalog {
    types: Vec<MatchTypeDef>,
    index: HashMap<MatchTypeId, usize>,
}

impl MatchCatalog {
    /// The built-in six-format catalog.
    #[must_use]
    pub fn builtin() -> Self {
        let types = builtin_types();
        let index = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        Self { types, index }
    }

    /// Look up a format by slug.
    #[must_use]
    pub fn get(&self, id: &MatchTypeId) -> Option<&MatchTypeDef> {
        self.index.get(id).map(|&i| &self.types[i])
    }

    /// Whether the slug names a format.
    #[must_use]
    pub fn contains(&self, id: &MatchTypeId) -> bool {
        self.index.contains_key(id)
    }

    /// Formats in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &MatchTypeDef> {
        self.types.iter()
    }

    /// Number of formats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for MatchCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn format_def(
    id: &str,
    name: &str,
    participants: (usize, usize),
    rounds: (u32, u32),
    weapons_allowed: bool,
    elimination_style: bool,
    win_methods: &[WinMethod],
) -> MatchTypeDef {
    MatchTypeDef {
        id: MatchTypeId::from(id),
        name: name.to_string(),
        min_participants: participants.0,
        max_participants: participants.1,
        min_rounds: rounds.0,
        max_rounds: rounds.1,
        weapons_allowed,
        elimination_style,
        win_methods: win_methods.to_vec(),
    }
}

fn builtin_types() -> Vec<MatchTypeDef> {
    use WinMethod::{CountOut, Disqualification, OverTheTopRope, Pinfall, Submission};
    vec![
        format_def(
            "singles",
            "Singles Match",
            (2, 2),
            (6, 10),
            false,
            false,
            &[Pinfall, Submission, CountOut, Disqualification],
        ),
        format_def(
            "no-disqualification",
            "No Disqualification Match",
            (2, 2),
            (7, 11),
            true,
            false,
            &[Pinfall, Submission],
        ),
        format_def(
            "hell-in-a-cell",
            "Hell in a Cell",
            (2, 2),
            (8, 12),
            true,
            false,
            &[Pinfall, Submission],
        ),
        format_def(
            "triple-threat",
            "Triple Threat",
            (3, 3),
            (7, 11),
            false,
            false,
            &[Pinfall, Submission],
        ),
        format_def(
            "fatal-four-way",
            "Fatal Four-Way",
            (4, 4),
            (8, 12),
            false,
            false,
            &[Pinfall, Submission],
        ),
        format_def(
            "battle-royal",
            "Battle Royal",
            (4, 20),
            (16, 30),
            false,
            true,
            &[OverTheTopRope],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_coherent() {
        let catalog = MatchCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        for def in catalog.iter() {
            assert!(!def.win_methods.is_empty(), "{} has no win methods", def.id);
            assert!(def.min_participants <= def.max_participants);
            assert!(def.min_rounds <= def.max_rounds);
            assert!(def.min_participants >= 2);
        }
    }

    #[test]
    fn lookup_by_slug() {
        let catalog = MatchCatalog::builtin();
        let cell = catalog.get(&MatchTypeId::from("hell-in-a-cell")).expect("present");
        assert!(cell.weapons_allowed);
        assert_eq!(cell.primary_win_method(), WinMethod::Pinfall);
        assert!(!catalog.contains(&MatchTypeId::from("inferno")));
    }

    #[test]
    fn singles_legal_methods_match_the_classic_set() {
        let catalog = MatchCatalog::builtin();
        let singles = catalog.get(&MatchTypeId::from("singles")).expect("present");
        assert_eq!(
            singles.win_methods,
            vec![
                WinMethod::Pinfall,
                WinMethod::Submission,
                WinMethod::CountOut,
                WinMethod::Disqualification,
            ]
        );
        assert!(singles.accepts_count(2));
        assert!(!singles.accepts_count(3));
    }

    #[test]
    fn battle_royal_can_outlast_the_safety_ceiling() {
        let catalog = MatchCatalog::builtin();
        let rumble = catalog.get(&MatchTypeId::from("battle-royal")).expect("present");
        assert!(rumble.elimination_style);
        assert!(rumble.max_rounds > 20, "range must reach past the ceiling");
        assert_eq!(rumble.primary_win_method(), WinMethod::OverTheTopRope);
        assert!(rumble.accepts_count(4) && rumble.accepts_count(20));
        assert!(!rumble.accepts_count(3));
    }
}
