//! Rolling reaction counts per character.
//!
//! Heat only dampens response probability; it is never a hard mute. Stale
//! entries are purged lazily when a count is read, so an idle character's
//! list shrinks the next time anyone asks about them.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::config::DirectorConfig;
use crate::types::CharacterId;

/// Per-character reaction timestamps inside a trailing window.
#[derive(Debug, Clone)]
pub struct HeatTracker {
    window: Duration,
    reactions: HashMap<CharacterId, Vec<DateTime<Utc>>>,
}

impl HeatTracker {
    /// Create a tracker with a trailing window in minutes.
    #[must_use]
    pub fn new(window_minutes: u32) -> Self {
        Self {
            window: Duration::minutes(i64::from(window_minutes)),
            reactions: HashMap::new(),
        }
    }

    /// Record one reaction for `id` at `at`.
    pub fn record(&mut self, id: &CharacterId, at: DateTime<Utc>) {
        self.reactions.entry(id.clone()).or_default().push(at);
    }

    /// Reactions inside the window as of `now`, purging stale entries.
    pub fn count(&mut self, id: &CharacterId, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        match self.reactions.get_mut(id) {
            Some(stamps) => {
                stamps.retain(|t| *t > cutoff);
                stamps.len()
            }
            None => 0,
        }
    }

    /// Purge stale entries for every character and drop empty lists.
    pub fn purge_all(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        for stamps in self.reactions.values_mut() {
            stamps.retain(|t| *t > cutoff);
        }
        self.reactions.retain(|_, stamps| !stamps.is_empty());
    }

    /// Copy of the raw timestamp map, for state snapshots.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<CharacterId, Vec<DateTime<Utc>>> {
        self.reactions.clone()
    }

    /// Replace the timestamp map from a restored snapshot.
    pub fn restore(&mut self, reactions: HashMap<CharacterId, Vec<DateTime<Utc>>>) {
        self.reactions = reactions;
    }
}

/// Dampening multiplier for a heat count.
///
/// The soft and hard factors compound: a character past the hard threshold
/// responds at `soft × hard` (0.35 with defaults) of their base chance.
#[must_use]
pub fn dampening_factor(count: usize, config: &DirectorConfig) -> f32 {
    let mut factor = 1.0;
    if count > config.heat_soft_threshold {
        factor *= config.heat_soft_factor;
    }
    if count > config.heat_hard_threshold {
        factor *= config.heat_hard_factor;
    }
    factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minutes: i64) -> DateTime<Utc> {
        let base = Utc
            .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        base + Duration::minutes(minutes)
    }

    fn id(slug: &str) -> CharacterId {
        CharacterId::from(slug)
    }

    #[test]
    fn counts_reactions_inside_window() {
        let mut heat = HeatTracker::new(30);
        let who = id("atlas-crane");
        heat.record(&who, at(0));
        heat.record(&who, at(10));
        heat.record(&who, at(20));
        assert_eq!(heat.count(&who, at(25)), 3);
    }

    #[test]
    fn stale_entries_purged_on_read() {
        let mut heat = HeatTracker::new(30);
        let who = id("neon-tempest");
        heat.record(&who, at(0));
        heat.record(&who, at(5));
        heat.record(&who, at(40));
        // At minute 50 the first two are older than 30 minutes.
        assert_eq!(heat.count(&who, at(50)), 1);
        // The purge is persistent, not just a filtered view.
        assert_eq!(heat.snapshot()[&who].len(), 1);
    }

    #[test]
    fn unknown_character_has_zero_heat() {
        let mut heat = HeatTracker::new(30);
        assert_eq!(heat.count(&id("ghost"), at(0)), 0);
    }

    #[test]
    fn dampening_compounds_past_both_thresholds() {
        let config = DirectorConfig::default();
        assert!((dampening_factor(0, &config) - 1.0).abs() < f32::EPSILON);
        assert!((dampening_factor(5, &config) - 1.0).abs() < f32::EPSILON);
        assert!((dampening_factor(6, &config) - 0.7).abs() < f32::EPSILON);
        assert!((dampening_factor(10, &config) - 0.7).abs() < f32::EPSILON);
        assert!((dampening_factor(11, &config) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let mut heat = HeatTracker::new(30);
        let who = id("velvet-viper");
        heat.record(&who, at(1));
        heat.record(&who, at(2));

        let mut restored = HeatTracker::new(30);
        restored.restore(heat.snapshot());
        assert_eq!(restored.count(&who, at(3)), 2);
    }

    #[test]
    fn purge_all_drops_empty_lists() {
        let mut heat = HeatTracker::new(30);
        heat.record(&id("a"), at(0));
        heat.record(&id("b"), at(100));
        heat.purge_all(at(120));
        let snap = heat.snapshot();
        assert!(!snap.contains_key(&id("a")));
        assert_eq!(snap[&id("b")].len(), 1);
    }
}
