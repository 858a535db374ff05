//! Title holders, defenses, and reign history.
//!
//! Every title has at most one holder at a time. Awarding a held title
//! closes the outgoing reign into a bounded history list before the new
//! holder is installed; vacating closes the reign with a vacated flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::types::{CharacterId, TitleId, WinMethod};

// ---------------------------------------------------------------------------
// Title records
// ---------------------------------------------------------------------------

/// Static display data for one championship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDef {
    /// Catalog slug.
    pub id: TitleId,
    /// Full display name.
    pub name: String,
}

/// One closed reign in a title's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReignRecord {
    /// Who held the title.
    pub holder: CharacterId,
    /// When the reign began.
    pub won_at: DateTime<Utc>,
    /// When the reign ended.
    pub lost_at: DateTime<Utc>,
    /// Successful defenses during the reign.
    pub defenses: u32,
    /// Whether the reign ended by vacating rather than a loss.
    pub vacated: bool,
}

/// Live state of one championship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleState {
    /// Current holder; `None` means vacant.
    pub holder: Option<CharacterId>,
    /// When the current reign began.
    pub won_at: Option<DateTime<Utc>>,
    /// Successful defenses in the current reign.
    pub defenses: u32,
    /// Closed reigns, oldest first, bounded.
    pub history: Vec<ReignRecord>,
}

/// Change record returned from a successful award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleChange {
    /// Which title changed hands.
    pub title: TitleId,
    /// Display name of the title.
    pub title_name: String,
    /// Incoming champion.
    pub new_champion: CharacterId,
    /// Outgoing champion, if the title was held.
    pub previous_champion: Option<CharacterId>,
    /// How the title was won.
    pub method: WinMethod,
}

/// Serializable dump of every title's state, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Per-title state keyed by slug.
    pub titles: Vec<(TitleId, TitleState)>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Tracks holders, defense counts, and reign history for a fixed title
/// catalog.
#[derive(Debug, Clone)]
pub struct ChampionshipLedger {
    catalog: Vec<TitleDef>,
    states: HashMap<TitleId, TitleState>,
    config: LedgerConfig,
}

impl ChampionshipLedger {
    /// Ledger over the builtin title catalog, all titles vacant.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        let catalog = builtin_titles();
        let states = catalog
            .iter()
            .map(|t| (t.id.clone(), TitleState::default()))
            .collect();
        Self { catalog, states, config }
    }

    /// Titles in catalog order.
    pub fn titles(&self) -> impl Iterator<Item = &TitleDef> {
        self.catalog.iter()
    }

    /// Whether the slug names a known title.
    #[must_use]
    pub fn contains(&self, title: &TitleId) -> bool {
        self.states.contains_key(title)
    }

    /// Current holder of a title, if known and held.
    #[must_use]
    pub fn champion(&self, title: &TitleId) -> Option<&CharacterId> {
        self.states.get(title).and_then(|s| s.holder.as_ref())
    }

    /// Full state of one title.
    #[must_use]
    pub fn state(&self, title: &TitleId) -> Option<&TitleState> {
        self.states.get(title)
    }

    /// Titles currently held by a character, in catalog order.
    #[must_use]
    pub fn titles_for_character(&self, id: &CharacterId) -> Vec<TitleId> {
        self.catalog
            .iter()
            .filter(|t| {
                self.states
                    .get(&t.id)
                    .is_some_and(|s| s.holder.as_ref() == Some(id))
            })
            .map(|t| t.id.clone())
            .collect()
    }

    /// Install a new champion, closing out the previous reign if one
    /// existed. Returns `None` for an unknown title.
    pub fn award_title(
        &mut self,
        title: &TitleId,
        champion: &CharacterId,
        method: WinMethod,
        at: DateTime<Utc>,
    ) -> Option<TitleChange> {
        let cap = self.config.history_cap;
        let name = self.title_name(title)?;
        let state = self.states.get_mut(title)?;

        let previous = state.holder.take();
        if let Some(holder) = &previous {
            let record = ReignRecord {
                holder: holder.clone(),
                won_at: state.won_at.unwrap_or(at),
                lost_at: at,
                defenses: state.defenses,
                vacated: false,
            };
            push_bounded(&mut state.history, record, cap);
        }
        state.holder = Some(champion.clone());
        state.won_at = Some(at);
        state.defenses = 0;

        info!(
            title = %title,
            new_champion = %champion,
            previous_champion = previous.as_ref().map_or("(vacant)", CharacterId::as_str),
            method = %method,
            "title change"
        );
        Some(TitleChange {
            title: title.clone(),
            title_name: name,
            new_champion: champion.clone(),
            previous_champion: previous,
            method,
        })
    }

    /// Count one successful defense. Returns the new count, or `None`
    /// when the title is vacant or unknown.
    pub fn record_defense(&mut self, title: &TitleId) -> Option<u32> {
        let state = self.states.get_mut(title)?;
        state.holder.as_ref()?;
        state.defenses += 1;
        debug!(title = %title, defenses = state.defenses, "title defended");
        Some(state.defenses)
    }

    /// Strip the current holder, closing the reign with a vacated flag.
    /// Returns the displaced holder, or `None` when vacant or unknown.
    pub fn vacate_title(&mut self, title: &TitleId, at: DateTime<Utc>) -> Option<CharacterId> {
        let cap = self.config.history_cap;
        let state = self.states.get_mut(title)?;
        let holder = state.holder.take()?;
        let record = ReignRecord {
            holder: holder.clone(),
            won_at: state.won_at.unwrap_or(at),
            lost_at: at,
            defenses: state.defenses,
            vacated: true,
        };
        push_bounded(&mut state.history, record, cap);
        state.won_at = None;
        state.defenses = 0;
        info!(title = %title, former_champion = %holder, "title vacated");
        Some(holder)
    }

    /// Serializable dump, in catalog order.
    #[must_use]
    pub fn snapshot(&self) -> LedgerState {
        LedgerState {
            titles: self
                .catalog
                .iter()
                .filter_map(|t| {
                    self.states.get(&t.id).map(|s| (t.id.clone(), s.clone()))
                })
                .collect(),
        }
    }

    /// Overwrite title states from a dump. Slugs not in the catalog are
    /// ignored.
    pub fn restore(&mut self, state: LedgerState) {
        for (id, title_state) in state.titles {
            if let Some(slot) = self.states.get_mut(&id) {
                *slot = title_state;
            }
        }
    }

    fn title_name(&self, title: &TitleId) -> Option<String> {
        self.catalog.iter().find(|t| &t.id == title).map(|t| t.name.clone())
    }
}

fn push_bounded(history: &mut Vec<ReignRecord>, record: ReignRecord, cap: usize) {
    history.push(record);
    if history.len() > cap {
        let excess = history.len() - cap;
        history.drain(..excess);
    }
}

fn builtin_titles() -> Vec<TitleDef> {
    let title = |id: &str, name: &str| TitleDef {
        id: TitleId::from(id),
        name: name.to_string(),
    };
    vec![
        title("world", "World Heavyweight Championship"),
        title("intercontinental", "Intercontinental Championship"),
        title("television", "Television Championship"),
        title("hardcore", "Hardcore Championship"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ledger() -> ChampionshipLedger {
        ChampionshipLedger::new(LedgerConfig::default())
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 20, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn world() -> TitleId {
        TitleId::from("world")
    }

    #[test]
    fn builtin_catalog_starts_vacant() {
        let ledger = ledger();
        assert_eq!(ledger.titles().count(), 4);
        for title in ledger.titles() {
            assert!(ledger.champion(&title.id).is_none());
        }
    }

    #[test]
    fn award_on_vacant_title_has_no_previous_champion() {
        let mut ledger = ledger();
        let change = ledger
            .award_title(&world(), &CharacterId::from("atlas-crane"), WinMethod::Pinfall, at(1))
            .expect("known title");
        assert_eq!(change.previous_champion, None);
        assert_eq!(change.new_champion, CharacterId::from("atlas-crane"));
        assert_eq!(change.title_name, "World Heavyweight Championship");
        assert_eq!(ledger.champion(&world()), Some(&CharacterId::from("atlas-crane")));
    }

    #[test]
    fn award_closes_previous_reign_and_resets_defenses() {
        let mut ledger = ledger();
        ledger
            .award_title(&world(), &CharacterId::from("atlas-crane"), WinMethod::Pinfall, at(1))
            .expect("award");
        assert_eq!(ledger.record_defense(&world()), Some(1));
        assert_eq!(ledger.record_defense(&world()), Some(2));

        let change = ledger
            .award_title(&world(), &CharacterId::from("the-mortician"), WinMethod::Submission, at(8))
            .expect("award");
        assert_eq!(change.previous_champion, Some(CharacterId::from("atlas-crane")));

        let state = ledger.state(&world()).expect("state");
        assert_eq!(state.defenses, 0);
        assert_eq!(state.history.len(), 1);
        let closed = &state.history[0];
        assert_eq!(closed.holder, CharacterId::from("atlas-crane"));
        assert_eq!(closed.defenses, 2);
        assert_eq!(closed.won_at, at(1));
        assert_eq!(closed.lost_at, at(8));
        assert!(!closed.vacated);

        assert_eq!(
            ledger.titles_for_character(&CharacterId::from("the-mortician")),
            vec![world()]
        );
        assert!(ledger.titles_for_character(&CharacterId::from("atlas-crane")).is_empty());
    }

    #[test]
    fn unknown_title_is_a_quiet_no_op() {
        let mut ledger = ledger();
        let ghost = TitleId::from("cruiserweight");
        assert!(ledger
            .award_title(&ghost, &CharacterId::from("atlas-crane"), WinMethod::Pinfall, at(1))
            .is_none());
        assert!(ledger.record_defense(&ghost).is_none());
        assert!(ledger.vacate_title(&ghost, at(1)).is_none());
    }

    #[test]
    fn defense_on_vacant_title_does_not_count() {
        let mut ledger = ledger();
        assert!(ledger.record_defense(&world()).is_none());
    }

    #[test]
    fn vacate_then_award_shows_no_previous_champion() {
        let mut ledger = ledger();
        ledger
            .award_title(&world(), &CharacterId::from("velvet-viper"), WinMethod::Pinfall, at(1))
            .expect("award");
        ledger.record_defense(&world());

        let displaced = ledger.vacate_title(&world(), at(5)).expect("was held");
        assert_eq!(displaced, CharacterId::from("velvet-viper"));
        assert!(ledger.champion(&world()).is_none());

        let state = ledger.state(&world()).expect("state");
        let closed = state.history.last().expect("closed reign");
        assert!(closed.vacated);
        assert_eq!(closed.defenses, 1);
        assert_eq!(state.defenses, 0);

        // Double vacate is a no-op.
        assert!(ledger.vacate_title(&world(), at(6)).is_none());

        let change = ledger
            .award_title(&world(), &CharacterId::from("midnight-queen"), WinMethod::CountOut, at(9))
            .expect("award");
        assert_eq!(change.previous_champion, None);
    }

    #[test]
    fn history_truncates_from_the_front_at_the_cap() {
        let mut ledger = ledger();
        for i in 0..25_u32 {
            let holder = CharacterId::new(format!("holder-{i}"));
            ledger
                .award_title(&world(), &holder, WinMethod::Pinfall, at(1 + i % 28))
                .expect("award");
        }
        let state = ledger.state(&world()).expect("state");
        // 25 awards close 24 reigns; the cap keeps the newest 20.
        assert_eq!(state.history.len(), 20);
        assert_eq!(state.history[0].holder, CharacterId::from("holder-4"));
        assert_eq!(
            state.history.last().expect("non-empty").holder,
            CharacterId::from("holder-23")
        );
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let mut ledger = ledger();
        ledger
            .award_title(&world(), &CharacterId::from("atlas-crane"), WinMethod::Pinfall, at(1))
            .expect("award");
        ledger.record_defense(&world());
        ledger
            .award_title(
                &TitleId::from("hardcore"),
                &CharacterId::from("grim-halloway"),
                WinMethod::Disqualification,
                at(2),
            )
            .expect("award");

        let dump = ledger.snapshot();
        let mut fresh = ChampionshipLedger::new(LedgerConfig::default());
        fresh.restore(dump.clone());
        assert_eq!(fresh.snapshot(), dump);
        assert_eq!(fresh.champion(&world()), Some(&CharacterId::from("atlas-crane")));
        assert_eq!(fresh.state(&world()).map(|s| s.defenses), Some(1));
    }
}
