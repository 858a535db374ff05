//! Pay-per-view scheduling and card booking.
//!
//! The booker composes a card from the hottest feuds first, escalating the
//! match type with feud intensity, then pads the card by pairing off idle
//! characters. Events move strictly forward through
//! `scheduled -> in-progress -> completed`; there is no cancel verb, a
//! scheduled event can simply sit unstarted.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

use crate::config::BookerConfig;
use crate::error::{KayfabeError, Result};
use crate::feud::Feud;
use crate::ledger::{ChampionshipLedger, TitleChange};
use crate::simulator::{MatchSimulator, MatchSummary};
use crate::types::{CharacterId, EventId, MatchTypeId, TemplateId, TitleId};

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Theme and sizing defaults for one pay-per-view brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpvTemplate {
    /// Catalog slug.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Promo tagline.
    pub tagline: String,
    /// Card prestige, 1 (weekly filler) to 5 (flagship).
    pub prestige: u8,
    /// Default match-count range for a full card.
    pub match_count: (usize, usize),
}

fn builtin_templates() -> Vec<PpvTemplate> {
    let template = |id: &str, name: &str, tagline: &str, prestige: u8, match_count: (usize, usize)| {
        PpvTemplate {
            id: TemplateId::from(id),
            name: name.to_string(),
            tagline: tagline.to_string(),
            prestige,
            match_count,
        }
    };
    vec![
        template(
            "grand-collision",
            "Grand Collision",
            "Where legacies are forged",
            5,
            (4, 6),
        ),
        template(
            "steel-reckoning",
            "Steel Reckoning",
            "No escape, no mercy",
            4,
            (4, 6),
        ),
        template(
            "summer-scorcher",
            "Summer Scorcher",
            "The hottest night of the year",
            4,
            (3, 6),
        ),
        template(
            "new-blood-rising",
            "New Blood Rising",
            "Tomorrow arrives tonight",
            2,
            (3, 5),
        ),
        template(
            "friday-fallout",
            "Friday Fallout",
            "Settle it under the lights",
            1,
            (2, 4),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Lifecycle of a pay-per-view event. Strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    /// Booked but not yet underway.
    Scheduled,
    /// Running; only one event at a time.
    InProgress,
    /// Finished and archived.
    Completed,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// One slot on an event card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEntry {
    /// 1-based card position, stable once the event starts.
    pub order: u32,
    /// Participants in booking order.
    pub participants: Vec<CharacterId>,
    /// Format slug.
    pub match_type: MatchTypeId,
    /// Title on the line, if a champion is in the match.
    pub for_title: Option<TitleId>,
    /// Whether this is the advertised main event.
    pub main_event: bool,
}

/// Outcome of one card entry, logged in card order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Card position the result belongs to.
    pub order: u32,
    /// Compact summary from the simulator.
    pub summary: MatchSummary,
    /// Title change settled off this match, if any.
    pub title_change: Option<TitleChange>,
}

/// Everything that came out of running one event end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    /// Event that ran.
    pub event: EventId,
    /// Display name, from the template.
    pub name: String,
    /// Per-match results in card order.
    pub results: Vec<MatchResult>,
}

impl EventReport {
    /// Title changes settled during the event, in card order.
    pub fn title_changes(&self) -> impl Iterator<Item = &TitleChange> {
        self.results.iter().filter_map(|r| r.title_change.as_ref())
    }
}

/// A pay-per-view event in any lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpvEvent {
    /// Unique event ID.
    pub id: EventId,
    /// Template the event was cut from.
    pub template: TemplateId,
    /// Display name, from the template.
    pub name: String,
    /// Promo tagline, from the template.
    pub tagline: String,
    /// Ordered match card.
    pub card: Vec<CardEntry>,
    /// Lifecycle state.
    pub status: EventStatus,
    /// Per-match results, appended in card order while in progress.
    pub results: Vec<MatchResult>,
    /// When the event was scheduled.
    pub scheduled_at: DateTime<Utc>,
}

/// Serializable dump of the booker's full event state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookerState {
    /// Events awaiting a start call.
    pub scheduled: Vec<PpvEvent>,
    /// The single running event, if any.
    pub active: Option<PpvEvent>,
    /// Archived events, oldest first, bounded.
    pub completed: Vec<PpvEvent>,
}

// ---------------------------------------------------------------------------
// Booker
// ---------------------------------------------------------------------------

/// Schedules events, books cards off the feud table, and walks each event
/// through its lifecycle.
#[derive(Debug, Clone)]
pub struct PpvBooker {
    templates: Vec<PpvTemplate>,
    config: BookerConfig,
    scheduled: Vec<PpvEvent>,
    active: Option<PpvEvent>,
    completed: Vec<PpvEvent>,
}

impl PpvBooker {
    /// Booker over the builtin template catalog, with no events.
    #[must_use]
    pub fn new(config: BookerConfig) -> Self {
        Self {
            templates: builtin_templates(),
            config,
            scheduled: Vec::new(),
            active: None,
            completed: Vec::new(),
        }
    }

    /// Templates in catalog order.
    pub fn templates(&self) -> impl Iterator<Item = &PpvTemplate> {
        self.templates.iter()
    }

    /// Look up one template.
    #[must_use]
    pub fn template(&self, id: &TemplateId) -> Option<&PpvTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    /// Events awaiting a start call.
    #[must_use]
    pub fn scheduled(&self) -> &[PpvEvent] {
        &self.scheduled
    }

    /// The running event, if any.
    #[must_use]
    pub fn active(&self) -> Option<&PpvEvent> {
        self.active.as_ref()
    }

    /// Archived events, oldest first.
    #[must_use]
    pub fn completed(&self) -> &[PpvEvent] {
        &self.completed
    }

    /// Find an event in any lifecycle state.
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&PpvEvent> {
        self.scheduled
            .iter()
            .find(|e| e.id == id)
            .or_else(|| self.active.as_ref().filter(|e| e.id == id))
            .or_else(|| self.completed.iter().find(|e| e.id == id))
    }

    /// Schedule an event from a template, with an empty or caller-built
    /// card.
    ///
    /// # Errors
    /// `UnknownTemplate`.
    pub fn schedule_event(
        &mut self,
        template: &TemplateId,
        card: Vec<CardEntry>,
        at: DateTime<Utc>,
    ) -> Result<EventId> {
        let def = self
            .template(template)
            .ok_or_else(|| KayfabeError::UnknownTemplate(template.clone()))?;
        let id = EventId::new();
        info!(event_id = %id, template = %template, name = %def.name, "event scheduled");
        self.scheduled.push(PpvEvent {
            id,
            template: template.clone(),
            name: def.name.clone(),
            tagline: def.tagline.clone(),
            card,
            status: EventStatus::Scheduled,
            results: Vec::new(),
            scheduled_at: at,
        });
        Ok(id)
    }

    /// Build a card onto a scheduled event from the live feud table.
    ///
    /// Feuds are taken hottest-first: intensity at or above the cell
    /// threshold books the cage, above the no-DQ threshold drops the
    /// rules, anything else is a straight singles match. The first feud
    /// booked is the main event. Nobody is booked twice on one card, and
    /// any title held by either combatant goes on the line. Once the feud
    /// quota is spent, leftover active characters are paired off in the
    /// order given until the card is full.
    ///
    /// Returns the number of entries on the finished card.
    ///
    /// # Errors
    /// `UnknownEvent` when the ID is not among scheduled events.
    pub fn auto_book_card(
        &mut self,
        event: EventId,
        feuds: &[&Feud],
        active_characters: &[CharacterId],
        ledger: &ChampionshipLedger,
    ) -> Result<usize> {
        let config = self.config.clone();
        let slot = self
            .scheduled
            .iter_mut()
            .find(|e| e.id == event)
            .ok_or(KayfabeError::UnknownEvent(event))?;

        let mut ranked: Vec<&Feud> = feuds.to_vec();
        ranked.sort_by_key(|f| (Reverse(OrderedFloat(f.intensity)), f.between.clone()));

        let mut card: Vec<CardEntry> = Vec::new();
        let mut booked: HashSet<CharacterId> = HashSet::new();
        let mut feud_matches = 0_usize;

        for feud in ranked {
            if feud_matches >= config.max_feud_matches || card.len() >= config.max_card_size {
                break;
            }
            let (a, b) = feud.between.sides();
            if booked.contains(a) || booked.contains(b) {
                continue;
            }
            let match_type = match_type_for_intensity(&config, feud.intensity);
            let for_title = ledger
                .titles_for_character(a)
                .into_iter()
                .next()
                .or_else(|| ledger.titles_for_character(b).into_iter().next());
            card.push(CardEntry {
                order: u32::try_from(card.len() + 1).unwrap_or(u32::MAX),
                participants: vec![a.clone(), b.clone()],
                match_type,
                for_title,
                main_event: card.is_empty(),
            });
            booked.insert(a.clone());
            booked.insert(b.clone());
            feud_matches += 1;
        }

        let mut idle = active_characters.iter().filter(|c| !booked.contains(*c));
        while card.len() < config.max_card_size {
            let (Some(a), Some(b)) = (idle.next(), idle.next()) else { break };
            card.push(CardEntry {
                order: u32::try_from(card.len() + 1).unwrap_or(u32::MAX),
                participants: vec![a.clone(), b.clone()],
                match_type: MatchTypeId::from("singles"),
                for_title: None,
                main_event: false,
            });
        }

        debug!(
            event_id = %event,
            entries = card.len(),
            feud_matches,
            "card booked"
        );
        slot.card = card;
        Ok(slot.card.len())
    }

    /// Move a scheduled event into the single in-progress slot.
    ///
    /// # Errors
    /// `UnknownEvent`, `EmptyCard`, or `EventInProgress` when another
    /// event is already running.
    pub fn start_event(&mut self, event: EventId) -> Result<()> {
        if let Some(running) = &self.active {
            return Err(KayfabeError::EventInProgress(running.id));
        }
        let idx = self
            .scheduled
            .iter()
            .position(|e| e.id == event)
            .ok_or(KayfabeError::UnknownEvent(event))?;
        if self.scheduled[idx].card.is_empty() {
            return Err(KayfabeError::EmptyCard(event));
        }
        let mut starting = self.scheduled.remove(idx);
        starting.status = EventStatus::InProgress;
        starting.results = Vec::new();
        info!(event_id = %event, name = %starting.name, card = starting.card.len(), "event started");
        self.active = Some(starting);
        Ok(())
    }

    /// Append one match result to the running event's log.
    ///
    /// # Errors
    /// `NoActiveEvent`.
    pub fn record_match_result(&mut self, result: MatchResult) -> Result<()> {
        let running = self.active.as_mut().ok_or(KayfabeError::NoActiveEvent)?;
        debug!(
            event_id = %running.id,
            order = result.order,
            winner = %result.summary.winner,
            "match result recorded"
        );
        running.results.push(result);
        Ok(())
    }

    /// Close out the running event and archive it.
    ///
    /// # Errors
    /// `NoActiveEvent`.
    pub fn complete_event(&mut self) -> Result<EventId> {
        let mut finished = self.active.take().ok_or(KayfabeError::NoActiveEvent)?;
        finished.status = EventStatus::Completed;
        let id = finished.id;
        info!(
            event_id = %id,
            name = %finished.name,
            results = finished.results.len(),
            "event completed"
        );
        self.completed.push(finished);
        if self.completed.len() > self.config.completed_cap {
            let excess = self.completed.len() - self.config.completed_cap;
            self.completed.drain(..excess);
        }
        Ok(id)
    }

    /// Start a scheduled event and run its whole card, settling titles
    /// as results land.
    ///
    /// A champion keeping their belt records a defense; anyone else
    /// winning a title match takes it. The event is completed and
    /// archived before this returns.
    ///
    /// # Errors
    /// The errors of [`Self::start_event`], or a simulator validation
    /// error on a card entry; in that case the event stays in progress
    /// with the results logged so far.
    pub fn run_event(
        &mut self,
        event: EventId,
        simulator: &mut MatchSimulator,
        ledger: &mut ChampionshipLedger,
    ) -> Result<EventReport> {
        self.start_event(event)?;
        let entries: Vec<CardEntry> = self
            .active
            .as_ref()
            .map(|e| e.card.clone())
            .unwrap_or_default();

        for entry in entries {
            let outcome = simulator.simulate_full_match(
                &entry.participants,
                &entry.match_type,
                entry.for_title.clone(),
            )?;
            let title_change = entry
                .for_title
                .as_ref()
                .and_then(|title| settle_title(ledger, title, &outcome.summary));
            self.record_match_result(MatchResult {
                order: entry.order,
                summary: outcome.summary,
                title_change,
            })?;
        }

        let running = self.active.as_ref().ok_or(KayfabeError::NoActiveEvent)?;
        let report = EventReport {
            event: running.id,
            name: running.name.clone(),
            results: running.results.clone(),
        };
        self.complete_event()?;
        Ok(report)
    }

    /// Serializable dump of all event lists.
    #[must_use]
    pub fn snapshot(&self) -> BookerState {
        BookerState {
            scheduled: self.scheduled.clone(),
            active: self.active.clone(),
            completed: self.completed.clone(),
        }
    }

    /// Overwrite all event lists from a dump.
    pub fn restore(&mut self, state: BookerState) {
        self.scheduled = state.scheduled;
        self.active = state.active;
        self.completed = state.completed;
    }
}

fn settle_title(
    ledger: &mut ChampionshipLedger,
    title: &TitleId,
    summary: &MatchSummary,
) -> Option<TitleChange> {
    if ledger.champion(title) == Some(&summary.winner) {
        ledger.record_defense(title);
        return None;
    }
    ledger.award_title(title, &summary.winner, summary.win_method, summary.finished_at)
}

fn match_type_for_intensity(config: &BookerConfig, intensity: f32) -> MatchTypeId {
    if intensity >= config.cell_threshold {
        MatchTypeId::from("hell-in-a-cell")
    } else if intensity >= config.no_dq_threshold {
        MatchTypeId::from("no-disqualification")
    } else {
        MatchTypeId::from("singles")
    }
}
