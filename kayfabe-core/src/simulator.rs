//! Round-by-round match resolution.
//!
//! A match advances one round at a time: pick two standing combatants,
//! pick a beat legal for the current phase, apply the beat's momentum and
//! damage effects, and resolve the outcome once the finish phase arrives
//! (or the safety ceiling forces the issue). The simulator holds at most
//! one live match plus a bounded history of compact summaries.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::SimulatorConfig;
use crate::error::{KayfabeError, Result};
use crate::match_types::{MatchCatalog, MatchTypeDef};
use crate::registry::CharacterRegistry;
use crate::types::{CharacterId, MatchId, MatchTypeId, TitleId, WinMethod};

/// Momentum bounds for every combatant.
pub const MOMENTUM_RANGE: (f32, f32) = (-10.0, 10.0);
/// Damage accumulates up to this cap.
pub const DAMAGE_CAP: f32 = 100.0;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Match progress bucket derived from the round fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    /// First quarter: feeling-out process.
    Early,
    /// Up to 60%: the body of the match.
    Mid,
    /// The closing stretch.
    Late,
    /// At or past the drawn total: resolution fires.
    Finish,
}

impl MatchPhase {
    /// Phase for a progress fraction `current / total`.
    #[must_use]
    pub fn for_progress(progress: f32) -> Self {
        if progress <= 0.25 {
            Self::Early
        } else if progress <= 0.6 {
            Self::Mid
        } else if progress < 1.0 {
            Self::Late
        } else {
            Self::Finish
        }
    }

    /// Damage draw parameters `(base, width)`: the dealt amount is
    /// `base + random() * width`.
    #[must_use]
    pub fn damage_params(self) -> (f32, f32) {
        match self {
            Self::Early => (0.0, 10.0),
            Self::Mid => (5.0, 15.0),
            Self::Late | Self::Finish => (10.0, 20.0),
        }
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Early => write!(f, "early"),
            Self::Mid => write!(f, "mid"),
            Self::Late => write!(f, "late"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

// ---------------------------------------------------------------------------
// Beat tables
// ---------------------------------------------------------------------------

/// One entry in a phase's beat list.
#[derive(Debug, Clone, Copy)]
struct RoundBeat {
    name: &'static str,
    weapon: bool,
    reversal: bool,
}

const fn beat(name: &'static str) -> RoundBeat {
    RoundBeat { name, weapon: false, reversal: false }
}

const fn weapon_beat(name: &'static str) -> RoundBeat {
    RoundBeat { name, weapon: true, reversal: false }
}

const fn reversal_beat(name: &'static str) -> RoundBeat {
    RoundBeat { name, weapon: false, reversal: true }
}

const EARLY_BEATS: &[RoundBeat] = &[
    beat("lock-up"),
    beat("chain-wrestling"),
    beat("shoulder-block"),
    beat("quick-strike"),
    beat("crowd-taunt"),
    beat("chop-exchange"),
];

const MID_BEATS: &[RoundBeat] = &[
    beat("power-slam"),
    beat("signature-spot"),
    beat("submission-attempt"),
    beat("high-risk-dive"),
    beat("ringside-brawl"),
    reversal_beat("counter"),
    reversal_beat("comeback"),
    weapon_beat("chair-shot"),
];

const LATE_BEATS: &[RoundBeat] = &[
    beat("finisher-attempt"),
    beat("near-fall"),
    beat("desperation-strike"),
    reversal_beat("finisher-counter"),
    reversal_beat("comeback"),
    weapon_beat("table-spot"),
    weapon_beat("kendo-stick-shot"),
];

const FINISH_BEATS: &[RoundBeat] = &[
    beat("finisher-hit"),
    beat("roll-up"),
    beat("last-stand"),
    reversal_beat("finisher-counter"),
    weapon_beat("weapon-finish"),
];

fn beats_for(phase: MatchPhase) -> &'static [RoundBeat] {
    match phase {
        MatchPhase::Early => EARLY_BEATS,
        MatchPhase::Mid => MID_BEATS,
        MatchPhase::Late => LATE_BEATS,
        MatchPhase::Finish => FINISH_BEATS,
    }
}

// ---------------------------------------------------------------------------
// Live match state
// ---------------------------------------------------------------------------

/// Momentum and accumulated damage for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Who this is.
    pub id: CharacterId,
    /// Momentum in [-10, 10].
    pub momentum: f32,
    /// Damage taken, in [0, 100].
    pub damage: f32,
}

impl Combatant {
    fn fresh(id: CharacterId) -> Self {
        Self { id, momentum: 0.0, damage: 0.0 }
    }
}

/// One resolved beat in the match's event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Round number, 1-based.
    pub round: u32,
    /// Phase the round was resolved in.
    pub phase: MatchPhase,
    /// Beat name from the phase table.
    pub beat: String,
    /// Who initiated the beat.
    pub actor: CharacterId,
    /// Who it was aimed at.
    pub target: CharacterId,
    /// Momentum swing drawn for the beat.
    pub swing: i32,
    /// Damage dealt to the target.
    pub damage: f32,
    /// Whether the beat was a reversal.
    pub reversal: bool,
}

/// A live (or just-finished) match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// Unique match ID.
    pub id: MatchId,
    /// Format slug.
    pub match_type: MatchTypeId,
    /// Participants in booking order.
    pub participants: Vec<CharacterId>,
    /// Title on the line, if any.
    pub for_title: Option<TitleId>,
    /// Rounds drawn at creation; fixed for the match's lifetime.
    pub total_rounds: u32,
    /// Rounds resolved so far.
    pub current_round: u32,
    /// Per-participant state, same order as `participants`.
    pub combatants: Vec<Combatant>,
    /// Participants eliminated so far (elimination formats only).
    pub eliminated: Vec<CharacterId>,
    /// Ordered log of resolved beats.
    pub log: Vec<MatchEvent>,
    /// Winner, set at resolution.
    pub winner: Option<CharacterId>,
    /// Win method, set at resolution.
    pub win_method: Option<WinMethod>,
    /// When the match was created.
    pub started_at: DateTime<Utc>,
}

impl Match {
    /// Whether the outcome has been resolved.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Total damage this participant dealt to others, from the event log.
    #[must_use]
    pub fn damage_inflicted_by(&self, id: &CharacterId) -> f32 {
        self.log.iter().filter(|e| &e.actor == id).map(|e| e.damage).sum()
    }

    fn standing_indices(&self) -> Vec<usize> {
        self.combatants
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.eliminated.contains(&c.id))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Snapshot returned from one `simulate_round` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round number, 1-based.
    pub round: u32,
    /// Phase the round resolved in.
    pub phase: MatchPhase,
    /// Beat name.
    pub beat: String,
    /// Initiator of the beat.
    pub actor: CharacterId,
    /// Target of the beat.
    pub target: CharacterId,
    /// Momentum swing drawn.
    pub swing: i32,
    /// Damage dealt to the target.
    pub damage: f32,
    /// Whether the beat reversed the advantage.
    pub reversal: bool,
    /// Post-round copies of every combatant.
    pub combatants: Vec<Combatant>,
    /// Eliminated list after the round.
    pub eliminated: Vec<CharacterId>,
    /// Whether the match resolved this round.
    pub finished: bool,
    /// Winner, if resolved.
    pub winner: Option<CharacterId>,
    /// Win method, if resolved.
    pub win_method: Option<WinMethod>,
}

/// Compact record surviving after a live match is discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Match ID.
    pub id: MatchId,
    /// Format slug.
    pub match_type: MatchTypeId,
    /// Participants in booking order.
    pub participants: Vec<CharacterId>,
    /// Who won.
    pub winner: CharacterId,
    /// How they won.
    pub win_method: WinMethod,
    /// Rounds it took.
    pub rounds: u32,
    /// Title that was on the line, if any.
    pub for_title: Option<TitleId>,
    /// When the match finished.
    pub finished_at: DateTime<Utc>,
}

/// Everything `simulate_full_match` hands back.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Every round result in order.
    pub rounds: Vec<RoundResult>,
    /// The compact history record.
    pub summary: MatchSummary,
    /// Final state of the discarded live match.
    pub final_state: Match,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Round-by-round match engine. One live match at a time.
pub struct MatchSimulator {
    registry: Arc<CharacterRegistry>,
    catalog: MatchCatalog,
    config: SimulatorConfig,
    rng: StdRng,
    current: Option<Match>,
    history: Vec<MatchSummary>,
}

impl MatchSimulator {
    /// Create a simulator with an entropy-seeded RNG.
    #[must_use]
    pub fn new(registry: Arc<CharacterRegistry>, config: SimulatorConfig) -> Self {
        Self::with_seed(registry, config, rand::random())
    }

    /// Create a simulator with a fixed RNG seed, for reproducible runs.
    #[must_use]
    pub fn with_seed(registry: Arc<CharacterRegistry>, config: SimulatorConfig, seed: u64) -> Self {
        Self {
            registry,
            catalog: MatchCatalog::builtin(),
            config,
            rng: StdRng::seed_from_u64(seed),
            current: None,
            history: Vec::new(),
        }
    }

    /// The format catalog.
    #[must_use]
    pub fn catalog(&self) -> &MatchCatalog {
        &self.catalog
    }

    /// The live match, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Match> {
        self.current.as_ref()
    }

    /// Bounded history of finished matches, oldest first.
    #[must_use]
    pub fn history(&self) -> &[MatchSummary] {
        &self.history
    }

    /// Create a live match after validating participants and format.
    ///
    /// A finished-but-unfinalized match is finalized implicitly; an
    /// unfinished one is a `MatchInProgress` error.
    ///
    /// # Errors
    /// `UnknownMatchType`, `ParticipantCount`, `DuplicateParticipant`,
    /// `UnknownCharacter`, or `MatchInProgress`.
    pub fn create_match(
        &mut self,
        participants: &[CharacterId],
        match_type: &MatchTypeId,
        for_title: Option<TitleId>,
    ) -> Result<MatchId> {
        if let Some(live) = &self.current {
            if live.is_finished() {
                self.finalize_match();
            } else {
                return Err(KayfabeError::MatchInProgress(live.id));
            }
        }

        let def = self
            .catalog
            .get(match_type)
            .ok_or_else(|| KayfabeError::UnknownMatchType(match_type.clone()))?;
        if !def.accepts_count(participants.len()) {
            return Err(KayfabeError::ParticipantCount {
                match_type: match_type.clone(),
                min: def.min_participants,
                max: def.max_participants,
                got: participants.len(),
            });
        }
        for (i, p) in participants.iter().enumerate() {
            if participants[..i].contains(p) {
                return Err(KayfabeError::DuplicateParticipant(p.clone()));
            }
            if !self.registry.contains(p) {
                return Err(KayfabeError::UnknownCharacter(p.clone()));
            }
        }

        let total_rounds = self.rng.gen_range(def.min_rounds..=def.max_rounds);
        let id = MatchId::new();
        debug!(
            match_id = %id,
            match_type = %match_type,
            participants = participants.len(),
            total_rounds,
            "match created"
        );
        self.current = Some(Match {
            id,
            match_type: match_type.clone(),
            participants: participants.to_vec(),
            for_title,
            total_rounds,
            current_round: 0,
            combatants: participants.iter().cloned().map(Combatant::fresh).collect(),
            eliminated: Vec::new(),
            log: Vec::new(),
            winner: None,
            win_method: None,
            started_at: Utc::now(),
        });
        Ok(id)
    }

    /// Resolve one round of the live match.
    ///
    /// Returns `None` when there is no live match or its outcome is
    /// already resolved.
    pub fn simulate_round(&mut self) -> Option<RoundResult> {
        let def = {
            let live = self.current.as_ref()?;
            if live.is_finished() {
                return None;
            }
            self.catalog.get(&live.match_type)?.clone()
        };

        let ceiling = self.config.safety_ceiling_rounds;
        let live = self.current.as_mut()?;
        live.current_round += 1;
        let progress = live.current_round as f32 / live.total_rounds as f32;
        let phase = MatchPhase::for_progress(progress);

        let standing = live.standing_indices();
        if standing.len() < 2 {
            // Sole survivor left over from a prior elimination pass.
            resolve_survivor(live, &def);
            let winner = live.winner.clone()?;
            return Some(RoundResult {
                round: live.current_round,
                phase,
                beat: "last-man-standing".to_string(),
                actor: winner.clone(),
                target: winner.clone(),
                swing: 0,
                damage: 0.0,
                reversal: false,
                combatants: live.combatants.clone(),
                eliminated: live.eliminated.clone(),
                finished: true,
                winner: Some(winner),
                win_method: live.win_method,
            });
        }

        // Uniform ordered pick of two distinct standing combatants.
        let a_pos = self.rng.gen_range(0..standing.len());
        let mut t_pos = self.rng.gen_range(0..standing.len() - 1);
        if t_pos >= a_pos {
            t_pos += 1;
        }
        let (actor_idx, target_idx) = (standing[a_pos], standing[t_pos]);

        let legal: Vec<&RoundBeat> = beats_for(phase)
            .iter()
            .filter(|b| def.weapons_allowed || !b.weapon)
            .collect();
        let chosen = match legal.choose(&mut self.rng) {
            Some(b) => **b,
            None => beat("lock-up"),
        };

        let swing = self.rng.gen_range(1..=3_i32);
        let (base, width) = phase.damage_params();
        let amount = base + self.rng.gen_range(0.0_f32..1.0) * width;

        apply_beat(live, actor_idx, target_idx, &chosen, swing, amount);
        let actor_id = live.combatants[actor_idx].id.clone();
        let target_id = live.combatants[target_idx].id.clone();
        live.log.push(MatchEvent {
            round: live.current_round,
            phase,
            beat: chosen.name.to_string(),
            actor: actor_id.clone(),
            target: target_id.clone(),
            swing,
            damage: amount,
            reversal: chosen.reversal,
        });

        if def.elimination_style {
            run_eliminations(live);
        }

        let standing_after = live.standing_indices();
        if def.elimination_style && standing_after.len() <= 1 {
            resolve_survivor(live, &def);
        } else if phase == MatchPhase::Finish
            || (phase == MatchPhase::Late && live.current_round >= live.total_rounds)
        {
            resolve_finish(live, &def, actor_idx, target_idx, &mut self.rng);
        } else if live.current_round > ceiling {
            resolve_forced(live, &def);
        }

        Some(RoundResult {
            round: live.current_round,
            phase,
            beat: chosen.name.to_string(),
            actor: actor_id,
            target: target_id,
            swing,
            damage: amount,
            reversal: chosen.reversal,
            combatants: live.combatants.clone(),
            eliminated: live.eliminated.clone(),
            finished: live.is_finished(),
            winner: live.winner.clone(),
            win_method: live.win_method,
        })
    }

    /// Move a resolved match out of the live slot and into history.
    ///
    /// Returns `None` if there is no live match or it has no winner yet.
    pub fn finalize_match(&mut self) -> Option<(Match, MatchSummary)> {
        let live = self.current.as_ref()?;
        let (Some(winner), Some(win_method)) = (live.winner.clone(), live.win_method) else {
            return None;
        };
        let finished = self.current.take()?;
        let summary = MatchSummary {
            id: finished.id,
            match_type: finished.match_type.clone(),
            participants: finished.participants.clone(),
            winner,
            win_method,
            rounds: finished.current_round,
            for_title: finished.for_title.clone(),
            finished_at: Utc::now(),
        };
        info!(
            match_id = %summary.id,
            winner = %summary.winner,
            method = %summary.win_method,
            rounds = summary.rounds,
            "match finished"
        );
        self.history.push(summary.clone());
        if self.history.len() > self.config.history_cap {
            let excess = self.history.len() - self.config.history_cap;
            self.history.drain(..excess);
        }
        Some((finished, summary))
    }

    /// Create, run to resolution, and finalize a match in one call.
    ///
    /// # Errors
    /// The validation errors of [`Self::create_match`].
    pub fn simulate_full_match(
        &mut self,
        participants: &[CharacterId],
        match_type: &MatchTypeId,
        for_title: Option<TitleId>,
    ) -> Result<MatchOutcome> {
        self.create_match(participants, match_type, for_title)?;
        let mut rounds = Vec::new();
        while let Some(result) = self.simulate_round() {
            let finished = result.finished;
            rounds.push(result);
            if finished {
                break;
            }
        }
        let Some((final_state, summary)) = self.finalize_match() else {
            return Err(KayfabeError::Simulation(
                "match ended without a resolved winner".to_string(),
            ));
        };
        Ok(MatchOutcome { rounds, summary, final_state })
    }
}

// ---------------------------------------------------------------------------
// Beat mechanics
// ---------------------------------------------------------------------------

fn apply_beat(
    live: &mut Match,
    actor_idx: usize,
    target_idx: usize,
    beat: &RoundBeat,
    swing: i32,
    amount: f32,
) {
    let (mo_min, mo_max) = MOMENTUM_RANGE;
    let swing_f = swing as f32;

    let target = &mut live.combatants[target_idx];
    target.damage = (target.damage + amount).clamp(0.0, DAMAGE_CAP);

    if beat.reversal {
        // The advantage inverts, doubled, and the actor eats half the hit.
        let target = &mut live.combatants[target_idx];
        target.momentum = (target.momentum + 2.0 * swing_f).clamp(mo_min, mo_max);
        let actor = &mut live.combatants[actor_idx];
        actor.momentum = (actor.momentum - 2.0 * swing_f).clamp(mo_min, mo_max);
        actor.damage = (actor.damage + amount * 0.5).clamp(0.0, DAMAGE_CAP);
    } else {
        let target = &mut live.combatants[target_idx];
        target.momentum = (target.momentum - 1.0).clamp(mo_min, mo_max);
        let actor = &mut live.combatants[actor_idx];
        actor.momentum = (actor.momentum + swing_f).clamp(mo_min, mo_max);
    }
}

fn run_eliminations(live: &mut Match) {
    let at_cap: Vec<CharacterId> = live
        .combatants
        .iter()
        .filter(|c| c.damage >= DAMAGE_CAP && !live.eliminated.contains(&c.id))
        .map(|c| c.id.clone())
        .collect();
    for id in at_cap {
        debug!(match_id = %live.id, eliminated = %id, round = live.current_round, "elimination");
        live.eliminated.push(id);
    }
}

fn resolve_survivor(live: &mut Match, def: &MatchTypeDef) {
    let standing = live.standing_indices();
    let winner = match standing.first() {
        Some(&idx) => live.combatants[idx].id.clone(),
        // Double elimination in the final round: last one over the rope takes it.
        None => match live.eliminated.last() {
            Some(id) => id.clone(),
            None => return,
        },
    };
    live.winner = Some(winner);
    live.win_method = Some(def.primary_win_method());
}

fn resolve_finish(
    live: &mut Match,
    def: &MatchTypeDef,
    actor_idx: usize,
    target_idx: usize,
    rng: &mut StdRng,
) {
    let actor = &live.combatants[actor_idx];
    let target = &live.combatants[target_idx];
    let actor_score = actor.momentum + target.damage / 10.0 + rng.gen_range(0.0_f32..5.0);
    let target_score = target.momentum + actor.damage / 10.0 + rng.gen_range(0.0_f32..5.0);

    // Ties go to the actor.
    let winner_idx = if actor_score >= target_score { actor_idx } else { target_idx };
    live.winner = Some(live.combatants[winner_idx].id.clone());
    live.win_method = Some(
        def.win_methods
            .choose(rng)
            .copied()
            .unwrap_or_else(|| def.primary_win_method()),
    );
    debug!(
        match_id = %live.id,
        actor_score,
        target_score,
        winner = %live.combatants[winner_idx].id,
        "finish resolved"
    );
}

fn resolve_forced(live: &mut Match, def: &MatchTypeDef) {
    let standing = live.standing_indices();
    let mut best: Option<(usize, f32)> = None;
    for &idx in &standing {
        let inflicted = live.damage_inflicted_by(&live.combatants[idx].id);
        // Strict comparison keeps list-order precedence on ties.
        let better = match best {
            Some((_, top)) => inflicted > top,
            None => true,
        };
        if better {
            best = Some((idx, inflicted));
        }
    }
    let Some((winner_idx, inflicted)) = best else { return };
    live.winner = Some(live.combatants[winner_idx].id.clone());
    live.win_method = Some(def.primary_win_method());
    debug!(
        match_id = %live.id,
        round = live.current_round,
        winner = %live.combatants[winner_idx].id,
        inflicted,
        "safety ceiling forced a finish"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorConfig;

    fn sim(seed: u64) -> MatchSimulator {
        MatchSimulator::with_seed(
            Arc::new(CharacterRegistry::builtin()),
            SimulatorConfig::default(),
            seed,
        )
    }

    fn ids(slugs: &[&str]) -> Vec<CharacterId> {
        slugs.iter().map(|s| CharacterId::from(*s)).collect()
    }

    fn singles() -> MatchTypeId {
        MatchTypeId::from("singles")
    }

    #[test]
    fn phase_boundaries() {
        assert_eq!(MatchPhase::for_progress(0.1), MatchPhase::Early);
        assert_eq!(MatchPhase::for_progress(0.25), MatchPhase::Early);
        assert_eq!(MatchPhase::for_progress(0.26), MatchPhase::Mid);
        assert_eq!(MatchPhase::for_progress(0.6), MatchPhase::Mid);
        assert_eq!(MatchPhase::for_progress(0.61), MatchPhase::Late);
        assert_eq!(MatchPhase::for_progress(0.99), MatchPhase::Late);
        assert_eq!(MatchPhase::for_progress(1.0), MatchPhase::Finish);
        assert_eq!(MatchPhase::for_progress(1.5), MatchPhase::Finish);
    }

    #[test]
    fn create_match_validates_input() {
        let mut sim = sim(1);
        let pair = ids(&["atlas-crane", "the-mortician"]);

        let err = sim
            .create_match(&pair, &MatchTypeId::from("inferno"), None)
            .expect_err("unknown type");
        assert!(matches!(err, KayfabeError::UnknownMatchType(_)));

        let err = sim
            .create_match(&ids(&["atlas-crane"]), &singles(), None)
            .expect_err("too few");
        assert!(matches!(err, KayfabeError::ParticipantCount { got: 1, .. }));

        let err = sim
            .create_match(&ids(&["atlas-crane", "atlas-crane"]), &singles(), None)
            .expect_err("duplicate");
        assert!(matches!(err, KayfabeError::DuplicateParticipant(_)));

        let err = sim
            .create_match(&ids(&["atlas-crane", "nobody"]), &singles(), None)
            .expect_err("unknown character");
        assert!(matches!(err, KayfabeError::UnknownCharacter(_)));

        sim.create_match(&pair, &singles(), None).expect("valid");
        let err = sim.create_match(&pair, &singles(), None).expect_err("already live");
        assert!(matches!(err, KayfabeError::MatchInProgress(_)));
    }

    #[test]
    fn total_rounds_drawn_within_type_range() {
        for seed in 0..30 {
            let mut sim = sim(seed);
            sim.create_match(&ids(&["atlas-crane", "the-mortician"]), &singles(), None)
                .expect("create");
            let live = sim.current().expect("live");
            assert!((6..=10).contains(&live.total_rounds), "got {}", live.total_rounds);
        }
    }

    #[test]
    fn no_live_match_means_no_round() {
        let mut sim = sim(4);
        assert!(sim.simulate_round().is_none());
    }

    #[test]
    fn manual_singles_scenario() {
        let mut sim = sim(99);
        let pair = ids(&["neon-tempest", "the-pharaoh"]);
        sim.create_match(&pair, &singles(), None).expect("create");

        let first = sim.simulate_round().expect("round 1");
        assert_eq!(first.round, 1);
        assert_eq!(first.phase, MatchPhase::Early);

        let mut last = first;
        while !last.finished {
            last = sim.simulate_round().expect("unfinished match still rounds");
        }
        assert!(matches!(last.phase, MatchPhase::Late | MatchPhase::Finish));

        let live = sim.current().expect("resolved match still inspectable");
        let winner = live.winner.clone().expect("winner set");
        assert!(pair.contains(&winner));
        let method = live.win_method.expect("method set");
        assert!(matches!(
            method,
            WinMethod::Pinfall
                | WinMethod::Submission
                | WinMethod::CountOut
                | WinMethod::Disqualification
        ));

        // Once resolved, further rounds are no-ops until finalization.
        assert!(sim.simulate_round().is_none());
        let (final_state, summary) = sim.finalize_match().expect("finalize");
        assert_eq!(summary.winner, winner);
        assert_eq!(final_state.id, summary.id);
        assert!(sim.current().is_none());
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn clamps_hold_for_every_round() {
        for seed in 0..20 {
            let mut sim = sim(seed);
            let outcome = sim
                .simulate_full_match(
                    &ids(&["atlas-crane", "the-mortician"]),
                    &MatchTypeId::from("hell-in-a-cell"),
                    None,
                )
                .expect("run");
            for round in &outcome.rounds {
                for c in &round.combatants {
                    assert!((-10.0..=10.0).contains(&c.momentum), "momentum {}", c.momentum);
                    assert!((0.0..=100.0).contains(&c.damage), "damage {}", c.damage);
                }
            }
        }
    }

    #[test]
    fn full_match_terminates_within_ceiling_plus_one() {
        for seed in 0..40 {
            let mut sim = sim(seed);
            let outcome = sim
                .simulate_full_match(&ids(&["captain-granite", "baron-blackwood"]), &singles(), None)
                .expect("run");
            assert!(outcome.summary.rounds <= 21, "took {} rounds", outcome.summary.rounds);
            assert!(outcome
                .summary
                .participants
                .contains(&outcome.summary.winner));
        }
    }

    #[test]
    fn battle_royal_terminates_and_crowns_a_participant() {
        let field = ids(&[
            "atlas-crane",
            "the-mortician",
            "neon-tempest",
            "velvet-viper",
            "midnight-queen",
            "captain-granite",
            "baron-blackwood",
            "jester-wilde",
        ]);
        for seed in 0..25 {
            let mut sim = sim(seed);
            let outcome = sim
                .simulate_full_match(&field, &MatchTypeId::from("battle-royal"), None)
                .expect("run");
            assert!(outcome.summary.rounds <= 21);
            assert!(field.contains(&outcome.summary.winner));
            assert_eq!(outcome.summary.win_method, WinMethod::OverTheTopRope);
        }
    }

    #[test]
    fn reversal_inverts_the_advantage() {
        let mut live = Match {
            id: MatchId::new(),
            match_type: singles(),
            participants: ids(&["a", "b"]),
            for_title: None,
            total_rounds: 8,
            current_round: 1,
            combatants: vec![
                Combatant::fresh(CharacterId::from("a")),
                Combatant::fresh(CharacterId::from("b")),
            ],
            eliminated: Vec::new(),
            log: Vec::new(),
            winner: None,
            win_method: None,
            started_at: Utc::now(),
        };

        let reversal = RoundBeat { name: "counter", weapon: false, reversal: true };
        apply_beat(&mut live, 0, 1, &reversal, 3, 20.0);

        assert!((live.combatants[0].momentum - -6.0).abs() < f32::EPSILON);
        assert!((live.combatants[1].momentum - 6.0).abs() < f32::EPSILON);
        assert!((live.combatants[0].damage - 10.0).abs() < f32::EPSILON);
        assert!((live.combatants[1].damage - 20.0).abs() < f32::EPSILON);

        let plain = RoundBeat { name: "power-slam", weapon: false, reversal: false };
        apply_beat(&mut live, 0, 1, &plain, 2, 10.0);
        assert!((live.combatants[0].momentum - -4.0).abs() < f32::EPSILON);
        assert!((live.combatants[1].momentum - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn weapon_beats_never_appear_in_clean_matches() {
        for seed in 0..15 {
            let mut sim = sim(seed);
            let outcome = sim
                .simulate_full_match(&ids(&["turbo-comet", "grim-halloway"]), &singles(), None)
                .expect("run");
            for event in &outcome.final_state.log {
                assert!(
                    !matches!(
                        event.beat.as_str(),
                        "chair-shot" | "table-spot" | "kendo-stick-shot" | "weapon-finish"
                    ),
                    "clean match used weapon beat {}",
                    event.beat
                );
            }
        }
    }

    #[test]
    fn history_is_truncated_from_the_front() {
        let mut sim = sim(7);
        let pair = ids(&["atlas-crane", "the-mortician"]);
        let mut first_id = None;
        for i in 0..55 {
            let outcome = sim.simulate_full_match(&pair, &singles(), None).expect("run");
            if i == 0 {
                first_id = Some(outcome.summary.id);
            }
        }
        assert_eq!(sim.history().len(), 50);
        let first_kept = sim.history().first().expect("non-empty").id;
        assert_ne!(Some(first_kept), first_id, "oldest entries must drop first");
    }

    #[test]
    fn forced_resolution_prefers_damage_dealt() {
        let mut live = Match {
            id: MatchId::new(),
            match_type: MatchTypeId::from("battle-royal"),
            participants: ids(&["a", "b", "c"]),
            for_title: None,
            total_rounds: 30,
            current_round: 21,
            combatants: vec![
                Combatant::fresh(CharacterId::from("a")),
                Combatant::fresh(CharacterId::from("b")),
                Combatant::fresh(CharacterId::from("c")),
            ],
            eliminated: vec![CharacterId::from("c")],
            log: vec![
                MatchEvent {
                    round: 1,
                    phase: MatchPhase::Early,
                    beat: "lock-up".to_string(),
                    actor: CharacterId::from("a"),
                    target: CharacterId::from("b"),
                    swing: 2,
                    damage: 8.0,
                    reversal: false,
                },
                MatchEvent {
                    round: 2,
                    phase: MatchPhase::Early,
                    beat: "quick-strike".to_string(),
                    actor: CharacterId::from("b"),
                    target: CharacterId::from("a"),
                    swing: 2,
                    damage: 30.0,
                    reversal: false,
                },
                MatchEvent {
                    round: 3,
                    phase: MatchPhase::Early,
                    beat: "quick-strike".to_string(),
                    actor: CharacterId::from("c"),
                    target: CharacterId::from("a"),
                    swing: 2,
                    damage: 90.0,
                    reversal: false,
                },
            ],
            winner: None,
            win_method: None,
            started_at: Utc::now(),
        };
        let catalog = MatchCatalog::builtin();
        let def = catalog.get(&MatchTypeId::from("battle-royal")).expect("def");

        // "c" dealt the most but is eliminated; "b" leads the survivors.
        resolve_forced(&mut live, def);
        assert_eq!(live.winner, Some(CharacterId::from("b")));
        assert_eq!(live.win_method, Some(WinMethod::OverTheTopRope));
    }
}
