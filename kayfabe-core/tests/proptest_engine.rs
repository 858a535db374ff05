//! Property-based tests for the kayfabe engine.
//!
//! Random seeds and inputs drive the simulator, director, feud book, and
//! ledger through their public surfaces; the assertions pin the structural
//! guarantees that must hold no matter what the dice say.

use proptest::prelude::*;

use chrono::Utc;
use kayfabe_core::config::{DirectorConfig, LedgerConfig, SimulatorConfig};
use kayfabe_core::director::{surprise_chance, StorylineDirector};
use kayfabe_core::feud::{FeudBook, FeudPhase, MAX_INTENSITY};
use kayfabe_core::ledger::ChampionshipLedger;
use kayfabe_core::registry::CharacterRegistry;
use kayfabe_core::simulator::{MatchSimulator, DAMAGE_CAP, MOMENTUM_RANGE};
use kayfabe_core::types::{CharacterId, MatchTypeId, TitleId, WinMethod};
use kayfabe_core::weighted::weighted_pick;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn cid(slug: &str) -> CharacterId {
    CharacterId::from(slug)
}

fn seeded_simulator(seed: u64) -> MatchSimulator {
    MatchSimulator::with_seed(
        Arc::new(CharacterRegistry::builtin()),
        SimulatorConfig::default(),
        seed,
    )
}

// ---------------------------------------------------------------------------
// Property: combat state stays clamped and matches always terminate
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn singles_state_stays_clamped_for_any_seed(seed in any::<u64>()) {
        let mut sim = seeded_simulator(seed);
        let pair = [cid("atlas-crane"), cid("the-mortician")];
        let outcome = sim
            .simulate_full_match(&pair, &MatchTypeId::from("singles"), None)
            .expect("valid match");

        prop_assert!(!outcome.rounds.is_empty());
        prop_assert!(outcome.rounds.len() <= 21, "ran {} rounds", outcome.rounds.len());
        let (mo_min, mo_max) = MOMENTUM_RANGE;
        for round in &outcome.rounds {
            prop_assert!((1..=3).contains(&round.swing), "swing {}", round.swing);
            prop_assert!(round.damage >= 0.0);
            for combatant in &round.combatants {
                prop_assert!(combatant.momentum >= mo_min && combatant.momentum <= mo_max);
                prop_assert!(combatant.damage >= 0.0 && combatant.damage <= DAMAGE_CAP);
            }
        }

        prop_assert!(pair.contains(&outcome.summary.winner));
        prop_assert!(
            [
                WinMethod::Pinfall,
                WinMethod::Submission,
                WinMethod::CountOut,
                WinMethod::Disqualification,
            ]
            .contains(&outcome.summary.win_method)
        );
    }
}

// ---------------------------------------------------------------------------
// Property: battle royals crown a survivor inside the safety ceiling
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn battle_royals_always_crown_a_survivor(seed in any::<u64>()) {
        let mut sim = seeded_simulator(seed);
        let field = [
            cid("atlas-crane"),
            cid("the-mortician"),
            cid("neon-tempest"),
            cid("velvet-viper"),
            cid("midnight-queen"),
            cid("captain-granite"),
        ];
        let outcome = sim
            .simulate_full_match(&field, &MatchTypeId::from("battle-royal"), None)
            .expect("valid match");

        // Total rounds can be drawn past the ceiling; the forced finish
        // keeps the actual run bounded.
        prop_assert!(outcome.rounds.len() <= 21, "ran {} rounds", outcome.rounds.len());
        prop_assert!(field.contains(&outcome.summary.winner));
        prop_assert_eq!(outcome.summary.win_method, WinMethod::OverTheTopRope);

        let eliminated = &outcome.final_state.eliminated;
        for e in eliminated {
            prop_assert!(field.contains(e), "eliminated unknown {e}");
        }
        let mut deduped = eliminated.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), eliminated.len(), "double elimination");
    }
}

// ---------------------------------------------------------------------------
// Property: the surprise clock is silent, then ramps, then plateaus
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn surprise_chance_ramps_monotonically(beats in 0..u32::MAX) {
        let config = DirectorConfig::default();
        let here = surprise_chance(beats, &config);
        let next = surprise_chance(beats + 1, &config);

        prop_assert!((0.0..=config.surprise_ceiling).contains(&here));
        prop_assert!(next >= here, "chance fell from {here} to {next} at {beats}");
        if beats <= config.surprise_min_beats {
            prop_assert!(here.abs() < f32::EPSILON, "fired early at {beats}");
        }
    }
}

// ---------------------------------------------------------------------------
// Property: weighted picks land only on positive weights
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn weighted_pick_lands_only_on_positive_weights(
        weights in prop::collection::vec(0..50u32, 1..16),
        seed in any::<u64>(),
    ) {
        let entries: Vec<(usize, u32)> =
            weights.iter().copied().enumerate().collect();
        let total: u32 = weights.iter().sum();
        let mut rng = StdRng::seed_from_u64(seed);

        match weighted_pick(&mut rng, &entries) {
            Some(&idx) => {
                prop_assert!(total > 0);
                prop_assert!(weights[idx] > 0, "picked zero-weight entry {idx}");
            }
            None => prop_assert_eq!(total, 0, "pick refused a drawable list"),
        }
    }
}

// ---------------------------------------------------------------------------
// Property: feud intensity is clamped and its phase tracks the bands
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn feud_intensity_stays_clamped(
        initial in -20.0..30.0f32,
        bumps in prop::collection::vec(-3.0..3.0f32, 0..40),
    ) {
        let now = Utc::now();
        let mut book = FeudBook::new();
        let (a, b) = (cid("hero"), cid("rival"));
        book.start(a.clone(), b.clone(), initial, now);

        for amount in bumps {
            let after = book.bump(&a, &b, amount, 5.0, now);
            prop_assert!((0.0..=MAX_INTENSITY).contains(&after), "intensity {after}");
            let feud = book.get(&b, &a).expect("feud exists");
            prop_assert!((feud.intensity - after).abs() < f32::EPSILON);
            prop_assert_eq!(feud.phase, FeudPhase::for_intensity(after));
        }
    }
}

// ---------------------------------------------------------------------------
// Property: award chains keep title lineage bounded and coherent
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn award_chains_keep_lineage_bounded(n in 1..60usize) {
        let config = LedgerConfig::default();
        let cap = config.history_cap;
        let mut ledger = ChampionshipLedger::new(config);
        let world = TitleId::from("world");
        let contenders = [cid("atlas-crane"), cid("the-mortician")];

        for i in 0..n {
            let champion = &contenders[i % 2];
            let change = ledger
                .award_title(&world, champion, WinMethod::Pinfall, Utc::now())
                .expect("known title");
            prop_assert_eq!(&change.new_champion, champion);
            let state = ledger.state(&world).expect("known title");
            prop_assert_eq!(state.defenses, 0, "defenses reset on award");
        }

        let state = ledger.state(&world).expect("known title");
        prop_assert_eq!(state.holder.as_ref(), Some(&contenders[(n - 1) % 2]));
        prop_assert_eq!(state.history.len(), (n - 1).min(cap));
    }
}

// ---------------------------------------------------------------------------
// Property: the director swallows arbitrary text without breaking state
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn director_swallows_arbitrary_messages(
        message in ".{0,200}",
        seed in any::<u64>(),
    ) {
        let registry = Arc::new(CharacterRegistry::builtin());
        let mut director =
            StorylineDirector::with_seed(registry, DirectorConfig::default(), seed);
        let author = cid("atlas-crane");
        director.send_to_wings(&cid("turbo-comet")).expect("known");
        director.send_to_wings(&cid("jester-wilde")).expect("known");

        for call in 1..=40u64 {
            let cues = director.decide_responders(&message, &author);
            for cue in &cues {
                prop_assert_ne!(&cue.character, &author, "author answered themselves");
            }
            prop_assert_eq!(director.message_count(), call);
        }

        // Surprises may move people from the wings, but the roster
        // partition never tears.
        let active = director.active();
        let wings = director.wings();
        prop_assert_eq!(active.len() + wings.len(), 12);
        for id in wings {
            prop_assert!(!active.contains(id), "{id} is in both lists");
        }
        prop_assert!(director.beats_since_surprise() <= 40);
    }
}
