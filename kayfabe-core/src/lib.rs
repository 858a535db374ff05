//! # Kayfabe Core Library
//!
//! Autonomous pro-wrestling promotion engine. The crate runs the whole
//! show without an operator: characters talk back in kayfabe, feuds heat
//! up toward a blowoff, and the championship picture follows from what
//! happens in the ring.
//!
//! The moving parts:
//!
//! - [`StorylineDirector`](director::StorylineDirector) decides who
//!   answers an in-character message, tracks feud intensity and
//!   short-term heat, and springs roster surprises on a rising clock.
//! - [`MatchSimulator`](simulator::MatchSimulator) plays matches out one
//!   round at a time with momentum, damage, reversals, and phase-gated
//!   finishes.
//! - [`ChampionshipLedger`](ledger::ChampionshipLedger) keeps every
//!   title's lineage: reigns, defenses, vacancies.
//! - [`PpvBooker`](booker::PpvBooker) cuts event cards from the live
//!   feud table and walks each event through its lifecycle.
//! - [`Promotion`](engine::Promotion) wires it all together over a
//!   SQLite snapshot store with a background writer thread.
//!
//! Every engine owns its RNG and accepts a fixed seed, so a whole show
//! can be replayed beat for beat.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod booker;
pub mod config;
pub mod director;
pub mod engine;
pub mod error;
pub mod feud;
pub mod heat;
pub mod ledger;
pub mod match_types;
pub mod persistence;
pub mod registry;
pub mod simulator;
pub mod story;
pub mod types;
pub mod weighted;
pub mod writer;

pub use booker::{EventReport, PpvBooker};
pub use config::KayfabeConfig;
pub use director::{ResponderCue, StorylineDirector};
pub use engine::Promotion;
pub use error::{KayfabeError, Result};
pub use ledger::ChampionshipLedger;
pub use registry::CharacterRegistry;
pub use simulator::MatchSimulator;
pub use types::*;
