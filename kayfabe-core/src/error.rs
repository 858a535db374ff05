//! Error types for the kayfabe core library.

use thiserror::Error;

/// Top-level error type for all engine operations.
///
/// Validation failures are ordinary values callers branch on; nothing in
/// the engine panics over bad input or a storage fault.
#[derive(Error, Debug)]
pub enum KayfabeError {
    /// Character slug not present in the registry.
    #[error("Unknown character: {0}")]
    UnknownCharacter(crate::CharacterId),

    /// Match-type slug not present in the catalog.
    #[error("Unknown match type: {0}")]
    UnknownMatchType(crate::MatchTypeId),

    /// Title slug not present in the championship catalog.
    #[error("Unknown title: {0}")]
    UnknownTitle(crate::TitleId),

    /// Event-template slug not present in the template catalog.
    #[error("Unknown event template: {0}")]
    UnknownTemplate(crate::TemplateId),

    /// Event ID not found among scheduled or active events.
    #[error("Unknown event: {0}")]
    UnknownEvent(crate::EventId),

    /// Participant list size outside the match type's allowed range.
    #[error("Bad participant count for {match_type}: got {got}, allowed {min}..={max}")]
    ParticipantCount {
        /// Match type being created.
        match_type: crate::MatchTypeId,
        /// Minimum allowed participants.
        min: usize,
        /// Maximum allowed participants.
        max: usize,
        /// Count actually supplied.
        got: usize,
    },

    /// The same character was listed twice for one match.
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(crate::CharacterId),

    /// A live match already exists; finish it before creating another.
    #[error("A match is already in progress: {0}")]
    MatchInProgress(crate::MatchId),

    /// Event cannot start with an empty card.
    #[error("Event card is empty: {0}")]
    EmptyCard(crate::EventId),

    /// Another event is already in progress.
    #[error("An event is already in progress: {0}")]
    EventInProgress(crate::EventId),

    /// Operation requires an in-progress event and none exists.
    #[error("No event is in progress")]
    NoActiveEvent,

    /// Roster document or config failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A simulation invariant was broken mid-run.
    #[error("Simulation fault: {0}")]
    Simulation(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse failure.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, KayfabeError>;
