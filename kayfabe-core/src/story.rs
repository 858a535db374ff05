//! Narrative catalogs and directive synthesis.
//!
//! The engine never generates prose itself; it produces short *directives*
//! that an external text generator turns into in-character lines. This
//! module owns the weighted beat catalogs (feud beats, surprise sub-types,
//! promo topics), the directive templates, and the compact beat record
//! that flows into the rolling history and the audit log.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::CharacterId;
use crate::weighted::weighted_pick;

// ---------------------------------------------------------------------------
// Feud beats
// ---------------------------------------------------------------------------

/// One unit of feud storytelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeudBeat {
    /// Straight insult promo.
    TrashTalk,
    /// Direct challenge to a match.
    Challenge,
    /// Hint that the rivals might align.
    AllianceTease,
    /// Dig into the shared history.
    Backstory,
    /// Push the feud past words.
    Escalation,
    /// Psychological warfare.
    MindGames,
}

/// Weighted catalog of feud beats (100-point pool).
pub const FEUD_BEAT_WEIGHTS: [(FeudBeat, u32); 6] = [
    (FeudBeat::TrashTalk, 35),
    (FeudBeat::Challenge, 15),
    (FeudBeat::AllianceTease, 10),
    (FeudBeat::Backstory, 15),
    (FeudBeat::Escalation, 15),
    (FeudBeat::MindGames, 10),
];

impl fmt::Display for FeudBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrashTalk => write!(f, "trash-talk"),
            Self::Challenge => write!(f, "challenge"),
            Self::AllianceTease => write!(f, "alliance-tease"),
            Self::Backstory => write!(f, "backstory"),
            Self::Escalation => write!(f, "escalation"),
            Self::MindGames => write!(f, "mind-games"),
        }
    }
}

/// Draw a feud beat from the weighted catalog.
pub fn pick_feud_beat<R: Rng + ?Sized>(rng: &mut R) -> FeudBeat {
    weighted_pick(rng, &FEUD_BEAT_WEIGHTS)
        .copied()
        .unwrap_or(FeudBeat::TrashTalk)
}

// ---------------------------------------------------------------------------
// Surprise sub-types
// ---------------------------------------------------------------------------

/// Flavor of a surprise appearance from the wings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurpriseKind {
    /// Unannounced entrance.
    Entrance,
    /// Cutting off a live segment.
    Interruption,
    /// Running in to rescue someone.
    Save,
    /// Turning on an ally.
    Betrayal,
    /// Comeback after a long absence.
    Return,
    /// Hit-and-run attack.
    RunIn,
}

/// Weighted catalog of surprise sub-types (100-point pool).
pub const SURPRISE_WEIGHTS: [(SurpriseKind, u32); 6] = [
    (SurpriseKind::Entrance, 30),
    (SurpriseKind::Interruption, 30),
    (SurpriseKind::Save, 15),
    (SurpriseKind::Betrayal, 10),
    (SurpriseKind::Return, 10),
    (SurpriseKind::RunIn, 5),
];

impl fmt::Display for SurpriseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entrance => write!(f, "entrance"),
            Self::Interruption => write!(f, "interruption"),
            Self::Save => write!(f, "save"),
            Self::Betrayal => write!(f, "betrayal"),
            Self::Return => write!(f, "return"),
            Self::RunIn => write!(f, "run-in"),
        }
    }
}

/// Draw a surprise sub-type from the weighted catalog.
pub fn pick_surprise_kind<R: Rng + ?Sized>(rng: &mut R) -> SurpriseKind {
    weighted_pick(rng, &SURPRISE_WEIGHTS)
        .copied()
        .unwrap_or(SurpriseKind::Entrance)
}

// ---------------------------------------------------------------------------
// Promo topics
// ---------------------------------------------------------------------------

/// Topic of a scheduled promo for a character with no live feud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromoTopic {
    /// Sell the next match.
    Hype,
    /// Run down the accolades.
    Brag,
    /// Play to the live crowd.
    CrowdWork,
    /// Open challenge to the locker room.
    CallOut,
    /// Cryptic character piece.
    Vignette,
}

/// Weighted catalog of promo topics (100-point pool).
pub const PROMO_TOPIC_WEIGHTS: [(PromoTopic, u32); 5] = [
    (PromoTopic::Hype, 30),
    (PromoTopic::Brag, 20),
    (PromoTopic::CrowdWork, 20),
    (PromoTopic::CallOut, 15),
    (PromoTopic::Vignette, 15),
];

impl fmt::Display for PromoTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hype => write!(f, "hype"),
            Self::Brag => write!(f, "brag"),
            Self::CrowdWork => write!(f, "crowd-work"),
            Self::CallOut => write!(f, "call-out"),
            Self::Vignette => write!(f, "vignette"),
        }
    }
}

/// Draw a promo topic from the weighted catalog.
pub fn pick_promo_topic<R: Rng + ?Sized>(rng: &mut R) -> PromoTopic {
    weighted_pick(rng, &PROMO_TOPIC_WEIGHTS)
        .copied()
        .unwrap_or(PromoTopic::Hype)
}

// ---------------------------------------------------------------------------
// Directive synthesis
// ---------------------------------------------------------------------------

fn intensity_tone(intensity: f32) -> &'static str {
    if intensity >= 8.0 {
        "this is blood-feud territory"
    } else if intensity >= 6.0 {
        "the rivalry is white hot"
    } else if intensity >= 4.0 {
        "there is real tension here"
    } else {
        "keep it light for now"
    }
}

/// Directive for a feud-response, parameterized by opponent and intensity.
#[must_use]
pub fn feud_directive(beat: FeudBeat, opponent_name: &str, intensity: f32) -> String {
    let body = match beat {
        FeudBeat::TrashTalk => {
            format!("Tear into {opponent_name} on the mic; make it personal")
        }
        FeudBeat::Challenge => {
            format!("Lay down a direct challenge to {opponent_name} for a match, any stipulation")
        }
        FeudBeat::AllianceTease => {
            format!("Hint that you and {opponent_name} might be on the same page; leave the crowd guessing")
        }
        FeudBeat::Backstory => {
            format!("Bring up your history with {opponent_name}; remind everyone how this started")
        }
        FeudBeat::Escalation => {
            format!("Escalate things with {opponent_name} past words; promise consequences in the ring")
        }
        FeudBeat::MindGames => {
            format!("Get inside {opponent_name}'s head; imply you know something they don't")
        }
    };
    format!("{body}; {}. (feud intensity {intensity:.1}/10)", intensity_tone(intensity))
}

/// Directive for a surprise appearance.
#[must_use]
pub fn surprise_directive(kind: SurpriseKind) -> &'static str {
    match kind {
        SurpriseKind::Entrance => {
            "Make a dramatic unannounced entrance; soak in the crowd before saying a word"
        }
        SurpriseKind::Interruption => {
            "Cut off whoever is talking mid-sentence; this is your show now"
        }
        SurpriseKind::Save => "Hit the ring to make the save; stand tall over the aftermath",
        SurpriseKind::Betrayal => "Turn on the person who trusted you most, with no explanation",
        SurpriseKind::Return => "You have been gone a long time; let the crowd realize who is back",
        SurpriseKind::RunIn => {
            "Slide in through the crowd, do the damage, and vanish before security arrives"
        }
    }
}

/// Directive for a scheduled promo with no feud attached.
#[must_use]
pub fn promo_directive(topic: PromoTopic) -> &'static str {
    match topic {
        PromoTopic::Hype => "Hype your next match; promise the crowd something they have never seen",
        PromoTopic::Brag => "Run down your accolades; nobody at this level touches you",
        PromoTopic::CrowdWork => "Work the live crowd; this town, this building, these people",
        PromoTopic::CallOut => "Call out anyone in the back with the guts to answer",
        PromoTopic::Vignette => "Cut a cryptic vignette; say less and mean more",
    }
}

/// Directive for a general (non-feud) response to another character.
#[must_use]
pub fn general_directive(author_name: &str) -> String {
    format!("React in character to what {author_name} just said; stay in your lane but leave a mark")
}

// ---------------------------------------------------------------------------
// Beat records
// ---------------------------------------------------------------------------

/// Compact record of one storyline beat, kept in the rolling history and
/// appended to the durable audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBeatRecord {
    /// When the beat happened.
    pub at: DateTime<Utc>,
    /// Beat slug: a feud beat, `surprise-*`, or `promo-*`.
    pub beat: String,
    /// Characters involved, responder first.
    pub characters: Vec<CharacterId>,
    /// Feud intensity at the time, for feud beats only.
    #[serde(default)]
    pub intensity: Option<f32>,
}

impl StoryBeatRecord {
    /// Record a feud beat between a responder and an opponent.
    #[must_use]
    pub fn feud(
        beat: FeudBeat,
        responder: CharacterId,
        opponent: CharacterId,
        intensity: f32,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            at,
            beat: beat.to_string(),
            characters: vec![responder, opponent],
            intensity: Some(intensity),
        }
    }

    /// Record a surprise appearance.
    #[must_use]
    pub fn surprise(kind: SurpriseKind, entrant: CharacterId, at: DateTime<Utc>) -> Self {
        Self {
            at,
            beat: format!("surprise-{kind}"),
            characters: vec![entrant],
            intensity: None,
        }
    }

    /// Record a scheduled promo.
    #[must_use]
    pub fn promo(topic: PromoTopic, speaker: CharacterId, at: DateTime<Utc>) -> Self {
        Self {
            at,
            beat: format!("promo-{topic}"),
            characters: vec![speaker],
            intensity: None,
        }
    }
}
