//! Configuration for the kayfabe engine.
//!
//! Maps directly to `kayfabe.toml`. Every field has a serde default equal
//! to the engine's built-in tuning, so an empty document is a valid config.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KayfabeConfig {
    /// Storyline director tuning.
    #[serde(default)]
    pub director: DirectorConfig,
    /// Match simulator tuning.
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Pay-per-view booking policy.
    #[serde(default)]
    pub booker: BookerConfig,
    /// Championship ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl KayfabeConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `KayfabeError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::KayfabeError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Storyline director tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// Trailing window for heat tracking, in minutes.
    #[serde(default = "default_30")]
    pub heat_window_minutes: u32,
    /// Heat count above which the soft dampener applies.
    #[serde(default = "default_5_usize")]
    pub heat_soft_threshold: usize,
    /// Heat count above which the hard dampener also applies.
    #[serde(default = "default_10_usize")]
    pub heat_hard_threshold: usize,
    /// Multiplier applied above the soft threshold.
    #[serde(default = "default_0_7")]
    pub heat_soft_factor: f32,
    /// Multiplier applied above the hard threshold, compounding with the soft one.
    #[serde(default = "default_0_5")]
    pub heat_hard_factor: f32,
    /// Response-chance bonus when a character is name-dropped in a message.
    #[serde(default = "default_0_3")]
    pub mention_bonus: f32,
    /// Intensity added to a feud on every feud-response.
    #[serde(default = "default_0_3")]
    pub feud_bump: f32,
    /// Intensity assigned to a feud created implicitly by a feud-response.
    #[serde(default = "default_5_0")]
    pub default_feud_intensity: f32,
    /// Beats that must elapse after a surprise before the next can trigger.
    #[serde(default = "default_8")]
    pub surprise_min_beats: u32,
    /// Per-beat probability ramp once past the minimum.
    #[serde(default = "default_0_025")]
    pub surprise_ramp: f32,
    /// Probability plateau for the surprise trigger.
    #[serde(default = "default_0_35")]
    pub surprise_ceiling: f32,
    /// Persist director state every Nth `decide_responders` call.
    #[serde(default = "default_10_u64")]
    pub snapshot_every: u64,
    /// Beats retained in the in-memory rolling history.
    #[serde(default = "default_100")]
    pub history_cap: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            heat_window_minutes: 30,
            heat_soft_threshold: 5,
            heat_hard_threshold: 10,
            heat_soft_factor: 0.7,
            heat_hard_factor: 0.5,
            mention_bonus: 0.3,
            feud_bump: 0.3,
            default_feud_intensity: 5.0,
            surprise_min_beats: 8,
            surprise_ramp: 0.025,
            surprise_ceiling: 0.35,
            snapshot_every: 10,
            history_cap: 100,
        }
    }
}

/// Match simulator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Rounds after which a finish is forced regardless of phase.
    #[serde(default = "default_20")]
    pub safety_ceiling_rounds: u32,
    /// Match summaries retained in history.
    #[serde(default = "default_50")]
    pub history_cap: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            safety_ceiling_rounds: 20,
            history_cap: 50,
        }
    }
}

/// Pay-per-view booking policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookerConfig {
    /// Feud intensity at or above which the hardest match type is booked.
    #[serde(default = "default_8_0")]
    pub cell_threshold: f32,
    /// Feud intensity at or above which the intermediate type is booked.
    #[serde(default = "default_6_0")]
    pub no_dq_threshold: f32,
    /// Maximum feud-based matches per card.
    #[serde(default = "default_5_usize")]
    pub max_feud_matches: usize,
    /// Maximum total matches per card after filler pairing.
    #[serde(default = "default_6_usize")]
    pub max_card_size: usize,
    /// Completed events retained in history.
    #[serde(default = "default_20_usize")]
    pub completed_cap: usize,
}

impl Default for BookerConfig {
    fn default() -> Self {
        Self {
            cell_threshold: 8.0,
            no_dq_threshold: 6.0,
            max_feud_matches: 5,
            max_card_size: 6,
            completed_cap: 20,
        }
    }
}

/// Championship ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Prior reigns retained per title.
    #[serde(default = "default_20_usize")]
    pub history_cap: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { history_cap: 20 }
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Path of the SQLite state database.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Number of save backups to keep.
    #[serde(default = "default_3")]
    pub backup_count: u32,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            db_path: "kayfabe.db".to_string(),
            wal_mode: true,
            backup_count: 3,
            checksum_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_db_path() -> String { "kayfabe.db".to_string() }
fn default_0_025() -> f32 { 0.025 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_35() -> f32 { 0.35 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_7() -> f32 { 0.7 }
fn default_5_0() -> f32 { 5.0 }
fn default_6_0() -> f32 { 6.0 }
fn default_8_0() -> f32 { 8.0 }
fn default_3() -> u32 { 3 }
fn default_8() -> u32 { 8 }
fn default_20() -> u32 { 20 }
fn default_30() -> u32 { 30 }
fn default_10_u64() -> u64 { 10 }
fn default_5_usize() -> usize { 5 }
fn default_6_usize() -> usize { 6 }
fn default_10_usize() -> usize { 10 }
fn default_20_usize() -> usize { 20 }
fn default_50() -> usize { 50 }
fn default_100() -> usize { 100 }
