//! Session settings
//!
//! Authored as JSON; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::DrillError;
use crate::sim::{
    EngineSettings, RangeReferences, StanceRequirement, StanceThresholds, ThrowConfig, ThrowKind,
};

/// Object pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Entities created up front
    pub initial_size: usize,
    /// Hard ceiling on growth (None = unbounded)
    pub max_size: Option<usize>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            initial_size: 10,
            max_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillSettings {
    /// Session label handed to the result sink
    pub player_label: String,
    /// Seed for trial order, teleports and cue placement
    pub seed: u64,
    /// Number of randomized pitches per run
    pub total_pitches: usize,
    /// Pitch prototypes to sample from
    pub catalog: Vec<ThrowConfig>,

    // === Timing ===
    pub inter_trial_delay: f32,
    pub countdown_counts: u32,
    pub countdown_step: f32,
    pub go_flash: f32,
    /// Added to a throw's lifetime before the trial times out
    pub outcome_grace: f32,

    // === Stance ===
    /// None skips the stance wait
    pub required_stance: StanceRequirement,
    pub stance_timeout: f32,
    pub stance_thresholds: StanceThresholds,

    // === Audio ===
    /// Probability that a trial starts with the audio cue check
    pub audio_cue_chance: f32,

    pub pool: PoolSettings,
    pub engine: EngineSettings,
    pub range: RangeReferences,
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self {
            player_label: "DefaultPlayer".to_string(),
            seed: 0x5eed,
            total_pitches: 20,
            catalog: Self::default_catalog(),

            inter_trial_delay: INTER_TRIAL_DELAY,
            countdown_counts: COUNTDOWN_COUNTS,
            countdown_step: COUNTDOWN_STEP,
            go_flash: GO_FLASH,
            outcome_grace: OUTCOME_GRACE,

            required_stance: StanceRequirement::FeetTogether,
            stance_timeout: STANCE_TIMEOUT,
            stance_thresholds: StanceThresholds::default(),

            audio_cue_chance: 0.0,

            pool: PoolSettings::default(),
            engine: EngineSettings::default(),
            range: RangeReferences::default(),
        }
    }
}

impl DrillSettings {
    /// One prototype per throw kind
    pub fn default_catalog() -> Vec<ThrowConfig> {
        vec![
            ThrowConfig {
                label: "Fastball".to_string(),
                ..ThrowConfig::of_kind(ThrowKind::Basic)
            },
            ThrowConfig {
                label: "Curveball".to_string(),
                ..ThrowConfig::of_kind(ThrowKind::Curve)
            },
            ThrowConfig {
                label: "Blinker".to_string(),
                ..ThrowConfig::of_kind(ThrowKind::AppearingDisappearing)
            },
        ]
    }

    pub fn from_json_str(json: &str) -> Result<Self, DrillError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, DrillError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DrillError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&json)?;
        log::info!(
            "Loaded settings from {} ({} prototypes, {} pitches)",
            path.as_ref().display(),
            settings.catalog.len(),
            settings.total_pitches
        );
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DrillError> {
        std::fs::write(path.as_ref(), self.to_json_string()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Catalog entries that pass validation; the rest are dropped with a warning
    pub fn valid_catalog(&self) -> Vec<ThrowConfig> {
        self.catalog
            .iter()
            .filter(|cfg| match cfg.validate() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Dropping catalog entry: {}", e);
                    false
                }
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "total_pitches": 4,
            "required_stance": "Staggered",
            "catalog": [{ "kind": "Curve", "curve_height": 2.0 }]
        }"#;
        let settings = DrillSettings::from_json_str(json).unwrap();
        assert_eq!(settings.total_pitches, 4);
        assert_eq!(settings.required_stance, StanceRequirement::Staggered);
        assert_eq!(settings.catalog.len(), 1);
        assert_eq!(settings.catalog[0].kind, ThrowKind::Curve);
        assert_eq!(settings.catalog[0].curve_height, 2.0);
        assert_eq!(settings.catalog[0].lifetime, 6.0);
        assert_eq!(settings.player_label, "DefaultPlayer");
        assert_eq!(settings.outcome_grace, 0.5);
    }

    #[test]
    fn test_round_trip_json() {
        let settings = DrillSettings::default();
        let json = settings.to_json_string().unwrap();
        assert_eq!(DrillSettings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            DrillSettings::from_json_str("{ not json"),
            Err(DrillError::Settings(_))
        ));
    }

    #[test]
    fn test_invalid_prototypes_dropped() {
        let mut settings = DrillSettings::default();
        settings.catalog.push(ThrowConfig {
            speed: -2.0,
            ..Default::default()
        });
        assert_eq!(settings.valid_catalog().len(), 3);
    }
}
