//! Trial list generation and per-trial results

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{StanceRequirement, ThrowConfig, ThrowKind};
use crate::consts::MISS_REACTION_TIME;

/// One slot of the trial list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialPlan {
    /// Owned copy of a catalog prototype
    pub config: ThrowConfig,
    /// Run the audio cue check before this trial
    pub audio_cue: bool,
}

impl TrialPlan {
    pub fn new(config: ThrowConfig) -> Self {
        Self {
            config,
            audio_cue: false,
        }
    }
}

/// Sample `total` prototypes uniformly, then shuffle the list
///
/// Every slot is an independent copy. An empty catalog yields an empty list.
pub fn generate_trials<R: Rng>(
    catalog: &[ThrowConfig],
    total: usize,
    audio_cue_chance: f32,
    rng: &mut R,
) -> Vec<TrialPlan> {
    if catalog.is_empty() {
        return Vec::new();
    }

    let mut trials: Vec<TrialPlan> = (0..total)
        .map(|_| {
            let proto = &catalog[rng.random_range(0..catalog.len())];
            let audio_cue = audio_cue_chance > 0.0 && rng.random_bool(audio_cue_chance.min(1.0) as f64);
            TrialPlan {
                config: proto.clone(),
                audio_cue,
            }
        })
        .collect();

    trials.shuffle(rng);
    trials
}

/// Result of one administered trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial_index: usize,
    pub label: String,
    pub kind: ThrowKind,
    pub config: ThrowConfig,
    pub required_stance: StanceRequirement,
    /// Stance confirmed by the gate (None when no stance was required)
    pub observed_stance: Option<StanceRequirement>,
    pub audio_trial: bool,
    pub hit: bool,
    /// Seconds from spawn to hit, or -1 for a miss
    pub reaction_time: f32,
    pub spawn_time: f32,
    pub end_time: f32,
    pub note: String,
}

impl TrialRecord {
    pub fn hit(
        trial_index: usize,
        config: &ThrowConfig,
        spawn_time: f32,
        end_time: f32,
        reaction_time: f32,
    ) -> Self {
        Self {
            trial_index,
            label: config.label.clone(),
            kind: config.kind,
            config: config.clone(),
            required_stance: StanceRequirement::None,
            observed_stance: None,
            audio_trial: false,
            hit: true,
            reaction_time: reaction_time.max(0.0),
            spawn_time,
            end_time,
            note: "Hit".to_string(),
        }
    }

    pub fn miss(trial_index: usize, config: &ThrowConfig, spawn_time: f32, end_time: f32) -> Self {
        Self {
            hit: false,
            reaction_time: MISS_REACTION_TIME,
            note: "Miss/Timeout".to_string(),
            ..Self::hit(trial_index, config, spawn_time, end_time, 0.0)
        }
    }

    /// Stance column text ("" when no stance was required)
    pub fn stance_name(&self) -> &'static str {
        self.observed_stance.map(|s| s.as_str()).unwrap_or("")
    }
}
