use serde::{Deserialize, Serialize};

/// How move records carry their trial trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TrialForm {
    /// Only the newly generated frames; the engine splices them onto the
    /// current trajectory.
    #[default]
    OneWay,
    /// The whole trial path, already joined with the carried-over frames.
    PreJoined,
}

/// Replay engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Interval in steps between sample-set checks and storage syncs
    /// (0 disables the periodic check).
    #[serde(default = "default_save_frequency")]
    pub save_frequency: usize,
    /// Shape of the trial trajectories handed to the engine.
    #[serde(default)]
    pub trial_form: TrialForm,
    /// Label of the sampling ensemble attached to every sample.
    #[serde(default = "default_ensemble_label")]
    pub ensemble: String,
}

fn default_save_frequency() -> usize {
    100
}

fn default_ensemble_label() -> String {
    "tps".to_string()
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            save_frequency: default_save_frequency(),
            trial_form: TrialForm::default(),
            ensemble: default_ensemble_label(),
        }
    }
}

impl ReplayConfig {
    /// Same settings with pre-joined trials.
    pub fn pre_joined(mut self) -> Self {
        self.trial_form = TrialForm::PreJoined;
        self
    }
}
