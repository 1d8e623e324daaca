//! Per-line conversion options.

use std::convert::TryFrom;

use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::OwtpsError;
use serde::{Deserialize, Serialize};

/// Frame of reference of the shooting index written in the summary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShootingBasis {
    /// Index counts frames of the trimmed current trajectory.
    #[default]
    Trimmed,
    /// Index counts frames of the untrimmed trial it was shot from; it is
    /// corrected by the running trim offsets before use.
    Untrimmed,
}

impl ShootingBasis {
    /// Basis meant by the `retrim_shooting` flag.
    pub fn from_retrim_shooting(retrim: bool) -> Self {
        if retrim {
            ShootingBasis::Untrimmed
        } else {
            ShootingBasis::Trimmed
        }
    }

    /// Basis meant by the `trimmed_shooting` flag.
    pub fn from_trimmed_shooting(trimmed: bool) -> Self {
        if trimmed {
            ShootingBasis::Trimmed
        } else {
            ShootingBasis::Untrimmed
        }
    }

    /// Reconciles every way of stating the basis; disagreeing statements are an error.
    pub fn resolve(
        basis: Option<ShootingBasis>,
        retrim_shooting: Option<bool>,
        trimmed_shooting: Option<bool>,
    ) -> Result<Self, OwtpsError> {
        let stated = [
            ("shooting_basis", basis),
            (
                "retrim_shooting",
                retrim_shooting.map(Self::from_retrim_shooting),
            ),
            (
                "trimmed_shooting",
                trimmed_shooting.map(Self::from_trimmed_shooting),
            ),
        ];
        let mut resolved: Option<(&str, ShootingBasis)> = None;
        for (key, value) in stated {
            let Some(value) = value else { continue };
            match resolved {
                Some((first, earlier)) if earlier != value => {
                    return Err(OwtpsError::Config(
                        ErrorInfo::new(
                            codes::CONFLICTING_SHOOTING_BASIS,
                            "shooting index basis stated twice with different meanings",
                        )
                        .with_context(first, format!("{earlier:?}"))
                        .with_context(key, format!("{value:?}"))
                        .with_hint("keep only one of shooting_basis, retrim_shooting, trimmed_shooting"),
                    ));
                }
                Some(_) => {}
                None => resolved = Some((key, value)),
            }
        }
        Ok(resolved.map(|(_, value)| value).unwrap_or_default())
    }
}

/// How a summary line and its trajectory file are turned into a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OptionsFile")]
pub struct ConversionOptions {
    /// Trim trial trajectories to the boundary ensemble.
    pub trim: bool,
    /// Frame of reference of the summary shooting index.
    pub shooting_basis: ShootingBasis,
    /// Backward trajectory files are stored in forward time order.
    pub auto_reverse: bool,
    /// Trajectory files start (or end) with the shooting frame.
    pub includes_shooting_point: bool,
    /// Trajectory files hold the whole path; the trial is cut at the index
    /// given by the fifth summary field.
    pub full_trajectory: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            trim: true,
            shooting_basis: ShootingBasis::Trimmed,
            auto_reverse: false,
            includes_shooting_point: true,
            full_trajectory: false,
        }
    }
}

impl ConversionOptions {
    /// Sets `trim`.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Sets the shooting basis directly.
    pub fn with_shooting_basis(mut self, basis: ShootingBasis) -> Self {
        self.shooting_basis = basis;
        self
    }

    /// `true` means summary indices count untrimmed frames.
    pub fn with_retrim_shooting(self, retrim: bool) -> Self {
        self.with_shooting_basis(ShootingBasis::from_retrim_shooting(retrim))
    }

    /// `false` means summary indices count untrimmed frames.
    pub fn with_trimmed_shooting(self, trimmed: bool) -> Self {
        self.with_shooting_basis(ShootingBasis::from_trimmed_shooting(trimmed))
    }

    /// Sets `auto_reverse`.
    pub fn with_auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.auto_reverse = auto_reverse;
        self
    }

    /// Sets `includes_shooting_point`.
    pub fn with_includes_shooting_point(mut self, includes: bool) -> Self {
        self.includes_shooting_point = includes;
        self
    }

    /// Sets `full_trajectory`.
    pub fn with_full_trajectory(mut self, full: bool) -> Self {
        self.full_trajectory = full;
        self
    }

    /// Value of the `retrim_shooting` flag.
    pub fn retrim_shooting(&self) -> bool {
        self.shooting_basis == ShootingBasis::Untrimmed
    }

    /// Value of the `trimmed_shooting` flag.
    pub fn trimmed_shooting(&self) -> bool {
        self.shooting_basis == ShootingBasis::Trimmed
    }

    /// Whether trials are trimmed; full-trajectory mode never trims.
    pub fn trims(&self) -> bool {
        self.trim && !self.full_trajectory
    }
}

fn yes() -> bool {
    true
}

/// Options as written in YAML, before the shooting basis is reconciled.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OptionsFile {
    #[serde(default = "yes")]
    trim: bool,
    #[serde(default)]
    shooting_basis: Option<ShootingBasis>,
    #[serde(default)]
    retrim_shooting: Option<bool>,
    #[serde(default)]
    trimmed_shooting: Option<bool>,
    #[serde(default)]
    auto_reverse: bool,
    #[serde(default = "yes")]
    includes_shooting_point: bool,
    #[serde(default)]
    full_trajectory: bool,
}

impl TryFrom<OptionsFile> for ConversionOptions {
    type Error = OwtpsError;

    fn try_from(raw: OptionsFile) -> Result<Self, Self::Error> {
        Ok(Self {
            trim: raw.trim,
            shooting_basis: ShootingBasis::resolve(
                raw.shooting_basis,
                raw.retrim_shooting,
                raw.trimmed_shooting,
            )?,
            auto_reverse: raw.auto_reverse,
            includes_shooting_point: raw.includes_shooting_point,
            full_trajectory: raw.full_trajectory,
        })
    }
}

/// Options for accepted lines and, optionally, different ones for rejected lines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionSet {
    /// Options for accepted lines.
    pub accepted: ConversionOptions,
    /// Options for rejected lines; `None` reads `accepted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<ConversionOptions>,
}

impl OptionSet {
    /// Same options for every line.
    pub fn new(accepted: ConversionOptions) -> Self {
        Self {
            accepted,
            rejected: None,
        }
    }

    /// Separate options for rejected lines.
    pub fn with_rejected(mut self, rejected: ConversionOptions) -> Self {
        self.rejected = Some(rejected);
        self
    }

    /// Options governing a line with the given acceptance flag.
    pub fn for_line(&self, accepted: bool) -> &ConversionOptions {
        if accepted {
            &self.accepted
        } else {
            self.rejected.as_ref().unwrap_or(&self.accepted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_flag_spellings_agree() {
        let a = ConversionOptions::default().with_retrim_shooting(true);
        let b = ConversionOptions::default().with_trimmed_shooting(false);
        assert_eq!(a, b);
        assert!(a.retrim_shooting());
        assert!(!a.trimmed_shooting());
    }

    #[test]
    fn rejected_lines_alias_accepted_options() {
        let mut set = OptionSet::new(ConversionOptions::default());
        set.accepted.auto_reverse = true;
        assert!(set.for_line(false).auto_reverse);
        let set = set.with_rejected(ConversionOptions::default().with_trim(false));
        assert!(!set.for_line(false).trim);
        assert!(set.for_line(true).trim);
    }

    #[test]
    fn full_trajectory_disables_trimming() {
        let options = ConversionOptions::default().with_full_trajectory(true);
        assert!(options.trim);
        assert!(!options.trims());
    }
}
