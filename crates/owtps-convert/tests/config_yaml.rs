use owtps_convert::{ConverterConfig, ShootingBasis};
use owtps_core::{codes, Frame, Trajectory};
use owtps_replay::TrialForm;

const CONFIG: &str = r#"
states:
  - name: left
    upper: 0.0
  - name: right
    lower: 10.0
options:
  auto_reverse: true
  retrim_shooting: true
rejected_options:
  trim: false
replay:
  save_frequency: 10
  trial_form: pre-joined
block_size: 2
loader:
  columns: [1]
output:
  steps_file: history.jsonl
"#;

#[test]
fn yaml_config_fills_defaults() {
    let config = ConverterConfig::from_yaml_str(CONFIG).expect("config");
    assert_eq!(config.states.len(), 2);
    assert!(config.options.auto_reverse);
    assert_eq!(config.options.shooting_basis, ShootingBasis::Untrimmed);
    assert!(config.options.includes_shooting_point);
    assert_eq!(config.replay.save_frequency, 10);
    assert_eq!(config.replay.trial_form, TrialForm::PreJoined);
    assert_eq!(config.replay.ensemble, "tps");
    assert_eq!(config.block_size, 2);
    assert_eq!(config.output.steps_file.to_str(), Some("history.jsonl"));
    assert_eq!(config.output.manifest_file.to_str(), Some("manifest.json"));

    let set = config.option_set();
    assert!(!set.for_line(false).trim);
    assert!(set.for_line(true).trim);

    let states = config.state_set();
    let traj: Trajectory<Frame> = Trajectory::from_scalars(&[-1.0, 5.0, 12.0]);
    let labels: Vec<Option<&str>> = traj.iter().map(|f| states.state_name(f)).collect();
    assert_eq!(labels, vec![Some("left"), None, Some("right")]);
}

#[test]
fn contradicting_basis_flags_are_rejected() {
    let yaml = "states: []\noptions:\n  retrim_shooting: true\n  trimmed_shooting: true\n";
    let err = ConverterConfig::from_yaml_str(yaml).unwrap_err();
    assert_eq!(err.code(), codes::CONFLICTING_SHOOTING_BASIS);
    assert_eq!(err.info().context.get("section").map(String::as_str), Some("options"));

    let rejected = "states: []\nrejected_options:\n  shooting_basis: untrimmed\n  trimmed_shooting: true\n";
    let err = ConverterConfig::from_yaml_str(rejected).unwrap_err();
    assert_eq!(err.code(), codes::CONFLICTING_SHOOTING_BASIS);
    assert_eq!(
        err.info().context.get("section").map(String::as_str),
        Some("rejected_options")
    );

    let agreeing = "states: []\noptions:\n  retrim_shooting: false\n  trimmed_shooting: true\n";
    let config = ConverterConfig::from_yaml_str(agreeing).expect("agreeing flags");
    assert_eq!(config.options.shooting_basis, ShootingBasis::Trimmed);
}

#[test]
fn unknown_option_keys_are_rejected() {
    let yaml = "states: []\noptions:\n  trim_harder: true\n";
    let err = ConverterConfig::from_yaml_str(yaml).unwrap_err();
    assert_eq!(err.code(), codes::CONFIG_PARSE);
}
