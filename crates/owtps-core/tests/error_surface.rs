use owtps_core::errors::{codes, ErrorInfo, OwtpsError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("line", "3")
        .with_context("file", "trial.dat")
}

#[test]
fn summary_error_surface() {
    let err = OwtpsError::Summary(sample_info(codes::MALFORMED_SUMMARY_LINE, "two fields"));
    assert_eq!(err.code(), "malformed-summary-line");
    assert!(err.info().context.contains_key("line"));
}

#[test]
fn replay_error_surface() {
    let err = OwtpsError::Replay(sample_info(codes::NO_OVERLAP, "no shared frames"));
    assert_eq!(err.info().code, codes::NO_OVERLAP);
    assert!(err.info().context.contains_key("file"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = OwtpsError::Config(
        ErrorInfo::new(codes::CONFLICTING_SHOOTING_BASIS, "contradicting flags")
            .with_context("retrim_shooting", "true")
            .with_hint("set only one of the two flags"),
    );
    let text = err.to_string();
    assert!(text.starts_with("config error: contradicting flags"));
    assert!(text.contains("retrim_shooting=true"));
    assert!(text.contains("hint: set only one"));
}

#[test]
fn context_can_be_added_after_the_fact() {
    let err = OwtpsError::Trajectory(ErrorInfo::new(codes::TRAJECTORY_READ, "missing"))
        .with_context("summary_line", "7");
    assert!(matches!(err, OwtpsError::Trajectory(_)));
    assert_eq!(
        err.info().context.get("summary_line").map(String::as_str),
        Some("7")
    );
}

#[test]
fn errors_round_trip_json() {
    let err = OwtpsError::Ensemble(sample_info(
        codes::EMPTY_INITIAL_SUBTRAJECTORY,
        "no transition",
    ));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"Ensemble\""));
    let decoded: OwtpsError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}
