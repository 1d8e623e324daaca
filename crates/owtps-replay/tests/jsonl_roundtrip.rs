use owtps_core::{codes, Frame, Trajectory};
use owtps_replay::{
    decorrelated_trajectories, path_lengths, write_step_table, Direction, JsonLinesStorage,
    MoveRecord, ReplayConfig, ReplayEngine, Sample, SampleSet, StepChange, StepStorage,
};
use tempfile::tempdir;

fn engine_with(path: &std::path::Path) -> ReplayEngine<Frame, JsonLinesStorage> {
    let initial = Trajectory::from_scalars(&[-0.1, 1.0, 2.0, 3.0, 4.0, 5.0, 10.1]);
    let set = SampleSet::new(vec![Sample::new(0, initial, "tps")]);
    let storage = JsonLinesStorage::create(path).expect("create storage");
    ReplayEngine::with_storage(set, ReplayConfig::default(), Some(storage))
}

#[test]
fn step_history_survives_a_round_trip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run").join("steps.jsonl");
    let mut engine = engine_with(&path);
    engine
        .run(vec![
            MoveRecord::new(
                Trajectory::from_scalars(&[-0.2, 1.5]),
                3,
                true,
                Direction::Backward,
            ),
            MoveRecord::new(
                Trajectory::from_scalars(&[6.0, 10.5]),
                4,
                false,
                Direction::Forward,
            ),
        ])
        .expect("replay");
    engine.close().expect("close");

    let stored = JsonLinesStorage::read::<Frame>(&path).expect("read back");
    let scheme = stored.scheme.expect("scheme line");
    assert_eq!(scheme.groups["shooting"].len(), 2);
    assert_eq!(stored.steps.len(), 3);
    assert!(matches!(stored.steps[0].change, StepChange::Initial));
    assert_eq!(path_lengths(&stored.steps, 0), vec![7, 6, 6]);
    let accepted: Vec<Option<bool>> = stored.steps.iter().map(|s| s.change.accepted()).collect();
    assert_eq!(accepted, vec![None, Some(true), Some(false)]);
    // shared frames become equal values once read back
    assert_eq!(decorrelated_trajectories(&stored.steps, 0).len(), 1);

    let table = dir.path().join("steps.csv");
    write_step_table(&stored.steps, &table).expect("table");
    let text = std::fs::read_to_string(&table).expect("read table");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("step,replica,mover,accepted"));
    assert!(lines[1].starts_with("0,,initial,"));
    assert!(lines[2].starts_with("1,0,backward-shooting,true,3,2,6,"));
}

#[test]
fn writes_after_close_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("steps.jsonl");
    let mut engine = engine_with(&path);
    engine.start().expect("start");
    engine.close().expect("close");
    let storage = engine.storage_mut().expect("storage");
    let scheme = owtps_replay::MoveScheme::one_way_shooting(Default::default());
    let err = StepStorage::<Frame>::save_scheme(storage, &scheme).unwrap_err();
    assert_eq!(err.code(), codes::STORAGE_CLOSED);
}

#[test]
fn initial_step_without_previous_set_reads_back() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("steps.jsonl");
    let mut engine = engine_with(&path);
    engine.start().expect("start");
    engine.close().expect("close");

    let text = std::fs::read_to_string(&path).expect("read steps");
    assert!(text.contains("\"previous\":null"));
    std::fs::write(&path, text.replace("\"previous\":null,", "")).expect("rewrite steps");

    let stored = JsonLinesStorage::read::<Frame>(&path).expect("read back");
    assert_eq!(stored.steps.len(), 1);
    assert!(stored.steps[0].previous.is_none());
    assert_eq!(path_lengths(&stored.steps, 0), vec![7]);
}
