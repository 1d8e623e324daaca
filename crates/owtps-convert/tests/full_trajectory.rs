use owtps_convert::{
    ConversionOptions, MemoryLoader, OneWayConverter, OptionSet, SummaryParser, TrimOffsets,
};
use owtps_core::{codes, Frame, RangeVolume, StateSet, Trajectory};
use owtps_replay::{path_lengths, MemoryStorage, ReplayConfig};

fn states() -> StateSet<Frame> {
    StateSet::from(vec![
        RangeVolume::below("left", 0, 0.0),
        RangeVolume::at_or_above("right", 0, 10.0),
    ])
}

fn full_loader() -> MemoryLoader<Frame> {
    MemoryLoader::new()
        .with(
            "f1.dat",
            Trajectory::from_scalars(&[-0.11, 2.1, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.1]),
        )
        .with(
            "f1r.dat",
            Trajectory::from_scalars(&[10.1, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 2.1, -0.11]),
        )
        .with(
            "f2.dat",
            Trajectory::from_scalars(&[-0.11, 2.1, 4.0, 5.2, 7.2, 9.2, 10.12]),
        )
        .with(
            "f3.dat",
            Trajectory::from_scalars(&[-0.13, 2.3, 5.3, 8.3, 9.2, 10.12]),
        )
        .with(
            "f4.dat",
            Trajectory::from_scalars(&[-0.14, 2.4, 4.4, 6.4, 7.2, 9.2, 10.12]),
        )
}

fn full_options() -> ConversionOptions {
    ConversionOptions::default().with_full_trajectory(true)
}

#[test]
fn full_files_yield_the_one_way_segments() {
    let parser = SummaryParser::new(full_loader(), states(), OptionSet::new(full_options()));
    let cases = [
        ("f1.dat 4 BW T 2", vec![-0.11, 2.1]),
        ("f2.dat 2 FW T 2", vec![5.2, 7.2, 9.2, 10.12]),
        ("f3.dat 5 BW F -2", vec![-0.13, 2.3, 5.3, 8.3]),
        ("f4.dat 4 BW T 4", vec![-0.14, 2.4, 4.4, 6.4]),
    ];
    for (line, expected) in cases {
        let parsed = parser.parse_line(line, TrimOffsets::default()).expect(line);
        assert_eq!(parsed.record.trial.scalars(), expected, "{line}");
        assert_eq!(parsed.offsets, TrimOffsets::default());
    }
}

#[test]
fn reversed_full_files_map_the_trial_index() {
    let options = OptionSet::new(full_options().with_auto_reverse(true));
    let parser = SummaryParser::new(full_loader(), states(), options);
    let parsed = parser
        .parse_line("f1r.dat 4 BW T 6", TrimOffsets::default())
        .unwrap();
    assert_eq!(parsed.record.trial.scalars(), vec![-0.11, 2.1]);
}

#[test]
fn full_mode_needs_a_valid_trial_index() {
    let parser = SummaryParser::new(full_loader(), states(), OptionSet::new(full_options()));
    let err = parser
        .parse_line("f1.dat 4 BW T", TrimOffsets::default())
        .unwrap_err();
    assert_eq!(err.code(), codes::MISSING_TRIAL_SHOOTING_INDEX);
    let err = parser
        .parse_line("f1.dat 4 BW T 9", TrimOffsets::default())
        .unwrap_err();
    assert_eq!(err.code(), codes::SHOOTING_INDEX_OUT_OF_RANGE);
}

#[test]
fn full_mode_replay_matches_one_way_replay() {
    let parser = SummaryParser::new(full_loader(), states(), OptionSet::new(full_options()));
    let initial =
        Trajectory::from_scalars(&[-0.1, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.1]);
    let mut converter = OneWayConverter::new(
        parser,
        initial,
        ReplayConfig::default(),
        Some(MemoryStorage::new()),
    )
    .unwrap();
    assert_eq!(converter.offsets(), TrimOffsets::default());
    let lines = [
        "f1.dat 4 BW T 2",
        "f2.dat 2 FW T 2",
        "f3.dat 5 BW F -2",
        "f4.dat 4 BW T 4",
    ];
    let report = converter.run_lines(&lines, 1, 3).unwrap();
    assert_eq!(report.moves, 4);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.blocks, 2);
    let engine = converter.into_engine();
    let steps = engine.storage().unwrap().steps();
    assert_eq!(path_lengths(steps, 0), vec![11, 9, 7, 7, 7]);
}

#[test]
fn recrossing_initial_trajectory_keeps_the_first_transition() {
    let parser = SummaryParser::new(full_loader(), states(), OptionSet::new(full_options()));
    let initial = Trajectory::from_scalars(&[-0.3, 1.0, 10.5, 4.0, -0.5]);
    let converter = OneWayConverter::new(
        parser,
        initial,
        ReplayConfig::default(),
        Some(MemoryStorage::new()),
    )
    .unwrap();
    let segment = converter.initial_segment();
    assert_eq!((segment.start, segment.end), (0, 3));
    assert_eq!(converter.offsets(), TrimOffsets::new(0, 2));
    let engine = converter.into_engine();
    let steps = engine.storage().unwrap().steps();
    assert_eq!(
        steps[0].active.get(0).unwrap().trajectory.scalars(),
        vec![-0.3, 1.0, 10.5]
    );
}
