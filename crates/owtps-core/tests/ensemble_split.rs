use owtps_core::{Frame, RangeVolume, Segment, StateSet, Trajectory};
use proptest::prelude::*;

fn states() -> StateSet<Frame> {
    StateSet::from(vec![
        RangeVolume::below("left", 0, 0.0),
        RangeVolume::at_or_above("right", 0, 10.0),
    ])
}

#[test]
fn forward_takes_first_state_touch() {
    let traj = Trajectory::from_scalars(&[4.0, 5.2, 7.2, 9.2, 10.12, 11.0, 9.5, 10.5]);
    let set = states();
    let segments = set.split_forward(&traj);
    assert_eq!(
        segments,
        vec![Segment { start: 0, end: 5 }, Segment { start: 6, end: 8 }]
    );
    let trimmed = set.trim_forward(&traj).unwrap();
    assert_eq!(trimmed.removed(traj.len()), 3);
    assert_eq!(
        trimmed.apply(&traj).scalars(),
        vec![4.0, 5.2, 7.2, 9.2, 10.12]
    );
}

#[test]
fn backward_takes_last_state_exit() {
    let traj = Trajectory::from_scalars(&[-1.0, -0.5, -0.11, 2.1, 4.0]);
    let set = states();
    let segment = set.trim_backward(&traj).unwrap();
    assert_eq!(segment, Segment { start: 2, end: 5 });
    assert_eq!(segment.removed(traj.len()), 2);
}

#[test]
fn backward_without_state_has_no_segment() {
    let traj = Trajectory::from_scalars(&[1.0, 2.0, 3.0]);
    assert!(states().trim_backward(&traj).is_none());
    assert!(states().trim_forward(&traj).is_none());
}

#[test]
fn transitions_need_distinct_end_states() {
    let set = states();
    let traj = Trajectory::from_scalars(&[-0.3, -0.1, 1.0, 5.0, 9.0, 10.1, 10.5]);
    let segments = set.split_transitions(&traj);
    assert_eq!(segments, vec![Segment { start: 1, end: 6 }]);
    assert_eq!(segments[0].removed_after(traj.len()), 1);

    let recrossing = Trajectory::from_scalars(&[-0.3, 1.0, -0.2, 2.0, 10.0, 4.0, -0.5]);
    assert_eq!(
        set.split_transitions(&recrossing),
        vec![Segment { start: 2, end: 5 }, Segment { start: 4, end: 7 }]
    );
}

fn values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0f64..13.0, 1..40)
}

proptest! {
    #[test]
    fn retrimming_forward_is_identity(raw in values()) {
        let set = states();
        let traj = Trajectory::from_scalars(&raw);
        if let Some(segment) = set.trim_forward(&traj) {
            let trimmed = segment.apply(&traj);
            let again = set.trim_forward(&trimmed).unwrap();
            prop_assert_eq!(again, Segment { start: 0, end: trimmed.len() });
        }
    }

    #[test]
    fn retrimming_backward_is_identity(raw in values()) {
        let set = states();
        let traj = Trajectory::from_scalars(&raw);
        if let Some(segment) = set.trim_backward(&traj) {
            let trimmed = segment.apply(&traj);
            let again = set.trim_backward(&trimmed).unwrap();
            prop_assert_eq!(again, Segment { start: 0, end: trimmed.len() });
        }
    }

    #[test]
    fn negative_indices_resolve_from_the_end(raw in values(), pick in any::<prop::sample::Index>()) {
        let traj = Trajectory::from_scalars(&raw);
        let len = traj.len() as isize;
        let index = pick.index(traj.len()) as isize - len;
        let resolved = traj.resolve_index(index).unwrap();
        prop_assert_eq!(resolved as isize, len + index);
        prop_assert!(traj.shares_frame(resolved, &traj, (len + index) as usize));
        prop_assert!(traj.resolve_index(len).is_none());
        prop_assert!(traj.resolve_index(-len - 1).is_none());
    }
}
