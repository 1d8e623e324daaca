use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{OwtpsError, Segment};
use owtps_replay::Direction;
use serde::{Deserialize, Serialize};

/// Frames trimmed away at each end of the current trajectory.
///
/// A shot reported against an untrimmed trial counts frames that trimming
/// removed. `extra_bw_frames` are the frames cut before the start of the
/// current trajectory and `extra_fw_frames` those cut after its end. Each
/// value is replaced only by the next accepted trim in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrimOffsets {
    /// Frames cut before the current trajectory by the last accepted backward trim.
    pub extra_bw_frames: usize,
    /// Frames cut after the current trajectory by the last accepted forward trim.
    pub extra_fw_frames: usize,
}

impl TrimOffsets {
    /// Offsets with explicit values.
    pub fn new(extra_bw_frames: usize, extra_fw_frames: usize) -> Self {
        Self {
            extra_bw_frames,
            extra_fw_frames,
        }
    }

    /// Offsets left by cutting `segment` out of a trajectory of `total` frames.
    pub fn from_initial(segment: Segment, total: usize) -> Self {
        Self::new(segment.start, segment.removed_after(total))
    }

    /// Moves an untrimmed shooting index into the trimmed frame of reference.
    ///
    /// The shift is the signed difference between the two frames of
    /// reference: a non-negative index has `extra_bw_frames` subtracted, a
    /// negative one has `extra_fw_frames` added. With two leading frames
    /// trimmed, untrimmed index 5 becomes 3 and names the same frame; index 1
    /// points at a trimmed frame and is an error.
    pub fn correct_shooting_index(&self, index: isize) -> Result<isize, OwtpsError> {
        let corrected = if index >= 0 {
            index - self.extra_bw_frames as isize
        } else {
            index + self.extra_fw_frames as isize
        };
        let inside = if index >= 0 { corrected >= 0 } else { corrected < 0 };
        if inside {
            Ok(corrected)
        } else {
            Err(OwtpsError::Trajectory(
                ErrorInfo::new(
                    codes::SHOOTING_INDEX_IN_TRIMMED_REGION,
                    "shooting index points at a trimmed-away frame",
                )
                .with_context("index", index.to_string())
                .with_context("extra_bw_frames", self.extra_bw_frames.to_string())
                .with_context("extra_fw_frames", self.extra_fw_frames.to_string()),
            ))
        }
    }

    /// Offsets after an accepted trim that removed `removed` frames.
    pub fn after_trim(self, direction: Direction, removed: usize) -> Self {
        match direction {
            Direction::Forward => Self {
                extra_fw_frames: removed,
                ..self
            },
            Direction::Backward => Self {
                extra_bw_frames: removed,
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn index_in_trimmed_region_is_rejected() {
        let offsets = TrimOffsets::new(2, 1);
        assert_eq!(offsets.correct_shooting_index(5).unwrap(), 3);
        assert_eq!(offsets.correct_shooting_index(-4).unwrap(), -3);
        let err = offsets.correct_shooting_index(1).unwrap_err();
        assert_eq!(err.code(), codes::SHOOTING_INDEX_IN_TRIMMED_REGION);
        assert!(offsets.correct_shooting_index(-1).is_err());
    }

    #[test]
    fn trims_replace_only_their_own_side() {
        let offsets = TrimOffsets::new(3, 4)
            .after_trim(Direction::Backward, 0)
            .after_trim(Direction::Forward, 2);
        assert_eq!(offsets, TrimOffsets::new(0, 2));
    }

    proptest! {
        #[test]
        fn corrected_index_names_the_same_frame(
            bw in 0usize..5,
            fw in 0usize..5,
            kept in 1usize..10,
            pick in 0usize..100,
            from_end in any::<bool>(),
        ) {
            let untrimmed: Vec<usize> = (0..bw + kept + fw).collect();
            let trimmed = &untrimmed[bw..bw + kept];
            let offsets = TrimOffsets::new(bw, fw);
            let position = bw + pick % kept;
            let index = if from_end {
                position as isize - untrimmed.len() as isize
            } else {
                position as isize
            };
            let corrected = offsets.correct_shooting_index(index).unwrap();
            let resolved = if corrected < 0 {
                (trimmed.len() as isize + corrected) as usize
            } else {
                corrected as usize
            };
            prop_assert_eq!(trimmed[resolved], untrimmed[position]);
        }

        #[test]
        fn zero_offsets_leave_indices_alone(index in -50isize..50) {
            prop_assert_eq!(TrimOffsets::default().correct_shooting_index(index).unwrap(), index);
        }
    }
}
