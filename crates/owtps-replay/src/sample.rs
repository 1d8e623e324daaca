use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{OwtpsError, Trajectory};
use serde::{Deserialize, Serialize};

/// A trajectory assigned to a replica of an ensemble.
#[derive(Debug, Serialize, Deserialize)]
pub struct Sample<F> {
    /// Replica identifier.
    pub replica: usize,
    /// Current trajectory of the replica.
    pub trajectory: Trajectory<F>,
    /// Label of the ensemble the trajectory belongs to.
    pub ensemble: String,
}

impl<F> Clone for Sample<F> {
    fn clone(&self) -> Self {
        Self {
            replica: self.replica,
            trajectory: self.trajectory.clone(),
            ensemble: self.ensemble.clone(),
        }
    }
}

impl<F: PartialEq> PartialEq for Sample<F> {
    fn eq(&self, other: &Self) -> bool {
        self.replica == other.replica
            && self.ensemble == other.ensemble
            && self.trajectory == other.trajectory
    }
}

impl<F> Sample<F> {
    /// Creates a sample.
    pub fn new(replica: usize, trajectory: Trajectory<F>, ensemble: impl Into<String>) -> Self {
        Self {
            replica,
            trajectory,
            ensemble: ensemble.into(),
        }
    }
}

/// Samples of every replica, ordered by replica id.
#[derive(Debug, Serialize, Deserialize)]
pub struct SampleSet<F> {
    samples: Vec<Sample<F>>,
}

impl<F> Clone for SampleSet<F> {
    fn clone(&self) -> Self {
        Self {
            samples: self.samples.clone(),
        }
    }
}

impl<F: PartialEq> PartialEq for SampleSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.samples == other.samples
    }
}

impl<F> Default for SampleSet<F> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl<F> SampleSet<F> {
    /// Builds a set; a later sample for the same replica replaces an earlier one.
    pub fn new(samples: Vec<Sample<F>>) -> Self {
        Self::default().apply_samples(samples)
    }

    /// Sample currently held by `replica`.
    pub fn get(&self, replica: usize) -> Option<&Sample<F>> {
        self.samples
            .binary_search_by_key(&replica, |sample| sample.replica)
            .ok()
            .map(|pos| &self.samples[pos])
    }

    /// New set with `samples` replacing the entries of their replicas.
    pub fn apply_samples<I>(&self, samples: I) -> Self
    where
        I: IntoIterator<Item = Sample<F>>,
    {
        let mut next = self.samples.clone();
        for sample in samples {
            match next.binary_search_by_key(&sample.replica, |existing| existing.replica) {
                Ok(pos) => next[pos] = sample,
                Err(pos) => next.insert(pos, sample),
            }
        }
        Self { samples: next }
    }

    /// Samples in replica order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample<F>> + '_ {
        self.samples.iter()
    }

    /// Replica ids in order.
    pub fn replicas(&self) -> Vec<usize> {
        self.samples.iter().map(|sample| sample.replica).collect()
    }

    /// Number of replicas.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set holds no replicas.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Checks ordering, uniqueness and non-empty trajectories.
    pub fn sanity_check(&self) -> Result<(), OwtpsError> {
        for pair in self.samples.windows(2) {
            if pair[0].replica >= pair[1].replica {
                return Err(OwtpsError::Replay(
                    ErrorInfo::new(codes::SAMPLE_SET_INCONSISTENT, "replicas out of order")
                        .with_context("replica", pair[1].replica.to_string()),
                ));
            }
        }
        if let Some(sample) = self.samples.iter().find(|s| s.trajectory.is_empty()) {
            return Err(OwtpsError::Replay(
                ErrorInfo::new(codes::SAMPLE_SET_INCONSISTENT, "replica holds an empty trajectory")
                    .with_context("replica", sample.replica.to_string())
                    .with_context("ensemble", sample.ensemble.clone()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use owtps_core::Frame;

    #[test]
    fn later_samples_replace_earlier_ones() {
        let a: Trajectory<Frame> = Trajectory::from_scalars(&[0.0, 1.0]);
        let b = Trajectory::from_scalars(&[2.0]);
        let set = SampleSet::new(vec![
            Sample::new(3, a.clone(), "tps"),
            Sample::new(1, a, "tps"),
        ]);
        assert_eq!(set.replicas(), vec![1, 3]);
        let next = set.apply_samples([Sample::new(3, b.clone(), "tps")]);
        assert_eq!(next.get(3).map(|s| s.trajectory.len()), Some(1));
        assert_eq!(set.get(3).map(|s| s.trajectory.len()), Some(2));
        assert!(next.sanity_check().is_ok());
    }

    #[test]
    fn empty_trajectory_fails_check() {
        let set: SampleSet<Frame> = SampleSet::new(vec![Sample::new(0, Trajectory::empty(), "tps")]);
        let err = set.sanity_check().unwrap_err();
        assert_eq!(err.code(), codes::SAMPLE_SET_INCONSISTENT);
    }
}
