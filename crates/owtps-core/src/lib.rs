#![deny(missing_docs)]

//! Core trajectory, state-volume and error types for one-way TPS conversion.

pub mod ensemble;
pub mod errors;
pub mod trajectory;
pub mod volume;

pub use ensemble::Segment;
pub use errors::{codes, ErrorInfo, OwtpsError};
pub use trajectory::{Frame, Trajectory};
pub use volume::{RangeVolume, StateSet, Volume};
