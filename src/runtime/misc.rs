//! Small shared data structures used across the runtime.

pub mod interval_set;

pub use interval_set::{Interval, IntervalSet, IntervalSetError};
