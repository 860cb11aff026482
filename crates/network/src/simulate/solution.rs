use uom::si::f64::Time;

use super::Event;

/// Indicates how a run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Completed all requested steps.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// How the run terminated.
    pub status: Status,

    /// Number of ticks completed.
    pub steps: usize,

    /// Simulated time at the end of the run.
    pub time: Time,

    /// Every event emitted, in order.
    pub history: Vec<Event>,
}
