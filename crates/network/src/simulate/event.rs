use uom::si::f64::Time;

use crate::TickReport;

/// Emitted after every tick of a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The tick number, starting at 1.
    pub step: usize,

    /// Simulated time at the end of the tick.
    pub time: Time,

    pub report: TickReport,
}
