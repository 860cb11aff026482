/// Control actions an observer may return from a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the run and return the history so far.
    StopEarly,
}
