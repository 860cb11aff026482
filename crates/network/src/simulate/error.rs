use bulkflow_core::constraint::ConstraintError;

use crate::NetworkError;

/// Errors that can occur during a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid time step")]
    TimeStep(#[source] ConstraintError),

    #[error("tick {step} failed")]
    Tick {
        step: usize,
        #[source]
        source: NetworkError,
    },
}
