use bulkflow_core::constraint::ConstraintError;
use thiserror::Error;

/// Errors that may occur when defining or resolving substances.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstanceError {
    /// The density is zero, negative or not a number.
    #[error("invalid density for substance `{id}`")]
    InvalidDensity {
        id: String,
        #[source]
        source: ConstraintError,
    },

    /// A substance with the same id is already registered.
    #[error("substance `{0}` is already registered")]
    Duplicate(String),

    /// No substance with the given id is registered.
    #[error("unknown substance `{0}`")]
    Unknown(String),
}
