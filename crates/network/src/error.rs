use thiserror::Error;

use crate::{ConnectionId, ContainerId, DrainId};

/// Errors raised when a container cannot be sampled.
///
/// These indicate structural misuse rather than a physical condition:
/// empty tanks, dry ports and weightlessness are all answered with a vacuum
/// sample instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    /// The container holds several substances and treats them as unmixed layers.
    #[error("cannot sample {count} unmixed substances; stratified sampling is not supported")]
    Stratified { count: usize },
}

/// Errors that may occur while building or ticking a [`Network`](crate::Network).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("{0} does not exist")]
    UnknownContainer(ContainerId),

    #[error("a connection cannot join {0} to itself")]
    SelfConnection(ContainerId),

    #[error("sampling failed for {connection}")]
    ConnectionSample {
        connection: ConnectionId,
        #[source]
        source: SampleError,
    },

    #[error("sampling failed for {drain}")]
    DrainSample {
        drain: DrainId,
        #[source]
        source: SampleError,
    },
}
