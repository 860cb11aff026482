//! Pressure-driven bulk flow between tanks connected by pipes.
//!
//! Each tick, every [`FlowConnection`] samples the hydrostatic pressure at its
//! two ends, derives a Torricelli flow from the higher-pressure end, and clamps
//! it to what the inlet can give and the outlet can take.
//! The [`Network`] gathers all flows first, scales down any that would
//! over-commit a shared tank, and only then integrates the tanks.

pub mod config;
mod connection;
mod container;
mod drain;
mod error;
mod geometry;
mod hydrostatics;
mod network;
mod port;
pub mod simulate;
mod tank;

pub use connection::{ConnectionEnd, FlowConnection, Tolerances};
pub use container::{FluidContainer, MixingModel, PendingFlow};
pub use drain::Drain;
pub use error::{NetworkError, SampleError};
pub use geometry::{Geometry, truncated_sphere_height};
pub use hydrostatics::{hydrostatic_pressure, torricelli_speed};
pub use network::{
    ConnectionId, ContainerId, DrainId, MassChanged, Network, TickMode, TickReport,
};
pub use port::Port;
pub use tank::{Tank, TankConfig};
