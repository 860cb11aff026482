//! Substances, mixtures and fluid states for the bulkflow simulation.
//!
//! A [`Mixture`] is what a tank holds: per-substance masses.
//! A [`MixtureFlow`] is what a pipe carries: per-substance mass rates together
//! with the [`FluidState`] of the moving fluid.

mod catalog;
mod error;
mod flow;
mod mixture;
mod state;
mod substance;

pub use catalog::Catalog;
pub use error::SubstanceError;
pub use flow::{MixtureFlow, SubstanceRate};
pub use mixture::{Mixture, SubstanceState};
pub use state::{DEFAULT_TEMPERATURE, FluidState};
pub use substance::{Color, Substance};
