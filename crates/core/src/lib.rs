//! Core traits and types for the bulkflow workspace.
//!
//! This crate defines the small set of abstractions the substance and network
//! crates build on:
//!
//! - [`constraint`]: numeric invariants checked once at construction
//! - [`StepIntegrable`]: values that can be stepped forward by a derivative
//! - [`Observer`]: receives simulation events and optionally returns control actions

pub mod constraint;
mod observer;
mod step;

pub use observer::Observer;
pub use step::{DerivativeOf, StepIntegrable};
