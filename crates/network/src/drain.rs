use bulkflow_core::constraint::{Constrained, ConstraintError, NonNegative};
use bulkflow_substance::{FluidState, MixtureFlow};
use nalgebra::Vector3;
use uom::si::f64::{Area, Time};

use crate::{ContainerId, FluidContainer, Port, SampleError};

/// A hole from a container into an environment held at a fixed state.
///
/// Vents, leaks and engine feeds are drains: they only ever remove mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drain {
    container: ContainerId,
    port: Port,
    hole_area: Constrained<Area, NonNegative>,
    ambient: FluidState,
}

impl Drain {
    /// Creates a drain venting `container` through `port`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if `hole_area` is negative or NaN.
    pub fn new(
        container: ContainerId,
        port: Port,
        hole_area: Area,
        ambient: FluidState,
    ) -> Result<Self, ConstraintError> {
        Ok(Self {
            container,
            port,
            hole_area: Constrained::new(hole_area)?,
            ambient,
        })
    }

    #[must_use]
    pub fn container(&self) -> ContainerId {
        self.container
    }

    #[must_use]
    pub fn port(&self) -> &Port {
        &self.port
    }

    #[must_use]
    pub fn hole_area(&self) -> Area {
        self.hole_area.into_inner()
    }

    /// The state of the environment the drain empties into.
    #[must_use]
    pub fn ambient(&self) -> &FluidState {
        &self.ambient
    }

    /// Computes the outflow for this tick, positive for mass leaving.
    ///
    /// `acceleration` is in scene space.
    ///
    /// # Errors
    ///
    /// Propagates a [`SampleError`] from the container.
    pub fn calculate_flow<C: FluidContainer + ?Sized>(
        &self,
        container: &C,
        acceleration: &Vector3<f64>,
        dt: Time,
    ) -> Result<Option<MixtureFlow>, SampleError> {
        let local = container.frame().inverse_transform_vector(acceleration);
        container.sample_flow(&self.port, &local, self.hole_area(), dt, &self.ambient)
    }
}
