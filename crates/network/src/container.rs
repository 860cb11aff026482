use bulkflow_core::{
    StepIntegrable,
    constraint::{Constrained, UnitInterval},
};
use bulkflow_substance::{FluidState, Mixture, MixtureFlow};
use nalgebra::{Isometry3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use uom::{
    ConstZero,
    si::{
        f64::{Area, Mass, Pressure, ThermodynamicTemperature, Time, Volume, VolumeRate},
        velocity::meter_per_second,
    },
};

use crate::{Port, SampleError, hydrostatics::torricelli_speed};

/// Flow accumulators a container integrates once per tick.
///
/// Connections add to `inflow` with a sign: a negative entry is mass leaving
/// through a pipe. `outflow` is reserved for holes and drains.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingFlow {
    pub inflow: MixtureFlow,
    pub outflow: MixtureFlow,
}

impl PendingFlow {
    /// Returns `inflow − outflow`.
    #[must_use]
    pub fn net(&self) -> MixtureFlow {
        let mut net = self.inflow.clone();
        net -= &self.outflow;
        net
    }

    pub fn clear(&mut self) {
        self.inflow.clear();
        self.outflow.clear();
    }
}

/// How a container turns several stored substances into one density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MixingModel {
    /// Only a single substance may be present when the container is sampled.
    ///
    /// Sampling a container that holds more than one substance fails with
    /// [`SampleError::Stratified`].
    #[default]
    SingleSubstance,
    /// Contents are treated as perfectly mixed and sampled at their bulk density.
    Homogeneous,
}

/// A vessel that stores a [`Mixture`] and exchanges it through ports.
///
/// Implementors provide storage and hydrostatic sampling.
/// Outflow through a hole and per-tick integration come for free.
pub trait FluidContainer {
    /// Transform from the container's local frame to scene space.
    fn frame(&self) -> &Isometry3<f64>;

    fn max_volume(&self) -> Volume;

    fn temperature(&self) -> ThermodynamicTemperature;

    fn contents(&self) -> &Mixture;

    fn contents_mut(&mut self) -> &mut Mixture;

    fn pending(&self) -> &PendingFlow;

    fn pending_mut(&mut self) -> &mut PendingFlow;

    /// Samples the fluid at a point in the local frame.
    ///
    /// `acceleration` is the local-frame acceleration the liquid settles along.
    /// Points above the surface, empty containers and weightless containers
    /// sample as [`FluidState::vacuum`].
    ///
    /// # Errors
    ///
    /// Returns a [`SampleError`] if the contents cannot be reduced to a density.
    fn sample(
        &self,
        position: &Point3<f64>,
        acceleration: &Vector3<f64>,
    ) -> Result<FluidState, SampleError>;

    fn volume(&self) -> Volume {
        self.contents().volume()
    }

    /// Returns the unused capacity, never negative.
    fn free_volume(&self) -> Volume {
        (self.max_volume() - self.volume()).max(Volume::ZERO)
    }

    fn fill_fraction(&self) -> Constrained<f64, UnitInterval> {
        UnitInterval::clamped((self.volume() / self.max_volume()).value)
    }

    /// Computes the flow escaping through a hole at `port` into an environment
    /// held at `opposing`.
    ///
    /// The rate follows Torricelli's law and never drains more than the
    /// container holds within `dt`. The returned flow's fluid state carries
    /// the local pressure and an exit velocity along the port's outward
    /// direction, both in the local frame.
    ///
    /// Returns `Ok(None)` when nothing would flow.
    ///
    /// # Errors
    ///
    /// Propagates a [`SampleError`] from [`FluidContainer::sample`].
    fn sample_flow(
        &self,
        port: &Port,
        acceleration: &Vector3<f64>,
        hole_area: Area,
        dt: Time,
        opposing: &FluidState,
    ) -> Result<Option<MixtureFlow>, SampleError> {
        let contents = self.contents();
        if contents.is_empty() || dt <= Time::ZERO || hole_area <= Area::ZERO {
            return Ok(None);
        }

        let local = self.sample(&port.position, acceleration)?;
        let delta = local.pressure - opposing.pressure;
        if delta <= Pressure::ZERO {
            return Ok(None);
        }

        let Some(density) = contents.average_density() else {
            return Ok(None);
        };
        let speed = torricelli_speed(delta, density);

        let unclamped: VolumeRate = hole_area * speed;
        let available: VolumeRate = self.volume() / dt;
        let rate = unclamped.min(available);
        if rate <= VolumeRate::ZERO {
            return Ok(None);
        }

        let fluid = FluidState::new(local.pressure, self.temperature())
            .with_velocity(port.forward.into_inner() * speed.get::<meter_per_second>());

        Ok(Some(contents.flow_at_volume_rate(rate, fluid)))
    }

    /// Applies the pending net flow over `dt` and returns the change in mass.
    ///
    /// Negative remainders are discarded. The accumulators are left untouched;
    /// whoever fills them decides when they are reset.
    fn integrate(&mut self, dt: Time) -> Mass {
        let before = self.contents().mass();
        let next = self.contents().step(self.pending().net(), dt);

        let contents = self.contents_mut();
        *contents = next;
        contents.clamp_negative();

        contents.mass() - before
    }
}
