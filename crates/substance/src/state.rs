use nalgebra::Vector3;
use uom::{
    ConstZero,
    si::{
        f64::{Pressure, ThermodynamicTemperature, Velocity},
        thermodynamic_temperature::kelvin,
        velocity::meter_per_second,
    },
};

/// Temperature assigned to stored and transported fluids when none is configured.
pub const DEFAULT_TEMPERATURE: f64 = 273.15;

/// The local state of a fluid at a sampled point or in a moving stream.
///
/// Fluid states are recomputed every time a tank is sampled and are never
/// stored as simulation state.
/// A zero pressure marks the vacuum sentinel: the point is above the liquid
/// surface or the tank is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidState {
    pub pressure: Pressure,
    pub temperature: ThermodynamicTemperature,
    /// Bulk velocity in metres per second.
    pub velocity: Vector3<f64>,
}

impl FluidState {
    /// Creates a resting fluid state.
    #[must_use]
    pub fn new(pressure: Pressure, temperature: ThermodynamicTemperature) -> Self {
        Self {
            pressure,
            temperature,
            velocity: Vector3::zeros(),
        }
    }

    /// Creates the vacuum sentinel at the given temperature.
    #[must_use]
    pub fn vacuum(temperature: ThermodynamicTemperature) -> Self {
        Self::new(Pressure::ZERO, temperature)
    }

    /// Returns the state with the given velocity, keeping other fields unchanged.
    #[must_use]
    pub fn with_velocity(self, velocity: Vector3<f64>) -> Self {
        Self { velocity, ..self }
    }

    /// Returns `true` if this is the vacuum sentinel.
    #[must_use]
    pub fn is_vacuum(&self) -> bool {
        self.pressure <= Pressure::ZERO
    }

    /// Returns the magnitude of the bulk velocity.
    #[must_use]
    pub fn speed(&self) -> Velocity {
        Velocity::new::<meter_per_second>(self.velocity.norm())
    }
}

impl Default for FluidState {
    fn default() -> Self {
        Self::vacuum(ThermodynamicTemperature::new::<kelvin>(DEFAULT_TEMPERATURE))
    }
}
