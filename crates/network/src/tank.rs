use bulkflow_core::constraint::{Constrained, ConstraintError, StrictlyPositive};
use bulkflow_substance::{DEFAULT_TEMPERATURE, FluidState, Mixture};
use nalgebra::{Isometry3, Point3, Unit, Vector3};
use uom::{
    ConstZero,
    si::{
        acceleration::meter_per_second_squared,
        f64::{Acceleration, Length, MassDensity, ThermodynamicTemperature, Volume},
        thermodynamic_temperature::kelvin,
    },
};

use crate::{
    FluidContainer, Geometry, MixingModel, PendingFlow, SampleError,
    hydrostatics::hydrostatic_pressure,
};

/// A rigid spherical tank holding a liquid that settles under acceleration.
///
/// The usable capacity (`max_volume`) is configured independently of the
/// sphere's geometric volume; the fill fraction is always measured against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    name: String,
    frame: Isometry3<f64>,
    geometry: Geometry,
    max_volume: Constrained<Volume, StrictlyPositive>,
    temperature: ThermodynamicTemperature,
    mixing: MixingModel,
    contents: Mixture,
    pending: PendingFlow,
}

/// Static description of a [`Tank`].
#[derive(Debug, Clone, PartialEq)]
pub struct TankConfig {
    pub name: String,
    pub frame: Isometry3<f64>,
    pub geometry: Geometry,
    pub max_volume: Volume,
    pub temperature: ThermodynamicTemperature,
    pub mixing: MixingModel,
}

impl TankConfig {
    /// Describes a sphere at the scene origin with default temperature and mixing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if `radius` is not strictly positive.
    pub fn sphere(
        name: impl Into<String>,
        radius: Length,
        max_volume: Volume,
    ) -> Result<Self, ConstraintError> {
        Ok(Self {
            name: name.into(),
            frame: Isometry3::identity(),
            geometry: Geometry::sphere(radius)?,
            max_volume,
            temperature: ThermodynamicTemperature::new::<kelvin>(DEFAULT_TEMPERATURE),
            mixing: MixingModel::default(),
        })
    }

    #[must_use]
    pub fn with_frame(self, frame: Isometry3<f64>) -> Self {
        Self { frame, ..self }
    }

    #[must_use]
    pub fn with_temperature(self, temperature: ThermodynamicTemperature) -> Self {
        Self {
            temperature,
            ..self
        }
    }

    #[must_use]
    pub fn with_mixing(self, mixing: MixingModel) -> Self {
        Self { mixing, ..self }
    }
}

impl Tank {
    /// Creates a tank from its configuration and initial contents.
    ///
    /// Initial contents may exceed the capacity; the surplus simply makes the
    /// tank sample as full and refuse further inflow.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if `max_volume` is not strictly positive.
    pub fn new(config: TankConfig, contents: Mixture) -> Result<Self, ConstraintError> {
        let TankConfig {
            name,
            frame,
            geometry,
            max_volume,
            temperature,
            mixing,
        } = config;

        Ok(Self {
            name,
            frame,
            geometry,
            max_volume: Constrained::new(max_volume)?,
            temperature,
            mixing,
            contents,
            pending: PendingFlow::default(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub fn mixing(&self) -> MixingModel {
        self.mixing
    }

    /// Moves the tank, e.g. when the host vessel rotates.
    pub fn set_frame(&mut self, frame: Isometry3<f64>) {
        self.frame = frame;
    }

    /// Reduces the contents to the density used for hydrostatics.
    fn density(&self) -> Result<Option<MassDensity>, SampleError> {
        match (self.mixing, self.contents.substance_count()) {
            (_, 0) => Ok(None),
            (MixingModel::SingleSubstance, 1) | (MixingModel::Homogeneous, _) => {
                Ok(self.contents.bulk_density())
            }
            (MixingModel::SingleSubstance, count) => Err(SampleError::Stratified { count }),
        }
    }
}

impl FluidContainer for Tank {
    fn frame(&self) -> &Isometry3<f64> {
        &self.frame
    }

    fn max_volume(&self) -> Volume {
        self.max_volume.into_inner()
    }

    fn temperature(&self) -> ThermodynamicTemperature {
        self.temperature
    }

    fn contents(&self) -> &Mixture {
        &self.contents
    }

    fn contents_mut(&mut self) -> &mut Mixture {
        &mut self.contents
    }

    fn pending(&self) -> &PendingFlow {
        &self.pending
    }

    fn pending_mut(&mut self) -> &mut PendingFlow {
        &mut self.pending
    }

    fn sample(
        &self,
        position: &Point3<f64>,
        acceleration: &Vector3<f64>,
    ) -> Result<FluidState, SampleError> {
        let vacuum = FluidState::vacuum(self.temperature);

        let Some(density) = self.density()? else {
            return Ok(vacuum);
        };
        let Some(down) = Unit::try_new(*acceleration, f64::EPSILON) else {
            return Ok(vacuum);
        };

        let depth = self
            .geometry
            .depth_below_surface(position, &down, self.fill_fraction());
        if depth <= Length::ZERO {
            return Ok(vacuum);
        }

        let magnitude = Acceleration::new::<meter_per_second_squared>(acceleration.norm());
        Ok(FluidState::new(
            hydrostatic_pressure(density, magnitude, depth),
            self.temperature,
        ))
    }
}
