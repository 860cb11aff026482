//! TOML description of a network.
//!
//! Quantities are plain numbers in SI base units: metres, cubic metres,
//! kilograms, seconds, kelvin and pascals. Container rotations are roll,
//! pitch and yaw in radians.
//!
//! ```toml
//! [simulation]
//! time_step = 0.02
//!
//! [[substances]]
//! id = "water"
//! density = 1000.0
//!
//! [[containers]]
//! name = "a"
//! radius = 1.0
//! max_volume = 4.0
//! contents = [{ substance = "water", mass = 2000.0 }]
//!
//! [[containers]]
//! name = "b"
//! position = [3.0, 0.0, 0.0]
//! radius = 1.0
//! max_volume = 4.0
//!
//! [[connections]]
//! from = { container = "a", position = [0.0, 0.0, -1.0], forward = [0.0, 0.0, -1.0] }
//! to = { container = "b", position = [0.0, 0.0, -1.0], forward = [0.0, 0.0, -1.0] }
//! area = 0.01
//! ```

use std::collections::BTreeMap;

use bulkflow_core::constraint::{ConstraintError, NonNegative, StrictlyPositive};
use bulkflow_substance::{
    Catalog, Color, DEFAULT_TEMPERATURE, FluidState, Mixture, Substance, SubstanceError,
    SubstanceState,
};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::{
    ConstZero,
    si::{
        f64::{Area, Length, Mass, MassDensity, Pressure, ThermodynamicTemperature, Time, Volume},
        thermodynamic_temperature::kelvin,
        time::second,
    },
};

use crate::{
    ConnectionEnd, ContainerId, Drain, FlowConnection, MixingModel, Network, NetworkError, Port,
    Tank, TankConfig, TickMode, Tolerances,
};

/// Errors raised while loading, saving or building a [`NetworkConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid network description")]
    Parse(#[from] toml::de::Error),

    #[error("cannot write network description")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Substance(#[from] SubstanceError),

    #[error("invalid value for `{field}`")]
    Constraint {
        field: String,
        #[source]
        source: ConstraintError,
    },

    #[error("container `{0}` is defined more than once")]
    DuplicateContainer(String),

    #[error("no container named `{0}`")]
    UnknownContainer(String),

    #[error("a port on `{0}` has no usable direction")]
    InvalidDirection(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("snapshot describes {found} containers but the network has {expected}")]
    SnapshotLength { expected: usize, found: usize },
}

impl ConfigError {
    fn constraint(field: impl Into<String>) -> impl FnOnce(ConstraintError) -> Self {
        let field = field.into();
        move |source| Self::Constraint { field, source }
    }
}

/// A complete network: substances, tanks, pipes, drains and run settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub substances: Vec<SubstanceConfig>,
    #[serde(default)]
    pub containers: Vec<ContainerConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    #[serde(default)]
    pub drains: Vec<DrainConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub time_step: Time,
    /// Temperature of containers that do not set their own.
    pub temperature: ThermodynamicTemperature,
    pub mode: TickMode,
    pub tolerances: Tolerances,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: Time::new::<second>(0.02),
            temperature: ThermodynamicTemperature::new::<kelvin>(DEFAULT_TEMPERATURE),
            mode: TickMode::default(),
            tolerances: Tolerances::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstanceConfig {
    pub id: String,
    pub density: MassDensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    pub name: String,
    #[serde(default)]
    pub position: [f64; 3],
    /// Roll, pitch and yaw in radians.
    #[serde(default)]
    pub rotation: [f64; 3],
    pub radius: Length,
    pub max_volume: Volume,
    #[serde(default)]
    pub mixing: MixingModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<ThermodynamicTemperature>,
    #[serde(default)]
    pub contents: Vec<MassEntry>,
}

/// A stored mass of one substance, referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MassEntry {
    pub substance: String,
    pub mass: Mass,
}

impl MassEntry {
    /// Resolves the substance and rejects a negative mass, naming `field` on failure.
    pub(crate) fn to_state(
        &self,
        catalog: &Catalog,
        field: impl Into<String>,
    ) -> Result<SubstanceState, ConfigError> {
        let mass = NonNegative::new(self.mass).map_err(ConfigError::constraint(field))?;
        Ok(SubstanceState::new(
            catalog.resolve(&self.substance)?,
            mass.into_inner(),
        ))
    }
}

/// A port on a named container, in that container's frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortConfig {
    pub container: String,
    #[serde(default)]
    pub position: [f64; 3],
    pub forward: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub from: PortConfig,
    pub to: PortConfig,
    pub area: Area,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrainConfig {
    pub port: PortConfig,
    pub hole_area: Area,
    /// Pressure outside the hole; vacuum when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_pressure: Option<Pressure>,
}

/// Everything [`NetworkConfig::build`] produces.
#[derive(Debug, Clone)]
pub struct BuiltNetwork {
    pub catalog: Catalog,
    pub network: Network<Tank>,
    pub time_step: Time,
    /// Container ids by configured name.
    pub names: BTreeMap<String, ContainerId>,
}

impl NetworkConfig {
    /// Parses a network description.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid description.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Writes the description back out as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if a value has no TOML form.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Resolves names and ids and assembles the network.
    ///
    /// # Errors
    ///
    /// Fails on invalid quantities, duplicate or unknown container names,
    /// unknown or duplicate substances and zero-length port directions.
    pub fn build(&self) -> Result<BuiltNetwork, ConfigError> {
        let simulation = &self.simulation;
        let time_step = StrictlyPositive::new(simulation.time_step)
            .map_err(ConfigError::constraint("simulation.time_step"))?
            .into_inner();

        let mut catalog = Catalog::new();
        for substance in &self.substances {
            catalog.insert(substance.to_substance()?)?;
        }

        let mut network = Network::new().with_mode(simulation.mode);
        let mut names = BTreeMap::new();
        for container in &self.containers {
            if names.contains_key(&container.name) {
                return Err(ConfigError::DuplicateContainer(container.name.clone()));
            }
            let tank = container.to_tank(&catalog, simulation.temperature)?;
            names.insert(container.name.clone(), network.add_container(tank));
        }

        for (index, connection) in self.connections.iter().enumerate() {
            let pipe = FlowConnection::new(
                connection.from.to_end(&names)?,
                connection.to.to_end(&names)?,
                connection.area,
            )
            .map_err(ConfigError::constraint(format!("connections[{index}].area")))?
            .with_tolerances(simulation.tolerances);
            network.connect(pipe)?;
        }

        for (index, drain) in self.drains.iter().enumerate() {
            let end = drain.port.to_end(&names)?;
            let ambient = FluidState::new(
                drain.ambient_pressure.unwrap_or(Pressure::ZERO),
                simulation.temperature,
            );
            let drain = Drain::new(end.container, end.port, drain.hole_area, ambient)
                .map_err(ConfigError::constraint(format!("drains[{index}].hole_area")))?;
            network.add_drain(drain)?;
        }

        log::debug!(
            "built network with {} substances, {} containers, {} connections and {} drains",
            catalog.len(),
            network.containers().len(),
            network.connections().len(),
            network.drains().len(),
        );

        Ok(BuiltNetwork {
            catalog,
            network,
            time_step,
            names,
        })
    }
}

impl SubstanceConfig {
    fn to_substance(&self) -> Result<Substance, SubstanceError> {
        let mut substance = Substance::new(self.id.clone(), self.density)?;
        if let Some(name) = &self.display_name {
            substance = substance.with_display_name(name.clone());
        }
        if let Some(color) = self.color {
            substance = substance.with_color(color);
        }
        Ok(substance)
    }
}

impl ContainerConfig {
    fn frame(&self) -> Isometry3<f64> {
        let [x, y, z] = self.position;
        let [roll, pitch, yaw] = self.rotation;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }

    fn to_tank(
        &self,
        catalog: &Catalog,
        default_temperature: ThermodynamicTemperature,
    ) -> Result<Tank, ConfigError> {
        let name = &self.name;
        let config = TankConfig::sphere(name.clone(), self.radius, self.max_volume)
            .map_err(ConfigError::constraint(format!("containers.{name}.radius")))?
            .with_frame(self.frame())
            .with_temperature(self.temperature.unwrap_or(default_temperature))
            .with_mixing(self.mixing);

        let contents = self
            .contents
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.to_state(catalog, format!("containers.{name}.contents[{i}].mass")))
            .collect::<Result<Mixture, _>>()?;

        Tank::new(config, contents)
            .map_err(ConfigError::constraint(format!("containers.{name}.max_volume")))
    }
}

impl PortConfig {
    fn to_end(&self, names: &BTreeMap<String, ContainerId>) -> Result<ConnectionEnd, ConfigError> {
        let container = *names
            .get(&self.container)
            .ok_or_else(|| ConfigError::UnknownContainer(self.container.clone()))?;
        let port = Port::try_new(Point3::from(self.position), Vector3::from(self.forward))
            .ok_or_else(|| ConfigError::InvalidDirection(self.container.clone()))?;
        Ok(ConnectionEnd::new(container, port))
    }
}
