mod allocate;

use std::fmt;

use bulkflow_substance::{Catalog, Mixture, MixtureFlow};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use uom::{
    ConstZero,
    si::f64::{Mass, Time, Volume, VolumeRate},
};

use crate::{
    Drain, FlowConnection, FluidContainer, NetworkError, Tank,
    config::{ConfigError, MassEntry},
};

use allocate::Demand;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position in insertion order.
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " #{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Handle to a container owned by a [`Network`].
    ContainerId,
    "container"
);
id_type!(
    /// Handle to a connection owned by a [`Network`].
    ConnectionId,
    "connection"
);
id_type!(
    /// Handle to a drain owned by a [`Network`].
    DrainId,
    "drain"
);

/// How a [`Network`] orders flow calculation and integration within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickMode {
    /// Gather every flow, scale down over-committed ones, then integrate.
    #[default]
    TwoPhase,
    /// Update accumulators connection by connection, without allocation.
    ///
    /// Several pipes drawing on one tank may together take more than it holds;
    /// integration then discards the overdraw.
    Sequential,
}

/// A container's mass changed during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassChanged {
    pub container: ContainerId,
    pub delta: Mass,
}

/// What happened during one [`Network::tick`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// Applied flow per connection, indexed by [`ConnectionId`].
    pub connection_flows: Vec<Option<MixtureFlow>>,
    /// Applied outflow per drain, indexed by [`DrainId`].
    pub drain_flows: Vec<Option<MixtureFlow>>,
    /// One entry per container whose mass changed.
    pub mass_changes: Vec<MassChanged>,
    /// Container masses after integration, indexed by [`ContainerId`].
    pub masses: Vec<Mass>,
    /// Container volumes after integration, indexed by [`ContainerId`].
    pub volumes: Vec<Volume>,
}

impl TickReport {
    #[must_use]
    pub fn total_mass(&self) -> Mass {
        self.masses.iter().fold(Mass::ZERO, |acc, &mass| acc + mass)
    }
}

/// Containers joined by pipes and vented by drains.
///
/// ```
/// use std::sync::Arc;
///
/// use bulkflow_network::{ConnectionEnd, FlowConnection, Network, Port, Tank, TankConfig};
/// use bulkflow_substance::{Mixture, Substance};
/// use nalgebra::{Point3, Vector3};
/// use uom::si::{
///     area::square_meter,
///     f64::{Area, Length, Mass, MassDensity, Time, Volume},
///     length::meter,
///     mass::kilogram,
///     mass_density::kilogram_per_cubic_meter,
///     time::second,
///     volume::cubic_meter,
/// };
///
/// let water = Arc::new(Substance::new("water", MassDensity::new::<kilogram_per_cubic_meter>(1000.0)).unwrap());
/// let sphere = |name: &str| TankConfig::sphere(name, Length::new::<meter>(1.0), Volume::new::<cubic_meter>(4.0)).unwrap();
///
/// let mut network: Network = Network::new();
/// let a = network.add_container(Tank::new(sphere("a"), Mixture::new().with(water, Mass::new::<kilogram>(2000.0))).unwrap());
/// let b = network.add_container(Tank::new(sphere("b"), Mixture::new()).unwrap());
///
/// let bottom = Port::try_new(Point3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
/// let pipe = FlowConnection::new(
///     ConnectionEnd::new(a, bottom),
///     ConnectionEnd::new(b, bottom),
///     Area::new::<square_meter>(0.01),
/// ).unwrap();
/// network.connect(pipe).unwrap();
///
/// let report = network.tick(&Vector3::new(0.0, 0.0, -9.81), Time::new::<second>(0.02)).unwrap();
/// assert_eq!(report.mass_changes.len(), 2);
/// assert!((report.total_mass().get::<kilogram>() - 2000.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct Network<C = Tank> {
    containers: Vec<C>,
    connections: Vec<FlowConnection>,
    drains: Vec<Drain>,
    mode: TickMode,
}

impl<C: FluidContainer> Default for Network<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: FluidContainer> Network<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            containers: Vec::new(),
            connections: Vec::new(),
            drains: Vec::new(),
            mode: TickMode::default(),
        }
    }

    #[must_use]
    pub fn with_mode(self, mode: TickMode) -> Self {
        Self { mode, ..self }
    }

    #[must_use]
    pub fn mode(&self) -> TickMode {
        self.mode
    }

    /// Switches the tick mode.
    ///
    /// Accumulators and remembered connection flows are reset, since the two
    /// modes maintain them differently.
    pub fn set_mode(&mut self, mode: TickMode) {
        if mode != self.mode {
            self.reset_pending();
            self.mode = mode;
        }
    }

    pub fn add_container(&mut self, container: C) -> ContainerId {
        self.containers.push(container);
        ContainerId(self.containers.len() - 1)
    }

    /// Adds a pipe between two containers already in the network.
    ///
    /// # Errors
    ///
    /// Fails if either end names an unknown container or both ends name the same one.
    pub fn connect(&mut self, connection: FlowConnection) -> Result<ConnectionId, NetworkError> {
        let [first, second] = connection.ends();
        self.check(first.container)?;
        self.check(second.container)?;
        if first.container == second.container {
            return Err(NetworkError::SelfConnection(first.container));
        }

        self.connections.push(connection);
        Ok(ConnectionId(self.connections.len() - 1))
    }

    /// Adds a drain on a container already in the network.
    ///
    /// # Errors
    ///
    /// Fails if the drain names an unknown container.
    pub fn add_drain(&mut self, drain: Drain) -> Result<DrainId, NetworkError> {
        self.check(drain.container())?;
        self.drains.push(drain);
        Ok(DrainId(self.drains.len() - 1))
    }

    #[must_use]
    pub fn container(&self, id: ContainerId) -> Option<&C> {
        self.containers.get(id.0)
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut C> {
        self.containers.get_mut(id.0)
    }

    #[must_use]
    pub fn containers(&self) -> &[C] {
        &self.containers
    }

    #[must_use]
    pub fn connection(&self, id: ConnectionId) -> Option<&FlowConnection> {
        self.connections.get(id.0)
    }

    #[must_use]
    pub fn connections(&self) -> &[FlowConnection] {
        &self.connections
    }

    #[must_use]
    pub fn drains(&self) -> &[Drain] {
        &self.drains
    }

    #[must_use]
    pub fn total_mass(&self) -> Mass {
        self.containers
            .iter()
            .fold(Mass::ZERO, |acc, container| acc + container.contents().mass())
    }

    /// Advances every container by `dt` under the scene-space `acceleration`.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] if a container cannot be sampled. Containers
    /// are only integrated once every flow has been calculated, so a failed
    /// tick leaves all contents unchanged.
    pub fn tick(
        &mut self,
        acceleration: &Vector3<f64>,
        dt: Time,
    ) -> Result<TickReport, NetworkError> {
        let (connection_flows, drain_flows) = match self.mode {
            TickMode::TwoPhase => self.apply_two_phase(acceleration, dt)?,
            TickMode::Sequential => self.apply_sequential(acceleration, dt)?,
        };

        let mass_changes = self
            .containers
            .iter_mut()
            .enumerate()
            .filter_map(|(index, container)| {
                let delta = container.integrate(dt);
                (delta != Mass::ZERO).then_some(MassChanged {
                    container: ContainerId(index),
                    delta,
                })
            })
            .collect();

        Ok(TickReport {
            connection_flows,
            drain_flows,
            mass_changes,
            masses: self.containers.iter().map(|c| c.contents().mass()).collect(),
            volumes: self.containers.iter().map(|c| c.volume()).collect(),
        })
    }

    /// Exports each container's contents as `(substance id, mass)` entries.
    #[must_use]
    pub fn contents_snapshot(&self) -> Vec<Vec<MassEntry>> {
        self.containers
            .iter()
            .map(|container| {
                container
                    .contents()
                    .states()
                    .iter()
                    .map(|state| MassEntry {
                        substance: state.substance.id().to_owned(),
                        mass: state.mass,
                    })
                    .collect()
            })
            .collect()
    }

    /// Replaces every container's contents with a snapshot.
    ///
    /// Accumulators and remembered connection flows are reset.
    /// Nothing is changed if any entry fails to resolve.
    ///
    /// # Errors
    ///
    /// Fails if the snapshot does not hold one list per container, names a
    /// substance missing from `catalog` or holds a negative mass.
    pub fn restore_contents(
        &mut self,
        snapshot: &[Vec<MassEntry>],
        catalog: &Catalog,
    ) -> Result<(), ConfigError> {
        if snapshot.len() != self.containers.len() {
            return Err(ConfigError::SnapshotLength {
                expected: self.containers.len(),
                found: snapshot.len(),
            });
        }

        let restored = snapshot
            .iter()
            .enumerate()
            .map(|(c, entries)| {
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| entry.to_state(catalog, format!("snapshot[{c}][{i}].mass")))
                    .collect::<Result<Mixture, ConfigError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (container, contents) in self.containers.iter_mut().zip(restored) {
            *container.contents_mut() = contents;
        }
        self.reset_pending();
        Ok(())
    }

    fn check(&self, id: ContainerId) -> Result<(), NetworkError> {
        if id.0 < self.containers.len() {
            Ok(())
        } else {
            Err(NetworkError::UnknownContainer(id))
        }
    }

    fn reset_pending(&mut self) {
        for container in &mut self.containers {
            container.pending_mut().clear();
        }
        for connection in &mut self.connections {
            connection.forget_cached_flow();
        }
    }

    fn gather_connections(
        &self,
        acceleration: &Vector3<f64>,
        dt: Time,
    ) -> Result<Vec<Option<MixtureFlow>>, NetworkError> {
        self.connections
            .iter()
            .enumerate()
            .map(|(index, connection)| {
                let [first, second] = connection.ends();
                connection
                    .calculate_flow(
                        &self.containers[first.container.0],
                        &self.containers[second.container.0],
                        acceleration,
                        dt,
                    )
                    .map_err(|source| NetworkError::ConnectionSample {
                        connection: ConnectionId(index),
                        source,
                    })
            })
            .collect()
    }

    fn gather_drains(
        &self,
        acceleration: &Vector3<f64>,
        dt: Time,
    ) -> Result<Vec<Option<MixtureFlow>>, NetworkError> {
        self.drains
            .iter()
            .enumerate()
            .map(|(index, drain)| {
                drain
                    .calculate_flow(&self.containers[drain.container().0], acceleration, dt)
                    .map_err(|source| NetworkError::DrainSample {
                        drain: DrainId(index),
                        source,
                    })
            })
            .collect()
    }

    /// Gathers all flows against unchanged containers, scales them to fit,
    /// and writes them as the containers' only pending flows.
    fn apply_two_phase(
        &mut self,
        acceleration: &Vector3<f64>,
        dt: Time,
    ) -> Result<(Vec<Option<MixtureFlow>>, Vec<Option<MixtureFlow>>), NetworkError> {
        let connection_flows = self.gather_connections(acceleration, dt)?;
        let drain_flows = self.gather_drains(acceleration, dt)?;

        let mut demand = Demand::new(self.containers.len());
        for (connection, flow) in self.connections.iter().zip(&connection_flows) {
            if let Some(flow) = flow {
                let (inlet, outlet) = direction(connection, flow);
                demand.transfer(inlet, outlet, flow.volume_rate().abs());
            }
        }
        for (drain, flow) in self.drains.iter().zip(&drain_flows) {
            if let Some(flow) = flow {
                demand.drain(drain.container(), flow.volume_rate());
            }
        }
        let scales = demand.scales(&self.containers, dt);

        let connection_flows: Vec<_> = self
            .connections
            .iter()
            .zip(connection_flows)
            .enumerate()
            .map(|(index, (connection, flow))| {
                let flow = flow?;
                let (inlet, outlet) = direction(connection, &flow);
                let scale = scales.transfer(inlet, outlet);
                if scale < 1.0 {
                    log::debug!("{} scaled by {scale:.4} to fit", ConnectionId(index));
                }
                nonempty(flow.scaled(scale))
            })
            .collect();
        let drain_flows: Vec<_> = self
            .drains
            .iter()
            .zip(drain_flows)
            .enumerate()
            .map(|(index, (drain, flow))| {
                let flow = flow?;
                let scale = scales.drain(drain.container());
                if scale < 1.0 {
                    log::debug!("{} scaled by {scale:.4} to fit", DrainId(index));
                }
                nonempty(flow.scaled(scale))
            })
            .collect();

        self.reset_pending();
        for (connection, flow) in self.connections.iter().zip(&connection_flows) {
            if let Some(flow) = flow {
                let [first, second] = connection.ends();
                self.containers[first.container.0].pending_mut().inflow -= flow;
                self.containers[second.container.0].pending_mut().inflow += flow;
            }
        }
        for (drain, flow) in self.drains.iter().zip(&drain_flows) {
            if let Some(flow) = flow {
                self.containers[drain.container().0].pending_mut().outflow += flow;
            }
        }

        Ok((connection_flows, drain_flows))
    }

    /// Lets each connection replace its own contribution in turn.
    fn apply_sequential(
        &mut self,
        acceleration: &Vector3<f64>,
        dt: Time,
    ) -> Result<(Vec<Option<MixtureFlow>>, Vec<Option<MixtureFlow>>), NetworkError> {
        let connection_flows = self.gather_connections(acceleration, dt)?;
        let drain_flows = self.gather_drains(acceleration, dt)?;

        for (connection, flow) in self.connections.iter_mut().zip(&connection_flows) {
            let [first, second] = connection.ends().map(|end| end.container.0);
            let (end1, end2) = pair_mut(&mut self.containers, first, second);
            connection.update_containers(flow.clone(), end1, end2);
        }

        for drain in &self.drains {
            self.containers[drain.container().0].pending_mut().outflow.clear();
        }
        for (drain, flow) in self.drains.iter().zip(&drain_flows) {
            if let Some(flow) = flow {
                self.containers[drain.container().0].pending_mut().outflow += flow;
            }
        }

        Ok((connection_flows, drain_flows))
    }
}

/// Returns `(inlet, outlet)` for a signed connection flow.
fn direction(connection: &FlowConnection, flow: &MixtureFlow) -> (ContainerId, ContainerId) {
    let [first, second] = connection.ends();
    if flow.volume_rate() >= VolumeRate::ZERO {
        (first.container, second.container)
    } else {
        (second.container, first.container)
    }
}

fn nonempty(flow: MixtureFlow) -> Option<MixtureFlow> {
    (!flow.is_empty()).then_some(flow)
}

/// Borrows two distinct elements mutably.
fn pair_mut<T>(items: &mut [T], first: usize, second: usize) -> (&mut T, &mut T) {
    if first < second {
        let (head, tail) = items.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use approx::assert_relative_eq;
    use bulkflow_substance::{FluidState, Substance};
    use nalgebra::Point3;
    use uom::si::{
        area::square_meter,
        f64::{Area, Length, MassDensity},
        length::meter,
        mass::kilogram,
        mass_density::kilogram_per_cubic_meter,
        mass_rate::kilogram_per_second,
        time::second,
        volume::cubic_meter,
    };

    use crate::{ConnectionEnd, Port, SampleError, TankConfig};

    fn water() -> Arc<Substance> {
        Arc::new(Substance::new("water", MassDensity::new::<kilogram_per_cubic_meter>(1000.0)).unwrap())
    }

    fn tank(name: &str, contents: Mixture) -> Tank {
        let config =
            TankConfig::sphere(name, Length::new::<meter>(1.0), Volume::new::<cubic_meter>(2.0)).unwrap();
        Tank::new(config, contents).unwrap()
    }

    fn water_tank(name: &str, kg: f64) -> Tank {
        let contents = if kg > 0.0 {
            Mixture::new().with(water(), Mass::new::<kilogram>(kg))
        } else {
            Mixture::new()
        };
        tank(name, contents)
    }

    fn bottom() -> Port {
        Port::try_new(Point3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, -1.0)).unwrap()
    }

    fn pipe(from: ContainerId, to: ContainerId) -> FlowConnection {
        FlowConnection::new(
            ConnectionEnd::new(from, bottom()),
            ConnectionEnd::new(to, bottom()),
            Area::new::<square_meter>(0.01),
        )
        .unwrap()
    }

    fn gravity() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -10.0)
    }

    /// One small tank feeding two empty ones through identical pipes.
    fn fan_out(mode: TickMode) -> Network {
        let mut network = Network::new().with_mode(mode);
        let source = network.add_container(water_tank("source", 10.0));
        let left = network.add_container(water_tank("left", 0.0));
        let right = network.add_container(water_tank("right", 0.0));
        network.connect(pipe(source, left)).unwrap();
        network.connect(pipe(source, right)).unwrap();
        network
    }

    fn m3(volume: Volume) -> f64 {
        volume.get::<cubic_meter>()
    }

    #[test]
    fn ids_display_their_kind() {
        assert_eq!(ContainerId(3).to_string(), "container #3");
        assert_eq!(ConnectionId(0).to_string(), "connection #0");
        assert_eq!(DrainId(1).to_string(), "drain #1");
    }

    #[test]
    fn rejects_unknown_and_self_connections() {
        let mut network: Network = Network::new();
        let a = network.add_container(water_tank("a", 0.0));

        assert_eq!(
            network.connect(pipe(a, ContainerId(7))),
            Err(NetworkError::UnknownContainer(ContainerId(7)))
        );
        assert_eq!(
            network.connect(pipe(a, a)),
            Err(NetworkError::SelfConnection(a))
        );

        let drain = Drain::new(ContainerId(2), bottom(), Area::ZERO, FluidState::default()).unwrap();
        assert_eq!(
            network.add_drain(drain),
            Err(NetworkError::UnknownContainer(ContainerId(2)))
        );
    }

    #[test]
    fn two_phase_shares_an_overcommitted_tank() {
        let mut network = fan_out(TickMode::TwoPhase);

        let report = network.tick(&gravity(), Time::new::<second>(10.0)).unwrap();

        assert!(m3(report.volumes[0]) >= 0.0);
        assert_relative_eq!(m3(report.volumes[0]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(m3(report.volumes[1]), 0.005, epsilon = 1e-12);
        assert_relative_eq!(m3(report.volumes[2]), 0.005, epsilon = 1e-12);
        assert_relative_eq!(report.total_mass().get::<kilogram>(), 10.0, epsilon = 1e-9);
        assert_eq!(report.mass_changes.len(), 3);
    }

    #[test]
    fn sequential_mode_does_not_allocate() {
        let mut network = fan_out(TickMode::Sequential);

        let report = network.tick(&gravity(), Time::new::<second>(10.0)).unwrap();

        // Each pipe alone may empty the source, so both sinks receive its full volume.
        assert_relative_eq!(m3(report.volumes[0]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(m3(report.volumes[1]), 0.01, epsilon = 1e-12);
        assert_relative_eq!(m3(report.volumes[2]), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn sequential_accumulators_track_the_latest_flow() {
        let mut network: Network = Network::new().with_mode(TickMode::Sequential);
        let a = network.add_container(water_tank("a", 1000.0));
        let b = network.add_container(water_tank("b", 0.0));
        let id = network.connect(pipe(a, b)).unwrap();
        let dt = Time::new::<second>(0.02);

        network.tick(&gravity(), dt).unwrap();
        network.tick(&gravity(), dt).unwrap();

        let latest = network.connection(id).unwrap().cached_flow().unwrap().clone();
        let sink = network.container(b).unwrap();
        assert_relative_eq!(
            sink.pending().inflow.mass_rate().get::<kilogram_per_second>(),
            latest.mass_rate().get::<kilogram_per_second>(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn switching_modes_resets_accumulators() {
        let mut network: Network = Network::new().with_mode(TickMode::Sequential);
        let a = network.add_container(water_tank("a", 1000.0));
        let b = network.add_container(water_tank("b", 0.0));
        let id = network.connect(pipe(a, b)).unwrap();
        network.tick(&gravity(), Time::new::<second>(0.02)).unwrap();

        network.set_mode(TickMode::TwoPhase);

        assert!(network.connection(id).unwrap().cached_flow().is_none());
        assert!(network.container(a).unwrap().pending().net().is_empty());
        assert_eq!(network.mode(), TickMode::TwoPhase);
    }

    #[test]
    fn drains_remove_mass() {
        let mut network: Network = Network::new();
        let a = network.add_container(water_tank("a", 1000.0));
        let drain = Drain::new(
            a,
            bottom(),
            Area::new::<square_meter>(0.001),
            FluidState::default(),
        )
        .unwrap();
        network.add_drain(drain).unwrap();

        let report = network.tick(&gravity(), Time::new::<second>(1.0)).unwrap();

        let expected = 1000.0 * 0.001 * 20.0_f64.sqrt();
        assert_relative_eq!(
            report.mass_changes[0].delta.get::<kilogram>(),
            -expected,
            epsilon = 1e-9
        );
        assert!(report.drain_flows[0].is_some());
    }

    #[test]
    fn failed_tick_leaves_contents_unchanged() {
        let oil =
            Arc::new(Substance::new("oil", MassDensity::new::<kilogram_per_cubic_meter>(800.0)).unwrap());
        let layered = Mixture::new()
            .with(water(), Mass::new::<kilogram>(100.0))
            .with(oil, Mass::new::<kilogram>(100.0));

        let mut network: Network = Network::new();
        let a = network.add_container(tank("a", layered));
        let b = network.add_container(water_tank("b", 500.0));
        let id = network.connect(pipe(b, a)).unwrap();

        let result = network.tick(&gravity(), Time::new::<second>(0.02));

        assert_eq!(
            result,
            Err(NetworkError::ConnectionSample {
                connection: id,
                source: SampleError::Stratified { count: 2 },
            })
        );
        assert_relative_eq!(network.total_mass().get::<kilogram>(), 700.0);
    }

    #[test]
    fn snapshot_restores_contents() {
        let mut catalog = Catalog::new();
        catalog
            .insert(Substance::new("water", MassDensity::new::<kilogram_per_cubic_meter>(1000.0)).unwrap())
            .unwrap();

        let mut network = fan_out(TickMode::TwoPhase);
        let snapshot = network.contents_snapshot();
        network.tick(&gravity(), Time::new::<second>(10.0)).unwrap();

        network.restore_contents(&snapshot, &catalog).unwrap();

        assert_eq!(network.contents_snapshot(), snapshot);
        assert_relative_eq!(network.containers()[0].contents().mass().get::<kilogram>(), 10.0);
        assert!(network.containers()[1].contents().is_empty());
    }

    #[test]
    fn snapshot_must_match_the_network() {
        let catalog = Catalog::new();
        let mut network = fan_out(TickMode::TwoPhase);

        assert!(matches!(
            network.restore_contents(&[], &catalog),
            Err(ConfigError::SnapshotLength { expected: 3, found: 0 })
        ));

        let snapshot = network.contents_snapshot();
        assert!(matches!(
            network.restore_contents(&snapshot, &catalog),
            Err(ConfigError::Substance(_))
        ));
        assert_relative_eq!(network.total_mass().get::<kilogram>(), 10.0);
    }

    #[test]
    fn snapshot_rejects_negative_mass() {
        let mut catalog = Catalog::new();
        catalog
            .insert(Substance::new("water", MassDensity::new::<kilogram_per_cubic_meter>(1000.0)).unwrap())
            .unwrap();
        let mut network = fan_out(TickMode::TwoPhase);

        let mut snapshot = network.contents_snapshot();
        snapshot[1].push(MassEntry {
            substance: "water".into(),
            mass: Mass::new::<kilogram>(-500.0),
        });

        assert!(matches!(
            network.restore_contents(&snapshot, &catalog),
            Err(ConfigError::Constraint { field, .. }) if field == "snapshot[1][0].mass"
        ));
        assert_relative_eq!(network.total_mass().get::<kilogram>(), 10.0);
        assert!(network.containers()[1].contents().is_empty());
    }
}
