use bulkflow_core::constraint::{Constrained, ConstraintError, NonNegative};
use bulkflow_substance::{FluidState, MixtureFlow};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use uom::{
    ConstZero,
    si::{
        acceleration::meter_per_second_squared,
        area::square_meter,
        f64::{Acceleration, Area, Pressure, Time, VolumeRate},
        pressure::pascal,
        velocity::meter_per_second,
        volume_rate::cubic_meter_per_second,
    },
};

use crate::{ContainerId, FluidContainer, Port, SampleError, hydrostatics::torricelli_speed};

/// Dead-band thresholds below which a connection reports no flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Pipes at or below this cross-section are treated as closed.
    pub min_area: Area,
    /// Accelerations weaker than this cannot settle a liquid surface.
    pub min_acceleration: Acceleration,
    /// Pressure differences smaller than this are treated as equilibrium.
    pub pressure_deadband: Pressure,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            min_area: Area::new::<square_meter>(1e-6),
            min_acceleration: Acceleration::new::<meter_per_second_squared>(0.01),
            pressure_deadband: Pressure::new::<pascal>(0.001),
        }
    }
}

/// One side of a [`FlowConnection`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionEnd {
    pub container: ContainerId,
    pub port: Port,
}

impl ConnectionEnd {
    #[must_use]
    pub fn new(container: ContainerId, port: Port) -> Self {
        Self { container, port }
    }
}

/// A pipe joining two containers.
///
/// Positive flow moves mass from the first end to the second.
/// The connection remembers the flow it last pushed into the containers'
/// accumulators so it can withdraw it before applying the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowConnection {
    ends: [ConnectionEnd; 2],
    area: Constrained<Area, NonNegative>,
    tolerances: Tolerances,
    cached_flow: Option<MixtureFlow>,
}

impl FlowConnection {
    /// Creates a pipe with the default [`Tolerances`].
    ///
    /// A zero area is allowed and describes a closed pipe.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if `area` is negative or NaN.
    pub fn new(
        first: ConnectionEnd,
        second: ConnectionEnd,
        area: Area,
    ) -> Result<Self, ConstraintError> {
        Ok(Self {
            ends: [first, second],
            area: Constrained::new(area)?,
            tolerances: Tolerances::default(),
            cached_flow: None,
        })
    }

    #[must_use]
    pub fn with_tolerances(self, tolerances: Tolerances) -> Self {
        Self { tolerances, ..self }
    }

    #[must_use]
    pub fn ends(&self) -> &[ConnectionEnd; 2] {
        &self.ends
    }

    #[must_use]
    pub fn area(&self) -> Area {
        self.area.into_inner()
    }

    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// The flow most recently applied by [`FlowConnection::update_containers`].
    #[must_use]
    pub fn cached_flow(&self) -> Option<&MixtureFlow> {
        self.cached_flow.as_ref()
    }

    /// Computes the flow through the pipe without touching either container.
    ///
    /// `end1` and `end2` must be the containers of the first and second end.
    /// `acceleration` is given in scene space and rotated into each
    /// container's frame before sampling.
    ///
    /// The speed follows Torricelli's law from the higher-pressure end, and the
    /// volume rate is capped by the pipe, by what the inlet holds and by the
    /// room left in the outlet, each over `dt`. The result is signed: negative
    /// when the second end is the inlet. Its fluid state carries the inlet
    /// pressure and temperature and a scene-space velocity leaving the inlet
    /// port.
    ///
    /// Returns `Ok(None)` when any dead band applies or nothing would move.
    ///
    /// # Errors
    ///
    /// Propagates a [`SampleError`] from either container.
    pub fn calculate_flow<C: FluidContainer + ?Sized>(
        &self,
        end1: &C,
        end2: &C,
        acceleration: &Vector3<f64>,
        dt: Time,
    ) -> Result<Option<MixtureFlow>, SampleError> {
        let tolerances = &self.tolerances;

        if self.area() <= tolerances.min_area || dt <= Time::ZERO {
            return Ok(None);
        }
        let gravity = acceleration.norm();
        if gravity < tolerances.min_acceleration.get::<meter_per_second_squared>() {
            log::debug!("acceleration {gravity:.4} m/s² is inside the dead band");
            return Ok(None);
        }

        let [first, second] = &self.ends;
        let state1 = end1.sample(
            &first.port.position,
            &end1.frame().inverse_transform_vector(acceleration),
        )?;
        let state2 = end2.sample(
            &second.port.position,
            &end2.frame().inverse_transform_vector(acceleration),
        )?;

        if state1.is_vacuum() && state2.is_vacuum() {
            return Ok(None);
        }

        let delta = state1.pressure - state2.pressure;
        if delta.abs() < tolerances.pressure_deadband {
            return Ok(None);
        }

        let forward = delta >= Pressure::ZERO;
        let (inlet, outlet, inlet_end, inlet_state) = if forward {
            (end1, end2, first, state1)
        } else {
            (end2, end1, second, state2)
        };

        let Some(density) = inlet.contents().average_density() else {
            return Ok(None);
        };
        let speed = torricelli_speed(delta.abs(), density);

        let pipe: VolumeRate = self.area() * speed;
        let available: VolumeRate = (inlet.volume() / dt).max(VolumeRate::ZERO);
        let room: VolumeRate = outlet.free_volume() / dt;
        let rate = pipe.min(available).min(room);
        if rate <= VolumeRate::ZERO {
            return Ok(None);
        }

        let outward = inlet
            .frame()
            .transform_vector(&inlet_end.port.forward.into_inner());
        let fluid = FluidState::new(inlet_state.pressure, inlet.temperature())
            .with_velocity(outward * speed.get::<meter_per_second>());

        let signed = if forward { rate } else { -rate };
        log::trace!(
            "{} → {}: ΔP {:.3} Pa, {:.6} m³/s (pipe limit {:.6})",
            first.container,
            second.container,
            delta.get::<pascal>(),
            signed.get::<cubic_meter_per_second>(),
            pipe.get::<cubic_meter_per_second>(),
        );

        let flow = inlet.contents().flow_at_volume_rate(rate, fluid);
        Ok(Some(if forward { flow } else { -flow }))
    }

    /// Replaces this connection's contribution to the containers' accumulators.
    ///
    /// The previously applied flow is withdrawn, `new_flow` is applied (taken
    /// from `end1`, given to `end2`) and remembered for the next call.
    pub fn update_containers<C: FluidContainer + ?Sized>(
        &mut self,
        new_flow: Option<MixtureFlow>,
        end1: &mut C,
        end2: &mut C,
    ) {
        if let Some(previous) = self.cached_flow.take() {
            end1.pending_mut().inflow += &previous;
            end2.pending_mut().inflow -= &previous;
        }

        if let Some(flow) = &new_flow {
            end1.pending_mut().inflow -= flow;
            end2.pending_mut().inflow += flow;
        }

        self.cached_flow = new_flow;
    }

    /// Drops the remembered flow without touching any accumulator.
    pub(crate) fn forget_cached_flow(&mut self) {
        self.cached_flow = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use approx::assert_relative_eq;
    use bulkflow_substance::{Mixture, Substance};
    use nalgebra::{Isometry3, Point3, Unit};
    use uom::si::{
        f64::{Length, Mass, MassDensity, Volume},
        length::meter,
        mass::kilogram,
        mass_density::kilogram_per_cubic_meter,
        mass_rate::kilogram_per_second,
        time::second,
        volume::cubic_meter,
    };

    use crate::{MixingModel, Tank, TankConfig};

    fn substance(id: &str, density: f64) -> Arc<Substance> {
        Arc::new(Substance::new(id, MassDensity::new::<kilogram_per_cubic_meter>(density)).unwrap())
    }

    fn water() -> Arc<Substance> {
        substance("water", 1000.0)
    }

    fn config(name: &str) -> TankConfig {
        TankConfig::sphere(name, Length::new::<meter>(1.0), Volume::new::<cubic_meter>(2.0)).unwrap()
    }

    fn tank(name: &str, water_kg: f64) -> Tank {
        let contents = if water_kg > 0.0 {
            Mixture::new().with(water(), Mass::new::<kilogram>(water_kg))
        } else {
            Mixture::new()
        };
        Tank::new(config(name), contents).unwrap()
    }

    fn port(z: f64) -> Port {
        Port::new(
            Point3::new(0.0, 0.0, z),
            Unit::new_normalize(Vector3::new(0.0, 0.0, z.signum())),
        )
    }

    fn pipe(first: Port, other: Port, area: f64) -> FlowConnection {
        FlowConnection::new(
            ConnectionEnd::new(ContainerId(0), first),
            ConnectionEnd::new(ContainerId(1), other),
            Area::new::<square_meter>(area),
        )
        .unwrap()
    }

    fn gravity() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -10.0)
    }

    fn seconds(s: f64) -> Time {
        Time::new::<second>(s)
    }

    fn kg_per_s(flow: &MixtureFlow) -> f64 {
        flow.mass_rate().get::<kilogram_per_second>()
    }

    #[test]
    fn flows_from_high_to_low_pressure() {
        let full = tank("a", 1000.0);
        let empty = tank("b", 0.0);
        let pipe = pipe(port(-1.0), port(-1.0), 0.01);

        let flow = pipe
            .calculate_flow(&full, &empty, &gravity(), seconds(0.02))
            .unwrap()
            .unwrap();

        assert_relative_eq!(kg_per_s(&flow), 1000.0 * 0.01 * 20.0_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(flow.fluid.pressure.get::<pascal>(), 10_000.0, epsilon = 1e-9);
        assert_relative_eq!(flow.fluid.velocity.z, -(20.0_f64.sqrt()), epsilon = 1e-12);
    }

    #[test]
    fn reversed_ends_give_negative_flow() {
        let full = tank("a", 1000.0);
        let empty = tank("b", 0.0);
        let pipe = pipe(port(-1.0), port(-1.0), 0.01);

        let flow = pipe
            .calculate_flow(&empty, &full, &gravity(), seconds(0.02))
            .unwrap()
            .unwrap();

        assert_relative_eq!(kg_per_s(&flow), -1000.0 * 0.01 * 20.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn acceleration_is_rotated_into_each_frame() {
        // Turning the source tank upside down puts its port in the ullage.
        let flipped = Tank::new(
            config("a").with_frame(Isometry3::rotation(Vector3::new(std::f64::consts::PI, 0.0, 0.0))),
            Mixture::new().with(water(), Mass::new::<kilogram>(1000.0)),
        )
        .unwrap();
        let empty = tank("b", 0.0);
        let pipe = pipe(port(-1.0), port(-1.0), 0.01);

        let flow = pipe
            .calculate_flow(&flipped, &empty, &gravity(), seconds(0.02))
            .unwrap();
        assert!(flow.is_none());
    }

    #[test]
    fn outlet_room_limits_flow() {
        let full = tank("a", 1000.0);
        let nearly_full = tank("b", 1999.0);
        let pipe = pipe(port(-1.0), port(1.0), 0.01);

        let flow = pipe
            .calculate_flow(&full, &nearly_full, &gravity(), seconds(0.1))
            .unwrap()
            .unwrap();

        // 0.001 m³ of room over 0.1 s.
        assert_relative_eq!(kg_per_s(&flow), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn inlet_contents_limit_flow() {
        let trickle = tank("a", 1.0);
        let empty = tank("b", 0.0);
        let pipe = pipe(port(-1.0), port(-1.0), 0.01);

        let flow = pipe
            .calculate_flow(&trickle, &empty, &gravity(), seconds(1.0))
            .unwrap()
            .unwrap();

        assert_relative_eq!(kg_per_s(&flow), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn dead_bands() {
        let full = tank("a", 1000.0);
        let empty = tank("b", 0.0);
        let dt = seconds(0.02);

        let closed = pipe(port(-1.0), port(-1.0), 0.0);
        assert!(closed.calculate_flow(&full, &empty, &gravity(), dt).unwrap().is_none());

        let hairline = pipe(port(-1.0), port(-1.0), 1e-6);
        assert!(hairline.calculate_flow(&full, &empty, &gravity(), dt).unwrap().is_none());

        let open = pipe(port(-1.0), port(-1.0), 0.01);
        let weak = Vector3::new(0.0, 0.0, -0.005);
        assert!(open.calculate_flow(&full, &empty, &weak, dt).unwrap().is_none());

        let twin = tank("c", 1000.0);
        assert!(open.calculate_flow(&full, &twin, &gravity(), dt).unwrap().is_none());

        let other_empty = tank("d", 0.0);
        assert!(open.calculate_flow(&empty, &other_empty, &gravity(), dt).unwrap().is_none());
    }

    #[test]
    fn pressure_deadband_holds_small_differences() {
        let bottom = Point3::new(0.0, 0.0, -1.0);
        let delta = |x: &Tank, y: &Tank| {
            let p = |t: &Tank| t.sample(&bottom, &gravity()).unwrap().pressure.get::<pascal>();
            p(x) - p(y)
        };
        let dt = seconds(0.02);
        let open = pipe(port(-1.0), port(-1.0), 0.01);
        let level = tank("a", 1000.0);

        // A few tens of milligrams near half full shift the bottom pressure by fractions of a millipascal.
        let within = tank("b", 1000.000_075);
        let dp = delta(&within, &level);
        assert!(dp > 0.0 && dp < 0.001, "dp = {dp} Pa");
        assert!(open.calculate_flow(&level, &within, &gravity(), dt).unwrap().is_none());

        let beyond = tank("c", 1000.000_3);
        let dp = delta(&beyond, &level);
        assert!(dp > 0.001, "dp = {dp} Pa");
        let flow = open.calculate_flow(&level, &beyond, &gravity(), dt).unwrap().unwrap();
        assert!(kg_per_s(&flow) < 0.0);

        let coarse = pipe(port(-1.0), port(-1.0), 0.01).with_tolerances(Tolerances {
            pressure_deadband: Pressure::new::<pascal>(1.0),
            ..Tolerances::default()
        });
        let nudged = tank("d", 1000.075);
        let dp = delta(&nudged, &level);
        assert!(dp > 0.1 && dp < 1.0, "dp = {dp} Pa");
        assert!(coarse.calculate_flow(&level, &nudged, &gravity(), dt).unwrap().is_none());
        assert!(open.calculate_flow(&level, &nudged, &gravity(), dt).unwrap().is_some());
    }

    #[test]
    fn negative_area_is_rejected() {
        let result = FlowConnection::new(
            ConnectionEnd::new(ContainerId(0), port(-1.0)),
            ConnectionEnd::new(ContainerId(1), port(-1.0)),
            Area::new::<square_meter>(-1.0),
        );
        assert_eq!(result, Err(ConstraintError::Negative));
    }

    #[test]
    fn accumulators_hold_only_the_latest_flow() {
        let mut a = tank("a", 1000.0);
        let mut b = tank("b", 0.0);
        let mut pipe = pipe(port(-1.0), port(-1.0), 0.01);

        let first = pipe
            .calculate_flow(&a, &b, &gravity(), seconds(0.02))
            .unwrap()
            .unwrap();
        let rate = first.rate_of("water");
        pipe.update_containers(Some(first.clone()), &mut a, &mut b);
        assert_eq!(a.pending().inflow.rate_of("water"), -rate);
        assert_eq!(b.pending().inflow.rate_of("water"), rate);

        let halved = first.scaled(0.5);
        pipe.update_containers(Some(halved), &mut a, &mut b);
        assert_relative_eq!(
            a.pending().inflow.rate_of("water").get::<kilogram_per_second>(),
            -0.5 * rate.get::<kilogram_per_second>(),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            b.pending().inflow.rate_of("water").get::<kilogram_per_second>(),
            0.5 * rate.get::<kilogram_per_second>(),
            epsilon = 1e-9
        );

        pipe.update_containers(None, &mut a, &mut b);
        assert!(a.pending().inflow.is_empty());
        assert!(b.pending().inflow.is_empty());
        assert!(pipe.cached_flow().is_none());
    }

    #[test]
    fn mixtures_keep_their_ratio() {
        let contents = Mixture::new()
            .with(water(), Mass::new::<kilogram>(500.0))
            .with(substance("oil", 800.0), Mass::new::<kilogram>(400.0));
        let mixed = Tank::new(config("a").with_mixing(MixingModel::Homogeneous), contents).unwrap();
        let empty = tank("b", 0.0);
        let pipe = pipe(port(-1.0), port(-1.0), 0.01);

        let flow = pipe
            .calculate_flow(&mixed, &empty, &gravity(), seconds(0.02))
            .unwrap()
            .unwrap();

        let water_rate = flow.rate_of("water").get::<kilogram_per_second>();
        let oil_rate = flow.rate_of("oil").get::<kilogram_per_second>();
        assert_relative_eq!(water_rate / oil_rate, 500.0 / 400.0, epsilon = 1e-12);

        // Bulk density sets the pressure, average density sets the speed.
        let average: f64 = (500.0 * 1000.0 + 400.0 * 800.0) / 900.0;
        let speed = (2.0 * 9_000.0 / average).sqrt();
        assert_relative_eq!(
            flow.volume_rate().get::<cubic_meter_per_second>(),
            0.01 * speed,
            epsilon = 1e-9
        );
    }

    #[test]
    fn stratified_source_is_an_error() {
        let contents = Mixture::new()
            .with(water(), Mass::new::<kilogram>(500.0))
            .with(substance("oil", 800.0), Mass::new::<kilogram>(400.0));
        let layered = Tank::new(config("a"), contents).unwrap();
        let empty = tank("b", 0.0);
        let pipe = pipe(port(-1.0), port(-1.0), 0.01);

        let result = pipe.calculate_flow(&layered, &empty, &gravity(), seconds(0.02));
        assert_eq!(result, Err(SampleError::Stratified { count: 2 }));
    }
}
