//! Proportional scale-down of flows that would over-commit a container.

use uom::{
    ConstZero,
    si::f64::{Time, Volume, VolumeRate},
};

use crate::{ContainerId, FluidContainer};

/// Volume rates proposed against each container during one tick.
#[derive(Debug, Clone)]
pub(super) struct Demand {
    draw: Vec<VolumeRate>,
    fill: Vec<VolumeRate>,
}

impl Demand {
    pub(super) fn new(containers: usize) -> Self {
        Self {
            draw: vec![VolumeRate::ZERO; containers],
            fill: vec![VolumeRate::ZERO; containers],
        }
    }

    /// Records a transfer of `rate` from `inlet` to `outlet`.
    pub(super) fn transfer(&mut self, inlet: ContainerId, outlet: ContainerId, rate: VolumeRate) {
        self.draw[inlet.index()] += rate;
        self.fill[outlet.index()] += rate;
    }

    /// Records `rate` leaving `container` to the environment.
    pub(super) fn drain(&mut self, container: ContainerId, rate: VolumeRate) {
        self.draw[container.index()] += rate;
    }

    /// Resolves the demand against what each container holds and can take.
    pub(super) fn scales<C: FluidContainer>(&self, containers: &[C], dt: Time) -> Scales {
        let draw = containers
            .iter()
            .zip(&self.draw)
            .map(|(container, &rate)| limit(container.volume(), rate, dt))
            .collect();
        let fill = containers
            .iter()
            .zip(&self.fill)
            .map(|(container, &rate)| limit(container.free_volume(), rate, dt))
            .collect();

        Scales { draw, fill }
    }
}

/// Factors in `[0, 1]` applied to each proposed flow.
#[derive(Debug, Clone)]
pub(super) struct Scales {
    draw: Vec<f64>,
    fill: Vec<f64>,
}

impl Scales {
    pub(super) fn transfer(&self, inlet: ContainerId, outlet: ContainerId) -> f64 {
        self.draw[inlet.index()].min(self.fill[outlet.index()])
    }

    pub(super) fn drain(&self, container: ContainerId) -> f64 {
        self.draw[container.index()]
    }
}

/// Returns the fraction of `rate` over `dt` that fits in `capacity`.
fn limit(capacity: Volume, rate: VolumeRate, dt: Time) -> f64 {
    let requested = rate * dt;
    if requested <= capacity || requested <= Volume::ZERO {
        return 1.0;
    }
    (capacity / requested).value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{time::second, volume::cubic_meter, volume_rate::cubic_meter_per_second};

    fn m3(value: f64) -> Volume {
        Volume::new::<cubic_meter>(value)
    }

    fn m3_s(value: f64) -> VolumeRate {
        VolumeRate::new::<cubic_meter_per_second>(value)
    }

    #[test]
    fn demand_within_capacity_is_untouched() {
        assert_eq!(limit(m3(1.0), m3_s(0.1), Time::new::<second>(5.0)), 1.0);
        assert_eq!(limit(m3(0.0), m3_s(0.0), Time::new::<second>(5.0)), 1.0);
    }

    #[test]
    fn excess_demand_is_shared_proportionally() {
        assert_relative_eq!(limit(m3(1.0), m3_s(0.4), Time::new::<second>(5.0)), 0.5);
        assert_eq!(limit(m3(0.0), m3_s(0.4), Time::new::<second>(5.0)), 0.0);
    }
}
