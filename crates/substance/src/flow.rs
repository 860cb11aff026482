use std::{
    ops::{AddAssign, Neg, SubAssign},
    sync::Arc,
};

use uom::{
    ConstZero,
    si::f64::{MassRate, VolumeRate},
};

use crate::{FluidState, Substance};

/// One substance's contribution to a flow.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstanceRate {
    pub substance: Arc<Substance>,
    /// Signed mass rate; the sign convention belongs to whoever owns the flow.
    pub rate: MassRate,
}

impl SubstanceRate {
    #[must_use]
    pub fn new(substance: Arc<Substance>, rate: MassRate) -> Self {
        Self { substance, rate }
    }

    /// Returns the volumetric rate of this substance.
    #[must_use]
    pub fn volume_rate(&self) -> VolumeRate {
        self.rate / self.substance.density()
    }
}

/// Per-substance mass rates of a moving fluid plus its [`FluidState`].
///
/// Flows are what pipes hand to tanks each tick, and what tanks accumulate
/// as pending inflow and outflow.
/// Entries are unique per substance id and keep their insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MixtureFlow {
    rates: Vec<SubstanceRate>,
    pub fluid: FluidState,
}

impl MixtureFlow {
    /// Creates a flow carrying nothing.
    #[must_use]
    pub fn empty(fluid: FluidState) -> Self {
        Self {
            rates: Vec::new(),
            fluid,
        }
    }

    /// Creates a flow from per-substance rates, merging repeated substances.
    #[must_use]
    pub fn from_rates(rates: impl IntoIterator<Item = SubstanceRate>, fluid: FluidState) -> Self {
        let mut flow = Self::empty(fluid);
        for SubstanceRate { substance, rate } in rates {
            flow.accumulate(&substance, rate);
        }
        flow
    }

    #[must_use]
    pub fn rates(&self) -> &[SubstanceRate] {
        &self.rates
    }

    /// Returns the mass rate of the substance with the given id.
    #[must_use]
    pub fn rate_of(&self, id: &str) -> MassRate {
        self.rates
            .iter()
            .find(|entry| entry.substance.id() == id)
            .map_or(MassRate::ZERO, |entry| entry.rate)
    }

    /// Returns the net mass rate over all substances.
    #[must_use]
    pub fn mass_rate(&self) -> MassRate {
        self.rates
            .iter()
            .fold(MassRate::ZERO, |acc, entry| acc + entry.rate)
    }

    /// Returns the net volumetric rate over all substances.
    #[must_use]
    pub fn volume_rate(&self) -> VolumeRate {
        self.rates
            .iter()
            .fold(VolumeRate::ZERO, |acc, entry| acc + entry.volume_rate())
    }

    /// Returns `true` if no substance moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.iter().all(|entry| entry.rate == MassRate::ZERO)
    }

    /// Returns a copy with every rate multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            rates: self
                .rates
                .iter()
                .map(|entry| SubstanceRate::new(Arc::clone(&entry.substance), entry.rate * factor))
                .collect(),
            fluid: self.fluid,
        }
    }

    /// Removes every entry, leaving an empty flow with the same fluid state.
    pub fn clear(&mut self) {
        self.rates.clear();
    }

    fn accumulate(&mut self, substance: &Arc<Substance>, rate: MassRate) {
        match self
            .rates
            .iter_mut()
            .find(|entry| entry.substance.id() == substance.id())
        {
            Some(entry) => entry.rate += rate,
            None => self
                .rates
                .push(SubstanceRate::new(Arc::clone(substance), rate)),
        }
    }
}

impl Neg for MixtureFlow {
    type Output = Self;

    fn neg(self) -> Self {
        self.scaled(-1.0)
    }
}

impl AddAssign<&MixtureFlow> for MixtureFlow {
    fn add_assign(&mut self, rhs: &MixtureFlow) {
        for entry in &rhs.rates {
            self.accumulate(&entry.substance, entry.rate);
        }
    }
}

impl SubAssign<&MixtureFlow> for MixtureFlow {
    fn sub_assign(&mut self, rhs: &MixtureFlow) {
        for entry in &rhs.rates {
            self.accumulate(&entry.substance, -entry.rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::MassDensity, mass_density::kilogram_per_cubic_meter, mass_rate::kilogram_per_second,
        volume_rate::cubic_meter_per_second,
    };

    fn substance(id: &str, density: f64) -> Arc<Substance> {
        Arc::new(
            Substance::new(id, MassDensity::new::<kilogram_per_cubic_meter>(density)).unwrap(),
        )
    }

    fn kg_s(value: f64) -> MassRate {
        MassRate::new::<kilogram_per_second>(value)
    }

    #[test]
    fn totals_over_substances() {
        let water = substance("water", 1000.0);
        let fuel = substance("fuel", 800.0);
        let flow = MixtureFlow::from_rates(
            [
                SubstanceRate::new(Arc::clone(&water), kg_s(10.0)),
                SubstanceRate::new(Arc::clone(&fuel), kg_s(8.0)),
            ],
            FluidState::default(),
        );

        assert_relative_eq!(flow.mass_rate().get::<kilogram_per_second>(), 18.0);
        assert_relative_eq!(flow.volume_rate().get::<cubic_meter_per_second>(), 0.02);
        assert_relative_eq!(flow.rate_of("fuel").get::<kilogram_per_second>(), 8.0);
        assert_relative_eq!(flow.rate_of("lox").get::<kilogram_per_second>(), 0.0);
    }

    #[test]
    fn repeated_substances_are_merged() {
        let water = substance("water", 1000.0);
        let flow = MixtureFlow::from_rates(
            [
                SubstanceRate::new(Arc::clone(&water), kg_s(1.0)),
                SubstanceRate::new(Arc::clone(&water), kg_s(2.5)),
            ],
            FluidState::default(),
        );

        assert_eq!(flow.rates().len(), 1);
        assert_relative_eq!(flow.mass_rate().get::<kilogram_per_second>(), 3.5);
    }

    #[test]
    fn accumulate_and_reverse() {
        let water = substance("water", 1000.0);
        let flow = MixtureFlow::from_rates(
            [SubstanceRate::new(Arc::clone(&water), kg_s(4.0))],
            FluidState::default(),
        );

        let mut pending = MixtureFlow::default();
        pending += &flow;
        pending -= &flow.scaled(0.25);
        assert_relative_eq!(pending.mass_rate().get::<kilogram_per_second>(), 3.0);

        pending -= &flow.scaled(0.75);
        assert!(pending.is_empty());
    }

    #[test]
    fn negation_flips_every_rate() {
        let water = substance("water", 1000.0);
        let fuel = substance("fuel", 800.0);
        let flow = MixtureFlow::from_rates(
            [
                SubstanceRate::new(water, kg_s(2.0)),
                SubstanceRate::new(fuel, kg_s(-1.0)),
            ],
            FluidState::default(),
        );

        let reversed = -flow;
        assert_relative_eq!(reversed.rate_of("water").get::<kilogram_per_second>(), -2.0);
        assert_relative_eq!(reversed.rate_of("fuel").get::<kilogram_per_second>(), 1.0);
    }
}
