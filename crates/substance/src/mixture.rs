use std::sync::Arc;

use bulkflow_core::StepIntegrable;
use uom::{
    ConstZero,
    si::{
        f64::{Mass, MassDensity, Time, Volume, VolumeRate},
        mass::kilogram,
        mass_density::kilogram_per_cubic_meter,
    },
};

use crate::{FluidState, MixtureFlow, Substance, SubstanceRate};

/// Negative remainders smaller than this are rounding noise and are dropped quietly.
const CLAMP_WARN_THRESHOLD_KG: f64 = 1e-9;

/// One substance's share of a mixture.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstanceState {
    pub substance: Arc<Substance>,
    /// May be transiently negative while deltas are being applied.
    pub mass: Mass,
}

impl SubstanceState {
    #[must_use]
    pub fn new(substance: Arc<Substance>, mass: Mass) -> Self {
        Self { substance, mass }
    }

    /// Returns the volume this substance occupies.
    #[must_use]
    pub fn volume(&self) -> Volume {
        self.mass / self.substance.density()
    }
}

/// The contents of a tank: an ordered set of substance masses.
///
/// Entries are unique per substance id.
/// A mixture without any positive mass is empty, which is a normal state
/// meaning "nothing stored".
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bulkflow_substance::{Mixture, Substance};
/// use uom::si::{
///     f64::{Mass, MassDensity},
///     mass::kilogram,
///     mass_density::kilogram_per_cubic_meter,
///     volume::cubic_meter,
/// };
///
/// let water = Arc::new(
///     Substance::new("water", MassDensity::new::<kilogram_per_cubic_meter>(1000.0)).unwrap(),
/// );
/// let contents = Mixture::new().with(water, Mass::new::<kilogram>(500.0));
///
/// assert_eq!(contents.volume().get::<cubic_meter>(), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mixture {
    states: Vec<SubstanceState>,
}

impl Mixture {
    /// Creates an empty mixture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mixture with `mass` of `substance` added.
    #[must_use]
    pub fn with(mut self, substance: Arc<Substance>, mass: Mass) -> Self {
        self.insert(&substance, mass);
        self
    }

    #[must_use]
    pub fn states(&self) -> &[SubstanceState] {
        &self.states
    }

    /// Returns `true` if no substance has a positive mass.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.substance_count() == 0
    }

    /// Returns how many substances have a positive mass.
    #[must_use]
    pub fn substance_count(&self) -> usize {
        self.present().count()
    }

    /// Returns the mass of the substance with the given id.
    #[must_use]
    pub fn mass_of(&self, id: &str) -> Mass {
        self.states
            .iter()
            .find(|state| state.substance.id() == id)
            .map_or(Mass::ZERO, |state| state.mass)
    }

    /// Returns `Σ mᵢ`.
    #[must_use]
    pub fn mass(&self) -> Mass {
        self.states
            .iter()
            .fold(Mass::ZERO, |acc, state| acc + state.mass)
    }

    /// Returns `Σ mᵢ / ρᵢ`.
    #[must_use]
    pub fn volume(&self) -> Volume {
        self.states
            .iter()
            .fold(Volume::ZERO, |acc, state| acc + state.volume())
    }

    /// Returns the mass-weighted density `Σ mᵢ·ρᵢ / Σ mᵢ`.
    ///
    /// Returns `None` for an empty mixture.
    #[must_use]
    pub fn average_density(&self) -> Option<MassDensity> {
        let (weighted, total) = self.present().fold((0.0, 0.0), |(weighted, total), state| {
            let m = state.mass.get::<kilogram>();
            let rho = state.substance.density().get::<kilogram_per_cubic_meter>();
            (weighted + m * rho, total + m)
        });

        (total > 0.0).then(|| MassDensity::new::<kilogram_per_cubic_meter>(weighted / total))
    }

    /// Returns the bulk density `Σ mᵢ / Σ (mᵢ / ρᵢ)` of the present substances.
    ///
    /// Returns `None` for an empty mixture.
    #[must_use]
    pub fn bulk_density(&self) -> Option<MassDensity> {
        let (mass, volume) = self.present_totals();
        (mass > Mass::ZERO && volume > Volume::ZERO).then(|| mass / volume)
    }

    /// Adds `flow` integrated over `dt` to this mixture.
    ///
    /// A negative `dt` removes the flow instead.
    /// Substances not yet present are appended; zero contributions are skipped,
    /// so adding an empty flow leaves the mixture untouched.
    pub fn add(&mut self, flow: &MixtureFlow, dt: Time) {
        for SubstanceRate { substance, rate } in flow.rates() {
            let delta = *rate * dt;
            if delta != Mass::ZERO {
                self.insert(substance, delta);
            }
        }
    }

    /// Merges the masses of `other` into this mixture.
    pub fn merge(&mut self, other: &Mixture) {
        for SubstanceState { substance, mass } in &other.states {
            if *mass != Mass::ZERO {
                self.insert(substance, *mass);
            }
        }
    }

    /// Converts a volumetric rate into per-substance mass rates.
    ///
    /// Each present substance flows in proportion to its mass fraction, so the
    /// flow carries the same composition as the mixture.
    /// The returned flow's volume rate equals `rate`.
    /// An empty mixture, or a non-positive `rate`, yields an empty flow.
    #[must_use]
    pub fn flow_at_volume_rate(&self, rate: VolumeRate, fluid: FluidState) -> MixtureFlow {
        let (mass, volume) = self.present_totals();
        if mass <= Mass::ZERO || volume <= Volume::ZERO || rate <= VolumeRate::ZERO {
            return MixtureFlow::empty(fluid);
        }

        let total_rate = rate * (mass / volume);
        MixtureFlow::from_rates(
            self.present().map(|state| {
                SubstanceRate::new(
                    Arc::clone(&state.substance),
                    total_rate * (state.mass / mass).value,
                )
            }),
            fluid,
        )
    }

    /// Drops negative and zero entries, returning the negative mass discarded.
    ///
    /// Integration may leave tiny negative remainders behind when a tank is
    /// drained exactly; anything beyond rounding noise is logged.
    pub fn clamp_negative(&mut self) -> Mass {
        let discarded = self
            .states
            .iter()
            .filter(|state| state.mass < Mass::ZERO)
            .fold(Mass::ZERO, |acc, state| acc - state.mass);

        self.states.retain(|state| state.mass > Mass::ZERO);

        if discarded.get::<kilogram>() > CLAMP_WARN_THRESHOLD_KG {
            log::warn!(
                "discarded {:.6} kg of negative substance mass",
                discarded.get::<kilogram>()
            );
        }
        discarded
    }

    fn present(&self) -> impl Iterator<Item = &SubstanceState> {
        self.states.iter().filter(|state| state.mass > Mass::ZERO)
    }

    fn present_totals(&self) -> (Mass, Volume) {
        self.present()
            .fold((Mass::ZERO, Volume::ZERO), |(mass, volume), state| {
                (mass + state.mass, volume + state.volume())
            })
    }

    fn insert(&mut self, substance: &Arc<Substance>, mass: Mass) {
        match self
            .states
            .iter_mut()
            .find(|state| state.substance.id() == substance.id())
        {
            Some(state) => state.mass += mass,
            None => self
                .states
                .push(SubstanceState::new(Arc::clone(substance), mass)),
        }
    }
}

impl FromIterator<SubstanceState> for Mixture {
    fn from_iter<I: IntoIterator<Item = SubstanceState>>(iter: I) -> Self {
        let mut mixture = Self::new();
        for SubstanceState { substance, mass } in iter {
            mixture.insert(&substance, mass);
        }
        mixture
    }
}

/// Steps stored contents by a net flow, the explicit Euler update of a tank.
impl StepIntegrable<Time> for Mixture {
    type Derivative = MixtureFlow;

    fn step(&self, derivative: MixtureFlow, delta: Time) -> Self {
        let mut next = self.clone();
        next.add(&derivative, delta);
        next
    }
}
