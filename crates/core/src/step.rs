/// A trait for quantities that advance by a rate over a step.
///
/// The network integrates tank contents with this trait: the contents are the
/// stepped value and the net substance flow is the derivative.
///
/// `Delta` is the independent variable of the step, usually `uom::si::f64::Time`
/// but a plain `f64` works the same way.
pub trait StepIntegrable<Delta> {
    /// The rate of change with respect to `Delta`.
    type Derivative;

    /// Returns the value after applying `derivative` over `delta`.
    #[must_use]
    fn step(&self, derivative: Self::Derivative, delta: Delta) -> Self;
}

/// The derivative type of a [`StepIntegrable`] value.
pub type DerivativeOf<T, Delta> = <T as StepIntegrable<Delta>>::Derivative;
