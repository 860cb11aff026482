use uom::si::{
    f64::{Acceleration, Length, MassDensity, Pressure, Velocity},
    mass_density::kilogram_per_cubic_meter,
    pressure::pascal,
    velocity::meter_per_second,
};

/// Returns the gauge pressure at `depth` below a free liquid surface.
///
/// Negative depths give negative pressures; callers treat those as vacuum.
#[must_use]
pub fn hydrostatic_pressure(
    density: MassDensity,
    acceleration: Acceleration,
    depth: Length,
) -> Pressure {
    density * acceleration * depth
}

/// Returns the Torricelli efflux speed `√(2|ΔP|/ρ)`, carrying the sign of `delta`.
///
/// A non-positive density yields zero speed.
#[must_use]
pub fn torricelli_speed(delta: Pressure, density: MassDensity) -> Velocity {
    let rho = density.get::<kilogram_per_cubic_meter>();
    if rho <= 0.0 || !rho.is_finite() {
        return Velocity::new::<meter_per_second>(0.0);
    }

    let dp = delta.get::<pascal>();
    let speed = (2.0 * dp.abs() / rho).sqrt();
    Velocity::new::<meter_per_second>(speed.copysign(dp))
}
