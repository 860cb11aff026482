use std::f64::consts::PI;

use bulkflow_core::constraint::{Constrained, ConstraintError, StrictlyPositive, UnitInterval};
use nalgebra::{Point3, Unit, Vector3};
use uom::si::{f64::Length, length::meter};

/// The interior shape of a container, expressed in the container's own frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum Geometry {
    /// A sphere centred on the container origin.
    Sphere {
        radius: Constrained<Length, StrictlyPositive>,
    },
}

impl Geometry {
    /// Creates a spherical geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if `radius` is not strictly positive.
    pub fn sphere(radius: Length) -> Result<Self, ConstraintError> {
        Ok(Self::Sphere {
            radius: Constrained::new(radius)?,
        })
    }

    /// Returns the height of the liquid column measured from the lowest point.
    #[must_use]
    pub fn liquid_height(&self, fill: Constrained<f64, UnitInterval>) -> Length {
        match self {
            Self::Sphere { radius } => *radius.as_ref() * truncated_sphere_height(fill.into_inner()),
        }
    }

    /// Returns how far `position` lies below the liquid surface.
    ///
    /// The liquid settles along `down`, the direction of the local acceleration.
    /// A result of zero or less means the point is in the ullage above the
    /// surface (or outside a dry tank).
    #[must_use]
    pub fn depth_below_surface(
        &self,
        position: &Point3<f64>,
        down: &Unit<Vector3<f64>>,
        fill: Constrained<f64, UnitInterval>,
    ) -> Length {
        match self {
            Self::Sphere { radius } => {
                let r = radius.as_ref().get::<meter>();
                let height = self.liquid_height(fill).get::<meter>();

                // Signed distance from the centre to the surface plane along `down`.
                let surface = r - height;
                Length::new::<meter>(position.coords.dot(down) - surface)
            }
        }
    }
}

/// Returns the cap height of a unit-radius sphere filled to `fill`.
///
/// Inverts the spherical-cap volume in closed form: with `V = fill · 4π/3`,
/// `A = 1 − 3V/(2π)` and `h = √3·sin(acos(A)/3) − cos(acos(A)/3) + 1`.
/// The fill fraction is clamped to `[0, 1]`, so the result lies in `[0, 2]`.
///
/// ```
/// use bulkflow_network::truncated_sphere_height;
///
/// assert_eq!(truncated_sphere_height(0.0), 0.0);
/// assert!((truncated_sphere_height(0.5) - 1.0).abs() < 1e-12);
/// assert!((truncated_sphere_height(1.0) - 2.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn truncated_sphere_height(fill: f64) -> f64 {
    let fill = UnitInterval::clamped(fill).into_inner();
    let volume = fill * 4.0 * PI / 3.0;
    let a = (1.0 - 3.0 * volume / (2.0 * PI)).clamp(-1.0, 1.0);
    let third = a.acos() / 3.0;

    3.0_f64.sqrt() * third.sin() - third.cos() + 1.0
}
