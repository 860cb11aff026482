use nalgebra::{Point3, Unit, Vector3};

/// Where a pipe or hole meets a container, in the container's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    pub position: Point3<f64>,
    /// Outward direction of the opening.
    pub forward: Unit<Vector3<f64>>,
}

impl Port {
    #[must_use]
    pub fn new(position: Point3<f64>, forward: Unit<Vector3<f64>>) -> Self {
        Self { position, forward }
    }

    /// Creates a port from an unnormalised direction.
    ///
    /// Returns `None` if `forward` is too short to define a direction.
    #[must_use]
    pub fn try_new(position: Point3<f64>, forward: Vector3<f64>) -> Option<Self> {
        Unit::try_new(forward, f64::EPSILON).map(|forward| Self { position, forward })
    }
}
