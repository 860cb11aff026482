use bulkflow_core::constraint::{Constrained, StrictlyPositive};
use uom::si::f64::MassDensity;

use crate::SubstanceError;

/// Display color as linear RGBA components.
pub type Color = [f32; 4];

/// A physical fluid or bulk material.
///
/// Substances are immutable catalog entries shared by reference between every
/// tank and pipe that carries them. Two substances are the same substance when
/// their ids match.
#[derive(Debug, Clone, PartialEq)]
pub struct Substance {
    id: String,
    display_name: String,
    density: Constrained<MassDensity, StrictlyPositive>,
    color: Color,
}

impl Substance {
    /// Creates a substance with the given id and density.
    ///
    /// The display name defaults to the id and the color to opaque white.
    ///
    /// # Errors
    ///
    /// Returns [`SubstanceError::InvalidDensity`] if `density` is not strictly positive.
    pub fn new(id: impl Into<String>, density: MassDensity) -> Result<Self, SubstanceError> {
        let id = id.into();
        let density = Constrained::new(density).map_err(|source| {
            SubstanceError::InvalidDensity {
                id: id.clone(),
                source,
            }
        })?;

        Ok(Self {
            display_name: id.clone(),
            id,
            density,
            color: [1.0; 4],
        })
    }

    /// Returns the substance with the given display name.
    #[must_use]
    pub fn with_display_name(self, display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..self
        }
    }

    /// Returns the substance with the given display color.
    #[must_use]
    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn density(&self) -> MassDensity {
        self.density.into_inner()
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }
}
