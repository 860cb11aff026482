use std::{collections::BTreeMap, sync::Arc};

use crate::{Substance, SubstanceError};

/// A registry of substances keyed by id.
///
/// Configuration and saved contents refer to substances by id; the catalog
/// resolves those ids to the shared [`Substance`] definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    substances: BTreeMap<String, Arc<Substance>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a substance and returns the shared handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`SubstanceError::Duplicate`] if the id is already registered.
    pub fn insert(&mut self, substance: Substance) -> Result<Arc<Substance>, SubstanceError> {
        if self.substances.contains_key(substance.id()) {
            return Err(SubstanceError::Duplicate(substance.id().to_owned()));
        }

        let substance = Arc::new(substance);
        self.substances
            .insert(substance.id().to_owned(), Arc::clone(&substance));
        Ok(substance)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Substance>> {
        self.substances.get(id)
    }

    /// Resolves an id to its substance.
    ///
    /// # Errors
    ///
    /// Returns [`SubstanceError::Unknown`] if the id is not registered.
    pub fn resolve(&self, id: &str) -> Result<Arc<Substance>, SubstanceError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| SubstanceError::Unknown(id.to_owned()))
    }

    /// Iterates over the registered substances in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Substance>> {
        self.substances.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.substances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }
}
