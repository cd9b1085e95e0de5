//! Extra particle masks applied on top of the spatial pre-selection

use std::collections::BTreeMap;

/// Per-species boolean selection.
///
/// A species that is absent, or mapped to `None`, keeps all its particles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraMask {
    masks: BTreeMap<String, Option<Vec<bool>>>,
}

impl ExtraMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_species(mut self, species: &str, mask: Option<Vec<bool>>) -> Self {
        self.insert(species, mask);
        self
    }

    pub fn insert(&mut self, species: &str, mask: Option<Vec<bool>>) {
        self.masks.insert(species.to_string(), mask);
    }

    /// Selection for `species`, or `None` to keep everything
    pub fn get(&self, species: &str) -> Option<&[bool]> {
        self.masks.get(species).and_then(|m| m.as_deref())
    }

    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.masks.keys().map(String::as_str)
    }
}

/// How the extra mask of a galaxy is chosen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MaskSpec {
    /// Keep every particle in the spatial pre-selection
    #[default]
    None,
    /// Keep only particles the halo catalogue reports as bound
    BoundOnly,
    /// User-supplied selection
    Explicit(ExtraMask),
}

impl MaskSpec {
    /// Parse the string marker form used by the Python bindings
    pub fn from_marker(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "bound_only" => Ok(Self::BoundOnly),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "Invalid extra_mask: {}. Must be 'bound_only' or a mask",
                s
            )),
        }
    }
}
