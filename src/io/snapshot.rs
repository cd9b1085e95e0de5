//! Snapshot collaborator interface
//!
//! A snapshot reader is opened with a spatial mask that limits which
//! particles are read at all, and hands back one dataset per particle type.
//! Datasets read fields on demand; the galaxy never asks for the same field
//! of the same dataset twice.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use crate::error::Result;
use crate::structure::FieldArray;
use crate::units::Quantity3;

/// Rows of each particle type to read from a snapshot.
///
/// A particle type without an entry is read in full.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialMask {
    rows: BTreeMap<String, Vec<Range<usize>>>,
}

impl SpatialMask {
    /// Read every particle of every type
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, species: &str, rows: Vec<Range<usize>>) -> Self {
        self.rows.insert(species.to_string(), rows);
        self
    }

    pub fn rows(&self, species: &str) -> Option<&[Range<usize>]> {
        self.rows.get(species).map(Vec::as_slice)
    }
}

/// Snapshot-wide metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMetadata {
    /// Periodic box lengths; `None` for non-periodic volumes
    pub boxsize: Option<Quantity3>,
    /// Particle types with data in this snapshot, e.g. `gas`, `dark_matter`
    pub present_species: Vec<String>,
}

/// Lazily readable table of one particle type
pub trait ParticleSource {
    /// All readable field names; nested fields use dotted names such as
    /// `element_mass_fractions.carbon`.
    fn field_names(&self) -> Vec<String>;

    /// Read a field for the rows selected by the spatial mask.
    fn read_field(&mut self, name: &str) -> Result<FieldArray>;
}

/// An opened snapshot
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub datasets: BTreeMap<String, Box<dyn ParticleSource>>,
}

/// Opens snapshots under a spatial mask
pub trait SnapshotLoader {
    fn load(&self, path: &Path, mask: &SpatialMask) -> Result<Snapshot>;
}
