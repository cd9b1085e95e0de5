//! In-memory snapshot and halo catalogue
//!
//! Both hold plain arrays and answer the collaborator traits from them.
//! The snapshot counts how often each field is read, which makes it easy
//! to check that fields are only fetched once.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use crate::error::{GalaxyError, Result};
use crate::io::catalogue::{CentreType, HaloCatalogue};
use crate::io::snapshot::{ParticleSource, Snapshot, SnapshotLoader, SnapshotMetadata, SpatialMask};
use crate::structure::FieldArray;
use crate::units::{Quantity3, Units};

type ReadLog = Rc<RefCell<BTreeMap<(String, String), usize>>>;

/// Particle tables held in memory
#[derive(Debug, Clone)]
pub struct InMemorySnapshot {
    boxsize: Option<Quantity3>,
    tables: BTreeMap<String, BTreeMap<String, FieldArray>>,
    reads: ReadLog,
}

impl InMemorySnapshot {
    pub fn new(boxsize: Option<Quantity3>) -> Self {
        Self {
            boxsize,
            tables: BTreeMap::new(),
            reads: ReadLog::default(),
        }
    }

    /// Add (or replace) a field of a particle type. The particle type is
    /// created on first use.
    pub fn with_field(mut self, species: &str, name: &str, field: FieldArray) -> Self {
        self.insert_field(species, name, field);
        self
    }

    pub fn insert_field(&mut self, species: &str, name: &str, field: FieldArray) {
        self.tables
            .entry(species.to_string())
            .or_default()
            .insert(name.to_string(), field);
    }

    pub fn metadata(&self) -> SnapshotMetadata {
        SnapshotMetadata {
            boxsize: self.boxsize.clone(),
            present_species: self.tables.keys().cloned().collect(),
        }
    }

    /// How many times `species/field` has been read from any loaded copy
    pub fn read_count(&self, species: &str, field: &str) -> usize {
        self.reads
            .borrow()
            .get(&(species.to_string(), field.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

/// Keep the rows covered by `ranges`, in order.
fn restrict_rows(
    field: &FieldArray,
    ranges: &[std::ops::Range<usize>],
    species: &str,
) -> Result<FieldArray> {
    let mut keep = vec![false; field.len()];
    for range in ranges {
        if range.start > range.end || range.end > keep.len() {
            return Err(GalaxyError::Snapshot(format!(
                "spatial mask rows {:?} out of range for {} {} particles",
                range,
                keep.len(),
                species
            )));
        }
        keep[range.clone()].iter_mut().for_each(|k| *k = true);
    }
    field.clone().select(&keep, species)
}

impl SnapshotLoader for InMemorySnapshot {
    fn load(&self, path: &Path, mask: &SpatialMask) -> Result<Snapshot> {
        log::debug!("Loading in-memory snapshot as {}", path.display());
        let mut datasets: BTreeMap<String, Box<dyn ParticleSource>> = BTreeMap::new();
        for (species, table) in &self.tables {
            let fields = match mask.rows(species) {
                Some(ranges) => table
                    .iter()
                    .map(|(name, field)| {
                        Ok((name.clone(), restrict_rows(field, ranges, species)?))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?,
                None => table.clone(),
            };
            datasets.insert(
                species.clone(),
                Box::new(InMemoryParticles {
                    species: species.clone(),
                    fields,
                    reads: Rc::clone(&self.reads),
                }),
            );
        }
        Ok(Snapshot {
            metadata: self.metadata(),
            datasets,
        })
    }
}

/// One particle type of an [`InMemorySnapshot`]
#[derive(Debug)]
pub struct InMemoryParticles {
    species: String,
    fields: BTreeMap<String, FieldArray>,
    reads: ReadLog,
}

impl ParticleSource for InMemoryParticles {
    fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn read_field(&mut self, name: &str) -> Result<FieldArray> {
        let field = self.fields.get(name).cloned().ok_or_else(|| {
            GalaxyError::Snapshot(format!("no dataset {}/{}", self.species, name))
        })?;
        *self
            .reads
            .borrow_mut()
            .entry((self.species.clone(), name.to_string()))
            .or_insert(0) += 1;
        Ok(field)
    }
}

/// Catalogue entry for one halo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HaloRecord {
    /// Catalogue columns, e.g. `xcminpot` or `vzcmbp`
    pub properties: BTreeMap<String, f64>,
    /// IDs of bound particles, per particle type
    pub bound_ids: BTreeMap<String, Vec<i64>>,
    /// Rows to read for this halo; `None` reads everything
    pub region: Option<SpatialMask>,
}

impl HaloRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_centre(mut self, centre_type: &CentreType, centre: [f64; 3]) -> Self {
        for (axis, value) in ['x', 'y', 'z'].into_iter().zip(centre) {
            self.properties
                .insert(centre_type.position_column(axis), value);
        }
        self
    }

    pub fn with_velocity_centre(mut self, centre_type: &CentreType, vcentre: [f64; 3]) -> Self {
        for (axis, value) in ['x', 'y', 'z'].into_iter().zip(vcentre) {
            self.properties
                .insert(centre_type.velocity_column(axis), value);
        }
        self
    }

    pub fn with_bound_ids(mut self, species: &str, ids: Vec<i64>) -> Self {
        self.bound_ids.insert(species.to_string(), ids);
        self
    }

    pub fn with_region(mut self, region: SpatialMask) -> Self {
        self.region = Some(region);
        self
    }
}

/// Halo catalogue held in memory, indexed by halo position in the list
#[derive(Debug, Clone)]
pub struct InMemoryCatalogue {
    length_units: Units,
    velocity_units: Units,
    halos: Vec<HaloRecord>,
}

impl InMemoryCatalogue {
    pub fn new(length_units: Units, velocity_units: Units) -> Self {
        Self {
            length_units,
            velocity_units,
            halos: Vec::new(),
        }
    }

    pub fn with_halo(mut self, halo: HaloRecord) -> Self {
        self.halos.push(halo);
        self
    }

    fn halo(&self, halo_id: usize) -> Result<&HaloRecord> {
        self.halos
            .get(halo_id)
            .ok_or(GalaxyError::HaloNotFound(halo_id))
    }

    fn vector(&self, halo_id: usize, columns: [String; 3], units: &Units) -> Result<Quantity3> {
        let halo = self.halo(halo_id)?;
        let mut value = [0.0; 3];
        for (v, column) in value.iter_mut().zip(columns.iter()) {
            *v = *halo.properties.get(column).ok_or_else(|| {
                GalaxyError::Catalogue(format!("halo {} has no column {}", halo_id, column))
            })?;
        }
        Ok(Quantity3::new(value, units.clone()))
    }
}

impl HaloCatalogue for InMemoryCatalogue {
    fn centre(&self, halo_id: usize, centre_type: &CentreType) -> Result<Quantity3> {
        let columns = ['x', 'y', 'z'].map(|axis| centre_type.position_column(axis));
        self.vector(halo_id, columns, &self.length_units)
    }

    fn velocity_centre(&self, halo_id: usize, centre_type: &CentreType) -> Result<Quantity3> {
        let columns = ['x', 'y', 'z'].map(|axis| centre_type.velocity_column(axis));
        self.vector(halo_id, columns, &self.velocity_units)
    }

    fn spatial_mask(&self, halo_id: usize, _snapshot: &Path) -> Result<SpatialMask> {
        Ok(self.halo(halo_id)?.region.clone().unwrap_or_default())
    }

    fn bound_mask(
        &self,
        halo_id: usize,
        species: &str,
        particle_ids: &[i64],
    ) -> Result<Vec<bool>> {
        let bound: HashSet<i64> = self
            .halo(halo_id)?
            .bound_ids
            .get(species)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        Ok(particle_ids.iter().map(|id| bound.contains(id)).collect())
    }
}
