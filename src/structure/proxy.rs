//! Per-particle-type lazy field access
//!
//! A [`ParticleTypeProxy`] sits between the galaxy and one particle type of
//! the snapshot. A field is read from the snapshot the first time it is
//! asked for, cut down by the galaxy's extra mask, brought into the current
//! frame by replaying the transform stack, and then cached. The cached
//! value replaces the raw one; later reads never go back to the snapshot.

use std::collections::BTreeMap;

use crate::error::{GalaxyError, Result};
use crate::geometry::{
    CartesianRepresentation, CylindricalRepresentation, CylindricalVelocities,
    SphericalRepresentation, SphericalVelocities,
};
use crate::io::snapshot::ParticleSource;
use crate::processing::{FieldCategories, FieldClassifier, TransformOp};
use crate::structure::galaxy::Frame;
use crate::structure::FieldArray;

/// Snapshot table of one particle type plus the fields loaded from it
struct ParticleDataset {
    source: Box<dyn ParticleSource>,
    slots: BTreeMap<String, FieldArray>,
}

impl ParticleDataset {
    fn loaded(&self, name: &str) -> Option<&FieldArray> {
        self.slots.get(name)
    }
}

/// Kinds of derived representation a proxy memoizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    CartesianCoordinates,
    SphericalCoordinates,
    CylindricalCoordinates,
    CartesianVelocities,
    SphericalVelocities,
    CylindricalVelocities,
}

/// Derived representations, each computed on first use
#[derive(Debug, Default)]
struct Representations {
    cartesian_coordinates: Option<CartesianRepresentation>,
    spherical_coordinates: Option<SphericalRepresentation>,
    cylindrical_coordinates: Option<CylindricalRepresentation>,
    cartesian_velocities: Option<CartesianRepresentation>,
    spherical_velocities: Option<SphericalVelocities>,
    cylindrical_velocities: Option<CylindricalVelocities>,
}

impl Representations {
    fn is_cached(&self, kind: Representation) -> bool {
        match kind {
            Representation::CartesianCoordinates => self.cartesian_coordinates.is_some(),
            Representation::SphericalCoordinates => self.spherical_coordinates.is_some(),
            Representation::CylindricalCoordinates => self.cylindrical_coordinates.is_some(),
            Representation::CartesianVelocities => self.cartesian_velocities.is_some(),
            Representation::SphericalVelocities => self.spherical_velocities.is_some(),
            Representation::CylindricalVelocities => self.cylindrical_velocities.is_some(),
        }
    }

    fn void_all(&mut self) {
        *self = Self::default();
    }

    /// Drop whatever `op` makes stale.
    ///
    /// Velocity forms and the spherical and cylindrical coordinates always
    /// go. Cartesian coordinates survive a boost.
    fn void_after(&mut self, op: &TransformOp) {
        let cartesian_coordinates = self.cartesian_coordinates.take();
        self.void_all();
        if matches!(op, TransformOp::Boost(_)) {
            self.cartesian_coordinates = cartesian_coordinates;
        }
    }
}

/// Lazy, frame-aware accessor for one particle type
pub struct ParticleTypeProxy {
    species: String,
    dataset: ParticleDataset,
    /// Transform categories of every readable field, resolved once
    descriptors: BTreeMap<String, FieldCategories>,
    representations: Representations,
}

impl std::fmt::Debug for ParticleTypeProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleTypeProxy")
            .field("species", &self.species)
            .field("fields", &self.descriptors.keys().collect::<Vec<_>>())
            .field("loaded", &self.dataset.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ParticleTypeProxy {
    pub fn new(
        species: &str,
        source: Box<dyn ParticleSource>,
        classifier: &FieldClassifier,
    ) -> Self {
        let descriptors = source
            .field_names()
            .into_iter()
            .map(|name| {
                let categories = classifier.categories_of(&name);
                (name, categories)
            })
            .collect();
        Self {
            species: species.to_string(),
            dataset: ParticleDataset {
                source,
                slots: BTreeMap::new(),
            },
            descriptors,
            representations: Representations::default(),
        }
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.dataset.slots.contains_key(name)
    }

    pub fn categories(&self, name: &str) -> Result<FieldCategories> {
        self.descriptors
            .get(name)
            .copied()
            .ok_or_else(|| self.not_found(name))
    }

    fn not_found(&self, name: &str) -> GalaxyError {
        GalaxyError::FieldNotFound {
            species: self.species.clone(),
            field: name.to_string(),
        }
    }

    /// Cached value of a field, if it has been loaded
    pub fn loaded_field(&self, name: &str) -> Option<&FieldArray> {
        self.dataset.loaded(name)
    }

    pub(crate) fn loaded_field_mut(&mut self, name: &str) -> Option<&mut FieldArray> {
        self.dataset.slots.get_mut(name)
    }

    /// Store an already masked and transformed value.
    pub(crate) fn store(&mut self, name: &str, value: FieldArray) {
        self.dataset.slots.insert(name.to_string(), value);
    }

    /// Read straight from the snapshot, bypassing mask, transforms and cache.
    pub fn get_raw(&mut self, name: &str) -> Result<FieldArray> {
        if !self.has_field(name) {
            return Err(self.not_found(name));
        }
        self.dataset.source.read_field(name)
    }

    /// Overwrite a field's cached value as is.
    ///
    /// The value is not masked or transformed. Representations derived from
    /// the coordinate or velocity field are dropped when that field is
    /// replaced.
    pub fn set_field(&mut self, name: &str, value: FieldArray, frame: &Frame) -> Result<()> {
        if !self.has_field(name) {
            return Err(self.not_found(name));
        }
        let config = frame.config();
        if name == config.coordinates_dataset_name || name == config.velocities_dataset_name {
            self.representations.void_all();
        }
        self.store(name, value);
        Ok(())
    }

    /// Whether `kind` is memoized and will be returned without recomputing
    pub fn is_cached(&self, kind: Representation) -> bool {
        self.representations.is_cached(kind)
    }

    pub(crate) fn void_derived_representations(&mut self, op: &TransformOp) {
        self.representations.void_after(op);
    }

    /// Field in the current frame, loading it on first access.
    pub fn get_field(&mut self, name: &str, frame: &Frame) -> Result<&FieldArray> {
        let categories = self.categories(name)?;
        if !self.is_loaded(name) {
            let mut data = self.dataset.source.read_field(name)?;
            if let Some(mask) = frame.extra_mask().and_then(|m| m.get(&self.species)) {
                data = data.select(mask, &self.species)?;
            }
            frame
                .transform_stack()
                .replay(name, &mut data, &categories, frame.boxsize())?;
            log::debug!(
                "Loaded {}.{}: {} rows, {} transforms replayed",
                self.species,
                name,
                data.len(),
                if categories.is_neutral() {
                    0
                } else {
                    frame.transform_stack().len()
                }
            );
            self.store(name, data);
        }
        self.dataset.loaded(name).ok_or_else(|| self.not_found(name))
    }

    fn vector_rows<'f>(&'f mut self, name: &str, frame: &Frame) -> Result<&'f FieldArray> {
        let field = self.get_field(name, frame)?;
        if field.as_vectors().is_none() {
            return Err(GalaxyError::NotAVectorField(name.to_string()));
        }
        Ok(field)
    }

    fn cartesian_of(&mut self, name: &str, frame: &Frame) -> Result<CartesianRepresentation> {
        let field = self.vector_rows(name, frame)?;
        // plain units only, cosmology metadata is not carried over
        Ok(CartesianRepresentation::from_rows(
            field.as_vectors().unwrap_or_default(),
            field.units.clone(),
        ))
    }

    pub fn cartesian_coordinates(&mut self, frame: &Frame) -> Result<&CartesianRepresentation> {
        let cart = match self.representations.cartesian_coordinates.take() {
            Some(cart) => cart,
            None => self.cartesian_of(&frame.config().coordinates_dataset_name, frame)?,
        };
        Ok(self.representations.cartesian_coordinates.insert(cart))
    }

    pub fn spherical_coordinates(&mut self, frame: &Frame) -> Result<&SphericalRepresentation> {
        let sph = match self.representations.spherical_coordinates.take() {
            Some(sph) => sph,
            None => SphericalRepresentation::from_cartesian(self.cartesian_coordinates(frame)?),
        };
        Ok(self.representations.spherical_coordinates.insert(sph))
    }

    pub fn cylindrical_coordinates(
        &mut self,
        frame: &Frame,
    ) -> Result<&CylindricalRepresentation> {
        let cyl = match self.representations.cylindrical_coordinates.take() {
            Some(cyl) => cyl,
            None => CylindricalRepresentation::from_cartesian(self.cartesian_coordinates(frame)?),
        };
        Ok(self.representations.cylindrical_coordinates.insert(cyl))
    }

    pub fn cartesian_velocities(&mut self, frame: &Frame) -> Result<&CartesianRepresentation> {
        let cart = match self.representations.cartesian_velocities.take() {
            Some(cart) => cart,
            None => self.cartesian_of(&frame.config().velocities_dataset_name, frame)?,
        };
        Ok(self.representations.cartesian_velocities.insert(cart))
    }

    /// Load coordinates and velocities and return their rows and the
    /// velocity units.
    fn phase_space(
        &mut self,
        frame: &Frame,
    ) -> Result<(&[[f64; 3]], &[[f64; 3]], crate::units::Units)> {
        let config = frame.config();
        self.vector_rows(&config.coordinates_dataset_name, frame)?;
        self.vector_rows(&config.velocities_dataset_name, frame)?;
        let positions = self
            .loaded_field(&config.coordinates_dataset_name)
            .and_then(FieldArray::as_vectors)
            .ok_or_else(|| self.not_found(&config.coordinates_dataset_name))?;
        let velocities = self
            .loaded_field(&config.velocities_dataset_name)
            .ok_or_else(|| self.not_found(&config.velocities_dataset_name))?;
        let rows = velocities
            .as_vectors()
            .ok_or_else(|| GalaxyError::NotAVectorField(config.velocities_dataset_name.clone()))?;
        Ok((positions, rows, velocities.units.clone()))
    }

    pub fn spherical_velocities(&mut self, frame: &Frame) -> Result<&SphericalVelocities> {
        let vels = match self.representations.spherical_velocities.take() {
            Some(vels) => vels,
            None => {
                let (positions, velocities, units) = self.phase_space(frame)?;
                SphericalVelocities::from_rows(positions, velocities, units)
            }
        };
        Ok(self.representations.spherical_velocities.insert(vels))
    }

    pub fn cylindrical_velocities(&mut self, frame: &Frame) -> Result<&CylindricalVelocities> {
        let vels = match self.representations.cylindrical_velocities.take() {
            Some(vels) => vels,
            None => {
                let (positions, velocities, units) = self.phase_space(frame)?;
                CylindricalVelocities::from_rows(positions, velocities, units)
            }
        };
        Ok(self.representations.cylindrical_velocities.insert(vels))
    }
}

/// A particle type of a galaxy, borrowed together with the galaxy's frame
pub struct ParticleView<'a> {
    pub(crate) proxy: &'a mut ParticleTypeProxy,
    pub(crate) frame: &'a Frame,
}

impl<'a> ParticleView<'a> {
    pub fn species(&self) -> &str {
        self.proxy.species()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.proxy.field_names().collect()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.proxy.is_loaded(name)
    }

    pub fn is_cached(&self, kind: Representation) -> bool {
        self.proxy.is_cached(kind)
    }

    /// Number of particles, as seen through the extra mask
    pub fn len(&mut self) -> Result<usize> {
        let ids = self.frame.config().id_particle_dataset_name.clone();
        Ok(self.get_field(&ids)?.len())
    }

    pub fn get_field(&mut self, name: &str) -> Result<&FieldArray> {
        self.proxy.get_field(name, self.frame)
    }

    pub fn get_raw(&mut self, name: &str) -> Result<FieldArray> {
        self.proxy.get_raw(name)
    }

    pub fn set_field(&mut self, name: &str, value: FieldArray) -> Result<()> {
        self.proxy.set_field(name, value, self.frame)
    }

    pub fn cartesian_coordinates(&mut self) -> Result<&CartesianRepresentation> {
        self.proxy.cartesian_coordinates(self.frame)
    }

    pub fn spherical_coordinates(&mut self) -> Result<&SphericalRepresentation> {
        self.proxy.spherical_coordinates(self.frame)
    }

    pub fn cylindrical_coordinates(&mut self) -> Result<&CylindricalRepresentation> {
        self.proxy.cylindrical_coordinates(self.frame)
    }

    pub fn cartesian_velocities(&mut self) -> Result<&CartesianRepresentation> {
        self.proxy.cartesian_velocities(self.frame)
    }

    pub fn spherical_velocities(&mut self) -> Result<&SphericalVelocities> {
        self.proxy.spherical_velocities(self.frame)
    }

    pub fn cylindrical_velocities(&mut self) -> Result<&CylindricalVelocities> {
        self.proxy.cylindrical_velocities(self.frame)
    }
}
