//! Galaxy-centric view of one halo in a simulation snapshot
//!
//! A [`SwiftGalaxy`] selects the particles of one halo, optionally narrows
//! them down further with an extra mask, and presents all particle data in
//! a frame that the caller moves around with `translate`, `recentre` and
//! `rotate`. Fields already in memory are transformed in place; fields read
//! later have the whole transform stack replayed on them, so every field of
//! every particle type is always in the same frame.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nalgebra::Matrix3;

use crate::config::GalaxyConfig;
use crate::error::{GalaxyError, Result};
use crate::geometry::{periodic, rotation_matrix};
use crate::io::catalogue::HaloCatalogue;
use crate::io::snapshot::{SnapshotLoader, SnapshotMetadata};
use crate::processing::stack::wrap_field;
use crate::processing::{ExtraMask, MaskSpec, TransformOp, TransformStack};
use crate::structure::proxy::{ParticleTypeProxy, ParticleView};
use crate::structure::FieldArray;
use crate::units::Quantity3;

/// Galaxy state shared, read-only, with every particle type
#[derive(Debug)]
pub struct Frame {
    stack: TransformStack,
    extra_mask: Option<ExtraMask>,
    boxsize: Option<Quantity3>,
    config: GalaxyConfig,
}

impl Frame {
    pub(crate) fn new(
        config: GalaxyConfig,
        extra_mask: Option<ExtraMask>,
        boxsize: Option<Quantity3>,
    ) -> Self {
        Self {
            stack: TransformStack::new(),
            extra_mask,
            boxsize,
            config,
        }
    }

    pub fn transform_stack(&self) -> &TransformStack {
        &self.stack
    }

    pub fn extra_mask(&self) -> Option<&ExtraMask> {
        self.extra_mask.as_ref()
    }

    pub fn boxsize(&self) -> Option<&Quantity3> {
        self.boxsize.as_ref()
    }

    pub fn config(&self) -> &GalaxyConfig {
        &self.config
    }
}

/// One halo of a snapshot in its own reference frame
#[derive(Debug)]
pub struct SwiftGalaxy {
    snapshot_path: PathBuf,
    halo_id: usize,
    frame: Frame,
    proxies: BTreeMap<String, ParticleTypeProxy>,
    species: Vec<String>,
}

impl SwiftGalaxy {
    /// Load a halo from a snapshot.
    ///
    /// The catalogue supplies the halo centre and the region to read; the
    /// loader opens the snapshot restricted to that region. With
    /// `auto_recentre` the galaxy starts centred on the halo in both
    /// position and velocity.
    pub fn new<L, C>(
        snapshot_path: impl AsRef<Path>,
        loader: &L,
        catalogue: &C,
        halo_id: usize,
        config: GalaxyConfig,
    ) -> Result<Self>
    where
        L: SnapshotLoader + ?Sized,
        C: HaloCatalogue + ?Sized,
    {
        let snapshot_path = snapshot_path.as_ref().to_path_buf();
        log::info!(
            "Loading halo {} from {}",
            halo_id,
            snapshot_path.display()
        );

        let centres = if config.auto_recentre {
            let centre = catalogue.centre(halo_id, &config.centre_type)?;
            let vcentre = catalogue.velocity_centre(halo_id, &config.centre_type)?;
            log::debug!(
                "Halo {} centre {:?} {}, velocity {:?} {}",
                halo_id,
                centre.value,
                centre.units.symbol(),
                vcentre.value,
                vcentre.units.symbol()
            );
            Some((centre, vcentre))
        } else {
            None
        };

        let spatial_mask = catalogue.spatial_mask(halo_id, &snapshot_path)?;
        let mut snapshot = loader.load(&snapshot_path, &spatial_mask)?;
        let SnapshotMetadata {
            boxsize,
            present_species,
        } = snapshot.metadata;

        if let Some(boxsize) = &boxsize {
            if !periodic::is_valid_boxsize(&boxsize.value) {
                return Err(GalaxyError::InvalidBoxSize(boxsize.value));
            }
        } else {
            log::info!("Snapshot has no box size, treating it as non-periodic");
        }

        let mut proxies = BTreeMap::new();
        for species in &present_species {
            let source = snapshot.datasets.remove(species).ok_or_else(|| {
                GalaxyError::Snapshot(format!("no particle dataset for {}", species))
            })?;
            proxies.insert(
                species.clone(),
                ParticleTypeProxy::new(species, source, &config.classifier),
            );
        }

        let extra_mask = match &config.extra_mask {
            MaskSpec::None => None,
            MaskSpec::BoundOnly => Some(Self::bound_mask(
                catalogue,
                halo_id,
                &config.id_particle_dataset_name,
                &mut proxies,
            )?),
            MaskSpec::Explicit(mask) => {
                if let Some(unknown) = mask.species().find(|s| !proxies.contains_key(*s)) {
                    return Err(GalaxyError::UnknownSpecies(unknown.to_string()));
                }
                Some(mask.clone())
            }
        };

        let mut galaxy = Self {
            snapshot_path,
            halo_id,
            frame: Frame::new(config, extra_mask, boxsize),
            proxies,
            species: present_species,
        };

        if galaxy.frame.extra_mask.is_some() {
            // only identifiers may be in memory yet; mask them now so every
            // field loaded later has the same length
            let ids = galaxy.frame.config.id_particle_dataset_name.clone();
            for species in galaxy.species.clone() {
                let n = galaxy.particles(&species)?.get_field(&ids)?.len();
                log::debug!("{}: {} particles after extra mask", species, n);
            }
        }

        if let Some((centre, vcentre)) = centres {
            galaxy.recentre(&centre, false)?;
            galaxy.recentre(&vcentre, true)?;
        }

        Ok(galaxy)
    }

    /// Read raw identifiers, ask the catalogue which are bound, and keep
    /// only those identifiers.
    fn bound_mask<C: HaloCatalogue + ?Sized>(
        catalogue: &C,
        halo_id: usize,
        id_name: &str,
        proxies: &mut BTreeMap<String, ParticleTypeProxy>,
    ) -> Result<ExtraMask> {
        let mut mask = ExtraMask::new();
        for (species, proxy) in proxies.iter_mut() {
            let ids = proxy.get_raw(id_name)?;
            let bound = catalogue.bound_mask(
                halo_id,
                species,
                ids.as_integers().ok_or_else(|| {
                    GalaxyError::Configuration(format!(
                        "identifier field {} of {} is not an integer field",
                        id_name, species
                    ))
                })?,
            )?;
            proxy.store(id_name, ids.select(&bound, species)?);
            mask.insert(species, Some(bound));
        }
        Ok(mask)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn halo_id(&self) -> usize {
        self.halo_id
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn config(&self) -> &GalaxyConfig {
        &self.frame.config
    }

    pub fn transform_stack(&self) -> &TransformStack {
        &self.frame.stack
    }

    pub fn extra_mask(&self) -> Option<&ExtraMask> {
        self.frame.extra_mask.as_ref()
    }

    pub fn boxsize(&self) -> Option<&Quantity3> {
        self.frame.boxsize.as_ref()
    }

    /// Particle types present in the snapshot
    pub fn species_names(&self) -> &[String] {
        &self.species
    }

    pub fn particles(&mut self, species: &str) -> Result<ParticleView<'_>> {
        let proxy = self
            .proxies
            .get_mut(species)
            .ok_or_else(|| GalaxyError::UnknownSpecies(species.to_string()))?;
        Ok(ParticleView {
            proxy,
            frame: &self.frame,
        })
    }

    /// Shorthand for `particles(species)?.get_field(name)`
    pub fn field(&mut self, species: &str, name: &str) -> Result<&FieldArray> {
        let proxy = self
            .proxies
            .get_mut(species)
            .ok_or_else(|| GalaxyError::UnknownSpecies(species.to_string()))?;
        proxy.get_field(name, &self.frame)
    }

    /// Shift the frame by `offset`: in position space, or in velocity space
    /// when `velocity` is set.
    pub fn translate(&mut self, offset: &Quantity3, velocity: bool) -> Result<()> {
        let (op, targets): (TransformOp, Vec<String>) = if velocity {
            (
                TransformOp::Boost(offset.clone()),
                self.frame.config.classifier.boostable().map(String::from).collect(),
            )
        } else {
            (
                TransformOp::Translate(offset.clone()),
                self.frame.config.classifier.translatable().map(String::from).collect(),
            )
        };
        if !velocity {
            self.check_wrap()?;
        }
        self.apply_in_place(&op, &targets)?;
        self.push(op);
        if !velocity {
            self.wrap_box()?;
        }
        Ok(())
    }

    /// Move the origin to `new_centre`.
    pub fn recentre(&mut self, new_centre: &Quantity3, velocity: bool) -> Result<()> {
        self.translate(&-new_centre, velocity)
    }

    /// Rotate the frame, given either `(angle, axis)` with the angle in
    /// radians, or a rotation matrix applied as `x · rotmat`.
    pub fn rotate(
        &mut self,
        angle_axis: Option<(f64, [f64; 3])>,
        rotmat: Option<Matrix3<f64>>,
    ) -> Result<()> {
        let rotmat = match (angle_axis, rotmat) {
            (Some((angle, axis)), None) => rotation_matrix(angle, &axis)?,
            (None, Some(rotmat)) => rotmat,
            (Some(_), Some(_)) => {
                return Err(GalaxyError::Configuration(
                    "Provide angle_axis or rotmat to rotate, not both.".to_string(),
                ))
            }
            (None, None) => {
                return Err(GalaxyError::Configuration(
                    "Provide angle_axis or rotmat to rotate.".to_string(),
                ))
            }
        };
        let targets: Vec<String> = self
            .frame
            .config
            .classifier
            .rotatable()
            .map(String::from)
            .collect();
        let op = TransformOp::Rotate(rotmat);
        self.check_wrap()?;
        self.apply_in_place(&op, &targets)?;
        self.push(op);
        // a rotation can carry points out of the box
        self.wrap_box()
    }

    /// Wrap every loaded position-like field into the periodic box.
    pub fn wrap_box(&mut self) -> Result<()> {
        let boxsize = self.frame.boxsize.as_ref();
        for name in self.frame.config.classifier.translatable() {
            for proxy in self.proxies.values_mut() {
                if let Some(field) = proxy.loaded_field_mut(name) {
                    wrap_field(name, field, boxsize)?;
                }
            }
        }
        Ok(())
    }

    /// Fail if `wrap_box` would fail on the fields loaded now.
    fn check_wrap(&self) -> Result<()> {
        let Some(boxsize) = self.frame.boxsize.as_ref() else {
            return Ok(());
        };
        for name in self.frame.config.classifier.translatable() {
            for proxy in self.proxies.values() {
                if let Some(field) = proxy.loaded_field(name) {
                    if field.as_vectors().is_none() {
                        return Err(GalaxyError::NotAVectorField(name.to_string()));
                    }
                    boxsize.value_in(&field.units)?;
                }
            }
        }
        Ok(())
    }

    /// Apply `op` to the loaded fields among `targets`. All fields are
    /// checked before any is changed.
    fn apply_in_place(&mut self, op: &TransformOp, targets: &[String]) -> Result<()> {
        for proxy in self.proxies.values() {
            for name in targets {
                if let Some(field) = proxy.loaded_field(name) {
                    op.check(name, field)?;
                }
            }
        }
        for proxy in self.proxies.values_mut() {
            for name in targets {
                if let Some(field) = proxy.loaded_field_mut(name) {
                    op.apply(name, field)?;
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, op: TransformOp) {
        for proxy in self.proxies.values_mut() {
            proxy.void_derived_representations(&op);
        }
        log::debug!("Transform stack: pushed {:?}", op);
        self.frame.stack.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::matrix_from_rows;
    use crate::io::{CentreType, HaloRecord, InMemoryCatalogue, InMemorySnapshot};
    use crate::processing::FieldClassifier;
    use crate::structure::proxy::Representation;
    use crate::units::Units;
    use std::f64::consts::PI;

    const CARBON: &str = "element_mass_fractions.carbon";

    fn snapshot() -> InMemorySnapshot {
        InMemorySnapshot::new(Some(Quantity3::new([10.0; 3], Units::mpc())))
            .with_field("gas", "particle_ids", FieldArray::integer(vec![1, 2, 3, 4, 5]))
            .with_field(
                "gas",
                "coordinates",
                FieldArray::vector(
                    vec![
                        [6.0, 0.0, 0.0],
                        [1.0, 2.0, 0.0],
                        [0.0, 0.0, 0.0],
                        [-1.0, -1.0, -1.0],
                        [4.0, 4.0, 4.0],
                    ],
                    Units::mpc(),
                ),
            )
            .with_field(
                "gas",
                "velocities",
                FieldArray::vector(
                    vec![
                        [10.0, 0.0, 0.0],
                        [0.0, 0.0, 0.0],
                        [1.0, 1.0, 1.0],
                        [0.0, 5.0, 0.0],
                        [-3.0, 0.0, 0.0],
                    ],
                    Units::km_per_s(),
                ),
            )
            .with_field(
                "gas",
                "masses",
                FieldArray::scalar(vec![1.0, 2.0, 3.0, 4.0, 5.0], Units::msun()),
            )
            .with_field(
                "gas",
                CARBON,
                FieldArray::scalar(vec![0.1, 0.2, 0.3, 0.4, 0.5], Units::dimensionless()),
            )
            .with_field("dark_matter", "particle_ids", FieldArray::integer(vec![10, 11, 12]))
            .with_field(
                "dark_matter",
                "coordinates",
                FieldArray::vector(
                    vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                    Units::mpc(),
                ),
            )
            .with_field(
                "dark_matter",
                "velocities",
                FieldArray::vector(vec![[0.0; 3]; 3], Units::km_per_s()),
            )
    }

    fn catalogue(centre: [f64; 3], vcentre: [f64; 3]) -> InMemoryCatalogue {
        InMemoryCatalogue::new(Units::mpc(), Units::km_per_s()).with_halo(
            HaloRecord::new()
                .with_centre(&CentreType::MinPot, centre)
                .with_velocity_centre(&CentreType::MinPot, vcentre)
                .with_bound_ids("gas", vec![2, 4])
                .with_bound_ids("dark_matter", vec![11]),
        )
    }

    fn galaxy(snap: &InMemorySnapshot, config: GalaxyConfig) -> SwiftGalaxy {
        SwiftGalaxy::new("toy.hdf5", snap, &catalogue([0.0; 3], [0.0; 3]), 0, config).unwrap()
    }

    fn fixed_frame() -> GalaxyConfig {
        GalaxyConfig::default().with_auto_recentre(false)
    }

    fn row(sg: &mut SwiftGalaxy, species: &str, name: &str, i: usize) -> [f64; 3] {
        sg.field(species, name).unwrap().as_vectors().unwrap()[i]
    }

    fn assert_close(a: [f64; 3], b: [f64; 3]) {
        for k in 0..3 {
            assert!((a[k] - b[k]).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    fn mpc(v: [f64; 3]) -> Quantity3 {
        Quantity3::new(v, Units::mpc())
    }

    #[test]
    fn test_construction() {
        let snap = snapshot();
        let sg = galaxy(&snap, fixed_frame());
        assert_eq!(sg.species_names(), &["dark_matter", "gas"]);
        assert_eq!(sg.halo_id(), 0);
        assert_eq!(sg.snapshot_path(), Path::new("toy.hdf5"));
        assert!(sg.transform_stack().is_empty());
        assert!(sg.extra_mask().is_none());
        assert_eq!(sg.boxsize().unwrap().value, [10.0; 3]);
        // nothing is read up front
        assert_eq!(snap.read_count("gas", "coordinates"), 0);
        assert_eq!(snap.read_count("gas", "particle_ids"), 0);
    }

    #[test]
    fn test_wrap_then_translate() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());

        assert_eq!(row(&mut sg, "gas", "coordinates", 0), [6.0, 0.0, 0.0]);
        sg.wrap_box().unwrap();
        assert_eq!(row(&mut sg, "gas", "coordinates", 0), [-4.0, 0.0, 0.0]);
        sg.translate(&mpc([1.0, 1.0, 1.0]), false).unwrap();
        assert_eq!(row(&mut sg, "gas", "coordinates", 0), [-3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_lazy_translate_matches_eager() {
        let snap = snapshot();
        let mut eager = galaxy(&snap, fixed_frame());
        eager.field("gas", "coordinates").unwrap();
        eager.translate(&mpc([1.0, 1.0, 1.0]), false).unwrap();

        let mut lazy = galaxy(&snap, fixed_frame());
        lazy.translate(&mpc([1.0, 1.0, 1.0]), false).unwrap();
        assert!(!lazy.particles("gas").unwrap().is_loaded("coordinates"));

        let a = eager.field("gas", "coordinates").unwrap().clone();
        let b = lazy.field("gas", "coordinates").unwrap().clone();
        assert_eq!(a, b);
        assert_eq!(b.as_vectors().unwrap()[0], [-3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_rotate_half_turn() {
        let snap = snapshot();
        let mut eager = galaxy(&snap, fixed_frame());
        eager.field("gas", "coordinates").unwrap();
        eager.rotate(Some((PI, [0.0, 0.0, 1.0])), None).unwrap();

        let mut lazy = galaxy(&snap, fixed_frame());
        lazy.rotate(Some((PI, [0.0, 0.0, 1.0])), None).unwrap();

        for sg in [&mut eager, &mut lazy] {
            assert_close(row(sg, "gas", "coordinates", 1), [-1.0, -2.0, 0.0]);
            // (6, 0, 0) turns to (-6, 0, 0), which wraps to (4, 0, 0)
            assert_close(row(sg, "gas", "coordinates", 0), [4.0, 0.0, 0.0]);
            assert_close(row(sg, "gas", "velocities", 0), [-10.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_rotate_with_matrix() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        // x -> y under the row-vector convention
        let rotmat = matrix_from_rows(&[[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        sg.rotate(None, Some(rotmat)).unwrap();
        assert_close(row(&mut sg, "dark_matter", "coordinates", 0), [0.0, 1.0, 0.0]);
        assert_close(row(&mut sg, "dark_matter", "coordinates", 1), [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rotate_arguments() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        let identity = Matrix3::identity();

        assert!(matches!(
            sg.rotate(None, None).unwrap_err(),
            GalaxyError::Configuration(_)
        ));
        assert!(matches!(
            sg.rotate(Some((1.0, [0.0, 0.0, 1.0])), Some(identity)).unwrap_err(),
            GalaxyError::Configuration(_)
        ));
        assert!(matches!(
            sg.rotate(Some((1.0, [0.0, 0.0, 0.0])), None).unwrap_err(),
            GalaxyError::Configuration(_)
        ));
        assert!(sg.transform_stack().is_empty());
    }

    #[test]
    fn test_translate_round_trip() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        let before = row(&mut sg, "gas", "coordinates", 3);
        sg.translate(&mpc([0.5, -2.0, 3.0]), false).unwrap();
        sg.translate(&mpc([-0.5, 2.0, -3.0]), false).unwrap();
        assert_close(row(&mut sg, "gas", "coordinates", 3), before);
        assert_eq!(sg.transform_stack().len(), 2);
    }

    #[test]
    fn test_translate_and_boost_are_isolated() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        sg.field("gas", "coordinates").unwrap();
        sg.field("gas", "velocities").unwrap();
        sg.field("gas", "masses").unwrap();

        sg.translate(&mpc([1.0, 0.0, 0.0]), false).unwrap();
        assert_eq!(row(&mut sg, "gas", "velocities", 0), [10.0, 0.0, 0.0]);

        sg.translate(&Quantity3::new([-10.0, 0.0, 0.0], Units::km_per_s()), true)
            .unwrap();
        assert_eq!(row(&mut sg, "gas", "velocities", 0), [0.0, 0.0, 0.0]);
        assert_eq!(row(&mut sg, "gas", "coordinates", 1), [2.0, 2.0, 0.0]);
        assert_eq!(
            sg.field("gas", "masses").unwrap().as_scalars().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0]
        );
        assert_eq!(
            sg.transform_stack().ops()[1],
            TransformOp::Boost(Quantity3::new([-10.0, 0.0, 0.0], Units::km_per_s()))
        );
    }

    #[test]
    fn test_offset_units_converted() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        sg.field("dark_matter", "coordinates").unwrap();
        sg.translate(&Quantity3::new([1000.0, 0.0, 0.0], Units::kpc()), false)
            .unwrap();
        assert_close(row(&mut sg, "dark_matter", "coordinates", 0), [2.0, 0.0, 0.0]);
        // replayed onto a field loaded afterwards
        assert_close(row(&mut sg, "gas", "coordinates", 1), [2.0, 2.0, 0.0]);
    }

    #[test]
    fn test_unit_mismatch_leaves_fields_untouched() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        sg.field("gas", "coordinates").unwrap();
        let err = sg
            .translate(&Quantity3::new([1.0, 0.0, 0.0], Units::km_per_s()), false)
            .unwrap_err();
        assert!(matches!(err, GalaxyError::UnitMismatch { .. }));
        assert_eq!(row(&mut sg, "gas", "coordinates", 1), [1.0, 2.0, 0.0]);
        assert!(sg.transform_stack().is_empty());
    }

    #[test]
    fn test_translate_voids_representations() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        {
            let mut gas = sg.particles("gas").unwrap();
            assert_eq!(gas.spherical_coordinates().unwrap().r[2], 0.0);
            assert_eq!(gas.cylindrical_coordinates().unwrap().z[2], 0.0);
            assert_eq!(gas.cartesian_coordinates().unwrap().z[2], 0.0);
            assert_eq!(gas.spherical_velocities().unwrap().v_r[1], 0.0);
            assert!(gas.is_cached(Representation::SphericalCoordinates));
            assert!(gas.is_cached(Representation::CylindricalCoordinates));
        }

        sg.translate(&mpc([0.0, 0.0, 3.0]), false).unwrap();
        let mut gas = sg.particles("gas").unwrap();
        for kind in [
            Representation::CartesianCoordinates,
            Representation::SphericalCoordinates,
            Representation::CylindricalCoordinates,
            Representation::SphericalVelocities,
        ] {
            assert!(!gas.is_cached(kind), "{:?} kept", kind);
        }
        assert_eq!(gas.spherical_coordinates().unwrap().r[2], 3.0);
        assert_eq!(gas.cylindrical_coordinates().unwrap().z[2], 3.0);
        assert_eq!(gas.cartesian_coordinates().unwrap().z[2], 3.0);
        // row 1 now sits at (1, 2, 3) and still does not move
        assert_eq!(gas.spherical_velocities().unwrap().v_r[1], 0.0);
    }

    #[test]
    fn test_boost_keeps_cartesian_coordinates() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        {
            let mut gas = sg.particles("gas").unwrap();
            gas.cartesian_coordinates().unwrap();
            gas.spherical_coordinates().unwrap();
            assert_eq!(gas.cartesian_velocities().unwrap().x[0], 10.0);
            assert_eq!(gas.cylindrical_velocities().unwrap().v_rho[0], 10.0);
        }

        sg.translate(&Quantity3::new([5.0, 0.0, 0.0], Units::km_per_s()), true)
            .unwrap();
        let mut gas = sg.particles("gas").unwrap();
        assert!(gas.is_cached(Representation::CartesianCoordinates));
        assert!(!gas.is_cached(Representation::SphericalCoordinates));
        assert!(!gas.is_cached(Representation::CartesianVelocities));
        assert!(!gas.is_cached(Representation::CylindricalVelocities));
        assert_eq!(gas.cartesian_velocities().unwrap().x[0], 15.0);
        // row 0 sits at (6, 0, 0), so x is the radial direction
        assert_eq!(gas.cylindrical_velocities().unwrap().v_rho[0], 15.0);
    }

    #[test]
    fn test_rotate_voids_representations() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        let (phi_before, v_phi_before) = {
            let mut gas = sg.particles("gas").unwrap();
            let phi = gas.cylindrical_coordinates().unwrap().phi[1];
            let v_phi = gas.cylindrical_velocities().unwrap().v_phi[3];
            assert_eq!(gas.cartesian_velocities().unwrap().x[0], 10.0);
            (phi, v_phi)
        };

        sg.rotate(Some((PI / 2.0, [0.0, 0.0, 1.0])), None).unwrap();
        let mut gas = sg.particles("gas").unwrap();
        assert!(!gas.is_cached(Representation::CartesianCoordinates));
        assert!(!gas.is_cached(Representation::CartesianVelocities));

        let cyl = gas.cylindrical_coordinates().unwrap();
        assert!((cyl.phi[1] - (phi_before + PI / 2.0)).abs() < 1e-9);
        // rotating about z leaves azimuthal speed alone
        let v_phi = gas.cylindrical_velocities().unwrap().v_phi[3];
        assert!((v_phi - v_phi_before).abs() < 1e-9);
        let cart = gas.cartesian_coordinates().unwrap();
        assert!((cart.x[1] + 2.0).abs() < 1e-9 && (cart.y[1] - 1.0).abs() < 1e-9);
        let vel = gas.cartesian_velocities().unwrap();
        assert!(vel.x[0].abs() < 1e-9 && (vel.y[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_failure_leaves_frame_untouched() {
        let snap = snapshot().with_field(
            "gas",
            "spins",
            FieldArray::vector(vec![[1.0, 0.0, 0.0]; 5], Units::km_per_s()),
        );
        let classifier = FieldClassifier::default().transforms_like_coordinates(["spins"]);
        let mut sg = galaxy(&snap, fixed_frame().with_classifier(classifier));
        sg.field("gas", "coordinates").unwrap();
        sg.field("gas", "spins").unwrap();

        // a box in Mpc cannot wrap a field in km/s
        let err = sg.rotate(Some((PI, [0.0, 0.0, 1.0])), None).unwrap_err();
        assert!(matches!(err, GalaxyError::UnitMismatch { .. }));
        assert!(sg.transform_stack().is_empty());
        assert_eq!(row(&mut sg, "gas", "coordinates", 1), [1.0, 2.0, 0.0]);
        assert_eq!(row(&mut sg, "gas", "spins", 0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_set_field_and_get_raw_through_view() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        sg.translate(&mpc([1.0, 0.0, 0.0]), false).unwrap();

        let mut gas = sg.particles("gas").unwrap();
        let raw = gas.get_raw("coordinates").unwrap();
        assert_eq!(raw.as_vectors().unwrap()[1], [1.0, 2.0, 0.0]);
        assert!(!gas.is_loaded("coordinates"));

        gas.set_field(
            "coordinates",
            FieldArray::vector(vec![[0.5, 0.0, 0.0]; 5], Units::mpc()),
        )
        .unwrap();
        assert_eq!(gas.get_field("coordinates").unwrap().as_vectors().unwrap()[4], [0.5, 0.0, 0.0]);
        assert_eq!(gas.cartesian_coordinates().unwrap().x, vec![0.5; 5]);
        assert_eq!(snap.read_count("gas", "coordinates"), 1);
    }

    #[test]
    fn test_extra_mask() {
        let snap = snapshot();
        let mask = ExtraMask::new().with_species(
            "gas",
            Some(vec![false, true, false, false, true]),
        );
        let mut sg = galaxy(&snap, fixed_frame().with_extra_mask(mask));

        let mut gas = sg.particles("gas").unwrap();
        assert_eq!(gas.len().unwrap(), 2);
        assert_eq!(gas.get_field("coordinates").unwrap().len(), 2);
        assert_eq!(
            gas.get_field("masses").unwrap().as_scalars().unwrap(),
            &[2.0, 5.0]
        );
        assert_eq!(gas.get_field(CARBON).unwrap().len(), 2);
        assert_eq!(sg.particles("dark_matter").unwrap().len().unwrap(), 3);
    }

    #[test]
    fn test_extra_mask_unknown_species() {
        let snap = snapshot();
        let mask = ExtraMask::new().with_species("stars", None);
        let err = SwiftGalaxy::new(
            "toy.hdf5",
            &snap,
            &catalogue([0.0; 3], [0.0; 3]),
            0,
            fixed_frame().with_extra_mask(mask),
        )
        .unwrap_err();
        assert_eq!(err, GalaxyError::UnknownSpecies("stars".to_string()));
    }

    #[test]
    fn test_bound_only() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame().bound_only());

        assert_eq!(
            sg.field("gas", "particle_ids").unwrap().as_integers().unwrap(),
            &[2, 4]
        );
        assert_eq!(
            sg.field("gas", "masses").unwrap().as_scalars().unwrap(),
            &[2.0, 4.0]
        );
        assert_eq!(
            sg.field("dark_matter", "particle_ids").unwrap().as_integers().unwrap(),
            &[11]
        );
        assert_eq!(snap.read_count("gas", "particle_ids"), 1);
        assert_eq!(sg.extra_mask().unwrap().get("dark_matter"), Some(&[false, true, false][..]));
    }

    #[test]
    fn test_auto_recentre() {
        let snap = snapshot();
        let mut sg = SwiftGalaxy::new(
            "toy.hdf5",
            &snap,
            &catalogue([1.0, 2.0, 0.0], [10.0, 0.0, 0.0]),
            0,
            GalaxyConfig::default(),
        )
        .unwrap();

        assert_eq!(sg.transform_stack().len(), 2);
        assert_eq!(row(&mut sg, "gas", "coordinates", 1), [0.0, 0.0, 0.0]);
        assert_eq!(row(&mut sg, "gas", "velocities", 0), [0.0, 0.0, 0.0]);
        assert_eq!(row(&mut sg, "dark_matter", "coordinates", 2), [-1.0, -2.0, 1.0]);
    }

    #[test]
    fn test_custom_dataset_names() {
        let snap = InMemorySnapshot::new(None)
            .with_field("gas", "my_ids", FieldArray::integer(vec![7, 8]))
            .with_field(
                "gas",
                "my_coords",
                FieldArray::vector(vec![[1.0, 0.0, 0.0], [0.0, 3.0, 4.0]], Units::mpc()),
            )
            .with_field(
                "gas",
                "my_vels",
                FieldArray::vector(vec![[0.0, 1.0, 0.0], [0.0; 3]], Units::km_per_s()),
            );
        let classifier = FieldClassifier::empty()
            .transforms_like_coordinates(["my_coords"])
            .transforms_like_velocities(["my_vels"]);
        let config = GalaxyConfig::default()
            .with_classifier(classifier)
            .with_dataset_names("my_ids", "my_coords", "my_vels");
        let mut sg = SwiftGalaxy::new(
            "toy.hdf5",
            &snap,
            &catalogue([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            0,
            config,
        )
        .unwrap();

        let mut gas = sg.particles("gas").unwrap();
        assert_eq!(gas.len().unwrap(), 2);
        assert_eq!(gas.cartesian_coordinates().unwrap().x, vec![0.0, -1.0]);
        assert_eq!(gas.cartesian_velocities().unwrap().y, vec![0.0, -1.0]);
        assert!((gas.spherical_coordinates().unwrap().r[1] - 26.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_dotted_field_names() {
        let snap = snapshot().with_field(
            "gas",
            "extra.offsets",
            FieldArray::vector(vec![[0.0; 3]; 5], Units::mpc()),
        );
        let classifier = FieldClassifier::default().transforms_like_coordinates(["extra.offsets"]);
        let mut sg = galaxy(&snap, fixed_frame().with_classifier(classifier));
        sg.translate(&mpc([1.0, 0.0, 0.0]), false).unwrap();

        assert_eq!(row(&mut sg, "gas", "extra.offsets", 0), [1.0, 0.0, 0.0]);
        assert_eq!(
            sg.field("gas", CARBON).unwrap().as_scalars().unwrap(),
            &[0.1, 0.2, 0.3, 0.4, 0.5]
        );
        assert!(sg.particles("gas").unwrap().field_names().contains(&CARBON));
    }

    #[test]
    fn test_lookup_errors() {
        let snap = snapshot();
        let mut sg = galaxy(&snap, fixed_frame());
        assert_eq!(
            sg.particles("stars").err().unwrap(),
            GalaxyError::UnknownSpecies("stars".to_string())
        );
        assert!(matches!(
            sg.field("gas", "temperatures").unwrap_err(),
            GalaxyError::FieldNotFound { .. }
        ));
        assert!(matches!(
            sg.field("gas", "masses").map(|f| f.len()),
            Ok(5)
        ));
    }

    #[test]
    fn test_construction_errors() {
        let snap = snapshot();
        let err = SwiftGalaxy::new(
            "toy.hdf5",
            &snap,
            &catalogue([0.0; 3], [0.0; 3]),
            4,
            GalaxyConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, GalaxyError::HaloNotFound(4));

        let flat_box = InMemorySnapshot::new(Some(mpc([10.0, 0.0, 10.0])));
        let err = SwiftGalaxy::new(
            "toy.hdf5",
            &flat_box,
            &catalogue([0.0; 3], [0.0; 3]),
            0,
            fixed_frame(),
        )
        .unwrap_err();
        assert_eq!(err, GalaxyError::InvalidBoxSize([10.0, 0.0, 10.0]));
    }

    #[test]
    fn test_no_box_never_wraps() {
        let snap = InMemorySnapshot::new(None).with_field(
            "gas",
            "coordinates",
            FieldArray::vector(vec![[60.0, 0.0, 0.0]], Units::mpc()),
        );
        let mut sg = galaxy(&snap, fixed_frame());
        sg.translate(&mpc([1.0, 0.0, 0.0]), false).unwrap();
        sg.wrap_box().unwrap();
        assert_eq!(row(&mut sg, "gas", "coordinates", 0), [61.0, 0.0, 0.0]);
    }
}
