#![allow(clippy::useless_conversion)]
#![allow(clippy::too_many_arguments)]

use numpy::{PyArray1, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyString};

use crate::geometry::matrix_from_rows;
use crate::io::{CentreType, HaloRecord, InMemoryCatalogue, InMemorySnapshot};
use crate::processing::{ExtraMask, FieldClassifier, MaskSpec};
use crate::structure::{FieldArray, FieldValues};
use crate::{GalaxyConfig, GalaxyError, Quantity3, SwiftGalaxy, Units};

const IN_MEMORY_PATH: &str = "<in-memory>";

fn to_py_err(e: GalaxyError) -> PyErr {
    match e {
        GalaxyError::FieldNotFound { .. } | GalaxyError::UnknownSpecies(_) => {
            PyKeyError::new_err(e.to_string())
        }
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn parse_units(symbol: &str) -> PyResult<Units> {
    match symbol {
        "Mpc" => Ok(Units::mpc()),
        "kpc" => Ok(Units::kpc()),
        "pc" => Ok(Units::pc()),
        "km/s" => Ok(Units::km_per_s()),
        "m/s" => Ok(Units::m_per_s()),
        _ => Err(PyValueError::new_err(format!(
            "Unsupported units: {}. Must be one of Mpc, kpc, pc, km/s, m/s",
            symbol
        ))),
    }
}

/// Convert a NumPy array into a field: (N, 3) floats become vectors,
/// 1-D integers become integers and 1-D floats become scalars.
fn field_from_numpy(value: &Bound<'_, PyAny>, name: &str, units: Units) -> PyResult<FieldArray> {
    if let Ok(arr) = value.extract::<PyReadonlyArray2<f64>>() {
        let view = arr.as_array();
        if view.ncols() != 3 {
            return Err(PyValueError::new_err(format!(
                "Field {} must have shape (N, 3), got {:?}",
                name,
                view.shape()
            )));
        }
        let rows = view.rows().into_iter().map(|r| [r[0], r[1], r[2]]).collect();
        return Ok(FieldArray::vector(rows, units));
    }
    if let Ok(arr) = value.extract::<PyReadonlyArray1<i64>>() {
        return Ok(FieldArray::integer(arr.as_array().to_vec()));
    }
    if let Ok(arr) = value.extract::<PyReadonlyArray1<f64>>() {
        return Ok(FieldArray::scalar(arr.as_array().to_vec(), units));
    }
    Err(PyValueError::new_err(format!(
        "Field {} must be a float64 (N, 3) array, or a 1-D int64 or float64 array",
        name
    )))
}

fn field_to_numpy(py: Python<'_>, field: &FieldArray) -> PyResult<PyObject> {
    match &field.values {
        FieldValues::Vector(rows) => {
            let flat: Vec<f64> = rows.iter().flatten().copied().collect();
            let arr = PyArray1::from_vec_bound(py, flat).reshape((rows.len(), 3))?;
            Ok(arr.into_py(py))
        }
        FieldValues::Scalar(values) => Ok(PyArray1::from_slice_bound(py, values).into_py(py)),
        FieldValues::Integer(values) => Ok(PyArray1::from_slice_bound(py, values).into_py(py)),
    }
}

fn columns_to_dict(
    py: Python<'_>,
    columns: &[(&str, &[f64])],
    units: &Units,
) -> PyResult<PyObject> {
    let dict = PyDict::new_bound(py);
    for (name, values) in columns {
        dict.set_item(*name, PyArray1::from_slice_bound(py, values))?;
    }
    dict.set_item("units", units.symbol())?;
    Ok(dict.into_py(py))
}

fn extra_mask_from_py(obj: Option<&Bound<'_, PyAny>>) -> PyResult<MaskSpec> {
    let Some(obj) = obj else {
        return Ok(MaskSpec::None);
    };
    if obj.is_none() {
        return Ok(MaskSpec::None);
    }
    if let Ok(marker) = obj.downcast::<PyString>() {
        return MaskSpec::from_marker(&marker.to_string()).map_err(PyValueError::new_err);
    }
    let masks = obj.downcast::<PyDict>()?;
    let mut extra = ExtraMask::new();
    for (species, mask) in masks.iter() {
        let species: String = species.extract()?;
        let mask = if mask.is_none() {
            None
        } else {
            Some(mask.extract::<PyReadonlyArray1<bool>>()?.as_array().to_vec())
        };
        extra.insert(&species, mask);
    }
    Ok(MaskSpec::Explicit(extra))
}

/// Galaxy over particle arrays handed over from Python
#[pyclass(name = "SWIFTGalaxy", unsendable)]
pub struct PySwiftGalaxy {
    inner: SwiftGalaxy,
    length_units: Units,
    velocity_units: Units,
}

#[pymethods]
impl PySwiftGalaxy {
    #[new]
    #[pyo3(signature = (
        particles,
        centre=None,
        velocity_centre=None,
        boxsize=None,
        length_units="Mpc",
        velocity_units="km/s",
        extra_mask=None,
        bound_ids=None,
        auto_recentre=true,
        transforms_like_coordinates=None,
        transforms_like_velocities=None,
        id_particle_dataset_name="particle_ids",
        coordinates_dataset_name="coordinates",
        velocities_dataset_name="velocities",
    ))]
    pub fn new(
        particles: &Bound<'_, PyDict>,
        centre: Option<[f64; 3]>,
        velocity_centre: Option<[f64; 3]>,
        boxsize: Option<[f64; 3]>,
        length_units: &str,
        velocity_units: &str,
        extra_mask: Option<&Bound<'_, PyAny>>,
        bound_ids: Option<&Bound<'_, PyDict>>,
        auto_recentre: bool,
        transforms_like_coordinates: Option<Vec<String>>,
        transforms_like_velocities: Option<Vec<String>>,
        id_particle_dataset_name: &str,
        coordinates_dataset_name: &str,
        velocities_dataset_name: &str,
    ) -> PyResult<Self> {
        let length_units = parse_units(length_units)?;
        let velocity_units = parse_units(velocity_units)?;

        let classifier = FieldClassifier::empty()
            .transforms_like_coordinates(
                transforms_like_coordinates
                    .unwrap_or_else(|| vec![coordinates_dataset_name.to_string()]),
            )
            .transforms_like_velocities(
                transforms_like_velocities
                    .unwrap_or_else(|| vec![velocities_dataset_name.to_string()]),
            );

        let mut snapshot = InMemorySnapshot::new(
            boxsize.map(|b| Quantity3::new(b, length_units.clone())),
        );
        for (species, fields) in particles.iter() {
            let species: String = species.extract()?;
            for (name, value) in fields.downcast::<PyDict>()?.iter() {
                let name: String = name.extract()?;
                let units = classifier.field_units(&name, &length_units, &velocity_units);
                snapshot.insert_field(&species, &name, field_from_numpy(&value, &name, units)?);
            }
        }

        if auto_recentre && (centre.is_none() || velocity_centre.is_none()) {
            return Err(PyValueError::new_err(
                "auto_recentre requires centre and velocity_centre",
            ));
        }
        let mut halo = HaloRecord::new()
            .with_centre(&CentreType::MinPot, centre.unwrap_or_default())
            .with_velocity_centre(&CentreType::MinPot, velocity_centre.unwrap_or_default());
        if let Some(bound_ids) = bound_ids {
            for (species, ids) in bound_ids.iter() {
                halo = halo.with_bound_ids(&species.extract::<String>()?, ids.extract()?);
            }
        }
        let catalogue =
            InMemoryCatalogue::new(length_units.clone(), velocity_units.clone()).with_halo(halo);

        let config = GalaxyConfig {
            extra_mask: extra_mask_from_py(extra_mask)?,
            centre_type: CentreType::MinPot,
            auto_recentre,
            classifier,
            id_particle_dataset_name: id_particle_dataset_name.to_string(),
            coordinates_dataset_name: coordinates_dataset_name.to_string(),
            velocities_dataset_name: velocities_dataset_name.to_string(),
        };

        let inner = SwiftGalaxy::new(IN_MEMORY_PATH, &snapshot, &catalogue, 0, config)
            .map_err(to_py_err)?;
        Ok(Self {
            inner,
            length_units,
            velocity_units,
        })
    }

    /// Particle types present in the galaxy
    pub fn species_names(&self) -> Vec<String> {
        self.inner.species_names().to_vec()
    }

    pub fn field_names(&mut self, species: &str) -> PyResult<Vec<String>> {
        let view = self.inner.particles(species).map_err(to_py_err)?;
        let names = view.field_names().into_iter().map(String::from).collect();
        Ok(names)
    }

    pub fn get_field(&mut self, py: Python<'_>, species: &str, name: &str) -> PyResult<PyObject> {
        let field = self.inner.field(species, name).map_err(to_py_err)?;
        field_to_numpy(py, field)
    }

    /// Replace a field's current value. The array is taken as already
    /// masked and in the current frame.
    pub fn set_field(
        &mut self,
        species: &str,
        name: &str,
        value: &Bound<'_, PyAny>,
    ) -> PyResult<()> {
        let units = self.inner.config().classifier.field_units(
            name,
            &self.length_units,
            &self.velocity_units,
        );
        let field = field_from_numpy(value, name, units)?;
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        view.set_field(name, field).map_err(to_py_err)
    }

    /// Field as stored in the snapshot, without mask or transforms
    pub fn get_raw(&mut self, py: Python<'_>, species: &str, name: &str) -> PyResult<PyObject> {
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        let raw = view.get_raw(name).map_err(to_py_err)?;
        field_to_numpy(py, &raw)
    }

    #[pyo3(signature = (offset, velocity=false))]
    pub fn translate(&mut self, offset: [f64; 3], velocity: bool) -> PyResult<()> {
        let units = if velocity {
            self.velocity_units.clone()
        } else {
            self.length_units.clone()
        };
        self.inner
            .translate(&Quantity3::new(offset, units), velocity)
            .map_err(to_py_err)
    }

    #[pyo3(signature = (new_centre, velocity=false))]
    pub fn recentre(&mut self, new_centre: [f64; 3], velocity: bool) -> PyResult<()> {
        self.translate([-new_centre[0], -new_centre[1], -new_centre[2]], velocity)
    }

    #[pyo3(signature = (angle_axis=None, rotmat=None))]
    pub fn rotate(
        &mut self,
        angle_axis: Option<(f64, [f64; 3])>,
        rotmat: Option<[[f64; 3]; 3]>,
    ) -> PyResult<()> {
        self.inner
            .rotate(angle_axis, rotmat.as_ref().map(matrix_from_rows))
            .map_err(to_py_err)
    }

    pub fn wrap_box(&mut self) -> PyResult<()> {
        self.inner.wrap_box().map_err(to_py_err)
    }

    pub fn cartesian_coordinates(&mut self, py: Python<'_>, species: &str) -> PyResult<PyObject> {
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        let c = view.cartesian_coordinates().map_err(to_py_err)?;
        columns_to_dict(
            py,
            &[
                ("x", c.x.as_slice()),
                ("y", c.y.as_slice()),
                ("z", c.z.as_slice()),
            ],
            &c.units,
        )
    }

    pub fn spherical_coordinates(&mut self, py: Python<'_>, species: &str) -> PyResult<PyObject> {
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        let s = view.spherical_coordinates().map_err(to_py_err)?;
        columns_to_dict(
            py,
            &[
                ("r", s.r.as_slice()),
                ("lat", s.lat.as_slice()),
                ("lon", s.lon.as_slice()),
            ],
            &s.units,
        )
    }

    pub fn cylindrical_coordinates(
        &mut self,
        py: Python<'_>,
        species: &str,
    ) -> PyResult<PyObject> {
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        let c = view.cylindrical_coordinates().map_err(to_py_err)?;
        columns_to_dict(
            py,
            &[
                ("rho", c.rho.as_slice()),
                ("phi", c.phi.as_slice()),
                ("z", c.z.as_slice()),
            ],
            &c.units,
        )
    }

    pub fn cartesian_velocities(&mut self, py: Python<'_>, species: &str) -> PyResult<PyObject> {
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        let c = view.cartesian_velocities().map_err(to_py_err)?;
        columns_to_dict(
            py,
            &[
                ("x", c.x.as_slice()),
                ("y", c.y.as_slice()),
                ("z", c.z.as_slice()),
            ],
            &c.units,
        )
    }

    pub fn spherical_velocities(&mut self, py: Python<'_>, species: &str) -> PyResult<PyObject> {
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        let s = view.spherical_velocities().map_err(to_py_err)?;
        columns_to_dict(
            py,
            &[
                ("v_r", s.v_r.as_slice()),
                ("v_lat", s.v_lat.as_slice()),
                ("v_lon", s.v_lon.as_slice()),
            ],
            &s.units,
        )
    }

    pub fn cylindrical_velocities(
        &mut self,
        py: Python<'_>,
        species: &str,
    ) -> PyResult<PyObject> {
        let mut view = self.inner.particles(species).map_err(to_py_err)?;
        let c = view.cylindrical_velocities().map_err(to_py_err)?;
        columns_to_dict(
            py,
            &[
                ("v_rho", c.v_rho.as_slice()),
                ("v_phi", c.v_phi.as_slice()),
                ("v_z", c.v_z.as_slice()),
            ],
            &c.units,
        )
    }

    pub fn __repr__(&self) -> String {
        format!(
            "SWIFTGalaxy(species={:?}, transforms={})",
            self.inner.species_names(),
            self.inner.transform_stack().len()
        )
    }
}
