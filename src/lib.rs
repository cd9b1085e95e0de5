//! SWIFTGalaxy
//!
//! Galaxy-centric access to particle data of one halo in a cosmological
//! simulation snapshot. Fields are read lazily, masked, and kept in a frame
//! that follows every translation, boost and rotation applied to the galaxy.

pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod processing;
pub mod structure;
pub mod units;

#[cfg(feature = "python")]
mod py_galaxy;

pub use config::GalaxyConfig;
pub use error::{GalaxyError, Result};
pub use io::{CentreType, HaloCatalogue, ParticleSource, SnapshotLoader, SpatialMask};
pub use processing::{ExtraMask, FieldClassifier, MaskSpec, TransformOp, TransformStack};
pub use structure::galaxy::{Frame, SwiftGalaxy};
pub use structure::proxy::{ParticleTypeProxy, ParticleView, Representation};
pub use structure::{FieldArray, FieldValues};
pub use units::{CosmoMeta, Quantity3, Units};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module
#[cfg(feature = "python")]
#[pymodule]
fn _swiftgalaxy(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<py_galaxy::PySwiftGalaxy>()?;

    Ok(())
}
