//! Geometry operations on particle coordinates
//!
//! Provides translations and rotations of 3-vector fields, periodic box
//! wrapping, and cartesian/spherical/cylindrical representations.

pub mod periodic;
pub mod representations;
pub mod transforms;

pub use periodic::wrap_box;
pub use representations::{
    CartesianRepresentation, CylindricalRepresentation, CylindricalVelocities,
    SphericalRepresentation, SphericalVelocities,
};
pub use transforms::{apply_rotation, apply_translation, matrix_from_rows, rotation_matrix};
