//! Coordinate transformations applied to particle fields
//!
//! Rotation matrices follow the row-vector convention used throughout the
//! crate: a point `x` (a row) maps to `x · M`. Matrices built from an
//! angle and an axis are the passive (frame) rotation matrices, so that
//! `x · M` turns points actively by `+angle` about the axis.

use nalgebra::{Matrix3, Rotation3, RowVector3, Unit, Vector3};

use crate::error::{GalaxyError, Result};

/// Add a translation vector to every row, in place.
pub fn apply_translation(coords: &mut [[f64; 3]], translation: &[f64; 3]) {
    for coord in coords.iter_mut() {
        coord[0] += translation[0];
        coord[1] += translation[1];
        coord[2] += translation[2];
    }
}

/// Right-multiply every row by `rotmat`, in place.
pub fn apply_rotation(coords: &mut [[f64; 3]], rotmat: &Matrix3<f64>) {
    for coord in coords.iter_mut() {
        let rotated = RowVector3::new(coord[0], coord[1], coord[2]) * rotmat;
        *coord = [rotated[0], rotated[1], rotated[2]];
    }
}

/// Rotation matrix for `angle` (radians) about `axis`.
///
/// The axis does not need to be normalized but must not be zero.
pub fn rotation_matrix(angle: f64, axis: &[f64; 3]) -> Result<Matrix3<f64>> {
    let axis = Unit::try_new(Vector3::new(axis[0], axis[1], axis[2]), f64::EPSILON)
        .ok_or_else(|| {
            GalaxyError::Configuration(format!("rotation axis {:?} has zero length", axis))
        })?;
    let active = Rotation3::from_axis_angle(&axis, angle);
    Ok(active.matrix().transpose())
}

/// Build a matrix from rows, e.g. as handed over by a user.
pub fn matrix_from_rows(rows: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::new(
        rows[0][0], rows[0][1], rows[0][2], //
        rows[1][0], rows[1][1], rows[1][2], //
        rows[2][0], rows[2][1], rows[2][2],
    )
}
