//! Cartesian, spherical and cylindrical representations of particle data
//!
//! Angles follow the astronomy convention: `lat` is the elevation above the
//! xy-plane in `[-π/2, π/2]`, `lon` and `phi` are azimuths in `[0, 2π)`.

use std::f64::consts::TAU;

use crate::units::Units;

/// Column-wise view of a 3-vector field with plain units
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianRepresentation {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub units: Units,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SphericalRepresentation {
    pub r: Vec<f64>,
    /// Radians
    pub lat: Vec<f64>,
    /// Radians
    pub lon: Vec<f64>,
    pub units: Units,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CylindricalRepresentation {
    pub rho: Vec<f64>,
    /// Radians
    pub phi: Vec<f64>,
    pub z: Vec<f64>,
    pub units: Units,
}

/// Velocity components along the local spherical unit vectors
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalVelocities {
    pub v_r: Vec<f64>,
    pub v_lat: Vec<f64>,
    pub v_lon: Vec<f64>,
    pub units: Units,
}

/// Velocity components along the local cylindrical unit vectors
#[derive(Debug, Clone, PartialEq)]
pub struct CylindricalVelocities {
    pub v_rho: Vec<f64>,
    pub v_phi: Vec<f64>,
    pub v_z: Vec<f64>,
    pub units: Units,
}

impl CartesianRepresentation {
    pub fn from_rows(rows: &[[f64; 3]], units: Units) -> Self {
        Self {
            x: rows.iter().map(|r| r[0]).collect(),
            y: rows.iter().map(|r| r[1]).collect(),
            z: rows.iter().map(|r| r[2]).collect(),
            units,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Row `i` as an `[x, y, z]` triple
    pub fn row(&self, i: usize) -> [f64; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    /// Interleave back into `[x, y, z]` rows
    pub fn xyz(&self) -> Vec<[f64; 3]> {
        (0..self.len()).map(|i| self.row(i)).collect()
    }
}

fn azimuth(x: f64, y: f64) -> f64 {
    let phi = y.atan2(x);
    if phi < 0.0 {
        // -0.0 and tiny negatives would otherwise round up to TAU
        (phi + TAU) % TAU
    } else {
        phi
    }
}

impl SphericalRepresentation {
    pub fn from_cartesian(cart: &CartesianRepresentation) -> Self {
        let n = cart.len();
        let mut r = Vec::with_capacity(n);
        let mut lat = Vec::with_capacity(n);
        let mut lon = Vec::with_capacity(n);
        for i in 0..n {
            let [x, y, z] = cart.row(i);
            let s = x.hypot(y);
            r.push(s.hypot(z));
            lat.push(z.atan2(s));
            lon.push(azimuth(x, y));
        }
        Self {
            r,
            lat,
            lon,
            units: cart.units.clone(),
        }
    }
}

impl CylindricalRepresentation {
    pub fn from_cartesian(cart: &CartesianRepresentation) -> Self {
        Self {
            rho: (0..cart.len()).map(|i| cart.x[i].hypot(cart.y[i])).collect(),
            phi: (0..cart.len())
                .map(|i| azimuth(cart.x[i], cart.y[i]))
                .collect(),
            z: cart.z.clone(),
            units: cart.units.clone(),
        }
    }
}

impl SphericalVelocities {
    /// Project velocity rows onto the spherical basis at the matching
    /// position rows.
    pub fn from_rows(positions: &[[f64; 3]], velocities: &[[f64; 3]], units: Units) -> Self {
        let n = velocities.len();
        let mut v_r = Vec::with_capacity(n);
        let mut v_lat = Vec::with_capacity(n);
        let mut v_lon = Vec::with_capacity(n);
        for (&[x, y, z], &[vx, vy, vz]) in positions.iter().zip(velocities) {
            let (sin_lat, cos_lat) = z.atan2(x.hypot(y)).sin_cos();
            let (sin_lon, cos_lon) = azimuth(x, y).sin_cos();
            v_r.push(vx * cos_lat * cos_lon + vy * cos_lat * sin_lon + vz * sin_lat);
            v_lat.push(-vx * sin_lat * cos_lon - vy * sin_lat * sin_lon + vz * cos_lat);
            v_lon.push(-vx * sin_lon + vy * cos_lon);
        }
        Self {
            v_r,
            v_lat,
            v_lon,
            units,
        }
    }
}

impl CylindricalVelocities {
    /// Project velocity rows onto the cylindrical basis at the matching
    /// position rows.
    pub fn from_rows(positions: &[[f64; 3]], velocities: &[[f64; 3]], units: Units) -> Self {
        let n = velocities.len();
        let mut v_rho = Vec::with_capacity(n);
        let mut v_phi = Vec::with_capacity(n);
        let mut v_z = Vec::with_capacity(n);
        for (&[x, y, _], &[vx, vy, vz]) in positions.iter().zip(velocities) {
            let (sin_phi, cos_phi) = azimuth(x, y).sin_cos();
            v_rho.push(vx * cos_phi + vy * sin_phi);
            v_phi.push(-vx * sin_phi + vy * cos_phi);
            v_z.push(vz);
        }
        Self {
            v_rho,
            v_phi,
            v_z,
            units,
        }
    }
}
