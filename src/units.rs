//! Physical units carried by particle fields
//!
//! Units are a symbol plus a dimension and a scale factor to SI. Only
//! conversions between units of the same dimension are allowed; that is
//! all the transform machinery needs (offsets in kpc applied to Mpc
//! coordinates, km/s boosts applied to m/s velocities, and so on).

use std::ops::Neg;

use crate::error::{GalaxyError, Result};

const METRES_PER_PC: f64 = 3.085_677_581_491_367e16;

/// Physical dimension of a quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Velocity,
    Mass,
    Time,
    Dimensionless,
    Other,
}

/// Unit label with its dimension and SI scale factor
#[derive(Debug, Clone, PartialEq)]
pub struct Units {
    symbol: String,
    dimension: Dimension,
    scale_to_si: f64,
}

impl Units {
    pub fn new(symbol: &str, dimension: Dimension, scale_to_si: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            dimension,
            scale_to_si,
        }
    }

    pub fn mpc() -> Self {
        Self::new("Mpc", Dimension::Length, METRES_PER_PC * 1e6)
    }

    pub fn kpc() -> Self {
        Self::new("kpc", Dimension::Length, METRES_PER_PC * 1e3)
    }

    pub fn pc() -> Self {
        Self::new("pc", Dimension::Length, METRES_PER_PC)
    }

    pub fn km_per_s() -> Self {
        Self::new("km/s", Dimension::Velocity, 1e3)
    }

    pub fn m_per_s() -> Self {
        Self::new("m/s", Dimension::Velocity, 1.0)
    }

    pub fn msun() -> Self {
        Self::new("Msun", Dimension::Mass, 1.988_409_870_698_051e30)
    }

    pub fn dimensionless() -> Self {
        Self::new("dimensionless", Dimension::Dimensionless, 1.0)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Factor that converts a value in `self` into a value in `target`.
    pub fn conversion_factor(&self, target: &Units) -> Result<f64> {
        if self.dimension != target.dimension {
            return Err(GalaxyError::UnitMismatch {
                from: self.dimension,
                from_symbol: self.symbol.clone(),
                to: target.dimension,
                to_symbol: target.symbol.clone(),
            });
        }
        if self.symbol == target.symbol {
            return Ok(1.0);
        }
        Ok(self.scale_to_si / target.scale_to_si)
    }
}

/// Cosmology metadata attached to snapshot fields.
///
/// This is the "extended" part of a field's units: cartesian
/// representations drop it and keep only the plain unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosmoMeta {
    pub comoving: bool,
    pub scale_factor_exponent: f64,
}

/// A 3-vector with units (halo centres, offsets, box sizes)
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity3 {
    pub value: [f64; 3],
    pub units: Units,
}

impl Quantity3 {
    pub fn new(value: [f64; 3], units: Units) -> Self {
        Self { value, units }
    }

    /// Value expressed in `target` units.
    pub fn value_in(&self, target: &Units) -> Result<[f64; 3]> {
        let factor = self.units.conversion_factor(target)?;
        Ok([
            self.value[0] * factor,
            self.value[1] * factor,
            self.value[2] * factor,
        ])
    }
}

impl Neg for Quantity3 {
    type Output = Quantity3;

    fn neg(self) -> Self::Output {
        Quantity3 {
            value: [-self.value[0], -self.value[1], -self.value[2]],
            units: self.units,
        }
    }
}

impl Neg for &Quantity3 {
    type Output = Quantity3;

    fn neg(self) -> Self::Output {
        -self.clone()
    }
}
