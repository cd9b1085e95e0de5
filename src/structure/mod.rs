//! Core data structures for particle fields
//!
//! A particle field is one column of a particle-type table: a row per
//! particle, either a 3-vector (coordinates, velocities, ...), a scalar
//! (masses, temperatures, ...) or an integer (particle IDs).

pub mod galaxy;
pub mod proxy;

use crate::error::{GalaxyError, Result};
use crate::units::{CosmoMeta, Units};

/// Per-particle values of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    Vector(Vec<[f64; 3]>),
    Scalar(Vec<f64>),
    Integer(Vec<i64>),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Vector(v) => v.len(),
            FieldValues::Scalar(v) => v.len(),
            FieldValues::Integer(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A particle field with its units
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    pub values: FieldValues,
    pub units: Units,
    /// Extended unit metadata, if the field came from a cosmological snapshot
    pub cosmo: Option<CosmoMeta>,
}

impl FieldArray {
    pub fn vector(values: Vec<[f64; 3]>, units: Units) -> Self {
        Self {
            values: FieldValues::Vector(values),
            units,
            cosmo: None,
        }
    }

    pub fn scalar(values: Vec<f64>, units: Units) -> Self {
        Self {
            values: FieldValues::Scalar(values),
            units,
            cosmo: None,
        }
    }

    pub fn integer(values: Vec<i64>) -> Self {
        Self {
            values: FieldValues::Integer(values),
            units: Units::dimensionless(),
            cosmo: None,
        }
    }

    pub fn with_cosmo(mut self, cosmo: CosmoMeta) -> Self {
        self.cosmo = Some(cosmo);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_vectors(&self) -> Option<&[[f64; 3]]> {
        match &self.values {
            FieldValues::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vectors_mut(&mut self) -> Option<&mut [[f64; 3]]> {
        match &mut self.values {
            FieldValues::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_scalars(&self) -> Option<&[f64]> {
        match &self.values {
            FieldValues::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integers(&self) -> Option<&[i64]> {
        match &self.values {
            FieldValues::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Keep only the rows where `mask` is true.
    ///
    /// `species` is only used to label the error when the mask length does
    /// not match the number of rows.
    pub fn select(self, mask: &[bool], species: &str) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(GalaxyError::MaskLength {
                species: species.to_string(),
                mask_len: mask.len(),
                expected: self.len(),
            });
        }
        let values = match self.values {
            FieldValues::Vector(v) => FieldValues::Vector(keep_rows(v, mask)),
            FieldValues::Scalar(v) => FieldValues::Scalar(keep_rows(v, mask)),
            FieldValues::Integer(v) => FieldValues::Integer(keep_rows(v, mask)),
        };
        Ok(Self {
            values,
            units: self.units,
            cosmo: self.cosmo,
        })
    }
}

fn keep_rows<T>(rows: Vec<T>, mask: &[bool]) -> Vec<T> {
    rows.into_iter()
        .zip(mask.iter())
        .filter_map(|(row, &keep)| keep.then_some(row))
        .collect()
}
