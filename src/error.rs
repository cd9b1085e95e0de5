//! Error types for galaxy construction and particle field access

use thiserror::Error;

use crate::units::Dimension;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GalaxyError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Particle type '{species}' has no field '{field}'")]
    FieldNotFound { species: String, field: String },

    #[error("Unknown particle type: {0}")]
    UnknownSpecies(String),

    #[error("Mask for '{species}' has length {mask_len}, expected {expected}")]
    MaskLength {
        species: String,
        mask_len: usize,
        expected: usize,
    },

    #[error("Field '{0}' is not a 3-vector field and cannot be transformed")]
    NotAVectorField(String),

    #[error("Cannot convert {from:?} ({from_symbol}) to {to:?} ({to_symbol})")]
    UnitMismatch {
        from: Dimension,
        from_symbol: String,
        to: Dimension,
        to_symbol: String,
    },

    #[error("Box size must be positive and finite, got {0:?}")]
    InvalidBoxSize([f64; 3]),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Catalogue error: {0}")]
    Catalogue(String),

    #[error("Halo {0} not found in catalogue")]
    HaloNotFound(usize),
}

pub type Result<T> = std::result::Result<T, GalaxyError>;
