//! Halo catalogue collaborator interface

use std::path::Path;

use crate::error::Result;
use crate::io::snapshot::SpatialMask;
use crate::units::Quantity3;

/// Which catalogue centre defines the galaxy frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CentreType {
    /// Minimum of the gravitational potential
    #[default]
    MinPot,
    /// Most bound particle
    Mbp,
    /// Centre of the gas component
    Gas,
    /// Centre of the stellar component
    Star,
    /// Any other catalogue suffix
    Custom(String),
}

impl CentreType {
    pub fn from_str(s: &str) -> Self {
        match s {
            "minpot" => Self::MinPot,
            "mbp" => Self::Mbp,
            "_gas" | "gas" => Self::Gas,
            "_star" | "star" => Self::Star,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Suffix of the catalogue columns for this centre
    pub fn suffix(&self) -> &str {
        match self {
            Self::MinPot => "minpot",
            Self::Mbp => "mbp",
            Self::Gas => "_gas",
            Self::Star => "_star",
            Self::Custom(s) => s,
        }
    }

    /// Column holding one axis of the centre position, e.g. `xcminpot`
    pub fn position_column(&self, axis: char) -> String {
        format!("{}c{}", axis, self.suffix())
    }

    /// Column holding one axis of the centre velocity, e.g. `vxcminpot`
    pub fn velocity_column(&self, axis: char) -> String {
        format!("v{}c{}", axis, self.suffix())
    }
}

/// Halo catalogue that can locate a halo and its particles
pub trait HaloCatalogue {
    /// Position of the halo centre.
    fn centre(&self, halo_id: usize, centre_type: &CentreType) -> Result<Quantity3>;

    /// Velocity of the halo centre.
    fn velocity_centre(&self, halo_id: usize, centre_type: &CentreType) -> Result<Quantity3>;

    /// Region of `snapshot` to read for this halo.
    fn spatial_mask(&self, halo_id: usize, snapshot: &Path) -> Result<SpatialMask>;

    /// For each particle ID of `species` (as read under the spatial mask),
    /// whether the particle is bound to the halo.
    fn bound_mask(&self, halo_id: usize, species: &str, particle_ids: &[i64])
        -> Result<Vec<bool>>;
}
