//! Galaxy construction options
//!
//! Defines the GalaxyConfig struct that controls how a galaxy is selected
//! from its snapshot and which fields follow frame transformations.

use crate::io::catalogue::CentreType;
use crate::processing::{ExtraMask, FieldClassifier, MaskSpec};

/// Options for [`crate::SwiftGalaxy::new`]
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyConfig {
    // Selection
    pub extra_mask: MaskSpec,

    // Frame
    pub centre_type: CentreType,
    pub auto_recentre: bool,
    pub classifier: FieldClassifier,

    // Schema naming
    pub id_particle_dataset_name: String,
    pub coordinates_dataset_name: String,
    pub velocities_dataset_name: String,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            extra_mask: MaskSpec::None,
            centre_type: CentreType::MinPot,
            auto_recentre: true,
            classifier: FieldClassifier::default(),
            id_particle_dataset_name: "particle_ids".to_string(),
            coordinates_dataset_name: "coordinates".to_string(),
            velocities_dataset_name: "velocities".to_string(),
        }
    }
}

impl GalaxyConfig {
    pub fn with_extra_mask(mut self, mask: ExtraMask) -> Self {
        self.extra_mask = MaskSpec::Explicit(mask);
        self
    }

    pub fn bound_only(mut self) -> Self {
        self.extra_mask = MaskSpec::BoundOnly;
        self
    }

    pub fn with_centre_type(mut self, centre_type: CentreType) -> Self {
        self.centre_type = centre_type;
        self
    }

    pub fn with_auto_recentre(mut self, auto_recentre: bool) -> Self {
        self.auto_recentre = auto_recentre;
        self
    }

    pub fn with_classifier(mut self, classifier: FieldClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Rename the identifier, coordinate and velocity fields for snapshots
    /// that do not use the default schema.
    pub fn with_dataset_names(mut self, ids: &str, coordinates: &str, velocities: &str) -> Self {
        self.id_particle_dataset_name = ids.to_string();
        self.coordinates_dataset_name = coordinates.to_string();
        self.velocities_dataset_name = velocities.to_string();
        self
    }
}
