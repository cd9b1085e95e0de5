//! Field classification by transform category
//!
//! Each field name is looked up in three sets: fields that move with
//! spatial translations, fields that move with velocity boosts, and fields
//! that turn with rotations. Names are atomic keys, so a nested field such
//! as `element_mass_fractions.carbon` is only matched by that exact string,
//! never by its group name or a prefix.

use std::collections::BTreeSet;

use crate::units::Units;

/// Transform categories a field belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCategories {
    pub translatable: bool,
    pub boostable: bool,
    pub rotatable: bool,
}

impl FieldCategories {
    /// True for fields no transform ever touches (masses, temperatures, ...)
    pub fn is_neutral(&self) -> bool {
        !(self.translatable || self.boostable || self.rotatable)
    }
}

/// Name sets deciding which transforms apply to which fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldClassifier {
    translatable: BTreeSet<String>,
    boostable: BTreeSet<String>,
    rotatable: BTreeSet<String>,
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::empty()
            .transforms_like_coordinates(["coordinates"])
            .transforms_like_velocities(["velocities"])
    }
}

impl FieldClassifier {
    /// A classifier that leaves every field untouched
    pub fn empty() -> Self {
        Self {
            translatable: BTreeSet::new(),
            boostable: BTreeSet::new(),
            rotatable: BTreeSet::new(),
        }
    }

    pub fn with_translatable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translatable.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_boostable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boostable.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_rotatable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rotatable.extend(names.into_iter().map(Into::into));
        self
    }

    /// Position-like fields: translated and rotated.
    pub fn transforms_like_coordinates<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.with_translatable(names.clone()).with_rotatable(names)
    }

    /// Velocity-like fields: boosted and rotated.
    pub fn transforms_like_velocities<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.with_boostable(names.clone()).with_rotatable(names)
    }

    pub fn categories_of(&self, field_name: &str) -> FieldCategories {
        FieldCategories {
            translatable: self.translatable.contains(field_name),
            boostable: self.boostable.contains(field_name),
            rotatable: self.rotatable.contains(field_name),
        }
    }

    /// Units for a field given without any: length units if it translates,
    /// velocity units if it boosts, dimensionless otherwise.
    pub fn field_units(&self, field_name: &str, length: &Units, velocity: &Units) -> Units {
        let categories = self.categories_of(field_name);
        if categories.translatable {
            length.clone()
        } else if categories.boostable {
            velocity.clone()
        } else {
            Units::dimensionless()
        }
    }

    pub fn translatable(&self) -> impl Iterator<Item = &str> {
        self.translatable.iter().map(String::as_str)
    }

    pub fn boostable(&self) -> impl Iterator<Item = &str> {
        self.boostable.iter().map(String::as_str)
    }

    pub fn rotatable(&self) -> impl Iterator<Item = &str> {
        self.rotatable.iter().map(String::as_str)
    }
}
