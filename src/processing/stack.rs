//! Transform stack: the ordered log of frame operations
//!
//! Every translation, boost and rotation applied to a galaxy is appended
//! here. Fields read for the first time replay the whole log, in order,
//! against freshly loaded data, so late-loaded fields end up in the same
//! frame as fields that were already in memory when the transforms
//! happened.

use nalgebra::Matrix3;

use crate::error::{GalaxyError, Result};
use crate::geometry::{apply_rotation, apply_translation, wrap_box};
use crate::processing::classifier::FieldCategories;
use crate::structure::FieldArray;
use crate::units::Quantity3;

/// A single frame operation
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    /// Spatial shift, applied to translatable fields
    Translate(Quantity3),
    /// Velocity-space shift, applied to boostable fields
    Boost(Quantity3),
    /// Rotation in row-vector convention (`x · M`), applied to rotatable fields
    Rotate(Matrix3<f64>),
}

impl TransformOp {
    /// Whether the op acts on a field with these categories
    pub fn applies_to(&self, categories: &FieldCategories) -> bool {
        match self {
            TransformOp::Translate(_) => categories.translatable,
            TransformOp::Boost(_) => categories.boostable,
            TransformOp::Rotate(_) => categories.rotatable,
        }
    }

    /// Fail if `apply` would fail, without touching the field.
    pub fn check(&self, field_name: &str, field: &FieldArray) -> Result<()> {
        if field.as_vectors().is_none() {
            return Err(GalaxyError::NotAVectorField(field_name.to_string()));
        }
        match self {
            TransformOp::Translate(offset) | TransformOp::Boost(offset) => {
                offset.units.conversion_factor(&field.units).map(|_| ())
            }
            TransformOp::Rotate(_) => Ok(()),
        }
    }

    /// Apply to an in-memory 3-vector field.
    pub fn apply(&self, field_name: &str, field: &mut FieldArray) -> Result<()> {
        let units = field.units.clone();
        let rows = field
            .as_vectors_mut()
            .ok_or_else(|| GalaxyError::NotAVectorField(field_name.to_string()))?;
        match self {
            TransformOp::Translate(offset) | TransformOp::Boost(offset) => {
                apply_translation(rows, &offset.value_in(&units)?);
            }
            TransformOp::Rotate(rotmat) => apply_rotation(rows, rotmat),
        }
        Ok(())
    }
}

/// Wrap a position-like field into the periodic box, converting the box
/// size to the field's units. `None` leaves the field alone.
pub fn wrap_field(
    field_name: &str,
    field: &mut FieldArray,
    boxsize: Option<&Quantity3>,
) -> Result<()> {
    let Some(boxsize) = boxsize else {
        return Ok(());
    };
    let lengths = boxsize.value_in(&field.units)?;
    let rows = field
        .as_vectors_mut()
        .ok_or_else(|| GalaxyError::NotAVectorField(field_name.to_string()))?;
    wrap_box(rows, Some(&lengths));
    Ok(())
}

/// Append-only, ordered list of transforms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformStack {
    ops: Vec<TransformOp>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: TransformOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[TransformOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Bring freshly loaded data into the current frame.
    ///
    /// Ops are applied in insertion order to fields whose categories
    /// match. A translatable field is wrapped after every op when a box
    /// size is given, rotations included, so a lazily loaded field agrees
    /// with one that was in memory while `rotate` wrapped it.
    pub fn replay(
        &self,
        field_name: &str,
        field: &mut FieldArray,
        categories: &FieldCategories,
        boxsize: Option<&Quantity3>,
    ) -> Result<()> {
        if categories.is_neutral() {
            return Ok(());
        }
        for op in &self.ops {
            if op.applies_to(categories) {
                op.apply(field_name, field)?;
            }
            if categories.translatable {
                wrap_field(field_name, field, boxsize)?;
            }
        }
        Ok(())
    }
}
