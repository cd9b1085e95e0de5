//! Field processing: classification, masking and the transform stack

pub mod classifier;
pub mod masking;
pub mod stack;

pub use classifier::{FieldCategories, FieldClassifier};
pub use masking::{ExtraMask, MaskSpec};
pub use stack::{TransformOp, TransformStack};
