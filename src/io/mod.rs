//! Snapshot and halo catalogue collaborators
//!
//! The galaxy only talks to snapshots and catalogues through the traits
//! defined here. In-memory implementations are provided for data that is
//! already loaded, e.g. arrays handed over from Python.

pub mod catalogue;
pub mod memory;
pub mod snapshot;

pub use catalogue::{CentreType, HaloCatalogue};
pub use memory::{HaloRecord, InMemoryCatalogue, InMemorySnapshot};
pub use snapshot::{ParticleSource, Snapshot, SnapshotLoader, SnapshotMetadata, SpatialMask};
