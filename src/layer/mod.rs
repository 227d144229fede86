//! Layer Module
//!
//! Layers are named snapshots of a whole schema, kept on disk so that two
//! versions can be compared later. This module provides:
//! - Layer persistence (file-backed store)
//! - Layer diff engine (base vs draft)
//! - Migration SQL generation from a diff

pub mod diff;
pub mod migration;
pub mod model;
pub mod store;

pub use diff::{ColumnModification, DiffEngine, DiffSummary, SchemaDiff, TableModification};
pub use migration::MigrationGenerator;
pub use model::{Layer, LayerDraft, LayerSummary};
pub use store::LayerStore;
