//! SchemaScope - relational schema explorer backend
//!
//! Loads a schema model, derives its relationships, diagnoses structural
//! problems, keeps named layers of the schema on disk and turns the
//! difference between two layers into migration SQL.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod introspection;
pub mod layer;
pub mod models;
pub mod routes;
pub mod state;
