//! Schema diagnostics
//!
//! Flags structural weaknesses in a schema: orphan tables, circular
//! foreign key chains, foreign keys whose column types disagree with their
//! target, and foreign key columns without an index. Every table also gets
//! a 0-100 health score.

pub mod analyzer;
pub mod cycles;
pub mod type_compat;

pub use analyzer::SchemaAnalyzer;

use serde::Serialize;

pub const MISSING_INDEX_REASON: &str = "Foreign key column not indexed";

/// Complete diagnostic report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub orphan_tables: Vec<String>,
    pub circular_dependencies: Vec<Vec<String>>,
    pub type_mismatches: Vec<TypeMismatch>,
    pub missing_indexes: Vec<MissingIndex>,
    pub health_scores: Vec<TableHealth>,
    pub summary: DiagnosticSummary,
}

/// Foreign key whose column type differs from the referenced column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMismatch {
    pub table: String,
    pub column: String,
    pub column_type: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub referenced_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingIndex {
    pub table: String,
    pub column: String,
    pub reason: String,
}

/// Which findings touched a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFactors {
    pub indexed_fks: bool,
    pub cycles: bool,
    pub orphans: bool,
    pub type_mismatch: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableHealth {
    pub table: String,
    /// Always within 0..=100
    pub score: u8,
    pub factors: HealthFactors,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSummary {
    pub total_tables: usize,
    pub total_relationships: usize,
    pub total_issues: usize,
    pub average_health: u8,
}
