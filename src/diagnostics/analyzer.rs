//! Diagnostics analyzer
//!
//! Pure function of its input schema: build the dependency graph once,
//! run every check, then score each table from the findings.

use crate::diagnostics::cycles::find_cycles;
use crate::diagnostics::type_compat::types_compatible;
use crate::diagnostics::{
    DiagnosticResult, DiagnosticSummary, HealthFactors, MissingIndex, TableHealth, TypeMismatch,
    MISSING_INDEX_REASON,
};
use crate::graph::DependencyGraph;
use crate::models::{SchemaMetadata, Table};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const ORPHAN_PENALTY: i32 = 20;
const CYCLE_PENALTY: i32 = 15;
const TYPE_MISMATCH_PENALTY: i32 = 25;
const MISSING_INDEX_PENALTY: i32 = 10;
const PRIMARY_KEY_BONUS: i32 = 5;
const INDEX_COVERAGE_BONUS: i32 = 5;

pub struct SchemaAnalyzer<'a> {
    schema: &'a SchemaMetadata,
    graph: DependencyGraph,
    tables: HashMap<&'a str, &'a Table>,
}

impl<'a> SchemaAnalyzer<'a> {
    pub fn new(schema: &'a SchemaMetadata) -> Self {
        Self {
            schema,
            graph: DependencyGraph::from_schema(schema),
            tables: schema
                .tables()
                .iter()
                .map(|t| (t.name.as_str(), t))
                .collect(),
        }
    }

    /// Run all diagnostic checks
    pub fn analyze(&self) -> DiagnosticResult {
        let orphan_tables = self.find_orphan_tables();
        let circular_dependencies = find_cycles(&self.graph);
        let type_mismatches = self.find_type_mismatches();
        let missing_indexes = self.find_missing_indexes();

        debug!(
            "Analyzed {} tables: {} orphans, {} cycles, {} type mismatches, {} missing indexes",
            self.schema.tables().len(),
            orphan_tables.len(),
            circular_dependencies.len(),
            type_mismatches.len(),
            missing_indexes.len()
        );

        let health_scores = self.calculate_health_scores(
            &orphan_tables,
            &circular_dependencies,
            &type_mismatches,
            &missing_indexes,
        );

        let total_issues = orphan_tables.len()
            + circular_dependencies.len()
            + type_mismatches.len()
            + missing_indexes.len();

        let average_health = if health_scores.is_empty() {
            0
        } else {
            let total: u32 = health_scores.iter().map(|h| u32::from(h.score)).sum();
            (f64::from(total) / health_scores.len() as f64).round() as u8
        };

        DiagnosticResult {
            summary: DiagnosticSummary {
                total_tables: self.schema.tables().len(),
                total_relationships: self.schema.relationships().len(),
                total_issues,
                average_health,
            },
            orphan_tables,
            circular_dependencies,
            type_mismatches,
            missing_indexes,
            health_scores,
        }
    }

    /// Tables with no outbound foreign keys and no inbound relationships
    fn find_orphan_tables(&self) -> Vec<String> {
        let referenced: HashSet<&str> = self
            .schema
            .relationships()
            .iter()
            .map(|r| r.to.as_str())
            .collect();

        self.schema
            .tables()
            .iter()
            .filter(|t| t.foreign_keys.is_empty() && !referenced.contains(t.name.as_str()))
            .map(|t| t.name.clone())
            .collect()
    }

    /// Foreign keys whose source and target column types normalize
    /// differently. Unresolvable targets or columns are skipped.
    fn find_type_mismatches(&self) -> Vec<TypeMismatch> {
        let mut mismatches = Vec::new();

        for table in self.schema.tables() {
            for fk in &table.foreign_keys {
                let Some((ref_table, ref_column)) = fk.target() else {
                    continue;
                };
                let Some(referenced) = self.tables.get(ref_table) else {
                    continue;
                };
                let (Some(source), Some(target)) =
                    (table.find_column(&fk.column), referenced.find_column(ref_column))
                else {
                    continue;
                };

                if !types_compatible(&source.data_type, &target.data_type) {
                    mismatches.push(TypeMismatch {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        column_type: source.data_type.clone(),
                        referenced_table: ref_table.to_string(),
                        referenced_column: ref_column.to_string(),
                        referenced_type: target.data_type.clone(),
                    });
                }
            }
        }

        mismatches
    }

    /// Foreign key columns covered by no index and not part of the
    /// primary key (primary keys are indexed by the engine).
    fn find_missing_indexes(&self) -> Vec<MissingIndex> {
        self.schema
            .tables()
            .iter()
            .flat_map(|table| {
                table
                    .foreign_keys
                    .iter()
                    .filter(move |fk| {
                        !table.is_indexed(&fk.column) && !table.is_primary_key_column(&fk.column)
                    })
                    .map(move |fk| MissingIndex {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        reason: MISSING_INDEX_REASON.to_string(),
                    })
            })
            .collect()
    }

    fn calculate_health_scores(
        &self,
        orphans: &[String],
        cycles: &[Vec<String>],
        type_mismatches: &[TypeMismatch],
        missing_indexes: &[MissingIndex],
    ) -> Vec<TableHealth> {
        self.schema
            .tables()
            .iter()
            .map(|table| {
                let name = table.name.as_str();
                let is_orphan = orphans.iter().any(|o| o == name);
                let in_cycle = cycles.iter().any(|c| c.iter().any(|n| n == name));
                let has_type_mismatch = type_mismatches.iter().any(|tm| tm.table == name);
                let missing_count = missing_indexes.iter().filter(|mi| mi.table == name).count();

                let mut issues = Vec::new();
                let mut score: i32 = 100;

                if is_orphan {
                    issues.push("Orphan table (no relationships)".to_string());
                    score -= ORPHAN_PENALTY;
                }

                if in_cycle {
                    issues.push("Part of circular dependency".to_string());
                    score -= CYCLE_PENALTY;
                }

                if has_type_mismatch {
                    issues.push("Foreign key type mismatch".to_string());
                    score -= TYPE_MISMATCH_PENALTY;
                }

                if missing_count > 0 {
                    issues.push(format!("{} foreign key(s) without index", missing_count));
                    score -= MISSING_INDEX_PENALTY * missing_count as i32;
                }

                if !table.primary_keys.is_empty() {
                    score += PRIMARY_KEY_BONUS;
                }

                if table.indexes.len() > table.foreign_keys.len() {
                    score += INDEX_COVERAGE_BONUS;
                }

                TableHealth {
                    table: table.name.clone(),
                    score: score.clamp(0, 100) as u8,
                    factors: HealthFactors {
                        indexed_fks: missing_count == 0,
                        cycles: in_cycle,
                        orphans: is_orphan,
                        type_mismatch: has_type_mismatch,
                    },
                    issues,
                }
            })
            .collect()
    }
}
