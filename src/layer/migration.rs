//! Migration SQL generator
//!
//! Renders a layer diff as ordered PostgreSQL DDL. Statement order:
//!
//! 1. drop removed tables
//! 2. create added tables (columns and primary key only)
//! 3. alter modified tables
//! 4. foreign keys of added tables, once every table exists
//! 5. indexes of added tables

use crate::layer::diff::{ColumnModification, SchemaDiff, TableModification};
use crate::models::{Column, ForeignKey, Index, Table};

pub struct MigrationGenerator;

impl MigrationGenerator {
    /// Generate the migration script, one blank line between statements
    pub fn generate(diff: &SchemaDiff) -> String {
        Self::statements(diff).join("\n\n")
    }

    /// Ordered statement list
    pub fn statements(diff: &SchemaDiff) -> Vec<String> {
        let mut statements = Vec::new();

        statements.extend(diff.removed.iter().map(|name| Self::drop_table_sql(name)));

        statements.extend(diff.added.iter().map(Self::create_table_sql));

        for modification in &diff.modified {
            statements.extend(Self::alter_table_sql(modification));
        }

        for table in &diff.added {
            statements.extend(
                table
                    .foreign_keys
                    .iter()
                    .map(|fk| Self::add_foreign_key_sql(&table.name, fk)),
            );
        }

        for table in &diff.added {
            statements.extend(
                table
                    .indexes
                    .iter()
                    .map(|idx| Self::create_index_sql(&table.name, idx)),
            );
        }

        statements
    }

    fn drop_table_sql(name: &str) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE;", name)
    }

    fn create_table_sql(table: &Table) -> String {
        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|col| format!("  {}", Self::column_sql(col)))
            .collect();

        if !table.primary_keys.is_empty() {
            defs.push(format!("  PRIMARY KEY ({})", table.primary_keys.join(", ")));
        }

        format!("CREATE TABLE {} (\n{}\n);", table.name, defs.join(",\n"))
    }

    /// `name TYPE [NOT NULL] [DEFAULT expr]`
    fn column_sql(col: &Column) -> String {
        let mut def = format!("{} {}", col.name, col.data_type.to_uppercase());

        if !col.nullable {
            def.push_str(" NOT NULL");
        }

        if let Some(default) = col.default_expr() {
            def.push_str(&format!(" DEFAULT {}", default));
        }

        def
    }

    fn alter_table_sql(m: &TableModification) -> Vec<String> {
        let table = &m.table_name;
        let mut statements = Vec::new();

        for col in &m.added_columns {
            statements.push(format!(
                "ALTER TABLE {} ADD COLUMN {};",
                table,
                Self::column_sql(col)
            ));
        }

        for name in &m.removed_columns {
            statements.push(format!("ALTER TABLE {} DROP COLUMN {};", table, name));
        }

        for col in &m.modified_columns {
            statements.extend(Self::modify_column_sql(table, col));
        }

        for fk in &m.added_foreign_keys {
            statements.push(Self::add_foreign_key_sql(table, fk));
        }

        for fk in &m.removed_foreign_keys {
            statements.push(format!(
                "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {};",
                table,
                fk.constraint_name(table)
            ));
        }

        for idx in &m.added_indexes {
            statements.push(Self::create_index_sql(table, idx));
        }

        for name in &m.removed_indexes {
            statements.push(format!("DROP INDEX IF EXISTS {};", name));
        }

        statements
    }

    /// Type, then nullability, then default
    fn modify_column_sql(table: &str, c: &ColumnModification) -> Vec<String> {
        let mut statements = Vec::new();

        if let Some(change) = &c.data_type {
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
                table,
                c.name,
                change.new.to_uppercase()
            ));
        }

        if let Some(change) = &c.nullable {
            let constraint = if change.new { "DROP NOT NULL" } else { "SET NOT NULL" };
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} {};",
                table, c.name, constraint
            ));
        }

        if let Some(change) = &c.default {
            match change.new.as_deref().filter(|d| !d.is_empty()) {
                Some(expr) => statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                    table, c.name, expr
                )),
                None => statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
                    table, c.name
                )),
            }
        }

        statements
    }

    fn add_foreign_key_sql(table: &str, fk: &ForeignKey) -> String {
        let target = match fk.target() {
            Some((ref_table, ref_column)) => format!("{}({})", ref_table, ref_column),
            None => fk.references.clone(),
        };

        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}",
            table,
            fk.constraint_name(table),
            fk.column,
            target
        );

        if let Some(action) = fk.on_delete.as_deref().filter(|a| !a.is_empty()) {
            sql.push_str(&format!(" ON DELETE {}", action));
        }

        if let Some(action) = fk.on_update.as_deref().filter(|a| !a.is_empty()) {
            sql.push_str(&format!(" ON UPDATE {}", action));
        }

        sql.push(';');
        sql
    }

    fn create_index_sql(table: &str, idx: &Index) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({});",
            if idx.unique { "UNIQUE " } else { "" },
            idx.name,
            table,
            idx.columns.join(", ")
        )
    }
}
