//! Foreign key model

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// `table.column`, neither part empty nor containing another dot
static REFERENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^.\s]+\.[^.\s]+$").expect("valid reference pattern"));

/// Foreign key owned by a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    #[validate(length(min = 1, message = "Foreign key column is required"))]
    pub column: String,

    /// Target encoded as `table.column`
    #[validate(custom(function = "validate_reference"))]
    pub references: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl ForeignKey {
    pub fn new(column: impl Into<String>, references: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            references: references.into(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }

    /// Split the reference into `(table, column)`.
    /// Returns `None` for references that are not `table.column`.
    pub fn target(&self) -> Option<(&str, &str)> {
        self.references
            .split_once('.')
            .filter(|(table, column)| !table.is_empty() && !column.is_empty())
    }

    /// Identity used when diffing: `(column, reference)`
    pub fn identity(&self) -> (&str, &str) {
        (&self.column, &self.references)
    }

    /// Constraint name the DDL synthesizer assigns to this key
    pub fn constraint_name(&self, table: &str) -> String {
        format!("{}_{}_fkey", table, self.column)
    }
}

/// Validate a `table.column` reference
fn validate_reference(reference: &str) -> Result<(), validator::ValidationError> {
    if !REFERENCE_PATTERN.is_match(reference) {
        let mut err = validator::ValidationError::new("invalid_reference");
        err.message = Some(
            format!("Foreign key reference '{}' must be of the form table.column", reference).into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_split() {
        let fk = ForeignKey::new("customer_id", "customers.id");
        assert_eq!(fk.target(), Some(("customers", "id")));
        assert_eq!(fk.constraint_name("orders"), "orders_customer_id_fkey");

        let dangling = ForeignKey::new("customer_id", "customers");
        assert_eq!(dangling.target(), None);
    }

    #[test]
    fn test_reference_validation() {
        assert!(ForeignKey::new("a", "t.c").validate().is_ok());
        assert!(ForeignKey::new("a", "t").validate().is_err());
        assert!(ForeignKey::new("a", "s.t.c").validate().is_err());
        assert!(ForeignKey::new("", "t.c").validate().is_err());
    }

    #[test]
    fn test_actions_are_optional_on_the_wire() {
        let fk: ForeignKey =
            serde_json::from_value(serde_json::json!({"column": "a", "references": "t.c"})).unwrap();
        assert_eq!(fk.on_delete, None);

        let json = serde_json::to_value(&fk).unwrap();
        assert!(json.get("onDelete").is_none());
    }
}
