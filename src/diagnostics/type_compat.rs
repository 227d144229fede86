//! Declared-type normalization for foreign key compatibility checks

/// Long-form PostgreSQL type names and their canonical short forms
const CANONICAL_TYPES: &[(&str, &str)] = &[
    ("character varying", "varchar"),
    ("character", "char"),
    ("timestamp without time zone", "timestamp"),
    ("timestamp with time zone", "timestamptz"),
    ("time without time zone", "time"),
    ("time with time zone", "timetz"),
    ("double precision", "float8"),
    ("integer", "int4"),
    ("smallint", "int2"),
    ("bigint", "int8"),
    ("boolean", "bool"),
    ("user-defined", "custom"),
];

/// Lower-case, trim, then map through the canonical table.
/// Unknown types pass through in their lower-cased, trimmed form.
pub fn normalize_type(declared: &str) -> String {
    let lowered = declared.trim().to_lowercase();
    CANONICAL_TYPES
        .iter()
        .find(|(long, _)| *long == lowered)
        .map(|(_, short)| short.to_string())
        .unwrap_or(lowered)
}

pub fn types_compatible(a: &str, b: &str) -> bool {
    normalize_type(a) == normalize_type(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(normalize_type("character varying"), "varchar");
        assert_eq!(normalize_type("  INTEGER "), "int4");
        assert_eq!(normalize_type("USER-DEFINED"), "custom");
        assert_eq!(normalize_type("Timestamp With Time Zone"), "timestamptz");
    }

    #[test]
    fn test_unknown_types_pass_through() {
        assert_eq!(normalize_type(" UUID "), "uuid");
        assert_eq!(normalize_type("varchar(255)"), "varchar(255)");
    }

    #[test]
    fn test_compatibility() {
        assert!(types_compatible("integer", "int4"));
        assert!(types_compatible("bool", "boolean"));
        assert!(!types_compatible("integer", "character varying"));
        assert!(!types_compatible("integer", "bigint"));
    }
}
