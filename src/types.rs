//! SQL type to C# host type mapping.

use tracing::warn;

/// Host type used when a SQL type has no mapping.
pub const OPAQUE_TYPE: &str = "object";

/// Map a raw SQL type descriptor (e.g. `NVARCHAR(50)`) to a C# type name.
///
/// Unknown types never fail: they fall back to [`OPAQUE_TYPE`].
pub fn sql_type_to_host_type(sql_type: &str) -> &'static str {
    let base = base_type(sql_type);

    match lookup(&base) {
        Some(host) => host,
        None => {
            warn!(sql_type, "no host type mapping, falling back to {}", OPAQUE_TYPE);
            OPAQUE_TYPE
        }
    }
}

/// Lowercased type name before the first `(`.
pub fn base_type(sql_type: &str) -> String {
    let base = sql_type.split('(').next().unwrap_or(sql_type);
    base.trim().to_lowercase()
}

/// Declared length of a `varchar`/`nvarchar` column, if numeric.
pub fn string_length(sql_type: &str) -> Option<u32> {
    let base = base_type(sql_type);
    if !base.contains("varchar") {
        return None;
    }
    let open = sql_type.find('(')?;
    let close = sql_type[open..].find(')')? + open;
    sql_type[open + 1..close].trim().parse().ok()
}

/// Whether the SQL type has a host type mapping.
pub fn is_known_type(sql_type: &str) -> bool {
    lookup(&base_type(sql_type)).is_some()
}

/// Whether the host type is a value type that needs `?` to hold null.
pub fn is_value_type(host_type: &str) -> bool {
    !matches!(host_type, "string" | "byte[]" | "object") && !host_type.contains('.')
}

fn lookup(base: &str) -> Option<&'static str> {
    let host = match base {
        // Integers
        "int" | "integer" => "int",
        "bigint" => "long",
        "smallint" => "short",
        "tinyint" => "byte",
        "bit" | "boolean" | "bool" => "bool",

        // Fixed point
        "decimal" | "numeric" | "money" | "smallmoney" => "decimal",

        // Floating point
        "float" | "double" | "double precision" => "double",
        "real" => "float",

        // Date/time
        "datetime" | "datetime2" | "smalldatetime" | "date" | "timestamp" => "DateTime",
        "time" => "TimeSpan",
        "datetimeoffset" => "DateTimeOffset",

        // Character data
        "char" | "varchar" | "text" | "nchar" | "nvarchar" | "ntext" | "xml" => "string",

        // Binary
        "binary" | "varbinary" | "image" | "rowversion" => "byte[]",

        "uniqueidentifier" | "uuid" => "Guid",

        // Spatial and hierarchy types
        "geography" => "Microsoft.SqlServer.Types.SqlGeography",
        "geometry" => "Microsoft.SqlServer.Types.SqlGeometry",
        "hierarchyid" => "Microsoft.SqlServer.Types.SqlHierarchyId",

        "sql_variant" => OPAQUE_TYPE,
        _ => return None,
    };
    Some(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_server_types() {
        assert_eq!(sql_type_to_host_type("INT"), "int");
        assert_eq!(sql_type_to_host_type("NVARCHAR(50)"), "string");
        assert_eq!(sql_type_to_host_type("decimal(18, 2)"), "decimal");
        assert_eq!(sql_type_to_host_type("money"), "decimal");
        assert_eq!(sql_type_to_host_type("DATETIME2(7)"), "DateTime");
        assert_eq!(sql_type_to_host_type("varbinary(max)"), "byte[]");
        assert_eq!(sql_type_to_host_type("UNIQUEIDENTIFIER"), "Guid");
        assert_eq!(sql_type_to_host_type("real"), "float");
        assert_eq!(sql_type_to_host_type("float"), "double");
    }

    #[test]
    fn test_unknown_type_falls_back() {
        assert_eq!(sql_type_to_host_type("mystery_type"), OPAQUE_TYPE);
        assert_eq!(sql_type_to_host_type(""), OPAQUE_TYPE);
    }

    #[test]
    fn test_mapping_is_stable() {
        let first = sql_type_to_host_type("Varchar (20)");
        let second = sql_type_to_host_type("Varchar (20)");
        assert_eq!(first, second);
        assert_eq!(first, "string");
    }

    #[test]
    fn test_string_length() {
        assert_eq!(string_length("nvarchar(120)"), Some(120));
        assert_eq!(string_length("VARCHAR( 8 )"), Some(8));
        assert_eq!(string_length("nvarchar(max)"), None);
        assert_eq!(string_length("char(3)"), None);
        assert_eq!(string_length("varchar"), None);
    }

    #[test]
    fn test_value_types() {
        assert!(is_value_type("int"));
        assert!(is_value_type("Guid"));
        assert!(!is_value_type("string"));
        assert!(!is_value_type("byte[]"));
        assert!(!is_value_type("Microsoft.SqlServer.Types.SqlGeography"));
    }
}
