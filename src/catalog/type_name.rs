//! Resolves a DDL type-name string (`CREATE NODE TABLE`'s `PropertyDef`,
//! `ALTER TABLE ... ADD COLUMN`) to a [`LogicalType`]. The parser keeps
//! property types as raw strings rather than pre-resolving them (§4.D), so
//! this is the single place that decides what spelling means what.

use crate::error::{Error, Result};
use crate::value::{DecimalSpec, LogicalType, TimeResolution};

/// Case-insensitive; accepts both the SQL-ish `VARCHAR`/`INT` aliases and
/// the engine's own `STRING`/`INT64` spellings, matching how CSV/DDL type-name
/// tokens are written across either convention in practice. `TYPE[]` is a
/// list of `TYPE`; `TYPE[n]` is a fixed-size array.
pub fn resolve_type_name(raw: &str) -> Result<LogicalType> {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_suffix(']') {
        let open = inner.rfind('[').ok_or_else(|| bad_type(raw))?;
        let (base, bound) = (&inner[..open], &inner[open + 1..]);
        let elem = resolve_type_name(base)?;
        if bound.is_empty() {
            return Ok(LogicalType::List(Box::new(elem)));
        }
        let n: usize = bound.parse().map_err(|_| bad_type(raw))?;
        return Ok(LogicalType::Array(Box::new(elem), n));
    }
    if let Some(rest) = strip_ci_prefix(trimmed, "MAP(") {
        let inner = rest.strip_suffix(')').ok_or_else(|| bad_type(raw))?;
        let comma = split_top_level_comma(inner).ok_or_else(|| bad_type(raw))?;
        let key = resolve_type_name(inner[..comma].trim())?;
        let value = resolve_type_name(inner[comma + 1..].trim())?;
        return Ok(LogicalType::Map(Box::new(key), Box::new(value)));
    }
    if let Some(rest) = strip_ci_prefix(trimmed, "DECIMAL(") {
        let inner = rest.strip_suffix(')').ok_or_else(|| bad_type(raw))?;
        let comma = split_top_level_comma(inner).ok_or_else(|| bad_type(raw))?;
        let precision: u8 = inner[..comma].trim().parse().map_err(|_| bad_type(raw))?;
        let scale: u8 = inner[comma + 1..].trim().parse().map_err(|_| bad_type(raw))?;
        return Ok(LogicalType::Decimal(DecimalSpec { precision, scale }));
    }

    Ok(match trimmed.to_ascii_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => LogicalType::Bool,
        "INT8" | "TINYINT" => LogicalType::Int8,
        "INT16" | "SMALLINT" => LogicalType::Int16,
        "INT32" | "INT" | "INTEGER" => LogicalType::Int32,
        "INT64" | "BIGINT" | "LONG" => LogicalType::Int64,
        "INT128" => LogicalType::Int128,
        "UINT8" => LogicalType::UInt8,
        "UINT16" => LogicalType::UInt16,
        "UINT32" => LogicalType::UInt32,
        "UINT64" => LogicalType::UInt64,
        "FLOAT" | "FLOAT32" | "REAL" => LogicalType::Float,
        "DOUBLE" | "FLOAT64" => LogicalType::Double,
        "DATE" => LogicalType::Date,
        "TIMESTAMP" => LogicalType::Timestamp(TimeResolution::Us),
        "TIMESTAMP_SEC" => LogicalType::Timestamp(TimeResolution::Sec),
        "TIMESTAMP_MS" => LogicalType::Timestamp(TimeResolution::Ms),
        "TIMESTAMP_NS" => LogicalType::Timestamp(TimeResolution::Ns),
        "TIMESTAMP_TZ" => LogicalType::Timestamp(TimeResolution::Tz),
        "INTERVAL" | "DURATION" => LogicalType::Interval,
        "STRING" | "VARCHAR" | "TEXT" => LogicalType::String,
        "BLOB" => LogicalType::Blob,
        "UUID" => LogicalType::Uuid,
        "SERIAL" => LogicalType::Serial,
        "INTERNAL_ID" => LogicalType::InternalId,
        _ => return Err(bad_type(raw)),
    })
}

fn strip_ci_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn split_top_level_comma(s: &str) -> Option<usize> {
    let mut depth = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn bad_type(raw: &str) -> Error {
    Error::Catalog(format!("Unknown type {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aliases_case_insensitively() {
        assert_eq!(resolve_type_name("varchar").unwrap(), LogicalType::String);
        assert_eq!(resolve_type_name("BIGINT").unwrap(), LogicalType::Int64);
    }

    #[test]
    fn resolves_list_and_array_suffixes() {
        assert_eq!(resolve_type_name("INT64[]").unwrap(), LogicalType::List(Box::new(LogicalType::Int64)));
        assert_eq!(
            resolve_type_name("STRING[3]").unwrap(),
            LogicalType::Array(Box::new(LogicalType::String), 3)
        );
    }

    #[test]
    fn resolves_map_and_decimal() {
        assert_eq!(
            resolve_type_name("MAP(STRING, INT64)").unwrap(),
            LogicalType::Map(Box::new(LogicalType::String), Box::new(LogicalType::Int64))
        );
        assert_eq!(
            resolve_type_name("DECIMAL(10, 2)").unwrap(),
            LogicalType::Decimal(DecimalSpec { precision: 10, scale: 2 })
        );
    }

    #[test]
    fn rejects_unknown_type_name() {
        assert!(resolve_type_name("NOT_A_TYPE").is_err());
    }
}
