//! String-to-typed-value casting (component 4.B): the layer every CSV field
//! and every string literal in a query passes through on its way to a typed
//! [`crate::value::Scalar`] or a [`crate::value::ValueVector`] slot.
//!
//! Dispatch is two-tiered: [`scalar`] handles the fixed-width and
//! variable-length leaf types, [`nested`] handles LIST/ARRAY/MAP/STRUCT/UNION
//! by recursing back into [`cast_value`]. [`format`] provides the inverse
//! printers relied on by the round-trip property `cast(format(v)) == v`.

pub mod error;
pub mod format;
pub mod nested;
pub mod options;
pub mod scalar;

pub use error::ConversionError;
pub use options::CastOptions;

use crate::value::{LogicalType, Scalar, ValueVector};

type CastResult<T> = Result<T, ConversionError>;

/// Leading/trailing whitespace is stripped around every scalar token; text
/// inside a quoted string or struct/list literal is left untouched by this
/// step (the quote-aware splitters in `nested` handle that layer).
fn is_null_literal(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("null")
}

/// Casts `text` to a [`Scalar`] of `logical_type`, dispatching to the scalar
/// or nested caster as appropriate. Does not itself special-case the NULL
/// literal at top level; callers that need NULL-as-text handling (CSV
/// fields, list/struct elements) check with [`is_null_literal`] first.
pub fn cast_value(text: &str, logical_type: &LogicalType, opts: &CastOptions) -> CastResult<Scalar> {
    let trimmed = text.trim();
    match logical_type {
        LogicalType::List(inner) => nested::cast_list(trimmed, inner, opts),
        LogicalType::Array(inner, n) => nested::cast_array(trimmed, inner, *n, opts),
        LogicalType::Map(k, v) => nested::cast_map(trimmed, k, v, opts),
        LogicalType::Struct(fields) => nested::cast_struct(trimmed, fields, opts),
        LogicalType::Union(alts) => nested::cast_union(trimmed, alts, opts),
        other => scalar::cast_scalar(trimmed, other),
    }
}

/// The component's primary entry point: casts `text` into `vector` at `pos`,
/// honoring the NULL literal and routing failures back to the caller so a
/// CSV ingest with `IGNORE_ERRORS=true` can turn them into warnings instead
/// of aborting the whole block.
pub fn copy_string_to_vector(
    vector: &mut ValueVector,
    pos: usize,
    text: &str,
    opts: &CastOptions,
) -> CastResult<()> {
    if is_null_literal(text) {
        vector.set_null_value(pos);
        return Ok(());
    }
    let logical_type = vector.logical_type().clone();
    match &logical_type {
        LogicalType::List(_) | LogicalType::Array(_, _) | LogicalType::Map(_, _) => {
            let scalar = cast_value(text, &logical_type, opts)?;
            if let Scalar::List(items) = scalar {
                vector.append_list(pos, items);
            } else if let Scalar::Map(pairs) = scalar {
                let flattened: Vec<Scalar> = pairs
                    .into_iter()
                    .map(|(k, v)| Scalar::Struct(vec![("key".to_string(), k), ("value".to_string(), v)]))
                    .collect();
                vector.append_list(pos, flattened);
            }
            Ok(())
        }
        LogicalType::Struct(_) | LogicalType::Union(_) => {
            let scalar = cast_value(text, &logical_type, opts)?;
            copy_scalar_into_struct_vector(vector, pos, &scalar);
            Ok(())
        }
        _ => {
            let scalar = cast_value(text, &logical_type, opts)?;
            vector.set(pos, scalar);
            Ok(())
        }
    }
}

fn copy_scalar_into_struct_vector(vector: &mut ValueVector, pos: usize, scalar: &Scalar) {
    match scalar {
        Scalar::Struct(fields) => {
            for (name, value) in fields {
                if let Some(field_vec) = vector.field_mut(name) {
                    if matches!(value, Scalar::Null) {
                        field_vec.set_null_value(pos);
                    } else {
                        field_vec.set(pos, value.clone());
                    }
                }
            }
            vector.set_null(pos, false);
        }
        Scalar::Union { tag, value } => {
            if let Some(field_vec) = vector.field_mut(tag) {
                field_vec.set(pos, (**value).clone());
            }
            vector.set_null(pos, false);
        }
        Scalar::Null => vector.set_null_value(pos),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DecimalSpec;

    #[test]
    fn integers_round_trip_via_scalar_cast() {
        assert_eq!(scalar::cast_int32("42").unwrap(), Scalar::Int32(42));
        assert_eq!(scalar::cast_int32("-7").unwrap(), Scalar::Int32(-7));
        assert!(scalar::cast_int32("1152921504606846976").is_err());
    }

    #[test]
    fn overflowing_int32_reports_exact_message() {
        let err = scalar::cast_int32("1152921504606846976").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conversion exception: Cast failed. Could not convert \"1152921504606846976\" to INT32."
        );
    }

    #[test]
    fn bool_is_case_insensitive() {
        assert_eq!(scalar::cast_bool("TRUE").unwrap(), Scalar::Bool(true));
        assert_eq!(scalar::cast_bool("False").unwrap(), Scalar::Bool(false));
        assert!(scalar::cast_bool("yes").is_err());
    }

    #[test]
    fn date_round_trips_through_format() {
        let s = scalar::cast_date("2024-03-05").unwrap();
        if let Scalar::Date(days) = s {
            assert_eq!(format::format_date(days), "2024-03-05");
        } else {
            panic!("expected Date");
        }
    }

    #[test]
    fn decimal_scales_fixed_point() {
        let s = scalar::cast_decimal("12.34", DecimalSpec { precision: 10, scale: 2 }).unwrap();
        assert_eq!(s, Scalar::Int64(1234));
    }

    #[test]
    fn list_of_int_parses_top_level_commas() {
        let opts = CastOptions::default();
        let s = nested::cast_list("[1, 2, 3]", &LogicalType::Int64, &opts).unwrap();
        assert_eq!(
            s,
            Scalar::List(vec![Scalar::Int64(1), Scalar::Int64(2), Scalar::Int64(3)])
        );
    }

    #[test]
    fn nested_list_of_lists() {
        let opts = CastOptions::default();
        let inner_ty = LogicalType::List(Box::new(LogicalType::Int64));
        let s = nested::cast_list("[[1, 2], [3]]", &inner_ty, &opts).unwrap();
        match s {
            Scalar::List(outer) => assert_eq!(outer.len(), 2),
            _ => panic!("expected nested list"),
        }
    }

    #[test]
    fn struct_rejects_unknown_field() {
        let opts = CastOptions::default();
        let fields = vec![("a".to_string(), LogicalType::Int64)];
        assert!(nested::cast_struct("{a: 1, b: 2}", &fields, &opts).is_err());
    }

    #[test]
    fn struct_missing_field_is_null() {
        let opts = CastOptions::default();
        let fields =
            vec![("a".to_string(), LogicalType::Int64), ("b".to_string(), LogicalType::Int64)];
        let s = nested::cast_struct("{a: 1}", &fields, &opts).unwrap();
        assert_eq!(
            s,
            Scalar::Struct(vec![("a".to_string(), Scalar::Int64(1)), ("b".to_string(), Scalar::Null)])
        );
    }

    #[test]
    fn copy_string_to_vector_handles_null_literal() {
        let mut v = ValueVector::new(LogicalType::Int64, 4);
        let opts = CastOptions::default();
        copy_string_to_vector(&mut v, 0, "NULL", &opts).unwrap();
        assert!(v.is_null(0));
    }

    #[test]
    fn copy_string_to_vector_populates_list_child() {
        let mut v = ValueVector::new(LogicalType::List(Box::new(LogicalType::Int64)), 4);
        let opts = CastOptions::default();
        copy_string_to_vector(&mut v, 0, "[1, 2, 3]", &opts).unwrap();
        let entry = v.list_entry(0);
        assert_eq!(entry.size, 3);
    }
}
