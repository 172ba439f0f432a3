//! Nested-type dispatch: LIST/ARRAY/MAP/STRUCT/UNION text parsing.
//!
//! All four share one splitting primitive: walk the bracketed content once,
//! tracking quote state and nested-bracket depth, and cut top-level elements
//! on the dialect delimiter. This mirrors a `findListBeginEndPos`-style scan plus
//! subsequent delimiter scan used for both `LIST` and `STRUCT` literals.

use super::cast_value;
use super::error::ConversionError;
use super::options::CastOptions;
use crate::value::{LogicalType, Scalar};

type CastResult<T> = Result<T, ConversionError>;

fn err(input: &str, target: impl Into<String>) -> ConversionError {
    ConversionError::new(input, target)
}

/// Strips one layer of `open`/`close` brackets, failing if they are absent
/// or mismatched.
fn unwrap_brackets(text: &str, open: char, close: char, target: &str) -> CastResult<String> {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    if chars.next() != Some(open) || trimmed.chars().next_back() != Some(close) {
        return Err(err(text, target));
    }
    Ok(chars.as_str()[..trimmed.len() - open.len_utf8() - close.len_utf8()].to_string())
}

/// Splits `content` into top-level comma-separated (per `opts.delimiter`)
/// elements, respecting quotes and nested bracket pairs of any of the three
/// dialect bracket kinds.
fn split_top_level(content: &str, opts: &CastOptions) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut current = String::new();
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == opts.escape && in_quotes {
            if let Some(&next) = chars.peek() {
                current.push(c);
                current.push(next);
                chars.next();
                continue;
            }
        }
        if c == opts.quote {
            in_quotes = !in_quotes;
            current.push(c);
            continue;
        }
        if !in_quotes {
            if c == opts.list_begin || c == opts.struct_begin {
                depth += 1;
            } else if c == opts.list_end || c == opts.struct_end {
                depth -= 1;
            } else if c == opts.delimiter && depth == 0 {
                parts.push(current.trim().to_string());
                current = String::new();
                continue;
            }
        }
        current.push(c);
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Strips one layer of matching quote characters, if present, leaving the
/// inner text untouched (escapes inside are resolved by the scalar caster).
fn unquote(text: &str, quote: char) -> String {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    if chars.next() == Some(quote) && trimmed.chars().next_back() == Some(quote) && trimmed.len() >= 2 {
        chars.as_str()[..trimmed.len() - 2 * quote.len_utf8()].to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn cast_list(text: &str, elem_type: &LogicalType, opts: &CastOptions) -> CastResult<Scalar> {
    let label = format!("LIST({elem_type})");
    let inner = unwrap_brackets(text, opts.list_begin, opts.list_end, &label)?;
    if inner.trim().is_empty() {
        return Ok(Scalar::List(Vec::new()));
    }
    let parts = split_top_level(&inner, opts);
    let mut items = Vec::with_capacity(parts.len());
    for part in parts {
        let unquoted = unquote(&part, opts.quote);
        if unquoted.eq_ignore_ascii_case("null") {
            items.push(Scalar::Null);
        } else {
            items.push(cast_value(&unquoted, elem_type, opts)?);
        }
    }
    Ok(Scalar::List(items))
}

/// Like [`cast_list`] but enforces the fixed element count `n`.
pub fn cast_array(
    text: &str,
    elem_type: &LogicalType,
    n: usize,
    opts: &CastOptions,
) -> CastResult<Scalar> {
    let label = format!("{elem_type}[{n}]");
    match cast_list(text, elem_type, opts)? {
        Scalar::List(items) => {
            if items.len() != n {
                return Err(err(text, label));
            }
            Ok(Scalar::List(items))
        }
        other => Ok(other),
    }
}

/// `MAP` values parse as a list of `key=value` entries, each becoming a
/// two-field struct in the backing child vector (see `ValueVector::new`'s
/// synthesized `{key, value}` entry type for `Map`).
pub fn cast_map(
    text: &str,
    key_type: &LogicalType,
    value_type: &LogicalType,
    opts: &CastOptions,
) -> CastResult<Scalar> {
    let label = format!("MAP({key_type},{value_type})");
    let inner = unwrap_brackets(text, opts.struct_begin, opts.struct_end, &label)?;
    if inner.trim().is_empty() {
        return Ok(Scalar::Map(Vec::new()));
    }
    let parts = split_top_level(&inner, opts);
    let mut pairs = Vec::with_capacity(parts.len());
    for part in parts {
        let (k, v) = part.split_once('=').ok_or_else(|| err(&part, label.clone()))?;
        let key = cast_value(&unquote(k, opts.quote), key_type, opts)?;
        let value = cast_value(&unquote(v, opts.quote), value_type, opts)?;
        pairs.push((key, value));
    }
    Ok(Scalar::Map(pairs))
}

/// `STRUCT` values parse as `{field: value, ...}`. An unrecognized field name
/// fails the cast; a field present in the schema but absent from the text
/// becomes NULL.
pub fn cast_struct(
    text: &str,
    schema_fields: &[(String, LogicalType)],
    opts: &CastOptions,
) -> CastResult<Scalar> {
    let label = "STRUCT".to_string();
    let inner = unwrap_brackets(text, opts.struct_begin, opts.struct_end, &label)?;
    let mut out: Vec<(String, Scalar)> =
        schema_fields.iter().map(|(n, _)| (n.clone(), Scalar::Null)).collect();
    if inner.trim().is_empty() {
        return Ok(Scalar::Struct(out));
    }
    for part in split_top_level(&inner, opts) {
        let (name, value_text) = part.split_once(':').ok_or_else(|| err(&part, label.clone()))?;
        let name = name.trim();
        let field_type = schema_fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| err(&part, label.clone()))?;
        let unquoted = unquote(value_text, opts.quote);
        let value = if unquoted.eq_ignore_ascii_case("null") {
            Scalar::Null
        } else {
            cast_value(&unquoted, field_type, opts)?
        };
        if let Some(slot) = out.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        }
    }
    Ok(Scalar::Struct(out))
}

/// `UNION` values try each alternative in declaration order; the first one
/// that parses successfully wins and every sibling alternative is left null
/// (the runtime `Union` tag records which one matched).
pub fn cast_union(
    text: &str,
    alternatives: &[(String, LogicalType)],
    opts: &CastOptions,
) -> CastResult<Scalar> {
    for (tag, ty) in alternatives {
        if let Ok(value) = cast_value(text, ty, opts) {
            return Ok(Scalar::Union { tag: tag.clone(), value: Box::new(value) });
        }
    }
    Err(err(text, "UNION"))
}
