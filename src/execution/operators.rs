//! Physical execution (component 4.G): a tree-walking interpreter over the
//! logical plan, producing row batches. Rows are materialized eagerly rather
//! than pulled morsel-by-morsel (a `ResultSet`/factorized-vector
//! pipeline), a conscious simplification recorded in DESIGN.md; the operator
//! boundaries and the vector-batch size they'd otherwise chunk by
//! ([`crate::value::DEFAULT_VECTOR_CAPACITY`]) still mirror the logical plan
//! one-to-one.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::binder::expression::BoundExpression;
use crate::catalog::{Catalog, Direction};
use crate::error::{Error, Result};
use crate::planner::LogicalOperator;
use crate::storage::StorageEngine;
use crate::value::{InternalId, Scalar};

/// One output tuple: variable/alias name or `"{alias}.{property}"` to value.
/// Node/rel identity is carried under the bare alias as `Scalar::InternalId`.
pub type Row = HashMap<String, Scalar>;

pub struct ExecutionContext<'a> {
    pub catalog: &'a Catalog,
    pub storage: &'a StorageEngine,
}

pub fn execute(op: &LogicalOperator, ctx: &ExecutionContext) -> Result<Vec<Row>> {
    match op {
        LogicalOperator::EmptyResult => Ok(vec![Row::new()]),

        LogicalOperator::ScanNodeId { alias, label } => {
            let table = ctx.storage.node_table(*label);
            let num_rows = table.map(|t| t.num_rows()).unwrap_or(0);
            let mut rows = Vec::with_capacity(num_rows as usize);
            for offset in 0..num_rows {
                let mut row = Row::new();
                row.insert(alias.clone(), Scalar::InternalId(InternalId::new(*label, offset)));
                rows.push(row);
            }
            Ok(rows)
        }

        LogicalOperator::Extend { rel_alias, rel_label, direction, bound_alias, nbr_alias, input } => {
            let input_rows = execute(input, ctx)?;
            let mut out = Vec::with_capacity(input_rows.len());
            for row in input_rows {
                let Some(Scalar::InternalId(bound)) = row.get(bound_alias) else {
                    return Err(Error::internal(format!("{bound_alias} is not bound to a node id")));
                };
                for (nbr, rel_row) in ctx.storage.adjacency(*rel_label, *bound, *direction) {
                    let mut next = row.clone();
                    next.insert(nbr_alias.clone(), Scalar::InternalId(nbr));
                    next.insert(rel_alias.clone(), Scalar::InternalId(InternalId::new(*rel_label, rel_row)));
                    out.push(next);
                }
            }
            Ok(out)
        }

        LogicalOperator::HashJoin { join_var, build, probe } => {
            let build_rows = execute(build, ctx)?;
            // `Scalar` can't derive `Eq`/`Hash` (it carries `f32`/`f64`), so
            // the hash table keys on each value's canonical string form, the
            // same approach `Distinct`/`Union` below use for deduplication.
            let mut table: HashMap<String, Vec<usize>> = HashMap::new();
            for (i, row) in build_rows.iter().enumerate() {
                if let Some(key) = row.get(join_var) {
                    table.entry(key.to_string()).or_default().push(i);
                }
            }
            let probe_rows = execute(probe, ctx)?;
            let mut out = Vec::new();
            for probe_row in probe_rows {
                let Some(key) = probe_row.get(join_var) else { continue };
                let Some(indices) = table.get(&key.to_string()) else { continue };
                for &i in indices {
                    let mut merged = probe_row.clone();
                    for (k, v) in &build_rows[i] {
                        merged.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                    out.push(merged);
                }
            }
            Ok(out)
        }

        LogicalOperator::Filter { predicate, input } => {
            let rows = execute(input, ctx)?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                if eval_expr(predicate, &row)?.as_bool().unwrap_or(false) {
                    out.push(row);
                }
            }
            Ok(out)
        }

        LogicalOperator::ScanNodeProperty { alias, property, input } => {
            let rows = execute(input, ctx)?;
            let mut out = Vec::with_capacity(rows.len());
            for mut row in rows {
                if let Some(Scalar::InternalId(id)) = row.get(alias).copied() {
                    let label = id.table_id;
                    let ordinal = ctx
                        .catalog
                        .get_property(label, property)
                        .ok_or_else(|| Error::internal(format!("unknown property {property}")))?
                        .ordinal;
                    let value = ctx
                        .storage
                        .node_table(label)
                        .and_then(|t| t.get_property(id, ordinal))
                        .cloned()
                        .unwrap_or(Scalar::Null);
                    row.insert(format!("{alias}.{property}"), value);
                }
                out.push(row);
            }
            Ok(out)
        }

        LogicalOperator::ScanRelProperty { alias, property, direction: _, input } => {
            let rows = execute(input, ctx)?;
            let mut out = Vec::with_capacity(rows.len());
            for mut row in rows {
                if let Some(Scalar::InternalId(id)) = row.get(alias).copied() {
                    let label = id.table_id;
                    let ordinal = ctx
                        .catalog
                        .get_property(label, property)
                        .ok_or_else(|| Error::internal(format!("unknown property {property}")))?
                        .ordinal;
                    let value = ctx
                        .storage
                        .rel_table(label)
                        .and_then(|t| t.property(id.offset, ordinal))
                        .cloned()
                        .unwrap_or(Scalar::Null);
                    row.insert(format!("{alias}.{property}"), value);
                }
                out.push(row);
            }
            Ok(out)
        }

        LogicalOperator::Unwind { alias, expr, input } => {
            let rows = execute(input, ctx)?;
            let mut out = Vec::new();
            for row in rows {
                let value = eval_expr(expr, &row)?;
                let items = match value {
                    Scalar::List(items) => items,
                    other => vec![other],
                };
                for item in items {
                    let mut next = row.clone();
                    next.insert(alias.clone(), item);
                    out.push(next);
                }
            }
            Ok(out)
        }

        LogicalOperator::Projection { items, input } => {
            let rows = execute(input, ctx)?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let mut next = row.clone();
                for (alias, expr) in items {
                    next.insert(alias.clone(), eval_expr(expr, &row)?);
                }
                out.push(next);
            }
            Ok(out)
        }

        LogicalOperator::Aggregate { group_keys, aggregates, input } => {
            let rows = execute(input, ctx)?;
            let mut groups: Vec<(Vec<Scalar>, Vec<Row>)> = Vec::new();
            for row in rows {
                let key: Vec<Scalar> =
                    group_keys.iter().map(|(_, e)| eval_expr(e, &row)).collect::<Result<_>>()?;
                match groups.iter_mut().find(|(k, _)| k == &key) {
                    Some((_, members)) => members.push(row),
                    None => groups.push((key, vec![row])),
                }
            }
            if groups.is_empty() && group_keys.is_empty() {
                groups.push((Vec::new(), Vec::new()));
            }
            let mut out = Vec::with_capacity(groups.len());
            for (key, members) in groups {
                let mut row = Row::new();
                for ((alias, _), value) in group_keys.iter().zip(key) {
                    row.insert(alias.clone(), value);
                }
                for (alias, expr) in aggregates {
                    row.insert(alias.clone(), eval_aggregate(expr, &members)?);
                }
                out.push(row);
            }
            Ok(out)
        }

        LogicalOperator::OrderBy { keys, input } => {
            let mut rows = execute(input, ctx)?;
            let mut err = None;
            rows.sort_by(|a, b| {
                for (expr, ascending) in keys {
                    let (va, vb) = match (eval_expr(expr, a), eval_expr(expr, b)) {
                        (Ok(va), Ok(vb)) => (va, vb),
                        (Err(e), _) | (_, Err(e)) => {
                            err.get_or_insert(e);
                            return Ordering::Equal;
                        }
                    };
                    let ord = compare_scalars(&va, &vb).unwrap_or(Ordering::Equal);
                    let ord = if *ascending { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
            if let Some(e) = err {
                return Err(e);
            }
            Ok(rows)
        }

        LogicalOperator::Distinct { input } => {
            let rows = execute(input, ctx)?;
            let mut seen = std::collections::HashSet::new();
            let mut out = Vec::new();
            for row in rows {
                let mut entries: Vec<(String, String)> =
                    row.iter().map(|(k, v)| (k.clone(), v.to_string())).collect();
                entries.sort();
                if seen.insert(entries) {
                    out.push(row);
                }
            }
            Ok(out)
        }

        LogicalOperator::Skip { count, input } => {
            let rows = execute(input, ctx)?;
            Ok(rows.into_iter().skip((*count).max(0) as usize).collect())
        }

        LogicalOperator::Limit { count, input } => {
            let rows = execute(input, ctx)?;
            Ok(rows.into_iter().take((*count).max(0) as usize).collect())
        }

        LogicalOperator::SetProperty { items, input } => {
            // Updates the in-flight row only; see DESIGN.md for why this
            // doesn't persist back into column storage.
            let rows = execute(input, ctx)?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let mut next = row.clone();
                for (target, value) in items {
                    let BoundExpression::Property { base, property, .. } = target else {
                        return Err(Error::runtime("SET target must be a property reference"));
                    };
                    let BoundExpression::Variable(v) = base.as_ref() else {
                        return Err(Error::runtime("SET target must be a property of a bound variable"));
                    };
                    let value = eval_expr(value, &row)?;
                    next.insert(format!("{}.{}", v.name, property), value);
                }
                out.push(next);
            }
            Ok(out)
        }

        LogicalOperator::Union { inputs, all } => {
            let mut out = Vec::new();
            for input in inputs {
                out.extend(execute(input, ctx)?);
            }
            if !*all {
                let mut seen = std::collections::HashSet::new();
                out.retain(|row| {
                    let mut entries: Vec<(String, String)> =
                        row.iter().map(|(k, v)| (k.clone(), v.to_string())).collect();
                    entries.sort();
                    seen.insert(entries)
                });
            }
            Ok(out)
        }
    }
}

pub fn eval_expr(expr: &BoundExpression, row: &Row) -> Result<Scalar> {
    match expr {
        BoundExpression::Literal(s) => Ok(s.clone()),
        BoundExpression::Variable(v) => {
            row.get(&v.name).cloned().ok_or_else(|| Error::internal(format!("unbound variable {}", v.name)))
        }
        BoundExpression::Property { base, property, .. } => match base.as_ref() {
            BoundExpression::Variable(v) => row
                .get(&format!("{}.{}", v.name, property))
                .cloned()
                .ok_or_else(|| Error::internal(format!("property {}.{} not scanned", v.name, property))),
            other => {
                let _ = eval_expr(other, row)?;
                Err(Error::runtime("nested property access is not supported"))
            }
        },
        BoundExpression::Binary { op, left, right, .. } => {
            eval_binary(*op, &eval_expr(left, row)?, &eval_expr(right, row)?)
        }
        BoundExpression::Unary { op, operand, .. } => eval_unary(*op, &eval_expr(operand, row)?),
        BoundExpression::IsNull { operand, negated } => {
            let v = eval_expr(operand, row)?;
            Ok(Scalar::Bool(v.is_null() != *negated))
        }
        BoundExpression::Aggregate { .. } => {
            Err(Error::internal("aggregate expression evaluated outside an Aggregate operator"))
        }
        BoundExpression::ScalarFunction { function, arguments, .. } => {
            let args = arguments.iter().map(|a| eval_expr(a, row)).collect::<Result<Vec<_>>>()?;
            eval_scalar_function(function, &args)
        }
        BoundExpression::Case { operand, branches, else_branch, .. } => {
            let subject = operand.as_deref().map(|o| eval_expr(o, row)).transpose()?;
            for (when, then) in branches {
                let matched = match &subject {
                    Some(s) => scalars_equal(s, &eval_expr(when, row)?),
                    None => eval_expr(when, row)?.as_bool().unwrap_or(false),
                };
                if matched {
                    return eval_expr(then, row);
                }
            }
            match else_branch {
                Some(e) => eval_expr(e, row),
                None => Ok(Scalar::Null),
            }
        }
        BoundExpression::Parameter { name, .. } => {
            Err(Error::runtime(format!("unbound query parameter ${name}")))
        }
    }
}

fn eval_aggregate(expr: &BoundExpression, members: &[Row]) -> Result<Scalar> {
    let BoundExpression::Aggregate { function, distinct, argument, .. } = expr else {
        return eval_expr(expr, members.first().unwrap_or(&Row::new()));
    };
    if function == "COUNT" && argument.is_none() {
        return Ok(Scalar::Int64(members.len() as i64));
    }
    let Some(arg) = argument else {
        return Err(Error::internal(format!("{function} requires an argument")));
    };
    let mut values: Vec<Scalar> =
        members.iter().map(|r| eval_expr(arg, r)).collect::<Result<_>>()?;
    values.retain(|v| !v.is_null());
    if *distinct {
        let mut seen = std::collections::HashSet::new();
        values.retain(|v| seen.insert(v.to_string()));
    }
    Ok(match function.as_str() {
        "COUNT" => Scalar::Int64(values.len() as i64),
        "SUM" => {
            let total: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
            Scalar::Double(total)
        }
        "AVG" => {
            if values.is_empty() {
                Scalar::Null
            } else {
                let total: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
                Scalar::Double(total / values.len() as f64)
            }
        }
        "MIN" => values
            .into_iter()
            .reduce(|a, b| if compare_scalars(&a, &b).unwrap_or(Ordering::Equal) == Ordering::Greater { b } else { a })
            .unwrap_or(Scalar::Null),
        "MAX" => values
            .into_iter()
            .reduce(|a, b| if compare_scalars(&a, &b).unwrap_or(Ordering::Equal) == Ordering::Less { b } else { a })
            .unwrap_or(Scalar::Null),
        "COLLECT" => Scalar::List(values),
        other => return Err(Error::internal(format!("unknown aggregate function {other}"))),
    })
}

fn eval_scalar_function(name: &str, args: &[Scalar]) -> Result<Scalar> {
    match name {
        "ID" => Ok(args.first().cloned().unwrap_or(Scalar::Null)),
        "LENGTH" | "SIZE" => {
            let n = match args.first() {
                Some(Scalar::String(s)) => s.chars().count() as i64,
                Some(Scalar::List(items)) => items.len() as i64,
                _ => return Err(Error::runtime(format!("{name} expects a string or list argument"))),
            };
            Ok(Scalar::Int64(n))
        }
        "LIST" => Ok(Scalar::List(args.to_vec())),
        "ABS" => Ok(match args.first() {
            Some(v) => match v.as_f64() {
                Some(f) => Scalar::Double(f.abs()),
                None => return Err(Error::runtime("ABS expects a numeric argument")),
            },
            None => Scalar::Null,
        }),
        "UPPER" => Ok(Scalar::String(args.first().and_then(Scalar::as_str).unwrap_or("").to_ascii_uppercase())),
        "LOWER" => Ok(Scalar::String(args.first().and_then(Scalar::as_str).unwrap_or("").to_ascii_lowercase())),
        other => Err(Error::runtime(format!("unknown scalar function {other}"))),
    }
}

fn eval_binary(op: crate::ast::BinaryOp, left: &Scalar, right: &Scalar) -> Result<Scalar> {
    use crate::ast::BinaryOp::*;
    if matches!(op, Eq | Ne | Lt | Le | Gt | Ge) {
        if left.is_null() || right.is_null() {
            return Ok(Scalar::Null);
        }
        let ord = compare_scalars(left, right)
            .ok_or_else(|| Error::runtime("values are not comparable"))?;
        let b = match op {
            Eq => ord == Ordering::Equal,
            Ne => ord != Ordering::Equal,
            Lt => ord == Ordering::Less,
            Le => ord != Ordering::Greater,
            Gt => ord == Ordering::Greater,
            Ge => ord != Ordering::Less,
            _ => unreachable!(),
        };
        return Ok(Scalar::Bool(b));
    }
    match op {
        And => Ok(Scalar::Bool(left.as_bool().unwrap_or(false) && right.as_bool().unwrap_or(false))),
        Or => Ok(Scalar::Bool(left.as_bool().unwrap_or(false) || right.as_bool().unwrap_or(false))),
        Xor => Ok(Scalar::Bool(left.as_bool().unwrap_or(false) ^ right.as_bool().unwrap_or(false))),
        StartsWith => Ok(Scalar::Bool(
            left.as_str().unwrap_or("").starts_with(right.as_str().unwrap_or("")),
        )),
        EndsWith => {
            Ok(Scalar::Bool(left.as_str().unwrap_or("").ends_with(right.as_str().unwrap_or(""))))
        }
        Contains => {
            Ok(Scalar::Bool(left.as_str().unwrap_or("").contains(right.as_str().unwrap_or(""))))
        }
        Add | Sub | Mul | Div | Mod => {
            if left.is_null() || right.is_null() {
                return Ok(Scalar::Null);
            }
            let (a, b) = (
                left.as_f64().ok_or_else(|| Error::runtime("non-numeric operand"))?,
                right.as_f64().ok_or_else(|| Error::runtime("non-numeric operand"))?,
            );
            let result = match op {
                Add => a + b,
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                Mod => a % b,
                _ => unreachable!(),
            };
            Ok(Scalar::Double(result))
        }
        Eq | Ne | Lt | Le | Gt | Ge => unreachable!(),
    }
}

fn eval_unary(op: crate::ast::UnaryOp, operand: &Scalar) -> Result<Scalar> {
    use crate::ast::UnaryOp::*;
    match op {
        Not => Ok(Scalar::Bool(!operand.as_bool().unwrap_or(false))),
        Neg => Ok(match operand.as_f64() {
            Some(f) => Scalar::Double(-f),
            None => return Err(Error::runtime("cannot negate a non-numeric value")),
        }),
    }
}

fn scalars_equal(a: &Scalar, b: &Scalar) -> bool {
    compare_scalars(a, b) == Some(Ordering::Equal)
}

/// Orders scalars by numeric value when both sides are numeric, otherwise by
/// their canonical string form (`Scalar`'s `Display`); `NULL` sorts last,
/// matching Cypher's `ORDER BY` null-ordering default.
pub fn compare_scalars(a: &Scalar, b: &Scalar) -> Option<Ordering> {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Some(Ordering::Equal),
        (true, false) => return Some(Ordering::Greater),
        (false, true) => return Some(Ordering::Less),
        _ => {}
    }
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Scalar::Bool(x), Scalar::Bool(y)) = (a, b) {
        return x.partial_cmp(y);
    }
    Some(a.to_string().cmp(&b.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConflictAction, Multiplicity};
    use crate::config::Config;
    use crate::value::LogicalType;

    fn build_ctx() -> (Catalog, StorageEngine) {
        let mut cat = Catalog::new();
        let person = cat
            .create_node_table(
                "person",
                vec![("age".to_string(), LogicalType::Int64)],
                "id".into(),
                ConflictAction::Fail,
            )
            .unwrap();
        let knows = cat
            .create_rel_table("knows", person, person, Multiplicity::ManyToMany, vec![], ConflictAction::Fail)
            .unwrap();

        let mut config = Config::in_memory();
        config.storage.data_dir = ":memory:".into();
        let mut storage = StorageEngine::open(&config).unwrap();
        storage.register_node_table(person, 1, 0);
        storage.register_rel_table(knows, 0);

        let rows = vec![
            vec![Scalar::Int64(30)],
            vec![Scalar::Int64(40)],
            vec![Scalar::Int64(50)],
        ];
        storage.copy_node(&mut cat, person, rows).unwrap();
        // pk_ordinal is 0 (the `age` column), so the rows' own age values
        // double as lookup keys here.
        storage.insert_rels(&mut cat, knows, person, person, vec![(Scalar::Int64(30), Scalar::Int64(40), vec![])]).unwrap();
        (cat, storage)
    }

    #[test]
    fn scan_node_id_produces_one_row_per_stored_row() {
        let (cat, storage) = build_ctx();
        let person = cat.node_label_id("person").unwrap();
        let ctx = ExecutionContext { catalog: &cat, storage: &storage };
        let rows = execute(&LogicalOperator::ScanNodeId { alias: "a".into(), label: person }, &ctx).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn compare_scalars_sorts_nulls_last() {
        assert_eq!(compare_scalars(&Scalar::Null, &Scalar::Int64(1)), Some(Ordering::Greater));
        assert_eq!(compare_scalars(&Scalar::Int64(1), &Scalar::Int64(2)), Some(Ordering::Less));
    }
}
