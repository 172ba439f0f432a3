//! `EXPLAIN`-style plan tracing: renders a [`crate::planner::LogicalOperator`]
//! tree as the compact shape string used throughout the planner's tests
//! (`S(a)`, `E(b)S(a)`, `HJ(b){..}{..}`), and a human-readable indented form
//! for ad-hoc inspection, mirroring the teacher's dedicated plan-printing
//! helper rather than a `Debug` dump.

use crate::planner::{LogicalOperator, LogicalPlan};

/// The compact join-shape encoding (§8 scenario assertions compare against
/// this, not the full operator tree).
pub fn shape(plan: &LogicalPlan) -> String {
    plan.root.shape()
}

/// A multi-line, indented rendering of the full operator tree, including
/// projection/aggregate/order/limit operators the compact shape omits.
pub fn pretty(plan: &LogicalPlan) -> String {
    let mut out = String::new();
    render(&plan.root, 0, &mut out);
    out
}

fn render(op: &LogicalOperator, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match op {
        LogicalOperator::ScanNodeId { alias, label } => {
            out.push_str(&format!("{indent}ScanNodeId({alias}: label {label})\n"));
        }
        LogicalOperator::Extend { rel_alias, direction, bound_alias, nbr_alias, input, .. } => {
            out.push_str(&format!(
                "{indent}Extend({bound_alias} -{rel_alias}-> {nbr_alias}, {direction:?})\n"
            ));
            render(input, depth + 1, out);
        }
        LogicalOperator::HashJoin { join_var, build, probe } => {
            out.push_str(&format!("{indent}HashJoin(on {join_var})\n"));
            out.push_str(&format!("{indent}  build:\n"));
            render(build, depth + 2, out);
            out.push_str(&format!("{indent}  probe:\n"));
            render(probe, depth + 2, out);
        }
        LogicalOperator::Filter { input, .. } => {
            out.push_str(&format!("{indent}Filter\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::ScanNodeProperty { alias, property, input } => {
            out.push_str(&format!("{indent}ScanNodeProperty({alias}.{property})\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::ScanRelProperty { alias, property, input, .. } => {
            out.push_str(&format!("{indent}ScanRelProperty({alias}.{property})\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::Unwind { alias, input, .. } => {
            out.push_str(&format!("{indent}Unwind({alias})\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::Projection { items, input } => {
            let cols: Vec<&str> = items.iter().map(|(a, _)| a.as_str()).collect();
            out.push_str(&format!("{indent}Projection({})\n", cols.join(", ")));
            render(input, depth + 1, out);
        }
        LogicalOperator::Aggregate { group_keys, aggregates, input } => {
            out.push_str(&format!(
                "{indent}Aggregate(group={}, agg={})\n",
                group_keys.len(),
                aggregates.len()
            ));
            render(input, depth + 1, out);
        }
        LogicalOperator::OrderBy { input, .. } => {
            out.push_str(&format!("{indent}OrderBy\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::Distinct { input } => {
            out.push_str(&format!("{indent}Distinct\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::Skip { count, input } => {
            out.push_str(&format!("{indent}Skip({count})\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::Limit { count, input } => {
            out.push_str(&format!("{indent}Limit({count})\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::SetProperty { input, .. } => {
            out.push_str(&format!("{indent}Set\n"));
            render(input, depth + 1, out);
        }
        LogicalOperator::EmptyResult => {
            out.push_str(&format!("{indent}EmptyResult\n"));
        }
        LogicalOperator::Union { inputs, all } => {
            out.push_str(&format!("{indent}Union(all={all})\n"));
            for i in inputs {
                render(i, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ConflictAction, Multiplicity};
    use crate::planner::plan_single_query;
    use crate::statistics::StatisticsSnapshot;

    #[test]
    fn shape_matches_s3_cheaper_forward_extend() {
        let mut cat = Catalog::new();
        let person = cat
            .create_node_table(
                "person",
                vec![("age".to_string(), crate::value::LogicalType::Int64)],
                "id".into(),
                ConflictAction::Fail,
            )
            .unwrap();
        cat.set_node_row_count(person, 10_000);
        let knows = cat
            .create_rel_table("knows", person, person, Multiplicity::ManyToMany, vec![], ConflictAction::Fail)
            .unwrap();
        cat.set_rel_row_count(knows, crate::catalog::Direction::Forward, 100_000);
        cat.set_rel_row_count(knows, crate::catalog::Direction::Backward, 200_000);

        let stmt = crate::parser::parse("MATCH (a:person)-[:knows]->(b:person) RETURN MIN(a.age);").unwrap();
        let crate::binder::BoundStatement::Query(q) = crate::binder::bind(&stmt, &cat).unwrap() else {
            panic!("expected query")
        };
        let stats = StatisticsSnapshot::capture(&cat);
        let plan = plan_single_query(&q.queries[0], &cat, &stats).unwrap();
        assert!(shape(&plan).contains("E(b)S(a)"));
    }
}
