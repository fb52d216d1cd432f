//! WHERE clause builder
//!
//! Compiles a filter tree into a boolean clause with named placeholders and
//! the matching parameter map. Column references are `alias.key`; relation
//! sub-filters switch the alias to the relation's property name, which is the
//! alias the join planner registers for it.

use serde_json::Value;

use crate::data::schema::RelationMap;

use super::operators::{Arity, Operator};
use super::types::{FilterNode, FilterValue, LogicalOp};

/// Named parameter values, in the order they were generated
pub type Parameters = serde_json::Map<String, Value>;

/// Parameter name counter shared by every recursive step of one compilation
///
/// Names are `param0`, `param1`, ... A fresh counter must be used for each
/// compilation and the same counter for all of its sub-trees, otherwise
/// nested clauses reuse names and overwrite each other's bindings.
#[derive(Debug, Default)]
pub struct ParamIndex {
    index: usize,
}

impl ParamIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next parameter name
    pub fn next_name(&mut self) -> String {
        let name = format!("param{}", self.index);
        self.index += 1;
        name
    }

    /// Number of names handed out so far
    pub fn issued(&self) -> usize {
        self.index
    }
}

/// Compiled clause and its parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildResult {
    pub clause: String,
    pub parameters: Parameters,
}

impl BuildResult {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

/// Compile `node` against `alias`
///
/// Clauses for the keys of a node are joined with `AND`. Fragments that
/// compile to nothing (unknown operators, empty combinators, relation keys
/// without a nested object) are dropped without error.
pub fn build_where_clause(
    node: &FilterNode,
    alias: &str,
    relations: &RelationMap,
    params: &mut ParamIndex,
) -> BuildResult {
    let mut clauses: Vec<String> = Vec::new();
    let mut parameters = Parameters::new();

    for (key, value) in node.entries() {
        if let FilterValue::Combinator(op, nodes) = value {
            let sub: Vec<String> = nodes
                .iter()
                .map(|item| {
                    let res = build_where_clause(item, alias, relations, params);
                    parameters.extend(res.parameters);
                    res.clause
                })
                .filter(|clause| !clause.is_empty())
                .collect();
            if !sub.is_empty() {
                let joined = sub.join(op.separator());
                clauses.push(match op {
                    LogicalOp::Not => format!("(NOT {})", joined),
                    LogicalOp::And | LogicalOp::Or => format!("({})", joined),
                });
            }
            continue;
        }

        if let Some(nested) = relations.get(key) {
            match value {
                FilterValue::Mapping { node: sub_node, .. } => {
                    let res = build_where_clause(sub_node, key, nested, params);
                    parameters.extend(res.parameters);
                    if !res.clause.is_empty() {
                        clauses.push(format!("({})", res.clause));
                    }
                }
                _ => {
                    tracing::trace!(relation = key, "Relation filter is not an object, skipped");
                }
            }
            continue;
        }

        let column = format!("{}.{}", alias, key);
        match value {
            FilterValue::Sequence(items) => {
                let p = params.next_name();
                clauses.push(format!("{} IN (:...{})", column, p));
                parameters.insert(p, Value::Array(items.clone()));
            }
            FilterValue::Mapping { raw: ops, .. } => {
                for (name, operand) in ops {
                    match Operator::parse(name) {
                        Some(op) => clauses.push(build_operator_clause(
                            op,
                            &column,
                            operand,
                            params,
                            &mut parameters,
                        )),
                        None => {
                            tracing::trace!(operator = %name, column = %column, "Unknown operator skipped");
                        }
                    }
                }
            }
            FilterValue::Scalar(scalar) => {
                let p = params.next_name();
                clauses.push(format!("{} = :{}", column, p));
                parameters.insert(p, scalar.clone());
            }
            // handled above
            FilterValue::Combinator(..) => {}
        }
    }

    BuildResult {
        clause: clauses.join(" AND "),
        parameters,
    }
}

fn build_operator_clause(
    op: Operator,
    column: &str,
    operand: &Value,
    params: &mut ParamIndex,
    parameters: &mut Parameters,
) -> String {
    match op {
        Operator::IsEmpty => format!(
            "(array_length({col},1)=0 OR {col} IS NULL)",
            col = column
        ),
        Operator::IsNotEmpty => format!("array_length({},1)>0", column),
        _ => match op.arity() {
            Arity::Nullary => format!("{} {}", column, op.sql()),
            Arity::List => {
                let p = params.next_name();
                parameters.insert(p.clone(), operand.clone());
                format!("{} {} (:...{})", column, op.sql(), p)
            }
            Arity::Pair => {
                let p1 = params.next_name();
                let p2 = params.next_name();
                let (low, high) = match operand {
                    Value::Array(items) => (
                        items.first().cloned().unwrap_or(Value::Null),
                        items.get(1).cloned().unwrap_or(Value::Null),
                    ),
                    _ => (Value::Null, Value::Null),
                };
                parameters.insert(p1.clone(), low);
                parameters.insert(p2.clone(), high);
                format!("{} {} :{} AND :{}", column, op.sql(), p1, p2)
            }
            Arity::Unary => {
                let p = params.next_name();
                parameters.insert(p.clone(), operand.clone());
                format!("{} {} :{}", column, op.sql(), p)
            }
        },
    }
}
