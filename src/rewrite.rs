//! Recursive walks over an expression tree: serialization, prefix freezing
//! and identity-based substitution.

use crate::expression::{Expr, Operand, Repr};
use serde_json::{json, Map, Value};
use tracing::trace;

/// Serializes `expr`. A frozen prefix on a node overrides `prefix` for that
/// node and everything beneath it.
pub(crate) fn to_wire(expr: &Expr, prefix: Option<&str>) -> Value {
    let prefix = expr.prefix().or(prefix);
    match &expr.0.repr {
        Repr::Field(name) => Value::String(field_path(name, prefix)),
        Repr::ObjectId(oid) => json!({ "$toObjectId": oid }),
        Repr::Operand(operand) => operand_to_wire(operand, prefix),
    }
}

fn operand_to_wire(operand: &Operand, prefix: Option<&str>) -> Value {
    match operand {
        Operand::Literal(v) => v.clone(),
        Operand::Expr(e) => to_wire(e, prefix),
        Operand::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| operand_to_wire(item, prefix))
                .collect(),
        ),
        Operand::Document(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), operand_to_wire(v, prefix)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

/// Resolves a field name against a prefix.
///
/// Without a prefix fields are document paths (`$name`, or `$this` for the
/// current document); with one they are paths under that variable.
pub(crate) fn field_path(name: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) if !p.is_empty() => {
            if name.is_empty() {
                p.to_string()
            } else {
                format!("{p}.{name}")
            }
        }
        _ => {
            if name.is_empty() {
                "$this".to_string()
            } else {
                format!("${name}")
            }
        }
    }
}

/// Freezes `expr` and every unfrozen node reachable from it to `prefix`.
///
/// Frozen subtrees are left alone, so the first freeze always wins.
pub(crate) fn freeze(expr: &Expr, prefix: &str) {
    if let Err(_rejected) = expr.0.prefix.set(prefix.to_string()) {
        trace!(
            requested = prefix,
            kept = expr.prefix().unwrap_or_default(),
            "expression already frozen"
        );
        return;
    }
    if let Repr::Operand(operand) = &expr.0.repr {
        freeze_operand(operand, prefix);
    }
}

fn freeze_operand(operand: &Operand, prefix: &str) {
    match operand {
        Operand::Literal(_) => {}
        Operand::Expr(e) => freeze(e, prefix),
        Operand::Array(items) => items.iter().for_each(|item| freeze_operand(item, prefix)),
        Operand::Document(entries) => entries
            .iter()
            .for_each(|(_, v)| freeze_operand(v, prefix)),
    }
}

/// Returns `expr` with every occurrence of the node `old` replaced by `new`.
///
/// Matching is by identity. Nodes on the path to a replacement are rebuilt
/// with their frozen prefix intact; untouched subtrees are shared.
pub(crate) fn substitute_expr(expr: &Expr, old: &Expr, new: &Expr) -> Expr {
    if expr.ptr_eq(old) {
        return new.clone();
    }
    match &expr.0.repr {
        Repr::Operand(operand) => match substitute(operand, old, new) {
            Some(rewritten) => Expr::rebuild(rewritten, expr.prefix()),
            None => expr.clone(),
        },
        Repr::Field(_) | Repr::ObjectId(_) => expr.clone(),
    }
}

// `None` means nothing below `operand` changed.
fn substitute(operand: &Operand, old: &Expr, new: &Expr) -> Option<Operand> {
    match operand {
        Operand::Literal(_) => None,
        Operand::Expr(e) => {
            let rewritten = substitute_expr(e, old, new);
            (!rewritten.ptr_eq(e)).then_some(Operand::Expr(rewritten))
        }
        Operand::Array(items) => {
            let rewritten: Vec<Option<Operand>> =
                items.iter().map(|item| substitute(item, old, new)).collect();
            if rewritten.iter().all(Option::is_none) {
                return None;
            }
            Some(Operand::Array(
                items
                    .iter()
                    .zip(rewritten)
                    .map(|(item, r)| r.unwrap_or_else(|| item.clone()))
                    .collect(),
            ))
        }
        Operand::Document(entries) => {
            let rewritten: Vec<Option<Operand>> = entries
                .iter()
                .map(|(_, v)| substitute(v, old, new))
                .collect();
            if rewritten.iter().all(Option::is_none) {
                return None;
            }
            Some(Operand::Document(
                entries
                    .iter()
                    .zip(rewritten)
                    .map(|((k, v), r)| (k.clone(), r.unwrap_or_else(|| v.clone())))
                    .collect(),
            ))
        }
    }
}
