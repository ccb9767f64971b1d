// src/expression.rs
use crate::context::{Context, Scope, EXPR_VAR, THIS_VAR};
use crate::errors::{ExprError, Result};
use crate::field::field;
use crate::rewrite;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// An expression that compiles to an aggregation expression.
///
/// `Expr` is a cheap handle: cloning it shares the underlying node, and
/// `==`/`Hash` compare that identity rather than the tree. Use
/// [`Expr::equals`] to build an equality test.
#[derive(Clone)]
pub struct Expr(pub(crate) Arc<Node>);

pub(crate) struct Node {
    pub(crate) repr: Repr,
    /// Write-once scope prefix. Once set, the node resolves against it no
    /// matter where it is serialized.
    pub(crate) prefix: OnceLock<String>,
}

pub(crate) enum Repr {
    Operand(Operand),
    Field(String),
    ObjectId(String),
}

/// Payload of an expression node.
#[derive(Debug, Clone)]
pub enum Operand {
    Literal(Value),
    Expr(Expr),
    Array(Vec<Operand>),
    /// Ordered string-keyed document, e.g. `{"$add": [a, b]}`.
    Document(Vec<(String, Operand)>),
}

impl Operand {
    /// Single-key document `{tag: operand}`.
    pub fn op(tag: &str, operand: impl Into<Operand>) -> Self {
        Operand::Document(vec![(tag.to_string(), operand.into())])
    }

    pub fn doc<K: Into<String>>(entries: impl IntoIterator<Item = (K, Operand)>) -> Self {
        Operand::Document(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array<T: Into<Operand>>(items: impl IntoIterator<Item = T>) -> Self {
        Operand::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Literal(Value::Null))
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Literal(v)
    }
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Expr(e)
    }
}

impl From<&Expr> for Operand {
    fn from(e: &Expr) -> Self {
        Operand::Expr(e.clone())
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Literal(Value::String(s.to_string()))
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Literal(Value::String(s))
    }
}

macro_rules! literal_operand {
    ($($t:ty),*) => {
        $(impl From<$t> for Operand {
            fn from(v: $t) -> Self {
                Operand::Literal(Value::from(v))
            }
        })*
    };
}

literal_operand!(bool, i32, i64, u32, u64, usize, f64);

impl<T: Into<Operand>> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Operand::array(items)
    }
}

impl<T: Into<Operand>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Operand::Literal(Value::Null))
    }
}

fn let_expr(vars: Vec<(String, Operand)>, body: impl Into<Operand>) -> Expr {
    Expr::op(
        "$let",
        Operand::doc([("vars", Operand::Document(vars)), ("in", body.into())]),
    )
}

impl Expr {
    /// Wraps a literal, document or list payload in an expression.
    pub fn new(payload: impl Into<Operand>) -> Expr {
        Expr::from_repr(Repr::Operand(payload.into()))
    }

    pub(crate) fn from_repr(repr: Repr) -> Expr {
        Expr(Arc::new(Node {
            repr,
            prefix: OnceLock::new(),
        }))
    }

    /// Rebuilds a node around a new payload, carrying over a frozen prefix.
    pub(crate) fn rebuild(payload: Operand, prefix: Option<&str>) -> Expr {
        let prefix = prefix.map(|p| OnceLock::from(p.to_string())).unwrap_or_default();
        Expr(Arc::new(Node {
            repr: Repr::Operand(payload),
            prefix,
        }))
    }

    /// `{tag: operand}`
    pub(crate) fn op(tag: &str, operand: impl Into<Operand>) -> Expr {
        Expr::new(Operand::op(tag, operand))
    }

    /// `{tag: [self, other]}`
    pub(crate) fn binary(&self, tag: &str, other: impl Into<Operand>) -> Expr {
        Expr::op(tag, Operand::Array(vec![self.into(), other.into()]))
    }

    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_frozen(&self) -> bool {
        self.0.prefix.get().is_some()
    }

    /// The frozen prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.0.prefix.get().map(String::as_str)
    }

    /// Binds every unfrozen node in this tree to `prefix`. Already-frozen
    /// nodes keep their prefix.
    pub(crate) fn freeze_prefix(&self, prefix: &str) {
        rewrite::freeze(self, prefix);
    }

    /// Whether this is a bare field or identifier reference.
    pub fn is_reference(&self) -> bool {
        matches!(self.0.repr, Repr::Field(_) | Repr::ObjectId(_))
    }

    /// Serializes the expression in the given context.
    pub fn to_wire(&self, ctx: &Context) -> Value {
        self.to_mongo(ctx.prefix())
    }

    /// Serializes the expression, resolving unfrozen fields against `prefix`.
    pub fn to_mongo(&self, prefix: Option<&str>) -> Value {
        trace!(prefix, frozen = self.prefix(), "serializing expression");
        rewrite::to_wire(self, prefix)
    }

    // Scoping and binding #####################################################

    /// Evaluates `expr` with fields resolved relative to this expression.
    pub fn apply(&self, expr: &Expr) -> Expr {
        expr.freeze_prefix(&Scope::Expr.prefix());
        let_expr(vec![(EXPR_VAR.to_string(), self.into())], expr)
    }

    /// `$cond` on this expression.
    pub fn if_else(&self, true_expr: impl Into<Operand>, false_expr: impl Into<Operand>) -> Expr {
        Expr::op(
            "$cond",
            Operand::doc([
                ("if", self.into()),
                ("then", true_expr.into()),
                ("else", false_expr.into()),
            ]),
        )
    }

    /// Evaluates each condition against this expression in order and returns
    /// the value of the first one that is true, else `default`.
    pub fn switch<V: Into<Operand>>(
        &self,
        mapping: impl IntoIterator<Item = (Expr, V)>,
        default: Option<Operand>,
    ) -> Result<Expr> {
        let expr_prefix = Scope::Expr.prefix();
        let branches: Vec<Operand> = mapping
            .into_iter()
            .map(|(case, then)| {
                case.freeze_prefix(&expr_prefix);
                Operand::doc([("case", Operand::from(case)), ("then", then.into())])
            })
            .collect();
        if branches.is_empty() {
            return Err(ExprError::InvalidOperandShape(
                "switch requires at least one (condition, value) branch".into(),
            ));
        }

        let mut switch = vec![("branches".to_string(), Operand::Array(branches))];
        if let Some(default) = default.filter(|d| !d.is_null()) {
            switch.push(("default".to_string(), default));
        }
        Ok(let_expr(
            vec![(EXPR_VAR.to_string(), self.into())],
            Operand::op("$switch", Operand::Document(switch)),
        ))
    }

    /// `switch` where each key is a value compared for equality with this
    /// expression.
    pub fn cases<K: Into<Operand>, V: Into<Operand>>(
        &self,
        mapping: impl IntoIterator<Item = (K, V)>,
        default: Option<Operand>,
    ) -> Result<Expr> {
        let mapping = mapping
            .into_iter()
            .map(|(k, v)| (field("").equals(k), v))
            .collect::<Vec<_>>();
        self.switch(mapping, default)
    }

    /// Replaces this expression's value via a lookup table, leaving values
    /// that are not keys untouched.
    pub fn map_values<K: Into<Operand>, V: Into<Operand>>(
        &self,
        mapping: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Expr> {
        let (keys, values): (Vec<Operand>, Vec<Operand>) = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        if keys.is_empty() {
            return Err(ExprError::InvalidOperandShape(
                "map_values requires a non-empty mapping".into(),
            ));
        }

        let this = Operand::from("$$this");
        let keys_var = Operand::from("$$keys");
        let lookup = Operand::op(
            "$cond",
            Operand::Array(vec![
                Operand::op("$in", Operand::Array(vec![this.clone(), keys_var.clone()])),
                Operand::op(
                    "$arrayElemAt",
                    Operand::Array(vec![
                        "$$values".into(),
                        Operand::op("$indexOfArray", Operand::Array(vec![keys_var, this.clone()])),
                    ]),
                ),
                this,
            ]),
        );
        Ok(let_expr(
            vec![
                (THIS_VAR.to_string(), self.into()),
                ("keys".to_string(), Operand::Array(keys)),
                ("values".to_string(), Operand::Array(values)),
            ],
            lookup,
        ))
    }

    /// Sets `path` (possibly dotted) on the document this expression resolves
    /// to. An unfrozen expression value is evaluated relative to the document.
    pub fn set_field(&self, path: &str, value: impl Into<Operand>) -> Expr {
        let value = match value.into() {
            Operand::Expr(e) if !e.is_frozen() => Operand::from(self.apply(&e)),
            other => other,
        };

        let full = format!("{}.{}", Scope::Expr.prefix(), path);
        let chunks: Vec<&str> = full.split('.').collect();
        let mut expr = value;
        for idx in (1..chunks.len()).rev() {
            let parent = chunks[..idx].join(".");
            expr = Operand::op(
                "$mergeObjects",
                Operand::Array(vec![
                    parent.into(),
                    Operand::doc([(chunks[idx], expr)]),
                ]),
            );
        }
        self.bind(&Expr::new(expr), EXPR_VAR)
    }

    /// Evaluates this expression once and substitutes the result for every
    /// occurrence of it inside `expr`. Bare references are returned as-is.
    pub fn let_in(&self, expr: &Expr) -> Expr {
        if self.is_reference() {
            return expr.clone();
        }
        self.bind(expr, EXPR_VAR)
    }

    fn bind(&self, expr: &Expr, var: &str) -> Expr {
        debug!(var, "binding computed subexpression");
        let var_ref = field(&format!("$${var}"));
        let body = rewrite::substitute_expr(expr, self, &var_ref);
        let_expr(vec![(var.to_string(), self.into())], body)
    }

    // Generic field operators #################################################

    /// `$type`
    pub fn type_of(&self) -> Expr {
        Expr::op("$type", self)
    }

    pub fn is_null(&self) -> Expr {
        self.equals(Value::Null)
    }

    pub fn is_number(&self) -> Expr {
        Expr::op("$isNumber", self)
    }

    pub fn is_string(&self) -> Expr {
        self.type_of().equals("string")
    }

    pub fn is_array(&self) -> Expr {
        Expr::op("$isArray", self)
    }

    pub fn is_missing(&self) -> Expr {
        self.type_of().equals("missing")
    }

    /// Minimum of this array, or of this value and `other`.
    pub fn min(&self, other: Option<Operand>) -> Expr {
        match other {
            Some(other) => self.binary("$min", other),
            None => Expr::op("$min", self),
        }
    }

    /// Maximum of this array, or of this value and `other`.
    pub fn max(&self, other: Option<Operand>) -> Expr {
        match other {
            Some(other) => self.binary("$max", other),
            None => Expr::op("$max", self),
        }
    }

    // Static builders #########################################################

    /// `$literal`: the value is not interpreted as an expression.
    pub fn literal(value: impl Into<Operand>) -> Expr {
        Expr::op("$literal", value)
    }

    /// A random float in `[0, 1)`.
    pub fn rand() -> Expr {
        Expr::op("$rand", Operand::Document(Vec::new()))
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.to_mongo(None)).finish()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pretty = serde_json::to_string_pretty(&self.to_mongo(None)).map_err(|_| fmt::Error)?;
        f.write_str(&pretty)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_mongo(None).serialize(serializer)
    }
}
