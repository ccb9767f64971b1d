use crate::context::VALUE_VAR;
use crate::errors::{ExprError, Result};
use crate::expression::{Expr, Repr};
use std::sync::LazyLock;

/// Length of a hex-encoded object identifier.
const OBJECT_ID_HEX_LEN: usize = 24;

/// The running accumulator inside [`Expr::reduce`], i.e. `$$value`.
pub static VALUE: LazyLock<Expr> = LazyLock::new(|| field(&format!("$${VALUE_VAR}")));

/// A reference to a (possibly dotted) field of the current document.
///
/// An empty name refers to the current document itself. A leading `$`
/// anchors the reference to the document root: it resolves the same way no
/// matter which `apply`/`filter`/`map` it ends up inside.
pub fn field(name: &str) -> Expr {
    match name.strip_prefix('$') {
        Some(rooted) => {
            let expr = Expr::from_repr(Repr::Field(rooted.to_string()));
            expr.freeze_prefix("");
            expr
        }
        None => Expr::from_repr(Repr::Field(name.to_string())),
    }
}

/// An object identifier literal, converted by the engine via `$toObjectId`.
pub fn object_id(oid: &str) -> Result<Expr> {
    if oid.len() != OBJECT_ID_HEX_LEN || !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ExprError::InvalidIdentifier(oid.to_string()));
    }
    Ok(Expr::from_repr(Repr::ObjectId(oid.to_string())))
}
