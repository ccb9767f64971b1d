use crate::expression::{Expr, Operand};
use itertools::Itertools;

/// Scripting language of an in-engine function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Js,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Js => "js",
        }
    }
}

/// A user-defined function executed by the engine (`$function`).
///
/// The body is opaque source text; its arguments are ordinary expressions.
#[derive(Debug, Clone)]
pub struct ScriptFunction {
    body: String,
    args: Vec<Operand>,
    lang: Lang,
}

impl ScriptFunction {
    pub fn new(body: impl Into<String>, lang: Lang) -> Self {
        Self {
            body: body.into(),
            args: Vec::new(),
            lang,
        }
    }

    pub fn arg(mut self, arg: impl Into<Operand>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn into_expr(self) -> Expr {
        Expr::op(
            "$function",
            Operand::doc([
                ("body", Operand::from(self.body)),
                ("args", Operand::Array(self.args)),
                ("lang", self.lang.as_str().into()),
            ]),
        )
    }
}

impl From<ScriptFunction> for Expr {
    fn from(f: ScriptFunction) -> Self {
        f.into_expr()
    }
}

/// Body of the comparator function used by [`Expr::sort`].
///
/// Elements are compared by `key` when given, else by the engine's default
/// ordering. Whitespace is collapsed so the body is stable on the wire.
pub(crate) fn sort_body(key: Option<&str>, reverse: bool) -> String {
    let comp = key
        .map(|key| format!("(a, b) => a.{key} - b.{key}"))
        .unwrap_or_default();
    let rev = if reverse { ".reverse()" } else { "" };
    let body = format!(
        r#"
        function(array) {{
            array.sort({comp}){rev};
            return array;
        }}
        "#
    );
    body.split_whitespace().join(" ")
}
