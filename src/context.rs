use serde::{Deserialize, Serialize};

/// Variable bound to the receiver by `apply`, `switch`, `let_in` and `set_field`.
pub const EXPR_VAR: &str = "expr";

/// Variable bound to the current element by `filter`, `map` and `reduce`.
pub const THIS_VAR: &str = "this";

/// Variable holding the running accumulator inside `reduce`.
pub const VALUE_VAR: &str = "value";

/// A scope that field references can be frozen into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `$$expr`
    Expr,
    /// `$$this`
    This,
    /// `$$value`
    Value,
}

impl Scope {
    pub fn var(self) -> &'static str {
        match self {
            Scope::Expr => EXPR_VAR,
            Scope::This => THIS_VAR,
            Scope::Value => VALUE_VAR,
        }
    }

    /// The prefix that field references resolve against inside this scope.
    pub fn prefix(self) -> String {
        format!("$${}", self.var())
    }
}

/// Serialization context.
///
/// Carries the prefix that unfrozen field references are resolved against.
/// The default context resolves everything from the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Context {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    pub fn scoped(scope: Scope) -> Self {
        Self::with_prefix(scope.prefix())
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}
