use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

// Errors raised while building an expression tree. Serialization itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    // Identifier literal is not a 24-digit hexadecimal string
    #[error("invalid identifier: '{0}' is not a 24-character hex string")]
    InvalidIdentifier(String),

    // Slices only support a step of 1
    #[error("unsupported slice step {0}; only a step of 1 is supported")]
    UnsupportedSliceStep(i64),

    // Malformed operand passed to a builder, with a description of the expected shape
    #[error("invalid operand shape: {0}")]
    InvalidOperandShape(String),
}

// Type alias for results that use `ExprError` as the error type
pub type Result<T> = std::result::Result<T, ExprError>;
