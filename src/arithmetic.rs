use crate::expression::{Expr, Operand};

// Numeric expression operators ################################################

impl Expr {
    /// `self + other`
    pub fn plus(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$add", other)
    }

    /// `self - other`
    pub fn minus(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$subtract", other)
    }

    /// `self * other`
    pub fn times(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$multiply", other)
    }

    /// `self / other`
    pub fn divided_by(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$divide", other)
    }

    /// `self % other`
    pub fn modulo(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$mod", other)
    }

    pub fn pow(&self, power: impl Into<Operand>) -> Expr {
        self.binary("$pow", power)
    }

    pub fn abs(&self) -> Expr {
        Expr::op("$abs", self)
    }

    pub fn floor(&self) -> Expr {
        Expr::op("$floor", self)
    }

    pub fn ceil(&self) -> Expr {
        Expr::op("$ceil", self)
    }

    /// Rounds at the given decimal place: positive places keep that many
    /// fractional digits, negative places round digits left of the point.
    ///
    /// ```text
    /// place=2:  1234.5678 --> 1234.57
    /// place=-2: 1234.5678 --> 1200
    /// ```
    pub fn round(&self, place: i32) -> Expr {
        self.binary("$round", place)
    }

    /// Truncates at the given decimal place; negative places zero out digits
    /// left of the point.
    pub fn trunc(&self, place: i32) -> Expr {
        self.binary("$trunc", place)
    }

    pub fn exp(&self) -> Expr {
        Expr::op("$exp", self)
    }

    pub fn ln(&self) -> Expr {
        Expr::op("$ln", self)
    }

    pub fn log(&self, base: impl Into<Operand>) -> Expr {
        self.binary("$log", base)
    }

    pub fn log10(&self) -> Expr {
        Expr::op("$log10", self)
    }

    pub fn sqrt(&self) -> Expr {
        Expr::op("$sqrt", self)
    }

    /// `{tag: [lhs, rhs]}` for a literal on the left-hand side.
    pub(crate) fn reversed(tag: &str, lhs: impl Into<Operand>, rhs: &Expr) -> Expr {
        Expr::op(tag, Operand::Array(vec![lhs.into(), rhs.into()]))
    }
}
