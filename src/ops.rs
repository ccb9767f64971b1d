//! Operator sugar over the named builder methods.
//!
//! `field("x") + 1` is `field("x").plus(1)`, `!e` is `e.invert()`, `a & b`
//! and `a | b` are `and`/`or`. A number on the left keeps its position:
//! `1 - field("x")` is `{"$subtract": [1, "$x"]}`.

use crate::expression::{Expr, Operand};
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Not, Rem, Sub};

macro_rules! binary_op {
    ($trait:ident, $method:ident, $named:ident, $tag:literal) => {
        impl<T: Into<Operand>> $trait<T> for Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                self.$named(rhs)
            }
        }

        impl<T: Into<Operand>> $trait<T> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                self.$named(rhs)
            }
        }

        binary_op!(@reversed $trait, $method, $tag, i32, i64, f64);
    };
    (@reversed $trait:ident, $method:ident, $tag:literal, $($lhs:ty),*) => {
        $(
            impl $trait<Expr> for $lhs {
                type Output = Expr;

                fn $method(self, rhs: Expr) -> Expr {
                    Expr::reversed($tag, self, &rhs)
                }
            }

            impl $trait<&Expr> for $lhs {
                type Output = Expr;

                fn $method(self, rhs: &Expr) -> Expr {
                    Expr::reversed($tag, self, rhs)
                }
            }
        )*
    };
}

binary_op!(Add, add, plus, "$add");
binary_op!(Sub, sub, minus, "$subtract");
binary_op!(Mul, mul, times, "$multiply");
binary_op!(Div, div, divided_by, "$divide");
binary_op!(Rem, rem, modulo, "$mod");

macro_rules! logical_op {
    ($trait:ident, $method:ident, $named:ident) => {
        impl<T: Into<Operand>> $trait<T> for Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                self.$named(rhs)
            }
        }

        impl<T: Into<Operand>> $trait<T> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                self.$named(rhs)
            }
        }
    };
}

logical_op!(BitAnd, bitand, and);
logical_op!(BitOr, bitor, or);

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.invert()
    }
}

impl Not for &Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.invert()
    }
}
