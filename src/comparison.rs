use crate::expression::{Expr, Operand};
use serde_json::Value;

// Comparison operators ########################################################

impl Expr {
    /// `self == other`. Comparing against null tests that the value is
    /// missing or null.
    pub fn equals(&self, other: impl Into<Operand>) -> Expr {
        let other = other.into();
        if other.is_null() {
            return self.exists().invert();
        }
        self.binary("$eq", other)
    }

    /// `self != other`. Comparing against null is [`Expr::exists`].
    pub fn not_equals(&self, other: impl Into<Operand>) -> Expr {
        let other = other.into();
        if other.is_null() {
            return self.exists();
        }
        self.binary("$ne", other)
    }

    pub fn greater_or_equal(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$gte", other)
    }

    pub fn greater(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$gt", other)
    }

    pub fn less_or_equal(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$lte", other)
    }

    pub fn less(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$lt", other)
    }

    /// Whether the field exists and is not null. Every non-null value
    /// orders above null.
    pub fn exists(&self) -> Expr {
        self.binary("$gt", Value::Null)
    }

    /// Whether this value is one of `values`.
    pub fn is_in<T: Into<Operand>>(&self, values: impl IntoIterator<Item = T>) -> Expr {
        self.binary("$in", Operand::array(values))
    }
}

// Logical operators ###########################################################

impl Expr {
    pub fn and(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$and", other)
    }

    pub fn or(&self, other: impl Into<Operand>) -> Expr {
        self.binary("$or", other)
    }

    /// Logical negation, `{"$not": self}`.
    pub fn invert(&self) -> Expr {
        Expr::op("$not", self)
    }
}
