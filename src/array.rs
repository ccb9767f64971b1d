use crate::context::Scope;
use crate::errors::{ExprError, Result};
use crate::expression::{Expr, Operand};
use crate::field::{field, VALUE};
use crate::functions::{sort_body, Lang, ScriptFunction};

fn slice(items: Vec<Operand>) -> Expr {
    Expr::op("$slice", Operand::Array(items))
}

// Array expression operators ##################################################

impl Expr {
    /// The element at `index`; negative indexes count from the end.
    pub fn get(&self, index: impl Into<Operand>) -> Expr {
        self.binary("$arrayElemAt", index)
    }

    /// `self[start:stop:step]`. Only a step of 1 is supported.
    pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Expr> {
        match step {
            None | Some(1) => Ok(self.slice_range(start, stop)),
            Some(step) => Err(ExprError::UnsupportedSliceStep(step)),
        }
    }

    pub(crate) fn slice_range(&self, start: Option<i64>, stop: Option<i64>) -> Expr {
        match (start, stop) {
            (None, None) => self.clone(),
            (None, Some(stop)) if stop < 0 => {
                let n = self.length().plus(stop);
                self.let_in(&slice(vec![self.into(), n.into()]))
            }
            (None, Some(stop)) => slice(vec![self.into(), stop.into()]),
            (Some(start), None) => {
                let n = self.length();
                self.let_in(&slice(vec![self.into(), start.into(), n.into()]))
            }
            (Some(start), Some(stop)) => {
                // Saturates so extreme bounds still give a count the engine clamps.
                let n = stop.saturating_sub(start);
                if n < 0 {
                    return Expr::literal(Operand::Array(Vec::new()));
                }
                if start < 0 {
                    let position = Expr::reversed("$add", start, &self.length());
                    return self.let_in(&slice(vec![self.into(), position.into(), n.into()]));
                }
                slice(vec![self.into(), start.into(), n.into()])
            }
        }
    }

    /// Number of elements; a missing or null array has length 0.
    pub fn length(&self) -> Expr {
        Expr::op(
            "$size",
            Operand::op("$ifNull", Operand::Array(vec![self.into(), Operand::Array(Vec::new())])),
        )
    }

    /// Whether the array contains `value`.
    pub fn contains(&self, value: impl Into<Operand>) -> Expr {
        Expr::reversed("$in", value, self)
    }

    pub fn reverse(&self) -> Expr {
        Expr::op("$reverseArray", self)
    }

    /// Sorts the array, by the (possibly dotted) `key` of each element when
    /// given. Runs as an in-engine script function.
    pub fn sort(&self, key: Option<&str>, reverse: bool) -> Expr {
        ScriptFunction::new(sort_body(key, reverse), Lang::Js)
            .arg(self)
            .into_expr()
    }

    /// Keeps the elements for which `expr` is true. Fields in `expr` resolve
    /// against each element.
    pub fn filter(&self, expr: &Expr) -> Expr {
        expr.freeze_prefix(&Scope::This.prefix());
        Expr::op(
            "$filter",
            Operand::doc([("input", self.into()), ("cond", expr.into())]),
        )
    }

    /// Applies `expr` to each element.
    pub fn map(&self, expr: &Expr) -> Expr {
        expr.freeze_prefix(&Scope::This.prefix());
        Expr::op(
            "$map",
            Operand::doc([
                ("input", self.into()),
                ("as", Scope::This.var().into()),
                ("in", expr.into()),
            ]),
        )
    }

    /// Folds the array. Inside `expr`, fields resolve against the current
    /// element and [`VALUE`] is the accumulator.
    pub fn reduce(&self, expr: &Expr, init_val: impl Into<Operand>) -> Expr {
        expr.freeze_prefix(&Scope::This.prefix());
        Expr::op(
            "$reduce",
            Operand::doc([
                ("input", self.into()),
                ("initialValue", init_val.into()),
                ("in", expr.into()),
            ]),
        )
    }

    /// Concatenates this array with each of `arrays`.
    pub fn extend<T: Into<Operand>>(&self, arrays: impl IntoIterator<Item = T>) -> Expr {
        let mut inputs = vec![Operand::from(self)];
        inputs.extend(arrays.into_iter().map(Into::into));
        Expr::op("$concatArrays", Operand::Array(inputs))
    }

    pub fn prepend(&self, value: impl Into<Operand>) -> Expr {
        Expr::new(Operand::Array(vec![value.into()])).extend([self])
    }

    pub fn append(&self, value: impl Into<Operand>) -> Expr {
        self.extend([Operand::Array(vec![value.into()])])
    }

    /// Inserts `value` before `index`. Out-of-range indexes clamp to the
    /// array bounds.
    pub fn insert(&self, index: i64, value: impl Into<Operand>) -> Expr {
        let expr = self.slice_range(None, Some(index)).extend([
            Operand::Array(vec![value.into()]),
            self.slice_range(Some(index), None).into(),
        ]);
        self.let_in(&expr)
    }

    pub fn sum(&self) -> Expr {
        Expr::op("$sum", self)
    }

    pub fn mean(&self) -> Expr {
        Expr::op("$avg", self)
    }

    /// Joins an array of strings with `delimiter`.
    pub fn join(&self, delimiter: &str) -> Expr {
        let step = VALUE.concat([Operand::from(delimiter), field("").into()]);
        self.reduce(&step, "")
            .substr(Some(delimiter.len() as i64), None, None)
    }

    // Static array builders ###################################################

    /// `[start, stop)`
    pub fn range(start: impl Into<Operand>, stop: impl Into<Operand>) -> Expr {
        Expr::op("$range", Operand::Array(vec![start.into(), stop.into()]))
    }

    /// `[0, stop)`
    pub fn range_to(stop: impl Into<Operand>) -> Expr {
        Expr::range(0, stop)
    }

    /// Pairs each element of `array` with its index, counting from `start`.
    pub fn enumerate(array: &Expr, start: i64) -> Expr {
        let stop = Expr::reversed("$add", start, &array.length());
        let zipped = zip_inputs(vec![Expr::range(start, stop).into(), array.into()], None);
        array.let_in(&zipped)
    }

    /// Transposes `inputs` into an array of tuples.
    ///
    /// Stops at the shortest input unless `use_longest` is set, in which case
    /// shorter inputs are padded with the matching entry of `defaults`, or
    /// null.
    pub fn zip<T: Into<Operand>>(
        inputs: impl IntoIterator<Item = T>,
        use_longest: bool,
        defaults: Option<Vec<Operand>>,
    ) -> Result<Expr> {
        let inputs: Vec<Operand> = inputs.into_iter().map(Into::into).collect();
        if inputs.is_empty() {
            return Err(ExprError::InvalidOperandShape(
                "zip requires at least one input array".into(),
            ));
        }
        match (use_longest, defaults) {
            (false, None) => Ok(zip_inputs(inputs, None)),
            (false, Some(_)) => Err(ExprError::InvalidOperandShape(
                "zip defaults are only allowed with use_longest".into(),
            )),
            (true, Some(defaults)) if defaults.len() != inputs.len() => {
                Err(ExprError::InvalidOperandShape(format!(
                    "zip expects one default per input ({}), got {}",
                    inputs.len(),
                    defaults.len()
                )))
            }
            (true, defaults) => Ok(zip_inputs(inputs, Some(defaults))),
        }
    }
}

// `longest` is `Some(defaults)` when padding to the longest input.
fn zip_inputs(inputs: Vec<Operand>, longest: Option<Option<Vec<Operand>>>) -> Expr {
    let mut args = vec![("inputs".to_string(), Operand::Array(inputs))];
    if let Some(defaults) = longest {
        args.push(("useLongestLength".to_string(), true.into()));
        if let Some(defaults) = defaults {
            args.push(("defaults".to_string(), Operand::Array(defaults)));
        }
    }
    Expr::op("$zip", Operand::Document(args))
}
