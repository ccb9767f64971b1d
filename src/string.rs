use crate::expression::{Expr, Operand};
use itertools::Itertools;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static REGEX_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\[\]{}()*+\-?.,\\^$|#])").expect("metacharacter class is a valid pattern")
});

/// Escapes regular expression metacharacters in `s`.
pub(crate) fn escape_regex(s: &str) -> String {
    REGEX_META.replace_all(s, r"\${1}").into_owned()
}

/// One string or several, for the matching operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// `s` for one string, `(a|b|...)` for several, each escaped.
    fn alternation(&self) -> String {
        match self {
            OneOrMany::One(s) => escape_regex(s),
            OneOrMany::Many(many) => format!("({})", many.iter().map(|s| escape_regex(s)).join("|")),
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(s: &str) -> Self {
        OneOrMany::One(s.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(s: String) -> Self {
        OneOrMany::One(s)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(v: Vec<String>) -> Self {
        OneOrMany::Many(v)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(v: Vec<&str>) -> Self {
        OneOrMany::Many(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OneOrMany {
    fn from(v: &[&str]) -> Self {
        OneOrMany::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(v: [&str; N]) -> Self {
        OneOrMany::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

fn case_option(case_sensitive: bool) -> Option<&'static str> {
    (!case_sensitive).then_some("i")
}

fn trim(tag: &str, input: &Expr, chars: Option<&str>) -> Expr {
    let mut args = vec![("input".to_string(), Operand::from(input))];
    if let Some(chars) = chars {
        args.push(("chars".to_string(), chars.into()));
    }
    Expr::op(tag, Operand::Document(args))
}

// String expression operators #################################################

impl Expr {
    /// Substring by byte offsets.
    ///
    /// `start` and `end` may be negative to count from the end of the
    /// string. When `end` is given it wins over `count`; with neither the
    /// substring runs to the end.
    pub fn substr(&self, start: Option<i64>, end: Option<i64>, count: Option<i64>) -> Expr {
        if start.is_none() && end.is_none() && count.is_none() {
            return self.clone();
        }

        let start = start.unwrap_or(0);
        let (end, count) = match end {
            Some(end) if start < 0 && end < 0 => (None, Some(end - start)),
            _ => (end, count),
        };

        let start_expr = (start < 0).then(|| Expr::reversed("$add", start, &self.strlen()));
        let count: Operand = match end {
            Some(end) if end < 0 => Expr::reversed("$add", end, &self.strlen())
                .minus(start)
                .into(),
            Some(end) => match &start_expr {
                Some(start_expr) => Expr::reversed("$subtract", end, start_expr).into(),
                None => (end - start).into(),
            },
            None => count.unwrap_or(-1).into(),
        };
        let start: Operand = start_expr.map(Operand::from).unwrap_or_else(|| start.into());

        let expr = Expr::op("$substrBytes", Operand::Array(vec![self.into(), start, count]));
        self.let_in(&expr)
    }

    /// Length in bytes; a missing or null string has length 0.
    pub fn strlen(&self) -> Expr {
        Expr::op(
            "$strLenBytes",
            Operand::op("$ifNull", Operand::Array(vec![self.into(), "".into()])),
        )
    }

    pub fn lower(&self) -> Expr {
        Expr::op("$toLower", self)
    }

    pub fn upper(&self) -> Expr {
        Expr::op("$toUpper", self)
    }

    /// Concatenates this string with each of `args`.
    pub fn concat<T: Into<Operand>>(&self, args: impl IntoIterator<Item = T>) -> Expr {
        let mut parts = vec![Operand::from(self)];
        parts.extend(args.into_iter().map(Into::into));
        Expr::op("$concat", Operand::Array(parts))
    }

    /// Removes whitespace, or the given `chars`, from both ends.
    pub fn strip(&self, chars: Option<&str>) -> Expr {
        trim("$trim", self, chars)
    }

    pub fn lstrip(&self, chars: Option<&str>) -> Expr {
        trim("$ltrim", self, chars)
    }

    pub fn rstrip(&self, chars: Option<&str>) -> Expr {
        trim("$rtrim", self, chars)
    }

    /// Replaces every occurrence of `old` with `new`.
    pub fn replace(&self, old: impl Into<Operand>, new: impl Into<Operand>) -> Expr {
        Expr::op(
            "$replaceAll",
            Operand::doc([
                ("input", self.into()),
                ("find", old.into()),
                ("replacement", new.into()),
            ]),
        )
    }

    /// Whether the string matches `regex`.
    pub fn re_match(&self, regex: &str, options: Option<&str>) -> Expr {
        let options = options.map_or(Value::Null, |o| Value::String(o.to_string()));
        Expr::op(
            "$regexMatch",
            Operand::doc([
                ("input", self.into()),
                ("regex", regex.into()),
                ("options", options.into()),
            ]),
        )
    }

    pub fn starts_with(&self, prefixes: impl Into<OneOrMany>, case_sensitive: bool) -> Expr {
        let regex = format!("^{}", prefixes.into().alternation());
        self.re_match(&regex, case_option(case_sensitive))
    }

    pub fn ends_with(&self, suffixes: impl Into<OneOrMany>, case_sensitive: bool) -> Expr {
        let regex = format!("{}$", suffixes.into().alternation());
        self.re_match(&regex, case_option(case_sensitive))
    }

    pub fn contains_str(&self, needles: impl Into<OneOrMany>, case_sensitive: bool) -> Expr {
        let regex = needles.into().alternation();
        self.re_match(&regex, case_option(case_sensitive))
    }

    /// Whether the whole string equals one of the candidates.
    pub fn matches_str(&self, candidates: impl Into<OneOrMany>, case_sensitive: bool) -> Expr {
        let regex = format!("^{}$", candidates.into().alternation());
        self.re_match(&regex, case_option(case_sensitive))
    }

    /// Splits on `delimiter`, doing at most `maxsplit` splits from the left.
    pub fn split(&self, delimiter: &str, maxsplit: Option<i64>) -> Expr {
        let split = self.binary("$split", delimiter);
        let Some(maxsplit) = maxsplit else {
            return split;
        };
        if maxsplit <= 0 {
            return Expr::new(Operand::Array(vec![self.into()]));
        }

        let head = split.slice_range(None, Some(maxsplit));
        let rest = split.slice_range(Some(maxsplit), None).join(delimiter);
        let limited = split
            .length()
            .greater(maxsplit.saturating_add(1))
            .if_else(head.append(rest), &split);
        split.let_in(&limited)
    }

    /// Splits on `delimiter`, doing at most `maxsplit` splits from the right.
    pub fn rsplit(&self, delimiter: &str, maxsplit: Option<i64>) -> Expr {
        let split = self.binary("$split", delimiter);
        let Some(maxsplit) = maxsplit else {
            return split;
        };
        if maxsplit <= 0 {
            return Expr::new(Operand::Array(vec![self.into()]));
        }

        let tail = split.slice_range(Some(-maxsplit), None);
        let rest = split.slice_range(None, Some(-maxsplit)).join(delimiter);
        let limited = split
            .length()
            .greater(maxsplit.saturating_add(1))
            .if_else(tail.prepend(rest), &split);
        split.let_in(&limited)
    }
}
