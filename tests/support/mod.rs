//! A tiny interpreter for the subset of the aggregation language the
//! builders emit, so tests can check what an expression evaluates to.

#![allow(dead_code)]

use regex::RegexBuilder;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

pub fn eval(expr: &Value, doc: &Value) -> Value {
    Interp {
        root: doc,
        vars: HashMap::new(),
    }
    .eval(expr)
}

struct Interp<'a> {
    root: &'a Value,
    vars: HashMap<String, Value>,
}

fn lookup(mut v: &Value, path: &str) -> Value {
    if path.is_empty() {
        return v.clone();
    }
    for key in path.split('.') {
        match v.get(key) {
            Some(next) => v = next,
            None => return Value::Null,
        }
    }
    v.clone()
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Null => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Object(_) => 4,
        Value::Array(_) => 5,
        Value::Bool(_) => 8,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ if rank(a) == rank(b) => a.to_string().cmp(&b.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

fn num(v: &Value) -> f64 {
    v.as_f64().unwrap_or(0.0)
}

fn int(v: &Value) -> i64 {
    num(v) as i64
}

fn number(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        json!(x as i64)
    } else {
        json!(x)
    }
}

fn array(v: Value) -> Vec<Value> {
    match v {
        Value::Array(a) => a,
        _ => Vec::new(),
    }
}

impl<'a> Interp<'a> {
    fn eval(&mut self, expr: &Value) -> Value {
        match expr {
            Value::String(s) => self.path(s),
            Value::Array(items) => Value::Array(items.iter().map(|i| self.eval(i)).collect()),
            Value::Object(map) if map.len() == 1 => {
                let (op, arg) = map.iter().next().unwrap();
                if op.starts_with('$') {
                    self.operator(op, arg)
                } else {
                    Value::Object(self.document(map))
                }
            }
            Value::Object(map) => Value::Object(self.document(map)),
            other => other.clone(),
        }
    }

    fn document(&mut self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter().map(|(k, v)| (k.clone(), self.eval(v))).collect()
    }

    fn path(&self, s: &str) -> Value {
        if let Some(var) = s.strip_prefix("$$") {
            let (name, rest) = var.split_once('.').unwrap_or((var, ""));
            let value = self.vars.get(name).cloned().unwrap_or(Value::Null);
            return lookup(&value, rest);
        }
        if let Some(path) = s.strip_prefix('$') {
            return lookup(self.root, path);
        }
        Value::String(s.to_string())
    }

    fn args(&mut self, arg: &Value) -> Vec<Value> {
        match arg {
            Value::Array(items) => items.iter().map(|i| self.eval(i)).collect(),
            other => vec![self.eval(other)],
        }
    }

    fn scoped<F: FnOnce(&mut Self) -> Value>(&mut self, bindings: Vec<(String, Value)>, f: F) -> Value {
        let saved: Vec<(String, Option<Value>)> = bindings
            .iter()
            .map(|(k, _)| (k.clone(), self.vars.get(k).cloned()))
            .collect();
        for (k, v) in bindings {
            self.vars.insert(k, v);
        }
        let out = f(self);
        for (k, old) in saved {
            match old {
                Some(v) => self.vars.insert(k, v),
                None => self.vars.remove(&k),
            };
        }
        out
    }

    fn operator(&mut self, op: &str, arg: &Value) -> Value {
        match op {
            "$literal" => arg.clone(),
            "$let" => {
                let bindings = arg["vars"]
                    .as_object()
                    .map(|vars| vars.iter().map(|(k, v)| (k.clone(), self.eval(v))).collect())
                    .unwrap_or_default();
                let body = arg["in"].clone();
                self.scoped(bindings, |me| me.eval(&body))
            }
            "$filter" => {
                let input = array(self.eval(&arg["input"]));
                let cond = arg["cond"].clone();
                let kept = input
                    .into_iter()
                    .filter(|item| {
                        let item = item.clone();
                        truthy(&self.scoped(vec![("this".into(), item)], |me| me.eval(&cond)))
                    })
                    .collect();
                Value::Array(kept)
            }
            "$map" => {
                let input = array(self.eval(&arg["input"]));
                let name = arg["as"].as_str().unwrap_or("this").to_string();
                let body = arg["in"].clone();
                Value::Array(
                    input
                        .into_iter()
                        .map(|item| self.scoped(vec![(name.clone(), item)], |me| me.eval(&body)))
                        .collect(),
                )
            }
            "$reduce" => {
                let input = array(self.eval(&arg["input"]));
                let mut acc = self.eval(&arg["initialValue"]);
                let body = arg["in"].clone();
                for item in input {
                    acc = self.scoped(
                        vec![("this".into(), item), ("value".into(), acc)],
                        |me| me.eval(&body),
                    );
                }
                acc
            }
            "$cond" => {
                let (c, t, e) = match arg {
                    Value::Array(a) => (a[0].clone(), a[1].clone(), a[2].clone()),
                    _ => (arg["if"].clone(), arg["then"].clone(), arg["else"].clone()),
                };
                if truthy(&self.eval(&c)) {
                    self.eval(&t)
                } else {
                    self.eval(&e)
                }
            }
            "$switch" => {
                for branch in arg["branches"].as_array().cloned().unwrap_or_default() {
                    if truthy(&self.eval(&branch["case"])) {
                        return self.eval(&branch["then"]);
                    }
                }
                self.eval(&arg["default"])
            }
            "$not" => json!(!truthy(&self.args(arg)[0])),
            "$and" => json!(self.args(arg).iter().all(truthy)),
            "$or" => json!(self.args(arg).iter().any(truthy)),
            "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" => {
                let a = self.args(arg);
                let ord = compare(&a[0], &a[1]);
                json!(match op {
                    "$eq" => ord == Ordering::Equal,
                    "$ne" => ord != Ordering::Equal,
                    "$gt" => ord == Ordering::Greater,
                    "$gte" => ord != Ordering::Less,
                    "$lt" => ord == Ordering::Less,
                    _ => ord != Ordering::Greater,
                })
            }
            "$in" => {
                let a = self.args(arg);
                json!(array(a[1].clone()).iter().any(|v| compare(v, &a[0]) == Ordering::Equal))
            }
            "$add" => number(self.args(arg).iter().map(num).sum()),
            "$multiply" => number(self.args(arg).iter().map(num).product()),
            "$subtract" => {
                let a = self.args(arg);
                number(num(&a[0]) - num(&a[1]))
            }
            "$divide" => {
                let a = self.args(arg);
                number(num(&a[0]) / num(&a[1]))
            }
            "$ifNull" => {
                let a = self.args(arg);
                if a[0].is_null() { a[1].clone() } else { a[0].clone() }
            }
            "$size" => json!(array(self.args(arg)[0].clone()).len()),
            "$arrayElemAt" => {
                let a = self.args(arg);
                let items = array(a[0].clone());
                let i = int(&a[1]);
                let i = if i < 0 { items.len() as i64 + i } else { i };
                items.get(i as usize).cloned().unwrap_or(Value::Null)
            }
            "$slice" => {
                let a = self.args(arg);
                let items = array(a[0].clone());
                let len = items.len() as i64;
                let (start, n) = if a.len() == 2 {
                    let n = int(&a[1]);
                    if n >= 0 { (0, n) } else { ((len + n).max(0), -n) }
                } else {
                    let p = int(&a[1]);
                    let start = if p < 0 { (len + p).max(0) } else { p.min(len) };
                    (start, int(&a[2]))
                };
                Value::Array(items.into_iter().skip(start as usize).take(n.max(0) as usize).collect())
            }
            "$indexOfArray" => {
                let a = self.args(arg);
                let pos = array(a[0].clone())
                    .iter()
                    .position(|v| compare(v, &a[1]) == Ordering::Equal);
                json!(pos.map_or(-1, |p| p as i64))
            }
            "$mergeObjects" => {
                let mut merged = Map::new();
                for part in self.args(arg) {
                    if let Value::Object(fields) = part {
                        merged.extend(fields);
                    }
                }
                Value::Object(merged)
            }
            "$concatArrays" => Value::Array(self.args(arg).into_iter().flat_map(array).collect()),
            "$reverseArray" => {
                let mut items = array(self.args(arg)[0].clone());
                items.reverse();
                Value::Array(items)
            }
            "$sum" => number(array(self.args(arg)[0].clone()).iter().map(num).sum()),
            "$range" => {
                let a = self.args(arg);
                Value::Array((int(&a[0])..int(&a[1])).map(|i| json!(i)).collect())
            }
            "$zip" => {
                let inputs: Vec<Vec<Value>> = array(self.eval(&arg["inputs"]))
                    .into_iter()
                    .map(array)
                    .collect();
                let n = inputs.iter().map(Vec::len).min().unwrap_or(0);
                Value::Array(
                    (0..n)
                        .map(|i| Value::Array(inputs.iter().map(|v| v[i].clone()).collect()))
                        .collect(),
                )
            }
            "$split" => {
                let a = self.args(arg);
                let s = a[0].as_str().unwrap_or_default();
                let d = a[1].as_str().unwrap_or_default();
                Value::Array(s.split(d).map(|p| json!(p)).collect())
            }
            "$concat" => Value::String(
                self.args(arg)
                    .iter()
                    .map(|v| v.as_str().unwrap_or_default().to_string())
                    .collect(),
            ),
            "$strLenBytes" => json!(self.args(arg)[0].as_str().unwrap_or_default().len()),
            "$substrBytes" => {
                let a = self.args(arg);
                let s = a[0].as_str().unwrap_or_default();
                let start = (int(&a[1]).max(0) as usize).min(s.len());
                let count = int(&a[2]);
                let end = if count < 0 { s.len() } else { (start + count as usize).min(s.len()) };
                json!(&s[start..end])
            }
            "$toLower" => json!(self.args(arg)[0].as_str().unwrap_or_default().to_lowercase()),
            "$toUpper" => json!(self.args(arg)[0].as_str().unwrap_or_default().to_uppercase()),
            "$regexMatch" => {
                let input = self.eval(&arg["input"]);
                let pattern = arg["regex"].as_str().unwrap_or_default();
                let insensitive = arg["options"].as_str().is_some_and(|o| o.contains('i'));
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(insensitive)
                    .build()
                    .unwrap();
                json!(re.is_match(input.as_str().unwrap_or_default()))
            }
            other => panic!("operator {other} not supported by the test interpreter"),
        }
    }
}
