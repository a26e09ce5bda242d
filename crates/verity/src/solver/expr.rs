//! Constraint expressions and their three-valued evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value assigned to a constraint variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
        }
    }
}

/// The type of a variable or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
}

/// Expression tree over variables and constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expr {
    Var(String),
    Const(Value),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Neq(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// Global constraint: all named variables take pairwise distinct values
    AllDifferent(Vec<String>),
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Const(Value::Int(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Const(Value::Int(value.into()))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Const(Value::Bool(value))
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

// Combinators mirror the builder surface: `x.lt(y)`, `a.and(b)`, `a.not()`.
#[allow(clippy::should_implement_trait)]
impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::Const(Value::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Const(Value::Bool(value))
    }

    pub fn add(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs.into()))
    }

    pub fn sub(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs.into()))
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Eq(Box::new(self), Box::new(rhs.into()))
    }

    pub fn neq(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Neq(Box::new(self), Box::new(rhs.into()))
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Lt(Box::new(self), Box::new(rhs.into()))
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Gt(Box::new(self), Box::new(rhs.into()))
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Le(Box::new(self), Box::new(rhs.into()))
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Ge(Box::new(self), Box::new(rhs.into()))
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        Expr::And(Box::new(self), Box::new(rhs.into()))
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Or(Box::new(self), Box::new(rhs.into()))
    }

    pub fn implies(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Implies(Box::new(self), Box::new(rhs.into()))
    }

    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    pub fn all_different<I, S>(vars: I) -> Expr
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::AllDifferent(vars.into_iter().map(Into::into).collect())
    }

    /// Append referenced variable names not yet in `out`
    pub fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Var(name) => push_unique(out, name),
            Expr::Const(_) => {}
            Expr::AllDifferent(names) => {
                for name in names {
                    push_unique(out, name);
                }
            }
            Expr::Not(inner) => inner.collect_variables(out),
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Eq(l, r)
            | Expr::Neq(l, r)
            | Expr::Lt(l, r)
            | Expr::Gt(l, r)
            | Expr::Le(l, r)
            | Expr::Ge(l, r)
            | Expr::And(l, r)
            | Expr::Or(l, r)
            | Expr::Implies(l, r) => {
                l.collect_variables(out);
                r.collect_variables(out);
            }
        }
    }

    /// Infer the type of this expression, rejecting ill-typed trees and
    /// undeclared variables
    pub fn kind<F>(&self, lookup: &F) -> Result<ValueKind, String>
    where
        F: Fn(&str) -> Option<ValueKind>,
    {
        let declared = |name: &str| {
            lookup(name).ok_or_else(|| format!("undeclared variable '{}'", name))
        };
        let expect = |e: &Expr, want: ValueKind| -> Result<(), String> {
            let got = e.kind(lookup)?;
            if got == want {
                Ok(())
            } else {
                Err(format!("expected {:?} operand, found {:?} in `{}`", want, got, e))
            }
        };

        match self {
            Expr::Var(name) => declared(name),
            Expr::Const(v) => Ok(v.kind()),
            Expr::Add(l, r) | Expr::Sub(l, r) => {
                expect(l, ValueKind::Int)?;
                expect(r, ValueKind::Int)?;
                Ok(ValueKind::Int)
            }
            Expr::Lt(l, r) | Expr::Gt(l, r) | Expr::Le(l, r) | Expr::Ge(l, r) => {
                expect(l, ValueKind::Int)?;
                expect(r, ValueKind::Int)?;
                Ok(ValueKind::Bool)
            }
            Expr::Eq(l, r) | Expr::Neq(l, r) => {
                let lk = l.kind(lookup)?;
                expect(r, lk)?;
                Ok(ValueKind::Bool)
            }
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Implies(l, r) => {
                expect(l, ValueKind::Bool)?;
                expect(r, ValueKind::Bool)?;
                Ok(ValueKind::Bool)
            }
            Expr::Not(inner) => {
                expect(inner, ValueKind::Bool)?;
                Ok(ValueKind::Bool)
            }
            Expr::AllDifferent(names) => {
                for name in names {
                    declared(name)?;
                }
                Ok(ValueKind::Bool)
            }
        }
    }

    /// Evaluate under a (possibly partial) assignment.
    ///
    /// Returns `None` when the value is not yet determined. Connectives
    /// short-circuit, so `false and unknown` is already `false`. Arithmetic
    /// is checked: a sum or difference outside the `i64` range has no value,
    /// and any comparison over it is `false`. The expression must have
    /// passed [`Expr::kind`].
    pub fn eval<F>(&self, lookup: &F) -> Option<Value>
    where
        F: Fn(&str) -> Option<Value>,
    {
        match self.partial(lookup) {
            Partial::Known(v) => Some(v),
            Partial::Unknown | Partial::Overflow => None,
        }
    }

    fn partial<F>(&self, lookup: &F) -> Partial
    where
        F: Fn(&str) -> Option<Value>,
    {
        match self {
            Expr::Var(name) => lookup(name).map_or(Partial::Unknown, Partial::Known),
            Expr::Const(v) => Partial::Known(*v),
            Expr::Add(l, r) => arith(l, r, lookup, i64::checked_add),
            Expr::Sub(l, r) => arith(l, r, lookup, i64::checked_sub),
            Expr::Lt(l, r) => compare(l, r, lookup, |a, b| a < b),
            Expr::Gt(l, r) => compare(l, r, lookup, |a, b| a > b),
            Expr::Le(l, r) => compare(l, r, lookup, |a, b| a <= b),
            Expr::Ge(l, r) => compare(l, r, lookup, |a, b| a >= b),
            Expr::Eq(l, r) => compare(l, r, lookup, |a, b| a == b),
            Expr::Neq(l, r) => compare(l, r, lookup, |a, b| a != b),
            Expr::And(l, r) => match (truth(l, lookup), truth(r, lookup)) {
                (Some(false), _) | (_, Some(false)) => Partial::Known(Value::Bool(false)),
                (Some(true), Some(true)) => Partial::Known(Value::Bool(true)),
                _ => Partial::Unknown,
            },
            Expr::Or(l, r) => match (truth(l, lookup), truth(r, lookup)) {
                (Some(true), _) | (_, Some(true)) => Partial::Known(Value::Bool(true)),
                (Some(false), Some(false)) => Partial::Known(Value::Bool(false)),
                _ => Partial::Unknown,
            },
            Expr::Implies(l, r) => match (truth(l, lookup), truth(r, lookup)) {
                (Some(false), _) | (_, Some(true)) => Partial::Known(Value::Bool(true)),
                (Some(true), Some(false)) => Partial::Known(Value::Bool(false)),
                _ => Partial::Unknown,
            },
            Expr::Not(inner) => match truth(inner, lookup) {
                Some(b) => Partial::Known(Value::Bool(!b)),
                None => Partial::Unknown,
            },
            Expr::AllDifferent(names) => {
                let mut seen = Vec::with_capacity(names.len());
                let mut complete = true;
                for name in names {
                    match lookup(name) {
                        Some(v) if seen.contains(&v) => return Partial::Known(Value::Bool(false)),
                        Some(v) => seen.push(v),
                        None => complete = false,
                    }
                }
                if complete {
                    Partial::Known(Value::Bool(true))
                } else {
                    Partial::Unknown
                }
            }
        }
    }
}

/// Intermediate result of evaluation
enum Partial {
    Unknown,
    /// Integer arithmetic left the `i64` range
    Overflow,
    Known(Value),
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}

fn truth<F>(expr: &Expr, lookup: &F) -> Option<bool>
where
    F: Fn(&str) -> Option<Value>,
{
    expr.eval(lookup).map(|v| {
        v.as_bool()
            .unwrap_or_else(|| panic!("boolean operand evaluated to {} in `{}`", v, expr))
    })
}

fn arith<F>(l: &Expr, r: &Expr, lookup: &F, op: fn(i64, i64) -> Option<i64>) -> Partial
where
    F: Fn(&str) -> Option<Value>,
{
    let as_int = |e: &Expr, v: Value| {
        v.as_int()
            .unwrap_or_else(|| panic!("integer operand evaluated to {} in `{}`", v, e))
    };
    match (l.partial(lookup), r.partial(lookup)) {
        (Partial::Overflow, _) | (_, Partial::Overflow) => Partial::Overflow,
        (Partial::Known(a), Partial::Known(b)) => match op(as_int(l, a), as_int(r, b)) {
            Some(n) => Partial::Known(Value::Int(n)),
            None => Partial::Overflow,
        },
        _ => Partial::Unknown,
    }
}

/// Operands share a type after [`Expr::kind`], so `Value`'s ordering is the
/// integer ordering here
fn compare<F>(l: &Expr, r: &Expr, lookup: &F, op: fn(Value, Value) -> bool) -> Partial
where
    F: Fn(&str) -> Option<Value>,
{
    match (l.partial(lookup), r.partial(lookup)) {
        (Partial::Overflow, _) | (_, Partial::Overflow) => Partial::Known(Value::Bool(false)),
        (Partial::Known(a), Partial::Known(b)) => Partial::Known(Value::Bool(op(a, b))),
        _ => Partial::Unknown,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bin = |f: &mut fmt::Formatter<'_>, l: &Expr, op: &str, r: &Expr| {
            write!(f, "({} {} {})", l, op, r)
        };
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(v) => write!(f, "{}", v),
            Expr::Add(l, r) => bin(f, l, "+", r),
            Expr::Sub(l, r) => bin(f, l, "-", r),
            Expr::Eq(l, r) => bin(f, l, "==", r),
            Expr::Neq(l, r) => bin(f, l, "!=", r),
            Expr::Lt(l, r) => bin(f, l, "<", r),
            Expr::Gt(l, r) => bin(f, l, ">", r),
            Expr::Le(l, r) => bin(f, l, "<=", r),
            Expr::Ge(l, r) => bin(f, l, ">=", r),
            Expr::And(l, r) => bin(f, l, "and", r),
            Expr::Or(l, r) => bin(f, l, "or", r),
            Expr::Implies(l, r) => bin(f, l, "=>", r),
            Expr::Not(inner) => write!(f, "not {}", inner),
            Expr::AllDifferent(names) => write!(f, "allDifferent({})", names.join(", ")),
        }
    }
}
