//! Scalar symbolic expressions
//!
//! Constraint residuals are built as immutable expression trees over typed
//! symbols. Every node folds constants on construction, so building the same
//! residual twice yields structurally identical trees.
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

/// Decision vector a symbol is read from at evaluation time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Space {
    /// Optimization variables (states, controls, design parameters)
    Variables,
    /// Fixed problem parameters (references, homotopy parameters)
    Parameters,
}

/// A named scalar slot in one of the decision vectors
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    space: Space,
    index: usize,
    name: Arc<str>,
}

impl Symbol {
    pub fn new(space: Space, index: usize, name: impl Into<Arc<str>>) -> Self {
        Self {
            space,
            index,
            name: name.into(),
        }
    }

    pub fn space(&self) -> Space {
        self.space
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(f64),
    Sym(Symbol),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Powf(Box<Expr>, f64),
    Sin(Box<Expr>),
    Cos(Box<Expr>),
    Exp(Box<Expr>),
    Sqrt(Box<Expr>),
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr::Const(value)
    }

    pub fn zero() -> Self {
        Expr::Const(0.0)
    }

    pub fn one() -> Self {
        Expr::Const(1.0)
    }

    pub fn symbol(symbol: Symbol) -> Self {
        Expr::Sym(symbol)
    }

    /// Constant value of this node, if it is a literal
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_const() == Some(0.0)
    }

    fn fold_add(a: Expr, b: Expr) -> Expr {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Expr::Const(x + y),
            (Some(x), None) if x == 0.0 => b,
            (None, Some(y)) if y == 0.0 => a,
            _ => Expr::Add(Box::new(a), Box::new(b)),
        }
    }

    fn fold_sub(a: Expr, b: Expr) -> Expr {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Expr::Const(x - y),
            (Some(x), None) if x == 0.0 => Expr::fold_neg(b),
            (None, Some(y)) if y == 0.0 => a,
            _ => Expr::Sub(Box::new(a), Box::new(b)),
        }
    }

    fn fold_mul(a: Expr, b: Expr) -> Expr {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Expr::Const(x * y),
            (Some(x), _) | (_, Some(x)) if x == 0.0 => Expr::zero(),
            (Some(x), None) if x == 1.0 => b,
            (None, Some(y)) if y == 1.0 => a,
            _ => Expr::Mul(Box::new(a), Box::new(b)),
        }
    }

    fn fold_div(a: Expr, b: Expr) -> Expr {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Expr::Const(x / y),
            (Some(x), None) if x == 0.0 => Expr::zero(),
            (None, Some(y)) if y == 1.0 => a,
            _ => Expr::Div(Box::new(a), Box::new(b)),
        }
    }

    fn fold_neg(a: Expr) -> Expr {
        match a {
            Expr::Const(c) => Expr::Const(-c),
            Expr::Neg(inner) => *inner,
            other => Expr::Neg(Box::new(other)),
        }
    }

    pub fn powf(self, exponent: f64) -> Expr {
        if exponent == 0.0 {
            return Expr::one();
        }
        if exponent == 1.0 {
            return self;
        }
        match self {
            Expr::Const(c) => Expr::Const(c.powf(exponent)),
            other => Expr::Powf(Box::new(other), exponent),
        }
    }

    pub fn sin(self) -> Expr {
        match self {
            Expr::Const(c) => Expr::Const(c.sin()),
            other => Expr::Sin(Box::new(other)),
        }
    }

    pub fn cos(self) -> Expr {
        match self {
            Expr::Const(c) => Expr::Const(c.cos()),
            other => Expr::Cos(Box::new(other)),
        }
    }

    pub fn exp(self) -> Expr {
        match self {
            Expr::Const(c) => Expr::Const(c.exp()),
            other => Expr::Exp(Box::new(other)),
        }
    }

    pub fn sqrt(self) -> Expr {
        match self {
            Expr::Const(c) => Expr::Const(c.sqrt()),
            other => Expr::Sqrt(Box::new(other)),
        }
    }

    /// Evaluate numerically against the variable and parameter vectors
    ///
    /// # Panics
    /// Panics if a symbol indexes past the end of its vector. Callers that
    /// take untrusted input go through [`crate::constraints::ConstraintFunction`],
    /// which checks the input lengths first.
    pub fn eval(&self, vars: &[f64], params: &[f64]) -> f64 {
        match self {
            Expr::Const(c) => *c,
            Expr::Sym(s) => match s.space {
                Space::Variables => vars[s.index],
                Space::Parameters => params[s.index],
            },
            Expr::Add(a, b) => a.eval(vars, params) + b.eval(vars, params),
            Expr::Sub(a, b) => a.eval(vars, params) - b.eval(vars, params),
            Expr::Mul(a, b) => a.eval(vars, params) * b.eval(vars, params),
            Expr::Div(a, b) => a.eval(vars, params) / b.eval(vars, params),
            Expr::Neg(a) => -a.eval(vars, params),
            Expr::Powf(a, e) => a.eval(vars, params).powf(*e),
            Expr::Sin(a) => a.eval(vars, params).sin(),
            Expr::Cos(a) => a.eval(vars, params).cos(),
            Expr::Exp(a) => a.eval(vars, params).exp(),
            Expr::Sqrt(a) => a.eval(vars, params).sqrt(),
        }
    }

    /// Symbolic partial derivative with respect to `wrt`
    pub fn diff(&self, wrt: &Symbol) -> Expr {
        match self {
            Expr::Const(_) => Expr::zero(),
            Expr::Sym(s) => {
                if s == wrt {
                    Expr::one()
                } else {
                    Expr::zero()
                }
            }
            Expr::Add(a, b) => a.diff(wrt) + b.diff(wrt),
            Expr::Sub(a, b) => a.diff(wrt) - b.diff(wrt),
            Expr::Mul(a, b) => a.diff(wrt) * b.as_ref() + a.as_ref() * b.diff(wrt),
            Expr::Div(a, b) => {
                let numer = a.diff(wrt) * b.as_ref() - a.as_ref() * b.diff(wrt);
                numer / (b.as_ref() * b.as_ref())
            }
            Expr::Neg(a) => -a.diff(wrt),
            Expr::Powf(a, e) => *e * a.as_ref().clone().powf(e - 1.0) * a.diff(wrt),
            Expr::Sin(a) => a.as_ref().clone().cos() * a.diff(wrt),
            Expr::Cos(a) => -(a.as_ref().clone().sin() * a.diff(wrt)),
            Expr::Exp(a) => a.as_ref().clone().exp() * a.diff(wrt),
            Expr::Sqrt(a) => a.diff(wrt) / (2.0 * a.as_ref().clone().sqrt()),
        }
    }

    /// Highest symbol index referenced in `space`, if any
    pub fn max_index(&self, space: Space) -> Option<usize> {
        match self {
            Expr::Const(_) => None,
            Expr::Sym(s) => (s.space == space).then_some(s.index),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                match (a.max_index(space), b.max_index(space)) {
                    (Some(x), Some(y)) => Some(x.max(y)),
                    (x, y) => x.or(y),
                }
            }
            Expr::Neg(a)
            | Expr::Powf(a, _)
            | Expr::Sin(a)
            | Expr::Cos(a)
            | Expr::Exp(a)
            | Expr::Sqrt(a) => a.max_index(space),
        }
    }

    pub fn depends_on(&self, symbol: &Symbol) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Sym(s) => s == symbol,
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.depends_on(symbol) || b.depends_on(symbol)
            }
            Expr::Neg(a)
            | Expr::Powf(a, _)
            | Expr::Sin(a)
            | Expr::Cos(a)
            | Expr::Exp(a)
            | Expr::Sqrt(a) => a.depends_on(symbol),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::Sym(symbol)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $fold:ident) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$fold(self, rhs)
            }
        }

        impl $trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::$fold(self, rhs.clone())
            }
        }

        impl $trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$fold(self.clone(), rhs)
            }
        }

        impl $trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::$fold(self.clone(), rhs.clone())
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::$fold(self, Expr::Const(rhs))
            }
        }

        impl $trait<f64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::$fold(self.clone(), Expr::Const(rhs))
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$fold(Expr::Const(self), rhs)
            }
        }

        impl $trait<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::$fold(Expr::Const(self), rhs.clone())
            }
        }
    };
}

impl_binary_op!(Add, add, fold_add);
impl_binary_op!(Sub, sub, fold_sub);
impl_binary_op!(Mul, mul, fold_mul);
impl_binary_op!(Div, div, fold_div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::fold_neg(self)
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::fold_neg(self.clone())
    }
}

impl std::iter::Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        iter.fold(Expr::zero(), |acc, term| acc + term)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Sym(s) => write!(f, "{s}"),
            Expr::Add(a, b) => write!(f, "({a} + {b})"),
            Expr::Sub(a, b) => write!(f, "({a} - {b})"),
            Expr::Mul(a, b) => write!(f, "({a}*{b})"),
            Expr::Div(a, b) => write!(f, "({a}/{b})"),
            Expr::Neg(a) => write!(f, "(-{a})"),
            Expr::Powf(a, e) => write!(f, "({a}^{e})"),
            Expr::Sin(a) => write!(f, "sin({a})"),
            Expr::Cos(a) => write!(f, "cos({a})"),
            Expr::Exp(a) => write!(f, "exp({a})"),
            Expr::Sqrt(a) => write!(f, "sqrt({a})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn var(index: usize) -> Expr {
        Expr::symbol(Symbol::new(Space::Variables, index, format!("v{index}")))
    }

    #[test]
    fn constants_fold_on_construction() {
        let e = Expr::constant(2.0) * 3.0 + 1.0;
        assert_eq!(e, Expr::Const(7.0));
        assert_eq!(var(0) * 0.0, Expr::zero());
        assert_eq!(var(0) + 0.0, var(0));
        assert_eq!(0.0 - var(1), Expr::Neg(Box::new(var(1))));
        assert_eq!(-(-var(2)), var(2));
    }

    #[test]
    fn evaluates_against_both_spaces() {
        let p = Expr::symbol(Symbol::new(Space::Parameters, 0, "p0"));
        let e = (var(0) - var(1)) * p.clone() + var(1).powf(2.0);
        assert_relative_eq!(e.eval(&[3.0, 2.0], &[0.5]), 0.5 + 4.0);
        assert_eq!(e.max_index(Space::Variables), Some(1));
        assert_eq!(e.max_index(Space::Parameters), Some(0));
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let x = Symbol::new(Space::Variables, 0, "x");
        let ex = Expr::symbol(x.clone());
        let f = (ex.clone() * ex.clone()).sin() / (1.0 + ex.clone().exp()) + ex.sqrt();
        let df = f.diff(&x);

        let x0 = 0.7;
        let h = 1e-6;
        let numeric = (f.eval(&[x0 + h], &[]) - f.eval(&[x0 - h], &[])) / (2.0 * h);
        assert_relative_eq!(df.eval(&[x0], &[]), numeric, epsilon = 1e-6);
    }

    #[test]
    fn derivative_of_unrelated_symbol_is_zero() {
        let y = Symbol::new(Space::Parameters, 0, "y");
        let f = var(0) * var(1) + 4.0;
        assert!(f.diff(&y).is_zero());
        assert!(!f.depends_on(&y));
    }
}
