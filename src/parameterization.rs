//! Spline parameterization of reference states
//!
//! Parameterized initial/terminal conditions compare the state against a
//! reference that is itself a function of a free scalar design parameter
//! (`xi_0` or `xi_f`). Each `(state, dimension)` pair gets a univariate
//! spline evaluated symbolically at that parameter.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConstraintError;
use crate::symbolic::Expr;
use crate::variables::{Schema, VarKey, Variables};

/// Which end of the trajectory a spline set describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Initial,
    Terminal,
}

pub trait Spline: fmt::Debug + Send + Sync {
    /// Spline value at the (symbolic) parameter `xi`
    fn evaluate(&self, xi: &Expr) -> Expr;
}

/// Spline set for one phase, keyed by `(state, dimension)`
#[derive(Debug, Default)]
pub struct Splines {
    map: HashMap<(VarKey, usize), Box<dyn Spline>>,
}

impl Splines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: VarKey, dim: usize, spline: Box<dyn Spline>) {
        self.map.insert((key, dim), spline);
    }

    pub fn get(&self, key: &VarKey, dim: usize) -> Result<&dyn Spline, ConstraintError> {
        self.map
            .get(&(key.clone(), dim))
            .map(|s| s.as_ref())
            .ok_or_else(|| ConstraintError::MissingSpline {
                key: key.to_string(),
                dim,
            })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Source of reference splines
pub trait SplineProvider {
    fn get_splines(&self, variables: &Variables, phase: Phase) -> Result<Splines, ConstraintError>;
}

/// Bézier curve on `[0, 1]` in Bernstein form
#[derive(Debug, Clone, PartialEq)]
pub struct BernsteinSpline {
    control_points: Vec<f64>,
}

impl BernsteinSpline {
    pub fn new(control_points: Vec<f64>) -> Self {
        Self { control_points }
    }
}

impl Spline for BernsteinSpline {
    fn evaluate(&self, xi: &Expr) -> Expr {
        let n = match self.control_points.len() {
            0 => return Expr::zero(),
            len => len - 1,
        };
        let one_minus = 1.0 - xi;
        let mut binomial = 1.0;
        let mut terms = Vec::with_capacity(n + 1);
        for (k, &c) in self.control_points.iter().enumerate() {
            let basis = xi.clone().powf(k as f64) * one_minus.clone().powf((n - k) as f64);
            terms.push(c * binomial * basis);
            binomial = binomial * (n - k) as f64 / (k + 1) as f64;
        }
        terms.into_iter().sum()
    }
}

/// Reference splines fitted through sampled reference trajectories
///
/// Each phase holds a sequence of flat state samples (schema order) along the
/// parameter range; the samples of a component become the control points of
/// its Bézier spline.
#[derive(Debug, Clone)]
pub struct ReferenceSplines {
    schema: Arc<Schema>,
    initial: Vec<Vec<f64>>,
    terminal: Vec<Vec<f64>>,
}

impl ReferenceSplines {
    pub fn new(
        schema: Arc<Schema>,
        initial: Vec<Vec<f64>>,
        terminal: Vec<Vec<f64>>,
    ) -> Result<Self, ConstraintError> {
        for sample in initial.iter().chain(terminal.iter()) {
            if sample.len() != schema.total_size() {
                return Err(ConstraintError::SizeMismatch {
                    name: "reference sample".to_string(),
                    expected: schema.total_size(),
                    actual: sample.len(),
                });
            }
        }
        Ok(Self {
            schema,
            initial,
            terminal,
        })
    }
}

impl SplineProvider for ReferenceSplines {
    fn get_splines(&self, _variables: &Variables, phase: Phase) -> Result<Splines, ConstraintError> {
        let samples = match phase {
            Phase::Initial => &self.initial,
            Phase::Terminal => &self.terminal,
        };

        let mut splines = Splines::new();
        for i in 0..self.schema.total_size() {
            if let Some((key, dim)) = self.schema.canonical_index(i) {
                let points = samples.iter().map(|s| s[i]).collect();
                splines.insert(key.clone(), dim, Box::new(BernsteinSpline::new(points)));
            }
        }
        Ok(splines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{Space, Symbol};
    use approx::assert_relative_eq;

    #[test]
    fn bernstein_hits_end_points_and_is_linear_for_two_points() {
        let xi = Expr::symbol(Symbol::new(Space::Variables, 0, "xi"));
        let spline = BernsteinSpline::new(vec![2.0, 6.0]);
        let s = spline.evaluate(&xi);
        assert_relative_eq!(s.eval(&[0.0], &[]), 2.0);
        assert_relative_eq!(s.eval(&[1.0], &[]), 6.0);
        assert_relative_eq!(s.eval(&[0.25], &[]), 3.0);
    }

    #[test]
    fn bernstein_quadratic_midpoint() {
        let spline = BernsteinSpline::new(vec![0.0, 1.0, 0.0]);
        let mid = spline.evaluate(&Expr::constant(0.5));
        assert_relative_eq!(mid.eval(&[], &[]), 0.5);
    }

    #[test]
    fn missing_spline_is_an_error() {
        let splines = Splines::new();
        let err = splines.get(&VarKey::new("e"), 0).unwrap_err();
        assert!(matches!(err, ConstraintError::MissingSpline { dim: 0, .. }));
    }
}
