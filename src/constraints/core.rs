/// Constraint records, ordered constraint lists and evaluation functions
///
/// A [`Constraint`] is a named symbolic residual vector tagged as an equality
/// (`g(w) = 0`) or an inequality (`h(w) <= 0`). The transcription layer reads
/// constraints positionally, so a [`ConstraintList`] keeps insertion order.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::aggregate::ConstraintEntry;
use crate::error::ConstraintError;
use crate::symbolic::{Expr, Space, Symbol};

/// Equality `g(w) = 0` or inequality `h(w) <= 0`, tagged `eq` / `ineq`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    #[serde(rename = "eq")]
    Equality,
    #[serde(rename = "ineq")]
    Inequality,
}

impl ConstraintKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ConstraintKind::Equality => "eq",
            ConstraintKind::Inequality => "ineq",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Named residual vector of one kind
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub expr: Vec<Expr>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, kind: ConstraintKind, expr: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            kind,
            expr,
        }
    }

    pub fn equality(name: impl Into<String>, expr: Vec<Expr>) -> Self {
        Self::new(name, ConstraintKind::Equality, expr)
    }

    pub fn inequality(name: impl Into<String>, expr: Vec<Expr>) -> Self {
        Self::new(name, ConstraintKind::Inequality, expr)
    }

    pub fn size(&self) -> usize {
        self.expr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    pub fn to_entry(&self) -> ConstraintEntry {
        ConstraintEntry::new(self.name.clone(), self.expr.clone())
    }

    pub fn function(&self) -> ConstraintFunction {
        ConstraintFunction::new(format!("{}_fun", self.name), self.expr.clone())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constraint(name='{}', type='{}', size={})", self.name, self.kind, self.size())
    }
}

/// Ordered list of constraints with unique names
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintList {
    constraints: Vec<Constraint>,
}

impl ConstraintList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, constraint: Constraint) -> Result<(), ConstraintError> {
        if self.get(&constraint.name).is_some() {
            return Err(ConstraintError::DuplicateConstraint(constraint.name));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Append every constraint of `other`, keeping its order
    pub fn extend(&mut self, other: ConstraintList) -> Result<(), ConstraintError> {
        for constraint in other.constraints {
            self.append(constraint)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.constraints.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.constraints.iter().map(|c| c.name.as_str()).collect()
    }

    /// Concatenated residuals of all constraints of `kind`, in list order
    pub fn expressions(&self, kind: ConstraintKind) -> Vec<Expr> {
        self.constraints
            .iter()
            .filter(|c| c.kind == kind)
            .flat_map(|c| c.expr.iter().cloned())
            .collect()
    }

    pub fn function(&self, kind: ConstraintKind) -> ConstraintFunction {
        ConstraintFunction::new(format!("{kind}_fun"), self.expressions(kind))
    }

    /// Aggregator entries of `kind`, in list order
    pub fn entries(&self, kind: ConstraintKind) -> Vec<ConstraintEntry> {
        self.constraints
            .iter()
            .filter(|c| c.kind == kind)
            .map(Constraint::to_entry)
            .collect()
    }
}

impl<'a> IntoIterator for &'a ConstraintList {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}

/// Numeric evaluation of a residual vector over the full variable and parameter vectors
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintFunction {
    name: String,
    outputs: Vec<Expr>,
    n_vars: usize,
    n_params: usize,
}

impl ConstraintFunction {
    pub fn new(name: impl Into<String>, outputs: Vec<Expr>) -> Self {
        let required = |space| {
            outputs
                .iter()
                .filter_map(|e| e.max_index(space))
                .max()
                .map_or(0, |i| i + 1)
        };
        let n_vars = required(Space::Variables);
        let n_params = required(Space::Parameters);
        Self {
            name: name.into(),
            outputs,
            n_vars,
            n_params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outputs(&self) -> &[Expr] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    fn check_inputs(&self, vars: &[f64], params: &[f64]) -> Result<(), ConstraintError> {
        if vars.len() < self.n_vars {
            return Err(ConstraintError::SizeMismatch {
                name: format!("{} variables", self.name),
                expected: self.n_vars,
                actual: vars.len(),
            });
        }
        if params.len() < self.n_params {
            return Err(ConstraintError::SizeMismatch {
                name: format!("{} parameters", self.name),
                expected: self.n_params,
                actual: params.len(),
            });
        }
        Ok(())
    }

    pub fn call(&self, vars: &[f64], params: &[f64]) -> Result<Array1<f64>, ConstraintError> {
        self.check_inputs(vars, params)?;
        Ok(self.outputs.iter().map(|e| e.eval(vars, params)).collect())
    }

    /// Symbolic Jacobian, one row per output and one column per symbol in `wrt`
    pub fn jacobian(&self, wrt: &[Symbol]) -> Vec<Vec<Expr>> {
        self.outputs
            .iter()
            .map(|e| wrt.iter().map(|s| e.diff(s)).collect())
            .collect()
    }

    pub fn eval_jacobian(
        &self,
        wrt: &[Symbol],
        vars: &[f64],
        params: &[f64],
    ) -> Result<Array2<f64>, ConstraintError> {
        self.check_inputs(vars, params)?;
        let jac = self.jacobian(wrt);
        let mut out = Array2::<f64>::zeros((self.outputs.len(), wrt.len()));
        for (i, row) in jac.iter().enumerate() {
            for (j, entry) in row.iter().enumerate() {
                out[[i, j]] = entry.eval(vars, params);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sym(index: usize) -> Symbol {
        Symbol::new(Space::Variables, index, format!("w{index}"))
    }

    #[test]
    fn list_rejects_duplicate_names_and_keeps_order() {
        let mut list = ConstraintList::new();
        list.append(Constraint::equality("b", vec![Expr::one()])).unwrap();
        list.append(Constraint::inequality("a", vec![Expr::zero()])).unwrap();
        let err = list.append(Constraint::equality("b", vec![])).unwrap_err();
        assert!(matches!(err, ConstraintError::DuplicateConstraint(n) if n == "b"));
        assert_eq!(list.names(), vec!["b", "a"]);
        assert_eq!(list.expressions(ConstraintKind::Equality), vec![Expr::one()]);
    }

    #[test]
    fn function_checks_input_length() {
        let f = ConstraintFunction::new("f", vec![Expr::symbol(sym(2))]);
        assert!(f.call(&[0.0, 1.0], &[]).is_err());
        let out = f.call(&[0.0, 1.0, 5.0], &[]).unwrap();
        assert_relative_eq!(out[0], 5.0);
    }

    #[test]
    fn jacobian_of_squared_norm() {
        let (a, b) = (sym(0), sym(1));
        let ea = Expr::symbol(a.clone());
        let eb = Expr::symbol(b.clone());
        let f = ConstraintFunction::new("norm", vec![&ea * &ea + &eb * &eb, ea - eb]);
        let jac = f.eval_jacobian(&[a, b], &[3.0, 4.0], &[]).unwrap();
        assert_relative_eq!(jac[[0, 0]], 6.0);
        assert_relative_eq!(jac[[0, 1]], 8.0);
        assert_relative_eq!(jac[[1, 0]], 1.0);
        assert_relative_eq!(jac[[1, 1]], -1.0);
    }

    #[test]
    fn kind_serializes_as_transcription_tag() {
        let json = serde_json::to_string(&ConstraintKind::Inequality).unwrap();
        assert_eq!(json, "\"ineq\"");
    }
}
