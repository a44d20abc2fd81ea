/// Aggregation of named constraint contributions into one ordered structure
///
/// Builders produce equality and inequality entries with arbitrary sizes. The
/// aggregator drops entries of zero size (reporting each through the injected
/// [`DiagnosticsSink`]), lays the survivors out in insertion order under an
/// `equality` and an `inequality` branch, and builds one evaluation function
/// per branch. Branch order is part of the contract with the transcription
/// layer: multipliers are matched to entries by position.
use super::core::{ConstraintFunction, ConstraintKind};
use crate::error::ConstraintError;
use crate::symbolic::Expr;

/// Declared shape of a constraint entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn column(rows: usize) -> Self {
        Self { rows, cols: 1 }
    }

    pub fn size(&self) -> usize {
        self.rows * self.cols
    }
}

/// A named contribution to one aggregation branch
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintEntry {
    pub name: String,
    pub shape: Shape,
    /// Column-major entries, `shape.size()` long
    pub expr: Vec<Expr>,
    /// Entry-aligned constant added to the integral at assembly time
    pub constant: Option<Vec<f64>>,
}

impl ConstraintEntry {
    /// Column-vector entry
    pub fn new(name: impl Into<String>, expr: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            shape: Shape::column(expr.len()),
            expr,
            constant: None,
        }
    }

    pub fn with_shape(
        name: impl Into<String>,
        shape: Shape,
        expr: Vec<Expr>,
    ) -> Result<Self, ConstraintError> {
        let name = name.into();
        if expr.len() != shape.size() {
            return Err(ConstraintError::SizeMismatch {
                name,
                expected: shape.size(),
                actual: expr.len(),
            });
        }
        Ok(Self {
            name,
            shape,
            expr,
            constant: None,
        })
    }

    pub fn with_constant(mut self, constant: Vec<f64>) -> Self {
        self.constant = Some(constant);
        self
    }

    pub fn is_degenerate(&self) -> bool {
        self.shape.size() == 0
    }
}

/// Non-fatal report about an entry dropped during aggregation
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub entry: String,
    pub kind: ConstraintKind,
    pub message: String,
}

/// Receiver for non-fatal aggregation diagnostics
pub trait DiagnosticsSink {
    fn warn(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticsSink for Vec<Diagnostic> {
    fn warn(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` at warn level
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            entry = %diagnostic.entry,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
    }
}

/// Position of one entry inside its branch vector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutEntry {
    pub name: String,
    pub shape: Shape,
    pub offset: usize,
}

/// Ordered name → shape layout of one branch
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BranchLayout {
    entries: Vec<LayoutEntry>,
    total_size: usize,
}

impl BranchLayout {
    fn push(&mut self, name: String, shape: Shape) {
        self.entries.push(LayoutEntry {
            name,
            shape,
            offset: self.total_size,
        });
        self.total_size += shape.size();
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn entry(&self, name: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }
}

/// Two-branch structure type; a branch with no surviving entries is absent
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ConstraintLayout {
    pub equality: Option<BranchLayout>,
    pub inequality: Option<BranchLayout>,
}

impl ConstraintLayout {
    pub fn branch(&self, kind: ConstraintKind) -> Option<&BranchLayout> {
        match kind {
            ConstraintKind::Equality => self.equality.as_ref(),
            ConstraintKind::Inequality => self.inequality.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.equality.is_none() && self.inequality.is_none()
    }

    pub fn branch_size(&self, kind: ConstraintKind) -> usize {
        self.branch(kind).map_or(0, BranchLayout::total_size)
    }
}

/// Values laid out according to a [`ConstraintLayout`]
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintStruct<T> {
    layout: ConstraintLayout,
    equality: Vec<T>,
    inequality: Vec<T>,
}

impl<T> ConstraintStruct<T> {
    pub fn new(
        layout: ConstraintLayout,
        equality: Vec<T>,
        inequality: Vec<T>,
    ) -> Result<Self, ConstraintError> {
        for (kind, values) in [
            (ConstraintKind::Equality, &equality),
            (ConstraintKind::Inequality, &inequality),
        ] {
            if values.len() != layout.branch_size(kind) {
                return Err(ConstraintError::SizeMismatch {
                    name: kind.to_string(),
                    expected: layout.branch_size(kind),
                    actual: values.len(),
                });
            }
        }
        Ok(Self {
            layout,
            equality,
            inequality,
        })
    }

    pub fn layout(&self) -> &ConstraintLayout {
        &self.layout
    }

    /// Whole branch, concatenated in entry order
    pub fn flatten(&self, kind: ConstraintKind) -> &[T] {
        match kind {
            ConstraintKind::Equality => &self.equality,
            ConstraintKind::Inequality => &self.inequality,
        }
    }

    pub fn entry(&self, kind: ConstraintKind, name: &str) -> Option<&[T]> {
        let entry = self.layout.branch(kind)?.entry(name)?;
        Some(&self.flatten(kind)[entry.offset..entry.offset + entry.shape.size()])
    }
}

/// Evaluation functions of the equality and inequality branches
#[derive(Clone, Debug, PartialEq)]
pub struct BranchFunctions {
    pub equality: ConstraintFunction,
    pub inequality: ConstraintFunction,
}

impl BranchFunctions {
    pub fn get(&self, kind: ConstraintKind) -> &ConstraintFunction {
        match kind {
            ConstraintKind::Equality => &self.equality,
            ConstraintKind::Inequality => &self.inequality,
        }
    }
}

/// Output of [`aggregate`]: symbolic structure, branch functions and constants
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedConstraints {
    pub symbols: ConstraintStruct<Expr>,
    pub functions: BranchFunctions,
    /// Present when any surviving entry carries a constant
    pub constants: Option<ConstraintStruct<f64>>,
}

impl AggregatedConstraints {
    pub fn layout(&self) -> &ConstraintLayout {
        self.symbols.layout()
    }
}

struct Branch {
    layout: BranchLayout,
    expr: Vec<Expr>,
    constants: Vec<f64>,
    has_constant: bool,
}

fn build_branch(
    kind: ConstraintKind,
    entries: Vec<ConstraintEntry>,
    sink: &mut dyn DiagnosticsSink,
) -> Result<Option<Branch>, ConstraintError> {
    let mut branch = Branch {
        layout: BranchLayout::default(),
        expr: Vec::new(),
        constants: Vec::new(),
        has_constant: false,
    };

    for entry in entries {
        if entry.is_degenerate() {
            sink.warn(Diagnostic {
                message: format!(
                    "removing constraint entry ({}) from {} branch, because it appears to be empty",
                    entry.name,
                    kind
                ),
                entry: entry.name,
                kind,
            });
            continue;
        }
        if branch.layout.entry(&entry.name).is_some() {
            return Err(ConstraintError::DuplicateConstraint(entry.name));
        }
        if entry.expr.len() != entry.shape.size() {
            return Err(ConstraintError::SizeMismatch {
                name: entry.name,
                expected: entry.shape.size(),
                actual: entry.expr.len(),
            });
        }

        match entry.constant {
            Some(constant) => {
                if constant.len() != entry.shape.size() {
                    return Err(ConstraintError::SizeMismatch {
                        name: format!("{} constant", entry.name),
                        expected: entry.shape.size(),
                        actual: constant.len(),
                    });
                }
                branch.has_constant = true;
                branch.constants.extend(constant);
            }
            None => branch
                .constants
                .extend(std::iter::repeat(0.0).take(entry.shape.size())),
        }
        branch.expr.extend(entry.expr);
        branch.layout.push(entry.name, entry.shape);
    }

    Ok((!branch.layout.is_empty()).then_some(branch))
}

/// Aggregate equality and inequality entries into one ordered structure
///
/// `name` prefixes the two branch evaluation functions. Both functions exist
/// even when their branch is absent; they then return an empty vector.
pub fn aggregate(
    name: &str,
    equalities: Vec<ConstraintEntry>,
    inequalities: Vec<ConstraintEntry>,
    sink: &mut dyn DiagnosticsSink,
) -> Result<AggregatedConstraints, ConstraintError> {
    let eq = build_branch(ConstraintKind::Equality, equalities, sink)?;
    let ineq = build_branch(ConstraintKind::Inequality, inequalities, sink)?;

    let has_constant = eq.iter().chain(ineq.iter()).any(|b| b.has_constant);
    let split = |branch: Option<Branch>| match branch {
        Some(b) => (Some(b.layout), b.expr, b.constants),
        None => (None, Vec::new(), Vec::new()),
    };
    let (eq_layout, eq_expr, eq_constants) = split(eq);
    let (ineq_layout, ineq_expr, ineq_constants) = split(ineq);

    let layout = ConstraintLayout {
        equality: eq_layout,
        inequality: ineq_layout,
    };

    let functions = BranchFunctions {
        equality: ConstraintFunction::new(format!("{name}_equality"), eq_expr.clone()),
        inequality: ConstraintFunction::new(format!("{name}_inequality"), ineq_expr.clone()),
    };
    let constants = if has_constant {
        Some(ConstraintStruct::new(
            layout.clone(),
            eq_constants,
            ineq_constants,
        )?)
    } else {
        None
    };
    let symbols = ConstraintStruct::new(layout, eq_expr, ineq_expr)?;

    Ok(AggregatedConstraints {
        symbols,
        functions,
        constants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_size_counts_all_cells() {
        assert_eq!(Shape::new(2, 3).size(), 6);
        assert_eq!(Shape::new(0, 1).size(), 0);
    }

    #[test]
    fn with_shape_checks_length() {
        let err = ConstraintEntry::with_shape("m", Shape::new(2, 2), vec![Expr::one()]);
        assert!(err.is_err());
        let ok = ConstraintEntry::with_shape("m", Shape::new(1, 2), vec![Expr::one(), Expr::zero()]);
        assert_eq!(ok.unwrap().shape.size(), 2);
    }

    #[test]
    fn empty_input_gives_empty_layout_and_functions() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let agg = aggregate("empty", vec![], vec![], &mut sink).unwrap();
        assert!(agg.layout().is_empty());
        assert!(agg.functions.equality.is_empty());
        assert!(agg.constants.is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn duplicate_entry_names_are_rejected() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let entries = vec![
            ConstraintEntry::new("a", vec![Expr::one()]),
            ConstraintEntry::new("a", vec![Expr::zero()]),
        ];
        assert!(aggregate("dup", entries, vec![], &mut sink).is_err());
    }

    #[test]
    fn constants_align_with_entries() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let ineqs = vec![
            ConstraintEntry::new("plain", vec![Expr::one(), Expr::one()]),
            ConstraintEntry::new("battery", vec![Expr::zero()]).with_constant(vec![7.5]),
        ];
        let agg = aggregate("integral", vec![], ineqs, &mut sink).unwrap();
        let constants = agg.constants.unwrap();
        assert_eq!(constants.flatten(ConstraintKind::Inequality), &[0.0, 0.0, 7.5]);
        assert_eq!(
            constants.entry(ConstraintKind::Inequality, "battery"),
            Some(&[7.5][..])
        );
    }
}
