/// Vector math utilities for constraint construction
///
/// This module provides helper functions for symbolic vector operations used
/// by the constraint builders: inner products, squared norms, element-wise
/// differences and vertical concatenation of residual blocks.
use crate::symbolic::Expr;

/// Calculate the dot product of two symbolic vectors
///
/// # Arguments
/// * `a` - First vector
/// * `b` - Second vector, same length as `a`
///
/// # Returns
/// Scalar expression a·b (zero for empty inputs)
pub fn dot_product(a: &[Expr], b: &[Expr]) -> Expr {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Squared Euclidean norm ‖v‖²
pub fn squared_norm(v: &[Expr]) -> Expr {
    dot_product(v, v)
}

/// Element-wise difference `a - b`
pub fn difference(a: &[Expr], b: &[Expr]) -> Vec<Expr> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Element-wise `a - b / scale`
///
/// Scaling applies to the reference only; the variables in `a` already live in
/// scaled coordinates.
pub fn scaled_difference(a: &[Expr], b: &[Expr], scale: &[f64]) -> Vec<Expr> {
    a.iter()
        .zip(b)
        .zip(scale)
        .map(|((x, y), s)| x - y / *s)
        .collect()
}

/// Stack residual blocks into one column
pub fn vertcat(blocks: impl IntoIterator<Item = Vec<Expr>>) -> Vec<Expr> {
    blocks.into_iter().flatten().collect()
}
