/// State-matching helpers shared by the initial and terminal builders
use std::sync::Arc;

use crate::error::ConstraintError;
use crate::parameterization::Splines;
use crate::symbolic::Expr;
use crate::utils::vector_math::{difference, scaled_difference, vertcat};
use crate::variables::{Schema, VarKey, VarStruct};

/// State-shaped reference built by evaluating every `(state, dimension)` spline at `xi`
pub(crate) fn spline_reference(
    schema: &Arc<Schema>,
    splines: &Splines,
    xi: &Expr,
) -> Result<VarStruct<Expr>, ConstraintError> {
    let mut values = Vec::with_capacity(schema.total_size());
    for entry in schema.entries() {
        for dim in 0..entry.size {
            values.push(splines.get(&entry.key, dim)?.evaluate(xi));
        }
    }
    VarStruct::from_flat(Arc::clone(schema), values)
}

/// Error unless two blocks of `key` have the same length
pub(crate) fn check_block_size(
    key: &VarKey,
    expected: usize,
    actual: usize,
) -> Result<(), ConstraintError> {
    if expected != actual {
        return Err(ConstraintError::SizeMismatch {
            name: key.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Keys of `schema` in declared order, minus `black_list`
fn constrained_keys<'a>(
    schema: &'a Schema,
    black_list: &'a [VarKey],
) -> impl Iterator<Item = &'a VarKey> + 'a {
    schema.keys().filter(move |key| !black_list.contains(key))
}

/// `actual[key] - reference[key]` for every non-black-listed key, stacked in schema order
pub(crate) fn state_match(
    schema: &Schema,
    actual: &VarStruct<Expr>,
    reference: &VarStruct<Expr>,
    black_list: &[VarKey],
) -> Result<Vec<Expr>, ConstraintError> {
    let blocks = constrained_keys(schema, black_list)
        .map(|key| {
            let (a, r) = (actual.get(key)?, reference.get(key)?);
            check_block_size(key, a.len(), r.len())?;
            Ok(difference(a, r))
        })
        .collect::<Result<Vec<_>, ConstraintError>>()?;
    Ok(vertcat(blocks))
}

/// `actual[key] - reference[key] / scaling[key]` for every non-black-listed key
pub(crate) fn scaled_state_match(
    schema: &Schema,
    actual: &VarStruct<Expr>,
    reference: &VarStruct<Expr>,
    scaling: &VarStruct<f64>,
    black_list: &[VarKey],
) -> Result<Vec<Expr>, ConstraintError> {
    let blocks = constrained_keys(schema, black_list)
        .map(|key| {
            let (a, r, s) = (actual.get(key)?, reference.get(key)?, scaling.get(key)?);
            check_block_size(key, a.len(), r.len())?;
            check_block_size(key, a.len(), s.len())?;
            Ok(scaled_difference(a, r, s))
        })
        .collect::<Result<Vec<_>, ConstraintError>>()?;
    Ok(vertcat(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VarCategory;

    fn states(entries: &[(&str, usize)]) -> Arc<Schema> {
        Arc::new(Schema::from_names(VarCategory::States, entries).unwrap())
    }

    #[test]
    fn mismatched_blocks_are_rejected() {
        let schema = states(&[("q10", 3), ("e", 1)]);
        let short = states(&[("q10", 2), ("e", 1)]);
        let actual = VarStruct::filled(Arc::clone(&schema), Expr::one());
        let reference = VarStruct::filled(short, Expr::zero());

        let err = state_match(&schema, &actual, &reference, &[]).unwrap_err();
        assert!(matches!(
            err,
            ConstraintError::SizeMismatch { ref name, expected: 3, actual: 2 } if name == "q10"
        ));

        let scaling = VarStruct::filled(Arc::clone(&schema), 1.0);
        let err = scaled_state_match(&schema, &actual, &reference, &scaling, &[]).unwrap_err();
        assert!(matches!(err, ConstraintError::SizeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn black_listed_mismatch_is_skipped() {
        let schema = states(&[("q10", 3), ("e", 1)]);
        let short = states(&[("q10", 2), ("e", 1)]);
        let actual = VarStruct::filled(Arc::clone(&schema), Expr::one());
        let reference = VarStruct::filled(short, Expr::zero());

        let out = state_match(&schema, &actual, &reference, &[VarKey::new("q10")]).unwrap();
        assert_eq!(out, vec![Expr::one()]);
    }
}
