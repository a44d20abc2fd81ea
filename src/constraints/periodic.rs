/// State periodicity for cyclic trajectories
use super::matching::check_block_size;
use crate::error::ConstraintError;
use crate::options::ComparisonModelFilter;
use crate::symbolic::Expr;
use crate::utils::vector_math::{difference, vertcat};
use crate::variables::{RootKind, VarKey, Variables};

/// Whether `key` takes part in the periodicity match
///
/// Energy and wake states are not periodic, and neither are the induction
/// states of a comparison model that is not the one being enforced.
pub fn is_periodic_state(key: &VarKey, filter: &ComparisonModelFilter) -> bool {
    match key.kind() {
        RootKind::Energy | RootKind::Wake => false,
        _ => !filter.is_comparison_variable(&key.to_string()),
    }
}

/// `initial.x - terminal.x` over every periodic state, in schema order
pub fn make_periodicity_equality(
    initial: &Variables,
    terminal: &Variables,
    filter: &ComparisonModelFilter,
) -> Result<Vec<Expr>, ConstraintError> {
    let blocks = initial
        .x
        .schema()
        .keys()
        .filter(|key| is_periodic_state(key, filter))
        .map(|key| {
            let (start, end) = (initial.x.get(key)?, terminal.x.get(key)?);
            check_block_size(key, start.len(), end.len())?;
            Ok(difference(start, end))
        })
        .collect::<Result<Vec<_>, ConstraintError>>()?;
    Ok(vertcat(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::{Schema, VarCategory, VarStruct};
    use std::sync::Arc;

    fn variables(states: &[(&str, usize)], value: f64) -> Variables {
        let empty = |category| Arc::new(Schema::from_names(category, &[]).unwrap());
        let x = Arc::new(Schema::from_names(VarCategory::States, states).unwrap());
        Variables {
            x: VarStruct::filled(x, Expr::constant(value)),
            u: VarStruct::filled(empty(VarCategory::Controls), Expr::zero()),
            xi: VarStruct::filled(empty(VarCategory::DesignParameters), Expr::zero()),
        }
    }

    #[test]
    fn energy_and_wake_states_are_not_periodic() {
        let filter = ComparisonModelFilter::default();
        let initial = variables(&[("q10", 3), ("e", 1), ("wx21", 3), ("dq10", 3)], 2.0);
        let terminal = variables(&[("q10", 3), ("e", 1), ("wx21", 3), ("dq10", 3)], 0.5);
        let out = make_periodicity_equality(&initial, &terminal, &filter).unwrap();
        assert_eq!(out, vec![Expr::constant(1.5); 6]);
    }

    #[test]
    fn mismatched_blocks_are_rejected() {
        let filter = ComparisonModelFilter::default();
        let initial = variables(&[("q10", 3)], 1.0);
        let terminal = variables(&[("q10", 2)], 1.0);
        let err = make_periodicity_equality(&initial, &terminal, &filter).unwrap_err();
        assert!(matches!(err, ConstraintError::SizeMismatch { expected: 3, actual: 2, .. }));
    }
}
