/// Initial-time constraint builders
use super::matching::{check_block_size, scaled_state_match, spline_reference, state_match};
use crate::error::ConstraintError;
use crate::model::Model;
use crate::options::{EmergencyScenario, TrajectoryConfig, TrajectoryMode};
use crate::parameterization::{Phase, SplineProvider};
use crate::symbolic::Expr;
use crate::utils::config::{ENERGY_STATE, XI_INITIAL};
use crate::utils::vector_math::difference;
use crate::variables::{VarKey, Variables};

/// `initial.x.e - reference.x.e`
pub fn make_initial_energy_equality(
    initial: &Variables,
    reference: &Variables,
) -> Result<Vec<Expr>, ConstraintError> {
    let key = VarKey::new(ENERGY_STATE);
    let (actual, target) = (initial.x.get(&key)?, reference.x.get(&key)?);
    check_block_size(&key, actual.len(), target.len())?;
    Ok(difference(actual, target))
}

/// Every state matched against the reference
pub fn make_initial_conditions(
    initial: &Variables,
    reference: &Variables,
    model: &Model,
) -> Result<Vec<Expr>, ConstraintError> {
    state_match(&model.variables.x, &initial.x, &reference.x, &[])
}

/// States excluded from the parameterized initial match
///
/// With structural damage the broken kite's aerodynamic coefficients are left free.
pub fn param_initial_black_list(
    config: &TrajectoryConfig,
    model: &Model,
) -> Result<Vec<VarKey>, ConstraintError> {
    match &config.mode {
        TrajectoryMode::CompromisedLanding {
            scenario: EmergencyScenario::StructuralDamages { kite },
            ..
        } => {
            let parent = model.architecture.parent(*kite)?;
            Ok(vec![VarKey::with_nodes("coeff", *kite, parent)])
        }
        _ => Ok(Vec::new()),
    }
}

/// States matched against the initial reference spline evaluated at `xi_0`
pub fn make_param_initial_conditions(
    initial: &Variables,
    splines: &dyn SplineProvider,
    model: &Model,
    config: &TrajectoryConfig,
) -> Result<Vec<Expr>, ConstraintError> {
    let xi_0 = initial.xi.component(&VarKey::new(XI_INITIAL), 0)?;
    let initial_splines = splines.get_splines(initial, Phase::Initial)?;
    let reference = spline_reference(&model.variables.x, &initial_splines, xi_0)?;

    let black_list = param_initial_black_list(config, model)?;
    scaled_state_match(
        &model.variables.x,
        &initial.x,
        &reference,
        &model.scaling,
        &black_list,
    )
}
