/// Terminal-time constraint builders
use super::matching::{scaled_state_match, spline_reference};
use crate::architecture::MAIN_NODE;
use crate::error::ConstraintError;
use crate::model::Model;
use crate::options::LandingRadii;
use crate::parameterization::{Phase, SplineProvider};
use crate::symbolic::Expr;
use crate::utils::config::XI_TERMINAL;
use crate::utils::vector_math::squared_norm;
use crate::variables::{RootKind, VarKey, Variables};

/// States matched against the terminal reference spline evaluated at `xi_f`
pub fn make_param_terminal_conditions(
    terminal: &Variables,
    splines: &dyn SplineProvider,
    model: &Model,
) -> Result<Vec<Expr>, ConstraintError> {
    let xi_f = terminal.xi.component(&VarKey::new(XI_TERMINAL), 0)?;
    let terminal_splines = splines.get_splines(terminal, Phase::Terminal)?;
    let reference = spline_reference(&model.variables.x, &terminal_splines, xi_f)?;

    scaled_state_match(
        &model.variables.x,
        &terminal.x,
        &reference,
        &model.scaling,
        &[],
    )
}

/// Normalized squared-radius bounds on the landing positions
///
/// One entry for the main node, then one per kite node in ascending order:
/// `(|q|^2 - R^2) / R_main^2 <= 0`.
pub fn make_terminal_position_inequality(
    terminal: &Variables,
    model: &Model,
    landing: &LandingRadii,
) -> Result<Vec<Expr>, ConstraintError> {
    let main_sq = landing.main_node_radius.powi(2);
    let kite_sq = landing.kite_node_radius.powi(2);

    let main_key = VarKey::with_nodes("q", MAIN_NODE.node, MAIN_NODE.parent);
    let mut out = Vec::with_capacity(model.architecture.kite_nodes().len() + 1);
    out.push((squared_norm(terminal.x.get(&main_key)?) - main_sq) / main_sq);

    for &node in model.architecture.kite_nodes() {
        let parent = model.architecture.parent(node)?;
        let key = VarKey::with_nodes("q", node, parent);
        out.push((squared_norm(terminal.x.get(&key)?) - kite_sq) / main_sq);
    }
    Ok(out)
}

/// Terminal point match that leaves invariant components free
///
/// Positions and velocities are matched in their first two components only,
/// rotations in components 0, 1 and 3; all other states in full.
pub fn make_terminal_point_constraint(
    terminal: &Variables,
    reference: &Variables,
    model: &Model,
) -> Result<Vec<Expr>, ConstraintError> {
    let mut out = Vec::new();
    for key in model.variables.x.keys() {
        let components: Vec<usize> = match key.kind() {
            RootKind::Position | RootKind::Velocity => vec![0, 1],
            RootKind::Rotation => vec![0, 1, 3],
            _ => (0..terminal.x.get(key)?.len()).collect(),
        };
        for i in components {
            out.push(terminal.x.component(key, i)? - reference.x.component(key, i)?);
        }
    }
    Ok(out)
}
