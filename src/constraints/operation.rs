/// Operation constraints: top-level assemblers
///
/// Each assembler asks the mode classifier which families apply, runs the
/// matching builders and returns the results as an ordered constraint list.
/// Aggregation happens later, together with the dynamics and path constraints.
/// The integral family is the exception and comes back already aggregated.
use super::aggregate::{aggregate, AggregatedConstraints, ConstraintEntry, DiagnosticsSink};
use super::conditions::get_operation_conditions;
use super::core::{Constraint, ConstraintList};
use super::initial::{
    make_initial_conditions, make_initial_energy_equality, make_param_initial_conditions,
};
use super::integral::{make_terminal_battery_constant, make_terminal_battery_integrand};
use super::periodic::make_periodicity_equality;
use super::terminal::{
    make_param_terminal_conditions, make_terminal_point_constraint,
    make_terminal_position_inequality,
};
use crate::error::{ConfigError, ConstraintError};
use crate::model::Model;
use crate::options::{EmergencyScenario, TrajectoryConfig};
use crate::parameterization::SplineProvider;
use crate::utils::config::ENERGY_STATE;
use crate::variables::{Parameters, VarKey, Variables};

pub const INITIAL_ENERGY: &str = "initial_energy";
pub const PARAM_INITIAL_CONDITIONS: &str = "param_initial_conditions";
pub const INITIAL_CONDITIONS: &str = "initial_conditions";
pub const PARAM_TERMINAL_CONDITIONS: &str = "param_terminal_conditions";
pub const TERMINAL_INEQUALITIES: &str = "terminal_inequalities";
pub const TERMINAL_EQUALITIES: &str = "terminal_equalities";
pub const STATE_PERIODICITY: &str = "state_periodicity";
pub const TERMINAL_BATTERY: &str = "terminal_battery";
pub const INTEGRAL: &str = "integral";

/// Constraints applied at the first time point
pub fn get_initial_constraints(
    config: &TrajectoryConfig,
    initial: &Variables,
    reference: &Variables,
    model: &Model,
    splines: &dyn SplineProvider,
) -> Result<ConstraintList, ConstraintError> {
    let conditions = get_operation_conditions(config);
    let mut list = ConstraintList::new();

    if model.variables.x.contains(&VarKey::new(ENERGY_STATE)) {
        let expr = make_initial_energy_equality(initial, reference)?;
        list.append(Constraint::equality(INITIAL_ENERGY, expr))?;
    }

    if conditions.param_initial_conditions {
        let expr = make_param_initial_conditions(initial, splines, model, config)?;
        list.append(Constraint::equality(PARAM_INITIAL_CONDITIONS, expr))?;
    }

    if conditions.initial_conditions {
        let expr = make_initial_conditions(initial, reference, model)?;
        list.append(Constraint::equality(INITIAL_CONDITIONS, expr))?;
    }

    tracing::debug!(
        trajectory_type = config.mode.label(),
        constraints = ?list.names(),
        "assembled initial constraints"
    );
    Ok(list)
}

/// Constraints applied at the last time point
pub fn get_terminal_constraints(
    config: &TrajectoryConfig,
    terminal: &Variables,
    reference: &Variables,
    model: &Model,
    splines: &dyn SplineProvider,
) -> Result<ConstraintList, ConstraintError> {
    let conditions = get_operation_conditions(config);
    let mut list = ConstraintList::new();

    if conditions.param_terminal_conditions {
        let expr = make_param_terminal_conditions(terminal, splines, model)?;
        list.append(Constraint::equality(PARAM_TERMINAL_CONDITIONS, expr))?;
    }

    if conditions.terminal_inequalities {
        let landing = config.mode.landing_radii().ok_or_else(|| {
            ConfigError::MissingOption("nominal_landing.main_node_radius".to_string())
        })?;
        let expr = make_terminal_position_inequality(terminal, model, landing)?;
        list.append(Constraint::inequality(TERMINAL_INEQUALITIES, expr))?;
    }

    if conditions.terminal_conditions {
        let expr = make_terminal_point_constraint(terminal, reference, model)?;
        list.append(Constraint::equality(TERMINAL_EQUALITIES, expr))?;
    }

    tracing::debug!(
        trajectory_type = config.mode.label(),
        constraints = ?list.names(),
        "assembled terminal constraints"
    );
    Ok(list)
}

/// Periodicity across the cycle boundary
pub fn get_periodic_constraints(
    config: &TrajectoryConfig,
    initial: &Variables,
    terminal: &Variables,
) -> Result<ConstraintList, ConstraintError> {
    let conditions = get_operation_conditions(config);
    let mut list = ConstraintList::new();

    if conditions.periodic {
        let expr = make_periodicity_equality(initial, terminal, &config.comparison_filter)?;
        tracing::debug!(size = expr.len(), "assembled state periodicity");
        list.append(Constraint::equality(STATE_PERIODICITY, expr))?;
    }
    Ok(list)
}

/// Integral constraints, aggregated
///
/// `variables` and `parameters` are the symbols at one integration point; the
/// transcription layer integrates the returned integrand over the horizon and
/// adds the constants. Without a broken battery both branches are empty.
pub fn generate_integral_constraints(
    config: &TrajectoryConfig,
    variables: &Variables,
    parameters: &Parameters,
    model: &Model,
    sink: &mut dyn DiagnosticsSink,
) -> Result<AggregatedConstraints, ConstraintError> {
    let conditions = get_operation_conditions(config);
    let mut inequalities = Vec::new();

    if conditions.integral_constraints {
        if let Some(EmergencyScenario::BrokenBattery {
            kite,
            model: battery,
        }) = config.mode.emergency_scenario()
        {
            let integrand =
                make_terminal_battery_integrand(battery, *kite, variables, parameters, model)?;
            let constant = make_terminal_battery_constant(&battery.battery);
            inequalities.push(
                ConstraintEntry::new(TERMINAL_BATTERY, vec![integrand]).with_constant(vec![constant]),
            );
        }
    }

    aggregate(INTEGRAL, Vec::new(), inequalities, sink)
}
