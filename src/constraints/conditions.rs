/// Operation-mode classification
///
/// Maps a trajectory mode to the seven independent flags that decide which
/// constraint families the assemblers build.
use crate::options::{EmergencyScenario, TrajectoryConfig, TrajectoryMode};

/// Constraint families active for one trajectory mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationConditions {
    /// Terminal state must equal the initial state
    pub periodic: bool,
    /// Initial state matched against the reference
    pub initial_conditions: bool,
    /// Initial state matched against the reference spline at `xi_0`
    pub param_initial_conditions: bool,
    /// Terminal state matched against the reference spline at `xi_f`
    pub param_terminal_conditions: bool,
    /// Landing positions bounded by the landing radii
    pub terminal_inequalities: bool,
    /// Battery depletion integral over the horizon
    pub integral_constraints: bool,
    /// Terminal state matched against the reference point
    pub terminal_conditions: bool,
}

impl OperationConditions {
    pub fn from_mode(mode: &TrajectoryMode) -> Self {
        match mode {
            TrajectoryMode::PowerCycle | TrajectoryMode::Tracking => Self {
                periodic: true,
                ..Self::default()
            },
            TrajectoryMode::Launch => Self {
                initial_conditions: true,
                param_terminal_conditions: true,
                ..Self::default()
            },
            TrajectoryMode::Transition => Self {
                param_initial_conditions: true,
                param_terminal_conditions: true,
                ..Self::default()
            },
            TrajectoryMode::NominalLanding { .. } => Self {
                param_initial_conditions: true,
                terminal_inequalities: true,
                ..Self::default()
            },
            TrajectoryMode::CompromisedLanding { scenario, .. } => Self {
                param_initial_conditions: true,
                terminal_inequalities: true,
                integral_constraints: matches!(scenario, EmergencyScenario::BrokenBattery { .. }),
                ..Self::default()
            },
            TrajectoryMode::Mpc {
                terminal_point_constr,
            } => Self {
                initial_conditions: true,
                terminal_conditions: *terminal_point_constr,
                ..Self::default()
            },
            TrajectoryMode::Custom(_) => Self::default(),
        }
    }

    /// True when no operation constraint family is active
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Flags in the order periodic, initial, param-initial, param-terminal,
    /// terminal-inequalities, integral, terminal-point
    pub fn as_array(&self) -> [bool; 7] {
        [
            self.periodic,
            self.initial_conditions,
            self.param_initial_conditions,
            self.param_terminal_conditions,
            self.terminal_inequalities,
            self.integral_constraints,
            self.terminal_conditions,
        ]
    }
}

/// Whether the trajectory is a cycle whose end state must match its start
pub fn is_periodic(config: &TrajectoryConfig) -> bool {
    matches!(
        config.mode,
        TrajectoryMode::PowerCycle | TrajectoryMode::Tracking
    )
}

pub fn get_operation_conditions(config: &TrajectoryConfig) -> OperationConditions {
    let conditions = OperationConditions::from_mode(&config.mode);
    debug_assert_eq!(conditions.periodic, is_periodic(config));
    if conditions.is_unconstrained() {
        tracing::warn!(
            trajectory_type = config.mode.label(),
            "no operation constraints apply to this trajectory type"
        );
    }
    conditions
}
