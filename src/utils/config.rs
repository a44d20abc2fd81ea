//! Variable names and option defaults shared by the constraint builders

/// Accumulated energy state
pub const ENERGY_STATE: &str = "e";
/// Design parameter selecting the initial point on the reference spline
pub const XI_INITIAL: &str = "xi_0";
/// Design parameter selecting the terminal point on the reference spline
pub const XI_TERMINAL: &str = "xi_f";
/// Homotopy / continuation parameter in `phi`
pub const HOMOTOPY_PARAMETER: &str = "nu";

/// Induction-model labels that mark variables of a comparison model
pub const DEFAULT_INDUCTION_LABELS: [&str; 4] = ["qaxi", "qasym", "uaxi", "uasym"];

/// Leading path segment accepted (and stripped) on dotted option paths
pub const USER_OPTIONS_PREFIX: &str = "user_options.";

// International Standard Atmosphere, sea level
pub const ISA_RHO_REF: f64 = 1.225; // kg/m^3
pub const ISA_T_REF: f64 = 288.15; // K
pub const ISA_T_LAPSE: f64 = 0.0065; // K/m
pub const ISA_GAS_CONSTANT: f64 = 287.053; // J/(kg K)
pub const GRAVITY: f64 = 9.81; // m/s^2
