//! Constraint assembly for multi-kite airborne wind energy trajectory optimization
//!
//! Given a trajectory configuration (power cycle, launch, landing, transition,
//! model-predictive control), the dynamics-model schema and symbolic variables
//! at the boundary time points, this crate decides which constraint families
//! apply and builds them as ordered, named symbolic residuals.

// Module declarations
pub mod architecture;
pub mod constraints;
pub mod error;
pub mod model;
pub mod options;
pub mod parameterization;
pub mod symbolic;
pub mod utils;
pub mod variables;

// Re-export public API
pub use architecture::{Architecture, MAIN_NODE};
pub use constraints::{
    aggregate, generate_integral_constraints, get_initial_constraints, get_operation_conditions,
    get_periodic_constraints, get_terminal_constraints, AggregatedConstraints, Constraint,
    ConstraintEntry, ConstraintKind, ConstraintList, Diagnostic, DiagnosticsSink,
    OperationConditions, TracingSink,
};
pub use error::{ConfigError, ConstraintError};
pub use model::{Atmosphere, Model, ModelSchema, StandardAtmosphere};
pub use options::{
    ComparisonModelFilter, EmergencyScenario, LandingRadii, OptionTree, TrajectoryConfig,
    TrajectoryMode,
};
pub use parameterization::{ReferenceSplines, Spline, SplineProvider};
pub use symbolic::{Expr, Space, Symbol};
pub use variables::{
    Parameters, Schema, SymbolAllocator, VarCategory, VarKey, VarStruct, Variables,
};
