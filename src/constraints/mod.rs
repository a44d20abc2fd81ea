//! Operation constraints
//!
//! Mode classification, the constraint-family builders, aggregation of named
//! entries into ordered branches, and the assemblers that tie them together.

pub mod aggregate;
pub mod conditions;
pub mod core;
pub mod initial;
pub mod integral;
mod matching;
pub mod operation;
pub mod periodic;
pub mod terminal;

// Re-export main types
pub use aggregate::{
    aggregate, AggregatedConstraints, BranchFunctions, BranchLayout, ConstraintEntry,
    ConstraintLayout, ConstraintStruct, Diagnostic, DiagnosticsSink, LayoutEntry, Shape,
    TracingSink,
};
pub use conditions::{get_operation_conditions, is_periodic, OperationConditions};
pub use core::{Constraint, ConstraintFunction, ConstraintKind, ConstraintList};
pub use operation::{
    generate_integral_constraints, get_initial_constraints, get_periodic_constraints,
    get_terminal_constraints,
};
