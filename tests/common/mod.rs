//! Shared fixtures: a two-kite system hanging off a single main tether
#![allow(dead_code)]

use std::sync::Arc;

use awe_ocp::options::{BatteryModel, BatteryOptions, FlapAerodynamics, FlapGeometry};
use awe_ocp::{
    Architecture, LandingRadii, Model, ModelSchema, Parameters, ReferenceSplines, Schema, Space,
    SymbolAllocator, VarCategory, Variables,
};

pub const STATES: &[(&str, usize)] = &[
    ("q10", 3),
    ("dq10", 3),
    ("r10", 9),
    ("q21", 3),
    ("dq21", 3),
    ("coeff21", 2),
    ("q31", 3),
    ("dq31", 3),
    ("coeff31", 2),
    ("e", 1),
    ("wx21", 3),
    ("dwx21", 3),
    ("ui_qaxi_21", 1),
    ("ui_uasym_21", 1),
];

pub fn architecture() -> Architecture {
    Architecture::from_pairs(&[(1, 0), (2, 1), (3, 1)]).unwrap()
}

pub fn model_schema() -> ModelSchema {
    ModelSchema::new(
        Schema::from_names(VarCategory::States, STATES).unwrap(),
        Schema::from_names(VarCategory::Controls, &[("dcoeff21", 2), ("dcoeff31", 2)]).unwrap(),
        Schema::from_names(VarCategory::DesignParameters, &[("xi_0", 1), ("xi_f", 1)]).unwrap(),
        Schema::from_names(VarCategory::Parameters, &[("nu", 1)]).unwrap(),
    )
}

pub fn model() -> Model {
    Model::new(model_schema(), architecture())
}

pub fn state_size() -> usize {
    STATES.iter().map(|(_, size)| size).sum()
}

/// Symbols for one boundary problem
///
/// Decision variables: initial then terminal `x, u, xi`. Parameters: `phi`
/// then the reference variables.
pub struct Problem {
    pub model: Model,
    pub initial: Variables,
    pub terminal: Variables,
    pub reference: Variables,
    pub parameters: Parameters,
    pub n_vars: usize,
    pub n_params: usize,
}

impl Problem {
    pub fn new(model: Model) -> Self {
        let mut vars = SymbolAllocator::new(Space::Variables);
        let mut params = SymbolAllocator::new(Space::Parameters);
        let initial = model.symbolic_variables(&mut vars, "init.");
        let terminal = model.symbolic_variables(&mut vars, "term.");
        let parameters = model.symbolic_parameters(&mut params, "");
        let reference = model.reference_variables(&mut params);
        Self {
            n_vars: vars.len(),
            n_params: params.len(),
            model,
            initial,
            terminal,
            reference,
            parameters,
        }
    }
}

pub fn problem() -> Problem {
    Problem::new(model())
}

/// Constant reference samples: every initial component 1.0, every terminal component 2.0
pub fn constant_splines(model: &Model) -> ReferenceSplines {
    let n = model.variables.x.total_size();
    ReferenceSplines::new(
        Arc::clone(&model.variables.x),
        vec![vec![1.0; n], vec![1.0; n]],
        vec![vec![2.0; n], vec![2.0; n]],
    )
    .unwrap()
}

pub fn landing() -> LandingRadii {
    LandingRadii {
        main_node_radius: 40.0,
        kite_node_radius: 10.0,
    }
}

pub fn battery_model() -> BatteryModel {
    BatteryModel {
        battery: BatteryOptions {
            voltage: 44.4,
            charge: 16.0,
            number_of_cells: 6,
            conversion_efficiency: 0.95,
            charge_fraction: 0.5,
            power_controller: 50.0,
            power_electronics: 20.0,
        },
        flap: FlapGeometry {
            flap_length: 0.2,
            flap_width: 0.1,
        },
        aero: FlapAerodynamics {
            c_dl: 0.5,
            c_dphi: 0.25,
            defl_lift_0: 0.0,
            defl_roll_0: 0.0,
        },
    }
}
