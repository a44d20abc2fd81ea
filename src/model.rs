//! Dynamics-model collaborator consumed by the constraint builders
//!
//! The builders only need the variable schemas, per-state scaling, the tether
//! architecture and an atmosphere model; everything else about the multi-body
//! dynamics stays outside this crate.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::architecture::Architecture;
use crate::error::ConstraintError;
use crate::symbolic::Expr;
use crate::utils::config::{GRAVITY, ISA_GAS_CONSTANT, ISA_RHO_REF, ISA_T_LAPSE, ISA_T_REF};
use crate::variables::{Parameters, Schema, SymbolAllocator, VarCategory, VarStruct, Variables};

/// Air density as a function of altitude
pub trait Atmosphere: fmt::Debug + Send + Sync {
    fn density(&self, altitude: &Expr) -> Expr;
}

/// International Standard Atmosphere (troposphere)
///
/// rho(z) = rho_ref * (T(z) / T_ref)^(g / (R * lapse) - 1),  T(z) = T_ref - lapse * z
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardAtmosphere {
    pub rho_ref: f64,
    pub t_ref: f64,
    pub t_lapse: f64,
    pub gas_constant: f64,
    pub gravity: f64,
}

impl Default for StandardAtmosphere {
    fn default() -> Self {
        Self {
            rho_ref: ISA_RHO_REF,
            t_ref: ISA_T_REF,
            t_lapse: ISA_T_LAPSE,
            gas_constant: ISA_GAS_CONSTANT,
            gravity: GRAVITY,
        }
    }
}

impl Atmosphere for StandardAtmosphere {
    fn density(&self, altitude: &Expr) -> Expr {
        let temperature = self.t_ref - self.t_lapse * altitude;
        let exponent = self.gravity / (self.gas_constant * self.t_lapse) - 1.0;
        self.rho_ref * (temperature / self.t_ref).powf(exponent)
    }
}

/// Variable schemas of the dynamics model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub x: Arc<Schema>,
    pub u: Arc<Schema>,
    pub xi: Arc<Schema>,
    pub phi: Arc<Schema>,
}

impl ModelSchema {
    pub fn new(x: Schema, u: Schema, xi: Schema, phi: Schema) -> Self {
        Self {
            x: Arc::new(x),
            u: Arc::new(u),
            xi: Arc::new(xi),
            phi: Arc::new(phi),
        }
    }
}

#[derive(Debug)]
pub struct Model {
    pub variables: ModelSchema,
    /// Per-component state scaling, laid out like `x`
    pub scaling: VarStruct<f64>,
    pub architecture: Architecture,
    pub atmosphere: Box<dyn Atmosphere>,
}

impl Model {
    /// Model with unit scaling and the standard atmosphere
    pub fn new(variables: ModelSchema, architecture: Architecture) -> Self {
        let scaling = VarStruct::filled(Arc::clone(&variables.x), 1.0);
        Self {
            variables,
            scaling,
            architecture,
            atmosphere: Box::new(StandardAtmosphere::default()),
        }
    }

    pub fn with_scaling(mut self, scaling: Vec<f64>) -> Result<Self, ConstraintError> {
        self.scaling = VarStruct::from_flat(Arc::clone(&self.variables.x), scaling)?;
        Ok(self)
    }

    pub fn with_atmosphere(mut self, atmosphere: Box<dyn Atmosphere>) -> Self {
        self.atmosphere = atmosphere;
        self
    }

    /// Fresh symbolic `x`, `u` and `xi` in the allocator's decision vector
    pub fn symbolic_variables(&self, alloc: &mut SymbolAllocator, prefix: &str) -> Variables {
        Variables {
            x: alloc.symbolic(&self.variables.x, prefix),
            u: alloc.symbolic(&self.variables.u, prefix),
            xi: alloc.symbolic(&self.variables.xi, prefix),
        }
    }

    pub fn symbolic_parameters(&self, alloc: &mut SymbolAllocator, prefix: &str) -> Parameters {
        Parameters {
            phi: alloc.symbolic(&self.variables.phi, prefix),
        }
    }

    /// Symbolic reference variables; `alloc` is normally the parameter allocator
    pub fn reference_variables(&self, alloc: &mut SymbolAllocator) -> Variables {
        self.symbolic_variables(alloc, "ref.")
    }

    pub fn schema(&self, category: VarCategory) -> &Arc<Schema> {
        match category {
            VarCategory::States => &self.variables.x,
            VarCategory::Controls => &self.variables.u,
            VarCategory::DesignParameters => &self.variables.xi,
            VarCategory::Parameters => &self.variables.phi,
        }
    }
}
