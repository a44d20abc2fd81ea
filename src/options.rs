//! Trajectory options
//!
//! Options arrive as a nested mapping keyed by dotted paths
//! (`trajectory.type`, `compromised_landing.battery.voltage`, ...). The raw
//! sections deserialize with serde; [`TrajectoryConfig::from_options`] then
//! checks that the sections the selected mode needs are present and turns the
//! whole thing into a typed [`TrajectoryMode`].
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::utils::config::{DEFAULT_INDUCTION_LABELS, USER_OPTIONS_PREFIX};

/// Landing radii used by the terminal position inequality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingRadii {
    /// Radius around the ground station the main node must end within
    pub main_node_radius: f64,
    /// Radius around its parent each kite node must end within
    pub kite_node_radius: f64,
}

/// On-board battery of the broken kite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryOptions {
    /// Cell voltage [V]
    pub voltage: f64,
    /// Cell charge [Ah]
    pub charge: f64,
    /// Number of cells in series
    pub number_of_cells: u32,
    /// Fraction of stored energy delivered as electrical work
    pub conversion_efficiency: f64,
    /// Fraction of full charge left at the emergency
    pub charge_fraction: f64,
    /// Constant draw of the flight controller [W]
    pub power_controller: f64,
    /// Constant draw of the remaining electronics [W]
    pub power_electronics: f64,
}

/// Control-surface flap geometry of the broken kite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlapGeometry {
    pub flap_length: f64,
    pub flap_width: f64,
}

/// Affine map from aerodynamic coefficients to flap deflections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlapAerodynamics {
    pub c_dl: f64,
    pub c_dphi: f64,
    pub defl_lift_0: f64,
    pub defl_roll_0: f64,
}

/// Everything the battery-depletion integrand needs
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryModel {
    pub battery: BatteryOptions,
    pub flap: FlapGeometry,
    pub aero: FlapAerodynamics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmergencyScenario {
    BrokenBattery { kite: u32, model: BatteryModel },
    StructuralDamages { kite: u32 },
    BrokenLift { kite: u32 },
    BrokenRoll { kite: u32 },
}

impl EmergencyScenario {
    pub fn broken_kite(&self) -> u32 {
        match self {
            EmergencyScenario::BrokenBattery { kite, .. }
            | EmergencyScenario::StructuralDamages { kite }
            | EmergencyScenario::BrokenLift { kite }
            | EmergencyScenario::BrokenRoll { kite } => *kite,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmergencyScenario::BrokenBattery { .. } => "broken_battery",
            EmergencyScenario::StructuralDamages { .. } => "structural_damages",
            EmergencyScenario::BrokenLift { .. } => "broken_lift",
            EmergencyScenario::BrokenRoll { .. } => "broken_roll",
        }
    }
}

/// Operational scenario being optimized, each variant carrying its own sub-options
#[derive(Debug, Clone, PartialEq)]
pub enum TrajectoryMode {
    PowerCycle,
    Tracking,
    Launch,
    Transition,
    NominalLanding {
        landing: LandingRadii,
    },
    CompromisedLanding {
        landing: LandingRadii,
        scenario: EmergencyScenario,
    },
    Mpc {
        terminal_point_constr: bool,
    },
    /// Unrecognized `trajectory.type`; no operation constraints apply
    Custom(String),
}

impl TrajectoryMode {
    pub fn label(&self) -> &str {
        match self {
            TrajectoryMode::PowerCycle => "power_cycle",
            TrajectoryMode::Tracking => "tracking",
            TrajectoryMode::Launch => "launch",
            TrajectoryMode::Transition => "transition",
            TrajectoryMode::NominalLanding { .. } => "nominal_landing",
            TrajectoryMode::CompromisedLanding { .. } => "compromised_landing",
            TrajectoryMode::Mpc { .. } => "mpc",
            TrajectoryMode::Custom(label) => label,
        }
    }

    pub fn landing_radii(&self) -> Option<&LandingRadii> {
        match self {
            TrajectoryMode::NominalLanding { landing }
            | TrajectoryMode::CompromisedLanding { landing, .. } => Some(landing),
            _ => None,
        }
    }

    pub fn emergency_scenario(&self) -> Option<&EmergencyScenario> {
        match self {
            TrajectoryMode::CompromisedLanding { scenario, .. } => Some(scenario),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Steadyness {
    #[default]
    QuasiSteady,
    Unsteady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symmetry {
    #[default]
    Axisymmetric,
    Asymmetric,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InductionOptions {
    #[serde(default)]
    pub steadyness: Steadyness,
    #[serde(default)]
    pub symmetry: Symmetry,
    /// Labels marking induction variables of any model; defaults to all four
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_labels: Option<Vec<String>>,
}

impl InductionOptions {
    /// Label of the enforced induction model, e.g. `qaxi`
    pub fn label(&self) -> String {
        let steadyness = match self.steadyness {
            Steadyness::QuasiSteady => "q",
            Steadyness::Unsteady => "u",
        };
        let symmetry = match self.symmetry {
            Symmetry::Axisymmetric => "axi",
            Symmetry::Asymmetric => "asym",
        };
        format!("{steadyness}{symmetry}")
    }
}

/// Decides which induction variables belong to a comparison model
///
/// A variable name is an induction variable when it contains any of `labels`;
/// it belongs to a comparison model when it is an induction variable and does
/// not contain the `enforced` label.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonModelFilter {
    pub labels: Vec<String>,
    pub enforced: String,
}

impl ComparisonModelFilter {
    pub fn new(labels: Vec<String>, enforced: impl Into<String>) -> Self {
        Self {
            labels,
            enforced: enforced.into(),
        }
    }

    pub fn from_induction(induction: &InductionOptions) -> Self {
        let labels = induction.comparison_labels.clone().unwrap_or_else(|| {
            DEFAULT_INDUCTION_LABELS
                .iter()
                .map(|l| l.to_string())
                .collect()
        });
        Self::new(labels, induction.label())
    }

    pub fn is_comparison_variable(&self, name: &str) -> bool {
        let is_induction = self.labels.iter().any(|l| name.contains(l.as_str()));
        is_induction && !name.contains(self.enforced.as_str())
    }
}

impl Default for ComparisonModelFilter {
    fn default() -> Self {
        Self::from_induction(&InductionOptions::default())
    }
}

/// Raw option sections as they appear in the option file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsFile {
    pub trajectory: TrajectorySection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_landing: Option<LandingRadii>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compromised_landing: Option<CompromisedLandingSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpc: Option<MpcSection>,
    #[serde(default)]
    pub induction: InductionOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrajectorySection {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompromisedLandingSection {
    /// `[scenario label, broken kite node]`
    pub emergency_scenario: (String, u32),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<BatteryOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kite: Option<FlapGeometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aero: Option<FlapAerodynamics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpcSection {
    pub terminal_point_constr: bool,
}

/// Validated, read-only trajectory configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryConfig {
    pub mode: TrajectoryMode,
    pub induction: InductionOptions,
    pub comparison_filter: ComparisonModelFilter,
}

impl TrajectoryConfig {
    pub fn new(mode: TrajectoryMode) -> Self {
        Self {
            mode,
            induction: InductionOptions::default(),
            comparison_filter: ComparisonModelFilter::default(),
        }
    }

    pub fn with_induction(mut self, induction: InductionOptions) -> Self {
        self.comparison_filter = ComparisonModelFilter::from_induction(&induction);
        self.induction = induction;
        self
    }

    pub fn from_options(options: OptionsFile) -> Result<Self, ConfigError> {
        let mode = match options.trajectory.kind.as_str() {
            "power_cycle" => TrajectoryMode::PowerCycle,
            "tracking" => TrajectoryMode::Tracking,
            "launch" => TrajectoryMode::Launch,
            "transition" => TrajectoryMode::Transition,
            "nominal_landing" => TrajectoryMode::NominalLanding {
                landing: required(options.nominal_landing, "nominal_landing")?,
            },
            "compromised_landing" => {
                let section = required(options.compromised_landing, "compromised_landing")?;
                TrajectoryMode::CompromisedLanding {
                    landing: required(options.nominal_landing, "nominal_landing")?,
                    scenario: parse_scenario(section)?,
                }
            }
            "mpc" => TrajectoryMode::Mpc {
                terminal_point_constr: required(options.mpc, "mpc.terminal_point_constr")?
                    .terminal_point_constr,
            },
            "" => return Err(ConfigError::MissingOption("trajectory.type".to_string())),
            other => TrajectoryMode::Custom(other.to_string()),
        };
        Ok(Self::new(mode).with_induction(options.induction))
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let options: OptionsFile = serde_json::from_value(value)?;
        Self::from_options(options)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: OptionsFile = serde_json::from_str(json)?;
        Self::from_options(options)
    }
}

fn required<T>(section: Option<T>, path: &str) -> Result<T, ConfigError> {
    section.ok_or_else(|| ConfigError::MissingOption(path.to_string()))
}

fn parse_scenario(section: CompromisedLandingSection) -> Result<EmergencyScenario, ConfigError> {
    let (label, kite) = section.emergency_scenario;
    match label.as_str() {
        "broken_battery" => Ok(EmergencyScenario::BrokenBattery {
            kite,
            model: BatteryModel {
                battery: required(section.battery, "compromised_landing.battery")?,
                flap: required(section.kite, "compromised_landing.kite")?,
                aero: required(section.aero, "compromised_landing.aero")?,
            },
        }),
        "structural_damages" => Ok(EmergencyScenario::StructuralDamages { kite }),
        "broken_lift" => Ok(EmergencyScenario::BrokenLift { kite }),
        "broken_roll" => Ok(EmergencyScenario::BrokenRoll { kite }),
        other => Err(ConfigError::InvalidValue {
            path: "compromised_landing.emergency_scenario".to_string(),
            message: format!("unknown scenario '{other}'"),
        }),
    }
}

/// Nested option tree assembled from dotted paths
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionTree {
    root: Map<String, Value>,
}

impl OptionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dotted<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut tree = Self::new();
        for (path, value) in pairs {
            tree.set(path.as_ref(), value)?;
        }
        Ok(tree)
    }

    /// Set `value` at a dotted path, creating intermediate tables
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let path = path.strip_prefix(USER_OPTIONS_PREFIX).unwrap_or(path);
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidValue {
                path: path.to_string(),
                message: "empty path segment".to_string(),
            });
        }

        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Err(ConfigError::PathConflict(path.to_string())),
        };
        let mut table = &mut self.root;
        for segment in parents {
            let entry = table
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            table = match entry {
                Value::Object(map) => map,
                _ => return Err(ConfigError::PathConflict(path.to_string())),
            };
        }
        if matches!(table.get(*last), Some(Value::Object(_))) {
            return Err(ConfigError::PathConflict(path.to_string()));
        }
        table.insert(last.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let path = path.strip_prefix(USER_OPTIONS_PREFIX).unwrap_or(path);
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut value = self.root.get(first)?;
        for segment in segments {
            value = value.as_object()?.get(segment)?;
        }
        Some(value)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    pub fn to_trajectory_config(&self) -> Result<TrajectoryConfig, ConfigError> {
        TrajectoryConfig::from_value(Value::Object(self.root.clone()))
    }
}
