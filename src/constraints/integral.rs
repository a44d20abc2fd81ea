/// Integral constraint builders (battery depletion during a compromised landing)
///
/// The battery inequality reads `I(tf) - I_margin + ∫ dI <= 0`. The integrand
/// is built here per time point; the margin is the constant returned by
/// [`make_terminal_battery_constant`].
use crate::error::ConstraintError;
use crate::model::Model;
use crate::options::{BatteryModel, BatteryOptions};
use crate::symbolic::Expr;
use crate::utils::config::HOMOTOPY_PARAMETER;
use crate::utils::vector_math::squared_norm;
use crate::variables::{Parameters, VarKey, Variables};

/// Negative power drawn by the broken kite's flap actuators and electronics
///
/// Flap deflections are affine in the aerodynamic coefficient states
/// (`coeff = [C_L, Phi]`); their rates follow from the coefficient-rate
/// controls `dcoeff`. The result fades out as the homotopy parameter `nu`
/// goes to one.
pub fn make_terminal_battery_integrand(
    battery: &BatteryModel,
    broken_kite: u32,
    variables: &Variables,
    parameters: &Parameters,
    model: &Model,
) -> Result<Expr, ConstraintError> {
    let nu = parameters.phi.component(&VarKey::new(HOMOTOPY_PARAMETER), 0)?;
    let parent = model.architecture.parent(broken_kite)?;

    let flap = &battery.flap;
    let aero = &battery.aero;
    let surface = flap.flap_length * flap.flap_width;
    let moment_arm = flap.flap_length / 2.0;

    let q_key = VarKey::with_nodes("q", broken_kite, parent);
    let dq_key = VarKey::with_nodes("dq", broken_kite, parent);
    let coeff_key = VarKey::with_nodes("coeff", broken_kite, parent);
    let dcoeff_key = VarKey::with_nodes("dcoeff", broken_kite, parent);

    let altitude = variables.x.component(&q_key, 2)?;
    let dq = variables.x.get(&dq_key)?;
    let lift_coeff = variables.x.component(&coeff_key, 0)?;
    let roll_coeff = variables.x.component(&coeff_key, 1)?;
    let dlift_coeff = variables.u.component(&dcoeff_key, 0)?;
    let droll_coeff = variables.u.component(&dcoeff_key, 1)?;

    let density = model.atmosphere.density(altitude);
    let dynamic_pressure = 0.5 * squared_norm(dq) * density;

    let deflection_lift = aero.defl_lift_0 + aero.c_dl * lift_coeff;
    let deflection_roll = aero.defl_roll_0 + aero.c_dphi * roll_coeff;
    let ddeflection_lift = aero.c_dl * dlift_coeff;
    let ddeflection_roll = aero.c_dphi * droll_coeff;

    let moment_factor = &dynamic_pressure * (surface * moment_arm);
    let lift_moment = &moment_factor * deflection_lift.sin();
    let roll_moment = moment_factor * deflection_roll.sin();

    let power = lift_moment * ddeflection_lift
        + roll_moment * ddeflection_roll
        + battery.battery.power_controller
        + battery.battery.power_electronics;

    Ok(-(power * (1.0 - nu)))
}

/// Usable battery energy: `charge_fraction * cells * voltage * charge * efficiency`
pub fn make_terminal_battery_constant(battery: &BatteryOptions) -> f64 {
    battery.charge_fraction
        * f64::from(battery.number_of_cells)
        * battery.voltage
        * battery.charge
        * battery.conversion_efficiency
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn battery_constant_is_the_plain_product() {
        let battery = BatteryOptions {
            voltage: 44.4,
            charge: 16.0,
            number_of_cells: 6,
            conversion_efficiency: 0.95,
            charge_fraction: 0.5,
            power_controller: 0.0,
            power_electronics: 0.0,
        };
        assert_relative_eq!(
            make_terminal_battery_constant(&battery),
            0.5 * 6.0 * 44.4 * 16.0 * 0.95
        );
        assert_relative_eq!(make_terminal_battery_constant(&battery), 2024.64, epsilon = 1e-9);
    }
}
