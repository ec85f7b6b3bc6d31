// Fully mixed domestic hot water storage tank. Each hour the heater tops the tank back up
// to its set-point and the tank temperature is integrated over the hour.

use crate::core::material_properties::WATER;
use crate::core::units::SECONDS_PER_HOUR;
use ode_solvers::{dop_shared::OutputType, Dopri5, System, Vector1};
use std::f64::consts::PI;
use tracing::warn;

type State = Vector1<f64>;
type Time = f64;

/// Height to diameter ratio of the cylinder
pub const TANK_ASPECT_RATIO: f64 = 3.3;
/// Heat transfer coefficient of the tank jacket, in W / (m2.K)
pub const TANK_U_VALUE: f64 = 0.225;
/// Smallest tank that is ever sized, in m3
pub const MIN_TANK_VOLUME: f64 = 0.1;
const MAX_INTEGRATION_STEPS: u32 = 100_000;

/// Cylinder dimensions in m, m2 and m3
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankGeometry {
    pub volume: f64,
    pub height: f64,
    pub radius: f64,
    pub surface_area: f64,
}

impl TankGeometry {
    pub fn new(volume: f64, aspect_ratio: f64) -> Self {
        let height = (4. * volume * aspect_ratio.powi(2) / PI).cbrt();
        let radius = (volume / (PI * height)).sqrt();
        Self {
            volume,
            height,
            radius,
            surface_area: 2. * PI * radius.powi(2) + 2. * PI * radius * height,
        }
    }
}

/// Energy flows of the tank over one hour, in W, and its end-of-hour temperature
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankHour {
    /// Jacket loss evaluated at the start-of-hour temperature
    pub heat_loss: f64,
    /// Heat drawn off by the hot water use and its distribution
    pub draw_off: f64,
    /// Heat supplied by the water heater
    pub heater_output: f64,
    pub temp_end: f64,
    /// The integrator stopped before the end of the hour. `temp_end` is then the last
    /// temperature it reached.
    pub integration_failed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct HotWaterTank {
    geometry: TankGeometry,
    u_value: f64,
    temp_setpoint: f64,
    max_integration_steps: u32,
}

impl HotWaterTank {
    pub fn new(volume: f64, u_value: f64, temp_setpoint: f64) -> Self {
        Self {
            geometry: TankGeometry::new(volume, TANK_ASPECT_RATIO),
            u_value,
            temp_setpoint,
            max_integration_steps: MAX_INTEGRATION_STEPS,
        }
    }

    /// Limit the number of integrator steps taken within one hour
    pub fn with_max_integration_steps(self, max_integration_steps: u32) -> Self {
        Self {
            max_integration_steps,
            ..self
        }
    }

    /// Size a tank for the peak hourly draw, with a floor of `min_volume`
    pub fn sized_for(
        peak_hourly_volume: f64,
        min_volume: f64,
        u_value: f64,
        temp_setpoint: f64,
    ) -> Self {
        Self::new(peak_hourly_volume.max(min_volume), u_value, temp_setpoint)
    }

    pub fn geometry(&self) -> &TankGeometry {
        &self.geometry
    }

    pub fn temp_setpoint(&self) -> f64 {
        self.temp_setpoint
    }

    fn heat_capacity(&self) -> f64 {
        self.geometry.volume * WATER.volumetric_heat_capacity()
    }

    pub fn heat_loss(&self, temp: f64, temp_amb: f64) -> f64 {
        self.u_value * self.geometry.surface_area * (temp - temp_amb)
    }

    /// Arguments:
    /// * `temp_prev` - tank temperature at the start of the hour, in deg C
    /// * `temp_amb` - temperature around the tank, in deg C
    /// * `draw_off` - heat drawn from the tank over the hour, in W
    pub fn step(&self, temp_prev: f64, temp_amb: f64, draw_off: f64) -> TankHour {
        let heat_loss = self.heat_loss(temp_prev, temp_amb);
        let heater_output = (draw_off
            + heat_loss
            + self.heat_capacity() * (self.temp_setpoint - temp_prev) / SECONDS_PER_HOUR as f64)
            .max(0.);

        let (temp_end, integration_failed) =
            match self.integrate_hour(temp_prev, temp_amb, draw_off, heater_output) {
                Ok(temp_end) => (temp_end, false),
                Err(temp_reached) => (temp_reached, true),
            };

        TankHour {
            heat_loss,
            draw_off,
            heater_output,
            temp_end,
            integration_failed,
        }
    }

    /// Tank temperature at the end of the hour, or the last temperature reached when the
    /// integrator gave up
    fn integrate_hour(
        &self,
        temp_prev: f64,
        temp_amb: f64,
        draw_off: f64,
        heater_output: f64,
    ) -> Result<f64, f64> {
        let balance = TankHeatBalance {
            tank: self,
            temp_amb,
            draw_off,
            heater_output,
        };

        let x: Time = 0.;
        let x_end: Time = SECONDS_PER_HOUR as f64;
        let y0: State = State::new(temp_prev);
        let mut stepper = Dopri5::from_param(
            balance,
            x,
            x_end,
            0.,
            y0,
            1e-3,
            1e-6,
            0.9,
            0.,
            0.2,
            10.,
            x_end - x,
            0.,
            self.max_integration_steps,
            1000,
            OutputType::Sparse,
        );

        let outcome = stepper.integrate();
        let temp_reached = stepper
            .y_out()
            .last()
            .map(|y| y[0])
            .unwrap_or(temp_prev);
        match outcome {
            Ok(_) => Ok(temp_reached),
            Err(e) => {
                warn!("Tank temperature integration stopped early: {e:?}");
                Err(temp_reached)
            }
        }
    }
}

struct TankHeatBalance<'a> {
    tank: &'a HotWaterTank,
    temp_amb: f64,
    draw_off: f64,
    heater_output: f64,
}

impl System<Time, State> for TankHeatBalance<'_> {
    fn system(&self, _x: Time, y: &State, dy: &mut State) {
        dy[0] = (self.heater_output - self.tank.heat_loss(y[0], self.temp_amb) - self.draw_off)
            / self.tank.heat_capacity();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn tank() -> HotWaterTank {
        HotWaterTank::new(0.3, TANK_U_VALUE, 60.)
    }

    #[rstest]
    fn should_size_cylinder_from_aspect_ratio() {
        let geometry = TankGeometry::new(0.3, 3.3);

        assert_relative_eq!(
            PI * geometry.radius.powi(2) * geometry.height,
            0.3,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            geometry.height / (2. * geometry.radius),
            3.3,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_apply_minimum_volume() {
        let tank = HotWaterTank::sized_for(0.02, MIN_TANK_VOLUME, TANK_U_VALUE, 60.);
        assert_eq!(tank.geometry().volume, 0.1);
    }

    #[rstest]
    fn should_converge_under_constant_inputs(tank: HotWaterTank) {
        let mut temp = 40.;
        let mut previous_change = f64::INFINITY;
        for _ in 0..24 {
            let hour = tank.step(temp, 15., 2_000.);
            let change = (hour.temp_end - temp).abs();
            assert!(change <= previous_change + 1e-9);
            previous_change = change;
            temp = hour.temp_end;
        }
        assert_abs_diff_eq!(temp, 60., epsilon = 0.5);
    }

    #[rstest]
    fn should_not_heat_tank_above_setpoint(tank: HotWaterTank) {
        let hour = tank.step(70., 15., 0.);

        assert_eq!(hour.heater_output, 0.);
        assert!(hour.heat_loss > 0.);
        assert!(hour.temp_end < 70.);
    }

    #[rstest]
    fn should_cover_draw_off_and_losses_at_setpoint(tank: HotWaterTank) {
        let hour = tank.step(60., 15., 1_000.);
        assert_relative_eq!(
            hour.heater_output,
            1_000. + tank.heat_loss(60., 15.),
            max_relative = 1e-12
        );
        assert_abs_diff_eq!(hour.temp_end, 60., epsilon = 1e-3);
    }

    #[rstest]
    fn should_flag_integration_that_runs_out_of_steps(tank: HotWaterTank) {
        let reheating = tank.with_max_integration_steps(1).step(40., 15., 2_000.);
        assert!(reheating.integration_failed);
        assert!(reheating.temp_end.is_finite());

        assert!(!tank.step(40., 15., 2_000.).integration_failed);
    }
}
