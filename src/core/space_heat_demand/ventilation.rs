// Ventilation heat transfer coefficient of the zone after ISO 13790 section 9.3, with
// the supply temperature raised by heat recovery on the mechanical air flow.

use crate::core::material_properties::AIR;
use crate::core::units::SECONDS_PER_HOUR;

#[derive(Clone, Copy, Debug)]
pub struct Ventilation {
    volume: f64,
    infiltration_ach: f64,
    heat_recovery_efficiency: f64,
}

impl Ventilation {
    /// Arguments:
    /// * `volume` - ventilated volume of the zone, in m3
    /// * `infiltration_ach` - air changes per hour through leakage, in 1/h
    /// * `heat_recovery_efficiency` - temperature efficiency of the heat recovery on the
    ///                                mechanical air flow, between 0 and 1
    pub fn new(volume: f64, infiltration_ach: f64, heat_recovery_efficiency: f64) -> Self {
        Self {
            volume,
            infiltration_ach,
            heat_recovery_efficiency,
        }
    }

    fn volume_flow(&self, air_changes_per_hour: f64) -> f64 {
        air_changes_per_hour * self.volume / SECONDS_PER_HOUR as f64
    }

    /// Ventilation heat transfer coefficient Hve, in W/K
    ///
    /// Arguments:
    /// * `mechanical_ach` - air changes per hour supplied by the ventilation schedule, in 1/h
    pub fn h_ve(&self, mechanical_ach: f64) -> f64 {
        let q_mech = self.volume_flow(mechanical_ach.max(0.));
        let q_inf = self.volume_flow(self.infiltration_ach);

        AIR.heat_capacity_rate(q_mech * (1. - self.heat_recovery_efficiency) + q_inf)
    }

    /// Air volume flow rate supplied by the air-handling unit, in m3/s
    pub fn mechanical_volume_flow(&self, mechanical_ach: f64) -> f64 {
        self.volume_flow(mechanical_ach.max(0.))
    }

    pub fn heat_recovery_efficiency(&self) -> f64 {
        self.heat_recovery_efficiency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn ventilation() -> Ventilation {
        Ventilation::new(300., 0.2, 0.)
    }

    #[rstest]
    fn should_calculate_h_ve_from_air_changes(ventilation: Ventilation) {
        // (1.0 + 0.2) * 300 / 3600 m3/s = 0.1 m3/s
        assert_relative_eq!(
            ventilation.h_ve(1.0),
            0.1 * 1.204 * 1006.,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            ventilation.mechanical_volume_flow(1.0),
            1.0 * 300. / 3600.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_reduce_h_ve_with_heat_recovery() {
        let with_recovery = Ventilation::new(300., 0., 0.75);
        assert_relative_eq!(
            with_recovery.h_ve(1.2),
            0.25 * 0.1 * AIR.volumetric_heat_capacity(),
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_ignore_negative_schedule_values(ventilation: Ventilation) {
        assert_relative_eq!(ventilation.h_ve(-1.), ventilation.h_ve(0.));
        assert_eq!(ventilation.mechanical_volume_flow(-1.), 0.);
    }
}
