// Emission and control losses of the terminal units, isolated by running the zone a
// second time against set-points shifted by the terminal unit's correction.

use crate::core::space_heat_demand::zone::{
    HourConditions, HourlyResult, ThermalStateMachine, INITIAL_TEMP_MASS,
};

/// End-of-hour mass temperatures of the two independent passes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionState {
    pub temp_mass_nominal: f64,
    pub temp_mass_corrected: f64,
}

impl Default for EmissionState {
    fn default() -> Self {
        Self {
            temp_mass_nominal: INITIAL_TEMP_MASS,
            temp_mass_corrected: INITIAL_TEMP_MASS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionResult {
    pub nominal: HourlyResult,
    pub corrected: HourlyResult,
    /// Heating emission loss, in W (non-negative)
    pub q_hs_em_ls: f64,
    /// Cooling emission loss, in W (non-positive)
    pub q_cs_em_ls: f64,
}

impl EmissionResult {
    pub fn q_hs_sen_incl_em_ls(&self) -> f64 {
        self.nominal.q_hs_sen + self.q_hs_em_ls
    }

    pub fn q_cs_sen_incl_em_ls(&self) -> f64 {
        self.nominal.q_cs_sen + self.q_cs_em_ls
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EmissionLossCorrector {
    zone: ThermalStateMachine,
    heating_correction: f64,
    cooling_correction: f64,
}

impl EmissionLossCorrector {
    /// Arguments:
    /// * `heating_correction` - shift of the heating set-point, in K
    /// * `cooling_correction` - shift of the cooling set-point, in K (usually negative)
    pub fn new(zone: ThermalStateMachine, heating_correction: f64, cooling_correction: f64) -> Self {
        Self {
            zone,
            heating_correction,
            cooling_correction,
        }
    }

    pub fn zone(&self) -> &ThermalStateMachine {
        &self.zone
    }

    pub fn step(
        &self,
        state: EmissionState,
        conditions: &HourConditions,
    ) -> (EmissionState, EmissionResult) {
        let nominal = self.zone.step(state.temp_mass_nominal, conditions);

        let corrected_conditions = HourConditions {
            temp_setpnt_heat: conditions.temp_setpnt_heat + self.heating_correction,
            temp_setpnt_cool: conditions.temp_setpnt_cool + self.cooling_correction,
            ..*conditions
        };
        let corrected = self
            .zone
            .step(state.temp_mass_corrected, &corrected_conditions);

        // losses are only counted when the nominal pass has a load of the same direction
        let q_hs_em_ls = if nominal.q_hs_sen > 0. {
            (corrected.q_hs_sen - nominal.q_hs_sen).max(0.)
        } else {
            0.
        };
        let q_cs_em_ls = if nominal.q_cs_sen < 0. {
            (corrected.q_cs_sen - nominal.q_cs_sen).min(0.)
        } else {
            0.
        };

        (
            EmissionState {
                temp_mass_nominal: nominal.temp_mass_end,
                temp_mass_corrected: corrected.temp_mass_end,
            },
            EmissionResult {
                nominal,
                corrected,
                q_hs_em_ls,
                q_cs_em_ls,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::space_heat_demand::conductance::ConductanceSet;
    use crate::core::space_heat_demand::gains::GainComponents;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn corrector() -> EmissionLossCorrector {
        let zone = ThermalStateMachine::new(ConductanceSet::new(
            500., 800., 150., 300., 20_000_000., 250., 450., 100.,
        ));
        EmissionLossCorrector::new(zone, 1.7, -1.2)
    }

    fn conditions(temp_ext: f64) -> HourConditions {
        HourConditions {
            temp_ext,
            h_ve: 100.,
            gains: GainComponents::default(),
            temp_setpnt_heat: 20.,
            temp_setpnt_cool: 26.,
            heating_capacity: f64::INFINITY,
            cooling_capacity: f64::NEG_INFINITY,
        }
    }

    #[rstest]
    fn should_find_positive_heating_loss(corrector: EmissionLossCorrector) {
        let mut state = EmissionState::default();
        for _ in 0..24 {
            let (next, result) = corrector.step(state, &conditions(-5.));
            assert!(result.nominal.q_hs_sen > 0.);
            assert!(result.q_hs_em_ls > 0.);
            assert_eq!(result.q_cs_em_ls, 0.);
            assert_eq!(
                result.q_hs_sen_incl_em_ls(),
                result.nominal.q_hs_sen + result.q_hs_em_ls
            );
            state = next;
        }
        // the corrected pass keeps a warmer mass
        assert!(state.temp_mass_corrected > state.temp_mass_nominal);
    }

    #[rstest]
    fn should_find_negative_cooling_loss(corrector: EmissionLossCorrector) {
        let state = EmissionState {
            temp_mass_nominal: 30.,
            temp_mass_corrected: 30.,
        };
        let (_, result) = corrector.step(state, &conditions(32.));

        assert!(result.nominal.q_cs_sen < 0.);
        assert!(result.q_cs_em_ls < 0.);
        assert_eq!(result.q_hs_em_ls, 0.);
        assert!(result.q_cs_sen_incl_em_ls() < result.nominal.q_cs_sen);
    }

    #[rstest]
    fn should_have_no_loss_without_nominal_load(corrector: EmissionLossCorrector) {
        // 21 degC free-running sits within the nominal band but below the corrected set-point
        let state = EmissionState {
            temp_mass_nominal: 21.,
            temp_mass_corrected: 21.,
        };
        let (_, result) = corrector.step(state, &conditions(21.));

        assert_eq!(result.nominal.q_hs_sen, 0.);
        assert!(result.corrected.q_hs_sen > 0.);
        assert_eq!(result.q_hs_em_ls, 0.);
    }
}
