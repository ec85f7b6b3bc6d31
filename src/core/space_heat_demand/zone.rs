// Hourly solution of the ISO 13790 5R1C network (section C.3) and the heating/cooling
// need required to hold the air temperature within the set-points (section C.4).

use crate::core::space_heat_demand::conductance::{ConductanceSet, CoupledConductances};
use crate::core::space_heat_demand::gains::GainComponents;
use crate::core::units::SECONDS_PER_HOUR;
use strum::Display;

/// Thermal mass temperature assumed before the first hour, in deg C
pub const INITIAL_TEMP_MASS: f64 = 16.;
// Test heating/cooling power per m2 of floor area applied to find the response of the network, in W/m2
const TEST_POWER_PER_AREA: f64 = 10.;
const AIR_WEIGHT_OPERATIVE: f64 = 0.31;
const SURFACE_WEIGHT_OPERATIVE: f64 = 0.69;

/// Operative temperature as the fixed blend of air and surface temperature
pub fn temp_operative(temp_air: f64, temp_surface: f64) -> f64 {
    AIR_WEIGHT_OPERATIVE * temp_air + SURFACE_WEIGHT_OPERATIVE * temp_surface
}

/// Conditions of the zone for one hour
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourConditions {
    pub temp_ext: f64,
    pub h_ve: f64,
    pub gains: GainComponents,
    /// Heating set-point, in deg C; negative infinity when there is no set-point
    pub temp_setpnt_heat: f64,
    /// Cooling set-point, in deg C; infinity when there is no set-point
    pub temp_setpnt_cool: f64,
    /// Available heating power, in W (non-negative)
    pub heating_capacity: f64,
    /// Available cooling power, in W (non-positive)
    pub cooling_capacity: f64,
}

/// Node temperatures of the network for a given injected power
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetworkSolution {
    /// Mass temperature at the end of the hour
    pub temp_mass_end: f64,
    /// Mean mass temperature over the hour
    pub temp_mass: f64,
    pub temp_surface: f64,
    pub temp_air: f64,
    pub temp_operative: f64,
    /// Total heat flow to the mass node Im_tot, in W
    pub i_m_tot: f64,
}

#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum HourMode {
    FreeRunning,
    Heating,
    Cooling,
}

/// Result of one hour; appended to the hourly log and never changed afterwards
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourlyResult {
    pub mode: HourMode,
    pub temp_mass_end: f64,
    pub temp_mass: f64,
    pub temp_surface: f64,
    pub temp_air: f64,
    pub temp_operative: f64,
    /// Sensible heating need, in W (non-negative)
    pub q_hs_sen: f64,
    /// Sensible cooling need, in W (non-positive)
    pub q_cs_sen: f64,
    pub uncomfortable: bool,
    pub i_m_tot: f64,
}

impl HourlyResult {
    fn from_solution(
        solution: NetworkSolution,
        mode: HourMode,
        power: f64,
        uncomfortable: bool,
    ) -> Self {
        Self {
            mode,
            temp_mass_end: solution.temp_mass_end,
            temp_mass: solution.temp_mass,
            temp_surface: solution.temp_surface,
            temp_air: solution.temp_air,
            temp_operative: solution.temp_operative,
            q_hs_sen: power.max(0.),
            q_cs_sen: power.min(0.),
            uncomfortable,
            i_m_tot: solution.i_m_tot,
        }
    }

    /// Net heating (positive) or cooling (negative) power, in W
    pub fn power(&self) -> f64 {
        self.q_hs_sen + self.q_cs_sen
    }
}

/// The hourly recurrence of one zone. Only the end-of-hour mass temperature is carried
/// from one hour to the next.
#[derive(Clone, Copy, Debug)]
pub struct ThermalStateMachine {
    conductances: ConductanceSet,
}

impl ThermalStateMachine {
    pub fn new(conductances: ConductanceSet) -> Self {
        Self { conductances }
    }

    pub fn conductances(&self) -> &ConductanceSet {
        &self.conductances
    }

    /// Solve the network for an hour with `power` (W) injected at the air node
    ///
    /// Arguments:
    /// * `temp_mass_prev` - mass temperature at the end of the previous hour, in deg C
    pub fn solve_network(
        &self,
        temp_mass_prev: f64,
        conditions: &HourConditions,
        power: f64,
    ) -> NetworkSolution {
        let ConductanceSet {
            h_tr_ms,
            h_tr_w,
            h_tr_em,
            h_tr_is,
            c_m,
            ..
        } = self.conductances;
        let CoupledConductances {
            h_ve,
            h_tr_1,
            h_tr_2,
            h_tr_3,
            air_share,
        } = self.conductances.coupled(conditions.h_ve);
        let GainComponents { i_ia, i_st, i_m } = conditions.gains;
        let temp_ext = conditions.temp_ext;

        // Htr_1 * (I_ia + power) / Hve, written so that Hve may be zero
        let air_gain_to_surface = air_share * (i_ia + power);

        let i_m_tot = i_m
            + h_tr_em * temp_ext
            + h_tr_3 * (i_st + h_tr_w * temp_ext + h_tr_1 * temp_ext + air_gain_to_surface)
                / h_tr_2;

        let c_m_hourly = c_m / SECONDS_PER_HOUR as f64;
        let h_mass = 0.5 * (h_tr_3 + h_tr_em);
        let temp_mass_end =
            (temp_mass_prev * (c_m_hourly - h_mass) + i_m_tot) / (c_m_hourly + h_mass);
        let temp_mass = 0.5 * (temp_mass_end + temp_mass_prev);

        let temp_surface = (h_tr_ms * temp_mass
            + i_st
            + h_tr_w * temp_ext
            + h_tr_1 * temp_ext
            + air_gain_to_surface)
            / (h_tr_ms + h_tr_w + h_tr_1);
        let temp_air = (h_tr_is * temp_surface + h_ve * temp_ext + i_ia + power) / (h_tr_is + h_ve);

        NetworkSolution {
            temp_mass_end,
            temp_mass,
            temp_surface,
            temp_air,
            temp_operative: temp_operative(temp_air, temp_surface),
            i_m_tot,
        }
    }

    /// Advance the zone by one hour
    pub fn step(&self, temp_mass_prev: f64, conditions: &HourConditions) -> HourlyResult {
        let free = self.solve_network(temp_mass_prev, conditions, 0.);

        let (mode, temp_setpnt, test_power) = if free.temp_air < conditions.temp_setpnt_heat {
            (
                HourMode::Heating,
                conditions.temp_setpnt_heat,
                TEST_POWER_PER_AREA * self.conductances.floor_area,
            )
        } else if free.temp_air > conditions.temp_setpnt_cool {
            (
                HourMode::Cooling,
                conditions.temp_setpnt_cool,
                -TEST_POWER_PER_AREA * self.conductances.floor_area,
            )
        } else {
            return HourlyResult::from_solution(free, HourMode::FreeRunning, 0., false);
        };

        let loaded = self.solve_network(temp_mass_prev, conditions, test_power);
        // the air temperature is linear in the injected power
        let power_unrestricted =
            test_power * (temp_setpnt - free.temp_air) / (loaded.temp_air - free.temp_air);

        if (conditions.cooling_capacity..=conditions.heating_capacity).contains(&power_unrestricted)
        {
            let solution = NetworkSolution {
                temp_air: temp_setpnt,
                temp_operative: temp_operative(temp_setpnt, loaded.temp_surface),
                ..loaded
            };
            HourlyResult::from_solution(solution, mode, power_unrestricted, false)
        } else {
            let power = power_unrestricted
                .clamp(conditions.cooling_capacity, conditions.heating_capacity);
            let restricted = self.solve_network(temp_mass_prev, conditions, power);
            HourlyResult::from_solution(restricted, mode, power, true)
        }
    }
}
