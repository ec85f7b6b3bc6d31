// Water coil of an air-handling unit, modelled with the effectiveness-NTU method on the
// air side and a counter-flow log-mean relation between air and water.

use crate::core::heating_systems::common::Service;
use crate::core::heating_systems::emitters::{
    log_mean_temperature_difference, TerminalUnitDesign, TerminalUnitOperatingPoint,
    MAX_APPROACH_TEMP, MIN_APPROACH_TEMP,
};
use crate::core::material_properties::AIR;
use crate::core::solvers::{newton_with_bracket_fallback, SolverSettings};
use crate::errors::{CoilSolverDivergence, InfeasibleDesign};

pub const TEMP_SUPPLY_AIR_HEATING: f64 = 36.;
pub const TEMP_SUPPLY_AIR_COOLING: f64 = 16.;
// Scaling of the overall heat transfer coefficient with air mass flow
const AIR_FLOW_EXPONENT: f64 = 0.77;

pub fn temp_supply_air(service: Service) -> f64 {
    match service {
        Service::Heating => TEMP_SUPPLY_AIR_HEATING,
        Service::Cooling => TEMP_SUPPLY_AIR_COOLING,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AirHandlingCoil {
    design: TerminalUnitDesign,
    temp_supply_air: f64,
    /// Air mass flow at design, in kg/s
    air_mass_flow_design: f64,
    /// Overall heat transfer coefficient at design, in W/K
    ua_design: f64,
    settings: SolverSettings,
}

impl AirHandlingCoil {
    /// Fails when the design point leaves no temperature difference to drive the coil: the
    /// zone air is already past the supply air temperature, or the water temperatures cross
    /// the air temperatures.
    pub fn new(design: TerminalUnitDesign) -> Result<Self, InfeasibleDesign> {
        let sign = design.sign();
        let temp_supply_air = temp_supply_air(design.service);

        let air_temp_rise = sign * (temp_supply_air - design.temp_air);
        if !(air_temp_rise > 0.) {
            return Err(InfeasibleDesign {
                service: design.service.to_string(),
                reason: format!(
                    "coil cannot bring zone air at {} degC to the supply air temperature {} degC",
                    design.temp_air, temp_supply_air
                ),
            });
        }
        let air_mass_flow_design =
            design.power / (AIR.specific_heat_capacity() * air_temp_rise);

        let lmtd = log_mean_temperature_difference(
            sign * (design.temperatures.temp_supply - temp_supply_air),
            sign * (design.temperatures.temp_return - design.temp_air),
        );
        if !(lmtd > 0.) {
            return Err(InfeasibleDesign {
                service: design.service.to_string(),
                reason: format!(
                    "coil design water temperatures {}/{} cross the air temperatures {}/{}",
                    design.temperatures.temp_supply,
                    design.temperatures.temp_return,
                    design.temp_air,
                    temp_supply_air
                ),
            });
        }

        Ok(Self {
            design,
            temp_supply_air,
            air_mass_flow_design,
            ua_design: design.power / lmtd,
            settings: Default::default(),
        })
    }

    pub fn design(&self) -> &TerminalUnitDesign {
        &self.design
    }

    /// Air mass flow (kg/s) needed to deliver `power` with the zone air at `temp_air`,
    /// or None when the supply air temperature cannot be reached in this direction
    pub fn air_mass_flow(&self, power: f64, temp_air: f64) -> Option<f64> {
        let air_temp_rise = self.design.sign() * (self.temp_supply_air - temp_air);
        (air_temp_rise > 0.)
            .then(|| power.abs() / (AIR.specific_heat_capacity() * air_temp_rise))
    }

    fn ua(&self, air_mass_flow: f64) -> f64 {
        self.ua_design * (air_mass_flow / self.air_mass_flow_design).powf(AIR_FLOW_EXPONENT)
    }

    /// Coil contact temperature: the uniform surface temperature that would give the air
    /// its supply temperature at the effectiveness of the current air flow
    pub fn contact_temp(&self, air_mass_flow: f64, temp_air: f64) -> f64 {
        let ntu = self.ua(air_mass_flow) / (air_mass_flow * AIR.specific_heat_capacity());
        let effectiveness = -(-ntu).exp_m1();
        temp_air + (self.temp_supply_air - temp_air) / effectiveness
    }

    pub fn solve(
        &self,
        power: f64,
        temp_air: f64,
    ) -> Result<TerminalUnitOperatingPoint, CoilSolverDivergence> {
        if power == 0. {
            return Ok(TerminalUnitOperatingPoint::Idle);
        }
        let air_mass_flow = self
            .air_mass_flow(power, temp_air)
            .ok_or(CoilSolverDivergence { power })?;

        let sign = self.design.sign();
        let ua = self.ua(air_mass_flow);
        let temp_contact = self.contact_temp(air_mass_flow, temp_air);
        let temp_difference = power.abs() / self.design.capacity_flow();
        let air_temp_rise = sign * (self.temp_supply_air - temp_air);

        // approach at the air inlet end: return water against zone air
        let residual = |approach_return: f64| {
            let approach_supply = approach_return + temp_difference - air_temp_rise;
            1. - ua * log_mean_temperature_difference(approach_supply, approach_return)
                / power.abs()
        };

        let lower = MIN_APPROACH_TEMP.max(air_temp_rise - temp_difference + MIN_APPROACH_TEMP);
        let start = sign * (temp_contact - temp_air) - 0.5 * temp_difference;
        let root = newton_with_bracket_fallback(
            residual,
            start,
            (lower, lower + MAX_APPROACH_TEMP),
            self.settings,
        )
        .map_err(|_| CoilSolverDivergence { power })?;

        let temp_return = temp_air + sign * root.value;
        Ok(TerminalUnitOperatingPoint::Operating {
            temp_supply: temp_return + sign * temp_difference,
            temp_return,
            mass_flow: self.design.mass_flow(),
        })
    }
}
