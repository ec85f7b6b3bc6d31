// Domestic hot water demand of a building, its pipe losses and the storage tank that
// serves it.

use crate::core::heating_systems::storage_tank::{HotWaterTank, TankHour};
use crate::core::material_properties::WATER;
use crate::core::pipework::{temp_unconditioned, HotWaterDistribution, HotWaterPipeLosses};
use crate::core::units::{LITRES_PER_CUBIC_METRE, SECONDS_PER_HOUR};

pub const DEFAULT_TEMP_HOT_WATER: f64 = 60.;
pub const DEFAULT_TEMP_COLD_WATER: f64 = 10.;

/// Hourly hot water draw of a building
#[derive(Clone, Debug)]
pub struct DomesticHotWaterDemand {
    /// Hot water volume per hour, in m3/h
    volumes: Vec<f64>,
    temp_hot: f64,
    temp_cold: f64,
}

impl DomesticHotWaterDemand {
    /// Arguments:
    /// * `specific_draw` - hourly hot water use per unit floor area, in l / (m2.h)
    /// * `floor_area` - conditioned floor area, in m2
    /// * `temp_hot` - hot water supply temperature, in deg C
    /// * `temp_cold` - cold water feed temperature, in deg C
    pub fn new(specific_draw: &[f64], floor_area: f64, temp_hot: f64, temp_cold: f64) -> Self {
        let volumes = specific_draw
            .iter()
            .map(|draw| draw * floor_area / LITRES_PER_CUBIC_METRE as f64)
            .collect();
        Self {
            volumes,
            temp_hot,
            temp_cold,
        }
    }

    pub fn temp_hot(&self) -> f64 {
        self.temp_hot
    }

    /// Hot water volume drawn in the hour, in m3
    pub fn volume(&self, hour: usize) -> f64 {
        self.volumes.get(hour).copied().unwrap_or(0.)
    }

    pub fn peak_volume(&self) -> f64 {
        self.volumes.iter().copied().fold(0., f64::max)
    }

    /// Hot water mass flow, in kg/s
    pub fn mass_flow(&self, hour: usize) -> f64 {
        self.volume(hour) * WATER.density() / SECONDS_PER_HOUR as f64
    }

    /// Heat needed to bring the drawn water from the cold feed to the supply temperature, in W
    pub fn power(&self, hour: usize) -> f64 {
        self.mass_flow(hour) * WATER.specific_heat_capacity() * (self.temp_hot - self.temp_cold)
    }

    pub fn peak_power(&self) -> f64 {
        (0..self.volumes.len())
            .map(|hour| self.power(hour))
            .fold(0., f64::max)
    }
}

/// Hot water energy flows of one hour, in W, plus the end-of-hour tank temperature
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HotWaterHour {
    pub demand: f64,
    pub pipe_losses: HotWaterPipeLosses,
    pub tank_loss: f64,
    pub heater_output: f64,
    /// None when the building has no hot water system
    pub temp_tank: Option<f64>,
    /// Hot water mass flow, in kg/s
    pub mass_flow: f64,
    pub tank_integration_failed: bool,
}

/// Demand, distribution and storage of hot water for one building. The tank temperature is
/// carried from hour to hour by the caller.
#[derive(Clone, Debug)]
pub struct HotWaterSystem {
    demand: DomesticHotWaterDemand,
    distribution: HotWaterDistribution,
    tank: Option<HotWaterTank>,
    peak_power: f64,
}

impl HotWaterSystem {
    /// Arguments:
    /// * `tank` - storage tank, None when the building draws no hot water at all
    pub fn new(
        demand: DomesticHotWaterDemand,
        distribution: HotWaterDistribution,
        tank: Option<HotWaterTank>,
    ) -> Self {
        let peak_power = demand.peak_power();
        Self {
            demand,
            distribution,
            tank,
            peak_power,
        }
    }

    /// Tank temperature before the first hour
    pub fn initial_tank_temp(&self) -> Option<f64> {
        self.tank.map(|tank| tank.temp_setpoint())
    }

    pub fn step(
        &self,
        hour: usize,
        temp_tank_prev: Option<f64>,
        temp_air: f64,
        temp_ext: f64,
    ) -> HotWaterHour {
        let demand = self.demand.power(hour);
        let pipe_losses = self.distribution.losses(
            demand,
            self.peak_power,
            self.demand.temp_hot(),
            temp_air,
            temp_ext,
        );

        let Some(tank) = self.tank else {
            return HotWaterHour {
                demand,
                pipe_losses,
                heater_output: demand + pipe_losses.total(),
                mass_flow: self.demand.mass_flow(hour),
                ..Default::default()
            };
        };

        let TankHour {
            heat_loss,
            heater_output,
            temp_end,
            integration_failed,
            ..
        } = tank.step(
            temp_tank_prev.unwrap_or(tank.temp_setpoint()),
            temp_unconditioned(temp_air, temp_ext),
            demand + pipe_losses.total(),
        );

        HotWaterHour {
            demand,
            pipe_losses,
            tank_loss: heat_loss,
            heater_output,
            temp_tank: Some(temp_end),
            mass_flow: self.demand.mass_flow(hour),
            tank_integration_failed: integration_failed,
        }
    }
}
