// Auxiliary electricity of the circulation pumps of the heating, cooling and hot water
// circuits (EN 15316-2-3 simplified method), and of the booster that lifts fresh water in
// tall buildings.

use crate::core::heating_systems::emitters::TerminalUnitOperatingPoint;
use crate::core::material_properties::WATER;
use crate::core::pipework::PipeGeometry;
use crate::core::units::SECONDS_PER_HOUR;
use strum::Display;

/// Specific pressure drop of the pipe network, per m of the longest run
const SPECIFIC_PRESSURE_DROP: f64 = 0.1;
/// Share of the pipe pressure drop added for fittings and components
const FITTINGS_SHARE: f64 = 0.3;
const HYDRAULIC_POWER_FACTOR: f64 = 0.2778;
/// Below this share of the peak load the pump runs in part-load mode
const PART_LOAD_THRESHOLD: f64 = 0.67;
const PART_LOAD_POWER_FACTOR: f64 = 0.0367;
const PUMP_EFFICIENCY_REFERENCE_POWER: f64 = 200.;

/// Floors that the mains pressure serves without a booster
const FRESH_WATER_UNBOOSTED_FLOORS: u32 = 5;
const FRESH_WATER_PUMP_EFFICIENCY: f64 = 0.6;
const FRESH_WATER_MOTOR_EFFICIENCY: f64 = 0.6;
/// The daily fresh water use is lifted to the roof tank over this many hours, from noon
const FRESH_WATER_PUMPING_HOURS: usize = 5;
const FRESH_WATER_FIRST_PUMPING_HOUR: usize = 12;
const HOURS_PER_DAY: usize = 24;
const GRAVITY: f64 = 9.81;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum PumpedCircuit {
    SpaceHeating,
    SpaceCooling,
    HotWater,
}

impl PumpedCircuit {
    fn control_factor(&self) -> f64 {
        match self {
            Self::SpaceHeating => 1.05,
            Self::SpaceCooling => 1.10,
            Self::HotWater => 1.,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pumps {
    design_pressure_drop: f64,
    age_factor: f64,
    floors_above_ground: u32,
    floor_height: f64,
}

impl Pumps {
    pub fn new(geometry: &PipeGeometry, year_built: i32) -> Self {
        let height = geometry.floors_above_ground as f64 * geometry.floor_height;
        let longest_run = 2.
            * (geometry.footprint_length
                + geometry.footprint_width / 2.
                + geometry.floor_height
                + height
                + 10.)
            * geometry.form_factor;

        Self {
            design_pressure_drop: longest_run * SPECIFIC_PRESSURE_DROP * (1. + FITTINGS_SHARE),
            age_factor: if year_built >= 2000 { 1. } else { 1.2 },
            floors_above_ground: geometry.floors_above_ground,
            floor_height: geometry.floor_height,
        }
    }

    /// Pump electricity for the hour, in W
    ///
    /// Arguments:
    /// * `flow` - flow through the circuit, in kg/s
    /// * `load_ratio` - load of the circuit as a share of its annual peak
    pub fn electricity(&self, circuit: PumpedCircuit, flow: f64, load_ratio: f64) -> f64 {
        if !(flow > 0.) {
            return 0.;
        }
        let mut hydraulic_power = HYDRAULIC_POWER_FACTOR * self.design_pressure_drop * flow;
        if load_ratio <= PART_LOAD_THRESHOLD {
            hydraulic_power *= PART_LOAD_POWER_FACTOR;
        }
        let expenditure_factor = 1.25
            * (PUMP_EFFICIENCY_REFERENCE_POWER / hydraulic_power).sqrt()
            * circuit.control_factor()
            * self.age_factor;

        hydraulic_power * expenditure_factor
    }

    /// Arguments:
    /// * `power` - final load of the circuit, in W (signed by service)
    /// * `power_peak` - annual peak of the same load, in W, with the same sign
    /// * `point` - operating point of the terminal unit for the hour
    pub fn space_conditioning(
        &self,
        circuit: PumpedCircuit,
        power: f64,
        power_peak: f64,
        point: &TerminalUnitOperatingPoint,
    ) -> f64 {
        if power == 0. || power_peak == 0. {
            return 0.;
        }
        self.electricity(circuit, point.mass_flow(), power / power_peak)
    }

    /// Arguments:
    /// * `demand` - hot water demand of the hour, in W
    /// * `heater_output` - hot water heater output of the hour, in W
    /// * `heater_output_peak` - annual peak heater output, in W
    /// * `mass_flow` - hot water mass flow, in kg/s
    pub fn hot_water(
        &self,
        demand: f64,
        heater_output: f64,
        heater_output_peak: f64,
        mass_flow: f64,
    ) -> f64 {
        if demand <= 0. || heater_output_peak <= 0. {
            return 0.;
        }
        self.electricity(
            PumpedCircuit::HotWater,
            mass_flow,
            heater_output / heater_output_peak,
        )
    }

    /// Electricity of the fresh water booster for each hour, in W. Buildings of up to five
    /// floors above ground are served by the mains and draw nothing.
    ///
    /// Arguments:
    /// * `volumes` - hourly fresh water use (hot and cold), in m3
    pub fn fresh_water(&self, volumes: &[f64]) -> Vec<f64> {
        let mut electricity = vec![0.; volumes.len()];
        if self.floors_above_ground <= FRESH_WATER_UNBOOSTED_FLOORS {
            return electricity;
        }
        let head = self.floor_height
            * (self.floors_above_ground - FRESH_WATER_UNBOOSTED_FLOORS) as f64
            / FRESH_WATER_PUMP_EFFICIENCY;

        for (day, day_volumes) in volumes.chunks(HOURS_PER_DAY).enumerate() {
            let day_volume: f64 = day_volumes.iter().sum();
            if !(day_volume > 0.) {
                continue;
            }
            let flow = day_volume / SECONDS_PER_HOUR as f64 / FRESH_WATER_PUMPING_HOURS as f64;
            let power =
                head * WATER.density() * GRAVITY * flow / FRESH_WATER_MOTOR_EFFICIENCY;
            let first = day * HOURS_PER_DAY + FRESH_WATER_FIRST_PUMPING_HOUR;
            for hour in first..(first + FRESH_WATER_PUMPING_HOURS).min(volumes.len()) {
                electricity[hour] = power;
            }
        }
        electricity
    }
}
