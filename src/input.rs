use crate::core::heating_systems::storage_tank::{MIN_TANK_VOLUME, TANK_U_VALUE};
use crate::core::pipework::{DEFAULT_INTERNAL_DIAMETER_MM, DEFAULT_TAP_FLOW};
use crate::core::water_heat_demand::dhw_demand::{
    DEFAULT_TEMP_COLD_WATER, DEFAULT_TEMP_HOT_WATER,
};
use crate::simulation_time::SimulationTime;
use anyhow::anyhow;
use serde::Deserialize;
use serde_valid::Validate;
use std::io::{BufReader, Read};

pub fn ingest_input(json: impl Read) -> anyhow::Result<Input> {
    let reader = BufReader::new(json);
    let input: Input = serde_json::from_reader(reader)?;
    input
        .validate()
        .map_err(|e| anyhow!("Input failed validation: {e}"))?;

    Ok(input)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Input {
    #[serde(default)]
    pub simulation_time: SimulationTime,
    #[serde(default)]
    #[validate]
    pub settings: DemandSettings,
    pub external_conditions: Option<ExternalConditionsInput>,
    #[validate]
    #[validate(min_items = 1)]
    pub buildings: Vec<BuildingInput>,
}

fn default_temp_hot_water() -> f64 {
    DEFAULT_TEMP_HOT_WATER
}

fn default_temp_cold_water() -> f64 {
    DEFAULT_TEMP_COLD_WATER
}

fn default_pipe_internal_diameter() -> f64 {
    DEFAULT_INTERNAL_DIAMETER_MM
}

fn default_tap_flow() -> f64 {
    DEFAULT_TAP_FLOW
}

fn default_tank_min_volume() -> f64 {
    MIN_TANK_VOLUME
}

fn default_tank_u_value() -> f64 {
    TANK_U_VALUE
}

/// Constants of the calculation that may be overridden per project
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct DemandSettings {
    /// Hot water supply and tank set-point temperature, in deg C
    #[serde(default = "default_temp_hot_water")]
    pub temp_hot_water: f64,
    /// Cold water feed temperature, in deg C
    #[serde(default = "default_temp_cold_water")]
    pub temp_cold_water: f64,
    /// Internal diameter of hot water pipes, in mm
    #[serde(default = "default_pipe_internal_diameter")]
    #[validate(exclusive_minimum = 0.)]
    pub pipe_internal_diameter: f64,
    /// Flow rate at a hot water tap, in m3/h
    #[serde(default = "default_tap_flow")]
    #[validate(exclusive_minimum = 0.)]
    pub tap_flow: f64,
    /// Smallest hot water tank that is sized, in m3
    #[serde(default = "default_tank_min_volume")]
    #[validate(exclusive_minimum = 0.)]
    pub tank_min_volume: f64,
    /// Heat transfer coefficient of the tank jacket, in W / (m2.K)
    #[serde(default = "default_tank_u_value")]
    #[validate(minimum = 0.)]
    pub tank_u_value: f64,
}

impl Default for DemandSettings {
    fn default() -> Self {
        Self {
            temp_hot_water: default_temp_hot_water(),
            temp_cold_water: default_temp_cold_water(),
            pipe_internal_diameter: default_pipe_internal_diameter(),
            tap_flow: default_tap_flow(),
            tank_min_volume: default_tank_min_volume(),
            tank_u_value: default_tank_u_value(),
        }
    }
}

/// Weather series given inline, taking precedence over a weather file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalConditionsInput {
    pub air_temperatures: Option<Vec<f64>>,
    pub relative_humidities: Option<Vec<f64>>,
    pub sky_temperatures: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BuildingInput {
    pub name: String,
    #[validate]
    pub envelope: EnvelopeInput,
    pub vintage: VintageInput,
    #[validate]
    pub geometry: GeometryInput,
    pub pipe_lengths: Option<PipeLengthsInput>,
    #[validate]
    pub systems: SystemsInput,
    #[validate]
    pub ventilation: VentilationInput,
    #[validate]
    pub glazing: GlazingInput,
    #[serde(default)]
    #[validate]
    pub surfaces: Vec<SurfaceInput>,
    pub schedules: SchedulesInput,
    pub occupant: Option<OccupantInput>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EnvelopeInput {
    /// Conditioned floor area, in m2
    #[validate(exclusive_minimum = 0.)]
    pub floor_area: f64,
    #[validate(minimum = 0.)]
    pub window_area: f64,
    #[validate(minimum = 0.)]
    pub opaque_area_above_ground: f64,
    #[serde(default)]
    #[validate(minimum = 0.)]
    pub opaque_area_below_ground: f64,
    /// Area of all surfaces facing the zone, defaults to 4.5 times the floor area
    #[validate(exclusive_minimum = 0.)]
    pub total_area: Option<f64>,
    #[validate(minimum = 0.)]
    pub u_window: f64,
    #[validate(minimum = 0.)]
    pub u_opaque: f64,
    #[serde(default)]
    #[validate(minimum = 0.)]
    pub u_base: f64,
    /// Construction class code ("light"/"T1", "medium"/"T2", "heavy"/"T3")
    pub construction: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VintageInput {
    pub year_built: i32,
    #[serde(default)]
    pub retrofitted: bool,
}

fn default_floor_height() -> f64 {
    3.
}

fn default_form_factor() -> f64 {
    1.
}

#[derive(Clone, Copy, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GeometryInput {
    #[validate(exclusive_minimum = 0.)]
    pub footprint_length: f64,
    #[validate(exclusive_minimum = 0.)]
    pub footprint_width: f64,
    #[validate(minimum = 1)]
    pub floors_above_ground: u32,
    #[serde(default = "default_floor_height")]
    #[validate(exclusive_minimum = 0.)]
    pub floor_height: f64,
    #[serde(default = "default_form_factor")]
    #[validate(exclusive_minimum = 0.)]
    pub form_factor: f64,
}

/// Measured pipe lengths, in m, replacing the estimates from the footprint
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipeLengthsInput {
    pub space_distribution: Option<f64>,
    pub dhw_circulation: Option<f64>,
    pub dhw_distribution: Option<f64>,
    pub dhw_heating_circulation: Option<f64>,
    pub dhw_heating_distribution: Option<f64>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DesignTemperaturesInput {
    pub supply: f64,
    #[serde(rename = "return")]
    pub return_: f64,
}

/// Hours of the simulation (0-based, inclusive) in which a system may operate. A start after
/// the end wraps around the turn of the year.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SeasonInput {
    pub start_hour: usize,
    pub end_hour: usize,
}

impl SeasonInput {
    pub fn contains(&self, hour: usize) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..=self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour <= self.end_hour
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SystemsInput {
    /// Heating terminal unit code, "T0" to "T4"
    pub heating: String,
    /// Cooling terminal unit code, "T0" or "T3" to "T5"
    pub cooling: String,
    pub heating_design_temperatures: Option<DesignTemperaturesInput>,
    pub cooling_design_temperatures: Option<DesignTemperaturesInput>,
    /// Installed heating power, in W; unlimited when absent
    #[validate(minimum = 0.)]
    pub heating_capacity: Option<f64>,
    /// Installed cooling power, in W (magnitude); unlimited when absent
    #[validate(minimum = 0.)]
    pub cooling_capacity: Option<f64>,
    pub heating_season: Option<SeasonInput>,
    pub cooling_season: Option<SeasonInput>,
    /// Overrides the characteristic exponent of radiators and panels
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub heating_emitter_exponent: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VentilationInput {
    /// Ventilated volume, in m3; floor area times floor height when absent
    #[validate(exclusive_minimum = 0.)]
    pub volume: Option<f64>,
    #[validate(minimum = 0.)]
    pub infiltration_ach: f64,
    #[serde(default)]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub heat_recovery_efficiency: f64,
}

fn default_frame_fraction() -> f64 {
    0.2
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GlazingInput {
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub g_value: f64,
    #[serde(default = "default_frame_fraction")]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub frame_fraction: f64,
    /// Shading device code, "T0" to "T5"
    pub shading_device: Option<String>,
    /// Share of the solar gain passed by the deployed shading, overriding the device code
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub shading_factor: Option<f64>,
    /// Irradiance above which the shading is deployed, in W/m2
    #[validate(minimum = 0.)]
    pub shading_setpoint: Option<f64>,
}

fn default_absorptance() -> f64 {
    0.6
}

fn default_sky_form_factor() -> f64 {
    0.5
}

/// An exposed surface (one orientation) with its incident irradiance series, in W/m2
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SurfaceInput {
    #[validate(minimum = 0.)]
    pub window_area: f64,
    #[validate(minimum = 0.)]
    pub u_window: f64,
    #[validate(minimum = 0.)]
    pub opaque_area: f64,
    #[validate(minimum = 0.)]
    pub u_opaque: f64,
    #[serde(default = "default_absorptance")]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub absorptance: f64,
    #[serde(default = "default_sky_form_factor")]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub sky_form_factor: f64,
    pub irradiance: Vec<f64>,
}

/// Hourly schedules. Lighting, appliances, process, data centre and refrigeration are
/// electricity in W. Occupancy is in persons and set-points in deg C (null for no set-point).
/// Mechanical ventilation is in air changes per hour, hot and cold water draws in l / (m2.h).
/// Omitted series are all-zero.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulesInput {
    pub people: Vec<f64>,
    pub setpoint_heating: Vec<Option<f64>>,
    pub setpoint_cooling: Vec<Option<f64>>,
    #[serde(default)]
    pub mechanical_ventilation: Vec<f64>,
    #[serde(default)]
    pub lighting: Vec<f64>,
    #[serde(default)]
    pub appliances: Vec<f64>,
    #[serde(default)]
    pub process: Vec<f64>,
    #[serde(default)]
    pub data_centre: Vec<f64>,
    #[serde(default)]
    pub refrigeration: Vec<f64>,
    #[serde(default)]
    pub dhw_draw: Vec<f64>,
    #[serde(default)]
    pub cold_water_draw: Vec<f64>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OccupantInput {
    /// Sensible heat per person, in W
    pub sensible_gain: f64,
    /// Moisture released per person, in g/h
    pub moisture_gain: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    fn building() -> serde_json::Value {
        json!({
            "name": "B01",
            "envelope": {
                "floor_area": 100.,
                "window_area": 20.,
                "opaque_area_above_ground": 150.,
                "u_window": 1.5,
                "u_opaque": 0.3
            },
            "vintage": {"year_built": 1990},
            "geometry": {
                "footprint_length": 10.,
                "footprint_width": 10.,
                "floors_above_ground": 1
            },
            "systems": {"heating": "T1", "cooling": "T0"},
            "ventilation": {"infiltration_ach": 0.3},
            "glazing": {"g_value": 0.6},
            "schedules": {
                "people": [1., 2.],
                "setpoint_heating": [20., null],
                "setpoint_cooling": [null, 26.]
            }
        })
    }

    #[rstest]
    fn should_ingest_minimal_project() {
        let document = json!({
            "SimulationTime": {"year": 2010, "hours": 2},
            "Buildings": [building()]
        });
        let input = ingest_input(document.to_string().as_bytes()).unwrap();

        assert_eq!(input.simulation_time, SimulationTime::new(2010, 2));
        assert_eq!(input.settings, DemandSettings::default());
        let building = &input.buildings[0];
        assert_eq!(building.geometry.floor_height, 3.);
        assert_eq!(building.schedules.setpoint_heating, vec![Some(20.), None]);
        assert!(building.schedules.dhw_draw.is_empty());
        assert!(building.schedules.cold_water_draw.is_empty());
        assert!(!building.vintage.retrofitted);
    }

    #[rstest]
    fn should_reject_unknown_fields() {
        let document = json!({
            "Buildings": [building()],
            "Zones": {}
        });
        assert!(ingest_input(document.to_string().as_bytes()).is_err());
    }

    #[rstest]
    fn should_reject_non_positive_floor_area() {
        let mut building = building();
        building["envelope"]["floor_area"] = json!(0.);
        let document = json!({"Buildings": [building]});

        assert!(ingest_input(document.to_string().as_bytes()).is_err());
    }

    #[rstest]
    #[case(SeasonInput { start_hour: 100, end_hour: 200 }, 150, true)]
    #[case(SeasonInput { start_hour: 100, end_hour: 200 }, 250, false)]
    #[case(SeasonInput { start_hour: 6000, end_hour: 2000 }, 8000, true)]
    #[case(SeasonInput { start_hour: 6000, end_hour: 2000 }, 100, true)]
    #[case(SeasonInput { start_hour: 6000, end_hour: 2000 }, 4000, false)]
    fn should_wrap_seasons_around_year_end(
        #[case] season: SeasonInput,
        #[case] hour: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(season.contains(hour), expected);
    }
}
