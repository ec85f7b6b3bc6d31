// Simulation of one building: the hourly thermal fold followed by distribution, terminal
// units, hot water, pumping and the annual summary.

use crate::annual_summary::{AnnualSummary, Carrier};
use crate::core::heating_systems::common::{
    CoolingSystemType, DesignTemperatures, HeatingSystemType, Service, TerminalUnitFamily,
};
use crate::core::heating_systems::emitters::{
    TerminalUnit, TerminalUnitDesign, TerminalUnitOperatingPoint,
};
use crate::core::heating_systems::storage_tank::HotWaterTank;
use crate::core::material_properties::AIR;
use crate::core::pipework::{
    space_distribution_loss, HotWaterDistribution, LinearTransmissivity, PipeGeometry,
    PipeLengths,
};
use crate::core::pumping::{PumpedCircuit, Pumps};
use crate::core::space_heat_demand::conductance::{ConstructionClass, EnvelopeProperties};
use crate::core::space_heat_demand::emission_losses::{
    EmissionLossCorrector, EmissionResult, EmissionState,
};
use crate::core::space_heat_demand::gains::GainSeries;
use crate::core::space_heat_demand::internal_gains::InternalGains;
use crate::core::space_heat_demand::latent_loads::{AirHandlingUnit, UnitHour};
use crate::core::space_heat_demand::solar_gains::{
    solar_gain, ExposedSurface, GlazingProperties, ShadingDevice, SHADING_ACTIVATION_IRRADIANCE,
};
use crate::core::space_heat_demand::ventilation::Ventilation;
use crate::core::space_heat_demand::zone::{HourConditions, ThermalStateMachine};
use crate::core::water_heat_demand::dhw_demand::{
    DomesticHotWaterDemand, HotWaterHour, HotWaterSystem,
};
use crate::core::units::{LITRES_PER_CUBIC_METRE, SECONDS_PER_HOUR};
use crate::errors::{ConfigurationError, MissingInputColumn, SimulationWarning};
use crate::external_conditions::ExternalConditions;
use crate::input::{
    BuildingInput, DemandSettings, DesignTemperaturesInput, GlazingInput, SeasonInput,
};
use crate::simulation_time::SimulationTime;
use indexmap::IndexMap;
use itertools::izip;
use strum::IntoEnumIterator;
use tracing::{debug, info_span, warn};

/// Sensible heat emitted per occupant when not given, in W
pub const DEFAULT_SENSIBLE_GAIN_PER_PERSON: f64 = 70.;
/// Moisture released per occupant when not given, in g/h
pub const DEFAULT_MOISTURE_GAIN_PER_PERSON: f64 = 80.;
/// Specific fan power of the air-handling unit, in W / (m3/h)
pub const SPECIFIC_FAN_POWER: f64 = 0.55;

/// Everything reported for one hour of one building. Energy flows are mean powers over the
/// hour, in W, with cooling negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourlyRecord {
    pub temp_air: f64,
    pub temp_surface: f64,
    pub temp_mass: f64,
    pub temp_operative: f64,
    pub uncomfortable: bool,
    pub i_sol: f64,
    pub i_int_sen: f64,
    pub q_hs_sen: f64,
    pub q_cs_sen: f64,
    pub q_hs_em_ls: f64,
    pub q_cs_em_ls: f64,
    pub q_hs_dis_ls: f64,
    pub q_cs_dis_ls: f64,
    /// Humidification by the air-handling unit
    pub q_hs_lat: f64,
    /// Dehumidification by the air-handling unit
    pub q_cs_lat: f64,
    pub q_hs: f64,
    pub q_hsf: f64,
    pub q_cs: f64,
    pub q_csf: f64,
    pub heating_point: TerminalUnitOperatingPoint,
    pub cooling_point: TerminalUnitOperatingPoint,
    pub hot_water: HotWaterHour,
    /// Latent gain of the air-handling system, in kg/s
    pub w_int: f64,
    pub e_alf: f64,
    pub e_aux_hs: f64,
    pub e_aux_cs: f64,
    pub e_aux_ww: f64,
    /// Fans of the air-handling unit
    pub e_aux_ve: f64,
    /// Fresh water booster
    pub e_aux_fw: f64,
    pub e_pro: f64,
    pub e_data: f64,
    /// Server heat removed by data centre cooling (positive)
    pub q_cdata: f64,
    /// Heat extracted by refrigeration (positive)
    pub q_crefri: f64,
}

impl HourlyRecord {
    pub fn e_aux(&self) -> f64 {
        self.e_aux_hs + self.e_aux_cs + self.e_aux_ww + self.e_aux_ve + self.e_aux_fw
    }

    pub fn e_f(&self) -> f64 {
        self.e_alf + self.e_aux() + self.e_pro + self.e_data
    }

    pub fn q_hf(&self) -> f64 {
        self.q_hsf + self.hot_water.heater_output
    }

    /// Final cooling of the space, data centre and refrigeration, as a positive magnitude
    pub fn q_cf(&self) -> f64 {
        0. - self.q_csf + self.q_cdata + self.q_crefri
    }

    pub fn solver_diverged(&self) -> bool {
        self.heating_point.is_diverged() || self.cooling_point.is_diverged()
    }

    /// Value of a summarised carrier, with cooling reported as positive. Negating as 0 - x keeps
    /// idle hours at +0.
    fn carrier(&self, carrier: Carrier) -> f64 {
        match carrier {
            Carrier::Qhs => self.q_hs,
            Carrier::Qhsf => self.q_hsf,
            Carrier::Qcs => 0. - self.q_cs,
            Carrier::Qcsf => 0. - self.q_csf,
            Carrier::Qww => self.hot_water.demand,
            Carrier::Qwwf => self.hot_water.heater_output,
            Carrier::Ealf => self.e_alf,
            Carrier::Eauxf => self.e_aux(),
            Carrier::Eprof => self.e_pro,
            Carrier::Edataf => self.e_data,
            Carrier::Qcdataf => self.q_cdata,
            Carrier::Qcref => self.q_crefri,
            Carrier::Ef => self.e_f(),
            Carrier::QHf => self.q_hf(),
            Carrier::QCf => self.q_cf(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BuildingResults {
    pub name: String,
    pub floor_area: f64,
    pub simulation_time: SimulationTime,
    pub hours: Vec<HourlyRecord>,
    pub summary: AnnualSummary,
    pub warnings: Vec<SimulationWarning>,
}

/// Hours of a year in which a system may deliver, and how much
#[derive(Clone, Copy, Debug)]
struct Availability {
    installed: bool,
    capacity: f64,
    season: Option<SeasonInput>,
}

impl Availability {
    fn capacity(&self, hour: usize) -> f64 {
        let in_season = self.season.map_or(true, |season| season.contains(hour));
        if self.installed && in_season {
            self.capacity
        } else {
            0.
        }
    }
}

#[derive(Clone, Debug)]
pub struct BuildingSimulation {
    name: String,
    floor_area: f64,
    emission: EmissionLossCorrector,
    heating: HeatingSystemType,
    cooling: CoolingSystemType,
    heating_design: DesignTemperatures,
    cooling_design: DesignTemperatures,
    heating_exponent: f64,
    heating_availability: Availability,
    cooling_availability: Availability,
    ventilation: Ventilation,
    mechanical_ventilation: Vec<f64>,
    glazing: GlazingProperties,
    surfaces: Vec<ExposedSurface>,
    internal_gains: InternalGains,
    setpoint_heating: Vec<Option<f64>>,
    setpoint_cooling: Vec<Option<f64>>,
    dhw_draw: Vec<f64>,
    cold_water_draw: Vec<f64>,
    pipe_lengths: PipeLengths,
    transmissivity: LinearTransmissivity,
    pumps: Pumps,
    settings: DemandSettings,
    warnings: Vec<MissingInputColumn>,
}

fn design_temperatures(
    input: Option<DesignTemperaturesInput>,
    default: DesignTemperatures,
) -> DesignTemperatures {
    input.map_or(default, |temps| DesignTemperatures {
        temp_supply: temps.supply,
        temp_return: temps.return_,
    })
}

fn construction_class(
    code: Option<&str>,
    warnings: &mut Vec<MissingInputColumn>,
) -> ConstructionClass {
    match code {
        Some(code) => ConstructionClass::from_code(code).unwrap_or_else(|| {
            warn!(
                "Unknown construction class '{code}', using {}",
                ConstructionClass::default()
            );
            ConstructionClass::default()
        }),
        None => {
            warnings.push(MissingInputColumn::new(
                "construction",
                ConstructionClass::default(),
            ));
            ConstructionClass::default()
        }
    }
}

fn glazing_properties(
    input: &GlazingInput,
    warnings: &mut Vec<MissingInputColumn>,
) -> Result<GlazingProperties, ConfigurationError> {
    let shading_factor = match (input.shading_factor, input.shading_device.as_deref()) {
        (Some(factor), _) => factor,
        (None, Some(code)) => ShadingDevice::from_code(code)
            .ok_or_else(|| {
                ConfigurationError::InvalidValue(format!("Unknown shading device code '{code}'"))
            })?
            .reduction_factor(),
        (None, None) => {
            warnings.push(MissingInputColumn::new("shading_device", "T0"));
            ShadingDevice::None.reduction_factor()
        }
    };
    let shading_setpoint = input.shading_setpoint.unwrap_or_else(|| {
        warnings.push(MissingInputColumn::new(
            "shading_setpoint",
            SHADING_ACTIVATION_IRRADIANCE,
        ));
        SHADING_ACTIVATION_IRRADIANCE
    });

    Ok(GlazingProperties {
        g_value: input.g_value,
        frame_fraction: input.frame_fraction,
        shading_factor,
        shading_setpoint,
    })
}

fn check_length<T>(name: &str, series: &[T], expected: usize) -> Result<(), ConfigurationError> {
    if series.len() != expected {
        return Err(ConfigurationError::SeriesLengthMismatch {
            name: name.into(),
            actual: series.len(),
            expected,
        });
    }
    Ok(())
}

/// Optional schedules may be left out entirely
fn check_optional_length<T>(
    name: &str,
    series: &[T],
    expected: usize,
) -> Result<(), ConfigurationError> {
    if series.is_empty() {
        return Ok(());
    }
    check_length(name, series, expected)
}

/// Problems met hour by hour, counted over the run
fn hourly_warnings(records: &[HourlyRecord]) -> Vec<SimulationWarning> {
    let diverged_hours = records.iter().filter(|r| r.solver_diverged()).count();
    let tank_hours = records
        .iter()
        .filter(|r| r.hot_water.tank_integration_failed)
        .count();

    let mut warnings = vec![];
    if diverged_hours > 0 {
        warnings.push(SimulationWarning::SolverDiverged {
            hours: diverged_hours,
        });
    }
    if tank_hours > 0 {
        warnings.push(SimulationWarning::TankIntegration { hours: tank_hours });
    }
    warnings
}

/// Index and value of the largest entry of a series, by magnitude in the direction of `sign`
fn peak(series: &[f64], sign: f64) -> Option<(usize, f64)> {
    series
        .iter()
        .enumerate()
        .filter(|(_, value)| sign * **value > 0.)
        .fold(None, |peak, (hour, &value)| match peak {
            Some((_, peak_value)) if sign * value <= sign * peak_value => peak,
            _ => Some((hour, value)),
        })
}

impl BuildingSimulation {
    pub fn from_input(
        input: &BuildingInput,
        settings: &DemandSettings,
    ) -> Result<Self, ConfigurationError> {
        let mut warnings = vec![];
        let envelope = &input.envelope;
        let floor_area = envelope.floor_area;

        let construction = construction_class(envelope.construction.as_deref(), &mut warnings);
        let conductances = EnvelopeProperties {
            floor_area,
            window_area: envelope.window_area,
            opaque_area_above_ground: envelope.opaque_area_above_ground,
            opaque_area_below_ground: envelope.opaque_area_below_ground,
            total_area: envelope.total_area,
            u_window: envelope.u_window,
            u_opaque: envelope.u_opaque,
            u_base: envelope.u_base,
            construction,
        }
        .conductances()?;

        let systems = &input.systems;
        let heating = HeatingSystemType::from_code(&systems.heating)?;
        let cooling = CoolingSystemType::from_code(&systems.cooling)?;
        let emission = EmissionLossCorrector::new(
            ThermalStateMachine::new(conductances),
            heating.setpoint_correction(),
            cooling.setpoint_correction(),
        );

        let geometry = PipeGeometry {
            footprint_length: input.geometry.footprint_length,
            footprint_width: input.geometry.footprint_width,
            floors_above_ground: input.geometry.floors_above_ground,
            floor_height: input.geometry.floor_height,
            form_factor: input.geometry.form_factor,
        };
        let estimated_lengths = PipeLengths::from_geometry(&geometry);
        let overrides = input.pipe_lengths.unwrap_or_default();
        let pipe_lengths = PipeLengths {
            space_distribution: overrides
                .space_distribution
                .unwrap_or(estimated_lengths.space_distribution),
            dhw_circulation: overrides
                .dhw_circulation
                .unwrap_or(estimated_lengths.dhw_circulation),
            dhw_distribution: overrides
                .dhw_distribution
                .unwrap_or(estimated_lengths.dhw_distribution),
            dhw_heating_circulation: overrides
                .dhw_heating_circulation
                .unwrap_or(estimated_lengths.dhw_heating_circulation),
            dhw_heating_distribution: overrides
                .dhw_heating_distribution
                .unwrap_or(estimated_lengths.dhw_heating_distribution),
        };

        let ventilation = Ventilation::new(
            input
                .ventilation
                .volume
                .unwrap_or(floor_area * input.geometry.floor_height),
            input.ventilation.infiltration_ach,
            input.ventilation.heat_recovery_efficiency,
        );

        let glazing = glazing_properties(&input.glazing, &mut warnings)?;
        let surfaces = input
            .surfaces
            .iter()
            .map(|surface| ExposedSurface {
                window_area: surface.window_area,
                u_window: surface.u_window,
                opaque_area: surface.opaque_area,
                u_opaque: surface.u_opaque,
                absorptance: surface.absorptance,
                sky_form_factor: surface.sky_form_factor,
                irradiance: surface.irradiance.clone(),
            })
            .collect();

        let schedules = &input.schedules;
        let occupant = input.occupant;
        let internal_gains = InternalGains {
            people: schedules.people.clone(),
            lighting: schedules.lighting.clone(),
            appliances: schedules.appliances.clone(),
            process: schedules.process.clone(),
            data_centre: schedules.data_centre.clone(),
            refrigeration: schedules.refrigeration.clone(),
            sensible_per_person: occupant.map_or(DEFAULT_SENSIBLE_GAIN_PER_PERSON, |o| {
                o.sensible_gain
            }),
            moisture_per_person: occupant.map_or(DEFAULT_MOISTURE_GAIN_PER_PERSON, |o| {
                o.moisture_gain
            }),
        };

        for warning in &warnings {
            warn!(building = %input.name, "{warning}");
        }

        Ok(Self {
            name: input.name.clone(),
            floor_area,
            emission,
            heating,
            cooling,
            heating_design: design_temperatures(
                systems.heating_design_temperatures,
                heating.default_design_temperatures(),
            ),
            cooling_design: design_temperatures(
                systems.cooling_design_temperatures,
                cooling.default_design_temperatures(),
            ),
            heating_exponent: systems
                .heating_emitter_exponent
                .unwrap_or(heating.emitter_exponent()),
            heating_availability: Availability {
                installed: heating.family().is_some(),
                capacity: systems.heating_capacity.unwrap_or(f64::INFINITY),
                season: systems.heating_season,
            },
            cooling_availability: Availability {
                installed: cooling.family().is_some(),
                capacity: -systems.cooling_capacity.unwrap_or(f64::INFINITY),
                season: systems.cooling_season,
            },
            ventilation,
            mechanical_ventilation: schedules.mechanical_ventilation.clone(),
            glazing,
            surfaces,
            internal_gains,
            setpoint_heating: schedules.setpoint_heating.clone(),
            setpoint_cooling: schedules.setpoint_cooling.clone(),
            dhw_draw: schedules.dhw_draw.clone(),
            cold_water_draw: schedules.cold_water_draw.clone(),
            pipe_lengths,
            transmissivity: LinearTransmissivity::for_vintage(
                input.vintage.year_built,
                input.vintage.retrofitted,
            ),
            pumps: Pumps::new(&geometry, input.vintage.year_built),
            settings: *settings,
            warnings,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn check_series_lengths(&self, hours: usize) -> Result<(), ConfigurationError> {
        let gains = &self.internal_gains;
        check_length("people", &gains.people, hours)?;
        check_length("setpoint_heating", &self.setpoint_heating, hours)?;
        check_length("setpoint_cooling", &self.setpoint_cooling, hours)?;
        for (name, series) in [
            ("mechanical_ventilation", &self.mechanical_ventilation),
            ("lighting", &gains.lighting),
            ("appliances", &gains.appliances),
            ("process", &gains.process),
            ("data_centre", &gains.data_centre),
            ("refrigeration", &gains.refrigeration),
            ("dhw_draw", &self.dhw_draw),
            ("cold_water_draw", &self.cold_water_draw),
        ] {
            check_optional_length(name, series, hours)?;
        }
        for surface in &self.surfaces {
            check_length("irradiance", &surface.irradiance, hours)?;
        }
        Ok(())
    }

    fn gain_series(&self, external: &ExternalConditions, hours: usize) -> GainSeries {
        let internal_sensible = (0..hours)
            .map(|hour| self.internal_gains.sensible_gain(hour))
            .collect();
        let solar = (0..hours)
            .map(|hour| {
                solar_gain(
                    &self.surfaces,
                    &self.glazing,
                    hour,
                    external.air_temp(hour),
                    external.sky_temp(hour),
                )
            })
            .collect();
        GainSeries::new(
            internal_sensible,
            solar,
            self.emission.zone().conductances(),
        )
    }

    fn mechanical_ach(&self, hour: usize) -> f64 {
        self.mechanical_ventilation.get(hour).copied().unwrap_or(0.)
    }

    fn hour_conditions(
        &self,
        hour: usize,
        gains: &GainSeries,
        external: &ExternalConditions,
    ) -> HourConditions {
        HourConditions {
            temp_ext: external.air_temp(hour),
            h_ve: self.ventilation.h_ve(self.mechanical_ach(hour)),
            gains: gains.at(hour),
            temp_setpnt_heat: self.setpoint_heating[hour].unwrap_or(f64::NEG_INFINITY),
            temp_setpnt_cool: self.setpoint_cooling[hour].unwrap_or(f64::INFINITY),
            heating_capacity: self.heating_availability.capacity(hour),
            cooling_capacity: self.cooling_availability.capacity(hour),
        }
    }

    /// Sizes the terminal unit of a service from the peak hour of its final load. None when the
    /// service has no system or no load over the whole run.
    fn terminal_unit(
        &self,
        service: Service,
        final_load: &[f64],
        temp_air: &[f64],
    ) -> Result<Option<TerminalUnit>, ConfigurationError> {
        let (family, temperatures, exponent): (Option<TerminalUnitFamily>, _, _) = match service {
            Service::Heating => (
                self.heating.family(),
                self.heating_design,
                self.heating_exponent,
            ),
            Service::Cooling => (
                self.cooling.family(),
                self.cooling_design,
                self.cooling.emitter_exponent(),
            ),
        };
        let sign = match service {
            Service::Heating => 1.,
            Service::Cooling => -1.,
        };
        let (Some(family), Some((peak_hour, peak_load))) = (family, peak(final_load, sign)) else {
            return Ok(None);
        };
        let design =
            TerminalUnitDesign::new(service, peak_load, temperatures, temp_air[peak_hour]);
        debug!(
            building = %self.name,
            "{service} terminal unit sized for {peak_load} W at hour {peak_hour}"
        );

        TerminalUnit::new(family, design, exponent, self.floor_area).map(Some)
    }

    fn hot_water_system(&self) -> HotWaterSystem {
        let demand = DomesticHotWaterDemand::new(
            &self.dhw_draw,
            self.floor_area,
            self.settings.temp_hot_water,
            self.settings.temp_cold_water,
        );
        let distribution = HotWaterDistribution::new(
            &self.pipe_lengths,
            self.transmissivity,
            self.settings.pipe_internal_diameter,
            self.settings.tap_flow,
        );
        let tank = (demand.peak_volume() > 0.).then(|| {
            HotWaterTank::sized_for(
                demand.peak_volume(),
                self.settings.tank_min_volume,
                self.settings.tank_u_value,
                self.settings.temp_hot_water,
            )
        });

        HotWaterSystem::new(demand, distribution, tank)
    }

    fn heats_by_air(&self) -> bool {
        self.heating.family() == Some(TerminalUnitFamily::AirCoil)
    }

    fn cools_by_air(&self) -> bool {
        self.cooling.family() == Some(TerminalUnitFamily::AirCoil)
    }

    fn has_air_handling(&self) -> bool {
        self.heats_by_air() || self.cools_by_air()
    }

    fn unit_hour(&self, hour: usize, temp_zone: f64, external: &ExternalConditions) -> UnitHour {
        UnitHour {
            temp_ext: external.air_temp(hour),
            relative_humidity_ext: external.relative_humidity(hour),
            temp_zone,
            moisture_gain: self.internal_gains.moisture_gain(hour),
            air_mass_flow: AIR.density()
                * self
                    .ventilation
                    .mechanical_volume_flow(self.mechanical_ach(hour)),
        }
    }

    /// Fan electricity of the air-handling unit, drawn while it heats or cools, in W
    fn fan_electricity(&self, hour: usize, q_hsf: f64, q_csf: f64) -> f64 {
        let running = (self.heats_by_air() && q_hsf > 0.) || (self.cools_by_air() && q_csf < 0.);
        if !running {
            return 0.;
        }
        let flow_per_hour = self
            .ventilation
            .mechanical_volume_flow(self.mechanical_ach(hour))
            * SECONDS_PER_HOUR as f64;
        SPECIFIC_FAN_POWER * flow_per_hour
    }

    /// Hourly fresh water use, hot and cold, in m3
    fn fresh_water_volumes(&self, hours: usize) -> Vec<f64> {
        (0..hours)
            .map(|hour| {
                let draw = self.dhw_draw.get(hour).copied().unwrap_or(0.)
                    + self.cold_water_draw.get(hour).copied().unwrap_or(0.);
                draw * self.floor_area / LITRES_PER_CUBIC_METRE as f64
            })
            .collect()
    }

    pub fn run(
        &self,
        external: &ExternalConditions,
        simulation_time: &SimulationTime,
    ) -> Result<BuildingResults, ConfigurationError> {
        let _span = info_span!("building", name = %self.name).entered();
        let hours = simulation_time.total_steps();
        if external.len() < hours {
            return Err(ConfigurationError::SeriesLengthMismatch {
                name: "air_temperatures".into(),
                actual: external.len(),
                expected: hours,
            });
        }
        self.check_series_lengths(hours)?;

        let gains = self.gain_series(external, hours);

        // thermal network, both emission passes
        let thermal: Vec<EmissionResult> = (0..hours)
            .scan(EmissionState::default(), |state, hour| {
                let conditions = self.hour_conditions(hour, &gains, external);
                let (next, result) = self.emission.step(*state, &conditions);
                *state = next;
                Some(result)
            })
            .collect();

        let temp_air: Vec<f64> = thermal.iter().map(|r| r.nominal.temp_air).collect();
        let q_hs_incl_em_ls: Vec<f64> = thermal.iter().map(|r| r.q_hs_sen_incl_em_ls()).collect();
        let q_cs_incl_em_ls: Vec<f64> = thermal.iter().map(|r| r.q_cs_sen_incl_em_ls()).collect();

        // moisture control by the air-handling unit, while it heats or cools
        let air_handling = AirHandlingUnit::new(self.ventilation.heat_recovery_efficiency());
        let q_hs_lat: Vec<f64> = (0..hours)
            .map(|hour| {
                if self.heats_by_air() && thermal[hour].nominal.q_hs_sen > 0. {
                    air_handling.humidification(&self.unit_hour(hour, temp_air[hour], external))
                } else {
                    0.
                }
            })
            .collect();
        let q_cs_lat: Vec<f64> = (0..hours)
            .map(|hour| {
                if self.cools_by_air() && thermal[hour].nominal.q_cs_sen < 0. {
                    air_handling.dehumidification(&self.unit_hour(hour, temp_air[hour], external))
                } else {
                    0.
                }
            })
            .collect();

        // space distribution losses, scaled by the load relative to its peak
        let q_hs_peak = peak(&q_hs_incl_em_ls, 1.).map_or(0., |(_, load)| load);
        let q_cs_peak = peak(&q_cs_incl_em_ls, -1.).map_or(0., |(_, load)| load);
        let distribution_loss = |load: f64, load_peak: f64, design: &DesignTemperatures, hour: usize| {
            space_distribution_loss(
                load,
                load_peak,
                design,
                temp_air[hour],
                external.air_temp(hour),
                self.pipe_lengths.space_distribution,
                self.transmissivity.space_distribution,
            )
        };
        let q_hs_dis_ls: Vec<f64> = (0..hours)
            .map(|hour| {
                distribution_loss(q_hs_incl_em_ls[hour], q_hs_peak, &self.heating_design, hour)
            })
            .collect();
        let q_cs_dis_ls: Vec<f64> = (0..hours)
            .map(|hour| {
                distribution_loss(q_cs_incl_em_ls[hour], q_cs_peak, &self.cooling_design, hour)
            })
            .collect();
        let q_hsf: Vec<f64> = izip!(&q_hs_incl_em_ls, &q_hs_dis_ls)
            .map(|(q, ls)| q + ls)
            .collect();
        let q_csf: Vec<f64> = izip!(&q_cs_incl_em_ls, &q_cs_dis_ls, &q_cs_lat)
            .map(|(q, ls, lat)| q + ls + lat)
            .collect();

        // terminal units, sized on the final loads
        let heating_unit = self.terminal_unit(Service::Heating, &q_hsf, &temp_air)?;
        let cooling_unit = self.terminal_unit(Service::Cooling, &q_csf, &temp_air)?;
        let mut warnings: Vec<SimulationWarning> = external
            .warnings()
            .iter()
            .chain(&self.warnings)
            .cloned()
            .map(SimulationWarning::from)
            .collect();
        for issue in [&heating_unit, &cooling_unit]
            .into_iter()
            .flatten()
            .filter_map(|unit| unit.design_issue())
        {
            warn!("{issue}");
            warnings.push(issue.clone().into());
        }
        let operating_points = |unit: &Option<TerminalUnit>, loads: &[f64]| {
            izip!(loads, &temp_air)
                .map(|(&load, &temp)| {
                    unit.as_ref().map_or(TerminalUnitOperatingPoint::Idle, |unit| {
                        unit.operating_point(load, temp)
                    })
                })
                .collect::<Vec<_>>()
        };
        let heating_points = operating_points(&heating_unit, &q_hsf);
        let cooling_points = operating_points(&cooling_unit, &q_csf);

        // hot water, carrying the tank temperature from hour to hour
        let hot_water_system = self.hot_water_system();
        let hot_water: Vec<HotWaterHour> = (0..hours)
            .scan(hot_water_system.initial_tank_temp(), |temp_tank, hour| {
                let result = hot_water_system.step(
                    hour,
                    *temp_tank,
                    temp_air[hour],
                    external.air_temp(hour),
                );
                *temp_tank = result.temp_tank;
                Some(result)
            })
            .collect();
        let heater_output_peak = hot_water
            .iter()
            .map(|hour| hour.heater_output)
            .fold(0., f64::max);
        let fresh_water_pumping = self.pumps.fresh_water(&self.fresh_water_volumes(hours));

        let q_hsf_peak = peak(&q_hsf, 1.).map_or(0., |(_, load)| load);
        let q_csf_peak = peak(&q_csf, -1.).map_or(0., |(_, load)| load);
        let has_air_handling = self.has_air_handling();

        let records: Vec<HourlyRecord> = (0..hours)
            .map(|hour| {
                let emission = &thermal[hour];
                let nominal = &emission.nominal;
                let hot_water = hot_water[hour];
                let internal = &self.internal_gains;
                HourlyRecord {
                    temp_air: nominal.temp_air,
                    temp_surface: nominal.temp_surface,
                    temp_mass: nominal.temp_mass,
                    temp_operative: nominal.temp_operative,
                    uncomfortable: nominal.uncomfortable,
                    i_sol: gains.solar()[hour],
                    i_int_sen: gains.internal_sensible()[hour],
                    q_hs_sen: nominal.q_hs_sen,
                    q_cs_sen: nominal.q_cs_sen,
                    q_hs_em_ls: emission.q_hs_em_ls,
                    q_cs_em_ls: emission.q_cs_em_ls,
                    q_hs_dis_ls: q_hs_dis_ls[hour],
                    q_cs_dis_ls: q_cs_dis_ls[hour],
                    q_hs_lat: q_hs_lat[hour],
                    q_cs_lat: q_cs_lat[hour],
                    q_hs: nominal.q_hs_sen,
                    q_hsf: q_hsf[hour],
                    q_cs: nominal.q_cs_sen + q_cs_lat[hour],
                    q_csf: q_csf[hour],
                    heating_point: heating_points[hour],
                    cooling_point: cooling_points[hour],
                    hot_water,
                    w_int: if has_air_handling {
                        internal.moisture_gain(hour)
                    } else {
                        0.
                    },
                    e_alf: internal.electricity(hour),
                    e_aux_hs: self.pumps.space_conditioning(
                        PumpedCircuit::SpaceHeating,
                        q_hsf[hour],
                        q_hsf_peak,
                        &heating_points[hour],
                    ),
                    e_aux_cs: self.pumps.space_conditioning(
                        PumpedCircuit::SpaceCooling,
                        q_csf[hour],
                        q_csf_peak,
                        &cooling_points[hour],
                    ),
                    e_aux_ww: self.pumps.hot_water(
                        hot_water.demand,
                        hot_water.heater_output,
                        heater_output_peak,
                        hot_water.mass_flow,
                    ),
                    e_aux_ve: self.fan_electricity(hour, q_hsf[hour], q_csf[hour]),
                    e_aux_fw: fresh_water_pumping[hour],
                    e_pro: internal.process_electricity(hour),
                    e_data: internal.data_centre_electricity(hour),
                    q_cdata: internal.data_centre_cooling(hour),
                    q_crefri: internal.refrigeration_cooling(hour),
                }
            })
            .collect();

        for warning in hourly_warnings(&records) {
            warn!("{warning}");
            warnings.push(warning);
        }

        let carriers: IndexMap<Carrier, Vec<f64>> = Carrier::iter()
            .map(|carrier| {
                (
                    carrier,
                    records.iter().map(|r| r.carrier(carrier)).collect(),
                )
            })
            .collect();
        let uncomfortable: Vec<bool> = records.iter().map(|r| r.uncomfortable).collect();
        let summary = AnnualSummary::new(&carriers, &uncomfortable);

        Ok(BuildingResults {
            name: self.name.clone(),
            floor_area: self.floor_area,
            simulation_time: *simulation_time,
            hours: records,
            summary,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_conditions::DEFAULT_RELATIVE_HUMIDITY;
    use crate::input::{
        EnvelopeInput, ExternalConditionsInput, GeometryInput, SchedulesInput, SurfaceInput,
        SystemsInput, VentilationInput, VintageInput,
    };
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const HOURS: usize = 48;

    fn outdoor_temp(hour: usize) -> f64 {
        -2. + 8. * ((hour % 24) as f64 / 24. * std::f64::consts::TAU).sin()
    }

    fn summer_temp(hour: usize) -> f64 {
        28. + 6. * ((hour % 24) as f64 / 24. * std::f64::consts::TAU - 2.).sin()
    }

    fn weather(temp: impl Fn(usize) -> f64, relative_humidity: Option<f64>) -> ExternalConditions {
        let inline = ExternalConditionsInput {
            air_temperatures: Some((0..HOURS).map(&temp).collect()),
            relative_humidities: relative_humidity.map(|rh| vec![rh; HOURS]),
            sky_temperatures: Some((0..HOURS).map(|h| temp(h) - 11.).collect()),
        };
        ExternalConditions::new(Some(&inline), None).unwrap()
    }

    #[fixture]
    pub fn external() -> ExternalConditions {
        weather(outdoor_temp, Some(70.))
    }

    #[fixture]
    pub fn simulation_time() -> SimulationTime {
        SimulationTime::new(2005, HOURS)
    }

    #[fixture]
    pub fn building() -> BuildingInput {
        let occupied = |hour: usize| (8..18).contains(&(hour % 24));
        BuildingInput {
            name: "B1001".into(),
            envelope: EnvelopeInput {
                floor_area: 500.,
                window_area: 80.,
                opaque_area_above_ground: 400.,
                opaque_area_below_ground: 250.,
                total_area: None,
                u_window: 1.4,
                u_opaque: 0.35,
                u_base: 0.4,
                construction: Some("medium".into()),
            },
            vintage: VintageInput {
                year_built: 1990,
                retrofitted: false,
            },
            geometry: GeometryInput {
                footprint_length: 25.,
                footprint_width: 10.,
                floors_above_ground: 2,
                floor_height: 3.,
                form_factor: 1.,
            },
            pipe_lengths: None,
            systems: SystemsInput {
                heating: "T1".into(),
                cooling: "T3".into(),
                heating_design_temperatures: None,
                cooling_design_temperatures: None,
                heating_capacity: None,
                cooling_capacity: None,
                heating_season: None,
                cooling_season: None,
                heating_emitter_exponent: None,
            },
            ventilation: VentilationInput {
                volume: None,
                infiltration_ach: 0.5,
                heat_recovery_efficiency: 0.,
            },
            glazing: GlazingInput {
                g_value: 0.6,
                frame_fraction: 0.2,
                shading_device: Some("T1".into()),
                shading_factor: None,
                shading_setpoint: Some(300.),
            },
            surfaces: vec![SurfaceInput {
                window_area: 40.,
                u_window: 1.4,
                opaque_area: 200.,
                u_opaque: 0.35,
                absorptance: 0.6,
                sky_form_factor: 0.5,
                irradiance: (0..HOURS)
                    .map(|h| if occupied(h) { 250. } else { 0. })
                    .collect(),
            }],
            schedules: SchedulesInput {
                people: (0..HOURS).map(|h| if occupied(h) { 20. } else { 0. }).collect(),
                setpoint_heating: (0..HOURS)
                    .map(|h| Some(if occupied(h) { 21. } else { 16. }))
                    .collect(),
                setpoint_cooling: vec![Some(26.); HOURS],
                mechanical_ventilation: vec![],
                lighting: (0..HOURS).map(|h| if occupied(h) { 2_000. } else { 100. }).collect(),
                appliances: vec![500.; HOURS],
                process: vec![],
                data_centre: vec![],
                refrigeration: vec![],
                dhw_draw: (0..HOURS)
                    .map(|h| if occupied(h) { 0.05 } else { 0. })
                    .collect(),
                cold_water_draw: vec![],
            },
            occupant: None,
        }
    }

    fn simulate_in(building: &BuildingInput, external: &ExternalConditions) -> BuildingResults {
        BuildingSimulation::from_input(building, &DemandSettings::default())
            .unwrap()
            .run(external, &simulation_time())
            .unwrap()
    }

    fn simulate(building: &BuildingInput) -> BuildingResults {
        simulate_in(building, &external())
    }

    fn mechanically_ventilated(mut building: BuildingInput) -> BuildingInput {
        building.schedules.mechanical_ventilation = (0..HOURS)
            .map(|h| if (8..18).contains(&(h % 24)) { 1. } else { 0. })
            .collect();
        building
    }

    #[rstest]
    fn should_balance_final_space_loads(building: BuildingInput) {
        let results = simulate(&building);
        assert_eq!(results.hours.len(), HOURS);
        assert!(results.hours.iter().any(|h| h.q_hs_sen > 0.));

        for hour in &results.hours {
            if hour.q_hsf != 0. {
                assert_abs_diff_eq!(
                    hour.q_hsf - hour.q_hs_dis_ls - hour.q_hs_em_ls,
                    hour.q_hs_sen,
                    epsilon = 1e-6
                );
            }
            if hour.q_csf != 0. {
                assert_abs_diff_eq!(
                    hour.q_csf - hour.q_cs_dis_ls - hour.q_cs_em_ls - hour.q_cs_lat,
                    hour.q_cs_sen,
                    epsilon = 1e-6
                );
            }
        }
    }

    #[rstest]
    fn should_report_sensible_heating_load_without_emission_losses(building: BuildingInput) {
        let results = simulate(&building);
        assert!(results.hours.iter().any(|h| h.q_hs_em_ls > 0.));

        for hour in &results.hours {
            assert_eq!(hour.q_hs, hour.q_hs_sen);
        }
        let total_q_hs_sen: f64 = results.hours.iter().map(|h| h.q_hs_sen).sum();
        assert_abs_diff_eq!(
            results.summary.carrier(Carrier::Qhs).total,
            total_q_hs_sen / 1e6,
            epsilon = 1e-9
        );
        assert!(
            results.summary.carrier(Carrier::Qhsf).total
                > results.summary.carrier(Carrier::Qhs).total
        );
    }

    #[rstest]
    fn should_relax_unattainable_floor_panel_design(mut building: BuildingInput) {
        // the peak load pushes the panel surface above the 35 degC design return
        building.envelope.u_opaque = 3.;
        building.envelope.u_window = 6.;
        building.ventilation.infiltration_ach = 3.;
        building.systems.heating = "T4".into();
        building.systems.cooling = "T0".into();
        let results = simulate_in(&building, &weather(|_| -20., Some(70.)));

        assert!(results.warnings.iter().any(|w| matches!(
            w,
            SimulationWarning::InfeasibleDesign(issue) if issue.service == "Heating"
        )));
        let peak_hour = results
            .summary
            .carrier(Carrier::Qhsf)
            .peak_hour
            .unwrap();
        assert!(matches!(
            results.hours[peak_hour].heating_point,
            TerminalUnitOperatingPoint::Operating { .. }
        ));
    }

    #[rstest]
    fn should_carry_defaulted_weather_columns_into_results(mut building: BuildingInput) {
        building.envelope.construction = None;
        let results = simulate_in(&building, &weather(outdoor_temp, None));

        let defaulted: Vec<&str> = results
            .warnings
            .iter()
            .filter_map(|w| match w {
                SimulationWarning::MissingInput(missing) => Some(missing.column.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(defaulted, vec!["relative_humidities", "construction"]);
        assert!(results
            .hours
            .iter()
            .all(|h| h.q_hs_lat == 0. && h.q_cs_lat == 0.));
        assert_eq!(
            weather(outdoor_temp, None).relative_humidity(0),
            DEFAULT_RELATIVE_HUMIDITY
        );
    }

    #[rstest]
    fn should_humidify_and_run_fans_while_heating_by_air(building: BuildingInput) {
        let mut building = mechanically_ventilated(building);
        building.systems.heating = "T3".into();
        building.systems.cooling = "T0".into();
        let results = simulate(&building);
        // 1 ach of 500 m2 x 3 m
        let fan_power = SPECIFIC_FAN_POWER * 1500.;

        assert!(results.hours.iter().any(|h| h.q_hs_lat > 0.));
        for (hour, record) in results.hours.iter().enumerate() {
            assert!(record.q_hs_lat >= 0.);
            assert_eq!(record.q_cs_lat, 0.);
            if record.q_hs_sen == 0. {
                assert_eq!(record.q_hs_lat, 0.);
            }
            let ventilated = (8..18).contains(&(hour % 24));
            let expected_fan = if ventilated && record.q_hsf > 0. {
                fan_power
            } else {
                0.
            };
            assert_abs_diff_eq!(record.e_aux_ve, expected_fan, epsilon = 1e-9);
            if record.q_hsf != 0. {
                // humidification is reported apart from the final heating load
                assert_abs_diff_eq!(
                    record.q_hsf,
                    record.q_hs_sen + record.q_hs_em_ls + record.q_hs_dis_ls,
                    epsilon = 1e-6
                );
            }
        }
        assert!(results.hours.iter().any(|h| h.e_aux_ve > 0.));
    }

    #[rstest]
    fn should_dehumidify_humid_summer_air(building: BuildingInput) {
        let mut building = mechanically_ventilated(building);
        building.systems.heating = "T0".into();
        let results = simulate_in(&building, &weather(summer_temp, Some(80.)));

        assert!(results.hours.iter().any(|h| h.q_cs_lat < 0.));
        for hour in &results.hours {
            assert!(hour.q_cs_lat <= 0.);
            assert_abs_diff_eq!(hour.q_cs, hour.q_cs_sen + hour.q_cs_lat, epsilon = 1e-9);
            if hour.q_cs_sen == 0. {
                assert_eq!(hour.q_cs_lat, 0.);
            }
        }

        let summary = &results.summary;
        let total_q_cs: f64 = results.hours.iter().map(|h| h.q_cs).sum();
        assert!(summary.carrier(Carrier::Qcs).total > 0.);
        assert_abs_diff_eq!(
            summary.carrier(Carrier::Qcs).total,
            -total_q_cs / 1e6,
            epsilon = 1e-9
        );
        assert!(summary.carrier(Carrier::Qcsf).peak > 0.);
        assert!(summary.carrier(Carrier::QCf).total >= summary.carrier(Carrier::Qcsf).total);
    }

    #[rstest]
    fn should_add_plant_electricity_and_cooling(mut building: BuildingInput) {
        building.schedules.process = vec![200.; HOURS];
        building.schedules.data_centre = vec![1_000.; HOURS];
        building.schedules.refrigeration = vec![500.; HOURS];
        let results = simulate(&building);

        for hour in &results.hours {
            assert_eq!(hour.e_pro, 200.);
            assert_eq!(hour.e_data, 1_000.);
            assert_abs_diff_eq!(hour.q_cdata, 900., epsilon = 1e-9);
            assert_abs_diff_eq!(hour.q_crefri, 2_000., epsilon = 1e-9);
            assert_abs_diff_eq!(hour.q_cf(), -hour.q_csf + 2_900., epsilon = 1e-9);
            assert_abs_diff_eq!(
                hour.e_f(),
                hour.e_alf + hour.e_aux() + 1_200.,
                epsilon = 1e-9
            );
        }
        assert_abs_diff_eq!(
            results.summary.carrier(Carrier::Edataf).total,
            HOURS as f64 * 1_000. / 1e6,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            results.summary.carrier(Carrier::Qcref).peak,
            2.,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn should_boost_fresh_water_in_tall_buildings(mut building: BuildingInput) {
        let results = simulate(&building);
        assert!(results.hours.iter().all(|h| h.e_aux_fw == 0.));

        building.geometry.floors_above_ground = 8;
        building.schedules.cold_water_draw = (0..HOURS)
            .map(|h| if (8..18).contains(&(h % 24)) { 0.1 } else { 0. })
            .collect();
        let results = simulate(&building);

        for (hour, record) in results.hours.iter().enumerate() {
            let pumping = (12..17).contains(&(hour % 24));
            assert_eq!(record.e_aux_fw > 0., pumping);
        }
        assert_eq!(results.hours[12].e_aux_fw, results.hours[16].e_aux_fw);
    }

    #[rstest]
    fn should_count_hours_with_recovered_problems(building: BuildingInput) {
        let mut records = simulate(&building).hours;
        assert!(hourly_warnings(&records).is_empty());

        records[3].hot_water.tank_integration_failed = true;
        records[5].heating_point = TerminalUnitOperatingPoint::Diverged;
        records[6].cooling_point = TerminalUnitOperatingPoint::Diverged;

        assert_eq!(
            hourly_warnings(&records),
            vec![
                SimulationWarning::SolverDiverged { hours: 2 },
                SimulationWarning::TankIntegration { hours: 1 },
            ]
        );
    }

    #[rstest]
    fn should_operate_terminal_units_only_under_load(building: BuildingInput) {
        let results = simulate(&building);

        for hour in &results.hours {
            if hour.q_hsf == 0. {
                assert_eq!(hour.heating_point, TerminalUnitOperatingPoint::Idle);
                assert_eq!(hour.e_aux_hs, 0.);
            } else if let Some(temp_supply) = hour.heating_point.temp_supply() {
                assert!(temp_supply > hour.temp_air);
                assert!(hour.heating_point.mass_flow() > 0.);
            }
            assert!(!hour.solver_diverged());
        }
    }

    #[rstest]
    fn should_combine_carriers(building: BuildingInput) {
        let results = simulate(&building);

        for hour in &results.hours {
            assert_abs_diff_eq!(
                hour.q_hf(),
                hour.q_hsf + hour.hot_water.heater_output,
                epsilon = 1e-9
            );
            assert_abs_diff_eq!(
                hour.e_f(),
                hour.e_alf + hour.e_aux() + hour.e_pro + hour.e_data,
                epsilon = 1e-9
            );
            assert_abs_diff_eq!(
                hour.e_aux(),
                hour.e_aux_hs + hour.e_aux_cs + hour.e_aux_ww + hour.e_aux_ve + hour.e_aux_fw,
                epsilon = 1e-9
            );
            assert!(hour.q_cf() >= 0.);
            assert!(hour.hot_water.heater_output >= 0.);
        }
        let total_qhsf: f64 = results.hours.iter().map(|h| h.q_hsf).sum();
        assert_abs_diff_eq!(
            results.summary.carrier(Carrier::Qhsf).total,
            total_qhsf / 1e6,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn should_not_heat_or_cool_without_systems(mut building: BuildingInput) {
        building.systems.heating = "T0".into();
        building.systems.cooling = "T0".into();
        let results = simulate(&building);

        assert!(results.hours.iter().all(|h| h.q_hs == 0. && h.q_cs == 0.));
        assert!(results.hours.iter().any(|h| h.uncomfortable));
        assert_eq!(results.summary.carrier(Carrier::Qhsf).peak_hour, None);
        assert!(results.hours.iter().all(|h| h.w_int == 0.));
    }

    #[rstest]
    fn should_report_latent_gains_with_air_handling(building: BuildingInput) {
        let results = simulate(&building);
        assert!(results.hours.iter().any(|h| h.w_int > 0.));
    }

    #[rstest]
    fn should_respect_heating_season(mut building: BuildingInput) {
        building.systems.heating_season = Some(SeasonInput {
            start_hour: 24,
            end_hour: 47,
        });
        let results = simulate(&building);

        assert!(results.hours[..24].iter().all(|h| h.q_hs_sen == 0.));
        assert!(results.hours[24..].iter().any(|h| h.q_hs_sen > 0.));
    }

    #[rstest]
    fn should_reject_schedules_of_wrong_length(mut building: BuildingInput) {
        building.schedules.people.pop();
        let result = BuildingSimulation::from_input(&building, &DemandSettings::default())
            .unwrap()
            .run(&external(), &simulation_time());

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::SeriesLengthMismatch {
                name: "people".into(),
                actual: HOURS - 1,
                expected: HOURS
            }
        );
    }

    #[rstest]
    fn should_reject_degenerate_envelope(mut building: BuildingInput) {
        building.envelope.u_opaque = 0.;
        building.envelope.u_base = 0.;
        assert!(matches!(
            BuildingSimulation::from_input(&building, &DemandSettings::default()),
            Err(ConfigurationError::DegenerateConductance { .. })
        ));
    }

    #[rstest]
    fn should_surface_defaulted_inputs(mut building: BuildingInput) {
        building.envelope.construction = None;
        building.glazing.shading_device = None;
        building.glazing.shading_setpoint = None;
        let simulation =
            BuildingSimulation::from_input(&building, &DemandSettings::default()).unwrap();

        assert_eq!(
            simulation
                .warnings
                .iter()
                .map(|w| w.column.as_str())
                .collect::<Vec<_>>(),
            vec!["construction", "shading_device", "shading_setpoint"]
        );
    }

    #[rstest]
    fn should_carry_tank_temperature_only_with_hot_water_use(mut building: BuildingInput) {
        let results = simulate(&building);
        assert!(results.hours.iter().all(|h| h.hot_water.temp_tank.is_some()));

        building.schedules.dhw_draw = vec![];
        let results = simulate(&building);
        assert!(results.hours.iter().all(|h| h.hot_water.temp_tank.is_none()
            && h.hot_water.heater_output == 0.));
    }

    #[rstest]
    #[case(&[0., 3., -1., 5., 5.], 1., Some((3, 5.)))]
    #[case(&[0., -3., -4., 2.], -1., Some((2, -4.)))]
    #[case(&[0., 0.], 1., None)]
    fn should_find_first_peak(
        #[case] series: &[f64],
        #[case] sign: f64,
        #[case] expected: Option<(usize, f64)>,
    ) {
        assert_eq!(peak(series, sign), expected);
    }
}
