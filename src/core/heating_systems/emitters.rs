// Operating points of water-based terminal units (radiators, embedded panels and, through
// `air_handling_coil`, air-handling coils). The water flow is held at its design value and
// the supply and return temperatures float with the load.

use crate::core::heating_systems::air_handling_coil::AirHandlingCoil;
use crate::core::heating_systems::common::{DesignTemperatures, Service, TerminalUnitFamily};
use crate::core::material_properties::WATER;
use crate::core::solvers::{newton_with_bracket_fallback, SolverSettings};
use crate::core::units::WATTS_PER_KILOWATT;
use crate::errors::{CoilSolverDivergence, ConfigurationError, InfeasibleDesign};
use tracing::warn;

/// Surface resistance between the water-carrying layer of an embedded panel and the room,
/// in m2.K / W
pub const PANEL_SURFACE_RESISTANCE: f64 = 0.08;
/// Share of the conditioned floor area taken up by active panel surface
pub const PANEL_ACTIVE_AREA_FRACTION: f64 = 0.8;

// Bounds of the approach temperature (water to reference) searched by the bracketing stage, in K
pub(crate) const MIN_APPROACH_TEMP: f64 = 1e-6;
pub(crate) const MAX_APPROACH_TEMP: f64 = 200.;
/// Smallest design approach of the return water to the reference temperature, in K. Designs
/// that leave less are relaxed to it.
pub const MIN_DESIGN_APPROACH_TEMP: f64 = 1.;

/// Hourly state of a terminal unit for one service
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TerminalUnitOperatingPoint {
    /// No load, no flow. Temperatures are not applicable.
    Idle,
    Operating {
        temp_supply: f64,
        temp_return: f64,
        /// Water mass flow, in kg/s
        mass_flow: f64,
    },
    /// The solver gave up for this hour
    Diverged,
}

impl TerminalUnitOperatingPoint {
    pub fn temp_supply(&self) -> Option<f64> {
        match self {
            Self::Operating { temp_supply, .. } => Some(*temp_supply),
            _ => None,
        }
    }

    pub fn temp_return(&self) -> Option<f64> {
        match self {
            Self::Operating { temp_return, .. } => Some(*temp_return),
            _ => None,
        }
    }

    pub fn mass_flow(&self) -> f64 {
        match self {
            Self::Operating { mass_flow, .. } => *mass_flow,
            _ => 0.,
        }
    }

    /// Capacity flow of the water circuit, in kW/K
    pub fn capacity_flow(&self) -> f64 {
        self.mass_flow() * WATER.specific_heat_capacity() / WATTS_PER_KILOWATT as f64
    }

    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged)
    }
}

/// Design conditions of a terminal unit, taken at the annual peak of its service
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerminalUnitDesign {
    pub service: Service,
    /// Peak load magnitude, in W
    pub power: f64,
    pub temperatures: DesignTemperatures,
    /// Zone air temperature in the peak hour
    pub temp_air: f64,
}

impl TerminalUnitDesign {
    pub fn new(
        service: Service,
        power: f64,
        temperatures: DesignTemperatures,
        temp_air: f64,
    ) -> Self {
        Self {
            service,
            power: power.abs(),
            temperatures,
            temp_air,
        }
    }

    pub(crate) fn sign(&self) -> f64 {
        service_sign(self.service)
    }

    pub(crate) fn temp_difference(&self) -> f64 {
        (self.temperatures.temp_supply - self.temperatures.temp_return).abs()
    }

    /// Capacity flow of the water circuit at design, in W/K
    pub fn capacity_flow(&self) -> f64 {
        self.power / self.temp_difference()
    }

    pub(crate) fn mass_flow(&self) -> f64 {
        self.capacity_flow() / WATER.specific_heat_capacity()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.power > 0.) || !self.power.is_finite() {
            return Err(ConfigurationError::InvalidValue(format!(
                "{} terminal unit design load must be positive, got {} W",
                self.service, self.power
            )));
        }
        let expected_order = self.sign()
            * (self.temperatures.temp_supply - self.temperatures.temp_return);
        if !(expected_order > 0.) {
            return Err(ConfigurationError::InvalidValue(format!(
                "{} design supply temperature {} and return temperature {} are in the wrong order",
                self.service, self.temperatures.temp_supply, self.temperatures.temp_return
            )));
        }
        Ok(())
    }
}

pub(crate) fn service_sign(service: Service) -> f64 {
    match service {
        Service::Heating => 1.,
        Service::Cooling => -1.,
    }
}

/// Logarithmic mean of two approach temperatures. NaN when either is not positive, so that
/// the solvers treat such points as outside the domain.
pub(crate) fn log_mean_temperature_difference(theta_a: f64, theta_b: f64) -> f64 {
    if !(theta_a > 0. && theta_b > 0.) {
        return f64::NAN;
    }
    let diff = theta_a - theta_b;
    if diff.abs() <= 1e-12 * theta_a.max(theta_b) {
        return theta_a;
    }
    diff / (theta_a / theta_b).ln()
}

/// Water circuit exchanging with a single reference temperature (room air for radiators,
/// panel surface for embedded panels), with the characteristic
/// Q / Q0 = (LMTD / LMTD0) ^ (1 + n)
#[derive(Clone, Debug)]
pub struct WaterSideExchanger {
    design: TerminalUnitDesign,
    exponent: f64,
    design_approach_return: f64,
    design_lmtd: f64,
    design_issue: Option<InfeasibleDesign>,
    settings: SolverSettings,
}

impl WaterSideExchanger {
    /// Arguments:
    /// * `design` - peak load and design temperatures
    /// * `exponent` - n, the deviation of the characteristic from linear
    /// * `temp_reference_design` - reference temperature at the design point, in deg C
    ///
    /// When the design return temperature does not clear the reference temperature by at least
    /// `MIN_DESIGN_APPROACH_TEMP`, the exchanger is sized at that approach and the relaxation is
    /// kept as its design issue.
    pub fn new(design: TerminalUnitDesign, exponent: f64, temp_reference_design: f64) -> Self {
        let approach_return =
            design.sign() * (design.temperatures.temp_return - temp_reference_design);
        let design_issue = (!(approach_return >= MIN_DESIGN_APPROACH_TEMP)).then(|| {
            InfeasibleDesign {
                service: design.service.to_string(),
                reason: format!(
                    "design return temperature {} degC does not clear the reference temperature \
                     {temp_reference_design:.2} degC at the peak load of {} W, sized with a \
                     {MIN_DESIGN_APPROACH_TEMP} K approach instead",
                    design.temperatures.temp_return, design.power
                ),
            }
        });
        let design_approach_return = approach_return.max(MIN_DESIGN_APPROACH_TEMP);
        let design_lmtd = log_mean_temperature_difference(
            design_approach_return + design.temp_difference(),
            design_approach_return,
        );

        Self {
            design,
            exponent,
            design_approach_return,
            design_lmtd,
            design_issue,
            settings: Default::default(),
        }
    }

    pub fn design(&self) -> &TerminalUnitDesign {
        &self.design
    }

    pub fn design_issue(&self) -> Option<&InfeasibleDesign> {
        self.design_issue.as_ref()
    }

    fn residual(&self, load_ratio: f64, temp_difference: f64, approach_return: f64) -> f64 {
        let lmtd = log_mean_temperature_difference(
            approach_return + temp_difference,
            approach_return,
        );
        load_ratio - (lmtd / self.design_lmtd).powf(1. + self.exponent)
    }

    /// Find the operating point delivering `power` (W) against `temp_reference` (deg C)
    pub fn solve(
        &self,
        power: f64,
        temp_reference: f64,
    ) -> Result<TerminalUnitOperatingPoint, CoilSolverDivergence> {
        if power == 0. {
            return Ok(TerminalUnitOperatingPoint::Idle);
        }
        let load_ratio = power.abs() / self.design.power;
        let temp_difference = power.abs() / self.design.capacity_flow();

        let root = newton_with_bracket_fallback(
            |approach_return| self.residual(load_ratio, temp_difference, approach_return),
            self.design_approach_return,
            (MIN_APPROACH_TEMP, MAX_APPROACH_TEMP),
            self.settings,
        )
        .map_err(|_| CoilSolverDivergence { power })?;

        let sign = self.design.sign();
        let temp_return = temp_reference + sign * root.value;
        Ok(TerminalUnitOperatingPoint::Operating {
            temp_supply: temp_return + sign * temp_difference,
            temp_return,
            mass_flow: self.design.mass_flow(),
        })
    }
}

/// A terminal unit sized for one service of one building
#[derive(Clone, Debug)]
pub enum TerminalUnit {
    Radiator(WaterSideExchanger),
    Panel {
        exchanger: WaterSideExchanger,
        /// Active panel area, in m2
        active_area: f64,
    },
    AirCoil(AirHandlingCoil),
    /// No unit of the family can deliver the design load. Every hour under load diverges.
    Unattainable {
        design: TerminalUnitDesign,
        issue: InfeasibleDesign,
    },
}

impl TerminalUnit {
    /// Arguments:
    /// * `family` - heat-exchange relation of the unit
    /// * `design` - peak load and design temperatures of the service
    /// * `exponent` - characteristic exponent n (ignored by air coils)
    /// * `floor_area` - conditioned floor area, in m2
    pub fn new(
        family: TerminalUnitFamily,
        design: TerminalUnitDesign,
        exponent: f64,
        floor_area: f64,
    ) -> Result<Self, ConfigurationError> {
        design.validate()?;
        Ok(match family {
            TerminalUnitFamily::Radiator => {
                Self::Radiator(WaterSideExchanger::new(design, exponent, design.temp_air))
            }
            TerminalUnitFamily::Panel => {
                let active_area = PANEL_ACTIVE_AREA_FRACTION * floor_area;
                let temp_surface_design =
                    panel_surface_temp(design.service, design.power, design.temp_air, active_area);
                Self::Panel {
                    exchanger: WaterSideExchanger::new(design, exponent, temp_surface_design),
                    active_area,
                }
            }
            TerminalUnitFamily::AirCoil => match AirHandlingCoil::new(design) {
                Ok(coil) => Self::AirCoil(coil),
                Err(issue) => Self::Unattainable { design, issue },
            },
        })
    }

    /// Why the unit could not be sized on its nominal design point, if it could not
    pub fn design_issue(&self) -> Option<&InfeasibleDesign> {
        match self {
            Self::Radiator(exchanger) | Self::Panel { exchanger, .. } => exchanger.design_issue(),
            Self::AirCoil(_) => None,
            Self::Unattainable { issue, .. } => Some(issue),
        }
    }

    pub fn solve(
        &self,
        power: f64,
        temp_air: f64,
    ) -> Result<TerminalUnitOperatingPoint, CoilSolverDivergence> {
        match self {
            Self::Radiator(exchanger) => exchanger.solve(power, temp_air),
            Self::Panel {
                exchanger,
                active_area,
            } => exchanger.solve(
                power,
                panel_surface_temp(exchanger.design().service, power, temp_air, *active_area),
            ),
            Self::AirCoil(coil) => coil.solve(power, temp_air),
            Self::Unattainable { .. } if power == 0. => Ok(TerminalUnitOperatingPoint::Idle),
            Self::Unattainable { .. } => Err(CoilSolverDivergence { power }),
        }
    }

    /// As `solve`, but an hour for which no operating point could be found is marked as
    /// diverged rather than failing the run.
    pub fn operating_point(&self, power: f64, temp_air: f64) -> TerminalUnitOperatingPoint {
        self.solve(power, temp_air).unwrap_or_else(|e| {
            warn!("{e}; hour marked as diverged");
            TerminalUnitOperatingPoint::Diverged
        })
    }
}

fn panel_surface_temp(service: Service, power: f64, temp_air: f64, active_area: f64) -> f64 {
    temp_air + service_sign(service) * power.abs() * PANEL_SURFACE_RESISTANCE / active_area
}
