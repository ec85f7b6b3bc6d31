// Heat losses of the space conditioning and domestic hot water pipe networks, with pipe
// lengths estimated from the building footprint.

use crate::core::heating_systems::common::DesignTemperatures;
use crate::core::material_properties::WATER;
use crate::core::space_heat_demand::conductance::B_F;
use crate::core::units::{MILLIMETRES_IN_METRE, SECONDS_PER_HOUR, WATTS_PER_KILOWATT};
use std::f64::consts::PI;

/// Internal diameter of hot water pipes, in mm
pub const DEFAULT_INTERNAL_DIAMETER_MM: f64 = 20.;
/// Flow rate at a hot water tap, in m3/h
pub const DEFAULT_TAP_FLOW: f64 = 0.036;

/// Temperature of unconditioned spaces (basement, shafts) between the zone and outside
pub fn temp_unconditioned(temp_air: f64, temp_ext: f64) -> f64 {
    temp_air - B_F * (temp_air - temp_ext)
}

/// Linear heat transmissivity of pipes, in W / (m.K), by network
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearTransmissivity {
    pub space_distribution: f64,
    pub dhw_recoverable: f64,
    pub dhw_non_recoverable: f64,
}

impl LinearTransmissivity {
    /// Insulation standard of the pipes follows the construction (or retrofit) period
    pub fn for_vintage(year_built: i32, retrofitted: bool) -> Self {
        let (space_distribution, dhw) = if retrofitted || year_built >= 1995 {
            (0.2, 0.3)
        } else if year_built >= 1985 {
            (0.3, 0.4)
        } else {
            (0.4, 0.4)
        };
        Self {
            space_distribution,
            dhw_recoverable: dhw,
            dhw_non_recoverable: dhw,
        }
    }
}

/// Footprint and storeys used to estimate pipe runs, lengths in m
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipeGeometry {
    pub footprint_length: f64,
    pub footprint_width: f64,
    pub floors_above_ground: u32,
    pub floor_height: f64,
    /// Correction for building forms that are not a simple box
    pub form_factor: f64,
}

/// Pipe lengths of the networks of one building, in m
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipeLengths {
    /// Space heating and cooling distribution (Lv)
    pub space_distribution: f64,
    /// DHW circulation loop inside the conditioned space (Lcww)
    pub dhw_circulation: f64,
    /// DHW branch pipes to the taps (Lsww)
    pub dhw_distribution: f64,
    /// DHW circulation loop in unconditioned space (Lvww_c)
    pub dhw_heating_circulation: f64,
    /// DHW distribution pipes in unconditioned space (Lvww)
    pub dhw_heating_distribution: f64,
}

impl PipeLengths {
    pub fn from_geometry(geometry: &PipeGeometry) -> Self {
        let PipeGeometry {
            footprint_length: l,
            footprint_width: w,
            floors_above_ground,
            floor_height,
            form_factor: f,
        } = *geometry;
        let floors = floors_above_ground as f64;
        let has_risers = floors_above_ground >= 2;

        Self {
            space_distribution: (2. * l + 0.0325 * l * w + 6.) * f,
            dhw_circulation: if has_risers {
                2. * (l + 2.5 + floors * floor_height) * f
            } else {
                0.
            },
            dhw_distribution: 0.038 * l * w * floors * floor_height * f,
            dhw_heating_circulation: if has_risers {
                (2. * l + 0.0125 * l * w) * f
            } else {
                0.
            },
            dhw_heating_distribution: (l + 0.0625 * l * w) * f,
        }
    }
}

/// Loss of the space heating or cooling distribution network for the hour, in W. Negative for
/// cooling, where the network gains heat.
///
/// Arguments:
/// * `power` - load of the hour, in W (positive heating, negative cooling)
/// * `power_peak` - annual peak of the same service, in W, with the same sign
/// * `design` - design supply and return temperatures of the terminal units
/// * `length` - length of the distribution network, in m
/// * `transmissivity` - linear heat transmissivity, in W / (m.K)
pub fn space_distribution_loss(
    power: f64,
    power_peak: f64,
    design: &DesignTemperatures,
    temp_air: f64,
    temp_ext: f64,
    length: f64,
    transmissivity: f64,
) -> f64 {
    if power == 0. || power_peak == 0. {
        return 0.;
    }
    let temp_mean = (design.temp_supply + design.temp_return) / 2.;
    (temp_mean - temp_unconditioned(temp_air, temp_ext))
        * (power / power_peak)
        * length
        * transmissivity
}

/// A run of hot water pipe that cools down between tappings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HotWaterPipe {
    length: f64,
    volume: f64,
}

impl HotWaterPipe {
    /// Arguments:
    /// * `length` - in m
    /// * `internal_diameter_mm` - in mm
    pub fn new(length: f64, internal_diameter_mm: f64) -> Self {
        let radius = internal_diameter_mm / MILLIMETRES_IN_METRE as f64 / 2.;
        Self {
            length,
            volume: length * PI * radius.powi(2),
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Volume of water in the pipe, in m3
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Heat lost by the water left standing in the pipe after tappings, in W
    ///
    /// Arguments:
    /// * `dhw_power` - hot water demand of the hour, in W
    /// * `temp_hot` - temperature of the water entering the pipe, in deg C
    /// * `temp_amb` - temperature around the pipe, in deg C
    /// * `transmissivity` - linear heat transmissivity, in W / (m.K)
    /// * `tap_flow` - flow rate at a tap, in m3/h
    pub fn tapping_loss(
        &self,
        dhw_power: f64,
        temp_hot: f64,
        temp_amb: f64,
        transmissivity: f64,
        tap_flow: f64,
    ) -> f64 {
        if dhw_power <= 0. || self.volume <= 0. {
            return 0.;
        }
        let seconds_per_hour = SECONDS_PER_HOUR as f64;
        let cooling_time =
            (seconds_per_hour / ((dhw_power / WATTS_PER_KILOWATT as f64) / tap_flow))
                .min(seconds_per_hour);
        let heat_capacity = WATER.volumetric_heat_capacity() * self.volume;

        let decay = (-(transmissivity * self.length * cooling_time) / heat_capacity).exp();
        let temp_cooled = temp_amb + (temp_hot - temp_amb) * decay;

        (temp_hot - temp_cooled) * heat_capacity / seconds_per_hour
    }
}

/// Loss of a circulation loop kept hot in proportion to the demand, in W
pub fn circulation_loss(
    temp_hot: f64,
    temp_amb: f64,
    length: f64,
    transmissivity: f64,
    load_ratio: f64,
) -> f64 {
    (temp_hot - temp_amb) * transmissivity * length * load_ratio
}

/// Hourly pipe losses of the hot water network, in W
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HotWaterPipeLosses {
    /// Lost within the conditioned space
    pub recoverable: f64,
    /// Lost in unconditioned space
    pub non_recoverable: f64,
}

impl HotWaterPipeLosses {
    pub fn total(&self) -> f64 {
        self.recoverable + self.non_recoverable
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HotWaterDistribution {
    branch_pipe: HotWaterPipe,
    circulation_length: f64,
    unconditioned_pipe: HotWaterPipe,
    unconditioned_circulation_length: f64,
    transmissivity: LinearTransmissivity,
    tap_flow: f64,
}

impl HotWaterDistribution {
    pub fn new(
        lengths: &PipeLengths,
        transmissivity: LinearTransmissivity,
        internal_diameter_mm: f64,
        tap_flow: f64,
    ) -> Self {
        Self {
            branch_pipe: HotWaterPipe::new(lengths.dhw_distribution, internal_diameter_mm),
            circulation_length: lengths.dhw_circulation,
            unconditioned_pipe: HotWaterPipe::new(
                lengths.dhw_heating_distribution,
                internal_diameter_mm,
            ),
            unconditioned_circulation_length: lengths.dhw_heating_circulation,
            transmissivity,
            tap_flow,
        }
    }

    /// Arguments:
    /// * `dhw_power` - hot water demand of the hour, in W
    /// * `dhw_power_peak` - annual peak hot water demand, in W
    /// * `temp_hot` - hot water supply temperature, in deg C
    pub fn losses(
        &self,
        dhw_power: f64,
        dhw_power_peak: f64,
        temp_hot: f64,
        temp_air: f64,
        temp_ext: f64,
    ) -> HotWaterPipeLosses {
        if dhw_power <= 0. || dhw_power_peak <= 0. {
            return HotWaterPipeLosses::default();
        }
        let load_ratio = dhw_power / dhw_power_peak;
        let temp_amb_unconditioned = temp_unconditioned(temp_air, temp_ext);
        let y_r = self.transmissivity.dhw_recoverable;
        let y_nr = self.transmissivity.dhw_non_recoverable;

        let recoverable = circulation_loss(
            temp_hot,
            temp_air,
            self.circulation_length,
            y_r,
            load_ratio,
        ) + self
            .branch_pipe
            .tapping_loss(dhw_power, temp_hot, temp_air, y_r, self.tap_flow);

        let non_recoverable = circulation_loss(
            temp_hot,
            temp_amb_unconditioned,
            self.unconditioned_circulation_length,
            y_nr,
            load_ratio,
        ) + self.unconditioned_pipe.tapping_loss(
            dhw_power,
            temp_hot,
            temp_amb_unconditioned,
            y_nr,
            self.tap_flow,
        );

        HotWaterPipeLosses {
            recoverable,
            non_recoverable,
        }
    }
}
