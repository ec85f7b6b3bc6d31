use thiserror::Error;

pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const WATT_HOURS_PER_MEGAWATT_HOUR: u32 = 1_000_000;
pub const LITRES_PER_CUBIC_METRE: u32 = 1_000;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_YEAR: usize = 8_760;
pub const MILLIMETRES_IN_METRE: u32 = 1_000;

/// Stefan-Boltzmann constant, in W / (m2.K4)
pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;

const ABSOLUTE_ZERO_CELSIUS: f64 = -273.15;

pub fn celsius_to_kelvin(temp_c: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_c < ABSOLUTE_ZERO_CELSIUS {
        Err(BelowAbsoluteZeroError::from_c(temp_c))
    } else {
        Ok(temp_c - ABSOLUTE_ZERO_CELSIUS)
    }
}

pub fn kelvin_to_celsius(temp_k: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_k < 0.0 {
        Err(BelowAbsoluteZeroError::from_k(temp_k))
    } else {
        Ok(temp_k + ABSOLUTE_ZERO_CELSIUS)
    }
}

/// Energy in kWh delivered by a constant power (in W) over one hourly step
pub fn hourly_watts_to_kwh(power: f64) -> f64 {
    power / WATTS_PER_KILOWATT as f64
}

#[derive(Debug, Error)]
#[error("A temperature of {k}ºK/{}ºC was encountered, which is less than absolute zero", k - 273.15)]
pub struct BelowAbsoluteZeroError {
    k: f64,
}

impl BelowAbsoluteZeroError {
    fn from_k(k: f64) -> Self {
        Self { k }
    }

    fn from_c(c: f64) -> Self {
        Self { k: c + 273.15 }
    }
}
