// Internal heat and moisture gains from occupants, lighting, appliances and processes.

use crate::core::units::SECONDS_PER_HOUR;

/// Fraction of lighting, appliance and process electricity released as sensible heat in the
/// zone
pub const ELECTRICITY_TO_HEAT_FRACTION: f64 = 0.9;
/// Heat rejected by servers into the zone per unit of their electricity
pub const DATA_CENTRE_HEAT_FRACTION: f64 = 0.9;
/// Coefficient of performance of the refrigeration plant
pub const REFRIGERATION_COP: f64 = 4.;
const GRAMS_PER_KILOGRAM: f64 = 1000.;

/// Hourly internal loads of a zone. Electrical series (lighting, appliances, process, data
/// centre and refrigeration) are in W, occupancy in persons.
#[derive(Clone, Debug, Default)]
pub struct InternalGains {
    pub people: Vec<f64>,
    pub lighting: Vec<f64>,
    pub appliances: Vec<f64>,
    pub process: Vec<f64>,
    pub data_centre: Vec<f64>,
    pub refrigeration: Vec<f64>,
    /// Sensible heat emitted per person, in W
    pub sensible_per_person: f64,
    /// Moisture emitted per person, in g/h
    pub moisture_per_person: f64,
}

fn value_at(series: &[f64], hour: usize) -> f64 {
    series.get(hour).copied().unwrap_or(0.)
}

impl InternalGains {
    /// Total internal sensible gain I_int_sen for the hour, in W
    pub fn sensible_gain(&self, hour: usize) -> f64 {
        value_at(&self.people, hour) * self.sensible_per_person
            + ELECTRICITY_TO_HEAT_FRACTION
                * (self.electricity(hour) + self.process_electricity(hour))
            + self.data_centre_cooling(hour)
            - self.refrigeration_cooling(hour)
    }

    /// Internal moisture gain for the hour, in kg/s
    pub fn moisture_gain(&self, hour: usize) -> f64 {
        value_at(&self.people, hour) * self.moisture_per_person
            / (GRAMS_PER_KILOGRAM * SECONDS_PER_HOUR as f64)
    }

    /// Electricity for lighting and appliances for the hour, in W
    pub fn electricity(&self, hour: usize) -> f64 {
        value_at(&self.lighting, hour) + value_at(&self.appliances, hour)
    }

    pub fn process_electricity(&self, hour: usize) -> f64 {
        value_at(&self.process, hour)
    }

    pub fn data_centre_electricity(&self, hour: usize) -> f64 {
        value_at(&self.data_centre, hour)
    }

    /// Heat of the servers to be removed by data centre cooling, in W
    pub fn data_centre_cooling(&self, hour: usize) -> f64 {
        DATA_CENTRE_HEAT_FRACTION * self.data_centre_electricity(hour)
    }

    /// Heat extracted by the refrigeration plant, in W
    pub fn refrigeration_cooling(&self, hour: usize) -> f64 {
        REFRIGERATION_COP * value_at(&self.refrigeration, hour)
    }
}
