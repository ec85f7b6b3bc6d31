// Moisture balance of an air-handling unit. The supply air is humidified or dried so that the
// zone stays between 30 % and 70 % relative humidity, and the latent power of doing so is
// reported alongside the sensible load.

use crate::core::heating_systems::air_handling_coil::temp_supply_air;
use crate::core::heating_systems::common::Service;

/// Latent heat of vaporisation of water, in J/kg
pub const LATENT_HEAT_VAPORISATION: f64 = 2_257_000.;
pub const MIN_ZONE_RELATIVE_HUMIDITY: f64 = 30.;
pub const MAX_ZONE_RELATIVE_HUMIDITY: f64 = 70.;
// in Pa
const ATMOSPHERIC_PRESSURE: f64 = 100_000.;

/// Saturation vapour pressure over water, in Pa
fn saturation_pressure(temp: f64) -> f64 {
    610.78 * (temp / (temp + 238.3) * 17.2694).exp()
}

/// Humidity ratio of moist air, in kg of water per kg of dry air
///
/// Arguments:
/// * `temp` - dry bulb temperature, in deg C
/// * `relative_humidity` - in %
pub fn humidity_ratio(temp: f64, relative_humidity: f64) -> f64 {
    let vapour_pressure = relative_humidity / 100. * saturation_pressure(temp);
    0.62 * vapour_pressure / (ATMOSPHERIC_PRESSURE - vapour_pressure)
}

/// Conditions seen by the air-handling unit in one hour
#[derive(Clone, Copy, Debug)]
pub struct UnitHour {
    pub temp_ext: f64,
    /// Outdoor relative humidity, in %
    pub relative_humidity_ext: f64,
    pub temp_zone: f64,
    /// Moisture released in the zone, in kg/s
    pub moisture_gain: f64,
    /// Supply air mass flow, in kg/s
    pub air_mass_flow: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct AirHandlingUnit {
    heat_recovery_efficiency: f64,
}

impl AirHandlingUnit {
    pub fn new(heat_recovery_efficiency: f64) -> Self {
        Self {
            heat_recovery_efficiency,
        }
    }

    /// Latent power added to the supply air while the unit runs for `service`, in W. Positive
    /// when humidifying, negative when drying.
    pub fn latent_load(&self, service: Service, hour: &UnitHour) -> f64 {
        if !(hour.air_mass_flow > 0.) {
            return 0.;
        }
        let temp_recovered =
            hour.temp_ext + self.heat_recovery_efficiency * (hour.temp_zone - hour.temp_ext);
        // outdoor air after heat recovery, condensing if it is cooled past saturation
        let w_recovered = humidity_ratio(hour.temp_ext, hour.relative_humidity_ext)
            .min(humidity_ratio(temp_recovered, 100.));
        let w_zone = w_recovered + hour.moisture_gain / hour.air_mass_flow;

        let w_min = humidity_ratio(hour.temp_zone, MIN_ZONE_RELATIVE_HUMIDITY);
        let w_max = humidity_ratio(hour.temp_zone, MAX_ZONE_RELATIVE_HUMIDITY);
        let w_supply_saturated = humidity_ratio(temp_supply_air(service), 100.);
        let humidified = w_min - w_zone + w_recovered;
        let dried = (w_max - w_zone + w_recovered).min(w_supply_saturated).max(0.);

        let w_supply = match service {
            Service::Heating if w_zone < w_min => humidified,
            Service::Heating if w_zone > w_max => dried,
            Service::Heating => w_recovered,
            Service::Cooling if w_zone > w_max => dried,
            Service::Cooling if w_zone < w_min => humidified,
            Service::Cooling => w_recovered.min(w_supply_saturated),
        };

        LATENT_HEAT_VAPORISATION * hour.air_mass_flow * (w_supply - w_recovered)
    }

    /// Humidification by the heating unit, Qhs_lat, in W
    pub fn humidification(&self, hour: &UnitHour) -> f64 {
        self.latent_load(Service::Heating, hour).max(0.)
    }

    /// Dehumidification by the cooling unit, Qcs_lat, in W (negative)
    pub fn dehumidification(&self, hour: &UnitHour) -> f64 {
        self.latent_load(Service::Cooling, hour).min(0.)
    }
}
