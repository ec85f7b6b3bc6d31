use crate::errors::ConfigurationError;
use strum::Display;

/// Direction of heat delivery of a terminal unit
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Service {
    Heating,
    Cooling,
}

/// Heat-exchange relation used to find the operating point of a terminal unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalUnitFamily {
    Radiator,
    Panel,
    AirCoil,
}

/// Design water temperatures of a terminal unit at peak load, in deg C
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesignTemperatures {
    pub temp_supply: f64,
    pub temp_return: f64,
}

/// Space heating terminal units, coded "T0" to "T4"
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq)]
pub enum HeatingSystemType {
    #[default]
    None,
    Radiator,
    LowTemperatureRadiator,
    AirCoil,
    FloorPanel,
}

impl HeatingSystemType {
    pub fn from_code(code: &str) -> Result<Self, ConfigurationError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "T0" => Ok(Self::None),
            "T1" => Ok(Self::Radiator),
            "T2" => Ok(Self::LowTemperatureRadiator),
            "T3" => Ok(Self::AirCoil),
            "T4" => Ok(Self::FloorPanel),
            _ => Err(ConfigurationError::UnknownSystemType {
                service: "heating",
                code: code.to_string(),
            }),
        }
    }

    pub fn family(&self) -> Option<TerminalUnitFamily> {
        match self {
            Self::None => None,
            Self::Radiator | Self::LowTemperatureRadiator => Some(TerminalUnitFamily::Radiator),
            Self::AirCoil => Some(TerminalUnitFamily::AirCoil),
            Self::FloorPanel => Some(TerminalUnitFamily::Panel),
        }
    }

    /// Shift of the heating set-point representing emission and control losses, in K
    pub fn setpoint_correction(&self) -> f64 {
        match self {
            Self::None => 0.,
            Self::Radiator | Self::FloorPanel => 1.7,
            Self::LowTemperatureRadiator => 1.2,
            Self::AirCoil => 1.5,
        }
    }

    /// Exponent of the characteristic equation beyond linear (n - 1 in EN 442 terms)
    pub fn emitter_exponent(&self) -> f64 {
        match self {
            Self::None | Self::AirCoil => 0.,
            Self::Radiator | Self::LowTemperatureRadiator => 0.3,
            Self::FloorPanel => 0.2,
        }
    }

    pub fn default_design_temperatures(&self) -> DesignTemperatures {
        let (temp_supply, temp_return) = match self {
            Self::None | Self::Radiator => (90., 70.),
            Self::LowTemperatureRadiator => (70., 55.),
            Self::AirCoil => (80., 60.),
            Self::FloorPanel => (40., 35.),
        };
        DesignTemperatures {
            temp_supply,
            temp_return,
        }
    }
}

/// Space cooling terminal units, coded "T0" and "T3" to "T5"
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq)]
pub enum CoolingSystemType {
    #[default]
    None,
    AirCoil,
    CeilingPanel,
    FloorPanel,
}

impl CoolingSystemType {
    pub fn from_code(code: &str) -> Result<Self, ConfigurationError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "T0" => Ok(Self::None),
            "T3" => Ok(Self::AirCoil),
            "T4" => Ok(Self::CeilingPanel),
            "T5" => Ok(Self::FloorPanel),
            _ => Err(ConfigurationError::UnknownSystemType {
                service: "cooling",
                code: code.to_string(),
            }),
        }
    }

    pub fn family(&self) -> Option<TerminalUnitFamily> {
        match self {
            Self::None => None,
            Self::AirCoil => Some(TerminalUnitFamily::AirCoil),
            Self::CeilingPanel | Self::FloorPanel => Some(TerminalUnitFamily::Panel),
        }
    }

    /// Shift of the cooling set-point representing emission and control losses, in K
    pub fn setpoint_correction(&self) -> f64 {
        match self {
            Self::None => 0.,
            Self::AirCoil => -1.0,
            Self::CeilingPanel => -1.2,
            Self::FloorPanel => -1.6,
        }
    }

    pub fn emitter_exponent(&self) -> f64 {
        match self {
            Self::None | Self::AirCoil => 0.,
            Self::CeilingPanel | Self::FloorPanel => 0.2,
        }
    }

    pub fn default_design_temperatures(&self) -> DesignTemperatures {
        let (temp_supply, temp_return) = match self {
            Self::None | Self::AirCoil => (7., 12.),
            Self::CeilingPanel => (16., 19.),
            Self::FloorPanel => (18., 21.),
        };
        DesignTemperatures {
            temp_supply,
            temp_return,
        }
    }
}
