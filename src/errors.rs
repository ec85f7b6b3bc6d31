use std::fmt::Display;
use thiserror::Error;

/// Error for a single building's run, reported per building so that a batch can complete
/// partially.
#[derive(Debug, Error)]
pub enum DemandError {
    #[error("Invalid configuration for building {building}: {source}")]
    Configuration {
        building: String,
        #[source]
        source: ConfigurationError,
    },
    #[error("Building {0} was not simulated because the run was cancelled")]
    Cancelled(String),
}

impl DemandError {
    pub(crate) fn configuration(building: &str, source: ConfigurationError) -> Self {
        Self::Configuration {
            building: building.to_string(),
            source,
        }
    }
}

/// Fatal, non-retried problems with a building's description.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Non-physical conductance network: opaque conductance {h_tr_op} W/K must be positive and below the mass-to-surface conductance {h_tr_ms} W/K")]
    DegenerateConductance { h_tr_op: f64, h_tr_ms: f64 },
    #[error("Unknown {service} system type code '{code}'")]
    UnknownSystemType { service: &'static str, code: String },
    #[error("Hourly series '{name}' has {actual} values, expected {expected}")]
    SeriesLengthMismatch {
        name: String,
        actual: usize,
        expected: usize,
    },
    #[error("{0}")]
    InvalidValue(String),
}

/// Raised when a terminal-unit solver cannot find an operating point within its iteration
/// budget, even after falling back to a bounded bracketing search.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("Terminal unit solver did not converge for a load of {power} W")]
pub struct CoilSolverDivergence {
    pub power: f64,
}

/// A legacy input lacked an optional field, which was replaced with a documented default.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("Input '{column}' was not provided, using default value {default}")]
pub struct MissingInputColumn {
    pub column: String,
    pub default: String,
}

impl MissingInputColumn {
    pub(crate) fn new(column: &str, default: impl Display) -> Self {
        Self {
            column: column.to_string(),
            default: default.to_string(),
        }
    }
}

/// The peak load of a service cannot be delivered at the design temperatures of its terminal
/// unit. The unit is sized on a relaxed design point instead.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{service} terminal unit design is unattainable: {reason}")]
pub struct InfeasibleDesign {
    pub service: String,
    pub reason: String,
}

/// A problem recovered from while simulating a building, listed with its results
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimulationWarning {
    #[error(transparent)]
    MissingInput(#[from] MissingInputColumn),
    #[error(transparent)]
    InfeasibleDesign(#[from] InfeasibleDesign),
    #[error("Terminal unit solver diverged in {hours} hours")]
    SolverDiverged { hours: usize },
    #[error("Hot water tank temperature integration failed in {hours} hours")]
    TankIntegration { hours: usize },
}
