#![allow(clippy::too_many_arguments)]

pub mod annual_summary;
pub mod core;
pub mod corpus;
pub mod errors;
pub mod external_conditions;
pub mod input;
pub mod output;
pub mod read_weather_file;
pub mod simulation_time;

use crate::corpus::{BuildingResults, BuildingSimulation};
use crate::errors::DemandError;
use crate::external_conditions::ExternalConditions;
use crate::input::ingest_input;
use crate::output::{write_hourly_results, write_total_demand, Output};
use crate::read_weather_file::WeatherFileData;
use anyhow::bail;
use rayon::prelude::*;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// Results of a project: one entry per building, in input order
pub type RunResults = Vec<Result<BuildingResults, DemandError>>;

/// Simulate every building of a project. Buildings run in parallel; each fails on its own
/// without stopping the others. Buildings not yet started when `cancel` is raised are reported
/// as cancelled.
pub fn simulate_project(
    input: impl Read,
    weather_file: Option<WeatherFileData>,
    cancel: &AtomicBool,
) -> anyhow::Result<RunResults> {
    let input = ingest_input(input)?;
    let external = ExternalConditions::new(input.external_conditions.as_ref(), weather_file)?;
    let simulation_time = input.simulation_time;
    info!(
        "simulating {} buildings over {} hours",
        input.buildings.len(),
        simulation_time.total_steps()
    );

    Ok(input
        .buildings
        .into_par_iter()
        .map(|building| {
            if cancel.load(Ordering::Relaxed) {
                return Err(DemandError::Cancelled(building.name));
            }
            BuildingSimulation::from_input(&building, &input.settings)
                .and_then(|simulation| simulation.run(&external, &simulation_time))
                .map_err(|e| DemandError::configuration(&building.name, e))
        })
        .collect())
}

/// Simulate a project and write an hourly table per building plus the annual summary.
/// Outputs of all successful buildings are written before an error is returned for any
/// building that failed.
pub fn run_project(
    input: impl Read,
    output: impl Output,
    weather_file: Option<WeatherFileData>,
    cancel: &AtomicBool,
) -> anyhow::Result<()> {
    let results = simulate_project(input, weather_file, cancel)?;

    let (succeeded, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let succeeded: Vec<BuildingResults> = succeeded.into_iter().flatten().collect();
    let failed: Vec<DemandError> = failed.into_iter().filter_map(Result::err).collect();

    if !output.is_noop() {
        for building in &succeeded {
            write_hourly_results(&output, building)?;
        }
        write_total_demand(&output, &succeeded)?;
    }

    for failure in &failed {
        error!("{failure}");
    }
    if !failed.is_empty() {
        bail!(
            "{} of {} buildings failed: {}",
            failed.len(),
            failed.len() + succeeded.len(),
            failed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        );
    }
    info!("simulated {} buildings", succeeded.len());

    Ok(())
}
