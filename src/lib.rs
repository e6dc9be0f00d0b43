#![allow(clippy::too_many_arguments)]

pub mod core;
pub mod errors;
pub mod external_conditions;
pub mod input;
pub mod output;
pub mod read_weather_file;
pub mod simulation;
pub mod simulation_time;
mod statistics;


pub use crate::errors::{ConfigurationError, DataError, SimulationError};
pub use crate::simulation::{run_simulation, RunResult};

use crate::external_conditions::{AmbientSeriesProvider, Location};
use crate::input::{ingest_config, ingest_cop_dataset, InputFormat, RunOptions};
use crate::output::{write_run_results, Output};
use chrono::NaiveDateTime;
use std::io::Read;

/// Read a simulation configuration and COP reference dataset, run the simulation and write its
/// results to `output`.
pub fn run_project(
    config_input: impl Read,
    config_format: InputFormat,
    cop_data_input: impl Read,
    cop_data_format: InputFormat,
    ambient_provider: &dyn AmbientSeriesProvider,
    location: &Location,
    start: NaiveDateTime,
    end: NaiveDateTime,
    options: &RunOptions,
    output: &impl Output,
) -> Result<RunResult, anyhow::Error> {
    let config = ingest_config(config_input, config_format)?.finalize()?;
    let cop_data = ingest_cop_dataset(cop_data_input, cop_data_format)?;

    let result = run_simulation(
        &config,
        start,
        end,
        options,
        location,
        ambient_provider,
        &cop_data,
    )?;

    write_run_results(output, &result)?;

    Ok(result)
}
