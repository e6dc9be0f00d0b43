extern crate tanksim;

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tanksim::core::solvers::ControllerUpdate;
use tanksim::external_conditions::{AmbientSeriesProvider, FixedAmbientSeries, Location};
use tanksim::input::{InputFormat, RunOptions};
use tanksim::output::FileOutput;
use tanksim::read_weather_file::EpwAmbientSeries;
use tanksim::run_project;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

const HOURS_OF_AMBIENT_DATA: usize = 24;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct TankSimArgs {
    /// Simulation parameters, as JSON or YAML
    config_file: String,
    /// Reference COP data, as JSON or YAML
    #[arg(long)]
    cop_data: String,
    #[command(flatten)]
    ambient: AmbientSource,
    /// Start of the simulated day, e.g. 2024-01-15T00:00:00
    #[arg(long, value_parser = parse_datetime)]
    start: NaiveDateTime,
    /// End of the simulated day, defaulting to 24 hours after the start
    #[arg(long, value_parser = parse_datetime)]
    end: Option<NaiveDateTime>,
    #[arg(long, default_value_t = false)]
    hot_water: bool,
    /// Seed for the hot water demand profile
    #[arg(long)]
    seed: Option<u64>,
    /// Only update the pump controller on accepted integration steps
    #[arg(long, default_value_t = false)]
    accepted_steps_only: bool,
    #[arg(long)]
    steps_per_hour: Option<u32>,
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<f64>,
    /// Directory for the result files, defaulting to the directory of the config file
    #[arg(long)]
    output_dir: Option<String>,
}

#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
struct AmbientSource {
    /// EnergyPlus weather file to take hourly ambient temperatures from
    #[arg(long, short)]
    weather: Option<String>,
    /// Constant ambient temperature in K
    #[arg(long)]
    ambient_k: Option<f64>,
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("could not parse '{value}' as a date and time"))
}

fn open(path: &str) -> anyhow::Result<BufReader<File>> {
    Ok(BufReader::new(
        File::open(path).with_context(|| format!("Could not open {path}"))?,
    ))
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = TankSimArgs::parse();

    let ambient_provider: Box<dyn AmbientSeriesProvider> = match args.ambient {
        AmbientSource {
            weather: Some(file),
            ambient_k: None,
        } => Box::new(
            EpwAmbientSeries::from_reader(open(&file)?)
                .with_context(|| format!("Could not parse the weather file {file}"))?,
        ),
        AmbientSource {
            weather: None,
            ambient_k: Some(temperature),
        } => Box::new(FixedAmbientSeries::constant(
            temperature,
            HOURS_OF_AMBIENT_DATA,
        )),
        _ => return Err(anyhow!("Exactly one of --weather or --ambient-k is needed")),
    };

    let default_location = Location::default();
    let location = Location {
        latitude: args.latitude.unwrap_or(default_location.latitude),
        longitude: args.longitude.unwrap_or(default_location.longitude),
    };

    let mut options = RunOptions {
        include_hot_water_demand: args.hot_water,
        ..Default::default()
    };
    if let Some(seed) = args.seed {
        options.hot_water_demand.seed = seed;
    }
    if let Some(steps_per_hour) = args.steps_per_hour {
        options.steps_per_hour = steps_per_hour;
    }
    if args.accepted_steps_only {
        options.controller_update = ControllerUpdate::AcceptedSteps;
    }

    let config_path = Path::new(args.config_file.as_str());
    let config_stem = config_path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("tanksim");
    let output_dir = match args.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let output = FileOutput::new(output_dir.clone(), format!("{config_stem}_{{}}.csv"));

    let end = args
        .end
        .unwrap_or(args.start + chrono::TimeDelta::hours(24));

    let result = run_project(
        open(&args.config_file)?,
        InputFormat::from_path(config_path),
        open(&args.cop_data)?,
        InputFormat::from_path(Path::new(args.cop_data.as_str())),
        ambient_provider.as_ref(),
        &location,
        args.start,
        end,
        &options,
        &output,
    )?;

    let summary = &result.summary;
    info!("Average energy: {:.3} kW", summary.average_energy_kw);
    info!("Total energy: {:.3} kWh", summary.total_energy_kwh);
    info!("Mean COP: {:.3}", summary.mean_cop);
    info!("Total heat loss: {:.3} kWh", summary.total_heat_loss_kwh);
    if let Some(total_hot_water_kwh) = summary.total_hot_water_kwh {
        info!("Total hot water energy: {:.3} kWh", total_hot_water_kwh);
    }
    info!("Results written to {}", output_dir.display());

    Ok(())
}
