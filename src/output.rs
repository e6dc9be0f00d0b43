use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::anyhow;
use csv::WriterBuilder;
use formatx::formatx;
use tracing::info;

use crate::core::units::{kelvin_to_celsius, SECONDS_PER_HOUR};
use crate::simulation::RunResult;

const FIT_CURVE_POINTS: usize = 200;

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    /// `file_template` names each file, with `{}` replaced by the kind of output it holds,
    /// e.g. `"results_{}.csv"`.
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        let file_name = formatx!(&self.file_template, location_key)
            .map_err(|e| anyhow!("Invalid output file template: {e:?}"))?;
        Ok(BufWriter::new(File::create(
            self.directory_path.join(file_name),
        )?))
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Write every result of a run to the given output, one CSV file per kind of result.
pub fn write_run_results(output: &impl Output, result: &RunResult) -> Result<(), anyhow::Error> {
    if output.is_noop() {
        return Ok(());
    }

    info!("writing out trajectory");
    write_trajectory(output.writer_for_location_key("trajectory")?, result)?;
    info!("writing out summary");
    write_summary(output.writer_for_location_key("summary")?, result)?;
    write_cop_fit(output.writer_for_location_key("cop_fit")?, result)?;
    write_heat_load(output.writer_for_location_key("heat_load")?, result)?;
    if result.hot_water_demand.is_some() {
        info!("writing out hot water demand");
        write_hot_water_demand(output.writer_for_location_key("hot_water_demand")?, result)?;
    }

    Ok(())
}

pub fn write_trajectory(writer: impl Write, result: &RunResult) -> Result<(), anyhow::Error> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record([
        "Time",
        "Time",
        "Tank temperature",
        "Tank temperature",
        "Pump status",
        "Heat transfer",
        "Heat loss",
        "COP",
        "Energy",
    ])?;
    writer.write_record([
        "[s]", "[h]", "[K]", "[degC]", "[on/off]", "[W]", "[W]", "[ratio]", "[W]",
    ])?;

    let metrics = &result.metrics;
    for (i, (t, temp_tank)) in result.trajectory.iter().enumerate() {
        writer.write_record([
            t.to_string(),
            (t / SECONDS_PER_HOUR as f64).to_string(),
            temp_tank.to_string(),
            kelvin_to_celsius(temp_tank)?.to_string(),
            metrics.pump_status[i].to_string(),
            metrics.heat_transfer[i].to_string(),
            metrics.heat_loss[i].to_string(),
            metrics.cop[i].to_string(),
            metrics.energy[i].to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_summary(writer: impl Write, result: &RunResult) -> Result<(), anyhow::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    let summary = &result.summary;

    writer.write_record(["Metric", "Value", "Unit"])?;
    let mut rows = vec![
        ("Average energy", summary.average_energy_kw, "kW"),
        ("Total energy", summary.total_energy_kwh, "kWh"),
        ("Mean COP", summary.mean_cop, "ratio"),
        ("Total heat loss", summary.total_heat_loss_kwh, "kWh"),
        ("Pump cycles", summary.pump_cycles as f64, "count"),
        ("Maximum tank temperature", summary.max_tank_temperature, "K"),
        ("Minimum tank temperature", summary.min_tank_temperature, "K"),
        ("COP coefficient A", result.cop_model.a(), "ratio"),
        ("COP coefficient B", result.cop_model.b(), "K"),
    ];
    if let Some(total_hot_water_kwh) = summary.total_hot_water_kwh {
        rows.push(("Total hot water energy", total_hot_water_kwh, "kWh"));
    }
    for (metric, value, unit) in rows {
        writer.write_record([metric, value.to_string().as_str(), unit])?;
    }

    writer.flush()?;
    Ok(())
}

/// The fitted COP curve alongside the reference samples it was fitted to.
pub fn write_cop_fit(writer: impl Write, result: &RunResult) -> Result<(), anyhow::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(["Series", "Temperature difference [K]", "COP"])?;
    let cop_model = &result.cop_model;
    for (delta_t, cop) in cop_model
        .reference_delta_t()
        .iter()
        .zip(cop_model.reference_cop())
    {
        writer.write_record([
            "reference".to_string(),
            delta_t.to_string(),
            cop.to_string(),
        ])?;
    }
    for (delta_t, cop) in cop_model.fit_curve(FIT_CURVE_POINTS) {
        writer.write_record(["fit".to_string(), delta_t.to_string(), cop.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_heat_load(writer: impl Write, result: &RunResult) -> Result<(), anyhow::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record([
        "Hour",
        "Ambient temperature [K]",
        "Temperature difference [K]",
        "Heat load [W]",
    ])?;
    for (hour, (temp_ambient, point)) in result
        .ambient
        .values()
        .iter()
        .zip(&result.heat_load_series)
        .enumerate()
    {
        writer.write_record([
            hour.to_string(),
            temp_ambient.to_string(),
            point.delta_t.to_string(),
            point.heat_load.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_hot_water_demand(writer: impl Write, result: &RunResult) -> Result<(), anyhow::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(["Time [h]", "Hot water demand [W]"])?;
    if let Some(profile) = &result.hot_water_demand {
        for (hour, demand) in profile.time_hours().iter().zip(profile.values()) {
            writer.write_record([hour.to_string(), demand.to_string()])?;
        }
    }

    writer.flush()?;
    Ok(())
}
