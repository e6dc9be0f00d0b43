use chrono::NaiveDateTime;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::info;

use crate::core::controls::hysteresis_control::{HysteresisControl, ThresholdComparison};
use crate::core::heat_balance::HeatBalance;
use crate::core::heating_systems::heat_pump::CopModel;
use crate::core::metrics::{aggregate_metrics, MetricsSeries, MetricsSummary};
use crate::core::solvers::{integrate_tank_temperature, Trajectory};
use crate::core::space_heat_demand::building_heat_load::HeatLoadPoint;
use crate::core::water_heat_demand::hot_water_demand::{
    HotWaterDemandGenerator, HotWaterDemandProfile,
};
use crate::errors::{DataError, SimulationError};
use crate::external_conditions::{AmbientSeries, AmbientSeriesProvider, Location};
use crate::input::{CopReferenceDataset, RunOptions, SimulationConfig};
use crate::simulation_time::SimulationWindow;

/// Everything produced by one simulation run. Each run builds its own result from scratch.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub window: SimulationWindow,
    pub ambient: AmbientSeries,
    pub cop_model: CopModel,
    pub trajectory: Trajectory,
    pub metrics: MetricsSeries,
    pub summary: MetricsSummary,
    /// Building heat load at each hourly ambient temperature
    pub heat_load_series: Vec<HeatLoadPoint>,
    pub hot_water_demand: Option<HotWaterDemandProfile>,
}

/// Simulate the tank over the day from `start` to `end`.
///
/// The configuration, window and run options are all checked before ambient temperatures are
/// fetched or the COP model is fitted, and both of those complete before integration starts.
pub fn run_simulation(
    config: &SimulationConfig,
    start: NaiveDateTime,
    end: NaiveDateTime,
    options: &RunOptions,
    location: &Location,
    ambient_provider: &dyn AmbientSeriesProvider,
    cop_data: &CopReferenceDataset,
) -> Result<RunResult, SimulationError> {
    config.validate()?;
    let window = SimulationWindow::new(start, end)?;
    let max_step = window.max_step(options.steps_per_hour)?;
    let hot_water_generator = options
        .include_hot_water_demand
        .then(|| HotWaterDemandGenerator::new(&options.hot_water_demand))
        .transpose()?;

    let temperatures = ambient_provider
        .fetch_hourly_temperatures(location, window.start(), window.end())
        .map_err(DataError::AmbientSeriesUnavailable)?;
    let ambient = AmbientSeries::for_window(temperatures, &window)?;

    let cop_model =
        CopModel::from_reference_data(&cop_data.data, config.fixed_condenser_temperature)
            .map_err(DataError::from)?;
    info!(
        "Fitted COP(ΔT) = {:.4} + {:.4} / ΔT to {} reference samples",
        cop_model.a(),
        cop_model.b(),
        cop_model.reference_delta_t().len()
    );

    let hot_water_demand = hot_water_generator.map(|generator| {
        let mut rng = Pcg64::seed_from_u64(options.hot_water_demand.seed);
        generator.generate(config.building_type, &mut rng)
    });

    let heat_balance = HeatBalance::new(config, &cop_model, &ambient, hot_water_demand.as_ref());

    info!(
        "Simulating {} building from {} to {}",
        config.building_type,
        window.start(),
        window.end()
    );
    let trajectory = integrate_tank_temperature(
        &heat_balance,
        HysteresisControl::new(
            config.on_threshold,
            config.off_threshold,
            ThresholdComparison::Raw,
        ),
        options.controller_update,
        config.initial_tank_temperature,
        window.total_seconds(),
        max_step,
        &options.solver,
    )?;

    let (metrics, summary) = aggregate_metrics(
        &trajectory,
        &heat_balance,
        config.on_threshold,
        config.off_threshold,
        options.steps_per_hour,
        hot_water_demand.as_ref(),
    );
    info!(
        "Simulation complete: {} time points, {:.3} kWh used at a mean COP of {:.3}",
        trajectory.len(),
        summary.total_energy_kwh,
        summary.mean_cop
    );

    let heat_load_series = config
        .building_envelope()
        .heat_load_series(ambient.values());

    Ok(RunResult {
        window,
        ambient,
        cop_model,
        trajectory,
        metrics,
        summary,
        heat_load_series,
        hot_water_demand,
    })
}
