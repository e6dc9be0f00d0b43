use serde::Serialize;
use tracing::warn;

use crate::core::controls::hysteresis_control::{HysteresisControl, PumpState, ThresholdComparison};
use crate::core::heat_balance::HeatBalance;
use crate::core::solvers::Trajectory;
use crate::core::units::{watt_samples_to_kwh, WATTS_PER_KILOWATT};
use crate::core::water_heat_demand::hot_water_demand::HotWaterDemandProfile;
use crate::statistics::{max, mean, min};

/// Time series recomputed at each point of a trajectory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricsSeries {
    pub pump_status: Vec<u8>,
    /// W
    pub heat_transfer: Vec<f64>,
    /// W
    pub heat_loss: Vec<f64>,
    pub cop: Vec<f64>,
    /// Electrical power drawn by the heat pump, W
    pub energy: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub average_energy_kw: f64,
    pub total_energy_kwh: f64,
    pub mean_cop: f64,
    pub total_heat_loss_kwh: f64,
    /// Only present when hot water demand was included in the run
    pub total_hot_water_kwh: Option<f64>,
    /// Number of times the pump switched on
    pub pump_cycles: usize,
    pub max_tank_temperature: f64,
    pub min_tank_temperature: f64,
}

/// Replays a trajectory to reconstruct what the heat pump was doing at each point.
///
/// A fresh controller is used, comparing rounded tank temperatures against floored thresholds,
/// so pump status here can differ from the integration within a kelvin of a threshold.
///
/// The energy totals treat every trajectory point as one of `steps_per_hour` samples an hour,
/// although the integrator's time points are not evenly spaced.
pub fn aggregate_metrics(
    trajectory: &Trajectory,
    heat_balance: &HeatBalance,
    on_threshold: f64,
    off_threshold: f64,
    steps_per_hour: u32,
    hot_water_demand: Option<&HotWaterDemandProfile>,
) -> (MetricsSeries, MetricsSummary) {
    let mut control =
        HysteresisControl::new(on_threshold, off_threshold, ThresholdComparison::Rounded);
    let mut series = MetricsSeries::default();
    let mut non_positive_cop_count = 0;

    for (t, temp_tank) in trajectory.iter() {
        let temp_ambient = heat_balance.temp_ambient(t);
        let pump_state = control.update(temp_tank);
        let q_transfer = heat_balance.heat_transfer(pump_state, temp_tank, temp_ambient);
        let q_loss = heat_balance.heat_loss(temp_tank, temp_ambient);
        let cop = heat_balance.cop(temp_ambient);

        let energy = if cop > 0. {
            q_transfer.max(0.) / cop
        } else {
            non_positive_cop_count += 1;
            0.
        };

        series.pump_status.push(pump_state.status());
        series.heat_transfer.push(q_transfer);
        series.heat_loss.push(q_loss);
        series.cop.push(cop);
        series.energy.push(energy);
    }

    if non_positive_cop_count > 0 {
        warn!(
            "COP was zero or negative at {non_positive_cop_count} of {} time points; no energy use was recorded for them",
            trajectory.len()
        );
    }

    let pump_cycles = series
        .pump_status
        .windows(2)
        .filter(|pair| pair[0] == PumpState::Off.status() && pair[1] == PumpState::On.status())
        .count()
        + usize::from(series.pump_status.first() == Some(&PumpState::On.status()));

    let summary = MetricsSummary {
        average_energy_kw: mean(&series.energy) / WATTS_PER_KILOWATT as f64,
        total_energy_kwh: watt_samples_to_kwh(&series.energy, steps_per_hour as f64),
        mean_cop: mean(&series.cop),
        total_heat_loss_kwh: watt_samples_to_kwh(&series.heat_loss, steps_per_hour as f64),
        total_hot_water_kwh: hot_water_demand.map(HotWaterDemandProfile::total_kwh),
        pump_cycles,
        max_tank_temperature: max(trajectory.temperatures()).unwrap_or(f64::NAN),
        min_tank_temperature: min(trajectory.temperatures()).unwrap_or(f64::NAN),
    };

    (series, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::heating_systems::heat_pump::{cop_function, CopModel};
    use crate::core::water_heat_demand::hot_water_demand::BuildingType;
    use crate::external_conditions::AmbientSeries;
    use crate::input::SimulationConfig;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const ON_THRESHOLD: f64 = 330.;
    const OFF_THRESHOLD: f64 = 333.15;

    #[fixture]
    fn config() -> SimulationConfig {
        SimulationConfig {
            wall_area: 100.,
            wall_u_value: 0.3,
            roof_area: 80.,
            roof_u_value: 0.2,
            indoor_setpoint: 293.15,
            mass_of_water: 200.,
            specific_heat_capacity: 4186.,
            heat_loss_coefficient: 5.,
            heat_transfer_coefficient: 300.,
            heat_transfer_area: 0.5,
            fixed_condenser_temperature: 338.15,
            on_threshold: ON_THRESHOLD,
            off_threshold: OFF_THRESHOLD,
            initial_tank_temperature: 325.,
            tank_length: 1.,
            pump_power: 2_000.,
            building_type: BuildingType::Office,
        }
    }

    fn cop_model(a: f64, b: f64) -> CopModel {
        let delta_t = vec![40., 50., 60., 70.];
        let cop = delta_t.iter().map(|dt| cop_function(*dt, a, b)).collect();
        CopModel::fit(delta_t, cop).unwrap()
    }

    #[fixture]
    fn ambient() -> AmbientSeries {
        AmbientSeries::new(vec![283.15; 24]).unwrap()
    }

    #[fixture]
    fn trajectory() -> Trajectory {
        Trajectory::from_points([
            (0., 325.),
            (600., 330.4),
            (1_200., 332.6),
            (1_800., 331.),
            (2_400., 329.6),
        ])
    }

    #[rstest]
    fn should_replay_pump_status_with_rounded_comparison(
        config: SimulationConfig,
        ambient: AmbientSeries,
        trajectory: Trajectory,
    ) {
        let cop_model = cop_model(3., 150.);
        let balance = HeatBalance::new(&config, &cop_model, &ambient, None);

        let (series, summary) =
            aggregate_metrics(&trajectory, &balance, ON_THRESHOLD, OFF_THRESHOLD, 30, None);

        // 332.6 rounds to 333, reaching the floored off threshold
        assert_eq!(series.pump_status, vec![1, 1, 0, 0, 1]);
        assert_eq!(summary.pump_cycles, 2);
        assert_eq!(series.heat_transfer[2], 0.);
        assert_eq!(series.energy[3], 0.);
        assert_eq!(summary.max_tank_temperature, 332.6);
        assert_eq!(summary.min_tank_temperature, 325.);
        assert_eq!(summary.total_hot_water_kwh, None);
    }

    #[rstest]
    fn should_calc_energy_from_heat_transfer_and_cop(
        config: SimulationConfig,
        ambient: AmbientSeries,
        trajectory: Trajectory,
    ) {
        let cop_model = cop_model(3., 150.);
        let balance = HeatBalance::new(&config, &cop_model, &ambient, None);

        let (series, summary) =
            aggregate_metrics(&trajectory, &balance, ON_THRESHOLD, OFF_THRESHOLD, 30, None);

        let cop = cop_function(55., 3., 150.);
        assert_relative_eq!(series.cop[0], cop, max_relative = 1e-6);
        assert_relative_eq!(series.heat_transfer[0], 150. * 13.15, max_relative = 1e-9);
        assert_relative_eq!(series.energy[0], 150. * 13.15 / cop, max_relative = 1e-6);
        for (on, q_transfer) in series.pump_status.iter().zip(&series.heat_transfer) {
            if *on == 1 {
                assert!(*q_transfer <= cop * 2_000. + 1e-6);
            }
        }

        let energy_sum = series.energy.iter().sum::<f64>();
        assert_relative_eq!(summary.total_energy_kwh, energy_sum / 30_000., max_relative = 1e-12);
        assert_relative_eq!(summary.average_energy_kw, energy_sum / 5_000., max_relative = 1e-12);
        assert_relative_eq!(summary.mean_cop, cop, max_relative = 1e-6);
        let loss_sum = series.heat_loss.iter().sum::<f64>();
        assert_relative_eq!(summary.total_heat_loss_kwh, loss_sum / 30_000., max_relative = 1e-12);
    }

    #[rstest]
    fn should_record_no_energy_when_cop_is_not_positive(
        config: SimulationConfig,
        ambient: AmbientSeries,
        trajectory: Trajectory,
    ) {
        // COP is negative across the whole operating range
        let cop_model = cop_model(-2., 10.);
        let balance = HeatBalance::new(&config, &cop_model, &ambient, None);

        let (series, summary) =
            aggregate_metrics(&trajectory, &balance, ON_THRESHOLD, OFF_THRESHOLD, 30, None);

        assert!(series.cop.iter().all(|cop| *cop < 0.));
        assert!(series.energy.iter().all(|energy| *energy == 0.));
        assert_eq!(summary.total_energy_kwh, 0.);
    }

    #[rstest]
    fn should_total_hot_water_demand_when_included(
        config: SimulationConfig,
        ambient: AmbientSeries,
        trajectory: Trajectory,
    ) {
        let cop_model = cop_model(3., 150.);
        let profile = HotWaterDemandProfile::from_values(vec![500.; 1440]);
        let balance = HeatBalance::new(&config, &cop_model, &ambient, Some(&profile));

        let (_, summary) = aggregate_metrics(
            &trajectory,
            &balance,
            ON_THRESHOLD,
            OFF_THRESHOLD,
            30,
            Some(&profile),
        );

        assert_relative_eq!(summary.total_hot_water_kwh.unwrap(), 12.);
    }
}
