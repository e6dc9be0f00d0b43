use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

use crate::core::heating_systems::storage_tank::TankGeometry;
use crate::core::solvers::{ControllerUpdate, SolverSettings};
use crate::core::space_heat_demand::building_heat_load::BuildingEnvelope;
use crate::core::water_heat_demand::hot_water_demand::{BuildingType, HotWaterDemandSettings};
use crate::errors::ConfigurationError;

/// Lowest fixed condenser temperature (60°C) at which the condenser can still heat the tank to its
/// off threshold.
pub const MIN_FIXED_CONDENSER_TEMPERATURE: f64 = 333.15;

const DEFAULT_TANK_LENGTH: f64 = 1.;
const DEFAULT_PUMP_POWER: f64 = 2_000.;
const DEFAULT_STEPS_PER_HOUR: u32 = 30;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// JSON for `.json` files, YAML for anything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(OsStr::to_str) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Yaml,
        }
    }
}

pub fn ingest_config(
    input: impl Read,
    format: InputFormat,
) -> Result<SimulationConfigInput, anyhow::Error> {
    deserialize_input(input, format)
}

pub fn ingest_cop_dataset(
    input: impl Read,
    format: InputFormat,
) -> Result<CopReferenceDataset, anyhow::Error> {
    deserialize_input(input, format)
}

fn deserialize_input<T: DeserializeOwned>(
    input: impl Read,
    format: InputFormat,
) -> Result<T, anyhow::Error> {
    Ok(match format {
        InputFormat::Json => serde_json::from_reader(input)?,
        InputFormat::Yaml => serde_yaml::from_reader(input)?,
    })
}

/// Simulation parameters as supplied by the caller, before checking that every parameter is present.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfigInput {
    /// m2
    #[validate(minimum = 0.)]
    pub wall_area: Option<f64>,
    /// W/m2K
    #[validate(minimum = 0.)]
    pub wall_u_value: Option<f64>,
    /// m2
    #[validate(minimum = 0.)]
    pub roof_area: Option<f64>,
    /// W/m2K
    #[validate(minimum = 0.)]
    pub roof_u_value: Option<f64>,
    /// K
    #[serde(alias = "indoor_setpoint_temperature_K")]
    pub indoor_setpoint: Option<f64>,
    /// kg
    pub mass_of_water: Option<f64>,
    /// J/kgK
    pub specific_heat_capacity: Option<f64>,
    /// W/m2K, per unit of tank surface area
    #[validate(minimum = 0.)]
    pub heat_loss_coefficient: Option<f64>,
    /// W/m2K
    #[serde(alias = "overall_heat_transfer_coefficient")]
    #[validate(minimum = 0.)]
    pub heat_transfer_coefficient: Option<f64>,
    /// m2
    #[validate(minimum = 0.)]
    pub heat_transfer_area: Option<f64>,
    /// K
    #[serde(alias = "fixed_condenser_temperature_K")]
    pub fixed_condenser_temperature: Option<f64>,
    /// K
    #[serde(alias = "on_temperature_threshold_K")]
    pub on_threshold: Option<f64>,
    /// K
    #[serde(alias = "off_temperature_threshold_K")]
    pub off_threshold: Option<f64>,
    /// K
    #[serde(alias = "initial_tank_temperature_K", alias = "initial_tank_temp")]
    pub initial_tank_temperature: Option<f64>,
    /// m
    #[validate(exclusive_minimum = 0.)]
    pub tank_length: Option<f64>,
    /// Electrical power of the heat pump, W
    #[validate(exclusive_minimum = 0.)]
    pub pump_power: Option<f64>,
    pub building_type: Option<BuildingType>,
}

fn required(value: Option<f64>, name: &'static str) -> Result<f64, ConfigurationError> {
    value.ok_or(ConfigurationError::MissingParameter(name))
}

impl SimulationConfigInput {
    /// Check every required parameter is present and within bounds, filling in defaults for the
    /// tank length, pump power and building type.
    pub fn finalize(self) -> Result<SimulationConfig, ConfigurationError> {
        self.validate()
            .map_err(|e| ConfigurationError::InvalidParameters(e.to_string()))?;

        let config = SimulationConfig {
            wall_area: required(self.wall_area, "wall_area")?,
            wall_u_value: required(self.wall_u_value, "wall_u_value")?,
            roof_area: required(self.roof_area, "roof_area")?,
            roof_u_value: required(self.roof_u_value, "roof_u_value")?,
            indoor_setpoint: required(self.indoor_setpoint, "indoor_setpoint")?,
            mass_of_water: required(self.mass_of_water, "mass_of_water")?,
            specific_heat_capacity: required(
                self.specific_heat_capacity,
                "specific_heat_capacity",
            )?,
            heat_loss_coefficient: required(self.heat_loss_coefficient, "heat_loss_coefficient")?,
            heat_transfer_coefficient: required(
                self.heat_transfer_coefficient,
                "heat_transfer_coefficient",
            )?,
            heat_transfer_area: required(self.heat_transfer_area, "heat_transfer_area")?,
            fixed_condenser_temperature: required(
                self.fixed_condenser_temperature,
                "fixed_condenser_temperature",
            )?,
            on_threshold: required(self.on_threshold, "on_threshold")?,
            off_threshold: required(self.off_threshold, "off_threshold")?,
            initial_tank_temperature: required(
                self.initial_tank_temperature,
                "initial_tank_temperature",
            )?,
            tank_length: self.tank_length.unwrap_or(DEFAULT_TANK_LENGTH),
            pump_power: self.pump_power.unwrap_or(DEFAULT_PUMP_POWER),
            building_type: self.building_type.unwrap_or_default(),
        };
        config.validate()?;

        Ok(config)
    }
}

/// The complete, immutable set of parameters for a simulation run. Temperatures are in K.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationConfig {
    pub wall_area: f64,
    pub wall_u_value: f64,
    pub roof_area: f64,
    pub roof_u_value: f64,
    pub indoor_setpoint: f64,
    pub mass_of_water: f64,
    pub specific_heat_capacity: f64,
    pub heat_loss_coefficient: f64,
    pub heat_transfer_coefficient: f64,
    pub heat_transfer_area: f64,
    pub fixed_condenser_temperature: f64,
    pub on_threshold: f64,
    pub off_threshold: f64,
    pub initial_tank_temperature: f64,
    pub tank_length: f64,
    pub pump_power: f64,
    pub building_type: BuildingType,
}

impl SimulationConfig {
    /// Check the invariants that must hold before any integration work is started.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.mass_of_water > 0. && self.specific_heat_capacity > 0.) {
            return Err(ConfigurationError::NonPositiveThermalMass {
                mass: self.mass_of_water,
                specific_heat_capacity: self.specific_heat_capacity,
            });
        }
        if !(self.off_threshold > self.on_threshold) {
            return Err(ConfigurationError::InvalidThresholds {
                on: self.on_threshold,
                off: self.off_threshold,
            });
        }
        if !(self.fixed_condenser_temperature >= MIN_FIXED_CONDENSER_TEMPERATURE) {
            return Err(ConfigurationError::CondenserTemperatureTooLow(
                self.fixed_condenser_temperature,
            ));
        }
        if !(self.tank_length > 0.) {
            return Err(ConfigurationError::NonPositiveTankLength(self.tank_length));
        }
        if !(self.initial_tank_temperature.is_finite() && self.initial_tank_temperature > 0.) {
            return Err(ConfigurationError::InvalidInitialTankTemperature(
                self.initial_tank_temperature,
            ));
        }

        Ok(())
    }

    pub fn building_envelope(&self) -> BuildingEnvelope {
        BuildingEnvelope::new(
            self.wall_area,
            self.wall_u_value,
            self.roof_area,
            self.roof_u_value,
            self.indoor_setpoint,
        )
    }

    pub fn tank_geometry(&self) -> TankGeometry {
        TankGeometry::from_mass_of_water(self.mass_of_water, self.tank_length)
    }

    /// Heat capacity of the water in the tank, in J/K
    pub fn tank_heat_capacity(&self) -> f64 {
        self.mass_of_water * self.specific_heat_capacity
    }
}

/// Options controlling how a simulation run is carried out, as opposed to what is simulated.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct RunOptions {
    pub include_hot_water_demand: bool,
    /// Sets the maximum integration step (3600 / steps_per_hour seconds) and the sampling rate
    /// assumed when totalling energy series.
    pub steps_per_hour: u32,
    pub controller_update: ControllerUpdate,
    pub hot_water_demand: HotWaterDemandSettings,
    pub solver: SolverSettings,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            include_hot_water_demand: false,
            steps_per_hour: DEFAULT_STEPS_PER_HOUR,
            controller_update: Default::default(),
            hot_water_demand: Default::default(),
            solver: Default::default(),
        }
    }
}

/// Measured heat pump performance against outdoor air temperature.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CopReferenceDataset {
    #[serde(rename = "heat_pump_cop_data")]
    pub data: Vec<CopReferenceDatum>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct CopReferenceDatum {
    #[serde(rename = "outdoor_temp_C", alias = "outdoor_temp_c")]
    pub outdoor_temp_c: f64,
    #[serde(rename = "COP_noisy", alias = "cop")]
    pub cop: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::{json, Value};

    #[fixture]
    fn config_json() -> Value {
        json!({
            "wall_area": 150.,
            "wall_u_value": 0.3,
            "roof_area": 150.,
            "roof_u_value": 0.23,
            "indoor_setpoint": 293.15,
            "mass_of_water": 200.,
            "specific_heat_capacity": 4186.,
            "heat_loss_coefficient": 5.,
            "heat_transfer_coefficient": 300.,
            "heat_transfer_area": 0.5,
            "fixed_condenser_temperature": 338.15,
            "on_threshold": 330.,
            "off_threshold": 333.15,
            "initial_tank_temperature": 325.,
        })
    }

    fn config_input(value: Value) -> SimulationConfigInput {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    fn should_finalize_complete_input_with_defaults(config_json: Value) {
        let config = config_input(config_json).finalize().unwrap();

        assert_eq!(config.tank_length, 1.);
        assert_eq!(config.pump_power, 2_000.);
        assert_eq!(config.building_type, BuildingType::Residential);
        assert_relative_eq!(config.tank_heat_capacity(), 837_200.);
    }

    #[rstest]
    fn should_report_missing_parameter(mut config_json: Value) {
        config_json.as_object_mut().unwrap().remove("mass_of_water");

        assert_eq!(
            config_input(config_json).finalize().unwrap_err(),
            ConfigurationError::MissingParameter("mass_of_water")
        );
    }

    #[rstest]
    fn should_accept_legacy_parameter_names() {
        let yaml = "
wall_area: 220
wall_u_value: 0.2
roof_area: 170
roof_u_value: 0.2
indoor_setpoint_temperature_K: 293.15
mass_of_water: 220
specific_heat_capacity: 4186
heat_loss_coefficient: 2.5
overall_heat_transfer_coefficient: 250
heat_transfer_area: 0.6
fixed_condenser_temperature_K: 343.15
on_temperature_threshold_K: 318.15
off_temperature_threshold_K: 333.15
initial_tank_temp: 320
tank_length: 0.7
building_type: office
";
        let config = ingest_config(yaml.as_bytes(), InputFormat::Yaml)
            .unwrap()
            .finalize()
            .unwrap();

        assert_eq!(config.fixed_condenser_temperature, 343.15);
        assert_eq!(config.on_threshold, 318.15);
        assert_eq!(config.initial_tank_temperature, 320.);
        assert_eq!(config.building_type, BuildingType::Office);
    }

    #[rstest]
    fn should_reject_unknown_parameters(mut config_json: Value) {
        config_json["tank_colour"] = json!("red");

        assert!(serde_json::from_value::<SimulationConfigInput>(config_json).is_err());
    }

    #[rstest]
    fn should_reject_negative_areas(mut config_json: Value) {
        config_json["wall_area"] = json!(-1.);

        assert!(matches!(
            config_input(config_json).finalize(),
            Err(ConfigurationError::InvalidParameters(_))
        ));
    }

    #[rstest]
    #[case(333.15, 333.15)]
    #[case(333.15, 330.)]
    fn should_reject_off_threshold_not_above_on_threshold(
        mut config_json: Value,
        #[case] on: f64,
        #[case] off: f64,
    ) {
        config_json["on_threshold"] = json!(on);
        config_json["off_threshold"] = json!(off);

        assert_eq!(
            config_input(config_json).finalize().unwrap_err(),
            ConfigurationError::InvalidThresholds { on, off }
        );
    }

    #[rstest]
    fn should_reject_condenser_temperature_below_60_celsius(mut config_json: Value) {
        config_json["fixed_condenser_temperature"] = json!(330.);

        assert_eq!(
            config_input(config_json).finalize().unwrap_err(),
            ConfigurationError::CondenserTemperatureTooLow(330.)
        );
    }

    #[rstest]
    fn should_accept_condenser_temperature_above_60_celsius(mut config_json: Value) {
        config_json["fixed_condenser_temperature"] = json!(335.);

        assert!(config_input(config_json).finalize().is_ok());
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(-10.)]
    #[case(0.)]
    fn should_reject_invalid_initial_tank_temperature(
        config_json: Value,
        #[case] initial_tank_temperature: f64,
    ) {
        let mut config = config_input(config_json).finalize().unwrap();
        config.initial_tank_temperature = initial_tank_temperature;

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidInitialTankTemperature(_))
        ));
    }

    #[rstest]
    #[case("mass_of_water")]
    #[case("specific_heat_capacity")]
    fn should_reject_zero_thermal_mass(mut config_json: Value, #[case] field: &str) {
        config_json[field] = json!(0.);

        assert!(matches!(
            config_input(config_json).finalize(),
            Err(ConfigurationError::NonPositiveThermalMass { .. })
        ));
    }

    #[rstest]
    fn should_default_run_options() {
        let options: RunOptions = serde_json::from_value(json!({})).unwrap();

        assert_eq!(options, RunOptions::default());
        assert_eq!(options.steps_per_hour, 30);
        assert!(!options.include_hot_water_demand);
        assert_eq!(options.controller_update, ControllerUpdate::EveryEvaluation);
    }

    #[rstest]
    fn should_read_cop_reference_data_with_measured_key_names() {
        let yaml = "
heat_pump_cop_data:
  - outdoor_temp_C: -5.0
    COP_ideal: 3.1
    COP_noisy: 2.95
  - outdoor_temp_C: 10.0
    COP_ideal: 4.0
    COP_noisy: 4.12
";
        let dataset = ingest_cop_dataset(yaml.as_bytes(), InputFormat::Yaml).unwrap();

        assert_eq!(
            dataset.data,
            vec![
                CopReferenceDatum {
                    outdoor_temp_c: -5.,
                    cop: 2.95
                },
                CopReferenceDatum {
                    outdoor_temp_c: 10.,
                    cop: 4.12
                },
            ]
        );
    }

    #[rstest]
    fn should_choose_input_format_from_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("inputs.json")),
            InputFormat::Json
        );
        assert_eq!(
            InputFormat::from_path(Path::new("inputs.yaml")),
            InputFormat::Yaml
        );
    }
}
