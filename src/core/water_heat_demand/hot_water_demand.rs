use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::core::units::{MINUTES_PER_DAY, MINUTES_PER_HOUR, SECONDS_PER_MINUTE, WATTS_PER_KILOWATT};
use crate::errors::ConfigurationError;

/// The kind of building served by the tank, which determines when hot water is drawn off.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Library,
    Office,
    Warehouse,
    #[default]
    Residential,
}

impl BuildingType {
    /// Unitless multiplier applied to the base hot water demand at the given hour of the day
    /// (0-24), reflecting how the occupants of this kind of building use hot water.
    pub fn usage_bias(&self, hour: f64) -> f64 {
        let off_hours = (0. ..8.).contains(&hour) || (18. ..24.).contains(&hour);
        let lunch = (12. ..14.).contains(&hour);
        match self {
            BuildingType::Library => {
                if off_hours {
                    0.
                } else if lunch {
                    2.5
                } else {
                    1.25
                }
            }
            BuildingType::Office => {
                if off_hours {
                    0.
                } else if lunch {
                    2.5
                } else {
                    1.
                }
            }
            // warehouses operate around the clock
            BuildingType::Warehouse => {
                if off_hours {
                    0.5
                } else if lunch {
                    2.5
                } else {
                    1.25
                }
            }
            BuildingType::Residential => {
                if (6. ..9.).contains(&hour) {
                    // showers, cooking, cleaning
                    1.4
                } else if (18. ..21.).contains(&hour) {
                    1.75
                } else if (21. ..=24.).contains(&hour) {
                    1.05
                } else if (9. ..=18.).contains(&hour) {
                    // occupants typically out
                    0.5
                } else {
                    0.
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct HotWaterDemandSettings {
    /// Mean of the base demand, in kW
    pub mean_kw: f64,
    /// Standard deviation of the base demand, in kW
    pub std_dev_kw: f64,
    pub seed: u64,
}

impl Default for HotWaterDemandSettings {
    fn default() -> Self {
        Self {
            mean_kw: 0.1,
            std_dev_kw: 0.05,
            seed: DEFAULT_SEED,
        }
    }
}

const DEFAULT_SEED: u64 = 37;

/// Generates stochastic hot water demand profiles at one minute resolution over a day.
#[derive(Clone, Debug)]
pub struct HotWaterDemandGenerator {
    base_demand: Normal<f64>,
}

impl HotWaterDemandGenerator {
    pub fn new(settings: &HotWaterDemandSettings) -> Result<Self, ConfigurationError> {
        if !settings.mean_kw.is_finite() {
            return Err(ConfigurationError::InvalidParameters(format!(
                "hot water demand mean must be finite, got {}kW",
                settings.mean_kw
            )));
        }
        if settings.std_dev_kw.is_nan() || settings.std_dev_kw < 0. {
            return Err(ConfigurationError::InvalidParameters(format!(
                "hot water demand standard deviation must not be negative, got {}kW",
                settings.std_dev_kw
            )));
        }
        let base_demand = Normal::new(settings.mean_kw, settings.std_dev_kw).map_err(|e| {
            ConfigurationError::InvalidParameters(format!("hot water demand distribution: {e}"))
        })?;

        Ok(Self { base_demand })
    }

    /// Draw a base demand (in kW) for every minute of the day, clip negative draws to zero and
    /// scale each by the usage bias for the hour it falls in.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        building_type: BuildingType,
        rng: &mut R,
    ) -> HotWaterDemandProfile {
        let demand = (0..MINUTES_PER_DAY)
            .map(|minute| {
                let base_demand_kw = self.base_demand.sample(&mut *rng).max(0.);
                let hour = (minute as f64 / MINUTES_PER_HOUR as f64) % 24.;
                base_demand_kw * building_type.usage_bias(hour) * WATTS_PER_KILOWATT as f64
            })
            .collect();

        HotWaterDemandProfile { demand }
    }
}

/// Instantaneous hot water demand power (in W) for each minute of the simulated day.
#[derive(Clone, Debug, PartialEq)]
pub struct HotWaterDemandProfile {
    demand: Vec<f64>,
}

impl HotWaterDemandProfile {
    pub fn from_values(demand: Vec<f64>) -> Self {
        Self { demand }
    }

    pub fn values(&self) -> &[f64] {
        &self.demand
    }

    /// Demand for the minute containing `t` seconds into the run, wrapping round past the end of
    /// the profile.
    pub fn demand_at(&self, t: f64) -> f64 {
        if self.demand.is_empty() {
            return 0.;
        }
        let minute = (t.abs() / SECONDS_PER_MINUTE as f64) as usize;
        self.demand[minute % self.demand.len()]
    }

    /// The start of each minute of the profile, in hours.
    pub fn time_hours(&self) -> Vec<f64> {
        (0..self.demand.len())
            .map(|minute| minute as f64 / MINUTES_PER_HOUR as f64)
            .collect()
    }

    /// Total energy drawn off over the profile, in kWh. Each value covers one minute, so the sum
    /// is divided by 60 samples an hour rather than by the integration steps per hour.
    pub fn total_kwh(&self) -> f64 {
        self.demand.iter().sum::<f64>()
            / (MINUTES_PER_HOUR as f64 * WATTS_PER_KILOWATT as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use rstest::*;
    use strum::IntoEnumIterator;

    #[fixture]
    fn generator() -> HotWaterDemandGenerator {
        HotWaterDemandGenerator::new(&HotWaterDemandSettings::default()).unwrap()
    }

    #[rstest]
    #[case(BuildingType::Library, 3., 0.)]
    #[case(BuildingType::Library, 10., 1.25)]
    #[case(BuildingType::Library, 13., 2.5)]
    #[case(BuildingType::Library, 19., 0.)]
    #[case(BuildingType::Office, 3., 0.)]
    #[case(BuildingType::Office, 9.5, 1.)]
    #[case(BuildingType::Office, 12., 2.5)]
    #[case(BuildingType::Office, 18., 0.)]
    #[case(BuildingType::Warehouse, 2., 0.5)]
    #[case(BuildingType::Warehouse, 15., 1.25)]
    #[case(BuildingType::Warehouse, 13.99, 2.5)]
    #[case(BuildingType::Residential, 3., 0.)]
    #[case(BuildingType::Residential, 6., 1.4)]
    #[case(BuildingType::Residential, 12., 0.5)]
    #[case(BuildingType::Residential, 18., 1.75)]
    #[case(BuildingType::Residential, 22.5, 1.05)]
    fn should_apply_usage_bias(
        #[case] building_type: BuildingType,
        #[case] hour: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(building_type.usage_bias(hour), expected);
    }

    #[rstest]
    fn should_generate_one_non_negative_value_per_minute(generator: HotWaterDemandGenerator) {
        let mut rng = Pcg64::seed_from_u64(1);
        for building_type in BuildingType::iter() {
            let profile = generator.generate(building_type, &mut rng);

            assert_eq!(profile.values().len(), 1440);
            assert!(profile.values().iter().all(|demand| *demand >= 0.));
        }
    }

    #[rstest]
    fn should_have_no_office_demand_outside_working_hours(generator: HotWaterDemandGenerator) {
        let mut rng = Pcg64::seed_from_u64(2);
        let profile = generator.generate(BuildingType::Office, &mut rng);

        assert!(profile.values()[..8 * 60].iter().all(|demand| *demand == 0.));
        assert!(profile.values()[18 * 60..].iter().all(|demand| *demand == 0.));
        assert!(profile.values()[8 * 60..18 * 60]
            .iter()
            .any(|demand| *demand > 0.));
    }

    #[rstest]
    fn should_reproduce_profile_for_same_seed(generator: HotWaterDemandGenerator) {
        let first = generator.generate(BuildingType::Residential, &mut Pcg64::seed_from_u64(37));
        let second = generator.generate(BuildingType::Residential, &mut Pcg64::seed_from_u64(37));
        let other = generator.generate(BuildingType::Residential, &mut Pcg64::seed_from_u64(38));

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[rstest]
    fn should_average_close_to_mean_demand_for_flat_bias() {
        // the warehouse has a bias of 1.25 from 8 to 12 and 14 to 18
        let generator = HotWaterDemandGenerator::new(&HotWaterDemandSettings {
            mean_kw: 0.1,
            std_dev_kw: 0.01,
            seed: 0,
        })
        .unwrap();
        let profile = generator.generate(BuildingType::Warehouse, &mut Pcg64::seed_from_u64(5));

        let working_morning = &profile.values()[8 * 60..12 * 60];
        let mean = working_morning.iter().sum::<f64>() / working_morning.len() as f64;
        assert_relative_eq!(mean, 125., max_relative = 0.02);
    }

    #[rstest]
    #[case(0.1, -1.)]
    #[case(0.1, f64::NAN)]
    #[case(f64::NAN, 0.05)]
    #[case(f64::INFINITY, 0.05)]
    fn should_reject_invalid_demand_distribution(#[case] mean_kw: f64, #[case] std_dev_kw: f64) {
        assert!(matches!(
            HotWaterDemandGenerator::new(&HotWaterDemandSettings {
                mean_kw,
                std_dev_kw,
                seed: 0,
            }),
            Err(ConfigurationError::InvalidParameters(_))
        ));
    }

    #[rstest]
    fn should_look_up_demand_by_minute() {
        let profile = HotWaterDemandProfile::from_values((0..1440).map(|i| i as f64).collect());

        assert_eq!(profile.demand_at(0.), 0.);
        assert_eq!(profile.demand_at(59.9), 0.);
        assert_eq!(profile.demand_at(60.), 1.);
        assert_eq!(profile.demand_at(3_600. * 13.5), 810.);
        assert_eq!(profile.demand_at(86_400.), 0.);
    }

    #[rstest]
    fn should_total_minute_samples_in_kwh() {
        // 1 kW all day
        let profile = HotWaterDemandProfile::from_values(vec![1_000.; 1440]);

        assert_relative_eq!(profile.total_kwh(), 24.);
        assert_relative_eq!(profile.time_hours()[90], 1.5);
    }
}
