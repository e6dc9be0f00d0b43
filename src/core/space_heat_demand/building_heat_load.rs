/// The building heat load is the heat drawn from the hot water tank to keep the building at its
/// indoor setpoint, based on fabric losses through the walls and roof:
///
/// Q_load = A_w * U_w * (T_amb - T_sp) + A_r * U_r * (T_amb - T_sp)
///
/// where:
/// * A_w, A_r - wall and roof areas (m2)
/// * U_w, U_r - wall and roof U-values (W/m2K)
/// * T_amb - ambient outdoor temperature (K)
/// * T_sp - indoor setpoint temperature (K)
///
/// Q_load is in W and is negative whenever it is colder outside than the setpoint, so it is
/// added (not subtracted) when assembling the tank energy balance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingEnvelope {
    wall_area: f64,
    wall_u_value: f64,
    roof_area: f64,
    roof_u_value: f64,
    indoor_setpoint: f64,
}

/// One point of the heat load against temperature difference relationship.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatLoadPoint {
    /// Ambient temperature minus indoor setpoint, in K
    pub delta_t: f64,
    /// Heat load, in W
    pub heat_load: f64,
}

impl BuildingEnvelope {
    pub fn new(
        wall_area: f64,
        wall_u_value: f64,
        roof_area: f64,
        roof_u_value: f64,
        indoor_setpoint: f64,
    ) -> Self {
        Self {
            wall_area,
            wall_u_value,
            roof_area,
            roof_u_value,
            indoor_setpoint,
        }
    }

    pub fn indoor_setpoint(&self) -> f64 {
        self.indoor_setpoint
    }

    pub fn heat_load(&self, temp_ambient: f64) -> f64 {
        let delta_t = temp_ambient - self.indoor_setpoint;
        self.wall_area * self.wall_u_value * delta_t + self.roof_area * self.roof_u_value * delta_t
    }

    /// Heat load for each sample of an hourly ambient series.
    pub fn heat_load_series(&self, ambient_temperatures: &[f64]) -> Vec<HeatLoadPoint> {
        ambient_temperatures
            .iter()
            .map(|temp_ambient| HeatLoadPoint {
                delta_t: temp_ambient - self.indoor_setpoint,
                heat_load: self.heat_load(*temp_ambient),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[fixture]
    fn library() -> BuildingEnvelope {
        BuildingEnvelope::new(150., 0.3, 150., 0.23, 293.15)
    }

    #[rstest]
    fn should_be_negative_when_colder_outside(library: BuildingEnvelope) {
        // (150 * 0.3 + 150 * 0.23) * (283.15 - 293.15)
        assert_relative_eq!(library.heat_load(283.15), -795., max_relative = 1e-9);
    }

    #[rstest]
    fn should_be_zero_at_setpoint(library: BuildingEnvelope) {
        assert_relative_eq!(library.heat_load(293.15), 0.);
    }

    #[rstest]
    fn should_be_positive_when_warmer_outside(library: BuildingEnvelope) {
        assert!(library.heat_load(298.15) > 0.);
    }

    #[rstest]
    fn should_build_series_against_delta_t(library: BuildingEnvelope) {
        let series = library.heat_load_series(&[273.15, 283.15, 293.15]);

        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[0].delta_t, -20., epsilon = 1e-9);
        assert_relative_eq!(series[0].heat_load, -1590., max_relative = 1e-9);
        assert_relative_eq!(series[2].heat_load, 0., epsilon = 1e-9);
    }
}
