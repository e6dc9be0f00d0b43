use std::f64::consts::PI;

use crate::core::units::WATER_DENSITY_KG_PER_M3;

/// An object to represent the geometry of a cylindrical hot water storage tank.
///
/// The tank is assumed to be completely filled, so its volume follows from the mass of water it
/// holds and its radius from that volume and the configured length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankGeometry {
    volume: f64,
    length: f64,
    radius: f64,
}

impl TankGeometry {
    /// Arguments:
    /// * `mass_of_water` - mass of water held in the tank, in kg
    /// * `length` - length of the cylinder, in m
    pub fn from_mass_of_water(mass_of_water: f64, length: f64) -> Self {
        let volume = mass_of_water / WATER_DENSITY_KG_PER_M3;
        let radius = (volume / (length * PI)).sqrt();

        Self {
            volume,
            length,
            radius,
        }
    }

    /// Volume in m3
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Radius in m
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Surface area of the curved side and both end caps, in m2
    pub fn surface_area(&self) -> f64 {
        2. * PI * self.radius * self.length + 2. * PI * self.radius.powi(2)
    }

    /// Heat loss coefficient of the whole tank surface, in W/K, for a coefficient per unit area.
    pub fn heat_loss_coefficient(&self, heat_loss_coefficient_per_area: f64) -> f64 {
        heat_loss_coefficient_per_area * self.surface_area()
    }
}

/// Heat lost from the tank to its surroundings, in W. Negative if the surroundings are warmer.
pub fn heat_loss(tank_heat_loss_coefficient: f64, temp_tank: f64, temp_ambient: f64) -> f64 {
    tank_heat_loss_coefficient * (temp_tank - temp_ambient)
}
