pub mod building_heat_load;
