pub mod hot_water_demand;
