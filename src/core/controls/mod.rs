pub mod hysteresis_control;
