pub mod heat_pump;
pub mod storage_tank;
