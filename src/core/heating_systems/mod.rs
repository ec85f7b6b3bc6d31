pub mod air_handling_coil;
pub mod common;
pub mod emitters;
pub mod storage_tank;
