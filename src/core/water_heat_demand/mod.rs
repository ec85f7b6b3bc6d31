pub mod dhw_demand;
