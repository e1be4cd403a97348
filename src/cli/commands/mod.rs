pub mod collector;
pub mod monitor;
