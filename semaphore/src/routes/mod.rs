pub mod gate;
pub mod monitor;
