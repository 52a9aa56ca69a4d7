pub mod canal;
pub mod config;
pub mod port;
pub mod quay;
pub mod simulator;
pub mod sync;
pub mod utils;
pub mod vessel;
