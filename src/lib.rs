pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

pub use crate::domain::port::destination_port::{DestinationReport, run_destination_port};
pub use crate::domain::port::origin_port::{OriginReport, run_origin_port};
pub use crate::loader::parser::load_settings;
