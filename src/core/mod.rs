pub mod config;
pub mod error;
pub mod types;

pub use config::DispatchConfig;
pub use types::{Cell, Direction, PackageId, Turn, VehicleId};
