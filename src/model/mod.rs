pub mod package;
pub mod registry;
pub mod vehicle;

pub use package::{Package, PackageState};
pub use registry::Registry;
pub use vehicle::Vehicle;
