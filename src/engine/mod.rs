pub mod assign;
pub mod plan;
pub mod sync;
pub mod turn;

pub use plan::PlannedAction;
pub use turn::DispatchEngine;
