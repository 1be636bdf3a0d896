//! Vehicle entity

use crate::core::types::{Cell, PackageId, VehicleId};

/// A fleet vehicle. The fleet is fixed for the run; only position and the
/// slot lists mutate.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub position: Cell,
    /// Packages physically carried, in slot order
    pub onboard: Vec<PackageId>,
    /// Packages assigned but not yet picked up, in slot order
    pub pending: Vec<PackageId>,
}

impl Vehicle {
    pub fn new(id: VehicleId, position: Cell) -> Self {
        Self {
            id,
            position,
            onboard: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Load the assignment engine plans against (onboard + pending)
    pub fn planned_load(&self) -> usize {
        self.onboard.len() + self.pending.len()
    }

    pub fn clear_load(&mut self) {
        self.onboard.clear();
        self.pending.clear();
    }
}
