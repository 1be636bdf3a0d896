//! Package entity and lifecycle

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, PackageId, Turn, VehicleId};

/// Lifecycle state of a delivery request
///
/// Transitions only ever run Waiting -> OnTruck -> Delivered (a queued
/// package may stay Waiting across turns). Delivered is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageState {
    /// On the grid, not yet picked up (queued or pending on a vehicle)
    Waiting,
    /// Physically carried; location is not published while onboard
    OnTruck,
    /// Observed at its dropoff cell; retained read-only
    Delivered,
}

/// A delivery request tracked by the state model
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub pickup: Cell,
    pub dropoff: Cell,
    pub arrival_turn: Turn,
    /// Recorded but not enforced; downstream ranking policies may use it
    pub expiry_turn: Turn,
    pub state: PackageState,
    /// Last known cell; `None` while onboard (not tracked externally)
    pub location: Option<Cell>,
    /// Owning vehicle, or `None` while in the unassigned queue
    pub assigned_to: Option<VehicleId>,
}

impl Package {
    /// New package in Waiting state, located at its pickup cell
    pub fn new(id: PackageId, pickup: Cell, dropoff: Cell, arrival: Turn, expiry: Turn) -> Self {
        Self {
            id,
            pickup,
            dropoff,
            arrival_turn: arrival,
            expiry_turn: expiry,
            state: PackageState::Waiting,
            location: Some(pickup),
            assigned_to: None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.state == PackageState::Delivered
    }

    /// Mark delivered: terminal, owner cleared, never re-queued
    pub fn mark_delivered(&mut self) {
        self.state = PackageState::Delivered;
        self.assigned_to = None;
    }
}
