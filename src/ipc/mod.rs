//! Boundary surfaces toward the turn coordinator and the oracles
//!
//! The coordinator owns turn sequencing and the shared snapshot; the
//! oracles grade authorization guesses. Both are external collaborators,
//! reached only through the traits here so any transport can be bolted on.

pub mod memory;
pub mod startup;
pub mod stdio;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{Cell, Direction, PackageId, Turn, VehicleId};

/// Coordinator -> engine turn notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TurnNotice {
    pub turn: Turn,
    pub new_request_count: usize,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub finished: bool,
}

/// One newly arrived delivery request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: PackageId,
    pub pickup: Cell,
    pub dropoff: Cell,
    pub arrival_turn: Turn,
    pub expiry_turn: Turn,
}

/// Published facts about one vehicle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VehicleReading {
    pub position: Cell,
    pub onboard_count: usize,
}

/// Published location of one known package; `None` means "currently
/// onboard, location not tracked externally"
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackageReading {
    pub id: PackageId,
    pub location: Option<Cell>,
}

/// Everything the engine reads from the shared snapshot for one turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub requests: Vec<RequestRecord>,
    pub vehicles: Vec<VehicleReading>,
    pub packages: Vec<PackageReading>,
}

/// Per-vehicle output written back for one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCommand {
    pub direction: Direction,
    pub pickup: Option<PackageId>,
    pub dropoff: Option<PackageId>,
    /// Challenge string for a loaded, moving vehicle; absent otherwise
    pub auth: Option<String>,
}

impl VehicleCommand {
    /// The do-nothing command
    pub fn stay() -> Self {
        Self {
            direction: Direction::Stay,
            pickup: None,
            dropoff: None,
            auth: None,
        }
    }
}

/// Turn-sequencing transport plus snapshot access.
///
/// The engine performs one blocking `wait_turn` per turn; it never reads
/// ahead into a future turn's inputs, and only writes through `publish`.
pub trait Coordinator {
    /// Block until the coordinator signals the next turn
    fn wait_turn(&mut self) -> Result<TurnNotice>;

    /// Read this turn's snapshot. `new_request_count` comes from the turn
    /// notice; implementations may use it to bound the request records.
    fn snapshot(&mut self, new_request_count: usize) -> Result<TurnSnapshot>;

    /// Write this turn's per-vehicle commands
    fn publish(&mut self, commands: &[VehicleCommand]) -> Result<()>;

    /// Zero-payload ready acknowledgement, sent once per turn
    fn ready(&mut self) -> Result<()>;
}

/// Authorization oracle for one fleet.
///
/// A grading exchange is self-contained (select the vehicle, submit the
/// guess, read the verdict), so exchanges for different vehicles are
/// independent.
pub trait Oracle {
    fn grade(&mut self, vehicle: VehicleId, guess: &str) -> Result<bool>;
}
