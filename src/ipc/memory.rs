//! In-process coordinator and oracle, for tests and embedded harnesses
//!
//! `MemoryCoordinator` plays the external turn coordinator: it owns a
//! minimal world (vehicle positions, package locations), applies each
//! published command batch, and serves the resulting snapshot next turn.
//! Its embedded `MemoryOracle` grades guesses against per-vehicle secrets.
//! This is a boundary double, not a physics simulation: moves are applied
//! verbatim and never validated against grid geometry.

use ahash::AHashMap;

use crate::core::error::Result;
use crate::core::types::{Cell, PackageId, Turn, VehicleId};
use crate::ipc::{
    Coordinator, Oracle, PackageReading, RequestRecord, TurnNotice, TurnSnapshot, VehicleCommand,
    VehicleReading,
};

#[derive(Debug, Clone)]
struct WorldPackage {
    dropoff: Cell,
    /// `None` while carried
    location: Option<Cell>,
    delivered: bool,
}

/// Oracle double grading guesses against per-vehicle secrets
#[derive(Debug, Default)]
pub struct MemoryOracle {
    secrets: AHashMap<VehicleId, String>,
    /// Every (vehicle, guess) exchange, in order
    pub exchanges: Vec<(VehicleId, String)>,
}

impl MemoryOracle {
    pub fn set_secret(&mut self, vehicle: VehicleId, secret: impl Into<String>) {
        self.secrets.insert(vehicle, secret.into());
    }
}

impl Oracle for MemoryOracle {
    fn grade(&mut self, vehicle: VehicleId, guess: &str) -> Result<bool> {
        self.exchanges.push((vehicle, guess.to_string()));
        Ok(self.secrets.get(&vehicle).map(String::as_str) == Some(guess))
    }
}

/// Scriptable in-process coordinator
pub struct MemoryCoordinator {
    turn: Turn,
    final_turn: Turn,
    vehicle_positions: Vec<Cell>,
    onboard: Vec<Vec<PackageId>>,
    packages: AHashMap<PackageId, WorldPackage>,
    arrivals: AHashMap<Turn, Vec<RequestRecord>>,
    current_requests: Vec<RequestRecord>,
    /// Report the error flag on this turn, if set
    pub fail_at: Option<Turn>,
    /// Every published command batch, in turn order
    pub published: Vec<Vec<VehicleCommand>>,
    /// Ready acknowledgements received
    pub ready_acks: usize,
    pub oracle: MemoryOracle,
}

impl MemoryCoordinator {
    pub fn new(vehicle_positions: Vec<Cell>, final_turn: Turn) -> Self {
        let fleet = vehicle_positions.len();
        Self {
            turn: 0,
            final_turn,
            vehicle_positions,
            onboard: vec![Vec::new(); fleet],
            packages: AHashMap::new(),
            arrivals: AHashMap::new(),
            current_requests: Vec::new(),
            fail_at: None,
            published: Vec::new(),
            ready_acks: 0,
            oracle: MemoryOracle::default(),
        }
    }

    /// Script a request to arrive on the given turn
    pub fn schedule_request(&mut self, turn: Turn, record: RequestRecord) {
        self.arrivals.entry(turn).or_default().push(record);
    }

    pub fn vehicle_position(&self, index: usize) -> Cell {
        self.vehicle_positions[index]
    }

    pub fn is_delivered(&self, id: PackageId) -> bool {
        self.packages.get(&id).map(|p| p.delivered).unwrap_or(false)
    }

    /// Apply one published command batch to the world.
    ///
    /// Per vehicle: dropoff at the current cell, then pickup, then move.
    fn apply(&mut self, commands: &[VehicleCommand]) {
        for (index, command) in commands.iter().enumerate().take(self.vehicle_positions.len()) {
            let position = self.vehicle_positions[index];

            if let Some(id) = command.dropoff {
                if let Some(slot) = self.onboard[index].iter().position(|&p| p == id) {
                    self.onboard[index].remove(slot);
                    if let Some(package) = self.packages.get_mut(&id) {
                        package.location = Some(position);
                        if position == package.dropoff {
                            package.delivered = true;
                        }
                    }
                }
            }

            if let Some(id) = command.pickup {
                if let Some(package) = self.packages.get_mut(&id) {
                    if !package.delivered && package.location == Some(position) {
                        package.location = None;
                        self.onboard[index].push(id);
                    }
                }
            }

            self.vehicle_positions[index] = command.direction.step(position);
        }
    }
}

impl Coordinator for MemoryCoordinator {
    fn wait_turn(&mut self) -> Result<TurnNotice> {
        self.turn += 1;
        let new_request_count = self
            .arrivals
            .get(&self.turn)
            .map(Vec::len)
            .unwrap_or(0);
        Ok(TurnNotice {
            turn: self.turn,
            new_request_count,
            error: self.fail_at == Some(self.turn),
            finished: self.turn > self.final_turn,
        })
    }

    fn snapshot(&mut self, _new_request_count: usize) -> Result<TurnSnapshot> {
        // Spawn this turn's arrivals into the world.
        self.current_requests = self.arrivals.remove(&self.turn).unwrap_or_default();
        for record in &self.current_requests {
            self.packages.insert(
                record.id,
                WorldPackage {
                    dropoff: record.dropoff,
                    location: Some(record.pickup),
                    delivered: false,
                },
            );
        }

        let vehicles = self
            .vehicle_positions
            .iter()
            .zip(&self.onboard)
            .map(|(&position, onboard)| VehicleReading {
                position,
                onboard_count: onboard.len(),
            })
            .collect();

        let mut packages: Vec<PackageReading> = self
            .packages
            .iter()
            .map(|(&id, package)| PackageReading {
                id,
                location: package.location,
            })
            .collect();
        packages.sort_by_key(|reading| reading.id);

        Ok(TurnSnapshot {
            requests: self.current_requests.clone(),
            vehicles,
            packages,
        })
    }

    fn publish(&mut self, commands: &[VehicleCommand]) -> Result<()> {
        self.apply(commands);
        self.published.push(commands.to_vec());
        Ok(())
    }

    fn ready(&mut self) -> Result<()> {
        self.ready_acks += 1;
        Ok(())
    }
}

impl Oracle for MemoryCoordinator {
    fn grade(&mut self, vehicle: VehicleId, guess: &str) -> Result<bool> {
        self.oracle.grade(vehicle, guess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Direction;

    fn request(id: u32, pickup: Cell, dropoff: Cell) -> RequestRecord {
        RequestRecord {
            id: PackageId(id),
            pickup,
            dropoff,
            arrival_turn: 1,
            expiry_turn: 10,
        }
    }

    #[test]
    fn test_turns_advance_until_final() {
        let mut coordinator = MemoryCoordinator::new(vec![Cell::new(0, 0)], 2);
        assert!(!coordinator.wait_turn().unwrap().finished);
        assert!(!coordinator.wait_turn().unwrap().finished);
        assert!(coordinator.wait_turn().unwrap().finished);
    }

    #[test]
    fn test_commands_move_world_state() {
        let mut coordinator = MemoryCoordinator::new(vec![Cell::new(0, 0)], 10);
        coordinator.schedule_request(1, request(0, Cell::new(0, 0), Cell::new(1, 0)));

        let notice = coordinator.wait_turn().unwrap();
        assert_eq!(notice.new_request_count, 1);
        coordinator.snapshot(notice.new_request_count).unwrap();

        // Pick up and step right.
        coordinator
            .publish(&[VehicleCommand {
                direction: Direction::Right,
                pickup: Some(PackageId(0)),
                dropoff: None,
                auth: Some("u".into()),
            }])
            .unwrap();
        assert_eq!(coordinator.vehicle_position(0), Cell::new(1, 0));

        // Next snapshot reports the package as onboard.
        let notice = coordinator.wait_turn().unwrap();
        let snapshot = coordinator.snapshot(notice.new_request_count).unwrap();
        assert_eq!(snapshot.vehicles[0].onboard_count, 1);
        assert!(snapshot.packages[0].location.is_none());

        // Drop at the dropoff cell.
        coordinator
            .publish(&[VehicleCommand {
                direction: Direction::Stay,
                pickup: None,
                dropoff: Some(PackageId(0)),
                auth: None,
            }])
            .unwrap();
        assert!(coordinator.is_delivered(PackageId(0)));
    }

    #[test]
    fn test_oracle_grades_against_secret() {
        let mut coordinator = MemoryCoordinator::new(vec![Cell::new(0, 0)], 10);
        coordinator.oracle.set_secret(VehicleId(0), "d");
        assert!(!coordinator.grade(VehicleId(0), "u").unwrap());
        assert!(coordinator.grade(VehicleId(0), "d").unwrap());
        assert_eq!(coordinator.oracle.exchanges.len(), 2);
    }
}
