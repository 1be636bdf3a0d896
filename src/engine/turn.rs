//! Per-turn orchestration
//!
//! One full synchronize -> assign -> plan -> authorize pass per turn,
//! strictly serialized: the blocking wait on the coordinator's turn
//! notification is the only suspension point, and outputs are published
//! before the next wait.

use tracing::{info, warn};

use crate::auth::AuthResolver;
use crate::core::config::DispatchConfig;
use crate::core::error::Result;
use crate::core::types::Direction;
use crate::engine::{assign, plan, sync};
use crate::ipc::{Coordinator, Oracle, TurnNotice, TurnSnapshot, VehicleCommand};
use crate::model::registry::Registry;

pub struct DispatchEngine {
    config: DispatchConfig,
    registry: Registry,
    resolver: AuthResolver,
}

impl DispatchEngine {
    pub fn new(config: DispatchConfig, vehicle_count: usize, resolver: AuthResolver) -> Self {
        Self {
            config,
            registry: Registry::new(vehicle_count),
            resolver,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Process one turn: returns the per-vehicle commands to publish.
    ///
    /// The auth replay advances first, from the snapshot's published
    /// onboard counts, because the oracle draws on that schedule
    /// regardless of what the rest of the turn decides.
    pub fn run_turn(
        &mut self,
        notice: &TurnNotice,
        snapshot: &TurnSnapshot,
        oracle: &mut dyn Oracle,
    ) -> Result<Vec<VehicleCommand>> {
        let onboard_counts: Vec<usize> = snapshot
            .vehicles
            .iter()
            .map(|reading| reading.onboard_count)
            .collect();
        let predicted = self
            .resolver
            .advance_turn(&onboard_counts, self.config.slot_capacity);

        // Only the declared number of request records is trusted.
        let request_end = notice.new_request_count.min(snapshot.requests.len());
        sync::ingest_requests(
            &mut self.registry,
            &snapshot.requests[..request_end],
            &self.config,
            notice.turn,
        );
        sync::reconcile_packages(&mut self.registry, &snapshot.packages);
        sync::apply_vehicle_readings(&mut self.registry, &snapshot.vehicles);
        self.registry.rebuild_vehicle_loads(self.config.slot_capacity);

        let assigned = assign::run_assignment_batch(&mut self.registry, &self.config);
        let planned = plan::plan_actions(&self.registry, &self.config);

        let mut commands = Vec::with_capacity(planned.len());
        for (index, action) in planned.iter().enumerate() {
            let vehicle = &self.registry.vehicles[index];
            let mut direction = action.direction;
            let mut auth = None;

            // Loaded vehicles only move under a valid challenge string.
            if !vehicle.onboard.is_empty() && !direction.is_stay() {
                if let Some(prediction) = predicted.get(index).cloned().flatten() {
                    auth = Some(prediction);
                } else if vehicle.onboard.len() == 1 {
                    match self.resolver.reactive_single(oracle, vehicle.id)? {
                        Some(guess) => auth = Some(guess),
                        None => {
                            warn!(vehicle = vehicle.id.0, "no accepted guess, staying put");
                            direction = Direction::Stay;
                        }
                    }
                } else {
                    warn!(
                        vehicle = vehicle.id.0,
                        challenge_len = vehicle.onboard.len(),
                        "challenge not predictable without a seed, staying put"
                    );
                    direction = Direction::Stay;
                }
            }

            commands.push(VehicleCommand {
                direction,
                pickup: action.pickup,
                dropoff: action.dropoff,
                auth,
            });
        }

        info!(
            turn = notice.turn,
            assigned,
            queued = self.registry.unassigned.len(),
            delivered = self.registry.delivered_count(),
            "turn complete"
        );
        Ok(commands)
    }

    /// Full dispatch loop against one transport carrying both the
    /// coordinator and the oracle exchanges.
    pub fn run<L: Coordinator + Oracle>(&mut self, link: &mut L) -> Result<()> {
        loop {
            let notice = link.wait_turn()?;
            if notice.error {
                warn!(turn = notice.turn, "coordinator reported an error, stopping");
                return Ok(());
            }
            if notice.finished {
                info!(
                    turn = notice.turn,
                    delivered = self.registry.delivered_count(),
                    "all requests fulfilled, stopping"
                );
                return Ok(());
            }

            let snapshot = link.snapshot(notice.new_request_count)?;
            let commands = self.run_turn(&notice, &snapshot, link)?;
            link.publish(&commands)?;
            link.ready()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cell, PackageId, VehicleId};
    use crate::ipc::{PackageReading, RequestRecord, VehicleReading};

    /// Oracle double that rejects everything and counts exchanges
    struct RejectingOracle {
        calls: usize,
    }

    impl Oracle for RejectingOracle {
        fn grade(&mut self, _vehicle: VehicleId, _guess: &str) -> Result<bool> {
            self.calls += 1;
            Ok(false)
        }
    }

    fn notice(turn: u32, new_request_count: usize) -> TurnNotice {
        TurnNotice {
            turn,
            new_request_count,
            error: false,
            finished: false,
        }
    }

    fn reading(x: i32, y: i32, onboard: usize) -> VehicleReading {
        VehicleReading {
            position: Cell::new(x, y),
            onboard_count: onboard,
        }
    }

    #[test]
    fn test_rejected_guesses_downgrade_move_only() {
        let mut engine = DispatchEngine::new(
            DispatchConfig::default(),
            1,
            AuthResolver::unseeded(),
        );
        let mut oracle = RejectingOracle { calls: 0 };

        // Turn 1: the package arrives under the vehicle and is picked up.
        let snapshot = TurnSnapshot {
            requests: vec![RequestRecord {
                id: PackageId(0),
                pickup: Cell::new(0, 0),
                dropoff: Cell::new(3, 0),
                arrival_turn: 1,
                expiry_turn: 10,
            }],
            vehicles: vec![reading(0, 0, 0)],
            packages: vec![],
        };
        let commands = engine.run_turn(&notice(1, 1), &snapshot, &mut oracle).unwrap();
        assert_eq!(commands[0].pickup, Some(PackageId(0)));
        assert_eq!(oracle.calls, 0);

        // Turn 2: onboard and wanting to move, but every guess fails.
        let snapshot = TurnSnapshot {
            requests: vec![],
            vehicles: vec![reading(0, 0, 1)],
            packages: vec![PackageReading {
                id: PackageId(0),
                location: None,
            }],
        };
        let commands = engine.run_turn(&notice(2, 0), &snapshot, &mut oracle).unwrap();
        assert_eq!(oracle.calls, 4);
        assert_eq!(commands[0].direction, Direction::Stay);
        assert!(commands[0].auth.is_none());
        // Pickup/dropoff fields are untouched by the downgrade.
        assert_eq!(commands[0].pickup, None);
        assert_eq!(commands[0].dropoff, None);
    }

    #[test]
    fn test_long_challenge_without_seed_stays() {
        let mut engine = DispatchEngine::new(
            DispatchConfig::default(),
            1,
            AuthResolver::unseeded(),
        );
        let mut oracle = RejectingOracle { calls: 0 };

        // Two packages arrive at the vehicle's cell over two turns and
        // both end up onboard.
        let make_request = |id: u32| RequestRecord {
            id: PackageId(id),
            pickup: Cell::new(0, 0),
            dropoff: Cell::new(0, 2),
            arrival_turn: 1,
            expiry_turn: 20,
        };
        let snapshot = TurnSnapshot {
            requests: vec![make_request(0), make_request(1)],
            vehicles: vec![reading(0, 0, 0)],
            packages: vec![],
        };
        engine.run_turn(&notice(1, 2), &snapshot, &mut oracle).unwrap();

        let snapshot = TurnSnapshot {
            requests: vec![],
            vehicles: vec![reading(0, 0, 1)],
            packages: vec![PackageReading {
                id: PackageId(0),
                location: None,
            }],
        };
        engine.run_turn(&notice(2, 0), &snapshot, &mut oracle).unwrap();
        let calls_after_single = oracle.calls;

        let snapshot = TurnSnapshot {
            requests: vec![],
            vehicles: vec![reading(0, 0, 2)],
            packages: vec![
                PackageReading {
                    id: PackageId(0),
                    location: None,
                },
                PackageReading {
                    id: PackageId(1),
                    location: None,
                },
            ],
        };
        let commands = engine.run_turn(&notice(3, 0), &snapshot, &mut oracle).unwrap();
        // A 2-letter challenge is not enumerable: no exchange, no move.
        assert_eq!(oracle.calls, calls_after_single);
        assert_eq!(commands[0].direction, Direction::Stay);
        assert!(commands[0].auth.is_none());
    }

    #[test]
    fn test_undeclared_request_records_ignored() {
        let mut engine = DispatchEngine::new(
            DispatchConfig::default(),
            1,
            AuthResolver::unseeded(),
        );
        let mut oracle = RejectingOracle { calls: 0 };

        let request = |id: u32| RequestRecord {
            id: PackageId(id),
            pickup: Cell::new(9, 9),
            dropoff: Cell::new(9, 9),
            arrival_turn: 1,
            expiry_turn: 10,
        };
        let snapshot = TurnSnapshot {
            requests: vec![request(0), request(1)],
            vehicles: vec![reading(0, 0, 0)],
            packages: vec![],
        };
        // Only one record is declared in the notice.
        engine.run_turn(&notice(1, 1), &snapshot, &mut oracle).unwrap();
        assert!(engine.registry().contains(PackageId(0)));
        assert!(!engine.registry().contains(PackageId(1)));
    }
}
