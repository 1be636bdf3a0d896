//! Turn Synchronizer: applies one turn's external snapshot onto the model
//!
//! Order matters: new arrivals are admitted first, then every known
//! package is reconciled against its published location, then vehicle
//! positions are copied and the slot lists rebuilt from the registry scan.

use tracing::{debug, info, warn};

use crate::core::config::DispatchConfig;
use crate::core::types::Turn;
use crate::ipc::{PackageReading, RequestRecord, TurnSnapshot, VehicleReading};
use crate::model::package::{Package, PackageState};
use crate::model::registry::Registry;

/// Admit this turn's new requests. Ids outside the valid range, and
/// duplicates of live ids, are dropped with a diagnostic. Returns the
/// number admitted.
pub fn ingest_requests(
    registry: &mut Registry,
    requests: &[RequestRecord],
    config: &DispatchConfig,
    turn: Turn,
) -> usize {
    let mut admitted = 0;
    for record in requests {
        if record.id.0 >= config.max_packages {
            warn!(
                id = record.id.0,
                max = config.max_packages,
                "dropping arrival with out-of-range package id"
            );
            continue;
        }
        if registry.contains(record.id) {
            warn!(id = record.id.0, "dropping arrival with duplicate package id");
            continue;
        }

        debug!(
            id = record.id.0,
            pickup = ?record.pickup,
            dropoff = ?record.dropoff,
            expiry = record.expiry_turn,
            "new package request"
        );
        registry.admit(Package::new(
            record.id,
            record.pickup,
            record.dropoff,
            record.arrival_turn,
            record.expiry_turn,
        ));
        admitted += 1;
    }

    if admitted > 0 {
        info!(turn, admitted, queued = registry.unassigned.len(), "admitted new requests");
    }
    admitted
}

/// Reconcile every known package against its published location.
///
/// A `None` location means "currently onboard". A package observed at its
/// dropoff cell while OnTruck becomes Delivered with its owner cleared;
/// Delivered is terminal and never revisited.
pub fn reconcile_packages(registry: &mut Registry, readings: &[PackageReading]) {
    for reading in readings {
        let Some(package) = registry.package_mut(reading.id) else {
            warn!(id = reading.id.0, "location reading for unknown package");
            continue;
        };
        if package.is_delivered() {
            continue;
        }

        match reading.location {
            None => {
                package.state = PackageState::OnTruck;
                package.location = None;
            }
            Some(cell) => {
                let arrived = package.state == PackageState::OnTruck && cell == package.dropoff;
                package.location = Some(cell);
                if arrived {
                    package.mark_delivered();
                    debug!(id = reading.id.0, "package delivered");
                } else {
                    package.state = PackageState::Waiting;
                }
            }
        }
    }
}

/// Copy published vehicle positions into the fleet
pub fn apply_vehicle_readings(registry: &mut Registry, readings: &[VehicleReading]) {
    if readings.len() != registry.vehicles.len() {
        warn!(
            published = readings.len(),
            fleet = registry.vehicles.len(),
            "vehicle reading count does not match fleet size"
        );
    }
    for (vehicle, reading) in registry.vehicles.iter_mut().zip(readings) {
        vehicle.position = reading.position;
    }
}

/// Full synchronization pass for one turn
pub fn synchronize(
    registry: &mut Registry,
    snapshot: &TurnSnapshot,
    config: &DispatchConfig,
    turn: Turn,
) {
    ingest_requests(registry, &snapshot.requests, config, turn);
    reconcile_packages(registry, &snapshot.packages);
    apply_vehicle_readings(registry, &snapshot.vehicles);
    registry.rebuild_vehicle_loads(config.slot_capacity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cell, PackageId, VehicleId};

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
    fn test_out_of_range_id_dropped() {
        let mut registry = Registry::new(1);
        let config = DispatchConfig::default();
        let requests = vec![
            request(0, Cell::new(0, 0), Cell::new(1, 1)),
            request(config.max_packages, Cell::new(2, 2), Cell::new(3, 3)),
        ];
        let admitted = ingest_requests(&mut registry, &requests, &config, 1);
        assert_eq!(admitted, 1);
        assert!(registry.contains(PackageId(0)));
        assert!(!registry.contains(PackageId(config.max_packages)));
    }

    #[test]
    fn test_duplicate_id_dropped() {
        let mut registry = Registry::new(1);
        let config = DispatchConfig::default();
        let requests = vec![request(7, Cell::new(0, 0), Cell::new(1, 1))];
        assert_eq!(ingest_requests(&mut registry, &requests, &config, 1), 1);
        assert_eq!(ingest_requests(&mut registry, &requests, &config, 2), 0);
        assert_eq!(registry.unassigned.len(), 1);
    }

    #[test]
    fn test_onboard_sentinel_sets_state() {
        let mut registry = Registry::new(1);
        let config = DispatchConfig::default();
        ingest_requests(
            &mut registry,
            &[request(0, Cell::new(0, 0), Cell::new(3, 0))],
            &config,
            1,
        );

        reconcile_packages(
            &mut registry,
            &[PackageReading {
                id: PackageId(0),
                location: None,
            }],
        );
        let p = registry.package(PackageId(0)).unwrap();
        assert_eq!(p.state, PackageState::OnTruck);
        assert!(p.location.is_none());
    }

    #[test]
    fn test_dropoff_observation_delivers() {
        let mut registry = Registry::new(1);
        let config = DispatchConfig::default();
        ingest_requests(
            &mut registry,
            &[request(0, Cell::new(0, 0), Cell::new(3, 0))],
            &config,
            1,
        );
        registry.package_mut(PackageId(0)).unwrap().assigned_to = Some(VehicleId(0));

        // Picked up, then observed at its dropoff cell.
        reconcile_packages(
            &mut registry,
            &[PackageReading {
                id: PackageId(0),
                location: None,
            }],
        );
        reconcile_packages(
            &mut registry,
            &[PackageReading {
                id: PackageId(0),
                location: Some(Cell::new(3, 0)),
            }],
        );

        let p = registry.package(PackageId(0)).unwrap();
        assert!(p.is_delivered());
        assert!(p.assigned_to.is_none());
    }

    #[test]
    fn test_delivered_is_terminal() {
        let mut registry = Registry::new(1);
        let config = DispatchConfig::default();
        ingest_requests(
            &mut registry,
            &[request(0, Cell::new(0, 0), Cell::new(3, 0))],
            &config,
            1,
        );
        registry.package_mut(PackageId(0)).unwrap().state = PackageState::OnTruck;
        reconcile_packages(
            &mut registry,
            &[PackageReading {
                id: PackageId(0),
                location: Some(Cell::new(3, 0)),
            }],
        );
        assert!(registry.package(PackageId(0)).unwrap().is_delivered());

        // Later readings must not resurrect it.
        reconcile_packages(
            &mut registry,
            &[PackageReading {
                id: PackageId(0),
                location: Some(Cell::new(1, 1)),
            }],
        );
        let p = registry.package(PackageId(0)).unwrap();
        assert!(p.is_delivered());
        assert_eq!(p.location, Some(Cell::new(3, 0)));
    }

    #[test]
    fn test_waiting_location_update() {
        let mut registry = Registry::new(1);
        let config = DispatchConfig::default();
        ingest_requests(
            &mut registry,
            &[request(0, Cell::new(0, 0), Cell::new(3, 0))],
            &config,
            1,
        );
        // A waiting package observed elsewhere stays Waiting with the
        // updated location.
        reconcile_packages(
            &mut registry,
            &[PackageReading {
                id: PackageId(0),
                location: Some(Cell::new(0, 1)),
            }],
        );
        let p = registry.package(PackageId(0)).unwrap();
        assert_eq!(p.state, PackageState::Waiting);
        assert_eq!(p.location, Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_synchronize_rebuilds_loads() {
        let mut registry = Registry::new(2);
        let config = DispatchConfig::default();
        let snapshot = TurnSnapshot {
            requests: vec![request(0, Cell::new(1, 1), Cell::new(4, 4))],
            vehicles: vec![
                VehicleReading {
                    position: Cell::new(5, 5),
                    onboard_count: 0,
                },
                VehicleReading {
                    position: Cell::new(2, 2),
                    onboard_count: 0,
                },
            ],
            packages: vec![],
        };
        synchronize(&mut registry, &snapshot, &config, 1);
        assert_eq!(registry.vehicles[0].position, Cell::new(5, 5));
        assert_eq!(registry.vehicles[1].position, Cell::new(2, 2));

        // Assign, then a second synchronize keeps the pending slot.
        registry.package_mut(PackageId(0)).unwrap().assigned_to = Some(VehicleId(1));
        synchronize(&mut registry, &TurnSnapshot::default(), &config, 2);
        assert_eq!(registry.vehicles[1].pending, vec![PackageId(0)]);
    }
}
