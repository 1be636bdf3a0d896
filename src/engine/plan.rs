//! Action Planner: one action per vehicle per turn
//!
//! Dropoff first (one per turn even when several coincide), then pickup
//! into the freed capacity, then a single Manhattan step toward the most
//! urgent target: remaining onboard dropoffs, then pending pickups, then
//! the dropoff of a package picked up this very turn.

use tracing::debug;

use crate::core::config::DispatchConfig;
use crate::core::types::{Cell, Direction, PackageId};
use crate::model::package::PackageState;
use crate::model::registry::Registry;
use crate::model::vehicle::Vehicle;

/// Planner output for one vehicle, before authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAction {
    pub direction: Direction,
    pub pickup: Option<PackageId>,
    pub dropoff: Option<PackageId>,
}

/// Single Manhattan step toward the target, horizontal axis first
pub fn step_toward(from: Cell, target: Cell) -> Direction {
    if target.x > from.x {
        Direction::Right
    } else if target.x < from.x {
        Direction::Left
    } else if target.y > from.y {
        Direction::Down
    } else if target.y < from.y {
        Direction::Up
    } else {
        Direction::Stay
    }
}

/// First onboard package (slot order) whose dropoff is the vehicle's cell
fn dropoff_here(registry: &Registry, vehicle: &Vehicle) -> Option<PackageId> {
    vehicle.onboard.iter().copied().find(|&id| {
        registry
            .package(id)
            .map(|p| p.state == PackageState::OnTruck && p.dropoff == vehicle.position)
            .unwrap_or(false)
    })
}

/// First pending package (slot order) waiting at the vehicle's cell
fn pickup_here(registry: &Registry, vehicle: &Vehicle) -> Option<PackageId> {
    vehicle.pending.iter().copied().find(|&id| {
        registry
            .package(id)
            .map(|p| p.state == PackageState::Waiting && p.location == Some(vehicle.position))
            .unwrap_or(false)
    })
}

/// Nearest remaining onboard dropoff, skipping the one dropped this turn
fn nearest_onboard_dropoff(
    registry: &Registry,
    vehicle: &Vehicle,
    skip: Option<PackageId>,
) -> Option<Cell> {
    let mut best: Option<(i32, Cell)> = None;
    for &id in &vehicle.onboard {
        if Some(id) == skip {
            continue;
        }
        let Some(package) = registry.package(id) else {
            continue;
        };
        if package.state != PackageState::OnTruck {
            continue;
        }
        let dist = vehicle.position.manhattan(package.dropoff);
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, package.dropoff));
        }
    }
    best.map(|(_, cell)| cell)
}

/// Nearest pending pickup with a known location, skipping the package
/// picked up this turn (its dropoff is handled by the look-ahead rule)
fn nearest_pending_pickup(
    registry: &Registry,
    vehicle: &Vehicle,
    skip: Option<PackageId>,
) -> Option<Cell> {
    let mut best: Option<(i32, Cell)> = None;
    for &id in &vehicle.pending {
        if Some(id) == skip {
            continue;
        }
        let Some(package) = registry.package(id) else {
            continue;
        };
        if package.state != PackageState::Waiting {
            continue;
        }
        let Some(location) = package.location else {
            continue;
        };
        let dist = vehicle.position.manhattan(location);
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, location));
        }
    }
    best.map(|(_, cell)| cell)
}

/// Plan one vehicle's action for this turn
pub fn plan_vehicle_action(
    registry: &Registry,
    vehicle: &Vehicle,
    config: &DispatchConfig,
) -> PlannedAction {
    let dropoff = dropoff_here(registry, vehicle);

    // Drop happens before pickup, freeing one slot this turn.
    let mut capacity = config.slot_capacity.saturating_sub(vehicle.onboard.len());
    if dropoff.is_some() {
        capacity += 1;
    }
    let pickup = if capacity > 0 {
        pickup_here(registry, vehicle)
    } else {
        None
    };

    // Target priority: remaining onboard drops, then pending pickups,
    // then look-ahead to the dropoff of a package picked up just now.
    let carried_after_drop = vehicle.onboard.len() - usize::from(dropoff.is_some());
    let target = if carried_after_drop > 0 {
        nearest_onboard_dropoff(registry, vehicle, dropoff)
    } else {
        None
    }
    .or_else(|| nearest_pending_pickup(registry, vehicle, pickup))
    .or_else(|| pickup.and_then(|id| registry.package(id).map(|p| p.dropoff)));

    let direction = match target {
        Some(cell) => step_toward(vehicle.position, cell),
        None => Direction::Stay,
    };

    debug!(
        vehicle = vehicle.id.0,
        ?direction,
        pickup = pickup.map(|p| p.0),
        dropoff = dropoff.map(|p| p.0),
        target = ?target,
        "planned action"
    );

    PlannedAction {
        direction,
        pickup,
        dropoff,
    }
}

/// Plan the whole fleet, one action per vehicle in index order
pub fn plan_actions(registry: &Registry, config: &DispatchConfig) -> Vec<PlannedAction> {
    registry
        .vehicles
        .iter()
        .map(|vehicle| plan_vehicle_action(registry, vehicle, config))
        .collect()
}
