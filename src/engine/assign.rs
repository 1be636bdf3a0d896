//! Assignment Engine: batched insertion-cost matching
//!
//! Each turn takes at most `batch_size` packages from the head of the
//! unassigned queue, in FIFO order, one pass. A candidate vehicle must
//! pass a capacity check and a load-dependent reach check; survivors are
//! scored by the extra travel of appending the package's pickup+dropoff
//! to the vehicle's projected route, with a looser ceiling when the
//! package continues the vehicle's current direction of travel. Ties keep
//! the lowest-index vehicle. Packages nobody can take re-enter the queue
//! at the tail and may starve; expiry is never enforced here.

use tracing::{debug, info};

use crate::core::config::DispatchConfig;
use crate::core::types::Cell;
use crate::model::package::{Package, PackageState};
use crate::model::registry::Registry;
use crate::model::vehicle::Vehicle;

/// Cosine similarity between two 2D vectors; 1.0 by convention when
/// either vector is zero-length.
pub fn cosine_similarity(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dot = ax * bx + ay * by;
    let na = (ax * ax + ay * ay).sqrt();
    let nb = (bx * bx + by * by).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    dot / (na * nb)
}

/// Centroid of all dropoff targets (onboard and pending) of a vehicle;
/// falls back to the vehicle's own position with no targets.
fn dropoff_centroid(registry: &Registry, vehicle: &Vehicle) -> (f64, f64) {
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut count = 0;

    for &id in vehicle.onboard.iter().chain(vehicle.pending.iter()) {
        if let Some(package) = registry.package(id) {
            sum_x += package.dropoff.x as f64;
            sum_y += package.dropoff.y as f64;
            count += 1;
        }
    }

    if count == 0 {
        (vehicle.position.x as f64, vehicle.position.y as f64)
    } else {
        (sum_x / count as f64, sum_y / count as f64)
    }
}

/// Endpoint of the vehicle's projected route: onboard drops in slot
/// order, then each pending package's pickup-then-drop in slot order.
fn project_route_endpoint(registry: &Registry, vehicle: &Vehicle) -> Cell {
    let mut at = vehicle.position;
    for &id in &vehicle.onboard {
        if let Some(package) = registry.package(id) {
            at = package.dropoff;
        }
    }
    for &id in &vehicle.pending {
        if let Some(package) = registry.package(id) {
            at = package.dropoff;
        }
    }
    at
}

/// Pick the best vehicle for one package, or `None` when nobody qualifies
fn best_vehicle_for(
    registry: &Registry,
    package: &Package,
    config: &DispatchConfig,
) -> Option<(usize, i32)> {
    let mut best: Option<(usize, i32)> = None;

    for (index, vehicle) in registry.vehicles.iter().enumerate() {
        if vehicle.planned_load() >= config.soft_capacity {
            continue;
        }

        let dist_to_pickup = vehicle.position.manhattan(package.pickup);
        let reach = if vehicle.onboard.len() > config.heavy_onboard_threshold {
            config.reach_heavy
        } else {
            config.reach_light
        };
        if dist_to_pickup > reach {
            continue;
        }

        let (cx, cy) = dropoff_centroid(registry, vehicle);
        let similarity = cosine_similarity(
            cx - vehicle.position.x as f64,
            cy - vehicle.position.y as f64,
            (package.dropoff.x - package.pickup.x) as f64,
            (package.dropoff.y - package.pickup.y) as f64,
        );

        let endpoint = project_route_endpoint(registry, vehicle);
        let insertion_cost =
            endpoint.manhattan(package.pickup) + package.pickup.manhattan(package.dropoff);

        let limit = if similarity > config.aligned_similarity {
            config.aligned_cost_limit
        } else {
            config.divergent_cost_limit
        };

        debug!(
            vehicle = index,
            dist_to_pickup,
            similarity = format_args!("{similarity:.2}"),
            insertion_cost,
            limit,
            "assignment candidate"
        );

        // Strict less keeps the first (lowest-index) vehicle on ties.
        if insertion_cost <= limit && best.map_or(true, |(_, cost)| insertion_cost < cost) {
            best = Some((index, insertion_cost));
        }
    }

    best
}

/// One assignment pass. Returns the number of packages placed.
pub fn run_assignment_batch(registry: &mut Registry, config: &DispatchConfig) -> usize {
    let batch = registry.unassigned.len().min(config.batch_size);
    let mut assigned = 0;

    debug!(
        batch,
        queued = registry.unassigned.len(),
        "assignment batch start"
    );

    for _ in 0..batch {
        let Some(id) = registry.unassigned.pop_front() else {
            break;
        };

        let Some(package) = registry.package(id) else {
            debug!(id = id.0, "queued package no longer known, skipping");
            continue;
        };
        if package.assigned_to.is_some() || package.state != PackageState::Waiting {
            // Leaves the queue permanently once owned or delivered.
            continue;
        }
        let package = package.clone();

        match best_vehicle_for(registry, &package, config) {
            Some((index, cost)) => {
                let vehicle = &mut registry.vehicles[index];
                if vehicle.pending.len() >= config.slot_capacity {
                    debug!(
                        id = id.0,
                        vehicle = index,
                        "winner's pending slots full, re-queued"
                    );
                    registry.unassigned.push_back(id);
                    continue;
                }
                let owner = vehicle.id;
                vehicle.pending.push(id);
                if let Some(p) = registry.package_mut(id) {
                    p.assigned_to = Some(owner);
                }
                info!(
                    id = id.0,
                    vehicle = index,
                    insertion_cost = cost,
                    "package assigned"
                );
                assigned += 1;
            }
            None => {
                debug!(id = id.0, "no qualifying vehicle, re-queued");
                registry.unassigned.push_back(id);
            }
        }
    }

    assigned
}
