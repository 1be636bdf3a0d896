//! The owned state model threaded through every component call
//!
//! Holds the package table, the unassigned FIFO, and the fixed vehicle
//! fleet. The registry, not the coordinator's snapshot, is the canonical
//! source of vehicle load during planning.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::core::types::{Cell, PackageId, VehicleId};
use crate::model::package::{Package, PackageState};
use crate::model::vehicle::Vehicle;

#[derive(Debug, Clone)]
pub struct Registry {
    packages: AHashMap<PackageId, Package>,
    /// FIFO of Waiting package ids with no owning vehicle
    pub unassigned: VecDeque<PackageId>,
    pub vehicles: Vec<Vehicle>,
}

impl Registry {
    /// New registry with `vehicle_count` vehicles at the origin; real
    /// positions arrive with the first snapshot.
    pub fn new(vehicle_count: usize) -> Self {
        let vehicles = (0..vehicle_count)
            .map(|i| Vehicle::new(VehicleId(i as u32), Cell::default()))
            .collect();
        Self {
            packages: AHashMap::new(),
            unassigned: VecDeque::new(),
            vehicles,
        }
    }

    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    pub fn package_mut(&mut self, id: PackageId) -> Option<&mut Package> {
        self.packages.get_mut(&id)
    }

    pub fn contains(&self, id: PackageId) -> bool {
        self.packages.contains_key(&id)
    }

    /// Register a new arrival and queue it at the tail
    pub fn admit(&mut self, package: Package) {
        let id = package.id;
        self.packages.insert(id, package);
        self.unassigned.push_back(id);
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn delivered_count(&self) -> usize {
        self.packages.values().filter(|p| p.is_delivered()).count()
    }

    /// Package ids in ascending order, for deterministic scans
    pub fn package_ids_sorted(&self) -> Vec<PackageId> {
        let mut ids: Vec<PackageId> = self.packages.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Rebuild every vehicle's onboard/pending slot lists by scanning all
    /// non-Delivered packages whose owner matches, in ascending id order.
    ///
    /// `slot_capacity` bounds each list; an over-full owner silently stops
    /// accepting slots, matching the structural limit.
    pub fn rebuild_vehicle_loads(&mut self, slot_capacity: usize) {
        for vehicle in &mut self.vehicles {
            vehicle.clear_load();
        }

        for id in self.package_ids_sorted() {
            let package = &self.packages[&id];
            if package.is_delivered() {
                continue;
            }
            let Some(owner) = package.assigned_to else {
                continue;
            };
            let Some(vehicle) = self.vehicles.get_mut(owner.index()) else {
                continue;
            };

            match package.state {
                PackageState::OnTruck => {
                    if vehicle.onboard.len() < slot_capacity {
                        vehicle.onboard.push(id);
                    }
                }
                PackageState::Waiting => {
                    if vehicle.pending.len() < slot_capacity {
                        vehicle.pending.push(id);
                    }
                }
                PackageState::Delivered => {}
            }
        }
    }
}
