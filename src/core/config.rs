//! Dispatch configuration with documented constants
//!
//! All tuning values are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::Deserialize;

use crate::auth::seed::SeedWindow;
use crate::core::error::Result;

/// Configuration for the dispatch engine
///
/// The defaults are the canonical tuning for the delivery environment.
/// Changing them shifts how aggressively vehicles pool packages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    // === ASSIGNMENT ===
    /// Maximum unassigned packages considered per turn
    ///
    /// The queue head is processed in FIFO order, one pass, no reordering.
    /// A smaller batch spreads matching work across turns; a larger one
    /// drains the backlog faster at the price of staler pairings.
    pub batch_size: usize,

    /// Soft planning capacity (onboard + pending) per vehicle
    ///
    /// Only the assignment engine enforces this. At 5, a vehicle stops
    /// receiving new work well below its structural slot limit, keeping
    /// routes short.
    pub soft_capacity: usize,

    /// Structural slot limit per vehicle
    ///
    /// Hard bound on the onboard and pending slot lists. Matches the
    /// coordinator's per-vehicle auth-string buffer, so a challenge can
    /// never be longer than this.
    pub slot_capacity: usize,

    /// Onboard count above which the tighter reach threshold applies
    pub heavy_onboard_threshold: usize,

    /// Pickup reach for vehicles above the heavy threshold (cells)
    ///
    /// Heavier vehicles must be closer to a pickup to qualify: they
    /// already have dropoffs to make, so long detours cost more.
    pub reach_heavy: i32,

    /// Pickup reach for lightly loaded vehicles (cells)
    pub reach_light: i32,

    /// Cosine similarity above which a package counts as "aligned"
    ///
    /// Aligned packages continue the vehicle's current direction of
    /// travel and are allowed a larger insertion cost.
    pub aligned_similarity: f64,

    /// Insertion-cost ceiling for aligned packages (cells)
    pub aligned_cost_limit: i32,

    /// Insertion-cost ceiling for everything else (cells)
    pub divergent_cost_limit: i32,

    // === STATE MODEL ===
    /// Exclusive upper bound of the valid package id range
    ///
    /// Arrival records outside `0..max_packages` are dropped with a
    /// diagnostic rather than aborting the turn.
    pub max_packages: u32,

    // === SEED RECOVERY ===
    /// Seconds ahead of "now" to search for the oracle seed
    ///
    /// Covers clock skew between this process and the oracle host.
    pub seed_ahead_secs: u32,

    /// Seconds behind "now" to search for the oracle seed
    ///
    /// The oracle seeds once near its own start; 20000 seconds covers
    /// roughly five and a half hours of prior uptime.
    pub seed_behind_secs: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            // Assignment
            batch_size: 10,
            soft_capacity: 5,
            slot_capacity: 20,
            heavy_onboard_threshold: 2,
            reach_heavy: 3,
            reach_light: 4,
            aligned_similarity: 0.7,
            aligned_cost_limit: 4,
            divergent_cost_limit: 2,

            // State model
            max_packages: 5000,

            // Seed recovery
            seed_ahead_secs: 2000,
            seed_behind_secs: 20000,
        }
    }
}

impl DispatchConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a TOML file; absent keys keep their defaults
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be positive".into());
        }

        // The soft limit only means something below the structural one
        if self.soft_capacity > self.slot_capacity {
            return Err(format!(
                "soft_capacity ({}) should be <= slot_capacity ({})",
                self.soft_capacity, self.slot_capacity
            ));
        }

        if self.reach_heavy > self.reach_light {
            return Err(format!(
                "reach_heavy ({}) should be <= reach_light ({})",
                self.reach_heavy, self.reach_light
            ));
        }

        if self.divergent_cost_limit > self.aligned_cost_limit {
            return Err(format!(
                "divergent_cost_limit ({}) should be <= aligned_cost_limit ({})",
                self.divergent_cost_limit, self.aligned_cost_limit
            ));
        }

        if !(0.0..=1.0).contains(&self.aligned_similarity) {
            return Err(format!(
                "aligned_similarity ({}) must be within [0, 1]",
                self.aligned_similarity
            ));
        }

        if self.max_packages == 0 {
            return Err("max_packages must be positive".into());
        }

        Ok(())
    }

    /// The seed-search window implied by this config
    pub fn seed_window(&self) -> SeedWindow {
        SeedWindow {
            ahead_secs: self.seed_ahead_secs,
            behind_secs: self.seed_behind_secs,
        }
    }
}
