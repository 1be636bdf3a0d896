//! Startup-parameter parsing
//!
//! The coordinator hands the agent a whitespace-delimited header. The
//! canonical field ordering (see DESIGN.md) is:
//!
//! ```text
//! grid_size vehicle_count oracle_count final_turn request_total
//! shared_key queue_key
//! oracle_key[0] .. oracle_key[oracle_count - 1]
//! ```
//!
//! Line breaks are not significant; any whitespace separates fields.
//! Malformed input is fatal.

use crate::auth::seed::ReferenceDraws;
use crate::core::error::{DispatchError, Result};
use crate::core::types::Turn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupParams {
    pub grid_size: u32,
    pub vehicle_count: usize,
    pub oracle_count: usize,
    pub final_turn: Turn,
    /// Total request count the coordinator will issue over the run
    pub request_total: u32,
    /// Shared-resource key (first reference draw of the oracle generator)
    pub shared_key: u32,
    /// Coordination-queue key (last reference draw)
    pub queue_key: u32,
    /// One handshake key per oracle (middle reference draws, in order)
    pub oracle_keys: Vec<u32>,
}

impl StartupParams {
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields = text.split_whitespace();
        let mut next = |name: &str| -> Result<u64> {
            let token = fields
                .next()
                .ok_or_else(|| DispatchError::Startup(format!("missing field: {name}")))?;
            token
                .parse::<u64>()
                .map_err(|_| DispatchError::Startup(format!("field {name} is not a number: {token:?}")))
        };

        let grid_size = next("grid_size")? as u32;
        let vehicle_count = next("vehicle_count")? as usize;
        let oracle_count = next("oracle_count")? as usize;
        let final_turn = next("final_turn")? as Turn;
        let request_total = next("request_total")? as u32;
        let shared_key = next("shared_key")? as u32;
        let queue_key = next("queue_key")? as u32;

        let mut oracle_keys = Vec::with_capacity(oracle_count);
        for i in 0..oracle_count {
            oracle_keys.push(next(&format!("oracle_key[{i}]"))? as u32);
        }

        if vehicle_count == 0 {
            return Err(DispatchError::Startup("vehicle_count must be positive".into()));
        }
        if grid_size == 0 {
            return Err(DispatchError::Startup("grid_size must be positive".into()));
        }

        Ok(Self {
            grid_size,
            vehicle_count,
            oracle_count,
            final_turn,
            request_total,
            shared_key,
            queue_key,
            oracle_keys,
        })
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// The known oracle-generator outputs used to verify a candidate seed
    pub fn reference_draws(&self) -> ReferenceDraws {
        ReferenceDraws {
            shared_key: self.shared_key,
            oracle_keys: self.oracle_keys.clone(),
            queue_key: self.queue_key,
        }
    }
}
