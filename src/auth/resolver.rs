//! Per-turn challenge resolution
//!
//! With a recovered seed, the local generator is replayed every turn with
//! the same draw count and order the oracle uses: one letter per onboard
//! slot per vehicle, in vehicle-index order, from the snapshot's published
//! onboard counts. Predicted strings are published without contacting the
//! oracle. Without a seed, single-letter challenges fall back to guessing
//! the alphabet against the oracle; anything longer is not enumerable and
//! the vehicle stays put.

use tracing::{debug, info, warn};

use crate::auth::rng::{OracleRng, AUTH_LETTERS};
use crate::auth::seed::{recover_seed, replay_references, ReferenceDraws, SeedWindow};
use crate::core::error::Result;
use crate::core::types::VehicleId;
use crate::ipc::Oracle;

#[derive(Debug)]
pub struct AuthResolver {
    /// Generator replaying the oracle's stream, already past the
    /// reference draws; `None` when recovery failed.
    replay: Option<OracleRng>,
}

impl AuthResolver {
    /// Resolver with no recovered seed; only the reactive fallback works
    pub fn unseeded() -> Self {
        Self { replay: None }
    }

    /// Attempt seed recovery around `now` and keep the replayed generator
    pub fn from_recovery(refs: &ReferenceDraws, window: SeedWindow, now: u64) -> Self {
        match recover_seed(refs, window, now) {
            Some(seed) => {
                info!(seed, "oracle seed recovered, challenges will be predicted");
                // recover_seed only returns verified candidates
                let replay = replay_references(seed, refs);
                Self { replay }
            }
            None => {
                warn!("unable to recover oracle seed, falling back to reactive guessing");
                Self { replay: None }
            }
        }
    }

    pub fn seed_known(&self) -> bool {
        self.replay.is_some()
    }

    /// Replay this turn's slice of the oracle stream.
    ///
    /// `onboard_counts` are the snapshot's published per-vehicle counts,
    /// clamped to the structural slot capacity — the same schedule the
    /// oracle draws on, so the replay never desynchronises. Zero-count
    /// vehicles yield `None`, as do all vehicles when no seed is known
    /// (in which case nothing is drawn at all).
    pub fn advance_turn(
        &mut self,
        onboard_counts: &[usize],
        slot_capacity: usize,
    ) -> Vec<Option<String>> {
        let Some(rng) = self.replay.as_mut() else {
            return vec![None; onboard_counts.len()];
        };

        onboard_counts
            .iter()
            .map(|&count| {
                let count = count.min(slot_capacity);
                if count == 0 {
                    None
                } else {
                    Some((0..count).map(|_| rng.next_letter()).collect())
                }
            })
            .collect()
    }

    /// Guess a single-letter challenge against the oracle, fixed trial
    /// order, until accepted or the alphabet is exhausted.
    pub fn reactive_single(
        &self,
        oracle: &mut dyn Oracle,
        vehicle: VehicleId,
    ) -> Result<Option<String>> {
        for letter in AUTH_LETTERS {
            let guess = letter.to_string();
            if oracle.grade(vehicle, &guess)? {
                debug!(vehicle = vehicle.0, %guess, "reactive guess accepted");
                return Ok(Some(guess));
            }
        }
        debug!(vehicle = vehicle.0, "reactive guesses exhausted");
        Ok(None)
    }
}
