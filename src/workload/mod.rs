//! Synthetic profile scans that drive a reached index the way a round-based
//! trip search does: check a candidate, record it if new, then expand from it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    numerics::{FixedWidthVector, LaneValue, U8x16},
    reached::{MAX_ROUNDS, ProfileReachedIndex, ReachedIndexError},
    schedule::{Schedule, TripId},
    statistics::Stats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileScanParams {
    /// Trips boarded in the first round of every query.
    pub seeds: usize,
    /// Follow-up trips spawned by every label update.
    pub fanout: usize,
    pub round_limit: u8,
}

impl Default for ProfileScanParams {
    fn default() -> Self {
        ProfileScanParams {
            seeds: 8,
            fanout: 3,
            round_limit: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileScanError {
    #[error("round limit {0} outside 1..={MAX_ROUNDS}")]
    RoundLimit(u8),

    #[error(transparent)]
    Index(#[from] ReachedIndexError),
}

/// A reached index plus the frontier buffers of one worker, reused across queries.
pub struct ProfileScan<'a, S: Schedule, V: FixedWidthVector = U8x16> {
    index: ProfileReachedIndex<'a, S, V>,
    params: ProfileScanParams,
    frontier: Vec<(TripId, V::Lane)>,
    next_frontier: Vec<(TripId, V::Lane)>,
    touched: Vec<TripId>,
}

impl<'a, S: Schedule, V: FixedWidthVector> ProfileScan<'a, S, V> {
    pub fn new(schedule: &'a S, params: ProfileScanParams) -> Result<Self, ProfileScanError> {
        if !(1..=MAX_ROUNDS).contains(&params.round_limit) {
            return Err(ProfileScanError::RoundLimit(params.round_limit));
        }
        Ok(ProfileScan {
            index: ProfileReachedIndex::new(schedule)?,
            params,
            frontier: Vec::with_capacity(params.seeds),
            next_frontier: Vec::new(),
            touched: Vec::new(),
        })
    }

    pub fn index(&self) -> &ProfileReachedIndex<'a, S, V> {
        &self.index
    }

    /// Runs one query and returns the sum of the labels at the round limit of every
    /// trip it updated.
    ///
    /// The same rng state always yields the same checksum, whatever the backend.
    pub fn run_query<R: Rng>(&mut self, rng: &mut R, stats: &mut Stats) -> u64 {
        stats.bump_queries();
        self.index.clear();
        self.frontier.clear();
        self.touched.clear();

        for _ in 0..self.params.seeds {
            if let Some(target) = self.random_target(rng) {
                self.frontier.push(target);
            }
        }

        for round in 1..=self.params.round_limit {
            self.next_frontier.clear();
            for i in 0..self.frontier.len() {
                let (trip, position) = self.frontier[i];
                let pruned = self.index.already_reached(trip, position, round);
                stats.bump_reach_check(pruned);
                if pruned {
                    continue;
                }
                self.index.update(trip, position, round);
                stats.bump_updates();
                self.touched.push(trip);

                if round < self.params.round_limit {
                    for _ in 0..self.params.fanout {
                        if let Some(target) = self.random_target(rng) {
                            self.next_frontier.push(target);
                        }
                    }
                }
            }
            std::mem::swap(&mut self.frontier, &mut self.next_frontier);
        }

        self.touched
            .iter()
            .map(|&trip| self.index.position(trip, self.params.round_limit).to_count() as u64)
            .sum()
    }

    /// A random boardable (trip, position) pair, or `None` if the drawn trip has no
    /// stops or the schedule has no trips.
    fn random_target<R: Rng>(&self, rng: &mut R) -> Option<(TripId, V::Lane)> {
        let trips = self.index.num_trips();
        if trips == 0 {
            return None;
        }
        let trip = rng.random_range(0..trips);
        let stops = self.index.schedule().number_of_stops_in_trip(trip);
        if stops == 0 {
            return None;
        }
        // positions below the stop count always fit, the index was built with it.
        let position = V::Lane::from_count(rng.random_range(0..stops))?;
        Some((trip, position))
    }
}
