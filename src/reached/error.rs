use thiserror::Error;

use crate::{numerics::AllocationError, schedule::TripId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReachedIndexError {
    #[error("could not allocate reached labels for {trips} trips")]
    Allocation {
        trips: usize,
        #[source]
        source: AllocationError,
    },

    #[error("trip {trip} has {stops} stops, but labels only hold up to {max}")]
    TripTooLong {
        trip: TripId,
        stops: usize,
        max: usize,
    },
}
