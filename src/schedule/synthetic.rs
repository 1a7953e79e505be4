use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schedule::{FlatSchedule, FlatScheduleError, RouteShape, Schedule};

/// Shape of a randomly generated schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticScheduleParams {
    pub routes: usize,
    /// Every route gets `1 + Poisson(mean_extra_trips)` trips.
    pub mean_extra_trips: f64,
    pub min_stops: usize,
    pub max_stops: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntheticScheduleError {
    #[error("stop range {min}..={max} is empty")]
    EmptyStopRange { min: usize, max: usize },

    #[error("mean number of extra trips must be finite and non-negative, got {0}")]
    InvalidTripMean(f64),

    #[error(transparent)]
    Layout(#[from] FlatScheduleError),
}

impl Default for SyntheticScheduleParams {
    fn default() -> Self {
        SyntheticScheduleParams {
            routes: 1_000,
            mean_extra_trips: 20.0,
            min_stops: 5,
            max_stops: 60,
        }
    }
}

/// Draws a schedule with `params.routes` routes.
///
/// # Errors
///
/// Fails if the stop range is empty, the trip mean is negative or not finite, or
/// the drawn schedule cannot be laid out.
pub fn generate_schedule<R: Rng>(
    params: &SyntheticScheduleParams,
    rng: &mut R,
) -> Result<FlatSchedule, SyntheticScheduleError> {
    if params.min_stops > params.max_stops {
        return Err(SyntheticScheduleError::EmptyStopRange {
            min: params.min_stops,
            max: params.max_stops,
        });
    }
    let mean = params.mean_extra_trips;
    if !mean.is_finite() || mean < 0.0 {
        return Err(SyntheticScheduleError::InvalidTripMean(mean));
    }
    // Poisson wants a strictly positive rate.
    let extra_trips = if mean > 0.0 {
        Some(Poisson::new(mean).map_err(|_| SyntheticScheduleError::InvalidTripMean(mean))?)
    } else {
        None
    };

    let shapes: Vec<RouteShape> = (0..params.routes)
        .map(|_| {
            let extra = extra_trips
                .as_ref()
                .map_or(0, |poisson| poisson.sample(rng) as usize);
            RouteShape {
                trips: 1 + extra,
                stops: rng.random_range(params.min_stops..=params.max_stops),
            }
        })
        .collect();

    let schedule = FlatSchedule::from_routes(&shapes)?;
    debug!(
        routes = params.routes,
        trips = schedule.number_of_trips(),
        "generated synthetic schedule"
    );
    Ok(schedule)
}
