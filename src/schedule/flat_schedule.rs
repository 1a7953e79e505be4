use std::collections::TryReserveError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{RouteId, Schedule, TripId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlatScheduleError {
    #[error("total number of trips overflows at route {route}")]
    TooManyTrips { route: RouteId },

    #[error("could not allocate a schedule of {trips} trips")]
    Allocation {
        trips: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Number of trips of a route and number of stops each of them visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteShape {
    pub trips: usize,
    pub stops: usize,
}

/// An in-memory schedule made of routes laid out back to back.
///
/// Trip ids are assigned route by route, so the trips of each route form a
/// contiguous range. Serializes as the list of its [`RouteShape`]s.
///
/// # Examples
///
/// ```
/// use tripreach::schedule::{FlatSchedule, RouteShape, Schedule};
///
/// let schedule = FlatSchedule::from_routes(&[
///     RouteShape { trips: 2, stops: 5 },
///     RouteShape { trips: 3, stops: 8 },
/// ]).unwrap();
/// assert_eq!(schedule.number_of_trips(), 5);
/// assert_eq!(schedule.trips_of_route(1), 2..5);
/// assert_eq!(schedule.number_of_stops_in_trip(4), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RouteShape>", into = "Vec<RouteShape>")]
pub struct FlatSchedule {
    /// One entry per route plus the trip count as end sentinel.
    first_trip_of_route: Box<[TripId]>,
    route_of_trip: Box<[RouteId]>,
    stops_of_route: Box<[usize]>,
}

impl FlatSchedule {
    /// Lays out `routes` in order.
    ///
    /// # Errors
    ///
    /// Fails if the total number of trips overflows `usize` or its tables cannot be
    /// allocated.
    pub fn from_routes(routes: &[RouteShape]) -> Result<Self, FlatScheduleError> {
        let number_of_trips =
            routes
                .iter()
                .enumerate()
                .try_fold(0usize, |total, (route, shape)| {
                    total
                        .checked_add(shape.trips)
                        .ok_or(FlatScheduleError::TooManyTrips { route })
                })?;

        let mut first_trip_of_route = Vec::with_capacity(routes.len() + 1);
        let mut route_of_trip = Vec::new();
        route_of_trip
            .try_reserve_exact(number_of_trips)
            .map_err(|source| FlatScheduleError::Allocation {
                trips: number_of_trips,
                source,
            })?;
        for (route, shape) in routes.iter().enumerate() {
            first_trip_of_route.push(route_of_trip.len());
            route_of_trip.extend(std::iter::repeat_n(route, shape.trips));
        }
        first_trip_of_route.push(route_of_trip.len());

        Ok(FlatSchedule {
            first_trip_of_route: first_trip_of_route.into_boxed_slice(),
            route_of_trip: route_of_trip.into_boxed_slice(),
            stops_of_route: routes.iter().map(|r| r.stops).collect(),
        })
    }

    pub fn routes(&self) -> impl Iterator<Item = RouteShape> + '_ {
        self.first_trip_of_route
            .windows(2)
            .zip(self.stops_of_route.iter())
            .map(|(bounds, &stops)| RouteShape {
                trips: bounds[1] - bounds[0],
                stops,
            })
    }

    /// Largest stop count of any route, 0 for an empty schedule.
    pub fn max_stops(&self) -> usize {
        self.stops_of_route.iter().copied().max().unwrap_or(0)
    }
}

impl Schedule for FlatSchedule {
    #[inline]
    fn number_of_trips(&self) -> usize {
        self.route_of_trip.len()
    }

    #[inline]
    fn number_of_routes(&self) -> usize {
        self.stops_of_route.len()
    }

    #[inline]
    fn number_of_stops_in_trip(&self, trip: TripId) -> usize {
        self.stops_of_route[self.route_of_trip[trip]]
    }

    #[inline]
    fn route_of_trip(&self, trip: TripId) -> RouteId {
        self.route_of_trip[trip]
    }

    #[inline]
    fn first_trip_of_route(&self, route: RouteId) -> TripId {
        self.first_trip_of_route[route]
    }
}

impl TryFrom<Vec<RouteShape>> for FlatSchedule {
    type Error = FlatScheduleError;

    fn try_from(routes: Vec<RouteShape>) -> Result<Self, Self::Error> {
        FlatSchedule::from_routes(&routes)
    }
}

impl From<FlatSchedule> for Vec<RouteShape> {
    fn from(schedule: FlatSchedule) -> Self {
        schedule.routes().collect()
    }
}
