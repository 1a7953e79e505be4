//! Read-only view of the timetable the reached index is built over.
//!
//! The index only needs trip counts, stop counts and route boundaries. Trips of a
//! route occupy a contiguous id range, ordered by departure.

mod flat_schedule;
mod synthetic;

use std::ops::Range;

pub use flat_schedule::*;
pub use synthetic::*;

pub type TripId = usize;
pub type RouteId = usize;

pub trait Schedule {
    fn number_of_trips(&self) -> usize;

    fn number_of_routes(&self) -> usize;

    fn is_trip(&self, trip: TripId) -> bool {
        trip < self.number_of_trips()
    }

    fn number_of_stops_in_trip(&self, trip: TripId) -> usize;

    fn route_of_trip(&self, trip: TripId) -> RouteId;

    /// Boundary table of the routes: route `r` holds the trips
    /// `first_trip_of_route(r)..first_trip_of_route(r + 1)`, and
    /// `first_trip_of_route(number_of_routes())` is the trip count.
    fn first_trip_of_route(&self, route: RouteId) -> TripId;

    fn trips_of_route(&self, route: RouteId) -> Range<TripId> {
        self.first_trip_of_route(route)..self.first_trip_of_route(route + 1)
    }

    /// First trip id past the route of `trip`.
    #[inline]
    fn route_end(&self, trip: TripId) -> TripId {
        self.first_trip_of_route(self.route_of_trip(trip) + 1)
    }
}
