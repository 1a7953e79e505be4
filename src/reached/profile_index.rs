use std::{
    fmt::Debug,
    ops::{Index, IndexMut},
};

use tracing::debug;

use crate::{
    numerics::{
        AlignedVec, FixedWidthVector, LANES, LaneValue, U8x16, aligned_vec_from_elem,
        lanes::BACKEND_NAME,
    },
    reached::{MAX_ROUNDS, ReachedIndexError},
    schedule::{Schedule, TripId},
};

/// Reachability labels of every trip of a schedule, one lane per round.
///
/// Lane `r - 1` of trip `t` holds the smallest stop position of `t` known to be
/// reachable within `r` rounds. A lane equal to the trip's stop count means "not
/// reached yet".
///
/// # Invariants
/// - Along the lanes of one trip, labels never increase: more rounds never reach
///   less.
/// - Along the trips of one route, at a fixed round, labels never increase: a
///   later trip of the route can be boarded wherever an earlier one can.
///   [`update`](Self::update) maintains this and relies on it to stop early.
///
/// Use the [`ReachedIndex`](crate::reached::ReachedIndex) and
/// [`WideReachedIndex`](crate::reached::WideReachedIndex) aliases.
///
/// # Examples
///
/// ```
/// use tripreach::reached::ReachedIndex;
/// use tripreach::schedule::{FlatSchedule, RouteShape};
///
/// let schedule = FlatSchedule::from_routes(&[RouteShape { trips: 3, stops: 10 }]).unwrap();
/// let mut index = ReachedIndex::new(&schedule).unwrap();
///
/// index.update(0, 4, 2);
/// assert!(index.already_reached(0, 4, 2));
/// assert!(index.already_reached(2, 4, 3));
/// assert!(!index.already_reached(0, 4, 1));
///
/// index.clear();
/// assert!(!index.already_reached(0, 4, 2));
/// ```
pub struct ProfileReachedIndex<'a, S: Schedule, V: FixedWidthVector = U8x16> {
    schedule: &'a S,
    default_labels: AlignedVec<V>,
    labels: AlignedVec<V>,
    /// `round_masks[r - 1]` is all-ones in the lanes of rounds before `r`.
    round_masks: [V; LANES],
}

impl<'a, S: Schedule, V: FixedWidthVector> ProfileReachedIndex<'a, S, V> {
    /// Builds cleared labels for every trip of `schedule`.
    ///
    /// # Errors
    ///
    /// - [`ReachedIndexError::TripTooLong`] if a stop count does not fit in a lane.
    /// - [`ReachedIndexError::Allocation`] if the label storage cannot be allocated.
    pub fn new(schedule: &'a S) -> Result<Self, ReachedIndexError> {
        let trips = schedule.number_of_trips();
        let allocate = || {
            aligned_vec_from_elem(V::default(), trips)
                .map_err(|source| ReachedIndexError::Allocation { trips, source })
        };

        let mut default_labels: AlignedVec<V> = allocate()?;
        for (trip, label) in default_labels.iter_mut().enumerate() {
            let stops = schedule.number_of_stops_in_trip(trip);
            let sentinel =
                V::Lane::from_count(stops).ok_or(ReachedIndexError::TripTooLong {
                    trip,
                    stops,
                    max: V::Lane::MAX.to_count(),
                })?;
            *label = V::splat(sentinel);
        }

        let mut labels = allocate()?;
        labels.copy_from_slice(&default_labels);

        debug!(
            trips,
            label_bytes = 2 * trips * size_of::<V>(),
            backend = BACKEND_NAME,
            "built reached index"
        );

        Ok(ProfileReachedIndex {
            schedule,
            default_labels,
            labels,
            round_masks: std::array::from_fn(|round_lane| {
                let mut mask = V::default();
                for lane in 0..round_lane {
                    mask[lane] = V::Lane::MAX;
                }
                mask
            }),
        })
    }

    /// Forgets every update since construction.
    #[inline]
    pub fn clear(&mut self) {
        self.labels.copy_from_slice(&self.default_labels);
    }

    /// Whether `position` of `trip` is already reached within `round` rounds.
    ///
    /// # Panics
    ///
    /// If `trip` is not a trip of the schedule or `round` is outside
    /// `1..=MAX_ROUNDS` (see the module docs for when this is checked).
    #[inline]
    pub fn already_reached(&self, trip: TripId, position: V::Lane, round: u8) -> bool {
        self.position(trip, round) <= position
    }

    /// Records that `trip` reaches `position` within `round` rounds.
    ///
    /// The label is lowered for every round from `round` on, and for every later
    /// trip of the same route, until a trip that already reaches `position` at
    /// `round` is met. Earlier rounds are left alone.
    ///
    /// # Panics
    ///
    /// Same contract as [`already_reached`](Self::already_reached).
    #[inline]
    pub fn update(&mut self, trip: TripId, position: V::Lane, round: u8) {
        let lane = self.round_lane(trip, round);

        // lanes of earlier rounds are forced to MAX, so the minimum keeps them.
        let mut clamp = V::splat(position);
        clamp.max_in_place(self.round_masks[lane]);

        let route_end = self.schedule.route_end(trip);
        let mut current = trip;
        while current < route_end && self.labels[current][lane] > position {
            self.labels[current].min_in_place(clamp);
            current += 1;
        }

        #[cfg(all(debug_assertions, not(feature = "unchecked-preconditions")))]
        self.assert_rest_of_route_reached(current, route_end, position, lane);
    }

    /// The mask [`update`](Self::update) uses for `round`: all-ones in the lanes of
    /// the rounds before it.
    pub fn round_mask(&self, round: u8) -> V {
        precondition!(
            (1..=MAX_ROUNDS).contains(&round),
            "round {round} outside 1..={MAX_ROUNDS}"
        );
        self.round_masks[usize::from(round) - 1]
    }

    /// Label of `trip` at `round`.
    #[inline]
    pub fn position(&self, trip: TripId, round: u8) -> V::Lane {
        let lane = self.round_lane(trip, round);
        self.labels[trip][lane]
    }

    /// Mutable label of `trip` at `round`, bypassing propagation.
    ///
    /// Writes through this reference are not checked against the invariants of the
    /// index.
    #[inline]
    pub fn position_mut(&mut self, trip: TripId, round: u8) -> &mut V::Lane {
        let lane = self.round_lane(trip, round);
        &mut self.labels[trip][lane]
    }

    /// All rounds of `trip` as one vector.
    pub fn element(&self, trip: TripId) -> &V {
        precondition!(
            self.schedule.is_trip(trip),
            "trip {trip} is not part of the schedule"
        );
        &self.labels[trip]
    }

    pub fn num_trips(&self) -> usize {
        self.labels.len()
    }

    /// Whether the labels are in their cleared state.
    pub fn is_cleared(&self) -> bool {
        self.labels == self.default_labels
    }

    pub fn schedule(&self) -> &'a S {
        self.schedule
    }

    #[inline(always)]
    fn round_lane(&self, trip: TripId, round: u8) -> usize {
        precondition!(
            self.schedule.is_trip(trip),
            "trip {trip} is not part of the schedule"
        );
        precondition!(
            (1..=MAX_ROUNDS).contains(&round),
            "round {round} outside 1..={MAX_ROUNDS}"
        );
        usize::from(round) - 1
    }

    /// The early exit of `update` is only sound if the trips it skipped already
    /// reach `position`.
    #[cfg(all(debug_assertions, not(feature = "unchecked-preconditions")))]
    fn assert_rest_of_route_reached(
        &self,
        from: TripId,
        route_end: TripId,
        position: V::Lane,
        lane: usize,
    ) {
        if let Some(trip) = (from..route_end).find(|&t| self.labels[t][lane] > position) {
            panic!(
                "labels of route ending at trip {route_end} increase along the route: \
                 trip {trip} has {:?} at round {} after an earlier trip reached {:?}",
                self.labels[trip][lane],
                lane + 1,
                position,
            );
        }
    }
}

impl<S: Schedule, V: FixedWidthVector> Index<(TripId, u8)> for ProfileReachedIndex<'_, S, V> {
    type Output = V::Lane;

    #[inline]
    fn index(&self, (trip, round): (TripId, u8)) -> &V::Lane {
        let lane = self.round_lane(trip, round);
        &self.labels[trip][lane]
    }
}

impl<S: Schedule, V: FixedWidthVector> IndexMut<(TripId, u8)> for ProfileReachedIndex<'_, S, V> {
    #[inline]
    fn index_mut(&mut self, (trip, round): (TripId, u8)) -> &mut V::Lane {
        self.position_mut(trip, round)
    }
}

impl<S: Schedule, V: FixedWidthVector> Debug for ProfileReachedIndex<'_, S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileReachedIndex")
            .field("trips", &self.labels.len())
            .field("backend", &BACKEND_NAME)
            .field("cleared", &self.is_cleared())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;

    use super::*;
    use crate::{
        numerics::U16x16,
        reached::{ReachedIndex, WideReachedIndex},
        schedule::{FlatSchedule, RouteShape},
    };

    fn single_route(trips: usize, stops: usize) -> FlatSchedule {
        FlatSchedule::from_routes(&[RouteShape { trips, stops }]).unwrap()
    }

    /// `update` without the early exit: walks the whole rest of the route.
    fn full_scan_update(labels: &mut [[u8; LANES]], route_end: usize, trip: usize, position: u8, round: u8) {
        for label in &mut labels[trip..route_end] {
            for lane in usize::from(round) - 1..LANES {
                label[lane] = label[lane].min(position);
            }
        }
    }

    #[test]
    fn test_new_sets_sentinels() {
        let schedule = FlatSchedule::from_routes(&[
            RouteShape { trips: 2, stops: 7 },
            RouteShape { trips: 1, stops: 3 },
        ]).unwrap();
        let index = ReachedIndex::new(&schedule).unwrap();

        assert_eq!(index.num_trips(), 3);
        assert!(index.is_cleared());
        assert_eq!(*index.element(0), U8x16::splat(7));
        assert_eq!(*index.element(1), U8x16::splat(7));
        assert_eq!(*index.element(2), U8x16::splat(3));
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = FlatSchedule::from_routes(&[]).unwrap();
        let mut index = ReachedIndex::new(&schedule).unwrap();
        assert_eq!(index.num_trips(), 0);
        index.clear();
        assert!(index.is_cleared());
    }

    #[test]
    fn test_labels_are_aligned() {
        let schedule = single_route(33, 4);
        let index = ReachedIndex::new(&schedule).unwrap();
        assert_eq!(index.labels.as_ptr() as usize % 16, 0);
        assert_eq!(index.default_labels.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn test_round_masks() {
        let schedule = single_route(1, 4);
        let index = ReachedIndex::new(&schedule).unwrap();

        assert_eq!(index.round_mask(1), U8x16::splat(0));
        for round in 1..=MAX_ROUNDS {
            let mask = index.round_mask(round);
            for lane in 0..LANES {
                let expected = if lane + 1 < usize::from(round) { u8::MAX } else { 0 };
                assert_eq!(mask[lane], expected, "round {round} lane {lane}");
            }
        }
    }

    #[test]
    fn test_update_scenario() {
        let schedule = single_route(1, 10);
        let mut index = ReachedIndex::new(&schedule).unwrap();

        index.update(0, 3, 2);

        assert!(index.already_reached(0, 3, 2));
        assert!(!index.already_reached(0, 2, 2));
        assert!(!index.already_reached(0, 3, 1));
        assert!(index.already_reached(0, 3, 5));
        assert_eq!(index.position(0, 1), 10);
        assert_eq!(index.position(0, 15), 3);
        assert!(!index.is_cleared());
    }

    #[test]
    fn test_update_propagates_along_route() {
        let schedule = FlatSchedule::from_routes(&[
            RouteShape { trips: 3, stops: 8 },
            RouteShape { trips: 2, stops: 8 },
        ]).unwrap();
        let mut index = ReachedIndex::new(&schedule).unwrap();

        index.update(0, 5, 1);

        for trip in 0..3 {
            assert!(index.already_reached(trip, 5, 1), "trip {trip}");
        }
        // the next route is untouched.
        for trip in 3..5 {
            assert!(!index.already_reached(trip, 7, 1), "trip {trip}");
        }
    }

    #[test]
    fn test_update_does_not_touch_earlier_trips() {
        let schedule = single_route(4, 8);
        let mut index = ReachedIndex::new(&schedule).unwrap();

        index.update(2, 1, 3);

        assert_eq!(*index.element(0), U8x16::splat(8));
        assert_eq!(*index.element(1), U8x16::splat(8));
        assert!(index.already_reached(2, 1, 3));
        assert!(index.already_reached(3, 1, 3));
    }

    #[test]
    fn test_update_stops_at_trip_already_as_good() {
        let schedule = single_route(3, 9);
        let mut index = ReachedIndex::new(&schedule).unwrap();

        index.update(1, 2, 1);
        let before = (*index.element(1), *index.element(2));

        index.update(0, 6, 3);

        assert_eq!(index.position(0, 3), 6);
        assert_eq!(index.position(0, 1), 9);
        assert_eq!((*index.element(1), *index.element(2)), before);
    }

    #[test]
    fn test_worse_update_is_a_no_op() {
        let schedule = single_route(2, 9);
        let mut index = ReachedIndex::new(&schedule).unwrap();

        index.update(0, 2, 1);
        let snapshot: Vec<U8x16> = index.labels.to_vec();
        index.update(0, 5, 4);
        assert_eq!(index.labels.to_vec(), snapshot);
    }

    #[test]
    fn test_clear_resets_everything() {
        let schedule = single_route(5, 12);
        let mut index = ReachedIndex::new(&schedule).unwrap();

        index.update(0, 0, 1);
        index.update(3, 4, 7);
        index[(4, 9)] = 1;
        index.clear();

        assert!(index.is_cleared());
        for trip in 0..5 {
            for round in 1..=MAX_ROUNDS {
                assert_eq!(index.position(trip, round), 12);
            }
        }
    }

    #[test]
    fn test_index_access() {
        let schedule = single_route(2, 6);
        let mut index = ReachedIndex::new(&schedule).unwrap();

        index[(1, 4)] = 2;
        assert_eq!(index[(1, 4)], 2);
        assert_eq!(index.position(1, 4), 2);
        assert_eq!(index.position(1, 5), 6);

        *index.position_mut(0, 15) = 0;
        assert!(index.already_reached(0, 0, 15));
        // lane 15 is never addressed by a round.
        assert_eq!(index.element(0)[15], 6);
    }

    #[test]
    fn test_longest_trip_fits() {
        let schedule = single_route(2, 255);
        let mut index = ReachedIndex::new(&schedule).unwrap();
        assert!(!index.already_reached(0, 254, 1));
        assert!(index.already_reached(0, 255, 1));
        index.update(0, 254, 1);
        assert!(index.already_reached(1, 254, 15));
    }

    #[test]
    fn test_too_long_trip_is_rejected() {
        let schedule = FlatSchedule::from_routes(&[
            RouteShape { trips: 2, stops: 10 },
            RouteShape { trips: 1, stops: 256 },
        ]).unwrap();
        let err = ReachedIndex::new(&schedule).unwrap_err();
        assert_eq!(
            err,
            ReachedIndexError::TripTooLong {
                trip: 2,
                stops: 256,
                max: 255
            }
        );
    }

    #[test]
    fn test_wide_index_holds_long_trips() {
        let schedule = single_route(3, 1_000);
        let mut index = WideReachedIndex::new(&schedule).unwrap();

        assert_eq!(*index.element(0), U16x16::splat(1_000));
        assert!(!index.already_reached(1, 999, 3));

        index.update(0, 700, 3);
        assert!(index.already_reached(2, 700, 3));
        assert!(index.already_reached(2, 700, 15));
        assert!(!index.already_reached(2, 700, 2));
        assert_eq!(index.position(1, 2), 1_000);
    }

    #[cfg(any(debug_assertions, not(feature = "unchecked-preconditions")))]
    #[test]
    #[should_panic(expected = "round 0 outside")]
    fn test_round_zero_panics() {
        let schedule = single_route(1, 4);
        let index = ReachedIndex::new(&schedule).unwrap();
        index.already_reached(0, 1, 0);
    }

    #[cfg(any(debug_assertions, not(feature = "unchecked-preconditions")))]
    #[test]
    #[should_panic(expected = "round 16 outside")]
    fn test_round_sixteen_panics() {
        let schedule = single_route(1, 4);
        let mut index = ReachedIndex::new(&schedule).unwrap();
        index.update(0, 1, 16);
    }

    #[cfg(any(debug_assertions, not(feature = "unchecked-preconditions")))]
    #[test]
    #[should_panic(expected = "is not part of the schedule")]
    fn test_invalid_trip_panics() {
        let schedule = single_route(2, 4);
        let index = ReachedIndex::new(&schedule).unwrap();
        index.already_reached(2, 1, 1);
    }

    #[cfg(all(debug_assertions, not(feature = "unchecked-preconditions")))]
    #[test]
    #[should_panic(expected = "increase along the route")]
    fn test_broken_route_order_is_caught() {
        let schedule = single_route(3, 8);
        let mut index = ReachedIndex::new(&schedule).unwrap();

        // trip 1 reaches stop 2 but trip 2 does not: the route order is broken.
        index[(1, 1)] = 2;
        index.update(0, 4, 1);
    }

    #[test]
    fn test_debug_formatting() {
        let schedule = single_route(2, 4);
        let index = ReachedIndex::new(&schedule).unwrap();
        let text = format!("{index:?}");
        assert!(text.contains("ProfileReachedIndex"));
        assert!(text.contains("trips: 2"));
        assert!(text.contains(BACKEND_NAME));
    }

    #[test]
    fn test_randomized_matches_full_scan() {
        let mut rng = StdRng::seed_from_u64(42);
        let shapes: Vec<RouteShape> = (0..20)
            .map(|_| RouteShape {
                trips: rng.random_range(1..8),
                stops: rng.random_range(2..40),
            })
            .collect();
        let schedule = FlatSchedule::from_routes(&shapes).unwrap();
        let mut index = ReachedIndex::new(&schedule).unwrap();

        let mut expected: Vec<[u8; LANES]> =
            index.labels.iter().map(|label| label.to_array()).collect();

        for _ in 0..2_000 {
            let trip = rng.random_range(0..schedule.number_of_trips());
            let stops = schedule.number_of_stops_in_trip(trip) as u8;
            let position = rng.random_range(0..stops);
            let round = rng.random_range(1..=MAX_ROUNDS);

            index.update(trip, position, round);
            full_scan_update(&mut expected, schedule.route_end(trip), trip, position, round);
        }

        for (trip, label) in index.labels.iter().enumerate() {
            assert_eq!(label.to_array(), expected[trip], "trip {trip}");
        }
    }
}
