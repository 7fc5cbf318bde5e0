use std::collections::HashMap;

use crate::limits::*;
use crate::model::*;

use super::availability::{intersect_all, merge_all, subtract_intervals};
use super::lookup::lookup;
use super::slots::generate_slots;
use super::ScheduleError;

/// How candidate stylists combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingMode {
    /// No stylist chosen: salon hours only.
    SalonOnly,
    /// Exactly one stylist.
    FixedStylist,
    /// "No preference": a slot counts if any candidate can take it.
    AnyStylist,
}

impl BookingMode {
    pub fn for_candidates(count: usize) -> Self {
        match count {
            0 => BookingMode::SalonOnly,
            1 => BookingMode::FixedStylist,
            _ => BookingMode::AnyStylist,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookingMode::SalonOnly => "salon_only",
            BookingMode::FixedStylist => "fixed_stylist",
            BookingMode::AnyStylist => "any_stylist",
        }
    }
}

/// Everything one availability question needs, owned by the caller's request.
#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub salon: DayAvailability,
    pub schedule: EntitySchedule,
    pub candidates: Vec<StylistId>,
    pub duration: ServiceDuration,
    pub step: SlotStep,
    /// Already-booked time per stylist, removed from that stylist's availability.
    pub booked: HashMap<StylistId, Vec<TimeInterval>>,
}

impl SlotQuery {
    pub fn new(
        salon: DayAvailability,
        schedule: EntitySchedule,
        candidates: Vec<StylistId>,
        duration: ServiceDuration,
        step: SlotStep,
    ) -> Result<Self, ScheduleError> {
        if candidates.len() > MAX_CANDIDATES {
            return Err(ScheduleError::LimitExceeded("too many candidate stylists"));
        }
        if salon.intervals.len() > MAX_INTERVALS_PER_DAY {
            return Err(ScheduleError::LimitExceeded("too many salon intervals"));
        }
        Ok(Self {
            salon,
            schedule,
            candidates,
            duration,
            step,
            booked: HashMap::new(),
        })
    }

    pub fn with_booked(mut self, stylist: StylistId, intervals: Vec<TimeInterval>) -> Self {
        self.booked.entry(stylist).or_default().extend(intervals);
        self
    }

    pub fn day(&self) -> DayOfWeek {
        self.salon.day_of_week
    }

    pub fn mode(&self) -> BookingMode {
        BookingMode::for_candidates(self.candidates.len())
    }
}

/// Intervals during which the query's service can be booked with the
/// query's candidates, before slot quantization.
pub fn effective_intervals(query: &SlotQuery) -> Vec<TimeInterval> {
    if query.salon.is_closed {
        return Vec::new();
    }
    let salon = merge_all(&[query.salon.intervals.as_slice()]);

    match query.mode() {
        BookingMode::SalonOnly => salon,
        BookingMode::FixedStylist => stylist_intervals(query, &salon, &query.candidates[0]),
        BookingMode::AnyStylist => {
            let per_stylist: Vec<Vec<TimeInterval>> = query
                .candidates
                .iter()
                .map(|id| stylist_intervals(query, &salon, id))
                .collect();
            merge_all(&per_stylist)
        }
    }
}

/// Salon hours narrowed by one stylist's own schedule, minus their bookings.
pub fn stylist_intervals(
    query: &SlotQuery,
    salon: &[TimeInterval],
    stylist: &StylistId,
) -> Vec<TimeInterval> {
    let entry = lookup(&query.schedule, stylist, query.day());
    let available = intersect_all(salon, &entry);
    match query.booked.get(stylist) {
        Some(booked) if !booked.is_empty() && !available.is_empty() => {
            subtract_intervals(&available, &merge_all(&[booked.as_slice()]))
        }
        _ => available,
    }
}

/// Every bookable start time for the query, ascending and without duplicates.
pub fn resolve_slots(query: &SlotQuery) -> Vec<ClockTime> {
    if query.salon.is_closed {
        return Vec::new();
    }
    let mut slots: Vec<ClockTime> = effective_intervals(query)
        .iter()
        .flat_map(|interval| generate_slots(interval, query.duration, query.step))
        .collect();
    slots.sort_unstable();
    slots.dedup();
    slots
}

/// Whether `start` is one of the query's bookable start times.
pub fn is_bookable(query: &SlotQuery, start: ClockTime) -> bool {
    resolve_slots(query).binary_search(&start).is_ok()
}
