use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::ScheduleError;

/// Minutes in one day. Every `ClockTime` is strictly below this.
pub const MINUTES_PER_DAY: u16 = 1440;

pub type StylistId = Ulid;
pub type ServiceId = Ulid;

// ── ClockTime ────────────────────────────────────────────────────

/// Local wall-clock time as minutes since midnight, in `[0, 1440)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub fn from_minutes(minutes: u16) -> Result<Self, ScheduleError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(ScheduleError::InvalidTime {
                input: minutes.to_string(),
                reason: "past end of day",
            });
        }
        Ok(Self(minutes))
    }

    pub fn hm(hour: u16, minute: u16) -> Result<Self, ScheduleError> {
        if hour >= 24 || minute >= 60 {
            return Err(ScheduleError::InvalidTime {
                input: format!("{hour}:{minute}"),
                reason: "hour or minute out of range",
            });
        }
        Ok(Self(hour * 60 + minute))
    }

    /// Caller guarantees `minutes < MINUTES_PER_DAY`.
    pub(crate) const fn new_unchecked(minutes: u16) -> Self {
        debug_assert!(minutes < MINUTES_PER_DAY);
        Self(minutes)
    }

    /// Parse a strict, zero-padded `HH:mm` string.
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        let invalid = |reason| ScheduleError::InvalidTime {
            input: input.to_string(),
            reason,
        };
        let bytes = input.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid("expected HH:mm"));
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid("expected HH:mm"));
        }
        let [h1, h2, m1, m2] = digits.map(|d| u16::from(d - b'0'));
        let hour = h1 * 10 + h2;
        let minute = m1 * 10 + m2;
        if hour >= 24 {
            return Err(invalid("hour out of range"));
        }
        if minute >= 60 {
            return Err(invalid("minute out of range"));
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

// ── TimeInterval ─────────────────────────────────────────────────

/// Half-open clock interval `[open, close)` with `open < close`.
///
/// Ordering is by `open`, then `close` (field order), which is the order
/// every merge step sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct TimeInterval {
    open: ClockTime,
    close: ClockTime,
}

/// Unvalidated `{open, close}` pair as it appears in schedule data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInterval {
    pub open: ClockTime,
    pub close: ClockTime,
}

impl TimeInterval {
    pub fn new(open: ClockTime, close: ClockTime) -> Result<Self, ScheduleError> {
        if open >= close {
            return Err(ScheduleError::EmptyInterval { open, close });
        }
        Ok(Self { open, close })
    }

    pub fn parse(open: &str, close: &str) -> Result<Self, ScheduleError> {
        Self::new(ClockTime::parse(open)?, ClockTime::parse(close)?)
    }

    /// Caller guarantees `open < close`.
    pub(crate) fn from_bounds(open: ClockTime, close: ClockTime) -> Self {
        debug_assert!(open < close, "interval open must be before close");
        Self { open, close }
    }

    pub fn open(&self) -> ClockTime {
        self.open
    }

    pub fn close(&self) -> ClockTime {
        self.close
    }

    pub fn len_minutes(&self) -> u16 {
        self.close.minutes() - self.open.minutes()
    }

    /// Overlap where shared endpoints count. This is the merge criterion.
    pub fn overlaps_or_touches(&self, other: &TimeInterval) -> bool {
        self.open <= other.close && other.open <= self.close
    }

    /// Common sub-interval, if any. Touching intervals have none.
    pub fn intersect(&self, other: &TimeInterval) -> Option<TimeInterval> {
        let open = self.open.max(other.open);
        let close = self.close.min(other.close);
        (open < close).then(|| TimeInterval::from_bounds(open, close))
    }

    pub fn contains(&self, t: ClockTime) -> bool {
        self.open <= t && t < self.close
    }
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = ScheduleError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.open, raw.close)
    }
}

impl From<TimeInterval> for RawInterval {
    fn from(i: TimeInterval) -> Self {
        RawInterval {
            open: i.open,
            close: i.close,
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.open, self.close)
    }
}

// ── DayOfWeek ────────────────────────────────────────────────────

/// Sunday-first day index: 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const SUNDAY: DayOfWeek = DayOfWeek(0);
    pub const MONDAY: DayOfWeek = DayOfWeek(1);
    pub const TUESDAY: DayOfWeek = DayOfWeek(2);
    pub const WEDNESDAY: DayOfWeek = DayOfWeek(3);
    pub const THURSDAY: DayOfWeek = DayOfWeek(4);
    pub const FRIDAY: DayOfWeek = DayOfWeek(5);
    pub const SATURDAY: DayOfWeek = DayOfWeek(6);

    pub const ALL: [DayOfWeek; 7] = [
        Self::SUNDAY,
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
        Self::SATURDAY,
    ];

    pub fn new(index: u8) -> Result<Self, ScheduleError> {
        if index > 6 {
            return Err(ScheduleError::InvalidDayOfWeek(index));
        }
        Ok(Self(index))
    }

    /// Day of week for a day count relative to 1970-01-01 (a Thursday).
    pub fn from_days_since_epoch(days: i64) -> Self {
        Self(((days.rem_euclid(7) + 4) % 7) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        const NAMES: [&str; 7] = [
            "Sunday",
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
        ];
        NAMES[self.index()]
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = ScheduleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(d: DayOfWeek) -> Self {
        d.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── DayAvailability ──────────────────────────────────────────────

/// Opening hours of the salon or one stylist on one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDay", into = "RawDay")]
pub struct DayAvailability {
    pub day_of_week: DayOfWeek,
    /// When set, `intervals` is ignored.
    pub is_closed: bool,
    pub intervals: Vec<TimeInterval>,
}

/// Wire form of a day: intervals are not yet checked for `open < close`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDay {
    pub day_of_week: DayOfWeek,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub intervals: Vec<RawInterval>,
}

impl DayAvailability {
    pub fn open(day_of_week: DayOfWeek, intervals: Vec<TimeInterval>) -> Self {
        Self {
            day_of_week,
            is_closed: false,
            intervals,
        }
    }

    pub fn closed(day_of_week: DayOfWeek) -> Self {
        Self {
            day_of_week,
            is_closed: true,
            intervals: Vec::new(),
        }
    }

    /// Build a day from unvalidated bounds, dropping zero-length and inverted
    /// intervals.
    pub fn from_raw(day_of_week: DayOfWeek, is_closed: bool, raw: &[RawInterval]) -> Self {
        let intervals = raw
            .iter()
            .filter_map(|r| match TimeInterval::try_from(*r) {
                Ok(interval) => Some(interval),
                Err(_) => {
                    tracing::warn!(
                        "dropping empty interval {}-{} on {day_of_week}",
                        r.open,
                        r.close
                    );
                    None
                }
            })
            .collect();
        Self {
            day_of_week,
            is_closed,
            intervals,
        }
    }

    /// Parse `("HH:mm", "HH:mm")` pairs. Malformed times fail; inverted pairs are dropped.
    pub fn parse(day_of_week: DayOfWeek, pairs: &[(&str, &str)]) -> Result<Self, ScheduleError> {
        let raw = pairs
            .iter()
            .map(|(open, close)| {
                Ok(RawInterval {
                    open: ClockTime::parse(open)?,
                    close: ClockTime::parse(close)?,
                })
            })
            .collect::<Result<Vec<_>, ScheduleError>>()?;
        Ok(Self::from_raw(day_of_week, false, &raw))
    }

    /// Intervals that count, i.e. none when the day is closed.
    pub fn effective_intervals(&self) -> &[TimeInterval] {
        if self.is_closed { &[] } else { &self.intervals }
    }
}

impl From<RawDay> for DayAvailability {
    fn from(raw: RawDay) -> Self {
        Self::from_raw(raw.day_of_week, raw.is_closed, &raw.intervals)
    }
}

impl From<DayAvailability> for RawDay {
    fn from(day: DayAvailability) -> Self {
        RawDay {
            day_of_week: day.day_of_week,
            is_closed: day.is_closed,
            intervals: day.intervals.into_iter().map(RawInterval::from).collect(),
        }
    }
}

// ── EntitySchedule ───────────────────────────────────────────────

/// Per-stylist weekly overrides; at most one entry per day per stylist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySchedule {
    entries: HashMap<StylistId, Vec<DayAvailability>>,
}

impl EntitySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a day entry. A second entry for the same stylist and day is rejected.
    pub fn insert(&mut self, stylist: StylistId, day: DayAvailability) -> Result<(), ScheduleError> {
        let days = self.entries.entry(stylist).or_default();
        if days.iter().any(|d| d.day_of_week == day.day_of_week) {
            return Err(ScheduleError::DuplicateDay {
                stylist: Some(stylist),
                day: day.day_of_week,
            });
        }
        days.push(day);
        Ok(())
    }

    /// Add or replace the entry for that stylist and day.
    pub fn upsert(&mut self, stylist: StylistId, day: DayAvailability) {
        let days = self.entries.entry(stylist).or_default();
        days.retain(|d| d.day_of_week != day.day_of_week);
        days.push(day);
    }

    pub fn entry(&self, stylist: &StylistId, day: DayOfWeek) -> Option<&DayAvailability> {
        self.entries
            .get(stylist)?
            .iter()
            .find(|d| d.day_of_week == day)
    }

    pub fn days(&self, stylist: &StylistId) -> &[DayAvailability] {
        self.entries.get(stylist).map_or(&[], Vec::as_slice)
    }

    pub fn stylist_count(&self) -> usize {
        self.entries.len()
    }
}

// ── Service parameters ───────────────────────────────────────────

/// Length of a service in minutes, always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ServiceDuration(u16);

impl ServiceDuration {
    pub fn new(minutes: u16) -> Result<Self, ScheduleError> {
        if minutes == 0 {
            return Err(ScheduleError::InvalidDuration(minutes));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for ServiceDuration {
    type Error = ScheduleError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceDuration> for u16 {
    fn from(d: ServiceDuration) -> Self {
        d.0
    }
}

/// Granularity of candidate start times in minutes, always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct SlotStep(u16);

impl SlotStep {
    pub fn new(minutes: u16) -> Result<Self, ScheduleError> {
        if minutes == 0 {
            return Err(ScheduleError::InvalidStep(minutes));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for SlotStep {
    type Error = ScheduleError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SlotStep> for u16 {
    fn from(s: SlotStep) -> Self {
        s.0
    }
}

// ── Lookup result ────────────────────────────────────────────────

/// What a stylist's schedule says about one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// No entry for the day: the stylist follows salon hours.
    NoOverride,
    /// Entry is closed or has no intervals: the stylist is out all day.
    ClosedAllDay,
    /// Explicit working intervals.
    Intervals(Vec<TimeInterval>),
}

// ── Schedule events ──────────────────────────────────────────────

/// Change notifications emitted by the schedule store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    SalonDaySet {
        day: DayOfWeek,
        version: u64,
    },
    StylistUpserted {
        id: StylistId,
        version: u64,
    },
    StylistRemoved {
        id: StylistId,
        version: u64,
    },
    StylistDaySet {
        id: StylistId,
        day: DayOfWeek,
        version: u64,
    },
    StylistDayCleared {
        id: StylistId,
        day: DayOfWeek,
        version: u64,
    },
    ServiceUpserted {
        id: ServiceId,
        version: u64,
    },
    ServiceRemoved {
        id: ServiceId,
        version: u64,
    },
    Reloaded {
        version: u64,
    },
}

impl ScheduleEvent {
    /// Stylist the event concerns, if any.
    pub fn stylist(&self) -> Option<StylistId> {
        match self {
            ScheduleEvent::StylistUpserted { id, .. }
            | ScheduleEvent::StylistRemoved { id, .. }
            | ScheduleEvent::StylistDaySet { id, .. }
            | ScheduleEvent::StylistDayCleared { id, .. } => Some(*id),
            _ => None,
        }
    }
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylistInfo {
    pub id: StylistId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub id: ServiceId,
    pub name: String,
    pub duration: ServiceDuration,
}
