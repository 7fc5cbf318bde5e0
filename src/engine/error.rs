use ulid::Ulid;

use crate::model::{ClockTime, DayOfWeek};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    InvalidTime {
        input: String,
        reason: &'static str,
    },
    EmptyInterval {
        open: ClockTime,
        close: ClockTime,
    },
    InvalidDayOfWeek(u8),
    /// Second entry for the same day; `stylist` is `None` for salon hours.
    DuplicateDay {
        stylist: Option<Ulid>,
        day: DayOfWeek,
    },
    InvalidDuration(u16),
    InvalidStep(u16),
    NotFound(Ulid),
    MissingDuration,
    Malformed(String),
    LimitExceeded(&'static str),
}

impl ScheduleError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::InvalidTime { .. } => "invalid_time",
            ScheduleError::EmptyInterval { .. } => "empty_interval",
            ScheduleError::InvalidDayOfWeek(_) => "invalid_day_of_week",
            ScheduleError::DuplicateDay { .. } => "duplicate_day",
            ScheduleError::InvalidDuration(_) => "invalid_duration",
            ScheduleError::InvalidStep(_) => "invalid_step",
            ScheduleError::NotFound(_) => "not_found",
            ScheduleError::MissingDuration => "missing_duration",
            ScheduleError::Malformed(_) => "malformed",
            ScheduleError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::InvalidTime { input, reason } => {
                write!(f, "invalid time {input:?}: {reason}")
            }
            ScheduleError::EmptyInterval { open, close } => {
                write!(f, "interval [{open}, {close}) is empty or inverted")
            }
            ScheduleError::InvalidDayOfWeek(d) => {
                write!(f, "invalid day of week {d}: expected 0 (Sunday) to 6 (Saturday)")
            }
            ScheduleError::DuplicateDay { stylist, day } => match stylist {
                Some(id) => write!(f, "duplicate {day} entry for stylist {id}"),
                None => write!(f, "duplicate {day} entry for salon hours"),
            },
            ScheduleError::InvalidDuration(m) => {
                write!(f, "service duration must be positive, got {m}")
            }
            ScheduleError::InvalidStep(m) => write!(f, "slot step must be positive, got {m}"),
            ScheduleError::NotFound(id) => write!(f, "not found: {id}"),
            ScheduleError::MissingDuration => {
                write!(f, "request names neither a duration nor a known service")
            }
            ScheduleError::Malformed(msg) => write!(f, "malformed input: {msg}"),
            ScheduleError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for ScheduleError {}
