mod availability;
mod error;
mod lookup;
mod resolve;
mod slots;

pub use availability::{covered_minutes, intersect_all, merge_all, subtract_intervals};
pub use error::ScheduleError;
pub use lookup::{classify, lookup};
pub use resolve::{
    effective_intervals, is_bookable, resolve_slots, stylist_intervals, BookingMode, SlotQuery,
};
pub use slots::{format_slots, generate_slots};
