/// Candidate stylists considered by a single availability query.
pub const MAX_CANDIDATES: usize = 64;

/// Intervals accepted for a single day of the salon or a stylist.
pub const MAX_INTERVALS_PER_DAY: usize = 48;

pub const MAX_STYLISTS: usize = 1_000;
pub const MAX_SERVICES: usize = 1_000;
pub const MAX_NAME_LEN: usize = 256;

/// Booked intervals accepted per stylist in one query.
pub const MAX_BOOKED_PER_STYLIST: usize = 256;

/// Longest request line the session driver will buffer.
pub const MAX_REQUEST_LINE_LEN: usize = 256 * 1024;

/// Default granularity of candidate start times when a request does not name one.
pub const DEFAULT_SLOT_STEP_MINUTES: u16 = 15;
