use crate::model::*;

// ── Interval algebra ─────────────────────────────────────────────

/// Restrict salon hours to what one stylist's lookup allows.
///
/// `NoOverride` inherits the salon intervals one-for-one, `ClosedAllDay`
/// yields nothing, and explicit intervals are intersected pairwise (full cross
/// product) and normalized.
pub fn intersect_all(salon: &[TimeInterval], entity: &LookupResult) -> Vec<TimeInterval> {
    match entity {
        LookupResult::NoOverride => salon.to_vec(),
        LookupResult::ClosedAllDay => Vec::new(),
        LookupResult::Intervals(own) => {
            let mut hits: Vec<TimeInterval> = salon
                .iter()
                .flat_map(|s| own.iter().filter_map(move |e| s.intersect(e)))
                .collect();
            hits.sort_unstable();
            merge_sorted(&hits)
        }
    }
}

/// Union of any number of interval lists as sorted, disjoint, non-touching intervals.
pub fn merge_all<L: AsRef<[TimeInterval]>>(lists: &[L]) -> Vec<TimeInterval> {
    let mut flat: Vec<TimeInterval> = lists
        .iter()
        .flat_map(|l| l.as_ref().iter().copied())
        .collect();
    flat.sort_unstable();
    merge_sorted(&flat)
}

/// Coalesce already-sorted intervals that overlap or touch.
fn merge_sorted(sorted: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for &interval in sorted {
        if let Some(last) = merged.last_mut()
            && last.overlaps_or_touches(&interval) {
                let close = last.close().max(interval.close());
                *last = TimeInterval::from_bounds(last.open(), close);
                continue;
            }
        merged.push(interval);
    }
    merged
}

/// Remove `to_remove` from `base`. Both must be sorted and disjoint.
pub fn subtract_intervals(base: &[TimeInterval], to_remove: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_open = b.open();
        let current_close = b.close();

        while ri < to_remove.len() && to_remove[ri].close() <= current_open {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].open() < current_close {
            let r = &to_remove[j];
            if r.open() > current_open {
                result.push(TimeInterval::from_bounds(current_open, r.open()));
            }
            current_open = current_open.max(r.close());
            j += 1;
        }

        if current_open < current_close {
            result.push(TimeInterval::from_bounds(current_open, current_close));
        }
    }

    result
}

/// Total minutes covered by sorted, disjoint intervals.
pub fn covered_minutes(intervals: &[TimeInterval]) -> u32 {
    intervals.iter().map(|i| u32::from(i.len_minutes())).sum()
}
