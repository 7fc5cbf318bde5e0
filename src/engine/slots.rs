use crate::model::*;

/// Start times within `interval` at which a service of `duration` fits entirely.
///
/// Candidates are `open, open + step, ...`; a start qualifies while
/// `start + duration <= close`, so a service may end exactly at closing.
pub fn generate_slots(
    interval: &TimeInterval,
    duration: ServiceDuration,
    step: SlotStep,
) -> Vec<ClockTime> {
    let open = u32::from(interval.open().minutes());
    let close = u32::from(interval.close().minutes());
    let duration = u32::from(duration.minutes());
    let step = u32::from(step.minutes());

    if close - open < duration {
        return Vec::new();
    }

    let mut slots = Vec::with_capacity(((close - open - duration) / step + 1) as usize);
    let mut start = open;
    while start + duration <= close {
        // start <= close - duration < 1440
        slots.push(ClockTime::new_unchecked(start as u16));
        start += step;
    }
    slots
}

/// Render start times as zero-padded `HH:mm`.
pub fn format_slots(slots: &[ClockTime]) -> Vec<String> {
    slots.iter().map(ClockTime::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(open: &str, close: &str) -> TimeInterval {
        TimeInterval::parse(open, close).unwrap()
    }

    fn dur(m: u16) -> ServiceDuration {
        ServiceDuration::new(m).unwrap()
    }

    fn step(m: u16) -> SlotStep {
        SlotStep::new(m).unwrap()
    }

    #[test]
    fn service_must_end_by_close() {
        let slots = generate_slots(&iv("09:00", "10:00"), dur(30), step(15));
        assert_eq!(format_slots(&slots), vec!["09:00", "09:15", "09:30"]);
    }

    #[test]
    fn exact_fit_yields_single_slot() {
        let slots = generate_slots(&iv("09:00", "10:00"), dur(60), step(15));
        assert_eq!(format_slots(&slots), vec!["09:00"]);
    }

    #[test]
    fn too_short_interval_yields_nothing() {
        assert!(generate_slots(&iv("09:00", "09:45"), dur(60), step(15)).is_empty());
    }

    #[test]
    fn step_larger_than_interval() {
        let slots = generate_slots(&iv("09:00", "10:00"), dur(15), step(90));
        assert_eq!(format_slots(&slots), vec!["09:00"]);
    }

    #[test]
    fn steps_anchor_on_interval_open() {
        let slots = generate_slots(&iv("09:10", "10:10"), dur(20), step(20));
        assert_eq!(format_slots(&slots), vec!["09:10", "09:30", "09:50"]);
    }

    #[test]
    fn close_at_end_of_day() {
        let slots = generate_slots(&iv("22:59", "23:59"), dur(30), step(30));
        assert_eq!(format_slots(&slots), vec!["22:59", "23:29"]);
    }

    #[test]
    fn full_day_one_minute_step() {
        let slots = generate_slots(&iv("00:00", "23:59"), dur(1), step(1));
        assert_eq!(slots.len(), 1439);
        assert_eq!(slots.first().copied(), Some(ClockTime::MIDNIGHT));
        assert_eq!(slots.last().map(|t| t.to_string()), Some("23:58".to_string()));
    }

    #[test]
    fn huge_duration_yields_nothing() {
        assert!(generate_slots(&iv("00:00", "23:59"), dur(u16::MAX), step(15)).is_empty());
    }
}
