use crate::model::*;

/// What `schedule` says about `stylist` on `day`.
pub fn lookup(schedule: &EntitySchedule, stylist: &StylistId, day: DayOfWeek) -> LookupResult {
    classify(schedule.entry(stylist, day))
}

/// Map a possibly-missing day entry to a lookup result.
///
/// A missing entry means "inherit salon hours"; an entry that is closed or
/// carries no intervals means "out all day". The two never collapse.
pub fn classify(entry: Option<&DayAvailability>) -> LookupResult {
    match entry {
        None => LookupResult::NoOverride,
        Some(day) if day.is_closed || day.intervals.is_empty() => LookupResult::ClosedAllDay,
        Some(day) => LookupResult::Intervals(day.intervals.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn iv(open: &str, close: &str) -> TimeInterval {
        TimeInterval::parse(open, close).unwrap()
    }

    #[test]
    fn missing_entry_is_no_override() {
        let id = Ulid::new();
        let mut schedule = EntitySchedule::new();
        schedule
            .insert(id, DayAvailability::open(DayOfWeek::MONDAY, vec![iv("09:00", "12:00")]))
            .unwrap();
        assert_eq!(lookup(&schedule, &id, DayOfWeek::TUESDAY), LookupResult::NoOverride);
        assert_eq!(
            lookup(&schedule, &Ulid::new(), DayOfWeek::MONDAY),
            LookupResult::NoOverride
        );
    }

    #[test]
    fn closed_flag_wins_over_intervals() {
        let id = Ulid::new();
        let mut schedule = EntitySchedule::new();
        let mut day = DayAvailability::open(DayOfWeek::MONDAY, vec![iv("09:00", "12:00")]);
        day.is_closed = true;
        schedule.insert(id, day).unwrap();
        assert_eq!(lookup(&schedule, &id, DayOfWeek::MONDAY), LookupResult::ClosedAllDay);
    }

    #[test]
    fn empty_interval_list_is_closed() {
        let id = Ulid::new();
        let mut schedule = EntitySchedule::new();
        schedule
            .insert(id, DayAvailability::open(DayOfWeek::SATURDAY, Vec::new()))
            .unwrap();
        assert_eq!(lookup(&schedule, &id, DayOfWeek::SATURDAY), LookupResult::ClosedAllDay);
    }

    #[test]
    fn explicit_intervals_returned() {
        let id = Ulid::new();
        let mut schedule = EntitySchedule::new();
        let hours = vec![iv("09:00", "12:00"), iv("14:00", "17:00")];
        schedule
            .insert(id, DayAvailability::open(DayOfWeek::WEDNESDAY, hours.clone()))
            .unwrap();
        assert_eq!(
            lookup(&schedule, &id, DayOfWeek::WEDNESDAY),
            LookupResult::Intervals(hours)
        );
    }
}
