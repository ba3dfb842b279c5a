use chrono::{Datelike, Duration, NaiveDate, Utc};

/// Calendar date the scoring layer runs on. All day/week rollovers use UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Monday..Sunday bounds of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_since_monday = date.weekday().num_days_from_monday() as i64;
    let week_start = date - Duration::days(days_since_monday);
    let week_end = week_start + Duration::days(6);
    (week_start, week_end)
}

/// Bounds of the current week in UTC.
pub fn current_week() -> (NaiveDate, NaiveDate) {
    week_bounds(today_utc())
}

/// Calendar days between the last scoring event and today. A gap of more
/// than one day forces a streak reset in the scoring store.
pub fn days_since(last_activity: NaiveDate, today: NaiveDate) -> i64 {
    (today - last_activity).num_days()
}

pub fn format_week_range(week_start: NaiveDate, week_end: NaiveDate) -> String {
    format!(
        "{} - {}",
        week_start.format("%b %d"),
        week_end.format("%b %d, %Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_bounds_monday_through_sunday() {
        // 2026-08-26 is a Wednesday
        let date = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let (start, end) = week_bounds(date);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 30).unwrap());
    }

    #[test]
    fn week_bounds_on_monday_is_identity() {
        let monday = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let (start, _) = week_bounds(monday);
        assert_eq!(start, monday);
    }

    #[test]
    fn days_since_counts_calendar_days() {
        let a = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        assert_eq!(days_since(a, b), 2);
        assert_eq!(days_since(b, b), 0);
    }
}
