//! Calendar-day arithmetic in the fixed matching time zone.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Where a "day" starts and ends, and when its pairings expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySchedule {
    pub tz: Tz,
    pub expiry: NaiveTime,
}

impl DaySchedule {
    pub fn new(tz: Tz, expiry: NaiveTime) -> Self {
        Self { tz, expiry }
    }

    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    pub fn local_hour(&self, at: DateTime<Utc>) -> u8 {
        at.with_timezone(&self.tz).hour() as u8
    }

    /// `[start, end)` of `date` in UTC.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = localize(self.tz, date.and_time(NaiveTime::MIN));
        let end = localize(self.tz, (date + Duration::days(1)).and_time(NaiveTime::MIN));
        (start, end)
    }

    pub fn expiry_for(&self, date: NaiveDate) -> DateTime<Utc> {
        localize(self.tz, date.and_time(self.expiry))
    }
}

/// Resolves a wall-clock time, taking the earlier instant on DST overlaps and
/// skipping forward an hour on DST gaps.
fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Next instant strictly after `now` at which the local clock in `tz` reads `at`.
pub fn next_occurrence(tz: Tz, at: NaiveTime, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    let candidate = localize(tz, today.and_time(at));
    if candidate > now {
        candidate
    } else {
        localize(tz, (today + Duration::days(1)).and_time(at))
    }
}

/// Sleeps until `target`; returns immediately if it has passed.
pub async fn wait_until(target: DateTime<Utc>) {
    if let Ok(remaining) = (target - Utc::now()).to_std() {
        tokio::time::sleep(remaining).await;
    }
}

/// Parses `HH:MM`.
pub fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| anyhow::anyhow!("invalid time of day '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn schedule() -> DaySchedule {
        DaySchedule::new(New_York, parse_clock("23:59").unwrap())
    }

    #[test]
    fn day_bounds_follow_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let (start, end) = schedule().day_bounds(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 15, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 16, 5, 0, 0).unwrap());
    }

    #[test]
    fn dst_day_is_23_hours() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let (start, end) = schedule().day_bounds(date);
        assert_eq!(end - start, Duration::hours(23));
    }

    #[test]
    fn expiry_is_same_local_day() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        let s = schedule();
        let expiry = s.expiry_for(date);
        assert_eq!(s.local_date(expiry), date);
        assert_eq!(expiry, Utc.with_ymd_and_hms(2026, 7, 5, 3, 59, 0).unwrap());
    }

    #[test]
    fn local_date_and_hour_use_the_zone() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 3, 30, 0).unwrap();
        let s = schedule();
        assert_eq!(s.local_date(at), NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());
        assert_eq!(s.local_hour(at), 22);
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow_once_passed() {
        let noon = parse_clock("12:00").unwrap();
        let before = Utc.with_ymd_and_hms(2026, 1, 15, 16, 0, 0).unwrap();
        assert_eq!(
            next_occurrence(New_York, noon, before),
            Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap()
        );

        let after = Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap();
        assert_eq!(
            next_occurrence(New_York, noon, after),
            Utc.with_ymd_and_hms(2026, 1, 16, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_clock() {
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("noon").is_err());
        assert_eq!(parse_clock(" 00:05 ").unwrap(), NaiveTime::from_hms_opt(0, 5, 0).unwrap());
    }
}
