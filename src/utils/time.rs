use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    chrono::Utc::now().with_timezone(tz)
}

/// Returns today's civil date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Returns the current wall-clock time of day in the configured timezone.
pub fn wall_clock(tz: &Tz) -> NaiveTime {
    now_in_timezone(tz).time()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn now_in_timezone_returns_datetime_in_tz() {
        let tz = chrono_tz::UTC;
        let result = now_in_timezone(&tz);
        assert_eq!(result.timezone(), tz);
    }

    #[test]
    fn today_local_matches_zoned_now() {
        let tz = chrono_tz::Asia::Manila;
        let result = today_local(&tz);
        assert_eq!(result, now_in_timezone(&tz).date_naive());
    }

    #[test]
    fn wall_clock_is_a_time_of_day() {
        let tz = chrono_tz::Asia::Manila;
        let result = wall_clock(&tz);
        assert!(result.hour() < 24);
    }
}
