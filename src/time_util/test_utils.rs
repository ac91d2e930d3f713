use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

pub fn time(hour: u32, minute: u32, second: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_else(|| panic!("Expected {:0>2}:{:0>2}:{:0>2} to be a valid time", hour, minute, second))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| panic!("Expected {:0>4}-{:0>2}-{:0>2} to be a valid date", year, month, day))
}

/// Midday UTC on the given date, for tests that compare timestamps.
pub fn utc_midday(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date(year, month, day).and_time(time(12, 0, 0)))
}

/// The instant of local midday on the given date, so the local date is the one named whatever the host timezone.
pub fn local_midday(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    let naive = date(year, month, day).and_time(time(12, 0, 0));
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| panic!("Expected {} to exist in the local timezone", naive))
        .with_timezone(&Utc)
}
