use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Expand per-day activity counts into individual timestamps.
///
/// Day-granular platforms cannot tell activities within a day apart, so the
/// i-th activity of a day is placed at midnight UTC plus i seconds. Repeated
/// runs produce the same timestamps, and a later run that sees more activity
/// on the same day yields only the additional ones past the cursor.
pub fn expand_day_counts<I>(days: I) -> Vec<DateTime<Utc>>
where
    I: IntoIterator<Item = (NaiveDate, u32)>,
{
    let mut out = Vec::new();
    for (day, count) in days {
        let midnight = day.and_time(chrono::NaiveTime::MIN).and_utc();
        out.extend((0..count).map(|i| midnight + TimeDelta::seconds(i64::from(i))));
    }
    out
}

/// Make every timestamp in an ascending list strictly greater than the one
/// before it by pushing collisions forward one second at a time.
pub fn separate_collisions(stamps: Vec<DateTime<Utc>>) -> Vec<DateTime<Utc>> {
    let mut out: Vec<DateTime<Utc>> = Vec::with_capacity(stamps.len());
    for ts in stamps {
        let next = match out.last() {
            Some(prev) if ts <= *prev => *prev + TimeDelta::seconds(1),
            _ => ts,
        };
        out.push(next);
    }
    out
}
