//! Wall-clock time model for the dashboard.
//!
//! The core never reads a clock on its own. Callers hand in a [`Timestamp`]
//! (taken once per loop cycle) together with a fixed [`UtcOffset`], and
//! everything calendar-related is derived from those two values with plain
//! proleptic-Gregorian day arithmetic.

use core::fmt::Write;
use core::time::Duration;

use heapless::String;

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Days between 0000-03-01 and 1970-01-01 in the shifted civil calendar.
const EPOCH_SHIFT_DAYS: i64 = 719_468;
const DAYS_PER_ERA: i64 = 146_097;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn from_unix_secs(secs: i64) -> Self {
        Self(secs * MILLIS_PER_SECOND)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    pub const fn as_unix_secs(self) -> i64 {
        self.0.div_euclid(MILLIS_PER_SECOND)
    }

    /// Move forward by `duration`, saturating at the representable range.
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_millis(duration)))
    }

    pub fn saturating_sub(self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration_millis(duration)))
    }

    /// Elapsed time since `earlier`, or zero when `earlier` is in the future.
    pub fn duration_since(self, earlier: Timestamp) -> Duration {
        let delta = self.0.saturating_sub(earlier.0);
        if delta <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(delta as u64)
        }
    }

    /// Break this instant down into local calendar fields.
    pub fn to_local(self, offset: UtcOffset) -> LocalDateTime {
        LocalDateTime::from_timestamp(self, offset)
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Fixed offset from UTC, in seconds east of Greenwich.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    pub const UTC: Self = Self { seconds: 0 };

    pub const fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    pub const fn from_minutes(minutes: i32) -> Self {
        Self {
            seconds: minutes * 60,
        }
    }

    pub const fn from_hours(hours: i32) -> Self {
        Self {
            seconds: hours * 3_600,
        }
    }

    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }

    const fn as_millis(self) -> i64 {
        self.seconds as i64 * MILLIS_PER_SECOND
    }
}

/// A calendar date without a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CivilDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CivilDate {
    pub const fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Days since 1970-01-01 (negative before the epoch).
    pub fn days_since_epoch(self) -> i64 {
        let month = self.month as i64;
        let year = self.year as i64 - if month <= 2 { 1 } else { 0 };
        let era = year.div_euclid(400);
        let year_of_era = year - era * 400;
        let shifted_month = if month > 2 { month - 3 } else { month + 9 };
        let day_of_year = (153 * shifted_month + 2) / 5 + self.day as i64 - 1;
        let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
        era * DAYS_PER_ERA + day_of_era - EPOCH_SHIFT_DAYS
    }

    pub fn from_days_since_epoch(days: i64) -> Self {
        let z = days + EPOCH_SHIFT_DAYS;
        let era = z.div_euclid(DAYS_PER_ERA);
        let day_of_era = z - era * DAYS_PER_ERA;
        let year_of_era =
            (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
        let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
        let mp = (5 * day_of_year + 2) / 153;
        let day = day_of_year - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = year_of_era + era * 400 + if month <= 2 { 1 } else { 0 };
        Self {
            year: year as i32,
            month: month as u8,
            day: day as u8,
        }
    }

    /// 1-based day of the year (1 January is day 1).
    pub fn ordinal(self) -> u16 {
        let jan_first = CivilDate::new(self.year, 1, 1).days_since_epoch();
        (self.days_since_epoch() - jan_first + 1) as u16
    }

    pub fn next_day(self) -> Self {
        Self::from_days_since_epoch(self.days_since_epoch() + 1)
    }

    /// Midnight UTC at the start of this date.
    pub fn utc_midnight(self) -> Timestamp {
        Timestamp::from_millis(self.days_since_epoch() * MILLIS_PER_DAY)
    }
}

/// Local calendar breakdown of a [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDateTime {
    pub date: CivilDate,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalDateTime {
    pub fn from_timestamp(ts: Timestamp, offset: UtcOffset) -> Self {
        let local_millis = ts.as_millis() + offset.as_millis();
        let days = local_millis.div_euclid(MILLIS_PER_DAY);
        let secs_of_day = local_millis.rem_euclid(MILLIS_PER_DAY) / MILLIS_PER_SECOND;

        Self {
            date: CivilDate::from_days_since_epoch(days),
            // 1970-01-01 was a Thursday
            weekday: (days + 3).rem_euclid(7) as u8,
            hour: (secs_of_day / 3_600) as u8,
            minute: (secs_of_day / 60 % 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    pub fn seconds_of_day(&self) -> u32 {
        self.hour as u32 * 3_600 + self.minute as u32 * 60 + self.second as u32
    }

    fn hour12(&self) -> (u8, &'static str) {
        let meridiem = if self.hour < 12 { "AM" } else { "PM" };
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        (hour, meridiem)
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.date.month as usize).saturating_sub(1) % 12]
    }

    pub fn weekday_name(&self) -> &'static str {
        WEEKDAY_NAMES[self.weekday as usize % 7]
    }

    /// `07:05:09 AM`
    pub fn clock_with_seconds(&self) -> String<16> {
        let (hour, meridiem) = self.hour12();
        let mut out = String::new();
        write!(
            &mut out,
            "{:02}:{:02}:{:02} {}",
            hour, self.minute, self.second, meridiem
        )
        .ok();
        out
    }

    /// `07:05 AM`
    pub fn clock(&self) -> String<16> {
        let (hour, meridiem) = self.hour12();
        let mut out = String::new();
        write!(&mut out, "{:02}:{:02} {}", hour, self.minute, meridiem).ok();
        out
    }

    /// `Mon 07:05 AM`
    pub fn weekday_clock(&self) -> String<16> {
        let mut out = String::new();
        write!(&mut out, "{} {}", self.weekday_name(), self.clock()).ok();
        out
    }

    /// `Jan 02 07:05` (12-hour clock without the meridiem)
    pub fn short_date(&self) -> String<16> {
        let (hour, _) = self.hour12();
        let mut out = String::new();
        write!(
            &mut out,
            "{} {:02} {:02}:{:02}",
            self.month_name(),
            self.date.day,
            hour,
            self.minute
        )
        .ok();
        out
    }
}

/// Render a duration as `HH:MM:SS`, hours growing past two digits if needed.
pub fn format_hms(duration: Duration) -> String<16> {
    let total = duration.as_secs();
    let mut out = String::new();
    write!(
        &mut out,
        "{:02}:{:02}:{:02}",
        total / 3_600,
        total / 60 % 60,
        total % 60
    )
    .ok();
    out
}

/// Source of wall-clock time and the blocking pause between loop cycles.
pub trait Clock {
    fn now(&mut self) -> Timestamp;

    fn sleep(&mut self, duration: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_is_thursday_first_of_january() {
        let local = Timestamp::from_millis(0).to_local(UtcOffset::UTC);
        assert_eq!(local.date, CivilDate::new(1970, 1, 1));
        assert_eq!(local.weekday_name(), "Thu");
        assert_eq!(local.date.ordinal(), 1);
    }

    #[test]
    fn test_days_since_epoch_matches_known_dates() {
        assert_eq!(CivilDate::new(2000, 3, 1).days_since_epoch(), 11_017);
        assert_eq!(CivilDate::new(1969, 12, 31).days_since_epoch(), -1);
        assert_eq!(
            CivilDate::from_days_since_epoch(19_723),
            CivilDate::new(2024, 1, 1)
        );
    }

    #[test]
    fn test_leap_year_ordinal() {
        assert_eq!(CivilDate::new(2024, 6, 21).ordinal(), 173);
        assert_eq!(CivilDate::new(2023, 6, 21).ordinal(), 172);
        assert_eq!(CivilDate::new(2024, 12, 31).ordinal(), 366);
    }

    #[test]
    fn test_offset_shifts_local_date() {
        // 2024-03-10T02:30:00Z
        let ts = Timestamp::from_unix_secs(1_710_037_800);
        let west = ts.to_local(UtcOffset::from_hours(-8));
        assert_eq!(west.date, CivilDate::new(2024, 3, 9));
        assert_eq!((west.hour, west.minute), (18, 30));

        let east = ts.to_local(UtcOffset::from_minutes(330));
        assert_eq!(east.date, CivilDate::new(2024, 3, 10));
        assert_eq!((east.hour, east.minute), (8, 0));
    }

    #[test]
    fn test_clock_formats() {
        // 2024-01-02T13:04:05Z, a Tuesday
        let local = Timestamp::from_unix_secs(1_704_200_645).to_local(UtcOffset::UTC);
        assert_eq!(local.clock_with_seconds().as_str(), "01:04:05 PM");
        assert_eq!(local.weekday_clock().as_str(), "Tue 01:04 PM");
        assert_eq!(local.short_date().as_str(), "Jan 02 01:04");

        let midnight = CivilDate::new(2024, 1, 2).utc_midnight().to_local(UtcOffset::UTC);
        assert_eq!(midnight.clock().as_str(), "12:00 AM");
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(0)).as_str(), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(3_725)).as_str(), "01:02:05");
        assert_eq!(format_hms(Duration::from_secs(100 * 3_600)).as_str(), "100:00:00");
    }

    #[test]
    fn test_duration_since_never_negative() {
        let a = Timestamp::from_millis(1_000);
        let b = Timestamp::from_millis(4_500);
        assert_eq!(b.duration_since(a), Duration::from_millis(3_500));
        assert_eq!(a.duration_since(b), Duration::ZERO);
        assert_eq!(a.saturating_add(Duration::from_millis(3_500)), b);
    }
}
