//! Sunrise calculation.
//!
//! Closed-form solar-position approximation (the "Almanac for Computers"
//! sunrise equation). Accurate to a couple of minutes for latitudes where
//! the sun actually rises on the requested date; polar day and polar night
//! are reported as [`SolarError::HourAngleOutOfRange`].
//!
//! Every function here is pure. Nothing is cached, so concurrent callers
//! need no synchronization.

use core::f64::consts::PI;
use core::time::Duration;

use log::{debug, warn};
use thiserror_no_std::Error;

use crate::time::{CivilDate, Timestamp, UtcOffset};

/// Cosine of the zenith angle at apparent sunrise: 90° plus 50′ for
/// refraction and the solar disk radius.
const SUNRISE_ZENITH_DEG: f64 = 90.833;

/// Obliquity terms of the ecliptic (cos ε and sin ε for ε ≈ 23.44°).
const COS_OBLIQUITY: f64 = 0.91764;
const SIN_OBLIQUITY: f64 = 0.39782;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const DAY: Duration = Duration::from_secs(86_400);

/// How many local dates `next_sunrise` inspects before giving up.
const SEARCH_DAYS: i64 = 3;

/// Horizon substituted by callers when no sunrise can be computed.
pub const FALLBACK_HORIZON: Duration = Duration::from_secs(6 * 3_600);

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SolarError {
    #[error("sun does not rise at this latitude/date (cos H = {cos_hour_angle})")]
    HourAngleOutOfRange { cos_hour_angle: f64 },
    #[error("no sunrise found after the requested instant")]
    NoUpcomingSunrise,
}

/// Next sunrise strictly after `now`, expressed as an absolute instant.
///
/// Starts with the local calendar date of `now` (under `offset`) and moves
/// to the following dates while the computed sunrise is not in the future.
pub fn next_sunrise(
    now: Timestamp,
    latitude: f64,
    longitude: f64,
    offset: UtcOffset,
) -> Result<Timestamp, SolarError> {
    let today = now.to_local(offset).date;
    let mut date = today;

    for _ in 0..SEARCH_DAYS {
        let sunrise = sunrise_for_date(date, latitude, longitude, offset)?;
        if sunrise > now {
            return Ok(sunrise);
        }
        date = date.next_day();
    }

    Err(SolarError::NoUpcomingSunrise)
}

/// [`next_sunrise`], falling back to `now + 6h` when the sun does not rise.
pub fn next_sunrise_or_fallback(
    now: Timestamp,
    latitude: f64,
    longitude: f64,
    offset: UtcOffset,
) -> Timestamp {
    match next_sunrise(now, latitude, longitude, offset) {
        Ok(sunrise) => sunrise,
        Err(err) => {
            warn!("sunrise calc: {}, using fallback horizon", err);
            now.saturating_add(FALLBACK_HORIZON)
        }
    }
}

/// Sunrise instant on the local calendar date `date`.
pub fn sunrise_for_date(
    date: CivilDate,
    latitude: f64,
    longitude: f64,
    offset: UtcOffset,
) -> Result<Timestamp, SolarError> {
    let ut_hours = sunrise_ut_hours(date.ordinal(), latitude, longitude)?;
    let mut sunrise = date
        .utc_midnight()
        .saturating_add(Duration::from_millis(libm::round(ut_hours * MILLIS_PER_HOUR) as u64));

    // The UT hour wraps at midnight, so the instant may have landed on the
    // neighbouring local date; pull it back onto `date`.
    let local_date = sunrise.to_local(offset).date;
    if local_date > date {
        sunrise = sunrise.saturating_sub(DAY);
    } else if local_date < date {
        sunrise = sunrise.saturating_add(DAY);
    }

    debug!(
        "sunrise {:04}-{:02}-{:02}: ut={:.3}h ts={}",
        date.year,
        date.month,
        date.day,
        ut_hours,
        sunrise.as_unix_secs()
    );
    Ok(sunrise)
}

/// Sunrise time in UT hours `[0, 24)` for the given day of the year.
fn sunrise_ut_hours(day_of_year: u16, latitude: f64, longitude: f64) -> Result<f64, SolarError> {
    let lng_hour = longitude / 15.0;
    let t = day_of_year as f64 + (6.0 - lng_hour) / 24.0;

    let mean_anomaly = 0.9856 * t - 3.289;
    let true_longitude = normalize_degrees(
        mean_anomaly
            + 1.916 * libm::sin(to_radians(mean_anomaly))
            + 0.020 * libm::sin(2.0 * to_radians(mean_anomaly))
            + 282.634,
    );

    let ra_hours = right_ascension_degrees(true_longitude) / 15.0;

    let sin_dec = SIN_OBLIQUITY * libm::sin(to_radians(true_longitude));
    let cos_dec = libm::cos(libm::asin(sin_dec));
    let lat_rad = to_radians(latitude);
    let cos_hour_angle = (libm::cos(to_radians(SUNRISE_ZENITH_DEG)) - sin_dec * libm::sin(lat_rad))
        / (cos_dec * libm::cos(lat_rad));

    if !(-1.0..=1.0).contains(&cos_hour_angle) {
        return Err(SolarError::HourAngleOutOfRange { cos_hour_angle });
    }

    let hour_angle = (360.0 - to_degrees(libm::acos(cos_hour_angle))) / 15.0;
    let local_mean_time = hour_angle + ra_hours - 0.06571 * t - 6.622;
    Ok(normalize_hours(local_mean_time - lng_hour))
}

/// Right ascension in degrees, placed in the same 90° sector as the
/// ecliptic longitude `true_longitude`.
pub(crate) fn right_ascension_degrees(true_longitude: f64) -> f64 {
    let ra = normalize_degrees(to_degrees(libm::atan(
        COS_OBLIQUITY * libm::tan(to_radians(true_longitude)),
    )));
    // atan only reaches (-90°, 90°); RA differs from L by a multiple of
    // 180° plus a few degrees, so rounding the gap picks the right sector
    // even when L sits exactly on a boundary.
    ra + 90.0 * libm::round((true_longitude - ra) / 90.0)
}

fn normalize_degrees(value: f64) -> f64 {
    wrap(value, 360.0)
}

fn normalize_hours(value: f64) -> f64 {
    wrap(value, 24.0)
}

/// `value` wrapped into `[0, period)`.
fn wrap(value: f64, period: f64) -> f64 {
    let wrapped = libm::fmod(value, period);
    let wrapped = if wrapped < 0.0 { wrapped + period } else { wrapped };
    // A tiny negative remainder rounds up to exactly `period`
    if wrapped >= period { 0.0 } else { wrapped }
}

fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE_MS: i64 = 60_000;

    fn local_ts(date: CivilDate, hour: i64, minute: i64, offset: UtcOffset) -> Timestamp {
        Timestamp::from_millis(
            date.utc_midnight().as_millis() + (hour * 60 + minute) * MINUTE_MS
                - offset.as_seconds() as i64 * 1_000,
        )
    }

    fn assert_close(actual: Timestamp, expected: Timestamp, tolerance_min: i64) {
        let delta = (actual.as_millis() - expected.as_millis()).abs();
        assert!(
            delta <= tolerance_min * MINUTE_MS,
            "off by {} s (actual {}, expected {})",
            delta / 1_000,
            actual.as_unix_secs(),
            expected.as_unix_secs()
        );
    }

    #[test]
    fn test_san_francisco_summer_solstice() {
        // Published sunrise: 05:48 PDT on 2024-06-21
        let pdt = UtcOffset::from_hours(-7);
        let date = CivilDate::new(2024, 6, 21);
        let now = local_ts(date, 0, 0, pdt);

        let sunrise = next_sunrise(now, 37.7749, -122.4194, pdt).unwrap();
        assert_close(sunrise, local_ts(date, 5, 48, pdt), 4);
    }

    #[test]
    fn test_london_winter_solstice() {
        // Published sunrise: 08:04 GMT on 2024-12-21
        let date = CivilDate::new(2024, 12, 21);
        let now = local_ts(date, 1, 0, UtcOffset::UTC);

        let sunrise = next_sunrise(now, 51.5074, -0.1278, UtcOffset::UTC).unwrap();
        assert_close(sunrise, local_ts(date, 8, 4, UtcOffset::UTC), 4);
    }

    #[test]
    fn test_east_of_greenwich_sunrise_lands_on_local_date() {
        // Sydney sunrise is around 20:00 UT of the previous UTC day.
        let aest = UtcOffset::from_hours(10);
        let date = CivilDate::new(2024, 6, 21);
        let now = local_ts(date, 3, 0, aest);

        let sunrise = next_sunrise(now, -33.8688, 151.2093, aest).unwrap();
        let local = sunrise.to_local(aest);
        assert_eq!(local.date, date);
        assert!((6..=7).contains(&local.hour), "local hour {}", local.hour);
    }

    #[test]
    fn test_passed_sunrise_rolls_to_next_day() {
        let pdt = UtcOffset::from_hours(-7);
        let date = CivilDate::new(2024, 6, 21);
        let noon = local_ts(date, 12, 0, pdt);

        let sunrise = next_sunrise(noon, 37.7749, -122.4194, pdt).unwrap();
        assert_eq!(sunrise.to_local(pdt).date, date.next_day());
    }

    #[test]
    fn test_result_is_strictly_after_now() {
        let pdt = UtcOffset::from_hours(-7);
        let date = CivilDate::new(2024, 6, 21);
        let sunrise = sunrise_for_date(date, 37.7749, -122.4194, pdt).unwrap();

        let next = next_sunrise(sunrise, 37.7749, -122.4194, pdt).unwrap();
        assert!(next > sunrise);
        assert_eq!(next.to_local(pdt).date, date.next_day());
    }

    #[test]
    fn test_daily_cadence_across_latitudes_and_dates() {
        let dates = [
            CivilDate::new(2023, 1, 15),
            CivilDate::new(2024, 3, 20),
            CivilDate::new(2024, 6, 21),
            CivilDate::new(2024, 9, 22),
            CivilDate::new(2025, 12, 21),
        ];
        let offsets = [UtcOffset::UTC, UtcOffset::from_hours(-8), UtcOffset::from_hours(9)];

        for date in dates {
            for offset in offsets {
                let mut lat = -65.0;
                while lat <= 65.0 {
                    let now = local_ts(date, 10, 30, offset);
                    let lon = offset.as_seconds() as f64 / 240.0;
                    let first = next_sunrise(now, lat, lon, offset).unwrap();
                    assert!(first > now, "lat {} {:?}", lat, date);

                    let second = next_sunrise(first, lat, lon, offset).unwrap();
                    let gap = second.duration_since(first);
                    assert!(
                        gap > Duration::from_secs(23 * 3_600) && gap < Duration::from_secs(25 * 3_600),
                        "lat {} {:?}: gap {:?}",
                        lat,
                        date,
                        gap
                    );
                    lat += 5.0;
                }
            }
        }
    }

    #[test]
    fn test_polar_night_and_polar_day_are_domain_errors() {
        let svalbard = (78.2232, 15.6267);
        let winter = local_ts(CivilDate::new(2024, 12, 21), 0, 0, UtcOffset::UTC);
        let summer = local_ts(CivilDate::new(2024, 6, 21), 0, 0, UtcOffset::UTC);

        let night = next_sunrise(winter, svalbard.0, svalbard.1, UtcOffset::UTC);
        assert!(matches!(
            night,
            Err(SolarError::HourAngleOutOfRange { cos_hour_angle }) if cos_hour_angle > 1.0
        ));

        let day = next_sunrise(summer, svalbard.0, svalbard.1, UtcOffset::UTC);
        assert!(matches!(
            day,
            Err(SolarError::HourAngleOutOfRange { cos_hour_angle }) if cos_hour_angle < -1.0
        ));
    }

    #[test]
    fn test_fallback_horizon_is_six_hours() {
        let now = local_ts(CivilDate::new(2024, 12, 21), 0, 0, UtcOffset::UTC);
        let sunrise = next_sunrise_or_fallback(now, 78.2232, 15.6267, UtcOffset::UTC);
        assert_eq!(sunrise.duration_since(now), FALLBACK_HORIZON);
    }

    #[test]
    fn test_right_ascension_shares_sector_with_longitude() {
        let mut l = 0.25;
        while l < 360.0 {
            let ra = right_ascension_degrees(l);
            assert_eq!(
                libm::floor(ra / 90.0),
                libm::floor(l / 90.0),
                "L = {} gave RA = {}",
                l,
                ra
            );
            assert!((ra - l).abs() < 3.0, "L = {} gave RA = {}", l, ra);
            l += 0.5;
        }
    }

    #[test]
    fn test_right_ascension_continuous_at_sector_boundaries() {
        for boundary in [90.0, 180.0, 270.0] {
            let below = right_ascension_degrees(boundary - 1e-6);
            let at = right_ascension_degrees(boundary);
            let above = right_ascension_degrees(boundary + 1e-6);
            assert!((at - boundary).abs() < 1e-3, "RA({}) = {}", boundary, at);
            assert!((above - below).abs() < 1e-3, "jump at {}: {} -> {}", boundary, below, above);
        }
    }

    #[test]
    fn test_wrap_stays_below_period() {
        assert_eq!(normalize_hours(25.5), 1.5);
        assert_eq!(normalize_hours(-1.0), 23.0);
        assert_eq!(normalize_hours(24.0), 0.0);
        let tiny = normalize_hours(-1e-17);
        assert!((0.0..24.0).contains(&tiny), "got {}", tiny);
        assert!((0.0..360.0).contains(&normalize_degrees(-1e-15)));
    }
}
