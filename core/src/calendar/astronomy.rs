//! Solar and lunar theory.
//!
//! Solar longitude comes from the truncated VSOP87 Earth series with FK5,
//! nutation and aberration corrections (a few arcseconds, i.e. seconds of
//! time at the solar terms). New moons follow the mean-phase series with
//! periodic and planetary corrections. Times come out as Julian Ephemeris Days (TT) and are moved to
//! UT with a polynomial ΔT, then to a fixed civil offset.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use super::earth;

const J2000: f64 = 2451545.0;
const DAYS_PER_CENTURY: f64 = 36525.0;
const UNIX_EPOCH_JD: f64 = 2440587.5;
/// `num_days_from_ce() + CE_OFFSET` is the JD of that date's midnight.
const CE_OFFSET: f64 = 1721424.5;
const SYNODIC_MONTH: f64 = 29.530588861;
const NEW_MOON_EPOCH: f64 = 2451550.09766;
const TROPICAL_YEAR: f64 = 365.2422;

/// Additive planetary arguments: (coefficient, phase, rate per lunation).
const PLANETARY: [(f64, f64, f64); 13] = [
    (0.000165, 251.88, 0.016321),
    (0.000164, 251.83, 26.651886),
    (0.000126, 349.42, 36.412478),
    (0.000110, 84.66, 18.206239),
    (0.000062, 141.74, 53.303771),
    (0.000060, 207.14, 2.453732),
    (0.000056, 154.84, 7.306860),
    (0.000047, 34.52, 27.261239),
    (0.000042, 207.19, 0.121824),
    (0.000040, 291.34, 1.844379),
    (0.000037, 161.72, 24.198154),
    (0.000035, 239.56, 25.513099),
    (0.000023, 331.55, 3.592518),
];

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn normalize_degrees(x: f64) -> f64 {
    x.rem_euclid(360.0)
}

/// Arcseconds per degree.
const ARCSEC: f64 = 3600.0;
/// Conversion of VSOP87 longitudes to the FK5 frame, arcseconds.
const FK5_LONGITUDE: f64 = -0.09033;
/// Annual aberration at 1 AU, arcseconds.
const ABERRATION: f64 = 20.4898;

/// Nutation in longitude in degrees (four leading terms, about 0.5").
#[must_use]
pub fn nutation_in_longitude(jde: f64) -> f64 {
    let t = (jde - J2000) / DAYS_PER_CENTURY;
    let omega = 125.04452 - 1934.136261 * t;
    let sun = 280.4665 + 36000.7698 * t;
    let moon = 218.3165 + 481267.8813 * t;
    (-17.20 * sin_deg(omega) - 1.32 * sin_deg(2.0 * sun) - 0.23 * sin_deg(2.0 * moon)
        + 0.21 * sin_deg(2.0 * omega))
        / ARCSEC
}

/// Apparent geocentric ecliptic longitude of the Sun in degrees, `[0, 360)`.
#[must_use]
pub fn apparent_solar_longitude(jde: f64) -> f64 {
    let (longitude, _, radius) = earth::heliocentric(jde);
    let geometric = longitude.to_degrees() + 180.0;
    normalize_degrees(
        geometric + FK5_LONGITUDE / ARCSEC + nutation_in_longitude(jde)
            - ABERRATION / ARCSEC / radius,
    )
}

/// JDE at which the apparent solar longitude reaches `target` degrees,
/// starting the search from `guess`.
///
/// Returns `None` when the iteration fails to settle.
#[must_use]
pub fn solve_solar_longitude(target: f64, guess: f64) -> Option<f64> {
    let mut jde = guess;
    for _ in 0..50 {
        let mut delta = normalize_degrees(target - apparent_solar_longitude(jde));
        if delta > 180.0 {
            delta -= 360.0;
        }
        jde += delta * TROPICAL_YEAR / 360.0;
        if delta.abs() < 1e-7 {
            return jde.is_finite().then_some(jde);
        }
    }
    None
}

/// JDE of the true new moon with lunation number `k` (k = 0 near 2000-01-06).
#[must_use]
pub fn new_moon(k: f64) -> f64 {
    let t = k / 1236.85;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let mean = NEW_MOON_EPOCH + SYNODIC_MONTH * k + 0.00015437 * t2 - 0.000000150 * t3
        + 0.00000000073 * t4;
    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let m = 2.5534 + 29.10535670 * k - 0.0000014 * t2 - 0.00000011 * t3;
    let mp = 201.5643 + 385.81693528 * k + 0.0107582 * t2 + 0.00001238 * t3 - 0.000000058 * t4;
    let f = 160.7108 + 390.67050284 * k - 0.0016118 * t2 - 0.00000227 * t3 + 0.000000011 * t4;
    let omega = 124.7746 - 1.56375588 * k + 0.0020672 * t2 + 0.00000215 * t3;

    let periodic = -0.40720 * sin_deg(mp) + 0.17241 * e * sin_deg(m)
        + 0.01608 * sin_deg(2.0 * mp)
        + 0.01039 * sin_deg(2.0 * f)
        + 0.00739 * e * sin_deg(mp - m)
        - 0.00514 * e * sin_deg(mp + m)
        + 0.00208 * e * e * sin_deg(2.0 * m)
        - 0.00111 * sin_deg(mp - 2.0 * f)
        - 0.00057 * sin_deg(mp + 2.0 * f)
        + 0.00056 * e * sin_deg(2.0 * mp + m)
        - 0.00042 * sin_deg(3.0 * mp)
        + 0.00042 * e * sin_deg(m + 2.0 * f)
        + 0.00038 * e * sin_deg(m - 2.0 * f)
        - 0.00024 * e * sin_deg(2.0 * mp - m)
        - 0.00017 * sin_deg(omega)
        - 0.00007 * sin_deg(mp + 2.0 * m)
        + 0.00004 * sin_deg(2.0 * mp - 2.0 * f)
        + 0.00004 * sin_deg(3.0 * m)
        + 0.00003 * sin_deg(mp + m - 2.0 * f)
        + 0.00003 * sin_deg(2.0 * mp + 2.0 * f)
        - 0.00003 * sin_deg(mp + m + 2.0 * f)
        + 0.00003 * sin_deg(mp - m + 2.0 * f)
        - 0.00002 * sin_deg(mp - m - 2.0 * f)
        - 0.00002 * sin_deg(3.0 * mp + m)
        + 0.00002 * sin_deg(4.0 * mp);

    let planetary = 0.000325 * sin_deg(299.77 + 0.107408 * k - 0.009173 * t2)
        + PLANETARY
            .iter()
            .map(|&(coeff, base, rate)| coeff * sin_deg(base + rate * k))
            .sum::<f64>();

    mean + periodic + planetary
}

/// Lunation number of the last mean new moon at or before `jd`.
#[must_use]
pub fn lunation_before(jd: f64) -> f64 {
    ((jd - NEW_MOON_EPOCH) / SYNODIC_MONTH).floor()
}

/// ΔT = TT − UT in seconds (polynomial fits, 1860..2150).
#[must_use]
pub fn delta_t_seconds(decimal_year: f64) -> f64 {
    let y = decimal_year;
    if y < 1900.0 {
        let t = y - 1860.0;
        7.62 + 0.5737 * t - 0.251754 * t.powi(2) + 0.01680668 * t.powi(3)
            - 0.0004473624 * t.powi(4)
            + t.powi(5) / 233174.0
    } else if y < 1920.0 {
        let t = y - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t.powi(2) + 0.0061966 * t.powi(3)
            - 0.000197 * t.powi(4)
    } else if y < 1941.0 {
        let t = y - 1920.0;
        21.20 + 0.84493 * t - 0.076100 * t.powi(2) + 0.0020936 * t.powi(3)
    } else if y < 1961.0 {
        let t = y - 1950.0;
        29.07 + 0.407 * t - t.powi(2) / 233.0 + t.powi(3) / 2547.0
    } else if y < 1986.0 {
        let t = y - 1975.0;
        45.45 + 1.067 * t - t.powi(2) / 260.0 - t.powi(3) / 718.0
    } else if y < 2005.0 {
        let t = y - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t.powi(2)
            + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if y < 2050.0 {
        let t = y - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t.powi(2)
    } else {
        let u = (y - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - y)
    }
}

/// Convert a Julian Ephemeris Day to a Julian Day in UT.
#[must_use]
pub fn jde_to_ut(jde: f64) -> f64 {
    let decimal_year = 2000.0 + (jde - J2000) / 365.25;
    jde - delta_t_seconds(decimal_year) / 86400.0
}

/// Convert a UT Julian Day to a Julian Ephemeris Day.
#[must_use]
pub fn ut_to_jde(jd: f64) -> f64 {
    let decimal_year = 2000.0 + (jd - J2000) / 365.25;
    jd + delta_t_seconds(decimal_year) / 86400.0
}

/// UT Julian Day at local midnight starting `date`, for a civil offset in minutes east of UTC.
#[must_use]
pub fn local_midnight_jd(date: NaiveDate, offset_minutes: i32) -> f64 {
    f64::from(date.num_days_from_ce()) + CE_OFFSET - f64::from(offset_minutes) / 1440.0
}

/// Local calendar date containing the UT Julian Day `jd`.
#[must_use]
pub fn local_date(jd: f64, offset_minutes: i32) -> Option<NaiveDate> {
    let local = jd + f64::from(offset_minutes) / 1440.0;
    let days = (local - CE_OFFSET).floor();
    NaiveDate::from_num_days_from_ce_opt(days as i32)
}

/// Local civil date-time for the UT Julian Day `jd`, rounded to the second.
#[must_use]
pub fn local_datetime(jd: f64, offset_minutes: i32) -> Option<NaiveDateTime> {
    let seconds = ((jd - UNIX_EPOCH_JD) * 86400.0).round() as i64 + i64::from(offset_minutes) * 60;
    DateTime::from_timestamp(seconds, 0).map(|utc| utc.naive_utc())
}

/// Apparent solar longitude at local midnight starting `date`.
#[must_use]
pub fn solar_longitude_at_midnight(date: NaiveDate, offset_minutes: i32) -> f64 {
    apparent_solar_longitude(ut_to_jde(local_midnight_jd(date, offset_minutes)))
}
