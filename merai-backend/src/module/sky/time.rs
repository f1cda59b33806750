//! Time scales used by the ephemeris and the sidereal clock

use astro::angle::limit_to_two_PI;
use astro::time::{CalType, Date, apprnt_sidr, julian_day, mn_sidr};
use chrono::{DateTime, Datelike, Timelike, Utc};

pub const J2000_JD: f64 = 2_451_545.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// TAI - UTC, unchanged since 2017-01-01
const TAI_MINUS_UTC_SECONDS: f64 = 37.0;
const TT_MINUS_TAI_SECONDS: f64 = 32.184;

/// An instant expressed on the scales the pipeline needs.
///
/// UT1 is taken equal to UTC and TDB equal to TT; both differences are well
/// below the two-decimal precision of the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Epoch {
    jd_utc: f64,
}

impl Epoch {
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        let seconds = f64::from(instant.num_seconds_from_midnight())
            + f64::from(instant.nanosecond()) * 1e-9;
        let date = Date {
            year: instant.year() as i16,
            month: instant.month() as u8,
            decimal_day: f64::from(instant.day()) + seconds / SECONDS_PER_DAY,
            cal_type: CalType::Gregorian,
        };
        Self {
            jd_utc: julian_day(&date),
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn jd_utc(&self) -> f64 {
        self.jd_utc
    }

    pub fn jd_tt(&self) -> f64 {
        self.jd_utc + (TAI_MINUS_UTC_SECONDS + TT_MINUS_TAI_SECONDS) / SECONDS_PER_DAY
    }

    /// TDB seconds past J2000, the time argument of SPK kernels
    pub fn et_seconds(&self) -> f64 {
        (self.jd_tt() - J2000_JD) * SECONDS_PER_DAY
    }

    /// Julian years elapsed since the given epoch, e.g. 1991.25 for Hipparcos
    pub fn years_since(&self, epoch_year: f64) -> f64 {
        2000.0 + (self.jd_tt() - J2000_JD) / DAYS_PER_JULIAN_YEAR - epoch_year
    }

    /// Nutation in longitude and in obliquity, radians
    pub fn nutation(&self) -> (f64, f64) {
        astro::nutation::nutation(self.jd_tt())
    }

    /// True obliquity of the ecliptic, radians
    pub fn true_obliquity(&self) -> f64 {
        let (_, nut_in_oblq) = self.nutation();
        astro::ecliptic::mn_oblq_IAU(self.jd_tt()) + nut_in_oblq
    }

    /// Greenwich mean sidereal time in degrees, [0, 360)
    pub fn gmst_degrees(&self) -> f64 {
        self.gmst_radians().to_degrees()
    }

    pub fn gmst_radians(&self) -> f64 {
        limit_to_two_PI(mn_sidr(self.jd_utc))
    }

    /// Greenwich apparent sidereal time in radians: mean time plus the
    /// equation of the equinoxes
    pub fn gast_radians(&self) -> f64 {
        let (nut_in_long, _) = self.nutation();
        limit_to_two_PI(apprnt_sidr(
            self.gmst_radians(),
            nut_in_long,
            self.true_obliquity(),
        ))
    }
}
