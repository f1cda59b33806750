//! Coordinate transforms from catalog/ephemeris frames to the local horizon
//!
//! Mean J2000 places are carried to the apparent place of date (precession,
//! nutation, annual aberration) and then onto the horizon with the apparent
//! sidereal time.

use astro::angle::limit_to_two_PI;
use astro::coords::{EqPoint, alt_frm_eq, az_frm_eq};
use astro::{aberr, nutation, precess};
use nalgebra::Vector3;
use std::f64::consts::PI;

use super::time::{Epoch, J2000_JD};

pub type Vec3 = Vector3<f64>;

const WGS84_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;
const MAS_TO_DEG: f64 = 1.0 / 3_600_000.0;

/// Observer on the Earth's surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub elevation_m: f64,
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            elevation_m: 0.0,
        }
    }

    /// Local apparent sidereal time in radians
    pub fn local_sidereal_time(&self, epoch: &Epoch) -> f64 {
        limit_to_two_PI(epoch.gast_radians() + self.longitude_deg.to_radians())
    }

    /// Geocentric position in km, true equator and equinox of date
    pub fn position_km(&self, epoch: &Epoch) -> Vec3 {
        let lat = self.latitude_deg.to_radians();
        let lst = self.local_sidereal_time(epoch);
        let one_minus_f = 1.0 - WGS84_FLATTENING;

        let c = 1.0 / (lat.cos().powi(2) + one_minus_f * one_minus_f * lat.sin().powi(2)).sqrt();
        let s = one_minus_f * one_minus_f * c;
        let h = self.elevation_m / 1000.0;

        let rho_cos = (WGS84_EQUATORIAL_RADIUS_KM * c + h) * lat.cos();
        let rho_sin = (WGS84_EQUATORIAL_RADIUS_KM * s + h) * lat.sin();
        Vec3::new(rho_cos * lst.cos(), rho_cos * lst.sin(), rho_sin)
    }
}

/// Apparent place in the local sky
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalPosition {
    pub altitude_deg: f64,
    /// From north through east, [0, 360)
    pub azimuth_deg: f64,
}

/// Convert (RA, Dec) in radians to a unit vector.
pub fn radec_to_xyz(ra: f64, dec: f64) -> Vec3 {
    let cos_dec = dec.cos();
    Vec3::new(cos_dec * ra.cos(), cos_dec * ra.sin(), dec.sin())
}

/// Convert any non-zero vector to (RA, Dec) in radians, RA in [0, 2*pi).
pub fn xyz_to_radec(v: &Vec3) -> (f64, f64) {
    let ra = limit_to_two_PI(f64::atan2(v.y, v.x));
    let dec = f64::atan2(v.z, v.xy().norm());
    (ra, dec)
}

/// Mean J2000 (RA, Dec) to the apparent (RA, Dec) of date, radians
pub fn apparent_place(ra: f64, dec: f64, epoch: &Epoch) -> (f64, f64) {
    let jd = epoch.jd_tt();
    let (asc, dec) = precess::precess_eq_coords(ra, dec, J2000_JD, jd);

    let (nut_in_long, nut_in_oblq) = epoch.nutation();
    let (nut_asc, nut_dec) = nutation::nutation_in_eq_coords(
        &EqPoint { asc, dec },
        nut_in_long,
        nut_in_oblq,
        epoch.true_obliquity(),
    );
    let (aberr_asc, aberr_dec) = aberr::stell_aberr_in_eq_coords(&EqPoint { asc, dec }, jd);

    (
        limit_to_two_PI(asc + nut_asc + aberr_asc),
        dec + nut_dec + aberr_dec,
    )
}

/// Altitude and azimuth for equatorial-of-date coordinates (radians).
pub fn horizontal_from_equatorial(ra: f64, dec: f64, latitude: f64, lst: f64) -> HorizontalPosition {
    let hour_angle = lst - ra;
    let altitude = match alt_frm_eq(hour_angle, dec, latitude) {
        // asin argument rounded past +-1 at the zenith or nadir
        a if a.is_nan() => {
            let sin_alt = latitude.sin() * dec.sin() + latitude.cos() * dec.cos() * hour_angle.cos();
            sin_alt.clamp(-1.0, 1.0).asin()
        }
        a => a,
    };
    // Meeus azimuth runs from the south
    let azimuth = limit_to_two_PI(az_frm_eq(hour_angle, dec, latitude) + PI);

    HorizontalPosition {
        altitude_deg: altitude.to_degrees(),
        azimuth_deg: azimuth.to_degrees().rem_euclid(360.0),
    }
}

/// Horizon coordinates of a body given its geocentric J2000 position in km.
pub fn topocentric_horizontal(geocentric_j2000_km: Vec3, observer: &Observer, epoch: &Epoch) -> HorizontalPosition {
    let (ra, dec) = xyz_to_radec(&geocentric_j2000_km);
    let (ra, dec) = apparent_place(ra, dec, epoch);
    let of_date = radec_to_xyz(ra, dec) * geocentric_j2000_km.norm();

    let topocentric = of_date - observer.position_km(epoch);
    let (ra, dec) = xyz_to_radec(&topocentric);
    horizontal_from_equatorial(
        ra,
        dec,
        observer.latitude_deg.to_radians(),
        observer.local_sidereal_time(epoch),
    )
}

/// Catalog position of a star, with proper motion from its catalog epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarPlace {
    pub ra_deg: f64,
    pub dec_deg: f64,
    /// mu_alpha * cos(delta), mas/yr
    pub pm_ra_mas_per_year: f64,
    pub pm_dec_mas_per_year: f64,
    pub epoch_year: f64,
}

impl StarPlace {
    /// (RA, Dec) in radians at `epoch`, J2000 frame
    pub fn propagated(&self, epoch: &Epoch) -> (f64, f64) {
        let years = epoch.years_since(self.epoch_year);
        let dec = self.dec_deg + self.pm_dec_mas_per_year * MAS_TO_DEG * years;
        let cos_dec = self.dec_deg.to_radians().cos();
        let ra = if cos_dec.abs() > 1e-12 {
            self.ra_deg + self.pm_ra_mas_per_year * MAS_TO_DEG * years / cos_dec
        } else {
            self.ra_deg
        };
        (ra.to_radians(), dec.to_radians())
    }

    pub fn horizontal(&self, observer: &Observer, epoch: &Epoch) -> HorizontalPosition {
        let (ra, dec) = self.propagated(epoch);
        let (ra, dec) = apparent_place(ra, dec, epoch);
        horizontal_from_equatorial(
            ra,
            dec,
            observer.latitude_deg.to_radians(),
            observer.local_sidereal_time(epoch),
        )
    }
}

/// Round to two decimals for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
