//! Low-precision Sun and Moon positions.
//!
//! Accuracy is on the order of a few arcminutes for the Sun and a fraction of
//! a degree for the Moon, which puts rise and set instants within a minute or
//! two of a full ephemeris. That is enough for an almanac display; the
//! service source exists for anything that needs better.

use crate::events::{BodyKind, Coordinates, Instant};

const J2000: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const EARTH_RADIUS_KM: f64 = 6_378.14;

/// Right ascension and declination in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equatorial {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Altitude above the horizon and azimuth from north through east, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizontal {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
}

/// Everything the almanac needs about one body at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPosition {
    pub horizontal: Horizontal,
    /// Local hour angle wrapped to (-180, 180]; 0 at upper transit
    pub hour_angle_deg: f64,
    pub illuminated_fraction: f64,
    /// Moon minus Sun ecliptic longitude in [0, 360); 0 for the Sun itself
    pub phase_angle_deg: f64,
    /// Geocentric distance from the horizontal parallax; Moon only
    pub distance_km: Option<f64>,
}

pub fn julian_day(instant: Instant) -> f64 {
    instant.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JD
}

fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

fn wrap_signed(deg: f64) -> f64 {
    let wrapped = normalize_degrees(deg);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

fn sin_d(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cos_d(deg: f64) -> f64 {
    deg.to_radians().cos()
}

fn obliquity(jd: f64) -> f64 {
    23.439 - 0.000_000_4 * (jd - J2000)
}

/// Greenwich mean sidereal time in degrees.
pub fn gmst_deg(jd: f64) -> f64 {
    normalize_degrees(280.460_618_37 + 360.985_647_366_29 * (jd - J2000))
}

fn ecliptic_to_equatorial(lambda_deg: f64, beta_deg: f64, epsilon_deg: f64) -> Equatorial {
    let (sl, cl) = (sin_d(lambda_deg), cos_d(lambda_deg));
    let (sb, cb) = (sin_d(beta_deg), cos_d(beta_deg));
    let (se, ce) = (sin_d(epsilon_deg), cos_d(epsilon_deg));

    let ra = (sl * ce * cb - sb * se).atan2(cl * cb).to_degrees();
    let dec = (sb * ce + cb * se * sl).clamp(-1.0, 1.0).asin().to_degrees();

    Equatorial {
        ra_deg: normalize_degrees(ra),
        dec_deg: dec,
    }
}

/// Apparent ecliptic longitude of the Sun.
pub fn sun_longitude(jd: f64) -> f64 {
    let n = jd - J2000;
    let mean_longitude = 280.460 + 0.985_647_4 * n;
    let mean_anomaly = 357.528 + 0.985_600_3 * n;
    normalize_degrees(
        mean_longitude + 1.915 * sin_d(mean_anomaly) + 0.020 * sin_d(2.0 * mean_anomaly),
    )
}

/// Moon ecliptic longitude, latitude and horizontal parallax in degrees.
pub fn moon_ecliptic(jd: f64) -> (f64, f64, f64) {
    let t = (jd - J2000) / 36_525.0;

    let lambda = 218.32 + 481_267.881 * t + 6.29 * sin_d(135.0 + 477_198.87 * t)
        - 1.27 * sin_d(259.3 - 413_335.36 * t)
        + 0.66 * sin_d(235.7 + 890_534.22 * t)
        + 0.21 * sin_d(269.9 + 954_397.74 * t)
        - 0.19 * sin_d(357.5 + 35_999.05 * t)
        - 0.11 * sin_d(186.5 + 966_404.03 * t);

    let beta = 5.13 * sin_d(93.3 + 483_202.02 * t) + 0.28 * sin_d(228.2 + 960_400.89 * t)
        - 0.28 * sin_d(318.3 + 6_003.15 * t)
        - 0.17 * sin_d(217.6 - 407_332.21 * t);

    let parallax = 0.9508
        + 0.0518 * cos_d(135.0 + 477_198.87 * t)
        + 0.0095 * cos_d(259.3 - 413_335.36 * t)
        + 0.0078 * cos_d(235.7 + 890_534.22 * t)
        + 0.0028 * cos_d(269.9 + 954_397.74 * t);

    (normalize_degrees(lambda), beta, parallax)
}

fn to_horizontal(eq: Equatorial, coords: Coordinates, jd: f64) -> (Horizontal, f64) {
    let hour_angle = wrap_signed(gmst_deg(jd) + coords.longitude - eq.ra_deg);
    let (sp, cp) = (sin_d(coords.latitude), cos_d(coords.latitude));
    let (sd, cd) = (sin_d(eq.dec_deg), cos_d(eq.dec_deg));
    let (sh, ch) = (sin_d(hour_angle), cos_d(hour_angle));

    let altitude = (sp * sd + cp * cd * ch).clamp(-1.0, 1.0).asin().to_degrees();
    let azimuth = (-cd * sh).atan2(sd * cp - cd * ch * sp).to_degrees();

    (
        Horizontal {
            altitude_deg: altitude,
            azimuth_deg: normalize_degrees(azimuth),
        },
        hour_angle,
    )
}

/// Topocentric position of `body` for an observer at `coords`.
pub fn body_position(body: BodyKind, coords: Coordinates, instant: Instant) -> BodyPosition {
    let jd = julian_day(instant);
    let epsilon = obliquity(jd);
    let sun_lambda = sun_longitude(jd);

    match body {
        BodyKind::Sun => {
            let eq = ecliptic_to_equatorial(sun_lambda, 0.0, epsilon);
            let (horizontal, hour_angle) = to_horizontal(eq, coords, jd);
            BodyPosition {
                horizontal,
                hour_angle_deg: hour_angle,
                illuminated_fraction: 1.0,
                phase_angle_deg: 0.0,
                distance_km: None,
            }
        }
        BodyKind::Moon => {
            let (lambda, beta, parallax) = moon_ecliptic(jd);
            let eq = ecliptic_to_equatorial(lambda, beta, epsilon);
            let (mut horizontal, hour_angle) = to_horizontal(eq, coords, jd);
            // Parallax lowers the Moon by up to a degree near the horizon
            horizontal.altitude_deg -= parallax * cos_d(horizontal.altitude_deg);

            let elongation_cos = cos_d(beta) * cos_d(lambda - sun_lambda);
            BodyPosition {
                horizontal,
                hour_angle_deg: hour_angle,
                illuminated_fraction: ((1.0 - elongation_cos) / 2.0).clamp(0.0, 1.0),
                phase_angle_deg: normalize_degrees(lambda - sun_lambda),
                distance_km: Some(EARTH_RADIUS_KM / sin_d(parallax)),
            }
        }
    }
}

/// Named lunar phase for a Moon-minus-Sun longitude.
pub fn phase_name(phase_angle_deg: f64) -> &'static str {
    let age = normalize_degrees(phase_angle_deg);
    match age {
        a if !(22.5..337.5).contains(&a) => "New Moon",
        a if a < 67.5 => "Waxing Crescent",
        a if a < 112.5 => "First Quarter",
        a if a < 157.5 => "Waxing Gibbous",
        a if a < 202.5 => "Full Moon",
        a if a < 247.5 => "Waning Gibbous",
        a if a < 292.5 => "Last Quarter",
        _ => "Waning Crescent",
    }
}
