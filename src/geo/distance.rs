//! Distance between two WGS-84 coordinates, at four accuracy/cost
//! trade-offs.
//!
//! All functions take degrees and return meters. `Auto` picks the flat
//! approximation for small angular separations and haversine otherwise.

use once_cell::sync::Lazy;

use crate::constants::{
    EARTH_FLATTENING, EARTH_RADIUS_EQUATORIAL, EARTH_RADIUS_MEAN, FLAT_DISTANCE_MAX_DEGREES,
    METERS_PER_LATITUDE_DEGREE,
};

/// Distance formula selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceMethod {
    /// Flat-rectangle approximation over cached per-degree spans.
    /// Intended for separations up to about 5 degrees.
    SuperFast,
    /// Tangent-plane projection at the mean latitude.
    Equirectangular,
    /// Spherical great-circle with the mean earth radius; about 0.3%
    /// worst-case error against the ellipsoid.
    Haversine,
    /// Reduced-latitude ellipsoidal correction; the most accurate.
    Lambert,
    /// SuperFast for small separations, haversine otherwise.
    #[default]
    Auto,
}

// Meters per degree of longitude at each integer latitude.
static METERS_PER_LONGITUDE_DEGREE: Lazy<[f64; 91]> = Lazy::new(|| {
    let mut table = [0.0; 91];
    for (lat, slot) in table.iter_mut().enumerate() {
        *slot = METERS_PER_LATITUDE_DEGREE * (lat as f64).to_radians().cos();
    }
    table
});

// Longitude difference reduced into [-180, 180].
fn wrapped_longitude_diff(long_a: f64, long_b: f64) -> f64 {
    let mut diff = long_a - long_b;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    diff
}

pub fn distance(
    lat_a: f64,
    long_a: f64,
    lat_b: f64,
    long_b: f64,
    method: DistanceMethod,
) -> f64 {
    match method {
        DistanceMethod::SuperFast => distance_super_fast(lat_a, long_a, lat_b, long_b),
        DistanceMethod::Equirectangular => {
            distance_equirectangular(lat_a, long_a, lat_b, long_b)
        }
        DistanceMethod::Haversine => distance_haversine(lat_a, long_a, lat_b, long_b),
        DistanceMethod::Lambert => distance_lambert(lat_a, long_a, lat_b, long_b),
        DistanceMethod::Auto => {
            let small = (lat_a - lat_b).abs() <= FLAT_DISTANCE_MAX_DEGREES
                && wrapped_longitude_diff(long_a, long_b).abs() <= FLAT_DISTANCE_MAX_DEGREES;
            if small {
                distance_super_fast(lat_a, long_a, lat_b, long_b)
            } else {
                distance_haversine(lat_a, long_a, lat_b, long_b)
            }
        }
    }
}

/// Euclidean distance over a flat rectangle, with the per-longitude
/// span taken as the mean of the cached values at the two integer
/// latitudes.
pub fn distance_super_fast(lat_a: f64, long_a: f64, lat_b: f64, long_b: f64) -> f64 {
    let table = &*METERS_PER_LONGITUDE_DEGREE;
    let index_a = (lat_a.abs().round() as usize).min(90);
    let index_b = (lat_b.abs().round() as usize).min(90);
    let meters_per_longitude = (table[index_a] + table[index_b]) / 2.0;
    let dy = (lat_a - lat_b) * METERS_PER_LATITUDE_DEGREE;
    let dx = wrapped_longitude_diff(long_a, long_b) * meters_per_longitude;
    (dx * dx + dy * dy).sqrt()
}

/// Projection onto the tangent plane at the mean latitude, scaled by
/// the mean earth radius.
pub fn distance_equirectangular(lat_a: f64, long_a: f64, lat_b: f64, long_b: f64) -> f64 {
    let mean_lat = ((lat_a + lat_b) / 2.0).to_radians();
    let x = wrapped_longitude_diff(long_a, long_b).to_radians() * mean_lat.cos();
    let y = (lat_a - lat_b).to_radians();
    EARTH_RADIUS_MEAN * (x * x + y * y).sqrt()
}

fn central_angle(lat_a: f64, long_a: f64, lat_b: f64, long_b: f64) -> f64 {
    let phi_a = lat_a.to_radians();
    let phi_b = lat_b.to_radians();
    let d_phi = phi_b - phi_a;
    let d_lambda = (long_b - long_a).to_radians();
    let a = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance on the mean-radius sphere.
pub fn distance_haversine(lat_a: f64, long_a: f64, lat_b: f64, long_b: f64) -> f64 {
    EARTH_RADIUS_MEAN * central_angle(lat_a, long_a, lat_b, long_b)
}

/// Lambert's ellipsoidal correction over reduced latitudes, with the
/// WGS-84 equatorial radius.
pub fn distance_lambert(lat_a: f64, long_a: f64, lat_b: f64, long_b: f64) -> f64 {
    let f = EARTH_FLATTENING;
    let beta_a = ((1.0 - f) * lat_a.to_radians().tan()).atan();
    let beta_b = ((1.0 - f) * lat_b.to_radians().tan()).atan();
    let sigma = central_angle(beta_a.to_degrees(), long_a, beta_b.to_degrees(), long_b);
    if sigma == 0.0 {
        return 0.0;
    }
    let p = (beta_a + beta_b) / 2.0;
    let q = (beta_b - beta_a) / 2.0;
    let x = (sigma - sigma.sin()) * (p.sin() * q.cos() / (sigma / 2.0).cos()).powi(2);
    let y = (sigma + sigma.sin()) * (p.cos() * q.sin() / (sigma / 2.0).sin()).powi(2);
    EARTH_RADIUS_EQUATORIAL * (sigma - f / 2.0 * (x + y))
}

/// Latitude-dependent average of a set of positions, in degrees.
///
/// Longitudes are averaged through their sine/cosine sums so that a
/// cluster straddling the antimeridian does not average to the wrong
/// side of the planet; latitudes average arithmetically, which is
/// accurate for clusters far smaller than a hemisphere.
pub fn average_position<I>(positions: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut count = 0usize;
    let mut latitude_sum = 0.0;
    let mut longitude_sin_sum = 0.0;
    let mut longitude_cos_sum = 0.0;
    for (latitude, longitude) in positions {
        count += 1;
        latitude_sum += latitude;
        let longitude_rad = longitude.to_radians();
        longitude_sin_sum += longitude_rad.sin();
        longitude_cos_sum += longitude_rad.cos();
    }
    if count == 0 {
        return None;
    }
    let latitude = latitude_sum / count as f64;
    let longitude = f64::atan2(
        longitude_sin_sum / count as f64,
        longitude_cos_sum / count as f64,
    )
    .to_degrees();
    Some((latitude, longitude))
}
