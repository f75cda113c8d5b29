use std::f64::consts::PI;

/// Mean earth radius in meters (IUGG R1), used by the spherical
/// distance approximations.
pub const EARTH_RADIUS_MEAN: f64 = 6_371_008.8;
/// WGS-84 equatorial radius in meters, used by the Lambert formula.
pub const EARTH_RADIUS_EQUATORIAL: f64 = 6_378_137.0;
/// WGS-84 flattening.
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;
/// Meters spanned by one degree of latitude on the mean-radius sphere.
pub const METERS_PER_LATITUDE_DEGREE: f64 = EARTH_RADIUS_MEAN * PI / 180.0;
/// Required byte length of a persisted stream signature.
pub const SIGNATURE_LENGTH: usize = 20;
/// Edge of a sparse grid cell in quantised E7 units, i.e. 1e-4 degrees
/// or roughly 10 m at the equator.
pub const GRID_CELL_E7: u32 = 1000;
/// Angular separation in degrees below which the flat-rectangle distance
/// approximation stays within sensor noise.
pub const FLAT_DISTANCE_MAX_DEGREES: f64 = 5.0;
