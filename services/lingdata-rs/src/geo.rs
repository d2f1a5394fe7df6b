//! Spherical geometry: centroids and great-circle distances.

use crate::types::Coordinates;

/// Equal-weight mean position of `points` on a sphere.
///
/// Longitude is averaged as an angle so points either side of the
/// antimeridian stay near ±180° instead of collapsing to 0°.
pub fn geodesic_centroid(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;

    // Shift longitudes into [0, 360) before taking the circular mean.
    let (sin_lon, cos_lon) = points.iter().fold((0.0, 0.0), |(s, c), p| {
        let lon = (p.longitude + 180.0).to_radians();
        (s + lon.sin() / n, c + lon.cos() / n)
    });
    let longitude = sin_lon.atan2(cos_lon).rem_euclid(2.0 * std::f64::consts::PI)
        - std::f64::consts::PI;

    let (sin_lat, cos_lat) = points.iter().fold((0.0, 0.0), |(s, c), p| {
        let lat = p.latitude.to_radians();
        (s + lat.sin() / n, c + lat.cos() / n)
    });
    let latitude = sin_lat.atan2(cos_lat);

    Some(Coordinates::new(latitude.to_degrees(), longitude.to_degrees()))
}

/// Central angle between two points, in radians.
fn central_angle(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();
    let (sin_dlon, cos_dlon) = delta_lon.sin_cos();

    let y = ((cos_lat2 * sin_dlon).powi(2)
        + (cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon).powi(2))
    .sqrt();
    let x = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;
    y.atan2(x)
}

/// Great-circle distance in metres on a sphere of `radius_km`.
pub fn great_circle_distance(a: Coordinates, b: Coordinates, radius_km: f64) -> f64 {
    central_angle(a, b) * radius_km * 1000.0
}
