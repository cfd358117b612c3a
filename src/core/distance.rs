use crate::models::Coordinates;

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `a` - First point, degrees
/// * `b` - Second point, degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two optional positions, `None` if either is unknown
#[inline]
pub fn distance_between(a: Option<Coordinates>, b: Option<Coordinates>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(haversine_distance(a, b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let london = Coordinates::new(51.5074, -0.1278);
        let paris = Coordinates::new(48.8566, 2.3522);

        let distance = haversine_distance(london, paris);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let berlin = Coordinates::new(52.5200, 13.4050);
        let potsdam = Coordinates::new(52.3906, 13.0645);
        let ab = haversine_distance(berlin, potsdam);
        let ba = haversine_distance(potsdam, berlin);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_distance_between_missing() {
        let berlin = Coordinates::new(52.5200, 13.4050);
        assert!(distance_between(Some(berlin), None).is_none());
        assert!(distance_between(None, Some(berlin)).is_none());
        assert_eq!(distance_between(Some(berlin), Some(berlin)), Some(0.0));
    }
}
