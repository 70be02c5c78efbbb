/// Mean Earth radius in meters (haversine convention).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two WGS-84 coordinates, in meters.
///
/// Inputs are degrees; callers are responsible for passing valid
/// latitude/longitude values.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        assert_eq!(distance_meters(-6.2, 106.816, -6.2, 106.816), 0.0);
    }

    #[test]
    fn symmetric() {
        let d1 = distance_meters(-6.2000, 106.8160, -6.1750, 106.8270);
        let d2 = distance_meters(-6.1750, 106.8270, -6.2000, 106.8160);
        assert_eq!(d1, d2);
    }

    #[test]
    fn short_hop_near_jakarta() {
        // ~0.0005 deg on both axes at lat -6.2
        let d = distance_meters(-6.2000, 106.8160, -6.2005, 106.8165);
        assert!((70.0..90.0).contains(&d), "unexpected distance {d}");
    }

    #[test]
    fn half_kilometer_due_north() {
        // 0.0045 deg of latitude is a hair over 500 m
        let d = distance_meters(-6.2000, 106.8160, -6.1955, 106.8160);
        assert_eq!(d.round() as i64, 500);
    }
}
