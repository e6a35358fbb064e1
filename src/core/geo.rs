pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (haversine) distance in kilometers.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1_rad, lat2_rad) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push `a` just outside [0, 1] near antipodes
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDMX: (f64, f64) = (19.4326, -99.1332);
    const GUADALAJARA: (f64, f64) = (20.6597, -103.3496);

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance(CDMX.0, CDMX.1, CDMX.0, CDMX.1), 0.0);
        assert_eq!(distance(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let points = [CDMX, GUADALAJARA, (0.0, 0.0), (-33.86, 151.21), (90.0, 0.0)];
        for a in points {
            for b in points {
                let ab = distance(a.0, a.1, b.0, b.1);
                let ba = distance(b.0, b.1, a.0, a.1);
                assert!((ab - ba).abs() < 1e-9, "{:?} {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_known_distance() {
        let d = distance(CDMX.0, CDMX.1, GUADALAJARA.0, GUADALAJARA.1);
        assert!((d - 461.0).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn test_antipodes_are_half_circumference() {
        let d = distance(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        let d = distance(45.0, 30.0, -45.0, -150.0);
        assert!(d.is_finite());
    }
}
