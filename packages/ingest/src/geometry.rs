//! Representative-point extraction from park boundary geometry.

use geo::{Centroid, Geometry};
use wkt::TryFromWkt;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    /// Latitude (the geometry's `y`).
    pub latitude: f64,
    /// Longitude (the geometry's `x`).
    pub longitude: f64,
}

/// Computes the centroid of a WKT polygon or multipolygon.
///
/// Returns `None` for unparseable text, empty geometries, and centroids
/// that are not finite.
#[must_use]
pub fn extract_centroid(wkt: &str) -> Option<LatLon> {
    let geometry = match Geometry::<f64>::try_from_wkt_str(wkt.trim()) {
        Ok(geometry) => geometry,
        Err(e) => {
            log::trace!("Unparseable WKT: {e}");
            return None;
        }
    };

    let point = geometry.centroid()?;
    let (longitude, latitude) = (point.x(), point.y());
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }

    Some(LatLon {
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-7
    }

    #[test]
    fn square_polygon_centroid() {
        let c = extract_centroid("POLYGON ((-74 40, -73 40, -73 41, -74 41, -74 40))").unwrap();
        assert!(close(c.latitude, 40.5));
        assert!(close(c.longitude, -73.5));
    }

    #[test]
    fn multipolygon_centroid_is_area_weighted() {
        let c = extract_centroid(
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)), ((2 0, 4 0, 4 2, 2 2, 2 0)))",
        )
        .unwrap();
        // Unit square at (0.5, 0.5) and a 2x2 square at (3, 1), weighted 1:4.
        assert!(close(c.latitude, 0.9));
        assert!(close(c.longitude, 2.5));
    }

    #[test]
    fn malformed_input_yields_none() {
        for input in [
            "",
            "nan",
            "POLYGON",
            "POLYGON ((-74 40, -73 40",
            "MULTIPOLYGON EMPTY",
            "not a geometry",
            "POLYGON ((a b, c d, e f, a b))",
        ] {
            assert_eq!(extract_centroid(input), None, "{input}");
        }
    }
}
