//! Conversion of boundary geometries to WGS 84 longitude/latitude.
//!
//! Only the reference systems municipal meshes actually ship in are
//! supported: geographic WGS 84 / SIRGAS 2000 pass through, spherical Web
//! Mercator is inverse-projected, anything else is rejected.

use geo::{Coord, MapCoords as _};
use violence_map_geography_models::Crs;

use crate::GeoError;

/// Sphere radius used by EPSG:3857, in meters.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Returns `geometry` expressed in WGS 84.
///
/// # Errors
///
/// Returns [`GeoError::UnsupportedCrs`] for reference systems other than
/// WGS 84, SIRGAS 2000 and Web Mercator.
pub fn to_wgs84(geometry: geo::Geometry<f64>, crs: &Crs) -> Result<geo::Geometry<f64>, GeoError> {
    match crs {
        Crs::Wgs84 | Crs::Sirgas2000 => Ok(geometry),
        Crs::WebMercator => Ok(geometry.map_coords(web_mercator_to_lon_lat)),
        Crs::Other(name) => Err(GeoError::UnsupportedCrs(name.clone())),
    }
}

/// Converts a `geojson` geometry to WGS 84, round-tripping through
/// [`geo::Geometry`] only when coordinates actually change.
///
/// # Errors
///
/// Returns [`GeoError`] if the CRS is unsupported or the geometry cannot be
/// converted.
pub fn geojson_to_wgs84(
    geometry: &geojson::Geometry,
    crs: &Crs,
) -> Result<geojson::Geometry, GeoError> {
    if crs.is_geographic_wgs84() {
        return Ok(geometry.clone());
    }

    let geo_geometry: geo::Geometry<f64> = geometry.clone().try_into()?;
    let projected = to_wgs84(geo_geometry, crs)?;
    Ok(geojson::Geometry::new(geojson::Value::from(&projected)))
}

#[allow(clippy::suboptimal_flops)]
fn web_mercator_to_lon_lat(coord: Coord<f64>) -> Coord<f64> {
    let lon = (coord.x / WEB_MERCATOR_RADIUS).to_degrees();
    let lat = (2.0 * (coord.y / WEB_MERCATOR_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    Coord { x: lon, y: lat }
}

#[cfg(test)]
mod tests {
    use geo::{Point, point};

    use super::*;

    #[test]
    fn geographic_crs_pass_through() {
        let geometry = geo::Geometry::Point(point!(x: -34.88, y: -8.05));
        let out = to_wgs84(geometry.clone(), &Crs::Sirgas2000).unwrap();
        assert_eq!(out, geometry);
    }

    #[test]
    fn inverse_projects_web_mercator() {
        // Recife, approximately.
        let geometry = geo::Geometry::Point(point!(x: -3_882_789.0, y: -899_021.0));
        let geo::Geometry::Point(Point(c)) = to_wgs84(geometry, &Crs::WebMercator).unwrap() else {
            panic!("expected a point");
        };
        assert!((c.x - -34.88).abs() < 0.01, "lon {}", c.x);
        assert!((c.y - -8.05).abs() < 0.01, "lat {}", c.y);
    }

    #[test]
    fn rejects_projected_utm() {
        let geometry = geo::Geometry::Point(point!(x: 290_000.0, y: 9_110_000.0));
        let err = to_wgs84(geometry, &Crs::Other("EPSG:31985".to_string())).unwrap_err();
        assert!(matches!(err, GeoError::UnsupportedCrs(_)));
    }

    #[test]
    fn converts_geojson_polygons() {
        let polygon: geojson::Geometry = r#"{"type": "Polygon", "coordinates": [[[0.0, 0.0], [111319.49, 0.0], [111319.49, 111325.14], [0.0, 0.0]]]}"#
            .parse()
            .unwrap();
        let out = geojson_to_wgs84(&polygon, &Crs::WebMercator).unwrap();
        let geojson::Value::Polygon(rings) = out.value else {
            panic!("expected a polygon");
        };
        assert!((rings[0][1][0] - 1.0).abs() < 1e-6);
        assert!((rings[0][2][1] - 1.0).abs() < 1e-4);
    }
}
