//! Coordinate and bounding box types shared by the index and the cache.

use crate::error::{GeoCacheError, Result};
use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// WGS-84 equatorial radius in meters, used for the flat-earth offset.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// A normalized (latitude, longitude) pair in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    ///
    /// Latitude must be within [-90.0, 90.0] and longitude within
    /// [-180.0, 180.0]; both must be finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use geocache::Coordinate;
    ///
    /// assert!(Coordinate::new(48.8584, 2.2945).is_ok());
    /// assert!(Coordinate::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        validate_latitude(latitude)?;
        validate_longitude(longitude)?;
        Ok(Self::new_unchecked(latitude, longitude))
    }

    /// Create a coordinate without range checks.
    ///
    /// For callers that already validated upstream. Negative zero is folded
    /// into zero so that equal positions produce equal query keys.
    pub fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Canonical string key for the remote lookup, `"<lat>|<lon>"`.
    ///
    /// ```
    /// use geocache::Coordinate;
    ///
    /// let coord = Coordinate::new(51.5, -0.125).unwrap();
    /// assert_eq!(coord.query_key(), "51.5|-0.125");
    /// ```
    pub fn query_key(&self) -> String {
        format!("{:?}|{:?}", self.latitude, self.longitude)
    }

    /// Bounding box that covers `tolerance_meters` around this coordinate.
    pub fn bounding_box(&self, tolerance_meters: f64) -> BoundingBox {
        BoundingBox::around(*self, tolerance_meters)
    }
}

impl From<Coordinate> for Point {
    fn from(coord: Coordinate) -> Self {
        Point::new(coord.longitude, coord.latitude)
    }
}

impl TryFrom<Point> for Coordinate {
    type Error = GeoCacheError;

    fn try_from(point: Point) -> Result<Self> {
        Coordinate::new(point.y(), point.x())
    }
}

fn validate_latitude(latitude: f64) -> Result<()> {
    if !latitude.is_finite() {
        return Err(GeoCacheError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            latitude
        )));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(GeoCacheError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            latitude
        )));
    }
    Ok(())
}

fn validate_longitude(longitude: f64) -> Result<()> {
    if !longitude.is_finite() {
        return Err(GeoCacheError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            longitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoCacheError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            longitude
        )));
    }
    Ok(())
}

/// Latitude/longitude rectangle used as an inclusive range query filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    rect: Rect,
}

impl BoundingBox {
    /// Create a box from its bounds. Swapped bounds are normalized.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: min_lon, y: min_lat },
                geo::coord! { x: max_lon, y: max_lat },
            ),
        }
    }

    /// Offset `center` by `tolerance_meters` north, south, east and west.
    ///
    /// Latitude is clamped to the valid range. Close to the poles the
    /// longitude offset blows up, in which case the box spans every longitude.
    ///
    /// The box does not wrap across the ±180° meridian: a point a few meters
    /// away on the other side of the antimeridian is never inside it.
    pub fn around(center: Coordinate, tolerance_meters: f64) -> Self {
        let lat = center.latitude();
        let lon = center.longitude();

        let d_lat = (tolerance_meters / EARTH_RADIUS_METERS).to_degrees();
        let d_lon = (tolerance_meters
            / (EARTH_RADIUS_METERS * lat.to_radians().cos()))
        .to_degrees()
        .abs();

        let (min_lon, max_lon) = if d_lon.is_finite() && d_lon <= 180.0 {
            (lon - d_lon, lon + d_lon)
        } else {
            (-180.0, 180.0)
        };

        Self::new(
            (lat - d_lat).max(-90.0),
            min_lon,
            (lat + d_lat).min(90.0),
            max_lon,
        )
    }

    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    pub fn min_lon(&self) -> f64 {
        self.rect.min().x
    }

    pub fn max_lon(&self) -> f64 {
        self.rect.max().x
    }

    pub fn is_finite(&self) -> bool {
        [self.min_lat(), self.max_lat(), self.min_lon(), self.max_lon()]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Inclusive containment test on all four sides.
    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.latitude() >= self.min_lat()
            && coord.latitude() <= self.max_lat()
            && coord.longitude() >= self.min_lon()
            && coord.longitude() <= self.max_lon()
    }

    pub fn as_rect(&self) -> Rect {
        self.rect
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self { rect }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_query_key_is_canonical() {
        let a = Coordinate::new(1.0, 1.0).unwrap();
        assert_eq!(a.query_key(), "1.0|1.0");

        let neg_zero = Coordinate::new(-0.0, -0.0).unwrap();
        assert_eq!(neg_zero.query_key(), "0.0|0.0");

        let b = Coordinate::new(51.5, -0.125).unwrap();
        assert_eq!(b.query_key(), Coordinate::new(51.5, -0.125).unwrap().query_key());
    }

    #[test]
    fn test_bounding_box_around_equator() {
        let center = Coordinate::new(0.0, 0.0).unwrap();
        let bbox = center.bounding_box(100.0);

        // 100 m is roughly 0.000898 degrees at the equator
        let expected = (100.0 / EARTH_RADIUS_METERS).to_degrees();
        assert!((bbox.max_lat() - expected).abs() < 1e-12);
        assert!((bbox.min_lat() + expected).abs() < 1e-12);
        assert!((bbox.max_lon() - expected).abs() < 1e-12);
        assert!(bbox.contains(&center));
        assert!(!bbox.contains(&Coordinate::new(0.01, 0.0).unwrap()));
    }

    #[test]
    fn test_bounding_box_widens_longitude_with_latitude() {
        let equator = Coordinate::new(0.0, 10.0).unwrap().bounding_box(100.0);
        let north = Coordinate::new(60.0, 10.0).unwrap().bounding_box(100.0);

        let equator_width = equator.max_lon() - equator.min_lon();
        let north_width = north.max_lon() - north.min_lon();
        assert!((north_width / equator_width - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box_at_pole_spans_all_longitudes() {
        let bbox = Coordinate::new(90.0, 45.0).unwrap().bounding_box(100.0);
        assert_eq!(bbox.min_lon(), -180.0);
        assert_eq!(bbox.max_lon(), 180.0);
        assert_eq!(bbox.max_lat(), 90.0);
        assert!(bbox.is_finite());
    }

    #[test]
    fn test_bounding_box_does_not_wrap_antimeridian() {
        let east = Coordinate::new(0.0, 179.9999).unwrap();
        let west = Coordinate::new(0.0, -179.9999).unwrap();

        let bbox = east.bounding_box(100.0);
        assert!(bbox.max_lon() > 180.0);
        assert!(bbox.contains(&east));
        assert!(!bbox.contains(&west));
        assert!(!west.bounding_box(100.0).contains(&east));
    }

    #[test]
    fn test_bounding_box_inclusive_edges() {
        let bbox = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        assert!(bbox.contains(&Coordinate::new(1.0, 1.0).unwrap()));
        assert!(bbox.contains(&Coordinate::new(2.0, 2.0).unwrap()));
        assert!(bbox.contains(&Coordinate::new(1.0, 2.0).unwrap()));
        assert!(!bbox.contains(&Coordinate::new(2.000001, 1.5).unwrap()));
    }

    #[test]
    fn test_bounding_box_normalizes_swapped_bounds() {
        let bbox = BoundingBox::new(2.0, 2.0, 1.0, 1.0);
        assert_eq!(bbox.min_lat(), 1.0);
        assert_eq!(bbox.max_lon(), 2.0);
    }

    #[test]
    fn test_geo_point_conversion() {
        let coord = Coordinate::new(40.7128, -74.0060).unwrap();
        let point: Point = coord.into();
        assert_eq!(point.x(), -74.0060);
        assert_eq!(point.y(), 40.7128);
        assert_eq!(Coordinate::try_from(point).unwrap(), coord);
        assert!(Coordinate::try_from(Point::new(200.0, 0.0)).is_err());
    }
}
