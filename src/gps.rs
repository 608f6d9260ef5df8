//! Normalization of EXIF-style GPS records into decimal coordinates.
//!
//! EXIF stores each axis as three rationals (`"deg/1,min/1,sec/100"`) and a
//! hemisphere reference letter. This module turns those strings into a
//! validated [`Coordinate`] before anything reaches the cache.

use crate::error::{GeoCacheError, Result};
use crate::types::Coordinate;

/// Hemisphere reference of a latitude or longitude component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Hemisphere::North),
            "S" => Ok(Hemisphere::South),
            "E" => Ok(Hemisphere::East),
            "W" => Ok(Hemisphere::West),
            other => Err(GeoCacheError::InvalidFormat(format!(
                "Unknown hemisphere reference: {:?}",
                other
            ))),
        }
    }

    fn is_latitude(self) -> bool {
        matches!(self, Hemisphere::North | Hemisphere::South)
    }

    fn sign(self) -> f64 {
        match self {
            Hemisphere::North | Hemisphere::East => 1.0,
            Hemisphere::South | Hemisphere::West => -1.0,
        }
    }
}

/// A GPS position as found in image metadata, plus its decimal normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsCoordinates {
    latitude: String,
    latitude_ref: Hemisphere,
    longitude: String,
    longitude_ref: Hemisphere,
    coordinate: Coordinate,
}

impl GpsCoordinates {
    /// Parse degree/minute/second strings with their hemisphere references.
    ///
    /// # Examples
    ///
    /// ```
    /// use geocache::GpsCoordinates;
    ///
    /// let gps = GpsCoordinates::from_dms("51/1,30/1,0/1", "N", "0/1,15/1,0/1", "W").unwrap();
    /// assert_eq!(gps.coordinate().latitude(), 51.5);
    /// assert_eq!(gps.coordinate().longitude(), -0.25);
    /// ```
    pub fn from_dms(
        latitude: &str,
        latitude_ref: &str,
        longitude: &str,
        longitude_ref: &str,
    ) -> Result<Self> {
        let latitude_ref = Hemisphere::parse(latitude_ref)?;
        if !latitude_ref.is_latitude() {
            return Err(GeoCacheError::InvalidFormat(format!(
                "Latitude reference must be N or S, got {:?}",
                latitude_ref
            )));
        }
        let longitude_ref = Hemisphere::parse(longitude_ref)?;
        if longitude_ref.is_latitude() {
            return Err(GeoCacheError::InvalidFormat(format!(
                "Longitude reference must be E or W, got {:?}",
                longitude_ref
            )));
        }

        let dec_lat = latitude_ref.sign() * parse_dms(latitude)?;
        let dec_lon = longitude_ref.sign() * parse_dms(longitude)?;
        let coordinate = Coordinate::new(dec_lat, dec_lon)?;
        log::debug!("Normalized GPS position to {}", coordinate.query_key());

        Ok(Self {
            latitude: latitude.to_string(),
            latitude_ref,
            longitude: longitude.to_string(),
            longitude_ref,
            coordinate,
        })
    }

    /// Build from raw EXIF tag values.
    ///
    /// Returns `Ok(None)` when the image carries no latitude tag at all, which
    /// is the normal case for pictures taken without location.
    pub fn from_exif_tags(
        latitude: Option<&str>,
        latitude_ref: Option<&str>,
        longitude: Option<&str>,
        longitude_ref: Option<&str>,
    ) -> Result<Option<Self>> {
        let Some(latitude) = latitude else {
            return Ok(None);
        };

        let missing =
            |tag: &str| GeoCacheError::InvalidFormat(format!("Missing EXIF tag {}", tag));
        let latitude_ref = latitude_ref.ok_or_else(|| missing("GPSLatitudeRef"))?;
        let longitude = longitude.ok_or_else(|| missing("GPSLongitude"))?;
        let longitude_ref = longitude_ref.ok_or_else(|| missing("GPSLongitudeRef"))?;

        Self::from_dms(latitude, latitude_ref, longitude, longitude_ref).map(Some)
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Decimal `"<lat>|<lon>"` form, used as the remote lookup key.
    pub fn decimal_coords(&self) -> String {
        self.coordinate.query_key()
    }

    pub fn latitude_dms(&self) -> &str {
        &self.latitude
    }

    pub fn longitude_dms(&self) -> &str {
        &self.longitude
    }

    pub fn latitude_ref(&self) -> Hemisphere {
        self.latitude_ref
    }

    pub fn longitude_ref(&self) -> Hemisphere {
        self.longitude_ref
    }
}

/// Convert `"d/dd,m/mm,s/ss"` into unsigned decimal degrees.
pub fn parse_dms(value: &str) -> Result<f64> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 3 {
        return Err(GeoCacheError::InvalidFormat(format!(
            "Expected three comma-separated rationals, got {:?}",
            value
        )));
    }

    let degrees = parse_rational(parts[0])?;
    let minutes = parse_rational(parts[1])?;
    let seconds = parse_rational(parts[2])?;

    Ok(degrees + minutes / 60.0 + seconds / 3600.0)
}

fn parse_rational(value: &str) -> Result<f64> {
    let value = value.trim();
    let (numerator, denominator) = match value.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (value, "1"),
    };

    let parse = |s: &str| {
        s.parse::<f64>().map_err(|e| {
            GeoCacheError::InvalidFormat(format!("Invalid rational {:?}: {}", value, e))
        })
    };
    let numerator = parse(numerator)?;
    let denominator = parse(denominator)?;

    if denominator == 0.0 {
        return Err(GeoCacheError::InvalidFormat(format!(
            "Zero denominator in {:?}",
            value
        )));
    }

    let result = numerator / denominator;
    if !result.is_finite() || result < 0.0 {
        return Err(GeoCacheError::InvalidFormat(format!(
            "Rational component must be finite and non-negative: {:?}",
            value
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_position_west() {
        let gps = GpsCoordinates::from_dms("0/1,0/1,00/1", "N", "0/1,0/1,00/1", "W").unwrap();
        assert_eq!(gps.coordinate().latitude(), 0.0);
        assert_eq!(gps.coordinate().longitude(), 0.0);
        assert_eq!(gps.decimal_coords(), "0.0|0.0");
        assert_eq!(gps.longitude_ref(), Hemisphere::West);
    }

    #[test]
    fn test_southern_eastern_hemispheres() {
        let gps = GpsCoordinates::from_dms("33/1,52/1,0/1", "S", "151/1,12/1,36/1", "E").unwrap();
        let coord = gps.coordinate();
        assert!((coord.latitude() + (33.0 + 52.0 / 60.0)).abs() < 1e-12);
        assert!((coord.longitude() - (151.0 + 12.0 / 60.0 + 36.0 / 3600.0)).abs() < 1e-12);
    }

    #[test]
    fn test_fractional_seconds() {
        let degrees = parse_dms("10/1,30/1,1800/100").unwrap();
        assert!((degrees - (10.0 + 0.5 + 18.0 / 3600.0)).abs() < 1e-12);
    }

    #[test]
    fn test_bare_numbers_accepted() {
        assert_eq!(parse_dms("12, 30, 0").unwrap(), 12.5);
    }

    #[test]
    fn test_lowercase_references() {
        let gps = GpsCoordinates::from_dms("1/1,0/1,0/1", "s", "1/1,0/1,0/1", "w").unwrap();
        assert_eq!(gps.coordinate().latitude(), -1.0);
        assert_eq!(gps.coordinate().longitude(), -1.0);
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(matches!(
            parse_dms("10/1,30/1"),
            Err(GeoCacheError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_dms("10/0,0/1,0/1"),
            Err(GeoCacheError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_dms("ten/1,0/1,0/1"),
            Err(GeoCacheError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_dms("-5/1,0/1,0/1"),
            Err(GeoCacheError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_wrong_axis_reference_rejected() {
        let err = GpsCoordinates::from_dms("1/1,0/1,0/1", "E", "1/1,0/1,0/1", "W");
        assert!(matches!(err, Err(GeoCacheError::InvalidFormat(_))));

        let err = GpsCoordinates::from_dms("1/1,0/1,0/1", "N", "1/1,0/1,0/1", "S");
        assert!(matches!(err, Err(GeoCacheError::InvalidFormat(_))));

        let err = GpsCoordinates::from_dms("1/1,0/1,0/1", "X", "1/1,0/1,0/1", "W");
        assert!(matches!(err, Err(GeoCacheError::InvalidFormat(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = GpsCoordinates::from_dms("95/1,0/1,0/1", "N", "0/1,0/1,0/1", "E");
        assert!(matches!(err, Err(GeoCacheError::InvalidInput(_))));
    }

    #[test]
    fn test_exif_tags_without_latitude() {
        let gps = GpsCoordinates::from_exif_tags(None, None, None, None).unwrap();
        assert!(gps.is_none());
    }

    #[test]
    fn test_exif_tags_partial() {
        let err = GpsCoordinates::from_exif_tags(Some("1/1,0/1,0/1"), Some("N"), None, Some("E"));
        assert!(matches!(err, Err(GeoCacheError::InvalidFormat(_))));

        let gps = GpsCoordinates::from_exif_tags(
            Some("1/1,0/1,0/1"),
            Some("N"),
            Some("2/1,0/1,0/1"),
            Some("E"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(gps.decimal_coords(), "1.0|2.0");
        assert_eq!(gps.latitude_dms(), "1/1,0/1,0/1");
    }
}
