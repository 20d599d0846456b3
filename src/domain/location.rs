use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

const MAX_CHAR_LENGTH: usize = 256;
const FORBIDDEN_CHARS: [char; 9] = ['/', '{', '}', '"', '>', '<', '\\', '(', ')'];

/// Human readable place name, e.g. `London, GB`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LocationName(String);

impl LocationName {
    pub fn parse(name: String) -> Result<LocationName, String> {
        let is_empty_or_whitespace = name.trim().is_empty();
        let is_too_long = name.graphemes(true).count() > MAX_CHAR_LENGTH;
        let contains_forbidden_chars = name.chars().any(|char| FORBIDDEN_CHARS.contains(&char));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_chars {
            return Err(format!("{} is not a valid location name", name));
        }

        Ok(Self(name.trim().to_string()))
    }
}

impl AsRef<str> for LocationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn parse(latitude: f64, longitude: f64) -> Result<Coordinates, String> {
        let valid_latitude = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let valid_longitude = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);

        if !valid_latitude || !valid_longitude {
            return Err(format!(
                "({}, {}) are not valid coordinates",
                latitude, longitude
            ));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Where a subscriber wants to be alerted for. Coordinates are optional; when they
/// are missing the weather provider resolves the name itself.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Location {
    pub name: LocationName,
    pub coordinates: Option<Coordinates>,
}

impl Location {
    pub fn new(name: LocationName) -> Self {
        Self {
            name,
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_ref())
    }
}
