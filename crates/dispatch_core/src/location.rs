//! Point locations and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// An immutable point with an optional taxi zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            zone_id: None,
            zone_name: None,
        }
    }

    pub fn with_zone(mut self, zone_id: u32, zone_name: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id);
        self.zone_name = Some(zone_name.into());
        self
    }

    /// Finite coordinates inside the valid lat/lng ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Haversine distance in miles.
    pub fn distance_miles(&self, other: &Location) -> f64 {
        haversine_miles(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

pub fn haversine_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lng1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lng2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Arithmetic centroid of the valid locations, or `None` when there are none.
pub fn centroid<'a, I>(locations: I) -> Option<Location>
where
    I: IntoIterator<Item = &'a Location>,
{
    let (mut lat, mut lng, mut n) = (0.0, 0.0, 0usize);
    for loc in locations.into_iter().filter(|l| l.is_valid()) {
        lat += loc.latitude;
        lng += loc.longitude;
        n += 1;
    }
    (n > 0).then(|| Location::new(lat / n as f64, lng / n as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_midtown_and_jfk_is_plausible() {
        let midtown = Location::new(40.7549, -73.9840);
        let jfk = Location::new(40.6413, -73.7781);
        let d = midtown.distance_miles(&jfk);
        assert!((12.0..14.0).contains(&d), "got {d}");
        assert!((d - jfk.distance_miles(&midtown)).abs() < 1e-9);
    }

    #[test]
    fn centroid_skips_invalid_points() {
        let points = vec![
            Location::new(40.0, -74.0),
            Location::new(f64::NAN, -74.0),
            Location::new(42.0, -72.0),
            Location::new(95.0, 0.0),
        ];
        let c = centroid(&points).expect("centroid");
        assert!((c.latitude - 41.0).abs() < 1e-9);
        assert!((c.longitude + 73.0).abs() < 1e-9);
        assert!(centroid(&[Location::new(f64::NAN, 0.0)]).is_none());
    }
}
