//! Zone lookup table and zone-to-point resolution.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand::{Rng, RngCore};
use serde::Deserialize;

use crate::error::DataError;
use crate::location::Location;

const MILES_PER_DEGREE_LAT: f64 = 69.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: u32,
    pub borough: String,
    pub name: String,
    pub centroid: Option<Location>,
}

impl Zone {
    /// The zone centroid tagged with this zone's id and name.
    pub fn centroid_location(&self) -> Option<Location> {
        self.centroid
            .as_ref()
            .map(|c| Location::new(c.latitude, c.longitude).with_zone(self.id, self.name.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct ZoneRow {
    #[serde(alias = "LocationID", alias = "zone_id")]
    location_id: u32,
    #[serde(default, alias = "Borough")]
    borough: String,
    #[serde(default, alias = "Zone", alias = "zone_name")]
    zone: String,
    #[serde(default, alias = "centroid_lat", alias = "lat", deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
    #[serde(default, alias = "centroid_lng", alias = "lng", alias = "lon", deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
}

/// Zone id -> name/borough/centroid.
#[derive(Debug, Clone, Default)]
pub struct ZoneTable {
    zones: BTreeMap<u32, Zone>,
}

impl ZoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zone: Zone) {
        self.zones.insert(zone.id, zone);
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = Self::new();
        for row in csv_reader.deserialize::<ZoneRow>() {
            let row = row?;
            let centroid = match (row.latitude, row.longitude) {
                (Some(lat), Some(lng)) => Some(Location::new(lat, lng)).filter(Location::is_valid),
                _ => None,
            };
            if centroid.is_none() {
                tracing::debug!(zone = row.location_id, "zone without a usable centroid");
            }
            table.insert(Zone {
                id: row.location_id,
                borough: row.borough,
                name: row.zone,
                centroid,
            });
        }
        if table.is_empty() {
            return Err(DataError::EmptyZoneTable);
        }
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!(zones = table.len(), path = %path.display(), "loaded zone table");
        Ok(table)
    }

    pub fn get(&self, id: u32) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&Zone> {
        let name = name.trim();
        self.zones
            .values()
            .find(|z| z.name.eq_ignore_ascii_case(name))
    }

    /// Zone for a coordinate: the one with the nearest centroid.
    pub fn nearest_zone(&self, location: &Location) -> Option<&Zone> {
        self.zones
            .values()
            .filter_map(|z| z.centroid.as_ref().map(|c| (z, c.distance_miles(location))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(z, _)| z)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Resolves a zone to a concrete point.
pub trait Geocoder: Send + Sync {
    fn locate(&self, zone: &Zone, rng: &mut dyn RngCore) -> Option<Location>;
}

/// Always the zone centroid.
#[derive(Debug, Default, Clone, Copy)]
pub struct CentroidGeocoder;

impl Geocoder for CentroidGeocoder {
    fn locate(&self, zone: &Zone, _rng: &mut dyn RngCore) -> Option<Location> {
        zone.centroid_location()
    }
}

/// A point drawn uniformly from a disc around the zone centroid, standing in for an
/// exact street address.
#[derive(Debug, Clone, Copy)]
pub struct CentroidJitterGeocoder {
    pub radius_miles: f64,
}

impl Default for CentroidJitterGeocoder {
    fn default() -> Self {
        Self { radius_miles: 0.4 }
    }
}

impl Geocoder for CentroidJitterGeocoder {
    fn locate(&self, zone: &Zone, rng: &mut dyn RngCore) -> Option<Location> {
        let center = zone.centroid.as_ref()?;
        let r = self.radius_miles.max(0.0) * rng.gen::<f64>().sqrt();
        let theta = 2.0 * PI * rng.gen::<f64>();
        let dlat = r * theta.cos() / MILES_PER_DEGREE_LAT;
        let dlng = r * theta.sin() / (MILES_PER_DEGREE_LAT * center.latitude.to_radians().cos());
        let loc = Location::new(center.latitude + dlat, center.longitude + dlng)
            .with_zone(zone.id, zone.name.clone());
        loc.is_valid().then_some(loc)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const ZONES: &str = "\
LocationID,Borough,Zone,service_zone,latitude,longitude
132,Queens,JFK Airport,Airports,40.6413,-73.7781
161,Manhattan,Midtown Center,Yellow Zone,40.7580,-73.9855
264,Unknown,NV,N/A,,
";

    #[test]
    fn loads_zones_and_tolerates_missing_centroids() {
        let table = ZoneTable::from_reader(ZONES.as_bytes()).expect("zones");
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(132).expect("jfk").borough, "Queens");
        assert!(table.get(264).expect("nv").centroid.is_none());
        assert_eq!(table.find_by_name("midtown center").expect("name").id, 161);
    }

    #[test]
    fn nearest_zone_uses_centroids() {
        let table = ZoneTable::from_reader(ZONES.as_bytes()).expect("zones");
        let near_jfk = Location::new(40.65, -73.79);
        assert_eq!(table.nearest_zone(&near_jfk).expect("zone").id, 132);
    }

    #[test]
    fn jitter_stays_within_radius() {
        let table = ZoneTable::from_reader(ZONES.as_bytes()).expect("zones");
        let zone = table.get(161).expect("zone");
        let geocoder = CentroidJitterGeocoder { radius_miles: 0.5 };
        let mut rng = StdRng::seed_from_u64(3);
        let center = zone.centroid.clone().expect("centroid");
        for _ in 0..200 {
            let p = geocoder.locate(zone, &mut rng).expect("point");
            assert!(p.distance_miles(&center) <= 0.51);
            assert_eq!(p.zone_id, Some(161));
        }
        assert!(geocoder.locate(table.get(264).expect("nv"), &mut rng).is_none());
    }
}
