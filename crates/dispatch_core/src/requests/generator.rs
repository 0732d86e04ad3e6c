//! Samples trip records into ride requests.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::prompts::{PhrasebookPromptWriter, PromptContext, PromptWriter, TemplatePromptWriter};
use super::records::TripRecord;
use super::zones::{CentroidGeocoder, CentroidJitterGeocoder, Geocoder, ZoneTable};
use super::{GroundTruth, Request, TimeWindow, TIME_WINDOW_MS};
use crate::error::DataError;
use crate::location::Location;

#[derive(Debug, Clone)]
pub struct GeneratorParams {
    pub num_requests: usize,
    /// Share of requests written from fixed templates (the rest use the phrasebook).
    pub template_ratio: f64,
    /// Place endpoints near, rather than exactly at, zone centroids.
    pub augment_locations: bool,
    pub jitter_radius_miles: f64,
    pub wheelchair_probability: f64,
    pub shared_ride_probability: f64,
    pub max_passengers: u32,
    pub seed: u64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            num_requests: 100,
            template_ratio: 1.0,
            augment_locations: false,
            jitter_radius_miles: 0.4,
            wheelchair_probability: 0.05,
            shared_ride_probability: 0.3,
            max_passengers: 4,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GenerationStats {
    pub examined: usize,
    pub skipped_timestamp: usize,
    pub skipped_location: usize,
    pub generated: usize,
}

#[derive(Debug, Clone)]
pub struct GeneratedRequests {
    /// Sorted by arrival time.
    pub requests: Vec<Request>,
    /// Unix ms corresponding to sim time 0.
    pub epoch_ms: i64,
    pub stats: GenerationStats,
}

struct Draft {
    pickup_ms: i64,
    dropoff_ms: i64,
    origin: Location,
    destination: Location,
    record_index: usize,
}

pub struct RequestGenerator<'a> {
    zones: &'a ZoneTable,
    params: GeneratorParams,
    geocoder: Box<dyn Geocoder>,
}

impl<'a> RequestGenerator<'a> {
    pub fn new(zones: &'a ZoneTable, params: GeneratorParams) -> Self {
        let geocoder: Box<dyn Geocoder> = if params.augment_locations {
            Box::new(CentroidJitterGeocoder {
                radius_miles: params.jitter_radius_miles,
            })
        } else {
            Box::new(CentroidGeocoder)
        };
        Self {
            zones,
            params,
            geocoder,
        }
    }

    /// Explicit coordinates win; otherwise the zone is geocoded.
    fn resolve(
        &self,
        point: Option<Location>,
        zone_id: Option<u32>,
        rng: &mut StdRng,
    ) -> Option<Location> {
        let zone = zone_id.and_then(|id| self.zones.get(id));
        match (point, zone) {
            (Some(p), Some(z)) => Some(p.with_zone(z.id, z.name.clone())),
            (Some(p), None) => Some(match self.zones.nearest_zone(&p) {
                Some(z) => p.with_zone(z.id, z.name.clone()),
                None => p,
            }),
            (None, Some(z)) => self.geocoder.locate(z, rng),
            (None, None) => None,
        }
    }

    pub fn generate(&self, records: &[TripRecord]) -> Result<GeneratedRequests, DataError> {
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.shuffle(&mut rng);

        let mut stats = GenerationStats::default();
        let mut drafts = Vec::with_capacity(self.params.num_requests);
        for idx in order {
            if drafts.len() >= self.params.num_requests {
                break;
            }
            stats.examined += 1;
            let record = &records[idx];
            let (Some(pickup_ms), Some(dropoff_ms)) = (record.pickup_ms(), record.dropoff_ms())
            else {
                stats.skipped_timestamp += 1;
                continue;
            };
            if dropoff_ms <= pickup_ms {
                stats.skipped_timestamp += 1;
                continue;
            }
            let origin = self.resolve(record.pickup_point(), record.pickup_zone_id, &mut rng);
            let destination = self.resolve(record.dropoff_point(), record.dropoff_zone_id, &mut rng);
            let (Some(origin), Some(destination)) = (origin, destination) else {
                stats.skipped_location += 1;
                continue;
            };
            drafts.push(Draft {
                pickup_ms,
                dropoff_ms,
                origin,
                destination,
                record_index: idx,
            });
        }

        if drafts.is_empty() {
            return Err(DataError::NoUsableTrips {
                skipped: stats.skipped_timestamp + stats.skipped_location,
            });
        }

        drafts.sort_by_key(|d| (d.pickup_ms, d.record_index));
        let window = TIME_WINDOW_MS as i64;
        let epoch_ms = drafts[0].pickup_ms - window;

        let requests: Vec<Request> = drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| self.build_request(i, draft, &records[..], epoch_ms, &mut rng))
            .collect();
        stats.generated = requests.len();
        tracing::info!(
            generated = stats.generated,
            skipped_timestamp = stats.skipped_timestamp,
            skipped_location = stats.skipped_location,
            "generated ride requests"
        );
        Ok(GeneratedRequests {
            requests,
            epoch_ms,
            stats,
        })
    }

    fn build_request(
        &self,
        index: usize,
        draft: Draft,
        records: &[TripRecord],
        epoch_ms: i64,
        rng: &mut StdRng,
    ) -> Request {
        let record = &records[draft.record_index];
        let pickup_sim = (draft.pickup_ms - epoch_ms).max(0) as u64;
        let dropoff_sim = (draft.dropoff_ms - epoch_ms).max(0) as u64;
        let pickup_window = TimeWindow::around(pickup_sim, TIME_WINDOW_MS);
        let dropoff_window = TimeWindow::around(dropoff_sim, TIME_WINDOW_MS);

        let passenger_count = record
            .passenger_count
            .filter(|p| p.is_finite() && *p >= 1.0)
            .map_or(1, |p| p.round() as u32)
            .clamp(1, self.params.max_passengers.max(1));
        let wheelchair = rng.gen_bool(self.params.wheelchair_probability.clamp(0.0, 1.0));
        let shared = rng.gen_bool(self.params.shared_ride_probability.clamp(0.0, 1.0));
        let pickup_time = DateTime::<Utc>::from_timestamp_millis(draft.pickup_ms)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|| "00:00".to_string());

        let origin_name = place_name(&draft.origin);
        let destination_name = place_name(&draft.destination);
        let ctx = PromptContext {
            origin: &origin_name,
            destination: &destination_name,
            pickup_time: &pickup_time,
            passengers: passenger_count,
            wheelchair,
            shared_ok: shared,
        };
        let text = if rng.gen_bool(self.params.template_ratio.clamp(0.0, 1.0)) {
            TemplatePromptWriter.write(&ctx, rng)
        } else {
            PhrasebookPromptWriter.write(&ctx, rng)
        };

        let ground_truth = GroundTruth {
            pickup_zone_id: draft.origin.zone_id,
            dropoff_zone_id: draft.destination.zone_id,
            pickup_latitude: draft.origin.latitude,
            pickup_longitude: draft.origin.longitude,
            dropoff_latitude: draft.destination.latitude,
            dropoff_longitude: draft.destination.longitude,
            passenger_count,
            wheelchair_accessible: wheelchair,
            shared_ride_ok: shared,
            pickup_time,
            recorded_fare: record.fare_amount,
            recorded_distance_miles: record.trip_distance,
        };

        Request {
            id: format!("req_{:04}", index + 1),
            request_time_ms: pickup_window.earliest_ms,
            pickup_window,
            dropoff_window,
            origin: draft.origin,
            destination: draft.destination,
            passenger_count,
            wheelchair_required: wheelchair,
            shared_ride_ok: shared,
            text,
            ground_truth,
        }
    }
}

fn place_name(loc: &Location) -> String {
    match &loc.zone_name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("{:.5}, {:.5}", loc.latitude, loc.longitude),
    }
}
