//! OSRM `table` service backend.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{DistanceService, TravelEstimate};
use crate::location::Location;

const METERS_PER_MILE: f64 = 1609.344;

pub fn default_max_elements() -> usize {
    10_000
}

/// Distance matrix via an OSRM HTTP endpoint.
pub struct OsrmTableService {
    client: Client,
    endpoint: String,
    max_elements: usize,
}

impl OsrmTableService {
    pub fn new(endpoint: &str, max_elements: usize) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_elements: max_elements.max(1),
        })
    }

    fn url(&self, origins: &[Location], destinations: &[Location]) -> String {
        let coords: Vec<String> = origins
            .iter()
            .chain(destinations)
            .map(|l| format!("{},{}", l.longitude, l.latitude))
            .collect();
        let sources: Vec<String> = (0..origins.len()).map(|i| i.to_string()).collect();
        let dests: Vec<String> = (origins.len()..origins.len() + destinations.len())
            .map(|i| i.to_string())
            .collect();
        format!(
            "{}/table/v1/driving/{}?sources={}&destinations={}&annotations=duration,distance",
            self.endpoint,
            coords.join(";"),
            sources.join(";"),
            dests.join(";"),
        )
    }
}

/// Minimal OSRM table response.
#[derive(Deserialize)]
struct OsrmTableResponse {
    code: String,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl DistanceService for OsrmTableService {
    fn max_elements(&self) -> usize {
        self.max_elements
    }

    fn estimate_batch(
        &self,
        origins: &[Location],
        destinations: &[Location],
    ) -> Vec<Vec<Option<TravelEstimate>>> {
        let empty = vec![vec![None; destinations.len()]; origins.len()];
        if origins.is_empty() || destinations.is_empty() {
            return empty;
        }

        let resp: OsrmTableResponse = match self
            .client
            .get(self.url(origins, destinations))
            .send()
            .and_then(|r| r.json())
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(error = %err, "OSRM table request failed");
                return empty;
            }
        };
        if resp.code != "Ok" {
            tracing::warn!(code = %resp.code, "OSRM table returned an error code");
            return empty;
        }
        let (Some(durations), Some(distances)) = (resp.durations, resp.distances) else {
            return empty;
        };

        durations
            .into_iter()
            .zip(distances)
            .map(|(dur_row, dist_row)| {
                dur_row
                    .into_iter()
                    .zip(dist_row)
                    .map(|(dur, dist)| match (dur, dist) {
                        (Some(duration_secs), Some(meters)) => Some(TravelEstimate {
                            distance_miles: meters / METERS_PER_MILE,
                            duration_secs,
                        }),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }
}
