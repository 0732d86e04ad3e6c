//! Zone table and trip records shared by every run of an evaluation.

use std::path::Path;

use dispatch_core::error::DataError;
use dispatch_core::requests::{load_trip_records, GeneratedRequests, RequestGenerator, TripRecord, ZoneTable};
use dispatch_core::scenario::HarnessConfig;

#[derive(Debug, Clone)]
pub struct EvaluationInputs {
    pub zones: ZoneTable,
    pub records: Vec<TripRecord>,
}

impl EvaluationInputs {
    pub fn new(zones: ZoneTable, records: Vec<TripRecord>) -> Self {
        Self { zones, records }
    }

    pub fn load(zones_path: impl AsRef<Path>, trips_path: impl AsRef<Path>) -> Result<Self, DataError> {
        let zones = ZoneTable::load(zones_path)?;
        let records = load_trip_records(trips_path)?;
        Ok(Self { zones, records })
    }

    /// Requests for `config`, seeded by `config.seed`.
    pub fn generate(&self, config: &HarnessConfig) -> Result<GeneratedRequests, DataError> {
        RequestGenerator::new(&self.zones, config.generator_params()).generate(&self.records)
    }
}
