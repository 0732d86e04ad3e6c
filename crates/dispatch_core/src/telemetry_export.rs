//! Parquet export of run telemetry.

mod assignments;
mod trajectories;
mod trip_outcomes;
mod utils;

pub use assignments::write_assignments_parquet;
pub use trajectories::write_trajectories_parquet;
pub use trip_outcomes::write_trip_outcomes_parquet;
pub use utils::status_code;
