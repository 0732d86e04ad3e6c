//! Scenario setup: harness configuration, fleet sampling and environment construction.
//!
//! Vehicles start at historical pickup locations so supply sits where demand was
//! recorded. The travel-time matrix over the request legs is precomputed up front when
//! enabled.

mod build;
mod params;

pub use build::{build_environment, sample_fleet};
pub use params::{HarnessConfig, DEFAULT_HORIZON_SECS};
