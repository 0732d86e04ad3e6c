//! Evaluation harness for ride-hailing dispatch agents.
//!
//! A fleet of [`vehicle::Vehicle`]s lives in a bevy_ecs world driven by a discrete-event
//! [`clock::SimulationClock`]. Requests sampled from historical trips are fed to a
//! [`agent::DispatchAgent`] one at a time; its decisions are validated and simulated, and
//! the [`evaluator::Evaluator`] scores parsing accuracy and routing efficiency.

pub mod agent;
pub mod clock;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod location;
pub mod pricing;
pub mod requests;
pub mod runner;
pub mod scenario;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
pub mod travel_time;
pub mod trips;
pub mod vehicle;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
