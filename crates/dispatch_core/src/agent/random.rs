use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::algorithm::DispatchAgent;
use super::nearest::{decision_for, pickup_point, read_request};
use super::text_parser::TextParser;
use super::types::{DispatchPayload, FleetVehicle, ParsedRequest, RoutingDecision};
use crate::error::AgentError;

/// Lower-bound baseline: any compatible idle vehicle, chosen uniformly.
pub struct RandomAgent {
    rng: StdRng,
    parser: Option<TextParser>,
    use_ground_truth: bool,
}

impl RandomAgent {
    pub fn new(seed: u64, parser: Option<TextParser>, use_ground_truth: bool) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            parser,
            use_ground_truth,
        }
    }
}

impl DispatchAgent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn wants_ground_truth(&self) -> bool {
        self.use_ground_truth
    }

    fn parse_request(&mut self, payload: &DispatchPayload) -> Result<ParsedRequest, AgentError> {
        read_request(self.parser.as_ref(), self.use_ground_truth, payload)
    }

    fn make_routing_decision(
        &mut self,
        parsed: &ParsedRequest,
        payload: &DispatchPayload,
    ) -> Result<RoutingDecision, AgentError> {
        let pickup = pickup_point(parsed, payload)?;
        let candidates: Vec<&FleetVehicle> = payload
            .fleet
            .iter()
            .filter(|v| v.is_available_for(parsed.passengers(), parsed.wheelchair_accessible))
            .collect();
        let vehicle = candidates
            .choose(&mut self.rng)
            .ok_or_else(|| AgentError::NoVehicle {
                request_id: payload.request.request_id.clone(),
            })?;
        Ok(decision_for(vehicle, &pickup, parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::AgentRequest;
    use crate::vehicle::{VehicleId, VehicleStatus};

    fn payload() -> DispatchPayload {
        let fleet = (1..=5)
            .map(|id| FleetVehicle {
                vehicle_id: VehicleId(id),
                latitude: 40.70 + id as f64 * 0.01,
                longitude: -73.98,
                status: if id == 2 { VehicleStatus::Offline } else { VehicleStatus::Idle },
                wheelchair_accessible: false,
                capacity: 4,
            })
            .collect();
        DispatchPayload {
            fleet,
            request: AgentRequest {
                request_id: "req_0001".into(),
                text: String::new(),
                request_time_ms: 0,
            },
            ground_truth: None,
        }
    }

    fn parsed() -> ParsedRequest {
        ParsedRequest {
            pickup_latitude: Some(40.75),
            pickup_longitude: Some(-73.98),
            passenger_count: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn same_seed_same_choices() {
        let mut a = RandomAgent::new(7, None, false);
        let mut b = RandomAgent::new(7, None, false);
        for _ in 0..10 {
            let da = a.make_routing_decision(&parsed(), &payload()).expect("a");
            let db = b.make_routing_decision(&parsed(), &payload()).expect("b");
            assert_eq!(da, db);
            assert_ne!(da.vehicle_id, VehicleId(2));
        }
    }
}
