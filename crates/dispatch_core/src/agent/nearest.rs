use super::algorithm::DispatchAgent;
use super::text_parser::TextParser;
use super::types::{DispatchPayload, FleetVehicle, ParsedRequest, RoutingDecision};
use crate::error::AgentError;
use crate::location::Location;
use crate::travel_time::DEFAULT_CIRCUITY;

/// Reads the request from ground truth (when offered) or the text parser.
pub(crate) fn read_request(
    parser: Option<&TextParser>,
    use_ground_truth: bool,
    payload: &DispatchPayload,
) -> Result<ParsedRequest, AgentError> {
    if use_ground_truth {
        if let Some(truth) = &payload.ground_truth {
            return Ok(ParsedRequest::from_ground_truth(truth));
        }
    }
    match parser {
        Some(parser) => Ok(parser.parse(&payload.request.text)),
        None => Err(AgentError::Unparsable {
            request_id: payload.request.request_id.clone(),
            reason: "no ground truth and no text parser".to_string(),
        }),
    }
}

pub(crate) fn pickup_point(
    parsed: &ParsedRequest,
    payload: &DispatchPayload,
) -> Result<Location, AgentError> {
    parsed.pickup_location().ok_or_else(|| AgentError::Unparsable {
        request_id: payload.request.request_id.clone(),
        reason: "pickup location unresolved".to_string(),
    })
}

/// Road-distance guesses for a candidate, using the same circuity as the fallback oracle.
pub(crate) fn decision_for(
    vehicle: &FleetVehicle,
    pickup: &Location,
    parsed: &ParsedRequest,
) -> RoutingDecision {
    let trip = parsed
        .dropoff_location()
        .map_or(0.0, |dropoff| pickup.distance_miles(&dropoff) * DEFAULT_CIRCUITY);
    RoutingDecision {
        vehicle_id: vehicle.vehicle_id,
        estimated_pickup_distance_miles: vehicle.location().distance_miles(pickup) * DEFAULT_CIRCUITY,
        estimated_trip_distance_miles: trip,
    }
}

/// Closest compatible idle vehicle; ties go to the lower vehicle id.
pub fn nearest_vehicle<'a>(
    fleet: &'a [FleetVehicle],
    pickup: &Location,
    passengers: u32,
    wheelchair_required: bool,
) -> Option<&'a FleetVehicle> {
    fleet
        .iter()
        .filter(|v| v.is_available_for(passengers, wheelchair_required))
        .map(|v| (v, v.location().distance_miles(pickup)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.vehicle_id.cmp(&b.0.vehicle_id)))
        .map(|(v, _)| v)
}

/// Greedy baseline: always sends the nearest compatible idle vehicle.
///
/// With `use_ground_truth` the parse is copied from the withheld ground truth, which
/// isolates routing quality from parsing quality. Without it the rule-based
/// [`TextParser`] reads the text.
pub struct NearestVehicleAgent {
    parser: Option<TextParser>,
    use_ground_truth: bool,
}

impl NearestVehicleAgent {
    pub fn new(parser: Option<TextParser>, use_ground_truth: bool) -> Self {
        Self {
            parser,
            use_ground_truth,
        }
    }

    /// Routes on ground truth only.
    pub fn oracle() -> Self {
        Self::new(None, true)
    }
}

impl DispatchAgent for NearestVehicleAgent {
    fn name(&self) -> &str {
        "nearest"
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
        let vehicle = nearest_vehicle(
            &payload.fleet,
            &pickup,
            parsed.passengers(),
            parsed.wheelchair_accessible,
        )
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
    use crate::requests::GroundTruth;
    use crate::vehicle::{VehicleId, VehicleStatus};

    fn fleet_vehicle(id: u32, lat: f64, status: VehicleStatus, accessible: bool) -> FleetVehicle {
        FleetVehicle {
            vehicle_id: VehicleId(id),
            latitude: lat,
            longitude: -73.98,
            status,
            wheelchair_accessible: accessible,
            capacity: 4,
        }
    }

    fn payload(wheelchair: bool) -> DispatchPayload {
        DispatchPayload {
            fleet: vec![
                fleet_vehicle(1, 40.70, VehicleStatus::Idle, false),
                fleet_vehicle(2, 40.751, VehicleStatus::OnTrip, true),
                fleet_vehicle(3, 40.76, VehicleStatus::Idle, false),
                fleet_vehicle(4, 40.80, VehicleStatus::Idle, true),
            ],
            request: AgentRequest {
                request_id: "req_0001".into(),
                text: String::new(),
                request_time_ms: 0,
            },
            ground_truth: Some(GroundTruth {
                pickup_zone_id: Some(161),
                dropoff_zone_id: Some(236),
                pickup_latitude: 40.75,
                pickup_longitude: -73.98,
                dropoff_latitude: 40.77,
                dropoff_longitude: -73.95,
                passenger_count: 1,
                wheelchair_accessible: wheelchair,
                shared_ride_ok: false,
                pickup_time: "08:10".into(),
                recorded_fare: None,
                recorded_distance_miles: None,
            }),
        }
    }

    #[test]
    fn picks_nearest_idle_vehicle() {
        let mut agent = NearestVehicleAgent::oracle();
        let response = agent.dispatch(&payload(false)).expect("response");
        let routing = response.routing.expect("routing");
        assert_eq!(routing.vehicle_id, VehicleId(3));
        assert!(routing.estimated_pickup_distance_miles > 0.0);
        assert!(routing.estimated_trip_distance_miles > 0.0);
        assert_eq!(response.parsed.pickup_zone_id, Some(161));
    }

    #[test]
    fn respects_wheelchair_requirement() {
        let mut agent = NearestVehicleAgent::oracle();
        let routing = agent
            .dispatch(&payload(true))
            .expect("response")
            .routing
            .expect("routing");
        assert_eq!(routing.vehicle_id, VehicleId(4));
    }

    #[test]
    fn no_compatible_vehicle_leaves_routing_empty() {
        let mut p = payload(true);
        p.fleet.retain(|v| !v.wheelchair_accessible);
        let response = NearestVehicleAgent::oracle().dispatch(&p).expect("response");
        assert!(response.routing.is_none());
    }

    #[test]
    fn without_ground_truth_or_parser_the_request_is_unparsable() {
        let mut p = payload(false);
        p.ground_truth = None;
        assert!(matches!(
            NearestVehicleAgent::oracle().dispatch(&p),
            Err(AgentError::Unparsable { .. })
        ));
    }
}
