use super::algorithm::DispatchAgent;
use super::nearest::{decision_for, nearest_vehicle, pickup_point};
use super::text_parser::TextParser;
use super::types::{DispatchPayload, ParsedRequest, RoutingDecision};
use crate::error::AgentError;

/// Reads only the request text, never the ground truth, then sends the nearest vehicle.
/// Its parsing score is the floor a language-model agent should beat.
pub struct RegexAgent {
    parser: TextParser,
}

impl RegexAgent {
    pub fn new(parser: TextParser) -> Self {
        Self { parser }
    }
}

impl DispatchAgent for RegexAgent {
    fn name(&self) -> &str {
        "regex"
    }

    fn parse_request(&mut self, payload: &DispatchPayload) -> Result<ParsedRequest, AgentError> {
        Ok(self.parser.parse(&payload.request.text))
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
