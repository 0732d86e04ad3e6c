use crate::error::AgentError;

use super::types::{AgentResponse, DispatchPayload, ParsedRequest, RoutingDecision};

/// A dispatcher under evaluation.
///
/// The environment calls [`DispatchAgent::dispatch`] once per request with the current
/// fleet snapshot. Implementations either split the work into a parsing step and a
/// routing step (the default `dispatch`) or answer both in one round trip.
pub trait DispatchAgent: Send {
    fn name(&self) -> &str;

    /// Whether payloads for this agent should carry the request's ground truth.
    fn wants_ground_truth(&self) -> bool {
        false
    }

    /// Structured reading of the request text.
    fn parse_request(&mut self, payload: &DispatchPayload) -> Result<ParsedRequest, AgentError>;

    /// Picks a vehicle for an already parsed request.
    fn make_routing_decision(
        &mut self,
        parsed: &ParsedRequest,
        payload: &DispatchPayload,
    ) -> Result<RoutingDecision, AgentError>;

    /// Parse then route. A routing failure keeps the parse and leaves `routing` empty.
    fn dispatch(&mut self, payload: &DispatchPayload) -> Result<AgentResponse, AgentError> {
        let parsed = self.parse_request(payload)?;
        let routing = match self.make_routing_decision(&parsed, payload) {
            Ok(decision) => Some(decision),
            Err(err) => {
                tracing::debug!(
                    agent = self.name(),
                    request = %payload.request.request_id,
                    error = %err,
                    "agent declined to route"
                );
                None
            }
        };
        Ok(AgentResponse { parsed, routing })
    }
}
