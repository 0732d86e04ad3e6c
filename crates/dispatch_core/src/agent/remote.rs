//! Agent served over HTTP: one POST per request, payload in, response out.

use std::time::Duration;

use reqwest::blocking::Client;

use super::algorithm::DispatchAgent;
use super::types::{AgentResponse, DispatchPayload, ParsedRequest, RoutingDecision};
use crate::error::AgentError;

pub fn default_timeout_secs() -> u64 {
    30
}

pub struct RemoteAgent {
    client: Client,
    endpoint: String,
    name: String,
    use_ground_truth: bool,
}

impl RemoteAgent {
    pub fn new(endpoint: &str, timeout: Duration, use_ground_truth: bool) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AgentError::Setup(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            name: format!("remote:{endpoint}"),
            use_ground_truth,
        })
    }
}

impl DispatchAgent for RemoteAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn wants_ground_truth(&self) -> bool {
        self.use_ground_truth
    }

    fn parse_request(&mut self, payload: &DispatchPayload) -> Result<ParsedRequest, AgentError> {
        self.dispatch(payload).map(|response| response.parsed)
    }

    fn make_routing_decision(
        &mut self,
        _parsed: &ParsedRequest,
        payload: &DispatchPayload,
    ) -> Result<RoutingDecision, AgentError> {
        self.dispatch(payload)?
            .routing
            .ok_or_else(|| AgentError::NoVehicle {
                request_id: payload.request.request_id.clone(),
            })
    }

    fn dispatch(&mut self, payload: &DispatchPayload) -> Result<AgentResponse, AgentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|err| AgentError::Transport(err.to_string()))?;
        response
            .json::<AgentResponse>()
            .map_err(|err| AgentError::Malformed(err.to_string()))
    }
}
