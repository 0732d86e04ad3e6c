pub mod algorithm;
pub mod types;
pub mod text_parser;
pub mod nearest;
pub mod random;
pub mod regex_agent;
#[cfg(feature = "remote")]
pub mod remote;

use serde::{Deserialize, Serialize};

pub use algorithm::DispatchAgent;
pub use nearest::{nearest_vehicle, NearestVehicleAgent};
pub use random::RandomAgent;
pub use regex_agent::RegexAgent;
#[cfg(feature = "remote")]
pub use remote::RemoteAgent;
pub use text_parser::TextParser;
pub use types::{
    AgentRequest, AgentResponse, DispatchPayload, FleetVehicle, ParsedRequest, RoutingDecision,
};

use crate::error::AgentError;
use crate::requests::ZoneTable;

fn default_true() -> bool {
    true
}

/// Which agent to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentKind {
    /// Nearest compatible idle vehicle.
    Nearest {
        #[serde(default = "default_true")]
        use_ground_truth: bool,
    },
    /// Uniformly random compatible idle vehicle.
    Random {
        #[serde(default)]
        use_ground_truth: bool,
    },
    /// Text-only parse, nearest vehicle.
    Regex,
    #[cfg(feature = "remote")]
    Remote {
        endpoint: String,
        #[serde(default = "remote::default_timeout_secs")]
        timeout_secs: u64,
        #[serde(default)]
        use_ground_truth: bool,
    },
}

impl Default for AgentKind {
    fn default() -> Self {
        AgentKind::Nearest {
            use_ground_truth: true,
        }
    }
}

/// Builds the agent described by `kind`. `seed` drives any randomness the agent has.
pub fn build_agent(
    kind: &AgentKind,
    zones: &ZoneTable,
    seed: u64,
) -> Result<Box<dyn DispatchAgent>, AgentError> {
    let parser = || TextParser::new(zones).map_err(|err| AgentError::Setup(err.to_string()));
    let agent: Box<dyn DispatchAgent> = match kind {
        AgentKind::Nearest { use_ground_truth } => {
            Box::new(NearestVehicleAgent::new(Some(parser()?), *use_ground_truth))
        }
        AgentKind::Random { use_ground_truth } => {
            Box::new(RandomAgent::new(seed, Some(parser()?), *use_ground_truth))
        }
        AgentKind::Regex => Box::new(RegexAgent::new(parser()?)),
        #[cfg(feature = "remote")]
        AgentKind::Remote {
            endpoint,
            timeout_secs,
            use_ground_truth,
        } => Box::new(RemoteAgent::new(
            endpoint,
            std::time::Duration::from_secs(*timeout_secs),
            *use_ground_truth,
        )?),
    };
    tracing::debug!(agent = agent.name(), "built dispatch agent");
    Ok(agent)
}
