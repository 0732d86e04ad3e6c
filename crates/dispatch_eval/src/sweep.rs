//! Evaluation grids: every agent against every seed, on one base configuration.

use dispatch_core::agent::AgentKind;
use dispatch_core::scenario::HarnessConfig;

/// One run of a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    pub run_id: usize,
    /// `<agent>-seed<seed>`, used for file names and tables.
    pub label: String,
    pub config: HarnessConfig,
}

impl RunSpec {
    pub fn single(config: HarnessConfig) -> Self {
        Self {
            run_id: 0,
            label: label_for(&config.agent, config.seed),
            config,
        }
    }
}

pub fn agent_label(kind: &AgentKind) -> &'static str {
    match kind {
        AgentKind::Nearest { .. } => "nearest",
        AgentKind::Random { .. } => "random",
        AgentKind::Regex => "regex",
        #[cfg(feature = "remote")]
        AgentKind::Remote { .. } => "remote",
    }
}

fn label_for(kind: &AgentKind, seed: u64) -> String {
    format!("{}-seed{}", agent_label(kind), seed)
}

/// Cartesian product of agents and seeds. An empty axis falls back to the base value.
#[derive(Debug, Clone, Default)]
pub struct EvaluationGrid {
    base: HarnessConfig,
    agents: Vec<AgentKind>,
    seeds: Vec<u64>,
}

impl EvaluationGrid {
    pub fn new(base: HarnessConfig) -> Self {
        Self {
            base,
            agents: Vec::new(),
            seeds: Vec::new(),
        }
    }

    pub fn agents(mut self, agents: Vec<AgentKind>) -> Self {
        self.agents = agents;
        self
    }

    pub fn seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Agent-major order: all seeds of the first agent, then the next agent.
    pub fn generate(&self) -> Vec<RunSpec> {
        let agents = if self.agents.is_empty() {
            vec![self.base.agent.clone()]
        } else {
            self.agents.clone()
        };
        let seeds = if self.seeds.is_empty() {
            vec![self.base.seed]
        } else {
            self.seeds.clone()
        };

        agents
            .iter()
            .flat_map(|agent| seeds.iter().map(move |&seed| (agent, seed)))
            .enumerate()
            .map(|(run_id, (agent, seed))| RunSpec {
                run_id,
                label: label_for(agent, seed),
                config: self.base.clone().with_agent(agent.clone()).with_seed(seed),
            })
            .collect()
    }
}
