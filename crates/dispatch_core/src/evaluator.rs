//! Scores a run: parsing accuracy against ground truth and routing efficiency from the
//! completed trips.
//!
//! Parsing is scored over every request, assigned or not. Routing cost only counts trips
//! that were actually driven, so rejected decisions never add miles or revenue.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::agent::ParsedRequest;
use crate::requests::{GroundTruth, Request};
use crate::telemetry::{AssignmentRecord, TripOutcome, UnassignedReason};

/// Parsed pickup times within this many minutes of the truth count as correct.
pub const TIME_TOLERANCE_MINUTES: u32 = 5;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub parsing: f64,
    pub assignment: f64,
    /// Applied to `1 - deadhead_ratio`.
    pub efficiency: f64,
    /// Applied to `min(revenue_per_mile / revenue_per_mile_target, 1)`.
    pub revenue: f64,
    pub revenue_per_mile_target: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            parsing: 0.4,
            assignment: 0.2,
            efficiency: 0.2,
            revenue: 0.2,
            revenue_per_mile_target: 4.0,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.parsing + self.assignment + self.efficiency + self.revenue
    }
}

/// Which fields of one parse matched the ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldMatches {
    pub origin_zone: bool,
    pub destination_zone: bool,
    pub passenger_count: bool,
    pub wheelchair: bool,
    pub time_constraint: bool,
}

impl FieldMatches {
    pub fn compare(parsed: &ParsedRequest, truth: &GroundTruth) -> Self {
        Self {
            origin_zone: parsed.pickup_zone_id.is_some()
                && parsed.pickup_zone_id == truth.pickup_zone_id,
            destination_zone: parsed.dropoff_zone_id.is_some()
                && parsed.dropoff_zone_id == truth.dropoff_zone_id,
            passenger_count: parsed.passenger_count == Some(truth.passenger_count),
            wheelchair: parsed.wheelchair_accessible == truth.wheelchair_accessible,
            time_constraint: parsed
                .pickup_time
                .as_deref()
                .is_some_and(|t| times_match(t, &truth.pickup_time)),
        }
    }
}

fn minutes_of_day(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.trim().split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h < 24 && m < 60).then_some(h * 60 + m)
}

/// Within [`TIME_TOLERANCE_MINUTES`], wrapping around midnight.
pub fn times_match(parsed: &str, truth: &str) -> bool {
    let (Some(a), Some(b)) = (minutes_of_day(parsed), minutes_of_day(truth)) else {
        return false;
    };
    let diff = a.abs_diff(b);
    diff.min(MINUTES_PER_DAY - diff) <= TIME_TOLERANCE_MINUTES
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsingMetrics {
    pub total_requests: usize,
    pub parsed_requests: usize,
    pub origin_zone_accuracy: f64,
    pub destination_zone_accuracy: f64,
    /// Mean of origin and destination accuracy.
    pub zone_accuracy: f64,
    pub passenger_count_accuracy: f64,
    pub wheelchair_accuracy: f64,
    pub time_constraint_accuracy: f64,
    /// Mean of the five field accuracies.
    pub overall_accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutingMetrics {
    pub total_requests: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub completed_trips: usize,
    pub assignment_rate: f64,
    pub unassigned_reasons: BTreeMap<UnassignedReason, usize>,
    pub total_miles: f64,
    pub deadhead_miles: f64,
    pub loaded_miles: f64,
    pub total_revenue: f64,
    pub deadhead_ratio: f64,
    pub revenue_per_mile: f64,
    pub net_revenue: f64,
    pub mean_pickup_wait_secs: f64,
    /// Agent's pickup-distance estimate against the simulated deadhead. `None` with no
    /// completed trip carrying an estimate.
    pub pickup_estimate_mae_miles: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub agent: String,
    pub parsing: ParsingMetrics,
    pub routing: RoutingMetrics,
    pub weights: ScoreWeights,
    pub overall_score: f64,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluator {
    pub weights: ScoreWeights,
    pub idle_cost_per_mile: f64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            idle_cost_per_mile: 0.60,
        }
    }
}

impl Evaluator {
    pub fn new(weights: ScoreWeights, idle_cost_per_mile: f64) -> Self {
        Self {
            weights,
            idle_cost_per_mile,
        }
    }

    /// Requests without an assignment record, or whose agent failed before parsing,
    /// count as wrong on every field.
    pub fn parsing_metrics(
        &self,
        requests: &[Request],
        assignments: &[AssignmentRecord],
    ) -> ParsingMetrics {
        let by_id: HashMap<&str, &AssignmentRecord> = assignments
            .iter()
            .map(|a| (a.request_id.as_str(), a))
            .collect();

        let mut parsed_requests = 0;
        let mut hits = [0usize; 5];
        for request in requests {
            let Some(parsed) = by_id
                .get(request.id.as_str())
                .and_then(|record| record.parsed.as_ref())
            else {
                continue;
            };
            parsed_requests += 1;
            let m = FieldMatches::compare(parsed, &request.ground_truth);
            for (slot, hit) in hits.iter_mut().zip([
                m.origin_zone,
                m.destination_zone,
                m.passenger_count,
                m.wheelchair,
                m.time_constraint,
            ]) {
                *slot += usize::from(hit);
            }
        }

        let total = requests.len();
        let [origin, destination, passengers, wheelchair, time] = hits.map(|h| ratio(h, total));
        ParsingMetrics {
            total_requests: total,
            parsed_requests,
            origin_zone_accuracy: origin,
            destination_zone_accuracy: destination,
            zone_accuracy: (origin + destination) / 2.0,
            passenger_count_accuracy: passengers,
            wheelchair_accuracy: wheelchair,
            time_constraint_accuracy: time,
            overall_accuracy: (origin + destination + passengers + wheelchair + time) / 5.0,
        }
    }

    pub fn routing_metrics(
        &self,
        total_requests: usize,
        assignments: &[AssignmentRecord],
        outcomes: &[TripOutcome],
    ) -> RoutingMetrics {
        let mut unassigned_reasons: BTreeMap<UnassignedReason, usize> = BTreeMap::new();
        let mut assigned = 0;
        for record in assignments {
            match record.outcome {
                crate::telemetry::AssignmentOutcome::Assigned { .. } => assigned += 1,
                crate::telemetry::AssignmentOutcome::Unassigned { reason } => {
                    *unassigned_reasons.entry(reason).or_default() += 1;
                }
            }
        }

        let deadhead_miles: f64 = outcomes.iter().map(|o| o.deadhead_miles).sum();
        let loaded_miles: f64 = outcomes.iter().map(|o| o.loaded_miles).sum();
        let total_revenue: f64 = outcomes.iter().map(|o| o.revenue).sum();
        let total_miles = deadhead_miles + loaded_miles;
        let (deadhead_ratio, revenue_per_mile) = if total_miles > 0.0 {
            (deadhead_miles / total_miles, total_revenue / total_miles)
        } else {
            (0.0, 0.0)
        };
        let mean_pickup_wait_secs = if outcomes.is_empty() {
            0.0
        } else {
            outcomes.iter().map(|o| o.wait_ms() as f64 / 1000.0).sum::<f64>() / outcomes.len() as f64
        };

        let estimates: HashMap<&str, f64> = assignments
            .iter()
            .filter_map(|a| Some((a.request_id.as_str(), a.estimated_pickup_distance_miles?)))
            .collect();
        let errors: Vec<f64> = outcomes
            .iter()
            .filter_map(|o| {
                let estimate = estimates.get(o.trip_id.as_str())?;
                Some((estimate - o.deadhead_miles).abs())
            })
            .filter(|e| e.is_finite())
            .collect();
        let pickup_estimate_mae_miles =
            (!errors.is_empty()).then(|| errors.iter().sum::<f64>() / errors.len() as f64);

        RoutingMetrics {
            total_requests,
            assigned,
            unassigned: total_requests.saturating_sub(assigned),
            completed_trips: outcomes.len(),
            assignment_rate: ratio(assigned, total_requests),
            unassigned_reasons,
            total_miles,
            deadhead_miles,
            loaded_miles,
            total_revenue,
            deadhead_ratio,
            revenue_per_mile,
            net_revenue: total_revenue - deadhead_miles * self.idle_cost_per_mile,
            mean_pickup_wait_secs,
            pickup_estimate_mae_miles,
        }
    }

    /// Weighted score normalized to `[0, 1]`. Efficiency earns nothing without completed trips.
    pub fn overall_score(&self, parsing: &ParsingMetrics, routing: &RoutingMetrics) -> f64 {
        let w = &self.weights;
        let total = w.total();
        if total <= 0.0 {
            return 0.0;
        }
        let efficiency = if routing.completed_trips > 0 {
            1.0 - routing.deadhead_ratio
        } else {
            0.0
        };
        let revenue = if w.revenue_per_mile_target > 0.0 {
            (routing.revenue_per_mile / w.revenue_per_mile_target).min(1.0)
        } else {
            0.0
        };
        let score = w.parsing * parsing.overall_accuracy
            + w.assignment * routing.assignment_rate
            + w.efficiency * efficiency
            + w.revenue * revenue;
        (score / total).clamp(0.0, 1.0)
    }

    pub fn evaluate(
        &self,
        agent: &str,
        requests: &[Request],
        assignments: &[AssignmentRecord],
        outcomes: &[TripOutcome],
    ) -> EvaluationSummary {
        let parsing = self.parsing_metrics(requests, assignments);
        let routing = self.routing_metrics(requests.len(), assignments, outcomes);
        let overall_score = self.overall_score(&parsing, &routing);
        tracing::info!(
            agent,
            parsing_accuracy = parsing.overall_accuracy,
            assignment_rate = routing.assignment_rate,
            deadhead_ratio = routing.deadhead_ratio,
            overall_score,
            "evaluation complete"
        );
        EvaluationSummary {
            agent: agent.to_string(),
            parsing,
            routing,
            weights: self.weights,
            overall_score,
        }
    }
}
