use async_trait::async_trait;
use flow_core::{FlowResult, ScheduleEvent};
use serde::{Deserialize, Serialize};

use super::{Agent, PlanState};

/// Two events claiming the same time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub event: String,
    pub conflicts_with: String,
    pub overlap_minutes: i64,
}

fn overlap_minutes(a: &ScheduleEvent, b: &ScheduleEvent) -> i64 {
    (a.end.min(b.end) - a.start.max(b.start)).num_minutes()
}

/// Overlaps of generated events with fixed events and with each other.
pub fn find_conflicts(schedule: &[ScheduleEvent], fixed: &[ScheduleEvent]) -> Vec<Conflict> {
    let mut out = Vec::new();
    for (i, event) in schedule.iter().enumerate() {
        let others = fixed.iter().chain(schedule[i + 1..].iter());
        for other in others.filter(|o| event.overlaps(o)) {
            out.push(Conflict {
                event: event.title.clone(),
                conflicts_with: other.title.clone(),
                overlap_minutes: overlap_minutes(event, other),
            });
        }
    }
    out
}

pub struct ConflictResolverAgent;

#[async_trait]
impl Agent for ConflictResolverAgent {
    fn name(&self) -> &'static str {
        "conflict_resolver"
    }

    async fn run(&self, state: &mut PlanState) -> FlowResult<()> {
        state.conflicts = find_conflicts(&state.schedule, &state.fixed_events);
        if !state.conflicts.is_empty() {
            tracing::warn!("Plan has {} conflicts", state.conflicts.len());
        }
        Ok(())
    }
}
