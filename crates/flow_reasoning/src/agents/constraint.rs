use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use flow_core::{FlowResult, ScheduleEvent};
use serde::{Deserialize, Serialize};

use super::{Agent, PlanState};

/// Shortest gap worth offering as a slot.
pub const MIN_SLOT_MINUTES: i64 = 30;

/// A free interval inside the working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Slot {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn hours(&self) -> f64 {
        self.minutes() as f64 / 60.0
    }
}

fn push_gap(slots: &mut Vec<Slot>, start: NaiveDateTime, end: NaiveDateTime) {
    if (end - start).num_minutes() >= MIN_SLOT_MINUTES {
        slots.push(Slot { start, end });
    }
}

/// Free gaps between fixed events, day by day from the first event's date
/// to the last one's. Days inside that range without events are free for the
/// whole working day. No events means no slots.
pub fn available_slots(
    fixed_events: &[ScheduleEvent],
    work_start: NaiveTime,
    work_end: NaiveTime,
) -> Vec<Slot> {
    let mut events: Vec<&ScheduleEvent> = fixed_events.iter().collect();
    events.sort_by_key(|e| e.start);
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut date = first.start.date();
    let end_date = last.start.date();
    while date <= end_date {
        let day_start = date.and_time(work_start);
        let day_end = date.and_time(work_end);

        let mut cursor = day_start;
        for event in events.iter().filter(|e| e.start.date() == date) {
            if cursor < event.start {
                push_gap(&mut slots, cursor, event.start.min(day_end));
            }
            cursor = cursor.max(event.end);
        }
        if cursor < day_end {
            push_gap(&mut slots, cursor, day_end);
        }

        date += Duration::days(1);
    }
    slots
}

pub struct ConstraintAgent;

#[async_trait]
impl Agent for ConstraintAgent {
    fn name(&self) -> &'static str {
        "constraint"
    }

    async fn run(&self, state: &mut PlanState) -> FlowResult<()> {
        let (work_start, work_end) = state.preferences.work_day()?;
        state.available_slots = available_slots(&state.fixed_events, work_start, work_end);
        tracing::debug!(
            "Found {} free slots around {} fixed events",
            state.available_slots.len(),
            state.fixed_events.len()
        );
        Ok(())
    }
}
