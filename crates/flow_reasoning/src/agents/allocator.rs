use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Timelike};
use flow_core::{new_id, FlowResult, Preferences, ScheduleEvent, Task};

use super::constraint::{Slot, MIN_SLOT_MINUTES};
use super::{Agent, PlanState};

/// Extra cost for a slot starting more than this many hours away from the
/// category's preferred time.
const PREFERRED_HOUR_TOLERANCE: i64 = 2;
const PREFERRED_HOUR_PENALTY: f64 = 2.0;

/// Eisenhower order, shortest task first inside each quadrant.
pub fn prioritize(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|t| (t.priority, t.estimated_minutes));
    ordered
}

/// Index of the cheapest slot that fits `task`. Ties keep the earliest
/// candidate in pool order.
pub fn best_slot(task: &Task, pool: &[Slot], prefs: &Preferences) -> Option<usize> {
    let task_hours = f64::from(task.estimated_minutes) / 60.0;
    let preferred_hour = task
        .category
        .as_deref()
        .and_then(|c| prefs.preferred_hour_for(c));

    let mut best: Option<(usize, f64)> = None;
    for (idx, slot) in pool.iter().enumerate() {
        if slot.minutes() < i64::from(task.estimated_minutes) {
            continue;
        }
        let mut score = (slot.hours() - task_hours).abs();
        if let Some(hour) = preferred_hour {
            if (i64::from(slot.start.hour()) - i64::from(hour)).abs() > PREFERRED_HOUR_TOLERANCE {
                score += PREFERRED_HOUR_PENALTY;
            }
        }
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Place tasks into slots. Each task starts at its slot's start; whatever is
/// left of the slot (30 minutes or more) goes back into the pool.
pub fn allocate(tasks: &[Task], slots: &[Slot], prefs: &Preferences) -> Vec<ScheduleEvent> {
    let mut pool = slots.to_vec();
    let mut schedule = Vec::new();

    for task in prioritize(tasks) {
        let Some(idx) = best_slot(task, &pool, prefs) else {
            tracing::debug!("No slot fits '{}' ({} min)", task.title, task.estimated_minutes);
            continue;
        };
        let slot = pool.remove(idx);
        let start = slot.start;
        let end = start + Duration::minutes(i64::from(task.estimated_minutes));

        schedule.push(ScheduleEvent {
            id: new_id(),
            title: task.title.clone(),
            start,
            end,
            category: task.category.clone().unwrap_or_default(),
            priority: Some(task.priority.schedule_priority()),
            is_ai_generated: true,
            task_id: Some(task.id.clone()).filter(|id| !id.is_empty()),
            completed: false,
            location: None,
            slot_weight: None,
        });

        if (slot.end - end).num_minutes() >= MIN_SLOT_MINUTES {
            pool.push(Slot { start: end, end: slot.end });
        }
    }

    schedule.sort_by_key(|e| e.start);
    insert_breaks(schedule, slots, prefs)
}

/// Insert a break right after an event when the gap to the next one is at
/// least `min_work_block` minutes, the break ends before the next event and
/// it lies inside one of the `free` slots.
pub fn insert_breaks(
    schedule: Vec<ScheduleEvent>,
    free: &[Slot],
    prefs: &Preferences,
) -> Vec<ScheduleEvent> {
    let break_len = Duration::minutes(i64::from(prefs.break_ratio.break_minutes));
    let min_gap = i64::from(prefs.min_work_block);

    let mut out = Vec::with_capacity(schedule.len() * 2);
    let mut last_end: Option<NaiveDateTime> = None;
    for event in schedule {
        if let Some(prev_end) = last_end {
            if (event.start - prev_end).num_minutes() >= min_gap {
                let break_end = prev_end + break_len;
                let is_free = free
                    .iter()
                    .any(|s| s.start <= prev_end && break_end <= s.end);
                if break_end < event.start && is_free {
                    let mut pause = ScheduleEvent::fixed("Break", "break", prev_end, break_end);
                    pause.is_ai_generated = true;
                    out.push(pause);
                }
            }
        }
        last_end = Some(event.end);
        out.push(event);
    }
    out
}

pub struct AllocatorAgent;

#[async_trait]
impl Agent for AllocatorAgent {
    fn name(&self) -> &'static str {
        "allocator"
    }

    async fn run(&self, state: &mut PlanState) -> FlowResult<()> {
        if state.tasks.is_empty() || state.available_slots.is_empty() {
            state.schedule = Vec::new();
            return Ok(());
        }
        state.schedule = allocate(&state.tasks, &state.available_slots, &state.preferences);
        tracing::info!(
            "Allocated {} of {} tasks",
            state.planned_tasks().count(),
            state.tasks.len()
        );
        Ok(())
    }
}
