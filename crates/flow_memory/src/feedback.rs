//! Feedback store - learns which hours of the week actually work.
//!
//! Every piece of task feedback lands in a (hour, weekday) bucket. Buckets
//! keep a running completion rate and a running average energy level; the
//! pair becomes a weight the planner attaches to generated events, and the
//! source of the "you never finish anything on Tuesday at 8" warnings.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use flow_core::{FlowResult, ScheduleEvent, TaskFeedback};
use serde::{Deserialize, Serialize};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Buckets need this many samples before they produce recommendations.
pub const MIN_SAMPLES_FOR_ADVICE: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotFeedback {
    pub hour: u32,
    /// 0 = Monday
    pub day_of_week: u32,
    pub completion_rate: f64,
    pub avg_energy: f64,
    pub sample_count: u32,
}

impl TimeSlotFeedback {
    fn new(hour: u32, day_of_week: u32) -> Self {
        Self {
            hour,
            day_of_week,
            completion_rate: 0.0,
            avg_energy: 3.0,
            sample_count: 0,
        }
    }

    fn record(&mut self, completed: bool, energy_level: u8) {
        self.sample_count += 1;
        let n = f64::from(self.sample_count);
        let done = if completed { 1.0 } else { 0.0 };
        self.completion_rate = (self.completion_rate * (n - 1.0) + done) / n;
        self.avg_energy = (self.avg_energy * (n - 1.0) + f64::from(energy_level)) / n;
    }

    /// Undo one earlier `record` with the same values.
    fn forget(&mut self, completed: bool, energy_level: u8) {
        if self.sample_count <= 1 {
            *self = Self::new(self.hour, self.day_of_week);
            return;
        }
        let n = f64::from(self.sample_count);
        let done = if completed { 1.0 } else { 0.0 };
        self.completion_rate = (self.completion_rate * n - done) / (n - 1.0);
        self.avg_energy = (self.avg_energy * n - f64::from(energy_level)) / (n - 1.0);
        self.sample_count -= 1;
    }

    /// Completion counts for 60%, energy for 40%.
    pub fn weight(&self) -> f64 {
        self.completion_rate * 0.6 + (self.avg_energy / 5.0) * 0.4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    TimeSlotWarning,
    EnergyWarning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingInsights {
    pub recommendations: Vec<Recommendation>,
    pub time_slots: BTreeMap<String, TimeSlotFeedback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackStore {
    task_feedback: BTreeMap<String, TaskFeedback>,
    time_slots: BTreeMap<String, TimeSlotFeedback>,
}

fn slot_key(hour: u32, day: u32) -> String {
    format!("{hour}_{day}")
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the aggregates from raw feedback, e.g. after loading from disk.
    pub fn from_feedback(items: impl IntoIterator<Item = TaskFeedback>) -> Self {
        let mut store = Self::new();
        for fb in items {
            // Persisted feedback was validated on the way in.
            store.record(fb);
        }
        store
    }

    pub fn add_task_feedback(&mut self, feedback: TaskFeedback) -> FlowResult<()> {
        feedback.validate()?;
        self.record(feedback);
        Ok(())
    }

    /// Feedback for a task that already has some replaces the earlier
    /// sample instead of counting twice.
    fn record(&mut self, feedback: TaskFeedback) {
        if let Some(old) = self.task_feedback.remove(&feedback.task_id) {
            let key = slot_key(
                old.scheduled_start.hour(),
                old.scheduled_start.weekday().num_days_from_monday(),
            );
            if let Some(slot) = self.time_slots.get_mut(&key) {
                if slot.sample_count <= 1 {
                    self.time_slots.remove(&key);
                } else {
                    slot.forget(old.completed, old.energy_level);
                }
            }
        }

        let hour = feedback.scheduled_start.hour();
        let day = feedback.scheduled_start.weekday().num_days_from_monday();
        self.time_slots
            .entry(slot_key(hour, day))
            .or_insert_with(|| TimeSlotFeedback::new(hour, day))
            .record(feedback.completed, feedback.energy_level);
        self.task_feedback.insert(feedback.task_id.clone(), feedback);
    }

    pub fn task_feedback(&self) -> impl Iterator<Item = &TaskFeedback> {
        self.task_feedback.values()
    }

    pub fn time_slots(&self) -> &BTreeMap<String, TimeSlotFeedback> {
        &self.time_slots
    }

    /// Unknown slots are neutral (1.0).
    pub fn slot_weight(&self, hour: u32, day: u32) -> f64 {
        self.time_slots
            .get(&slot_key(hour, day))
            .map(TimeSlotFeedback::weight)
            .unwrap_or(1.0)
    }

    /// Attach a `slot_weight` to every event.
    pub fn weigh_schedule(&self, schedule: &mut [ScheduleEvent]) {
        for event in schedule.iter_mut() {
            let (hour, day) = event.slot_key();
            event.slot_weight = Some(self.slot_weight(hour, day));
        }
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        let mut out = Vec::new();
        for slot in self.time_slots.values() {
            if slot.sample_count < MIN_SAMPLES_FOR_ADVICE {
                continue;
            }
            if slot.completion_rate < 0.5 {
                let day = WEEKDAYS
                    .get(slot.day_of_week as usize)
                    .copied()
                    .unwrap_or("?");
                out.push(Recommendation {
                    kind: RecommendationKind::TimeSlotWarning,
                    message: format!(
                        "Low completion rate ({:.0}%) for {:02}:00 on {}",
                        slot.completion_rate * 100.0,
                        slot.hour,
                        day
                    ),
                    suggestion: "Consider rescheduling important tasks away from this time slot"
                        .to_string(),
                });
            }
            if slot.avg_energy < 2.5 {
                out.push(Recommendation {
                    kind: RecommendationKind::EnergyWarning,
                    message: format!(
                        "Consistently low energy ({:.1}/5) at {:02}:00",
                        slot.avg_energy, slot.hour
                    ),
                    suggestion: "Schedule lighter tasks during this time".to_string(),
                });
            }
        }
        out
    }

    pub fn insights(&self) -> SchedulingInsights {
        SchedulingInsights {
            recommendations: self.recommendations(),
            time_slots: self.time_slots.clone(),
        }
    }
}
