//! Property-based tests for slot finding and allocation.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use flow_core::{Preferences, Quadrant, ScheduleEvent, Task};
use flow_reasoning::agents::allocator::{allocate, prioritize};
use flow_reasoning::agents::constraint::{available_slots, MIN_SLOT_MINUTES};
use flow_reasoning::agents::conflict::find_conflicts;
use proptest::prelude::*;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 20)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn quadrant() -> impl Strategy<Value = Quadrant> {
    prop::sample::select(Quadrant::ALL.to_vec())
}

/// Fixed events over three days, starting between 06:00 and 21:00.
fn fixed_events() -> impl Strategy<Value = Vec<ScheduleEvent>> {
    prop::collection::vec((0i64..3, 360i64..1260, 15i64..180), 0..8).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(day, start_min, len)| {
                let start = base() + Duration::days(day) + Duration::minutes(start_min);
                ScheduleEvent::fixed("fixed", "class", start, start + Duration::minutes(len))
            })
            .collect()
    })
}

fn tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((15u32..240, quadrant()), 0..10).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (minutes, q))| Task::new(format!("task {i}"), minutes, q))
            .collect()
    })
}

fn work_day() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
    )
}

proptest! {
    #[test]
    fn slots_are_long_enough_and_inside_work_day(events in fixed_events()) {
        let (ws, we) = work_day();
        for slot in available_slots(&events, ws, we) {
            prop_assert!(slot.minutes() >= MIN_SLOT_MINUTES);
            prop_assert!(slot.start.time() >= ws);
            prop_assert!(slot.end.time() <= we);
            prop_assert_eq!(slot.start.date(), slot.end.date());
            for e in &events {
                prop_assert!(!(slot.start < e.end && slot.end > e.start));
            }
        }
    }

    #[test]
    fn allocation_never_overlaps_and_stays_in_slots(events in fixed_events(), tasks in tasks()) {
        let (ws, we) = work_day();
        let slots = available_slots(&events, ws, we);
        let schedule = allocate(&tasks, &slots, &Preferences::default());

        prop_assert!(find_conflicts(&schedule, &events).is_empty());
        for event in schedule.iter().filter(|e| !e.is_break()) {
            prop_assert!(slots.iter().any(|s| s.start <= event.start && event.end <= s.end));
        }
        prop_assert!(schedule.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn prioritize_orders_by_quadrant(tasks in tasks()) {
        let ordered = prioritize(&tasks);
        prop_assert_eq!(ordered.len(), tasks.len());
        for pair in ordered.windows(2) {
            prop_assert!(pair[0].priority <= pair[1].priority);
            if pair[0].priority == pair[1].priority {
                prop_assert!(pair[0].estimated_minutes <= pair[1].estimated_minutes);
            }
        }
    }
}
