//! Canned records used when no backend is configured and to seed new users.

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{ChatMessage, ChatRole, Class, Goal, Quadrant, ScheduleEvent, SchedulePriority, Task};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, 0))
        .unwrap_or_default()
}

pub fn schedule() -> Vec<ScheduleEvent> {
    let mut lecture = ScheduleEvent::fixed(
        "Math Lecture",
        "class",
        at(2025, 10, 18, 9, 0),
        at(2025, 10, 18, 10, 30),
    );
    lecture.id = "1".into();
    lecture.priority = Some(SchedulePriority::High);

    let mut study = ScheduleEvent::fixed(
        "Study Session",
        "study",
        at(2025, 10, 18, 14, 0),
        at(2025, 10, 18, 15, 30),
    );
    study.id = "2".into();
    study.priority = Some(SchedulePriority::Medium);

    vec![lecture, study]
}

pub fn tasks() -> Vec<Task> {
    let mut homework = Task::new("Complete Math Homework", 90, Quadrant::UrgentImportant)
        .with_category("study");
    homework.id = "1".into();
    homework.description = Some("Problems 1-20 from chapter 5".into());
    homework.class_id = Some("math101".into());

    let mut reading = Task::new("Read History Chapter", 60, Quadrant::NotUrgentImportant)
        .with_category("study");
    reading.id = "2".into();
    reading.description = Some("Chapter 12: World War II".into());
    reading.class_id = Some("hist201".into());

    vec![homework, reading]
}

pub fn goals() -> Vec<Goal> {
    let mut goal = Goal::new("Ace Final Exams");
    goal.id = "1".into();
    goal.description = Some("Get A in all subjects".into());
    goal.deadline = NaiveDate::from_ymd_opt(2025, 12, 15);
    goal.progress = 30;
    vec![goal]
}

pub fn classes() -> Vec<Class> {
    vec![
        Class {
            id: "math101".into(),
            title: "Calculus I".into(),
            instructor: Some("Dr. Smith".into()),
            notes: None,
            syllabus: Some("Limits, derivatives, and integrals".into()),
        },
        Class {
            id: "hist201".into(),
            title: "World History".into(),
            instructor: Some("Prof. Johnson".into()),
            notes: None,
            syllabus: Some("From ancient civilizations to modern times".into()),
        },
    ]
}

pub fn greeting() -> ChatMessage {
    let mut msg = ChatMessage::new(
        ChatRole::Assistant,
        "Hello! I'm your AI coach. How can I help you today?",
    );
    msg.id = "1".into();
    msg
}
