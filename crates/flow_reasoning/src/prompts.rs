use flow_core::{Preferences, ScheduleEvent};

pub const PARSER_SYSTEM: &str = r#"You read scheduling requests from a student and extract the intent and parameters.

Expected intents:
- plan_schedule: Create a schedule for the user's tasks
- plan_exam: Plan study time around exams
- reschedule: Move existing tasks
- update_preferences: Modify scheduling preferences
- add_goal: Add a new goal or milestone
- general_advice: General productivity advice

Respond with JSON only:
{
    "intent": "<one of the intents above>",
    "parameters": {
        "date_range": "optional date range",
        "subjects": ["subjects if mentioned"],
        "priority": "high|medium|low if specified",
        "duration": "duration if mentioned",
        "specific_times": ["any specific times mentioned"]
    }
}"#;

const COACH_SYSTEM: &str = r#"You are a productivity coach reviewing a student's plan for the day.

Respond with JSON only:
{
    "message": "A short message about the plan",
    "concerns": ["Potential issues to watch out for"],
    "suggestions": ["Constructive suggestions for improvement"]
}"#;

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none)".to_string();
    }
    items
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parser_prompt(context: &[String], query: &str) -> String {
    format!(
        "Context:\n{}\n\nRequest: {}",
        bullet_list(context),
        query
    )
}

pub fn coach_system(prefs: &Preferences) -> String {
    format!(
        "{}\n\nPersona: {}. {}",
        COACH_SYSTEM,
        prefs.coach_personality.label(),
        prefs.coach_personality.tone()
    )
}

pub fn coach_prompt(context: &[String], plan: &[ScheduleEvent], prefs: &Preferences) -> String {
    let plan_json = serde_json::to_string_pretty(plan).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Context:\n{}\n\nPlan:\n{}\n\nWork day: {}-{}, {} min focus / {} min break",
        bullet_list(context),
        plan_json,
        prefs.work_day_start,
        prefs.work_day_end,
        prefs.break_ratio.work_minutes,
        prefs.break_ratio.break_minutes
    )
}
