//! User preferences: the settings every screen reads.
//!
//! Preferences are a plain value record. They round-trip through JSON
//! unchanged, and any field missing from an older blob falls back to its
//! default.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};

pub const WORK_MINUTES_RANGE: std::ops::RangeInclusive<u32> = 5..=120;
pub const BREAK_MINUTES_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoachPersonality {
    #[default]
    Friendly,
    Professional,
    Minimal,
}

impl CoachPersonality {
    pub fn label(&self) -> &'static str {
        match self {
            CoachPersonality::Friendly => "Friendly Mentor",
            CoachPersonality::Professional => "Professional Planner",
            CoachPersonality::Minimal => "Minimalist Coach",
        }
    }

    /// Tone instruction handed to the coach prompt.
    pub fn tone(&self) -> &'static str {
        match self {
            CoachPersonality::Friendly => {
                "Be warm and encouraging, like a supportive mentor. Celebrate progress."
            }
            CoachPersonality::Professional => {
                "Be concise and structured, like a professional planner. Focus on priorities."
            }
            CoachPersonality::Minimal => "Use as few words as possible. No small talk.",
        }
    }
}

impl std::str::FromStr for CoachPersonality {
    type Err = FlowError;

    fn from_str(s: &str) -> FlowResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "friendly" => Ok(Self::Friendly),
            "professional" => Ok(Self::Professional),
            "minimal" => Ok(Self::Minimal),
            other => Err(FlowError::validation(format!(
                "unknown coach personality '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyTracking {
    Manual,
    #[default]
    Auto,
}

impl std::str::FromStr for EnergyTracking {
    type Err = FlowError;

    fn from_str(s: &str) -> FlowResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "auto" => Ok(Self::Auto),
            other => Err(FlowError::validation(format!(
                "unknown energy tracking mode '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakRatio {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for BreakRatio {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub break_ratio: BreakRatio,
    pub coach_personality: CoachPersonality,
    pub auto_scheduling: bool,
    pub energy_tracking: EnergyTracking,
    /// Preferred start time for study blocks, "HH:MM".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_study_time: Option<String>,
    pub work_day_start: String,
    pub work_day_end: String,
    /// Minimum gap (minutes) between two events before a break is inserted.
    pub min_work_block: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            break_ratio: BreakRatio::default(),
            coach_personality: CoachPersonality::default(),
            auto_scheduling: true,
            energy_tracking: EnergyTracking::default(),
            preferred_study_time: None,
            work_day_start: "09:00".to_string(),
            work_day_end: "17:00".to_string(),
            min_work_block: 45,
        }
    }
}

impl Preferences {
    pub fn validate(&self) -> FlowResult<()> {
        let BreakRatio {
            work_minutes,
            break_minutes,
        } = self.break_ratio;
        if !WORK_MINUTES_RANGE.contains(&work_minutes) {
            return Err(FlowError::validation(format!(
                "work minutes must be between {} and {}, got {}",
                WORK_MINUTES_RANGE.start(),
                WORK_MINUTES_RANGE.end(),
                work_minutes
            )));
        }
        if !BREAK_MINUTES_RANGE.contains(&break_minutes) {
            return Err(FlowError::validation(format!(
                "break minutes must be between {} and {}, got {}",
                BREAK_MINUTES_RANGE.start(),
                BREAK_MINUTES_RANGE.end(),
                break_minutes
            )));
        }
        let (start, end) = self.work_day()?;
        if start >= end {
            return Err(FlowError::validation(format!(
                "work day start {} must be before end {}",
                self.work_day_start, self.work_day_end
            )));
        }
        if let Some(t) = &self.preferred_study_time {
            parse_hhmm(t)?;
        }
        Ok(())
    }

    pub fn work_day(&self) -> FlowResult<(NaiveTime, NaiveTime)> {
        Ok((
            parse_hhmm(&self.work_day_start)?,
            parse_hhmm(&self.work_day_end)?,
        ))
    }

    /// Preferred hour for a task category, if one is configured.
    ///
    /// Only the "study" category has a dedicated setting today.
    pub fn preferred_hour_for(&self, category: &str) -> Option<u32> {
        use chrono::Timelike;
        match category {
            "study" => self
                .preferred_study_time
                .as_deref()
                .and_then(|t| parse_hhmm(t).ok())
                .map(|t| t.hour()),
            _ => None,
        }
    }

    /// Merge a partial update, the way the settings form patches preferences.
    pub fn apply(&mut self, patch: PreferencesPatch) {
        if let Some(v) = patch.work_minutes {
            self.break_ratio.work_minutes = v;
        }
        if let Some(v) = patch.break_minutes {
            self.break_ratio.break_minutes = v;
        }
        if let Some(v) = patch.coach_personality {
            self.coach_personality = v;
        }
        if let Some(v) = patch.auto_scheduling {
            self.auto_scheduling = v;
        }
        if let Some(v) = patch.energy_tracking {
            self.energy_tracking = v;
        }
        if let Some(v) = patch.preferred_study_time {
            self.preferred_study_time = Some(v);
        }
    }
}

/// Partial preference update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    pub work_minutes: Option<u32>,
    pub break_minutes: Option<u32>,
    pub coach_personality: Option<CoachPersonality>,
    pub auto_scheduling: Option<bool>,
    pub energy_tracking: Option<EnergyTracking>,
    pub preferred_study_time: Option<String>,
}

pub fn parse_hhmm(s: &str) -> FlowResult<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| FlowError::validation(format!("invalid time '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let prefs = Preferences::default();
        assert_eq!(prefs.break_ratio.work_minutes, 25);
        assert_eq!(prefs.break_ratio.break_minutes, 5);
        assert!(prefs.auto_scheduling);
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn test_json_shape_is_camel_case() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["breakRatio"]["workMinutes"], 25);
        assert_eq!(json["coachPersonality"], "friendly");
        assert_eq!(json["energyTracking"], "auto");
        assert!(json.get("preferredStudyTime").is_none());
    }

    #[test]
    fn test_partial_blob_fills_defaults() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"coachPersonality":"minimal"}"#).unwrap();
        assert_eq!(prefs.coach_personality, CoachPersonality::Minimal);
        assert_eq!(prefs.break_ratio, BreakRatio::default());
        assert_eq!(prefs.work_day_start, "09:00");
    }

    #[test]
    fn test_validate_bounds() {
        let mut prefs = Preferences::default();
        prefs.break_ratio.work_minutes = 4;
        assert!(prefs.validate().is_err());
        prefs.break_ratio.work_minutes = 120;
        assert!(prefs.validate().is_ok());
        prefs.break_ratio.break_minutes = 31;
        assert!(prefs.validate().is_err());
        prefs.break_ratio.break_minutes = 1;
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn test_validate_work_day_order() {
        let prefs = Preferences {
            work_day_start: "18:00".into(),
            work_day_end: "08:00".into(),
            ..Preferences::default()
        };
        assert!(prefs.validate().is_err());
    }

    #[test]
    fn test_preferred_hour_for_study() {
        let prefs = Preferences {
            preferred_study_time: Some("14:30".into()),
            ..Preferences::default()
        };
        assert_eq!(prefs.preferred_hour_for("study"), Some(14));
        assert_eq!(prefs.preferred_hour_for("work"), None);
    }

    #[test]
    fn test_apply_patch() {
        let mut prefs = Preferences::default();
        prefs.apply(PreferencesPatch {
            work_minutes: Some(50),
            coach_personality: Some(CoachPersonality::Professional),
            ..Default::default()
        });
        assert_eq!(prefs.break_ratio.work_minutes, 50);
        assert_eq!(prefs.break_ratio.break_minutes, 5);
        assert_eq!(prefs.coach_personality, CoachPersonality::Professional);
    }

    #[test]
    fn test_personality_from_str() {
        assert_eq!(
            "Professional".parse::<CoachPersonality>().unwrap(),
            CoachPersonality::Professional
        );
        assert!("grumpy".parse::<CoachPersonality>().is_err());
    }
}
