//! JSON-backed memory with per-user feedback tracking.
//!
//! Two files sit side by side: `memory.json` holds `{memories: [...]}` and
//! `memory_feedback.json` holds raw task feedback keyed by user and task.
//! Aggregates are rebuilt from the raw feedback on load.

use anyhow::Result;
use async_trait::async_trait;
use flow_core::{Memory, ScheduleEvent, TaskFeedback};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::feedback::{FeedbackStore, SchedulingInsights};
use crate::json_file;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub user_id: String,
    pub item: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryFile {
    #[serde(default)]
    memories: Vec<MemoryEntry>,
}

type FeedbackFile = BTreeMap<String, BTreeMap<String, TaskFeedback>>;

pub struct LocalMemory {
    path: PathBuf,
    feedback_path: PathBuf,
    store: RwLock<MemoryFile>,
    feedback: RwLock<HashMap<String, FeedbackStore>>,
}

/// `memory.json` -> `memory_feedback.json`
pub fn feedback_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "memory".to_string());
    path.with_file_name(format!("{stem}_feedback.json"))
}

impl LocalMemory {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let feedback_path = feedback_path_for(&path);
        Self::open_with_feedback(path, feedback_path).await
    }

    pub async fn open_with_feedback(path: PathBuf, feedback_path: PathBuf) -> Self {
        let store: MemoryFile = json_file::read_or_default(&path).await;
        let raw: FeedbackFile = json_file::read_or_default(&feedback_path).await;
        let feedback = raw
            .into_iter()
            .map(|(user, items)| (user, FeedbackStore::from_feedback(items.into_values())))
            .collect::<HashMap<_, _>>();
        tracing::debug!(
            "Loaded {} memories and feedback for {} users from {}",
            store.memories.len(),
            feedback.len(),
            path.display()
        );
        Self {
            path,
            feedback_path,
            store: RwLock::new(store),
            feedback: RwLock::new(feedback),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.memories.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn add_feedback(&self, user_id: &str, feedback: TaskFeedback) -> Result<()> {
        let mut stores = self.feedback.write().await;
        let mut user_store = stores.get(user_id).cloned().unwrap_or_default();
        user_store.add_task_feedback(feedback)?;

        let mut next = stores.clone();
        next.insert(user_id.to_string(), user_store);
        let raw: FeedbackFile = next
            .iter()
            .map(|(user, store)| {
                let items = store
                    .task_feedback()
                    .map(|fb| (fb.task_id.clone(), fb.clone()))
                    .collect();
                (user.clone(), items)
            })
            .collect();
        json_file::write_atomic(&self.feedback_path, &raw).await?;
        *stores = next;
        Ok(())
    }

    pub async fn scheduling_insights(&self, user_id: &str) -> SchedulingInsights {
        self.feedback
            .read()
            .await
            .get(user_id)
            .map(FeedbackStore::insights)
            .unwrap_or_default()
    }

    /// Attach learned slot weights. Users without feedback are left as-is.
    pub async fn adjust_schedule_weights(&self, user_id: &str, schedule: &mut [ScheduleEvent]) {
        if let Some(store) = self.feedback.read().await.get(user_id) {
            store.weigh_schedule(schedule);
        }
    }
}

/// Number of query tokens that occur in the item's JSON text.
fn relevance(tokens: &HashSet<String>, item: &Value) -> usize {
    let text = match item {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    };
    tokens.iter().filter(|t| text.contains(t.as_str())).count()
}

fn most_recent(candidates: &[&MemoryEntry], limit: usize) -> Vec<Value> {
    let skip = candidates.len().saturating_sub(limit);
    candidates[skip..].iter().map(|e| e.item.clone()).collect()
}

#[async_trait]
impl Memory for LocalMemory {
    async fn persist(&self, user_id: &str, item: Value, tags: Vec<String>) -> Result<()> {
        let mut store = self.store.write().await;
        store.memories.push(MemoryEntry {
            user_id: user_id.to_string(),
            item,
            tags,
        });
        if let Err(e) = json_file::write_atomic(&self.path, &*store).await {
            store.memories.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn retrieve(&self, user_id: &str, query: &str, limit: usize) -> Result<Vec<Value>> {
        let store = self.store.read().await;
        let candidates: Vec<&MemoryEntry> = store
            .memories
            .iter()
            .filter(|m| m.user_id == user_id)
            .collect();

        let tokens: HashSet<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if tokens.is_empty() {
            return Ok(most_recent(&candidates, limit));
        }

        let mut scored: Vec<(usize, &MemoryEntry)> = candidates
            .iter()
            .map(|c| (relevance(&tokens, &c.item), *c))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if scored.is_empty() {
            return Ok(most_recent(&candidates, limit));
        }
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, e)| e.item.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feedback_path_for() {
        assert_eq!(
            feedback_path_for(Path::new("sample_data/memory.json")),
            PathBuf::from("sample_data/memory_feedback.json")
        );
    }

    #[tokio::test]
    async fn test_relevance_scoring() {
        let dir = tempfile::TempDir::new().unwrap();
        let mem = LocalMemory::open(dir.path().join("memory.json")).await;
        mem.persist("u", json!({"type": "task", "title": "math homework"}), vec![])
            .await
            .unwrap();
        mem.persist("u", json!({"type": "goal", "title": "run a marathon"}), vec![])
            .await
            .unwrap();
        mem.persist("u", json!({"type": "task", "title": "math exam review"}), vec![])
            .await
            .unwrap();
        mem.persist("other", json!({"title": "math"}), vec![]).await.unwrap();

        let hits = mem.retrieve("u", "Math exam", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["title"], "math exam review");
        assert_eq!(hits[1]["title"], "math homework");
    }

    #[tokio::test]
    async fn test_no_match_falls_back_to_recent() {
        let dir = tempfile::TempDir::new().unwrap();
        let mem = LocalMemory::open(dir.path().join("memory.json")).await;
        for i in 0..7 {
            mem.persist("u", json!(format!("note {i}")), vec![]).await.unwrap();
        }
        let hits = mem.retrieve("u", "zebra", 3).await.unwrap();
        assert_eq!(hits, vec![json!("note 4"), json!("note 5"), json!("note 6")]);

        let recent = mem.retrieve("u", "", 2).await.unwrap();
        assert_eq!(recent, vec![json!("note 5"), json!("note 6")]);
    }

    #[tokio::test]
    async fn test_unknown_user_has_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let mem = LocalMemory::open(dir.path().join("memory.json")).await;
        assert!(mem.retrieve("ghost", "", 5).await.unwrap().is_empty());
        assert!(mem.scheduling_insights("ghost").await.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_is_not_remembered() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let mem = LocalMemory::open(blocker.join("memory.json")).await;

        assert!(mem.persist("u", json!("note"), vec![]).await.is_err());
        assert!(mem.retrieve("u", "", 5).await.unwrap().is_empty());
        assert!(mem.is_empty().await);

        let fb = TaskFeedback {
            task_id: "t1".into(),
            scheduled_start: chrono::NaiveDate::from_ymd_opt(2025, 10, 20)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            scheduled_end: chrono::NaiveDate::from_ymd_opt(2025, 10, 20)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            actual_start: None,
            actual_end: None,
            completed: true,
            energy_level: 4,
            difficulty: 3,
            satisfaction: 3,
            notes: None,
        };
        assert!(mem.add_feedback("u", fb).await.is_err());
        assert!(mem.scheduling_insights("u").await.time_slots.is_empty());
    }
}
