pub mod feedback;
pub mod json_file;
pub mod local;
pub mod preferences;
pub mod workspace;

pub use feedback::{
    FeedbackStore, Recommendation, RecommendationKind, SchedulingInsights, TimeSlotFeedback,
};
pub use local::{LocalMemory, MemoryEntry};
pub use preferences::{
    FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, PreferenceStore, PREFERENCES_KEY,
};
pub use workspace::{UserWorkspace, WorkspaceStore};
