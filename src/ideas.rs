// src/ideas.rs
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_FORMAT: &str = "Post";
pub const DEFAULT_HOOK_TITLE: &str = "Untitled idea";
pub const DEFAULT_EXECUTION_GUIDE: &str = "No execution guide provided.";

/// One generated content suggestion. Every field is non-empty once it leaves
/// the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdeaRecord {
    pub category: String,
    pub suggested_format: String,
    pub hook_title: String,
    pub execution_guide: String,
}
