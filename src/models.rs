use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Overall health classification of a backlink report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Critical,
    Warning,
    Healthy,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Critical => "critical",
            ReportStatus::Warning => "warning",
            ReportStatus::Healthy => "healthy",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawlers send `null` for fields they could not fill; treat it like an
/// absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Crawler output attached to a submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub created_links: Vec<CreatedLink>,
    #[serde(deserialize_with = "null_as_default")]
    pub indexed_blogs: Vec<IndexedBlog>,
    #[serde(deserialize_with = "null_as_default")]
    pub issues: Vec<Issue>,
    #[serde(deserialize_with = "null_as_default")]
    pub requires_attention: Vec<serde_json::Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: PayloadSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatedLink {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    pub target_url: Option<String>,
    pub anchor_text: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexedBlog {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_indexed: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub interlinks: Vec<Interlink>,
    #[serde(deserialize_with = "null_as_default")]
    pub interlink_count: u32,
}

impl IndexedBlog {
    pub fn has_dead_interlink(&self) -> bool {
        self.interlinks.iter().any(Interlink::is_dead)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Interlink {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}

impl Interlink {
    pub fn is_dead(&self) -> bool {
        self.status == "dead"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub total_created_links: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub working_links: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub dead_links: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub total_indexed_blogs: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub dead_interlinks: u32,
}

/// A validated submission, ready to run through the pipeline.
#[derive(Debug, Clone)]
pub struct Submission {
    pub task_id: Uuid,
    pub project_id: Uuid,
    pub assignee_id: Uuid,
    pub status: ReportStatus,
    pub summary: serde_json::Value,
    pub payload: ReportPayload,
}

/// Report row as handed to the store. `processed_at` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub task_id: Uuid,
    pub project_id: Uuid,
    pub assignee_id: Uuid,
    pub status: ReportStatus,
    pub links_created: i64,
    pub links_working: i64,
    pub links_dead: i64,
    pub summary: serde_json::Value,
    pub created_links: serde_json::Value,
    pub indexed_blogs: serde_json::Value,
    pub payload: serde_json::Value,
}

impl NewReport {
    pub fn from_submission(submission: &Submission) -> Self {
        let counts = &submission.payload.summary;
        let payload = &submission.payload;

        Self {
            task_id: submission.task_id,
            project_id: submission.project_id,
            assignee_id: submission.assignee_id,
            status: submission.status,
            links_created: i64::from(counts.total_created_links),
            links_working: i64::from(counts.working_links),
            links_dead: i64::from(counts.dead_links),
            summary: submission.summary.clone(),
            created_links: serde_json::to_value(&payload.created_links).unwrap_or_default(),
            indexed_blogs: serde_json::to_value(&payload.indexed_blogs).unwrap_or_default(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
        }
    }
}

pub const FOLLOW_UP_TASK_TYPE: &str = "backlinks";
pub const FOLLOW_UP_TASK_STATUS: &str = "todo";

/// Remediation work item derived from a report, before it is tied to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUp {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Task row inserted for a follow-up.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub assignee_id: Uuid,
    pub parent_report_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub task_type: &'static str,
    pub status: &'static str,
}

impl NewTask {
    pub fn follow_up(report_id: Uuid, submission: &Submission, follow_up: FollowUp) -> Self {
        Self {
            project_id: submission.project_id,
            assignee_id: submission.assignee_id,
            parent_report_id: report_id,
            title: follow_up.title,
            description: follow_up.description,
            priority: follow_up.priority,
            task_type: FOLLOW_UP_TASK_TYPE,
            status: FOLLOW_UP_TASK_STATUS,
        }
    }
}

pub const NOTIFICATION_TYPE: &str = "backlink_report";

/// Notification row. Rows are unread when inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}
