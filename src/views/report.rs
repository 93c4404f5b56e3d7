use poem::web::{Data, Json};
use poem::{handler, IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::TriageError;
use crate::models::{ReportPayload, ReportStatus, Submission};
use crate::pipeline;
use crate::store::SharedStore;

/// Request body as sent by the crawler. Fields are optional here so that a
/// missing one is reported by name instead of as a parse failure.
#[derive(Debug, Deserialize)]
pub struct SubmitReport {
    task_id: Option<Uuid>,
    project_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
    status: Option<ReportStatus>,
    summary: Option<serde_json::Value>,
    payload: Option<ReportPayload>,
}

impl SubmitReport {
    pub fn into_submission(self) -> Result<Submission, TriageError> {
        let mut missing = Vec::new();
        if self.task_id.is_none() {
            missing.push("task_id");
        }
        if self.project_id.is_none() {
            missing.push("project_id");
        }
        if self.assignee_id.is_none() {
            missing.push("assignee_id");
        }
        if self.status.is_none() {
            missing.push("status");
        }
        if self.payload.is_none() {
            missing.push("payload");
        }

        match (self.task_id, self.project_id, self.assignee_id, self.status, self.payload) {
            (Some(task_id), Some(project_id), Some(assignee_id), Some(status), Some(payload)) => {
                Ok(Submission {
                    task_id,
                    project_id,
                    assignee_id,
                    status,
                    summary: self.summary.unwrap_or_else(|| serde_json::json!({})),
                    payload,
                })
            }
            _ => Err(TriageError::MissingFields(missing)),
        }
    }
}

#[handler]
pub async fn process_backlink_report(
    Data(store): Data<&SharedStore>,
    body: poem::Result<Json<SubmitReport>>,
) -> Response {
    match run(store.clone(), body).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => {
            match &err {
                TriageError::Internal(e) => tracing::error!("Backlink report processing failed: {:?}", e),
                e => tracing::warn!("Rejected backlink report: {}", e),
            }
            err.into_response()
        }
    }
}

async fn run(
    store: SharedStore,
    body: poem::Result<Json<SubmitReport>>,
) -> Result<pipeline::Outcome, TriageError> {
    let Json(request) = body.map_err(|e| TriageError::InvalidBody(e.to_string()))?;
    let submission = request.into_submission()?;

    // A panic inside the pipeline surfaces as a JoinError and becomes a 500.
    tokio::spawn(async move { pipeline::process(&*store, &submission).await })
        .await
        .map_err(|e| anyhow::anyhow!("pipeline task aborted: {}", e))?
}
