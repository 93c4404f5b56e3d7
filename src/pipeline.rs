use serde::Serialize;
use uuid::Uuid;

use crate::error::TriageError;
use crate::models::{NewReport, NewTask, ReportStatus, Submission};
use crate::notify::{self, Audience};
use crate::rules;
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub report_id: Uuid,
    pub task_updated: bool,
    pub follow_up_tasks_created: usize,
    pub notifications_sent: u64,
}

/// Runs one submission through the pipeline.
///
/// Only the report insert is fatal. The task update, each follow-up insert,
/// the follow-up flag, the recipient lookups and the notification batch are
/// independent writes; a failure in any of them is logged and shows up as a
/// lower count in the returned [`Outcome`].
pub async fn process(store: &dyn Store, submission: &Submission) -> Result<Outcome, TriageError> {
    let report_id = store
        .insert_report(&NewReport::from_submission(submission))
        .await
        .map_err(TriageError::ReportInsert)?;

    tracing::info!(%report_id, task_id = %submission.task_id, status = %submission.status, "Stored backlink report");

    let task_updated = match store
        .complete_task(submission.task_id, submission.status)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(%report_id, task_id = %submission.task_id, "Failed to update task: {}", e);
            false
        }
    };

    let follow_ups_created = create_follow_ups(store, report_id, submission).await;
    let notifications_sent = send_notifications(store, report_id, submission, follow_ups_created).await;

    Ok(Outcome {
        success: true,
        report_id,
        task_updated,
        follow_up_tasks_created: follow_ups_created,
        notifications_sent,
    })
}

async fn create_follow_ups(store: &dyn Store, report_id: Uuid, submission: &Submission) -> usize {
    let mut created = 0;
    for follow_up in rules::evaluate(&submission.payload, submission.status) {
        let title = follow_up.title.clone();
        match store
            .insert_task(&NewTask::follow_up(report_id, submission, follow_up))
            .await
        {
            Ok(task_id) => {
                tracing::debug!(%report_id, %task_id, "Created follow-up task {:?}", title);
                created += 1;
            }
            Err(e) => {
                tracing::error!(%report_id, "Failed to create follow-up task {:?}: {}", title, e);
            }
        }
    }

    if created > 0 {
        if let Err(e) = store.flag_follow_ups(report_id).await {
            tracing::warn!(%report_id, "Failed to flag report follow-ups: {}", e);
        }
    }

    created
}

async fn send_notifications(
    store: &dyn Store,
    report_id: Uuid,
    submission: &Submission,
    follow_ups_created: usize,
) -> u64 {
    let mut audience = Audience::default();

    match store.project_managers(submission.project_id).await {
        Ok(managers) => audience.managers = managers,
        Err(e) => {
            tracing::warn!(%report_id, project_id = %submission.project_id, "Failed to load project managers: {}", e)
        }
    }

    if submission.status == ReportStatus::Critical {
        match store.super_admins().await {
            Ok(admins) => audience.super_admins = admins,
            Err(e) => tracing::warn!(%report_id, "Failed to load super admins: {}", e),
        }
    }

    let batch = notify::fan_out(report_id, submission, follow_ups_created, &audience);
    match store.insert_notifications(&batch).await {
        Ok(sent) => sent,
        Err(e) => {
            tracing::error!(%report_id, recipients = batch.len(), "Failed to send notifications: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexedBlog, Interlink, PayloadSummary, ReportPayload};
    use crate::store::memory::{Failures, MemoryStore};
    use serde_json::json;

    fn submission(status: ReportStatus, payload: ReportPayload) -> Submission {
        Submission {
            task_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            assignee_id: Uuid::new_v4(),
            status,
            summary: json!({ "created_links": { "total": 10 } }),
            payload,
        }
    }

    fn dead_links_payload(dead_links: u32) -> ReportPayload {
        ReportPayload {
            indexed_blogs: vec![IndexedBlog {
                url: "https://blog.example.com/a".into(),
                is_indexed: true,
                interlinks: vec![Interlink {
                    url: "https://blog.example.com/b".into(),
                    status: "working".into(),
                }],
                interlink_count: 5,
            }],
            summary: PayloadSummary {
                total_created_links: 10,
                working_links: 10 - dead_links,
                dead_links,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn critical_report_end_to_end() {
        let sub = submission(ReportStatus::Critical, dead_links_payload(3));
        let store = MemoryStore::new().with_task(sub.task_id);

        let outcome = process(&store, &sub).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.task_updated);
        assert_eq!(outcome.follow_up_tasks_created, 1);
        assert_eq!(outcome.notifications_sent, 1);

        let state = store.state.lock().unwrap();
        assert_eq!(state.reports.len(), 1);
        let report = &state.reports[0];
        assert_eq!(report.id, outcome.report_id);
        assert!(report.has_follow_up_tasks);
        assert_eq!(report.report.links_dead, 3);
        assert_eq!(report.report.links_working, 7);

        let task = &state.tasks[&sub.task_id];
        assert_eq!(task.status, "completed");
        assert_eq!(task.report_status, Some(ReportStatus::Critical));

        let follow_up = &state.follow_ups[0];
        assert_eq!(follow_up.title, "Fix dead backlink URLs");
        assert_eq!(follow_up.parent_report_id, outcome.report_id);
        assert_eq!(follow_up.task_type, "backlinks");
        assert_eq!(follow_up.status, "todo");
        assert!(follow_up.description.contains('3'));
    }

    #[tokio::test]
    async fn healthy_report_congratulates_assignee() {
        let sub = submission(ReportStatus::Healthy, ReportPayload::default());
        let store = MemoryStore::new();

        let outcome = process(&store, &sub).await.unwrap();
        assert_eq!(outcome.follow_up_tasks_created, 0);

        let state = store.state.lock().unwrap();
        assert!(!state.reports[0].has_follow_up_tasks);
        assert_eq!(state.notifications.len(), 1);
        assert!(state.notifications[0].message.starts_with("Great work!"));
    }

    #[tokio::test]
    async fn report_insert_failure_stops_everything() {
        let sub = submission(ReportStatus::Critical, dead_links_payload(3));
        let store = MemoryStore::failing(Failures {
            insert_report: true,
            ..Default::default()
        });

        let err = process(&store, &sub).await.unwrap_err();
        assert!(matches!(err, TriageError::ReportInsert(_)));

        let state = store.state.lock().unwrap();
        assert!(state.reports.is_empty());
        assert_eq!(state.task_updates, 0);
        assert!(state.follow_ups.is_empty());
        assert!(state.notifications.is_empty());
    }

    #[tokio::test]
    async fn downstream_failures_only_reduce_counts() {
        let mut payload = dead_links_payload(2);
        payload.summary.dead_interlinks = 4;
        let sub = submission(ReportStatus::Critical, payload);
        let store = MemoryStore::failing(Failures {
            complete_task: true,
            insert_task: vec![0],
            insert_notifications: true,
            ..Default::default()
        });

        let outcome = process(&store, &sub).await.unwrap();
        assert!(outcome.success);
        assert!(!outcome.task_updated);
        assert_eq!(outcome.follow_up_tasks_created, 1);
        assert_eq!(outcome.notifications_sent, 0);

        let state = store.state.lock().unwrap();
        assert_eq!(state.follow_ups[0].title, "Replace dead interlinks");
        assert!(state.reports[0].has_follow_up_tasks);
    }

    #[tokio::test]
    async fn no_flag_when_every_follow_up_fails() {
        let sub = submission(ReportStatus::Critical, dead_links_payload(1));
        let store = MemoryStore::failing(Failures {
            insert_task: vec![0],
            ..Default::default()
        });

        let outcome = process(&store, &sub).await.unwrap();
        assert_eq!(outcome.follow_up_tasks_created, 0);
        assert!(!store.state.lock().unwrap().reports[0].has_follow_up_tasks);
    }

    #[tokio::test]
    async fn flag_failure_keeps_counts_and_notifies() {
        let sub = submission(ReportStatus::Critical, dead_links_payload(2));
        let manager = Uuid::new_v4();
        let store = MemoryStore::failing(Failures {
            flag_follow_ups: true,
            ..Default::default()
        })
        .with_member(sub.project_id, manager, "admin");

        let outcome = process(&store, &sub).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.follow_up_tasks_created, 1);
        assert_eq!(outcome.notifications_sent, 2);

        let state = store.state.lock().unwrap();
        assert!(!state.reports[0].has_follow_up_tasks);
        assert_eq!(state.follow_ups.len(), 1);
        assert!(state.notifications[0].message.contains("1 follow-up task(s)"));
    }

    #[tokio::test]
    async fn critical_fan_out_counts() {
        let sub = submission(ReportStatus::Critical, dead_links_payload(1));
        let manager = Uuid::new_v4();
        let admins = [Uuid::new_v4(), Uuid::new_v4()];
        let store = MemoryStore::new()
            .with_member(sub.project_id, sub.assignee_id, "manager")
            .with_member(sub.project_id, manager, "manager")
            .with_member(sub.project_id, Uuid::new_v4(), "member")
            .with_role(admins[0], "super_admin")
            .with_role(admins[1], "super_admin")
            .with_role(sub.assignee_id, "super_admin");

        let outcome = process(&store, &sub).await.unwrap();
        assert_eq!(outcome.notifications_sent, 1 + 1 + 2);

        let state = store.state.lock().unwrap();
        let recipients: Vec<_> = state.notifications.iter().map(|n| n.user_id).collect();
        assert_eq!(recipients, vec![sub.assignee_id, manager, admins[0], admins[1]]);
    }

    #[tokio::test]
    async fn lookup_failures_still_notify_assignee() {
        let sub = submission(ReportStatus::Critical, ReportPayload::default());
        let store = MemoryStore::failing(Failures {
            project_managers: true,
            super_admins: true,
            ..Default::default()
        })
        .with_member(sub.project_id, Uuid::new_v4(), "admin");

        let outcome = process(&store, &sub).await.unwrap();
        assert_eq!(outcome.notifications_sent, 1);
    }

    #[tokio::test]
    async fn resubmission_is_not_idempotent() {
        let sub = submission(ReportStatus::Critical, dead_links_payload(3));
        let store = MemoryStore::new();

        let first = process(&store, &sub).await.unwrap();
        let second = process(&store, &sub).await.unwrap();
        assert_ne!(first.report_id, second.report_id);

        let state = store.state.lock().unwrap();
        assert_eq!(state.reports.len(), 2);
        assert_eq!(state.follow_ups.len(), 2);
        assert_eq!(state.follow_ups[0].title, state.follow_ups[1].title);
        assert_eq!(state.task_updates, 2);
    }
}
