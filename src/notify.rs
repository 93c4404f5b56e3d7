use serde_json::json;
use uuid::Uuid;

use crate::models::{NewNotification, ReportStatus, Submission, NOTIFICATION_TYPE};

/// Users who may be notified about a report besides its assignee.
#[derive(Debug, Default, Clone)]
pub struct Audience {
    /// Project members with the `manager` or `admin` role.
    pub managers: Vec<Uuid>,
    /// Users holding the `super_admin` role. Only consulted for critical reports.
    pub super_admins: Vec<Uuid>,
}

/// Builds one notification per (recipient, role), assignee first.
///
/// The assignee is skipped in the manager and super admin groups, but nothing
/// else is de-duplicated: someone who is both a manager and a super admin gets
/// two rows.
pub fn fan_out(
    report_id: Uuid,
    submission: &Submission,
    follow_ups_created: usize,
    audience: &Audience,
) -> Vec<NewNotification> {
    let status = submission.status;
    let assignee = submission.assignee_id;
    let base_data = json!({ "report_id": report_id, "status": status });

    let mut notifications = vec![NewNotification {
        user_id: assignee,
        kind: NOTIFICATION_TYPE,
        title: format!("Backlink Report: {}", status.as_str().to_uppercase()),
        message: assignee_message(status, follow_ups_created),
        data: base_data.clone(),
    }];

    notifications.extend(
        audience
            .managers
            .iter()
            .filter(|id| **id != assignee)
            .map(|id| NewNotification {
                user_id: *id,
                kind: NOTIFICATION_TYPE,
                title: format!("Project Backlink Report: {}", status.as_str().to_uppercase()),
                message: format!(
                    "A backlink report for project {} was submitted with {} status.",
                    submission.project_id, status
                ),
                data: json!({
                    "report_id": report_id,
                    "status": status,
                    "project_id": submission.project_id,
                }),
            }),
    );

    if status == ReportStatus::Critical {
        notifications.extend(
            audience
                .super_admins
                .iter()
                .filter(|id| **id != assignee)
                .map(|id| NewNotification {
                    user_id: *id,
                    kind: NOTIFICATION_TYPE,
                    title: format!("Escalation: {} Backlink Report", status.as_str().to_uppercase()),
                    message: format!(
                        "A critical backlink report needs attention. {} follow-up task(s) were created.",
                        follow_ups_created
                    ),
                    data: base_data.clone(),
                }),
        );
    }

    notifications
}

fn assignee_message(status: ReportStatus, follow_ups_created: usize) -> String {
    match status {
        ReportStatus::Critical => format!(
            "Your backlink report has critical issues. {} follow-up task(s) were created for you.",
            follow_ups_created
        ),
        ReportStatus::Warning => format!(
            "Your backlink report has warnings. {} follow-up task(s) were created for you.",
            follow_ups_created
        ),
        ReportStatus::Healthy => {
            "Great work! Your backlink report is healthy and no follow-up is needed.".to_string()
        }
    }
}
