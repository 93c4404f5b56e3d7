use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewNotification, NewReport, NewTask, ReportStatus};

pub type SharedStore = Arc<dyn Store>;

/// Table-level operations the triage pipeline needs from the backing store.
///
/// Every method is a single independent write or read; nothing here spans a
/// transaction.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a report and returns its id.
    async fn insert_report(&self, report: &NewReport) -> Result<Uuid, StoreError>;
    /// Marks the originating task completed and records the report badge.
    async fn complete_task(&self, task_id: Uuid, badge: ReportStatus) -> Result<(), StoreError>;
    async fn insert_task(&self, task: &NewTask) -> Result<Uuid, StoreError>;
    async fn flag_follow_ups(&self, report_id: Uuid) -> Result<(), StoreError>;
    /// Project members holding the `manager` or `admin` role.
    async fn project_managers(&self, project_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    async fn super_admins(&self) -> Result<Vec<Uuid>, StoreError>;
    /// Writes all rows in one batch and returns how many were stored.
    async fn insert_notifications(&self, batch: &[NewNotification]) -> Result<u64, StoreError>;
}
