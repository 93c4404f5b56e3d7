use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewNotification, NewReport, NewTask, ReportStatus};
use crate::store::Store;

pub static POOL: OnceCell<PgPool> = OnceCell::new();

pub async fn init_pool(url: &str) -> Result<&'static PgPool> {
    let pool = PgPool::connect(url).await?;
    POOL.set(pool)
        .map_err(|_| anyhow::anyhow!("database pool initialised twice"))?;

    POOL.get().context("database pool missing after init")
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// PostgreSQL-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_report(&self, report: &NewReport) -> Result<Uuid, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO backlink_reports(task_id, project_id, assignee_id, status, links_created, links_working, links_dead, summary, created_links, indexed_blogs, payload)
             VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING id",
        )
        .bind(report.task_id)
        .bind(report.project_id)
        .bind(report.assignee_id)
        .bind(report.status.as_str())
        .bind(report.links_created)
        .bind(report.links_working)
        .bind(report.links_dead)
        .bind(Json(&report.summary))
        .bind(Json(&report.created_links))
        .bind(Json(&report.indexed_blogs))
        .bind(Json(&report.payload))
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn complete_task(&self, task_id: Uuid, badge: ReportStatus) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'completed', report_status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(task_id)
        .bind(badge.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rejected(format!("task {} not found", task_id)));
        }
        Ok(())
    }

    async fn insert_task(&self, task: &NewTask) -> Result<Uuid, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO tasks(project_id, assignee_id, parent_report_id, title, description, priority, task_type, status)
             VALUES($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(task.project_id)
        .bind(task.assignee_id)
        .bind(task.parent_report_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.task_type)
        .bind(task.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn flag_follow_ups(&self, report_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE backlink_reports SET has_follow_up_tasks = TRUE WHERE id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn project_managers(&self, project_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM project_members WHERE project_id = $1 AND role IN ('manager', 'admin') ORDER BY created_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn super_admins(&self) -> Result<Vec<Uuid>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT user_id FROM user_roles WHERE role = $1 ORDER BY user_id")
            .bind("super_admin")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn insert_notifications(&self, batch: &[NewNotification]) -> Result<u64, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut user_ids = Vec::with_capacity(batch.len());
        let mut kinds = Vec::with_capacity(batch.len());
        let mut titles = Vec::with_capacity(batch.len());
        let mut messages = Vec::with_capacity(batch.len());
        let mut data = Vec::with_capacity(batch.len());
        for notification in batch {
            user_ids.push(notification.user_id);
            kinds.push(notification.kind.to_string());
            titles.push(notification.title.clone());
            messages.push(notification.message.clone());
            data.push(notification.data.to_string());
        }

        // Single statement so the whole batch lands or none of it does.
        let result = sqlx::query(
            "INSERT INTO notifications(user_id, type, title, message, data)
             SELECT user_id, type, title, message, data::jsonb
             FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[], $5::text[])
                  AS batch(user_id, type, title, message, data)",
        )
        .bind(user_ids)
        .bind(kinds)
        .bind(titles)
        .bind(messages)
        .bind(data)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
