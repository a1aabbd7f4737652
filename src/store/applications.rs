use sqlx::SqlitePool;

use crate::{
    db::{new_id, now_rfc3339},
    error::ApiError,
    models::{JobApplicationRow, APPLICATION_STATUSES, STATUS_PENDING},
    validate,
};

#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
}

/// Job applications share the appointment store's shape but keep a stored
/// terminal status; rejection never deletes the row.
#[derive(Clone)]
pub struct ApplicationStore {
    pool: SqlitePool,
}

impl ApplicationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: NewApplication) -> Result<JobApplicationRow, ApiError> {
        validate::require(&input.name, "Full name is required.")?;

        let row = JobApplicationRow {
            id: new_id(),
            name: input.name.trim().to_string(),
            email: input.email.filter(|e| !e.trim().is_empty()),
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            message: input.message.trim().to_string(),
            status: STATUS_PENDING.to_string(),
            created_at: now_rfc3339(),
        };
        sqlx::query(
            r#"INSERT INTO job_applications (id, name, email, phone, message, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.message)
        .bind(&row.status)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&self, status: Option<&str>) -> Result<Vec<JobApplicationRow>, ApiError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, JobApplicationRow>(
                    r#"SELECT id, name, email, phone, message, status, created_at
                       FROM job_applications WHERE status = ? ORDER BY created_at DESC"#,
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, JobApplicationRow>(
                    r#"SELECT id, name, email, phone, message, status, created_at
                       FROM job_applications ORDER BY created_at DESC"#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<JobApplicationRow, ApiError> {
        validate::check_status(status, &APPLICATION_STATUSES)?;

        let result = sqlx::query("UPDATE job_applications SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("application"));
        }

        sqlx::query_as::<_, JobApplicationRow>(
            r#"SELECT id, name, email, phone, message, status, created_at
               FROM job_applications WHERE id = ? LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("application"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[actix_web::test]
    async fn rejection_is_a_stored_status_not_a_delete() {
        let store = ApplicationStore::new(test_pool().await);
        let row = store
            .create(NewApplication {
                name: "Mert Kaya".to_string(),
                email: Some("mert@example.com".to_string()),
                phone: None,
                message: "Five years behind the chair.".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(row.status, "pending");

        let rejected = store.update_status(&row.id, "rejected").await.unwrap();
        assert_eq!(rejected.status, "rejected");

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 1);
        let rejected_only = store.list(Some("rejected")).await.unwrap();
        assert_eq!(rejected_only.len(), 1);
    }

    #[actix_web::test]
    async fn unknown_status_and_missing_target_fail() {
        let store = ApplicationStore::new(test_pool().await);
        let row = store
            .create(NewApplication {
                name: "Mert Kaya".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(store.update_status(&row.id, "archived").await.is_err());
        assert!(store
            .update_status("missing", "reviewed")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
