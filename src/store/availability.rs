use sqlx::SqlitePool;

use crate::models::AvailabilityRow;

/// Outcome of a `set` call: either a stored record, or confirmation that the
/// write resolved to "fully working" and removed the row.
#[derive(Debug, Clone)]
pub enum SetOutcome {
    Saved(AvailabilityRow),
    Deleted,
}

#[derive(Clone)]
pub struct AvailabilityStore {
    pool: SqlitePool,
}

impl AvailabilityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records filtered by barber and/or date. Callers on the booking path
    /// treat a failed read as "no restrictions" and pass an empty list on.
    pub async fn get(
        &self,
        barber: Option<&str>,
        date: Option<&str>,
    ) -> Result<Vec<AvailabilityRow>, sqlx::Error> {
        match (barber, date) {
            (Some(barber), Some(date)) => {
                sqlx::query_as::<_, AvailabilityRow>(
                    "SELECT barber, date, is_off, closed_hours FROM availability WHERE barber = ? AND date = ?",
                )
                .bind(barber)
                .bind(date)
                .fetch_all(&self.pool)
                .await
            }
            (Some(barber), None) => {
                sqlx::query_as::<_, AvailabilityRow>(
                    "SELECT barber, date, is_off, closed_hours FROM availability WHERE barber = ? ORDER BY date",
                )
                .bind(barber)
                .fetch_all(&self.pool)
                .await
            }
            (None, Some(date)) => {
                sqlx::query_as::<_, AvailabilityRow>(
                    "SELECT barber, date, is_off, closed_hours FROM availability WHERE date = ? ORDER BY barber",
                )
                .bind(date)
                .fetch_all(&self.pool)
                .await
            }
            (None, None) => {
                sqlx::query_as::<_, AvailabilityRow>(
                    "SELECT barber, date, is_off, closed_hours FROM availability ORDER BY date, barber",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    /// Upsert keyed on (barber, date). A write that means "working, nothing
    /// blocked" deletes any existing row instead of storing a no-op record;
    /// a missing delete target is not an error.
    pub async fn set(
        &self,
        barber: &str,
        date: &str,
        is_off: bool,
        closed_hours: &[String],
    ) -> Result<SetOutcome, sqlx::Error> {
        if !is_off && closed_hours.is_empty() {
            sqlx::query("DELETE FROM availability WHERE barber = ? AND date = ?")
                .bind(barber)
                .bind(date)
                .execute(&self.pool)
                .await?;
            return Ok(SetOutcome::Deleted);
        }

        let closed_json =
            serde_json::to_string(closed_hours).unwrap_or_else(|_| "[]".to_string());
        sqlx::query(
            r#"INSERT INTO availability (barber, date, is_off, closed_hours)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(barber, date) DO UPDATE SET
                 is_off = excluded.is_off,
                 closed_hours = excluded.closed_hours"#,
        )
        .bind(barber)
        .bind(date)
        .bind(is_off)
        .bind(&closed_json)
        .execute(&self.pool)
        .await?;

        Ok(SetOutcome::Saved(AvailabilityRow {
            barber: barber.to_string(),
            date: date.to_string(),
            is_off,
            closed_hours: closed_json,
        }))
    }
}
