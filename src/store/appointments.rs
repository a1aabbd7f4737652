use sqlx::SqlitePool;

use crate::{
    db::{new_id, now_rfc3339},
    error::ApiError,
    models::{AppointmentRow, ANY_BARBER, APPOINTMENT_STATUSES, STATUS_APPROVED, STATUS_PENDING},
    validate,
};

/// Input for a new appointment. Whatever status a caller might have wanted
/// is not represented here; storage always starts at pending.
#[derive(Debug, Clone, Default)]
pub struct NewAppointment {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: String,
    pub time: String,
    pub services: Vec<String>,
    pub total: f64,
    pub barber_id: Option<String>,
    pub barber: Option<String>,
}

#[derive(Clone)]
pub struct AppointmentStore {
    pool: SqlitePool,
    enforce_unique_slots: bool,
}

impl AppointmentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            enforce_unique_slots: false,
        }
    }

    /// Opt into rejecting a second booking for the same (barber, date,
    /// time). Off by default to match how the shop actually operates.
    pub fn with_unique_slots(mut self, enforce: bool) -> Self {
        self.enforce_unique_slots = enforce;
        self
    }

    /// Validates required fields, joins the service names into one string,
    /// forces status to pending, and returns the stored record.
    pub async fn create(&self, input: NewAppointment) -> Result<AppointmentRow, ApiError> {
        validate::require(&input.name, "Full name is required.")?;
        validate::require(&input.date, "Please pick a date.")?;
        validate::require(&input.time, "Please pick a time.")?;
        if input.services.iter().all(|s| s.trim().is_empty()) {
            return Err(ApiError::validation("Please select at least one service."));
        }

        let phone = input.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
        if let Some(phone) = phone {
            if !validate::is_international_phone(phone) {
                return Err(ApiError::validation(
                    "Please enter a valid phone number with country code.",
                ));
            }
        }

        let services = input
            .services
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let barber = input
            .barber
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(ANY_BARBER)
            .to_string();

        if self.enforce_unique_slots && barber != ANY_BARBER {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM appointments WHERE barber = ? AND date = ? AND time = ?",
            )
            .bind(&barber)
            .bind(input.date.trim())
            .bind(input.time.trim())
            .fetch_one(&self.pool)
            .await?;
            if taken > 0 {
                return Err(ApiError::validation(
                    "That time was just booked. Please pick another slot.",
                ));
            }
        }

        let row = AppointmentRow {
            id: new_id(),
            client_name: input.name.trim().to_string(),
            client_email: input.email.filter(|e| !e.trim().is_empty()),
            client_phone: phone.map(str::to_string),
            date: input.date.trim().to_string(),
            time: input.time.trim().to_string(),
            services,
            total: input.total,
            barber_id: input.barber_id.filter(|id| !id.trim().is_empty()),
            barber,
            status: STATUS_PENDING.to_string(),
            created_at: now_rfc3339(),
        };

        sqlx::query(
            r#"INSERT INTO appointments
               (id, client_name, client_email, client_phone, date, time, services, total, barber_id, barber, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.client_name)
        .bind(&row.client_email)
        .bind(&row.client_phone)
        .bind(&row.date)
        .bind(&row.time)
        .bind(&row.services)
        .bind(row.total)
        .bind(&row.barber_id)
        .bind(&row.barber)
        .bind(&row.status)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    /// All appointments, newest-created first, optionally narrowed to an
    /// exact phone match.
    pub async fn list(&self, phone: Option<&str>) -> Result<Vec<AppointmentRow>, ApiError> {
        let rows = match phone {
            Some(phone) => {
                sqlx::query_as::<_, AppointmentRow>(
                    r#"SELECT id, client_name, client_email, client_phone, date, time, services, total, barber_id, barber, status, created_at
                       FROM appointments WHERE client_phone = ? ORDER BY created_at DESC"#,
                )
                .bind(phone)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AppointmentRow>(
                    r#"SELECT id, client_name, client_email, client_phone, date, time, services, total, barber_id, barber, status, created_at
                       FROM appointments ORDER BY created_at DESC"#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn list_by_status(&self, status: &str) -> Result<Vec<AppointmentRow>, ApiError> {
        let order = if status == STATUS_APPROVED {
            // The confirmed registry reads newest appointment date first.
            "ORDER BY date DESC, time DESC"
        } else {
            "ORDER BY created_at DESC"
        };
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"SELECT id, client_name, client_email, client_phone, date, time, services, total, barber_id, barber, status, created_at
               FROM appointments WHERE status = ? {order}"#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find(&self, id: &str) -> Result<AppointmentRow, ApiError> {
        sqlx::query_as::<_, AppointmentRow>(
            r#"SELECT id, client_name, client_email, client_phone, date, time, services, total, barber_id, barber, status, created_at
               FROM appointments WHERE id = ? LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("appointment"))
    }

    /// Overwrites the status field only.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<AppointmentRow, ApiError> {
        validate::check_status(status, &APPOINTMENT_STATUSES)?;

        let result = sqlx::query("UPDATE appointments SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("appointment"));
        }
        self.find(id).await
    }

    /// Hard delete. Absent ids come back as NotFound; callers on the
    /// cancellation path treat that as the desired end state.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("appointment"));
        }
        Ok(())
    }
}
