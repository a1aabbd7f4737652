use std::collections::BTreeMap;

use serde::Serialize;

/// Sentinel stored on an appointment when the customer had no barber
/// preference.
pub const ANY_BARBER: &str = "Any";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";

/// Appointments only ever hold `pending` or `approved`; rejection removes
/// the row instead of storing a status.
pub const APPOINTMENT_STATUSES: [&str; 2] = [STATUS_PENDING, STATUS_APPROVED];

/// Job applications keep a stored terminal status instead of being deleted.
pub const APPLICATION_STATUSES: [&str; 4] = ["pending", "reviewed", "approved", "rejected"];

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ShopRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    /// JSON object of language code -> display string.
    pub names: String,
    pub price: f64,
    pub duration_min: i64,
}

impl ServiceRow {
    pub fn name_map(&self) -> BTreeMap<String, String> {
        serde_json::from_str(&self.names).unwrap_or_default()
    }

    /// Display name in the requested language, falling back to English and
    /// then to whatever entry exists.
    pub fn display_name(&self, lang: &str) -> String {
        let names = self.name_map();
        names
            .get(lang)
            .or_else(|| names.get("en"))
            .cloned()
            .or_else(|| names.values().next().cloned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberRow {
    pub id: String,
    pub display_name: String,
    pub specialty: String,
    pub image: String,
    pub shop_id: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AvailabilityRow {
    pub barber: String,
    /// Local calendar date, zero-padded "YYYY-MM-DD".
    pub date: String,
    pub is_off: bool,
    /// JSON-encoded array of slot-template time strings.
    pub closed_hours: String,
}

impl AvailabilityRow {
    pub fn closed_slots(&self) -> Vec<String> {
        serde_json::from_str(&self.closed_hours).unwrap_or_default()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AppointmentRow {
    pub id: String,
    #[serde(rename = "name")]
    pub client_name: String,
    #[serde(rename = "email")]
    pub client_email: Option<String>,
    #[serde(rename = "phone")]
    pub client_phone: Option<String>,
    pub date: String,
    pub time: String,
    /// Comma-joined display names, e.g. "Haircut, Beard Trim".
    pub services: String,
    pub total: f64,
    /// Id of the chosen barber, absent for "Any"; `barber` keeps the
    /// display name as it was at booking time.
    #[serde(rename = "barberId")]
    pub barber_id: Option<String>,
    pub barber: String,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(names: &str) -> ServiceRow {
        ServiceRow {
            id: "svc".to_string(),
            names: names.to_string(),
            price: 25.0,
            duration_min: 45,
        }
    }

    #[test]
    fn display_name_prefers_requested_language() {
        let row = service(r#"{"en":"Haircut","de":"Haarschnitt","tr":"Saç Kesimi"}"#);
        assert_eq!(row.display_name("de"), "Haarschnitt");
        assert_eq!(row.display_name("tr"), "Saç Kesimi");
    }

    #[test]
    fn display_name_falls_back_to_english_then_any() {
        let row = service(r#"{"en":"Haircut","de":"Haarschnitt"}"#);
        assert_eq!(row.display_name("fr"), "Haircut");

        let row = service(r#"{"de":"Haarschnitt"}"#);
        assert_eq!(row.display_name("fr"), "Haarschnitt");
    }

    #[test]
    fn malformed_name_map_yields_empty_name() {
        let row = service("not json");
        assert_eq!(row.display_name("en"), "");
    }

    #[test]
    fn closed_slots_parses_json_array() {
        let row = AvailabilityRow {
            barber: "Ahmet".to_string(),
            date: "2025-06-10".to_string(),
            is_off: false,
            closed_hours: r#"["10:00","10:45"]"#.to_string(),
        };
        assert_eq!(row.closed_slots(), vec!["10:00", "10:45"]);
    }

    #[test]
    fn malformed_closed_hours_is_treated_as_open() {
        let row = AvailabilityRow {
            barber: "Ahmet".to_string(),
            date: "2025-06-10".to_string(),
            is_off: false,
            closed_hours: "oops".to_string(),
        };
        assert!(row.closed_slots().is_empty());
    }
}
