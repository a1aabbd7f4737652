use std::env;

/// Runtime configuration, read once at startup. Every value has a
/// development default so a bare `cargo run` comes up working.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub admin_user: String,
    pub admin_password: String,
    pub seed_demo_data: bool,
    /// When set, two bookings can no longer land on the same
    /// (barber, date, time). Off by default; walk-in overflow is handled by
    /// staff.
    pub enforce_unique_slots: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/fadehaus.db".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);
        let admin_user = env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .map(|value| value == "true" || value == "1")
            .unwrap_or(false);
        let enforce_unique_slots = env::var("ENFORCE_UNIQUE_SLOTS")
            .map(|value| value == "true" || value == "1")
            .unwrap_or(false);

        if admin_password == "admin" {
            log::warn!(
                "ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production."
            );
        }

        Self {
            database_url,
            port,
            admin_user,
            admin_password,
            seed_demo_data,
            enforce_unique_slots,
        }
    }
}
