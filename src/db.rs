use std::{fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// SQLite needs the parent directory of a file-backed database to exist
/// before the first connection.
pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"));
    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Seed the single shop record and the service catalog when absent, plus a
/// set of demo barbers when SEED_DEMO_DATA asks for them.
pub async fn seed_defaults(pool: &SqlitePool, config: &Config) -> Result<(), sqlx::Error> {
    let shop_id = seed_shop(pool).await?;
    seed_services(pool).await?;
    if config.seed_demo_data {
        seed_demo_barbers(pool, &shop_id).await?;
    }
    Ok(())
}

async fn seed_shop(pool: &SqlitePool) -> Result<String, sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM shops LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = new_id();
    sqlx::query("INSERT INTO shops (id, name, address, phone) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind("Fadehaus Barbershop")
        .bind("Hauptstraße 12, 10827 Berlin")
        .bind("+493012345678")
        .execute(pool)
        .await?;
    Ok(id)
}

async fn seed_services(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let services = vec![
        (
            r#"{"en":"Haircut","de":"Haarschnitt","tr":"Saç Kesimi"}"#,
            24.0,
            45,
        ),
        (
            r#"{"en":"Beard Trim","de":"Bartpflege","tr":"Sakal Düzeltme"}"#,
            14.0,
            45,
        ),
        (
            r#"{"en":"Hot Towel Shave","de":"Heißtuchrasur","tr":"Sıcak Havlu Tıraşı"}"#,
            19.0,
            45,
        ),
        (
            r#"{"en":"Kids Cut","de":"Kinderschnitt","tr":"Çocuk Tıraşı"}"#,
            16.0,
            45,
        ),
    ];

    for (names, price, duration_min) in services {
        let exists = sqlx::query_as::<_, (String,)>("SELECT id FROM services WHERE names = ? LIMIT 1")
            .bind(names)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }
        sqlx::query("INSERT INTO services (id, names, price, duration_min) VALUES (?, ?, ?, ?)")
            .bind(new_id())
            .bind(names)
            .bind(price)
            .bind(duration_min)
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn seed_demo_barbers(pool: &SqlitePool, shop_id: &str) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM barbers")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let barbers = vec![
        ("Ahmet", "Skin fades", "/img/barbers/ahmet.jpg"),
        ("Emre", "Beard sculpting", "/img/barbers/emre.jpg"),
        ("Luca", "Classic cuts", "/img/barbers/luca.jpg"),
    ];

    for (display_name, specialty, image) in barbers {
        sqlx::query(
            "INSERT INTO barbers (id, display_name, specialty, image, shop_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(display_name)
        .bind(specialty)
        .bind(image)
        .bind(shop_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_dir_is_skipped_for_memory_urls() {
        assert!(ensure_sqlite_dir("sqlite::memory:").is_ok());
        assert!(ensure_sqlite_dir("postgres://host/db").is_ok());
    }

    #[actix_web::test]
    async fn seeding_is_idempotent() {
        let pool = test_pool().await;
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            admin_user: "admin".to_string(),
            admin_password: "admin".to_string(),
            seed_demo_data: true,
            enforce_unique_slots: false,
        };

        seed_defaults(&pool, &config).await.unwrap();
        seed_defaults(&pool, &config).await.unwrap();

        let shops = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shops")
            .fetch_one(&pool)
            .await
            .unwrap();
        let services = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services")
            .fetch_one(&pool)
            .await
            .unwrap();
        let barbers = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM barbers")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(shops, 1);
        assert_eq!(services, 4);
        assert_eq!(barbers, 3);
    }
}
