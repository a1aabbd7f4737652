use std::collections::BTreeMap;

use sqlx::SqlitePool;

use crate::{
    db::new_id,
    error::ApiError,
    models::{BarberRow, ServiceRow, ShopRow},
    validate,
};

#[derive(Debug, Clone)]
pub struct NewService {
    /// Language code -> display string; at least one entry required.
    pub names: BTreeMap<String, String>,
    pub price: f64,
    pub duration_min: i64,
}

#[derive(Debug, Clone)]
pub struct NewBarber {
    pub display_name: String,
    pub specialty: String,
    pub image: String,
}

/// Services, barbers, and the single shop record.
#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn shop(&self) -> Result<ShopRow, ApiError> {
        sqlx::query_as::<_, ShopRow>("SELECT id, name, address, phone FROM shops LIMIT 1")
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("shop"))
    }

    pub async fn services(&self) -> Result<Vec<ServiceRow>, ApiError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, names, price, duration_min FROM services ORDER BY price",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_service(&self, input: NewService) -> Result<ServiceRow, ApiError> {
        if input.names.values().all(|name| name.trim().is_empty()) {
            return Err(ApiError::validation("Service name is required."));
        }
        if input.price < 0.0 {
            return Err(ApiError::validation("Price must not be negative."));
        }
        if input.duration_min <= 0 {
            return Err(ApiError::validation("Duration must be positive."));
        }

        let row = ServiceRow {
            id: new_id(),
            names: serde_json::to_string(&input.names)
                .map_err(|_| ApiError::validation("Service names could not be encoded."))?,
            price: input.price,
            duration_min: input.duration_min,
        };
        sqlx::query("INSERT INTO services (id, names, price, duration_min) VALUES (?, ?, ?, ?)")
            .bind(&row.id)
            .bind(&row.names)
            .bind(row.price)
            .bind(row.duration_min)
            .execute(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("service"));
        }
        Ok(())
    }

    pub async fn barbers(&self) -> Result<Vec<BarberRow>, ApiError> {
        let rows = sqlx::query_as::<_, BarberRow>(
            "SELECT id, display_name, specialty, image, shop_id FROM barbers ORDER BY display_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// New barbers always belong to the single active shop.
    pub async fn create_barber(&self, input: NewBarber) -> Result<BarberRow, ApiError> {
        validate::require(&input.display_name, "Display name is required.")?;
        let shop = self.shop().await?;

        let row = BarberRow {
            id: new_id(),
            display_name: input.display_name.trim().to_string(),
            specialty: input.specialty.trim().to_string(),
            image: input.image.trim().to_string(),
            shop_id: shop.id,
        };
        sqlx::query(
            "INSERT INTO barbers (id, display_name, specialty, image, shop_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.display_name)
        .bind(&row.specialty)
        .bind(&row.image)
        .bind(&row.shop_id)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    /// Historical appointments keep the barber's name as plain text, so
    /// deleting a barber does not touch them.
    pub async fn delete_barber(&self, id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM barbers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("barber"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn store_with_shop() -> CatalogStore {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO shops (id, name, address, phone) VALUES ('shop-1', 'Fadehaus', '', '')")
            .execute(&pool)
            .await
            .unwrap();
        CatalogStore::new(pool)
    }

    fn names(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[actix_web::test]
    async fn service_create_and_delete() {
        let store = store_with_shop().await;
        let service = store
            .create_service(NewService {
                names: names(&[("en", "Haircut"), ("de", "Haarschnitt")]),
                price: 24.0,
                duration_min: 45,
            })
            .await
            .unwrap();

        let listed = store.services().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].display_name("de"), "Haarschnitt");

        store.delete_service(&service.id).await.unwrap();
        assert!(store.services().await.unwrap().is_empty());
        assert!(store
            .delete_service(&service.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[actix_web::test]
    async fn service_inputs_are_validated() {
        let store = store_with_shop().await;
        assert!(store
            .create_service(NewService {
                names: names(&[("en", "  ")]),
                price: 24.0,
                duration_min: 45,
            })
            .await
            .is_err());
        assert!(store
            .create_service(NewService {
                names: names(&[("en", "Haircut")]),
                price: -1.0,
                duration_min: 45,
            })
            .await
            .is_err());
    }

    #[actix_web::test]
    async fn barbers_join_the_single_shop() {
        let store = store_with_shop().await;
        let barber = store
            .create_barber(NewBarber {
                display_name: "Ahmet".to_string(),
                specialty: "Skin fades".to_string(),
                image: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(barber.shop_id, "shop-1");

        store.delete_barber(&barber.id).await.unwrap();
        assert!(store.barbers().await.unwrap().is_empty());
    }
}
