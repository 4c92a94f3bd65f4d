use sqlx::Row;

use paverly_core::domain::product::{ManufacturerId, Product, ProductId, Variant};

use super::{read_optional_decimal, ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
        let variants_json = row.try_get::<String, _>("variants")?;
        let variants = serde_json::from_str::<Vec<Variant>>(&variants_json)
            .map_err(|error| RepositoryError::decode("products.variants", error))?;

        Ok(Product {
            id: ProductId(row.try_get::<String, _>("id")?),
            name: row.try_get::<String, _>("name")?,
            description: row.try_get::<Option<String>, _>("description")?,
            manufacturer_id: ManufacturerId(row.try_get::<String, _>("manufacturer_id")?),
            prompt: row.try_get::<Option<String>, _>("prompt")?,
            variants,
            price_per_pallet: read_optional_decimal(
                row.try_get::<Option<String>, _>("price_per_pallet")?,
                "products.price_per_pallet",
            )?,
            sqft_per_pallet: read_optional_decimal(
                row.try_get::<Option<String>, _>("sqft_per_pallet")?,
                "products.sqft_per_pallet",
            )?,
        })
    }
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, description, manufacturer_id, prompt, variants,
                    price_per_pallet, sqft_per_pallet
             FROM products
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode_row).collect()
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, description, manufacturer_id, prompt, variants,
                    price_per_pallet, sqft_per_pallet
             FROM products
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn upsert(&self, product: Product) -> Result<(), RepositoryError> {
        let variants = serde_json::to_string(&product.variants)
            .map_err(|error| RepositoryError::decode("products.variants", error))?;

        sqlx::query(
            "INSERT INTO products
                 (id, name, description, manufacturer_id, prompt, variants,
                  price_per_pallet, sqft_per_pallet)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 manufacturer_id = excluded.manufacturer_id,
                 prompt = excluded.prompt,
                 variants = excluded.variants,
                 price_per_pallet = excluded.price_per_pallet,
                 sqft_per_pallet = excluded.sqft_per_pallet",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.manufacturer_id.0)
        .bind(&product.prompt)
        .bind(variants)
        .bind(product.price_per_pallet.map(|value| value.to_string()))
        .bind(product.sqft_per_pallet.map(|value| value.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use paverly_core::domain::product::{
        ManufacturerId, Product, ProductId, Variant, VariantId,
    };

    use crate::repositories::ProductRepository;
    use crate::{connect_with_settings, migrations};

    use super::SqlProductRepository;

    fn monaco() -> Product {
        Product {
            id: ProductId("monaco".to_string()),
            name: "Monaco".to_string(),
            description: Some("Elegant and timeless stone look.".to_string()),
            manufacturer_id: ManufacturerId("tremron".to_string()),
            prompt: None,
            variants: vec![Variant {
                id: VariantId("monaco-glacier".to_string()),
                name: "Glacier".to_string(),
                texture_url: "https://textures.example/monaco-glacier.jpg".to_string(),
                example_url: "https://examples.example/monaco-1.jpg".to_string(),
                shop_url: None,
                price_per_pallet: None,
            }],
            price_per_pallet: Some(Decimal::from(285u32)),
            sqft_per_pallet: Some(Decimal::from(107u32)),
        }
    }

    async fn repository() -> SqlProductRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlProductRepository::new(pool)
    }

    #[tokio::test]
    async fn products_round_trip_including_variants() {
        let repository = repository().await;
        repository.upsert(monaco()).await.expect("upsert");

        let loaded = repository
            .find_by_id(&ProductId("monaco".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(loaded, monaco());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_rows() {
        let repository = repository().await;
        repository.upsert(monaco()).await.expect("insert");

        let mut updated = monaco();
        updated.price_per_pallet = Some(Decimal::from(310u32));
        repository.upsert(updated.clone()).await.expect("update");

        let all = repository.list().await.expect("list");
        assert_eq!(all, vec![updated]);
    }

    #[tokio::test]
    async fn delete_removes_the_product() {
        let repository = repository().await;
        repository.upsert(monaco()).await.expect("insert");
        repository.delete(&ProductId("monaco".to_string())).await.expect("delete");

        assert!(repository.list().await.expect("list").is_empty());
    }
}
