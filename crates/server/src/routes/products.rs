use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use tracing::warn;

use paverly_core::domain::product::{Product, ProductId};
use paverly_db::repositories::ProductRepository;
use paverly_db::SeedDataset;

use crate::error::ApiError;

use super::{require_admin, AppState};

/// Public catalog read. A store failure degrades to the shipped catalog
/// so the wizard always has products to offer.
pub async fn list(State(state): State<AppState>) -> Json<Vec<Product>> {
    match state.products().list().await {
        Ok(products) if !products.is_empty() => Json(products),
        Ok(_) => Json(SeedDataset::products()),
        Err(error) => {
            warn!(error = %error, "product read failed, serving shipped catalog");
            Json(SeedDataset::products())
        }
    }
}

pub async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(product): Json<Product>,
) -> Result<Json<Vec<Product>>, ApiError> {
    require_admin(&state, &headers)?;
    if product.id.0.trim().is_empty() || product.name.trim().is_empty() {
        return Err(ApiError::bad_request("product requires an id and a name"));
    }

    let repository = state.products();
    repository.upsert(product).await?;
    Ok(Json(repository.list().await?))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    require_admin(&state, &headers)?;

    let repository = state.products();
    repository.delete(&ProductId(id)).await?;
    Ok(Json(repository.list().await?))
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, State};
    use axum::http::HeaderMap;
    use axum::Json;

    use paverly_db::repositories::ProductRepository;
    use paverly_db::{connect_with_settings, migrations, SeedDataset};

    use crate::routes::{AppState, ADMIN_PASSWORD_HEADER};

    async fn seeded_state() -> AppState {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SeedDataset::load(&pool).await.expect("seed");
        AppState::new(pool, None, Some("letmein".to_string().into()))
    }

    fn admin_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_PASSWORD_HEADER, "letmein".parse().expect("header"));
        headers
    }

    #[tokio::test]
    async fn list_returns_the_seeded_catalog() {
        let state = seeded_state().await;
        let Json(products) = super::list(State(state)).await;
        assert_eq!(products.len(), SeedDataset::products().len());
    }

    #[tokio::test]
    async fn list_serves_shipped_catalog_when_table_is_empty() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let state = AppState::new(pool, None, None);

        let Json(products) = super::list(State(state)).await;
        assert_eq!(products.len(), SeedDataset::products().len());
    }

    #[tokio::test]
    async fn save_requires_the_admin_password() {
        let state = seeded_state().await;
        let product = SeedDataset::products().remove(0);

        let denied =
            super::save(State(state.clone()), HeaderMap::new(), Json(product.clone())).await;
        assert!(denied.is_err());

        let allowed = super::save(State(state), admin_headers(), Json(product)).await;
        assert!(allowed.is_ok());
    }

    #[tokio::test]
    async fn remove_deletes_and_returns_the_rest() {
        let state = seeded_state().await;
        let Json(remaining) = super::remove(
            State(state.clone()),
            admin_headers(),
            Path("union".to_string()),
        )
        .await
        .expect("remove");

        assert_eq!(remaining.len(), SeedDataset::products().len() - 1);
        assert!(state
            .products()
            .list()
            .await
            .expect("list")
            .iter()
            .all(|product| product.id.0 != "union"));
    }
}
