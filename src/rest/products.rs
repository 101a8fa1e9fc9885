use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use super::{message, path_id, AppState, JsonBody, QueryParams};
use crate::error::{AppError, Result};
use crate::models::{new_id, Product, ProductInput};
use crate::normalize::parse_float;
use crate::query::Query;
use crate::storage::Collection;

/// `GET /api/products?category&status&minPrice&maxPrice`
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl ProductFilter {
    /// Exact category/status, inclusive price bounds. Bounds that do not
    /// parse as numbers are ignored.
    pub fn to_query(&self) -> Query {
        let bound = |raw: &Option<String>| {
            raw.as_ref()
                .filter(|s| !s.is_empty())
                .and_then(|s| parse_float(&Value::String(s.clone())))
        };

        Query::new()
            .eq("category", self.category.as_deref())
            .eq("status", self.status.as_deref())
            .range("price", bound(&self.min_price), bound(&self.max_price))
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(name = "products::list", skip(state))]
async fn list_products(
    State(state): State<Arc<AppState>>,
    QueryParams(filter): QueryParams<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let products: Vec<Product> = state.storage.find(Collection::Products, &filter.to_query())?;
    info!(count = products.len(), "listed products");
    Ok(Json(products))
}

#[instrument(name = "products::get", skip(state))]
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = path_id(&id, "product")?;
    state
        .storage
        .get(Collection::Products, &id)?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(name = "products::create", skip(state, input))]
async fn create_product(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = Product::create(new_id(), input, Utc::now());
    state.storage.insert(Collection::Products, &product.id, &product)?;
    info!(id = %product.id, "created product");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(name = "products::update", skip(state, input))]
async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ProductInput>,
) -> Result<Json<Value>> {
    let id = path_id(&id, "product")?;
    let now = Utc::now();
    state
        .storage
        .update(Collection::Products, &id, |product: &mut Product| product.apply(&input, now))?
        .ok_or_else(not_found)?;
    Ok(message("Product updated"))
}

#[instrument(name = "products::delete", skip(state))]
async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = path_id(&id, "product")?;
    if !state.storage.remove(Collection::Products, &id)? {
        return Err(not_found());
    }
    Ok(message("Product deleted"))
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}
