//! Supplier routes. Unlike products and employees, the list is newest first
//! and an update answers with the updated document.

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
use crate::models::supplier::SEARCH_FIELDS;
use crate::models::{new_id, Supplier, SupplierInput};
use crate::query::{Direction, Query};
use crate::storage::Collection;

/// `GET /api/suppliers?category&search`
#[derive(Deserialize, Debug, Default)]
pub struct SupplierFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl SupplierFilter {
    pub fn to_query(&self) -> Query {
        Query::new()
            .contains("categories", self.category.as_deref())
            .search(SEARCH_FIELDS, self.search.as_deref())
            .sort_by("createdAt", Direction::Descending)
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/api/suppliers/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

#[instrument(name = "suppliers::list", skip(state))]
async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    QueryParams(filter): QueryParams<SupplierFilter>,
) -> Result<Json<Vec<Supplier>>> {
    let suppliers: Vec<Supplier> = state.storage.find(Collection::Suppliers, &filter.to_query())?;
    info!(count = suppliers.len(), "listed suppliers");
    Ok(Json(suppliers))
}

#[instrument(name = "suppliers::get", skip(state))]
async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Supplier>> {
    let id = path_id(&id, "supplier")?;
    state
        .storage
        .get(Collection::Suppliers, &id)?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(name = "suppliers::create", skip(state, input))]
async fn create_supplier(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<SupplierInput>,
) -> Result<(StatusCode, Json<Supplier>)> {
    let supplier = Supplier::create(new_id(), input, Utc::now())?;
    state.storage.insert(Collection::Suppliers, &supplier.id, &supplier)?;
    info!(id = %supplier.id, company = %supplier.company_name, "created supplier");
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[instrument(name = "suppliers::update", skip(state, input))]
async fn update_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<SupplierInput>,
) -> Result<Json<Supplier>> {
    let id = path_id(&id, "supplier")?;
    input.validate()?;

    let now = Utc::now();
    state
        .storage
        .update(Collection::Suppliers, &id, |supplier: &mut Supplier| supplier.apply(&input, now))?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(name = "suppliers::delete", skip(state))]
async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = path_id(&id, "supplier")?;
    if !state.storage.remove(Collection::Suppliers, &id)? {
        return Err(not_found());
    }
    Ok(message("Supplier deleted"))
}

fn not_found() -> AppError {
    AppError::NotFound("Supplier not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use super::*;
    use axum::http::Method;
    use serde_json::json;

    async fn add(app: &Router, body: Value) -> Value {
        let (status, created) = send(app, Method::POST, "/api/suppliers", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        created
    }

    fn companies(body: &Value) -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|s| s["companyName"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_create_normalizes_fields() {
        let (app, _) = app();
        let created = add(
            &app,
            json!({ "companyName": " Acme ", "categories": "fabrics, trims, fabrics", "phone": 5550100 }),
        )
        .await;

        assert_eq!(created["companyName"], "Acme");
        assert_eq!(created["categories"], json!(["fabrics", "trims"]));
        assert_eq!(created["rating"], 3);
        assert_eq!(created["phone"], "5550100");
        assert_eq!(created["contactPerson"], "");
        assert_eq!(created["createdAt"], created["updatedAt"]);

        let id = created["_id"].as_str().unwrap();
        let (status, fetched) = send(&app, Method::GET, &format!("/api/suppliers/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_without_company_name() {
        let (app, storage) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/suppliers",
            Some(json!({ "companyName": "  ", "rating": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "companyName is required" }));

        let stored: Vec<Supplier> = storage.find(Collection::Suppliers, &Query::new()).unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_search_and_category_filter() {
        let (app, _) = app();
        add(&app, json!({ "companyName": "Acme Textiles", "categories": ["fabrics"] })).await;
        add(&app, json!({ "companyName": "Button Barn", "categories": "trims", "notes": "acme partner" })).await;
        add(&app, json!({ "companyName": "Zenith", "categories": ["fabrics", "dyes"], "email": "z@zenith.io" })).await;

        // Newest first
        let (_, all) = send(&app, Method::GET, "/api/suppliers", None).await;
        assert_eq!(companies(&all), vec!["Zenith", "Button Barn", "Acme Textiles"]);

        let (_, found) = send(&app, Method::GET, "/api/suppliers?search=acme", None).await;
        assert_eq!(companies(&found), vec!["Button Barn", "Acme Textiles"]);

        let (_, found) = send(&app, Method::GET, "/api/suppliers?category=fabrics", None).await;
        assert_eq!(companies(&found), vec!["Zenith", "Acme Textiles"]);

        let (_, found) = send(&app, Method::GET, "/api/suppliers?category=fabrics&search=ACME", None).await;
        assert_eq!(companies(&found), vec!["Acme Textiles"]);

        let (_, found) = send(&app, Method::GET, "/api/suppliers?search=DYE", None).await;
        assert_eq!(companies(&found), vec!["Zenith"]);

        let (_, found) = send(&app, Method::GET, "/api/suppliers?search=%20%20", None).await;
        assert_eq!(companies(&found).len(), 3);
    }

    #[tokio::test]
    async fn test_update_returns_document() {
        let (app, _) = app();
        let created = add(&app, json!({ "companyName": "Acme", "rating": 2, "address": "Pier 4" })).await;
        let id = created["_id"].as_str().unwrap();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/suppliers/{id}"),
            Some(json!({ "rating": 99, "categories": "lace,  ribbon" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["rating"], 5);
        assert_eq!(updated["categories"], json!(["lace", "ribbon"]));
        assert_eq!(updated["address"], "Pier 4");
        assert_eq!(updated["createdAt"], created["createdAt"]);
        assert_ne!(updated["updatedAt"], created["updatedAt"]);

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/suppliers/{id}"),
            Some(json!({ "companyName": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "companyName is required" }));
    }

    #[tokio::test]
    async fn test_bad_and_missing_ids() {
        let (app, _) = app();

        let (status, body) = send(&app, Method::GET, "/api/suppliers/xyz", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid supplier id" }));

        let missing = new_id();
        let (status, body) = send(&app, Method::DELETE, &format!("/api/suppliers/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Supplier not found" }));
    }
}
