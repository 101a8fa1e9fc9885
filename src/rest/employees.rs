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
use crate::models::{new_id, Employee, EmployeeInput};
use crate::query::Query;
use crate::storage::Collection;

/// `GET /api/employees?department&position`
#[derive(Deserialize, Debug, Default)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub position: Option<String>,
}

impl EmployeeFilter {
    pub fn to_query(&self) -> Query {
        Query::new()
            .eq("department", self.department.as_deref())
            .eq("position", self.position.as_deref())
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

#[instrument(name = "employees::list", skip(state))]
async fn list_employees(
    State(state): State<Arc<AppState>>,
    QueryParams(filter): QueryParams<EmployeeFilter>,
) -> Result<Json<Vec<Employee>>> {
    let employees: Vec<Employee> = state.storage.find(Collection::Employees, &filter.to_query())?;
    info!(count = employees.len(), "listed employees");
    Ok(Json(employees))
}

#[instrument(name = "employees::get", skip(state))]
async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Employee>> {
    let id = path_id(&id, "employee")?;
    state
        .storage
        .get(Collection::Employees, &id)?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(name = "employees::create", skip(state, input))]
async fn create_employee(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<EmployeeInput>,
) -> Result<(StatusCode, Json<Employee>)> {
    let employee = Employee::create(new_id(), input, Utc::now());
    state.storage.insert(Collection::Employees, &employee.id, &employee)?;
    info!(id = %employee.id, "created employee");
    Ok((StatusCode::CREATED, Json(employee)))
}

#[instrument(name = "employees::update", skip(state, input))]
async fn update_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<EmployeeInput>,
) -> Result<Json<Value>> {
    let id = path_id(&id, "employee")?;
    let now = Utc::now();
    state
        .storage
        .update(Collection::Employees, &id, |employee: &mut Employee| employee.apply(&input, now))?
        .ok_or_else(not_found)?;
    Ok(message("Employee updated"))
}

#[instrument(name = "employees::delete", skip(state))]
async fn delete_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = path_id(&id, "employee")?;
    if !state.storage.remove(Collection::Employees, &id)? {
        return Err(not_found());
    }
    Ok(message("Employee deleted"))
}

fn not_found() -> AppError {
    AppError::NotFound("Employee not found".to_string())
}
