//! Inventory admin backend
//!
//! REST API over an embedded document store (Sled) for the products,
//! employees and suppliers admin pages, plus user registration and login.
//!
//! - `storage`: one Sled tree per collection, JSON documents
//! - `query`: predicate builder evaluated during collection scans
//! - `models` / `normalize`: typed documents and lenient input coercion
//! - `rest`: Axum routes, shared state and error responses

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod query;
pub mod rest;
pub mod storage;
