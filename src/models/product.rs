use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{opt_status, Status};
use crate::normalize::{opt_text, parse_float, parse_int, string_set, trimmed};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub category: String,
    pub status: Status,
    pub inventory: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/products` and `PUT /api/products/:id`. Numbers and
/// lists are kept loose so form strings like `"19.90"` or `"S, M"` work.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default, deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub image: Option<String>,
    pub price: Option<Value>,
    pub sizes: Option<Value>,
    pub colors: Option<Value>,
    #[serde(default, deserialize_with = "opt_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "opt_status")]
    pub status: Option<Status>,
    pub inventory: Option<Value>,
}

impl Product {
    pub fn create(id: String, input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: trimmed(input.name),
            image: trimmed(input.image),
            price: input.price.as_ref().and_then(parse_float).unwrap_or(0.0),
            sizes: input.sizes.as_ref().map(string_set).unwrap_or_default(),
            colors: input.colors.as_ref().map(string_set).unwrap_or_default(),
            category: trimmed(input.category),
            status: input.status.unwrap_or_default(),
            inventory: input.inventory.as_ref().and_then(parse_int).unwrap_or(0),
            created_at: now,
            updated_at: None,
        }
    }

    /// Partial update: only fields present in `input` change. Numbers that do
    /// not parse leave the stored value alone.
    pub fn apply(&mut self, input: &ProductInput, now: DateTime<Utc>) {
        if let Some(name) = &input.name {
            self.name = name.trim().to_string();
        }
        if let Some(image) = &input.image {
            self.image = image.trim().to_string();
        }
        if let Some(price) = input.price.as_ref().and_then(parse_float) {
            self.price = price;
        }
        if let Some(sizes) = &input.sizes {
            self.sizes = string_set(sizes);
        }
        if let Some(colors) = &input.colors {
            self.colors = string_set(colors);
        }
        if let Some(category) = &input.category {
            self.category = category.trim().to_string();
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(inventory) = input.inventory.as_ref().and_then(parse_int) {
            self.inventory = inventory;
        }
        self.updated_at = Some(now);
    }
}
