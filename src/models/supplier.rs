use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::normalize::{self, opt_text, string_set, trimmed};

/// Fields searched by the free-text `search` parameter.
pub const SEARCH_FIELDS: &[&str] = &[
    "companyName",
    "contactPerson",
    "email",
    "phone",
    "address",
    "notes",
    "categories",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(rename = "_id")]
    pub id: String,
    pub company_name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub categories: Vec<String>,
    /// Always within `1..=5`.
    pub rating: i64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    #[serde(default, deserialize_with = "opt_text")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub contact_person: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "normalize::present")]
    pub categories: Option<Value>,
    #[serde(default, deserialize_with = "normalize::present")]
    pub rating: Option<Value>,
    #[serde(default, deserialize_with = "opt_text")]
    pub notes: Option<String>,
}

impl SupplierInput {
    /// A company name, when given, must not be blank.
    pub fn validate(&self) -> Result<()> {
        match self.company_name.as_deref() {
            Some(name) if name.trim().is_empty() => Err(company_name_required()),
            _ => Ok(()),
        }
    }
}

impl Supplier {
    pub fn create(id: String, input: SupplierInput, now: DateTime<Utc>) -> Result<Self> {
        let company_name = trimmed(input.company_name);
        if company_name.is_empty() {
            return Err(company_name_required());
        }

        Ok(Self {
            id,
            company_name,
            contact_person: trimmed(input.contact_person),
            phone: trimmed(input.phone),
            email: trimmed(input.email),
            address: trimmed(input.address),
            categories: input.categories.as_ref().map(string_set).unwrap_or_default(),
            rating: normalize::rating(input.rating.as_ref()),
            notes: trimmed(input.notes),
            created_at: now,
            updated_at: now,
        })
    }

    /// Partial update; call [`SupplierInput::validate`] first. An explicit
    /// `null` is a value here: it clears `categories` and clamps `rating`.
    pub fn apply(&mut self, input: &SupplierInput, now: DateTime<Utc>) {
        let fields = [
            (&input.company_name, &mut self.company_name),
            (&input.contact_person, &mut self.contact_person),
            (&input.phone, &mut self.phone),
            (&input.email, &mut self.email),
            (&input.address, &mut self.address),
            (&input.notes, &mut self.notes),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }

        if let Some(categories) = &input.categories {
            self.categories = string_set(categories);
        }
        if let Some(rating) = &input.rating {
            self.rating = normalize::updated_rating(rating);
        }
        self.updated_at = now;
    }
}

fn company_name_required() -> AppError {
    AppError::InvalidArgument("companyName is required".to_string())
}
