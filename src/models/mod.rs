//! Documents stored in the inventory collections and the request payloads
//! that create or patch them.
//!
//! Field names on the wire are camelCase and the store-assigned id is `_id`.

use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub mod employee;
pub mod product;
pub mod supplier;
pub mod user;

pub use employee::{Employee, EmployeeInput};
pub use product::{Product, ProductInput};
pub use supplier::{Supplier, SupplierInput};
pub use user::{User, UserProfile};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

/// Lenient `status` field for request bodies. Form posts send `""` when the
/// select is left empty, which reads as absent; case is ignored.
pub fn opt_status<'de, D>(deserializer: D) -> Result<Option<Status>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "" => Ok(None),
        "active" => Ok(Some(Status::Active)),
        "inactive" => Ok(Some(Status::Inactive)),
        other => Err(de::Error::unknown_variant(other, &["active", "inactive"])),
    }
}

/// Fresh store id. UUIDv7 ids sort by creation time, so a collection scan
/// returns documents in insertion order.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Validates a path id. Ids are canonicalized so differently formatted
/// spellings of the same UUID address the same document.
pub fn parse_id(raw: &str) -> Option<String> {
    Uuid::parse_str(raw).ok().map(|id| id.to_string())
}
