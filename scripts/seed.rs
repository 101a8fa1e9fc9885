//! Seed script for the inventory admin store
//!
//! Populates the Sled collections with a handful of products, employees and
//! suppliers plus an `admin` account, going through the same normalization
//! as the REST handlers.
//! Run: cargo run --bin seed -- [DATA_DIR]

use chrono::Utc;
use serde_json::{json, Value};

use inventory_admin::auth::{hash_password, AuthSettings};
use inventory_admin::models::{new_id, Employee, Product, Supplier, User};
use inventory_admin::query::Query;
use inventory_admin::storage::{Collection, Storage};

fn input<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(body)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let data_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DATA_DIR").ok())
        .unwrap_or_else(|| "inventory_data".to_string());
    let storage = Storage::open(&data_dir)?;

    let admin = User::new(
        new_id(),
        "admin".to_string(),
        hash_password("admin", AuthSettings::default().bcrypt_cost)?,
        Some("admin@example.com".to_string()),
        Some("admin".to_string()),
        Utc::now(),
    );
    if !storage.insert_unique(Collection::Users, &admin.username, &admin)? {
        println!("admin user already exists, keeping it");
    }

    let products = [
        json!({ "name": "Linen Shirt", "price": 39.5, "sizes": "S, M, L", "colors": ["white", "sand"], "category": "shirts", "inventory": 24 }),
        json!({ "name": "Denim Jacket", "price": "89.00", "sizes": ["M", "L"], "colors": "indigo", "category": "outerwear", "inventory": "6" }),
        json!({ "name": "Wool Scarf", "price": 25, "colors": "grey, navy", "category": "accessories", "status": "inactive" }),
    ];
    for body in products {
        let product = Product::create(new_id(), input(body)?, Utc::now());
        storage.insert(Collection::Products, &product.id, &product)?;
    }

    let employees = [
        json!({ "name": "Lin Xu", "email": "lin@example.com", "department": "Sales", "position": "Lead", "salary": 5200, "hireDate": "2024-03-01" }),
        json!({ "name": "Sam Ortiz", "email": "sam@example.com", "phone": "555-0102", "department": "Warehouse", "position": "Associate", "salary": "3100" }),
    ];
    for body in employees {
        let employee = Employee::create(new_id(), input(body)?, Utc::now());
        storage.insert(Collection::Employees, &employee.id, &employee)?;
    }

    let suppliers = [
        json!({ "companyName": "Acme Textiles", "contactPerson": "Wei Chen", "email": "sales@acme.example", "categories": "fabrics, linen", "rating": 4 }),
        json!({ "companyName": "Button Barn", "phone": "555-0199", "categories": ["trims", "buttons"], "notes": "Ships weekly" }),
    ];
    for body in suppliers {
        let supplier = Supplier::create(new_id(), input(body)?, Utc::now())?;
        storage.insert(Collection::Suppliers, &supplier.id, &supplier)?;
    }

    storage.flush()?;

    for collection in [Collection::Products, Collection::Employees, Collection::Suppliers, Collection::Users] {
        let docs: Vec<Value> = storage.find(collection, &Query::new())?;
        println!("{}: {} documents", collection.name(), docs.len());
    }
    println!("Seeded store at {data_dir}");

    Ok(())
}
