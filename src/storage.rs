use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sled::{CompareAndSwapError, Db, Tree};

use crate::error::Result;
use crate::query::Query;

/// Collections kept in the document store, one Sled tree each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Products,
    Employees,
    Suppliers,
    Users,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Employees => "employees",
            Collection::Suppliers => "suppliers",
            Collection::Users => "users",
        }
    }
}

/// Sled-backed document store. Documents are JSON values keyed by their id
/// (users are keyed by username). Cloning is cheap and every clone shares the
/// same database.
#[derive(Clone)]
pub struct Storage {
    db: Db,
    products: Tree,
    employees: Tree,
    suppliers: Tree,
    users: Tree,
}

impl Storage {
    /// Open or create the Sled database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory database removed on drop, used by tests and demos.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self> {
        Ok(Self {
            products: db.open_tree(Collection::Products.name())?,
            employees: db.open_tree(Collection::Employees.name())?,
            suppliers: db.open_tree(Collection::Suppliers.name())?,
            users: db.open_tree(Collection::Users.name())?,
            db,
        })
    }

    fn tree(&self, collection: Collection) -> &Tree {
        match collection {
            Collection::Products => &self.products,
            Collection::Employees => &self.employees,
            Collection::Suppliers => &self.suppliers,
            Collection::Users => &self.users,
        }
    }

    /// Write a document under `key`, replacing any previous value.
    pub fn insert<T: Serialize>(&self, collection: Collection, key: &str, doc: &T) -> Result<()> {
        let bytes = serde_json::to_vec(doc)?;
        self.tree(collection).insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Write a document only if `key` is not taken yet. Returns `false` when
    /// another document already holds the key. The check and the write are a
    /// single atomic compare-and-swap.
    pub fn insert_unique<T: Serialize>(
        &self,
        collection: Collection,
        key: &str,
        doc: &T,
    ) -> Result<bool> {
        let bytes = serde_json::to_vec(doc)?;
        let swapped = self
            .tree(collection)
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(bytes))?;
        Ok(swapped.is_ok())
    }

    pub fn get<T: DeserializeOwned>(&self, collection: Collection, key: &str) -> Result<Option<T>> {
        match self.tree(collection).get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read-modify-write of one document. `apply` may run more than once if a
    /// concurrent writer touches the same key; the last successful result is
    /// returned. `None` when the key does not exist.
    pub fn update<T, F>(&self, collection: Collection, key: &str, mut apply: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(&mut T),
    {
        let tree = self.tree(collection);
        loop {
            let Some(current) = tree.get(key.as_bytes())? else {
                return Ok(None);
            };
            let mut doc: T = serde_json::from_slice(&current)?;
            apply(&mut doc);
            let bytes = serde_json::to_vec(&doc)?;

            match tree.compare_and_swap(key.as_bytes(), Some(current), Some(bytes))? {
                Ok(()) => return Ok(Some(doc)),
                Err(CompareAndSwapError { .. }) => {
                    tracing::debug!(collection = collection.name(), key, "concurrent update, retrying");
                }
            }
        }
    }

    /// Returns whether a document was removed.
    pub fn remove(&self, collection: Collection, key: &str) -> Result<bool> {
        Ok(self.tree(collection).remove(key.as_bytes())?.is_some())
    }

    /// Scan a collection in key order, keep documents matching `query`, then
    /// apply its sort.
    pub fn find<T: DeserializeOwned>(&self, collection: Collection, query: &Query) -> Result<Vec<T>> {
        let mut matched = Vec::new();
        for item in self.tree(collection).iter() {
            let (_, bytes) = item?;
            let doc: Value = serde_json::from_slice(&bytes)?;
            if query.matches(&doc) {
                matched.push(doc);
            }
        }
        query.sort(&mut matched);

        matched
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .collect()
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        kind: String,
        rank: i64,
    }

    fn item(id: &str, kind: &str, rank: i64) -> Item {
        Item {
            id: id.to_string(),
            kind: kind.to_string(),
            rank,
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let storage = Storage::temporary().expect("Failed to open storage");
        let doc = item("a", "x", 1);

        storage.insert(Collection::Products, "a", &doc).expect("Insert failed");
        let fetched: Option<Item> = storage.get(Collection::Products, "a").expect("Get failed");
        assert_eq!(fetched, Some(doc));

        // Collections are isolated from each other
        let other: Option<Item> = storage.get(Collection::Suppliers, "a").unwrap();
        assert!(other.is_none());

        assert!(storage.remove(Collection::Products, "a").unwrap());
        assert!(!storage.remove(Collection::Products, "a").unwrap());
        let gone: Option<Item> = storage.get(Collection::Products, "a").unwrap();
        assert!(gone.is_none());
    }

    #[test]
    fn test_insert_unique_rejects_taken_key() {
        let storage = Storage::temporary().unwrap();

        assert!(storage.insert_unique(Collection::Users, "alice", &json!({"n": 1})).unwrap());
        assert!(!storage.insert_unique(Collection::Users, "alice", &json!({"n": 2})).unwrap());

        let kept: Value = storage.get(Collection::Users, "alice").unwrap().unwrap();
        assert_eq!(kept, json!({"n": 1}));
    }

    #[test]
    fn test_update_applies_in_place() {
        let storage = Storage::temporary().unwrap();
        storage.insert(Collection::Employees, "a", &item("a", "x", 1)).unwrap();

        let updated: Option<Item> = storage
            .update(Collection::Employees, "a", |doc: &mut Item| doc.rank += 10)
            .unwrap();
        assert_eq!(updated.map(|d| d.rank), Some(11));

        let missing: Option<Item> = storage
            .update(Collection::Employees, "nope", |doc: &mut Item| doc.rank += 1)
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_find_filters_and_sorts() {
        let storage = Storage::temporary().unwrap();
        storage.insert(Collection::Products, "1", &item("1", "x", 2)).unwrap();
        storage.insert(Collection::Products, "2", &item("2", "y", 5)).unwrap();
        storage.insert(Collection::Products, "3", &item("3", "x", 9)).unwrap();

        let all: Vec<Item> = storage.find(Collection::Products, &Query::new()).unwrap();
        assert_eq!(all.len(), 3);

        let query = Query::new()
            .eq("kind", Some("x"))
            .sort_by("rank", Direction::Descending);
        let found: Vec<Item> = storage.find(Collection::Products, &query).unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }
}
