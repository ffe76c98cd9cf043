//! A minimal table storing each record as a JSON document.

use serde::Serialize;

use crate::error::StorageError;
use crate::store::{quote_identifier, Store};
use crate::table::Table;

/// Two-column table (`id`, `body`) holding the JSON encoding of each record.
#[derive(Debug, Clone)]
pub struct ExampleTable {
    name: String,
}

impl ExampleTable {
    /// Default table name.
    pub const NAME: &'static str = "example";

    /// Create an `example` table definition.
    pub fn new() -> Self {
        Self::with_name(Self::NAME)
    }

    /// Create a definition with a custom table name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Create the definition and make sure the table exists in `store`.
    pub fn with_store(store: &Store) -> Result<Self, StorageError> {
        let table = Self::new();
        table.create(store)?;
        Ok(table)
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// SQL creating this table.
    pub fn schema_sql(&self) -> String {
        format!(
            "CREATE TABLE {} (\n    id INTEGER PRIMARY KEY,\n    body TEXT\n);",
            quote_identifier(&self.name)
        )
    }

    /// Create the table if necessary.
    pub fn create(&self, store: &Store) -> Result<(), StorageError> {
        store.create_table_if_necessary(&self.name, &self.schema_sql())?;
        Ok(())
    }
}

impl Default for ExampleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Table<R> for ExampleTable
where
    R: Serialize,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> String {
        self.schema_sql()
    }

    fn ensure_schema(&self, store: &Store) -> Result<(), StorageError> {
        self.create(store)
    }

    fn write_record(&self, store: &Store, record: &R) -> Result<(), StorageError> {
        let body = serde_json::to_string(record)?;
        let sql = format!("INSERT INTO {} (body) VALUES (?1)", quote_identifier(&self.name));

        store.with_transaction(|tx| {
            tx.execute(&sql, [&body])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Example {
        time: i64,
    }

    #[test]
    fn test_with_store_creates_table() {
        let store = Store::open_in_memory().unwrap();
        let table = ExampleTable::with_store(&store).unwrap();

        assert_eq!(table.table_name(), "example");
        assert!(store.has_table("example").unwrap());
    }

    #[test]
    fn test_schema_has_two_columns() {
        let table = ExampleTable::new();
        let schema = Table::<Example>::schema(&table);
        assert!(schema.contains("id INTEGER PRIMARY KEY"));
        assert!(schema.contains("body TEXT"));
    }

    #[test]
    fn test_write_record_stores_json() {
        let store = Store::open_in_memory().unwrap();
        let table = ExampleTable::with_store(&store).unwrap();

        table.write_record(&store, &Example { time: 1_700_000_000 }).unwrap();
        table.write_record(&store, &Example { time: 1_700_000_001 }).unwrap();

        assert_eq!(store.row_count("example").unwrap(), 2);

        let body: String = store
            .conn()
            .query_row("SELECT body FROM example ORDER BY id LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(body, r#"{"time":1700000000}"#);
    }

    #[test]
    fn test_ensure_schema_via_trait() {
        let store = Store::open_in_memory().unwrap();
        let table = ExampleTable::with_name("places");

        Table::<Example>::ensure_schema(&table, &store).unwrap();
        Table::<Example>::ensure_schema(&table, &store).unwrap();
        assert!(store.has_table("places").unwrap());
    }

    #[test]
    fn test_write_without_table_fails() {
        let store = Store::open_in_memory().unwrap();
        let table = ExampleTable::new();

        let result = table.write_record(&store, &Example { time: 0 });
        assert!(matches!(result, Err(StorageError::Sqlite(_))));
    }
}
