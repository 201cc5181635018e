//! Validated CRUD over any registered resource.
//!
//! Mutations that match no row surface as [`CrudError::NotFound`], never as
//! success. Store failures pass through unchanged.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::registry::{FieldDef, Registry, RegistryError, ResourceDef};
use crate::store::{column, Row, StoreError, TableStore};

pub mod sql;

#[derive(Debug, Error)]
pub enum CrudError {
    #[error(transparent)]
    UnknownResource(#[from] RegistryError),

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{label} {id} not found")]
    NotFound { label: &'static str, id: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl CrudError {
    fn missing(field: &str, item: Option<usize>) -> Self {
        let message = match item {
            Some(index) => format!("Missing required field: {} (item {})", field, index),
            None => format!("Missing required field: {}", field),
        };
        CrudError::Validation {
            message,
            field: Some(field.to_string()),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        CrudError::Validation {
            message: message.into(),
            field: None,
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_type(field: &FieldDef, value: &Value) -> Result<(), CrudError> {
    if field.column_type.accepts(value) {
        return Ok(());
    }
    Err(CrudError::Validation {
        message: format!("Field {} must be {}", field.name, field.column_type.expected()),
        field: Some(field.name.to_string()),
    })
}

fn as_object(payload: &Value, item: Option<usize>) -> Result<&Map<String, Value>, CrudError> {
    payload.as_object().ok_or_else(|| match item {
        Some(index) => CrudError::invalid(format!("Item {} must be a JSON object", index)),
        None => CrudError::invalid("Request body must be a JSON object"),
    })
}

pub struct CrudEngine<'s> {
    store: &'s dyn TableStore,
    hash_cost: u32,
}

impl<'s> CrudEngine<'s> {
    pub fn new(store: &'s dyn TableStore) -> Self {
        Self {
            store,
            hash_cost: crate::config::config().security.bcrypt_cost,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// All rows of the resource's table, ordered by primary key
    pub async fn list(&self, resource: &str) -> Result<Vec<Row>, CrudError> {
        let def = Registry::lookup(resource)?;
        let rows = self.store.fetch_all(&sql::select_all(def)).await?;
        debug!("Listed {} row(s) from {}", rows.len(), def.table);
        Ok(rows)
    }

    /// Rows whose `field` equals `value`; `field` must be registered on the resource
    pub async fn find_by(&self, resource: &str, field: &str, value: Value) -> Result<Vec<Row>, CrudError> {
        let def = Registry::lookup(resource)?;
        let field = def
            .field(field)
            .ok_or_else(|| CrudError::invalid(format!("Unknown field {} on {}", field, def.name)))?;
        Ok(self.store.fetch_all(&sql::select_where(def, field, value)).await?)
    }

    /// Check the required-field contract without touching the store.
    ///
    /// Accepts a single object or an array of objects.
    pub fn validate(&self, resource: &str, payload: &Value) -> Result<(), CrudError> {
        let def = Registry::lookup(resource)?;
        match payload {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    validate_item(def, as_object(item, Some(index))?, Some(index))?;
                }
                Ok(())
            }
            other => validate_item(def, as_object(other, None)?, None),
        }
    }

    /// Insert one object or a batch of objects; returns the number inserted.
    ///
    /// The whole batch is validated before anything is sent. Valid batches go
    /// out as one multi-row INSERT; an empty batch inserts nothing.
    pub async fn create(&self, resource: &str, payload: &Value) -> Result<usize, CrudError> {
        let def = Registry::lookup(resource)?;
        self.validate(resource, payload)?;

        let items: Vec<&Map<String, Value>> = match payload {
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            other => vec![as_object(other, None)?],
        };
        if items.is_empty() {
            debug!("Empty batch for {}, nothing inserted", def.table);
            return Ok(0);
        }

        let columns: Vec<&FieldDef> = def.required_fields().collect();
        let mut rows = Vec::with_capacity(items.len());
        for item in &items {
            let mut row = Vec::with_capacity(columns.len());
            for field in &columns {
                // validate() guarantees presence
                let value = column(item, field.name).cloned().unwrap_or(Value::Null);
                row.push(self.prepare(field, value)?);
            }
            rows.push(row);
        }

        let affected = self.store.execute(&sql::insert(def, &columns, rows)).await? as usize;
        if affected != items.len() {
            warn!("Inserted {} of {} row(s) into {}", affected, items.len(), def.table);
        }
        Ok(affected)
    }

    /// Apply the non-null mutable fields of `payload` to row `id`
    pub async fn update(&self, resource: &str, id: i64, payload: &Value) -> Result<u64, CrudError> {
        let def = Registry::lookup(resource)?;
        let payload = as_object(payload, None)?;

        let mut assignments = Vec::new();
        for field in def.mutable_fields() {
            match column(payload, field.name) {
                Some(value) if !value.is_null() => {
                    check_type(field, value)?;
                    assignments.push((field, self.prepare(field, value.clone())?));
                }
                _ => {}
            }
        }
        if assignments.is_empty() {
            return Err(CrudError::invalid("No fields to update"));
        }

        let affected = self.store.execute(&sql::update(def, assignments, id)).await?;
        if affected == 0 {
            return Err(CrudError::NotFound { label: def.label, id });
        }
        Ok(affected)
    }

    pub async fn delete(&self, resource: &str, id: i64) -> Result<u64, CrudError> {
        let def = Registry::lookup(resource)?;
        let affected = self.store.execute(&sql::delete(def, id)).await?;
        if affected == 0 {
            return Err(CrudError::NotFound { label: def.label, id });
        }
        Ok(affected)
    }

    fn prepare(&self, field: &FieldDef, value: Value) -> Result<Value, CrudError> {
        if !field.secret {
            return Ok(value);
        }
        let plain = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Value::String(bcrypt::hash(plain, self.hash_cost)?))
    }
}

fn validate_item(def: &ResourceDef, item: &Map<String, Value>, index: Option<usize>) -> Result<(), CrudError> {
    for field in def.required_fields() {
        match column(item, field.name) {
            Some(value) if !is_blank(value) => check_type(field, value)?,
            _ => return Err(CrudError::missing(field.name, index)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ColumnType;
    use crate::testing::RecordingStore;
    use serde_json::json;

    const COST: u32 = 4;

    fn engine(store: &RecordingStore) -> CrudEngine<'_> {
        CrudEngine::new(store).with_hash_cost(COST)
    }

    fn sample(field: &FieldDef) -> Value {
        match field.column_type {
            ColumnType::Text => json!("X"),
            ColumnType::Integer => json!(1),
            ColumnType::Numeric => json!(9.5),
            ColumnType::Date => json!("2024-03-01"),
            ColumnType::Timestamp => json!("2024-03-01 10:00:00"),
        }
    }

    fn complete_payload(def: &ResourceDef) -> Value {
        let mut map = Map::new();
        for field in def.required_fields() {
            map.insert(field.name.to_string(), sample(field));
        }
        Value::Object(map)
    }

    #[tokio::test]
    async fn create_rejects_any_missing_required_field() {
        for def in Registry::all() {
            for missing in def.required_fields() {
                let store = RecordingStore::new();
                let mut payload = complete_payload(def);
                payload.as_object_mut().unwrap().remove(missing.name);

                let err = engine(&store).create(def.name, &payload).await.unwrap_err();
                match err {
                    CrudError::Validation { field, .. } => assert_eq!(field.as_deref(), Some(missing.name)),
                    other => panic!("expected validation error, got {other:?}"),
                }
                assert!(store.statements().is_empty(), "{} touched the store", def.name);
            }
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_values() {
        let store = RecordingStore::new();
        let err = engine(&store)
            .create("countries", &json!({"Country_Name": "  ", "Country_Code": "WK"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CrudError::Validation { .. }));
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn create_single_matches_keys_case_insensitively() {
        let store = RecordingStore::new();
        let inserted = engine(&store)
            .create("countries", &json!({"country_name": "Wakanda", "country_code": "WK"}))
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        let statements = store.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].query.starts_with("INSERT INTO \"Countries\""));
        assert_eq!(statements[0].params, vec![json!("Wakanda"), json!("WK")]);
    }

    #[tokio::test]
    async fn create_bulk_is_one_statement() {
        let store = RecordingStore::new();
        store.push_affected(2);
        let payload = json!([
            {"role_code": "MGR", "role_description": "Manager"},
            {"Role_Code": "EMP", "Role_Description": "Employee", "extra": true}
        ]);

        assert_eq!(engine(&store).create("roles", &payload).await.unwrap(), 2);
        let statements = store.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].params.len(), 4);
    }

    #[tokio::test]
    async fn create_bulk_rejects_whole_batch_on_one_bad_item() {
        let store = RecordingStore::new();
        let payload = json!([
            {"role_code": "MGR", "role_description": "Manager"},
            {"role_code": "EMP"}
        ]);

        let err = engine(&store).create("roles", &payload).await.unwrap_err();
        assert!(err.to_string().contains("item 1"), "{err}");
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn create_empty_batch_inserts_nothing() {
        let store = RecordingStore::new();
        assert_eq!(engine(&store).create("permission_levels", &json!([])).await.unwrap(), 0);
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn create_accepts_complete_payload_for_every_resource() {
        for def in Registry::all() {
            let store = RecordingStore::new();
            assert_eq!(engine(&store).create(def.name, &complete_payload(def)).await.unwrap(), 1, "{}", def.name);
        }
    }

    #[tokio::test]
    async fn create_reports_affected_count() {
        let store = RecordingStore::new();
        store.push_affected(1);
        let payload = json!([
            {"role_code": "MGR", "role_description": "Manager"},
            {"role_code": "EMP", "role_description": "Employee"}
        ]);
        assert_eq!(engine(&store).create("roles", &payload).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn values_must_fit_column_type() {
        let store = RecordingStore::new();
        let message = json!({
            "msg_from_person_id": "abc",
            "msg_to_person_id": 2,
            "date_message_sent": "2024-03-01 10:00:00",
            "message_subject": "Hi",
            "message_text": "Hello"
        });
        match engine(&store).create("internal_messages", &message).await.unwrap_err() {
            CrudError::Validation { message, field } => {
                assert_eq!(field.as_deref(), Some("msg_from_person_id"));
                assert!(message.contains("integer"), "{message}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = engine(&store)
            .update("payments", 1, &json!({"payment_date": "next tuesday"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CrudError::Validation { .. }));

        let err = engine(&store)
            .create("payments", &json!({"amount": "lots", "payment_date": "2024-03-01", "payment_method": "Cash"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CrudError::Validation { .. }));
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_non_object_payloads() {
        let store = RecordingStore::new();
        assert!(matches!(
            engine(&store).create("roles", &json!("MGR")).await,
            Err(CrudError::Validation { .. })
        ));
        assert!(matches!(
            engine(&store).create("roles", &json!([1, 2])).await,
            Err(CrudError::Validation { .. })
        ));
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn create_hashes_person_password() {
        let store = RecordingStore::new();
        let payload = json!({
            "Permission_Level_Code": "READ",
            "Login_Name": "testuser",
            "Password": "password123",
            "Personal_Details": "Test User",
            "Other_Details": "None",
            "Country_Name": "US",
            "Role_Description": "USER"
        });

        engine(&store).create("people", &payload).await.unwrap();
        let params = &store.statements()[0].params;
        let stored = params[2].as_str().unwrap();
        assert_ne!(stored, "password123");
        assert!(bcrypt::verify("password123", stored).unwrap());
    }

    #[tokio::test]
    async fn create_propagates_store_failure() {
        let store = RecordingStore::new();
        store.fail_next_execute("duplicate key value violates unique constraint");
        let err = engine(&store)
            .create("permission_levels", &json!({"Permission_Level_Code": "ADM", "Permission_Level_Description": "Admin"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CrudError::Store(_)));
    }

    #[tokio::test]
    async fn update_builds_set_from_non_null_mutable_fields() {
        let store = RecordingStore::new();
        store.push_affected(1);
        let payload = json!({"Login_Name": "alice", "Other_Details": null, "Person_ID": 5, "bogus": "x"});

        engine(&store).update("people", 12, &payload).await.unwrap();
        let stmt = &store.statements()[0];
        assert_eq!(
            stmt.query,
            "UPDATE \"People\" SET \"Login_Name\" = CAST($1 AS text) WHERE \"Person_ID\" = $2"
        );
        assert_eq!(stmt.params, vec![json!("alice"), json!(12)]);
    }

    #[tokio::test]
    async fn update_without_fields_never_reaches_store() {
        let store = RecordingStore::new();
        let err = engine(&store).update("countries", 1, &json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "No fields to update");

        let err = engine(&store)
            .update("countries", 1, &json!({"Country_ID": 3, "unknown": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CrudError::Validation { .. }));
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_on_missing_row_are_not_found() {
        for def in Registry::all() {
            let store = RecordingStore::new();
            store.push_affected(0);
            store.push_affected(0);
            let field = def.mutable_fields().next().unwrap();

            let err = engine(&store)
                .update(def.name, 999, &json!({ field.name: sample(field) }))
                .await
                .unwrap_err();
            assert!(matches!(err, CrudError::NotFound { id: 999, .. }), "{}: {err:?}", def.name);

            let err = engine(&store).delete(def.name, 999).await.unwrap_err();
            assert!(matches!(err, CrudError::NotFound { id: 999, .. }), "{}: {err:?}", def.name);
        }
    }

    #[tokio::test]
    async fn delete_reports_affected_rows() {
        let store = RecordingStore::new();
        store.push_affected(1);
        assert_eq!(engine(&store).delete("payments", 4).await.unwrap(), 1);
        assert_eq!(store.statements()[0].params, vec![json!(4)]);
    }

    #[tokio::test]
    async fn list_returns_rows_and_empty_tables() {
        let store = RecordingStore::new();
        store.push_rows(vec![json!({"Country_ID": 1, "Country_Name": "Test Country", "Country_Code": "TC"})]);

        let rows = engine(&store).list("countries").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Country_Name"], "Test Country");

        assert!(engine(&store).list("countries").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_propagates_store_failure() {
        let store = RecordingStore::new();
        store.fail_next_fetch("Database error");
        assert!(matches!(engine(&store).list("payments").await, Err(CrudError::Store(_))));
    }

    #[tokio::test]
    async fn unknown_resource_fails_everywhere() {
        let store = RecordingStore::new();
        let e = engine(&store);
        assert!(matches!(e.list("actors").await, Err(CrudError::UnknownResource(_))));
        assert!(matches!(e.create("actors", &json!({})).await, Err(CrudError::UnknownResource(_))));
        assert!(matches!(e.delete("actors", 1).await, Err(CrudError::UnknownResource(_))));
        assert!(matches!(e.validate("actors", &json!({})), Err(CrudError::UnknownResource(_))));
    }

    #[tokio::test]
    async fn find_by_requires_registered_field() {
        let store = RecordingStore::new();
        let err = engine(&store).find_by("people", "ssn", json!("x")).await.unwrap_err();
        assert!(matches!(err, CrudError::Validation { .. }));
        assert!(store.statements().is_empty());
    }
}
