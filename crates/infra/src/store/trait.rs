use std::sync::Arc;

use thiserror::Error;

use super::schema::{FieldValue, ID_FIELD, Record, Table};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The queried/updated field does not exist, is immutable, or the value's
    /// type does not match the declared type.
    #[error("schema error on {table}.{field}: {reason}")]
    Schema {
        table: Table,
        field: String,
        reason: String,
    },

    /// No row matched after a full scan.
    #[error("no row in {table} with {field} == {value}")]
    NotFound {
        table: Table,
        field: String,
        value: String,
    },

    #[error("duplicate id {id} in {table}")]
    DuplicateId { table: Table, id: u64 },

    #[error("could not allocate a free id in {table} after {attempts} attempts")]
    IdsExhausted { table: Table, attempts: u32 },

    /// Backend unreachable or internally broken (retryable).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn schema(table: Table, field: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            table,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(table: Table, field: &str, value: &FieldValue) -> Self {
        Self::NotFound {
            table,
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Lookup-and-mutate store holding items, clients, pickup points and orders.
///
/// The workflow only relies on this contract, never on how rows are laid out:
///
/// - `find` type-checks the queried field against the table schema before
///   scanning (`StoreError::Schema`), returns the first matching row, and fails
///   with `StoreError::NotFound` when nothing matches
/// - `update_fields` validates every change before applying any of them, and
///   applies them atomically with respect to other store calls
/// - `insert` rejects a duplicate primary key
///
/// A linear-scan implementation is fine for the table sizes involved; an
/// indexed backend can be swapped in without touching callers.
pub trait EntityStore: Send + Sync {
    fn find<R: Record>(&self, field: &str, value: &FieldValue) -> StoreResult<R>;

    fn insert<R: Record>(&self, record: R) -> StoreResult<()>;

    fn update_fields<R: Record>(&self, id: R::Id, changes: &[(&str, FieldValue)]) -> StoreResult<R>;

    fn list<R: Record>(&self) -> StoreResult<Vec<R>>;

    /// Drop every row from every table.
    fn reset(&self) -> StoreResult<()>;

    fn get<R: Record>(&self, id: R::Id) -> StoreResult<R> {
        self.find(ID_FIELD, &FieldValue::id(id))
    }

    fn exists<R: Record>(&self, id: R::Id) -> StoreResult<bool> {
        match self.get::<R>(id) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn update_field<R: Record>(&self, id: R::Id, field: &str, value: FieldValue) -> StoreResult<R> {
        self.update_fields::<R>(id, &[(field, value)])
    }
}

impl<S> EntityStore for Arc<S>
where
    S: EntityStore,
{
    fn find<R: Record>(&self, field: &str, value: &FieldValue) -> StoreResult<R> {
        (**self).find(field, value)
    }

    fn insert<R: Record>(&self, record: R) -> StoreResult<()> {
        (**self).insert(record)
    }

    fn update_fields<R: Record>(&self, id: R::Id, changes: &[(&str, FieldValue)]) -> StoreResult<R> {
        (**self).update_fields::<R>(id, changes)
    }

    fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        (**self).list()
    }

    fn reset(&self) -> StoreResult<()> {
        (**self).reset()
    }
}
