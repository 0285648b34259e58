use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rentpoint_core::{Entity, EntityId};

use super::r#trait::{EntityStore, StoreError, StoreResult};
use super::schema::{FieldSpec, FieldValue, ID_FIELD, Record, Row, Table};

/// In-memory entity store.
///
/// Rows are kept per table in insertion order and found by linear scan.
/// Intended for tests/dev and small deployments. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

type Tables = HashMap<Table, Vec<Row>>;

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: Table) -> StoreResult<usize> {
        Ok(self.read()?.get(&table).map_or(0, Vec::len))
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

/// Index of the first row of `R` whose `spec` field equals `value`.
fn position<R: Record>(rows: &[Row], spec: &FieldSpec<R>, value: &FieldValue) -> Option<usize> {
    rows.iter()
        .position(|row| R::from_row(row).is_some_and(|r| spec.read(r) == *value))
}

impl EntityStore for InMemoryEntityStore {
    fn find<R: Record>(&self, field: &str, value: &FieldValue) -> StoreResult<R> {
        let spec = R::field(field)?;
        spec.check(value)?;

        let tables = self.read()?;
        let rows = tables.get(&R::TABLE).map(Vec::as_slice).unwrap_or_default();

        position(rows, spec, value)
            .and_then(|idx| R::from_row(&rows[idx]))
            .cloned()
            .ok_or_else(|| StoreError::not_found(R::TABLE, field, value))
    }

    fn insert<R: Record>(&self, record: R) -> StoreResult<()> {
        let id = record.id();
        let mut tables = self.write()?;
        let rows = tables.entry(R::TABLE).or_default();

        if rows.iter().filter_map(R::from_row).any(|r| r.id() == id) {
            return Err(StoreError::DuplicateId {
                table: R::TABLE,
                id: id.get(),
            });
        }

        rows.push(record.into_row());
        Ok(())
    }

    fn update_fields<R: Record>(&self, id: R::Id, changes: &[(&str, FieldValue)]) -> StoreResult<R> {
        // Validate everything up front: a rejected change leaves the row untouched.
        let mut specs = Vec::with_capacity(changes.len());
        for (name, value) in changes {
            let spec = R::field(name)?;
            if !spec.is_mutable() {
                return Err(StoreError::schema(R::TABLE, name, "field is immutable"));
            }
            spec.check(value)?;
            specs.push((spec, value));
        }

        let id_spec = R::field(ID_FIELD)?;
        let key = FieldValue::id(id);

        let mut tables = self.write()?;
        let rows = tables.entry(R::TABLE).or_default();
        let idx = position(rows, id_spec, &key).ok_or_else(|| StoreError::not_found(R::TABLE, ID_FIELD, &key))?;

        let current = R::from_row_mut(&mut rows[idx])
            .ok_or_else(|| StoreError::Unavailable(format!("corrupt row in {}", R::TABLE)))?;

        // Apply to a copy and swap it in, so a failed write cannot leave a half-updated row.
        let mut updated = current.clone();
        for (spec, value) in specs {
            spec.write(&mut updated, value)?;
        }
        *current = updated.clone();

        Ok(updated)
    }

    fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        let tables = self.read()?;
        Ok(tables
            .get(&R::TABLE)
            .map(|rows| rows.iter().filter_map(R::from_row).cloned().collect())
            .unwrap_or_default())
    }

    fn reset(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }
}
