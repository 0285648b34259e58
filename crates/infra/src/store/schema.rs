//! Table schemas: typed per-table field accessors.
//!
//! Each record type declares one static table of [`FieldSpec`]s, built once.
//! A spec names a field, declares its type and nullability, and carries plain
//! function pointers that read or write that field. Lookups and updates go
//! through the spec table, so adding a field means adding one entry here.

use chrono::{DateTime, Utc};

use rentpoint_core::{ClientId, Entity, EntityId, ItemId, OrderId, PickupPointId};
use rentpoint_rental::{CancelReason, Client, Item, Order, OrderStatus, PickupPoint};

use super::r#trait::StoreError;

/// Name of the primary-key field in every table.
pub const ID_FIELD: &str = "id";

/// Tables held by the entity store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Table {
    Items,
    Clients,
    PickupPoints,
    Orders,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Items, Table::Clients, Table::PickupPoints, Table::Orders];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Items => "items",
            Table::Clients => "clients",
            Table::PickupPoints => "pickup_points",
            Table::Orders => "orders",
        }
    }

    /// Dense index, for per-table arrays.
    pub fn index(self) -> usize {
        match self {
            Table::Items => 0,
            Table::Clients => 1,
            Table::PickupPoints => 2,
            Table::Orders => 3,
        }
    }
}

impl core::fmt::Display for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldType {
    Id,
    UInt,
    Text,
    Bool,
    Timestamp,
    Status,
    Reason,
}

/// A dynamically-typed field value used in store queries and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Id(u64),
    UInt(u64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Status(OrderStatus),
    Reason(CancelReason),
    Null,
}

impl FieldValue {
    /// Type of the value; `None` for `Null`.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Id(_) => Some(FieldType::Id),
            FieldValue::UInt(_) => Some(FieldType::UInt),
            FieldValue::Text(_) => Some(FieldType::Text),
            FieldValue::Bool(_) => Some(FieldType::Bool),
            FieldValue::Timestamp(_) => Some(FieldType::Timestamp),
            FieldValue::Status(_) => Some(FieldType::Status),
            FieldValue::Reason(_) => Some(FieldType::Reason),
            FieldValue::Null => None,
        }
    }

    pub fn id<I: EntityId>(id: I) -> Self {
        FieldValue::Id(id.get())
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(t) => Some(t.clone()),
            _ => None,
        }
    }

    fn as_uint(&self) -> Option<u64> {
        match self {
            FieldValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    fn as_id<I: EntityId>(&self) -> Option<I> {
        match self {
            FieldValue::Id(raw) => I::from_raw(*raw),
            _ => None,
        }
    }

    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// `Some(None)` for `Null`, `Some(Some(v))` for a matching value.
    fn nullable<T>(&self, inner: impl FnOnce(&Self) -> Option<T>) -> Option<Option<T>> {
        match self {
            FieldValue::Null => Some(None),
            other => inner(other).map(Some),
        }
    }
}

impl core::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FieldValue::Id(v) | FieldValue::UInt(v) => write!(f, "{v}"),
            FieldValue::Text(t) => write!(f, "{t:?}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            FieldValue::Status(s) => write!(f, "{s}"),
            FieldValue::Reason(r) => write!(f, "{r}"),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

macro_rules! id_field_value {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Id(value.get())
            }
        })*
    };
}

id_field_value!(ItemId, ClientId, PickupPointId, OrderId);

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::UInt(u64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<OrderStatus> for FieldValue {
    fn from(value: OrderStatus) -> Self {
        FieldValue::Status(value)
    }
}

impl From<CancelReason> for FieldValue {
    fn from(value: CancelReason) -> Self {
        FieldValue::Reason(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

type Getter<R> = fn(&R) -> FieldValue;
type Setter<R> = fn(&mut R, &FieldValue) -> Option<()>;

/// One column of a table: name, declared type and typed accessors.
pub struct FieldSpec<R> {
    pub name: &'static str,
    pub ty: FieldType,
    pub nullable: bool,
    get: Getter<R>,
    /// `None` for immutable fields.
    set: Option<Setter<R>>,
}

impl<R> core::fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("nullable", &self.nullable)
            .field("mutable", &self.set.is_some())
            .finish()
    }
}

impl<R: Record> FieldSpec<R> {
    /// Check that `value` may be compared with / stored in this field.
    pub fn check(&self, value: &FieldValue) -> Result<(), StoreError> {
        match value.field_type() {
            None if self.nullable => Ok(()),
            None => Err(StoreError::schema(R::TABLE, self.name, "field is not nullable")),
            Some(ty) if ty == self.ty => Ok(()),
            Some(ty) => Err(StoreError::schema(
                R::TABLE,
                self.name,
                format!("expected {:?}, got {ty:?}", self.ty),
            )),
        }
    }

    pub fn read(&self, record: &R) -> FieldValue {
        (self.get)(record)
    }

    /// Write a value that has already passed [`FieldSpec::check`].
    pub fn write(&self, record: &mut R, value: &FieldValue) -> Result<(), StoreError> {
        let set = self
            .set
            .ok_or_else(|| StoreError::schema(R::TABLE, self.name, "field is immutable"))?;
        set(record, value).ok_or_else(|| StoreError::schema(R::TABLE, self.name, format!("cannot store {value}")))
    }

    pub fn is_mutable(&self) -> bool {
        self.set.is_some()
    }
}

/// A row in some table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Item(Item),
    Client(Client),
    PickupPoint(PickupPoint),
    Order(Order),
}

/// A type that can be stored in the entity store.
pub trait Record: Entity + Clone + Send + Sync + 'static {
    const TABLE: Table;

    /// The table schema (one entry per field, built once).
    fn fields() -> &'static [FieldSpec<Self>];

    fn into_row(self) -> Row;

    fn from_row(row: &Row) -> Option<&Self>;

    fn from_row_mut(row: &mut Row) -> Option<&mut Self>;

    /// Look up a field spec by name.
    fn field(name: &str) -> Result<&'static FieldSpec<Self>, StoreError> {
        Self::fields()
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| StoreError::schema(Self::TABLE, name, "no such field"))
    }
}

static ITEM_FIELDS: [FieldSpec<Item>; 7] = [
    FieldSpec {
        name: ID_FIELD,
        ty: FieldType::Id,
        nullable: false,
        get: |r: &Item| r.id.into(),
        set: None,
    },
    FieldSpec {
        name: "description",
        ty: FieldType::Text,
        nullable: false,
        get: |r: &Item| r.description.as_str().into(),
        set: None,
    },
    FieldSpec {
        name: "hourly_price",
        ty: FieldType::UInt,
        nullable: false,
        get: |r: &Item| r.hourly_price.into(),
        set: None,
    },
    FieldSpec {
        name: "is_available_now",
        ty: FieldType::Bool,
        nullable: false,
        get: |r: &Item| r.is_available_now.into(),
        set: Some(|r: &mut Item, v: &FieldValue| {
            r.is_available_now = v.as_bool()?;
            Some(())
        }),
    },
    FieldSpec {
        name: "current_pickup_point_id",
        ty: FieldType::Id,
        nullable: false,
        get: |r: &Item| r.current_pickup_point_id.into(),
        set: None,
    },
    FieldSpec {
        name: "reserved_until",
        ty: FieldType::Timestamp,
        nullable: true,
        get: |r: &Item| r.reserved_until.into(),
        set: Some(|r: &mut Item, v: &FieldValue| {
            r.reserved_until = v.nullable(FieldValue::as_timestamp)?;
            Some(())
        }),
    },
    FieldSpec {
        name: "reserved_by",
        ty: FieldType::Id,
        nullable: true,
        get: |r: &Item| r.reserved_by.into(),
        set: Some(|r: &mut Item, v: &FieldValue| {
            r.reserved_by = v.nullable(FieldValue::as_id::<OrderId>)?;
            Some(())
        }),
    },
];

static CLIENT_FIELDS: [FieldSpec<Client>; 4] = [
    FieldSpec {
        name: ID_FIELD,
        ty: FieldType::Id,
        nullable: false,
        get: |r: &Client| r.id.into(),
        set: None,
    },
    FieldSpec {
        name: "name",
        ty: FieldType::Text,
        nullable: false,
        get: |r: &Client| r.name.as_str().into(),
        set: None,
    },
    FieldSpec {
        name: "phone",
        ty: FieldType::Text,
        nullable: false,
        get: |r: &Client| r.phone.as_str().into(),
        set: None,
    },
    FieldSpec {
        name: "email",
        ty: FieldType::Text,
        nullable: false,
        get: |r: &Client| r.email.as_str().into(),
        set: None,
    },
];

static PICKUP_POINT_FIELDS: [FieldSpec<PickupPoint>; 3] = [
    FieldSpec {
        name: ID_FIELD,
        ty: FieldType::Id,
        nullable: false,
        get: |r: &PickupPoint| r.id.into(),
        set: None,
    },
    FieldSpec {
        name: "address",
        ty: FieldType::Text,
        nullable: false,
        get: |r: &PickupPoint| r.address.as_str().into(),
        set: None,
    },
    FieldSpec {
        name: "is_active",
        ty: FieldType::Bool,
        nullable: false,
        get: |r: &PickupPoint| r.is_active.into(),
        set: None,
    },
];

static ORDER_FIELDS: [FieldSpec<Order>; 10] = [
    FieldSpec {
        name: ID_FIELD,
        ty: FieldType::Id,
        nullable: false,
        get: |r: &Order| r.id.into(),
        set: None,
    },
    FieldSpec {
        name: "client_id",
        ty: FieldType::Id,
        nullable: false,
        get: |r: &Order| r.client_id.into(),
        set: None,
    },
    FieldSpec {
        name: "item_id",
        ty: FieldType::Id,
        nullable: false,
        get: |r: &Order| r.item_id.into(),
        set: None,
    },
    FieldSpec {
        name: "pickup_point_id",
        ty: FieldType::Id,
        nullable: false,
        get: |r: &Order| r.pickup_point_id.into(),
        set: None,
    },
    FieldSpec {
        name: "rental_duration_hours",
        ty: FieldType::UInt,
        nullable: false,
        get: |r: &Order| r.rental_duration_hours.into(),
        set: None,
    },
    FieldSpec {
        name: "status",
        ty: FieldType::Status,
        nullable: false,
        get: |r: &Order| r.status.into(),
        set: Some(|r: &mut Order, v: &FieldValue| {
            r.status = match v {
                FieldValue::Status(s) => *s,
                _ => return None,
            };
            Some(())
        }),
    },
    FieldSpec {
        name: "cancel_reason",
        ty: FieldType::Reason,
        nullable: true,
        get: |r: &Order| r.cancel_reason.into(),
        set: Some(|r: &mut Order, v: &FieldValue| {
            r.cancel_reason = v.nullable(|v| match v {
                FieldValue::Reason(reason) => Some(*reason),
                _ => None,
            })?;
            Some(())
        }),
    },
    FieldSpec {
        name: "cancel_details",
        ty: FieldType::Text,
        nullable: true,
        get: |r: &Order| r.cancel_details.as_deref().into(),
        set: Some(|r: &mut Order, v: &FieldValue| {
            r.cancel_details = v.nullable(FieldValue::as_text)?;
            Some(())
        }),
    },
    FieldSpec {
        name: "created_at",
        ty: FieldType::Timestamp,
        nullable: false,
        get: |r: &Order| r.created_at.into(),
        set: None,
    },
    FieldSpec {
        name: "updated_at",
        ty: FieldType::Timestamp,
        nullable: false,
        get: |r: &Order| r.updated_at.into(),
        set: Some(|r: &mut Order, v: &FieldValue| {
            r.updated_at = v.as_timestamp()?;
            Some(())
        }),
    },
];

impl Record for Item {
    const TABLE: Table = Table::Items;

    fn fields() -> &'static [FieldSpec<Self>] {
        &ITEM_FIELDS
    }

    fn into_row(self) -> Row {
        Row::Item(self)
    }

    fn from_row(row: &Row) -> Option<&Self> {
        match row {
            Row::Item(r) => Some(r),
            _ => None,
        }
    }

    fn from_row_mut(row: &mut Row) -> Option<&mut Self> {
        match row {
            Row::Item(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for Client {
    const TABLE: Table = Table::Clients;

    fn fields() -> &'static [FieldSpec<Self>] {
        &CLIENT_FIELDS
    }

    fn into_row(self) -> Row {
        Row::Client(self)
    }

    fn from_row(row: &Row) -> Option<&Self> {
        match row {
            Row::Client(r) => Some(r),
            _ => None,
        }
    }

    fn from_row_mut(row: &mut Row) -> Option<&mut Self> {
        match row {
            Row::Client(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for PickupPoint {
    const TABLE: Table = Table::PickupPoints;

    fn fields() -> &'static [FieldSpec<Self>] {
        &PICKUP_POINT_FIELDS
    }

    fn into_row(self) -> Row {
        Row::PickupPoint(self)
    }

    fn from_row(row: &Row) -> Option<&Self> {
        match row {
            Row::PickupPoint(r) => Some(r),
            _ => None,
        }
    }

    fn from_row_mut(row: &mut Row) -> Option<&mut Self> {
        match row {
            Row::PickupPoint(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for Order {
    const TABLE: Table = Table::Orders;

    fn fields() -> &'static [FieldSpec<Self>] {
        &ORDER_FIELDS
    }

    fn into_row(self) -> Row {
        Row::Order(self)
    }

    fn from_row(row: &Row) -> Option<&Self> {
        match row {
            Row::Order(r) => Some(r),
            _ => None,
        }
    }

    fn from_row_mut(row: &mut Row) -> Option<&mut Self> {
        match row {
            Row::Order(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_has_an_immutable_id_field() {
        assert!(!Item::field(ID_FIELD).unwrap().is_mutable());
        assert!(!Client::field(ID_FIELD).unwrap().is_mutable());
        assert!(!PickupPoint::field(ID_FIELD).unwrap().is_mutable());
        assert!(!Order::field(ID_FIELD).unwrap().is_mutable());
    }

    #[test]
    fn unknown_field_is_a_schema_error() {
        let err = Item::field("colour").unwrap_err();
        assert!(matches!(err, StoreError::Schema { .. }));
    }

    #[test]
    fn type_check_rejects_mismatch_and_null_on_required_field() {
        let spec = Item::field("is_available_now").unwrap();
        assert!(spec.check(&FieldValue::Bool(true)).is_ok());
        assert!(spec.check(&FieldValue::Text("yes".into())).is_err());
        assert!(spec.check(&FieldValue::Null).is_err());

        let nullable = Item::field("reserved_until").unwrap();
        assert!(nullable.check(&FieldValue::Null).is_ok());
    }

    #[test]
    fn id_key_matches_typed_conversion() {
        let order = OrderId::new(1000).unwrap();
        assert_eq!(FieldValue::id(order), FieldValue::from(order));
        assert!(Order::field(ID_FIELD).unwrap().check(&FieldValue::id(order)).is_ok());
    }

    #[test]
    fn option_converts_to_null() {
        let none: Option<OrderId> = None;
        assert_eq!(FieldValue::from(none), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(true)), FieldValue::Bool(true));
    }
}
