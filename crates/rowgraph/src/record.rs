use crate::{
    error::Error,
    value::{Value, ValueKind},
};
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Record
///
/// One table row: an unordered mapping from field name to dynamically typed
/// value. Records are plain values; cloning one shares nothing mutable with
/// the original.
///
/// Field access comes in two flavors: `get` (via `Deref` to the underlying
/// map) for optional fields, and `field`/`typed` accessors that fail loudly
/// when an operator references a field a record does not carry.
///

#[derive(
    Clone,
    Debug,
    Default,
    Deref,
    DerefMut,
    Deserialize,
    Eq,
    IntoIterator,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct Record {
    #[deref]
    #[deref_mut]
    #[into_iterator(owned, ref)]
    fields: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Required field access; absent fields are a pipeline error.
    pub fn field(&self, name: &str) -> Result<&Value, Error> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::missing_field(name))
    }

    /// Required text field.
    pub fn text_field(&self, name: &str) -> Result<&str, Error> {
        let value = self.field(name)?;
        value
            .as_str()
            .ok_or_else(|| Error::type_mismatch(name, "text", value.kind()))
    }

    /// Required numeric field; integers widen to `f64`.
    pub fn number_field(&self, name: &str) -> Result<f64, Error> {
        let value = self.field(name)?;
        value
            .as_number()
            .ok_or_else(|| Error::type_mismatch(name, "number", value.kind()))
    }

    /// Required list field.
    pub fn list_field(&self, name: &str) -> Result<&[Value], Error> {
        let value = self.field(name)?;
        value
            .as_list()
            .ok_or_else(|| Error::type_mismatch(name, "list", value.kind()))
    }

    /// Fluent insertion, mostly for building derived rows in operators.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.fields.get(name).map(Value::kind)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Record literal, mirroring how rows read in pipeline code:
/// `record! { "doc_id" => 1, "text" => "hello" }`.
#[macro_export]
macro_rules! record {
    () => { $crate::record::Record::new() };
    ( $( $name:expr => $value:expr ),+ $(,)? ) => {{
        let mut record = $crate::record::Record::new();
        $(
            record.insert(($name).to_string(), $crate::value::Value::from($value));
        )+
        record
    }};
}

///
/// TESTS
///
