//! Standard mapper/reducer/joiner library.
//!
//! Concrete operator instances configured by column names. Everything here
//! is a plain client of the stage contracts; pipelines combine these with
//! the graph builder.

pub mod joiners;
pub mod mappers;
pub mod reducers;

pub use joiners::{InnerJoiner, JoinSuffixes, LeftJoiner, OuterJoiner, RightJoiner};
pub use mappers::{
    Divide, Filter, FilterPunctuation, HaversineLength, Identity, Idf, LowerCase, Pmi, Product,
    Project, Speed, Split, TravelTime,
};
pub use reducers::{Count, First, Mean, Sum, SumMany, TermFrequency, TopN};

use crate::{error::Error, value::Value};

///
/// Numeric
///
/// Closed arithmetic over Int/Float columns: integers stay integers until a
/// float enters or an overflow forces promotion.
///

#[derive(Clone, Copy, Debug)]
pub(crate) enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub(crate) const ONE: Self = Self::Int(1);

    pub(crate) fn of(field: &str, value: &Value) -> Result<Self, Error> {
        match value {
            Value::Int(v) => Ok(Self::Int(*v)),
            Value::Float(v) => Ok(Self::Float(*v)),
            other => Err(Error::type_mismatch(field, "number", other.kind())),
        }
    }

    pub(crate) fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_add(b)
                .map_or_else(|| Self::Float(a as f64 + b as f64), Self::Int),
            (a, b) => Self::Float(a.widen() + b.widen()),
        }
    }

    pub(crate) fn mul(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_mul(b)
                .map_or_else(|| Self::Float(a as f64 * b as f64), Self::Int),
            (a, b) => Self::Float(a.widen() * b.widen()),
        }
    }

    pub(crate) const fn widen(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    pub(crate) const fn into_value(self) -> Value {
        match self {
            Self::Int(v) => Value::Int(v),
            Self::Float(v) => Value::Float(v),
        }
    }
}
