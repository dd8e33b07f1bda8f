//! Operator stages and the user-pluggable transformer contracts.
//!
//! Every stage is a lazy `RecordStream` wrapped around its input stream;
//! nothing runs until the final consumer pulls.

pub mod group;
pub mod join;
pub mod map;
pub mod reduce;
pub mod sort;

use crate::{error::Error, key::KeyTuple, record::Record, stream::RecordStream};

///
/// Mapper
///
/// Pure per-row transformer: one input record, zero or more output records.
/// Emitting nothing filters the row; emitting several forks it. Mappers may
/// not retain state across rows.
///

pub trait Mapper {
    fn map(&self, record: Record) -> Result<Vec<Record>, Error>;
}

///
/// Reducer
///
/// Per-group transformer. The group is delivered as a single-pass stream of
/// key-equal records; the engine guarantees it is non-empty and drains any
/// remainder the reducer leaves unread. Reducer output must not depend on
/// intra-group order.
///

pub trait Reducer {
    fn reduce(&self, keys: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error>;
}

///
/// Joiner
///
/// Per-keyed-pair transformer. The left group streams through; the right
/// group arrives fully buffered. At least one side is non-empty; each joiner
/// decides what the empty-side case emits.
///

pub trait Joiner {
    fn join(
        &self,
        keys: &KeyTuple,
        left: &mut dyn RecordStream,
        right: &[Record],
    ) -> Result<Vec<Record>, Error>;
}
