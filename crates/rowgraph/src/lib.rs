//! Declarative computational graphs for batch table transformations.
//!
//! A pipeline over streams of schema-less records is described with a small
//! operator algebra — map, reduce, sort, join — and executed against named
//! input sources. Reduce and join run in a single pass over key-sorted
//! streams; sort spills to disk when its input outgrows one in-memory run.
//! Execution is single-threaded cooperative pull: the final consumer drags
//! records back through the stage chain one at a time.

// public exports are one module level down
pub mod error;
pub mod graph;
pub mod key;
pub mod ops;
pub mod record;
pub mod stage;
pub mod stream;
pub mod value;

///
/// Prelude
///
/// Prelude contains only pipeline vocabulary; operators and stream
/// machinery are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        error::Error,
        graph::{Graph, Inputs, json_line_parser},
        key::KeyTuple,
        record::Record,
        value::Value,
    };
}
