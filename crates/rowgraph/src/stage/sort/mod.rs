pub mod spill;

use crate::{
    error::Error,
    key::KeyTuple,
    record::Record,
    stage::sort::spill::{SpillReader, SpillWriter},
    stream::{BoxedRecordStream, RecordStream},
    value::Value,
};
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    mem,
};
use tracing::debug;

/// Records buffered in memory before a run is spilled to disk.
pub const DEFAULT_RUN_SIZE: usize = 65_536;

///
/// SortConfig
///

#[derive(Clone, Copy, Debug)]
pub struct SortConfig {
    pub run_size: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            run_size: DEFAULT_RUN_SIZE,
        }
    }
}

///
/// SortStream
///
/// External sort by a key tuple. Input is accumulated into runs of at most
/// `run_size` records; each full run is sorted and spilled, and the spilled
/// runs are merged through a min-heap. When everything fits in one run the
/// sort stays in memory and nothing touches disk.
///
/// The sort is stable: ties in the key tuple preserve input order, both
/// inside a run (stable in-memory sort) and across runs (runs are created
/// in input order and the merge breaks key ties by run index).
///
/// Ingestion is deferred until the first pull so that building a pipeline
/// never consumes its input.
///

pub struct SortStream {
    keys: KeyTuple,
    config: SortConfig,
    state: State,
}

enum State {
    Pending(BoxedRecordStream),
    InMemory(std::vec::IntoIter<Record>),
    Merging(KWayMerge),
}

impl SortStream {
    #[must_use]
    pub fn new(keys: KeyTuple, config: SortConfig, input: BoxedRecordStream) -> Self {
        Self {
            keys,
            config,
            state: State::Pending(input),
        }
    }

    /// Drain the input into sorted runs and pick the emit path.
    fn ingest(&mut self) -> Result<(), Error> {
        let placeholder = State::InMemory(Vec::new().into_iter());
        let State::Pending(mut input) = mem::replace(&mut self.state, placeholder) else {
            return Ok(());
        };

        let run_size = self.config.run_size.max(1);
        let mut buffer: Vec<(Vec<Value>, Record)> = Vec::new();
        let mut runs: Vec<SpillReader> = Vec::new();

        while let Some(record) = input.next_record()? {
            let key = self.keys.project(&record)?;
            buffer.push((key, record));
            if buffer.len() >= run_size {
                runs.push(spill_sorted_run(&mut buffer)?);
            }
        }

        if runs.is_empty() {
            sort_run(&mut buffer);
            debug!(records = buffer.len(), "sort held a single in-memory run");
            let records: Vec<Record> = buffer.into_iter().map(|(_, record)| record).collect();
            self.state = State::InMemory(records.into_iter());
        } else {
            if !buffer.is_empty() {
                runs.push(spill_sorted_run(&mut buffer)?);
            }
            debug!(runs = runs.len(), "sort merging spilled runs");
            self.state = State::Merging(KWayMerge::new(self.keys.clone(), runs)?);
        }

        Ok(())
    }
}

impl RecordStream for SortStream {
    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        loop {
            match &mut self.state {
                State::Pending(_) => self.ingest()?,
                State::InMemory(records) => return Ok(records.next()),
                State::Merging(merge) => return merge.next_record(),
            }
        }
    }
}

fn sort_run(buffer: &mut [(Vec<Value>, Record)]) {
    buffer.sort_by(|(left, _), (right, _)| KeyTuple::compare_projected(left, right));
}

fn spill_sorted_run(buffer: &mut Vec<(Vec<Value>, Record)>) -> Result<SpillReader, Error> {
    sort_run(buffer);

    let mut writer = SpillWriter::create()?;
    for (_, record) in buffer.iter() {
        writer.write_record(record)?;
    }
    buffer.clear();

    Ok(writer.into_reader()?)
}

///
/// KWayMerge
///
/// Merges sorted runs through a min-heap keyed by (key values, run index).
/// Each run contributes at most one buffered head record.
///

struct KWayMerge {
    keys: KeyTuple,
    runs: Vec<SpillReader>,
    heap: BinaryHeap<Reverse<MergeEntry>>,
}

impl KWayMerge {
    fn new(keys: KeyTuple, mut runs: Vec<SpillReader>) -> Result<Self, Error> {
        let mut heap = BinaryHeap::with_capacity(runs.len());
        for (run, reader) in runs.iter_mut().enumerate() {
            if let Some(record) = reader.read_record()? {
                let key = keys.project(&record)?;
                heap.push(Reverse(MergeEntry { key, run, record }));
            }
        }

        Ok(Self { keys, runs, heap })
    }

    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        let Some(Reverse(entry)) = self.heap.pop() else {
            return Ok(None);
        };

        if let Some(record) = self.runs[entry.run].read_record()? {
            let key = self.keys.project(&record)?;
            self.heap.push(Reverse(MergeEntry {
                key,
                run: entry.run,
                record,
            }));
        }

        Ok(Some(entry.record))
    }
}

///
/// MergeEntry
///

struct MergeEntry {
    key: Vec<Value>,
    run: usize,
    record: Record,
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        KeyTuple::compare_projected(&self.key, &other.key).then_with(|| self.run.cmp(&other.run))
    }
}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{
        error::Error,
        key::KeyTuple,
        record,
        record::Record,
        stage::sort::{SortConfig, SortStream},
        stream::{self, VecStream},
    };

    fn sort_rows(rows: Vec<Record>, keys: KeyTuple, run_size: usize) -> Vec<Record> {
        let mut stage = SortStream::new(
            keys,
            SortConfig { run_size },
            Box::new(VecStream::new(rows)),
        );

        stream::drain(&mut stage).expect("sort")
    }

    fn words() -> Vec<Record> {
        vec![
            record! { "doc_id" => 1, "text" => "hello" },
            record! { "doc_id" => 1, "text" => "my" },
            record! { "doc_id" => 1, "text" => "little" },
            record! { "doc_id" => 1, "text" => "world" },
            record! { "doc_id" => 2, "text" => "hello" },
            record! { "doc_id" => 2, "text" => "my" },
            record! { "doc_id" => 2, "text" => "little" },
            record! { "doc_id" => 2, "text" => "little" },
            record! { "doc_id" => 2, "text" => "hell" },
        ]
    }

    fn expected_by_text() -> Vec<Record> {
        vec![
            record! { "doc_id" => 2, "text" => "hell" },
            record! { "doc_id" => 1, "text" => "hello" },
            record! { "doc_id" => 2, "text" => "hello" },
            record! { "doc_id" => 1, "text" => "little" },
            record! { "doc_id" => 2, "text" => "little" },
            record! { "doc_id" => 2, "text" => "little" },
            record! { "doc_id" => 1, "text" => "my" },
            record! { "doc_id" => 2, "text" => "my" },
            record! { "doc_id" => 1, "text" => "world" },
        ]
    }

    #[test]
    fn in_memory_sort_is_stable_on_ties() {
        let sorted = sort_rows(words(), KeyTuple::from(["text"]), 1024);
        assert_eq!(sorted, expected_by_text());
    }

    #[test]
    fn spilled_sort_matches_in_memory_sort() {
        // run_size 2 forces several spilled runs through the merge path
        let sorted = sort_rows(words(), KeyTuple::from(["text"]), 2);
        assert_eq!(sorted, expected_by_text());
    }

    #[test]
    fn compound_key_sorts_field_by_field() {
        let rows = vec![
            record! { "count" => 2, "text" => "my" },
            record! { "count" => 1, "text" => "world" },
            record! { "count" => 2, "text" => "hello" },
            record! { "count" => 1, "text" => "hell" },
        ];

        let sorted = sort_rows(rows, KeyTuple::from(["count", "text"]), 1024);
        assert_eq!(
            sorted,
            vec![
                record! { "count" => 1, "text" => "hell" },
                record! { "count" => 1, "text" => "world" },
                record! { "count" => 2, "text" => "hello" },
                record! { "count" => 2, "text" => "my" },
            ]
        );
    }

    #[test]
    fn missing_key_field_fails_at_offending_record() {
        let rows = vec![record! { "text" => "a" }, record! { "other" => 1 }];
        let mut stage = SortStream::new(
            KeyTuple::from(["text"]),
            SortConfig::default(),
            Box::new(VecStream::new(rows)),
        );

        let err = stream::drain(&mut stage).expect_err("sort should fail");
        assert!(matches!(err, Error::MissingField { field } if field == "text"));
    }

    #[test]
    fn empty_input_sorts_to_empty_output() {
        let sorted = sort_rows(Vec::new(), KeyTuple::from(["text"]), 4);
        assert!(sorted.is_empty());
    }
}
