use crate::{
    error::Error,
    key::KeyTuple,
    record::Record,
    stage::{
        Reducer,
        group::{GroupCursor, PeekableStream},
    },
    stream::{BoxedRecordStream, RecordStream},
};
use std::{collections::VecDeque, rc::Rc};

///
/// ReduceStream
///
/// Run-length grouping over a key-sorted input. Walks the input once,
/// closing a group whenever the next record's key differs, and hands each
/// non-empty group to the reducer as a single-pass sub-stream.
///
/// The engine does not validate sortedness: an unsorted input produces one
/// reducer call per maximal key-equal run, which is a caller bug rather
/// than an engine failure. An empty key tuple makes the whole input one
/// group.
///

pub struct ReduceStream {
    reducer: Rc<dyn Reducer>,
    keys: KeyTuple,
    input: PeekableStream,
    pending: VecDeque<Record>,
}

impl ReduceStream {
    #[must_use]
    pub fn new(reducer: Rc<dyn Reducer>, keys: KeyTuple, input: BoxedRecordStream) -> Self {
        Self {
            reducer,
            keys,
            input: PeekableStream::new(input),
            pending: VecDeque::new(),
        }
    }
}

impl RecordStream for ReduceStream {
    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }

            let key = match self.input.peek()? {
                Some(record) => self.keys.project(record)?,
                None => return Ok(None),
            };

            let outputs = {
                let mut group = GroupCursor::new(&mut self.input, &self.keys, &key);
                let outputs = self.reducer.reduce(&self.keys, &mut group)?;
                group.drain_remainder()?;
                outputs
            };
            self.pending.extend(outputs);
        }
    }
}

///
/// TESTS
///
