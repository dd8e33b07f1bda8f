use crate::{
    error::Error,
    key::KeyTuple,
    record::Record,
    stream::{BoxedRecordStream, RecordStream},
    value::Value,
};

///
/// PeekableStream
///
/// One-slot lookahead over a boxed stream. Run-length grouping needs to see
/// the record that closes a group without consuming it.
///

pub(crate) struct PeekableStream {
    inner: BoxedRecordStream,
    peeked: Option<Record>,
}

impl PeekableStream {
    pub(crate) fn new(inner: BoxedRecordStream) -> Self {
        Self {
            inner,
            peeked: None,
        }
    }

    pub(crate) fn peek(&mut self) -> Result<Option<&Record>, Error> {
        if self.peeked.is_none() {
            self.peeked = self.inner.next_record()?;
        }

        Ok(self.peeked.as_ref())
    }
}

impl RecordStream for PeekableStream {
    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        if let Some(record) = self.peeked.take() {
            return Ok(Some(record));
        }

        self.inner.next_record()
    }
}

///
/// GroupCursor
///
/// Single-pass view over one maximal run of key-equal records. Ends when the
/// underlying stream is exhausted or the next record carries a different
/// key; the boundary record stays in the parent stream.
///

pub(crate) struct GroupCursor<'a> {
    stream: &'a mut PeekableStream,
    keys: &'a KeyTuple,
    key: &'a [Value],
    done: bool,
}

impl<'a> GroupCursor<'a> {
    pub(crate) fn new(stream: &'a mut PeekableStream, keys: &'a KeyTuple, key: &'a [Value]) -> Self {
        Self {
            stream,
            keys,
            key,
            done: false,
        }
    }

    /// Consume whatever the reducer or joiner left unread, so the parent
    /// stream is positioned at the next group boundary.
    pub(crate) fn drain_remainder(&mut self) -> Result<(), Error> {
        while self.next_record()?.is_some() {}

        Ok(())
    }
}

impl RecordStream for GroupCursor<'_> {
    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        if self.done {
            return Ok(None);
        }

        let matches = match self.stream.peek()? {
            Some(record) => self.keys.record_matches(self.key, record)?,
            None => false,
        };
        if !matches {
            self.done = true;
            return Ok(None);
        }

        self.stream.next_record()
    }
}

/// Materialize one maximal key-equal run into a vector.
pub(crate) fn collect_group(
    stream: &mut PeekableStream,
    keys: &KeyTuple,
    key: &[Value],
) -> Result<Vec<Record>, Error> {
    let mut cursor = GroupCursor::new(stream, keys, key);
    let mut records = Vec::new();
    while let Some(record) = cursor.next_record()? {
        records.push(record);
    }

    Ok(records)
}

///
/// TESTS
///
