use crate::{
    error::Error,
    key::KeyTuple,
    record::Record,
    stage::{
        Joiner,
        group::{GroupCursor, PeekableStream, collect_group},
    },
    stream::{BoxedRecordStream, RecordStream, VecStream},
    value::Value,
};
use std::{cmp::Ordering, collections::VecDeque, rc::Rc};

///
/// JoinStream
///
/// Sort-merge join over two streams that are key-sorted by the same tuple.
/// Both sides are grouped by run-length; the walker advances the two group
/// cursors in lock-step:
///
/// - equal keys: deliver (left group, right group), advance both
/// - left key smaller (or right exhausted): deliver (left group, empty),
///   advance left only
/// - otherwise: deliver (empty, right group), advance right only
///
/// The right-hand group is buffered per key; left rows stream through. The
/// joiner decides what unmatched groups emit. Output groups come out in
/// ascending key order of the inputs.
///

pub struct JoinStream {
    joiner: Rc<dyn Joiner>,
    keys: KeyTuple,
    left: PeekableStream,
    right: PeekableStream,
    pending: VecDeque<Record>,
}

impl JoinStream {
    #[must_use]
    pub fn new(
        joiner: Rc<dyn Joiner>,
        keys: KeyTuple,
        left: BoxedRecordStream,
        right: BoxedRecordStream,
    ) -> Self {
        Self {
            joiner,
            keys,
            left: PeekableStream::new(left),
            right: PeekableStream::new(right),
            pending: VecDeque::new(),
        }
    }

    /// Deliver the next keyed pair to the joiner; `Ok(false)` means both
    /// sides are exhausted.
    fn advance(&mut self) -> Result<bool, Error> {
        let left_key = match self.left.peek()? {
            Some(record) => Some(self.keys.project(record)?),
            None => None,
        };
        let right_key = match self.right.peek()? {
            Some(record) => Some(self.keys.project(record)?),
            None => None,
        };

        let side = match (&left_key, &right_key) {
            (None, None) => return Ok(false),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(left), Some(right)) => KeyTuple::compare_projected(left, right),
        };

        let outputs = match side {
            Ordering::Equal => {
                let key = left_key.unwrap_or_default();
                self.deliver_matched(&key)?
            }
            Ordering::Less => {
                let key = left_key.unwrap_or_default();
                self.deliver_left_only(&key)?
            }
            Ordering::Greater => {
                let key = right_key.unwrap_or_default();
                self.deliver_right_only(&key)?
            }
        };
        self.pending.extend(outputs);

        Ok(true)
    }

    fn deliver_matched(&mut self, key: &[Value]) -> Result<Vec<Record>, Error> {
        let right_group = collect_group(&mut self.right, &self.keys, key)?;
        let mut left_group = GroupCursor::new(&mut self.left, &self.keys, key);
        let outputs = self.joiner.join(&self.keys, &mut left_group, &right_group)?;
        left_group.drain_remainder()?;

        Ok(outputs)
    }

    fn deliver_left_only(&mut self, key: &[Value]) -> Result<Vec<Record>, Error> {
        let mut left_group = GroupCursor::new(&mut self.left, &self.keys, key);
        let outputs = self.joiner.join(&self.keys, &mut left_group, &[])?;
        left_group.drain_remainder()?;

        Ok(outputs)
    }

    fn deliver_right_only(&mut self, key: &[Value]) -> Result<Vec<Record>, Error> {
        let right_group = collect_group(&mut self.right, &self.keys, key)?;
        let mut empty_left = VecStream::default();
        let outputs = self.joiner.join(&self.keys, &mut empty_left, &right_group)?;

        Ok(outputs)
    }
}

impl RecordStream for JoinStream {
    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }

            if !self.advance()? {
                return Ok(None);
            }
        }
    }
}

///
/// TESTS
///
