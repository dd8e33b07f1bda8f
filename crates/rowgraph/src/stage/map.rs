use crate::{
    error::Error,
    record::Record,
    stage::Mapper,
    stream::{BoxedRecordStream, RecordStream},
};
use std::{collections::VecDeque, rc::Rc};

///
/// MapStream
///
/// Applies the mapper to each input record and concatenates the per-record
/// outputs, preserving input order.
///

pub struct MapStream {
    mapper: Rc<dyn Mapper>,
    input: BoxedRecordStream,
    pending: VecDeque<Record>,
}

impl MapStream {
    #[must_use]
    pub fn new(mapper: Rc<dyn Mapper>, input: BoxedRecordStream) -> Self {
        Self {
            mapper,
            input,
            pending: VecDeque::new(),
        }
    }
}

impl RecordStream for MapStream {
    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }

            match self.input.next_record()? {
                Some(record) => self.pending.extend(self.mapper.map(record)?),
                None => return Ok(None),
            }
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{
        error::Error,
        record,
        record::Record,
        stage::{Mapper, map::MapStream},
        stream::{self, VecStream},
    };
    use std::rc::Rc;

    struct Duplicate;

    impl Mapper for Duplicate {
        fn map(&self, record: Record) -> Result<Vec<Record>, Error> {
            Ok(vec![record.clone(), record])
        }
    }

    struct DropAll;

    impl Mapper for DropAll {
        fn map(&self, _: Record) -> Result<Vec<Record>, Error> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn fan_out_preserves_input_order() {
        let input = VecStream::new(vec![record! { "n" => 1 }, record! { "n" => 2 }]);
        let mut stage = MapStream::new(Rc::new(Duplicate), Box::new(input));

        let out = stream::drain(&mut stage).expect("drain");
        assert_eq!(
            out,
            vec![
                record! { "n" => 1 },
                record! { "n" => 1 },
                record! { "n" => 2 },
                record! { "n" => 2 },
            ]
        );
    }

    #[test]
    fn empty_mapper_output_filters_rows() {
        let input = VecStream::new(vec![record! { "n" => 1 }]);
        let mut stage = MapStream::new(Rc::new(DropAll), Box::new(input));

        assert!(stream::drain(&mut stage).expect("drain").is_empty());
    }
}
