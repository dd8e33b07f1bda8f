//! Standard per-group operators.
//!
//! Reducers receive each group as a single-pass stream and may buffer it;
//! the ones below that only fold (`Count`, `Sum`, `Mean`) stay O(1) in the
//! group size. Output rows carry the group-key fields plus derived fields.

use crate::{
    error::Error,
    key::KeyTuple,
    ops::Numeric,
    record::Record,
    stage::Reducer,
    stream::RecordStream,
    value::{Value, canonical_cmp},
};
use itertools::Itertools;
use std::collections::BTreeMap;

fn empty_group() -> Error {
    Error::invariant("reducer invoked with an empty group")
}

fn key_fields(keys: &KeyTuple, sample: &Record) -> Result<Record, Error> {
    let mut out = Record::new();
    for name in keys.field_names() {
        out.insert(name.clone(), sample.field(name)?.clone());
    }

    Ok(out)
}

///
/// First
///
/// Yields only the first row of the group.
///

pub struct First;

impl Reducer for First {
    fn reduce(&self, _: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error> {
        let first = group.next_record()?.ok_or_else(empty_group)?;

        Ok(vec![first])
    }
}

///
/// Count
///
/// One row per group: the key fields plus the group size.
///

pub struct Count {
    column: String,
}

impl Count {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Count {
    fn reduce(&self, keys: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error> {
        let sample = group.next_record()?.ok_or_else(empty_group)?;
        let mut count: i64 = 1;
        while group.next_record()?.is_some() {
            count += 1;
        }

        Ok(vec![key_fields(keys, &sample)?.with(self.column.clone(), count)])
    }
}

///
/// TopN
///
/// The n rows with the largest values in a column; ties keep input order.
///

pub struct TopN {
    column: String,
    n: usize,
}

impl TopN {
    #[must_use]
    pub fn new(column: impl Into<String>, n: usize) -> Self {
        Self {
            column: column.into(),
            n,
        }
    }
}

impl Reducer for TopN {
    fn reduce(&self, _: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error> {
        let mut rows: Vec<(Value, Record)> = Vec::new();
        while let Some(record) = group.next_record()? {
            rows.push((record.field(&self.column)?.clone(), record));
        }
        if rows.is_empty() {
            return Err(empty_group());
        }

        let top = rows
            .into_iter()
            .sorted_by(|(left, _), (right, _)| canonical_cmp(right, left))
            .take(self.n)
            .map(|(_, record)| record)
            .collect();

        Ok(top)
    }
}

///
/// TermFrequency
///
/// In-group frequency of each distinct value of a column, divided by the
/// group size. Output rows appear in first-seen order.
///

pub struct TermFrequency {
    words_column: String,
    result_column: String,
}

impl TermFrequency {
    #[must_use]
    pub fn new(words_column: impl Into<String>, result_column: impl Into<String>) -> Self {
        Self {
            words_column: words_column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Reducer for TermFrequency {
    fn reduce(&self, keys: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error> {
        let mut counts: BTreeMap<Value, i64> = BTreeMap::new();
        let mut order: Vec<Value> = Vec::new();
        let mut total: i64 = 0;
        let mut sample: Option<Record> = None;

        while let Some(record) = group.next_record()? {
            let word = record.field(&self.words_column)?.clone();
            if let Some(count) = counts.get_mut(&word) {
                *count += 1;
            } else {
                counts.insert(word.clone(), 1);
                order.push(word);
            }
            total += 1;
            if sample.is_none() {
                sample = Some(record);
            }
        }
        let sample = sample.ok_or_else(empty_group)?;

        let base = key_fields(keys, &sample)?;
        let mut out = Vec::with_capacity(order.len());
        for word in order {
            let count = counts.get(&word).copied().unwrap_or_default();
            out.push(
                base.clone()
                    .with(self.words_column.clone(), word)
                    .with(self.result_column.clone(), count as f64 / total as f64),
            );
        }

        Ok(out)
    }
}

///
/// Sum
///
/// Key fields plus the numeric sum of one column; integers stay integral
/// until a float enters.
///

pub struct Sum {
    column: String,
}

impl Sum {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Sum {
    fn reduce(&self, keys: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error> {
        let sample = group.next_record()?.ok_or_else(empty_group)?;
        let mut acc = Numeric::of(&self.column, sample.field(&self.column)?)?;
        while let Some(record) = group.next_record()? {
            acc = acc.add(Numeric::of(&self.column, record.field(&self.column)?)?);
        }

        Ok(vec![
            key_fields(keys, &sample)?.with(self.column.clone(), acc.into_value()),
        ])
    }
}

///
/// SumMany
///
/// Sums several columns at once into one row.
///

pub struct SumMany {
    columns: Vec<String>,
}

impl SumMany {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Reducer for SumMany {
    fn reduce(&self, keys: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error> {
        let sample = group.next_record()?.ok_or_else(empty_group)?;
        let mut sums: Vec<Numeric> = self
            .columns
            .iter()
            .map(|column| Numeric::of(column, sample.field(column)?))
            .collect::<Result<_, _>>()?;

        while let Some(record) = group.next_record()? {
            for (column, acc) in self.columns.iter().zip(sums.iter_mut()) {
                *acc = acc.add(Numeric::of(column, record.field(column)?)?);
            }
        }

        let mut out = key_fields(keys, &sample)?;
        for (column, acc) in self.columns.iter().zip(sums) {
            out.insert(column.clone(), acc.into_value());
        }

        Ok(vec![out])
    }
}

///
/// Mean
///
/// Group mean of a numeric column, as a float.
///

pub struct Mean {
    column: String,
    result_column: String,
}

impl Mean {
    #[must_use]
    pub fn new(column: impl Into<String>, result_column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Reducer for Mean {
    fn reduce(&self, keys: &KeyTuple, group: &mut dyn RecordStream) -> Result<Vec<Record>, Error> {
        let sample = group.next_record()?.ok_or_else(empty_group)?;
        let mut sum = sample.number_field(&self.column)?;
        let mut count: i64 = 1;
        while let Some(record) = group.next_record()? {
            sum += record.number_field(&self.column)?;
            count += 1;
        }

        Ok(vec![
            key_fields(keys, &sample)?.with(self.result_column.clone(), sum / count as f64),
        ])
    }
}

///
/// TESTS
///
