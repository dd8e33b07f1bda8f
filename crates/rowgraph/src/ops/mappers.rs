//! Standard per-row operators.

use crate::{
    error::Error,
    ops::Numeric,
    record::Record,
    stage::Mapper,
    value::Value,
};
use chrono::{NaiveDateTime, Timelike};

const EARTH_RADIUS_KM: f64 = 6371.0;
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.f";

///
/// Identity
///
/// Yields exactly the row passed.
///

pub struct Identity;

impl Mapper for Identity {
    fn map(&self, record: Record) -> Result<Vec<Record>, Error> {
        Ok(vec![record])
    }
}

///
/// FilterPunctuation
///
/// Strips ASCII punctuation from a text column.
///

pub struct FilterPunctuation {
    column: String,
}

impl FilterPunctuation {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for FilterPunctuation {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let text = record.text_field(&self.column)?;
        let cleaned: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        record.insert(self.column.clone(), Value::Text(cleaned));

        Ok(vec![record])
    }
}

///
/// LowerCase
///

pub struct LowerCase {
    column: String,
}

impl LowerCase {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for LowerCase {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let lowered = record.text_field(&self.column)?.to_lowercase();
        record.insert(self.column.clone(), Value::Text(lowered));

        Ok(vec![record])
    }
}

///
/// Split
///
/// Forks a row into one row per substring of a text column. Without a
/// separator the split is on runs of whitespace and empty parts are
/// dropped; with one, empty parts survive.
///

pub struct Split {
    column: String,
    separator: Option<String>,
}

impl Split {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            separator: None,
        }
    }

    #[must_use]
    pub fn with_separator(column: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            separator: Some(separator.into()),
        }
    }
}

impl Mapper for Split {
    fn map(&self, record: Record) -> Result<Vec<Record>, Error> {
        let text = record.text_field(&self.column)?;
        let parts: Vec<String> = match &self.separator {
            Some(separator) => text.split(separator.as_str()).map(str::to_string).collect(),
            None => text.split_whitespace().map(str::to_string).collect(),
        };

        Ok(parts
            .into_iter()
            .map(|part| record.clone().with(self.column.clone(), part))
            .collect())
    }
}

///
/// Filter
///
/// Keeps rows satisfying the predicate.
///

pub struct Filter {
    predicate: Box<dyn Fn(&Record) -> bool>,
}

impl Filter {
    #[must_use]
    pub fn new(predicate: impl Fn(&Record) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl Mapper for Filter {
    fn map(&self, record: Record) -> Result<Vec<Record>, Error> {
        if (self.predicate)(&record) {
            Ok(vec![record])
        } else {
            Ok(Vec::new())
        }
    }
}

///
/// Project
///
/// Keeps only the named columns; a missing column is an error.
///

pub struct Project {
    columns: Vec<String>,
}

impl Project {
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

impl Mapper for Project {
    fn map(&self, record: Record) -> Result<Vec<Record>, Error> {
        let mut projected = Record::new();
        for column in &self.columns {
            projected.insert(column.clone(), record.field(column)?.clone());
        }

        Ok(vec![projected])
    }
}

///
/// Product
///
/// Numeric product across columns, stored in a result column.
///

pub struct Product {
    columns: Vec<String>,
    result: String,
}

impl Product {
    pub fn new<I, S>(columns: I, result: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            result: result.into(),
        }
    }
}

impl Mapper for Product {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let mut acc = Numeric::ONE;
        for column in &self.columns {
            acc = acc.mul(Numeric::of(column, record.field(column)?)?);
        }
        record.insert(self.result.clone(), acc.into_value());

        Ok(vec![record])
    }
}

///
/// Divide
///
/// Float quotient of two columns, stored in a result column. A zero
/// denominator is an operator failure, not an IEEE-754 infinity.
///

pub struct Divide {
    numerator: String,
    denominator: String,
    result: String,
}

impl Divide {
    #[must_use]
    pub fn new(
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
            result: result.into(),
        }
    }
}

impl Mapper for Divide {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let numerator = record.number_field(&self.numerator)?;
        let denominator = record.number_field(&self.denominator)?;
        if denominator == 0.0 {
            return Err(Error::operator(format!(
                "division by zero in `{}`",
                self.denominator
            )));
        }
        record.insert(self.result.clone(), Value::Float(numerator / denominator));

        Ok(vec![record])
    }
}

///
/// Idf
///
/// Inverse document frequency: `ln(total_docs / docs_with_word)`. Emits a
/// fresh row carrying only the word and its idf.
///

pub struct Idf {
    doc_count: String,
    word_docs: String,
    text: String,
    result: String,
}

impl Idf {
    #[must_use]
    pub fn new(
        doc_count: impl Into<String>,
        word_docs: impl Into<String>,
        text: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            doc_count: doc_count.into(),
            word_docs: word_docs.into(),
            text: text.into(),
            result: result.into(),
        }
    }
}

impl Mapper for Idf {
    fn map(&self, record: Record) -> Result<Vec<Record>, Error> {
        let total_docs = record.number_field(&self.doc_count)?;
        let word_docs = record.number_field(&self.word_docs)?;
        let word = record.field(&self.text)?.clone();

        let out = Record::new()
            .with(self.text.clone(), word)
            .with(self.result.clone(), (total_docs / word_docs).ln());

        Ok(vec![out])
    }
}

///
/// Pmi
///
/// Pointwise mutual information: `ln(doc_freq / total_freq)`, appended to
/// the row.
///

pub struct Pmi {
    doc_freq: String,
    total_freq: String,
    result: String,
}

impl Pmi {
    #[must_use]
    pub fn new(
        doc_freq: impl Into<String>,
        total_freq: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            doc_freq: doc_freq.into(),
            total_freq: total_freq.into(),
            result: result.into(),
        }
    }
}

impl Mapper for Pmi {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let doc_freq = record.number_field(&self.doc_freq)?;
        let total_freq = record.number_field(&self.total_freq)?;
        record.insert(self.result.clone(), Value::Float((doc_freq / total_freq).ln()));

        Ok(vec![record])
    }
}

///
/// HaversineLength
///
/// Great-circle distance in km between two `[lon, lat]` columns.
///

pub struct HaversineLength {
    start: String,
    end: String,
    result: String,
}

impl HaversineLength {
    #[must_use]
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            result: result.into(),
        }
    }
}

impl Mapper for HaversineLength {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let (lon1, lat1) = coordinate(&record, &self.start)?;
        let (lon2, lat2) = coordinate(&record, &self.end)?;

        let (lon1, lat1) = (lon1.to_radians(), lat1.to_radians());
        let (lon2, lat2) = (lon2.to_radians(), lat2.to_radians());

        let dlat_sin = ((lat2 - lat1) / 2.0).sin();
        let dlon_sin = ((lon2 - lon1) / 2.0).sin();
        let h = dlat_sin * dlat_sin + lat1.cos() * lat2.cos() * dlon_sin * dlon_sin;
        let distance = 2.0 * EARTH_RADIUS_KM * h.sqrt().asin();

        record.insert(self.result.clone(), Value::Float(distance));

        Ok(vec![record])
    }
}

fn coordinate(record: &Record, field: &str) -> Result<(f64, f64), Error> {
    let list = record.list_field(field)?;
    let lon = list.first().and_then(Value::as_number);
    let lat = list.get(1).and_then(Value::as_number);
    match (lon, lat) {
        (Some(lon), Some(lat)) => Ok((lon, lat)),
        _ => Err(Error::type_mismatch(
            field,
            "[lon, lat] pair",
            record.field(field)?.kind(),
        )),
    }
}

///
/// TravelTime
///
/// Parses `%Y%m%dT%H%M%S[.%f]` enter/leave timestamps and appends the
/// elapsed seconds, the abbreviated weekday of entry, and the entry hour.
///

pub struct TravelTime {
    enter: String,
    leave: String,
    duration: String,
    weekday: String,
    hour: String,
}

impl TravelTime {
    #[must_use]
    pub fn new(
        enter: impl Into<String>,
        leave: impl Into<String>,
        duration: impl Into<String>,
        weekday: impl Into<String>,
        hour: impl Into<String>,
    ) -> Self {
        Self {
            enter: enter.into(),
            leave: leave.into(),
            duration: duration.into(),
            weekday: weekday.into(),
            hour: hour.into(),
        }
    }

    fn parse_timestamp(&self, record: &Record, field: &str) -> Result<NaiveDateTime, Error> {
        let raw = record.text_field(field)?;
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map_err(|err| Error::parse(format!("invalid timestamp in `{field}`: {err}")))
    }
}

impl Mapper for TravelTime {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let enter = self.parse_timestamp(&record, &self.enter)?;
        let leave = self.parse_timestamp(&record, &self.leave)?;

        let delta = leave - enter;
        let seconds = delta.num_microseconds().map_or_else(
            || delta.num_milliseconds() as f64 / 1e3,
            |us| us as f64 / 1e6,
        );

        record.insert(self.weekday.clone(), Value::Text(enter.format("%a").to_string()));
        record.insert(self.hour.clone(), Value::Int(i64::from(enter.hour())));
        record.insert(self.duration.clone(), Value::Float(seconds));

        Ok(vec![record])
    }
}

///
/// Speed
///
/// km/h from a km length column and a seconds time column.
///

pub struct Speed {
    length: String,
    time: String,
    result: String,
}

impl Speed {
    #[must_use]
    pub fn new(
        length: impl Into<String>,
        time: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            length: length.into(),
            time: time.into(),
            result: result.into(),
        }
    }
}

impl Mapper for Speed {
    fn map(&self, mut record: Record) -> Result<Vec<Record>, Error> {
        let length = record.number_field(&self.length)?;
        let time = record.number_field(&self.time)?;
        record.insert(self.result.clone(), Value::Float(length / time * 3600.0));

        Ok(vec![record])
    }
}

///
/// TESTS
///
