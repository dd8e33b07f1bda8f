use crate::{
    error::Error,
    record::Record,
    value::{Value, canonical_cmp, compare_key_values},
};
use derive_more::{Deref, IntoIterator};
use std::cmp::Ordering;

///
/// KeyTuple
///
/// Ordered sequence of field names used for sorting, grouping, and join
/// matching. Two records are key-equal when every named field compares
/// equal; the empty tuple makes all records key-equal, which is how a
/// whole-input reduce is expressed.
///
/// Projection fails loudly when a record lacks one of the named fields.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
pub struct KeyTuple {
    #[deref]
    #[into_iterator(owned, ref)]
    fields: Vec<String>,
}

impl KeyTuple {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field == name)
    }

    /// Project the key values of one record, in tuple order.
    pub fn project(&self, record: &Record) -> Result<Vec<Value>, Error> {
        self.fields
            .iter()
            .map(|name| record.field(name).cloned())
            .collect()
    }

    /// Lexicographic comparison of two records under this tuple.
    pub fn compare_records(&self, left: &Record, right: &Record) -> Result<Ordering, Error> {
        for name in &self.fields {
            let cmp = canonical_cmp(left.field(name)?, right.field(name)?);
            if cmp != Ordering::Equal {
                return Ok(cmp);
            }
        }

        Ok(Ordering::Equal)
    }

    /// Key equality between an already-projected key and a record.
    pub(crate) fn record_matches(&self, key: &[Value], record: &Record) -> Result<bool, Error> {
        for (name, value) in self.fields.iter().zip(key.iter()) {
            if record.field(name)? != value {
                return Ok(false);
            }
        }

        Ok(true)
    }

    #[must_use]
    pub(crate) fn compare_projected(left: &[Value], right: &[Value]) -> Ordering {
        compare_key_values(left, right)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for KeyTuple {
    fn from(fields: [S; N]) -> Self {
        Self::new(fields)
    }
}

impl<S: Into<String>> From<Vec<S>> for KeyTuple {
    fn from(fields: Vec<S>) -> Self {
        Self::new(fields)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{error::Error, key::KeyTuple, record};
    use std::cmp::Ordering;

    #[test]
    fn compare_records_walks_fields_in_tuple_order() {
        let keys = KeyTuple::from(["a", "b"]);
        let left = record! { "a" => 1, "b" => "x" };
        let right = record! { "a" => 1, "b" => "y" };

        let cmp = keys.compare_records(&left, &right).expect("comparable");
        assert_eq!(cmp, Ordering::Less);
    }

    #[test]
    fn empty_tuple_makes_all_records_key_equal() {
        let keys = KeyTuple::default();
        let left = record! { "a" => 1 };
        let right = record! { "b" => 2 };

        let cmp = keys.compare_records(&left, &right).expect("comparable");
        assert_eq!(cmp, Ordering::Equal);
    }

    #[test]
    fn projection_fails_on_missing_key_field() {
        let keys = KeyTuple::from(["missing"]);
        let record = record! { "a" => 1 };

        let err = keys.project(&record).expect_err("projection should fail");
        assert!(matches!(err, Error::MissingField { field } if field == "missing"));
    }

    #[test]
    fn record_matches_compares_projected_key() {
        let keys = KeyTuple::from(["text"]);
        let record = record! { "text" => "hello", "doc_id" => 1 };
        let key = keys.project(&record).expect("projection");

        let other = record! { "text" => "hello", "doc_id" => 2 };
        assert!(keys.record_matches(&key, &other).expect("comparable"));

        let different = record! { "text" => "world" };
        assert!(!keys.record_matches(&key, &different).expect("comparable"));
    }
}
