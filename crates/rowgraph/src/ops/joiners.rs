//! Standard join strategies.
//!
//! All four share one cross-product core and differ only in what the
//! empty-side case emits. The sort-merge walker never delivers two empty
//! groups.

use crate::{
    error::Error,
    key::KeyTuple,
    record::Record,
    stage::Joiner,
    stream::RecordStream,
};

///
/// JoinSuffixes
///
/// Disambiguation suffixes for non-key field names present on both sides
/// of a matched pair. Suffixing is unconditional, even when the two values
/// are equal, so output shape is deterministic. Key fields are never
/// suffixed.
///

#[derive(Clone, Debug)]
pub struct JoinSuffixes {
    left: String,
    right: String,
}

impl JoinSuffixes {
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl Default for JoinSuffixes {
    fn default() -> Self {
        Self::new("_1", "_2")
    }
}

/// Cross one left row with every right row of the matched pair.
fn cross_rows_into(
    out: &mut Vec<Record>,
    keys: &KeyTuple,
    left_row: &Record,
    right_rows: &[Record],
    suffixes: &JoinSuffixes,
) {
    for right_row in right_rows {
        out.push(merge_rows(keys, left_row, right_row, suffixes));
    }
}

fn merge_rows(
    keys: &KeyTuple,
    left: &Record,
    right: &Record,
    suffixes: &JoinSuffixes,
) -> Record {
    let mut merged = Record::new();
    for (name, value) in left {
        let collides = !keys.contains(name) && right.contains_key(name);
        let out_name = if collides {
            format!("{name}{}", suffixes.left)
        } else {
            name.clone()
        };
        merged.insert(out_name, value.clone());
    }
    for (name, value) in right {
        let collides = !keys.contains(name) && left.contains_key(name);
        let out_name = if collides {
            format!("{name}{}", suffixes.right)
        } else {
            name.clone()
        };
        merged.insert(out_name, value.clone());
    }

    merged
}

///
/// InnerJoiner
///
/// Emits cross-product rows only when both groups are non-empty.
///

#[derive(Default)]
pub struct InnerJoiner {
    suffixes: JoinSuffixes,
}

impl InnerJoiner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_suffixes(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            suffixes: JoinSuffixes::new(left, right),
        }
    }
}

impl Joiner for InnerJoiner {
    fn join(
        &self,
        keys: &KeyTuple,
        left: &mut dyn RecordStream,
        right: &[Record],
    ) -> Result<Vec<Record>, Error> {
        if right.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        while let Some(left_row) = left.next_record()? {
            cross_rows_into(&mut out, keys, &left_row, right, &self.suffixes);
        }

        Ok(out)
    }
}

///
/// OuterJoiner
///
/// Cross-product when both sides are present; otherwise the present side
/// passes through verbatim.
///

#[derive(Default)]
pub struct OuterJoiner {
    suffixes: JoinSuffixes,
}

impl OuterJoiner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_suffixes(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            suffixes: JoinSuffixes::new(left, right),
        }
    }
}

impl Joiner for OuterJoiner {
    fn join(
        &self,
        keys: &KeyTuple,
        left: &mut dyn RecordStream,
        right: &[Record],
    ) -> Result<Vec<Record>, Error> {
        let Some(first) = left.next_record()? else {
            return Ok(right.to_vec());
        };

        if right.is_empty() {
            let mut out = vec![first];
            while let Some(left_row) = left.next_record()? {
                out.push(left_row);
            }
            return Ok(out);
        }

        let mut out = Vec::new();
        cross_rows_into(&mut out, keys, &first, right, &self.suffixes);
        while let Some(left_row) = left.next_record()? {
            cross_rows_into(&mut out, keys, &left_row, right, &self.suffixes);
        }

        Ok(out)
    }
}

///
/// LeftJoiner
///
/// Inner behavior when both sides are present; left rows pass through when
/// the right is empty; nothing when the left is empty.
///

#[derive(Default)]
pub struct LeftJoiner {
    suffixes: JoinSuffixes,
}

impl LeftJoiner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_suffixes(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            suffixes: JoinSuffixes::new(left, right),
        }
    }
}

impl Joiner for LeftJoiner {
    fn join(
        &self,
        keys: &KeyTuple,
        left: &mut dyn RecordStream,
        right: &[Record],
    ) -> Result<Vec<Record>, Error> {
        let Some(first) = left.next_record()? else {
            return Ok(Vec::new());
        };

        if right.is_empty() {
            let mut out = vec![first];
            while let Some(left_row) = left.next_record()? {
                out.push(left_row);
            }
            return Ok(out);
        }

        let mut out = Vec::new();
        cross_rows_into(&mut out, keys, &first, right, &self.suffixes);
        while let Some(left_row) = left.next_record()? {
            cross_rows_into(&mut out, keys, &left_row, right, &self.suffixes);
        }

        Ok(out)
    }
}

///
/// RightJoiner
///
/// Mirror of `LeftJoiner`.
///

#[derive(Default)]
pub struct RightJoiner {
    suffixes: JoinSuffixes,
}

impl RightJoiner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_suffixes(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            suffixes: JoinSuffixes::new(left, right),
        }
    }
}

impl Joiner for RightJoiner {
    fn join(
        &self,
        keys: &KeyTuple,
        left: &mut dyn RecordStream,
        right: &[Record],
    ) -> Result<Vec<Record>, Error> {
        if right.is_empty() {
            return Ok(Vec::new());
        }

        let Some(first) = left.next_record()? else {
            return Ok(right.to_vec());
        };

        let mut out = Vec::new();
        cross_rows_into(&mut out, keys, &first, right, &self.suffixes);
        while let Some(left_row) = left.next_record()? {
            cross_rows_into(&mut out, keys, &left_row, right, &self.suffixes);
        }

        Ok(out)
    }
}

///
/// TESTS
///
