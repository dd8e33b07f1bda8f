//! Spill-run codec for the external sort.
//!
//! Runs are CBOR records in length-prefixed frames on anonymous temp files,
//! so field values and their types survive the disk round-trip exactly. The
//! OS reclaims a run file as soon as its handle drops, which covers both
//! normal exhaustion and pipeline teardown.

use crate::record::Record;
use serde_cbor::{from_slice, to_vec};
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
};
use thiserror::Error as ThisError;

/// Max serialized bytes for a single spilled record.
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

///
/// SpillError
///

#[derive(Debug, ThisError)]
pub enum SpillError {
    #[error("spill encode failed: {0}")]
    Encode(String),

    #[error("spill decode failed: {0}")]
    Decode(String),

    #[error("spill frame of {len} bytes exceeds limit {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("spill {op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl SpillError {
    fn io(op: &'static str, source: io::Error) -> Self {
        Self::Io { op, source }
    }
}

///
/// SpillWriter
///
/// Writes one sorted run. Frames are a little-endian u32 length followed by
/// the CBOR payload.
///

pub(crate) struct SpillWriter {
    out: BufWriter<File>,
    frames: usize,
}

impl SpillWriter {
    pub(crate) fn create() -> Result<Self, SpillError> {
        let file = tempfile::tempfile().map_err(|source| SpillError::io("create", source))?;

        Ok(Self {
            out: BufWriter::new(file),
            frames: 0,
        })
    }

    pub(crate) fn write_record(&mut self, record: &Record) -> Result<(), SpillError> {
        let payload = to_vec(record).map_err(|err| SpillError::Encode(err.to_string()))?;
        if payload.len() > MAX_FRAME_BYTES {
            return Err(SpillError::FrameTooLarge {
                len: payload.len(),
                max: MAX_FRAME_BYTES,
            });
        }

        let len = u32::try_from(payload.len()).map_err(|_| SpillError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_BYTES,
        })?;
        self.out
            .write_all(&len.to_le_bytes())
            .and_then(|()| self.out.write_all(&payload))
            .map_err(|source| SpillError::io("write", source))?;
        self.frames += 1;

        Ok(())
    }

    /// Seal the run and reopen it for streaming reads from the start.
    pub(crate) fn into_reader(self) -> Result<SpillReader, SpillError> {
        let mut file = self
            .out
            .into_inner()
            .map_err(|err| SpillError::io("flush", err.into_error()))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|source| SpillError::io("seek", source))?;

        Ok(SpillReader {
            input: BufReader::new(file),
            remaining: self.frames,
        })
    }
}

///
/// SpillReader
///
/// Streams one sealed run back in its on-disk (sorted) order.
///

pub(crate) struct SpillReader {
    input: BufReader<File>,
    remaining: usize,
}

impl SpillReader {
    pub(crate) fn read_record(&mut self) -> Result<Option<Record>, SpillError> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        self.input
            .read_exact(&mut len_bytes)
            .map_err(|source| SpillError::io("read", source))?;
        let len = u32::from_le_bytes(len_bytes) as usize;
        if len > MAX_FRAME_BYTES {
            return Err(SpillError::FrameTooLarge {
                len,
                max: MAX_FRAME_BYTES,
            });
        }

        let mut payload = vec![0u8; len];
        self.input
            .read_exact(&mut payload)
            .map_err(|source| SpillError::io("read", source))?;
        let record = from_slice(&payload).map_err(|err| SpillError::Decode(err.to_string()))?;
        self.remaining -= 1;

        Ok(Some(record))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{record, stage::sort::spill::SpillWriter};

    #[test]
    fn run_roundtrip_preserves_order_and_types() {
        let rows = vec![
            record! { "n" => 1, "t" => "a" },
            record! { "n" => 2.5, "t" => "b" },
            record! { "flag" => true },
        ];

        let mut writer = SpillWriter::create().expect("create spill");
        for row in &rows {
            writer.write_record(row).expect("write frame");
        }

        let mut reader = writer.into_reader().expect("seal run");
        let mut decoded = Vec::new();
        while let Some(record) = reader.read_record().expect("read frame") {
            decoded.push(record);
        }

        assert_eq!(decoded, rows);
    }

    #[test]
    fn empty_run_reads_back_empty() {
        let writer = SpillWriter::create().expect("create spill");
        let mut reader = writer.into_reader().expect("seal run");

        assert!(reader.read_record().expect("read").is_none());
    }
}
