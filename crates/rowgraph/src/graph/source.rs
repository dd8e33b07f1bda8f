use crate::{
    error::Error,
    record::Record,
    stream::{BoxedRecordStream, IterStream, RecordStream},
    value::Value,
};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
    rc::Rc,
};

pub(crate) type LineParser = dyn Fn(&str) -> Result<Record, Error>;

///
/// Source
///
/// How a graph obtains its initial stream: a named in-memory iterator
/// resolved against the caller's `Inputs` at run time, or a file whose
/// lines run through a caller-supplied parser.
///

#[derive(Clone)]
pub(crate) enum Source {
    Iter {
        name: String,
    },
    File {
        path: PathBuf,
        parser: Rc<LineParser>,
    },
}

impl Source {
    pub(crate) fn open(&self, inputs: &Inputs) -> Result<BoxedRecordStream, Error> {
        match self {
            Self::Iter { name } => inputs.resolve(name),
            Self::File { path, parser } => {
                Ok(Box::new(FileStream::open(path, parser.clone())?))
            }
        }
    }
}

///
/// Inputs
///
/// Named in-memory sources for one or more `run` calls. Each entry is a
/// thunk producing a fresh iterator, so the same graph can be run many
/// times without the caller rebuilding anything.
///

#[derive(Default)]
pub struct Inputs {
    sources: HashMap<String, Box<dyn Fn() -> Box<dyn Iterator<Item = Record>>>>,
}

impl Inputs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one named source.
    #[must_use]
    pub fn bind<F, I>(mut self, name: impl Into<String>, thunk: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'static,
    {
        self.sources.insert(
            name.into(),
            Box::new(move || Box::new(thunk().into_iter())),
        );
        self
    }

    fn resolve(&self, name: &str) -> Result<BoxedRecordStream, Error> {
        let thunk = self.sources.get(name).ok_or_else(|| Error::SourceNotFound {
            name: name.to_string(),
        })?;

        Ok(Box::new(IterStream::new(thunk())))
    }
}

///
/// FileStream
///
/// Reads the bound file one line at a time and parses each line into a
/// record. The handle is owned by the stream, so it is released on every
/// exit path the moment the pipeline drops.
///

struct FileStream {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    parser: Rc<LineParser>,
}

impl FileStream {
    fn open(path: &Path, parser: Rc<LineParser>) -> Result<Self, Error> {
        let file = File::open(path).map_err(|source| Error::io("open", path, source))?;

        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            parser,
        })
    }
}

impl RecordStream for FileStream {
    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        match self.lines.next() {
            Some(Ok(line)) => Ok(Some((self.parser)(&line)?)),
            Some(Err(source)) => Err(Error::io("read", self.path.clone(), source)),
            None => Ok(None),
        }
    }
}

/// Parser for JSON-per-line files: each line is one JSON object decoded
/// into a record.
pub fn json_line_parser(line: &str) -> Result<Record, Error> {
    let json: serde_json::Value =
        serde_json::from_str(line).map_err(|err| Error::parse(err.to_string()))?;

    match Value::from(json) {
        Value::Record(record) => Ok(record),
        other => Err(Error::parse(format!(
            "expected a JSON object per line, got {}",
            other.kind()
        ))),
    }
}

///
/// TESTS
///
