//! The pipeline description and its executor.
//!
//! A `Graph` is an immutable value: a source binding plus an ordered stage
//! list. Building one performs no I/O and touches no records; every builder
//! call returns a new graph, so prefixes can be shared and extended freely.
//! Execution binds named inputs, threads a lazy stream through the stages,
//! and drains the final stage into an ordered vector.

mod source;

pub use source::{Inputs, json_line_parser};

use crate::{
    error::Error,
    key::KeyTuple,
    record::Record,
    stage::{
        Joiner, Mapper, Reducer,
        join::JoinStream,
        map::MapStream,
        reduce::ReduceStream,
        sort::{SortConfig, SortStream},
    },
    stream::{self, BoxedRecordStream},
};
use source::Source;
use std::{path::PathBuf, rc::Rc};
use tracing::debug;

///
/// Graph
///

#[derive(Clone)]
pub struct Graph {
    source: Source,
    stages: Vec<Stage>,
}

impl Graph {
    /// Bind a named in-memory source, resolved against `Inputs` at run time.
    #[must_use]
    pub fn from_iter(name: impl Into<String>) -> Self {
        Self {
            source: Source::Iter { name: name.into() },
            stages: Vec::new(),
        }
    }

    /// Bind a file source; each line runs through `parser` during execution.
    #[must_use]
    pub fn from_file(
        path: impl Into<PathBuf>,
        parser: impl Fn(&str) -> Result<Record, Error> + 'static,
    ) -> Self {
        Self {
            source: Source::File {
                path: path.into(),
                parser: Rc::new(parser),
            },
            stages: Vec::new(),
        }
    }

    /// Extend with a map stage.
    #[must_use]
    pub fn map(&self, mapper: impl Mapper + 'static) -> Self {
        self.with_stage(Stage::Map {
            mapper: Rc::new(mapper),
        })
    }

    /// Extend with a reduce stage; the input must already be sorted by `keys`.
    #[must_use]
    pub fn reduce(&self, reducer: impl Reducer + 'static, keys: impl Into<KeyTuple>) -> Self {
        self.with_stage(Stage::Reduce {
            reducer: Rc::new(reducer),
            keys: keys.into(),
        })
    }

    /// Extend with a sort stage using the default run size.
    #[must_use]
    pub fn sort(&self, keys: impl Into<KeyTuple>) -> Self {
        self.sort_with(keys, SortConfig::default())
    }

    /// Extend with a sort stage under an explicit spill configuration.
    #[must_use]
    pub fn sort_with(&self, keys: impl Into<KeyTuple>, config: SortConfig) -> Self {
        self.with_stage(Stage::Sort {
            keys: keys.into(),
            config,
        })
    }

    /// Extend with a join stage against another graph.
    ///
    /// The other graph is captured by value: every run of this graph
    /// triggers a fresh sub-execution of it against the same inputs. Both
    /// sides must be sorted by `keys`.
    #[must_use]
    pub fn join(
        &self,
        joiner: impl Joiner + 'static,
        other: &Self,
        keys: impl Into<KeyTuple>,
    ) -> Self {
        self.with_stage(Stage::Join {
            joiner: Rc::new(joiner),
            right: Box::new(other.clone()),
            keys: keys.into(),
        })
    }

    /// Execute against named inputs and materialize the final stage.
    pub fn run(&self, inputs: &Inputs) -> Result<Vec<Record>, Error> {
        debug!(stages = self.stages.len(), "graph run started");
        let mut stream = self.stream(inputs)?;
        let records = stream::drain(&mut stream)?;
        debug!(records = records.len(), "graph run finished");

        Ok(records)
    }

    /// Resolve the source and wrap the stage chain without draining it.
    ///
    /// Source binding errors surface here, at run start; record-level errors
    /// surface as the returned stream is pulled.
    pub(crate) fn stream(&self, inputs: &Inputs) -> Result<BoxedRecordStream, Error> {
        let mut stream = self.source.open(inputs)?;
        for stage in &self.stages {
            stream = stage.apply(stream, inputs)?;
        }

        Ok(stream)
    }

    fn with_stage(&self, stage: Stage) -> Self {
        let mut graph = self.clone();
        graph.stages.push(stage);
        graph
    }
}

///
/// Stage
///
/// One step of a pipeline, with its parameters. Transformer objects are
/// shared behind `Rc` so cloning a graph is cheap.
///

#[derive(Clone)]
enum Stage {
    Map {
        mapper: Rc<dyn Mapper>,
    },
    Reduce {
        reducer: Rc<dyn Reducer>,
        keys: KeyTuple,
    },
    Sort {
        keys: KeyTuple,
        config: SortConfig,
    },
    Join {
        joiner: Rc<dyn Joiner>,
        right: Box<Graph>,
        keys: KeyTuple,
    },
}

impl Stage {
    fn apply(
        &self,
        input: BoxedRecordStream,
        inputs: &Inputs,
    ) -> Result<BoxedRecordStream, Error> {
        let stream: BoxedRecordStream = match self {
            Self::Map { mapper } => Box::new(MapStream::new(mapper.clone(), input)),
            Self::Reduce { reducer, keys } => {
                Box::new(ReduceStream::new(reducer.clone(), keys.clone(), input))
            }
            Self::Sort { keys, config } => {
                Box::new(SortStream::new(keys.clone(), *config, input))
            }
            Self::Join {
                joiner,
                right,
                keys,
            } => {
                let right_stream = right.stream(inputs)?;
                Box::new(JoinStream::new(
                    joiner.clone(),
                    keys.clone(),
                    input,
                    right_stream,
                ))
            }
        };

        Ok(stream)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{
        error::Error,
        graph::{Graph, Inputs},
        record,
        record::Record,
        stage::Mapper,
    };
    use std::{
        rc::Rc,
        sync::atomic::{AtomicUsize, Ordering},
    };

    struct CountingMapper {
        calls: Rc<AtomicUsize>,
    }

    impl Mapper for CountingMapper {
        fn map(&self, record: Record) -> Result<Vec<Record>, Error> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![record])
        }
    }

    fn docs() -> Vec<Record> {
        vec![record! { "doc_id" => 1 }, record! { "doc_id" => 2 }]
    }

    #[test]
    fn identity_graph_returns_source_rows() {
        let graph = Graph::from_iter("docs");
        let rows = docs();
        let inputs = Inputs::new().bind("docs", move || rows.clone());

        let out = graph.run(&inputs).expect("run");
        assert_eq!(out, docs());
    }

    #[test]
    fn missing_named_input_fails_at_run_start() {
        let graph = Graph::from_iter("docs");

        let err = graph.run(&Inputs::new()).expect_err("unbound source");
        assert!(matches!(err, Error::SourceNotFound { name } if name == "docs"));
    }

    #[test]
    fn builder_returns_new_graphs_and_never_mutates_predecessors() {
        let calls = Rc::new(AtomicUsize::new(0));
        let base = Graph::from_iter("docs");
        let extended = base.map(CountingMapper {
            calls: calls.clone(),
        });

        let rows = docs();
        let inputs = Inputs::new().bind("docs", move || rows.clone());

        // running the predecessor must not execute the successor's mapper
        base.run(&inputs).expect("run base");
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        extended.run(&inputs).expect("run extended");
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn graphs_are_re_runnable_against_different_inputs() {
        let graph = Graph::from_iter("docs");

        let first = vec![record! { "n" => 1 }];
        let second = vec![record! { "n" => 2 }, record! { "n" => 3 }];
        let inputs_a = Inputs::new().bind("docs", move || first.clone());
        let inputs_b = Inputs::new().bind("docs", move || second.clone());

        assert_eq!(graph.run(&inputs_a).expect("run a").len(), 1);
        assert_eq!(graph.run(&inputs_b).expect("run b").len(), 2);
        assert_eq!(graph.run(&inputs_a).expect("run a again").len(), 1);
    }
}
