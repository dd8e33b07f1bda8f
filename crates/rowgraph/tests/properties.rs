//! Property tests for the engine invariants: sort totality and stability,
//! reduce grouping, and join correctness against a naive model.

use proptest::prelude::*;
use rowgraph::{
    graph::{Graph, Inputs},
    key::KeyTuple,
    ops::{Count, InnerJoiner},
    record,
    record::Record,
    stage::sort::SortConfig,
    value::Value,
};

fn keyed_rows(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(0i64..8, 0..max_len).prop_map(|ks| {
        ks.into_iter()
            .enumerate()
            .map(|(seq, k)| record! { "k" => k, "seq" => i64::try_from(seq).unwrap_or(i64::MAX) })
            .collect()
    })
}

fn int_field(record: &Record, name: &str) -> i64 {
    record
        .field(name)
        .expect("field")
        .as_int()
        .expect("int field")
}

proptest! {
    #[test]
    fn sort_output_is_a_stable_sorted_permutation(
        rows in keyed_rows(64),
        run_size in 1usize..8
    ) {
        let graph = Graph::from_iter("rows").sort_with(["k"], SortConfig { run_size });
        let bound = rows.clone();
        let inputs = Inputs::new().bind("rows", move || bound.clone());

        let out = graph.run(&inputs).expect("run");

        // permutation of the input
        let mut expected = rows.clone();
        let mut actual = out.clone();
        expected.sort();
        actual.sort();
        prop_assert_eq!(expected, actual);

        // non-decreasing in the key, ties in input order
        for window in out.windows(2) {
            let (left_k, right_k) = (int_field(&window[0], "k"), int_field(&window[1], "k"));
            prop_assert!(left_k <= right_k);
            if left_k == right_k {
                prop_assert!(int_field(&window[0], "seq") < int_field(&window[1], "seq"));
            }
        }
    }

    #[test]
    fn reduce_sees_one_group_per_distinct_key(rows in keyed_rows(64)) {
        let graph = Graph::from_iter("rows")
            .sort(["k"])
            .reduce(Count::new("count"), ["k"]);
        let bound = rows.clone();
        let inputs = Inputs::new().bind("rows", move || bound.clone());

        let out = graph.run(&inputs).expect("run");

        let mut distinct: Vec<i64> = rows.iter().map(|row| int_field(row, "k")).collect();
        distinct.sort_unstable();
        distinct.dedup();

        prop_assert_eq!(out.len(), distinct.len());
        for (row, k) in out.iter().zip(distinct) {
            prop_assert_eq!(int_field(row, "k"), k);
            let expected = rows.iter().filter(|r| int_field(r, "k") == k).count();
            prop_assert_eq!(int_field(row, "count"), i64::try_from(expected).unwrap_or(-1));
        }
    }

    #[test]
    fn inner_join_matches_the_naive_cross_product_model(
        left in keyed_rows(24),
        right in keyed_rows(24)
    ) {
        let left_graph = Graph::from_iter("left").sort(["k"]);
        let right_graph = Graph::from_iter("right").sort(["k"]);
        let joined = left_graph.join(InnerJoiner::new(), &right_graph, ["k"]);

        let (bound_left, bound_right) = (left.clone(), right.clone());
        let inputs = Inputs::new()
            .bind("left", move || bound_left.clone())
            .bind("right", move || bound_right.clone());

        let out = joined.run(&inputs).expect("run");

        // model: for every key-matching pair, one row with suffixed seq fields
        let mut sorted_left = left;
        let mut sorted_right = right;
        sorted_left.sort_by_key(|row| int_field(row, "k"));
        sorted_right.sort_by_key(|row| int_field(row, "k"));

        let mut model = Vec::new();
        for l in &sorted_left {
            for r in &sorted_right {
                if int_field(l, "k") == int_field(r, "k") {
                    model.push(record! {
                        "k" => int_field(l, "k"),
                        "seq_1" => int_field(l, "seq"),
                        "seq_2" => int_field(r, "seq"),
                    });
                }
            }
        }
        model.sort_by_key(|row| int_field(row, "k"));

        let mut actual = out;
        actual.sort_by_key(|row| int_field(row, "k"));
        prop_assert_eq!(actual, model);
    }

    #[test]
    fn graph_runs_are_independent(rows in keyed_rows(32)) {
        let graph = Graph::from_iter("rows").sort(["k"]);
        let bound = rows.clone();
        let inputs = Inputs::new().bind("rows", move || bound.clone());

        let first = graph.run(&inputs).expect("first run");
        let second = graph.run(&inputs).expect("second run");
        prop_assert_eq!(first, second);
    }
}

#[test]
fn sort_handles_mixed_value_kinds_deterministically() {
    let rows = vec![
        record! { "k" => "text" },
        record! { "k" => 2 },
        record! { "k" => 1.5 },
        record! { "k" => true },
        record! { "k" => Value::Null },
    ];
    let graph = Graph::from_iter("rows").sort(["k"]);
    let bound = rows;
    let inputs = Inputs::new().bind("rows", move || bound.clone());

    let out = graph.run(&inputs).expect("run");
    let kinds: Vec<_> = out
        .iter()
        .map(|row| row.field("k").expect("k").kind())
        .collect();

    // canonical rank order: null < bool < int < float < text
    let labels: Vec<String> = kinds.iter().map(ToString::to_string).collect();
    assert_eq!(labels, vec!["null", "bool", "int", "float", "text"]);
}

#[test]
fn empty_key_tuple_reduce_treats_input_as_one_group() {
    let rows = vec![record! { "a" => 1 }, record! { "b" => 2 }];
    let graph = Graph::from_iter("rows").reduce(Count::new("count"), KeyTuple::default());
    let bound = rows;
    let inputs = Inputs::new().bind("rows", move || bound.clone());

    let out = graph.run(&inputs).expect("run");
    assert_eq!(out, vec![record! { "count" => 2 }]);
}
