//! Structural properties of nesting over arbitrary small datasets.

mod test_data_gen;

use nest::{Leaf, MapResult, NestOperator, Scalar, SortSpec};
use proptest::prelude::*;
use test_data_gen::positions;

type Row = (i64, i64, i64);

fn rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((0i64..4, 0i64..3, -50i64..50), 0..40)
}

fn two_levels() -> NestOperator<Row> {
    NestOperator::new()
        .add_key_fn(|r: &Row| r.0)
        .add_key_fn(|r: &Row| r.1)
}

fn first_seen(keys: impl Iterator<Item = i64>) -> Vec<Scalar> {
    let mut out: Vec<Scalar> = Vec::new();
    for k in keys.map(Scalar::I64) {
        if !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

/// Every leaf of `tree` with the key path that leads to it.
fn leaves_with_paths<'t, 'a>(
    tree: &'t MapResult<'a, Row>,
    path: &mut Vec<Scalar>,
    out: &mut Vec<(Vec<Scalar>, &'t Leaf<'a, Row, Scalar>)>,
) {
    match tree {
        MapResult::Groups(groups) => {
            for (key, child) in groups {
                path.push(key.clone());
                leaves_with_paths(child, path, out);
                path.pop();
            }
        }
        MapResult::Leaf(leaf) => out.push((path.clone(), leaf)),
    }
}

proptest! {
    #[test]
    fn prop_leaves_partition_the_input(data in rows()) {
        let tree = two_levels().map(&data).unwrap();

        let mut seen = positions(&data, &tree.records());
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..data.len()).collect::<Vec<_>>());

        let mut found = Vec::new();
        leaves_with_paths(&tree, &mut Vec::new(), &mut found);
        for (path, leaf) in found {
            let records = leaf.as_records().unwrap();
            prop_assert!(!records.is_empty());
            for r in records {
                prop_assert_eq!(&path, &vec![Scalar::I64(r.0), Scalar::I64(r.1)]);
            }
        }
    }

    #[test]
    fn prop_unsorted_levels_keep_first_encounter_order(data in rows()) {
        let tree = two_levels().map(&data).unwrap();
        let top: Vec<Scalar> = tree.keys().into_iter().cloned().collect();
        prop_assert_eq!(top, first_seen(data.iter().map(|r| r.0)));

        for (key, child) in tree.as_groups().unwrap() {
            let inner: Vec<Scalar> = child.keys().into_iter().cloned().collect();
            let expected = first_seen(
                data.iter().filter(|r| Scalar::I64(r.0) == *key).map(|r| r.1),
            );
            prop_assert_eq!(inner, expected);
        }
    }

    #[test]
    fn prop_leaves_are_stable(data in rows()) {
        let tree = two_levels().map(&data).unwrap();
        for leaf in tree.leaves() {
            let idx = positions(&data, leaf.as_records().unwrap());
            prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn prop_value_sort_is_stable_both_ways(data in rows(), reverse in any::<bool>()) {
        let op = two_levels()
            .set_sort_values(SortSpec::by_key(|r: &Row| r.2).with_reverse(reverse));
        let tree = op.map(&data).unwrap();
        for leaf in tree.leaves() {
            let records = leaf.as_records().unwrap();
            let idx = positions(&data, records);
            for w in records.windows(2).zip(idx.windows(2)) {
                let ((a, b), (ia, ib)) = ((w.0[0], w.0[1]), (w.1[0], w.1[1]));
                let ord = if reverse { b.2.cmp(&a.2) } else { a.2.cmp(&b.2) };
                prop_assert!(ord.is_le());
                if a.2 == b.2 {
                    prop_assert!(ia < ib);
                }
            }
        }
    }

    #[test]
    fn prop_sorted_keys_are_ordered(data in rows()) {
        let op = NestOperator::new()
            .add_key_fn(|r: &Row| r.0)
            .set_sort_keys(SortSpec::descending())
            .unwrap()
            .add_key_fn(|r: &Row| r.1)
            .set_sort_keys(SortSpec::new())
            .unwrap();
        let tree = op.map(&data).unwrap();

        let top = tree.keys();
        prop_assert!(top.windows(2).all(|w| w[0] > w[1]));
        for child in tree.as_groups().unwrap().values() {
            let inner = child.keys();
            prop_assert!(inner.windows(2).all(|w| w[0] < w[1]));
        }

        prop_assert_eq!(op.map(&data).unwrap().into_entries(), op.entries(&data).unwrap());
    }
}
