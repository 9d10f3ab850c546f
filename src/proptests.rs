use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Walks the whole tree checking structural invariants: every reachable node
/// sits inside the open key interval imposed by its ancestors, child links
/// point at live arena slots, and every arena slot is reachable exactly once.
fn validate_tree(t: &SensorTree) {
    let mut stack: Vec<(NodeId, Option<i64>, Option<i64>)> = Vec::new();
    if !t.root.is_nil() {
        stack.push((t.root, None, None));
    } else {
        assert!(t.is_empty());
    }

    let mut seen = vec![false; t.nodes.len()];
    let mut reachable = 0usize;
    while let Some((id, lo, hi)) = stack.pop() {
        let idx = id.index();
        assert!(idx < t.nodes.len(), "child index out of arena bounds");
        assert!(!seen[idx], "node {idx} reachable from two parents");
        seen[idx] = true;
        reachable += 1;

        let node = &t.nodes[idx];
        let ts = node.reading.timestamp;
        if let Some(lo) = lo {
            assert!(ts > lo, "ordering violated: {ts} <= ancestor bound {lo}");
        }
        if let Some(hi) = hi {
            assert!(ts < hi, "ordering violated: {ts} >= ancestor bound {hi}");
        }

        if !node.left.is_nil() {
            stack.push((node.left, lo, Some(ts)));
        }
        if !node.right.is_nil() {
            stack.push((node.right, Some(ts), hi));
        }
    }

    assert_eq!(reachable, t.len(), "arena holds unreachable nodes");
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Reading),
    Find(i64),
    Clear,
}

fn reading_strategy() -> impl Strategy<Value = Reading> + Clone {
    // A narrow key range forces duplicate timestamps to come up often.
    (-500i64..500, 0u32..=100, 0u32..100).prop_map(|(timestamp, temperature, humidity)| Reading {
        timestamp,
        temperature,
        humidity,
    })
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        60 => reading_strategy().prop_map(Op::Insert),
        35 => (-500i64..500).prop_map(Op::Find),
        5 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=2000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_btreemap(ops in ops_strategy()) {
        let mut t = SensorTree::new();
        let mut m: BTreeMap<i64, (u32, u32)> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(r) => {
                    t.insert(r).unwrap();
                    // The tree keeps the first payload for a timestamp.
                    m.entry(r.timestamp).or_insert((r.temperature, r.humidity));
                }
                Op::Find(ts) => {
                    let got = t.find(ts).map(|r| (r.temperature, r.humidity));
                    prop_assert_eq!(got, m.get(&ts).copied());
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<(i64, (u32, u32))> = t
            .iter()
            .map(|r| (r.timestamp, (r.temperature, r.humidity)))
            .collect();
        let expected: Vec<(i64, (u32, u32))> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_in_order_is_strictly_ascending(mut timestamps in prop::collection::vec(any::<i64>(), 0..=500)) {
        let mut t = SensorTree::new();
        for (i, ts) in timestamps.iter().enumerate() {
            t.insert(Reading {
                timestamp: *ts,
                temperature: i as u32,
                humidity: i as u32,
            })
            .unwrap();
        }
        validate_tree(&t);

        let got: Vec<i64> = t.iter().map(|r| r.timestamp).collect();
        prop_assert!(got.windows(2).all(|w| w[0] < w[1]));

        timestamps.sort_unstable();
        timestamps.dedup();
        prop_assert_eq!(got, timestamps);
    }

    #[test]
    fn prop_clear_then_reuse(a in reading_strategy(), b in reading_strategy()) {
        let mut t = SensorTree::new();
        t.insert(a).unwrap();
        t.clear();
        prop_assert!(t.is_empty());
        prop_assert!(t.find(a.timestamp).is_none());

        t.insert(b).unwrap();
        validate_tree(&t);
        prop_assert_eq!(t.len(), 1);
        prop_assert_eq!(t.find(b.timestamp), Some(&b));
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let timestamps: Vec<i64> = vec![-3, -1, 0, 2, 5, 8];

    for_each_permutation(&timestamps, |perm| {
        let mut t = SensorTree::new();
        for (i, ts) in perm.iter().enumerate() {
            t.insert(Reading {
                timestamp: *ts,
                temperature: i as u32,
                humidity: i as u32,
            })
            .unwrap();
        }

        validate_tree(&t);
        let got: Vec<i64> = t.iter().map(|r| r.timestamp).collect();
        assert_eq!(got, timestamps, "wrong order after inserting {perm:?}");
        for ts in &timestamps {
            assert!(t.contains(*ts));
        }
    });
}
