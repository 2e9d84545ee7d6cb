use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

fn byte_strategy() -> impl Strategy<Value = u8> + Clone {
    // A narrow alphabet makes shared prefixes and sibling collisions common.
    prop_oneof![
        6 => 1u8..=4,
        1 => 1u8..=255,
    ]
}

fn dict_strategy() -> impl Strategy<Value = BTreeMap<Vec<u8>, u32>> {
    prop::collection::btree_map(
        prop::collection::vec(byte_strategy(), 1..=10),
        0u32..=MAX_VALUE,
        0..=80,
    )
}

fn probe_strategy() -> impl Strategy<Value = Vec<u8>> {
    // Probes may contain zero bytes, which stored keys never do.
    prop::collection::vec(0u8..=5, 0..=12)
}

fn build(dict: &BTreeMap<Vec<u8>, u32>) -> DoubleArray {
    let keys: Vec<&[u8]> = dict.keys().map(Vec::as_slice).collect();
    let values: Vec<u32> = dict.values().copied().collect();
    DoubleArray::build(&keys, Some(values.as_slice())).unwrap()
}

fn expected_prefixes(dict: &BTreeMap<Vec<u8>, u32>, key: &[u8], offset: usize) -> Vec<Match> {
    (offset + 1..=key.len())
        .filter_map(|end| dict.get(&key[offset..end]).map(|&value| Match { value, end }))
        .collect()
}

fn expected_traversal(dict: &BTreeMap<Vec<u8>, u32>, key: &[u8]) -> Traversal {
    if let Some(&value) = dict.get(key) {
        Traversal::Value(value)
    } else if key.is_empty() || dict.keys().any(|k| k.starts_with(key)) {
        Traversal::Incomplete
    } else {
        Traversal::Mismatch
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_exact_match(dict in dict_strategy(), probes in prop::collection::vec(probe_strategy(), 0..=32)) {
        let da = build(&dict);
        prop_assert_eq!(da.total_size(), 4 * da.size());

        for (key, &value) in &dict {
            prop_assert_eq!(da.exact_match(key), Some(Match { value, end: key.len() }));
        }
        for probe in &probes {
            let expected = dict.get(probe).map(|&value| Match { value, end: probe.len() });
            prop_assert_eq!(da.exact_match(probe), expected);
            if expected.is_none() {
                prop_assert_eq!(da.exact_match_raw(probe), (-1, 0));
            }
        }
    }

    #[test]
    fn prop_common_prefix_search(
        dict in dict_strategy(),
        probe in probe_strategy(),
        offset in 0usize..4,
        max_results in 0usize..4,
    ) {
        let da = build(&dict);
        // Offsets past the end of the probe are allowed and find nothing.
        let expected = expected_prefixes(&dict, &probe, offset);

        let all = da.common_prefix_search(&probe, offset, usize::MAX);
        prop_assert_eq!(&all, &expected);

        let lazy: Vec<Match> = da.common_prefix_iter(&probe, offset).collect();
        prop_assert_eq!(&lazy, &all);

        let capped = da.common_prefix_search(&probe, offset, max_results);
        prop_assert_eq!(&capped[..], &all[..max_results.min(all.len())]);
    }

    #[test]
    fn prop_stored_keys_as_probes(dict in dict_strategy(), suffix in probe_strategy()) {
        let da = build(&dict);
        for key in dict.keys() {
            let mut probe = key.clone();
            probe.extend_from_slice(&suffix);
            let got = da.common_prefix_search(&probe, 0, usize::MAX);
            prop_assert_eq!(got, expected_prefixes(&dict, &probe, 0));
        }
    }

    #[test]
    fn prop_traverse_chains_like_one_call(
        dict in dict_strategy(),
        probe in probe_strategy(),
        split in 0usize..13,
    ) {
        let da = build(&dict);
        let whole = da.traverse(&probe, 0, 0);

        let split = split.min(probe.len());
        let first = da.traverse(&probe[..split], 0, 0);
        if first.status == Traversal::Mismatch {
            prop_assert_eq!(first, whole);
        } else {
            prop_assert_eq!(first.offset, split);
            let second = da.traverse(&probe, first.offset, first.node_pos);
            prop_assert_eq!(second, whole);
        }
    }

    #[test]
    fn prop_traverse_status(dict in dict_strategy(), probe in probe_strategy()) {
        let da = build(&dict);
        let r = da.traverse(&probe, 0, 0);
        prop_assert_eq!(r.status, expected_traversal(&dict, &probe));
        if r.status != Traversal::Mismatch {
            prop_assert_eq!(r.offset, probe.len());
        } else {
            // Everything before the failing byte is a live path.
            prop_assert!(r.offset < probe.len());
            prop_assert_ne!(expected_traversal(&dict, &probe[..r.offset]), Traversal::Mismatch);
        }
    }

    #[test]
    fn prop_bytes_round_trip(dict in dict_strategy(), probe in probe_strategy()) {
        let da = build(&dict);
        let mut bytes = Vec::new();
        da.save(&mut bytes).unwrap();
        prop_assert_eq!(bytes.len(), da.total_size());

        let loaded = DoubleArray::from_bytes(bytes).unwrap();
        for key in dict.keys() {
            prop_assert_eq!(loaded.exact_match(key), da.exact_match(key));
        }
        prop_assert_eq!(loaded.traverse(&probe, 0, 0), da.traverse(&probe, 0, 0));
    }
}
