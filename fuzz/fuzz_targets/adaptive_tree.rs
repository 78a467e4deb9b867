#![no_main]
use entrolab::adaptive::{AdaptiveHuffman, LeaderSearch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Vec<u8>| {
    if data.is_empty() || data.len() > 4096 {
        return;
    }

    let mut indexed = AdaptiveHuffman::with_lookup(256, LeaderSearch::Blocks);
    let mut scanned = AdaptiveHuffman::with_lookup(256, LeaderSearch::TreeScan);

    for &byte in &data {
        indexed.push(u128::from(byte));
        scanned.update(u128::from(byte));

        assert!(indexed.sibling_property_holds());
    }

    assert_eq!(indexed.dump_tree(), scanned.dump_tree());
    assert_eq!(indexed.leaf_weight_sum(), data.len() as u64);
});
