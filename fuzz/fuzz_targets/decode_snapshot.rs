#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tree) = revtree_core::decode_snapshot(text) {
        let encoded = revtree_core::encode_snapshot(&tree).expect("encode decoded tree");
        let again = revtree_core::decode_snapshot(&encoded).expect("decode re-encoded tree");
        assert_eq!(tree, again);
        let _ = tree.merge();
    }
});
