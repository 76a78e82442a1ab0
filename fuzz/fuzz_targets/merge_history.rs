#![no_main]

use libfuzzer_sys::fuzz_target;
use revtree_core::{Hash, MergeConfig, Metadata, Revision, RevisionTree, Value};

// Each pair of bytes adds one revision: the first picks up to two parents
// among earlier revisions, the second sets a field.
fuzz_target!(|data: &[u8]| {
    let content = Hash::digest(b"fuzz");
    let mut revisions: Vec<Revision> = Vec::new();
    for chunk in data.chunks_exact(2).take(64) {
        let (shape, field) = (chunk[0], chunk[1]);
        let mut parents = Vec::new();
        if !revisions.is_empty() && shape & 0x80 == 0 {
            parents.push(revisions[usize::from(shape & 0x3f) % revisions.len()].revision());
            if shape & 0x40 != 0 {
                parents.push(revisions[usize::from(field) % revisions.len()].revision());
            }
        }
        let mut metadata = Metadata::new();
        metadata.insert(
            format!("k{}", field % 4),
            Value::from(i64::from(field >> 2)),
        );
        revisions.push(Revision::new(content, 1, parents, field & 1 == 1, metadata));
    }

    let tree: RevisionTree = revisions.iter().cloned().collect();
    // Base nesting cannot exceed the number of revisions.
    let config = MergeConfig {
        max_virtual_base_depth: revisions.len(),
        ..MergeConfig::default()
    };
    let merged = tree.merge_with(&config);
    if !tree.is_empty() {
        assert_eq!(merged.heads().len(), 1);
    }
    for revision in &revisions {
        assert!(merged.contains(&revision.revision()));
    }
});
