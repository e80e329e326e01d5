//! Shared inputs and assertions for grouping tests.

use crate::core::item::{Group, ItemList};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

pub fn unrelated_words() -> ItemList<&'static str> {
    [
        ("a", "there"),
        ("b", "is"),
        ("c", "no"),
        ("d", "logic"),
        ("e", "to"),
        ("f", "match"),
        ("g", "these"),
        ("h", "list"),
        ("i", "items"),
    ]
    .into_iter()
    .collect()
}

pub fn file_names() -> ItemList<&'static str> {
    [
        ("a", "file_9_bar_02.png"),
        ("b", "file_0_a_002.png"),
        ("c", "file_9_bar_12.png"),
        ("d", "file_0_a_001.png"),
        ("e", "file_9_bar_04.png"),
        ("f", "unrelated_file_001.png"),
        ("g", "file_0_a_003.png"),
        ("h", "file_0_a_004.png"),
        ("i", "file_9_bar_05.png"),
    ]
    .into_iter()
    .collect()
}

pub fn short_codes() -> ItemList<usize> {
    ["a1", "a1", "a2", "a3", "b1", "b2", "b3"]
        .into_iter()
        .enumerate()
        .collect()
}

/// Deterministic pseudo-random names built from a few shared stems.
pub fn generated_items(count: usize, seed: u64) -> ItemList<usize> {
    const STEMS: [&str; 5] = ["invoice_", "IMG_", "holiday-photo-", "scan", "report_final_"];
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    (0..count)
        .map(|pos| {
            let stem = STEMS[next() % STEMS.len()];
            let suffix = next() % 1000;
            let ext = if next() % 2 == 0 { "jpg" } else { "pdf" };
            (pos, format!("{stem}{suffix:03}.{ext}"))
        })
        .collect()
}

pub fn keys_of<K: Clone>(groups: &[Group<K>]) -> Vec<Vec<K>> {
    groups
        .iter()
        .map(|group| group.keys().cloned().collect())
        .collect()
}

/// Every input key appears in exactly one group and nothing else does.
pub fn assert_partition<K: Clone + Eq + Hash + Debug>(items: &ItemList<K>, groups: &[Group<K>]) {
    let mut seen = HashSet::new();
    for group in groups {
        assert!(group.len() > 0, "empty group");
        for item in group {
            assert!(seen.insert(item.key.clone()), "duplicate key {:?}", item.key);
            assert_eq!(items.get(&item.key), Some(item.text.as_str()));
        }
    }
    assert_eq!(seen.len(), items.len());
}
