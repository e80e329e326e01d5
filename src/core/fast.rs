//! Bucketed single-threshold grouping for large lists.
//!
//! Items are first bucketed by their similarity to a synthetic reference
//! string so the pairwise pass only runs inside each bucket. Inside a bucket
//! the first unmatched item becomes a master and claims every remaining item
//! that reaches the limit against it directly (no transitive absorption).
//!
//! Buckets are discretised at `floor(score * 1000)`, so two close items whose
//! reference scores differ at all never meet. That loss of recall is the price
//! of the pre-bucketing and is kept as-is.

use crate::core::assemble::restore_input_order;
use crate::core::item::{materialize, GroupingResult, ItemList};
use crate::core::similarity::similarity;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hash;

pub const DEFAULT_LOWEST_MATCH_LIMIT: i32 = 95;

const REFERENCE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const BUCKET_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastOptions {
    /// Minimum similarity to a master, clamped to `[0, 100]`.
    pub lowest_match_limit: i32,
}

impl Default for FastOptions {
    fn default() -> Self {
        Self {
            lowest_match_limit: DEFAULT_LOWEST_MATCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FastOutcome<K> {
    pub groups: GroupingResult<K>,
    pub buckets: usize,
    pub comparisons: u64,
}

/// The alphabet repeated out to the rounded mean byte length of `texts`.
pub fn reference_string(texts: &[&str]) -> String {
    if texts.is_empty() {
        return String::new();
    }
    let total: usize = texts.iter().map(|text| text.len()).sum();
    let mean = (total as f64 / texts.len() as f64).round() as usize;

    REFERENCE_ALPHABET
        .iter()
        .cycle()
        .take(mean)
        .map(|&byte| byte as char)
        .collect()
}

pub fn bucket_key(reference: &str, text: &str) -> i64 {
    (similarity(reference, text) * BUCKET_SCALE).floor() as i64
}

/// One master and its scores against the items still unmatched when it was picked.
struct MasterRow {
    master: usize,
    scores: Vec<(usize, f64)>,
}

pub struct FastGrouper {
    options: FastOptions,
}

impl FastGrouper {
    pub fn new(options: FastOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FastOptions {
        &self.options
    }

    pub fn group<K: Clone + Eq + Hash>(&self, items: &ItemList<K>) -> FastOutcome<K> {
        if items.is_empty() {
            return FastOutcome {
                groups: Vec::new(),
                buckets: 0,
                comparisons: 0,
            };
        }

        let texts = items.texts();
        let reference = reference_string(&texts);

        let mut by_key: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (pos, text) in texts.iter().enumerate() {
            by_key
                .entry(bucket_key(&reference, text))
                .or_default()
                .push(pos);
        }
        let buckets: Vec<(i64, Vec<usize>)> = by_key.into_iter().collect();

        let limit = f64::from(self.options.lowest_match_limit.clamp(0, 100));
        let per_bucket: Vec<(Vec<Vec<usize>>, u64)> = buckets
            .par_iter()
            .map(|(key, members)| {
                let (groups, comparisons) = quick_group(&texts, members, limit);
                debug!(
                    "Bucket {}: {} item(s) -> {} group(s)",
                    key,
                    members.len(),
                    groups.len()
                );
                (groups, comparisons)
            })
            .collect();

        let comparisons: u64 = per_bucket.iter().map(|(_, count)| count).sum();
        let positions: Vec<Vec<usize>> = per_bucket
            .into_iter()
            .flat_map(|(groups, _)| groups)
            .collect();
        let groups = restore_input_order(materialize(items, &positions), items);

        info!(
            "Grouped {} item(s) into {} group(s) across {} bucket(s), {} comparison(s)",
            items.len(),
            groups.len(),
            buckets.len(),
            comparisons
        );

        FastOutcome {
            groups,
            buckets: buckets.len(),
            comparisons,
        }
    }
}

impl Default for FastGrouper {
    fn default() -> Self {
        Self::new(FastOptions::default())
    }
}

/// Group the positions of one bucket around masters picked in input order.
fn quick_group(texts: &[&str], members: &[usize], limit: f64) -> (Vec<Vec<usize>>, u64) {
    let (rows, comparisons) = create_map(texts, members, limit);

    let groups = rows
        .into_iter()
        .map(|row| {
            let mut group = vec![row.master];
            group.extend(
                row.scores
                    .iter()
                    .filter(|(_, score)| *score >= limit)
                    .map(|(pos, _)| *pos),
            );
            group
        })
        .collect();

    (groups, comparisons)
}

fn create_map(texts: &[&str], members: &[usize], limit: f64) -> (Vec<MasterRow>, u64) {
    let mut rows = Vec::new();
    let mut unmatched: Vec<usize> = members.to_vec();
    let mut comparisons = 0;

    while let Some((&master, rest)) = unmatched.split_first() {
        let mut scores = Vec::with_capacity(rest.len());
        let mut still_unmatched = Vec::with_capacity(rest.len());
        for &other in rest {
            let score = similarity(texts[master], texts[other]);
            comparisons += 1;
            scores.push((other, score));
            if score < limit {
                still_unmatched.push(other);
            }
        }
        rows.push(MasterRow { master, scores });
        unmatched = still_unmatched;
    }

    (rows, comparisons)
}

/// Group `items` with the bucketed single-threshold strategy.
pub fn by_similarity_fast<K: Clone + Eq + Hash>(
    items: &ItemList<K>,
    lowest_match_limit: i32,
) -> GroupingResult<K> {
    FastGrouper::new(FastOptions { lowest_match_limit })
        .group(items)
        .groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exhaustive::by_exhaustive_similarity;
    use crate::core::fixtures::{
        assert_partition, file_names, generated_items, keys_of, short_codes,
    };

    fn as_partition<K: Clone + Ord>(groups: &[crate::core::item::Group<K>]) -> Vec<Vec<K>> {
        let mut sets: Vec<Vec<K>> = keys_of(groups)
            .into_iter()
            .map(|mut keys| {
                keys.sort();
                keys
            })
            .collect();
        sets.sort();
        sets
    }

    #[test]
    fn test_reference_string() {
        assert_eq!(reference_string(&[]), "");
        assert_eq!(reference_string(&["abc", "abcd"]), "abcd");
        assert_eq!(reference_string(&["", ""]), "");
        assert_eq!(
            reference_string(&["x".repeat(30).as_str()]),
            "abcdefghijklmnopqrstuvwxyzabcd"
        );
    }

    #[test]
    fn test_bucket_key_scale() {
        assert_eq!(bucket_key("abcd", "abcd"), 100_000);
        assert_eq!(bucket_key("abcd", "abcx"), 75_000);
        assert_eq!(bucket_key("abcd", "WXYZ"), 0);
    }

    #[test]
    fn test_empty_input() {
        let items: ItemList<usize> = ItemList::new();
        let outcome = FastGrouper::default().group(&items);
        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.buckets, 0);
    }

    #[test]
    fn test_clusters_in_input_order() {
        let groups = by_similarity_fast(&file_names(), 93);
        assert_eq!(
            keys_of(&groups),
            vec![
                vec!["a", "c", "e", "i"],
                vec!["b", "d", "g", "h"],
                vec!["f"],
            ]
        );
    }

    #[test]
    fn test_agrees_with_exhaustive_on_separated_clusters() {
        let items = file_names();
        let fast = by_similarity_fast(&items, 93);
        let exhaustive = by_exhaustive_similarity(&items, true, 93, true);
        assert_eq!(as_partition(&fast), as_partition(&exhaustive));
    }

    #[test]
    fn test_short_codes_in_one_bucket() {
        let outcome = FastGrouper::default().group(&short_codes());

        assert_eq!(outcome.buckets, 1);
        assert_eq!(outcome.comparisons, 16);
        assert_eq!(
            keys_of(&outcome.groups),
            vec![vec![0, 1], vec![2], vec![3], vec![4], vec![5], vec![6]]
        );
    }

    #[test]
    fn test_members_must_match_the_master_directly() {
        // No lowercase letters, so everything shares bucket 0. b~master is 80%,
        // c~master only 60% even though c~b is 80%.
        let items: ItemList<&str> = [
            ("a", "ABCDEFGHIJ"),
            ("b", "ABCDEFGHXY"),
            ("c", "ABCDEFXYZW"),
        ]
        .into_iter()
        .collect();

        let outcome = FastGrouper::new(FastOptions {
            lowest_match_limit: 80,
        })
        .group(&items);

        assert_eq!(outcome.buckets, 1);
        assert_eq!(keys_of(&outcome.groups), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_bucket_boundaries_are_not_crossed() {
        // 75% similar, but their reference scores put them in different buckets.
        let items: ItemList<usize> = ["abcd", "abcx"].into_iter().enumerate().collect();

        let outcome = FastGrouper::new(FastOptions {
            lowest_match_limit: 50,
        })
        .group(&items);

        assert_eq!(outcome.buckets, 2);
        assert_eq!(outcome.comparisons, 0);
        assert_eq!(keys_of(&outcome.groups), vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_partition_and_determinism_on_generated_input() {
        let items = generated_items(200, 3);
        for limit in [95, 80, 60, 0] {
            let first = by_similarity_fast(&items, limit);
            let second = by_similarity_fast(&items, limit);
            assert_partition(&items, &first);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_groups_sorted_by_first_member_position() {
        let items = generated_items(120, 17);
        let groups = by_similarity_fast(&items, 70);
        let firsts: Vec<usize> = groups.iter().map(|group| group.first().key).collect();
        let mut sorted = firsts.clone();
        sorted.sort();
        assert_eq!(firsts, sorted);
    }

    #[test]
    fn test_regrouping_flattened_output_is_stable() {
        let groups = by_similarity_fast(&file_names(), 93);
        let flattened: ItemList<&str> = groups
            .iter()
            .flat_map(|group| group.iter().map(|item| (item.key, item.text.clone())))
            .collect();

        let regrouped = by_similarity_fast(&flattened, 93);
        assert_eq!(as_partition(&regrouped), as_partition(&groups));
    }
}
