//! Exhaustive grouping with a relaxing similarity threshold.
//!
//! Each threshold pass clusters every item by pairwise comparison, seeding a
//! group with the first ungrouped item and absorbing anything that reaches the
//! threshold against any current member until nothing else joins. Thresholds
//! are tried from strict to loose and the first pass that satisfies the
//! acceptance gate wins.

use crate::core::assemble::group_balance;
use crate::core::item::{materialize, GroupingResult, ItemList};
use crate::core::similarity::similarity;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Smallest group size that counts as a real group.
pub const MIN_GROUP_SIZE: usize = 2;

pub const DEFAULT_LOWER_MATCH_LIMIT: i32 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhaustiveOptions {
    /// Start the search at 99 instead of 100.
    pub ignore_pure_matches: bool,
    /// Loosest threshold tried, clamped to `[0, 100]`.
    pub lower_match_limit: i32,
    /// Only accept a pass with at least as many multi-member groups as singletons.
    pub groups_must_outweigh_singles: bool,
    /// Cap on similarity evaluations across all passes. `None` is unbounded.
    pub max_comparisons: Option<u64>,
}

impl Default for ExhaustiveOptions {
    fn default() -> Self {
        Self {
            ignore_pure_matches: true,
            lower_match_limit: DEFAULT_LOWER_MATCH_LIMIT,
            groups_must_outweigh_singles: true,
            max_comparisons: None,
        }
    }
}

impl ExhaustiveOptions {
    /// Candidate thresholds, strictest first. Empty when the floor is above the start.
    pub fn thresholds(&self) -> impl Iterator<Item = u8> {
        let start: u8 = if self.ignore_pure_matches { 99 } else { 100 };
        let floor = self.lower_match_limit.clamp(0, 100) as u8;
        (floor..=start).rev()
    }
}

#[derive(Debug, Clone)]
pub struct ExhaustiveOutcome<K> {
    pub groups: GroupingResult<K>,
    /// Threshold whose pass passed the gate; `None` if the fallback was used.
    pub accepted_threshold: Option<u8>,
    /// Threshold passes completed.
    pub passes: usize,
    pub comparisons: u64,
    pub budget_exhausted: bool,
}

/// Similarity evaluation allowance shared by all passes of one call.
#[derive(Debug)]
struct ComparisonBudget {
    limit: Option<u64>,
    used: u64,
}

impl ComparisonBudget {
    fn new(limit: Option<u64>) -> Self {
        Self { limit, used: 0 }
    }

    fn try_spend(&mut self) -> bool {
        if self.limit.is_some_and(|limit| self.used >= limit) {
            return false;
        }
        self.used += 1;
        true
    }
}

/// Scores already computed in the current pass, keyed by (reference, candidate).
#[derive(Debug, Default)]
struct PairCache {
    scores: HashMap<(usize, usize), f64>,
}

impl PairCache {
    /// Cached or freshly computed score. `None` once the budget is spent.
    fn score(
        &mut self,
        texts: &[&str],
        reference: usize,
        candidate: usize,
        budget: &mut ComparisonBudget,
    ) -> Option<f64> {
        if let Some(&score) = self.scores.get(&(reference, candidate)) {
            return Some(score);
        }
        if !budget.try_spend() {
            return None;
        }
        let score = similarity(texts[reference], texts[candidate]);
        self.scores.insert((reference, candidate), score);
        Some(score)
    }
}

pub struct ExhaustiveGrouper {
    options: ExhaustiveOptions,
}

impl ExhaustiveGrouper {
    pub fn new(options: ExhaustiveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExhaustiveOptions {
        &self.options
    }

    pub fn group<K: Clone + Eq + Hash>(&self, items: &ItemList<K>) -> ExhaustiveOutcome<K> {
        if items.is_empty() {
            return ExhaustiveOutcome {
                groups: Vec::new(),
                accepted_threshold: None,
                passes: 0,
                comparisons: 0,
                budget_exhausted: false,
            };
        }

        let texts = items.texts();
        let mut budget = ComparisonBudget::new(self.options.max_comparisons);
        let mut last_pass: Option<Vec<Vec<usize>>> = None;
        let mut passes = 0;
        let mut budget_exhausted = false;

        for threshold in self.options.thresholds() {
            let Some(groups) = threshold_pass(&texts, threshold, &mut budget) else {
                warn!(
                    "Comparison budget of {} exhausted during the {}% pass",
                    budget.used, threshold
                );
                budget_exhausted = true;
                break;
            };
            passes += 1;

            let largest = groups.iter().map(Vec::len).max().unwrap_or(0);
            let (multi, singles) = group_balance(groups.iter().map(Vec::len));
            debug!(
                "Pass at {}%: {} group(s), {} multi, {} single, largest {}",
                threshold,
                groups.len(),
                multi,
                singles,
                largest
            );

            if self.accepts(largest, multi, singles) {
                info!(
                    "Accepted threshold {}% after {} pass(es), {} comparison(s)",
                    threshold, passes, budget.used
                );
                return ExhaustiveOutcome {
                    groups: materialize(items, &groups),
                    accepted_threshold: Some(threshold),
                    passes,
                    comparisons: budget.used,
                    budget_exhausted,
                };
            }
            last_pass = Some(groups);
        }

        let fallback = match last_pass {
            Some(groups) if groups.len() > 1 => groups,
            _ => vec![(0..items.len()).collect()],
        };
        info!(
            "No threshold accepted after {} pass(es); returning {} fallback group(s)",
            passes,
            fallback.len()
        );

        ExhaustiveOutcome {
            groups: materialize(items, &fallback),
            accepted_threshold: None,
            passes,
            comparisons: budget.used,
            budget_exhausted,
        }
    }

    fn accepts(&self, largest: usize, multi: usize, singles: usize) -> bool {
        if largest < MIN_GROUP_SIZE {
            return false;
        }
        !self.options.groups_must_outweigh_singles || multi >= singles
    }
}

impl Default for ExhaustiveGrouper {
    fn default() -> Self {
        Self::new(ExhaustiveOptions::default())
    }
}

/// Cluster all positions at one threshold. `None` if the budget ran out.
fn threshold_pass(
    texts: &[&str],
    threshold: u8,
    budget: &mut ComparisonBudget,
) -> Option<Vec<Vec<usize>>> {
    let limit = f64::from(threshold);
    let count = texts.len();
    let mut grouped = vec![false; count];
    let mut remaining = count;
    let mut cache = PairCache::default();
    let mut groups = Vec::new();
    let mut next_seed = 0;

    while remaining > 0 {
        while grouped[next_seed] {
            next_seed += 1;
        }
        let seed = next_seed;
        grouped[seed] = true;
        remaining -= 1;
        let mut members = vec![seed];

        // Absorb until a full sweep over the members adds nobody.
        loop {
            let before = remaining;
            let sweep = members.len();
            for member in 0..sweep {
                let reference = members[member];
                for candidate in 0..count {
                    if grouped[candidate] {
                        continue;
                    }
                    let score = cache.score(texts, reference, candidate, budget)?;
                    if score >= limit {
                        grouped[candidate] = true;
                        remaining -= 1;
                        members.push(candidate);
                    }
                }
            }
            if remaining == before {
                break;
            }
        }

        groups.push(members);
    }

    Some(groups)
}

/// Group `items` with the exhaustive threshold search and no comparison cap.
pub fn by_exhaustive_similarity<K: Clone + Eq + Hash>(
    items: &ItemList<K>,
    ignore_pure_matches: bool,
    lower_match_limit: i32,
    groups_must_outweigh_singles: bool,
) -> GroupingResult<K> {
    ExhaustiveGrouper::new(ExhaustiveOptions {
        ignore_pure_matches,
        lower_match_limit,
        groups_must_outweigh_singles,
        max_comparisons: None,
    })
    .group(items)
    .groups
}
