//! Group short texts such as file names or descriptions into clusters of
//! similar items.
//!
//! Two strategies share one contract: an exhaustive search that relaxes a
//! similarity threshold until the grouping looks meaningful, and a faster
//! bucketed variant for large lists. Both return an ordered partition of the
//! input where every item keeps its original key.

pub mod core;
pub mod services;

pub use crate::core::{
    by_exhaustive_similarity, by_similarity_fast, restore_input_order, similarity,
    ExhaustiveGrouper, ExhaustiveOptions, ExhaustiveOutcome, FastGrouper, FastOptions,
    FastOutcome, Group, GroupingResult, Item, ItemList,
};
