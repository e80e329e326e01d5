pub mod assemble;
pub mod exhaustive;
pub mod fast;
pub mod item;
pub mod similarity;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assemble::restore_input_order;
pub use exhaustive::{
    by_exhaustive_similarity, ExhaustiveGrouper, ExhaustiveOptions, ExhaustiveOutcome,
};
pub use fast::{by_similarity_fast, FastGrouper, FastOptions, FastOutcome};
pub use item::{Group, GroupingResult, Item, ItemList};
pub use similarity::similarity;
