use crate::core::item::{Group, GroupingResult, ItemList};
use std::hash::Hash;

/// Reorder `groups` by where each group's representative key sits in `input`.
///
/// The sort is stable, so groups whose representatives share a position (or
/// are missing from `input`, which sorts them last) keep their encounter order.
pub fn restore_input_order<K: Clone + Eq + Hash>(
    groups: Vec<Group<K>>,
    input: &ItemList<K>,
) -> GroupingResult<K> {
    let mut positioned: Vec<(usize, Group<K>)> = groups
        .into_iter()
        .map(|group| {
            let pos = input.position_of(&group.first().key).unwrap_or(usize::MAX);
            (pos, group)
        })
        .collect();

    positioned.sort_by_key(|(pos, _)| *pos);
    positioned.into_iter().map(|(_, group)| group).collect()
}

/// Count (multi-member groups, singletons) from a sequence of group sizes.
pub fn group_balance<I: IntoIterator<Item = usize>>(sizes: I) -> (usize, usize) {
    sizes
        .into_iter()
        .fold((0, 0), |(multi, singles), size| match size {
            0 => (multi, singles),
            1 => (multi, singles + 1),
            _ => (multi + 1, singles),
        })
}
