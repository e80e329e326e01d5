use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// A keyed piece of text taking part in grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<K> {
    pub key: K,
    pub text: String,
}

impl<K> Item<K> {
    pub fn new(key: K, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
        }
    }
}

/// Insertion-ordered map from key to text.
///
/// Order matters: the first remaining item seeds each new group and output
/// ordering follows input positions. Re-inserting an existing key keeps its
/// position and replaces the text.
#[derive(Debug, Clone)]
pub struct ItemList<K> {
    entries: Vec<Item<K>>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> ItemList<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite `key`. Returns `true` if the key was new.
    pub fn insert(&mut self, key: K, text: impl Into<String>) -> bool {
        let text = text.into();
        if let Some(&pos) = self.index.get(&key) {
            self.entries[pos].text = text;
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(Item { key, text });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&str> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].text.as_str())
    }

    /// Original insertion position of `key`.
    pub fn position_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn first(&self) -> Option<&Item<K>> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&Item<K>> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item<K>> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|item| &item.key)
    }

    pub(crate) fn item_at(&self, pos: usize) -> &Item<K> {
        &self.entries[pos]
    }

    pub(crate) fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|item| item.text.as_str()).collect()
    }
}

impl<K: Clone + Eq + Hash> Default for ItemList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash, S: Into<String>> FromIterator<(K, S)> for ItemList<K> {
    fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
        let mut list = ItemList::new();
        for (key, text) in iter {
            list.insert(key, text);
        }
        list
    }
}

impl<'a, K> IntoIterator for &'a ItemList<K> {
    type Item = &'a Item<K>;
    type IntoIter = std::slice::Iter<'a, Item<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A non-empty run of items judged similar, in the order they joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<K> {
    members: Vec<Item<K>>,
}

impl<K> Group<K> {
    /// Start a group from its seed (or master) item.
    pub fn seeded(seed: Item<K>) -> Self {
        Self {
            members: vec![seed],
        }
    }

    pub fn push(&mut self, item: Item<K>) {
        self.members.push(item);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// The representative (first) member. Groups are never empty.
    pub fn first(&self) -> &Item<K> {
        &self.members[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item<K>> {
        self.members.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.members.iter().map(|item| &item.key)
    }

    pub fn into_items(self) -> Vec<Item<K>> {
        self.members
    }
}

impl<'a, K> IntoIterator for &'a Group<K> {
    type Item = &'a Item<K>;
    type IntoIter = std::slice::Iter<'a, Item<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Serialized as an ordered JSON object `{key: text}`.
impl<K: Serialize> Serialize for Group<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.members.len()))?;
        for item in &self.members {
            map.serialize_entry(&item.key, &item.text)?;
        }
        map.end()
    }
}

/// Ordered partition of an [`ItemList`]: every input item lands in exactly one group.
pub type GroupingResult<K> = Vec<Group<K>>;

/// Build groups of items from groups of input positions.
pub(crate) fn materialize<K: Clone + Eq + Hash>(
    items: &ItemList<K>,
    positions: &[Vec<usize>],
) -> GroupingResult<K> {
    positions
        .iter()
        .filter_map(|members| {
            let (&seed, rest) = members.split_first()?;
            let mut group = Group::seeded(items.item_at(seed).clone());
            for &pos in rest {
                group.push(items.item_at(pos).clone());
            }
            Some(group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut list = ItemList::new();
        assert!(list.insert("a", "one"));
        assert!(list.insert("b", "two"));
        assert!(!list.insert("a", "three"));

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(&"a"), Some("three"));
        assert_eq!(list.position_of(&"a"), Some(0));
        assert_eq!(list.first().map(|i| i.key), Some("a"));
        assert_eq!(list.last().map(|i| i.key), Some("b"));
    }

    #[test]
    fn test_group_serializes_as_ordered_object() {
        let mut group = Group::seeded(Item::new("z", "last-letter"));
        group.push(Item::new("a", "first-letter"));

        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(json, r#"{"z":"last-letter","a":"first-letter"}"#);
    }

    #[test]
    fn test_materialize_skips_empty_groups() {
        let items: ItemList<usize> = ["x", "y", "z"].iter().copied().enumerate().collect();
        let groups = materialize(&items, &[vec![2, 0], vec![], vec![1]]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].keys().copied().collect::<Vec<_>>(), vec![2, 0]);
        assert!(groups[1].is_singleton());
    }
}
