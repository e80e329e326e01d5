use crate::core::assemble::group_balance;
use crate::core::{ExhaustiveGrouper, FastGrouper, Group, ItemList};
use crate::services::config::{Algorithm, GroupingConfig};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::hash::Hash;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of one grouping run, ready to print or write as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct GroupingReport<K> {
    pub generated_at: String,
    pub algorithm: Algorithm,
    pub item_count: usize,
    pub group_count: usize,
    pub multi_groups: usize,
    pub singletons: usize,
    /// Exhaustive only: the accepted threshold, absent when the fallback was used.
    pub accepted_threshold: Option<u8>,
    /// Fast only: number of pre-buckets.
    pub buckets: Option<usize>,
    pub comparisons: u64,
    pub budget_exhausted: bool,
    pub groups: Vec<Group<K>>,
}

impl<K: Clone + Eq + Hash> GroupingReport<K> {
    /// Run the configured grouper over `items`.
    pub fn generate(config: &GroupingConfig, items: &ItemList<K>) -> Self {
        match config.algorithm {
            Algorithm::Exhaustive => {
                let outcome = ExhaustiveGrouper::new(config.exhaustive_options()).group(items);
                Self::new(
                    Algorithm::Exhaustive,
                    items.len(),
                    outcome.groups,
                    outcome.accepted_threshold,
                    None,
                    outcome.comparisons,
                    outcome.budget_exhausted,
                )
            }
            Algorithm::Fast => {
                let outcome = FastGrouper::new(config.fast_options()).group(items);
                Self::new(
                    Algorithm::Fast,
                    items.len(),
                    outcome.groups,
                    None,
                    Some(outcome.buckets),
                    outcome.comparisons,
                    false,
                )
            }
        }
    }

    fn new(
        algorithm: Algorithm,
        item_count: usize,
        groups: Vec<Group<K>>,
        accepted_threshold: Option<u8>,
        buckets: Option<usize>,
        comparisons: u64,
        budget_exhausted: bool,
    ) -> Self {
        let (multi_groups, singletons) = group_balance(groups.iter().map(Group::len));
        Self {
            generated_at: Utc::now().to_rfc3339(),
            algorithm,
            item_count,
            group_count: groups.len(),
            multi_groups,
            singletons,
            accepted_threshold,
            buckets,
            comparisons,
            budget_exhausted,
            groups,
        }
    }
}

impl<K: Serialize> GroupingReport<K> {
    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json_pretty()? + "\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn names() -> ItemList<String> {
        [
            ("a", "file_9_bar_02.png"),
            ("b", "file_0_a_002.png"),
            ("c", "file_9_bar_12.png"),
            ("d", "file_0_a_001.png"),
            ("e", "unrelated_file_001.png"),
        ]
        .into_iter()
        .map(|(key, text)| (key.to_string(), text))
        .collect()
    }

    #[test]
    fn test_exhaustive_report() {
        let config = GroupingConfig {
            lower_match_limit: 80,
            ..GroupingConfig::default()
        };
        let report = GroupingReport::generate(&config, &names());

        assert_eq!(report.algorithm, Algorithm::Exhaustive);
        assert_eq!(report.item_count, 5);
        assert_eq!(report.group_count, 3);
        assert_eq!((report.multi_groups, report.singletons), (2, 1));
        assert_eq!(report.accepted_threshold, Some(93));
        assert!(report.buckets.is_none());
    }

    #[test]
    fn test_fast_report() {
        let config = GroupingConfig {
            algorithm: Algorithm::Fast,
            lower_match_limit: 93,
            ..GroupingConfig::default()
        };
        let report = GroupingReport::generate(&config, &names());

        assert_eq!(report.algorithm, Algorithm::Fast);
        assert_eq!(report.group_count, 3);
        assert!(report.buckets.is_some());
        assert!(report.accepted_threshold.is_none());
        assert!(!report.budget_exhausted);
    }

    #[test]
    fn test_json_shape() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("groups.json");
        let config = GroupingConfig {
            lower_match_limit: 80,
            ..GroupingConfig::default()
        };

        GroupingReport::generate(&config, &names())
            .write_json(&path)
            .unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["algorithm"], "exhaustive");
        assert_eq!(value["accepted_threshold"], 93);
        assert!(value["generated_at"].as_str().unwrap().contains('T'));

        let first = value["groups"][0].as_object().unwrap();
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert_eq!(value["groups"][2]["e"], "unrelated_file_001.png");
    }
}
