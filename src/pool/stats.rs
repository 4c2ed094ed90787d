use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::{ContentRecord, SourceType};

use super::PoolSource;

/// Size and category spread of one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    pub categories: BTreeMap<String, usize>,
    /// Ties go to the category that appeared first in the pool.
    pub most_common_category: Option<String>,
}

impl PoolStats {
    pub fn from_records(records: &[ContentRecord]) -> Self {
        let mut categories = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();
        for record in records {
            let count = categories.entry(record.category.clone()).or_insert(0);
            if *count == 0 {
                order.push(&record.category);
            }
            *count += 1;
        }

        let mut most_common: Option<(&str, usize)> = None;
        for category in order {
            let count = categories[category];
            if most_common.is_none_or(|(_, best)| count > best) {
                most_common = Some((category, count));
            }
        }

        Self {
            total: records.len(),
            most_common_category: most_common.map(|(c, _)| c.to_string()),
            categories,
        }
    }
}

/// Statistics for every source type, in reporting order.
pub fn pool_stats(source: &dyn PoolSource) -> BTreeMap<SourceType, PoolStats> {
    SourceType::ALL
        .into_iter()
        .map(|t| (t, PoolStats::from_records(&source.load_pool(t))))
        .collect()
}
