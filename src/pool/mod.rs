pub mod stats;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::record::{ContentRecord, SourceType};

pub use stats::{pool_stats, PoolStats};

/// Supplies the candidate pool for each source type.
///
/// Absent or unreadable pools are reported as empty, never as errors.
pub trait PoolSource {
    fn load_pool(&self, source_type: SourceType) -> Vec<ContentRecord>;
}

/// Pools held in memory, keyed by source type.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPoolSource {
    pools: HashMap<SourceType, Vec<ContentRecord>>,
}

impl InMemoryPoolSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, source_type: SourceType, records: Vec<ContentRecord>) -> Self {
        self.insert(source_type, records);
        self
    }

    /// Replace the pool for `source_type`. Records are retagged with it.
    pub fn insert(&mut self, source_type: SourceType, mut records: Vec<ContentRecord>) {
        for record in &mut records {
            record.source_type = source_type;
        }
        self.pools.insert(source_type, records);
    }
}

impl PoolSource for InMemoryPoolSource {
    fn load_pool(&self, source_type: SourceType) -> Vec<ContentRecord> {
        self.pools.get(&source_type).cloned().unwrap_or_default()
    }
}

/// One entry of a pool file. The source type comes from the file name.
#[derive(Debug, Deserialize)]
struct PoolItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "desc")]
    description: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    cta: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

impl PoolItem {
    fn into_record(self, source_type: SourceType) -> ContentRecord {
        ContentRecord {
            title: self.title,
            description: self.description,
            link: self.link,
            cta: self.cta,
            category: self.category.unwrap_or_default(),
            source_type,
        }
        .validate()
    }
}

/// Pools stored as YAML lists, one file per section: `tips.yml`,
/// `trends.yml`, `automations.yml`, `videos.yml`.
#[derive(Debug, Clone)]
pub struct YamlDirPoolSource {
    dir: PathBuf,
}

impl YamlDirPoolSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, source_type: SourceType) -> PathBuf {
        self.dir.join(format!("{}.yml", source_type.section()))
    }
}

impl PoolSource for YamlDirPoolSource {
    fn load_pool(&self, source_type: SourceType) -> Vec<ContentRecord> {
        let path = self.path_for(source_type);
        match read_pool_file(&path) {
            Some(items) => {
                tracing::debug!("loaded {} {} from {}", items.len(), source_type, path.display());
                items
                    .into_iter()
                    .map(|item| item.into_record(source_type))
                    .collect()
            }
            None => Vec::new(),
        }
    }
}

fn read_pool_file(path: &Path) -> Option<Vec<PoolItem>> {
    if !path.exists() {
        tracing::warn!("pool file not found: {}", path.display());
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("failed to read pool file {}: {}", path.display(), e);
            return None;
        }
    };
    if contents.trim().is_empty() {
        return Some(Vec::new());
    }
    match serde_yaml::from_str::<Vec<PoolItem>>(&contents) {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::warn!("failed to parse pool file {}: {}", path.display(), e);
            None
        }
    }
}
