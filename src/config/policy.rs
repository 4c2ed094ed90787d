use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::admission::MAX_BLOCKING_SEVERITY;
use crate::error::{DigestGateError, Result};
use crate::finding::Severity;
use crate::links::LinkPolicy;
use crate::record::SourceType;
use crate::scan::Placeholders;

/// Top-level gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Admission thresholds and replacement markers.
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Per-type targets and backfill tuning.
    #[serde(default)]
    pub curation: CurationConfig,

    /// Domain lists and URL limits.
    #[serde(default)]
    pub links: LinkPolicy,

    #[serde(default)]
    pub scanner: ScannerConfig,
}

impl GateConfig {
    /// Load config from a YAML file. Returns default if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&contents).map_err(|e| DigestGateError::ConfigParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.check().map_err(|reason| DigestGateError::ConfigParse {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Reject settings that would let unsafe records into a batch.
    fn check(&self) -> std::result::Result<(), String> {
        if self.admission.blocking_severity > MAX_BLOCKING_SEVERITY {
            return Err(format!(
                "admission.blocking_severity must be at most {MAX_BLOCKING_SEVERITY}, got {}",
                self.admission.blocking_severity
            ));
        }
        Ok(())
    }

    /// Load config from the project root. Checks `.digest-gate/config.yml`.
    pub fn load_project(project_root: &Path) -> Result<Self> {
        Self::load_from(&project_config_path(project_root))
    }
}

/// `<root>/.digest-gate/config.yml`
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".digest-gate").join("config.yml")
}

/// Admission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Lowest severity that rejects a record. Default and maximum: high.
    #[serde(default = "default_blocking_severity")]
    pub blocking_severity: Severity,

    #[serde(default)]
    pub placeholders: Placeholders,
}

fn default_blocking_severity() -> Severity {
    Severity::High
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            blocking_severity: default_blocking_severity(),
            placeholders: Placeholders::default(),
        }
    }
}

/// Curation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Backfill draws up to `backfill_multiplier * target` extra candidates.
    /// Default: 2.
    #[serde(default = "default_backfill_multiplier")]
    pub backfill_multiplier: usize,

    /// Items wanted per source type.
    #[serde(default = "default_targets")]
    pub targets: BTreeMap<SourceType, usize>,
}

fn default_backfill_multiplier() -> usize {
    2
}

fn default_targets() -> BTreeMap<SourceType, usize> {
    BTreeMap::from([
        (SourceType::Tip, 2),
        (SourceType::Trend, 2),
        (SourceType::Automation, 2),
        (SourceType::Video, 3),
    ])
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            backfill_multiplier: default_backfill_multiplier(),
            targets: default_targets(),
        }
    }
}

impl CurationConfig {
    pub fn target_for(&self, source_type: SourceType) -> usize {
        self.targets.get(&source_type).copied().unwrap_or(0)
    }
}

/// Scanner settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Appended to the built-in jailbreak keyword list.
    #[serde(default)]
    pub extra_keywords: Vec<String>,
}
