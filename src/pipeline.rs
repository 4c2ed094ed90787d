use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::admission::AdmissionController;
use crate::config::GateConfig;
use crate::error::Result;
use crate::pool::PoolSource;
use crate::record::{ContentRecord, SourceType};
use crate::run::RunContext;
use crate::sampler::VarietySampler;

/// A source type that ended the run below its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    pub source_type: SourceType,
    pub target: usize,
    pub delivered: usize,
}

/// Admitted, sanitized records per source type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CurationBatch {
    sections: BTreeMap<SourceType, Vec<ContentRecord>>,
    targets: BTreeMap<SourceType, usize>,
}

impl CurationBatch {
    pub fn get(&self, source_type: SourceType) -> &[ContentRecord] {
        self.sections
            .get(&source_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn target(&self, source_type: SourceType) -> usize {
        self.targets.get(&source_type).copied().unwrap_or(0)
    }

    /// Sections in reporting order: tips, trends, automations, videos.
    pub fn iter(&self) -> impl Iterator<Item = (SourceType, &[ContentRecord])> {
        self.sections.iter().map(|(t, r)| (*t, r.as_slice()))
    }

    /// Total records across all sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Types that delivered fewer records than their target.
    pub fn shortfalls(&self) -> Vec<Shortfall> {
        self.targets
            .iter()
            .filter_map(|(&source_type, &target)| {
                let delivered = self.get(source_type).len();
                (delivered < target).then_some(Shortfall {
                    source_type,
                    target,
                    delivered,
                })
            })
            .collect()
    }

    fn insert(&mut self, source_type: SourceType, target: usize, records: Vec<ContentRecord>) {
        self.targets.insert(source_type, target);
        self.sections.insert(source_type, records);
    }
}

/// Theme name to the categories it draws from. Unknown themes map to
/// themselves.
pub fn theme_categories(theme: &str) -> Vec<&str> {
    match theme {
        "development" => vec!["development", "programming", "code"],
        "business" => vec!["business", "enterprise", "marketing"],
        "automation" => vec!["automation", "workflow", "no-code"],
        "fundamentals" => vec!["fundamentals", "education", "learning"],
        "tools" => vec!["tools", "applications", "platforms"],
        other => vec![other],
    }
}

/// Samples each pool with variety, screens every pick and backfills
/// rejections from what is left.
pub struct CurationPipeline {
    admission: AdmissionController,
    sampler: VarietySampler,
    backfill_multiplier: usize,
}

impl Default for CurationPipeline {
    fn default() -> Self {
        Self::new(AdmissionController::default(), 2)
    }
}

impl CurationPipeline {
    pub fn new(admission: AdmissionController, backfill_multiplier: usize) -> Self {
        Self {
            admission,
            sampler: VarietySampler::new(),
            backfill_multiplier,
        }
    }

    pub fn from_config(config: &GateConfig) -> Result<Self> {
        Ok(Self::new(
            AdmissionController::from_config(config)?,
            config.curation.backfill_multiplier,
        ))
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Curate every type named in `targets`. Types without a pool come back
    /// empty and show up as shortfalls.
    pub fn curate<R: Rng + ?Sized>(
        &self,
        pools: &BTreeMap<SourceType, Vec<ContentRecord>>,
        targets: &BTreeMap<SourceType, usize>,
        ctx: &mut RunContext,
        rng: &mut R,
    ) -> CurationBatch {
        let mut batch = CurationBatch::default();
        for (&source_type, &target) in targets {
            let pool = pools.get(&source_type).map(Vec::as_slice).unwrap_or(&[]);
            let records = self.curate_type(source_type, pool, target, ctx, rng);
            batch.insert(source_type, target, records);
        }
        batch
    }

    /// Load each targeted pool from `source`, then curate.
    pub fn curate_from_source<R: Rng + ?Sized>(
        &self,
        source: &dyn PoolSource,
        targets: &BTreeMap<SourceType, usize>,
        ctx: &mut RunContext,
        rng: &mut R,
    ) -> CurationBatch {
        let pools: BTreeMap<SourceType, Vec<ContentRecord>> = targets
            .keys()
            .map(|&t| (t, source.load_pool(t)))
            .collect();
        self.curate(&pools, targets, ctx, rng)
    }

    /// Draw up to `target` admitted records from one pool.
    pub fn curate_type<R: Rng + ?Sized>(
        &self,
        source_type: SourceType,
        pool: &[ContentRecord],
        target: usize,
        ctx: &mut RunContext,
        rng: &mut R,
    ) -> Vec<ContentRecord> {
        let mut admitted = Vec::new();
        if target == 0 {
            return admitted;
        }
        let mut drawn = vec![false; pool.len()];

        let everything: Vec<usize> = (0..pool.len()).collect();
        let first = self.sampler.variety_indices(pool, &everything, target, rng);
        self.admit_into(pool, &first, target, &mut drawn, &mut admitted, ctx);

        let mut rounds = 0;
        while admitted.len() < target {
            let remaining = undrawn(&drawn);
            if remaining.is_empty() {
                break;
            }
            let extra = self.sampler.plain_indices(
                &remaining,
                target * self.backfill_multiplier.max(1),
                rng,
            );
            self.admit_into(pool, &extra, target, &mut drawn, &mut admitted, ctx);
            rounds += 1;
        }

        if admitted.len() < target {
            tracing::warn!(
                "{}: only {}/{} admitted, pool of {} exhausted",
                source_type,
                admitted.len(),
                target,
                pool.len()
            );
        } else {
            tracing::info!(
                "{}: {}/{} admitted ({} backfill round(s))",
                source_type,
                admitted.len(),
                target,
                rounds
            );
        }
        admitted
    }

    /// Per type: one pick per theme category, topped up with unfiltered
    /// picks, at most `per_type` records. Every pick goes through admission.
    pub fn curate_themed<R: Rng + ?Sized>(
        &self,
        pools: &BTreeMap<SourceType, Vec<ContentRecord>>,
        theme: &str,
        per_type: usize,
        ctx: &mut RunContext,
        rng: &mut R,
    ) -> CurationBatch {
        let categories = theme_categories(theme);
        let mut batch = CurationBatch::default();

        for source_type in SourceType::ALL {
            let Some(pool) = pools.get(&source_type) else {
                continue;
            };
            let mut drawn = vec![false; pool.len()];
            let mut admitted = Vec::new();

            for category in &categories {
                if admitted.len() >= per_type {
                    break;
                }
                let remaining = undrawn(&drawn);
                let matching: Vec<usize> = remaining
                    .iter()
                    .copied()
                    .filter(|&i| pool[i].category == *category)
                    .collect();
                let candidates = if matching.is_empty() {
                    remaining
                } else {
                    matching
                };
                let pick = self.sampler.variety_indices(pool, &candidates, 1, rng);
                self.admit_into(pool, &pick, per_type, &mut drawn, &mut admitted, ctx);
            }

            if admitted.len() < per_type {
                let top_up = self.sampler.variety_indices(
                    pool,
                    &undrawn(&drawn),
                    per_type - admitted.len(),
                    rng,
                );
                self.admit_into(pool, &top_up, per_type, &mut drawn, &mut admitted, ctx);
            }

            tracing::info!(
                "{} themed '{}': {}/{} admitted",
                source_type,
                theme,
                admitted.len(),
                per_type
            );
            batch.insert(source_type, per_type, admitted);
        }
        batch
    }

    /// Screen `indices` in order until `out` reaches `target`. Only screened
    /// indices are marked as drawn.
    fn admit_into(
        &self,
        pool: &[ContentRecord],
        indices: &[usize],
        target: usize,
        drawn: &mut [bool],
        out: &mut Vec<ContentRecord>,
        ctx: &mut RunContext,
    ) {
        for &idx in indices {
            if out.len() >= target {
                break;
            }
            drawn[idx] = true;
            let admission = self.admission.admit(&pool[idx], ctx);
            if admission.admitted {
                out.push(admission.record);
            }
        }
    }
}

fn undrawn(drawn: &[bool]) -> Vec<usize> {
    drawn
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| (!d).then_some(i))
        .collect()
}
