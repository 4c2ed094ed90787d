use rand::seq::SliceRandom;
use rand::Rng;

use crate::record::ContentRecord;

/// Draws records from a pool without replacement, spreading picks across
/// categories when it can.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarietySampler;

impl VarietySampler {
    pub fn new() -> Self {
        Self
    }

    /// Draw up to `count` records with category variety.
    ///
    /// `category_filter` narrows the pool only if at least one record carries
    /// that category; otherwise the whole pool is used.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        pool: &[ContentRecord],
        count: usize,
        category_filter: Option<&str>,
        rng: &mut R,
    ) -> Vec<ContentRecord> {
        let mut candidates: Vec<usize> = match category_filter {
            Some(category) => (0..pool.len())
                .filter(|&i| pool[i].category == category)
                .collect(),
            None => Vec::new(),
        };
        if candidates.is_empty() {
            candidates = (0..pool.len()).collect();
        }
        self.variety_indices(pool, &candidates, count, rng)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect()
    }

    pub fn sample_with_variety<R: Rng + ?Sized>(
        &self,
        pool: &[ContentRecord],
        count: usize,
        rng: &mut R,
    ) -> Vec<ContentRecord> {
        self.sample(pool, count, None, rng)
    }

    /// Uniform draw with no attention to categories.
    pub fn sample_plain<R: Rng + ?Sized>(
        &self,
        pool: &[ContentRecord],
        count: usize,
        rng: &mut R,
    ) -> Vec<ContentRecord> {
        pool.choose_multiple(rng, count).cloned().collect()
    }

    /// Variety draw over `candidates` (indices into `pool`), returning indices.
    ///
    /// Categories are grouped in order of first appearance. Slot `i` takes a
    /// random member of group `i` while unused groups remain; later slots draw
    /// from everything not yet taken.
    pub(crate) fn variety_indices<R: Rng + ?Sized>(
        &self,
        pool: &[ContentRecord],
        candidates: &[usize],
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        if candidates.len() <= count {
            let mut all = candidates.to_vec();
            all.shuffle(rng);
            return all;
        }

        let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
        for &idx in candidates {
            let category = pool[idx].category.as_str();
            match groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, members)) => members.push(idx),
                None => groups.push((category, vec![idx])),
            }
        }

        let mut selected = Vec::with_capacity(count);
        for slot in 0..count {
            if slot < groups.len() {
                let members = &mut groups[slot].1;
                let pick = rng.gen_range(0..members.len());
                selected.push(members.swap_remove(pick));
            } else {
                let remaining: Vec<(usize, usize)> = groups
                    .iter()
                    .enumerate()
                    .flat_map(|(g, (_, members))| (0..members.len()).map(move |m| (g, m)))
                    .collect();
                let Some(&(g, m)) = remaining.choose(rng) else {
                    break;
                };
                selected.push(groups[g].1.swap_remove(m));
            }
        }
        selected
    }

    /// Uniform draw over `candidates`, returning indices.
    pub(crate) fn plain_indices<R: Rng + ?Sized>(
        &self,
        candidates: &[usize],
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        candidates.choose_multiple(rng, count).copied().collect()
    }
}
