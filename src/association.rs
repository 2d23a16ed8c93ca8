//! Reconstructed-object <-> truth-particle association table
//!
//! The association itself is computed upstream by a hit-overlap algorithm;
//! this module wraps its output as a read-only per-event oracle. Both
//! directions are kept: reco -> sim with a shared-hit-fraction score, and
//! sim -> reco with an association-quality score. Candidate lists are
//! ranked by the algorithm; index 0 is treated as the best match.
//!
//! When no table exists for a stage (real detector data, or a stage with no
//! simulation products) every query returns `None` and the caller appends
//! sentinel truth columns instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Best truth match for a reconstructed object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthMatch {
    /// Index into the event's truth-particle collection
    pub truth_index: usize,
    /// Fraction of the reconstructed object's hits shared with the match
    pub shared_fraction: f64,
    /// How many truth candidates the algorithm produced for this object
    pub ambiguity: usize,
}

/// Best reconstructed match for a truth particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoMatch {
    /// Index into the stage's reconstructed collection
    pub reco_index: usize,
    /// Association quality reported by the algorithm
    pub quality: f64,
}

/// Bidirectional per-event association table for one pipeline stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TruthAssociation {
    /// reco index -> ranked (truth index, shared fraction), best first
    reco_to_sim: HashMap<usize, Vec<(usize, f64)>>,
    /// truth index -> ranked (reco index, quality), best first
    sim_to_reco: HashMap<usize, Vec<(usize, f64)>>,
}

impl TruthAssociation {
    /// Wrap ranked candidate lists produced by an external associator
    pub fn from_ranked(
        reco_to_sim: HashMap<usize, Vec<(usize, f64)>>,
        sim_to_reco: HashMap<usize, Vec<(usize, f64)>>,
    ) -> Self {
        Self {
            reco_to_sim,
            sim_to_reco,
        }
    }

    /// Best truth candidate for a reconstructed object, with its shared
    /// fraction and the full candidate count
    pub fn best_match(&self, reco_index: usize) -> Option<TruthMatch> {
        let candidates = self.reco_to_sim.get(&reco_index)?;
        let (truth_index, shared_fraction) = *candidates.first()?;
        Some(TruthMatch {
            truth_index,
            shared_fraction,
            ambiguity: candidates.len(),
        })
    }

    /// Best reconstructed candidate for a truth particle
    pub fn best_reco_for(&self, truth_index: usize) -> Option<RecoMatch> {
        let candidates = self.sim_to_reco.get(&truth_index)?;
        let (reco_index, quality) = *candidates.first()?;
        Some(RecoMatch {
            reco_index,
            quality,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.reco_to_sim.is_empty() && self.sim_to_reco.is_empty()
    }
}

/// Hit-overlap association builder.
///
/// Ranks truth candidates for each reconstructed object by the number of
/// shared hit ids; shared fraction is normalized to the reconstructed
/// object's hit count, quality to the truth particle's. Used by the
/// synthetic generator and by tests; production tables arrive prebuilt.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitOverlapAssociator {
    /// Candidates below this shared fraction are dropped
    pub min_shared_fraction: f64,
}

impl HitOverlapAssociator {
    pub fn new(min_shared_fraction: f64) -> Self {
        Self {
            min_shared_fraction,
        }
    }

    pub fn associate(&self, reco_hits: &[Vec<u64>], truth_hits: &[Vec<u64>]) -> TruthAssociation {
        let mut reco_to_sim: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
        let mut sim_to_reco: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();

        for (ri, rhits) in reco_hits.iter().enumerate() {
            if rhits.is_empty() {
                continue;
            }
            let mut candidates: Vec<(usize, f64, f64)> = Vec::new();
            for (ti, thits) in truth_hits.iter().enumerate() {
                if thits.is_empty() {
                    continue;
                }
                let shared = rhits.iter().filter(|h| thits.contains(h)).count();
                if shared == 0 {
                    continue;
                }
                let frac = shared as f64 / rhits.len() as f64;
                let quality = shared as f64 / thits.len() as f64;
                if frac >= self.min_shared_fraction {
                    candidates.push((ti, frac, quality));
                }
            }
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

            if !candidates.is_empty() {
                reco_to_sim.insert(ri, candidates.iter().map(|&(ti, f, _)| (ti, f)).collect());
                for &(ti, _, quality) in &candidates {
                    sim_to_reco.entry(ti).or_default().push((ri, quality));
                }
            }
        }

        for ranked in sim_to_reco.values_mut() {
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        }

        TruthAssociation::from_ranked(reco_to_sim, sim_to_reco)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_two_candidates() -> TruthAssociation {
        let mut reco_to_sim = HashMap::new();
        reco_to_sim.insert(0usize, vec![(3usize, 0.9), (5usize, 0.4)]);
        let mut sim_to_reco = HashMap::new();
        sim_to_reco.insert(3usize, vec![(0usize, 0.75)]);
        TruthAssociation::from_ranked(reco_to_sim, sim_to_reco)
    }

    #[test]
    fn test_best_match_takes_first_ranked() {
        let table = table_two_candidates();
        let m = table.best_match(0).unwrap();
        assert_eq!(m.truth_index, 3);
        assert!((m.shared_fraction - 0.9).abs() < 1e-12);
        assert_eq!(m.ambiguity, 2);
    }

    #[test]
    fn test_unmatched_object_returns_none() {
        let table = table_two_candidates();
        assert!(table.best_match(1).is_none());
        assert!(table.best_reco_for(5).is_none());
    }

    #[test]
    fn test_symmetric_lookup() {
        let table = table_two_candidates();
        let r = table.best_reco_for(3).unwrap();
        assert_eq!(r.reco_index, 0);
        assert!((r.quality - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_hit_overlap_ranking() {
        // reco 0 shares 3/4 hits with truth 0 and 1/4 with truth 1
        let reco = vec![vec![1, 2, 3, 4]];
        let truth = vec![vec![1, 2, 3], vec![4, 9]];
        let table = HitOverlapAssociator::new(0.0).associate(&reco, &truth);

        let m = table.best_match(0).unwrap();
        assert_eq!(m.truth_index, 0);
        assert!((m.shared_fraction - 0.75).abs() < 1e-12);
        assert_eq!(m.ambiguity, 2);

        let r = table.best_reco_for(0).unwrap();
        assert_eq!(r.reco_index, 0);
        assert!((r.quality - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_fraction_cut() {
        let reco = vec![vec![1, 2, 3, 4]];
        let truth = vec![vec![4]];
        let table = HitOverlapAssociator::new(0.5).associate(&reco, &truth);
        assert!(table.best_match(0).is_none());
    }
}
