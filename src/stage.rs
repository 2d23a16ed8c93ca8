//! Tracking-pipeline stages and per-stage containers
//!
//! The muon trigger runs seven tracking-algorithm variants per event: an
//! outside-in pass seeded from L2 standalone muons, three iterative
//! inside-out passes seeded from L2, and three seeded directly from L1.
//! Each variant produces its own seed and track collections, so every
//! per-stage structure in the crate is indexed by `Stage`.

use crate::event::NO_LINK;
use crate::fingerprint::SeedFingerprint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One tracking-algorithm variant of the multi-step pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Outside-in tracking seeded from L2 muons
    OutsideIn,
    /// Iteration 0, pixel-track seeded, from L2
    Iter0,
    /// Iteration 2, pixel seeded, from L2 (MVA-filtered seeds)
    Iter2,
    /// Iteration 3, recovery iteration, from L2
    Iter3,
    /// Iteration 0, from L1
    Iter0FromL1,
    /// Iteration 2, from L1 (MVA-filtered seeds)
    Iter2FromL1,
    /// Iteration 3, from L1
    Iter3FromL1,
}

impl Stage {
    pub const COUNT: usize = 7;

    /// All stages in fill order
    pub fn all() -> [Stage; Stage::COUNT] {
        [
            Stage::OutsideIn,
            Stage::Iter0,
            Stage::Iter2,
            Stage::Iter3,
            Stage::Iter0FromL1,
            Stage::Iter2FromL1,
            Stage::Iter3FromL1,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            Stage::OutsideIn => 0,
            Stage::Iter0 => 1,
            Stage::Iter2 => 2,
            Stage::Iter3 => 3,
            Stage::Iter0FromL1 => 4,
            Stage::Iter2FromL1 => 5,
            Stage::Iter3FromL1 => 6,
        }
    }

    /// Short stage code used in log lines
    pub fn name(self) -> &'static str {
        match self {
            Stage::OutsideIn => "hltIterL3OI",
            Stage::Iter0 => "hltIter0",
            Stage::Iter2 => "hltIter2",
            Stage::Iter3 => "hltIter3",
            Stage::Iter0FromL1 => "hltIter0FromL1",
            Stage::Iter2FromL1 => "hltIter2FromL1",
            Stage::Iter3FromL1 => "hltIter3FromL1",
        }
    }

    /// Column prefix for this stage's track template
    pub fn track_prefix(self) -> &'static str {
        match self {
            Stage::OutsideIn => "hltIterL3OIMuonTrack",
            Stage::Iter0 => "hltIter0IterL3MuonTrack",
            Stage::Iter2 => "hltIter2IterL3MuonTrack",
            Stage::Iter3 => "hltIter3IterL3MuonTrack",
            Stage::Iter0FromL1 => "hltIter0IterL3FromL1MuonTrack",
            Stage::Iter2FromL1 => "hltIter2IterL3FromL1MuonTrack",
            Stage::Iter3FromL1 => "hltIter3IterL3FromL1MuonTrack",
        }
    }

    /// Column prefix for this stage's truth-particle template
    pub fn truth_prefix(self) -> &'static str {
        match self {
            Stage::OutsideIn => "hltIterL3OIMuonTrackTP",
            Stage::Iter0 => "hltIter0IterL3MuonTrackTP",
            Stage::Iter2 => "hltIter2IterL3MuonTrackTP",
            Stage::Iter3 => "hltIter3IterL3MuonTrackTP",
            Stage::Iter0FromL1 => "hltIter0IterL3FromL1MuonTrackTP",
            Stage::Iter2FromL1 => "hltIter2IterL3FromL1MuonTrackTP",
            Stage::Iter3FromL1 => "hltIter3IterL3FromL1MuonTrackTP",
        }
    }

    /// Column prefix for this stage's seed template
    pub fn seed_prefix(self) -> &'static str {
        match self {
            Stage::OutsideIn => "hltIterL3OISeed",
            Stage::Iter0 => "hltIter0Seed",
            Stage::Iter2 => "hltIter2Seed",
            Stage::Iter3 => "hltIter3Seed",
            Stage::Iter0FromL1 => "hltIter0FromL1Seed",
            Stage::Iter2FromL1 => "hltIter2FromL1Seed",
            Stage::Iter3FromL1 => "hltIter3FromL1Seed",
        }
    }

    /// Stages whose seeds carry an MVA quality score
    pub fn uses_mva(self) -> bool {
        matches!(self, Stage::Iter2 | Stage::Iter2FromL1)
    }

    /// Stages seeded directly from L1 candidates
    pub fn is_from_l1(self) -> bool {
        matches!(
            self,
            Stage::Iter0FromL1 | Stage::Iter2FromL1 | Stage::Iter3FromL1
        )
    }
}

/// Fixed-size container with one slot per stage
#[derive(Debug, Clone)]
pub struct StageMap<T> {
    slots: [T; Stage::COUNT],
}

impl<T> StageMap<T> {
    /// Build with one value per stage
    pub fn from_fn(mut f: impl FnMut(Stage) -> T) -> Self {
        let all = Stage::all();
        Self {
            slots: std::array::from_fn(|i| f(all[i])),
        }
    }

    pub fn get(&self, stage: Stage) -> &T {
        &self.slots[stage.index()]
    }

    pub fn get_mut(&mut self, stage: Stage) -> &mut T {
        &mut self.slots[stage.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &T)> {
        Stage::all().into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Stage, &mut T)> {
        Stage::all().into_iter().zip(self.slots.iter_mut())
    }
}

impl<T: Default> Default for StageMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

/// Per-event fingerprint -> row-index map for one stage transition.
///
/// Built while filling the downstream collection (track or candidate rows),
/// queried while filling the upstream one (seeds or tracks) of the same
/// event. Re-inserting an existing key overwrites: last writer wins.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    map: HashMap<SeedFingerprint, usize>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fingerprint: SeedFingerprint, row: usize) {
        self.map.insert(fingerprint, row);
    }

    pub fn lookup(&self, fingerprint: &SeedFingerprint) -> Option<usize> {
        self.map.get(fingerprint).copied()
    }

    /// Row index as a link column value: the row, or -1 when unmatched
    pub fn link(&self, fingerprint: &SeedFingerprint) -> i64 {
        self.lookup(fingerprint).map_or(NO_LINK, |r| r as i64)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TrajectoryState;

    fn fingerprint(pt: f32) -> SeedFingerprint {
        SeedFingerprint::from_state(&TrajectoryState {
            det_id: 10,
            pt,
            local_x: 0.0,
            local_y: 0.0,
            dxdz: 0.0,
            dydz: 0.0,
            px: pt,
            py: 0.0,
            pz: 1.0,
            qbp: 1.0 / pt,
            charge: 1,
        })
    }

    #[test]
    fn test_stage_enumeration_is_complete() {
        assert_eq!(Stage::all().len(), Stage::COUNT);
        for (i, s) in Stage::all().into_iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn test_mva_stages() {
        let mva: Vec<Stage> = Stage::all().into_iter().filter(|s| s.uses_mva()).collect();
        assert_eq!(mva, vec![Stage::Iter2, Stage::Iter2FromL1]);
    }

    #[test]
    fn test_identity_map_round_trip() {
        let mut map = IdentityMap::new();
        let fp = fingerprint(4.0);
        map.insert(fp, 11);
        assert_eq!(map.lookup(&fp), Some(11));
        assert_eq!(map.link(&fp), 11);
        assert_eq!(map.link(&fingerprint(5.0)), -1);
    }

    #[test]
    fn test_identity_map_last_writer_wins() {
        let mut map = IdentityMap::new();
        let fp = fingerprint(4.0);
        map.insert(fp, 1);
        map.insert(fp, 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup(&fp), Some(2));
    }

    #[test]
    fn test_stage_map_slots_independent() {
        let mut maps: StageMap<IdentityMap> = StageMap::default();
        maps.get_mut(Stage::Iter2).insert(fingerprint(1.0), 3);
        assert_eq!(maps.get(Stage::Iter2).len(), 1);
        assert!(maps.get(Stage::Iter2FromL1).is_empty());
    }
}
