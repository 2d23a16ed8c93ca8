//! Trajectory starting-state fingerprint
//!
//! Collections produced by different steps of the tracking chain do not
//! share object identity: a seed and the track it grew into are separate
//! objects in separate collections with no common id. What they do share,
//! bit for bit, is the seed's starting state, because both collections copy
//! it from the same in-memory object during the same pipeline run. The
//! fingerprint captures that state and serves as a within-event join key.
//!
//! Equality and hashing are exact bit equality over all fields. The key is
//! only ever compared against fingerprints built in the same event from the
//! same process, where bit-identical recomputation holds; it is never
//! persisted and never compared across events.

use crate::event::TrajectoryState;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Hashable, totally ordered key over a trajectory starting state
#[derive(Debug, Clone, Copy)]
pub struct SeedFingerprint {
    det_id: u32,
    pt: f32,
    local_x: f32,
    local_y: f32,
    dxdz: f32,
    dydz: f32,
    px: f32,
    py: f32,
    pz: f32,
    qbp: f32,
    charge: i32,
}

impl SeedFingerprint {
    /// Snapshot the nine scalars plus surface id and charge, verbatim
    pub fn from_state(state: &TrajectoryState) -> Self {
        Self {
            det_id: state.det_id,
            pt: state.pt,
            local_x: state.local_x,
            local_y: state.local_y,
            dxdz: state.dxdz,
            dydz: state.dydz,
            px: state.px,
            py: state.py,
            pz: state.pz,
            qbp: state.qbp,
            charge: state.charge,
        }
    }

    pub fn det_id(&self) -> u32 {
        self.det_id
    }

    pub fn pt(&self) -> f32 {
        self.pt
    }

    /// All float fields as raw bits, in a fixed order
    fn float_bits(&self) -> [u32; 9] {
        [
            self.pt.to_bits(),
            self.local_x.to_bits(),
            self.local_y.to_bits(),
            self.dxdz.to_bits(),
            self.dydz.to_bits(),
            self.px.to_bits(),
            self.py.to_bits(),
            self.pz.to_bits(),
            self.qbp.to_bits(),
        ]
    }
}

impl PartialEq for SeedFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.det_id == other.det_id
            && self.charge == other.charge
            && self.float_bits() == other.float_bits()
    }
}

impl Eq for SeedFingerprint {}

impl Hash for SeedFingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.det_id.hash(state);
        self.charge.hash(state);
        self.float_bits().hash(state);
    }
}

impl PartialOrd for SeedFingerprint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SeedFingerprint {
    /// Primary key transverse momentum, tie-break surface id; remaining
    /// fields break further ties deterministically so the order is total
    /// and consistent with equality.
    fn cmp(&self, other: &Self) -> Ordering {
        self.pt
            .total_cmp(&other.pt)
            .then_with(|| self.det_id.cmp(&other.det_id))
            .then_with(|| self.charge.cmp(&other.charge))
            .then_with(|| self.float_bits().cmp(&other.float_bits()))
    }
}
