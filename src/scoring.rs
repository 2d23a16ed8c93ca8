//! Seed-quality scoring and seed <-> trigger-candidate relations
//!
//! The MVA-filtered iterations attach a quality score to every seed. The
//! score comes from a pretrained classifier that this crate treats as an
//! opaque function over a fixed feature vector; two classifiers are carried
//! per scoring stage, one trained for the barrel and one for the endcaps,
//! dispatched on the seed's pseudorapidity.
//!
//! The feature vector is built from the seed's global-frame kinematics and
//! its angular relations to the L1 and L2 trigger candidates of the same
//! event. Those relations are recorded in the output rows for every seed,
//! scored or not, so `compute_relations` lives here next to its consumer.

use crate::event::{
    GenParticle, L1Candidate, L2Candidate, FAR_DISTANCE, SENTINEL_F, SENTINEL_I,
};
use crate::geometry::{delta_phi, delta_r, GlobalPoint, GlobalVector};

/// |eta| boundary between the barrel and endcap classifiers
pub const BARREL_ETA_EDGE: f64 = 1.2;

/// Minimum L1 quality for a candidate to enter the relation search
pub const L1_MIN_QUALITY: i32 = 7;

/// Number of inputs every classifier consumes
pub const FEATURE_COUNT: usize = 7;

/// Opaque pretrained classifier over a fixed-width feature vector
pub trait SeedClassifier: Send + Sync {
    fn evaluate(&self, features: &[f64]) -> f64;
}

/// Linear model: dot(weights, features) + bias.
///
/// Stands in for the exported boosted-tree models in tests and synthetic
/// runs; production weights are loaded from the job configuration.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl SeedClassifier for LinearClassifier {
    fn evaluate(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, f)| w * f)
            .sum::<f64>()
            + self.bias
    }
}

/// Angular relations of one seed to the trigger candidates of its event.
///
/// Minimum-distance searches start from `FAR_DISTANCE`; kinematics of the
/// nearest candidate default to the sentinel when no candidate qualifies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedRelations {
    pub n_l1: i64,
    pub dr_l1: f64,
    pub dphi_l1: f64,
    pub dr_l1_at_vtx: f64,
    pub dphi_l1_at_vtx: f64,
    pub dr_min_dphi_l1: f64,
    pub dphi_min_dphi_l1: f64,
    pub dr_min_dphi_l1_at_vtx: f64,
    pub dphi_min_dphi_l1_at_vtx: f64,
    pub l1_pt: f64,
    pub l1_eta: f64,
    pub l1_phi: f64,
    pub n_l2: i64,
    pub dr_l2: f64,
    pub dphi_l2: f64,
    pub l2_pt: f64,
    pub l2_eta: f64,
    pub l2_phi: f64,
    pub gen_pt: f64,
    pub gen_eta: f64,
    pub gen_phi: f64,
}

impl Default for SeedRelations {
    fn default() -> Self {
        Self {
            n_l1: SENTINEL_I,
            dr_l1: FAR_DISTANCE,
            dphi_l1: FAR_DISTANCE,
            dr_l1_at_vtx: FAR_DISTANCE,
            dphi_l1_at_vtx: FAR_DISTANCE,
            dr_min_dphi_l1: FAR_DISTANCE,
            dphi_min_dphi_l1: FAR_DISTANCE,
            dr_min_dphi_l1_at_vtx: FAR_DISTANCE,
            dphi_min_dphi_l1_at_vtx: FAR_DISTANCE,
            l1_pt: SENTINEL_F,
            l1_eta: SENTINEL_F,
            l1_phi: SENTINEL_F,
            n_l2: SENTINEL_I,
            dr_l2: FAR_DISTANCE,
            dphi_l2: FAR_DISTANCE,
            l2_pt: SENTINEL_F,
            l2_eta: SENTINEL_F,
            l2_phi: SENTINEL_F,
            gen_pt: SENTINEL_F,
            gen_eta: SENTINEL_F,
            gen_phi: SENTINEL_F,
        }
    }
}

/// Nearest-candidate searches in the eta-phi plane.
///
/// L1 candidates must be in-time and above the quality floor; both the
/// direct and the propagated-to-vertex L1 kinematics are searched
/// independently, by minimum deltaR against the seed momentum and by
/// minimum |deltaPhi| against the seed position. The generator match
/// scans stable muons only, along the direction from each generator
/// vertex to the seed origin.
pub fn compute_relations(
    global_p: GlobalVector,
    global_x: GlobalPoint,
    l1: Option<&[L1Candidate]>,
    l2: Option<&[L2Candidate]>,
    gen: Option<&[GenParticle]>,
) -> SeedRelations {
    let mut rel = SeedRelations::default();
    let seed_eta = global_p.eta();
    let seed_phi = global_p.phi();
    let x_eta = global_x.eta();
    let x_phi = global_x.phi();

    if let Some(l1s) = l1 {
        let selected: Vec<&L1Candidate> = l1s
            .iter()
            .filter(|c| c.bunch_crossing == 0 && c.quality >= L1_MIN_QUALITY)
            .collect();
        rel.n_l1 = selected.len() as i64;
        for c in selected {
            let dr = delta_r(seed_eta, seed_phi, c.eta, c.phi);
            if dr < rel.dr_l1 {
                rel.dr_l1 = dr;
                rel.dphi_l1 = delta_phi(seed_phi, c.phi);
                rel.l1_pt = c.pt;
                rel.l1_eta = c.eta;
                rel.l1_phi = c.phi;
            }
            let dr_vtx = delta_r(seed_eta, seed_phi, c.eta_at_vtx, c.phi_at_vtx);
            if dr_vtx < rel.dr_l1_at_vtx {
                rel.dr_l1_at_vtx = dr_vtx;
                rel.dphi_l1_at_vtx = delta_phi(seed_phi, c.phi_at_vtx);
            }
            let dphi = delta_phi(x_phi, c.phi);
            if dphi.abs() < rel.dphi_min_dphi_l1.abs() {
                rel.dphi_min_dphi_l1 = dphi;
                rel.dr_min_dphi_l1 = delta_r(x_eta, x_phi, c.eta, c.phi);
            }
            let dphi_vtx = delta_phi(x_phi, c.phi_at_vtx);
            if dphi_vtx.abs() < rel.dphi_min_dphi_l1_at_vtx.abs() {
                rel.dphi_min_dphi_l1_at_vtx = dphi_vtx;
                rel.dr_min_dphi_l1_at_vtx = delta_r(x_eta, x_phi, c.eta_at_vtx, c.phi_at_vtx);
            }
        }
    }

    if let Some(l2s) = l2 {
        rel.n_l2 = l2s.len() as i64;
        for c in l2s {
            let dr = delta_r(seed_eta, seed_phi, c.eta, c.phi);
            if dr < rel.dr_l2 {
                rel.dr_l2 = dr;
                rel.dphi_l2 = delta_phi(seed_phi, c.phi);
                rel.l2_pt = c.pt;
                rel.l2_eta = c.eta;
                rel.l2_phi = c.phi;
            }
        }
    }

    if let Some(gens) = gen {
        // match on the seed-origin direction as seen from the gen vertex,
        // not on the seed momentum
        let mut best = FAR_DISTANCE;
        for g in gens.iter().filter(|g| g.pdg_id.abs() == 13 && g.status == 1) {
            let dir = GlobalVector::new(
                global_x.x - g.vx,
                global_x.y - g.vy,
                global_x.z - g.vz,
            );
            let dr = delta_r(dir.eta(), dir.phi(), g.eta, g.phi);
            if dr < best {
                best = dr;
                rel.gen_pt = g.pt;
                rel.gen_eta = g.eta;
                rel.gen_phi = g.phi;
            }
        }
    }

    rel
}

/// One pretrained classifier with its input standardization
pub struct SeedMvaEstimator {
    classifier: Box<dyn SeedClassifier>,
    scale_mean: [f64; FEATURE_COUNT],
    scale_std: [f64; FEATURE_COUNT],
    /// From-L1 iterations have no L2 collection; their models were trained
    /// with the at-vertex L1 relations in the L2 slots.
    is_from_l1: bool,
}

impl SeedMvaEstimator {
    pub fn new(
        classifier: Box<dyn SeedClassifier>,
        scale_mean: [f64; FEATURE_COUNT],
        scale_std: [f64; FEATURE_COUNT],
        is_from_l1: bool,
    ) -> Self {
        Self {
            classifier,
            scale_mean,
            scale_std,
            is_from_l1,
        }
    }

    fn features(&self, pt: f64, eta: f64, rel: &SeedRelations) -> [f64; FEATURE_COUNT] {
        if self.is_from_l1 {
            [
                pt,
                eta,
                rel.dr_l1,
                rel.dphi_l1,
                rel.dr_l1_at_vtx,
                rel.dr_l1_at_vtx,
                rel.dphi_l1_at_vtx,
            ]
        } else {
            [
                pt,
                eta,
                rel.dr_l1,
                rel.dphi_l1,
                rel.dr_l1_at_vtx,
                rel.dr_l2,
                rel.dphi_l2,
            ]
        }
    }

    /// Standardize the feature vector and run the classifier
    pub fn score(&self, pt: f64, eta: f64, rel: &SeedRelations) -> f64 {
        let raw = self.features(pt, eta, rel);
        let mut scaled = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let std = if self.scale_std[i].abs() < 1e-12 {
                1.0
            } else {
                self.scale_std[i]
            };
            scaled[i] = (raw[i] - self.scale_mean[i]) / std;
        }
        self.classifier.evaluate(&scaled)
    }
}

impl std::fmt::Debug for SeedMvaEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedMvaEstimator")
            .field("scale_mean", &self.scale_mean)
            .field("scale_std", &self.scale_std)
            .field("is_from_l1", &self.is_from_l1)
            .finish()
    }
}

/// Barrel/endcap classifier pair for one scoring stage
#[derive(Debug)]
pub struct SeedScorerPair {
    pub barrel: SeedMvaEstimator,
    pub endcap: SeedMvaEstimator,
}

impl SeedScorerPair {
    /// Score through the classifier matching the seed's detector region
    pub fn score(&self, pt: f64, eta: f64, rel: &SeedRelations) -> f64 {
        if eta.abs() < BARREL_ETA_EDGE {
            self.barrel.score(pt, eta, rel)
        } else {
            self.endcap.score(pt, eta, rel)
        }
    }
}
