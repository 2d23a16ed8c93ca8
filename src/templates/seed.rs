//! Seed block: one instance per tracking stage

use super::{check_columns, RecordTemplate};
use crate::error::NtupleResult;
use crate::event::{TrajectoryState, TruthParticle, SENTINEL_F, SENTINEL_I};
use crate::scoring::SeedRelations;
use crate::store::{ColumnKind, ColumnSpec, ColumnValue, EventRow};

/// Struct-of-arrays buffer for one stage's seed collection.
///
/// Fill protocol per seed, in order: `fill` with the starting state and its
/// global-frame kinematics, `fill_relations`, exactly one of
/// `fill_best_truth` / `fill_dummy_truth`, `link_track` with whatever the
/// stage's identity map resolved, then exactly one of `fill_score` /
/// `fill_no_score`.
#[derive(Debug, Clone, Default)]
pub struct SeedTemplate {
    prefix: &'static str,

    // starting state, verbatim
    tsos_det_id: Vec<i64>,
    tsos_pt: Vec<f64>,
    tsos_x: Vec<f64>,
    tsos_y: Vec<f64>,
    tsos_dxdz: Vec<f64>,
    tsos_dydz: Vec<f64>,
    tsos_px: Vec<f64>,
    tsos_py: Vec<f64>,
    tsos_pz: Vec<f64>,
    tsos_qbp: Vec<f64>,
    tsos_charge: Vec<i64>,

    // global-frame momentum direction
    pt: Vec<f64>,
    eta: Vec<f64>,
    phi: Vec<f64>,

    // trigger-candidate relations
    n_l1: Vec<i64>,
    dr_l1: Vec<f64>,
    dphi_l1: Vec<f64>,
    dr_l1_at_vtx: Vec<f64>,
    dphi_l1_at_vtx: Vec<f64>,
    dr_min_dphi_l1: Vec<f64>,
    dphi_min_dphi_l1: Vec<f64>,
    dr_min_dphi_l1_at_vtx: Vec<f64>,
    dphi_min_dphi_l1_at_vtx: Vec<f64>,
    l1_pt: Vec<f64>,
    l1_eta: Vec<f64>,
    l1_phi: Vec<f64>,
    n_l2: Vec<i64>,
    dr_l2: Vec<f64>,
    dphi_l2: Vec<f64>,
    l2_pt: Vec<f64>,
    l2_eta: Vec<f64>,
    l2_phi: Vec<f64>,
    gen_pt: Vec<f64>,
    gen_eta: Vec<f64>,
    gen_phi: Vec<f64>,

    // best-matched simulated particle, directly at seed level
    matched_tp_size: Vec<i64>,
    best_tp_pdg_id: Vec<i64>,
    best_tp_pt: Vec<f64>,
    best_tp_eta: Vec<f64>,
    best_tp_phi: Vec<f64>,
    best_tp_shared_fraction: Vec<f64>,

    // link to the track this seed grew into, plus a summary of that row
    track_index: Vec<i64>,
    trk_pt: Vec<f64>,
    trk_eta: Vec<f64>,
    trk_phi: Vec<f64>,
    trk_matched_tp_size: Vec<i64>,
    trk_best_tp_pdg_id: Vec<i64>,
    trk_best_tp_shared_fraction: Vec<f64>,

    mva: Vec<f64>,
}

impl SeedTemplate {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Push the starting state and its global-frame kinematics
    pub fn fill(&mut self, state: &TrajectoryState, pt: f64, eta: f64, phi: f64) -> usize {
        let row = self.pt.len();
        self.tsos_det_id.push(state.det_id as i64);
        self.tsos_pt.push(state.pt as f64);
        self.tsos_x.push(state.local_x as f64);
        self.tsos_y.push(state.local_y as f64);
        self.tsos_dxdz.push(state.dxdz as f64);
        self.tsos_dydz.push(state.dydz as f64);
        self.tsos_px.push(state.px as f64);
        self.tsos_py.push(state.py as f64);
        self.tsos_pz.push(state.pz as f64);
        self.tsos_qbp.push(state.qbp as f64);
        self.tsos_charge.push(state.charge as i64);
        self.pt.push(pt);
        self.eta.push(eta);
        self.phi.push(phi);
        row
    }

    pub fn fill_relations(&mut self, rel: &SeedRelations) {
        self.n_l1.push(rel.n_l1);
        self.dr_l1.push(rel.dr_l1);
        self.dphi_l1.push(rel.dphi_l1);
        self.dr_l1_at_vtx.push(rel.dr_l1_at_vtx);
        self.dphi_l1_at_vtx.push(rel.dphi_l1_at_vtx);
        self.dr_min_dphi_l1.push(rel.dr_min_dphi_l1);
        self.dphi_min_dphi_l1.push(rel.dphi_min_dphi_l1);
        self.dr_min_dphi_l1_at_vtx.push(rel.dr_min_dphi_l1_at_vtx);
        self.dphi_min_dphi_l1_at_vtx.push(rel.dphi_min_dphi_l1_at_vtx);
        self.l1_pt.push(rel.l1_pt);
        self.l1_eta.push(rel.l1_eta);
        self.l1_phi.push(rel.l1_phi);
        self.n_l2.push(rel.n_l2);
        self.dr_l2.push(rel.dr_l2);
        self.dphi_l2.push(rel.dphi_l2);
        self.l2_pt.push(rel.l2_pt);
        self.l2_eta.push(rel.l2_eta);
        self.l2_phi.push(rel.l2_phi);
        self.gen_pt.push(rel.gen_pt);
        self.gen_eta.push(rel.gen_eta);
        self.gen_phi.push(rel.gen_phi);
    }

    /// Truth columns for the best-matched simulated particle
    pub fn fill_best_truth(&mut self, tp: &TruthParticle, shared_fraction: f64, ambiguity: usize) {
        self.matched_tp_size.push(ambiguity as i64);
        self.best_tp_pdg_id.push(tp.pdg_id as i64);
        self.best_tp_pt.push(tp.pt);
        self.best_tp_eta.push(tp.eta);
        self.best_tp_phi.push(tp.phi);
        self.best_tp_shared_fraction.push(shared_fraction);
    }

    /// Truth columns for a seed with no simulated match
    pub fn fill_dummy_truth(&mut self) {
        self.matched_tp_size.push(0);
        self.best_tp_pdg_id.push(SENTINEL_I);
        self.best_tp_pt.push(SENTINEL_F);
        self.best_tp_eta.push(SENTINEL_F);
        self.best_tp_phi.push(SENTINEL_F);
        self.best_tp_shared_fraction.push(SENTINEL_F);
    }

    /// Row link into the stage's track block, with that row's kinematics
    /// and truth summary copied alongside. `None` for an unmatched seed.
    pub fn link_track(
        &mut self,
        link: i64,
        kinematics: Option<(f64, f64, f64)>,
        truth: Option<(i64, i64, f64)>,
    ) {
        self.track_index.push(link);
        match kinematics {
            Some((pt, eta, phi)) => {
                self.trk_pt.push(pt);
                self.trk_eta.push(eta);
                self.trk_phi.push(phi);
            }
            None => {
                self.trk_pt.push(SENTINEL_F);
                self.trk_eta.push(SENTINEL_F);
                self.trk_phi.push(SENTINEL_F);
            }
        }
        match truth {
            Some((matched, pdg_id, fraction)) => {
                self.trk_matched_tp_size.push(matched);
                self.trk_best_tp_pdg_id.push(pdg_id);
                self.trk_best_tp_shared_fraction.push(fraction);
            }
            None => {
                self.trk_matched_tp_size.push(SENTINEL_I);
                self.trk_best_tp_pdg_id.push(SENTINEL_I);
                self.trk_best_tp_shared_fraction.push(SENTINEL_F);
            }
        }
    }

    pub fn fill_score(&mut self, score: f64) {
        self.mva.push(score);
    }

    pub fn fill_no_score(&mut self) {
        self.mva.push(SENTINEL_F);
    }

    fn name(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn columns(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("tsos_detId", self.tsos_det_id.len()),
            ("tsos_pt", self.tsos_pt.len()),
            ("tsos_x", self.tsos_x.len()),
            ("tsos_y", self.tsos_y.len()),
            ("tsos_dxdz", self.tsos_dxdz.len()),
            ("tsos_dydz", self.tsos_dydz.len()),
            ("tsos_px", self.tsos_px.len()),
            ("tsos_py", self.tsos_py.len()),
            ("tsos_pz", self.tsos_pz.len()),
            ("tsos_qbp", self.tsos_qbp.len()),
            ("tsos_charge", self.tsos_charge.len()),
            ("pt", self.pt.len()),
            ("eta", self.eta.len()),
            ("phi", self.phi.len()),
            ("nL1", self.n_l1.len()),
            ("dRL1", self.dr_l1.len()),
            ("dPhiL1", self.dphi_l1.len()),
            ("dRL1AtVtx", self.dr_l1_at_vtx.len()),
            ("dPhiL1AtVtx", self.dphi_l1_at_vtx.len()),
            ("dRminDPhiL1", self.dr_min_dphi_l1.len()),
            ("dPhiminDPhiL1", self.dphi_min_dphi_l1.len()),
            ("dRminDPhiL1AtVtx", self.dr_min_dphi_l1_at_vtx.len()),
            ("dPhiminDPhiL1AtVtx", self.dphi_min_dphi_l1_at_vtx.len()),
            ("L1_pt", self.l1_pt.len()),
            ("L1_eta", self.l1_eta.len()),
            ("L1_phi", self.l1_phi.len()),
            ("nL2", self.n_l2.len()),
            ("dRL2", self.dr_l2.len()),
            ("dPhiL2", self.dphi_l2.len()),
            ("L2_pt", self.l2_pt.len()),
            ("L2_eta", self.l2_eta.len()),
            ("L2_phi", self.l2_phi.len()),
            ("gen_pt", self.gen_pt.len()),
            ("gen_eta", self.gen_eta.len()),
            ("gen_phi", self.gen_phi.len()),
            ("matchedTPsize", self.matched_tp_size.len()),
            ("bestMatchTP_pdgId", self.best_tp_pdg_id.len()),
            ("bestMatchTP_pt", self.best_tp_pt.len()),
            ("bestMatchTP_eta", self.best_tp_eta.len()),
            ("bestMatchTP_phi", self.best_tp_phi.len()),
            (
                "bestMatchTP_sharedFraction",
                self.best_tp_shared_fraction.len(),
            ),
            ("trackIndex", self.track_index.len()),
            ("trk_pt", self.trk_pt.len()),
            ("trk_eta", self.trk_eta.len()),
            ("trk_phi", self.trk_phi.len()),
            ("trk_matchedTPsize", self.trk_matched_tp_size.len()),
            ("trk_bestMatchTP_pdgId", self.trk_best_tp_pdg_id.len()),
            (
                "trk_bestMatchTP_sharedFraction",
                self.trk_best_tp_shared_fraction.len(),
            ),
            ("mva", self.mva.len()),
        ]
    }
}

impl RecordTemplate for SeedTemplate {
    fn clear(&mut self) {
        let prefix = self.prefix;
        *self = Self::new(prefix);
    }

    fn len(&self) -> usize {
        self.pt.len()
    }

    fn check_aligned(&self) -> NtupleResult<()> {
        check_columns(self.prefix, self.len(), &self.columns())
    }

    fn schema(&self) -> Vec<ColumnSpec> {
        let mut out = vec![ColumnSpec::new(format!("n{}", self.prefix), ColumnKind::Int)];
        for (field, _) in self.columns() {
            let kind = match field {
                "tsos_detId" | "tsos_charge" | "nL1" | "nL2" | "trackIndex"
                | "matchedTPsize" | "bestMatchTP_pdgId" | "trk_matchedTPsize"
                | "trk_bestMatchTP_pdgId" => ColumnKind::IntArray,
                _ => ColumnKind::FloatArray,
            };
            out.push(ColumnSpec::new(self.name(field), kind));
        }
        out
    }

    fn write_into(&self, row: &mut EventRow) {
        row.set(
            format!("n{}", self.prefix),
            ColumnValue::Int(self.len() as i64),
        );
        let int_cols: [(&str, &Vec<i64>); 9] = [
            ("tsos_detId", &self.tsos_det_id),
            ("tsos_charge", &self.tsos_charge),
            ("nL1", &self.n_l1),
            ("nL2", &self.n_l2),
            ("matchedTPsize", &self.matched_tp_size),
            ("bestMatchTP_pdgId", &self.best_tp_pdg_id),
            ("trackIndex", &self.track_index),
            ("trk_matchedTPsize", &self.trk_matched_tp_size),
            ("trk_bestMatchTP_pdgId", &self.trk_best_tp_pdg_id),
        ];
        for (field, data) in int_cols {
            row.set(self.name(field), ColumnValue::IntArray(data.clone()));
        }
        let float_cols: [(&str, &Vec<f64>); 39] = [
            ("tsos_pt", &self.tsos_pt),
            ("tsos_x", &self.tsos_x),
            ("tsos_y", &self.tsos_y),
            ("tsos_dxdz", &self.tsos_dxdz),
            ("tsos_dydz", &self.tsos_dydz),
            ("tsos_px", &self.tsos_px),
            ("tsos_py", &self.tsos_py),
            ("tsos_pz", &self.tsos_pz),
            ("tsos_qbp", &self.tsos_qbp),
            ("pt", &self.pt),
            ("eta", &self.eta),
            ("phi", &self.phi),
            ("dRL1", &self.dr_l1),
            ("dPhiL1", &self.dphi_l1),
            ("dRL1AtVtx", &self.dr_l1_at_vtx),
            ("dPhiL1AtVtx", &self.dphi_l1_at_vtx),
            ("dRminDPhiL1", &self.dr_min_dphi_l1),
            ("dPhiminDPhiL1", &self.dphi_min_dphi_l1),
            ("dRminDPhiL1AtVtx", &self.dr_min_dphi_l1_at_vtx),
            ("dPhiminDPhiL1AtVtx", &self.dphi_min_dphi_l1_at_vtx),
            ("L1_pt", &self.l1_pt),
            ("L1_eta", &self.l1_eta),
            ("L1_phi", &self.l1_phi),
            ("dRL2", &self.dr_l2),
            ("dPhiL2", &self.dphi_l2),
            ("L2_pt", &self.l2_pt),
            ("L2_eta", &self.l2_eta),
            ("L2_phi", &self.l2_phi),
            ("gen_pt", &self.gen_pt),
            ("gen_eta", &self.gen_eta),
            ("gen_phi", &self.gen_phi),
            ("bestMatchTP_pt", &self.best_tp_pt),
            ("bestMatchTP_eta", &self.best_tp_eta),
            ("bestMatchTP_phi", &self.best_tp_phi),
            ("bestMatchTP_sharedFraction", &self.best_tp_shared_fraction),
            ("trk_pt", &self.trk_pt),
            ("trk_eta", &self.trk_eta),
            ("trk_phi", &self.trk_phi),
            ("trk_bestMatchTP_sharedFraction", &self.trk_best_tp_shared_fraction),
        ];
        for (field, data) in float_cols {
            row.set(self.name(field), ColumnValue::FloatArray(data.clone()));
        }
        row.set(self.name("mva"), ColumnValue::FloatArray(self.mva.clone()));
    }
}
