//! Truth-particle block: per-stage selections plus the inclusive muon block

use super::{check_columns, RecordTemplate};
use crate::error::NtupleResult;
use crate::event::{TruthParticle, SENTINEL_F, SENTINEL_I};
use crate::store::{ColumnKind, ColumnSpec, ColumnValue, EventRow};

/// Struct-of-arrays buffer for a truth-particle selection.
///
/// Fill protocol per particle: `fill`, then exactly one of
/// `fill_matched_track` / `fill_dummy_matched`. The inclusive muon block
/// carries no association and fills the matched columns with sentinels.
#[derive(Debug, Clone, Default)]
pub struct TruthTemplate {
    prefix: &'static str,

    charge: Vec<f64>,
    pdg_id: Vec<i64>,
    energy: Vec<f64>,
    pt: Vec<f64>,
    eta: Vec<f64>,
    phi: Vec<f64>,
    parent_vx: Vec<f64>,
    parent_vy: Vec<f64>,
    parent_vz: Vec<f64>,
    status: Vec<i64>,
    n_hits: Vec<i64>,
    n_tracker_hits: Vec<i64>,
    n_tracker_layers: Vec<i64>,
    gen_pt: Vec<f64>,
    gen_eta: Vec<f64>,
    gen_phi: Vec<f64>,

    best_trk_pt: Vec<f64>,
    best_trk_eta: Vec<f64>,
    best_trk_phi: Vec<f64>,
    best_trk_charge: Vec<i64>,
    best_trk_dxy_bs: Vec<f64>,
    best_trk_dz_bs: Vec<f64>,
    best_trk_normalized_chi2: Vec<f64>,
    best_trk_quality: Vec<f64>,
    best_trk_n_valid_hits: Vec<i64>,
    best_trk_mva: Vec<f64>,
}

/// Columns of the best reconstructed match, gathered by the assembler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedTrackSummary {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub charge: i64,
    pub dxy_bs: f64,
    pub dz_bs: f64,
    pub normalized_chi2: f64,
    /// Association quality of the match
    pub quality: f64,
    pub n_valid_hits: i64,
    /// Seed score of the matched track, sentinel outside scoring stages
    pub mva: f64,
}

impl TruthTemplate {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Push the base columns of one truth particle
    pub fn fill(&mut self, tp: &TruthParticle) -> usize {
        let row = self.pt.len();
        self.charge.push(tp.charge as f64);
        self.pdg_id.push(tp.pdg_id as i64);
        self.energy.push(tp.energy);
        self.pt.push(tp.pt);
        self.eta.push(tp.eta);
        self.phi.push(tp.phi);
        self.parent_vx.push(tp.vx);
        self.parent_vy.push(tp.vy);
        self.parent_vz.push(tp.vz);
        self.status.push(tp.status as i64);
        self.n_hits.push(tp.n_hits as i64);
        self.n_tracker_hits.push(tp.n_tracker_hits as i64);
        self.n_tracker_layers.push(tp.n_tracker_layers as i64);
        match tp.gen() {
            Some(g) => {
                self.gen_pt.push(g.pt);
                self.gen_eta.push(g.eta);
                self.gen_phi.push(g.phi);
            }
            None => {
                self.gen_pt.push(SENTINEL_F);
                self.gen_eta.push(SENTINEL_F);
                self.gen_phi.push(SENTINEL_F);
            }
        }
        row
    }

    /// Record the best reconstructed match of the last filled particle
    pub fn fill_matched_track(&mut self, m: &MatchedTrackSummary) {
        self.best_trk_pt.push(m.pt);
        self.best_trk_eta.push(m.eta);
        self.best_trk_phi.push(m.phi);
        self.best_trk_charge.push(m.charge);
        self.best_trk_dxy_bs.push(m.dxy_bs);
        self.best_trk_dz_bs.push(m.dz_bs);
        self.best_trk_normalized_chi2.push(m.normalized_chi2);
        self.best_trk_quality.push(m.quality);
        self.best_trk_n_valid_hits.push(m.n_valid_hits);
        self.best_trk_mva.push(m.mva);
    }

    /// Sentinel matched-track columns for an unmatched particle
    pub fn fill_dummy_matched(&mut self) {
        self.best_trk_pt.push(SENTINEL_F);
        self.best_trk_eta.push(SENTINEL_F);
        self.best_trk_phi.push(SENTINEL_F);
        self.best_trk_charge.push(SENTINEL_I);
        self.best_trk_dxy_bs.push(SENTINEL_F);
        self.best_trk_dz_bs.push(SENTINEL_F);
        self.best_trk_normalized_chi2.push(SENTINEL_F);
        self.best_trk_quality.push(SENTINEL_F);
        self.best_trk_n_valid_hits.push(SENTINEL_I);
        self.best_trk_mva.push(SENTINEL_F);
    }

    fn name(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn columns(&self) -> [(&'static str, usize); 26] {
        [
            ("charge", self.charge.len()),
            ("pdgId", self.pdg_id.len()),
            ("energy", self.energy.len()),
            ("pt", self.pt.len()),
            ("eta", self.eta.len()),
            ("phi", self.phi.len()),
            ("parentVx", self.parent_vx.len()),
            ("parentVy", self.parent_vy.len()),
            ("parentVz", self.parent_vz.len()),
            ("status", self.status.len()),
            ("numberOfHits", self.n_hits.len()),
            ("numberOfTrackerHits", self.n_tracker_hits.len()),
            ("numberOfTrackerLayers", self.n_tracker_layers.len()),
            ("gen_pt", self.gen_pt.len()),
            ("gen_eta", self.gen_eta.len()),
            ("gen_phi", self.gen_phi.len()),
            ("bestMatchTrk_pt", self.best_trk_pt.len()),
            ("bestMatchTrk_eta", self.best_trk_eta.len()),
            ("bestMatchTrk_phi", self.best_trk_phi.len()),
            ("bestMatchTrk_charge", self.best_trk_charge.len()),
            ("bestMatchTrk_dxy_bs", self.best_trk_dxy_bs.len()),
            ("bestMatchTrk_dz_bs", self.best_trk_dz_bs.len()),
            ("bestMatchTrk_normalizedChi2", self.best_trk_normalized_chi2.len()),
            ("bestMatchTrk_quality", self.best_trk_quality.len()),
            ("bestMatchTrk_NValidHits", self.best_trk_n_valid_hits.len()),
            ("bestMatchTrk_mva", self.best_trk_mva.len()),
        ]
    }
}

impl RecordTemplate for TruthTemplate {
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
                "pdgId" | "status" | "numberOfHits" | "numberOfTrackerHits"
                | "numberOfTrackerLayers" | "bestMatchTrk_charge" | "bestMatchTrk_NValidHits" => {
                    ColumnKind::IntArray
                }
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
        row.set(self.name("charge"), ColumnValue::FloatArray(self.charge.clone()));
        row.set(self.name("pdgId"), ColumnValue::IntArray(self.pdg_id.clone()));
        row.set(self.name("energy"), ColumnValue::FloatArray(self.energy.clone()));
        row.set(self.name("pt"), ColumnValue::FloatArray(self.pt.clone()));
        row.set(self.name("eta"), ColumnValue::FloatArray(self.eta.clone()));
        row.set(self.name("phi"), ColumnValue::FloatArray(self.phi.clone()));
        row.set(
            self.name("parentVx"),
            ColumnValue::FloatArray(self.parent_vx.clone()),
        );
        row.set(
            self.name("parentVy"),
            ColumnValue::FloatArray(self.parent_vy.clone()),
        );
        row.set(
            self.name("parentVz"),
            ColumnValue::FloatArray(self.parent_vz.clone()),
        );
        row.set(self.name("status"), ColumnValue::IntArray(self.status.clone()));
        row.set(
            self.name("numberOfHits"),
            ColumnValue::IntArray(self.n_hits.clone()),
        );
        row.set(
            self.name("numberOfTrackerHits"),
            ColumnValue::IntArray(self.n_tracker_hits.clone()),
        );
        row.set(
            self.name("numberOfTrackerLayers"),
            ColumnValue::IntArray(self.n_tracker_layers.clone()),
        );
        row.set(self.name("gen_pt"), ColumnValue::FloatArray(self.gen_pt.clone()));
        row.set(self.name("gen_eta"), ColumnValue::FloatArray(self.gen_eta.clone()));
        row.set(self.name("gen_phi"), ColumnValue::FloatArray(self.gen_phi.clone()));
        row.set(
            self.name("bestMatchTrk_pt"),
            ColumnValue::FloatArray(self.best_trk_pt.clone()),
        );
        row.set(
            self.name("bestMatchTrk_eta"),
            ColumnValue::FloatArray(self.best_trk_eta.clone()),
        );
        row.set(
            self.name("bestMatchTrk_phi"),
            ColumnValue::FloatArray(self.best_trk_phi.clone()),
        );
        row.set(
            self.name("bestMatchTrk_charge"),
            ColumnValue::IntArray(self.best_trk_charge.clone()),
        );
        row.set(
            self.name("bestMatchTrk_dxy_bs"),
            ColumnValue::FloatArray(self.best_trk_dxy_bs.clone()),
        );
        row.set(
            self.name("bestMatchTrk_dz_bs"),
            ColumnValue::FloatArray(self.best_trk_dz_bs.clone()),
        );
        row.set(
            self.name("bestMatchTrk_normalizedChi2"),
            ColumnValue::FloatArray(self.best_trk_normalized_chi2.clone()),
        );
        row.set(
            self.name("bestMatchTrk_quality"),
            ColumnValue::FloatArray(self.best_trk_quality.clone()),
        );
        row.set(
            self.name("bestMatchTrk_NValidHits"),
            ColumnValue::IntArray(self.best_trk_n_valid_hits.clone()),
        );
        row.set(
            self.name("bestMatchTrk_mva"),
            ColumnValue::FloatArray(self.best_trk_mva.clone()),
        );
    }
}
