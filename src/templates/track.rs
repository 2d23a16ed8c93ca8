//! Track block: one instance per tracking stage

use super::{check_columns, RecordTemplate};
use crate::error::NtupleResult;
use crate::event::{BeamSpot, Track, TruthParticle, NO_LINK, SENTINEL_F, SENTINEL_I};
use crate::store::{ColumnKind, ColumnSpec, ColumnValue, EventRow};

/// Struct-of-arrays buffer for one stage's track collection.
///
/// Fill protocol per track, in order: `fill`, then exactly one of
/// `fill_best_truth` / `fill_dummy_truth`, then `link_candidates`, then
/// exactly one of `fill_score` / `fill_no_score`. Skipping a step leaves a
/// column short and trips the alignment check.
#[derive(Debug, Clone, Default)]
pub struct TrackTemplate {
    prefix: &'static str,

    pt: Vec<f64>,
    eta: Vec<f64>,
    phi: Vec<f64>,
    charge: Vec<i64>,
    px: Vec<f64>,
    py: Vec<f64>,
    pz: Vec<f64>,
    vx: Vec<f64>,
    vy: Vec<f64>,
    vz: Vec<f64>,
    dxy_bs: Vec<f64>,
    dxy_sig_bs: Vec<f64>,
    dz_bs: Vec<f64>,
    normalized_chi2: Vec<f64>,
    valid_fraction: Vec<f64>,
    n_valid_hits: Vec<i64>,

    link_to_cand: Vec<i64>,
    link_to_cand_no_id: Vec<i64>,

    matched_tp_size: Vec<i64>,
    best_tp_pdg_id: Vec<i64>,
    best_tp_energy: Vec<f64>,
    best_tp_pt: Vec<f64>,
    best_tp_eta: Vec<f64>,
    best_tp_phi: Vec<f64>,
    best_tp_parent_vx: Vec<f64>,
    best_tp_parent_vy: Vec<f64>,
    best_tp_parent_vz: Vec<f64>,
    best_tp_status: Vec<i64>,
    best_tp_n_hits: Vec<i64>,
    best_tp_n_tracker_hits: Vec<i64>,
    best_tp_n_tracker_layers: Vec<i64>,
    best_tp_shared_fraction: Vec<f64>,

    mva: Vec<f64>,
}

impl TrackTemplate {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Push the kinematic and fit columns of one track.
    ///
    /// Impact parameters are relative to the beam spot; without one the
    /// three beam-spot columns hold sentinels.
    pub fn fill(&mut self, trk: &Track, bs: Option<&BeamSpot>) -> usize {
        let row = self.pt.len();
        self.pt.push(trk.pt);
        self.eta.push(trk.eta);
        self.phi.push(trk.phi);
        self.charge.push(trk.charge as i64);
        self.px.push(trk.px);
        self.py.push(trk.py);
        self.pz.push(trk.pz);
        self.vx.push(trk.vx);
        self.vy.push(trk.vy);
        self.vz.push(trk.vz);
        match bs {
            Some(bs) => {
                self.dxy_bs.push(trk.dxy(bs));
                self.dxy_sig_bs.push(trk.ip_significance(bs));
                self.dz_bs.push(trk.dz(bs));
            }
            None => {
                self.dxy_bs.push(SENTINEL_F);
                self.dxy_sig_bs.push(SENTINEL_F);
                self.dz_bs.push(SENTINEL_F);
            }
        }
        self.normalized_chi2.push(trk.normalized_chi2());
        self.valid_fraction.push(trk.valid_fraction);
        self.n_valid_hits.push(trk.n_valid_hits as i64);
        row
    }

    /// Record the best truth match of the last filled track
    pub fn fill_best_truth(&mut self, tp: &TruthParticle, shared_fraction: f64, ambiguity: usize) {
        self.matched_tp_size.push(ambiguity as i64);
        self.best_tp_pdg_id.push(tp.pdg_id as i64);
        self.best_tp_energy.push(tp.energy);
        self.best_tp_pt.push(tp.pt);
        self.best_tp_eta.push(tp.eta);
        self.best_tp_phi.push(tp.phi);
        self.best_tp_parent_vx.push(tp.vx);
        self.best_tp_parent_vy.push(tp.vy);
        self.best_tp_parent_vz.push(tp.vz);
        self.best_tp_status.push(tp.status as i64);
        self.best_tp_n_hits.push(tp.n_hits as i64);
        self.best_tp_n_tracker_hits.push(tp.n_tracker_hits as i64);
        self.best_tp_n_tracker_layers.push(tp.n_tracker_layers as i64);
        self.best_tp_shared_fraction.push(shared_fraction);
    }

    /// Sentinel truth columns for an unmatched track
    pub fn fill_dummy_truth(&mut self) {
        self.matched_tp_size.push(0);
        self.best_tp_pdg_id.push(SENTINEL_I);
        self.best_tp_energy.push(SENTINEL_F);
        self.best_tp_pt.push(SENTINEL_F);
        self.best_tp_eta.push(SENTINEL_F);
        self.best_tp_phi.push(SENTINEL_F);
        self.best_tp_parent_vx.push(SENTINEL_F);
        self.best_tp_parent_vy.push(SENTINEL_F);
        self.best_tp_parent_vz.push(SENTINEL_F);
        self.best_tp_status.push(SENTINEL_I);
        self.best_tp_n_hits.push(SENTINEL_I);
        self.best_tp_n_tracker_hits.push(SENTINEL_I);
        self.best_tp_n_tracker_layers.push(SENTINEL_I);
        self.best_tp_shared_fraction.push(SENTINEL_F);
    }

    /// Row links into the candidate blocks, -1 when unmatched
    pub fn link_candidates(&mut self, cand: i64, cand_no_id: i64) {
        self.link_to_cand.push(cand);
        self.link_to_cand_no_id.push(cand_no_id);
    }

    /// Seed score of the last filled track (scoring stages only)
    pub fn fill_score(&mut self, score: f64) {
        self.mva.push(score);
    }

    /// Sentinel score for non-scoring stages and seed-less tracks
    pub fn fill_no_score(&mut self) {
        self.mva.push(SENTINEL_F);
    }

    /// (pt, eta, phi) of a filled row
    pub fn row_kinematics(&self, row: usize) -> Option<(f64, f64, f64)> {
        Some((
            *self.pt.get(row)?,
            *self.eta.get(row)?,
            *self.phi.get(row)?,
        ))
    }

    /// (matched count, best pdg id, best shared fraction) of a filled row
    pub fn best_truth_summary(&self, row: usize) -> Option<(i64, i64, f64)> {
        Some((
            *self.matched_tp_size.get(row)?,
            *self.best_tp_pdg_id.get(row)?,
            *self.best_tp_shared_fraction.get(row)?,
        ))
    }

    /// Candidate link of a filled row
    pub fn candidate_link(&self, row: usize) -> i64 {
        self.link_to_cand.get(row).copied().unwrap_or(NO_LINK)
    }

    fn name(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn columns(&self) -> [(&'static str, usize); 32] {
        [
            ("pt", self.pt.len()),
            ("eta", self.eta.len()),
            ("phi", self.phi.len()),
            ("charge", self.charge.len()),
            ("px", self.px.len()),
            ("py", self.py.len()),
            ("pz", self.pz.len()),
            ("vx", self.vx.len()),
            ("vy", self.vy.len()),
            ("vz", self.vz.len()),
            ("dxy_bs", self.dxy_bs.len()),
            ("dxySig_bs", self.dxy_sig_bs.len()),
            ("dz_bs", self.dz_bs.len()),
            ("normalizedChi2", self.normalized_chi2.len()),
            ("validFraction", self.valid_fraction.len()),
            ("NValidHits", self.n_valid_hits.len()),
            ("linkToCand", self.link_to_cand.len()),
            ("linkToCandNoId", self.link_to_cand_no_id.len()),
            ("matchedTPsize", self.matched_tp_size.len()),
            ("bestMatchTP_pdgId", self.best_tp_pdg_id.len()),
            ("bestMatchTP_energy", self.best_tp_energy.len()),
            ("bestMatchTP_pt", self.best_tp_pt.len()),
            ("bestMatchTP_eta", self.best_tp_eta.len()),
            ("bestMatchTP_phi", self.best_tp_phi.len()),
            ("bestMatchTP_parentVx", self.best_tp_parent_vx.len()),
            ("bestMatchTP_parentVy", self.best_tp_parent_vy.len()),
            ("bestMatchTP_parentVz", self.best_tp_parent_vz.len()),
            ("bestMatchTP_status", self.best_tp_status.len()),
            ("bestMatchTP_numberOfHits", self.best_tp_n_hits.len()),
            (
                "bestMatchTP_numberOfTrackerHits",
                self.best_tp_n_tracker_hits.len(),
            ),
            (
                "bestMatchTP_numberOfTrackerLayers",
                self.best_tp_n_tracker_layers.len(),
            ),
            ("bestMatchTP_sharedFraction", self.best_tp_shared_fraction.len()),
        ]
    }
}

impl RecordTemplate for TrackTemplate {
    fn clear(&mut self) {
        let prefix = self.prefix;
        *self = Self::new(prefix);
    }

    fn len(&self) -> usize {
        self.pt.len()
    }

    fn check_aligned(&self) -> NtupleResult<()> {
        let expected = self.len();
        check_columns(self.prefix, expected, &self.columns())?;
        check_columns(self.prefix, expected, &[("mva", self.mva.len())])
    }

    fn schema(&self) -> Vec<ColumnSpec> {
        let mut out = vec![ColumnSpec::new(format!("n{}", self.prefix), ColumnKind::Int)];
        for (field, _) in self.columns() {
            let kind = match field {
                "charge" | "NValidHits" | "linkToCand" | "linkToCandNoId" | "matchedTPsize"
                | "bestMatchTP_pdgId" | "bestMatchTP_status" | "bestMatchTP_numberOfHits"
                | "bestMatchTP_numberOfTrackerHits" | "bestMatchTP_numberOfTrackerLayers" => {
                    ColumnKind::IntArray
                }
                _ => ColumnKind::FloatArray,
            };
            out.push(ColumnSpec::new(self.name(field), kind));
        }
        out.push(ColumnSpec::new(self.name("mva"), ColumnKind::FloatArray));
        out
    }

    fn write_into(&self, row: &mut EventRow) {
        row.set(
            format!("n{}", self.prefix),
            ColumnValue::Int(self.len() as i64),
        );
        row.set(self.name("pt"), ColumnValue::FloatArray(self.pt.clone()));
        row.set(self.name("eta"), ColumnValue::FloatArray(self.eta.clone()));
        row.set(self.name("phi"), ColumnValue::FloatArray(self.phi.clone()));
        row.set(self.name("charge"), ColumnValue::IntArray(self.charge.clone()));
        row.set(self.name("px"), ColumnValue::FloatArray(self.px.clone()));
        row.set(self.name("py"), ColumnValue::FloatArray(self.py.clone()));
        row.set(self.name("pz"), ColumnValue::FloatArray(self.pz.clone()));
        row.set(self.name("vx"), ColumnValue::FloatArray(self.vx.clone()));
        row.set(self.name("vy"), ColumnValue::FloatArray(self.vy.clone()));
        row.set(self.name("vz"), ColumnValue::FloatArray(self.vz.clone()));
        row.set(self.name("dxy_bs"), ColumnValue::FloatArray(self.dxy_bs.clone()));
        row.set(
            self.name("dxySig_bs"),
            ColumnValue::FloatArray(self.dxy_sig_bs.clone()),
        );
        row.set(self.name("dz_bs"), ColumnValue::FloatArray(self.dz_bs.clone()));
        row.set(
            self.name("normalizedChi2"),
            ColumnValue::FloatArray(self.normalized_chi2.clone()),
        );
        row.set(
            self.name("validFraction"),
            ColumnValue::FloatArray(self.valid_fraction.clone()),
        );
        row.set(
            self.name("NValidHits"),
            ColumnValue::IntArray(self.n_valid_hits.clone()),
        );
        row.set(
            self.name("linkToCand"),
            ColumnValue::IntArray(self.link_to_cand.clone()),
        );
        row.set(
            self.name("linkToCandNoId"),
            ColumnValue::IntArray(self.link_to_cand_no_id.clone()),
        );
        row.set(
            self.name("matchedTPsize"),
            ColumnValue::IntArray(self.matched_tp_size.clone()),
        );
        row.set(
            self.name("bestMatchTP_pdgId"),
            ColumnValue::IntArray(self.best_tp_pdg_id.clone()),
        );
        row.set(
            self.name("bestMatchTP_energy"),
            ColumnValue::FloatArray(self.best_tp_energy.clone()),
        );
        row.set(
            self.name("bestMatchTP_pt"),
            ColumnValue::FloatArray(self.best_tp_pt.clone()),
        );
        row.set(
            self.name("bestMatchTP_eta"),
            ColumnValue::FloatArray(self.best_tp_eta.clone()),
        );
        row.set(
            self.name("bestMatchTP_phi"),
            ColumnValue::FloatArray(self.best_tp_phi.clone()),
        );
        row.set(
            self.name("bestMatchTP_parentVx"),
            ColumnValue::FloatArray(self.best_tp_parent_vx.clone()),
        );
        row.set(
            self.name("bestMatchTP_parentVy"),
            ColumnValue::FloatArray(self.best_tp_parent_vy.clone()),
        );
        row.set(
            self.name("bestMatchTP_parentVz"),
            ColumnValue::FloatArray(self.best_tp_parent_vz.clone()),
        );
        row.set(
            self.name("bestMatchTP_status"),
            ColumnValue::IntArray(self.best_tp_status.clone()),
        );
        row.set(
            self.name("bestMatchTP_numberOfHits"),
            ColumnValue::IntArray(self.best_tp_n_hits.clone()),
        );
        row.set(
            self.name("bestMatchTP_numberOfTrackerHits"),
            ColumnValue::IntArray(self.best_tp_n_tracker_hits.clone()),
        );
        row.set(
            self.name("bestMatchTP_numberOfTrackerLayers"),
            ColumnValue::IntArray(self.best_tp_n_tracker_layers.clone()),
        );
        row.set(
            self.name("bestMatchTP_sharedFraction"),
            ColumnValue::FloatArray(self.best_tp_shared_fraction.clone()),
        );
        row.set(self.name("mva"), ColumnValue::FloatArray(self.mva.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NtupleError;
    use crate::event::HitPattern;

    fn track(pt: f64) -> Track {
        Track {
            pt,
            eta: 0.5,
            phi: 1.0,
            charge: -1,
            px: pt,
            py: 0.0,
            pz: 2.0,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            chi2: 12.0,
            ndof: 6.0,
            valid_fraction: 0.95,
            n_valid_hits: 14,
            hit_pattern: HitPattern::default(),
            dxy_error: 0.002,
            dz_error: 0.004,
            seed_state: None,
        }
    }

    fn fill_complete(tpl: &mut TrackTemplate, pt: f64) {
        tpl.fill(&track(pt), None);
        tpl.fill_dummy_truth();
        tpl.link_candidates(-1, -1);
        tpl.fill_no_score();
    }

    #[test]
    fn test_full_fill_is_aligned() {
        let mut tpl = TrackTemplate::new("trk");
        fill_complete(&mut tpl, 5.0);
        fill_complete(&mut tpl, 7.0);
        assert_eq!(tpl.len(), 2);
        tpl.check_aligned().unwrap();
        assert_eq!(tpl.row_kinematics(1), Some((7.0, 0.5, 1.0)));
    }

    #[test]
    fn test_skipped_step_is_fatal() {
        let mut tpl = TrackTemplate::new("trk");
        tpl.fill(&track(5.0), None);
        tpl.link_candidates(-1, -1);
        tpl.fill_no_score();
        // truth columns were never pushed
        let err = tpl.check_aligned().unwrap_err();
        match err {
            NtupleError::ColumnMisaligned {
                template,
                expected,
                got,
                ..
            } => {
                assert_eq!(template, "trk");
                assert_eq!(expected, 1);
                assert_eq!(got, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_schema_matches_rendered_row() {
        let mut tpl = TrackTemplate::new("trk");
        fill_complete(&mut tpl, 5.0);
        let mut row = EventRow::new();
        tpl.write_into(&mut row);
        let schema = tpl.schema();
        assert_eq!(row.len(), schema.len());
        for spec in &schema {
            let v = row.get(&spec.name).unwrap();
            assert_eq!(v.kind(), spec.kind, "column {}", spec.name);
        }
    }

    #[test]
    fn test_clear_keeps_prefix() {
        let mut tpl = TrackTemplate::new("trk");
        fill_complete(&mut tpl, 5.0);
        tpl.clear();
        assert_eq!(tpl.len(), 0);
        assert_eq!(tpl.prefix(), "trk");
    }
}
