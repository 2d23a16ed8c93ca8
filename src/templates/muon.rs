//! Muon-candidate block, before and after identification cuts

use super::{check_columns, RecordTemplate};
use crate::error::NtupleResult;
use crate::event::{BeamSpot, MuonCandidate, SENTINEL_F, SENTINEL_I};
use crate::store::{ColumnKind, ColumnSpec, ColumnValue, EventRow};

/// Struct-of-arrays buffer for one muon-candidate collection.
///
/// Inner- and global-track columns hold sentinels when the candidate has no
/// fit of that kind; `fill` pushes every column in one step.
#[derive(Debug, Clone, Default)]
pub struct MuonTemplate {
    prefix: &'static str,

    pt: Vec<f64>,
    eta: Vec<f64>,
    phi: Vec<f64>,
    charge: Vec<i64>,
    is_glb: Vec<i64>,
    is_sta: Vec<i64>,
    is_trk: Vec<i64>,

    inner_pt: Vec<f64>,
    inner_eta: Vec<f64>,
    inner_phi: Vec<f64>,
    inner_valid_fraction: Vec<f64>,
    inner_tracker_layers: Vec<i64>,
    inner_tracker_hits: Vec<i64>,
    inner_pixel_hits: Vec<i64>,
    inner_dxy_bs: Vec<f64>,
    inner_dz_bs: Vec<f64>,

    global_normalized_chi2: Vec<f64>,
    global_n_valid_hits: Vec<i64>,

    momentum_chi2: Vec<f64>,
    position_chi2: Vec<f64>,
    glb_kink: Vec<f64>,
    glb_track_probability: Vec<f64>,
    global_delta_eta_phi: Vec<f64>,
    local_distance: Vec<f64>,
    sta_rel_chi2: Vec<f64>,
    tight_match: Vec<i64>,
    trk_kink: Vec<f64>,
    trk_rel_chi2: Vec<f64>,
    segment_compatibility: Vec<f64>,
}

impl MuonTemplate {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn fill(&mut self, muon: &MuonCandidate, bs: Option<&BeamSpot>) -> usize {
        let row = self.pt.len();
        self.pt.push(muon.pt);
        self.eta.push(muon.eta);
        self.phi.push(muon.phi);
        self.charge.push(muon.charge as i64);
        self.is_glb.push(muon.is_global as i64);
        self.is_sta.push(muon.is_standalone as i64);
        self.is_trk.push(muon.is_tracker as i64);

        match &muon.inner {
            Some(trk) => {
                self.inner_pt.push(trk.pt);
                self.inner_eta.push(trk.eta);
                self.inner_phi.push(trk.phi);
                self.inner_valid_fraction.push(trk.valid_fraction);
                self.inner_tracker_layers
                    .push(trk.hit_pattern.tracker_layers as i64);
                self.inner_tracker_hits
                    .push(trk.hit_pattern.tracker_hits as i64);
                self.inner_pixel_hits.push(trk.hit_pattern.pixel_hits as i64);
                match bs {
                    Some(bs) => {
                        self.inner_dxy_bs.push(trk.dxy(bs));
                        self.inner_dz_bs.push(trk.dz(bs));
                    }
                    None => {
                        self.inner_dxy_bs.push(SENTINEL_F);
                        self.inner_dz_bs.push(SENTINEL_F);
                    }
                }
            }
            None => {
                self.inner_pt.push(SENTINEL_F);
                self.inner_eta.push(SENTINEL_F);
                self.inner_phi.push(SENTINEL_F);
                self.inner_valid_fraction.push(SENTINEL_F);
                self.inner_tracker_layers.push(SENTINEL_I);
                self.inner_tracker_hits.push(SENTINEL_I);
                self.inner_pixel_hits.push(SENTINEL_I);
                self.inner_dxy_bs.push(SENTINEL_F);
                self.inner_dz_bs.push(SENTINEL_F);
            }
        }

        match &muon.global {
            Some(trk) => {
                self.global_normalized_chi2.push(trk.normalized_chi2());
                self.global_n_valid_hits.push(trk.n_valid_hits as i64);
            }
            None => {
                self.global_normalized_chi2.push(SENTINEL_F);
                self.global_n_valid_hits.push(SENTINEL_I);
            }
        }

        let q = &muon.quality;
        self.momentum_chi2.push(q.momentum_chi2);
        self.position_chi2.push(q.position_chi2);
        self.glb_kink.push(q.glb_kink);
        self.glb_track_probability.push(q.glb_track_probability);
        self.global_delta_eta_phi.push(q.global_delta_eta_phi);
        self.local_distance.push(q.local_distance);
        self.sta_rel_chi2.push(q.sta_rel_chi2);
        self.tight_match.push(q.tight_match as i64);
        self.trk_kink.push(q.trk_kink);
        self.trk_rel_chi2.push(q.trk_rel_chi2);
        self.segment_compatibility.push(q.segment_compatibility);
        row
    }

    fn name(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn columns(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("pt", self.pt.len()),
            ("eta", self.eta.len()),
            ("phi", self.phi.len()),
            ("charge", self.charge.len()),
            ("isGLB", self.is_glb.len()),
            ("isSTA", self.is_sta.len()),
            ("isTRK", self.is_trk.len()),
            ("inner_pt", self.inner_pt.len()),
            ("inner_eta", self.inner_eta.len()),
            ("inner_phi", self.inner_phi.len()),
            ("inner_validFraction", self.inner_valid_fraction.len()),
            ("inner_trackerLayers", self.inner_tracker_layers.len()),
            ("inner_trackerHits", self.inner_tracker_hits.len()),
            ("inner_pixelHits", self.inner_pixel_hits.len()),
            ("inner_dxy_bs", self.inner_dxy_bs.len()),
            ("inner_dz_bs", self.inner_dz_bs.len()),
            ("global_normalizedChi2", self.global_normalized_chi2.len()),
            ("global_NValidHits", self.global_n_valid_hits.len()),
            ("momentumChi2", self.momentum_chi2.len()),
            ("positionChi2", self.position_chi2.len()),
            ("glbKink", self.glb_kink.len()),
            ("glbTrackProbability", self.glb_track_probability.len()),
            ("globalDeltaEtaPhi", self.global_delta_eta_phi.len()),
            ("localDistance", self.local_distance.len()),
            ("staRelChi2", self.sta_rel_chi2.len()),
            ("tightMatch", self.tight_match.len()),
            ("trkKink", self.trk_kink.len()),
            ("trkRelChi2", self.trk_rel_chi2.len()),
            ("segmentCompatibility", self.segment_compatibility.len()),
        ]
    }
}

impl RecordTemplate for MuonTemplate {
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
                "charge" | "isGLB" | "isSTA" | "isTRK" | "inner_trackerLayers"
                | "inner_trackerHits" | "inner_pixelHits" | "global_NValidHits"
                | "tightMatch" => ColumnKind::IntArray,
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
            ("charge", &self.charge),
            ("isGLB", &self.is_glb),
            ("isSTA", &self.is_sta),
            ("isTRK", &self.is_trk),
            ("inner_trackerLayers", &self.inner_tracker_layers),
            ("inner_trackerHits", &self.inner_tracker_hits),
            ("inner_pixelHits", &self.inner_pixel_hits),
            ("global_NValidHits", &self.global_n_valid_hits),
            ("tightMatch", &self.tight_match),
        ];
        for (field, data) in int_cols {
            row.set(self.name(field), ColumnValue::IntArray(data.clone()));
        }
        let float_cols: [(&str, &Vec<f64>); 20] = [
            ("pt", &self.pt),
            ("eta", &self.eta),
            ("phi", &self.phi),
            ("inner_pt", &self.inner_pt),
            ("inner_eta", &self.inner_eta),
            ("inner_phi", &self.inner_phi),
            ("inner_validFraction", &self.inner_valid_fraction),
            ("inner_dxy_bs", &self.inner_dxy_bs),
            ("inner_dz_bs", &self.inner_dz_bs),
            ("global_normalizedChi2", &self.global_normalized_chi2),
            ("momentumChi2", &self.momentum_chi2),
            ("positionChi2", &self.position_chi2),
            ("glbKink", &self.glb_kink),
            ("glbTrackProbability", &self.glb_track_probability),
            ("globalDeltaEtaPhi", &self.global_delta_eta_phi),
            ("localDistance", &self.local_distance),
            ("staRelChi2", &self.sta_rel_chi2),
            ("trkKink", &self.trk_kink),
            ("trkRelChi2", &self.trk_rel_chi2),
            ("segmentCompatibility", &self.segment_compatibility),
        ];
        for (field, data) in float_cols {
            row.set(self.name(field), ColumnValue::FloatArray(data.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CombinedQuality;

    fn muon(with_inner: bool) -> MuonCandidate {
        MuonCandidate {
            pt: 20.0,
            eta: -0.7,
            phi: 2.0,
            charge: 1,
            is_global: true,
            is_standalone: with_inner,
            is_tracker: with_inner,
            inner: if with_inner {
                Some(crate::event::Track {
                    pt: 19.8,
                    eta: -0.7,
                    phi: 2.0,
                    charge: 1,
                    px: -8.2,
                    py: 18.0,
                    pz: -15.0,
                    vx: 0.0,
                    vy: 0.0,
                    vz: 0.1,
                    chi2: 20.0,
                    ndof: 10.0,
                    valid_fraction: 1.0,
                    n_valid_hits: 17,
                    hit_pattern: crate::event::HitPattern {
                        tracker_layers: 11,
                        tracker_hits: 17,
                        pixel_hits: 4,
                        ..Default::default()
                    },
                    dxy_error: 0.002,
                    dz_error: 0.004,
                    seed_state: None,
                })
            } else {
                None
            },
            global: None,
            quality: CombinedQuality {
                momentum_chi2: 1.0,
                position_chi2: 2.0,
                glb_kink: 3.0,
                glb_track_probability: 0.5,
                global_delta_eta_phi: 0.01,
                local_distance: 0.02,
                sta_rel_chi2: 1.5,
                tight_match: true,
                trk_kink: 4.0,
                trk_rel_chi2: 1.1,
                segment_compatibility: 0.9,
            },
        }
    }

    #[test]
    fn test_fill_with_inner_track() {
        let mut tpl = MuonTemplate::new("muon");
        tpl.fill(&muon(true), None);
        tpl.check_aligned().unwrap();

        let mut row = EventRow::new();
        tpl.write_into(&mut row);
        assert_eq!(
            row.get("muon_inner_pixelHits"),
            Some(&ColumnValue::IntArray(vec![4]))
        );
        assert_eq!(row.len(), tpl.schema().len());
    }

    #[test]
    fn test_absent_tracks_get_sentinels() {
        let mut tpl = MuonTemplate::new("muon");
        tpl.fill(&muon(false), None);
        tpl.check_aligned().unwrap();

        let mut row = EventRow::new();
        tpl.write_into(&mut row);
        assert_eq!(
            row.get("muon_inner_pt"),
            Some(&ColumnValue::FloatArray(vec![SENTINEL_F]))
        );
        assert_eq!(
            row.get("muon_global_NValidHits"),
            Some(&ColumnValue::IntArray(vec![SENTINEL_I]))
        );
    }
}
