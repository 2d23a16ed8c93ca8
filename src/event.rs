//! Upstream per-event object model
//!
//! One `Event` carries everything the reconstruction chain produced for a
//! single collision: the event header, beam-spot parameters, pileup
//! descriptors, vertex collections, muon candidates before and after the
//! identification cuts, L1/L2 trigger candidates, simulated truth, and one
//! `StageProducts` block per tracking-algorithm variant.
//!
//! Every collection is optional. An absent collection is a normal condition
//! (data without simulation truth, configurations that skip a stage) and is
//! silently skipped by the assembler, never an error.

use crate::association::TruthAssociation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stage::Stage;

/// Sentinel for "value not available / not matched"
pub const SENTINEL_F: f64 = -99999.0;
/// Integer sentinel, same convention
pub const SENTINEL_I: i64 = -99999;
/// Row-link sentinel: "no matching row in the other template"
pub const NO_LINK: i64 = -1;
/// "No candidate found yet" initializer for min-distance searches
pub const FAR_DISTANCE: f64 = 99999.0;

/// Run / luminosity-block / event numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventId {
    pub run: u32,
    pub lumi_block: u32,
    pub event: u64,
}

/// Beamline reference point and slopes, with uncertainties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamSpot {
    pub x0: f64,
    pub y0: f64,
    pub z0: f64,
    pub sigma_z: f64,
    pub dxdz: f64,
    pub dydz: f64,
    pub x0_error: f64,
    pub y0_error: f64,
    pub z0_error: f64,
    pub sigma_z_error: f64,
    pub dxdz_error: f64,
    pub dydz_error: f64,
}

/// Per-bunch-crossing pileup descriptor (simulation only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PileupSummary {
    pub bunch_crossing: i32,
    pub true_interactions: f64,
}

/// Compact trajectory starting state on a detector surface.
///
/// Recorded exactly as the tracking pipeline wrote it: local position and
/// slopes on the surface plane, local momentum components, signed inverse
/// momentum, charge. Fields stay `f32` so the fingerprint derived from this
/// state is bit-stable across the collections that recompute it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryState {
    pub det_id: u32,
    pub pt: f32,
    pub local_x: f32,
    pub local_y: f32,
    pub dxdz: f32,
    pub dydz: f32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub qbp: f32,
    pub charge: i32,
}

/// Valid/lost hit counters per sub-detector region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HitPattern {
    pub tracker_layers: i32,
    pub tracker_hits: i32,
    pub lost_tracker_hits: i32,
    pub lost_tracker_hits_in: i32,
    pub lost_tracker_hits_out: i32,
    pub pixel_layers: i32,
    pub pixel_hits: i32,
    pub lost_pixel_hits: i32,
    pub lost_strip_hits: i32,
}

/// A fitted track from one tracking stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub charge: i32,
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub chi2: f64,
    pub ndof: f64,
    pub valid_fraction: f64,
    pub n_valid_hits: i32,
    pub hit_pattern: HitPattern,
    pub dxy_error: f64,
    pub dz_error: f64,
    /// Starting state of the seed this track grew from, when the fit kept it
    pub seed_state: Option<TrajectoryState>,
}

impl Track {
    /// chi2 per degree of freedom
    pub fn normalized_chi2(&self) -> f64 {
        if self.ndof > 0.0 {
            self.chi2 / self.ndof
        } else {
            SENTINEL_F
        }
    }

    /// Signed transverse impact parameter relative to the beamline
    pub fn dxy(&self, bs: &BeamSpot) -> f64 {
        if self.pt.abs() < 1e-12 {
            return SENTINEL_F;
        }
        (-(self.vx - bs.x0) * self.py + (self.vy - bs.y0) * self.px) / self.pt
    }

    /// Longitudinal impact parameter relative to the beamline
    pub fn dz(&self, bs: &BeamSpot) -> f64 {
        if self.pt.abs() < 1e-12 {
            return SENTINEL_F;
        }
        (self.vz - bs.z0)
            - ((self.vx - bs.x0) * self.px + (self.vy - bs.y0) * self.py) / self.pt
                * self.pz
                / self.pt
    }

    /// Transverse impact-parameter significance
    pub fn ip_significance(&self, bs: &BeamSpot) -> f64 {
        if self.dxy_error.abs() < 1e-12 {
            return SENTINEL_F;
        }
        self.dxy(bs) / self.dxy_error
    }
}

/// A trajectory seed: just its starting state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub starting_state: TrajectoryState,
}

/// Combined-fit quality metrics of a muon candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedQuality {
    pub momentum_chi2: f64,
    pub position_chi2: f64,
    pub glb_kink: f64,
    pub glb_track_probability: f64,
    pub global_delta_eta_phi: f64,
    pub local_distance: f64,
    pub sta_rel_chi2: f64,
    pub tight_match: bool,
    pub trk_kink: f64,
    pub trk_rel_chi2: f64,
    pub segment_compatibility: f64,
}

/// A reconstructed muon candidate (before or after identification cuts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuonCandidate {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub charge: i32,
    pub is_global: bool,
    pub is_standalone: bool,
    pub is_tracker: bool,
    /// Inner (tracker) track; may be absent for standalone-only candidates
    pub inner: Option<Track>,
    /// Combined global fit; absent for tracker-only candidates
    pub global: Option<Track>,
    pub quality: CombinedQuality,
}

/// Generator-level particle linked to a truth particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenParticle {
    pub charge: f32,
    pub pdg_id: i32,
    pub status: i32,
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

/// Long-lived species whose decayed-in-flight truth records are kept
const LONG_LIVED_PDG: [i32; 9] = [11, 13, 211, 321, 2212, 3112, 3222, 3312, 3334];

/// A simulated particle used as reconstruction ground truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthParticle {
    pub charge: f32,
    pub pdg_id: i32,
    pub status: i32,
    pub energy: f64,
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub n_hits: i32,
    pub n_tracker_hits: i32,
    pub n_tracker_layers: i32,
    /// Origin crossing: 0 = in-time
    pub bunch_crossing: i32,
    /// Index of the interaction within the crossing: 0 = signal
    pub event_index: i32,
    /// Linked generator particles, first entry is the primary link
    pub gen_links: Vec<GenParticle>,
}

impl TruthParticle {
    pub fn is_in_time(&self) -> bool {
        self.bunch_crossing == 0 && self.event_index == 0
    }

    pub fn is_muon(&self) -> bool {
        self.pdg_id.abs() == 13
    }

    /// Stable at generator level: every gen link must be status 1, and a
    /// decayed-in-flight record (status -99) only counts for long-lived
    /// species.
    pub fn is_stable(&self) -> bool {
        if self.gen_links.iter().any(|g| g.status != 1) {
            return false;
        }
        if self.status == -99 && !LONG_LIVED_PDG.contains(&self.pdg_id.abs()) {
            return false;
        }
        true
    }

    /// Primary generator link, if any
    pub fn gen(&self) -> Option<&GenParticle> {
        self.gen_links.first()
    }
}

/// A reconstructed vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub is_valid: bool,
    pub chi2: f64,
    pub ndof: f64,
    pub n_tracks: i32,
    pub x: f64,
    pub x_error: f64,
    pub y: f64,
    pub y_error: f64,
    pub z: f64,
    pub z_error: f64,
}

/// Level-1 trigger muon candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct L1Candidate {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    /// Kinematics propagated back to the vertex
    pub eta_at_vtx: f64,
    pub phi_at_vtx: f64,
    pub charge: i32,
    pub quality: i32,
    pub bunch_crossing: i32,
}

/// Level-2 (standalone muon) candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct L2Candidate {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub charge: i32,
}

/// A tracker hit with its local position, resolved to global through the
/// surface oracle at fill time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecHit {
    pub is_valid: bool,
    pub det_id: u32,
    pub local_x: f64,
    pub local_y: f64,
    pub local_z: f64,
}

/// Everything one tracking-algorithm variant produced for this event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageProducts {
    pub tracks: Option<Vec<Track>>,
    pub seeds: Option<Vec<Seed>>,
    /// Track <-> truth association for this stage's track collection
    pub track_association: Option<TruthAssociation>,
    /// Seed <-> truth association for this stage's seed collection
    pub seed_association: Option<TruthAssociation>,
}

/// One recorded collision event, fully materialized in memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub is_real_data: bool,
    pub beam_spot: Option<BeamSpot>,
    pub pileup: Option<Vec<PileupSummary>>,
    pub offline_vertices: Option<Vec<Vertex>>,
    /// Pixel vertices from the candidate-side vertexing
    pub candidate_vertices: Option<Vec<Vertex>>,
    /// Pixel vertices from the from-L1 vertexing
    pub from_l1_vertices: Option<Vec<Vertex>>,
    /// Muon candidates after identification cuts
    pub muons: Option<Vec<MuonCandidate>>,
    /// Muon candidates before identification cuts
    pub muons_no_id: Option<Vec<MuonCandidate>>,
    pub l1_candidates: Option<Vec<L1Candidate>>,
    pub l2_candidates: Option<Vec<L2Candidate>>,
    pub gen_particles: Option<Vec<GenParticle>>,
    pub truth_particles: Option<Vec<TruthParticle>>,
    pub hits: Option<Vec<RecHit>>,
    pub stages: BTreeMap<Stage, StageProducts>,
}

impl Event {
    /// Empty event shell with a header only
    pub fn new(id: EventId, is_real_data: bool) -> Self {
        Self {
            id,
            is_real_data,
            beam_spot: None,
            pileup: None,
            offline_vertices: None,
            candidate_vertices: None,
            from_l1_vertices: None,
            muons: None,
            muons_no_id: None,
            l1_candidates: None,
            l2_candidates: None,
            gen_particles: None,
            truth_particles: None,
            hits: None,
            stages: BTreeMap::new(),
        }
    }

    /// True in-time pileup, if a simulation pileup summary is present
    pub fn true_pileup(&self) -> Option<f64> {
        self.pileup
            .as_ref()?
            .iter()
            .find(|p| p.bunch_crossing == 0)
            .map(|p| p.true_interactions)
    }

    /// Number of valid offline vertices
    pub fn n_good_vertices(&self) -> Option<i32> {
        self.offline_vertices
            .as_ref()
            .map(|vs| vs.iter().filter(|v| v.is_valid).count() as i32)
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageProducts> {
        self.stages.get(&stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beam_spot() -> BeamSpot {
        BeamSpot {
            x0: 0.1,
            y0: -0.05,
            z0: 1.0,
            sigma_z: 3.5,
            dxdz: 0.0,
            dydz: 0.0,
            x0_error: 0.001,
            y0_error: 0.001,
            z0_error: 0.01,
            sigma_z_error: 0.01,
            dxdz_error: 1e-5,
            dydz_error: 1e-5,
        }
    }

    fn straight_track(pt: f64, phi: f64, vx: f64, vy: f64) -> Track {
        Track {
            pt,
            eta: 0.0,
            phi,
            charge: 1,
            px: pt * phi.cos(),
            py: pt * phi.sin(),
            pz: 0.0,
            vx,
            vy,
            vz: 1.0,
            chi2: 10.0,
            ndof: 5.0,
            valid_fraction: 1.0,
            n_valid_hits: 15,
            hit_pattern: HitPattern::default(),
            dxy_error: 0.002,
            dz_error: 0.004,
            seed_state: None,
        }
    }

    #[test]
    fn test_normalized_chi2() {
        let trk = straight_track(10.0, 0.0, 0.1, -0.05);
        assert!((trk.normalized_chi2() - 2.0).abs() < 1e-12);

        let mut bad = trk;
        bad.ndof = 0.0;
        assert_eq!(bad.normalized_chi2(), SENTINEL_F);
    }

    #[test]
    fn test_dxy_vanishes_on_beamline() {
        let bs = beam_spot();
        // track starting exactly at the beam spot, any direction
        let trk = straight_track(10.0, 0.7, bs.x0, bs.y0);
        assert!(trk.dxy(&bs).abs() < 1e-12);
        assert!((trk.dz(&bs) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_dxy_offset_track() {
        let bs = beam_spot();
        // track along +x displaced by 1mm in y: |dxy| = 1mm
        let trk = straight_track(10.0, 0.0, bs.x0, bs.y0 + 0.1);
        assert!((trk.dxy(&bs).abs() - 0.1).abs() < 1e-9);
        assert!((trk.ip_significance(&bs).abs() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_truth_stability_filters() {
        let mut tp = TruthParticle {
            charge: -1.0,
            pdg_id: 13,
            status: 1,
            energy: 10.0,
            pt: 9.0,
            eta: 0.3,
            phi: 0.1,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            n_hits: 20,
            n_tracker_hits: 15,
            n_tracker_layers: 10,
            bunch_crossing: 0,
            event_index: 0,
            gen_links: vec![],
        };
        assert!(tp.is_in_time() && tp.is_muon() && tp.is_stable());

        tp.bunch_crossing = 1;
        assert!(!tp.is_in_time());
        tp.bunch_crossing = 0;

        tp.gen_links.push(GenParticle {
            charge: -1.0,
            pdg_id: 13,
            status: 2,
            pt: 9.0,
            eta: 0.3,
            phi: 0.1,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
        });
        assert!(!tp.is_stable());

        // decayed-in-flight muon record is still kept
        tp.gen_links.clear();
        tp.status = -99;
        assert!(tp.is_stable());
        tp.pdg_id = 15;
        assert!(!tp.is_stable());
    }

    #[test]
    fn test_true_pileup_picks_in_time_crossing() {
        let mut ev = Event::new(
            EventId {
                run: 1,
                lumi_block: 2,
                event: 3,
            },
            false,
        );
        ev.pileup = Some(vec![
            PileupSummary {
                bunch_crossing: -1,
                true_interactions: 20.0,
            },
            PileupSummary {
                bunch_crossing: 0,
                true_interactions: 55.0,
            },
        ]);
        assert_eq!(ev.true_pileup(), Some(55.0));
    }
}
